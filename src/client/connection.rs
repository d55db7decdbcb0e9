//! Per-connection state and the read/parse/dispatch/write loop (spec.md
//! §4.2, §4.3). One `spawn_local` task per accepted socket plays the role
//! of the reactor's per-fd callback registration (see `app::server`): the
//! `.await` points at "need more bytes" and "write accepted" are exactly
//! the suspend points the reactor's readiness callbacks would yield at.

use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::app::ServerState;
use crate::client::commands::Context;
use crate::client::dispatch::{self, arity_ok, Command};
use crate::protocol::{parser, reply, Parser};

const READ_CHUNK: usize = 16 * 1024;

pub struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    read_buf: BytesMut,
    parser: Parser,
    db_index: usize,
    /// Set once a bulk command's inline prefix has been parsed and we're
    /// waiting on its payload (spec.md §4.3 step 5); `None` means the next
    /// completed parse is a fresh command line.
    pending_command: Option<&'static Command>,
}

impl Connection {
    pub fn new(stream: TcpStream, addr: SocketAddr) -> Self {
        Connection {
            stream,
            addr,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            parser: Parser::default(),
            db_index: 0,
            pending_command: None,
        }
    }

    pub async fn run(mut self, server: Rc<ServerState>) {
        tracing::info!(addr = %self.addr, "client connected");
        loop {
            match self.parser.step(&mut self.read_buf) {
                Ok(Some(())) => {
                    if !self.advance(&server).await {
                        break;
                    }
                    continue;
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(addr = %self.addr, %err, "protocol error, closing connection");
                    break;
                }
            }

            let mut chunk = [0u8; READ_CHUNK];
            let idle = Duration::from_secs(server.timeout_secs);
            let read = match timeout(idle, self.stream.read(&mut chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => n,
                Ok(Err(err)) => {
                    tracing::warn!(addr = %self.addr, %err, "read error, closing connection");
                    break;
                }
                Err(_elapsed) => {
                    tracing::info!(addr = %self.addr, "idle timeout, closing connection");
                    break;
                }
            };
            self.read_buf.extend_from_slice(&chunk[..read]);
        }
        tracing::info!(addr = %self.addr, "client disconnected");
    }

    /// Handle one completed parse: either execute a bulk command whose
    /// payload just arrived, or dispatch a freshly tokenized line (possibly
    /// promoting it to bulk mode). Returns `false` when the connection
    /// should close.
    async fn advance(&mut self, server: &Rc<ServerState>) -> bool {
        if let Some(cmd) = self.pending_command.take() {
            let reply = self.invoke(server, cmd);
            self.parser.reset();
            return self.write(reply).await;
        }

        let mut name = self.parser.argv[0].to_vec();
        name.make_ascii_lowercase();
        if name == b"quit" {
            return false;
        }

        let Some(cmd) = dispatch::lookup(&name) else {
            self.parser.reset();
            return self.write(reply::unknown_command()).await;
        };

        let argc = self.parser.argv.len() as i32;
        if !arity_ok(cmd.arity, argc) {
            self.parser.reset();
            return self.write(reply::wrong_arity()).await;
        }

        if cmd.bulk {
            let len_arg = self.parser.argv.pop().expect("bulk command carries a length arg");
            match parser::parse_bulk_len(&len_arg) {
                Ok(n) => {
                    self.parser.begin_bulk(n);
                    self.pending_command = Some(cmd);
                    true
                }
                Err(err) => {
                    tracing::warn!(addr = %self.addr, %err, "bad bulk length, closing connection");
                    false
                }
            }
        } else {
            let reply = self.invoke(server, cmd);
            self.parser.reset();
            self.write(reply).await
        }
    }

    fn invoke(&mut self, server: &Rc<ServerState>, cmd: &'static Command) -> bytes::Bytes {
        let mut ctx = Context {
            server,
            db_index: &mut self.db_index,
        };
        (cmd.handler)(&mut ctx, &self.parser.argv)
    }

    async fn write(&mut self, payload: bytes::Bytes) -> bool {
        match self.stream.write_all(&payload).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(addr = %self.addr, %err, "write error, closing connection");
                false
            }
        }
    }
}

//! Listener bootstrap, accept loop, and the 1000 ms cron (spec.md §4.1,
//! §4.2, §5). Grounded in the teacher's `app/server.rs` socket setup
//! (`socket2` for listener tuning, `nix` to ignore `SIGHUP`/`SIGPIPE`) but
//! single-threaded: one `current_thread` runtime, one `LocalSet`, one
//! `spawn_local` task per connection plus one for the cron.

use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use socket2::{Domain, Socket, Type};
use tokio::net::TcpListener;

use crate::client::Connection;
use crate::config::Config;
use crate::errors::Error;

use super::ServerState;

const CRON_INTERVAL: Duration = Duration::from_millis(1000);

/// Accept connections until the process exits (only `SHUTDOWN` or a fatal
/// error ends this; spec.md never describes a graceful accept-loop exit).
pub async fn serve(config: &Config, server: Rc<ServerState>) -> Result<(), Error> {
    ignore_disruptive_signals();

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .map_err(|_| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, "bad bind address")))?;
    let listener = bind_listener(addr)?;
    tracing::info!(%addr, "listening");

    tokio::task::spawn_local(cron(Rc::clone(&server)));

    loop {
        let (stream, peer) = listener.accept().await.map_err(|source| Error::Socket { addr, source })?;
        if let Err(err) = stream.set_nodelay(true) {
            tracing::warn!(%err, "failed to set TCP_NODELAY on accepted socket");
        }
        let server = Rc::clone(&server);
        tokio::task::spawn_local(async move {
            Connection::new(stream, peer).run(server).await;
        });
    }
}

fn bind_listener(addr: SocketAddr) -> Result<TcpListener, Error> {
    let domain = if addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
    let socket = Socket::new(domain, Type::STREAM, None).map_err(|source| Error::Socket { addr, source })?;
    socket.set_reuse_address(true).map_err(|source| Error::Socket { addr, source })?;
    socket.set_nonblocking(true).map_err(|source| Error::Socket { addr, source })?;
    socket.bind(&addr.into()).map_err(|source| Error::Socket { addr, source })?;
    socket.listen(1024).map_err(|source| Error::Socket { addr, source })?;
    TcpListener::from_std(socket.into()).map_err(|source| Error::Socket { addr, source })
}

/// `spec.md` §5 "Signals SIGHUP and SIGPIPE are ignored".
fn ignore_disruptive_signals() {
    use nix::sys::signal::{signal, SigHandler, Signal};
    unsafe {
        let _ = signal(Signal::SIGHUP, SigHandler::SigIgn);
        let _ = signal(Signal::SIGPIPE, SigHandler::SigIgn);
    }
}

/// The reactor's periodic timer (spec.md §4.1, §2 "cron"): every second,
/// trigger a background save if any `(seconds, changes)` rule is due.
/// Idle-client eviction happens per-connection instead (see
/// `client::connection::Connection::run`'s read timeout) rather than here,
/// since each task already owns the one piece of state (`last read`) a
/// central scan would otherwise have to track across every client.
async fn cron(server: Rc<ServerState>) {
    let mut interval = tokio::time::interval(CRON_INTERVAL);
    loop {
        interval.tick().await;
        if server.snapshot_due() {
            tracing::info!("dirty threshold reached, starting background save");
            server.start_background_save();
        }
    }
}

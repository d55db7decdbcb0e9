//! `PING`, `ECHO`, `SELECT`, `DBSIZE`, `SAVE`, `BGSAVE`, `LASTSAVE`,
//! `SHUTDOWN`, `TYPE` (spec.md §4.5 Admin).

use bytes::Bytes;

use crate::app::{format_unix, unix_now};
use crate::protocol::{reply, Argv};
use crate::snapshot;

use super::{parse_i64, Context};

pub fn ping(_ctx: &mut Context, _argv: &Argv) -> Bytes {
    reply::pong()
}

pub fn echo(_ctx: &mut Context, argv: &Argv) -> Bytes {
    reply::echo(&argv[1])
}

pub fn select(ctx: &mut Context, argv: &Argv) -> Bytes {
    match parse_i64(&argv[1]) {
        Some(n) if n >= 0 && (n as usize) < ctx.server.keyspace.borrow().dbnum() => {
            *ctx.db_index = n as usize;
            reply::ok()
        }
        _ => reply::error("invalid DB index"),
    }
}

pub fn dbsize(ctx: &mut Context, _argv: &Argv) -> Bytes {
    let len = ctx.server.keyspace.borrow().db(*ctx.db_index).len();
    reply::integer(len as i64)
}

pub fn save(ctx: &mut Context, _argv: &Argv) -> Bytes {
    let keyspace = ctx.server.keyspace.borrow();
    match snapshot::save_foreground(&keyspace, &ctx.server.snapshot_path) {
        Ok(()) => {
            ctx.server.dirty.set(0);
            ctx.server.lastsave.set(unix_now());
            tracing::info!(at = %format_unix(ctx.server.lastsave.get()), "saved");
            reply::ok()
        }
        Err(err) => reply::error(&err.to_string()),
    }
}

pub fn bgsave(ctx: &mut Context, _argv: &Argv) -> Bytes {
    if ctx.server.start_background_save() {
        reply::ok()
    } else {
        reply::error("background save already in progress")
    }
}

pub fn lastsave(ctx: &mut Context, _argv: &Argv) -> Bytes {
    reply::integer(ctx.server.lastsave.get())
}

pub fn shutdown(ctx: &mut Context, _argv: &Argv) -> Bytes {
    let keyspace = ctx.server.keyspace.borrow();
    match snapshot::save_foreground(&keyspace, &ctx.server.snapshot_path) {
        Ok(()) => {
            tracing::info!("saving state before shutdown");
            std::process::exit(exitcode::OK);
        }
        Err(err) => reply::error(&err.to_string()),
    }
}

pub fn type_of(ctx: &mut Context, argv: &Argv) -> Bytes {
    let keyspace = ctx.server.keyspace.borrow();
    let name = match keyspace.db(*ctx.db_index).get(&argv[1]) {
        Some(value) => value.borrow().type_name(),
        None => "none",
    };
    reply::line(name)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use ahash::AHashSet;

    use super::*;
    use crate::client::commands::test_support::server;
    use crate::store::Value;

    fn argv(parts: &[&[u8]]) -> Argv {
        parts.iter().map(|p| Bytes::copy_from_slice(p)).collect()
    }

    #[test]
    fn ping_replies_pong() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        assert_eq!(ping(&mut ctx, &argv(&[b"PING"])).as_ref(), b"+PONG\r\n");
    }

    #[test]
    fn echo_has_no_bulk_framing() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        assert_eq!(echo(&mut ctx, &argv(&[b"ECHO", b"hi"])).as_ref(), b"hi");
    }

    #[test]
    fn select_accepts_in_range_and_rejects_out_of_range() {
        let server = server();
        let mut db_index = 0;
        {
            let mut ctx = Context { server: &server, db_index: &mut db_index };
            assert_eq!(select(&mut ctx, &argv(&[b"SELECT", b"2"])).as_ref(), b"+OK\r\n");
        }
        assert_eq!(db_index, 2);

        let mut ctx = Context { server: &server, db_index: &mut db_index };
        let reply = select(&mut ctx, &argv(&[b"SELECT", b"99"]));
        assert!(reply.starts_with(b"-ERR"));
    }

    #[test]
    fn type_of_reports_all_four_shapes() {
        let server = server();
        let mut db_index = 0;
        {
            let mut keyspace = server.keyspace.borrow_mut();
            let db = keyspace.db_mut(0);
            db.set(Bytes::from_static(b"s"), Value::Str(Bytes::from_static(b"v")).into_ref());
            db.set(Bytes::from_static(b"l"), Value::List(VecDeque::new()).into_ref());
            db.set(Bytes::from_static(b"st"), Value::Set(AHashSet::new()).into_ref());
        }
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        assert_eq!(type_of(&mut ctx, &argv(&[b"TYPE", b"s"])).as_ref(), b"string\r\n");
        assert_eq!(type_of(&mut ctx, &argv(&[b"TYPE", b"l"])).as_ref(), b"list\r\n");
        assert_eq!(type_of(&mut ctx, &argv(&[b"TYPE", b"st"])).as_ref(), b"set\r\n");
        assert_eq!(type_of(&mut ctx, &argv(&[b"TYPE", b"missing"])).as_ref(), b"none\r\n");
    }

    #[test]
    fn dbsize_and_lastsave_read_shared_state() {
        let server = server();
        let mut db_index = 0;
        server.keyspace.borrow_mut().db_mut(0).set(Bytes::from_static(b"k"), Value::Str(Bytes::new()).into_ref());
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        assert_eq!(dbsize(&mut ctx, &argv(&[b"DBSIZE"])).as_ref(), b"1\r\n");
        assert_eq!(lastsave(&mut ctx, &argv(&[b"LASTSAVE"])), reply::integer(server.lastsave.get()));
    }
}

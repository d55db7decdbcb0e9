//! `SET`, `SETNX`, `GET`, `INCR`, `DECR`, `INCRBY`, `DECRBY` (spec.md §4.5
//! String).

use bytes::Bytes;

use crate::protocol::{reply, Argv};
use crate::store::Value;

use super::{parse_i64, Context};

pub fn set(ctx: &mut Context, argv: &Argv) -> Bytes {
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    keyspace
        .db_mut(*ctx.db_index)
        .set(argv[1].clone(), Value::Str(argv[2].clone()).into_ref());
    ctx.server.bump_dirty();
    reply::ok()
}

pub fn setnx(ctx: &mut Context, argv: &Argv) -> Bytes {
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    let db = keyspace.db_mut(*ctx.db_index);
    if db.get(&argv[1]).is_some() {
        return reply::sentinel(0);
    }
    db.set(argv[1].clone(), Value::Str(argv[2].clone()).into_ref());
    ctx.server.bump_dirty();
    reply::sentinel(1)
}

pub fn get(ctx: &mut Context, argv: &Argv) -> Bytes {
    let keyspace = ctx.server.keyspace.borrow();
    match keyspace.db(*ctx.db_index).get(&argv[1]) {
        Some(value) => match value.borrow().as_str() {
            Some(s) => reply::bulk(s),
            None => reply::wrongtype_err_bulk(),
        },
        None => reply::nil(),
    }
}

pub fn incr(ctx: &mut Context, argv: &Argv) -> Bytes {
    apply_delta(ctx, &argv[1], 1)
}

pub fn decr(ctx: &mut Context, argv: &Argv) -> Bytes {
    apply_delta(ctx, &argv[1], -1)
}

pub fn incrby(ctx: &mut Context, argv: &Argv) -> Bytes {
    match parse_i64(&argv[2]) {
        Some(n) => apply_delta(ctx, &argv[1], n),
        None => reply::error("value is not an integer"),
    }
}

pub fn decrby(ctx: &mut Context, argv: &Argv) -> Bytes {
    match parse_i64(&argv[2]) {
        Some(n) => apply_delta(ctx, &argv[1], n.wrapping_neg()),
        None => reply::error("value is not an integer"),
    }
}

/// Shared by `INCR`/`DECR`/`INCRBY`/`DECRBY`. Per spec.md §8 property 8,
/// an absent key *or* a non-string key is treated as `0` rather than a
/// wrong-type error — deliberately lenient, unlike every other string op.
fn apply_delta(ctx: &mut Context, key: &Bytes, delta: i64) -> Bytes {
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    let db = keyspace.db_mut(*ctx.db_index);
    let base = match db.get(key) {
        Some(value) => match &*value.borrow() {
            Value::Str(s) => crate::store::value::parse_counter(Some(s)),
            _ => 0,
        },
        None => 0,
    };
    let next = base.wrapping_add(delta);
    db.set(key.clone(), Value::Str(Bytes::from(next.to_string())).into_ref());
    ctx.server.bump_dirty();
    reply::integer(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::commands::test_support::server;

    fn argv(parts: &[&[u8]]) -> Argv {
        parts.iter().map(|p| Bytes::copy_from_slice(p)).collect()
    }

    #[test]
    fn set_then_get_round_trips() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        assert_eq!(set(&mut ctx, &argv(&[b"SET", b"k", b"v"])).as_ref(), b"+OK\r\n");
        assert_eq!(get(&mut ctx, &argv(&[b"GET", b"k"])).as_ref(), b"1\r\nv\r\n");
    }

    #[test]
    fn incr_on_absent_key_starts_from_zero() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        assert_eq!(incr(&mut ctx, &argv(&[b"INCR", b"counter"])).as_ref(), b"1\r\n");
        assert_eq!(decr(&mut ctx, &argv(&[b"DECR", b"counter"])).as_ref(), b"0\r\n");
    }

    #[test]
    fn incr_on_non_numeric_string_is_treated_as_zero() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        set(&mut ctx, &argv(&[b"SET", b"k", b"not-a-number"]));
        assert_eq!(incrby(&mut ctx, &argv(&[b"INCRBY", b"k", b"5"])).as_ref(), b"5\r\n");
    }

    #[test]
    fn incrby_rejects_non_integer_amount() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        let reply = incrby(&mut ctx, &argv(&[b"INCRBY", b"k", b"not-a-number"]));
        assert!(reply.starts_with(b"-ERR"));
    }
}

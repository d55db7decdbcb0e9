//! `DEL`, `EXISTS`, `RENAME`, `RENAMENX`, `MOVE`, `RANDOMKEY`, `KEYS`
//! (spec.md §4.5 Keyspace admin).

use bytes::{BufMut, Bytes, BytesMut};

use crate::glob;
use crate::protocol::{reply, Argv};

use super::{parse_i64, Context};

pub fn del(ctx: &mut Context, argv: &Argv) -> Bytes {
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    let removed = keyspace.db_mut(*ctx.db_index).remove(&argv[1]).is_some();
    if removed {
        ctx.server.bump_dirty();
    }
    reply::sentinel(removed as i64)
}

pub fn exists(ctx: &mut Context, argv: &Argv) -> Bytes {
    let keyspace = ctx.server.keyspace.borrow();
    let found = keyspace.db(*ctx.db_index).get(&argv[1]).is_some();
    reply::sentinel(found as i64)
}

pub fn rename(ctx: &mut Context, argv: &Argv) -> Bytes {
    if argv[1] == argv[2] {
        return reply::error("src and dest key are the same");
    }
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    let db = keyspace.db_mut(*ctx.db_index);
    let Some(value) = db.remove(&argv[1]) else {
        return reply::no_key_err();
    };
    db.set(argv[2].clone(), value);
    ctx.server.bump_dirty();
    reply::ok()
}

pub fn renamenx(ctx: &mut Context, argv: &Argv) -> Bytes {
    if argv[1] == argv[2] {
        return reply::sentinel(-3);
    }
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    let db = keyspace.db_mut(*ctx.db_index);
    if db.get(&argv[1]).is_none() {
        return reply::sentinel(-1);
    }
    if db.get(&argv[2]).is_some() {
        return reply::sentinel(0);
    }
    let value = db.remove(&argv[1]).expect("checked present above");
    db.set(argv[2].clone(), value);
    ctx.server.bump_dirty();
    reply::sentinel(1)
}

pub fn mv(ctx: &mut Context, argv: &Argv) -> Bytes {
    let Some(target) = parse_i64(&argv[2]) else {
        return reply::sentinel(-4);
    };
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    if target < 0 || target as usize >= keyspace.dbnum() {
        return reply::sentinel(-4);
    }
    let target = target as usize;
    if target == *ctx.db_index {
        return reply::sentinel(-3);
    }
    if keyspace.db(*ctx.db_index).get(&argv[1]).is_none() {
        return reply::sentinel(0);
    }
    if keyspace.db(target).get(&argv[1]).is_some() {
        return reply::sentinel(0);
    }
    let value = keyspace
        .db_mut(*ctx.db_index)
        .remove(&argv[1])
        .expect("checked present above");
    keyspace.db_mut(target).set(argv[1].clone(), value);
    ctx.server.bump_dirty();
    reply::sentinel(1)
}

pub fn randomkey(ctx: &mut Context, _argv: &Argv) -> Bytes {
    let keyspace = ctx.server.keyspace.borrow();
    match keyspace.db(*ctx.db_index).random_key() {
        Some(key) => {
            let mut buf = BytesMut::with_capacity(key.len() + 2);
            buf.put_slice(key);
            buf.put_slice(b"\r\n");
            buf.freeze()
        }
        None => reply::crlf(),
    }
}

/// Reply is a single bulk payload of space-separated matching key bytes
/// (spec.md §4.5, §9 "Open questions"): the C original streams a deferred
/// length-header patch, but with the full result already in memory the
/// equivalent is to join the matches and frame them with one `bulk` call.
pub fn keys(ctx: &mut Context, argv: &Argv) -> Bytes {
    let keyspace = ctx.server.keyspace.borrow();
    let pattern = &argv[1];
    let mut payload = BytesMut::new();
    let mut first = true;
    for key in keyspace.db(*ctx.db_index).map.keys() {
        if glob::matches(pattern, key) {
            if !first {
                payload.put_slice(b" ");
            }
            payload.put_slice(key);
            first = false;
        }
    }
    reply::bulk(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::commands::{string, test_support::server};

    fn argv(parts: &[&[u8]]) -> Argv {
        parts.iter().map(|p| Bytes::copy_from_slice(p)).collect()
    }

    #[test]
    fn del_and_exists_round_trip() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        string::set(&mut ctx, &argv(&[b"SET", b"k", b"v"]));
        assert_eq!(exists(&mut ctx, &argv(&[b"EXISTS", b"k"])).as_ref(), b"1\r\n");
        assert_eq!(del(&mut ctx, &argv(&[b"DEL", b"k"])).as_ref(), b"1\r\n");
        assert_eq!(exists(&mut ctx, &argv(&[b"EXISTS", b"k"])).as_ref(), b"0\r\n");
    }

    #[test]
    fn renamenx_rejects_when_dest_exists() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        string::set(&mut ctx, &argv(&[b"SET", b"src", b"v1"]));
        string::set(&mut ctx, &argv(&[b"SET", b"dst", b"v2"]));
        assert_eq!(renamenx(&mut ctx, &argv(&[b"RENAMENX", b"src", b"dst"])).as_ref(), b"0\r\n");
    }

    #[test]
    fn renamenx_on_missing_source_is_minus_one() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        assert_eq!(renamenx(&mut ctx, &argv(&[b"RENAMENX", b"missing", b"dst"])).as_ref(), b"-1\r\n");
    }

    #[test]
    fn move_rejects_same_db_and_out_of_range_db() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        string::set(&mut ctx, &argv(&[b"SET", b"k", b"v"]));
        assert_eq!(mv(&mut ctx, &argv(&[b"MOVE", b"k", b"0"])).as_ref(), b"-3\r\n");
        assert_eq!(mv(&mut ctx, &argv(&[b"MOVE", b"k", b"99"])).as_ref(), b"-4\r\n");
    }

    #[test]
    fn move_relocates_key_to_target_db() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        string::set(&mut ctx, &argv(&[b"SET", b"k", b"v"]));
        assert_eq!(mv(&mut ctx, &argv(&[b"MOVE", b"k", b"1"])).as_ref(), b"1\r\n");
        assert_eq!(exists(&mut ctx, &argv(&[b"EXISTS", b"k"])).as_ref(), b"0\r\n");
        *ctx.db_index = 1;
        assert_eq!(exists(&mut ctx, &argv(&[b"EXISTS", b"k"])).as_ref(), b"1\r\n");
    }

    #[test]
    fn randomkey_on_empty_db_is_bare_crlf() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        assert_eq!(randomkey(&mut ctx, &argv(&[b"RANDOMKEY"])).as_ref(), b"\r\n");
    }

    #[test]
    fn keys_matches_glob_pattern() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        string::set(&mut ctx, &argv(&[b"SET", b"foo", b"1"]));
        string::set(&mut ctx, &argv(&[b"SET", b"bar", b"2"]));
        let reply = keys(&mut ctx, &argv(&[b"KEYS", b"fo*"]));
        assert_eq!(reply.as_ref(), b"3\r\nfoo\r\n");
    }
}

//! `SADD`, `SREM`, `SISMEMBER`, `SCARD`, `SINTER`, `SMEMBERS` (spec.md §4.5
//! Set).

use ahash::AHashSet;
use bytes::Bytes;

use crate::protocol::{reply, Argv};
use crate::store::{Database, Value, ValueRef};

use super::Context;

pub fn sadd(ctx: &mut Context, argv: &Argv) -> Bytes {
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    let db = keyspace.db_mut(*ctx.db_index);
    let value_ref = db
        .get(&argv[1])
        .cloned()
        .unwrap_or_else(|| Value::Set(AHashSet::new()).into_ref());
    let mut value = value_ref.borrow_mut();
    let Some(set) = value.as_set_mut() else {
        return reply::wrongtype_err();
    };
    let inserted = set.insert(argv[2].clone());
    drop(value);
    db.set(argv[1].clone(), value_ref);
    if inserted {
        ctx.server.bump_dirty();
    }
    reply::sentinel(inserted as i64)
}

pub fn srem(ctx: &mut Context, argv: &Argv) -> Bytes {
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    let db = keyspace.db_mut(*ctx.db_index);
    let Some(value_ref) = db.get(&argv[1]) else {
        return reply::sentinel(0);
    };
    let mut value = value_ref.borrow_mut();
    let Some(set) = value.as_set_mut() else {
        return reply::wrongtype_err();
    };
    let removed = set.remove(&argv[2]);
    if removed {
        ctx.server.bump_dirty();
    }
    reply::sentinel(removed as i64)
}

pub fn sismember(ctx: &mut Context, argv: &Argv) -> Bytes {
    let keyspace = ctx.server.keyspace.borrow();
    match keyspace.db(*ctx.db_index).get(&argv[1]) {
        Some(value) => match value.borrow().as_set() {
            Some(set) => reply::sentinel(set.contains(&argv[2]) as i64),
            None => reply::wrongtype_err(),
        },
        None => reply::sentinel(0),
    }
}

pub fn scard(ctx: &mut Context, argv: &Argv) -> Bytes {
    let keyspace = ctx.server.keyspace.borrow();
    match keyspace.db(*ctx.db_index).get(&argv[1]) {
        Some(value) => match value.borrow().as_set() {
            Some(set) => reply::sentinel(set.len() as i64),
            None => reply::wrongtype_err(),
        },
        None => reply::sentinel(0),
    }
}

/// `SMEMBERS k` is `SINTER k` with a single operand (spec.md §9 "Open
/// questions / source quirks").
pub fn smembers(ctx: &mut Context, argv: &Argv) -> Bytes {
    sinter(ctx, argv)
}

/// Intersect the sets named by `argv[1..]` (spec.md §4.5 Set): any missing
/// key yields `nil`, any wrong-type yields `wrongtypeerrbulk`. The C
/// original streams the reply and patches a deferred length header; since
/// this implementation computes the whole result in memory up front
/// anyway, it builds the match list eagerly and calls `multi_bulk` once —
/// byte-identical on the wire, no header patch required.
pub fn sinter(ctx: &mut Context, argv: &Argv) -> Bytes {
    let keyspace = ctx.server.keyspace.borrow();
    let db: &Database = keyspace.db(*ctx.db_index);

    let mut sets: Vec<ValueRef> = Vec::with_capacity(argv.len() - 1);
    for key in argv.iter().skip(1) {
        match db.get(key) {
            Some(value_ref) => sets.push(value_ref.clone()),
            None => return reply::nil(),
        }
    }
    for value_ref in &sets {
        if value_ref.borrow().as_set().is_none() {
            return reply::wrongtype_err_bulk();
        }
    }

    sets.sort_by_key(|v| v.borrow().as_set().unwrap().len());
    if sets[0].borrow().as_set().unwrap().is_empty() {
        return reply::nil();
    }

    let borrows: Vec<_> = sets.iter().map(|v| v.borrow()).collect();
    let smallest = borrows[0].as_set().unwrap();
    let rest: Vec<&AHashSet<Bytes>> = borrows[1..].iter().map(|b| b.as_set().unwrap()).collect();

    let matches: Vec<Bytes> = smallest
        .iter()
        .filter(|member| rest.iter().all(|other| other.contains(*member)))
        .cloned()
        .collect();

    let items: Vec<&[u8]> = matches.iter().map(Bytes::as_ref).collect();
    reply::multi_bulk(items.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::commands::{string, test_support::server};

    fn argv(parts: &[&[u8]]) -> Argv {
        parts.iter().map(|p| Bytes::copy_from_slice(p)).collect()
    }

    #[test]
    fn sadd_sismember_scard_round_trip() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        assert_eq!(sadd(&mut ctx, &argv(&[b"SADD", b"s", b"x"])).as_ref(), b"1\r\n");
        assert_eq!(sadd(&mut ctx, &argv(&[b"SADD", b"s", b"x"])).as_ref(), b"0\r\n");
        assert_eq!(sismember(&mut ctx, &argv(&[b"SISMEMBER", b"s", b"x"])).as_ref(), b"1\r\n");
        assert_eq!(scard(&mut ctx, &argv(&[b"SCARD", b"s"])).as_ref(), b"1\r\n");
    }

    #[test]
    fn sinter_on_missing_key_is_nil() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        sadd(&mut ctx, &argv(&[b"SADD", b"s1", b"x"]));
        assert_eq!(sinter(&mut ctx, &argv(&[b"SINTER", b"s1", b"missing"])).as_ref(), b"nil\r\n");
    }

    #[test]
    fn sinter_on_wrong_type_participant_is_wrongtype_error() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        sadd(&mut ctx, &argv(&[b"SADD", b"s1", b"x"]));
        string::set(&mut ctx, &argv(&[b"SET", b"notaset", b"v"]));
        let reply = sinter(&mut ctx, &argv(&[b"SINTER", b"s1", b"notaset"]));
        assert!(reply.starts_with(b"-ERR Operation against a key holding the wrong kind of value"));
    }

    /// A present-but-empty participant (e.g. every member removed via
    /// `SREM`, leaving the key behind) must still reply `nil`, not an empty
    /// multi-bulk — the key existing is not the same as the set being
    /// non-empty.
    #[test]
    fn sinter_on_emptied_set_is_nil() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        sadd(&mut ctx, &argv(&[b"SADD", b"s1", b"x"]));
        srem(&mut ctx, &argv(&[b"SREM", b"s1", b"x"]));
        sadd(&mut ctx, &argv(&[b"SADD", b"s2", b"y"]));
        assert_eq!(sinter(&mut ctx, &argv(&[b"SINTER", b"s1", b"s2"])).as_ref(), b"nil\r\n");
    }

    #[test]
    fn smembers_is_sinter_with_one_operand() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        sadd(&mut ctx, &argv(&[b"SADD", b"s", b"x"]));
        assert_eq!(smembers(&mut ctx, &argv(&[b"SMEMBERS", b"s"])).as_ref(), b"1\r\n1\r\nx\r\n");
    }
}

//! `LPUSH`, `RPUSH`, `LPOP`, `RPOP`, `LLEN`, `LINDEX`, `LSET`, `LRANGE`,
//! `LTRIM` (spec.md §4.5 List).

use std::collections::VecDeque;

use bytes::Bytes;

use crate::protocol::{reply, Argv};
use crate::store::Value;

use super::{normalize_range, parse_i64, Context};

pub fn lpush(ctx: &mut Context, argv: &Argv) -> Bytes {
    push(ctx, argv, true)
}

pub fn rpush(ctx: &mut Context, argv: &Argv) -> Bytes {
    push(ctx, argv, false)
}

fn push(ctx: &mut Context, argv: &Argv, at_head: bool) -> Bytes {
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    let db = keyspace.db_mut(*ctx.db_index);
    let value_ref = db
        .get(&argv[1])
        .cloned()
        .unwrap_or_else(|| Value::List(VecDeque::new()).into_ref());
    let mut value = value_ref.borrow_mut();
    let Some(list) = value.as_list_mut() else {
        return reply::wrongtype_err();
    };
    if at_head {
        list.push_front(argv[2].clone());
    } else {
        list.push_back(argv[2].clone());
    }
    let new_len = list.len();
    drop(value);
    db.set(argv[1].clone(), value_ref);
    ctx.server.bump_dirty();
    reply::integer(new_len as i64)
}

pub fn lpop(ctx: &mut Context, argv: &Argv) -> Bytes {
    pop(ctx, argv, true)
}

pub fn rpop(ctx: &mut Context, argv: &Argv) -> Bytes {
    pop(ctx, argv, false)
}

fn pop(ctx: &mut Context, argv: &Argv, from_head: bool) -> Bytes {
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    let db = keyspace.db_mut(*ctx.db_index);
    let Some(value_ref) = db.get(&argv[1]) else {
        return reply::nil();
    };
    let mut value = value_ref.borrow_mut();
    let Some(list) = value.as_list_mut() else {
        return reply::wrongtype_err_bulk();
    };
    let popped = if from_head { list.pop_front() } else { list.pop_back() };
    match popped {
        Some(item) => {
            ctx.server.bump_dirty();
            reply::bulk(&item)
        }
        None => reply::nil(),
    }
}

pub fn llen(ctx: &mut Context, argv: &Argv) -> Bytes {
    let keyspace = ctx.server.keyspace.borrow();
    match keyspace.db(*ctx.db_index).get(&argv[1]) {
        Some(value) => match value.borrow().as_list() {
            Some(list) => reply::sentinel(list.len() as i64),
            None => reply::sentinel(-2),
        },
        None => reply::sentinel(0),
    }
}

pub fn lindex(ctx: &mut Context, argv: &Argv) -> Bytes {
    let Some(requested) = parse_i64(&argv[2]) else {
        return reply::error("index is not an integer");
    };
    let keyspace = ctx.server.keyspace.borrow();
    match keyspace.db(*ctx.db_index).get(&argv[1]) {
        Some(value) => match value.borrow().as_list() {
            Some(list) => match resolve_index(requested, list.len()) {
                Some(i) => reply::bulk(&list[i]),
                None => reply::nil(),
            },
            None => reply::wrongtype_err_bulk(),
        },
        None => reply::nil(),
    }
}

pub fn lset(ctx: &mut Context, argv: &Argv) -> Bytes {
    let Some(requested) = parse_i64(&argv[2]) else {
        return reply::error("index is not an integer");
    };
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    let db = keyspace.db_mut(*ctx.db_index);
    let Some(value_ref) = db.get(&argv[1]) else {
        return reply::no_key_err();
    };
    let mut value = value_ref.borrow_mut();
    let Some(list) = value.as_list_mut() else {
        return reply::wrongtype_err();
    };
    match resolve_index(requested, list.len()) {
        Some(i) => {
            list[i] = argv[3].clone();
            drop(value);
            ctx.server.bump_dirty();
            reply::ok()
        }
        None => reply::error("index out of range"),
    }
}

pub fn lrange(ctx: &mut Context, argv: &Argv) -> Bytes {
    let (Some(start), Some(end)) = (parse_i64(&argv[2]), parse_i64(&argv[3])) else {
        return reply::error("index is not an integer");
    };
    let keyspace = ctx.server.keyspace.borrow();
    let list = match keyspace.db(*ctx.db_index).get(&argv[1]) {
        Some(value) => match value.borrow().as_list() {
            Some(list) => list.iter().cloned().collect::<Vec<Bytes>>(),
            None => return reply::wrongtype_err(),
        },
        None => Vec::new(),
    };
    match normalize_range(start, end, list.len()) {
        Some((s, e)) => {
            let items: Vec<&[u8]> = list[s..=e].iter().map(Bytes::as_ref).collect();
            reply::multi_bulk(items.into_iter())
        }
        None => reply::multi_bulk(std::iter::empty()),
    }
}

pub fn ltrim(ctx: &mut Context, argv: &Argv) -> Bytes {
    let (Some(start), Some(end)) = (parse_i64(&argv[2]), parse_i64(&argv[3])) else {
        return reply::error("index is not an integer");
    };
    let mut keyspace = ctx.server.keyspace.borrow_mut();
    let db = keyspace.db_mut(*ctx.db_index);
    let Some(value_ref) = db.get(&argv[1]) else {
        return reply::ok();
    };
    let mut value = value_ref.borrow_mut();
    let Some(list) = value.as_list_mut() else {
        return reply::wrongtype_err();
    };
    match normalize_range(start, end, list.len()) {
        Some((s, e)) => {
            let trimmed: VecDeque<Bytes> = list.iter().skip(s).take(e - s + 1).cloned().collect();
            *list = trimmed;
        }
        None => list.clear(),
    }
    drop(value);
    ctx.server.bump_dirty();
    reply::ok()
}

/// Turn a possibly-negative user index into an in-bounds `usize`, or
/// `None` if it falls outside `0..len` after resolution.
fn resolve_index(requested: i64, len: usize) -> Option<usize> {
    let resolved = if requested < 0 { requested + len as i64 } else { requested };
    if resolved < 0 || resolved as usize >= len {
        None
    } else {
        Some(resolved as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::commands::test_support::server;

    fn argv(parts: &[&[u8]]) -> Argv {
        parts.iter().map(|p| Bytes::copy_from_slice(p)).collect()
    }

    #[test]
    fn rpush_replies_with_new_length() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        assert_eq!(rpush(&mut ctx, &argv(&[b"RPUSH", b"l", b"a"])).as_ref(), b"1\r\n");
        assert_eq!(rpush(&mut ctx, &argv(&[b"RPUSH", b"l", b"b"])).as_ref(), b"2\r\n");
    }

    #[test]
    fn lset_out_of_range_is_an_error() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        rpush(&mut ctx, &argv(&[b"RPUSH", b"l", b"a"]));
        let reply = lset(&mut ctx, &argv(&[b"LSET", b"l", b"5", b"z"]));
        assert_eq!(reply.as_ref(), b"-ERR index out of range\r\n");
    }

    #[test]
    fn lset_on_missing_key_is_no_key_error() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        let reply = lset(&mut ctx, &argv(&[b"LSET", b"missing", b"0", b"z"]));
        assert!(reply.starts_with(b"-ERR no such key"));
    }

    #[test]
    fn ltrim_to_empty_range_clears_but_keeps_the_key() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        rpush(&mut ctx, &argv(&[b"RPUSH", b"l", b"a"]));
        assert_eq!(ltrim(&mut ctx, &argv(&[b"LTRIM", b"l", b"5", b"10"])).as_ref(), b"+OK\r\n");
        assert_eq!(llen(&mut ctx, &argv(&[b"LLEN", b"l"])).as_ref(), b"0\r\n");
    }

    #[test]
    fn llen_distinguishes_absent_from_wrong_type() {
        let server = server();
        let mut db_index = 0;
        let mut ctx = Context { server: &server, db_index: &mut db_index };
        assert_eq!(llen(&mut ctx, &argv(&[b"LLEN", b"missing"])).as_ref(), b"0\r\n");
        crate::client::commands::string::set(&mut ctx, &argv(&[b"SET", b"s", b"v"]));
        assert_eq!(llen(&mut ctx, &argv(&[b"LLEN", b"s"])).as_ref(), b"-2\r\n");
    }
}

//! The command table (spec.md §4.3 "Dispatch" steps 3–5): name, arity,
//! whether the last inline token is actually a bulk-payload length, and the
//! handler. Mirrors the teacher's `match query_parts[0].to_ascii_uppercase()`
//! admin dispatcher, but as a static table rather than an inline match, since
//! the bulk-flag and arity need to be inspected before the handler runs.

use crate::client::commands::{admin, keys, list, set, string, Context};
use crate::protocol::Argv;
use bytes::Bytes;

pub type Handler = fn(&mut Context, &Argv) -> Bytes;

pub struct Command {
    pub name: &'static [u8],
    /// Positive: exact argc (including the command name). Negative:
    /// minimum argc, magnitude (spec.md §4.3 step 4).
    pub arity: i32,
    /// Whether the final inline token is a bulk-payload length rather than
    /// a literal argument (spec.md §4.3 step 5).
    pub bulk: bool,
    pub handler: Handler,
}

/// `true` iff `argc` satisfies `arity` per spec.md §4.3 step 4.
pub fn arity_ok(arity: i32, argc: i32) -> bool {
    if arity > 0 {
        argc == arity
    } else {
        argc >= -arity
    }
}

pub fn lookup(name: &[u8]) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.name == name)
}

macro_rules! cmd {
    ($name:literal, $arity:expr, $bulk:expr, $handler:expr) => {
        Command {
            name: $name,
            arity: $arity,
            bulk: $bulk,
            handler: $handler,
        }
    };
}

pub static COMMANDS: &[Command] = &[
    cmd!(b"ping", 1, false, admin::ping),
    cmd!(b"echo", 2, true, admin::echo),
    cmd!(b"select", 2, false, admin::select),
    cmd!(b"dbsize", 1, false, admin::dbsize),
    cmd!(b"save", 1, false, admin::save),
    cmd!(b"bgsave", 1, false, admin::bgsave),
    cmd!(b"lastsave", 1, false, admin::lastsave),
    cmd!(b"shutdown", 1, false, admin::shutdown),
    cmd!(b"type", 2, false, admin::type_of),
    cmd!(b"set", 3, true, string::set),
    cmd!(b"setnx", 3, true, string::setnx),
    cmd!(b"get", 2, false, string::get),
    cmd!(b"incr", 2, false, string::incr),
    cmd!(b"decr", 2, false, string::decr),
    cmd!(b"incrby", 3, false, string::incrby),
    cmd!(b"decrby", 3, false, string::decrby),
    cmd!(b"lpush", 3, true, list::lpush),
    cmd!(b"rpush", 3, true, list::rpush),
    cmd!(b"lpop", 2, false, list::lpop),
    cmd!(b"rpop", 2, false, list::rpop),
    cmd!(b"llen", 2, false, list::llen),
    cmd!(b"lindex", 3, false, list::lindex),
    cmd!(b"lset", 4, true, list::lset),
    cmd!(b"lrange", 4, false, list::lrange),
    cmd!(b"ltrim", 4, false, list::ltrim),
    cmd!(b"sadd", 3, true, set::sadd),
    cmd!(b"srem", 3, true, set::srem),
    cmd!(b"sismember", 3, true, set::sismember),
    cmd!(b"scard", 2, false, set::scard),
    cmd!(b"sinter", -2, false, set::sinter),
    cmd!(b"smembers", 2, false, set::smembers),
    cmd!(b"del", 2, false, keys::del),
    cmd!(b"exists", 2, false, keys::exists),
    cmd!(b"rename", 3, false, keys::rename),
    cmd!(b"renamenx", 3, false, keys::renamenx),
    cmd!(b"move", 3, false, keys::mv),
    cmd!(b"randomkey", 1, false, keys::randomkey),
    cmd!(b"keys", 2, false, keys::keys),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_known_commands_case_sensitively_after_lowercasing() {
        assert!(lookup(b"get").is_some());
        assert!(lookup(b"GET").is_none());
        assert!(lookup(b"frobnicate").is_none());
    }

    #[test]
    fn arity_checks_exact_and_minimum() {
        assert!(arity_ok(3, 3));
        assert!(!arity_ok(3, 2));
        assert!(arity_ok(-2, 2));
        assert!(arity_ok(-2, 5));
        assert!(!arity_ok(-2, 1));
    }
}

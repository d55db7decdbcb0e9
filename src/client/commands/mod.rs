//! Command handlers (spec.md §4.5), one module per family, mirroring the
//! teacher's `admin/commands.rs` split of "one function per wire command".

pub mod admin;
pub mod keys;
pub mod list;
pub mod set;
pub mod string;

use std::rc::Rc;

use crate::app::ServerState;

/// Everything a handler needs besides its own argv: the shared server
/// state and the connection's currently-selected database index (only
/// `SELECT` writes through this; every other handler reads it).
pub struct Context<'a> {
    pub server: &'a Rc<ServerState>,
    pub db_index: &'a mut usize,
}

/// Parse a base-10 signed integer argument, trimming surrounding
/// whitespace the way the C original's `strtoll`-based parsing tolerates.
pub fn parse_i64(arg: &[u8]) -> Option<i64> {
    std::str::from_utf8(arg).ok()?.trim().parse::<i64>().ok()
}

/// Normalize a `LRANGE`/`LTRIM` index pair against a list of length `len`
/// (spec.md §4.5 List): negative indexes count from the tail, the start
/// clamps to 0, the end clamps to `len - 1`. Returns `None` when the
/// normalized range is empty (`start > end` or `start >= len`).
pub fn normalize_range(start: i64, end: i64, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as i64;
    let start = if start < 0 { (start + len).max(0) } else { start };
    let end = if end < 0 { end + len } else { end }.min(len - 1);
    if start > end || start >= len {
        return None;
    }
    Some((start as usize, end as usize))
}

/// Test-only plumbing shared by every command module's `#[cfg(test)]` block:
/// a fresh `ServerState` plus a `Context` borrowing it, so handler tests can
/// call a handler directly without booting a connection or a runtime.
#[cfg(test)]
pub(crate) mod test_support {
    use std::rc::Rc;

    use crate::app::ServerState;
    use crate::config::Config;
    use crate::store::Keyspace;

    pub(crate) fn server() -> Rc<ServerState> {
        let config = Config { databases: 4, ..Config::default() };
        Rc::new(ServerState::new(&config, Keyspace::new(config.databases)))
    }
}

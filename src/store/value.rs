//! The value object: a tagged union of {string, list, set}.
//!
//! Sharing follows spec.md ยง3/Design Notes: a [`ValueRef`] is an `Rc`, so
//! Rust's own strong count plays the role of the refcount the spec
//! describes, and `Drop` is the single teardown point. No hand-rolled
//! freelist is kept — the allocator already amortizes small `Rc` headers,
//! and the spec treats its freelist purely as an implementation detail for
//! languages without built-in refcounting.
//!
//! List and set payloads are mutated in place (`LPUSH`, `SADD`, ...)
//! because, by construction, a container `Value` is only ever reachable
//! through its one keyspace entry: command handlers clone a key's `Bytes`
//! for argv, never the container itself.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use ahash::AHashSet;
use bytes::Bytes;

pub type ValueRef = Rc<RefCell<Value>>;

#[derive(Debug, Clone)]
pub enum Value {
    Str(Bytes),
    List(VecDeque<Bytes>),
    Set(AHashSet<Bytes>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
        }
    }

    pub fn into_ref(self) -> ValueRef {
        Rc::new(RefCell::new(self))
    }

    pub fn as_str(&self) -> Option<&Bytes> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&VecDeque<Bytes>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut VecDeque<Bytes>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&AHashSet<Bytes>> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_set_mut(&mut self) -> Option<&mut AHashSet<Bytes>> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }
}

/// Parse a value as a signed 64-bit integer the way `INCR`/`DECR` do:
/// an absent key or a non-numeric string is treated as `0` rather than an
/// error (spec.md ยง4.5, ยง8 property 8 — deliberately not a wrong-type
/// check).
pub fn parse_counter(value: Option<&Bytes>) -> i64 {
    value
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_absent_is_zero() {
        assert_eq!(parse_counter(None), 0);
    }

    #[test]
    fn counter_non_numeric_is_zero() {
        let bytes = Bytes::from_static(b"not-a-number");
        assert_eq!(parse_counter(Some(&bytes)), 0);
    }

    #[test]
    fn counter_parses_signed() {
        let bytes = Bytes::from_static(b"-42");
        assert_eq!(parse_counter(Some(&bytes)), -42);
    }

    #[test]
    fn list_push_mutates_in_place() {
        let value = Value::List(VecDeque::new()).into_ref();
        value.borrow_mut().as_list_mut().unwrap().push_back(Bytes::from_static(b"a"));
        assert_eq!(value.borrow().as_list().unwrap().len(), 1);
    }
}

//! Shared reply singletons and reply-frame builders (spec.md ยง3 "Shared
//! reply singletons", ยง6 "Wire protocol").
//!
//! The C original pre-allocates and refcounts a handful of constant reply
//! objects to avoid allocation on hot paths. `Bytes::from_static` gives us
//! the same property for free: wrapping a `&'static [u8]` never touches the
//! allocator, so there is nothing to pool.

use bytes::{BufMut, Bytes, BytesMut};

pub fn ok() -> Bytes {
    Bytes::from_static(b"+OK\r\n")
}

pub fn pong() -> Bytes {
    Bytes::from_static(b"+PONG\r\n")
}

pub fn nil() -> Bytes {
    Bytes::from_static(b"nil\r\n")
}

pub fn crlf() -> Bytes {
    Bytes::from_static(b"\r\n")
}

pub fn space() -> Bytes {
    Bytes::from_static(b" ")
}

pub fn sentinel(n: i64) -> Bytes {
    match n {
        0 => Bytes::from_static(b"0\r\n"),
        1 => Bytes::from_static(b"1\r\n"),
        -1 => Bytes::from_static(b"-1\r\n"),
        -2 => Bytes::from_static(b"-2\r\n"),
        -3 => Bytes::from_static(b"-3\r\n"),
        -4 => Bytes::from_static(b"-4\r\n"),
        other => integer(other),
    }
}

/// A bare integer line, e.g. the new value after `INCR`/`DECR`, or a count.
pub fn integer(n: i64) -> Bytes {
    let mut buf = BytesMut::with_capacity(24);
    buf.put_slice(n.to_string().as_bytes());
    buf.put_slice(b"\r\n");
    buf.freeze()
}

pub fn error(message: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(message.len() + 8);
    buf.put_slice(b"-ERR ");
    buf.put_slice(message.as_bytes());
    buf.put_slice(b"\r\n");
    buf.freeze()
}

pub fn unknown_command() -> Bytes {
    error("unknown command")
}

pub fn wrong_arity() -> Bytes {
    error("wrong number of arguments")
}

/// The wrong-type error used in inline contexts (e.g. after `TYPE`-shaped
/// replies). Identical text to [`wrongtype_err_bulk`]; the spec keeps two
/// named singletons because the C original distinguishes them by the
/// pointer used at each call site, not by content.
pub fn wrongtype_err() -> Bytes {
    error("Operation against a key holding the wrong kind of value")
}

/// The wrong-type error used where the command's reply would otherwise be
/// bulk-framed (e.g. `GET`, `SINTER`). See [`wrongtype_err`].
pub fn wrongtype_err_bulk() -> Bytes {
    wrongtype_err()
}

pub fn no_key_err() -> Bytes {
    error("no such key")
}

/// A bare `<text>\r\n` line with no status/error prefix, used by `TYPE`.
pub fn line(text: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(text.len() + 2);
    buf.put_slice(text.as_bytes());
    buf.put_slice(b"\r\n");
    buf.freeze()
}

/// A single bulk reply: `<len>\r\n<bytes>\r\n`.
pub fn bulk(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + 16);
    buf.put_slice(payload.len().to_string().as_bytes());
    buf.put_slice(b"\r\n");
    buf.put_slice(payload);
    buf.put_slice(b"\r\n");
    buf.freeze()
}

/// `ECHO`'s reply is a bulk payload *without* the conventional bulk framing
/// (no length header, no trailing CR LF beyond what the caller appends) —
/// spec.md Design Notes call this out explicitly as a byte-for-byte quirk
/// implementers must preserve.
pub fn echo(payload: &[u8]) -> Bytes {
    Bytes::copy_from_slice(payload)
}

/// A multi-bulk reply: `<count>\r\n` followed by `count` bulk frames.
pub fn multi_bulk<'a>(items: impl ExactSizeIterator<Item = &'a [u8]>) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_slice(items.len().to_string().as_bytes());
    buf.put_slice(b"\r\n");
    for item in items {
        buf.put_slice(item.len().to_string().as_bytes());
        buf.put_slice(b"\r\n");
        buf.put_slice(item);
        buf.put_slice(b"\r\n");
    }
    buf.freeze()
}

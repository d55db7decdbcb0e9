//! Errors.

use std::io;
use std::net::SocketAddr;

/// Top-level error type for everything that can abort a connection or the process.
///
/// Recoverable command-level conditions (wrong type, missing key, bad arity) are
/// not represented here: those are reply values, not errors. See
/// [`crate::protocol::Reply`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("socket error talking to {addr}: {source}")]
    Socket {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{path}:{line}: {message}")]
    BadDirective {
        path: String,
        line: usize,
        message: String,
    },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to open logfile {path}: {source}")]
    LogfileUnopenable {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to chdir into {dir}: {source}")]
    BadDir {
        dir: String,
        #[source]
        source: io::Error,
    },
}

/// Connection-ending protocol violations: oversized unterminated inline
/// command, a bad bulk length. Per spec.md ยง4.3/ยง7 these close the
/// connection; they never reach the client as a wire reply.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("inline command line exceeds 1024 bytes without a terminator")]
    InlineRequestTooLong,
    #[error("invalid bulk length {0:?}")]
    InvalidBulkLength(String),
    #[error("too many arguments (max 16)")]
    TooManyArguments,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bad magic header, expected REDIS0000")]
    BadMagic,
    #[error("database index {0} exceeds configured databases")]
    DbIndexOverflow(u32),
    #[error("duplicate key in database {db} while loading snapshot")]
    DuplicateKey { db: usize },
    #[error("short read while loading snapshot: wanted {want} bytes, got {got}")]
    ShortRead { want: usize, got: usize },
    #[error("unknown value type tag {0}")]
    UnknownTypeTag(u8),
    #[error(transparent)]
    Io(#[from] io::Error),
}

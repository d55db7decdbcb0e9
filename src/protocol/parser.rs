//! The two-mode parser state machine (spec.md ยง4.3).

use bytes::{Bytes, BytesMut};
use smallvec::SmallVec;

use crate::errors::ProtocolError;

pub const MAX_ARGS: usize = 16;
pub const MAX_INLINE_LEN: usize = 1024;
pub const MAX_BULK_LEN: i64 = 1024 * 1024 * 1024; // 1 GiB

pub type Argv = SmallVec<[Bytes; MAX_ARGS]>;

/// What the parser is waiting for next.
pub enum Mode {
    /// Awaiting a newline-terminated command line.
    Inline,
    /// Awaiting exactly `bulklen` more bytes, including the trailing CR LF.
    Bulk(usize),
}

/// Owns the partial-command state that must survive across socket reads:
/// already-tokenized leading arguments plus, in bulk mode, how many more
/// bytes are needed to complete the final argument.
pub struct Parser {
    pub argv: Argv,
    pub mode: Mode,
}

impl Default for Parser {
    fn default() -> Self {
        Parser {
            argv: SmallVec::new(),
            mode: Mode::Inline,
        }
    }
}

impl Parser {
    pub fn reset(&mut self) {
        self.argv.clear();
        self.mode = Mode::Inline;
    }

    /// Enter bulk mode: the caller has already determined the payload
    /// length `n` (spec.md ยง4.3 step 5); `bulklen` accounts for the
    /// trailing CR LF.
    pub fn begin_bulk(&mut self, n: usize) {
        self.mode = Mode::Bulk(n + 2);
    }

    /// Try to make progress against buffered bytes. Returns:
    /// - `Ok(Some(()))` when a complete command line (inline mode) or bulk
    ///   payload has just been consumed into `self.argv` — the caller
    ///   should inspect `self.argv` and dispatch.
    /// - `Ok(None)` when more bytes are needed.
    /// - `Err(_)` on a connection-ending protocol violation.
    pub fn step(&mut self, buf: &mut BytesMut) -> Result<Option<()>, ProtocolError> {
        match self.mode {
            Mode::Inline => self.step_inline(buf),
            Mode::Bulk(bulklen) => self.step_bulk(buf, bulklen),
        }
    }

    fn step_inline(&mut self, buf: &mut BytesMut) -> Result<Option<()>, ProtocolError> {
        loop {
            let newline = buf.iter().position(|&b| b == b'\n');
            let Some(pos) = newline else {
                if buf.len() > MAX_INLINE_LEN {
                    return Err(ProtocolError::InlineRequestTooLong);
                }
                return Ok(None);
            };

            let mut line = buf.split_to(pos + 1);
            line.truncate(line.len() - 1); // drop '\n'
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }

            if line.is_empty() {
                // Empty lines are silently skipped; keep looking for the
                // next line already in the buffer.
                continue;
            }

            self.argv = tokenize(&line);
            if self.argv.len() > MAX_ARGS {
                return Err(ProtocolError::TooManyArguments);
            }
            return Ok(Some(()));
        }
    }

    fn step_bulk(&mut self, buf: &mut BytesMut, bulklen: usize) -> Result<Option<()>, ProtocolError> {
        if buf.len() < bulklen {
            return Ok(None);
        }
        let mut payload = buf.split_to(bulklen);
        payload.truncate(bulklen - 2); // drop trailing CR LF
        self.argv.push(payload.freeze());
        self.mode = Mode::Inline;
        Ok(Some(()))
    }
}

fn tokenize(line: &[u8]) -> Argv {
    line.split(|&b| b == b' ')
        .filter(|tok| !tok.is_empty())
        .map(Bytes::copy_from_slice)
        .collect()
}

/// Parse and validate a bulk-length argument (spec.md ยง4.3 step 5):
/// a non-negative integer no greater than 1 GiB.
pub fn parse_bulk_len(arg: &[u8]) -> Result<usize, ProtocolError> {
    let text = std::str::from_utf8(arg)
        .map_err(|_| ProtocolError::InvalidBulkLength(String::from_utf8_lossy(arg).into_owned()))?;
    let n: i64 = text
        .parse()
        .map_err(|_| ProtocolError::InvalidBulkLength(text.to_string()))?;
    if n < 0 || n > MAX_BULK_LEN {
        return Err(ProtocolError::InvalidBulkLength(text.to_string()));
    }
    Ok(n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_mode_tokenizes_on_space() {
        let mut parser = Parser::default();
        let mut buf = BytesMut::from(&b"SET foo bar\r\n"[..]);
        assert!(parser.step(&mut buf).unwrap().is_some());
        assert_eq!(parser.argv.len(), 3);
        assert_eq!(&parser.argv[0][..], b"SET");
    }

    #[test]
    fn empty_lines_are_skipped() {
        let mut parser = Parser::default();
        let mut buf = BytesMut::from(&b"\r\n\r\nPING\r\n"[..]);
        assert!(parser.step(&mut buf).unwrap().is_some());
        assert_eq!(&parser.argv[0][..], b"PING");
    }

    #[test]
    fn incomplete_line_waits_for_more_bytes() {
        let mut parser = Parser::default();
        let mut buf = BytesMut::from(&b"PI"[..]);
        assert!(parser.step(&mut buf).unwrap().is_none());
    }

    #[test]
    fn oversized_inline_without_newline_is_an_error() {
        let mut parser = Parser::default();
        let mut buf = BytesMut::from(vec![b'a'; 2000].as_slice());
        assert!(parser.step(&mut buf).is_err());
    }

    #[test]
    fn bulk_mode_consumes_exact_payload_and_trailing_crlf() {
        let mut parser = Parser::default();
        parser.argv.push(Bytes::from_static(b"SET"));
        parser.argv.push(Bytes::from_static(b"foo"));
        parser.begin_bulk(3);
        let mut buf = BytesMut::from(&b"bar\r\nEXTRA"[..]);
        assert!(parser.step(&mut buf).unwrap().is_some());
        assert_eq!(&parser.argv[2][..], b"bar");
        assert_eq!(&buf[..], b"EXTRA");
    }

    #[test]
    fn bulk_mode_waits_for_full_payload() {
        let mut parser = Parser::default();
        parser.begin_bulk(5);
        let mut buf = BytesMut::from(&b"ab"[..]);
        assert!(parser.step(&mut buf).unwrap().is_none());
    }

    #[test]
    fn bulk_len_rejects_oversized_and_negative() {
        assert!(parse_bulk_len(b"-1").is_err());
        assert!(parse_bulk_len(b"99999999999999").is_err());
        assert!(parse_bulk_len(b"not-a-number").is_err());
        assert_eq!(parse_bulk_len(b"3").unwrap(), 3);
    }
}

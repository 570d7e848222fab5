//! lines reads a byte stream into (lineno, text) pairs, normalizing CRLF to LF.

use std::io::{self, BufRead};

/// LineSource yields physical lines from a reader, one at a time, tracking a
/// 1-based line counter.
///
/// CRLF terminators are rewritten to LF before the line is handed back; the
/// final line of a stream missing a trailing newline is yielded as-is.
pub struct LineSource<R> {
    reader: R,
    lineno: usize,
}

impl<R: BufRead> LineSource<R> {
    /// new wraps a buffered reader.
    pub fn new(reader: R) -> LineSource<R> {
        LineSource { reader, lineno: 0 }
    }

    /// next_line reads the next physical line, or None at EOF.
    ///
    /// The returned string retains its trailing LF, if any.
    pub fn next_line(&mut self) -> io::Result<Option<(usize, String)>> {
        let mut raw = String::new();
        let bytes_read = self.reader.read_line(&mut raw)?;

        if bytes_read == 0 {
            return Ok(None);
        }

        self.lineno += 1;

        if raw.ends_with("\r\n") {
            raw.truncate(raw.len() - 2);
            raw.push('\n');
        }

        Ok(Some((self.lineno, raw)))
    }
}

#[test]
fn test_basic_lines() {
    let mut src = LineSource::new(io::Cursor::new("a\nb\nc\n"));
    assert_eq!(src.next_line().unwrap(), Some((1, "a\n".to_string())));
    assert_eq!(src.next_line().unwrap(), Some((2, "b\n".to_string())));
    assert_eq!(src.next_line().unwrap(), Some((3, "c\n".to_string())));
    assert_eq!(src.next_line().unwrap(), None);
}

#[test]
fn test_crlf_normalized() {
    let mut src = LineSource::new(io::Cursor::new("a\r\nb\r\n"));
    assert_eq!(src.next_line().unwrap(), Some((1, "a\n".to_string())));
    assert_eq!(src.next_line().unwrap(), Some((2, "b\n".to_string())));
}

#[test]
fn test_missing_final_newline() {
    let mut src = LineSource::new(io::Cursor::new("a\nb"));
    assert_eq!(src.next_line().unwrap(), Some((1, "a\n".to_string())));
    assert_eq!(src.next_line().unwrap(), Some((2, "b".to_string())));
    assert_eq!(src.next_line().unwrap(), None);
}

#[test]
fn test_empty_stream() {
    let mut src = LineSource::new(io::Cursor::new(""));
    assert_eq!(src.next_line().unwrap(), None);
}

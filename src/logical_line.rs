//! logical_line assembles one or more physical lines into the buffer the
//! char iterators and expansion parser scan, and maps buffer offsets back to
//! source locations.

use crate::location::SourceLoc;
use crate::tokens::TokenList;
use std::io;
use std::rc::Rc;

/// LinePuller supplies additional physical lines on demand, as
/// `(lineno, text)` pairs with the text's trailing LF (if any) intact.
/// `Ok(None)` signals end of input.
pub type LinePuller<'a> = dyn FnMut() -> io::Result<Option<(usize, String)>> + 'a;

/// LogicalLine accumulates physical lines into a single buffer, recording
/// where each physical line started so that any buffer offset can be mapped
/// back to a `SourceLoc`.
///
/// A LogicalLine never reaches past end of input on its own: callers decide
/// when another physical line is needed (for example, after finding a
/// trailing continuation backslash) and request one via [LogicalLine::read_next].
pub struct LogicalLine {
    path: Rc<str>,
    buffer: String,
    /// anchors holds (buffer_offset, physical_lineno) pairs in ascending
    /// offset order, one per physical line appended so far.
    anchors: Vec<(usize, usize)>,
}

impl LogicalLine {
    /// new starts an empty LogicalLine positioned at the start of `path`.
    pub fn new(path: Rc<str>) -> LogicalLine {
        LogicalLine {
            path,
            buffer: String::new(),
            anchors: Vec::new(),
        }
    }

    /// buffer returns the text accumulated so far.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// len returns the number of bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// is_empty reports whether no physical line has been read yet.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// read_next pulls one more physical line from `puller` and appends it
    /// to the buffer, recording a new anchor. Returns `Ok(false)` at end of
    /// input, leaving the buffer untouched.
    pub fn read_next(&mut self, puller: &mut LinePuller) -> io::Result<bool> {
        match puller()? {
            None => Ok(false),
            Some((lineno, text)) => {
                self.anchors.push((self.buffer.len(), lineno));
                self.buffer.push_str(&text);
                Ok(true)
            }
        }
    }

    /// reset drops all buffered text and anchors, keeping the same path.
    ///
    /// Used between logical lines so a single LogicalLine can be reused for
    /// an entire file.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.anchors.clear();
    }

    /// skipws advances `offset` past any run of spaces and tabs, without
    /// pulling additional physical lines.
    pub fn skipws(&self, offset: usize) -> usize {
        let bytes = self.buffer.as_bytes();
        let mut o = offset;
        while o < bytes.len() && (bytes[o] == b' ' || bytes[o] == b'\t') {
            o += 1;
        }
        o
    }

    /// location resolves a buffer offset to its source position.
    ///
    /// If no physical line has been read yet, this returns the start-of-file
    /// location for this LogicalLine's path, matching the resolution
    /// adopted for an empty buffer.
    pub fn location(&self, offset: usize) -> SourceLoc {
        let anchor = match self
            .anchors
            .iter()
            .rev()
            .find(|(anchor_offset, _)| *anchor_offset <= offset)
        {
            Some(a) => *a,
            None => return SourceLoc::start(self.path.clone()),
        };

        let (anchor_offset, lineno) = anchor;
        let column = offset - anchor_offset;
        SourceLoc::new(self.path.clone(), lineno, column)
    }

    /// find_token looks for one of `tokens` anchored at `offset`, optionally
    /// skipping leading whitespace first.
    ///
    /// Returns the matched token text and the offset immediately following
    /// any whitespace the token itself consumed (per [TokenList::find_token_with_ws]),
    /// or `None` if no token of `tokens` starts there.
    pub fn find_token(
        &self,
        offset: usize,
        tokens: &TokenList,
        skip_ws: bool,
    ) -> Option<(String, usize)> {
        let start = if skip_ws { self.skipws(offset) } else { offset };
        tokens.find_token_with_ws(&self.buffer, start)
    }
}

#[test]
fn test_single_physical_line() {
    let mut ll = LogicalLine::new(Rc::from("test.mk"));
    let mut lines = vec![(1usize, "foo := bar\n".to_string())].into_iter();
    let mut puller = move || Ok(lines.next());
    assert!(ll.read_next(&mut puller).unwrap());
    assert_eq!(ll.buffer(), "foo := bar\n");
    assert!(!ll.read_next(&mut puller).unwrap());
}

#[test]
fn test_location_across_continuation() {
    let mut ll = LogicalLine::new(Rc::from("test.mk"));
    let mut lines = vec![
        (1usize, "foo = bar \\\n".to_string()),
        (2usize, "    baz\n".to_string()),
    ]
    .into_iter();
    let mut puller = move || Ok(lines.next());
    ll.read_next(&mut puller).unwrap();
    ll.read_next(&mut puller).unwrap();

    let first_line_loc = ll.location(0);
    assert_eq!(first_line_loc.line, 1);
    assert_eq!(first_line_loc.column, 0);

    let second_line_start = "foo = bar \\\n".len();
    let second_line_loc = ll.location(second_line_start);
    assert_eq!(second_line_loc.line, 2);
    assert_eq!(second_line_loc.column, 0);
}

#[test]
fn test_location_on_empty_buffer() {
    let ll = LogicalLine::new(Rc::from("test.mk"));
    let loc = ll.location(0);
    assert_eq!(loc.line, 1);
    assert_eq!(loc.column, 0);
}

#[test]
fn test_skipws() {
    let mut ll = LogicalLine::new(Rc::from("test.mk"));
    let mut lines = vec![(1usize, "   ifeq (a,b)\n".to_string())].into_iter();
    let mut puller = move || Ok(lines.next());
    ll.read_next(&mut puller).unwrap();
    assert_eq!(ll.skipws(0), 3);
}

#[test]
fn test_find_token_skips_ws_and_anchors() {
    let mut ll = LogicalLine::new(Rc::from("test.mk"));
    let mut lines = vec![(1usize, "  ifeq (a,b)\n".to_string())].into_iter();
    let mut puller = move || Ok(lines.next());
    ll.read_next(&mut puller).unwrap();

    let tokens = TokenList::get(&["ifeq", "ifneq", "ifdef", "ifndef"]);
    let (tok, end) = ll.find_token(0, &tokens, true).unwrap();
    assert_eq!(tok, "ifeq");
    assert_eq!(&ll.buffer()[end..], "(a,b)\n");
}

#[test]
fn test_find_token_rejects_non_matching_prefix() {
    let mut ll = LogicalLine::new(Rc::from("test.mk"));
    let mut lines = vec![(1usize, "all: build\n".to_string())].into_iter();
    let mut puller = move || Ok(lines.next());
    ll.read_next(&mut puller).unwrap();

    let tokens = TokenList::get(&["ifeq", "ifneq", "ifdef", "ifndef"]);
    assert!(ll.find_token(0, &tokens, true).is_none());
}

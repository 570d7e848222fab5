//! location tracks byte-accurate positions of parsed syntax within source files.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

/// SourceLoc names a position within some named input, as a 1-based line
/// and 0-based column.
///
/// Locations are small value types; they are copied freely rather than
/// passed by reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLoc {
    /// path denotes the originating file, or "-" for anonymous streams.
    pub path: Rc<str>,

    /// line denotes the 1-based line number.
    pub line: usize,

    /// column denotes the 0-based column offset within `line`.
    pub column: usize,
}

impl SourceLoc {
    /// new constructs a SourceLoc at the given line and column.
    pub fn new(path: Rc<str>, line: usize, column: usize) -> SourceLoc {
        SourceLoc { path, line, column }
    }

    /// start constructs the first possible location within a path: line 1,
    /// column 0.
    ///
    /// Used as the location of an empty LogicalLine, before any physical
    /// line has been read.
    pub fn start(path: impl Into<Rc<str>>) -> SourceLoc {
        SourceLoc::new(path.into(), 1, 0)
    }

    /// from_path_buf constructs a start location from a filesystem path.
    pub fn start_for_path(path: &Path) -> SourceLoc {
        SourceLoc::start(path.display().to_string())
    }

    /// advance walks this location forward across `text`, renumbering the
    /// line on embedded newlines and resetting the column after each one.
    ///
    /// Returns a new SourceLoc; the receiver is left untouched, matching the
    /// value semantics of the rest of this type.
    pub fn advance(&self, text: &str) -> SourceLoc {
        let mut line = self.line;
        let mut column = self.column;

        for ch in text.chars() {
            if ch == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }

        SourceLoc::new(self.path.clone(), line, column)
    }
}

impl fmt::Display for SourceLoc {
    /// fmt renders a SourceLoc as "path:line:column".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}

/// path_buf_to_rc converts a canonicalized path into the shared string form
/// SourceLoc and its callers use.
pub fn path_to_rc_str(path: &Path) -> Rc<str> {
    Rc::from(path.display().to_string())
}

#[test]
fn test_advance_single_line() {
    let loc = SourceLoc::start("-");
    let advanced = loc.advance("abc");
    assert_eq!(advanced.line, 1);
    assert_eq!(advanced.column, 3);
}

#[test]
fn test_advance_across_newlines() {
    let loc = SourceLoc::start("-");
    let advanced = loc.advance("ab\ncd\nef");
    assert_eq!(advanced.line, 3);
    assert_eq!(advanced.column, 2);
}

#[test]
fn test_advance_trailing_newline_resets_column() {
    let loc = SourceLoc::start("-");
    let advanced = loc.advance("ab\n");
    assert_eq!(advanced.line, 2);
    assert_eq!(advanced.column, 0);
}

#[test]
fn test_display() {
    let loc = SourceLoc::new(Rc::from("foo.mk"), 3, 5);
    assert_eq!(loc.to_string(), "foo.mk:3:5");
}

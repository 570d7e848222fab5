//! errors collects every way parsing a makefile can fail.

use crate::location::SourceLoc;
use thiserror::Error;

/// ParseError enumerates the ways a makefile can fail to parse.
///
/// Every variant but [ParseError::Io] carries the [SourceLoc] where the
/// problem was detected, so callers can report `path:line:column` the way
/// GNU Make itself does.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}: missing 'endef'")]
    UnterminatedDefine(SourceLoc),

    #[error("{0}: missing 'endif'")]
    UnterminatedCondition(SourceLoc),

    #[error("{0}: unterminated variable reference")]
    UnterminatedExpansion(SourceLoc),

    #[error("{0}: extraneous 'endif'")]
    UnmatchedEndif(SourceLoc),

    #[error("{0}: extraneous 'else'")]
    UnmatchedElse(SourceLoc),

    #[error("{0}: extraneous 'endef'")]
    UnmatchedEndef(SourceLoc),

    #[error("{0}: malformed conditional: {1}")]
    MalformedConditional(SourceLoc, String),

    #[error("{0}: malformed directive: {1}")]
    MalformedDirective(SourceLoc, String),

    #[error("{0}: unexpected data after directive: {1}")]
    UnexpectedTrailingData(SourceLoc, String),

    #[error("{0}: {1} is recognized but not yet implemented")]
    UnimplementedFeature(SourceLoc, String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// loc returns the SourceLoc carried by this error, if any.
    pub fn loc(&self) -> Option<&SourceLoc> {
        match self {
            ParseError::UnterminatedDefine(l)
            | ParseError::UnterminatedCondition(l)
            | ParseError::UnterminatedExpansion(l)
            | ParseError::UnmatchedEndif(l)
            | ParseError::UnmatchedElse(l)
            | ParseError::UnmatchedEndef(l)
            | ParseError::MalformedConditional(l, _)
            | ParseError::MalformedDirective(l, _)
            | ParseError::UnexpectedTrailingData(l, _)
            | ParseError::UnimplementedFeature(l, _) => Some(l),
            ParseError::Io(_) => None,
        }
    }
}

#[test]
fn test_display_format_matches_path_line_column() {
    let loc = SourceLoc::new(std::rc::Rc::from("foo.mk"), 3, 0);
    let err = ParseError::UnterminatedCondition(loc);
    assert_eq!(err.to_string(), "foo.mk:3:0: missing 'endif'");
}

#[test]
fn test_io_error_has_no_loc() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
    let err = ParseError::from(io_err);
    assert!(err.loc().is_none());
}

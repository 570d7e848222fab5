//! makeparse parses GNU Make-compatible makefiles into a statement tree,
//! without evaluating any of it: no variable substitution, no recipe
//! execution, no dependency graph. Callers that want those get them by
//! walking the [ast::StatementList] this crate hands back.

pub mod ast;
pub mod cache;
pub mod chars;
pub mod errors;
pub mod expansion;
pub mod expansion_parser;
pub mod functions;
pub mod lines;
pub mod location;
pub mod logical_line;
pub mod parser;
pub mod tokens;

use ast::StatementList;
use errors::ParseError;
use lines::LineSource;
use location::path_to_rc_str;
use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::rc::Rc;

/// parse_stream parses a complete makefile already held in memory, under
/// `name` (used only to label source locations; no file access happens
/// here, so the parse cache is not consulted).
pub fn parse_stream(name: &str, contents: &str) -> Result<StatementList, ParseError> {
    let path: Rc<str> = Rc::from(name);
    let mut source = LineSource::new(io::Cursor::new(contents));
    let mut puller = move || source.next_line();
    parser::parse_statements(path, &mut puller)
}

/// parse_file reads and parses `path`, serving a cached result when the
/// file's modification time has not changed since the last parse.
pub fn parse_file(path: &Path) -> Result<StatementList, ParseError> {
    let canonical = fs::canonicalize(path)?;
    let metadata = fs::metadata(&canonical)?;
    let mtime = metadata.modified()?;

    if let Some(cached) = cache::get(&canonical, mtime) {
        tracing::debug!(path = %canonical.display(), "parse cache hit");
        return Ok(cached);
    }
    tracing::debug!(path = %canonical.display(), "parse cache miss");

    let file = fs::File::open(&canonical)?;
    let mut source = LineSource::new(io::BufReader::new(file));
    let name = path_to_rc_str(&canonical);
    let mut puller = move || source.next_line();
    let statements = parser::parse_statements(name, &mut puller)?;

    cache::put(canonical, mtime, statements.clone());
    Ok(statements)
}

/// parse_reader parses an already-opened buffered reader under `name`,
/// bypassing the parse cache (there is no path to key it on).
pub fn parse_reader(name: &str, reader: impl BufRead) -> Result<StatementList, ParseError> {
    let path: Rc<str> = Rc::from(name);
    let mut source = LineSource::new(reader);
    let mut puller = move || source.next_line();
    parser::parse_statements(path, &mut puller)
}

#[test]
fn test_parse_stream_simple_assignment() {
    let stmts = parse_stream("test.mk", "CC := gcc\n").unwrap();
    assert_eq!(stmts.len(), 1);
    match &stmts[0] {
        ast::Statement::SetVariable { name, value, op, .. } => {
            assert_eq!(name.as_literal(), Some("CC".to_string()));
            assert_eq!(value.as_literal(), Some("gcc".to_string()));
            assert_eq!(*op, ast::VariableOp::Simple);
        }
        other => panic!("expected SetVariable, got {:?}", other),
    }
}

#[test]
fn test_parse_stream_rule_with_command() {
    let stmts = parse_stream("test.mk", "all: main.o\n\tcc -o all main.o\n").unwrap();
    assert_eq!(stmts.len(), 2);
    assert!(matches!(stmts[0], ast::Statement::Rule { .. }));
    assert!(matches!(stmts[1], ast::Statement::Command { .. }));
}

#[test]
fn test_parse_stream_conditional_block() {
    let stmts = parse_stream(
        "test.mk",
        "ifeq ($(X),1)\nA = 1\nelse\nA = 2\nendif\n",
    )
    .unwrap();
    assert_eq!(stmts.len(), 1);
    match &stmts[0] {
        ast::Statement::ConditionBlock { arms, .. } => assert_eq!(arms.len(), 2),
        other => panic!("expected ConditionBlock, got {:?}", other),
    }
}

#[test]
fn test_parse_stream_propagates_unmatched_endif() {
    let err = parse_stream("test.mk", "endif\n").unwrap_err();
    assert!(matches!(err, ParseError::UnmatchedEndif(_)));
}

#[test]
fn test_grammar() {
    use std::fs;
    use std::path;

    let fixtures_path: &path::Path = path::Path::new("fixtures");
    let valid_walker = walkdir::WalkDir::new(fixtures_path.join("parse-valid")).sort_by_file_name();

    for entry_result in valid_walker {
        let entry: walkdir::DirEntry = entry_result.unwrap();
        let pth: &path::Path = entry.path();
        if pth.is_dir() {
            continue;
        }

        let pth_display = pth.display().to_string();
        let makefile_str: &str = &fs::read_to_string(pth).unwrap();
        assert!(
            parse_stream(&pth_display, makefile_str)
                .map_err(|err| format!("unable to parse {}: {}", &pth_display, err))
                .is_ok()
        );
    }

    let invalid_walker = walkdir::WalkDir::new(fixtures_path.join("parse-invalid"))
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !e.path().is_dir());

    for entry_result in invalid_walker {
        let entry: walkdir::DirEntry = entry_result.unwrap();
        let pth: &path::Path = entry.path();
        if pth.is_dir() {
            continue;
        }

        let pth_display = pth.display().to_string();
        let makefile_str: &str = &fs::read_to_string(pth).unwrap();
        assert!(
            parse_stream(&pth_display, makefile_str).is_err(),
            "failed to reject {}",
            pth_display
        );
    }
}

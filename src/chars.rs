//! chars scans a [LogicalLine]'s buffer for the next meaningful chunk,
//! applying one of three escaping regimes as it goes.
//!
//! The regimes share the same token-matching machinery ([TokenList]) but
//! disagree on what a comment is and on what happens at a line-continuing
//! backslash:
//!
//! - [Regime::Makefile] recognizes `#` comments and collapses a trailing
//!   `\` + newline (plus any leading whitespace of the continued line) into
//!   a single space, matching how GNU Make reads directive and assignment
//!   text.
//! - [Regime::Recipe] never treats `#` as a comment (the shell gets to
//!   decide that) and keeps a continuing backslash and newline verbatim in
//!   the output, since the shell expects to see them.
//! - [Regime::Nested] also never treats `#` as a comment, but collapses a
//!   continuing backslash and newline to a single space like
//!   [Regime::Makefile] does. This is what a `define` body is scanned with
//!   (keyword recognition is left entirely to the caller, which drives it
//!   one physical line at a time), and it is also what the expansion parser
//!   switches to once it is scanning inside an already-opened `$(`/`${`: a
//!   literal `#` there is just text, not a comment, but a line continuation
//!   still needs to collapse.
//! - [Regime::Raw] performs no escape, comment, or continuation handling at
//!   all; it only reports where a caller-supplied literal token occurs, for
//!   scanning fully pre-assembled text.

use crate::logical_line::{LinePuller, LogicalLine};
use crate::tokens::TokenList;
use std::io;

/// Regime selects which escaping rules a scan applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Makefile text: assignments, prerequisite lists, conditionals.
    Makefile,
    /// Recipe lines: no comments, verbatim continuations.
    Recipe,
    /// `define` bodies and already-opened `$(`/`${` contexts: no comments,
    /// continuations collapse to a space.
    Nested,
    /// Already-assembled text with no escape handling, such as a
    /// previously-expanded value being re-scanned.
    Raw,
}

/// Chunk is one piece of a scan: either literal text to keep, a token the
/// caller asked about, a comment that swallows the rest of the line, the
/// logical line's end, or end of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Literal holds text to append to the logical line's expanded content,
    /// with any escape backslash already removed.
    Literal(String),
    /// Token holds one of the caller's literal tokens, found verbatim
    /// ([Regime::Raw] only).
    Token(String),
    /// Comment marks a `#` that starts a trailing comment; the caller
    /// should stop, the rest of the physical line carries no meaning.
    Comment,
    /// End marks an unescaped newline: the logical line is complete.
    End,
    /// Eof marks the end of input with no more physical lines to pull.
    Eof,
}

/// ScanResult pairs the chunk found with the buffer offset to resume
/// scanning from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub chunk: Chunk,
    pub next_offset: usize,
}

/// scan_one advances past exactly one chunk starting at `offset`, pulling
/// additional physical lines from `puller` as needed.
pub fn scan_one(
    ll: &mut LogicalLine,
    tokens: &TokenList,
    regime: Regime,
    offset: usize,
    puller: &mut LinePuller,
) -> io::Result<ScanResult> {
    if regime != Regime::Raw {
        while offset >= ll.len() {
            if !ll.read_next(puller)? {
                return Ok(ScanResult {
                    chunk: Chunk::Eof,
                    next_offset: offset,
                });
            }
        }
    } else if offset >= ll.len() {
        return Ok(ScanResult {
            chunk: Chunk::Eof,
            next_offset: offset,
        });
    }

    let found = match regime {
        Regime::Makefile => tokens.find_makefile(ll.buffer(), offset),
        Regime::Recipe | Regime::Nested => tokens.find_continuation(ll.buffer(), offset),
        Regime::Raw => tokens.find_simple(ll.buffer(), offset),
    };

    let Some(m) = found else {
        let text = ll.buffer()[offset..].to_string();
        return Ok(ScanResult {
            chunk: Chunk::Literal(text),
            next_offset: ll.len(),
        });
    };

    if regime == Regime::Raw {
        if m.start() > offset {
            let text = ll.buffer()[offset..m.start()].to_string();
            return Ok(ScanResult {
                chunk: Chunk::Literal(text),
                next_offset: m.start(),
            });
        }
        return Ok(ScanResult {
            chunk: Chunk::Token(m.as_str().to_string()),
            next_offset: m.end(),
        });
    }

    let matched = m.as_str().to_string();
    let match_start = m.start();
    let match_end = m.end();

    // a continuing backslash absorbs whatever literal prefix preceded it, so
    // its handling can right-strip that prefix before emitting.
    if matched.starts_with('\\') && matched.ends_with("\\\n") {
        let prefix = &ll.buffer()[offset..match_start];
        return continue_line(ll, regime, prefix, &matched, match_end, puller);
    }

    if match_start > offset {
        let text = ll.buffer()[offset..match_start].to_string();
        return Ok(ScanResult {
            chunk: Chunk::Literal(text),
            next_offset: match_start,
        });
    }

    if matched == "\n" {
        return Ok(ScanResult {
            chunk: Chunk::End,
            next_offset: match_end,
        });
    }

    if regime == Regime::Makefile && matched == "#" {
        return Ok(ScanResult {
            chunk: Chunk::Comment,
            next_offset: ll.len(),
        });
    }

    if regime == Regime::Makefile && matched == "\\#" {
        return Ok(ScanResult {
            chunk: Chunk::Literal("#".to_string()),
            next_offset: match_end,
        });
    }

    if regime == Regime::Makefile && matched == "\\\\#" {
        // two backslashes escape to one, and the '#' they uncovered still
        // starts a real comment: resume right before it.
        return Ok(ScanResult {
            chunk: Chunk::Literal("\\".to_string()),
            next_offset: match_end - 1,
        });
    }

    if let Some(escaped) = matched.strip_prefix('\\') {
        if tokens.contains(escaped) {
            // the backslash stands on its own as literal text; resuming
            // right at the escaped character lets it surface as its own
            // token on the next scan.
            return Ok(ScanResult {
                chunk: Chunk::Literal("\\".to_string()),
                next_offset: match_start + 1,
            });
        }
        return Ok(ScanResult {
            chunk: Chunk::Literal(matched),
            next_offset: match_end,
        });
    }

    // a bare literal token matched inside a non-Raw regime.
    Ok(ScanResult {
        chunk: Chunk::Token(matched),
        next_offset: match_end,
    })
}

/// continue_line finishes handling a line-continuing backslash once its
/// terminating newline has been matched, fusing in the literal `prefix`
/// text that preceded it (so makefile regime can right-strip it before
/// collapsing to a single space).
fn continue_line(
    ll: &mut LogicalLine,
    regime: Regime,
    prefix: &str,
    matched: &str,
    after_newline: usize,
    puller: &mut LinePuller,
) -> io::Result<ScanResult> {
    match regime {
        Regime::Makefile | Regime::Nested => {
            while after_newline >= ll.len() {
                if !ll.read_next(puller)? {
                    break;
                }
            }
            let skipped = ll.skipws(after_newline);
            // a plain "\<LF>" collapses to one space; the case of a
            // backslash, whitespace, then backslash-LF keeps one literal
            // backslash before that space.
            let joiner = if matched.len() == 2 { " " } else { "\\ " };
            let text = format!("{}{}", prefix.trim_end(), joiner);
            Ok(ScanResult {
                chunk: Chunk::Literal(text),
                next_offset: skipped,
            })
        }
        Regime::Recipe => {
            while after_newline >= ll.len() {
                if !ll.read_next(puller)? {
                    break;
                }
            }
            let mut next_offset = after_newline;
            if ll.buffer()[next_offset..].starts_with('\t') {
                next_offset += 1;
            }
            let text = format!("{}{}", prefix, matched);
            Ok(ScanResult {
                chunk: Chunk::Literal(text),
                next_offset,
            })
        }
        Regime::Raw => unreachable!("continuations never occur in Regime::Raw"),
    }
}

#[cfg(test)]
fn scanner(lines: Vec<&str>) -> (LogicalLine, Box<dyn FnMut() -> io::Result<Option<(usize, String)>>>) {
    let mut owned: Vec<(usize, String)> = lines
        .into_iter()
        .enumerate()
        .map(|(i, s)| (i + 1, s.to_string()))
        .collect();
    owned.reverse();
    let puller = move || Ok(owned.pop());
    (LogicalLine::new(std::rc::Rc::from("test.mk")), Box::new(puller))
}

#[test]
fn test_plain_literal_to_newline() {
    let (mut ll, mut puller) = scanner(vec!["foo bar\n"]);
    let tokens = TokenList::get(&[]);
    let r = scan_one(&mut ll, &tokens, Regime::Makefile, 0, &mut puller).unwrap();
    assert_eq!(r.chunk, Chunk::Literal("foo bar".to_string()));
    let r2 = scan_one(&mut ll, &tokens, Regime::Makefile, r.next_offset, &mut puller).unwrap();
    assert_eq!(r2.chunk, Chunk::End);
}

#[test]
fn test_comment_swallows_rest_of_line() {
    let (mut ll, mut puller) = scanner(vec!["foo # bar\n"]);
    let tokens = TokenList::get(&[]);
    let r = scan_one(&mut ll, &tokens, Regime::Makefile, 0, &mut puller).unwrap();
    assert_eq!(r.chunk, Chunk::Literal("foo ".to_string()));
    let r2 = scan_one(&mut ll, &tokens, Regime::Makefile, r.next_offset, &mut puller).unwrap();
    assert_eq!(r2.chunk, Chunk::Comment);
    assert_eq!(r2.next_offset, ll.len());
}

#[test]
fn test_escaped_hash_is_literal() {
    let (mut ll, mut puller) = scanner(vec!["a\\#b\n"]);
    let tokens = TokenList::get(&[]);
    let r = scan_one(&mut ll, &tokens, Regime::Makefile, 0, &mut puller).unwrap();
    assert_eq!(r.chunk, Chunk::Literal("a".to_string()));
    let r2 = scan_one(&mut ll, &tokens, Regime::Makefile, r.next_offset, &mut puller).unwrap();
    assert_eq!(r2.chunk, Chunk::Literal("#".to_string()));
}

#[test]
fn test_double_backslash_then_hash_is_comment() {
    let (mut ll, mut puller) = scanner(vec!["a\\\\#b\n"]);
    let tokens = TokenList::get(&[]);
    let r = scan_one(&mut ll, &tokens, Regime::Makefile, 0, &mut puller).unwrap();
    assert_eq!(r.chunk, Chunk::Literal("a".to_string()));
    let r2 = scan_one(&mut ll, &tokens, Regime::Makefile, r.next_offset, &mut puller).unwrap();
    assert_eq!(r2.chunk, Chunk::Literal("\\".to_string()));
    let r3 = scan_one(&mut ll, &tokens, Regime::Makefile, r2.next_offset, &mut puller).unwrap();
    assert_eq!(r3.chunk, Chunk::Comment);
}

#[test]
fn test_makefile_continuation_collapses_to_space() {
    let (mut ll, mut puller) = scanner(vec!["foo \\\n", "  bar\n"]);
    let tokens = TokenList::get(&[]);
    let r1 = scan_one(&mut ll, &tokens, Regime::Makefile, 0, &mut puller).unwrap();
    // the trailing space before the backslash is right-stripped, then a
    // single space is substituted for the whole continuation.
    assert_eq!(r1.chunk, Chunk::Literal("foo ".to_string()));
    let r2 = scan_one(&mut ll, &tokens, Regime::Makefile, r1.next_offset, &mut puller).unwrap();
    assert_eq!(r2.chunk, Chunk::Literal("bar".to_string()));
}

#[test]
fn test_makefile_awful_continuation_keeps_one_backslash() {
    let (mut ll, mut puller) = scanner(vec!["foo\\  \\\n", "bar\n"]);
    let tokens = TokenList::get(&[]);
    let r1 = scan_one(&mut ll, &tokens, Regime::Makefile, 0, &mut puller).unwrap();
    assert_eq!(r1.chunk, Chunk::Literal("foo\\ ".to_string()));
    let r2 = scan_one(&mut ll, &tokens, Regime::Makefile, r1.next_offset, &mut puller).unwrap();
    assert_eq!(r2.chunk, Chunk::Literal("bar".to_string()));
}

#[test]
fn test_recipe_continuation_kept_verbatim() {
    let (mut ll, mut puller) = scanner(vec!["echo a \\\n", "\techo b\n"]);
    let tokens = TokenList::get(&[]);
    let r1 = scan_one(&mut ll, &tokens, Regime::Recipe, 0, &mut puller).unwrap();
    // the backslash and newline are kept verbatim, and the recipe-line
    // TAB that follows is consumed as indentation, not content.
    assert_eq!(r1.chunk, Chunk::Literal("echo a \\\n".to_string()));
    assert_eq!(r1.next_offset, "echo a \\\n".len() + 1);
    let r2 = scan_one(&mut ll, &tokens, Regime::Recipe, r1.next_offset, &mut puller).unwrap();
    assert_eq!(r2.chunk, Chunk::Literal("echo b".to_string()));
}

#[test]
fn test_recipe_never_sees_comment() {
    let (mut ll, mut puller) = scanner(vec!["echo '#'\n"]);
    let tokens = TokenList::get(&[]);
    let r = scan_one(&mut ll, &tokens, Regime::Recipe, 0, &mut puller).unwrap();
    assert_eq!(r.chunk, Chunk::Literal("echo '#'".to_string()));
}

#[test]
fn test_raw_finds_literal_token() {
    let (mut ll, mut puller) = scanner(vec!["a,b,c"]);
    // Regime::Raw scans already-assembled text; the buffer must be
    // populated ahead of time rather than pulled lazily.
    ll.read_next(&mut puller).unwrap();
    let tokens = TokenList::get(&[","]);
    let r = scan_one(&mut ll, &tokens, Regime::Raw, 0, &mut puller).unwrap();
    assert_eq!(r.chunk, Chunk::Literal("a".to_string()));
    let r2 = scan_one(&mut ll, &tokens, Regime::Raw, r.next_offset, &mut puller).unwrap();
    assert_eq!(r2.chunk, Chunk::Token(",".to_string()));
}

#[test]
fn test_eof_at_end_of_input() {
    let (mut ll, mut puller) = scanner(vec!["x"]);
    let tokens = TokenList::get(&[]);
    let r = scan_one(&mut ll, &tokens, Regime::Makefile, 0, &mut puller).unwrap();
    assert_eq!(r.chunk, Chunk::Literal("x".to_string()));
    let r2 = scan_one(&mut ll, &tokens, Regime::Makefile, r.next_offset, &mut puller).unwrap();
    assert_eq!(r2.chunk, Chunk::Eof);
}

#[test]
fn test_makefile_caller_token_is_surfaced_as_token() {
    let (mut ll, mut puller) = scanner(vec!["FOO:=bar\n"]);
    let tokens = TokenList::get(&[":="]);
    let r = scan_one(&mut ll, &tokens, Regime::Makefile, 0, &mut puller).unwrap();
    assert_eq!(r.chunk, Chunk::Literal("FOO".to_string()));
    let r2 = scan_one(&mut ll, &tokens, Regime::Makefile, r.next_offset, &mut puller).unwrap();
    assert_eq!(r2.chunk, Chunk::Token(":=".to_string()));
}

#[test]
fn test_nested_dollar_is_surfaced_as_token() {
    let (mut ll, mut puller) = scanner(vec!["$(FOO)\n"]);
    let tokens = TokenList::get(&["$"]);
    let r = scan_one(&mut ll, &tokens, Regime::Makefile, 0, &mut puller).unwrap();
    assert_eq!(r.chunk, Chunk::Token("$".to_string()));
}

#[test]
fn test_escaped_caller_token_keeps_backslash_then_surfaces_token() {
    let (mut ll, mut puller) = scanner(vec!["a\\:b\n"]);
    let tokens = TokenList::get(&[":"]);
    let r = scan_one(&mut ll, &tokens, Regime::Makefile, 0, &mut puller).unwrap();
    assert_eq!(r.chunk, Chunk::Literal("a".to_string()));
    let r2 = scan_one(&mut ll, &tokens, Regime::Makefile, r.next_offset, &mut puller).unwrap();
    assert_eq!(r2.chunk, Chunk::Literal("\\".to_string()));
    let r3 = scan_one(&mut ll, &tokens, Regime::Makefile, r2.next_offset, &mut puller).unwrap();
    assert_eq!(r3.chunk, Chunk::Token(":".to_string()));
}

#[test]
fn test_escaped_non_token_char_keeps_backslash_verbatim() {
    let (mut ll, mut puller) = scanner(vec!["a\\qb\n"]);
    let tokens = TokenList::get(&[":"]);
    let r = scan_one(&mut ll, &tokens, Regime::Makefile, 0, &mut puller).unwrap();
    assert_eq!(r.chunk, Chunk::Literal("a".to_string()));
    let r2 = scan_one(&mut ll, &tokens, Regime::Makefile, r.next_offset, &mut puller).unwrap();
    assert_eq!(r2.chunk, Chunk::Literal("\\q".to_string()));
}

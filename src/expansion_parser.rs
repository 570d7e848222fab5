//! expansion_parser recursively descends through `$(...)`/`${...}`/`$x`
//! syntax, producing an [Expansion] tree.
//!
//! The caller picks which escaping regime governs the *outer* text being
//! parsed ([crate::chars::Regime::Makefile] for directive/assignment/rule
//! text, [crate::chars::Regime::Recipe] for a command line); once parsing
//! descends inside an opened `$(`/`${`, it always continues in
//! [crate::chars::Regime::Nested] instead, since a `#` there is ordinary
//! text rather than a comment, regardless of what the outer regime was.
//! Nesting itself is handled by recursion alone: a `$(...)` found while
//! scanning for a stop token is parsed whole and folded in as one node, so
//! the outer scan never sees the characters inside it.

use crate::chars::{scan_one, Chunk, Regime};
use crate::errors::ParseError;
use crate::expansion::{Expansion, Node};
use crate::functions::{self, FunctionSpec};
use crate::location::SourceLoc;
use crate::logical_line::{LinePuller, LogicalLine};
use crate::tokens::TokenList;

/// Stop is what ended a parse: one of the caller's stop tokens, or the
/// unescaped newline/comment that marks end of the logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stop {
    Token(String),
    EndOfLine,
}

/// parse_make_syntax parses `$(...)`-bearing text starting at `offset` under
/// `regime`, stopping at the first of `extra_stops`, an unescaped newline, or
/// (in [Regime::Makefile]) a comment.
///
/// An empty `extra_stops` means top-level parsing: reaching end of the
/// logical line (by comment, newline, or end of input) is a normal,
/// successful stop. A non-empty `extra_stops` means the caller is inside an
/// open `$(`, `{`, or argument list; reaching end of line or input before
/// one of those tokens is an [ParseError::UnterminatedExpansion].
pub fn parse_make_syntax(
    ll: &mut LogicalLine,
    offset: usize,
    extra_stops: &[&str],
    regime: Regime,
    puller: &mut LinePuller,
) -> Result<(Expansion, usize, Stop), ParseError> {
    let top_level = extra_stops.is_empty();
    let mut search: Vec<&str> = extra_stops.to_vec();
    search.push("$");
    let tokens = TokenList::get(&search);

    let mut exp = Expansion::new(ll.location(offset));
    let mut pos = offset;

    loop {
        let result = scan_one(ll, &tokens, regime, pos, puller)?;
        match result.chunk {
            Chunk::Eof => {
                if top_level {
                    return Ok((exp, result.next_offset, Stop::EndOfLine));
                }
                return Err(ParseError::UnterminatedExpansion(ll.location(pos)));
            }
            Chunk::Comment => {
                if top_level {
                    return Ok((exp, result.next_offset, Stop::EndOfLine));
                }
                return Err(ParseError::UnterminatedExpansion(ll.location(pos)));
            }
            Chunk::Literal(text) => {
                exp.append_literal(text);
                pos = result.next_offset;
            }
            Chunk::Token(tok) if tok == "$" => {
                let dollar_loc = ll.location(pos);
                let (node, next_pos) = parse_dollar(ll, result.next_offset, dollar_loc, puller)?;
                exp.append(node);
                pos = next_pos;
            }
            Chunk::Token(tok) => {
                return Ok((exp, result.next_offset, Stop::Token(tok)));
            }
            Chunk::End => {
                if top_level {
                    return Ok((exp, result.next_offset, Stop::EndOfLine));
                }
                return Err(ParseError::UnterminatedExpansion(ll.location(pos)));
            }
        }
    }
}

/// parse_dollar parses everything after a `$` has just been consumed: an
/// escaped `$$`, a bare `$x` single-character reference, or a delimited
/// `$(...)`/`${...}` form.
fn parse_dollar(
    ll: &mut LogicalLine,
    offset: usize,
    loc: SourceLoc,
    puller: &mut LinePuller,
) -> Result<(Node, usize), ParseError> {
    let next_char = ll.buffer()[offset..].chars().next();

    match next_char {
        None => Err(ParseError::UnterminatedExpansion(ll.location(offset))),
        Some('$') => Ok((Node::Literal("$".to_string()), offset + 1)),
        Some('(') => parse_delimited(ll, offset + 1, ")", loc, puller),
        Some('{') => parse_delimited(ll, offset + 1, "}", loc, puller),
        Some(c) => {
            let mut name = Expansion::new(loc);
            name.append_literal(c.to_string());
            Ok((Node::VariableRef(name), offset + c.len_utf8()))
        }
    }
}

/// parse_delimited parses the body of a `$(...)` or `${...}` form, deciding
/// between a plain variable reference, a substitution reference, and a
/// function call as it goes. Everything inside is scanned in
/// [Regime::Nested].
fn parse_delimited(
    ll: &mut LogicalLine,
    offset: usize,
    close: &str,
    loc: SourceLoc,
    puller: &mut LinePuller,
) -> Result<(Node, usize), ParseError> {
    let mut name = Expansion::new(loc.clone());
    let mut pos = offset;

    loop {
        let (partial, next_pos, stop) = parse_make_syntax(
            ll,
            pos,
            &[close, ":", " ", "\t"],
            Regime::Nested,
            puller,
        )?;
        let stop = match stop {
            Stop::Token(t) => t,
            Stop::EndOfLine => unreachable!("non-empty stop list never yields EndOfLine"),
        };

        for node in partial.nodes {
            name.append(node);
        }
        pos = next_pos;

        if stop == close {
            return Ok((Node::VariableRef(name), pos));
        }

        if stop == ":" {
            return parse_substitution(ll, name, pos, close, puller);
        }

        // stop is whitespace: a recognized function name followed by
        // whitespace opens an argument list; otherwise the whitespace is
        // ordinary text within the variable's name and scanning continues.
        if let Some(text) = name.as_literal() {
            if let Some(spec) = functions::lookup(text.trim()) {
                return parse_function_args(
                    ll,
                    spec,
                    text.trim().to_string(),
                    pos,
                    close,
                    loc,
                    puller,
                );
            }
        }
        name.append_literal(stop);
    }
}

/// parse_substitution continues parsing after a `:` was found while
/// scanning a variable's name, producing a `$(var:from=to)` reference, or
/// folding the colon back into a plain variable name if no `=` follows.
fn parse_substitution(
    ll: &mut LogicalLine,
    name: Expansion,
    offset: usize,
    close: &str,
    puller: &mut LinePuller,
) -> Result<(Node, usize), ParseError> {
    let (from, pos, stop) =
        parse_make_syntax(ll, offset, &["=", close], Regime::Nested, puller)?;
    let stop = match stop {
        Stop::Token(t) => t,
        Stop::EndOfLine => unreachable!("non-empty stop list never yields EndOfLine"),
    };

    if stop == close {
        tracing::warn!(
            loc = %ll.location(offset),
            "malformed substitution reference, no '=' before closing delimiter"
        );
        let mut merged = name;
        merged.append_literal(":");
        for node in from.nodes {
            merged.append(node);
        }
        return Ok((Node::VariableRef(merged), pos));
    }

    let (to, pos, _) = parse_make_syntax(ll, pos, &[close], Regime::Nested, puller)?;
    Ok((Node::SubstitutionRef { name, from, to }, pos))
}

/// parse_function_args parses a function call's comma-separated arguments,
/// stopping comma-splitting once `spec.max_args` arguments have been
/// opened so that the final argument may contain literal commas.
fn parse_function_args(
    ll: &mut LogicalLine,
    spec: FunctionSpec,
    name: String,
    offset: usize,
    close: &str,
    loc: SourceLoc,
    puller: &mut LinePuller,
) -> Result<(Node, usize), ParseError> {
    let mut args = Vec::new();
    let mut pos = offset;

    loop {
        let last_slot = args.len() + 1 >= spec.max_args;
        let stops: &[&str] = if last_slot { &[close] } else { &[",", close] };
        let (arg, next_pos, stop) = parse_make_syntax(ll, pos, stops, Regime::Nested, puller)?;
        let stop = match stop {
            Stop::Token(t) => t,
            Stop::EndOfLine => unreachable!("non-empty stop list never yields EndOfLine"),
        };
        args.push(arg);
        pos = next_pos;

        if stop == close {
            break;
        }
    }

    Ok((Node::FunctionCall { name, args, loc }, pos))
}

#[cfg(test)]
fn parse_all(text: &str) -> Expansion {
    let mut ll = LogicalLine::new(std::rc::Rc::from("test.mk"));
    let mut lines = vec![(1usize, text.to_string())].into_iter();
    let mut puller = move || Ok(lines.next());
    ll.read_next(&mut puller).unwrap();
    let (exp, _offset, stop) =
        parse_make_syntax(&mut ll, 0, &[], Regime::Makefile, &mut puller).unwrap();
    assert_eq!(stop, Stop::EndOfLine);
    exp
}

#[test]
fn test_plain_literal() {
    let exp = parse_all("hello world\n");
    assert_eq!(exp.as_literal(), Some("hello world".to_string()));
}

#[test]
fn test_simple_variable_ref() {
    let exp = parse_all("$(FOO)\n");
    assert_eq!(exp.nodes.len(), 2);
    match &exp.nodes[0] {
        Node::VariableRef(name) => assert_eq!(name.as_literal(), Some("FOO".to_string())),
        other => panic!("expected VariableRef, got {:?}", other),
    }
}

#[test]
fn test_single_char_ref() {
    let exp = parse_all("$x\n");
    match &exp.nodes[0] {
        Node::VariableRef(name) => assert_eq!(name.as_literal(), Some("x".to_string())),
        other => panic!("expected VariableRef, got {:?}", other),
    }
}

#[test]
fn test_dollar_dollar_is_literal_dollar() {
    let exp = parse_all("$$FOO\n");
    assert_eq!(exp.as_literal(), Some("$FOO".to_string()));
}

#[test]
fn test_substitution_ref() {
    let exp = parse_all("$(SRCS:.c=.o)\n");
    match &exp.nodes[0] {
        Node::SubstitutionRef { name, from, to } => {
            assert_eq!(name.as_literal(), Some("SRCS".to_string()));
            assert_eq!(from.as_literal(), Some(".c".to_string()));
            assert_eq!(to.as_literal(), Some(".o".to_string()));
        }
        other => panic!("expected SubstitutionRef, got {:?}", other),
    }
}

#[test]
fn test_colon_without_equals_is_plain_name() {
    let exp = parse_all("$(FOO:bar)\n");
    match &exp.nodes[0] {
        Node::VariableRef(name) => assert_eq!(name.as_literal(), Some("FOO:bar".to_string())),
        other => panic!("expected VariableRef, got {:?}", other),
    }
}

#[test]
fn test_function_call_fixed_args() {
    let exp = parse_all("$(subst a,b,abc)\n");
    match &exp.nodes[0] {
        Node::FunctionCall { name, args, .. } => {
            assert_eq!(name, "subst");
            assert_eq!(args.len(), 3);
            assert_eq!(args[0].as_literal(), Some("a".to_string()));
            assert_eq!(args[1].as_literal(), Some("b".to_string()));
            assert_eq!(args[2].as_literal(), Some("abc".to_string()));
        }
        other => panic!("expected FunctionCall, got {:?}", other),
    }
}

#[test]
fn test_function_call_last_arg_absorbs_commas() {
    let exp = parse_all("$(strip a,b,c)\n");
    match &exp.nodes[0] {
        Node::FunctionCall { name, args, .. } => {
            assert_eq!(name, "strip");
            assert_eq!(args.len(), 1);
            assert_eq!(args[0].as_literal(), Some("a,b,c".to_string()));
        }
        other => panic!("expected FunctionCall, got {:?}", other),
    }
}

#[test]
fn test_nested_reference_in_name() {
    let exp = parse_all("$($(X))\n");
    match &exp.nodes[0] {
        Node::VariableRef(name) => {
            assert_eq!(name.nodes.len(), 1);
            match &name.nodes[0] {
                Node::VariableRef(inner) => {
                    assert_eq!(inner.as_literal(), Some("X".to_string()))
                }
                other => panic!("expected nested VariableRef, got {:?}", other),
            }
        }
        other => panic!("expected VariableRef, got {:?}", other),
    }
}

#[test]
fn test_unclosed_reference_is_error() {
    let mut ll = LogicalLine::new(std::rc::Rc::from("test.mk"));
    let mut lines = vec![(1usize, "$(FOO\n".to_string())].into_iter();
    let mut puller = move || Ok(lines.next());
    ll.read_next(&mut puller).unwrap();
    let err = parse_make_syntax(&mut ll, 0, &[], Regime::Makefile, &mut puller).unwrap_err();
    assert!(matches!(err, ParseError::UnterminatedExpansion(_)));
}

#[test]
fn test_brace_delimiter() {
    let exp = parse_all("${FOO}\n");
    match &exp.nodes[0] {
        Node::VariableRef(name) => assert_eq!(name.as_literal(), Some("FOO".to_string())),
        other => panic!("expected VariableRef, got {:?}", other),
    }
}

#[test]
fn test_continuation_condenses_in_value_text() {
    let mut ll = LogicalLine::new(std::rc::Rc::from("test.mk"));
    let mut lines = vec![(1usize, "a \\\n".to_string()), (2usize, "  b\n".to_string())]
        .into_iter();
    let mut puller = move || Ok(lines.next());
    ll.read_next(&mut puller).unwrap();
    let (exp, _offset, stop) =
        parse_make_syntax(&mut ll, 0, &[], Regime::Makefile, &mut puller).unwrap();
    assert_eq!(stop, Stop::EndOfLine);
    assert_eq!(exp.as_literal(), Some("a b".to_string()));
}

#[test]
fn test_comment_ends_value_text() {
    let exp = parse_all("abc # trailing\n");
    assert_eq!(exp.as_literal(), Some("abc ".to_string()));
}

#[test]
fn test_hash_is_literal_inside_function_args() {
    let exp = parse_all("$(findstring #,a#b)\n");
    match &exp.nodes[0] {
        Node::FunctionCall { name, args, .. } => {
            assert_eq!(name, "findstring");
            assert_eq!(args[0].as_literal(), Some("#".to_string()));
            assert_eq!(args[1].as_literal(), Some("a#b".to_string()));
        }
        other => panic!("expected FunctionCall, got {:?}", other),
    }
}

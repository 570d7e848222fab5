//! parser drives the top-level reading of a makefile: one logical line at a
//! time, dispatching on a leading TAB, a directive keyword, or a variable-set
//! / rule operator, and building the [StatementList] the caller gets back.

use crate::ast::{Condition, Source, Statement, StatementList, VariableOp};
use crate::chars::Regime;
use crate::errors::ParseError;
use crate::expansion::Expansion;
use crate::expansion_parser::{parse_make_syntax, Stop};
use crate::location::SourceLoc;
use crate::logical_line::{LinePuller, LogicalLine};
use crate::tokens::TokenList;
use lazy_static::lazy_static;
use std::rc::Rc;

lazy_static! {
    static ref DIRECTIVE_TOKENS: std::sync::Arc<TokenList> = TokenList::get(&[
        "ifeq", "ifneq", "ifdef", "ifndef", "else", "endif", "define", "endef", "override",
        "include", "-include", "vpath", "export", "unexport",
    ]);
    static ref CONDITION_TOKENS: std::sync::Arc<TokenList> =
        TokenList::get(&["ifeq", "ifneq", "ifdef", "ifndef"]);
    static ref DEFINE_KEYWORD_TOKENS: std::sync::Arc<TokenList> =
        TokenList::get(&["define", "endef"]);
}

const ASSIGN_STOPS: &[&str] = &[":=", "::", "+=", "?=", "=", ":"];
const RULE_RHS_STOPS: &[&str] = &[":=", "+=", "?=", "=", ":", "|", ";"];

/// Frame is one level of the conditional-block stack: either the top-level
/// statement list, or an open `if*` block accumulating arms.
enum Frame {
    Top(StatementList),
    Block {
        loc: SourceLoc,
        arms: Vec<(Condition, StatementList)>,
    },
}

/// ConditionalStack tracks nested `if*`/`else`/`endif` blocks as statements
/// are parsed, so each one lands in the right arm of the right block.
struct ConditionalStack {
    frames: Vec<Frame>,
}

impl ConditionalStack {
    fn new() -> ConditionalStack {
        ConditionalStack {
            frames: vec![Frame::Top(Vec::new())],
        }
    }

    fn append(&mut self, stmt: Statement) {
        match self.frames.last_mut().expect("stack never empties") {
            Frame::Top(list) => list.push(stmt),
            Frame::Block { arms, .. } => arms.last_mut().expect("block always has an arm").1.push(stmt),
        }
    }

    fn open_block(&mut self, loc: SourceLoc, cond: Condition) {
        self.frames.push(Frame::Block {
            loc,
            arms: vec![(cond, Vec::new())],
        });
    }

    fn add_arm(&mut self, loc: SourceLoc, cond: Condition) -> Result<(), ParseError> {
        match self.frames.last_mut() {
            Some(Frame::Block { arms, .. }) => {
                arms.push((cond, Vec::new()));
                Ok(())
            }
            _ => Err(ParseError::UnmatchedElse(loc)),
        }
    }

    fn close_block(&mut self, loc: SourceLoc) -> Result<(), ParseError> {
        if self.frames.len() <= 1 {
            return Err(ParseError::UnmatchedEndif(loc));
        }
        if let Frame::Block { loc: block_loc, arms } = self.frames.pop().expect("checked above") {
            self.append(Statement::ConditionBlock { arms, loc: block_loc });
        }
        Ok(())
    }

    fn finish(mut self) -> Result<StatementList, ParseError> {
        if self.frames.len() != 1 {
            if let Some(Frame::Block { loc, .. }) = self.frames.last() {
                return Err(ParseError::UnterminatedCondition(loc.clone()));
            }
        }
        match self.frames.pop().expect("stack never empties") {
            Frame::Top(list) => Ok(list),
            Frame::Block { .. } => unreachable!("depth already checked above"),
        }
    }
}

/// parse_statements reads logical lines from `puller` until end of input,
/// returning the flattened top-level statement tree.
///
/// `path` is only used to label source locations; physical lines always come
/// from `puller`.
pub fn parse_statements(path: Rc<str>, puller: &mut LinePuller) -> Result<StatementList, ParseError> {
    let mut stack = ConditionalStack::new();
    let mut currule = false;

    loop {
        let mut ll = LogicalLine::new(path.clone());
        if !ll.read_next(puller)? {
            break;
        }

        if currule && ll.buffer().starts_with('\t') {
            let loc = ll.location(0);
            let (text, _pos, _stop) = parse_make_syntax(&mut ll, 1, &[], Regime::Recipe, puller)?;
            stack.append(Statement::Command { text, loc });
            continue;
        }

        let start = ll.skipws(0);
        if let Some((tok, end)) = ll.find_token(start, &DIRECTIVE_TOKENS, false) {
            currule = dispatch_directive(&tok, path.clone(), &mut ll, end, &mut stack, puller)?;
        } else {
            currule = dispatch_statement(&mut ll, start, &mut stack, puller)?;
        }
    }

    stack.finish()
}

/// dispatch_directive handles one recognized directive keyword, returning
/// the new `currule` value.
fn dispatch_directive(
    tok: &str,
    path: Rc<str>,
    ll: &mut LogicalLine,
    offset: usize,
    stack: &mut ConditionalStack,
    puller: &mut LinePuller,
) -> Result<bool, ParseError> {
    match tok {
        "endif" => {
            let loc = ll.location(offset);
            check_trailing(ll, offset)?;
            stack.close_block(loc)?;
            Ok(false)
        }

        "else" => {
            let loc = ll.location(offset);
            if let Some((kw, end)) = ll.find_token(offset, &CONDITION_TOKENS, true) {
                let (cond, _pos) = parse_condition(&kw, ll, end, puller)?;
                stack.add_arm(loc, cond)?;
            } else {
                check_trailing(ll, offset)?;
                stack.add_arm(loc.clone(), Condition::ElseCondition { loc })?;
            }
            Ok(false)
        }

        "ifeq" | "ifneq" | "ifdef" | "ifndef" => {
            let loc = ll.location(offset);
            let (cond, _pos) = parse_condition(tok, ll, offset, puller)?;
            stack.open_block(loc, cond);
            Ok(false)
        }

        "endef" => Err(ParseError::UnmatchedEndef(ll.location(offset))),

        "define" => {
            let loc = ll.location(offset);
            let (mut name_exp, _pos, _stop) =
                parse_make_syntax(ll, offset, &[], Regime::Makefile, puller)?;
            name_exp.rstrip();
            let name_text = name_exp
                .as_literal()
                .ok_or_else(|| ParseError::MalformedDirective(loc.clone(), "define name must be literal".to_string()))?;
            let mut name = Expansion::new(loc.clone());
            name.append_literal(name_text);

            let value = parse_define_body(path, loc.clone(), puller)?;
            stack.append(Statement::SetVariable {
                name,
                op: VariableOp::Recursive,
                value,
                targetexp: None,
                source: Source::Default,
                loc,
            });
            Ok(false)
        }

        "include" | "-include" => {
            let loc = ll.location(offset);
            let required = tok == "include";
            let (files, _pos, _stop) = parse_make_syntax(ll, offset, &[], Regime::Makefile, puller)?;
            stack.append(Statement::Include { files, required, loc });
            Ok(false)
        }

        "vpath" => {
            let loc = ll.location(offset);
            let (args, _pos, _stop) = parse_make_syntax(ll, offset, &[], Regime::Makefile, puller)?;
            stack.append(Statement::VPathDirective { args, loc });
            Ok(false)
        }

        "override" => {
            let loc = ll.location(offset);
            let (mut name, pos, stop) =
                parse_make_syntax(ll, offset, &[":=", "+=", "?=", "="], Regime::Makefile, puller)?;
            let opstr = match stop {
                Stop::Token(t) => t,
                Stop::EndOfLine => {
                    return Err(ParseError::MalformedDirective(
                        loc,
                        "override requires an assignment operator".to_string(),
                    ))
                }
            };
            name.rstrip();
            let (mut value, _pos2, _stop2) = parse_make_syntax(ll, pos, &[], Regime::Makefile, puller)?;
            value.lstrip();
            stack.append(Statement::SetVariable {
                name,
                op: parse_var_op(&opstr),
                value,
                targetexp: None,
                source: Source::Override,
                loc,
            });
            Ok(false)
        }

        "export" => {
            let loc = ll.location(offset);
            let (pre, pos, stop) =
                parse_make_syntax(ll, offset, &[":=", "+=", "?=", "="], Regime::Makefile, puller)?;
            match stop {
                Stop::EndOfLine => {
                    stack.append(Statement::ExportDirective { args: pre, single: false, loc });
                    Ok(false)
                }
                Stop::Token(opstr) => {
                    let mut name = pre.clone();
                    name.rstrip();
                    let (mut value, _pos2, _stop2) =
                        parse_make_syntax(ll, pos, &[], Regime::Makefile, puller)?;
                    value.lstrip();
                    stack.append(Statement::ExportDirective {
                        args: pre,
                        single: true,
                        loc: loc.clone(),
                    });
                    stack.append(Statement::SetVariable {
                        name,
                        op: parse_var_op(&opstr),
                        value,
                        targetexp: None,
                        source: Source::Default,
                        loc,
                    });
                    Ok(false)
                }
            }
        }

        "unexport" => Err(ParseError::UnimplementedFeature(
            ll.location(offset),
            "unexport".to_string(),
        )),

        other => unreachable!("DIRECTIVE_TOKENS yielded an unhandled keyword {:?}", other),
    }
}

/// dispatch_statement handles a line with no recognized directive keyword:
/// an empty expression, a variable assignment, a rule, or a static pattern
/// rule. Returns the new `currule` value.
fn dispatch_statement(
    ll: &mut LogicalLine,
    offset: usize,
    stack: &mut ConditionalStack,
    puller: &mut LinePuller,
) -> Result<bool, ParseError> {
    let loc = ll.location(offset);
    let (pre, pos, stop) = parse_make_syntax(ll, offset, ASSIGN_STOPS, Regime::Makefile, puller)?;

    match stop {
        Stop::EndOfLine => {
            stack.append(Statement::EmptyDirective { expr: pre, loc });
            Ok(false)
        }
        Stop::Token(op) if op == "::" || op == ":" => {
            let doublecolon = op == "::";
            let mut targets = pre;
            targets.rstrip();
            parse_rule(ll, targets, doublecolon, loc, pos, stack, puller)
        }
        Stop::Token(op) => {
            let mut name = pre;
            name.rstrip();
            let (mut value, _pos2, _stop2) = parse_make_syntax(ll, pos, &[], Regime::Makefile, puller)?;
            value.lstrip();
            stack.append(Statement::SetVariable {
                name,
                op: parse_var_op(&op),
                value,
                targetexp: None,
                source: Source::Default,
                loc,
            });
            Ok(false)
        }
    }
}

/// parse_rule parses the right-hand side of `targets:` or `targets::`,
/// disambiguating a plain rule, a static pattern rule, and a
/// target-specific variable assignment.
fn parse_rule(
    ll: &mut LogicalLine,
    targets: Expansion,
    doublecolon: bool,
    loc: SourceLoc,
    offset: usize,
    stack: &mut ConditionalStack,
    puller: &mut LinePuller,
) -> Result<bool, ParseError> {
    let (rhs, pos, stop) = parse_make_syntax(ll, offset, RULE_RHS_STOPS, Regime::Makefile, puller)?;

    match stop {
        Stop::EndOfLine => {
            let mut prereqs = rhs;
            prereqs.lstrip();
            stack.append(Statement::Rule { targets, prereqs, doublecolon, loc });
            Ok(true)
        }
        Stop::Token(t) if t == ";" => {
            let mut prereqs = rhs;
            prereqs.lstrip();
            stack.append(Statement::Rule {
                targets,
                prereqs,
                doublecolon,
                loc: loc.clone(),
            });
            let (text, _pos2, _stop2) = parse_make_syntax(ll, pos, &[], Regime::Recipe, puller)?;
            stack.append(Statement::Command { text, loc });
            Ok(true)
        }
        Stop::Token(t) if t == "|" => Err(ParseError::UnimplementedFeature(
            ll.location(pos),
            "order-only prerequisites".to_string(),
        )),
        Stop::Token(t) if t == ":" => {
            let mut pattern = rhs;
            pattern.rstrip();
            let (prereqs_rhs, pos2, stop2) = parse_make_syntax(ll, pos, &[";"], Regime::Makefile, puller)?;
            let mut prereqs = prereqs_rhs;
            prereqs.lstrip();
            stack.append(Statement::StaticPatternRule {
                targets,
                pattern,
                prereqs,
                doublecolon,
                loc: loc.clone(),
            });
            if let Stop::Token(_semicolon) = stop2 {
                let (text, _pos3, _stop3) = parse_make_syntax(ll, pos2, &[], Regime::Recipe, puller)?;
                stack.append(Statement::Command { text, loc });
            }
            Ok(true)
        }
        Stop::Token(op) => {
            // a var-set operator here means what looked like prerequisites
            // was actually a target-specific variable's name.
            let mut name = rhs;
            name.rstrip();
            let (mut value, _pos2, _stop2) = parse_make_syntax(ll, pos, &[], Regime::Makefile, puller)?;
            value.lstrip();
            stack.append(Statement::SetVariable {
                name,
                op: parse_var_op(&op),
                value,
                targetexp: Some(targets),
                source: Source::Default,
                loc,
            });
            Ok(false)
        }
    }
}

fn parse_var_op(op: &str) -> VariableOp {
    match op {
        ":=" => VariableOp::Simple,
        "+=" => VariableOp::Append,
        "?=" => VariableOp::Conditional,
        "=" => VariableOp::Recursive,
        other => unreachable!("not a variable-set operator: {:?}", other),
    }
}

/// parse_condition parses the argument form of `ifeq`/`ifneq`/`ifdef`/`ifndef`,
/// returning the parsed [Condition] and the offset just past it.
fn parse_condition(
    keyword: &str,
    ll: &mut LogicalLine,
    offset: usize,
    puller: &mut LinePuller,
) -> Result<(Condition, usize), ParseError> {
    let loc = ll.location(offset);
    match keyword {
        "ifeq" | "ifneq" => {
            let expected = keyword == "ifeq";
            let (left, right, pos) = parse_eq_args(ll, offset, puller)?;
            Ok((Condition::EqCondition { left, right, expected, loc }, pos))
        }
        "ifdef" | "ifndef" => {
            let expected = keyword == "ifdef";
            let (mut name, pos, _stop) = parse_make_syntax(ll, offset, &[], Regime::Makefile, puller)?;
            name.rstrip();
            Ok((Condition::IfdefCondition { name, expected, loc }, pos))
        }
        other => unreachable!("not a condition keyword: {:?}", other),
    }
}

/// parse_eq_args parses either `(A,B)` or `'A' 'B'`/`"A" "B"` (the quote
/// characters opening each side need not match each other).
fn parse_eq_args(
    ll: &mut LogicalLine,
    offset: usize,
    puller: &mut LinePuller,
) -> Result<(Expansion, Expansion, usize), ParseError> {
    let offset = ll.skipws(offset);
    let opener = ll.buffer()[offset..].chars().next();

    match opener {
        Some('(') => {
            let (mut left, pos, _stop) = parse_make_syntax(ll, offset + 1, &[","], Regime::Makefile, puller)?;
            left.rstrip();
            let (right, pos2, _stop2) = parse_make_syntax(ll, pos, &[")"], Regime::Makefile, puller)?;
            check_trailing(ll, pos2)?;
            Ok((left, right, pos2))
        }
        Some(q) if q == '\'' || q == '"' => {
            let qs = q.to_string();
            let (left, pos, _stop) = parse_make_syntax(ll, offset + 1, &[qs.as_str()], Regime::Makefile, puller)?;
            let pos2 = ll.skipws(pos);
            let opener2 = ll.buffer()[pos2..].chars().next();
            let q2 = match opener2 {
                Some(c) if c == '\'' || c == '"' => c,
                _ => {
                    return Err(ParseError::MalformedConditional(
                        ll.location(pos2),
                        "expected an opening quote before the second argument".to_string(),
                    ))
                }
            };
            let q2s = q2.to_string();
            let (right, pos3, _stop3) =
                parse_make_syntax(ll, pos2 + 1, &[q2s.as_str()], Regime::Makefile, puller)?;
            check_trailing(ll, pos3)?;
            Ok((left, right, pos3))
        }
        _ => Err(ParseError::MalformedConditional(
            ll.location(offset),
            "expected '(' or a quote character".to_string(),
        )),
    }
}

/// check_trailing confirms nothing but whitespace or a comment remains on
/// the current logical line from `offset` onward, without pulling any
/// further physical lines.
fn check_trailing(ll: &LogicalLine, offset: usize) -> Result<(), ParseError> {
    if offset >= ll.len() {
        return Ok(());
    }
    let rest = ll.buffer()[offset..].trim_end_matches('\n').trim();
    if rest.is_empty() || rest.starts_with('#') {
        Ok(())
    } else {
        Err(ParseError::UnexpectedTrailingData(ll.location(offset), rest.to_string()))
    }
}

/// parse_define_body reads physical lines directly (bypassing the
/// statement-level TAB/directive dispatch) until a matching `endef` is
/// found at depth zero, flattening every retained line's continuation-
/// collapsed text into one string, joined by the newlines that separated
/// them in the source.
fn parse_define_body(
    path: Rc<str>,
    start_loc: SourceLoc,
    puller: &mut LinePuller,
) -> Result<Expansion, ParseError> {
    let mut depth: usize = 1;
    let mut body = Expansion::new(start_loc.clone());

    loop {
        let mut ll = LogicalLine::new(path.clone());
        if !ll.read_next(puller)? {
            return Err(ParseError::UnterminatedDefine(start_loc));
        }

        if !ll.buffer().starts_with('\t') {
            let start = ll.skipws(0);
            if let Some((kw, _end)) = ll.find_token(start, &DEFINE_KEYWORD_TOKENS, false) {
                match kw.as_str() {
                    "endef" => {
                        depth -= 1;
                        if depth == 0 {
                            return Ok(body);
                        }
                    }
                    "define" => depth += 1,
                    _ => {}
                }
            }
        }

        let (line_text, _pos, _stop) = parse_make_syntax(&mut ll, 0, &[], Regime::Nested, puller)?;
        for node in line_text.nodes {
            body.append(node);
        }
        body.append_literal("\n");
    }
}

//! ast defines the statement tree a full parse produces: rules, variable
//! assignments, recipe commands, conditionals, and directives, each carrying
//! the source location it was parsed from.

use crate::expansion::Expansion;
use crate::location::SourceLoc;

/// StatementList is an ordered sequence of statements, either the top-level
/// result of a parse or the body of one arm of a [ConditionBlock].
pub type StatementList = Vec<Statement>;

/// Source names where a variable assignment's value came from, letting a
/// later evaluator apply GNU Make's precedence rules (an `override`
/// directive beats a value from the environment or command line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Default,
    Override,
}

/// VariableOp is the operator used in a `name OP value` assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableOp {
    /// `=` — recursively expanded.
    Recursive,
    /// `:=` — simply expanded at assignment time.
    Simple,
    /// `?=` — only takes effect if the variable is not yet set.
    Conditional,
    /// `+=` — appends to the existing value.
    Append,
}

/// Condition is the test clause of an `if*` statement or `else` arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// EqCondition covers both `ifeq` (`expected = true`) and `ifneq`
    /// (`expected = false`).
    EqCondition {
        left: Expansion,
        right: Expansion,
        expected: bool,
        loc: SourceLoc,
    },
    /// IfdefCondition covers both `ifdef` (`expected = true`) and `ifndef`
    /// (`expected = false`).
    IfdefCondition {
        name: Expansion,
        expected: bool,
        loc: SourceLoc,
    },
    /// ElseCondition is a bare `else` with no test of its own.
    ElseCondition { loc: SourceLoc },
}

impl Condition {
    pub fn loc(&self) -> &SourceLoc {
        match self {
            Condition::EqCondition { loc, .. } => loc,
            Condition::IfdefCondition { loc, .. } => loc,
            Condition::ElseCondition { loc } => loc,
        }
    }
}

/// Statement is one parsed construct from a makefile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// SetVariable covers a plain assignment, an `override`, and a
    /// target-specific variable (when `targetexp` is set).
    SetVariable {
        name: Expansion,
        op: VariableOp,
        value: Expansion,
        targetexp: Option<Expansion>,
        source: Source,
        loc: SourceLoc,
    },

    /// Rule declares a target list and its prerequisites.
    Rule {
        targets: Expansion,
        prereqs: Expansion,
        doublecolon: bool,
        loc: SourceLoc,
    },

    /// StaticPatternRule declares a target list that expands prerequisites
    /// through a shared pattern.
    StaticPatternRule {
        targets: Expansion,
        pattern: Expansion,
        prereqs: Expansion,
        doublecolon: bool,
        loc: SourceLoc,
    },

    /// Command is one recipe line, attached to the most recently opened
    /// Rule or StaticPatternRule in the current arm.
    Command { text: Expansion, loc: SourceLoc },

    /// Include names one or more makefiles to read; `required` is false
    /// for `-include`/`sinclude`, which tolerate a missing file.
    Include {
        files: Expansion,
        required: bool,
        loc: SourceLoc,
    },

    /// VPathDirective is a `vpath` directive, kept as unparsed text: the
    /// evaluator owns its pattern/path-list syntax.
    VPathDirective { args: Expansion, loc: SourceLoc },

    /// ExportDirective is a bare `export` (`single = false`, naming zero or
    /// more variables to export) or an `export name = value` combined form
    /// (`single = true`, followed immediately by the SetVariable it
    /// introduces).
    ExportDirective {
        args: Expansion,
        single: bool,
        loc: SourceLoc,
    },

    /// EmptyDirective is a line with no recognized directive and no
    /// assignment or rule operator: text make would treat as an error at
    /// evaluation time, kept here as an opaque expression.
    EmptyDirective { expr: Expansion, loc: SourceLoc },

    /// ConditionBlock is one `if*`/`else`/`endif` group. `arms` always has
    /// at least one entry, the block's introducing condition.
    ConditionBlock {
        arms: Vec<(Condition, StatementList)>,
        loc: SourceLoc,
    },
}

impl Statement {
    pub fn loc(&self) -> &SourceLoc {
        match self {
            Statement::SetVariable { loc, .. }
            | Statement::Rule { loc, .. }
            | Statement::StaticPatternRule { loc, .. }
            | Statement::Command { loc, .. }
            | Statement::Include { loc, .. }
            | Statement::VPathDirective { loc, .. }
            | Statement::ExportDirective { loc, .. }
            | Statement::EmptyDirective { loc, .. }
            | Statement::ConditionBlock { loc, .. } => loc,
        }
    }

    /// accepts_command reports whether a recipe line may be attached to
    /// this statement, per the "currule" rule (§4.6): only a Rule or
    /// StaticPatternRule may carry commands.
    pub fn accepts_command(&self) -> bool {
        matches!(
            self,
            Statement::Rule { .. } | Statement::StaticPatternRule { .. }
        )
    }
}

#[test]
fn test_statement_loc_accessors() {
    use std::rc::Rc;
    let loc = SourceLoc::new(Rc::from("test.mk"), 3, 0);
    let stmt = Statement::EmptyDirective {
        expr: Expansion::new(loc.clone()),
        loc: loc.clone(),
    };
    assert_eq!(stmt.loc(), &loc);
}

#[test]
fn test_accepts_command_only_for_rules() {
    use std::rc::Rc;
    let loc = SourceLoc::new(Rc::from("test.mk"), 1, 0);
    let rule = Statement::Rule {
        targets: Expansion::new(loc.clone()),
        prereqs: Expansion::new(loc.clone()),
        doublecolon: false,
        loc: loc.clone(),
    };
    assert!(rule.accepts_command());

    let set = Statement::SetVariable {
        name: Expansion::new(loc.clone()),
        op: VariableOp::Recursive,
        value: Expansion::new(loc.clone()),
        targetexp: None,
        source: Source::Default,
        loc,
    };
    assert!(!set.accepts_command());
}

#[test]
fn test_condition_loc() {
    use std::rc::Rc;
    let loc = SourceLoc::new(Rc::from("test.mk"), 2, 0);
    let cond = Condition::ElseCondition { loc: loc.clone() };
    assert_eq!(cond.loc(), &loc);
}

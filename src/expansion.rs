//! expansion defines the parsed tree of a piece of make syntax: literal
//! text interleaved with variable references, substitution references, and
//! function calls, each left unevaluated until expansion time.

use crate::location::SourceLoc;

/// Expansion is an ordered sequence of nodes that together make up one
/// parsed `$(...)`-bearing piece of text, plus the location it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub nodes: Vec<Node>,
    pub loc: SourceLoc,
}

/// Node is one element of an [Expansion].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal holds text with no further expansion syntax inside it.
    Literal(String),

    /// VariableRef holds a variable name expansion, `$(name)` or `$x`. The
    /// name is itself an Expansion, since `$($(x))` is legal.
    VariableRef(Expansion),

    /// SubstitutionRef holds a `$(var:from=to)` reference.
    SubstitutionRef {
        name: Expansion,
        from: Expansion,
        to: Expansion,
    },

    /// FunctionCall holds a builtin function invocation, `$(name arg,arg)`.
    FunctionCall {
        name: String,
        args: Vec<Expansion>,
        loc: SourceLoc,
    },
}

impl Expansion {
    /// new returns an empty Expansion starting at `loc`.
    pub fn new(loc: SourceLoc) -> Expansion {
        Expansion { nodes: Vec::new(), loc }
    }

    /// is_empty reports whether this Expansion carries no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// append adds a node to the end of this Expansion.
    ///
    /// Two adjacent literals are merged, keeping parsed trees normalized
    /// rather than leaving fragmented runs for every escape boundary crossed
    /// during scanning.
    pub fn append(&mut self, node: Node) {
        if let (Node::Literal(new_text), Some(Node::Literal(last_text))) =
            (&node, self.nodes.last_mut())
        {
            last_text.push_str(new_text);
            return;
        }
        self.nodes.push(node);
    }

    /// append_literal appends a run of literal text, merging with a
    /// trailing literal node if one is already present.
    pub fn append_literal(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.append(Node::Literal(text));
    }

    /// lstrip removes leading whitespace from this Expansion's first
    /// literal node, matching make's whitespace-trimming around `$(...)`
    /// boundaries in several contexts (conditional arguments, `strip`).
    pub fn lstrip(&mut self) {
        if let Some(Node::Literal(text)) = self.nodes.first_mut() {
            let trimmed = text.trim_start().to_string();
            if trimmed.is_empty() {
                self.nodes.remove(0);
            } else {
                *text = trimmed;
            }
        }
    }

    /// rstrip removes trailing whitespace from this Expansion's last
    /// literal node.
    pub fn rstrip(&mut self) {
        if let Some(Node::Literal(text)) = self.nodes.last_mut() {
            let trimmed = text.trim_end().to_string();
            if trimmed.is_empty() {
                self.nodes.pop();
            } else {
                *text = trimmed;
            }
        }
    }

    /// as_literal returns this Expansion's text if it is made up entirely
    /// of literal nodes, with no unresolved references.
    ///
    /// Used by callers that need a name or argument to be known at parse
    /// time, such as a `define` directive's name.
    pub fn as_literal(&self) -> Option<String> {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Literal(text) => out.push_str(text),
                _ => return None,
            }
        }
        Some(out)
    }
}

#[cfg(test)]
fn test_loc() -> SourceLoc {
    SourceLoc::start("test.mk")
}

#[test]
fn test_append_merges_adjacent_literals() {
    let mut e = Expansion::new(test_loc());
    e.append_literal("foo");
    e.append_literal("bar");
    assert_eq!(e.nodes, vec![Node::Literal("foobar".to_string())]);
}

#[test]
fn test_append_does_not_merge_across_reference() {
    let mut e = Expansion::new(test_loc());
    e.append_literal("foo");
    e.append(Node::VariableRef(Expansion::new(test_loc())));
    e.append_literal("bar");
    assert_eq!(e.nodes.len(), 3);
}

#[test]
fn test_lstrip_removes_leading_whitespace() {
    let mut e = Expansion::new(test_loc());
    e.append_literal("   foo");
    e.lstrip();
    assert_eq!(e.as_literal(), Some("foo".to_string()));
}

#[test]
fn test_lstrip_drops_all_whitespace_node() {
    let mut e = Expansion::new(test_loc());
    e.append_literal("   ");
    e.lstrip();
    assert!(e.nodes.is_empty());
}

#[test]
fn test_rstrip_removes_trailing_whitespace() {
    let mut e = Expansion::new(test_loc());
    e.append_literal("foo   ");
    e.rstrip();
    assert_eq!(e.as_literal(), Some("foo".to_string()));
}

#[test]
fn test_as_literal_none_with_reference() {
    let mut e = Expansion::new(test_loc());
    e.append_literal("foo");
    e.append(Node::VariableRef(Expansion::new(test_loc())));
    assert_eq!(e.as_literal(), None);
}

//! functions describes the builtin function names the expansion parser
//! recognizes inside `$(name args...)`, and how many comma-separated
//! arguments each one accepts before the rest of the text is folded into
//! its final argument.

use crate::tokens::TokenList;
use lazy_static::lazy_static;

/// FunctionSpec names one builtin function and how many arguments it takes.
///
/// `max_args` bounds how many `,`-separated argument slots the parser opens
/// for this function; once the limit is reached, any further commas are
/// literal text belonging to the last argument. This mirrors GNU Make's
/// function table, where for example `$(if cond,then,else)` takes exactly
/// three slots but `$(subst from,to,text)` lets `text` absorb extra commas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub max_args: usize,
}

/// FUNCTIONS lists every builtin function name this parser recognizes, in
/// no particular order; [function_table] is the form callers should use.
static FUNCTIONS: &[FunctionSpec] = &[
    FunctionSpec { name: "subst", max_args: 3 },
    FunctionSpec { name: "patsubst", max_args: 3 },
    FunctionSpec { name: "strip", max_args: 1 },
    FunctionSpec { name: "findstring", max_args: 2 },
    FunctionSpec { name: "filter", max_args: 2 },
    FunctionSpec { name: "filter-out", max_args: 2 },
    FunctionSpec { name: "sort", max_args: 1 },
    FunctionSpec { name: "word", max_args: 2 },
    FunctionSpec { name: "wordlist", max_args: 3 },
    FunctionSpec { name: "words", max_args: 1 },
    FunctionSpec { name: "firstword", max_args: 1 },
    FunctionSpec { name: "lastword", max_args: 1 },
    FunctionSpec { name: "dir", max_args: 1 },
    FunctionSpec { name: "notdir", max_args: 1 },
    FunctionSpec { name: "suffix", max_args: 1 },
    FunctionSpec { name: "basename", max_args: 1 },
    FunctionSpec { name: "addsuffix", max_args: 2 },
    FunctionSpec { name: "addprefix", max_args: 2 },
    FunctionSpec { name: "join", max_args: 2 },
    FunctionSpec { name: "wildcard", max_args: 1 },
    FunctionSpec { name: "realpath", max_args: 1 },
    FunctionSpec { name: "abspath", max_args: 1 },
    FunctionSpec { name: "error", max_args: 1 },
    FunctionSpec { name: "warning", max_args: 1 },
    FunctionSpec { name: "info", max_args: 1 },
    FunctionSpec { name: "if", max_args: 3 },
    FunctionSpec { name: "or", max_args: usize::MAX },
    FunctionSpec { name: "and", max_args: usize::MAX },
    FunctionSpec { name: "foreach", max_args: 3 },
    FunctionSpec { name: "call", max_args: usize::MAX },
    FunctionSpec { name: "value", max_args: 1 },
    FunctionSpec { name: "eval", max_args: 1 },
    FunctionSpec { name: "origin", max_args: 1 },
    FunctionSpec { name: "flavor", max_args: 1 },
    FunctionSpec { name: "shell", max_args: 1 },
];

lazy_static! {
    /// FUNCTION_NAME_TOKENS is the TokenList the expansion parser searches
    /// to recognize a function call's name, ordered longest-name-first so
    /// that, for example, `filter-out` is preferred over the `filter`
    /// prefix it contains.
    pub static ref FUNCTION_NAME_TOKENS: std::sync::Arc<TokenList> = {
        let mut names: Vec<&str> = FUNCTIONS.iter().map(|f| f.name).collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        TokenList::get(&names)
    };
}

/// lookup returns the FunctionSpec for `name`, if it names a builtin.
pub fn lookup(name: &str) -> Option<FunctionSpec> {
    FUNCTIONS.iter().find(|f| f.name == name).copied()
}

#[test]
fn test_lookup_known_function() {
    let spec = lookup("patsubst").unwrap();
    assert_eq!(spec.max_args, 3);
}

#[test]
fn test_lookup_unknown_function() {
    assert!(lookup("not-a-function").is_none());
}

#[test]
fn test_variadic_functions_have_unbounded_args() {
    assert_eq!(lookup("or").unwrap().max_args, usize::MAX);
    assert_eq!(lookup("call").unwrap().max_args, usize::MAX);
}

#[test]
fn test_name_tokens_prefer_longer_match() {
    let tl = &*FUNCTION_NAME_TOKENS;
    let m = tl.find_simple("filter-out a,b", 0).unwrap();
    assert_eq!(m.as_str(), "filter-out");
}

#[test]
fn test_all_function_names_present_in_table() {
    for spec in FUNCTIONS {
        assert!(FUNCTION_NAME_TOKENS.contains(spec.name));
    }
}

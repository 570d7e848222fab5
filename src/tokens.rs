//! tokens compiles and caches the literal-token matchers the char iterators
//! search for.
//!
//! A TokenList is built from a small ordered set of literal strings (such as
//! `[":=", "+=", "?=", "="]`) plus, depending on which matcher is asked for,
//! a fixed set of regime-specific meta-tokens (comments, escapes,
//! continuations). Order matters: the regex alternation tries earlier
//! alternatives first, so a two-character token like `::` must be listed
//! ahead of its one-character prefix `:` by the caller.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

lazy_static! {
    static ref CACHE: Mutex<HashMap<Vec<String>, Arc<TokenList>>> = Mutex::new(HashMap::new());
}

/// TokenList holds the compiled matchers for one ordered set of literal
/// tokens.
///
/// Immutable once built. Process-wide instances are cached by their literal
/// token tuple via [TokenList::get].
pub struct TokenList {
    /// tokens denotes the literal strings this list was built from, in
    /// caller order.
    pub tokens: Vec<String>,

    /// empty denotes whether this list has no literal tokens at all, in
    /// which case every matcher below is unused: iterators short-circuit and
    /// emit the whole remaining buffer as one chunk.
    pub empty: bool,

    simple: Option<Regex>,
    makefile: Option<Regex>,
    continuation: Option<Regex>,
    ws: Option<Regex>,
}

impl TokenList {
    /// get returns the cached TokenList for this ordered token set,
    /// compiling and caching it on first use.
    pub fn get(tokens: &[&str]) -> Arc<TokenList> {
        let key: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();

        let mut cache = CACHE.lock().unwrap();
        if let Some(existing) = cache.get(&key) {
            return existing.clone();
        }

        let built = Arc::new(TokenList::build(&key));
        cache.insert(key, built.clone());
        built
    }

    fn build(tokens: &[String]) -> TokenList {
        if tokens.is_empty() {
            return TokenList {
                tokens: Vec::new(),
                empty: true,
                simple: None,
                makefile: None,
                continuation: None,
                ws: None,
            };
        }

        let escaped: Vec<String> = tokens.iter().map(|t| regex::escape(t)).collect();
        let literal_alt = escaped.join("|");

        let simple = Regex::new(&literal_alt).expect("literal token alternation");

        let makefile_alt = [
            literal_alt.clone(),
            MAKEFILE_META.join("|"),
        ]
        .join("|");
        let makefile = Regex::new(&makefile_alt).expect("makefile token alternation");

        let continuation_alt = [literal_alt.clone(), CONTINUATION_META.join("|")].join("|");
        let continuation =
            Regex::new(&continuation_alt).expect("continuation token alternation");

        let ws_pattern = format!("^({})(\\s+|\\z)", literal_alt);
        let ws = Regex::new(&ws_pattern).expect("token-followed-by-whitespace alternation");

        TokenList {
            tokens: tokens.to_vec(),
            empty: false,
            simple: Some(simple),
            makefile: Some(makefile),
            continuation: Some(continuation),
            ws: Some(ws),
        }
    }

    /// contains reports whether `s` is one of this list's literal tokens.
    pub fn contains(&self, s: &str) -> bool {
        self.tokens.iter().any(|t| t == s)
    }

    /// find_simple searches for the nearest literal token (no meta-tokens)
    /// at or after `start`.
    pub fn find_simple(&self, haystack: &str, start: usize) -> Option<regex::Match<'_>> {
        self.simple.as_ref()?.find_at(haystack, start)
    }

    /// find_makefile searches using the makefile regime's full matcher
    /// (literals plus comment/escape/continuation meta-tokens).
    pub fn find_makefile(&self, haystack: &str, start: usize) -> Option<regex::Match<'_>> {
        self.makefile.as_ref()?.find_at(haystack, start)
    }

    /// find_continuation searches using the command/define regime's matcher
    /// (literals plus escape/continuation meta-tokens, no comment handling).
    pub fn find_continuation(&self, haystack: &str, start: usize) -> Option<regex::Match<'_>> {
        self.continuation.as_ref()?.find_at(haystack, start)
    }

    /// find_token_with_ws implements the "token followed by whitespace or
    /// EOF" match used to recognize directive keywords.
    ///
    /// The match is anchored at `start`: a token elsewhere in the haystack
    /// does not count. Returns the matched token text and the offset after
    /// any trailing whitespace was skipped.
    pub fn find_token_with_ws(&self, haystack: &str, start: usize) -> Option<(String, usize)> {
        let re = self.ws.as_ref()?;
        let slice = haystack.get(start..)?;
        let caps = re.captures(slice)?;
        let token = caps.get(1)?.as_str().to_string();
        let end = start + caps.get(0)?.end();
        Some((token, end))
    }
}

/// MAKEFILE_META are the comment/escape/continuation fragments appended to
/// the makefile regime's matcher, in priority order. Order matters: `regex`
/// resolves ambiguous alternation leftmost-first, so a more specific
/// fragment (a doubled escape) must precede a more general one it could
/// also match a prefix of.
static MAKEFILE_META: &[&str] = &[
    "\\\\\\\\#",
    "\\\\#",
    "\\\\\n",
    "\\\\\\s+\\\\\n",
    "\\\\.",
    "#",
    "\n",
];

/// CONTINUATION_META are the escape/continuation fragments used by the
/// command and define-body regimes.
static CONTINUATION_META: &[&str] = &["\\\\\n", "\\\\.", "\n"];

#[test]
fn test_empty_tokenlist() {
    let tl = TokenList::get(&[]);
    assert!(tl.empty);
}

#[test]
fn test_cache_returns_same_instance() {
    let a = TokenList::get(&[":=", "+="]);
    let b = TokenList::get(&[":=", "+="]);
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_order_sensitive_cache_keys() {
    let a = TokenList::get(&["::", ":"]);
    let b = TokenList::get(&[":", "::"]);
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn test_find_simple_literal() {
    let tl = TokenList::get(&[":=", "="]);
    let m = tl.find_simple("A := 1", 2).unwrap();
    assert_eq!(m.as_str(), ":=");
}

#[test]
fn test_find_makefile_comment() {
    let tl = TokenList::get(&[]);
    let m = tl.find_makefile("abc # comment\n", 0).unwrap();
    assert_eq!(m.as_str(), "#");
    assert_eq!(m.start(), 4);
}

#[test]
fn test_find_makefile_backslash_hash_escape() {
    let tl = TokenList::get(&[]);
    // a single backslash escapes a literal '#': no comment.
    let m = tl.find_makefile("a\\#b\n", 0).unwrap();
    assert_eq!(m.as_str(), "\\#");
}

#[test]
fn test_find_makefile_double_backslash_then_hash_is_comment() {
    let tl = TokenList::get(&[]);
    // two backslashes is an escaped backslash; the following '#' still
    // starts a comment.
    let m = tl.find_makefile("a\\\\#b\n", 0).unwrap();
    assert_eq!(m.as_str(), "\\\\#");
}

#[test]
fn test_find_makefile_continuation() {
    let tl = TokenList::get(&[]);
    let m = tl.find_makefile("a\\\nb", 0).unwrap();
    assert_eq!(m.as_str(), "\\\n");
}

#[test]
fn test_find_makefile_awful_case() {
    let tl = TokenList::get(&[]);
    let m = tl.find_makefile("a\\  \\\n", 0).unwrap();
    assert_eq!(m.as_str(), "\\  \\\n");
}

#[test]
fn test_find_token_with_ws() {
    let tl = TokenList::get(&["ifeq", "ifneq"]);
    let (tok, end) = tl.find_token_with_ws("ifeq (a,b)", 0).unwrap();
    assert_eq!(tok, "ifeq");
    assert_eq!(&"ifeq (a,b)"[end..], "(a,b)");
}

#[test]
fn test_find_token_with_ws_rejects_prefix() {
    let tl = TokenList::get(&["ifeq"]);
    assert!(tl.find_token_with_ws("ifeqXYZ\n", 0).is_none());
}

#[test]
fn test_find_token_with_ws_accepts_eof() {
    let tl = TokenList::get(&["endif"]);
    let (tok, end) = tl.find_token_with_ws("endif", 0).unwrap();
    assert_eq!(tok, "endif");
    assert_eq!(end, 5);
}

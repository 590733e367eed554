//! Template token grammar
//!
//! ```text
//! token    := "{" NAMESPACE "::" NAME indexer? "}"
//! NAMESPACE:= ENV | ATTR | VAR
//! NAME     := [A-Za-z_][A-Za-z0-9_]*
//! indexer  := "[" "]" | "[" digits "]" | "[" 'key' "]" | "[" "key" "]"
//! ```
//!
//! Scanning is two-staged: a loose candidate pattern finds every
//! `{WORD::...}` span, then the candidate is split and validated. Candidates
//! with an unknown namespace are skipped, not rejected.

use crate::error::SubstitutionError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

static CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*::[^{}]*)\}").expect("candidate pattern is valid")
});

// Groups: 1 = name, 2 = "[]", 3 = numeric index, 4 = single-quoted key,
// 5 = double-quoted key
static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^([A-Za-z_][A-Za-z0-9_]*)(?:",
        r"(\[\s*\])",
        r#"|\[\s*([0-9]+)\s*\]"#,
        r#"|\[\s*'([^']*)'\s*\]"#,
        r#"|\[\s*"([^"]*)"\s*\]"#,
        r")?$"
    ))
    .expect("reference pattern is valid")
});

/// Token namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Process environment
    Env,
    /// Attribute map of the call site
    Attr,
    /// Per-call variables
    Var,
}

impl FromStr for Namespace {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENV" => Ok(Self::Env),
            "ATTR" => Ok(Self::Attr),
            "VAR" => Ok(Self::Var),
            _ => Err(()),
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env => f.write_str("ENV"),
            Self::Attr => f.write_str("ATTR"),
            Self::Var => f.write_str("VAR"),
        }
    }
}

/// Structured-value indexer
///
/// Parsed and carried on the token; substitution is scalar only for now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indexer {
    /// `[]`
    Empty,
    /// `[N]`
    Index(usize),
    /// `['key']` or `["key"]`
    Key(String),
}

/// One parsed token occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Exact matched text, braces included
    pub text: String,
    /// Namespace
    pub namespace: Namespace,
    /// Referenced name
    pub name: String,
    /// Optional indexer
    pub indexer: Option<Indexer>,
}

/// Parse every known-namespace token in `template`, left to right
///
/// # Errors
/// Returns `SubstitutionError::Malformed` when a known-namespace candidate
/// does not split into exactly `NAMESPACE::NAME`, or carries an invalid name
/// or indexer.
pub fn parse_tokens(template: &str) -> Result<Vec<Token>, SubstitutionError> {
    parse_tokens_in(template, |_| true)
}

/// Parse the tokens of the namespaces `accept` selects
///
/// Candidates in other namespaces are left untouched and never validated.
///
/// # Errors
/// Same as [`parse_tokens`], for accepted namespaces only.
pub fn parse_tokens_in(
    template: &str,
    accept: impl Fn(Namespace) -> bool,
) -> Result<Vec<Token>, SubstitutionError> {
    let mut tokens = Vec::new();

    for caps in CANDIDATE.captures_iter(template) {
        let text = &caps[0];
        let body = &caps[1];

        let (head, reference) = body.split_once("::").unwrap_or((body, ""));
        let Ok(namespace) = head.parse::<Namespace>() else {
            tracing::trace!(token = text, "skipping unknown namespace");
            continue;
        };
        if !accept(namespace) {
            continue;
        }

        let extra = reference.matches("::").count();
        if extra > 0 {
            return Err(SubstitutionError::malformed(
                text,
                format!("expected NAMESPACE::NAME, found {} segments", extra + 2),
            ));
        }

        tokens.push(parse_reference(text, namespace, reference)?);
    }

    Ok(tokens)
}

fn parse_reference(text: &str, namespace: Namespace, reference: &str) -> Result<Token, SubstitutionError> {
    let caps = REFERENCE
        .captures(reference)
        .ok_or_else(|| SubstitutionError::malformed(text, "invalid name or indexer"))?;

    let indexer = if caps.get(2).is_some() {
        Some(Indexer::Empty)
    } else if let Some(index) = caps.get(3) {
        let index = index
            .as_str()
            .parse()
            .map_err(|_| SubstitutionError::malformed(text, "index out of range"))?;
        Some(Indexer::Index(index))
    } else {
        caps.get(4)
            .or_else(|| caps.get(5))
            .map(|key| Indexer::Key(key.as_str().to_string()))
    };

    Ok(Token {
        text: text.to_string(),
        namespace,
        name: caps[1].to_string(),
        indexer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_plain_tokens() {
        let tokens = parse_tokens("a {ENV::HOME} b {ATTR::scenario} c {VAR::n}").unwrap();

        let summary: Vec<(Namespace, &str)> =
            tokens.iter().map(|t| (t.namespace, t.name.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (Namespace::Env, "HOME"),
                (Namespace::Attr, "scenario"),
                (Namespace::Var, "n"),
            ]
        );
        assert!(tokens.iter().all(|t| t.indexer.is_none()));
        assert_eq!(tokens[0].text, "{ENV::HOME}");
    }

    #[test]
    fn parses_indexers() {
        let tokens = parse_tokens(
            r#"{ATTR::a[]} {ATTR::b[ 3 ]} {ATTR::c['key']} {ATTR::d["other key"]}"#,
        )
        .unwrap();

        assert_eq!(tokens[0].indexer, Some(Indexer::Empty));
        assert_eq!(tokens[1].indexer, Some(Indexer::Index(3)));
        assert_eq!(tokens[2].indexer, Some(Indexer::Key("key".to_string())));
        assert_eq!(tokens[3].indexer, Some(Indexer::Key("other key".to_string())));
    }

    #[test]
    fn unknown_namespace_skipped() {
        let tokens = parse_tokens("{FUTURE::thing} {ENV::X}").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].namespace, Namespace::Env);
    }

    #[test]
    fn unknown_namespace_skipped_before_segment_count() {
        let tokens = parse_tokens("{FUTURE::a::b}/{ENV::X}").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "{ENV::X}");
    }

    #[test]
    fn unaccepted_namespace_not_validated() {
        let template = "{ATTR::list[1:2]}/{ATTR::a::b}/{ENV::X}";
        let tokens = parse_tokens_in(template, |ns| ns == Namespace::Env).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].namespace, Namespace::Env);

        assert!(parse_tokens(template).is_err());
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        let err = parse_tokens("{ENV::A::B}").unwrap_err();
        assert!(matches!(err, SubstitutionError::Malformed { token, .. } if token == "{ENV::A::B}"));
    }

    #[test]
    fn invalid_name_is_malformed() {
        assert!(parse_tokens("{ATTR::9lives}").is_err());
        assert!(parse_tokens("{ATTR::name[x]}").is_err());
        assert!(parse_tokens("{VAR::}").is_err());
    }

    #[test]
    fn non_token_braces_ignored() {
        assert!(parse_tokens(r#"{"json": true} {} {ENV} {a:b}"#).unwrap().is_empty());
    }

    #[test]
    fn namespace_roundtrip() {
        for ns in [Namespace::Env, Namespace::Attr, Namespace::Var] {
            assert_eq!(ns.to_string().parse::<Namespace>(), Ok(ns));
        }
        assert!("env".parse::<Namespace>().is_err());
    }
}

//! Placeholder grammar and scanning for compose templates.
//!
//! A [`Pattern`] wraps a regular expression with three logical groups:
//! `escaped` (`$$`), `named` (`$VAR`) and `braced` (`${VAR...}`). An optional
//! `invalid` group catches a `$` that starts none of the recognised forms.
//! Scanning is a pure function of the text; the grammar is a value, so tests
//! and callers can inject a stricter one.

mod substitute;

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{ComposeError, Result};

pub use self::substitute::{SubstitutionMode, Substituter, TemplateError};

/// Compose substitution grammar, case-insensitive.
pub const COMPOSE_GRAMMAR: &str = r"(?i)\$(?:(?P<escaped>\$)|(?P<named>[_a-z][_a-z0-9]*)|\{(?P<braced>[_a-z][_a-z0-9]*(?::?[-?][^}]*)?)\}|(?P<invalid>))";

const ESCAPED: &str = "escaped";
const NAMED: &str = "named";
const BRACED: &str = "braced";

#[allow(clippy::expect_used)]
static COMPOSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COMPOSE_GRAMMAR).expect("compose grammar compiles"));

/// A compiled substitution grammar.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compiles a custom grammar.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression does not compile or lacks one of the
    /// `escaped`, `named` or `braced` capture groups.
    pub fn new(grammar: &str) -> Result<Self> {
        let regex = Regex::new(grammar).map_err(|e| ComposeError::Pattern {
            message: e.to_string(),
        })?;
        for group in [ESCAPED, NAMED, BRACED] {
            if !regex.capture_names().flatten().any(|name| name == group) {
                return Err(ComposeError::Pattern {
                    message: format!("missing capture group \"{group}\""),
                });
            }
        }
        Ok(Self { regex })
    }

    /// The stock compose grammar ([`COMPOSE_GRAMMAR`]).
    #[must_use]
    pub fn compose() -> Self {
        Self {
            regex: COMPOSE_REGEX.clone(),
        }
    }

    /// Yields every placeholder occurrence in first-seen order.
    pub fn scan<'t>(&self, text: &'t str) -> impl Iterator<Item = Occurrence<'t>> {
        self.regex.captures_iter(text).filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Occurrence {
                span: whole.range(),
                placeholder: classify(&caps),
            })
        })
    }

    /// Yields the substitution bodies of a text, skipping escaped and
    /// malformed placeholders.
    pub fn substitutions<'t>(&self, text: &'t str) -> impl Iterator<Item = &'t str> {
        self.scan(text).filter_map(|occurrence| match occurrence.placeholder {
            Placeholder::Substitution(body) => Some(body),
            Placeholder::Escaped | Placeholder::Invalid => None,
        })
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::compose()
    }
}

/// A placeholder found in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder<'t> {
    /// `$$`, a literal dollar sign.
    Escaped,
    /// `$VAR` or `${...}`; carries the text between the delimiters.
    Substitution(&'t str),
    /// A `$` not followed by any recognised form.
    Invalid,
}

/// A placeholder together with its byte range in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence<'t> {
    /// Byte range of the whole match.
    pub span: Range<usize>,
    /// What was matched.
    pub placeholder: Placeholder<'t>,
}

fn classify<'t>(caps: &Captures<'t>) -> Placeholder<'t> {
    let group = |name: &str| caps.name(name).map(|m| m.as_str()).filter(|s| !s.is_empty());
    if group(ESCAPED).is_some() {
        return Placeholder::Escaped;
    }
    if let Some(body) = group(NAMED).or_else(|| group(BRACED)) {
        return Placeholder::Substitution(body);
    }
    Placeholder::Invalid
}

/// How a reference wants an unset value to be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// `${VAR:-default}` or `${VAR-default}`.
    Default,
    /// `${VAR:?message}` or `${VAR?message}`.
    Mandatory,
    /// `$VAR` or `${VAR}`.
    Plain,
}

/// A classified substitution body.
///
/// Escaped `$$` sequences never become references; see [`Placeholder::Escaped`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    /// Variable name.
    pub name: String,
    /// Reference form.
    pub kind: ReferenceKind,
    /// Default value or error message, possibly empty.
    pub payload: String,
    /// Whether an empty value counts as unset (the `:`-prefixed forms).
    pub empty_is_unset: bool,
}

impl VariableReference {
    /// Classifies a substitution body by the first separator it contains,
    /// checked in the order `:-`, `-`, `:?`, `?`.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let separators = [
            (":-", ReferenceKind::Default, true),
            ("-", ReferenceKind::Default, false),
            (":?", ReferenceKind::Mandatory, true),
            ("?", ReferenceKind::Mandatory, false),
        ];
        for (sep, kind, empty_is_unset) in separators {
            if let Some((name, payload)) = body.split_once(sep) {
                return Self {
                    name: name.to_owned(),
                    kind,
                    payload: payload.to_owned(),
                    empty_is_unset,
                };
            }
        }
        Self {
            name: body.to_owned(),
            kind: ReferenceKind::Plain,
            payload: String::new(),
            empty_is_unset: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutions_in_first_seen_order() {
        let pattern = Pattern::compose();
        let text = "image: ${IMAGE}\nport: ${PORT:-8080}\nuser: $USER\n";
        let bodies: Vec<&str> = pattern.substitutions(text).collect();
        assert_eq!(bodies, vec!["IMAGE", "PORT:-8080", "USER"]);
    }

    #[test]
    fn escaped_placeholders_are_skipped() {
        let pattern = Pattern::compose();
        let bodies: Vec<&str> = pattern.substitutions("cmd: echo $${HOME} $$PATH").collect();
        assert!(bodies.is_empty(), "got {bodies:?}");
    }

    #[test]
    fn duplicates_are_kept() {
        let pattern = Pattern::compose();
        let bodies: Vec<&str> = pattern.substitutions("${A} ${A} ${A:-x}").collect();
        assert_eq!(bodies, vec!["A", "A", "A:-x"]);
    }

    #[test]
    fn lone_dollar_is_invalid() {
        let pattern = Pattern::compose();
        let found: Vec<Placeholder<'_>> = pattern.scan("cost: 5$ ${}").map(|o| o.placeholder).collect();
        assert_eq!(found, vec![Placeholder::Invalid, Placeholder::Invalid]);
    }

    #[test]
    fn scan_reports_spans() {
        let pattern = Pattern::compose();
        let occurrences: Vec<Occurrence<'_>> = pattern.scan("a ${B} c").collect();
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].span, 2..6);
        assert_eq!(occurrences[0].placeholder, Placeholder::Substitution("B"));
    }

    #[test]
    fn grammar_is_case_insensitive() {
        let pattern = Pattern::compose();
        let bodies: Vec<&str> = pattern.substitutions("${Mixed_Case}").collect();
        assert_eq!(bodies, vec!["Mixed_Case"]);
    }

    #[test]
    fn custom_grammar_requires_groups() {
        let err = Pattern::new(r"\$(?P<named>[A-Z]+)").unwrap_err();
        assert!(err.to_string().contains("escaped"), "got: {err}");
    }

    #[test]
    fn custom_grammar_can_be_stricter() {
        let pattern = Pattern::new(
            r"\$(?:(?P<escaped>\$)|(?P<named>[A-Z][A-Z0-9_]*)|\{(?P<braced>[A-Z][A-Z0-9_]*(?::?[-?][^}]*)?)\})",
        )
        .expect("valid grammar");
        let bodies: Vec<&str> = pattern.substitutions("${lower} ${UPPER}").collect();
        assert_eq!(bodies, vec!["UPPER"]);
    }

    #[test]
    fn parse_classifies_forms() {
        let default = VariableReference::parse("PORT:-8080");
        assert_eq!(default.kind, ReferenceKind::Default);
        assert_eq!(default.name, "PORT");
        assert_eq!(default.payload, "8080");
        assert!(default.empty_is_unset);

        let unset_default = VariableReference::parse("PORT-80");
        assert_eq!(unset_default.kind, ReferenceKind::Default);
        assert!(!unset_default.empty_is_unset);

        let mandatory = VariableReference::parse("TOKEN:?token is required");
        assert_eq!(mandatory.kind, ReferenceKind::Mandatory);
        assert_eq!(mandatory.payload, "token is required");

        let plain = VariableReference::parse("IMAGE");
        assert_eq!(plain.kind, ReferenceKind::Plain);
        assert!(plain.payload.is_empty());
    }

    #[test]
    fn parse_splits_at_first_separator() {
        let reference = VariableReference::parse("URL:-http://a-b:80");
        assert_eq!(reference.name, "URL");
        assert_eq!(reference.payload, "http://a-b:80");
    }
}

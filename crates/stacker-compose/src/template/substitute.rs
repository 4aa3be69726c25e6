//! Placeholder substitution against a variable lookup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Pattern, Placeholder, ReferenceKind, VariableReference};

/// Failures raised while substituting a single template string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The string contains a `$` that starts no recognised placeholder.
    #[error("invalid template: \"{template}\"; you may need to escape any $ with another $")]
    Invalid {
        /// The offending string.
        template: String,
    },

    /// A mandatory variable has no usable value.
    #[error("required variable {variable} is missing a value: {reason}")]
    MissingRequired {
        /// Variable name.
        variable: String,
        /// Author supplied message, or a generic one.
        reason: String,
    },
}

/// How plain `$VAR` / `${VAR}` references treat a missing value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstitutionMode {
    /// Unset plain references become the empty string.
    #[default]
    Lenient,
    /// Plain references without a non-empty value are errors.
    Strict,
}

const UNSET_REASON: &str = "variable is not set";

/// Replaces placeholders in strings using a [`Pattern`].
#[derive(Debug, Clone, Default)]
pub struct Substituter {
    pattern: Pattern,
    mode: SubstitutionMode,
}

impl Substituter {
    /// Creates a substituter for the given grammar and mode.
    #[must_use]
    pub const fn new(pattern: Pattern, mode: SubstitutionMode) -> Self {
        Self { pattern, mode }
    }

    /// Returns the grammar used for scanning.
    #[must_use]
    pub const fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Returns the handling of plain references.
    #[must_use]
    pub const fn mode(&self) -> SubstitutionMode {
        self.mode
    }

    /// Substitutes every placeholder of `template`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Invalid`] for malformed placeholders and
    /// [`TemplateError::MissingRequired`] when a mandatory reference (or, in
    /// strict mode, a plain one) has no value.
    pub fn substitute(
        &self,
        template: &str,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for occurrence in self.pattern.scan(template) {
            out.push_str(&template[last..occurrence.span.start]);
            last = occurrence.span.end;
            match occurrence.placeholder {
                Placeholder::Escaped => out.push('$'),
                Placeholder::Substitution(body) => {
                    out.push_str(&self.resolve(&VariableReference::parse(body), lookup)?);
                }
                Placeholder::Invalid => {
                    return Err(TemplateError::Invalid {
                        template: template.to_owned(),
                    });
                }
            }
        }
        out.push_str(&template[last..]);
        Ok(out)
    }

    fn resolve(
        &self,
        reference: &VariableReference,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<String, TemplateError> {
        let value = lookup(&reference.name)
            .filter(|v| !(reference.empty_is_unset && v.is_empty()));
        match (reference.kind, value) {
            (_, Some(value)) if reference.kind != ReferenceKind::Plain => Ok(value),
            (ReferenceKind::Default, None) => Ok(reference.payload.clone()),
            (ReferenceKind::Mandatory, None) => Err(TemplateError::MissingRequired {
                variable: reference.name.clone(),
                reason: if reference.payload.is_empty() {
                    UNSET_REASON.to_owned()
                } else {
                    reference.payload.clone()
                },
            }),
            (_, value) => self.resolve_plain(&reference.name, value),
        }
    }

    fn resolve_plain(&self, name: &str, value: Option<String>) -> Result<String, TemplateError> {
        match (self.mode, value) {
            (SubstitutionMode::Strict, Some(value)) if value.is_empty() => {
                Err(TemplateError::MissingRequired {
                    variable: name.to_owned(),
                    reason: UNSET_REASON.to_owned(),
                })
            }
            (_, Some(value)) => Ok(value),
            (SubstitutionMode::Strict, None) => Err(TemplateError::MissingRequired {
                variable: name.to_owned(),
                reason: UNSET_REASON.to_owned(),
            }),
            (SubstitutionMode::Lenient, None) => {
                tracing::warn!(variable = name, "variable is not set, substituting empty string");
                Ok(String::new())
            }
        }
    }
}

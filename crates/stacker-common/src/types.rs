//! Request primitives exchanged between callers and the compose loader.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StackerError;

/// Raw compose documents as submitted by a caller, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeInput {
    /// Unparsed compose document texts.
    pub compose_files: Vec<String>,
}

impl ComposeInput {
    /// Creates an input from already-read document texts.
    #[must_use]
    pub fn new(compose_files: Vec<String>) -> Self {
        Self { compose_files }
    }
}

/// Descriptive metadata attached to a stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackMetadata {
    /// Stack name.
    pub name: String,
    /// Free-form labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// A stack creation request: templates plus the property assignments
/// needed to interpolate them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackCreate {
    /// Caller supplied metadata.
    #[serde(default)]
    pub metadata: StackMetadata,
    /// Original compose document texts.
    pub templates: Vec<String>,
    /// Assignments in `KEY` or `KEY=VALUE` form.
    #[serde(default)]
    pub property_values: Vec<String>,
}

/// A single `KEY` or `KEY=VALUE` assignment.
///
/// An empty value marks a property that still has to be supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyAssignment {
    /// Property name.
    pub name: String,
    /// Assigned value, possibly empty.
    pub value: String,
}

impl PropertyAssignment {
    /// Creates an assignment.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Splits an assignment on its first `=`. Entries without `=` map to an
    /// empty value. Never fails; see [`FromStr`] for the validating variant.
    #[must_use]
    pub fn split(assignment: &str) -> Self {
        match assignment.split_once('=') {
            Some((name, value)) => Self::new(name, value),
            None => Self::new(assignment, ""),
        }
    }
}

impl FromStr for PropertyAssignment {
    type Err = StackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let assignment = Self::split(s);
        if assignment.name.trim().is_empty() {
            return Err(StackerError::InvalidAssignment {
                assignment: s.to_owned(),
            });
        }
        Ok(assignment)
    }
}

impl fmt::Display for PropertyAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}={}", self.name, self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_omits_empty_value() {
        assert_eq!(PropertyAssignment::new("IMAGE", "").to_string(), "IMAGE");
        assert_eq!(PropertyAssignment::new("PORT", "8080").to_string(), "PORT=8080");
    }

    #[test]
    fn split_uses_first_equals() {
        let assignment = PropertyAssignment::split("OPTS=a=b");
        assert_eq!(assignment.name, "OPTS");
        assert_eq!(assignment.value, "a=b");
    }

    #[test]
    fn split_recovers_serialized_pair() {
        let original = PropertyAssignment::new("URL", "http://host:80/?q=1");
        let back = PropertyAssignment::split(&original.to_string());
        assert_eq!(back, original);
    }

    #[test]
    fn from_str_rejects_missing_name() {
        let err = "=value".parse::<PropertyAssignment>().unwrap_err();
        assert!(err.to_string().contains("=value"));
    }

    #[test]
    fn stack_create_deserializes_without_properties() {
        let json = r#"{"templates":["version: '3'"]}"#;
        let create: StackCreate = serde_json::from_str(json).expect("deserialize");
        assert_eq!(create.templates.len(), 1);
        assert!(create.property_values.is_empty());
        assert!(create.metadata.name.is_empty());
    }
}

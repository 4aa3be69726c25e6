//! Property extraction from compose templates.
//!
//! Every substitution body found by the scanner is folded into a single
//! [`PropertySet`]. Defaults stick: once a name carries a non-empty default,
//! later references to it never reset it to empty.

use std::collections::BTreeMap;

use stacker_common::constants::{DEFAULT_SEPARATORS, MANDATORY_SEPARATORS};
use stacker_common::types::PropertyAssignment;

use crate::template::Pattern;

/// How a substitution body was folded into the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A non-empty default was found.
    Default,
    /// A mandatory reference with a message; no entry is recorded.
    Mandatory,
    /// No default or message; the name is recorded with an empty value
    /// unless already present.
    Plain,
}

/// Ordered mapping from property name to value. An empty value means the
/// caller still has to supply one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    entries: BTreeMap<String, String>,
}

impl PropertySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans every template with `pattern` and folds all references.
    #[must_use]
    pub fn from_templates<S: AsRef<str>>(pattern: &Pattern, templates: &[S]) -> Self {
        let mut set = Self::new();
        for (index, template) in templates.iter().enumerate() {
            for body in pattern.substitutions(template.as_ref()) {
                let resolution = set.record(body);
                tracing::debug!(index, body, ?resolution, "recorded template reference");
            }
        }
        set
    }

    /// Builds a lookup set from `KEY` / `KEY=VALUE` strings. Later
    /// duplicates overwrite earlier ones.
    #[must_use]
    pub fn from_property_values<S: AsRef<str>>(values: &[S]) -> Self {
        let mut set = Self::new();
        for value in values {
            let assignment = PropertyAssignment::split(value.as_ref());
            set.set(assignment.name, assignment.value);
        }
        set
    }

    /// Folds one substitution body into the set.
    pub fn record(&mut self, body: &str) -> Resolution {
        for sep in DEFAULT_SEPARATORS {
            let (name, value) = partition(body, sep);
            if !value.is_empty() {
                self.set_default(name, value);
                return Resolution::Default;
            }
        }
        for sep in MANDATORY_SEPARATORS {
            let (_, message) = partition(body, sep);
            if !message.is_empty() {
                // Mandatory references with a message are left to the
                // interpolation step and intentionally not recorded.
                return Resolution::Mandatory;
            }
        }
        let name = plain_name(body);
        if !self.entries.contains_key(name) {
            let _ = self.entries.insert(name.to_owned(), String::new());
        }
        Resolution::Plain
    }

    fn set_default(&mut self, name: &str, value: &str) {
        match self.entries.get_mut(name) {
            Some(existing) if existing.is_empty() => value.clone_into(existing),
            Some(_) => {}
            None => {
                let _ = self.entries.insert(name.to_owned(), value.to_owned());
            }
        }
    }

    /// Assigns a value, replacing any previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let _ = self.entries.insert(name.into(), value.into());
    }

    /// Overwrites entries with those of `other`.
    pub fn overlay(&mut self, other: &Self) {
        for (name, value) in &other.entries {
            self.set(name.clone(), value.clone());
        }
    }

    /// Returns the recorded value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Lookup function for interpolation: present names are found even
    /// when their value is empty.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<String> {
        self.entries.get(name).cloned()
    }

    /// Number of recorded names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no name was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries as assignments, sorted by name.
    #[must_use]
    pub fn assignments(&self) -> Vec<PropertyAssignment> {
        self.iter()
            .map(|(name, value)| PropertyAssignment::new(name, value))
            .collect()
    }

    /// Entries serialized as `name=value`, or bare `name` when empty.
    #[must_use]
    pub fn to_property_values(&self) -> Vec<String> {
        self.assignments().iter().map(ToString::to_string).collect()
    }
}

/// Splits `s` at the first `sep`. Without a separator the whole string is
/// returned with an empty remainder.
fn partition<'a>(s: &'a str, sep: &str) -> (&'a str, &'a str) {
    s.split_once(sep).unwrap_or((s, ""))
}

/// Name of a body carrying no usable default or message: the text before
/// the first separator present, in precedence order.
///
/// This deliberately departs from recording the unsplit body, so `${X:-}`
/// yields `X` rather than `X:-` and `${Z:?}` yields only `Z`.
fn plain_name(body: &str) -> &str {
    DEFAULT_SEPARATORS
        .iter()
        .chain(MANDATORY_SEPARATORS.iter())
        .find_map(|sep| body.split_once(*sep).map(|(name, _)| name))
        .unwrap_or(body)
}

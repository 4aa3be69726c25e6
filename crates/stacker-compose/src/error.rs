//! Error taxonomy for compose loading and stack conversion.

use std::collections::BTreeMap;

use stacker_common::error::StackerError;
use thiserror::Error;

use crate::template::TemplateError;

/// Errors raised while turning compose templates into a stack specification.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// No compose template was supplied.
    #[error("no compose templates provided")]
    EmptyInput,

    /// A document could not be parsed into a key/value tree.
    #[error("compose file #{index} is not valid YAML: {message}")]
    Parse {
        /// Zero-based position of the document in the input.
        index: usize,
        /// Parser diagnostic.
        message: String,
    },

    /// The schema version is not handled by the loader.
    #[error("unsupported Compose file version: {version}")]
    UnsupportedVersion {
        /// Version declared by the first document.
        version: String,
    },

    /// A substitution grammar could not be used.
    #[error("invalid substitution pattern: {message}")]
    Pattern {
        /// Why the grammar was rejected.
        message: String,
    },

    /// Substituting a value failed at the given document path.
    #[error("invalid interpolation for {path}: {source}")]
    Interpolation {
        /// Dotted path of the value being interpolated.
        path: String,
        /// Underlying template failure.
        source: TemplateError,
    },

    /// An interpolated value could not be cast to the type its path requires.
    #[error("failed to cast to expected type at {path}: \"{value}\" is not {expected}")]
    TypeCast {
        /// Dotted path of the value.
        path: String,
        /// Interpolated value.
        value: String,
        /// Name of the required type.
        expected: &'static str,
    },

    /// Documents use options that are refused outright.
    #[error("compose file uses forbidden properties: {}", forbidden_names(.properties))]
    ForbiddenProperties {
        /// Property name to explanation.
        properties: BTreeMap<String, String>,
    },

    /// User-facing rendition of [`ComposeError::ForbiddenProperties`].
    #[error("Compose file contains unsupported options:\n\n{listing}\n")]
    UnsupportedOptions {
        /// Sorted `name: description` lines.
        listing: String,
    },

    /// The merged document does not fit the typed model.
    #[error("invalid compose structure: {message}")]
    Decode {
        /// Decoder diagnostic.
        message: String,
    },

    /// A shared workspace error.
    #[error(transparent)]
    Common(#[from] StackerError),
}

impl ComposeError {
    /// Returns the variable name when this error reports a missing mandatory value.
    #[must_use]
    pub fn missing_variable(&self) -> Option<&str> {
        match self {
            Self::Interpolation {
                source: TemplateError::MissingRequired { variable, .. },
                ..
            } => Some(variable),
            _ => None,
        }
    }
}

fn forbidden_names(properties: &BTreeMap<String, String>) -> String {
    properties.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Convenience alias for compose operations.
pub type Result<T> = std::result::Result<T, ComposeError>;

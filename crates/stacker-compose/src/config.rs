//! Wrapping raw templates into versioned config file records.

use serde_yaml::{Mapping, Value};
use stacker_common::constants::VERSION_KEY;

use crate::error::{ComposeError, Result};

/// One compose document parsed into a generic key/value tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    /// Top-level mapping of the document.
    pub config: Mapping,
}

/// Parsed documents sharing a single schema version.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDetails {
    /// Schema version taken from the first document.
    pub version: String,
    /// Documents in input order.
    pub config_files: Vec<ConfigFile>,
}

impl ConfigDetails {
    /// Raw document trees in input order.
    pub fn dicts(&self) -> impl Iterator<Item = &Mapping> {
        self.config_files.iter().map(|file| &file.config)
    }
}

/// Parses every template and derives the schema version from the first.
///
/// Later documents are not checked against that version.
///
/// # Errors
///
/// Returns [`ComposeError::EmptyInput`] without templates and
/// [`ComposeError::Parse`] for the first document that fails to parse.
pub fn config_details<S: AsRef<str>>(templates: &[S], default_version: &str) -> Result<ConfigDetails> {
    let config_files = templates
        .iter()
        .enumerate()
        .map(|(index, data)| load_config_file(index, data.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let first = config_files.first().ok_or(ComposeError::EmptyInput)?;
    let version = schema_version(&first.config, default_version);
    tracing::debug!(files = config_files.len(), %version, "assembled config details");
    Ok(ConfigDetails {
        version,
        config_files,
    })
}

/// Parses a single document.
///
/// # Errors
///
/// Returns [`ComposeError::Parse`] if the text is not YAML or its top level
/// is not a mapping.
pub fn load_config_file(index: usize, data: &str) -> Result<ConfigFile> {
    let config = parse_yaml(data).map_err(|message| ComposeError::Parse { index, message })?;
    Ok(ConfigFile { config })
}

fn parse_yaml(data: &str) -> std::result::Result<Mapping, String> {
    match serde_yaml::from_str::<Value>(data).map_err(|e| e.to_string())? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err("top-level object must be a mapping".to_owned()),
    }
}

/// Reads the `version` key, normalising a bare major (`"3"`) to `"3.0"`.
#[must_use]
pub fn schema_version(config: &Mapping, default_version: &str) -> String {
    let version = match config.get(VERSION_KEY) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return default_version.to_owned(),
    };
    if version.contains('.') {
        version
    } else {
        format!("{version}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_comes_from_first_file() {
        let details = config_details(&["version: '3.7'\n", "version: '3.2'\n"], "3.x").expect("details");
        assert_eq!(details.version, "3.7");
        assert_eq!(details.config_files.len(), 2);
    }

    #[test]
    fn bare_major_is_normalised() {
        let details = config_details(&["version: \"3\"\nservices: {}\n"], "3.x").expect("details");
        assert_eq!(details.version, "3.0");
    }

    #[test]
    fn numeric_version_is_accepted() {
        let details = config_details(&["version: 3.4\n"], "3.x").expect("details");
        assert_eq!(details.version, "3.4");
    }

    #[test]
    fn missing_version_uses_default() {
        let details = config_details(&["services: {}\n"], "3.x").expect("details");
        assert_eq!(details.version, "3.x");
    }

    #[test]
    fn empty_document_is_empty_mapping() {
        let file = load_config_file(0, "").expect("parse");
        assert!(file.config.is_empty());
    }

    #[test]
    fn invalid_yaml_reports_index() {
        let err = config_details(&["services: {}\n", "services: [\n"], "3.x").unwrap_err();
        assert!(matches!(err, ComposeError::Parse { index: 1, .. }), "got: {err}");
    }

    #[test]
    fn scalar_document_is_rejected() {
        let err = load_config_file(0, "just a string").unwrap_err();
        assert!(err.to_string().contains("must be a mapping"), "got: {err}");
    }

    #[test]
    fn no_templates_is_empty_input() {
        let templates: [&str; 0] = [];
        let err = config_details(&templates, "3.x").unwrap_err();
        assert!(matches!(err, ComposeError::EmptyInput));
    }

    #[test]
    fn dicts_follow_input_order() {
        let details = config_details(&["a: 1\n", "b: 2\n"], "3.x").expect("details");
        let keys: Vec<String> = details
            .dicts()
            .filter_map(|m| m.keys().next().and_then(Value::as_str).map(str::to_owned))
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}

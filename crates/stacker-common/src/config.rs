//! Configuration model for stack conversion.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StackerError};

/// Settings that shape how compose templates are interpolated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Treat plain `${VAR}` references without a non-empty value as mandatory.
    pub strict_variables: bool,
    /// Schema version used for documents that do not declare one.
    pub default_version: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            strict_variables: false,
            default_version: crate::constants::DEFAULT_SCHEMA_VERSION.to_owned(),
        }
    }
}

impl ConverterConfig {
    /// Reads a JSON configuration file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| StackerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`StackerError::Config`] when `default_version` is blank.
    pub fn validate(&self) -> Result<()> {
        if self.default_version.trim().is_empty() {
            return Err(StackerError::Config {
                message: "default_version must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ConverterConfig =
            serde_json::from_str(r#"{"strict_variables":true}"#).expect("deserialize");
        assert!(config.strict_variables);
        assert_eq!(config.default_version, "3.x");
    }

    #[test]
    fn blank_version_is_rejected() {
        let config = ConverterConfig {
            default_version: " ".into(),
            ..ConverterConfig::default()
        };
        assert!(matches!(config.validate(), Err(StackerError::Config { .. })));
        assert!(ConverterConfig::default().validate().is_ok());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ConverterConfig::from_file(Path::new("/nonexistent/stacker.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/stacker.json"));
    }
}

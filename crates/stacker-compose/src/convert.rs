//! Two-phase conversion of compose templates into a stack specification.
//!
//! Phase one ([`parse_compose_input`]) scans the raw templates and lists the
//! properties they reference, with any defaults. Phase two
//! ([`StackConverter::convert`]) interpolates the templates with the final
//! property values and assembles a [`StackSpec`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use stacker_common::config::ConverterConfig;
use stacker_common::constants::DEFAULT_SCHEMA_VERSION;
use stacker_common::types::{ComposeInput, StackCreate, StackMetadata};

use crate::config::config_details;
use crate::error::{ComposeError, Result};
use crate::loader::support::{deprecated_properties, property_warnings, unsupported_properties};
use crate::loader::types::{ConfigObjConfig, NetworkConfig, SecretConfig, ServiceConfig, VolumeConfig};
use crate::loader::{ComposeLoader, InterpolateOptions, Loader, TypeCastMapping};
use crate::properties::PropertySet;
use crate::template::{Pattern, SubstitutionMode, Substituter};

/// The final, typed stack specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StackSpec {
    /// Caller supplied metadata.
    pub metadata: StackMetadata,
    /// Original compose templates.
    pub templates: Vec<String>,
    /// Property assignments used for interpolation, sorted by name.
    pub property_values: Vec<String>,
    /// Services sorted by name.
    pub services: Vec<ServiceConfig>,
    /// Top-level secrets.
    pub secrets: BTreeMap<String, SecretConfig>,
    /// Top-level configs.
    pub configs: BTreeMap<String, ConfigObjConfig>,
    /// Top-level networks.
    pub networks: BTreeMap<String, NetworkConfig>,
    /// Top-level volumes.
    pub volumes: BTreeMap<String, VolumeConfig>,
}

/// Non-fatal findings about the raw templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionWarnings {
    /// Ignored service options, sorted.
    pub unsupported: Vec<String>,
    /// Discouraged service options with their descriptions.
    pub deprecated: BTreeMap<String, String>,
}

impl ConversionWarnings {
    /// Runs both detectors over raw document trees.
    pub fn detect<'a>(dicts: impl IntoIterator<Item = &'a serde_yaml::Mapping>) -> Self {
        let dicts: Vec<&serde_yaml::Mapping> = dicts.into_iter().collect();
        Self {
            unsupported: unsupported_properties(dicts.iter().copied()),
            deprecated: deprecated_properties(dicts),
        }
    }

    /// Whether there is nothing to report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unsupported.is_empty() && self.deprecated.is_empty()
    }

    /// The informational blocks shown to users; empty when there is nothing
    /// to report.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConversionWarnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.unsupported.is_empty() {
            write!(
                f,
                "Ignoring unsupported options: {}\n\n",
                self.unsupported.join(", ")
            )?;
        }
        if !self.deprecated.is_empty() {
            write!(
                f,
                "Ignoring deprecated options:\n\n{}\n\n",
                property_warnings(&self.deprecated)
            )?;
        }
        Ok(())
    }
}

/// A successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    /// The assembled specification.
    pub spec: StackSpec,
    /// Informational findings for display.
    pub warnings: ConversionWarnings,
}

/// Scans `input` and lists every referenced property.
///
/// Properties with a default are serialized as `NAME=default`, those that
/// must still be supplied as a bare `NAME`.
///
/// # Errors
///
/// Returns [`ComposeError::EmptyInput`] when `input` carries no document.
pub fn parse_compose_input(input: &ComposeInput, pattern: &Pattern) -> Result<StackCreate> {
    if input.compose_files.is_empty() {
        return Err(ComposeError::EmptyInput);
    }
    let properties = PropertySet::from_templates(pattern, &input.compose_files);
    tracing::info!(
        files = input.compose_files.len(),
        properties = properties.len(),
        "extracted template properties"
    );
    Ok(StackCreate {
        metadata: StackMetadata::default(),
        templates: input.compose_files.clone(),
        property_values: properties.to_property_values(),
    })
}

/// Converts stack creation requests into stack specifications.
#[derive(Debug, Clone)]
pub struct StackConverter<L = ComposeLoader> {
    loader: L,
    substituter: Substituter,
    type_casts: TypeCastMapping,
    default_version: String,
}

impl StackConverter {
    /// Creates a converter with the stock loader and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: ComposeLoader,
            substituter: Substituter::new(Pattern::compose(), SubstitutionMode::Lenient),
            type_casts: TypeCastMapping::default(),
            default_version: DEFAULT_SCHEMA_VERSION.to_owned(),
        }
    }

    /// Creates a converter with the stock loader from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::Common`] when the configuration is invalid.
    pub fn from_config(config: &ConverterConfig) -> Result<Self> {
        config.validate()?;
        let mode = if config.strict_variables {
            SubstitutionMode::Strict
        } else {
            SubstitutionMode::Lenient
        };
        Ok(Self {
            default_version: config.default_version.clone(),
            ..Self::new()
        }
        .with_mode(mode))
    }
}

impl Default for StackConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Loader> StackConverter<L> {
    /// Replaces the loader.
    #[must_use]
    pub fn with_loader<M: Loader>(self, loader: M) -> StackConverter<M> {
        StackConverter {
            loader,
            substituter: self.substituter,
            type_casts: self.type_casts,
            default_version: self.default_version,
        }
    }

    /// Replaces the substitution grammar used for both phases.
    #[must_use]
    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.substituter = Substituter::new(pattern, self.substituter.mode());
        self
    }

    /// Sets how plain references without a value are treated.
    #[must_use]
    pub fn with_mode(mut self, mode: SubstitutionMode) -> Self {
        self.substituter = Substituter::new(self.substituter.pattern().clone(), mode);
        self
    }

    /// Replaces the type-cast mapping.
    #[must_use]
    pub fn with_type_casts(mut self, type_casts: TypeCastMapping) -> Self {
        self.type_casts = type_casts;
        self
    }

    /// Phase one with this converter's grammar; see [`parse_compose_input`].
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::EmptyInput`] when `input` carries no document.
    pub fn parse(&self, input: &ComposeInput) -> Result<StackCreate> {
        parse_compose_input(input, self.substituter.pattern())
    }

    /// Interpolates the request's templates and assembles a [`StackSpec`].
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::EmptyInput`] without templates,
    /// [`ComposeError::Parse`] for unparsable documents, and
    /// [`ComposeError::UnsupportedOptions`] when a document uses a forbidden
    /// option. Other loader errors, including missing mandatory variables,
    /// are returned unchanged.
    pub fn convert(&self, request: &StackCreate) -> Result<Conversion> {
        if request.templates.is_empty() {
            return Err(ComposeError::EmptyInput);
        }
        let details = config_details(&request.templates, &self.default_version)?;

        let properties = PropertySet::from_property_values(&request.property_values);
        let lookup = |name: &str| {
            let value = properties.lookup(name);
            tracing::trace!(name, found = value.is_some(), "looked up property");
            value
        };
        let options = InterpolateOptions {
            lookup: &lookup,
            type_casts: &self.type_casts,
            substituter: &self.substituter,
        };

        let config = self.loader.load(&details, &options).map_err(|err| match err {
            ComposeError::ForbiddenProperties { properties } => ComposeError::UnsupportedOptions {
                listing: property_warnings(&properties),
            },
            other => other,
        })?;

        let warnings = ConversionWarnings::detect(details.dicts());
        if !warnings.unsupported.is_empty() {
            tracing::warn!(options = %warnings.unsupported.join(", "), "ignoring unsupported options");
        }
        for (name, description) in &warnings.deprecated {
            tracing::warn!(option = %name, %description, "ignoring deprecated option");
        }

        tracing::info!(
            stack = %request.metadata.name,
            services = config.services.len(),
            "converted stack specification"
        );
        Ok(Conversion {
            spec: StackSpec {
                metadata: request.metadata.clone(),
                templates: request.templates.clone(),
                property_values: properties.to_property_values(),
                services: config.services,
                secrets: config.secrets,
                configs: config.configs,
                networks: config.networks,
                volumes: config.volumes,
            },
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigDetails;

    fn request(templates: &[&str], property_values: &[&str]) -> StackCreate {
        StackCreate {
            metadata: StackMetadata {
                name: "demo".into(),
                ..StackMetadata::default()
            },
            templates: templates.iter().map(|t| (*t).to_owned()).collect(),
            property_values: property_values.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    #[test]
    fn parse_lists_properties() {
        let input = ComposeInput::new(vec!["services:\n  web:\n    image: ${IMAGE}\n    ports: [\"${PORT:-8080}:80\"]\n".into()]);
        let create = parse_compose_input(&input, &Pattern::compose()).expect("parse");
        assert_eq!(create.property_values, vec!["IMAGE", "PORT=8080"]);
        assert_eq!(create.templates, input.compose_files);
    }

    #[test]
    fn parse_rejects_empty_input() {
        let err = parse_compose_input(&ComposeInput::default(), &Pattern::compose()).unwrap_err();
        assert!(matches!(err, ComposeError::EmptyInput));
    }

    #[test]
    fn convert_builds_spec() {
        let converter = StackConverter::new();
        let conversion = converter
            .convert(&request(
                &["version: '3.7'\nservices:\n  web:\n    image: ${IMAGE}\nnetworks:\n  front: {}\n"],
                &["IMAGE=nginx", "UNUSED"],
            ))
            .expect("convert");
        let spec = conversion.spec;
        assert_eq!(spec.metadata.name, "demo");
        assert_eq!(spec.services[0].image.as_deref(), Some("nginx"));
        assert!(spec.networks.contains_key("front"));
        assert_eq!(spec.property_values, vec!["IMAGE=nginx", "UNUSED"]);
        assert!(conversion.warnings.is_empty());
    }

    #[test]
    fn convert_rejects_empty_templates() {
        let err = StackConverter::new().convert(&request(&[], &[])).unwrap_err();
        assert!(matches!(err, ComposeError::EmptyInput));
    }

    #[test]
    fn forbidden_properties_become_sorted_listing() {
        let err = StackConverter::new()
            .convert(&request(
                &["services:\n  web:\n    image: a\n    volumes_from: [db]\n    cpu_shares: 2\n"],
                &[],
            ))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Compose file contains unsupported options:\n\n"), "got: {msg}");
        let cpu = msg.find("cpu_shares: Set resource limits").expect("cpu_shares listed");
        let volumes = msg.find("volumes_from: To share a volume").expect("volumes_from listed");
        assert!(cpu < volumes);
    }

    #[test]
    fn warnings_are_reported_not_raised() {
        let conversion = StackConverter::new()
            .convert(&request(
                &["services:\n  web:\n    image: a\n    restart: always\n    container_name: web\n    expose: [\"80\"]\n"],
                &[],
            ))
            .expect("convert");
        let warnings = conversion.warnings;
        assert_eq!(warnings.unsupported, vec!["restart"]);
        let text = warnings.render();
        assert!(text.starts_with("Ignoring unsupported options: restart\n\n"), "got: {text}");
        let container = text.find("container_name:").expect("container_name");
        let expose = text.find("expose:").expect("expose");
        assert!(container < expose);
    }

    #[test]
    fn strict_mode_reports_missing_variable() {
        let converter = StackConverter::from_config(&ConverterConfig {
            strict_variables: true,
            ..ConverterConfig::default()
        })
        .expect("valid config");
        let create = converter
            .parse(&ComposeInput::new(vec!["services:\n  web:\n    image: ${IMAGE}\n".into()]))
            .expect("parse");
        let err = converter.convert(&create).unwrap_err();
        assert_eq!(err.missing_variable(), Some("IMAGE"));
        assert!(err.to_string().contains("IMAGE"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = StackConverter::from_config(&ConverterConfig {
            default_version: String::new(),
            ..ConverterConfig::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ComposeError::Common(stacker_common::error::StackerError::Config { .. })
        ));
    }

    #[test]
    fn configured_default_version_is_used() {
        let converter = StackConverter::from_config(&ConverterConfig {
            default_version: "2.4".into(),
            ..ConverterConfig::default()
        })
        .expect("valid config");
        let err = converter.convert(&request(&["services: {}\n"], &[])).unwrap_err();
        assert!(matches!(err, ComposeError::UnsupportedVersion { ref version } if version == "2.4"));
    }

    struct FailingLoader;

    impl Loader for FailingLoader {
        fn load(
            &self,
            _details: &ConfigDetails,
            _options: &InterpolateOptions<'_>,
        ) -> Result<crate::loader::Config> {
            Err(ComposeError::Decode {
                message: "boom".into(),
            })
        }
    }

    #[test]
    fn other_loader_errors_pass_through() {
        let err = StackConverter::new()
            .with_loader(FailingLoader)
            .convert(&request(&["services: {}\n"], &[]))
            .unwrap_err();
        assert!(matches!(err, ComposeError::Decode { ref message } if message == "boom"));
    }

    #[test]
    fn parse_error_aborts_conversion() {
        let err = StackConverter::new()
            .convert(&request(&["services: {}\n", "services: [\n"], &[]))
            .unwrap_err();
        assert!(matches!(err, ComposeError::Parse { index: 1, .. }));
    }
}

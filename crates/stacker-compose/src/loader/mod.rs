//! Typed loading of parsed compose documents.
//!
//! The [`Loader`] trait is the seam between the conversion pipeline and
//! whatever turns raw document trees into a typed configuration.
//! [`ComposeLoader`] is the stock implementation:
//!
//! 1. Check the schema version.
//! 2. Interpolate every document and cast typed paths.
//! 3. Refuse forbidden service options.
//! 4. Merge the documents in order.
//! 5. Decode the result into a [`Config`].

mod de;
pub mod interpolation;
pub mod merge;
pub mod support;
pub mod typecast;
pub mod types;

use stacker_common::constants::SUPPORTED_SCHEMA_MAJOR;

use crate::config::ConfigDetails;
use crate::error::{ComposeError, Result};

pub use self::interpolation::InterpolateOptions;
pub use self::typecast::TypeCastMapping;
pub use self::types::Config;

/// Produces a typed configuration from parsed documents.
pub trait Loader {
    /// Loads `details`, interpolating with `options`.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::ForbiddenProperties`] when a document uses a
    /// refused option, or any other classified loading error.
    fn load(&self, details: &ConfigDetails, options: &InterpolateOptions<'_>) -> Result<Config>;
}

/// The stock compose loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeLoader;

impl Loader for ComposeLoader {
    fn load(&self, details: &ConfigDetails, options: &InterpolateOptions<'_>) -> Result<Config> {
        check_version(&details.version)?;

        let mut interpolated = Vec::with_capacity(details.config_files.len());
        for (index, dict) in details.dicts().enumerate() {
            tracing::debug!(index, "interpolating compose file");
            interpolated.push(interpolation::interpolate(dict, options)?);
        }

        let forbidden = support::forbidden_properties(&interpolated);
        if !forbidden.is_empty() {
            return Err(ComposeError::ForbiddenProperties {
                properties: forbidden,
            });
        }

        let merged = interpolated
            .into_iter()
            .reduce(merge::merge_mappings)
            .unwrap_or_default();
        let config = types::decode(details.version.clone(), merged)?;
        tracing::info!(
            version = %config.version,
            services = config.services.len(),
            "loaded compose configuration"
        );
        Ok(config)
    }
}

fn check_version(version: &str) -> Result<()> {
    let major = version.split('.').next().unwrap_or_default();
    if major == SUPPORTED_SCHEMA_MAJOR {
        Ok(())
    } else {
        Err(ComposeError::UnsupportedVersion {
            version: version.to_owned(),
        })
    }
}

//! `stacker convert`: Convert compose files into a stack specification.

use std::path::PathBuf;

use clap::Args;
use stacker_common::config::ConverterConfig;
use stacker_common::constants::DEFAULT_COMPOSE_FILE;
use stacker_common::types::{PropertyAssignment, StackCreate};
use stacker_compose::StackConverter;
use stacker_compose::properties::PropertySet;

use crate::input::load_compose_files;
use crate::output;

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Compose files, later files override earlier ones.
    #[arg(short = 'c', long = "compose-file", default_value = DEFAULT_COMPOSE_FILE)]
    pub compose_files: Vec<PathBuf>,

    /// Stack name recorded in the metadata.
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// Property value as KEY=VALUE; may be repeated.
    #[arg(short = 'p', long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<PropertyAssignment>,

    /// Fail on plain references that have no value.
    #[arg(long)]
    pub strict: bool,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `convert` command.
///
/// Template defaults are used for properties not given with `-p`. Warnings
/// about ignored options go to stderr, the specification to stdout.
///
/// # Errors
///
/// Returns an error if a file cannot be read or the conversion fails.
pub fn execute(args: &ConvertArgs, config: &ConverterConfig) -> anyhow::Result<()> {
    let mut config = config.clone();
    config.strict_variables |= args.strict;
    let converter = StackConverter::from_config(&config)?;

    let input = load_compose_files(&args.compose_files)?;
    let parsed = converter.parse(&input)?;
    let mut request = StackCreate {
        metadata: parsed.metadata,
        property_values: merge_properties(&parsed.property_values, &args.properties),
        templates: parsed.templates,
    };
    request.metadata.name.clone_from(&args.name);

    let conversion = converter.convert(&request)?;
    if !conversion.warnings.is_empty() {
        output::warn(&conversion.warnings.to_string());
    }
    output::emit_json(&conversion.spec, args.output.as_deref())
}

/// Overlays explicit assignments on the template defaults.
fn merge_properties(defaults: &[String], overrides: &[PropertyAssignment]) -> Vec<String> {
    let mut properties = PropertySet::from_property_values(defaults);
    for assignment in overrides {
        properties.set(assignment.name.clone(), assignment.value.clone());
    }
    properties.to_property_values()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_defaults() {
        let merged = merge_properties(
            &["IMAGE".into(), "PORT=8080".into()],
            &[PropertyAssignment::new("IMAGE", "nginx"), PropertyAssignment::new("EXTRA", "1")],
        );
        assert_eq!(merged, vec!["EXTRA=1", "IMAGE=nginx", "PORT=8080"]);
    }

    #[test]
    fn without_overrides_defaults_are_kept() {
        let merged = merge_properties(&["PORT=8080".into()], &[]);
        assert_eq!(merged, vec!["PORT=8080"]);
    }
}

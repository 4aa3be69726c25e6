//! `stacker parse`: List the properties referenced by compose files.

use std::path::PathBuf;

use clap::Args;
use stacker_common::config::ConverterConfig;
use stacker_common::constants::DEFAULT_COMPOSE_FILE;
use stacker_compose::StackConverter;

use crate::input::load_compose_files;
use crate::output;

/// Arguments for the `parse` subcommand.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Compose files, later files override earlier ones.
    #[arg(short = 'c', long = "compose-file", default_value = DEFAULT_COMPOSE_FILE)]
    pub compose_files: Vec<PathBuf>,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `parse` command.
///
/// Prints a stack creation request whose `property_values` list every
/// referenced property, with its default when the template declares one.
///
/// # Errors
///
/// Returns an error if a file cannot be read or no file was given.
pub fn execute(args: &ParseArgs, config: &ConverterConfig) -> anyhow::Result<()> {
    let input = load_compose_files(&args.compose_files)?;
    let created = StackConverter::from_config(config)?.parse(&input)?;
    tracing::info!(
        files = input.compose_files.len(),
        properties = created.property_values.len(),
        "parsed compose input"
    );
    output::emit_json(&created, args.output.as_deref())
}

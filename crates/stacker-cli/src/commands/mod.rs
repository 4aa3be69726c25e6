//! CLI command definitions and dispatch.

pub mod convert;
pub mod parse;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stacker_common::config::ConverterConfig;

/// Stacker: compose templates to stack specifications.
#[derive(Parser, Debug)]
#[command(name = stacker_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to a JSON converter configuration file.
    #[arg(long, global = true, env = "STACKER_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Loads the converter configuration, or the defaults without `--config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or is invalid.
    pub fn converter_config(&self) -> anyhow::Result<ConverterConfig> {
        match &self.config {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading converter configuration");
                Ok(ConverterConfig::from_file(path)?)
            }
            None => Ok(ConverterConfig::default()),
        }
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the properties referenced by compose files.
    Parse(parse::ParseArgs),
    /// Convert compose files into a stack specification.
    Convert(convert::ConvertArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.converter_config()?;
    match cli.command {
        Command::Parse(args) => parse::execute(&args, &config),
        Command::Convert(args) => convert::execute(&args, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn convert_accepts_repeated_flags() {
        let cli = Cli::try_parse_from([
            "stacker",
            "convert",
            "-c",
            "a.yml",
            "-c",
            "b.yml",
            "-p",
            "IMAGE=nginx",
            "-p",
            "PORT",
            "--strict",
        ])
        .expect("parse");
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.compose_files.len(), 2);
        assert_eq!(args.properties.len(), 2);
        assert_eq!(args.properties[1].name, "PORT");
        assert!(args.strict);
    }

    #[test]
    fn empty_property_name_is_rejected() {
        assert!(Cli::try_parse_from(["stacker", "convert", "-p", "=x"]).is_err());
    }

    #[test]
    fn parse_defaults_to_docker_compose_file() {
        let cli = Cli::try_parse_from(["stacker", "parse"]).expect("parse");
        let Command::Parse(args) = cli.command else {
            panic!("expected parse");
        };
        assert_eq!(args.compose_files, vec![PathBuf::from("docker-compose.yml")]);
    }
}

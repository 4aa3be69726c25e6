//! # stacker: compose to stack specification converter
//!
//! Lists the properties a set of compose templates needs, then converts
//! them into a stack specification once values are supplied.

mod commands;
mod input;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}

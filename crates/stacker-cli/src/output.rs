//! Output helpers for CLI commands.
//!
//! Results are printed as pretty JSON on stdout or written to a file;
//! human-readable diagnostics go to stderr.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;

/// Renders `value` as pretty JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let mut rendered = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    rendered.push('\n');
    Ok(rendered)
}

/// Prints `value` as JSON to stdout, or writes it to `path`.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
#[allow(clippy::print_stdout)]
pub fn emit_json<T: Serialize>(value: &T, path: Option<&Path>) -> anyhow::Result<()> {
    let rendered = to_json(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

/// Prints a diagnostic block to stderr.
#[allow(clippy::print_stderr)]
pub fn warn(message: &str) {
    eprint!("{message}");
}

//! Reading compose files from disk.

use std::path::{Path, PathBuf};

use stacker_common::error::{Result, StackerError};
use stacker_common::types::ComposeInput;

/// Reads every file in order into a [`ComposeInput`].
///
/// # Errors
///
/// Returns [`StackerError::Io`] naming the first file that cannot be read.
pub fn load_compose_files(paths: &[PathBuf]) -> Result<ComposeInput> {
    let compose_files = paths
        .iter()
        .map(|path| read_compose_file(path))
        .collect::<Result<Vec<_>>>()?;
    Ok(ComposeInput::new(compose_files))
}

fn read_compose_file(path: &Path) -> Result<String> {
    tracing::debug!(path = %path.display(), "reading compose file");
    std::fs::read_to_string(path).map_err(|source| StackerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_are_read_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("a.yml");
        let second = dir.path().join("b.yml");
        std::fs::write(&first, "services: {}\n").expect("write");
        std::fs::write(&second, "version: '3'\n").expect("write");

        let input = load_compose_files(&[first, second]).expect("load");
        assert_eq!(input.compose_files, vec!["services: {}\n", "version: '3'\n"]);
    }

    #[test]
    fn missing_file_is_named_in_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.yml");
        let err = load_compose_files(&[missing.clone()]).unwrap_err();
        match err {
            StackerError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }
}

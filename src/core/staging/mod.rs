//! Local staging directory lifecycle
//!
//! Pipelines own their staging directories outright: each run resets them to
//! empty before use. Resetting an existing directory is destructive, so it
//! can be gated on an explicit confirmation; refusal aborts the whole run.

use crate::console::ConfirmPrompt;
use crate::domain::{FerryError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Idempotently reset `path` to an empty directory.
///
/// When the directory already exists and `confirmation` is provided, the
/// prompt must be affirmed before the tree is removed; any other answer
/// fails the run with [`FerryError::Aborted`]. A missing path is created
/// without prompting. Deletion failures surface loudly rather than leaving a
/// partially-removed tree behind silently.
pub fn reset_directory(path: &Path, confirmation: Option<&dyn ConfirmPrompt>) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(FerryError::Io(format!(
                "{} exists and is not a directory",
                path.display()
            )));
        }
        if let Some(prompt) = confirmation {
            let message = format!(
                "Type (y/yes) to confirm directory removal: {}",
                path.display()
            );
            if !prompt.confirm(&message) {
                return Err(FerryError::Aborted(format!(
                    "directory removal declined for {}",
                    path.display()
                )));
            }
        }
        fs::remove_dir_all(path).map_err(|e| {
            FerryError::Io(format!("failed removing {}: {e}", path.display()))
        })?;
    }
    fs::create_dir_all(path)
        .map_err(|e| FerryError::Io(format!("failed creating {}: {e}", path.display())))?;
    Ok(())
}

/// List the files directly under `dir` whose name ends with `suffix`,
/// sorted for deterministic chunk ordering. A missing directory yields an
/// empty list.
pub fn files_with_suffix(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(suffix))
        })
        .collect();
    paths.sort();
    paths
}

/// Delete the given files, ignoring paths that no longer exist.
pub fn delete_files<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    for path in paths {
        let path = path.as_ref();
        if path.is_file() {
            fs::remove_file(path).map_err(|e| {
                FerryError::Io(format!("failed deleting {}: {e}", path.display()))
            })?;
        }
    }
    Ok(())
}

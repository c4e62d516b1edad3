//! Input discovery.
//!
//! Expands input paths into the concrete files to convert. Traversal keeps
//! its own stack instead of recursing, so tree depth never threatens the
//! call stack.

use std::fs;
use std::path::{Path, PathBuf};

/// Discovery failures. These are environment problems and abort the run.
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    #[error("unable to stat path {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Enumerate the files under `root`.
///
/// - A file root is returned as-is.
/// - A directory root always has its immediate children listed.
/// - Subdirectories below that are only entered when `recursive` is set.
///
/// Directories themselves are never returned. No extension filtering happens
/// here. Files come back in name order within each directory.
pub fn discover(root: &Path, recursive: bool) -> Result<Vec<PathBuf>, DiscoverError> {
    // (path, is_root)
    let mut stack: Vec<(PathBuf, bool)> = vec![(root.to_path_buf(), true)];
    let mut files = Vec::new();

    while let Some((current, is_root)) = stack.pop() {
        let meta = fs::metadata(&current).map_err(|source| DiscoverError::Stat {
            path: current.clone(),
            source,
        })?;

        if !meta.is_dir() {
            files.push(current);
            continue;
        }

        if !(is_root || recursive) {
            tracing::trace!("Not descending into {:?}", current);
            continue;
        }

        let mut children = list_dir(&current)?;
        children.sort();
        // Reverse so popping yields name order.
        stack.extend(children.into_iter().rev().map(|child| (child, false)));
    }

    Ok(files)
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
    let read_err = |source| DiscoverError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    fs::read_dir(dir)
        .map_err(read_err)?
        .map(|entry| entry.map(|e| e.path()).map_err(read_err))
        .collect()
}

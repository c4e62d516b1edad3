//! External tool lookup.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Require that a tool is available on `PATH`, returning its path.
///
/// # Errors
///
/// Returns [`Error::ToolNotFound`] if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over `PATH` lookup.
///
/// When neither resolves, the bare name is returned so the failure surfaces
/// when the tool is actually spawned, as a per-job error.
pub fn locate(name: &str, configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured {
        if path.exists() {
            return path.to_path_buf();
        }
        tracing::warn!(
            tool = name,
            path = %path.display(),
            "Configured tool path does not exist, searching PATH"
        );
    }

    match require_tool(name) {
        Ok(path) => path,
        Err(_) => {
            tracing::warn!(tool = name, "Tool not found on PATH");
            PathBuf::from(name)
        }
    }
}

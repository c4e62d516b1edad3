mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<PoolConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: PoolConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<PoolConfig> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./mp4forge.toml",
        "~/.config/mp4forge/config.toml",
        "/etc/mp4forge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(PoolConfig::default())
}

/// Validate configuration after command-line overrides are applied.
pub fn validate_config(config: &PoolConfig) -> Result<()> {
    if config.workers == 0 {
        anyhow::bail!("Worker count must be at least 1");
    }

    if config.video.crf.trim().is_empty() {
        anyhow::bail!("Video CRF cannot be empty");
    }

    if config.video.preset.trim().is_empty() {
        anyhow::bail!("Video preset cannot be empty");
    }

    if config.audio.channels == 0 {
        anyhow::bail!("Audio channel count must be at least 1");
    }

    if let Some(dir) = config.output_dir() {
        let meta = std::fs::metadata(dir)
            .with_context(|| format!("Output directory is not accessible: {:?}", dir))?;
        if !meta.is_dir() {
            anyhow::bail!("Output path is not a directory: {:?}", dir);
        }
        if meta.permissions().readonly() {
            anyhow::bail!("Output directory is not writable: {:?}", dir);
        }
    }

    Ok(())
}

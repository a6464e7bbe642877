use anyhow::{Context, Result};
use std::path::PathBuf;

/// Centralized path management for reelforge
/// This module provides a single source of truth for all application paths

const APP_DIR: &str = "reelforge";

/// Get the main config directory
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join(APP_DIR);

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory at {}", config_dir.display()))?;

    Ok(config_dir)
}

/// Get the main data directory
pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join(APP_DIR);

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory at {}", data_dir.display()))?;

    Ok(data_dir)
}

/// Directory receiving videos when no output path is given
pub fn renders_dir() -> Result<PathBuf> {
    let renders_dir = data_dir()?.join("renders");
    std::fs::create_dir_all(&renders_dir)
        .with_context(|| format!("creating renders directory at {}", renders_dir.display()))?;
    Ok(renders_dir)
}

/// Root for per-render scratch directories
pub fn scratch_dir() -> Result<PathBuf> {
    let scratch_dir = dirs::cache_dir()
        .context("Unable to determine cache directory for scratch files")?
        .join(APP_DIR)
        .join("scratch");

    std::fs::create_dir_all(&scratch_dir)
        .with_context(|| format!("creating scratch directory at {}", scratch_dir.display()))?;

    Ok(scratch_dir)
}

// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::presets::RunMode;
use crate::errors::{ExpcfgError, Result};
use crate::resolve::{ResolvedConfig, resolve};

/// Read a config file fully into memory. The file is closed before
/// anything is parsed.
pub fn read_config(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|source| ExpcfgError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and resolve a config file.
///
/// This resolves anchors, aliases, merge keys and `!join`; it does **not**
/// validate anything. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ResolvedConfig> {
    let path = path.as_ref();
    let text = read_config(path)?;
    let config = resolve(&text)?;
    debug!(path = %path.display(), "config resolved");
    Ok(config)
}

/// Load a config file, apply overrides and validate it.
///
/// This is the recommended entry point for runners:
///
/// - Reads and resolves the YAML.
/// - Merges the `overrides` JSON object, if any.
/// - Checks the preset schema of `mode`, if any, collecting every issue.
pub fn load_and_validate(
    path: impl AsRef<Path>,
    mode: Option<RunMode>,
    overrides: Option<&str>,
) -> Result<ResolvedConfig> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading config");

    let mut config = load_from_path(path)?;
    if let Some(json) = overrides {
        config = config.with_overrides(json)?;
        debug!("overrides applied");
    }
    if let Some(mode) = mode {
        info!(%mode, "validating config");
        config.validate(&mode.schema())?;
    }
    Ok(config)
}

/// Config used when none is given: `config.yaml` in the current working
/// directory, or `EXPCFG_CONFIG` when set.
pub fn default_config_path() -> PathBuf {
    std::env::var_os("EXPCFG_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yaml"))
}

//! Configuration loading for parq.
//!
//! Precedence: CLI flags > `parq.toml` in the target directory > the user
//! config dir (`~/.config/parq/config.toml`) > built-in defaults. CLI
//! overrides are applied by the binary, not here.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ParqError, ParqResult};

/// Default query-execution entry point recognized by the locator.
pub const DEFAULT_CALL: &str = "queryRunner.query";
/// Default eligible file extension.
pub const DEFAULT_EXT: &str = "ts";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Callee recognized as the query-execution entry point.
    pub call: String,
    /// File extension eligible for rewriting (leading dot optional).
    pub ext: String,
    /// Report planned changes without writing files.
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            call: DEFAULT_CALL.to_string(),
            ext: DEFAULT_EXT.to_string(),
            dry_run: false,
        }
    }
}

impl Config {
    /// Load configuration for a run over `dir`.
    pub fn load(dir: &Path) -> ParqResult<Self> {
        if let Some(config) = Self::from_file(&dir.join("parq.toml"))? {
            return Ok(config);
        }
        if let Some(base) = dirs::config_dir() {
            if let Some(config) = Self::from_file(&base.join("parq").join("config.toml"))? {
                return Ok(config);
            }
        }
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> ParqResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        let config = toml::from_str(&raw)
            .map_err(|e| ParqError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(Some(config))
    }

    /// The eligible extension without a leading dot.
    pub fn ext_normalized(&self) -> &str {
        self.ext.trim_start_matches('.')
    }
}

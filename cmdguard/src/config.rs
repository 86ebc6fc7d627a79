//! Dispatcher configuration (TOML).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Dispatcher configuration.
///
/// Usually embedded as a `[dispatch]` table in an application config. Missing
/// fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Invoke handlers without building an overlay when no guard is on the path.
    pub fast_path: bool,

    /// Maximum number of nested invocations below a top-level command.
    pub max_nesting_depth: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            fast_path: true,
            max_nesting_depth: 8,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_nesting_depth == 0 {
            return Err(anyhow!("max_nesting_depth must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DispatchConfig::default()`.
pub fn load_config(path: &Path) -> Result<DispatchConfig> {
    if !path.exists() {
        let cfg = DispatchConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DispatchConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

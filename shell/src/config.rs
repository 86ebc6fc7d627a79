//! Shell configuration (`shell.toml`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use cmdguard::DispatchConfig;
use serde::{Deserialize, Serialize};

/// Shell configuration (TOML).
///
/// Missing fields default to a single `wheel` group administered by `root`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShellConfig {
    /// Users allowed to change group membership.
    pub admins: Vec<String>,

    /// Group name -> member names.
    pub groups: BTreeMap<String, Vec<String>>,

    /// Maximum count accepted by `repeat` before it is clamped.
    pub repeat_limit: i64,

    pub dispatch: DispatchConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            admins: vec!["root".to_string()],
            groups: BTreeMap::from([("wheel".to_string(), vec!["root".to_string()])]),
            repeat_limit: 5,
            dispatch: DispatchConfig::default(),
        }
    }
}

impl ShellConfig {
    pub fn validate(&self) -> Result<()> {
        if self.admins.iter().any(|name| name.trim().is_empty()) {
            return Err(anyhow!("admins must not contain empty names"));
        }
        for (group, members) in &self.groups {
            if group.trim().is_empty() {
                return Err(anyhow!("group names must be non-empty"));
            }
            if members.iter().any(|name| name.trim().is_empty()) {
                return Err(anyhow!("group '{}' has an empty member name", group));
            }
        }
        if self.repeat_limit <= 0 {
            return Err(anyhow!("repeat_limit must be > 0"));
        }
        self.dispatch.validate().context("invalid [dispatch]")?;
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ShellConfig::default()`.
pub fn load_config(path: &Path) -> Result<ShellConfig> {
    if !path.exists() {
        let cfg = ShellConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ShellConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("shell.toml");
        fs::write(&path, contents).expect("write config");
        (temp, path)
    }

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, ShellConfig::default());
    }

    #[test]
    fn load_reads_groups_and_dispatch() {
        let (_temp, path) = write(
            r#"
admins = ["alice"]

[groups]
staff = ["alice", "bob"]

[dispatch]
fast_path = false
"#,
        );
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.admins, vec!["alice".to_string()]);
        assert_eq!(
            cfg.groups.get("staff"),
            Some(&vec!["alice".to_string(), "bob".to_string()])
        );
        assert!(!cfg.dispatch.fast_path);
        assert_eq!(cfg.dispatch.max_nesting_depth, 8);
        assert_eq!(cfg.repeat_limit, 5);
    }

    #[test]
    fn invalid_dispatch_is_rejected() {
        let (_temp, path) = write("[dispatch]\nmax_nesting_depth = 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("max_nesting_depth"));
    }

    #[test]
    fn empty_member_is_rejected() {
        let (_temp, path) = write("[groups]\nstaff = [\"\"]\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("staff"));
    }
}

//! Gate configuration stored under `.specgate/config.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::gate::GatePolicy;

/// Gate configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GateConfig {
    /// Directory holding specification artifacts, relative to the session root.
    pub spec_dir: String,

    /// Freshness window for preparation markers, in seconds.
    pub read_ttl_secs: u64,

    /// Freshness window for the block marker and spec activity, in seconds.
    pub spec_ttl_secs: u64,

    /// Wall-clock budget for a completion-verification test run, in seconds.
    pub test_timeout_secs: u64,

    /// Truncate test-run output beyond this many bytes.
    pub test_output_limit_bytes: usize,

    /// Command prefixes allowed through the gate as read-only inspection.
    pub readonly_commands: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            spec_dir: "specs".to_string(),
            read_ttl_secs: 5 * 60,
            spec_ttl_secs: 60 * 60,
            test_timeout_secs: 10 * 60,
            test_output_limit_bytes: 100_000,
            readonly_commands: default_readonly_commands(),
        }
    }
}

fn default_readonly_commands() -> Vec<String> {
    [
        "git status", "git diff", "git log", "git show", "ls", "cat", "head", "tail", "rg",
        "grep", "find", "pwd", "cd", "echo", "which", "wc",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl GateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.spec_dir.trim().is_empty()
            || self.spec_dir.contains("..")
            || Path::new(&self.spec_dir).is_absolute()
        {
            return Err(anyhow!("spec_dir must be a non-empty relative directory"));
        }
        if self.read_ttl_secs == 0 {
            return Err(anyhow!("read_ttl_secs must be > 0"));
        }
        if self.spec_ttl_secs == 0 {
            return Err(anyhow!("spec_ttl_secs must be > 0"));
        }
        if self.test_timeout_secs == 0 {
            return Err(anyhow!("test_timeout_secs must be > 0"));
        }
        if self.test_output_limit_bytes == 0 {
            return Err(anyhow!("test_output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn read_ttl(&self) -> Duration {
        Duration::from_secs(self.read_ttl_secs)
    }

    pub fn spec_ttl(&self) -> Duration {
        Duration::from_secs(self.spec_ttl_secs)
    }

    pub fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout_secs)
    }

    /// Pure policy view consumed by the gate decision table.
    pub fn gate_policy(&self) -> GatePolicy {
        GatePolicy {
            spec_dir: self.spec_dir.clone(),
            readonly_commands: self.readonly_commands.clone(),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `GateConfig::default()`.
pub fn load_config(path: &Path) -> Result<GateConfig> {
    if !path.exists() {
        let config = GateConfig::default();
        config.validate()?;
        return Ok(config);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let config: GateConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, config: &GateConfig) -> Result<()> {
    config.validate()?;
    let mut buf = toml::to_string_pretty(config).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(config, GateConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let config = GateConfig {
            spec_dir: "plans".to_string(),
            ..GateConfig::default()
        };
        write_config(&path, &config).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn rejects_escaping_spec_dir() {
        let config = GateConfig {
            spec_dir: "../outside".to_string(),
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
        let config = GateConfig {
            spec_dir: "/outside".to_string(),
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn accepts_nested_spec_dir() {
        let config = GateConfig {
            spec_dir: "docs/specs".to_string(),
            ..GateConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_ttls() {
        let config = GateConfig {
            spec_ttl_secs: 0,
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_allowlist_covers_inspection_basics() {
        let config = GateConfig::default();
        for expected in ["git status", "ls", "rg"] {
            assert!(
                config.readonly_commands.iter().any(|c| c == expected),
                "missing {expected}"
            );
        }
    }
}

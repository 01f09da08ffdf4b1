//! Canonical `.specgate/` layout and scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::io::config::{GateConfig, write_config};

/// All canonical paths within a session root.
#[derive(Debug, Clone)]
pub struct GatePaths {
    pub root: PathBuf,
    pub gate_dir: PathBuf,
    pub markers_dir: PathBuf,
    pub config_path: PathBuf,
    pub gitignore_path: PathBuf,
}

impl GatePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let gate_dir = root.join(".specgate");
        let markers_dir = gate_dir.join("markers");
        Self {
            root: root.clone(),
            gate_dir: gate_dir.clone(),
            markers_dir,
            config_path: gate_dir.join("config.toml"),
            gitignore_path: gate_dir.join(".gitignore"),
        }
    }

    /// Spec directory for a loaded config.
    pub fn spec_dir(&self, config: &GateConfig) -> PathBuf {
        self.root.join(&config.spec_dir)
    }
}

/// Options for `init_gate`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing gate-owned files.
    pub force: bool,
}

/// Create `.specgate/` scaffolding and the spec directory in `root`.
///
/// Fails if `.specgate/` already exists unless `options.force` is set.
pub fn init_gate(root: &Path, options: &InitOptions) -> Result<GatePaths> {
    let paths = GatePaths::new(root);
    if paths.gate_dir.exists() && !options.force {
        return Err(anyhow!(
            "specgate init: .specgate already exists (use --force to overwrite)"
        ));
    }
    if paths.gate_dir.exists() && !paths.gate_dir.is_dir() {
        return Err(anyhow!(
            "specgate init: .specgate exists but is not a directory"
        ));
    }

    let config = GateConfig::default();
    create_dir(&paths.gate_dir)?;
    create_dir(&paths.markers_dir)?;
    create_dir(&paths.spec_dir(&config))?;

    write_config(&paths.config_path, &config)?;
    write_file(&paths.gitignore_path, GATE_GITIGNORE)?;

    Ok(paths)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("write file {}", path.display()))
}

// Markers are per-session state and never belong in version control.
const GATE_GITIGNORE: &str = "markers/\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_expected_layout() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();

        let paths = init_gate(root, &InitOptions { force: false }).expect("init");

        assert!(paths.gate_dir.is_dir());
        assert!(paths.markers_dir.is_dir());
        assert!(paths.config_path.is_file());
        assert!(paths.gitignore_path.is_file());
        assert!(root.join("specs").is_dir());

        let gitignore = fs::read_to_string(&paths.gitignore_path).expect("read gitignore");
        assert_eq!(gitignore, GATE_GITIGNORE);
    }

    #[test]
    fn init_without_force_refuses_existing_gate_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();

        init_gate(root, &InitOptions { force: false }).expect("init");
        let err = init_gate(root, &InitOptions { force: false }).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn init_with_force_rewrites_config() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        let paths = init_gate(root, &InitOptions { force: false }).expect("init");

        fs::write(&paths.config_path, "spec_dir = \"elsewhere\"\n").expect("write custom");
        init_gate(root, &InitOptions { force: true }).expect("re-init");

        let config = crate::io::config::load_config(&paths.config_path).expect("load");
        assert_eq!(config, GateConfig::default());
    }
}

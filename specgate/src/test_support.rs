//! Test-only helpers for exercising the gate against a scratch session root.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};

use crate::core::types::MarkerKind;
use crate::io::config::GateConfig;
use crate::io::markers::MarkerStore;
use crate::io::paths::{GatePaths, InitOptions, init_gate};

/// A temporary session root with `.specgate/` scaffolding in place.
pub struct TestRoot {
    temp: tempfile::TempDir,
    paths: GatePaths,
}

impl TestRoot {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let paths = init_gate(temp.path(), &InitOptions { force: false })?;
        Ok(Self { temp, paths })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn store(&self) -> MarkerStore {
        MarkerStore::new(&self.paths.markers_dir)
    }

    /// Write a spec artifact under `specs/`.
    pub fn write_spec(&self, name: &str, contents: &str) -> Result<()> {
        let dir = self.paths.spec_dir(&GateConfig::default());
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        let path = dir.join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    pub fn arm_block(&self, now: SystemTime) -> Result<()> {
        self.store().set(&MarkerKind::BlockActive, now)
    }

    pub fn record_prep(&self, tag: &str, now: SystemTime) -> Result<()> {
        self.store()
            .set(&MarkerKind::PreparationUsed(tag.to_string()), now)
    }

    /// Whether the block marker is fresh under the default spec TTL.
    pub fn block_marker_fresh(&self, now: SystemTime) -> Result<bool> {
        self.store()
            .is_fresh(&MarkerKind::BlockActive, GateConfig::default().spec_ttl(), now)
    }
}

/// A specification text that passes every audit check.
pub fn passing_spec_text() -> String {
    "# Feature\n\n\
     ### REQ-001: validate user input\n\
     **Priority**: Must\n\
     **Verification**: Test\n\n\
     Input outside the accepted range is rejected.\n\n\
     ### REQ-002: render error state\n\
     **Priority**: Should\n\
     **Verification**: Browser\n\n\
     Invalid input renders an inline error.\n\n\
     ## Traceability Matrix\n\n\
     | Requirement | Verification | Evidence |\n\
     |---|---|---|\n\
     | REQ-001 | Test | tests/validation.rs |\n\
     | REQ-002 | Browser | manual checklist |\n"
        .to_string()
}

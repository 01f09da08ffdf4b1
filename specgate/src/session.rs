//! Orchestration for session start.
//!
//! A fresh session defaults to "specification required before coding": the
//! block marker is armed unless the spec directory shows activity within the
//! spec TTL, so a continuing session with a recently audited spec is not
//! re-blocked.

use std::path::Path;
use std::time::SystemTime;

use anyhow::Result;
use tracing::{debug, info};

use crate::core::freshness::should_arm_block;
use crate::core::types::MarkerKind;
use crate::io::config::load_config;
use crate::io::markers::MarkerStore;
use crate::io::paths::GatePaths;
use crate::io::spec_dir::newest_artifact_mtime;

/// Outcome of `specgate session-start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Whether the block marker was armed for this session.
    pub armed: bool,
}

/// Seed marker state for a new session rooted at `root`.
pub fn bootstrap_session(root: &Path, now: SystemTime) -> Result<SessionOutcome> {
    let paths = GatePaths::new(root);
    let config = load_config(&paths.config_path)?;
    let store = MarkerStore::new(&paths.markers_dir);

    let newest = newest_artifact_mtime(&paths.spec_dir(&config))?;
    debug!(root = %root.display(), newest_spec = ?newest, "bootstrapping session");

    if should_arm_block(newest, now, config.spec_ttl()) {
        store.set(&MarkerKind::BlockActive, now)?;
        info!("no recent spec activity, block armed");
        Ok(SessionOutcome { armed: true })
    } else {
        // A leftover marker from a previous session must not re-block a
        // continuing one with recent spec activity.
        store.clear(&MarkerKind::BlockActive)?;
        info!("recent spec activity found, block not armed");
        Ok(SessionOutcome { armed: false })
    }
}

//! Advisory preparation markers.
//!
//! Structurally parallel to the gate but strictly non-blocking: `specgate
//! prep <TAG>` records that preparation activity (documentation lookup, prior
//! pattern search) happened, and mutations performed without fresh
//! preparation earn a warning annotation, never a block.

use std::path::Path;
use std::time::SystemTime;

use anyhow::{Result, anyhow};
use tracing::debug;

use crate::core::gate::{is_readonly_command, is_spec_path};
use crate::core::types::{ActionKind, ActionRequest, MarkerKind};
use crate::io::config::GateConfig;
use crate::io::markers::MarkerStore;
use crate::io::paths::GatePaths;

/// Record a preparation marker tagged by its source (e.g. `docs`, `search`).
pub fn record_preparation(root: &Path, tag: &str, now: SystemTime) -> Result<()> {
    validate_tag(tag)?;
    let paths = GatePaths::new(root);
    let store = MarkerStore::new(&paths.markers_dir);
    debug!(tag, "recording preparation");
    store.set(&MarkerKind::PreparationUsed(tag.to_string()), now)
}

/// Advisory annotation for an action that is about to proceed.
///
/// Returns a warning when the action mutates something outside the spec
/// directory and no preparation marker is fresh. Spec writes and read-only
/// commands are exempt: neither is an unprepared mutation, and writing the
/// specification is itself preparation.
pub fn preparation_warning(
    store: &MarkerStore,
    action: &ActionRequest,
    config: &GateConfig,
    now: SystemTime,
) -> Result<Option<String>> {
    let mutates_outside_specs = match action.kind {
        ActionKind::Edit | ActionKind::Write => !action
            .target
            .as_deref()
            .is_some_and(|target| is_spec_path(target, &config.spec_dir)),
        ActionKind::Shell => !action
            .command
            .as_deref()
            .is_some_and(|command| is_readonly_command(command, &config.readonly_commands)),
    };
    if !mutates_outside_specs {
        return Ok(None);
    }
    if store.any_prep_fresh(config.read_ttl(), now)? {
        return Ok(None);
    }
    Ok(Some(
        "no recent preparation recorded for this change. Consider checking existing \
         patterns or documentation first, then mark it with `specgate prep <tag>` \
         (advisory only; the action proceeds)."
            .to_string(),
    ))
}

fn validate_tag(tag: &str) -> Result<()> {
    let valid = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(anyhow!(
            "invalid preparation tag '{tag}' (use lowercase letters, digits, '-', '_')"
        ))
    }
}

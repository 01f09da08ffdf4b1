//! Orchestration for the pre-action gate check.
//!
//! Consults marker freshness, applies the pure decision table, then layers the
//! advisory preparation annotation on top. The gate result dominates: a block
//! is never downgraded and an advisory warning never blocks.

use std::path::Path;
use std::time::SystemTime;

use anyhow::Result;
use tracing::debug;

use crate::advisory::preparation_warning;
use crate::core::gate::{GateState, evaluate_action};
use crate::core::types::{ActionRequest, Decision, MarkerKind};
use crate::io::config::load_config;
use crate::io::markers::MarkerStore;
use crate::io::paths::GatePaths;

/// Decide whether `action` may proceed in the session rooted at `root`.
pub fn check_action(root: &Path, action: &ActionRequest, now: SystemTime) -> Result<Decision> {
    let paths = GatePaths::new(root);
    let config = load_config(&paths.config_path)?;
    let store = MarkerStore::new(&paths.markers_dir);

    let block_active = store.is_fresh(&MarkerKind::BlockActive, config.spec_ttl(), now)?;
    let state = GateState { block_active };
    debug!(kind = ?action.kind, block_active, "checking action");

    let action = normalize_target(root, action);
    let decision = evaluate_action(&action, state, &config.gate_policy());
    if decision != Decision::Pass {
        return Ok(decision);
    }

    if let Some(warning) = preparation_warning(&store, &action, &config, now)? {
        return Ok(Decision::Warn(warning));
    }
    Ok(Decision::Pass)
}

/// Resolve the target to the root-relative shape the spec-directory rule
/// expects: a relative target is anchored at the action's reported working
/// directory, and an absolute target under `root` is rewritten as
/// root-relative. An absolute target outside `root` is left as is and never
/// matches the spec directory.
fn normalize_target(root: &Path, action: &ActionRequest) -> ActionRequest {
    let mut action = action.clone();
    if let Some(target) = action.target.take() {
        let resolved = match &action.cwd {
            Some(cwd) if target.is_relative() => cwd.join(target),
            _ => target,
        };
        action.target = Some(match resolved.strip_prefix(root) {
            Ok(relative) if resolved.is_absolute() => relative.to_path_buf(),
            _ => resolved.clone(),
        });
    }
    action
}

//! Gate decision table for pending actions.
//!
//! Pure logic: marker freshness is evaluated by the caller and passed in, so
//! every rule is testable without touching the filesystem clock.

use std::path::{Component, Path};

use crate::core::types::{ActionKind, ActionRequest, Decision};

/// Gate policy data: where specs live and which commands are read-only.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    /// Spec directory relative to the session root (e.g. `specs`).
    pub spec_dir: String,
    /// Literal command prefixes treated as read-only inspection.
    pub readonly_commands: Vec<String>,
}

/// Marker state relevant to gating, already freshness-evaluated.
#[derive(Debug, Clone, Copy)]
pub struct GateState {
    pub block_active: bool,
}

/// Decide whether a pending action may proceed. First match wins:
///
/// 1. No fresh block marker -> allow.
/// 2. File action targeting the spec directory -> allow (even while blocked).
/// 3. Shell command on the read-only allow-list -> allow.
/// 4. Otherwise -> block with self-contained remediation text.
pub fn evaluate_action(
    action: &ActionRequest,
    state: GateState,
    policy: &GatePolicy,
) -> Decision {
    if !state.block_active {
        return Decision::Pass;
    }

    match action.kind {
        ActionKind::Edit | ActionKind::Write => {
            if let Some(target) = &action.target
                && is_spec_path(target, &policy.spec_dir)
            {
                return Decision::Pass;
            }
        }
        ActionKind::Shell => {
            if let Some(command) = &action.command
                && is_readonly_command(command, &policy.readonly_commands)
            {
                return Decision::Pass;
            }
        }
    }

    Decision::Block(remediation_text(&policy.spec_dir))
}

/// True when `path` is under the spec directory.
///
/// The spec directory may be nested (`docs/specs`); every one of its
/// components must match in order. Leading `./` components are ignored on
/// both sides. Absolute paths never match a relative spec directory, so a
/// target outside the session root stays gated. Lookalike names (`specsx`)
/// and nested occurrences (`src/specs/...`) do not count.
pub fn is_spec_path(path: &Path, spec_dir: &str) -> bool {
    let mut components = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir));
    let mut expected = Path::new(spec_dir)
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .peekable();

    if expected.peek().is_none() {
        return false;
    }
    expected.all(|want| components.next() == Some(want))
}

/// True when `command` starts with an allow-list entry at a token boundary,
/// so `ls` admits `ls -la` but not `lsof`.
pub fn is_readonly_command(command: &str, allowlist: &[String]) -> bool {
    let command = command.trim_start();
    allowlist.iter().any(|prefix| {
        command
            .strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

/// Remediation text for a blocked action.
///
/// The exit contract is the only channel back to the caller, so this is
/// complete on every emission: it names the artifact location and every
/// structural element the audit requires.
pub fn remediation_text(spec_dir: &str) -> String {
    format!(
        "implementation is blocked: no specification has passed audit this session.\n\
         Write a specification under `{spec_dir}/` first. It must contain:\n\
         - requirement headings `### REQ-<3 digits>: <title>` with consecutive ids\n\
         - a `**Verification**: Test|Browser|Manual` line within 3 lines of each heading\n\
         - a `**Priority**: Must|Should|Could` line per requirement\n\
         - a traceability matrix section mapping each REQ id to its test evidence\n\
         Then run `specgate audit` to unblock. Writes under `{spec_dir}/` and \
         read-only inspection commands are allowed meanwhile."
    )
}

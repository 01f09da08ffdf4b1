//! Shared deterministic types for gate core logic.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::exit_codes;

/// Kind of action the agent wants to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Modify an existing file.
    Edit,
    /// Create or overwrite a file.
    Write,
    /// Run a shell command.
    Shell,
}

/// Pending action described by the calling harness (single input channel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: ActionKind,
    /// Path the action touches (edit/write).
    #[serde(default)]
    pub target: Option<PathBuf>,
    /// Command text (shell).
    #[serde(default)]
    pub command: Option<String>,
    /// Working directory of the action, when it differs from the session root.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// Completed unit of work described by the calling harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// Free-text subject of the completed task.
    pub subject: String,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// Outcome of a single check, mapped directly onto the exit contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Proceed silently.
    Pass,
    /// Proceed, surface the message.
    Warn(String),
    /// Refuse, surface the message, require remediation before retry.
    Block(String),
}

impl Decision {
    pub fn exit_code(&self) -> i32 {
        match self {
            Decision::Pass => exit_codes::PASS,
            Decision::Warn(_) => exit_codes::WARN,
            Decision::Block(_) => exit_codes::BLOCK,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Decision::Pass => None,
            Decision::Warn(msg) | Decision::Block(msg) => Some(msg),
        }
    }
}

/// Aggregate severity of an audit report.
///
/// Ordered so that reports aggregate by `max`: `Pass < Warn < Block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Pass,
    Warn,
    Block,
}

/// Session marker kinds stored one-file-per-kind under the gate directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerKind {
    /// Implementation actions are blocked until a spec passes audit.
    BlockActive,
    /// Preparation activity (advisory only), tagged by source.
    PreparationUsed(String),
}

/// File-name prefix shared by all preparation markers.
pub const PREP_MARKER_PREFIX: &str = "prep-";

impl MarkerKind {
    /// Stable marker file name for this kind.
    pub fn file_name(&self) -> String {
        match self {
            MarkerKind::BlockActive => "block_active".to_string(),
            MarkerKind::PreparationUsed(tag) => format!("{PREP_MARKER_PREFIX}{tag}"),
        }
    }
}

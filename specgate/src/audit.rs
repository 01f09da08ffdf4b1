//! Orchestration for the specification audit.
//!
//! Runs the pure audit pipeline over a chosen artifact and feeds the verdict
//! back into the marker store: a blocking report (re)arms the gate, a passing
//! or warning report clears it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::audit::{AuditReport, audit_spec};
use crate::core::types::{Decision, MarkerKind, Severity};
use crate::io::config::load_config;
use crate::io::markers::MarkerStore;
use crate::io::paths::GatePaths;
use crate::io::spec_dir::newest_artifact_path;

/// Outcome of `specgate audit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditOutcome {
    /// Artifact that was audited, when one existed.
    pub path: Option<PathBuf>,
    pub report: AuditReport,
}

impl AuditOutcome {
    /// Exit-contract view of the report.
    pub fn decision(&self) -> Decision {
        match self.report.severity {
            Severity::Pass => Decision::Pass,
            Severity::Warn => Decision::Warn(format_findings(
                "specification passed with warnings",
                &self.report.warnings,
            )),
            Severity::Block => {
                let mut msg =
                    format_findings("specification failed audit", &self.report.criticals);
                if !self.report.warnings.is_empty() {
                    msg.push('\n');
                    msg.push_str(&format_findings("also noted", &self.report.warnings));
                }
                Decision::Block(msg)
            }
        }
    }
}

fn format_findings(label: &str, findings: &[String]) -> String {
    if findings.is_empty() {
        return label.to_string();
    }
    format!("{label}:\n- {}", findings.join("\n- "))
}

/// Audit `file` (or the newest spec artifact) and update marker state.
pub fn run_audit(root: &Path, file: Option<&Path>, now: SystemTime) -> Result<AuditOutcome> {
    let paths = GatePaths::new(root);
    let config = load_config(&paths.config_path)?;
    let store = MarkerStore::new(&paths.markers_dir);
    let spec_dir = paths.spec_dir(&config);

    let target = match file {
        Some(path) if path.is_absolute() => Some(path.to_path_buf()),
        Some(path) => Some(root.join(path)),
        None => newest_artifact_path(&spec_dir)?,
    };

    let outcome = match target {
        None => {
            // Nothing to audit yet is a structural failure: the gate stays
            // armed until an artifact exists and passes.
            let report = AuditReport {
                severity: Severity::Block,
                criticals: vec![format!(
                    "no specification artifact found under `{}`",
                    config.spec_dir
                )],
                warnings: Vec::new(),
            };
            AuditOutcome { path: None, report }
        }
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("read spec artifact {}", path.display()))?;
            debug!(path = %path.display(), "auditing specification");
            let report = audit_spec(&text);
            AuditOutcome {
                path: Some(path),
                report,
            }
        }
    };

    match outcome.report.severity {
        Severity::Block => {
            store.set(&MarkerKind::BlockActive, now)?;
            info!("audit blocked, gate armed");
        }
        Severity::Pass | Severity::Warn => {
            store.clear(&MarkerKind::BlockActive)?;
            info!(severity = ?outcome.report.severity, "audit passed, gate cleared");
        }
    }

    Ok(outcome)
}

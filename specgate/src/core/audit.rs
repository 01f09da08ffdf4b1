//! Structural audit of specification documents.
//!
//! An ordered, single-pass pipeline of independent checker functions over the
//! document text. Each checker returns findings; the report aggregates them by
//! max severity. Only the zero-requirements check short-circuits. The audit is
//! deterministic: identical input text always yields an identical report.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::reqid::{format_req_id, req_number};
use crate::core::types::Severity;

/// How many lines below a requirement heading the verification tag may appear.
const VERIFICATION_WINDOW: usize = 3;

/// Placeholder tokens that mark an unfinished specification.
const PLACEHOLDER_MARKERS: &[&str] = &["TBD", "TODO", "FIXME", "[NEEDS CLARIFICATION"];

/// Accepted traceability-matrix heading phrases (matched case-insensitively).
const MATRIX_HEADING_PHRASES: &[&str] = &["traceability matrix", "requirements traceability"];

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^###\s+(REQ-\d{3})\s*:\s*(.+)$").expect("valid regex"));
static VERIFICATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Verification\*\*\s*:\s*(Test|Browser|Manual)").expect("valid regex"));
static PRIORITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Priority\*\*\s*:\s*(Must|Should|Could)").expect("valid regex"));

/// Verification mode tagged on a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Test,
    Browser,
    Manual,
}

/// Requirement priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Must,
    Should,
    Could,
}

/// A requirement definition found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub id: String,
    pub number: u32,
    /// Zero-based line index of the defining heading.
    pub line: usize,
    pub verification: Option<Verification>,
    pub priority: Option<Priority>,
}

/// Severity-classified audit report, derived fresh on every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub severity: Severity,
    pub criticals: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
struct Finding {
    critical: bool,
    message: String,
}

impl Finding {
    fn critical(message: String) -> Self {
        Self {
            critical: true,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            critical: false,
            message,
        }
    }
}

/// Parsed view of a specification document, shared by all checkers.
#[derive(Debug)]
struct SpecDoc<'a> {
    lines: Vec<&'a str>,
    requirements: Vec<Requirement>,
    /// Zero-based line index where the traceability matrix starts, if found.
    matrix_start: Option<usize>,
}

impl<'a> SpecDoc<'a> {
    fn parse(text: &'a str) -> Self {
        let lines: Vec<&str> = text.lines().collect();

        let mut heading_lines: Vec<(usize, String)> = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            if let Some(caps) = HEADING_RE.captures(line) {
                heading_lines.push((idx, caps[1].to_string()));
            }
        }

        let mut requirements = Vec::new();
        for (pos, (idx, id)) in heading_lines.iter().enumerate() {
            let block_end = heading_lines
                .get(pos + 1)
                .map(|(next_idx, _)| *next_idx)
                .unwrap_or(lines.len());

            let verification = lines[*idx + 1..block_end.min(idx + 1 + VERIFICATION_WINDOW)]
                .iter()
                .find_map(|line| VERIFICATION_RE.captures(line))
                .map(|caps| match &caps[1] {
                    "Test" => Verification::Test,
                    "Browser" => Verification::Browser,
                    _ => Verification::Manual,
                });

            let priority = lines[*idx + 1..block_end]
                .iter()
                .find_map(|line| PRIORITY_RE.captures(line))
                .map(|caps| match &caps[1] {
                    "Must" => Priority::Must,
                    "Should" => Priority::Should,
                    _ => Priority::Could,
                });

            requirements.push(Requirement {
                id: id.clone(),
                number: req_number(id).unwrap_or(0),
                line: *idx,
                verification,
                priority,
            });
        }

        let matrix_start = find_matrix_start(&lines);

        Self {
            lines,
            requirements,
            matrix_start,
        }
    }

    /// Text of the matrix section: matrix start through end of document.
    fn matrix_body(&self) -> Option<String> {
        self.matrix_start
            .map(|start| self.lines[start..].join("\n"))
    }
}

/// Locate the traceability matrix: a heading containing an accepted phrase, or
/// a table header row naming both a requirement-id and a verification column.
fn find_matrix_start(lines: &[&str]) -> Option<usize> {
    lines.iter().position(|line| {
        let lower = line.to_lowercase();
        if lower.starts_with('#') {
            MATRIX_HEADING_PHRASES
                .iter()
                .any(|phrase| lower.contains(phrase))
        } else if lower.trim_start().starts_with('|') {
            lower.contains("req") && lower.contains("verification")
        } else {
            false
        }
    })
}

/// Audit a specification document.
///
/// Check order matters: duplicates before gaps before verification tags keeps
/// the report stable for a given input.
pub fn audit_spec(text: &str) -> AuditReport {
    let doc = SpecDoc::parse(text);

    // Zero requirements is the only short-circuiting failure: nothing else in
    // the pipeline is meaningful without at least one definition.
    if doc.requirements.is_empty() {
        return build_report(vec![Finding::critical(
            "no requirement headings found (expected `### REQ-<3 digits>: <title>`)".to_string(),
        )]);
    }

    let pipeline: &[fn(&SpecDoc) -> Vec<Finding>] = &[
        check_duplicate_ids,
        check_id_gaps,
        check_verification_tags,
        check_test_coverage,
        check_matrix_presence,
        check_matrix_coverage,
        check_placeholders,
        check_must_priority,
    ];

    let mut findings = Vec::new();
    for check in pipeline {
        findings.extend(check(&doc));
    }
    build_report(findings)
}

fn build_report(findings: Vec<Finding>) -> AuditReport {
    let mut criticals = Vec::new();
    let mut warnings = Vec::new();
    for finding in findings {
        if finding.critical {
            criticals.push(finding.message);
        } else {
            warnings.push(finding.message);
        }
    }
    let severity = if !criticals.is_empty() {
        Severity::Block
    } else if !warnings.is_empty() {
        Severity::Warn
    } else {
        Severity::Pass
    };
    AuditReport {
        severity,
        criticals,
        warnings,
    }
}

/// An id defined as a heading more than once is critical; each id listed once.
fn check_duplicate_ids(doc: &SpecDoc) -> Vec<Finding> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for req in &doc.requirements {
        *counts.entry(req.id.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, count)| Finding::critical(format!("requirement {id} is defined {count} times")))
        .collect()
}

/// Gaps in the consecutive id sequence (min..=max) warn; typo detection only.
fn check_id_gaps(doc: &SpecDoc) -> Vec<Finding> {
    let mut numbers: Vec<u32> = doc.requirements.iter().map(|req| req.number).collect();
    numbers.sort_unstable();
    numbers.dedup();
    let (Some(first), Some(last)) = (numbers.first(), numbers.last()) else {
        return Vec::new();
    };
    (*first..=*last)
        .filter(|n| !numbers.contains(n))
        .map(|n| {
            Finding::warning(format!(
                "gap in requirement ids: {} is missing",
                format_req_id(n)
            ))
        })
        .collect()
}

/// Every definition needs a verification tag close to its heading.
fn check_verification_tags(doc: &SpecDoc) -> Vec<Finding> {
    doc.requirements
        .iter()
        .filter(|req| req.verification.is_none())
        .map(|req| {
            Finding::critical(format!(
                "{} has no **Verification** tag within {VERIFICATION_WINDOW} lines of its heading \
                 (expected Test, Browser, or Manual)",
                req.id
            ))
        })
        .collect()
}

fn check_test_coverage(doc: &SpecDoc) -> Vec<Finding> {
    let any_test = doc
        .requirements
        .iter()
        .any(|req| req.verification == Some(Verification::Test));
    if any_test {
        Vec::new()
    } else {
        vec![Finding::warning(
            "no requirement is verified by Test; regression coverage is at risk".to_string(),
        )]
    }
}

fn check_matrix_presence(doc: &SpecDoc) -> Vec<Finding> {
    if doc.matrix_start.is_some() {
        Vec::new()
    } else {
        vec![Finding::warning(
            "no traceability matrix section found".to_string(),
        )]
    }
}

/// Ids defined before the matrix must appear inside it.
///
/// Ids that occur only inside the matrix without a defining heading are
/// intentionally not flagged.
fn check_matrix_coverage(doc: &SpecDoc) -> Vec<Finding> {
    let Some(start) = doc.matrix_start else {
        return Vec::new();
    };
    let Some(body) = doc.matrix_body() else {
        return Vec::new();
    };
    doc.requirements
        .iter()
        .filter(|req| req.line < start && !body.contains(req.id.as_str()))
        .map(|req| {
            Finding::warning(format!(
                "{} is not referenced in the traceability matrix",
                req.id
            ))
        })
        .collect()
}

fn check_placeholders(doc: &SpecDoc) -> Vec<Finding> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for line in &doc.lines {
        for marker in PLACEHOLDER_MARKERS {
            let hits = line.matches(marker).count();
            if hits > 0 {
                *counts.entry(marker).or_insert(0) += hits;
            }
        }
    }
    let found: Vec<String> = counts
        .iter()
        .map(|(marker, count)| format!("{marker} ({count})"))
        .collect();
    if found.is_empty() {
        Vec::new()
    } else {
        vec![Finding::warning(format!(
            "unresolved placeholder markers remain: {}",
            found.join(", ")
        ))]
    }
}

fn check_must_priority(doc: &SpecDoc) -> Vec<Finding> {
    let any_must = doc
        .requirements
        .iter()
        .any(|req| req.priority == Some(Priority::Must));
    if any_must {
        Vec::new()
    } else {
        vec![Finding::warning(
            "no requirement has priority Must".to_string(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement(id: &str, verification: &str, priority: &str) -> String {
        format!(
            "### {id}: sample requirement\n\
             **Priority**: {priority}\n\
             **Verification**: {verification}\n\n\
             Body text.\n\n"
        )
    }

    fn matrix(rows: &[&str]) -> String {
        let mut out = String::from(
            "## Traceability Matrix\n\n| Requirement | Verification | Evidence |\n|---|---|---|\n",
        );
        for row in rows {
            out.push_str(&format!("| {row} | Test | tests/{row}.rs |\n"));
        }
        out
    }

    fn complete_spec() -> String {
        let mut text = String::from("# Feature\n\n");
        text.push_str(&requirement("REQ-001", "Test", "Must"));
        text.push_str(&requirement("REQ-002", "Browser", "Should"));
        text.push_str(&matrix(&["REQ-001", "REQ-002"]));
        text
    }

    #[test]
    fn complete_spec_passes() {
        let report = audit_spec(&complete_spec());
        assert_eq!(report.severity, Severity::Pass);
        assert!(report.criticals.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn zero_requirements_blocks_and_short_circuits() {
        let report = audit_spec("# Feature\n\nTODO: write requirements\n");
        assert_eq!(report.severity, Severity::Block);
        assert_eq!(report.criticals.len(), 1);
        assert!(report.criticals[0].contains("no requirement headings"));
        // Short-circuit: the TODO placeholder check never ran.
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn duplicate_heading_blocks_and_lists_id_once() {
        let mut text = String::from("# Feature\n\n");
        text.push_str(&requirement("REQ-001", "Test", "Must"));
        text.push_str(&requirement("REQ-001", "Test", "Must"));
        text.push_str(&matrix(&["REQ-001"]));

        let report = audit_spec(&text);
        assert_eq!(report.severity, Severity::Block);
        let dup_mentions = report
            .criticals
            .iter()
            .filter(|msg| msg.contains("REQ-001") && msg.contains("defined"))
            .count();
        assert_eq!(dup_mentions, 1);
        assert!(report.criticals[0].contains("2 times"));
    }

    #[test]
    fn id_gap_warns_naming_missing_id_without_blocking() {
        let mut text = String::from("# Feature\n\n");
        text.push_str(&requirement("REQ-001", "Test", "Must"));
        text.push_str(&requirement("REQ-002", "Test", "Should"));
        text.push_str(&requirement("REQ-004", "Test", "Could"));
        text.push_str(&matrix(&["REQ-001", "REQ-002", "REQ-004"]));

        let report = audit_spec(&text);
        assert_eq!(report.severity, Severity::Warn);
        assert!(report.criticals.is_empty());
        assert!(
            report
                .warnings
                .iter()
                .any(|msg| msg.contains("REQ-003") && msg.contains("missing"))
        );
    }

    #[test]
    fn missing_verification_tag_blocks_naming_the_id() {
        let mut text = String::from("# Feature\n\n");
        text.push_str(&requirement("REQ-001", "Test", "Must"));
        text.push_str("### REQ-002: untagged requirement\n\nBody only.\n\n");
        text.push_str(&matrix(&["REQ-001", "REQ-002"]));

        let report = audit_spec(&text);
        assert_eq!(report.severity, Severity::Block);
        assert!(
            report
                .criticals
                .iter()
                .any(|msg| msg.contains("REQ-002") && msg.contains("Verification"))
        );
        assert!(!report.criticals.iter().any(|msg| msg.contains("REQ-001 has no")));
    }

    #[test]
    fn verification_tag_outside_window_is_missing() {
        let text = "### REQ-001: tag too far\nline\nline\nline\n**Verification**: Test\n";
        let report = audit_spec(text);
        assert!(
            report
                .criticals
                .iter()
                .any(|msg| msg.contains("REQ-001"))
        );
    }

    #[test]
    fn all_browser_verification_warns_but_never_blocks() {
        let mut text = String::from("# Feature\n\n");
        text.push_str(&requirement("REQ-001", "Browser", "Must"));
        text.push_str(&requirement("REQ-002", "Browser", "Should"));
        text.push_str(&matrix(&["REQ-001", "REQ-002"]));

        let report = audit_spec(&text);
        assert_eq!(report.severity, Severity::Warn);
        assert!(
            report
                .warnings
                .iter()
                .any(|msg| msg.contains("no requirement is verified by Test"))
        );
    }

    #[test]
    fn missing_matrix_warns() {
        let mut text = String::from("# Feature\n\n");
        text.push_str(&requirement("REQ-001", "Test", "Must"));

        let report = audit_spec(&text);
        assert_eq!(report.severity, Severity::Warn);
        assert!(
            report
                .warnings
                .iter()
                .any(|msg| msg.contains("no traceability matrix"))
        );
    }

    #[test]
    fn matrix_detected_by_table_header_without_heading() {
        let mut text = String::from("# Feature\n\n");
        text.push_str(&requirement("REQ-001", "Test", "Must"));
        text.push_str("| Req ID | Verification |\n|---|---|\n| REQ-001 | Test |\n");

        let report = audit_spec(&text);
        assert!(
            !report
                .warnings
                .iter()
                .any(|msg| msg.contains("no traceability matrix"))
        );
    }

    #[test]
    fn id_absent_from_matrix_warns() {
        let mut text = String::from("# Feature\n\n");
        text.push_str(&requirement("REQ-001", "Test", "Must"));
        text.push_str(&requirement("REQ-002", "Test", "Should"));
        text.push_str(&matrix(&["REQ-001"]));

        let report = audit_spec(&text);
        assert_eq!(report.severity, Severity::Warn);
        assert!(
            report
                .warnings
                .iter()
                .any(|msg| msg.contains("REQ-002") && msg.contains("traceability matrix"))
        );
    }

    #[test]
    fn matrix_only_id_is_not_flagged() {
        let mut text = String::from("# Feature\n\n");
        text.push_str(&requirement("REQ-001", "Test", "Must"));
        text.push_str(&matrix(&["REQ-001", "REQ-009"]));

        let report = audit_spec(&text);
        assert!(!report.warnings.iter().any(|msg| msg.contains("REQ-009")));
        assert!(!report.criticals.iter().any(|msg| msg.contains("REQ-009")));
    }

    #[test]
    fn placeholder_markers_warn_with_counts() {
        let mut text = complete_spec();
        text.push_str("\nTBD: flesh this out\nAlso TBD, and TODO later.\n");

        let report = audit_spec(&text);
        assert_eq!(report.severity, Severity::Warn);
        assert!(
            report
                .warnings
                .iter()
                .any(|msg| msg.contains("TBD (2)") && msg.contains("TODO (1)"))
        );
    }

    #[test]
    fn missing_must_priority_warns() {
        let mut text = String::from("# Feature\n\n");
        text.push_str(&requirement("REQ-001", "Test", "Should"));
        text.push_str(&matrix(&["REQ-001"]));

        let report = audit_spec(&text);
        assert_eq!(report.severity, Severity::Warn);
        assert!(
            report
                .warnings
                .iter()
                .any(|msg| msg.contains("priority Must"))
        );
    }

    #[test]
    fn audit_is_deterministic() {
        let mut text = complete_spec();
        text.push_str("\nTBD\n");
        let first = audit_spec(&text);
        let second = audit_spec(&text);
        assert_eq!(first, second);
    }
}

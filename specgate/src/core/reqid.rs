//! Requirement identifier matching (`REQ-` plus three digits).

use std::sync::LazyLock;

use regex::Regex;

static REQ_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"REQ-(\d{3})").expect("valid regex"));

/// Extract the first requirement id from free text, e.g. `"REQ-007"`.
pub fn extract_req_id(text: &str) -> Option<String> {
    REQ_ID_RE.find(text).map(|m| m.as_str().to_string())
}

/// Numeric suffix of a requirement id ("REQ-042" -> 42).
pub fn req_number(id: &str) -> Option<u32> {
    REQ_ID_RE
        .captures(id)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Format a requirement id from its numeric suffix (3 -> "REQ-003").
pub fn format_req_id(number: u32) -> String {
    format!("REQ-{number:03}")
}

//! Parsing hook events from the single input channel (stdin JSON).

use std::io::Read;

use anyhow::{Context, Result};

use crate::core::types::{ActionRequest, CompletionEvent};

/// Read a pending-action description from `reader`.
pub fn read_action(reader: &mut impl Read) -> Result<ActionRequest> {
    let raw = read_all(reader)?;
    serde_json::from_str(&raw).context("parse action request json")
}

/// Read a task-completion event from `reader`.
pub fn read_completion(reader: &mut impl Read) -> Result<CompletionEvent> {
    let raw = read_all(reader)?;
    serde_json::from_str(&raw).context("parse completion event json")
}

fn read_all(reader: &mut impl Read) -> Result<String> {
    let mut raw = String::new();
    reader
        .read_to_string(&mut raw)
        .context("read hook input")?;
    Ok(raw)
}

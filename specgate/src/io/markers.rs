//! Filesystem-resident session markers.
//!
//! One file per marker kind under `.specgate/markers/`; the file content is
//! the creation timestamp in unix seconds. Unreadable or unparseable content
//! is treated the same as a missing marker (fail-closed), so races between
//! concurrent checks degrade to conservative re-blocking, never corruption.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::freshness::is_fresh;
use crate::core::types::{MarkerKind, PREP_MARKER_PREFIX};

/// Marker storage scoped to one session root.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    dir: PathBuf,
}

impl MarkerStore {
    pub fn new(markers_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: markers_dir.into(),
        }
    }

    fn marker_path(&self, kind: &MarkerKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Create or refresh a marker, stamping it with `now`.
    pub fn set(&self, kind: &MarkerKind, now: SystemTime) -> Result<()> {
        let path = self.marker_path(kind);
        debug!(path = %path.display(), "setting marker");
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create marker directory {}", self.dir.display()))?;
        let secs = now
            .duration_since(UNIX_EPOCH)
            .context("marker timestamp before unix epoch")?
            .as_secs();
        fs::write(&path, format!("{secs}\n"))
            .with_context(|| format!("write marker {}", path.display()))?;
        Ok(())
    }

    /// Remove a marker. Removing a missing marker is not an error.
    pub fn clear(&self, kind: &MarkerKind) -> Result<()> {
        let path = self.marker_path(kind);
        debug!(path = %path.display(), "clearing marker");
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("remove marker {}", path.display()))
            }
        }
    }

    /// Creation time recorded in the marker file, or `None` when the marker is
    /// missing or its content does not parse.
    pub fn created_at(&self, kind: &MarkerKind) -> Result<Option<SystemTime>> {
        let path = self.marker_path(kind);
        if !path.exists() {
            return Ok(None);
        }
        let contents =
            fs::read_to_string(&path).with_context(|| format!("read marker {}", path.display()))?;
        Ok(parse_timestamp(&contents))
    }

    /// `MissingMeansUnmet` freshness check relative to `now`.
    pub fn is_fresh(&self, kind: &MarkerKind, ttl: Duration, now: SystemTime) -> Result<bool> {
        Ok(is_fresh(self.created_at(kind)?, now, ttl))
    }

    /// True when any preparation marker (any tag) is fresh.
    pub fn any_prep_fresh(&self, ttl: Duration, now: SystemTime) -> Result<bool> {
        if !self.dir.exists() {
            return Ok(false);
        }
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("read marker directory {}", self.dir.display()))?;
        for entry in entries {
            let entry = entry.context("read marker directory entry")?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(tag) = name.strip_prefix(PREP_MARKER_PREFIX) else {
                continue;
            };
            let kind = MarkerKind::PreparationUsed(tag.to_string());
            if self.is_fresh(&kind, ttl, now)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn parse_timestamp(contents: &str) -> Option<SystemTime> {
    let secs: u64 = contents.trim().parse().ok()?;
    Some(UNIX_EPOCH + Duration::from_secs(secs))
}

/// Marker file path helper used by tests that need to tamper with raw content.
pub fn marker_file(markers_dir: &Path, kind: &MarkerKind) -> PathBuf {
    markers_dir.join(kind.file_name())
}

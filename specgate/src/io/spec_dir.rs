//! Scanning the specification directory for artifacts.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing::debug;

/// Recursively collect specification artifacts (`.md` files) under `dir`.
///
/// A missing directory yields an empty list: before `specgate init` there is
/// simply no spec activity.
pub fn list_artifacts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut artifacts = Vec::new();
    if dir.exists() {
        collect_markdown(dir, &mut artifacts)?;
    }
    artifacts.sort();
    Ok(artifacts)
}

/// Modification time of the newest artifact, if any.
pub fn newest_artifact_mtime(dir: &Path) -> Result<Option<SystemTime>> {
    Ok(newest_artifact(dir)?.map(|(_, mtime)| mtime))
}

/// Newest artifact path, if any. Used as the default `audit` target.
pub fn newest_artifact_path(dir: &Path) -> Result<Option<PathBuf>> {
    Ok(newest_artifact(dir)?.map(|(path, _)| path))
}

fn newest_artifact(dir: &Path) -> Result<Option<(PathBuf, SystemTime)>> {
    let mut newest: Option<(PathBuf, SystemTime)> = None;
    for path in list_artifacts(dir)? {
        let metadata = fs::metadata(&path)
            .with_context(|| format!("stat spec artifact {}", path.display()))?;
        let mtime = metadata
            .modified()
            .with_context(|| format!("read mtime of {}", path.display()))?;
        let newer = match &newest {
            None => true,
            Some((_, best)) => mtime > *best,
        };
        if newer {
            newest = Some((path, mtime));
        }
    }
    debug!(dir = %dir.display(), newest = ?newest.as_ref().map(|(p, _)| p.display().to_string()), "scanned spec directory");
    Ok(newest)
}

fn collect_markdown(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read spec directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            collect_markdown(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "md") {
            out.push(path);
        }
    }
    Ok(())
}

//! Test-evidence discovery and runtime-detected test execution.
//!
//! Two halves of the completion check: find test-like files referencing a
//! requirement id, and run the project's own test command behind a
//! [`TestRunner`] seam so orchestration stays testable without real runtimes.
//!
//! Runtime detection follows the `UnknownMeansSkip` policy: an unrecognized
//! project layout skips the run sub-check instead of blocking.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::io::process::run_command_with_timeout;

/// Directories never scanned for evidence.
const SKIP_DIRS: &[&str] = &[
    ".git",
    ".specgate",
    "node_modules",
    "target",
    "dist",
    "build",
    ".venv",
    "venv",
];

/// Source extensions eligible as test evidence.
const TEST_EXTENSIONS: &[&str] = &[
    "rs", "ts", "tsx", "js", "jsx", "mjs", "py", "go", "rb", "java", "kt", "cs", "php",
];

/// Test runtime detected from a manifest file, evaluated in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSpec {
    pub name: &'static str,
    pub manifest: &'static str,
    pub command: &'static [&'static str],
}

/// Ordered `(detector, runner)` table; first manifest found wins.
pub const RUNTIMES: &[RuntimeSpec] = &[
    RuntimeSpec {
        name: "node",
        manifest: "package.json",
        command: &["npm", "test"],
    },
    RuntimeSpec {
        name: "cargo",
        manifest: "Cargo.toml",
        command: &["cargo", "test", "--quiet"],
    },
    RuntimeSpec {
        name: "pytest",
        manifest: "pyproject.toml",
        command: &["pytest", "-q"],
    },
    RuntimeSpec {
        name: "pytest",
        manifest: "pytest.ini",
        command: &["pytest", "-q"],
    },
    RuntimeSpec {
        name: "go",
        manifest: "go.mod",
        command: &["go", "test", "./..."],
    },
];

/// Detect the project's test runtime by manifest presence.
pub fn detect_runtime(root: &Path) -> Option<&'static RuntimeSpec> {
    RUNTIMES
        .iter()
        .find(|runtime| root.join(runtime.manifest).is_file())
}

/// Result of one test-command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestRunOutcome {
    Passed,
    Failed { excerpt: String },
    /// The runtime's command could not be spawned (binary absent). Treated
    /// like an unrecognized runtime: skipped, never a block.
    Unavailable,
}

/// Seam for executing the detected runtime's test command.
pub trait TestRunner {
    fn run(&self, root: &Path, runtime: &RuntimeSpec) -> Result<TestRunOutcome>;
}

/// Real runner: spawns the runtime command with timeout and bounded output.
pub struct ProcessTestRunner {
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

impl TestRunner for ProcessTestRunner {
    fn run(&self, root: &Path, runtime: &RuntimeSpec) -> Result<TestRunOutcome> {
        let mut cmd = Command::new(runtime.command[0]);
        cmd.args(&runtime.command[1..]).current_dir(root);
        debug!(runtime = runtime.name, "running test command");

        let output = match run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes) {
            Ok(output) => output,
            Err(err) => {
                warn!(runtime = runtime.name, err = %err, "test command unavailable, skipping");
                return Ok(TestRunOutcome::Unavailable);
            }
        };

        if output.status.success() && !output.timed_out {
            return Ok(TestRunOutcome::Passed);
        }
        let mut excerpt = output.combined_text();
        if output.timed_out {
            excerpt.push_str("\n[test run timed out]\n");
        }
        Ok(TestRunOutcome::Failed { excerpt })
    }
}

/// Last `max_chars` of `text`; test failures usually report at the tail.
pub fn tail_excerpt(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }
    let tail: String = chars[chars.len() - max_chars..].iter().collect();
    format!("...{tail}")
}

/// Recursively find test-like files under `root` containing `needle`.
pub fn find_test_evidence(root: &Path, needle: &str) -> Result<Vec<PathBuf>> {
    let mut hits = Vec::new();
    walk_for_evidence(root, root, needle, &mut hits)?;
    hits.sort();
    Ok(hits)
}

fn walk_for_evidence(
    root: &Path,
    dir: &Path,
    needle: &str,
    hits: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            let skip = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| SKIP_DIRS.contains(&name));
            if !skip {
                walk_for_evidence(root, &path, needle, hits)?;
            }
        } else if is_test_like(path.strip_prefix(root).unwrap_or(&path)) {
            // Unreadable or non-UTF8 files cannot carry a literal id.
            let contents = fs::read_to_string(&path).unwrap_or_default();
            if contents.contains(needle) {
                hits.push(path);
            }
        }
    }
    Ok(())
}

/// Cross-ecosystem test-file naming conventions.
///
/// A file counts as test-like when it has a source extension and either sits
/// under a test directory (`tests/`, `test/`, `__tests__/`) or its name
/// follows a test naming pattern (`test_*`, `*_test`, `*.test.*`, `*.spec.*`).
pub fn is_test_like(path: &Path) -> bool {
    let has_test_ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEST_EXTENSIONS.contains(&ext));
    if !has_test_ext {
        return false;
    }

    let in_test_dir = path.components().any(|component| {
        matches!(
            component,
            Component::Normal(name) if name == "tests" || name == "test" || name == "__tests__"
        )
    });
    if in_test_dir {
        return true;
    }

    path.file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| {
            stem.starts_with("test_")
                || stem.ends_with("_test")
                || stem.ends_with(".test")
                || stem.ends_with(".spec")
        })
}

/// Human description of the accepted conventions, for remediation text.
pub fn evidence_convention_hint() -> &'static str {
    "a file under tests/, test/ or __tests__/, or named test_*.py, *_test.go, *.test.ts, *.spec.js or similar"
}

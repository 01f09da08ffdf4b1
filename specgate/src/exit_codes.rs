//! Stable exit codes for specgate CLI commands.
//!
//! The exit code is the product output of every check: the calling harness
//! maps it directly to proceed/refuse behavior.

/// Check passed; the action proceeds silently.
pub const PASS: i32 = 0;
/// Command failed due to invalid input, layout, or config.
pub const INVALID: i32 = 1;
/// Check blocked; the action must not proceed and remediation text is on stderr.
pub const BLOCK: i32 = 2;
/// Check passed with an advisory message on stderr.
pub const WARN: i32 = 3;

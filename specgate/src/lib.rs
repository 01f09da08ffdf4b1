//! Specification-gated action control for agent sessions.
//!
//! This crate implements a pre-action gate for automation agents: mutating
//! actions are blocked until a specification artifact exists and passes a
//! structural audit, and completed requirements must carry traceable, passing
//! test evidence. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (gate decisions, audit pipeline,
//!   freshness policies). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (marker files, config, process
//!   execution). Isolated to enable mocking in tests.
//!
//! Orchestration modules ([`session`], [`check`], [`audit`], [`complete`],
//! [`advisory`]) coordinate core logic with I/O to implement CLI commands.

pub mod advisory;
pub mod audit;
pub mod check;
pub mod complete;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

//! Orchestration for task-completion verification.
//!
//! Conservative by design: tasks without a requirement id pass unconditionally,
//! and an unrecognized (or unavailable) test runtime skips the run sub-check
//! rather than blocking.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

use crate::core::reqid::extract_req_id;
use crate::core::types::{CompletionEvent, Decision};
use crate::io::evidence::{
    TestRunOutcome, TestRunner, detect_runtime, evidence_convention_hint, find_test_evidence,
    tail_excerpt,
};

/// Bound on the diagnostic excerpt included in a failing-test block message.
const EXCERPT_MAX_CHARS: usize = 2_000;

/// Verify that a completed unit of work carries traceable, passing test
/// evidence. `runner` executes the detected runtime's test command.
///
/// Evidence search and runtime detection are anchored at the event's working
/// directory when one is reported, so a task completed inside a workspace
/// member is verified against that member's own manifest and tests.
pub fn verify_completion(
    root: &Path,
    event: &CompletionEvent,
    runner: &impl TestRunner,
) -> Result<Decision> {
    let Some(req_id) = extract_req_id(&event.subject) else {
        debug!(subject = %event.subject, "no requirement id in subject, allowing");
        return Ok(Decision::Pass);
    };
    let root = resolve_base(root, event);
    let root = root.as_path();

    let evidence = find_test_evidence(root, &req_id)?;
    if evidence.is_empty() {
        return Ok(Decision::Block(format!(
            "completion of {req_id} has no test evidence: no test file mentions \
             \"{req_id}\". Add {} containing the literal id, then retry.",
            evidence_convention_hint()
        )));
    }
    debug!(req_id = %req_id, files = evidence.len(), "test evidence found");

    let Some(runtime) = detect_runtime(root) else {
        // No recognized manifest: the precondition is unverifiable, and an
        // unverifiable precondition must never cause a false block.
        info!(req_id = %req_id, "no recognized test runtime, skipping test run");
        return Ok(Decision::Pass);
    };

    match runner.run(root, runtime)? {
        TestRunOutcome::Passed => {
            info!(req_id = %req_id, runtime = runtime.name, "tests passing");
            Ok(Decision::Pass)
        }
        TestRunOutcome::Unavailable => {
            info!(runtime = runtime.name, "test command unavailable, skipping test run");
            Ok(Decision::Pass)
        }
        TestRunOutcome::Failed { excerpt } => Ok(Decision::Block(format!(
            "completion of {req_id} is not backed by a passing test run: \
             `{}` failed.\n{}",
            runtime.command.join(" "),
            tail_excerpt(&excerpt, EXCERPT_MAX_CHARS)
        ))),
    }
}

fn resolve_base(root: &Path, event: &CompletionEvent) -> PathBuf {
    match &event.cwd {
        Some(cwd) if cwd.is_absolute() => cwd.clone(),
        Some(cwd) => root.join(cwd),
        None => root.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    use crate::io::evidence::RuntimeSpec;
    use crate::test_support::TestRoot;

    /// Scripted runner in place of a real test process.
    struct ScriptedTestRunner {
        outcome: TestRunOutcome,
        calls: RefCell<u32>,
    }

    impl ScriptedTestRunner {
        fn new(outcome: TestRunOutcome) -> Self {
            Self {
                outcome,
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.borrow()
        }
    }

    impl TestRunner for ScriptedTestRunner {
        fn run(&self, _root: &Path, _runtime: &RuntimeSpec) -> Result<TestRunOutcome> {
            *self.calls.borrow_mut() += 1;
            Ok(self.outcome.clone())
        }
    }

    fn event(subject: &str) -> CompletionEvent {
        CompletionEvent {
            subject: subject.to_string(),
            cwd: None,
        }
    }

    fn write_evidence(root: &TestRoot, req_id: &str) {
        fs::create_dir_all(root.path().join("tests")).expect("mkdir");
        fs::write(
            root.path().join("tests/validation.rs"),
            format!("// covers {req_id}\n#[test]\nfn holds() {{}}\n"),
        )
        .expect("write evidence");
    }

    #[test]
    fn subject_without_requirement_id_passes_unconditionally() {
        let root = TestRoot::new().expect("root");
        let runner = ScriptedTestRunner::new(TestRunOutcome::Passed);

        let decision =
            verify_completion(root.path(), &event("refactor parser"), &runner).expect("verify");
        assert_eq!(decision, Decision::Pass);
        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn missing_evidence_blocks_naming_the_convention() {
        let root = TestRoot::new().expect("root");
        let runner = ScriptedTestRunner::new(TestRunOutcome::Passed);

        let decision =
            verify_completion(root.path(), &event("REQ-007: add validation"), &runner)
                .expect("verify");
        let Decision::Block(msg) = decision else {
            panic!("expected block, got {decision:?}");
        };
        assert!(msg.contains("REQ-007"));
        assert!(msg.contains("tests/"));
        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn evidence_plus_passing_run_allows_completion() {
        let root = TestRoot::new().expect("root");
        write_evidence(&root, "REQ-007");
        fs::write(root.path().join("Cargo.toml"), "[package]\n").expect("manifest");
        let runner = ScriptedTestRunner::new(TestRunOutcome::Passed);

        let decision =
            verify_completion(root.path(), &event("REQ-007: add validation"), &runner)
                .expect("verify");
        assert_eq!(decision, Decision::Pass);
        assert_eq!(runner.calls(), 1);
    }

    #[test]
    fn failing_run_blocks_with_bounded_excerpt() {
        let root = TestRoot::new().expect("root");
        write_evidence(&root, "REQ-007");
        fs::write(root.path().join("Cargo.toml"), "[package]\n").expect("manifest");
        let long_output = "assertion failed\n".repeat(1_000);
        let runner = ScriptedTestRunner::new(TestRunOutcome::Failed {
            excerpt: long_output,
        });

        let decision =
            verify_completion(root.path(), &event("REQ-007: add validation"), &runner)
                .expect("verify");
        let Decision::Block(msg) = decision else {
            panic!("expected block, got {decision:?}");
        };
        assert!(msg.contains("REQ-007"));
        assert!(msg.contains("assertion failed"));
        assert!(msg.len() < 2_500);
    }

    #[test]
    fn reported_cwd_anchors_evidence_and_runtime_detection() {
        let root = TestRoot::new().expect("root");
        let member = root.path().join("crates/app");
        fs::create_dir_all(member.join("tests")).expect("mkdir");
        fs::write(
            member.join("tests/validation.rs"),
            "// covers REQ-007\n#[test]\nfn holds() {}\n",
        )
        .expect("write evidence");
        fs::write(member.join("Cargo.toml"), "[package]\n").expect("manifest");
        let runner = ScriptedTestRunner::new(TestRunOutcome::Passed);

        // Without a cwd the root has no recognized manifest: run skipped.
        let decision =
            verify_completion(root.path(), &event("REQ-007: add validation"), &runner)
                .expect("verify");
        assert_eq!(decision, Decision::Pass);
        assert_eq!(runner.calls(), 0);

        // Anchored at the member, the member's manifest drives the run.
        let completed = CompletionEvent {
            subject: "REQ-007: add validation".to_string(),
            cwd: Some(PathBuf::from("crates/app")),
        };
        let decision = verify_completion(root.path(), &completed, &runner).expect("verify");
        assert_eq!(decision, Decision::Pass);
        assert_eq!(runner.calls(), 1);
    }

    #[test]
    fn unrecognized_runtime_skips_run_silently() {
        let root = TestRoot::new().expect("root");
        write_evidence(&root, "REQ-007");
        // No manifest file anywhere under the root.
        let runner = ScriptedTestRunner::new(TestRunOutcome::Failed {
            excerpt: "would have failed".to_string(),
        });

        let decision =
            verify_completion(root.path(), &event("REQ-007: add validation"), &runner)
                .expect("verify");
        assert_eq!(decision, Decision::Pass);
        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn unavailable_test_command_never_blocks() {
        let root = TestRoot::new().expect("root");
        write_evidence(&root, "REQ-007");
        fs::write(root.path().join("Cargo.toml"), "[package]\n").expect("manifest");
        let runner = ScriptedTestRunner::new(TestRunOutcome::Unavailable);

        let decision =
            verify_completion(root.path(), &event("REQ-007: add validation"), &runner)
                .expect("verify");
        assert_eq!(decision, Decision::Pass);
    }
}

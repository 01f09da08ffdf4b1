//! Specification-gate CLI for agent harness hooks.
//!
//! Each subcommand is one short-lived, stateless check invoked by the harness
//! around an agent action. The exit code carries the verdict (see
//! [`specgate::exit_codes`]); remediation text goes to stderr.

use std::io::stdin;
use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::Result;
use clap::{Parser, Subcommand};

use specgate::advisory::record_preparation;
use specgate::audit::run_audit;
use specgate::check::check_action;
use specgate::complete::verify_completion;
use specgate::core::types::Decision;
use specgate::exit_codes;
use specgate::io::config::load_config;
use specgate::io::evidence::ProcessTestRunner;
use specgate::io::hook::{read_action, read_completion};
use specgate::io::paths::{GatePaths, InitOptions, init_gate};
use specgate::logging;
use specgate::session::bootstrap_session;

#[derive(Parser)]
#[command(
    name = "specgate",
    version,
    about = "Specification-gated action control for agent sessions"
)]
struct Cli {
    /// Session root (defaults to the current directory).
    #[arg(short = 'C', long, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.specgate/` scaffolding and the spec directory.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Seed marker state at session start (arms the gate unless a spec is fresh).
    SessionStart,
    /// Gate a pending action (JSON action request on stdin).
    Check,
    /// Audit a specification artifact and update the gate accordingly.
    Audit {
        /// Artifact to audit; defaults to the newest file in the spec directory.
        file: Option<PathBuf>,
    },
    /// Verify test traceability for a completed task (JSON event on stdin).
    Complete,
    /// Record preparation activity (advisory markers).
    Prep {
        /// Tag naming the preparation source (e.g. `docs`, `pattern-search`).
        tag: String,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = cli.root;
    let now = SystemTime::now();

    match cli.command {
        Command::Init { force } => {
            init_gate(&root, &InitOptions { force })?;
            Ok(exit_codes::PASS)
        }
        Command::SessionStart => {
            bootstrap_session(&root, now)?;
            Ok(exit_codes::PASS)
        }
        Command::Check => {
            let action = read_action(&mut stdin().lock())?;
            let decision = check_action(&root, &action, now)?;
            Ok(emit(&decision))
        }
        Command::Audit { file } => {
            let outcome = run_audit(&root, file.as_deref(), now)?;
            println!("{}", serde_json::to_string_pretty(&outcome.report)?);
            Ok(emit(&outcome.decision()))
        }
        Command::Complete => {
            let event = read_completion(&mut stdin().lock())?;
            let config = load_config(&GatePaths::new(&root).config_path)?;
            let runner = ProcessTestRunner {
                timeout: config.test_timeout(),
                output_limit_bytes: config.test_output_limit_bytes,
            };
            let decision = verify_completion(&root, &event, &runner)?;
            Ok(emit(&decision))
        }
        Command::Prep { tag } => {
            record_preparation(&root, &tag, now)?;
            Ok(exit_codes::PASS)
        }
    }
}

fn emit(decision: &Decision) -> i32 {
    if let Some(message) = decision.message() {
        eprintln!("{message}");
    }
    decision.exit_code()
}

//! Development tasks for the workspace, run as `cargo xtask <task>`.
//!
//! Tasks shell out to the real tools and propagate their exit codes
//! untouched. An unrecognized task name is treated as a test selector
//! and forwarded to `test`, so `cargo xtask cleaner` just works.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tasks for this workspace")]
#[command(disable_help_subcommand = true)]
struct Args {
    #[command(subcommand)]
    task: Option<Task>,
}

#[derive(Subcommand)]
enum Task {
    /// Reformat the whole workspace in place
    Fmt,
    /// Run the test suite, forwarding extra arguments as selectors
    Test {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run the test suite under coverage with a missing-line report
    Coverage,
    /// Remove build and coverage artifacts
    Clean,
    /// Print usage for the available tasks
    Help,
    #[command(external_subcommand)]
    Selector(Vec<String>),
}

const HELP_TEXT: &str = "\
xtask - development tasks

USAGE:
    cargo xtask [TASK] [ARGS...]

TASKS:
    (none)       Reformat the workspace, then run the test suite
    fmt          Reformat the whole workspace in place
    test [ARGS]  Run the test suite; extra arguments select tests
    coverage     Run tests under coverage with a missing-line report
    clean        Remove build and coverage artifacts
    help         Show this message

Anything other than the tasks above is forwarded to `test` as a selector,
so `cargo xtask cleaner` runs `cargo test --workspace cleaner -- --nocapture`.
";

/// A command to launch, held as data so tests can check the exact argv.
#[derive(Debug, Clone, PartialEq)]
struct Invocation {
    program: &'static str,
    args: Vec<String>,
}

impl Invocation {
    fn new(program: &'static str, args: &[&str]) -> Self {
        Self {
            program,
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn fmt_invocation() -> Invocation {
    Invocation::new("cargo", &["fmt", "--all"])
}

fn test_invocation(selectors: &[String]) -> Invocation {
    let mut args: Vec<String> = vec!["test".to_string(), "--workspace".to_string()];
    args.extend(selectors.iter().cloned());
    args.push("--".to_string());
    args.push("--nocapture".to_string());
    Invocation {
        program: "cargo",
        args,
    }
}

fn coverage_invocation() -> Invocation {
    Invocation::new("cargo", &["llvm-cov", "--workspace", "--show-missing-lines"])
}

fn cargo_clean_invocation() -> Invocation {
    Invocation::new("cargo", &["clean"])
}

/// Launch the command with inherited stdio and hand back its exit code.
fn run(invocation: &Invocation) -> Result<i32> {
    let status = Command::new(invocation.program)
        .args(&invocation.args)
        .status()
        .with_context(|| format!("failed to launch {}", invocation.program))?;
    Ok(status.code().unwrap_or(1))
}

fn run_default() -> Result<i32> {
    let fmt_code = run(&fmt_invocation())?;
    if fmt_code != 0 {
        return Ok(fmt_code);
    }
    run(&test_invocation(&[]))
}

fn is_coverage_artifact(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.ends_with(".profraw") || name == "lcov.info",
        None => false,
    }
}

fn sweep_coverage_artifacts(root: &Path) -> Result<usize> {
    let mut removed = 0;
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");
    for entry in walker.filter_map(|e| e.ok()) {
        if entry.file_type().is_file() && is_coverage_artifact(entry.path()) {
            std::fs::remove_file(entry.path())
                .with_context(|| format!("failed to remove {}", entry.path().display()))?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn clean() -> Result<i32> {
    let code = run(&cargo_clean_invocation())?;
    if code != 0 {
        return Ok(code);
    }
    let removed = sweep_coverage_artifacts(Path::new("."))?;
    println!("🧹 Removed {} coverage artifact(s)", removed);
    Ok(0)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let code = match args.task {
        None => run_default()?,
        Some(Task::Fmt) => run(&fmt_invocation())?,
        Some(Task::Test { args }) => run(&test_invocation(&args))?,
        Some(Task::Coverage) => run(&coverage_invocation())?,
        Some(Task::Clean) => clean()?,
        Some(Task::Help) => {
            print!("{}", HELP_TEXT);
            0
        }
        Some(Task::Selector(args)) => run(&test_invocation(&args))?,
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

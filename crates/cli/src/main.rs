//! spawnwatch CLI - run commands under a TaskSupervisor and inspect helper availability

mod logging;
mod settings;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tabled::{Table, Tabled};
use tracing::debug;

use spawnwatch_core::application::{
    CapabilityCache, CapabilitySnapshot, PollPolicy, Settings, SupervisedProbe, TaskSupervisor,
};
use spawnwatch_core::domain::{TaskOutput, Work, SENTINEL_STATUS};
use spawnwatch_infra_system::SystemLauncher;

/// Exit code reported when the command never ran (shell convention for "not found")
const NOT_RUN_EXIT_CODE: i32 = 127;

#[derive(Parser)]
#[command(name = "spawnwatch")]
#[command(about = "Run helper commands without blocking and probe which helpers exist", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML)
    #[arg(long, env = "SPAWNWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log launched commands and debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a shell command and exit with its status
    Run {
        /// Command line, passed to the platform shell
        command: String,

        /// Print output as it is captured instead of at the end
        #[arg(long)]
        stream: bool,

        /// Fail instead of exiting 127 when the command cannot be launched
        #[arg(long)]
        strict: bool,
    },

    /// Probe the configured helpers and show which are available
    Probe {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Tabled)]
struct HelperRow {
    priority: usize,
    helper: String,
    available: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    let mut settings = settings::load_settings(cli.config.as_deref())?;
    settings.verbose |= cli.verbose;
    debug!(?settings, "spawnwatch v{} starting", spawnwatch_core::VERSION);

    match cli.command {
        Commands::Run {
            command,
            stream,
            strict,
        } => {
            let code = run_command(&settings, &command, stream, strict).await?;
            std::process::exit(code);
        }
        Commands::Probe { json } => {
            let snapshot = tokio::task::spawn_blocking(move || scan(&settings))
                .await
                .context("Probe task failed")?;
            print_snapshot(&snapshot, json)
        }
    }
}

/// Supervise `line` to completion and return the process exit code to use
async fn run_command(settings: &Settings, line: &str, stream: bool, strict: bool) -> Result<i32> {
    let mut task = TaskSupervisor::new(Arc::new(SystemLauncher::new()))
        .with_policy(PollPolicy::from_settings(settings))
        .verbose(settings.verbose);

    let started = task.start(Work::command(line));
    if strict {
        started.with_context(|| format!("Failed to launch `{line}`"))?;
    }

    let output = if stream {
        stream_output(&mut task).await?
    } else {
        let output = task.wait_async().await;
        let mut stdout = std::io::stdout();
        stdout.write_all(output.output.as_bytes())?;
        stdout.flush()?;
        output
    };

    Ok(exit_code(&output))
}

/// Poll with the configured ready bound, echoing newly captured bytes as they arrive
///
/// A zero bound makes every attempt non-blocking; the poll interval is then slept out
/// between attempts that captured nothing.
async fn stream_output(task: &mut TaskSupervisor) -> Result<TaskOutput> {
    let policy = task.policy();
    let mut stdout = std::io::stdout();
    let mut printed = 0;

    loop {
        let done = task.ready(policy.ready_timeout);

        let captured = task.captured();
        let fresh = captured.len() > printed;
        if fresh {
            stdout.write_all(&captured[printed..])?;
            stdout.flush()?;
            printed = captured.len();
        }

        if done {
            break;
        }
        if !fresh && policy.ready_timeout.is_zero() {
            tokio::time::sleep(policy.poll_interval).await;
        }
    }

    Ok(task.result())
}

fn exit_code(output: &TaskOutput) -> i32 {
    if output.status == SENTINEL_STATUS {
        NOT_RUN_EXIT_CODE
    } else {
        output.status
    }
}

fn scan(settings: &Settings) -> Arc<CapabilitySnapshot> {
    let probe = SupervisedProbe::new(Arc::new(SystemLauncher::new()))
        .with_policy(PollPolicy::from_settings(settings));
    CapabilityCache::new(Arc::new(probe), settings.helpers.clone())
        .with_policy(settings.scan_policy)
        .snapshot()
}

fn print_snapshot(snapshot: &CapabilitySnapshot, json: bool) -> Result<()> {
    if json {
        let available: BTreeMap<&str, bool> =
            snapshot.iter().map(|(h, present)| (h.program(), present)).collect();
        let body = serde_json::json!({
            "available": available,
            "preferred": snapshot.preferred().map(|h| h.program()),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let rows: Vec<HelperRow> = snapshot
        .iter()
        .enumerate()
        .map(|(i, (helper, present))| HelperRow {
            priority: i + 1,
            helper: helper.program().to_string(),
            available: if present {
                "yes".green().to_string()
            } else {
                "no".red().to_string()
            },
        })
        .collect();

    println!("{}", Table::new(rows));
    match snapshot.preferred() {
        Some(helper) => println!("Preferred helper: {}", helper.program().bold()),
        None => println!("{}", "No helper available".yellow()),
    }
    Ok(())
}

//! autochain - unattended phase chaining for coding-assistant sessions
//!
//! `autochain stop` is registered as the host's Stop hook. The other
//! subcommands inspect and steer the same on-disk state by hand.

use autochain::config::{
    DEFAULT_GAP_CLOSURE_LIMIT, DEFAULT_INPUT_TIMEOUT_MS, DEFAULT_TAIL_LINES,
};
use autochain::transcript::state_phase;
use autochain::{
    read_hook_input, run_stop_hook, write_hook_output, AutochainError, EngineMode, EngineOptions,
    FsWorkflowStore, InvocationContext, ProjectConfig, SignalCommand, WorkflowStore,
};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "autochain")]
#[command(version)]
#[command(about = "Unattended plan/execute phase chaining for coding-assistant sessions", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory (defaults to the session cwd reported by the host, then the current directory)
    #[arg(short, long, global = true, env = "AUTOCHAIN_PROJECT_DIR")]
    project: Option<PathBuf>,

    /// Verbose output (logged to stderr)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stop hook: read the host context from stdin and print a continuation decision
    Stop {
        /// Where to look for the next step: signal, transcript, or auto
        #[arg(long, value_enum, default_value = "signal", env = "AUTOCHAIN_MODE")]
        mode: EngineMode,

        /// Give up waiting for hook input after this many milliseconds
        #[arg(
            long,
            default_value_t = DEFAULT_INPUT_TIMEOUT_MS,
            value_name = "MS",
            env = "AUTOCHAIN_INPUT_TIMEOUT_MS"
        )]
        input_timeout_ms: u64,

        /// Act on a pending signal even when the host reports a re-entrant stop
        #[arg(long, env = "AUTOCHAIN_ALLOW_REENTRY")]
        allow_reentry: bool,

        /// Gap-closure plans allowed per phase before stopping for review
        #[arg(long, default_value_t = DEFAULT_GAP_CLOSURE_LIMIT)]
        gap_limit: usize,

        /// Transcript lines inspected in transcript mode
        #[arg(long, default_value_t = DEFAULT_TAIL_LINES)]
        tail_lines: usize,
    },

    /// Queue the next command for the stop hook (e.g. `signal plan-phase 4 --gaps`)
    Signal {
        /// Command words
        #[arg(
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        command: Vec<String>,
    },

    /// Show auto mode, the pending signal, and phase progress
    Status {
        /// Phase to inspect (defaults to the phase in STATE.md)
        #[arg(long)]
        phase: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Turn auto mode on or off in .planning/config.json
    Auto {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        project,
        verbose,
        command,
    } = Cli::parse();

    // stdout carries the hook protocol, so logs go to stderr
    let filter = if verbose {
        "autochain=debug,info"
    } else {
        "autochain=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Stop {
            mode,
            input_timeout_ms,
            allow_reentry,
            gap_limit,
            tail_lines,
        } => {
            let options = EngineOptions {
                mode,
                allow_reentry,
                gap_closure_limit: gap_limit,
                tail_lines,
            };
            run_stop(project, options, Duration::from_millis(input_timeout_ms)).await;
        }

        Commands::Signal { command } => {
            let project_path = resolve_project(project);
            let store = FsWorkflowStore::new(&project_path);
            let raw = command.join(" ");

            if let Err(e) = store.write_signal(&raw) {
                fail(&e);
            }

            let queued = SignalCommand::parse(&raw)
                .map(|c| c.command())
                .unwrap_or(raw);
            println!("{} Queued {}", "OK".green().bold(), queued.cyan());
        }

        Commands::Status { phase, json } => {
            let project_path = resolve_project(project);
            show_status(&project_path, phase, json)?;
        }

        Commands::Auto { state } => {
            let project_path = resolve_project(project);
            let store = FsWorkflowStore::new(&project_path);
            let enabled = matches!(state, Toggle::On);

            match ProjectConfig::set_auto_mode(store.paths(), enabled) {
                Ok(_) if enabled => println!("{} Auto mode enabled", "OK".green().bold()),
                Ok(_) => println!("{} Auto mode disabled", "OK".green().bold()),
                Err(e) => fail(&e),
            }
        }
    }

    Ok(())
}

/// The hook never fails the host: every problem ends in a silent exit 0.
async fn run_stop(project: Option<PathBuf>, options: EngineOptions, timeout: Duration) {
    let input = match read_hook_input(tokio::io::stdin(), timeout).await {
        Ok(input) => input,
        Err(e) => {
            debug!("Giving up on hook input: {}", e);
            // The blocking stdin reader may still be parked; do not wait for it.
            std::process::exit(0);
        }
    };

    let ctx = match InvocationContext::parse(&input) {
        Ok(Some(ctx)) => ctx,
        Ok(None) => {
            debug!("Empty hook input");
            return;
        }
        Err(e) => {
            debug!("Ignoring hook input: {}", e);
            return;
        }
    };

    let project_dir = project
        .or_else(|| ctx.cwd.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let store = FsWorkflowStore::new(&project_dir);

    if let Some(output) = run_stop_hook(store, options, &ctx) {
        if let Err(e) = write_hook_output(std::io::stdout().lock(), &output) {
            warn!("Could not write hook output: {}", e);
        }
    }
}

fn resolve_project(project: Option<PathBuf>) -> PathBuf {
    let project = project.unwrap_or_else(|| PathBuf::from("."));
    let project_path = project.canonicalize().unwrap_or(project);

    if !project_path.exists() {
        eprintln!(
            "{} Project directory does not exist: {}",
            "Error:".red().bold(),
            project_path.display()
        );
        std::process::exit(1);
    }
    project_path
}

fn fail(e: &AutochainError) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), e);
    std::process::exit(e.exit_code());
}

fn show_status(project_path: &Path, phase: Option<u32>, json: bool) -> anyhow::Result<()> {
    let store = FsWorkflowStore::new(project_path);

    let (auto_mode, config_note) = match store.load_config() {
        Ok(Some(config)) => (config.is_auto_mode(), None),
        Ok(None) => (false, Some("config.json not found".to_string())),
        Err(e) => (false, Some(e.to_string())),
    };

    let pending = store
        .peek_signal()
        .ok()
        .flatten()
        .and_then(|raw| SignalCommand::parse(&raw))
        .map(|c| c.command());

    let state = store.read_state().ok().flatten();
    let phase = phase.or_else(|| state.as_deref().and_then(state_phase));
    let artifacts = match phase {
        Some(p) => store.phase_artifacts(p)?,
        None => None,
    };

    if json {
        let status = serde_json::json!({
            "project": project_path,
            "auto_mode": auto_mode,
            "config_note": config_note,
            "pending_signal": pending,
            "phase": phase,
            "artifacts": artifacts,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("\n{} Auto-Mode Status", "Status:".cyan().bold());
    println!("{}", "─".repeat(40));
    println!("   Project:      {}", project_path.display());

    let mode = if auto_mode {
        "on".green().bold()
    } else {
        "off".yellow().bold()
    };
    match config_note {
        Some(note) => println!("   Auto mode:    {} ({})", mode, note.dimmed()),
        None => println!("   Auto mode:    {}", mode),
    }

    match pending {
        Some(command) => println!("   Next signal:  {}", command.cyan()),
        None => println!("   Next signal:  {}", "none".dimmed()),
    }

    match (phase, artifacts) {
        (Some(p), Some(a)) => {
            println!("   Phase {}:      {}", p, a.dir.display());
            println!("      Plans:         {}", a.plans);
            println!("      Summaries:     {}", a.summaries);
            println!(
                "      Gap closures:  {} / {}",
                a.gap_closure_plans, DEFAULT_GAP_CLOSURE_LIMIT
            );
        }
        (Some(p), None) => println!("   Phase {}:      {}", p, "no directory".dimmed()),
        (None, _) => println!("   Phase:        {}", "unknown".dimmed()),
    }

    Ok(())
}

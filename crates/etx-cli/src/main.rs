mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use etx_core::config::Config;

/// edit-tx CLI — transactional file modifications for agent-driven edits.
#[derive(Parser)]
#[command(name = "etx", version, about)]
struct Cli {
    /// Project root (defaults to the current directory).
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a hook adapter: one JSON event on stdin, one JSON response on stdout.
    Hook {
        #[command(subcommand)]
        phase: HookPhase,
    },

    /// Start a transaction explicitly.
    Begin {
        /// Free-text description of the unit of work.
        #[arg(short, long, default_value = "Manual transaction")]
        message: String,
    },

    /// Accept all tracked modifications and end the transaction.
    Commit,

    /// Undo tracked modifications: the whole transaction, or back to a
    /// savepoint with --to.
    Rollback {
        /// Savepoint id or name to roll back to (transaction stays active).
        #[arg(long)]
        to: Option<String>,
    },

    /// Create a savepoint in the active transaction.
    Savepoint {
        /// Display name (auto-generated when omitted).
        name: Option<String>,
    },

    /// Show the persisted transaction state.
    Status,
}

#[derive(Subcommand)]
enum HookPhase {
    /// "About to modify a file" — capture a backup before the tool runs.
    Pre,
    /// "Modification finished" — record the outcome, maybe advise.
    Post,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let project = match cli.project {
        Some(p) => p,
        None => std::env::current_dir()?,
    };

    let level = Config::load(&project)
        .map(|cfg| cfg.logging.level)
        .unwrap_or_else(|_| "info".to_string());
    logging::init(&level);

    match cli.command {
        Commands::Hook { phase } => match phase {
            HookPhase::Pre => commands::hook::run_pre(),
            HookPhase::Post => commands::hook::run_post(),
        },
        Commands::Begin { message } => commands::begin::run(&project, &message),
        Commands::Commit => commands::commit::run(&project),
        Commands::Rollback { to } => commands::rollback::run(&project, to.as_deref()),
        Commands::Savepoint { name } => commands::savepoint::run(&project, name.as_deref()),
        Commands::Status => commands::status::run(&project),
    }
}

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Command-line interface for stashmark: save and recover tagged stash
//! entries, and report tutorial progress, via the libstashmark crate.

use std::{
    env,
    io::{self, IsTerminal, Write},
    path::PathBuf,
    process,
    sync::Arc,
};

use anyhow::{Context as _, Result};
use clap::{ArgGroup, Parser, Subcommand};
use libstashmark::{Git, StashmarkError, find_root};
use tracing_subscriber::EnvFilter;

/// Command implementations.
mod commands;
/// `EditorResolver` backed by environment variables.
mod editor;
/// Terminal output abstractions and implementations.
mod output;
/// Repository snapshot assembled from git queries.
mod snapshot;

use commands::Context;
use output::{Output, Quiet, Terminal};

/// Default directory for persisted stashmark state.
const DEFAULT_STATE_DIR: &str = "~/.stashmark";

/// Environment variable overriding the state directory.
const STATE_DIR_ENV_VAR: &str = "STASHMARK_DIR";

/// Environment variable holding the log filter.
const LOG_ENV_VAR: &str = "STASHMARK_LOG";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("color_mode")
        .args(["color", "no_color"])
))]
/// Top-level CLI options for stashmark.
struct Cli {
    /// Override the state directory location
    #[arg(long, global = true, value_name = "DIR")]
    dir: Option<String>,

    /// Override the repository directory (defaults to current git project)
    #[arg(long, global = true, value_name = "DIR")]
    repo_dir: Option<String>,

    /// Enable colored output
    #[arg(long, global = true)]
    color: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    /// Suppress all output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    /// The primary command to execute.
    command: Commands,
}

#[derive(Subcommand)]
/// CLI subcommands supported by stashmark.
enum Commands {
    /// Show stash entries created by stashmark
    #[command(alias = "ls")]
    List,

    /// Stash working directory changes under a stashmark marker
    Save {
        /// Branch to record (defaults to the checked-out branch)
        #[arg(long)]
        branch: Option<String>,
    },

    /// Pop the most recent stashmark entry for a branch
    Restore {
        /// Branch to restore (defaults to the checked-out branch)
        #[arg(long)]
        branch: Option<String>,
    },

    /// Apply and remove a stash entry by its commit id
    Pop {
        /// Full commit id of the stash entry
        sha: String,
    },

    /// Delete a stash entry by its commit id
    #[command(alias = "rm")]
    Drop {
        /// Full commit id of the stash entry
        sha: String,
    },

    /// Tutorial progress
    Onboarding {
        #[command(subcommand)]
        /// The onboarding action to run.
        command: OnboardingCommand,
    },
}

#[derive(Subcommand)]
/// Onboarding subcommands.
enum OnboardingCommand {
    /// Print the current tutorial step
    Status,
    /// Skip the editor installation step
    SkipEditor,
    /// Skip the pull request step
    SkipPr,
}

/// Expand a leading `~` in a filesystem path using the `HOME` environment variable.
fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~")
        && let Ok(home) = env::var("HOME")
    {
        return PathBuf::from(path.replacen("~", &home, 1));
    }
    PathBuf::from(path)
}

/// Install the stderr log subscriber, filtered by `$STASHMARK_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Determine color output preference early for error handling
    let color = if cli.color {
        true
    } else if cli.no_color {
        false
    } else {
        io::stdout().is_terminal()
    };

    let output: Arc<dyn Output> = if cli.quiet {
        Arc::new(Quiet)
    } else {
        Arc::new(Terminal::new(color))
    };

    if let Err(e) = run(cli, &output).await {
        // Reset any existing colors only if color was enabled and stdout is a TTY
        if color && io::stdout().is_terminal() {
            print!("\x1b[0m");
            if let Err(flush_err) = io::stdout().flush() {
                eprintln!("Failed to flush stdout while resetting colors: {flush_err}");
            }
        }

        if let Err(display_err) = output.fail(&format!("{e:#}")) {
            eprintln!("Failed to report error via output handler: {display_err:#}");
        }
        if let Err(finish_err) = output.finish() {
            eprintln!("Failed to flush output handler: {finish_err:#}");
        }

        let exit_code = e
            .downcast_ref::<StashmarkError>()
            .map_or(1, StashmarkError::exit_code);
        process::exit(exit_code);
    }
    Ok(())
}

/// Execute the selected CLI command using the provided output implementation.
async fn run(cli: Cli, output: &Arc<dyn Output>) -> Result<()> {
    // Priority: CLI flag > env var > default
    let state_dir = if let Some(dir) = &cli.dir {
        expand_tilde(dir)
    } else if let Ok(env_dir) = env::var(STATE_DIR_ENV_VAR) {
        expand_tilde(&env_dir)
    } else {
        expand_tilde(DEFAULT_STATE_DIR)
    };

    let repo_path = match &cli.repo_dir {
        Some(repo) => expand_tilde(repo),
        None => {
            let cwd = env::current_dir().context("Failed to read current directory")?;
            find_root(&cwd).ok_or_else(|| {
                StashmarkError::ContextError("Not inside a git repository".to_string())
            })?
        }
    };

    let ctx = Context {
        git: Git::from_env()?,
        repo_path,
        state_dir,
    };
    let output = output.as_ref();

    match cli.command {
        Commands::List => commands::list::list(&ctx, output)?,
        Commands::Save { branch } => commands::stash::save(&ctx, output, branch)?,
        Commands::Restore { branch } => commands::stash::restore(&ctx, output, branch)?,
        Commands::Pop { sha } => commands::stash::pop_entry(&ctx, output, &sha)?,
        Commands::Drop { sha } => commands::stash::drop_entry(&ctx, output, &sha)?,
        Commands::Onboarding { command } => match command {
            OnboardingCommand::Status => commands::onboarding::status(&ctx, output).await?,
            OnboardingCommand::SkipEditor => commands::onboarding::skip_editor(&ctx, output)?,
            OnboardingCommand::SkipPr => commands::onboarding::skip_pr(&ctx, output)?,
        },
    }

    output.finish()?;
    Ok(())
}

//! Anvil CLI - Command-line interface for the Anvil workspace toolkit
//!
//! This CLI provides an `anvil` command for attaching compute, browsing
//! tracked experiments, and logging and serving model bundles from the
//! local registry.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Anvil CLI - workspace tooling for compute, tracking, and model bundles.
#[derive(Parser, Debug)]
#[command(
    name = "anvil",
    author,
    version,
    about = "Anvil - ML workspace compute, tracking, and model-bundle tooling"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Workspace directory (overrides ANVIL_WORKSPACE)
    #[arg(short = 'w', long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage workspace compute attachments
    Compute {
        #[command(subcommand)]
        command: ComputeCommand,
    },

    /// Browse tracked experiments and runs
    Experiments {
        #[command(subcommand)]
        command: ExperimentsCommand,
    },

    /// Log, inspect, and serve model bundles from the local registry
    Models {
        #[command(subcommand)]
        command: ModelsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ComputeCommand {
    /// Attach a managed Spark pool via create-or-update
    Attach {
        /// Name to register the compute under
        name: String,

        /// Full resource id of the external Spark pool
        #[arg(long)]
        resource_id: String,

        /// Attach with a system-assigned identity
        #[arg(long, conflicts_with = "identity_client_id")]
        system_identity: bool,

        /// Attach with a user-assigned identity by client id
        #[arg(long)]
        identity_client_id: Option<String>,
    },

    /// Detach a compute, leaving the underlying pool in place
    Detach {
        /// Registered compute name
        name: String,
    },

    /// Show a compute registration
    Show {
        /// Registered compute name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExperimentsCommand {
    /// List every experiment in the workspace
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one experiment, optionally with its runs
    Show {
        /// Experiment id
        experiment_id: String,

        /// Also list the experiment's runs
        #[arg(long)]
        runs: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Log a model bundle into the local registry
    Log {
        /// Model name to log under
        name: String,

        /// Flavor id for an embedded adapter (e.g. linear, lookup)
        #[arg(long, conflicts_with = "loader")]
        flavor: Option<String>,

        /// Path to the serialized adapter state (JSON), for --flavor
        #[arg(long, requires = "flavor")]
        state: Option<PathBuf>,

        /// Loader id for a deferred entry point
        #[arg(long)]
        loader: Option<String>,

        /// Logical artifact name handed to the deferred loader
        #[arg(long, requires = "loader")]
        loader_artifact: Option<String>,

        /// Auxiliary file to stage, as name=path (repeatable)
        #[arg(long = "artifact", value_name = "NAME=PATH")]
        artifacts: Vec<String>,

        /// Companion source file to stage (repeatable)
        #[arg(long = "source", value_name = "PATH")]
        sources: Vec<PathBuf>,

        /// Path to a signature declaration (JSON)
        #[arg(long)]
        signature: Option<PathBuf>,
    },

    /// List logged models and versions
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a logged bundle's manifest
    Show {
        /// Model name
        name: String,

        /// Version (defaults to latest)
        #[arg(long)]
        version: Option<u32>,
    },

    /// Load a bundle and run inference over a JSON frame
    Predict {
        /// Model name
        name: String,

        /// Version (defaults to latest)
        #[arg(long)]
        version: Option<u32>,

        /// Path to the input frame (JSON: {"columns": [...], "rows": [[...]]})
        #[arg(long)]
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-hash a bundle's artifacts against its manifest
    Verify {
        /// Model name
        name: String,

        /// Version (defaults to latest)
        #[arg(long)]
        version: Option<u32>,
    },
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let level = match log_level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber =
        FmtSubscriber::builder().with_max_level(level).without_time().with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn resolve_workspace(arg: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = arg {
        return Ok(path);
    }
    if let Ok(path) = std::env::var("ANVIL_WORKSPACE") {
        return Ok(PathBuf::from(path));
    }
    Ok(std::env::current_dir()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let workspace_root = resolve_workspace(args.workspace)?;
    let config = config::Config::load(&workspace_root)?;

    match args.command {
        Command::Compute { command } => commands::compute::execute(command, &config).await,
        Command::Experiments { command } => {
            commands::experiments::execute(command, &config).await
        }
        Command::Models { command } => commands::models::execute(command, &workspace_root),
    }
}

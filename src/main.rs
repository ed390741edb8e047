use anyhow::Context;
use clap::{Parser, Subcommand};
use git_fleet::commands::*;
use git_fleet::core::{
    constants::CONFIG_PATH_ENV, dirs::default_config_path, error::FleetError, print_error,
    workspace::Workspace, WorkspaceOptions,
};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "git-fleet")]
#[command(about = "Keep track of many git repositories at once")]
#[command(version = "0.1.0")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh and show the status of every active repository
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show protected branches some repositories could switch to
    Branches {
        #[arg(long)]
        json: bool,
    },
    /// Switch every repository that has a protected branch to it
    Checkout {
        branch: String,
    },
    /// Start tracking repositories
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Stop tracking repositories
    Remove {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List tracked repositories without refreshing them
    List {
        #[arg(long)]
        json: bool,
    },
    /// Watch repositories and print status changes as they happen
    Watch,
    /// Manage workspace groups
    Workspace {
        #[command(subcommand)]
        action: WorkspaceAction,
    },
}

#[derive(Subcommand)]
enum WorkspaceAction {
    /// Create an empty workspace group
    Create { name: String },
    /// Select a workspace group; omit the name to select all repositories
    Select { name: Option<String> },
    /// Add a tracked repository to a workspace group
    Assign { name: String, path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Configure logging based on --debug flag
    if cli.debug {
        env::set_var("RUST_LOG", "debug");
    } else if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    if let Err(e) = runtime.block_on(run(cli)) {
        match e.downcast_ref::<FleetError>() {
            Some(FleetError::GitExecutableUnresolved) => {
                print_error("git was not found. Install git or set git.executable_path in the config file")
            }
            _ => print_error(&format!("{e:#}")),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let workspace = Workspace::open(&config_path, WorkspaceOptions::default()).await;
    if let Some(error) = workspace.config().load_error() {
        log::warn!("Using default configuration: {error}");
    }

    match cli.command {
        Commands::Status { json } => execute_status(&workspace, json).await?,
        Commands::Branches { json } => execute_branches(&workspace, json).await?,
        Commands::Checkout { branch } => {
            let failed = execute_checkout(&workspace, &branch).await?;
            if failed > 0 {
                anyhow::bail!("checkout of '{branch}' failed in {failed} repositories");
            }
        }
        Commands::Add { paths } => execute_add(&workspace, &paths).await?,
        Commands::Remove { paths } => execute_remove(&workspace, &paths).await?,
        Commands::List { json } => execute_list(&workspace, json)?,
        Commands::Watch => execute_watch(&workspace).await?,
        Commands::Workspace { action } => match action {
            WorkspaceAction::Create { name } => execute_group_create(&workspace, &name).await?,
            WorkspaceAction::Select { name } => {
                execute_group_select(&workspace, name.as_deref()).await?
            }
            WorkspaceAction::Assign { name, path } => {
                execute_group_assign(&workspace, &name, &path).await?
            }
        },
    }
    Ok(())
}

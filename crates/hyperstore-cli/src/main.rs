//! Hyperstore CLI - Load and query typed property hypergraphs

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{config as config_cmd, load, query, status};
use hyperstore_core::ErrorKind;
use hyperstore_storage::{HypergraphStore, StorageError, StoreConfig};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "hyperstore")]
#[command(author, version, about = "Typed property hypergraph store")]
pub struct Cli {
    /// Database file (overrides the config file)
    #[arg(long, global = true, env = "HYPERSTORE_DB")]
    pub db: Option<PathBuf>,

    /// Configuration file (default: ./hyperstore.toml, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Open the store read-only
    #[arg(long, global = true)]
    pub read_only: bool,

    /// Output format: table, json
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from(self.format.as_str())
    }

    /// Store settings from the config file with command line overrides
    pub fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let (config, source) = config::Config::load(self.config.as_deref())?;
        if let Some(source) = source {
            tracing::debug!("Using config file {}", source.display());
        }
        let mut store = config.store;
        if let Some(db) = &self.db {
            store.path = db.clone();
        }
        if self.read_only {
            store.read_only = true;
        }
        Ok(store)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create (or upgrade) the database
    Init,
    /// Show store statistics
    Status,
    /// Register type metadata or upload hypergraph data
    Load(load::LoadArgs),
    /// Query stored hypergraphs
    Query(query::QueryArgs),
    /// Show configuration
    Config(config_cmd::ConfigArgs),
}

/// Application context with the opened store
pub struct AppContext {
    pub store: Arc<HypergraphStore>,
    pub store_config: StoreConfig,
}

impl AppContext {
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let store_config = cli.store_config()?;
        if !store_config.read_only {
            if let Some(parent) = store_config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }
        tracing::debug!("Using database at: {:?}", store_config.path);

        let store = HypergraphStore::open_with(&store_config)?;
        Ok(Self {
            store: Arc::new(store),
            store_config,
        })
    }
}

/// Process exit status for a failed command
fn exit_code(error: &anyhow::Error) -> u8 {
    let kind = error
        .downcast_ref::<StorageError>()
        .map(StorageError::kind)
        .or_else(|| error.downcast_ref::<hyperstore_core::Error>().map(|e| e.kind()));
    match kind {
        Some(ErrorKind::Configuration) => 2,
        Some(ErrorKind::Data) => 3,
        Some(ErrorKind::Request) => 4,
        Some(ErrorKind::Cancelled) => 130,
        Some(ErrorKind::Internal) | None => 1,
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Commands::Config(args) = &cli.command {
        return config_cmd::run(args, cli);
    }

    let ctx = AppContext::new(cli)?;
    match &cli.command {
        Commands::Init => status::run_init(cli, &ctx)?,
        Commands::Status => status::run(cli, &ctx)?,
        Commands::Load(args) => load::run(args, cli, &ctx).await?,
        Commands::Query(args) => query::run(args, cli, &ctx)?,
        Commands::Config(_) => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting hyperstore CLI");

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_error_kind() {
        let config: anyhow::Error = hyperstore_core::Error::Config("bad".into()).into();
        assert_eq!(exit_code(&config), 2);

        let cancelled: anyhow::Error = StorageError::Cancelled.into();
        assert_eq!(exit_code(&cancelled), 130);

        let read_only: anyhow::Error = StorageError::ReadOnly("upload".into()).into();
        assert_eq!(exit_code(&read_only), 4);

        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

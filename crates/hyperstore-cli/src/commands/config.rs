//! Config command for inspecting CLI configuration

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::config::{user_config_path, Config, CONFIG_FILE};
use crate::Cli;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective store settings as TOML
    Show,
    /// Show which config file is used
    Path,
    /// Write a default config file (to --config, or ./hyperstore.toml)
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: &ConfigArgs, cli: &Cli) -> anyhow::Result<()> {
    match &args.command {
        ConfigCommands::Show => run_show(cli),
        ConfigCommands::Path => run_path(cli),
        ConfigCommands::Init { force } => run_init(cli, *force),
    }
}

fn run_show(cli: &Cli) -> anyhow::Result<()> {
    let config = Config {
        store: cli.store_config()?,
    };
    print!("{}", config.to_toml()?);
    Ok(())
}

fn run_path(cli: &Cli) -> anyhow::Result<()> {
    match Config::load(cli.config.as_deref())? {
        (_, Some(path)) => println!("{}", path.display()),
        (_, None) => {
            println!("No config file found, using defaults");
            println!("Looked for: {}", CONFIG_FILE);
            if let Some(user) = user_config_path() {
                println!("            {}", user.display());
            }
        }
    }
    Ok(())
}

fn run_init(cli: &Cli, force: bool) -> anyhow::Result<()> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    std::fs::write(&path, Config::default().to_toml()?)?;
    println!("Created config file at {}", path.display());
    Ok(())
}

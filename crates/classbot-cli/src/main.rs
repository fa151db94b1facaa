mod cmd;
mod output;

use clap::{Parser, Subcommand};
use classbot_core::config::DEFAULT_CONFIG_FILE;
use cmd::{classes::ClassesSubcommand, config::ConfigSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "classbot",
    about = "Discord bot that keeps class channels and roles in sync with a managed-class ledger",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file
    #[arg(long, global = true, env = "CLASSBOT_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the guild and serve chat commands until interrupted
    Run {
        /// Bot token
        #[arg(long, env = "CLASSBOT_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Inspect or edit the managed-class ledger without connecting
    Classes {
        #[command(subcommand)]
        subcommand: ClassesSubcommand,
    },

    /// Show what reconciliation would create, without changing anything
    Plan {
        /// Bot token
        #[arg(long, env = "CLASSBOT_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Check the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run { token } => cmd::run::run(&cli.config, &token),
        Commands::Classes { subcommand } => cmd::classes::run(&cli.config, subcommand, cli.json),
        Commands::Plan { token } => cmd::plan::run(&cli.config, &token, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&cli.config, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

//! PortWatch CLI - Watch listening ports and reclaim inactive ones
//!
//! A command-line tool for running the periodic scanner, taking one-off
//! snapshots, closing ports and editing the configuration.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use commands::Paths;

#[derive(Parser)]
#[command(name = "portwatch")]
#[command(author, version, about = "Watch listening ports and reclaim inactive ones")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output (and logs) in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file [default: ~/.portwatch/config.json]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Snapshot directory [default: ~/.portwatch/logs]
    #[arg(long, global = true, value_name = "DIR")]
    logs: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan periodically until interrupted
    Run,

    /// Run a single scan cycle and print the snapshot
    Scan,

    /// Terminate the process bound to a port
    Close {
        /// Port number to close
        port: u16,
    },

    /// Show or edit the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Change scan settings
    Set {
        /// Seconds between scan cycles
        #[arg(long)]
        period: Option<u64>,
        /// Consecutive scans before a port counts as inactive
        #[arg(long)]
        threshold: Option<u32>,
        /// Enable or disable alert notifications
        #[arg(long, value_enum)]
        alerts: Option<Toggle>,
    },
    /// Manage whitelisted ports
    #[command(alias = "wl")]
    Whitelist {
        #[command(subcommand)]
        action: WhitelistAction,
    },
}

#[derive(Subcommand)]
enum WhitelistAction {
    /// Add a port to the whitelist
    Add { port: u16 },
    /// Remove a port from the whitelist
    #[command(alias = "rm")]
    Remove { port: u16 },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json);

    let paths = Paths {
        config: cli.config,
        logs: cli.logs,
    };

    match cli.command {
        Commands::Run => commands::run::run(&paths).await?,
        Commands::Scan => commands::scan::run(&paths, cli.json).await?,
        Commands::Close { port } => commands::close::run(&paths, port).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&paths, cli.json).await?,
            ConfigAction::Set {
                period,
                threshold,
                alerts,
            } => {
                let alerts = alerts.map(|t| matches!(t, Toggle::On));
                commands::config::set(&paths, period, threshold, alerts, cli.json).await?
            }
            ConfigAction::Whitelist { action } => match action {
                WhitelistAction::Add { port } => {
                    commands::config::whitelist_add(&paths, port, cli.json).await?
                }
                WhitelistAction::Remove { port } => {
                    commands::config::whitelist_remove(&paths, port, cli.json).await?
                }
            },
        },
    }

    Ok(())
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

//! ospd-keyscan CLI - Collect SSH host keys with ssh-keyscan
//!
//! A command-line front-end for the scan adapter: scan hosts, check
//! the tool, describe the scanner and manage stored defaults.

mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ospd-keyscan")]
#[command(author, version, about = "Collect SSH host keys with ssh-keyscan")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan hosts for their public SSH keys
    Scan(commands::scan::ScanArgs),

    /// Check that ssh-keyscan can be found and started
    Check {
        /// Path to the ssh-keyscan binary
        #[arg(long)]
        tool: Option<PathBuf>,
    },

    /// Show scanner information and accepted parameters
    Info,

    /// Show or change stored configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the stored configuration
    Show,
    /// Change one setting
    Set {
        /// Setting name, e.g. timeoutSecs
        key: String,
        /// New value
        value: String,
    },
    /// Restore the defaults
    Reset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Scan(args) => {
            let failed = commands::scan::run(args, cli.json).await?;
            if failed > 0 {
                std::process::exit(1);
            }
        }
        Commands::Check { tool } => {
            commands::check::run(tool, cli.json).await?;
        }
        Commands::Info => {
            commands::info::run(cli.json)?;
        }
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config::show(cli.json).await?,
            ConfigAction::Set { key, value } => commands::config::set(&key, &value).await?,
            ConfigAction::Reset => commands::config::reset().await?,
        },
    }

    Ok(())
}

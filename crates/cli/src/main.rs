//! Screw Classification CLI
//!
//! A command-line client for the classification server: one-shot
//! predictions, service status, and an interactive session.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::predict::{CustomArgs, TorqueArgs};
use commands::{health, interactive, predict};

/// Screw Classification CLI
#[derive(Parser)]
#[command(name = "screwctl")]
#[command(author, version, about = "CLI for the Screw Classification service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via SCREW_API_URL env var or the config file)
    #[arg(long, env = "SCREW_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify one tightening run
    #[command(subcommand)]
    Predict(PredictCommands),

    /// Show server health and readiness
    Health,

    /// List the available prediction modes
    Modes,

    /// Start an interactive classification session
    Interactive,
}

#[derive(Subcommand)]
pub enum PredictCommands {
    /// Classify from the torque curve alone
    Torque(TorqueArgs),

    /// Classify from any selection of series and metadata
    Custom(CustomArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let api_url = config::Config::load()?.resolve_api_url(cli.api_url);
    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Predict(predict_cmd) => match predict_cmd {
            PredictCommands::Torque(args) => {
                predict::predict_torque(&client, &args, cli.format).await?;
            }
            PredictCommands::Custom(args) => {
                predict::predict_custom(&client, &args, cli.format).await?;
            }
        },
        Commands::Health => {
            health::show_health(&client, cli.format).await?;
        }
        Commands::Modes => {
            health::show_modes(&client, cli.format).await?;
        }
        Commands::Interactive => {
            interactive::run(&client, cli.format).await?;
        }
    }

    Ok(())
}

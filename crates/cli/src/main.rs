//! `taguato` -- command-line front end for the TAGUATO-SEND gateway.
//!
//! Runs a throttled bulk send or watches an instance until it pairs.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default | Description                          |
//! |------------------------|----------|---------|--------------------------------------|
//! | `GATEWAY_URL`          | yes      | --      | Gateway base URL, e.g. `http://host:8080` |
//! | `GATEWAY_API_KEY`      | no       | --      | Sent as the `apikey` header          |
//! | `SEND_DELAY_MS`        | no       | `500`   | Pause between bulk sends             |
//! | `POLL_INTERVAL_SECS`   | no       | `3`     | Pairing poll interval                |
//! | `MAX_POLL_ATTEMPTS`    | no       | `40`    | Pairing poll budget                  |
//! | `REQUEST_TIMEOUT_SECS` | no       | `15`    | Per-request HTTP timeout             |

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use taguato_gateway::GatewayApi;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Debug, Parser)]
#[command(name = "taguato", version, about = "TAGUATO-SEND gateway panel")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send one message to a list of recipients, one at a time.
    Send {
        /// Messaging instance to send through.
        #[arg(short, long)]
        instance: String,
        /// File with one recipient per line (commas also separate).
        #[arg(short, long)]
        recipients: PathBuf,
        /// Message text.
        #[arg(short, long)]
        message: String,
        /// Print every outcome as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
    /// Request a pairing prompt and wait until the instance connects.
    Pair {
        /// Messaging instance to pair.
        #[arg(short, long)]
        instance: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "taguato=info,taguato_dispatch=info,taguato_gateway=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Command failed");
            ExitCode::FAILURE
        }
    }
}

/// Run one subcommand. `Ok(false)` means it completed but did not fully succeed.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = config::PanelConfig::from_env()?;

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    let mut api = GatewayApi::with_client(client, config.gateway_url.clone());
    if let Some(key) = &config.api_key {
        api = api.with_api_key(key.clone());
    }

    tracing::info!(gateway = %config.gateway_url, "Starting taguato");

    match cli.command {
        Command::Send {
            instance,
            recipients,
            message,
            json,
        } => {
            let summary =
                commands::send(api, &config, &instance, &recipients, &message, json).await?;
            Ok(summary.is_clean())
        }
        Command::Pair { instance } => commands::pair(api, &config, &instance).await,
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the territory translation map client.
//!
//! Drives the click controller over two headless map views against a
//! running translation service and prints the resulting scene as `GeoJSON`.
//! Without a subcommand it starts an interactive session.

mod interactive;
mod scene;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tkv_client::config::ClientConfig;
use tkv_client::controller::{Outcome, ResponsePolicy};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use crate::scene::{parse_click, write_scene};

#[derive(Parser)]
#[command(name = "tkv", about = "Territory translation map client")]
struct Cli {
    /// URL of the page serving the maps; the translation service is
    /// expected on the same scheme, host and port
    #[arg(long, global = true)]
    origin: Option<String>,
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// How responses to overlapping clicks are handled (`latest_only` or `all`)
    #[arg(long, global = true)]
    policy: Option<ResponsePolicy>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a single click and print both views
    Click {
        /// Latitude of the click on the source map
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude of the click on the source map
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Write the scene to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Read clicks (`lat,lng` per line) from stdin until EOF
    Session {
        /// Write the scene to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

fn load_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(origin) = &cli.origin {
        config.page_origin.clone_from(origin);
    }
    if let Some(policy) = cli.policy {
        config.policy = policy;
    }
    Ok(config)
}

fn report(outcomes: &[Outcome]) {
    for outcome in outcomes {
        match outcome {
            Outcome::Rendered { token, summary } => log::info!(
                "{token}: {} ({} border points)",
                summary.label,
                summary.border_markers
            ),
            Outcome::Stale { token, latest } => {
                log::info!("{token}: discarded, {latest} is newer");
            }
            Outcome::Failed { token, message } => log::warn!("{token}: {message}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let Some(command) = cli.command else {
        return interactive::run(config).await;
    };

    match command {
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
        Commands::Click { lat, lng, out } => {
            let point = parse_click(&format!("{lat},{lng}"))?;
            let mut controller = tkv_client::headless_controller(&config)?;

            controller.on_click(point);
            let mut outcomes = Vec::new();
            while let Some(completion) = controller.next_completion().await {
                outcomes.push(controller.on_completion(completion));
            }
            report(&outcomes);

            if let Some((token, error)) = controller.errors().current() {
                eprintln!("Translation failed for {token}: {error}");
            }
            write_scene(controller.source(), controller.target(), out.as_deref())?;
        }
        Commands::Session { out } => {
            let controller = tkv_client::headless_controller(&config)?;
            let (tx, rx) = mpsc::channel(64);

            let reader = tokio::spawn(async move {
                let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_click(&line) {
                        Ok(point) => {
                            if tx.send(point).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => log::warn!("Skipping line: {e}"),
                    }
                }
            });

            let session = controller.run(rx).await;
            reader.await?;
            report(&session.outcomes);

            if let Some((token, error)) = session.errors.current() {
                eprintln!("Last error ({token}): {error}");
            }
            write_scene(&session.source, &session.target, out.as_deref())?;
        }
    }

    Ok(())
}

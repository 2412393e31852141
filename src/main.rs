use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use farmcast::api::AppState;
use farmcast::{AdvisoryService, FarmcastConfig, OpenWeatherClient, Storage, telemetry, web};

#[derive(Parser)]
#[command(name = "farmcast", version, about = "Weather-driven farming advisories")]
struct Cli {
    /// Configuration file (defaults to the user config directory, then ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for farmcast
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print advisories for a location
    Advise {
        location: String,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recent searches
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Remove all recent searches
    ClearHistory,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = FarmcastConfig::load_from_path(cli.config)?;
    let _telemetry = telemetry::init(&config.logging, cli.verbose)?;

    let storage = Arc::new(Storage::open(
        config.cache.resolved_location(),
        config.history.max_entries as usize,
    )?);

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let service = build_service(&config, storage)?;
            web::run(&config.server, AppState::new(Arc::new(service))).await?;
        }
        Command::Advise { location, json } => {
            let service = build_service(&config, storage)?;
            let report = match service.advise(&location).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::debug!("Advise failed: {e}");
                    anyhow::bail!(e.user_message());
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Farming advisories for {}:", report.city.display_name());
                if let Some(now) = report.forecast.first() {
                    println!(
                        "  Now: {:.1}°C, {}% humidity, wind {:.1} km/h{}",
                        now.temperature_celsius,
                        now.humidity_percent,
                        now.wind_speed_kmh(),
                        now.description
                            .as_deref()
                            .map(|d| format!(", {d}"))
                            .unwrap_or_default()
                    );
                }
                for advisory in report.advisory.classified() {
                    println!("  {advisory}");
                }
            }
        }
        Command::History { limit } => {
            let limit = limit.unwrap_or(config.history.list_limit as usize).max(1);
            let records = storage.history().recent(limit).await?;
            if records.is_empty() {
                println!("No recent searches.");
            }
            for record in records {
                println!(
                    "{}  {}: {:.1}°C{}",
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.location,
                    record.snapshot.temperature_celsius,
                    record
                        .snapshot
                        .description
                        .as_deref()
                        .map(|d| format!(", {d}"))
                        .unwrap_or_default()
                );
            }
        }
        Command::ClearHistory => {
            storage.history().clear().await?;
            println!("Search history cleared.");
        }
    }

    Ok(())
}

fn build_service(config: &FarmcastConfig, storage: Arc<Storage>) -> Result<AdvisoryService> {
    let provider = Arc::new(OpenWeatherClient::new(&config.weather)?);
    Ok(AdvisoryService::from_config(config, provider, storage))
}

//! Aftershock forecasting CLI
//!
//! A command-line tool for running aftershock predictions, either locally
//! against a models directory or through the aftershock API, and for
//! browsing recent earthquakes and model coverage.

mod client;
mod commands;
mod config;
mod output;

use aftershock_lib::PredictionRequest;
use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{earthquakes, health, models, predict};
use output::OutputFormat;
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Aftershock forecasting CLI
#[derive(Parser)]
#[command(name = "aftershock")]
#[command(author, version, about = "CLI for the Aftershock Forecasting Service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via AFTERSHOCK_API_URL env var)
    #[arg(long, env = "AFTERSHOCK_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Forecast aftershocks for a mainshock
    Predict {
        /// Mainshock magnitude (3.0 to 10.0)
        #[arg(long, short)]
        magnitude: f64,

        /// Mainshock latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Mainshock longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Tectonic setting, echoed in the result
        #[arg(long)]
        tectonic_setting: Option<String>,

        /// Forecast horizons in days, comma separated (default 1,7,30,365)
        #[arg(long, value_delimiter = ',')]
        horizons: Vec<u32>,

        /// Magnitude thresholds, comma separated (default 3.0 to 6.5)
        #[arg(long, value_delimiter = ',')]
        thresholds: Vec<f64>,

        /// Compute locally from this models directory instead of calling the API
        #[arg(long)]
        models_dir: Option<PathBuf>,
    },

    /// List recent earthquakes
    Earthquakes {
        /// Look-back window in days (1 to 365)
        #[arg(long, default_value_t = 7)]
        days: u32,

        /// Minimum magnitude (2.5 to 10.0)
        #[arg(long, default_value_t = 4.0)]
        min_magnitude: f64,
    },

    /// Inspect loaded models
    #[command(subcommand)]
    Models(ModelsCommands),

    /// Show service health
    Health,
}

#[derive(Subcommand)]
pub enum ModelsCommands {
    /// List regional model coverage
    Coverage,

    /// Show one regional model
    Get {
        /// Region id, e.g. region_12_34
        region_id: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        output::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;

    let format = match (cli.format, config.default_format.as_deref()) {
        (Some(format), _) => format,
        (None, Some(configured)) => configured.parse()?,
        (None, None) => OutputFormat::default(),
    };
    let api_url = cli
        .api_url
        .or(config.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    match cli.command {
        Commands::Predict {
            magnitude,
            lat,
            lon,
            tectonic_setting,
            horizons,
            thresholds,
            models_dir,
        } => {
            let mut request = PredictionRequest::new(magnitude, lat, lon);
            if let Some(setting) = tectonic_setting {
                request = request.with_tectonic_setting(setting);
            }
            if !horizons.is_empty() {
                request = request.with_horizons(horizons);
            }
            if !thresholds.is_empty() {
                request = request.with_thresholds(thresholds);
            }

            match models_dir.or(config.models_dir) {
                Some(dir) => predict::predict_local(&dir, &request, format)?,
                None => {
                    let client = client::ApiClient::new(&api_url)?;
                    predict::predict_remote(&client, &request, format).await?;
                }
            }
        }
        Commands::Earthquakes {
            days,
            min_magnitude,
        } => {
            let client = client::ApiClient::new(&api_url)?;
            earthquakes::list_earthquakes(&client, days, min_magnitude, format).await?;
        }
        Commands::Models(models_cmd) => {
            let client = client::ApiClient::new(&api_url)?;
            match models_cmd {
                ModelsCommands::Coverage => models::show_coverage(&client, format).await?,
                ModelsCommands::Get { region_id } => {
                    models::show_model(&client, &region_id, format).await?
                }
            }
        }
        Commands::Health => {
            let client = client::ApiClient::new(&api_url)?;
            health::show_health(&client, format).await?;
        }
    }

    Ok(())
}

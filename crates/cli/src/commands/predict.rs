//! Aftershock prediction command

use aftershock_lib::{Forecaster, PredictionRequest};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tabled::Tabled;

use crate::client::{ApiClient, PredictResponse, PredictionView};
use crate::output::{
    color_risk_level, format_percentage, print_heading, print_info, print_json, print_table,
    OutputFormat,
};

#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Horizon")]
    horizon: String,
    #[tabled(rename = "Rate/day")]
    rate: String,
    #[tabled(rename = "Cumulative")]
    cumulative: String,
}

#[derive(Tabled)]
struct ProbabilityRow {
    #[tabled(rename = "Magnitude")]
    magnitude: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Probability")]
    probability: String,
}

/// Run the prediction in-process against a local models directory
pub fn predict_local(
    models_dir: &Path,
    request: &PredictionRequest,
    format: OutputFormat,
) -> Result<()> {
    if !models_dir.is_dir() {
        anyhow::bail!("Models directory {} does not exist", models_dir.display());
    }

    let forecaster = Forecaster::load(models_dir);
    let result = forecaster.resolve_and_predict(request)?;

    // Same shape the API returns, so both paths render identically. Going
    // through text keeps the horizon and threshold order.
    let view: PredictionView = serde_json::from_str(&serde_json::to_string(&result)?)
        .context("Failed to convert prediction")?;

    if format == OutputFormat::Table {
        print_info(&format!("Using local models from {}", models_dir.display()));
    }
    render(&view, format)
}

/// Ask the API for a prediction
pub async fn predict_remote(
    client: &ApiClient,
    request: &PredictionRequest,
    format: OutputFormat,
) -> Result<()> {
    let response: PredictResponse = client.post("api/predict", request).await?;
    render(&response.predictions, format)
}

fn render(view: &PredictionView, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(view);
    }

    let shock = &view.mainshock;
    let model = &view.model_info;
    println!(
        "{} M{:.1} at {:.3}, {:.3}",
        "Mainshock:".bold(),
        shock.magnitude,
        shock.latitude,
        shock.longitude
    );
    println!(
        "{} {} ({}, quality {}, {} sequences)",
        "Model:".bold(),
        model.region_id,
        model.source,
        model.quality,
        model.training_sequences
    );

    print_heading("Expected aftershock rate");
    let rows: Vec<ForecastRow> = view
        .sorted_forecasts()
        .into_iter()
        .map(|f| ForecastRow {
            horizon: format!("day {}", f.days),
            rate: format!("{:.2}", f.rate_per_day),
            cumulative: format!("{:.1}", f.cumulative_expected),
        })
        .collect();
    print_table(rows);

    let probabilities = view.sorted_probabilities();
    if !probabilities.is_empty() {
        print_heading("Probability of an aftershock at or above");
        let rows: Vec<ProbabilityRow> = probabilities
            .into_iter()
            .map(|p| ProbabilityRow {
                magnitude: format!("M{:.1}", p.magnitude),
                expected: format!("{:.3}", p.expected_count),
                probability: format_percentage(p.probability),
            })
            .collect();
        print_table(rows);
    }

    let risk = &view.risk_assessment;
    print_heading("Risk assessment");
    println!(
        "{} (score {}) {}",
        color_risk_level(&risk.level),
        risk.score,
        risk.description
    );
    for factor in &risk.factors {
        println!("  - {}", factor);
    }
    println!();
    for (i, recommendation) in risk.recommendations.iter().enumerate() {
        println!("  {}. {}", i + 1, recommendation);
    }

    Ok(())
}

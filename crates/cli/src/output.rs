//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::str::FromStr;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| anyhow::anyhow!("Unknown output format '{}'", s))
    }
}

/// Print any value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a section heading
pub fn print_heading(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a probability in `[0, 1]` as a percentage
pub fn format_percentage(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// Format a magnitude, or `-` when unknown
pub fn format_magnitude(magnitude: Option<f64>) -> String {
    match magnitude {
        Some(m) => format!("M{:.1}", m),
        None => "-".to_string(),
    }
}

/// Color a health status
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "running" => status.green().to_string(),
        "degraded" => status.yellow().to_string(),
        "unhealthy" | "error" | "failed" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color a risk level
pub fn color_risk_level(level: &str) -> String {
    match level {
        "CRITICAL" => level.red().bold().to_string(),
        "HIGH" => level.red().to_string(),
        "ELEVATED" => level.yellow().to_string(),
        "MODERATE" => level.green().to_string(),
        _ => level.to_string(),
    }
}

/// Color an event magnitude by severity
pub fn color_magnitude(magnitude: Option<f64>) -> String {
    let formatted = format_magnitude(magnitude);
    match magnitude {
        Some(m) if m >= 7.0 => formatted.red().bold().to_string(),
        Some(m) if m >= 6.0 => formatted.red().to_string(),
        Some(m) if m >= 5.0 => formatted.yellow().to_string(),
        _ => formatted,
    }
}

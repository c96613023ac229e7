//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use screw_lib::health::HealthResponse;
use screw_lib::models::FeatureName;
use screw_lib::requests::{ErrorResponse, ModeInfo, PredictionResponse};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Row for the prediction table
#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Result")]
    label: String,
    #[tabled(rename = "Features")]
    features: String,
    #[tabled(rename = "Latency")]
    latency: String,
}

/// Row for the health table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
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

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Failed to serialize output: {}", e)),
    }
}

/// Color a predicted label
pub fn color_label(label: &str) -> String {
    match label {
        "OK" => label.green().bold().to_string(),
        "NOK" => label.red().bold().to_string(),
        _ => label.yellow().bold().to_string(),
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "ready" => status.green().to_string(),
        "degraded" => status.yellow().to_string(),
        "unhealthy" | "not ready" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Format a latency in microseconds
pub fn format_latency(elapsed_us: u64) -> String {
    if elapsed_us >= 1000 {
        format!("{:.1}ms", elapsed_us as f64 / 1000.0)
    } else {
        format!("{}µs", elapsed_us)
    }
}

pub fn format_features(features: &[FeatureName]) -> String {
    if features.is_empty() {
        return "(none)".to_string();
    }
    features
        .iter()
        .map(FeatureName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn print_prediction(prediction: &PredictionResponse, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(prediction),
        OutputFormat::Table => {
            let row = PredictionRow {
                mode: prediction.mode.to_string(),
                label: color_label(&prediction.label),
                features: format_features(&prediction.features),
                latency: format_latency(prediction.elapsed_us),
            };
            let table = Table::new([row]).with(Style::rounded()).to_string();
            println!("{}", table);
            println!("Prediction: {}", color_label(&prediction.label));
        }
    }
}

/// Show a rejection the server explained
pub fn print_rejection(rejection: &ErrorResponse) {
    print_error(&rejection.message);
    if !rejection.invalid_features.is_empty() {
        println!(
            "  Fix these inputs: {}",
            format_features(&rejection.invalid_features).yellow()
        );
    }
}

pub fn print_health(health: &HealthResponse, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(health),
        OutputFormat::Table => {
            let status = format!("{:?}", health.status).to_lowercase();
            println!("{} {}", "Service:".bold(), color_status(&status));

            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(&format!("{:?}", component.status).to_lowercase()),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));

            if rows.is_empty() {
                print_warning("No components reported");
                return;
            }
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
    }
}

pub fn print_modes(modes: &[ModeInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(modes),
        OutputFormat::Table => {
            for info in modes {
                println!("{} ({})", info.title.bold(), info.mode.to_string().cyan());
                println!("  {}", info.description);
                if !info.required.is_empty() {
                    println!("  Required: {}", format_features(&info.required));
                }
                if !info.optional.is_empty() {
                    println!("  Optional: {}", format_features(&info.optional));
                }
                println!();
            }
        }
    }
}

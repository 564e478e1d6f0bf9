use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use clawkeep_config::catalog::{self, ModelCatalogEntry};
use clawkeep_config::OpenClawConfig;
use clawkeep_gateway::{GatewayStatus, StatusMonitor};
use colored::{ColoredString, Colorize};
use serde::Serialize;

/// Everything `clawkeep status` prints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub config_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub status: GatewayStatus,
    pub primary_model: String,
    pub fallback_models: Vec<String>,
    pub latest_log: Option<PathBuf>,
    pub latest_log_modified: Option<DateTime<Local>>,
}

impl StatusReport {
    pub fn new(config_path: &Path, config: &OpenClawConfig, monitor: &StatusMonitor) -> Self {
        let activity = monitor.activity();
        Self {
            config_path: config_path.to_path_buf(),
            host: monitor.target().host.clone(),
            port: monitor.target().port,
            status: monitor.current(),
            primary_model: config.primary_model().to_string(),
            fallback_models: config.fallback_models().to_vec(),
            latest_log: activity.latest_file().map(Path::to_path_buf),
            latest_log_modified: activity.latest_modified().map(DateTime::<Local>::from),
        }
    }

    pub fn print(&self) {
        println!("Gateway:  {} ({}:{})", status_label(self.status), self.host, self.port);
        println!("Config:   {}", self.config_path.display());
        println!("Model:    {}", model_label(&self.primary_model));
        if !self.fallback_models.is_empty() {
            println!("Fallback: {}", self.fallback_models.join(", "));
        }
        if let (Some(log), Some(modified)) = (&self.latest_log, &self.latest_log_modified) {
            println!(
                "Last log: {} at {}",
                log.display(),
                modified.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }
}

fn status_label(status: GatewayStatus) -> ColoredString {
    match status {
        GatewayStatus::Stopped => status.label().red(),
        GatewayStatus::Idle => status.label().yellow(),
        GatewayStatus::Active => status.label().green(),
    }
}

pub fn print_status_line(status: GatewayStatus) {
    println!(
        "[{}] gateway {}",
        Local::now().format("%H:%M:%S"),
        status_label(status)
    );
}

/// `"Claude Opus 4.5 (anthropic/claude-opus-4-5)"`, with the short alias
/// appended when there is one.
pub fn model_label(reference: &str) -> String {
    let name = catalog::model_display_name(reference);
    let mut label = if name == reference {
        reference.to_string()
    } else {
        format!("{name} ({reference})")
    };
    if let Some(short) = catalog::short_alias(reference) {
        label.push_str(&format!(" [{short}]"));
    }
    label
}

pub fn print_catalog(entries: &[ModelCatalogEntry], primary: &str, fallbacks: &[String]) {
    if entries.is_empty() {
        println!("No models found (add providers or aliases to the config)");
        return;
    }
    for entry in entries {
        let marker = if entry.id == primary {
            "*".green()
        } else if fallbacks.iter().any(|f| f == &entry.id) {
            "+".yellow()
        } else {
            " ".normal()
        };
        let place = if entry.is_local { "local" } else { "cloud" };
        let line = format!(
            "{} {} ({}, {})  {}",
            marker, entry.display_name, entry.provider, place, entry.id
        );
        if entry.is_known {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

pub fn print_fallbacks(fallbacks: &[String]) {
    if fallbacks.is_empty() {
        println!("No fallback models selected");
        return;
    }
    for (i, model) in fallbacks.iter().enumerate() {
        println!("{:>3}. {}", i + 1, model_label(model));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_label_shows_name_and_reference() {
        assert_eq!(
            model_label("anthropic/claude-opus-4-5"),
            "Claude Opus 4.5 (anthropic/claude-opus-4-5) [Opus]"
        );
        assert_eq!(model_label("openai/o3"), "o3 (openai/o3)");
        assert_eq!(model_label("gpt-4"), "gpt-4");
    }
}

mod render;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use clawkeep_config::{ConfigStore, OpenClawConfig, catalog};
use clawkeep_gateway::activity::default_log_dir;
use clawkeep_gateway::supervisor::RESTART_RECHECK_DELAY;
use clawkeep_gateway::{
    ActivityMonitor, ActivitySettings, ProbeTarget, RestartCommand, StatusMonitor,
};
use tracing_subscriber::EnvFilter;

use crate::render::StatusReport;

#[derive(Parser)]
#[command(
    name = "clawkeep",
    version,
    about = "clawkeep - manage a local OpenClaw gateway"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to openclaw.json (default: first one found, else ~/.openclaw/openclaw.json)
    #[arg(long, env = "CLAWKEEP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Host the gateway listens on
    #[arg(long, env = "CLAWKEEP_GATEWAY_HOST", default_value = "127.0.0.1", global = true)]
    host: String,

    /// Connect timeout for the liveness probe, in milliseconds
    #[arg(long, env = "CLAWKEEP_PROBE_TIMEOUT_MS", default_value = "1000", global = true)]
    probe_timeout_ms: u64,

    /// Directory the gateway writes its logs to
    #[arg(long, env = "CLAWKEEP_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show gateway status and the selected models
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Print status changes until interrupted
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "2000")]
        interval_ms: u64,
    },

    /// List the models available for selection
    Models {
        #[arg(long)]
        json: bool,
    },

    /// Set the primary model
    Primary { model: String },

    /// Manage the ordered fallback models
    Fallbacks {
        #[command(subcommand)]
        action: FallbackCommands,
    },

    /// Stop and relaunch the gateway
    Restart {
        /// Return right after launching instead of re-checking status
        #[arg(long)]
        no_wait: bool,

        /// Process pattern passed to `pkill -f`
        #[arg(long, default_value = clawkeep_gateway::supervisor::DEFAULT_PROCESS_PATTERN)]
        pattern: String,

        /// Command that starts the gateway
        #[arg(long, default_value = clawkeep_gateway::supervisor::DEFAULT_LAUNCH_COMMAND)]
        launch: String,
    },

    /// Inspect the config file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum FallbackCommands {
    /// List fallbacks in priority order
    List,
    /// Replace the whole list
    Set { models: Vec<String> },
    /// Append a model to the end of the list
    Add { model: String },
    /// Remove the entry at a 1-based position
    Remove { position: usize },
    /// Replace the entry at a 1-based position
    Replace { position: usize, model: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the config path in use
    Path,
    /// Print the raw config document
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut store = match &cli.config {
        Some(path) => ConfigStore::open(path),
        None => ConfigStore::discover(),
    };
    tracing::debug!("using config {}", store.path().display());

    match cli.command {
        Commands::Status { json } => {
            let config = require_config(&store)?;
            let mut monitor = status_monitor(&cli.host, cli.probe_timeout_ms, cli.log_dir, &config);
            monitor.refresh().await;
            let report = StatusReport::new(store.path(), &config, &monitor);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print();
            }
        }
        Commands::Watch { interval_ms } => {
            let config = require_config(&store)?;
            let mut monitor =
                status_monitor(&cli.host, cli.probe_timeout_ms, cli.log_dir, &config);
            println!(
                "Watching gateway on {}:{} (Ctrl-C to stop)",
                monitor.target().host,
                monitor.target().port
            );

            render::print_status_line(monitor.refresh().await);
            let mut rx = monitor.subscribe();
            let task = monitor.spawn(Duration::from_millis(interval_ms));

            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let status = *rx.borrow_and_update();
                        render::print_status_line(status);
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            task.abort();
        }
        Commands::Models { json } => {
            let config = require_config(&store)?;
            let entries = catalog::build(&config);
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                render::print_catalog(&entries, config.primary_model(), config.fallback_models());
            }
        }
        Commands::Primary { model } => {
            warn_if_uncatalogued(&store, &model);
            store
                .set_primary_model(&model)
                .with_context(|| format!("failed to update {}", store.path().display()))?;
            println!("Primary model set to {}", render::model_label(&model));
        }
        Commands::Fallbacks { action } => match action {
            FallbackCommands::List => {
                let config = require_config(&store)?;
                render::print_fallbacks(config.fallback_models());
            }
            FallbackCommands::Set { models } => {
                for model in &models {
                    warn_if_uncatalogued(&store, model);
                }
                store.set_fallback_models(&models)?;
                print_fallbacks_after_edit(&store);
            }
            FallbackCommands::Add { model } => {
                warn_if_uncatalogued(&store, &model);
                store.add_fallback_model(&model)?;
                print_fallbacks_after_edit(&store);
            }
            FallbackCommands::Remove { position } => {
                let removed = store.remove_fallback_model(to_index(position)?)?;
                let removed = removed.as_str().map_or_else(|| removed.to_string(), str::to_string);
                println!("Removed {}", render::model_label(&removed));
                print_fallbacks_after_edit(&store);
            }
            FallbackCommands::Replace { position, model } => {
                warn_if_uncatalogued(&store, &model);
                store.replace_fallback_model(to_index(position)?, &model)?;
                print_fallbacks_after_edit(&store);
            }
        },
        Commands::Restart {
            no_wait,
            pattern,
            launch,
        } => {
            let restart = RestartCommand {
                pattern,
                launch,
                ..RestartCommand::default()
            };
            println!("Restarting gateway...");
            restart.run().await?;

            if !no_wait {
                let config = require_config(&store)?;
                tokio::time::sleep(RESTART_RECHECK_DELAY).await;
                let mut monitor =
                    status_monitor(&cli.host, cli.probe_timeout_ms, cli.log_dir, &config);
                render::print_status_line(monitor.refresh().await);
            }
        }
        Commands::Config { action } => match action {
            ConfigCommands::Path => {
                println!("{}", store.path().display());
                if let Some(err) = store.last_error() {
                    eprintln!("warning: {err}");
                }
            }
            ConfigCommands::Show => {
                let doc = store.raw_document()?;
                println!("{}", serde_json::to_string_pretty(&doc)?);
            }
        },
    }

    Ok(())
}

/// The loaded config, or the load error as a readable message.
fn require_config(store: &ConfigStore) -> Result<std::sync::Arc<OpenClawConfig>> {
    match store.config() {
        Some(config) => Ok(config),
        None => {
            let reason = store
                .last_error()
                .unwrap_or_else(|| "no config loaded".to_string());
            bail!("{reason}\nUse --config to point at your openclaw.json.")
        }
    }
}

fn status_monitor(
    host: &str,
    probe_timeout_ms: u64,
    log_dir: Option<PathBuf>,
    config: &OpenClawConfig,
) -> StatusMonitor {
    let target = ProbeTarget::new(host, config.gateway.port)
        .with_timeout(Duration::from_millis(probe_timeout_ms));
    let settings = ActivitySettings {
        log_dir: log_dir.unwrap_or_else(default_log_dir),
        ..ActivitySettings::default()
    };
    StatusMonitor::new(target, ActivityMonitor::new(settings))
}

fn warn_if_uncatalogued(store: &ConfigStore, model: &str) {
    let Some(config) = store.config() else {
        return;
    };
    if !catalog::build(&config).iter().any(|e| e.id == model) {
        eprintln!("note: {model} is not in the model catalog; saving it anyway");
    }
}

fn print_fallbacks_after_edit(store: &ConfigStore) {
    if let Some(config) = store.config() {
        render::print_fallbacks(config.fallback_models());
    }
}

/// Convert a 1-based list position from the command line.
fn to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .context("positions start at 1")
}

use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use diarisk::api;
use diarisk::cli::{Cli, Commands};
use diarisk::config::AppConfig;
use diarisk::error::{DiariskError, Result};
use diarisk::ml::{self, RiskModel};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load_from(&cli.config_dir)?;

    match cli.command {
        Commands::Train { url, output, epochs } => {
            if let Some(url) = url {
                config.dataset.url = url;
            }
            if let Some(output) = output {
                config.model.artifact_path = output;
            }
            if let Some(epochs) = epochs {
                config.training.epochs = epochs;
            }
            validate(&config)?;
            let _guard = init_logging(&config);

            ml::run_training(&config).await?;
        }
        Commands::Serve { port, model } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(model) = model {
                config.model.artifact_path = model;
            }
            validate(&config)?;
            let _guard = init_logging(&config);

            // A service that cannot load its model must not start.
            let model = RiskModel::load(&config.model.artifact_path)?;
            info!(
                "Loaded model trained {} (held-out accuracy {:.4})",
                model.metadata.trained_at, model.metadata.test_accuracy
            );

            api::start_api_server(Arc::new(model), config.server.port).await?;
        }
    }

    Ok(())
}

fn validate(config: &AppConfig) -> Result<()> {
    config
        .validate()
        .map_err(|errors| DiariskError::Validation(errors.join("; ")))
}

fn init_logging(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},diarisk=debug", config.logging.level)));

    // `tracing_appender::rolling::daily` panics if it cannot create the
    // initial log file, so writability is preflighted.
    let mut guard = None;
    let file_layer = std::env::var("DIARISK_LOG_DIR").ok().and_then(|log_dir| {
        if std::fs::create_dir_all(&log_dir).is_err() {
            return None;
        }
        let test_path = std::path::Path::new(&log_dir).join(".diarisk_write_test");
        let writable = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
            .is_ok();
        std::fs::remove_file(&test_path).ok();
        if !writable {
            return None;
        }

        let appender = tracing_appender::rolling::daily(&log_dir, "diarisk.log");
        let (non_blocking, appender_guard) = tracing_appender::non_blocking(appender);
        guard = Some(appender_guard);

        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use entropy_sorter::ai::{GeminiClient, SuggestionError, SuggestionService};
use entropy_sorter::config::{self, ConfigError};
use entropy_sorter::pipeline::Pipeline;
use entropy_sorter::services::{prepare_root, start_watcher, WatchError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to prepare watch folder {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error("Failed to create suggestion client: {0}")]
    Client(#[from] SuggestionError),
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env may carry RUST_LOG as well as the API key
    let _ = dotenvy::dotenv();
    init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config_path = config::config_path(std::env::args().nth(1));
    let settings = config::load(&config_path)?;
    tracing::info!(
        config = %config_path.display(),
        rules = settings.rules.len(),
        suggestions = settings.suggestions.enabled,
        "Config loaded"
    );

    let root = prepare_root(&settings.root).map_err(|source| StartupError::Root {
        path: settings.root.clone(),
        source,
    })?;

    let service: Option<Arc<dyn SuggestionService>> = match &settings.api_key {
        Some(key) if settings.suggestions.enabled => Some(Arc::new(GeminiClient::new(key.clone())?)),
        _ => None,
    };

    let (_watch, events) = start_watcher(&root)?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down");
            shutdown.cancel();
        }
    });

    Pipeline::new(&settings, root, service, cancel).run(events).await;
    Ok(())
}

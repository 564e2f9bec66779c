//! bookbot-auth - authentication and session service for the event booking bot.

use bookbot_auth::clock::SystemClock;
use bookbot_auth::config::{self, Config};
use bookbot_auth::db::Database;
use bookbot_auth::dialogue::{DialogueEngine, spawn_idle_sweep};
use bookbot_auth::http::{AppState, run_http_server};
use bookbot_auth::metrics;
use bookbot_auth::services::AuthService;
use bookbot_auth::session::spawn_purge_task;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(config::ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("{config_path} not found, using defaults");
            Config::default()
        }
        Err(e) => {
            eprintln!("Failed to load config {config_path}: {e}");
            return Err(e.into());
        }
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.server.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {config_path}",
            errors.len()
        ));
    }

    info!(
        server = %config.server.name,
        addr = %config.server.http_addr,
        session_ttl_minutes = config.session.ttl_minutes,
        "Starting bookbot-auth"
    );

    metrics::init();

    // Initialize database
    let db = Database::new(&config.database.path).await?;

    let auth = AuthService::new(
        Arc::new(db),
        Arc::new(SystemClock),
        config.session.ttl(),
        config.database.storage_timeout(),
    );
    let engine = Arc::new(DialogueEngine::new(
        auth.clone(),
        config.dialogue.idle_timeout(),
    ));

    spawn_purge_task(auth.sessions().clone(), config.session.purge_interval());
    spawn_idle_sweep(Arc::clone(&engine), config.dialogue.sweep_interval());

    let state = AppState {
        engine,
        name: Arc::from(config.server.name.as_str()),
    };

    tokio::select! {
        result = run_http_server(config.server.http_addr, state) => {
            if let Err(e) = &result {
                error!(error = %e, "HTTP server failed");
            }
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}

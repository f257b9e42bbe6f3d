//! TutorHub Server: presence and typing indicators for messaging.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use tutorhub_core::SystemClock;
use tutorhub_core::config::{AppConfig, StoreBackend};
use tutorhub_core::error::AppError;
use tutorhub_database::{
    DatabasePool, MemoryPresenceStore, MemoryUserDirectory, PresenceStore, UserDirectory,
};
use tutorhub_presence::PresenceService;
use tutorhub_worker::CronScheduler;

#[tokio::main]
async fn main() {
    let env = std::env::var("TUTORHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!("Configuration loaded (env: {})", env);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting TutorHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Presence store ───────────────────────────────────
    let (store, users, db) =
        match config.presence.store {
            StoreBackend::Postgres => {
                let db = DatabasePool::connect(&config.database).await?;
                (db.presence_store(), db.user_directory(), Some(db))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory presence store; no users are registered");
                let store: Arc<dyn PresenceStore> = Arc::new(MemoryPresenceStore::new());
                let users: Arc<dyn UserDirectory> = Arc::new(MemoryUserDirectory::new());
                (store, users, None)
            }
        };

    // ── Step 2: Presence service ─────────────────────────────────
    let presence = Arc::new(PresenceService::new(
        store,
        users,
        Arc::new(SystemClock),
        config.presence.clone(),
    ));

    // ── Step 3: Scheduled cleanup ────────────────────────────────
    let mut scheduler = if config.worker.enabled {
        let scheduler = CronScheduler::new().await?;
        scheduler
            .register_default_tasks(&config.worker, Arc::clone(&presence))
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Worker disabled; presence cleanup will not run");
        None
    };

    // ── Step 4: HTTP server ──────────────────────────────────────
    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let state = tutorhub_api::AppState::new(Arc::new(config.clone()), presence);
    let result = tutorhub_api::run_server(&config, state, shutdown).await;

    // ── Step 5: Teardown ─────────────────────────────────────────
    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!("Scheduler shutdown failed: {}", e);
        }
    }
    if let Some(db) = db {
        db.close().await;
    }

    tracing::info!("TutorHub server stopped");
    result
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        return;
    }
    tracing::info!("Ctrl+C received");
    shutdown.cancel();
}

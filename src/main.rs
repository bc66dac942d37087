//! Test data portal server.
//!
//! Checks the identifier pool, then serves the reservation API.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing_subscriber::{EnvFilter, fmt};

use testpool_api::{AppState, build_router};
use testpool_core::config::AppConfig;
use testpool_core::error::AppError;
use testpool_store::{AllocationStore, IdentifierAllocator, PoolService};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `TESTPOOL_CONFIG` if set, otherwise from
/// `config/default` plus the `TESTPOOL_ENV` overlay.
fn load_configuration() -> Result<AppConfig, AppError> {
    match std::env::var("TESTPOOL_CONFIG") {
        Ok(path) => AppConfig::from_file(path),
        Err(_) => {
            let env = std::env::var("TESTPOOL_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
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
    tracing::info!("Starting test data portal v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Check the identifier pool ────────────────────────
    let service = PoolService::new(AllocationStore::from_config(&config.pool));
    let report = service.initialize().await.map_err(|e| {
        tracing::error!(path = %config.pool.path, error = %e, "Identifier pool is not usable");
        e
    })?;
    if !report.missing_descriptive.is_empty() {
        tracing::warn!(
            missing = ?report.missing_descriptive,
            "Pool lacks descriptive columns; reserved rows will show less detail"
        );
    }

    // ── Step 2: Build and start HTTP server ──────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = AppState::new(config, Arc::new(service));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Test data portal listening on {}", addr);

    // ── Step 3: Graceful shutdown ────────────────────────────────
    let (signal_tx, signal_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, finishing in-flight reservations...");
            let _ = signal_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    let served = tokio::select! {
        result = &mut server => result,
        _ = signal_rx => match tokio::time::timeout(grace, &mut server).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    grace_seconds = grace.as_secs(),
                    "Grace period elapsed with requests still open"
                );
                Ok(())
            }
        },
    };
    served.map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Test data portal shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

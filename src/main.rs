//! Mini WorkQ - job service binary
//!
//! Accepts jobs over HTTP, queues them with backpressure and runs them on an
//! adaptive worker pool.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_workq::{api::create_router, spawn_dispatcher, AppState, Config};

/// Main entry point for the job service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the job queue and result cache
/// 4. Start the background dispatcher
/// 5. Serve the HTTP API until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_workq=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mini WorkQ job service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, queue_max_size={}, drop_strategy={:?}, concurrency={}..={}, dispatch_batch={}",
        config.server_port,
        config.queue_max_size,
        config.drop_strategy,
        config.min_concurrency,
        config.max_concurrency,
        config.dispatch_batch
    );

    let state = AppState::from_config(&config).context("invalid configuration")?;
    info!("Job queue and result cache initialized");

    let dispatcher = spawn_dispatcher(state.clone(), &config);
    info!("Job dispatcher started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(dispatcher))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the dispatcher.
async fn shutdown_signal(dispatcher: JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    dispatcher.abort();
    warn!("Dispatcher aborted");
}

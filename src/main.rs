use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use rate_gate::app::build_router;
use rate_gate::config::Args;
use rate_gate::error::AppError;
use rate_gate::rate_limit::RateLimitStore;
use rate_gate::state::AppState;
use rate_gate::worker::spawn_sweeper;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // parse cli arguments
    let args = Args::parse();

    let store = Arc::new(RateLimitStore::new());
    let state = Arc::new(AppState::from_args(Arc::clone(&store), &args)?);
    let app = build_router(Arc::clone(&state));
    let shutdown_token = CancellationToken::new();

    // spawn the background sweeper
    let sweeper = spawn_sweeper(Arc::clone(&store), args.sweep_every(), shutdown_token.clone());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = TcpListener::bind(&addr).await?;

    info!(port = args.port, "Rate gate running on http://localhost:{}", args.port);
    info!(
        max_requests = state.policy.max_requests(),
        window_ms = state.policy.window_ms(),
        max_window_ms = state.max_window_ms,
        "Default check policy"
    );
    info!(
        guard_limit = state.guard_policy.max_requests(),
        guard_window_ms = state.guard_policy.window_ms(),
        trust_forwarded = state.trust_forwarded,
        sweep_interval_secs = args.sweep_interval,
        "API guard policy"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
    .await?;

    // stop the sweeper before dropping the store
    shutdown_token.cancel();
    if let Err(e) = sweeper.await {
        error!(error = %e, "Sweeper task failed");
    }
    store.dispose();

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }

    shutdown_token.cancel();
}

use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use encodrop_api::config::ServerConfig;
use encodrop_api::router::build_app_router;
use encodrop_api::state::AppState;
use encodrop_api::ws;
use encodrop_core::registry::JobRegistry;
use encodrop_events::StatusDispatcher;
use encodrop_pipeline::{EncoderLauncher, Orchestrator};

/// How long shutdown waits for running encoders before giving up on them.
const JOB_DRAIN_TIMEOUT_SECS: u64 = 5;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "encodrop_api=debug,encodrop_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Encoder ---
    let encoder_path = match config.encoder.resolve() {
        Ok(path) => path,
        Err(e) => {
            tracing::error!(error = %e, "Cannot resolve encoder location");
            return ExitCode::FAILURE;
        }
    };
    if !encoder_path.is_file() {
        tracing::warn!(path = %encoder_path.display(), "Encoder binary not found; jobs will fail to start");
    }
    tracing::info!(path = %encoder_path.display(), "Using encoder");

    // --- Preflight ---
    if !encodrop_core::ffmpeg::is_installed(&config.ffmpeg_path).await {
        tracing::warn!(ffmpeg = %config.ffmpeg_path, "FFmpeg is not installed; encoded files will have no audio");
    }

    // --- Orchestrator ---
    let dispatcher = Arc::new(StatusDispatcher::default());
    let orchestrator = Arc::new(Orchestrator::new(
        EncoderLauncher::new(encoder_path),
        Arc::new(JobRegistry::new()),
        Arc::clone(&dispatcher),
        config.orchestrator_config(),
    ));

    // --- WebSocket manager, heartbeat, status forwarder ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));
    let forwarder_handle = ws::start_status_forwarder(&dispatcher, Arc::clone(&ws_manager));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        orchestrator: Arc::clone(&orchestrator),
        ws_manager: Arc::clone(&ws_manager),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let ip = match config.host.parse::<IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::error!(host = %config.host, error = %e, "Invalid HOST address");
            return ExitCode::FAILURE;
        }
    };
    let addr = SocketAddr::new(ip, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let active = orchestrator.active_jobs();
    if active > 0 {
        tracing::info!(active, "Waiting for running encoders");
        if tokio::time::timeout(
            Duration::from_secs(JOB_DRAIN_TIMEOUT_SECS),
            orchestrator.wait_idle(),
        )
        .await
        .is_err()
        {
            tracing::warn!("Encoders still running at shutdown; leaving them to finish");
        }
    }

    forwarder_handle.abort();

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
    ExitCode::SUCCESS
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

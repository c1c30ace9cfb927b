use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};

use image_analysis_api::{AppState, Config, build_router, logging, metrics, utils};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Run the application, returning an exit code on error.
async fn run() -> Result<(), exitcode::ExitCode> {
    // Logging is not installed yet, so configuration errors go to stderr
    let config = Config::from_env().map_err(|e| {
        eprintln!("Configuration error: {e}");
        exitcode::CONFIG
    })?;

    logging::init_logging(&config.log_level, config.log_format);

    info!(
        app = %config.app_name,
        version = %config.app_version,
        environment = %config.environment,
        log_level = %config.log_level,
        upload_dir = %config.upload_dir.display(),
        max_file_size = config.max_file_size,
        "Starting {} v{}",
        config.app_name,
        config.app_version
    );

    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::try_init_metrics(metrics_addr);
    } else {
        info!("Prometheus metrics disabled (METRICS_PORT=0)");
    }

    let state = AppState::new(config.clone());
    state.store.ensure_dir().await.map_err(|e| {
        error!(
            upload_dir = %config.upload_dir.display(),
            "Failed to create upload directory: {e}"
        );
        exitcode::CANTCREAT
    })?;

    let app = build_router(state);

    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  GET  /         - Service status");
    info!("  GET  /health   - Health check");
    info!("  POST {}  - Upload an image", config.api_path("/upload"));
    info!("  POST {} - Analyze an uploaded image", config.api_path("/analyze"));

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(utils::shutdown_signal())
    .await
    .map_err(|e| {
        error!("Server error: {e}");
        exitcode::SOFTWARE
    })?;

    info!("Shutting down {}", config.app_name);
    Ok(())
}

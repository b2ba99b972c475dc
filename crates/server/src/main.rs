use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use dropfade_lifecycle::Reaper;
use dropfade_server::api::AppState;
use dropfade_server::config::DropfadeConfig;

/// One-time file and text sharing server.
#[derive(Parser, Debug)]
#[command(name = "dropfade-server", about = "Standalone HTTP server for dropfade")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "dropfade.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config_exists = Path::new(&cli.config).exists();
    let mut config: DropfadeConfig = if config_exists {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        toml::from_str("")?
    };
    config.apply_env();

    dropfade_server::telemetry::init(&config.telemetry);

    if !config_exists {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    let manager = dropfade_server::manager_factory::create_manager(&config)?;
    info!(
        state_backend = %config.state.backend,
        blob_backend = %config.blob.backend,
        max_file_size_bytes = config.limits.max_file_size_bytes,
        "drop manager initialized"
    );

    // Spawn the reaper if enabled.
    let reaper = if config.reaper.enabled {
        let (mut reaper, shutdown_tx) =
            Reaper::new(Arc::clone(&manager), config.reaper.to_reaper_config());
        let handle = tokio::spawn(async move { reaper.run().await });
        Some((handle, shutdown_tx))
    } else {
        None
    };

    let app = dropfade_server::api::router(AppState { manager });

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "dropfade-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some((handle, shutdown_tx)) = reaper {
        let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
        let _ = shutdown_tx.send(()).await;
        if tokio::time::timeout(shutdown_timeout, handle).await.is_err() {
            warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "reaper did not stop before the shutdown timeout"
            );
        }
    }

    info!("dropfade-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}

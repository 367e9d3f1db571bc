mod bootstrap;
mod bot;
mod health;
mod routes;
#[cfg(test)]
mod testing;
mod webhook;

use std::time::Duration;

use anyhow::Result;
use reeltitle_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use reeltitle_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging depends on the loaded config, so nothing is logged before this point.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let state = routes::AppState::from_application(&app);
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        port = app.config.server.port,
        gateway = %state.gateway_label,
        "reeltitle-server started"
    );
    routes::serve(
        &app.config.server.bind_address,
        app.config.server.port,
        state,
        grace,
        wait_for_shutdown(),
    )
    .await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "reeltitle-server stopped"
    );

    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %error, "ctrl-c handler failed");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(error = %error, "SIGTERM handler failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!(event_name = "system.server.shutdown_signal", "shutdown signal received");
}

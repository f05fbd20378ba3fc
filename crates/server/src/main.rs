mod bootstrap;
mod health;
mod webhook;

use std::time::Duration;

use anyhow::Result;
use axum::Router;
use foodbot_core::config::{AppConfig, LoadOptions};
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::bootstrap::Application;

fn init_logging(config: &AppConfig) {
    use foodbot_core::config::LogFormat::*;

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging has to be up before bootstrap emits anything.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    serve(app).await
}

fn app_router(app: &Application) -> Router {
    webhook::router(app.runtime.clone())
        .merge(health::router(app.orders.clone()))
        .layer(TraceLayer::new_for_http())
}

async fn serve(app: Application) -> Result<()> {
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let router = app_router(&app);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    info!(
        event_name = "system.server.started",
        bind_address = %address,
        "foodbot-server listening for webhook calls"
    );

    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal?,
        finished = &mut server => {
            finished??;
            return Ok(());
        }
    }

    info!(
        event_name = "system.server.stopping",
        grace_secs = grace.as_secs(),
        "draining in-flight requests"
    );
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(grace, server).await {
        Ok(finished) => finished??,
        Err(_) => warn!(
            event_name = "system.server.shutdown_timeout",
            grace_secs = grace.as_secs(),
            "in-flight requests did not finish before the grace period ended"
        ),
    }

    info!(event_name = "system.server.stopped", "foodbot-server stopped");
    Ok(())
}

use std::sync::Arc;
use std::time::Duration;

use foodbot_agent::FulfillmentRuntime;
use foodbot_core::config::{AppConfig, ConfigError, LoadOptions};
use foodbot_db::{connect, OrderRepository, SqlOrderRepository};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub orders: Arc<dyn OrderRepository>,
    pub runtime: FulfillmentRuntime,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        database = %config.database.redacted_url(),
        "starting application bootstrap"
    );

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        max_connections = config.database.max_connections,
        "database pool established"
    );

    let orders: Arc<dyn OrderRepository> = Arc::new(SqlOrderRepository::with_statement_timeout(
        db_pool,
        Duration::from_secs(config.database.statement_timeout_secs),
    ));

    let runtime = FulfillmentRuntime::with_orders(Arc::clone(&orders));
    Ok(Application { config, orders, runtime })
}

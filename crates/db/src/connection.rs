use std::time::Duration;

use foodbot_core::config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

pub type DbPool = sqlx::MySqlPool;

pub fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(config.password.expose_secret())
        .database(&config.name)
}

pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(connect_options(config), config.max_connections, config.timeout_secs)
        .await
}

pub async fn connect_with_settings(
    options: MySqlConnectOptions,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    pool_options(max_connections, timeout_secs).connect_with(options).await
}

/// Builds the pool without opening a connection; the first query connects.
pub fn connect_lazy(config: &DatabaseConfig) -> DbPool {
    pool_options(config.max_connections, config.timeout_secs)
        .connect_lazy_with(connect_options(config))
}

fn pool_options(max_connections: u32, timeout_secs: u64) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
}

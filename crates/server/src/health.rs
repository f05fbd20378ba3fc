use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use foodbot_db::OrderRepository;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    orders: Arc<dyn OrderRepository>,
}

impl HealthState {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub checked_at: String,
}

pub fn router(orders: Arc<dyn OrderRepository>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState::new(orders))
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(state.orders.as_ref()).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "foodbot-server fulfillment runtime initialized".to_string(),
        },
        database,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(orders: &dyn OrderRepository) -> HealthCheck {
    match orders.ping().await {
        Ok(()) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use foodbot_core::config::AppConfig;
    use foodbot_db::{connect_lazy, InMemoryOrderRepository, SqlOrderRepository};

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_returns_ready_when_the_order_store_answers() {
        let state = HealthState::new(Arc::new(InMemoryOrderRepository::default()));

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_database_is_unreachable() {
        let mut config = AppConfig::default();
        config.database.host = "127.0.0.1".to_string();
        config.database.port = 1;
        config.database.timeout_secs = 1;
        let orders = SqlOrderRepository::new(connect_lazy(&config.database));

        let (status, Json(payload)) = health(State(HealthState::new(Arc::new(orders)))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "degraded");
        assert!(payload.database.detail.starts_with("database query failed"));
        assert_eq!(payload.service.status, "ready");
    }
}

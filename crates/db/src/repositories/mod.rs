use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use foodbot_core::domain::order::{DraftOrder, OrderId, Quantity};

pub mod memory;
pub mod order;

pub use memory::InMemoryOrderRepository;
pub use order::SqlOrderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("`{operation}` timed out after {after:?}")]
    Timeout { operation: &'static str, after: Duration },
    #[error("unknown food item `{0}`")]
    UnknownItem(String),
    #[error("cannot place an order without items")]
    EmptyOrder,
}

/// Persistence of placed orders and their tracking status.
///
/// Lookups return `Ok(None)` when nothing matches; `Err` always means the
/// operation itself failed.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// `max(order_id) + 1` over placed orders, `1` when there are none.
    async fn next_order_id(&self) -> Result<OrderId, RepositoryError>;

    async fn insert_order_item(
        &self,
        item: &str,
        quantity: Quantity,
        order_id: OrderId,
    ) -> Result<(), RepositoryError>;

    async fn insert_order_tracking(
        &self,
        order_id: OrderId,
        status: &str,
    ) -> Result<(), RepositoryError>;

    async fn total_order_price(&self, order_id: OrderId)
        -> Result<Option<Decimal>, RepositoryError>;

    async fn order_status(&self, order_id: OrderId) -> Result<Option<String>, RepositoryError>;

    /// Assigns a fresh order id, stores every line under it and opens the
    /// tracking row as "in progress". Either all of it is stored or none.
    async fn place_order(&self, order: &DraftOrder) -> Result<OrderId, RepositoryError>;

    async fn ping(&self) -> Result<(), RepositoryError>;
}

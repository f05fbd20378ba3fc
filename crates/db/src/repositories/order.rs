use std::future::Future;
use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::mysql::{MySql, MySqlConnection};
use sqlx::pool::PoolConnection;
use sqlx::Connection;
use tracing::{debug, error, info, warn};

use foodbot_core::domain::order::{DraftOrder, OrderId, Quantity, IN_PROGRESS_STATUS};

use super::{OrderRepository, RepositoryError};
use crate::DbPool;

const NEXT_ORDER_ID_SQL: &str =
    "SELECT CAST(COALESCE(MAX(order_id), 0) + 1 AS SIGNED) FROM orders";
// Placements serialize on this named lock; it belongs to the connection, not the transaction.
const ACQUIRE_ORDER_ID_LOCK_SQL: &str =
    "SELECT CAST(GET_LOCK('foodbot.next_order_id', ?) AS SIGNED)";
const RELEASE_ORDER_ID_LOCK_SQL: &str = "SELECT RELEASE_LOCK('foodbot.next_order_id')";
const INSERT_ORDER_ITEM_SQL: &str = "CALL insert_order_item(?, ?, ?)";
const INSERT_ORDER_TRACKING_SQL: &str =
    "INSERT INTO order_tracking (order_id, status) VALUES (?, ?)";
const TOTAL_ORDER_PRICE_SQL: &str = "SELECT CAST(get_total_order_price(?) AS DECIMAL(10, 2))";
const ORDER_STATUS_SQL: &str = "SELECT status FROM order_tracking WHERE order_id = ?";

const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(10);

/// MySQL order store. Relies on the `insert_order_item` procedure and the
/// `get_total_order_price` function that ship with the eatery schema; the
/// procedure must not commit on its own.
pub struct SqlOrderRepository {
    pool: DbPool,
    statement_timeout: Duration,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self::with_statement_timeout(pool, DEFAULT_STATEMENT_TIMEOUT)
    }

    pub fn with_statement_timeout(pool: DbPool, statement_timeout: Duration) -> Self {
        Self { pool, statement_timeout }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, operation: &'static str, work: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        let result = match tokio::time::timeout(self.statement_timeout, work).await {
            Ok(result) => result.map_err(RepositoryError::from),
            Err(_) => Err(RepositoryError::Timeout { operation, after: self.statement_timeout }),
        };

        if let Err(ref failure) = result {
            error!(
                event_name = "db.order.operation_failed",
                operation,
                error = %failure,
                "order store operation failed"
            );
        }
        result
    }

    /// Takes the order id lock, then writes every line and the tracking row in
    /// one transaction. The caller releases the lock.
    async fn place_locked(
        &self,
        conn: &mut MySqlConnection,
        order: &DraftOrder,
    ) -> Result<OrderId, RepositoryError> {
        let wait_secs = i64::try_from(self.statement_timeout.as_secs().max(1)).unwrap_or(i64::MAX);
        let locked = self
            .bounded(
                "acquire_order_id_lock",
                sqlx::query_scalar::<_, Option<i64>>(ACQUIRE_ORDER_ID_LOCK_SQL)
                    .bind(wait_secs)
                    .fetch_one(&mut *conn),
            )
            .await?;
        if locked != Some(1) {
            error!(
                event_name = "db.order.operation_failed",
                operation = "acquire_order_id_lock",
                "order id lock not granted"
            );
            return Err(RepositoryError::Timeout {
                operation: "acquire_order_id_lock",
                after: self.statement_timeout,
            });
        }

        // Dropping `tx` on any early return rolls the whole order back.
        self.bounded("place_order", async {
            let mut tx = conn.begin().await?;
            let order_id =
                sqlx::query_scalar::<_, i64>(NEXT_ORDER_ID_SQL).fetch_one(&mut *tx).await?;

            for line in order.lines() {
                sqlx::query(INSERT_ORDER_ITEM_SQL)
                    .bind(line.item.as_str())
                    .bind(line.quantity.0)
                    .bind(order_id)
                    .execute(&mut *tx)
                    .await?;
            }

            sqlx::query(INSERT_ORDER_TRACKING_SQL)
                .bind(order_id)
                .bind(IN_PROGRESS_STATUS)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(OrderId(order_id))
        })
        .await
    }
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn next_order_id(&self) -> Result<OrderId, RepositoryError> {
        let next = self
            .bounded(
                "next_order_id",
                sqlx::query_scalar::<_, i64>(NEXT_ORDER_ID_SQL).fetch_one(&self.pool),
            )
            .await?;
        Ok(OrderId(next))
    }

    async fn insert_order_item(
        &self,
        item: &str,
        quantity: Quantity,
        order_id: OrderId,
    ) -> Result<(), RepositoryError> {
        self.bounded("insert_order_item", async {
            let mut tx = self.pool.begin().await?;
            sqlx::query(INSERT_ORDER_ITEM_SQL)
                .bind(item)
                .bind(quantity.0)
                .bind(order_id.0)
                .execute(&mut *tx)
                .await?;
            tx.commit().await
        })
        .await?;

        debug!(
            event_name = "db.order.item_inserted",
            order_id = order_id.0,
            item,
            "order item inserted"
        );
        Ok(())
    }

    async fn insert_order_tracking(
        &self,
        order_id: OrderId,
        status: &str,
    ) -> Result<(), RepositoryError> {
        self.bounded("insert_order_tracking", async {
            let mut tx = self.pool.begin().await?;
            sqlx::query(INSERT_ORDER_TRACKING_SQL)
                .bind(order_id.0)
                .bind(status)
                .execute(&mut *tx)
                .await?;
            tx.commit().await
        })
        .await
    }

    async fn total_order_price(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Decimal>, RepositoryError> {
        self.bounded(
            "total_order_price",
            sqlx::query_scalar::<_, Option<Decimal>>(TOTAL_ORDER_PRICE_SQL)
                .bind(order_id.0)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn order_status(&self, order_id: OrderId) -> Result<Option<String>, RepositoryError> {
        let status = self
            .bounded(
                "order_status",
                sqlx::query_scalar::<_, Option<String>>(ORDER_STATUS_SQL)
                    .bind(order_id.0)
                    .fetch_optional(&self.pool),
            )
            .await?;
        Ok(status.flatten())
    }

    async fn place_order(&self, order: &DraftOrder) -> Result<OrderId, RepositoryError> {
        if order.is_empty() {
            return Err(RepositoryError::EmptyOrder);
        }

        let mut conn = self.bounded("place_order", self.pool.acquire()).await?;
        let placed = self.place_locked(&mut conn, order).await;

        let order_id = match placed {
            Ok(order_id) => order_id,
            Err(failure) => {
                discard_connection(conn).await;
                return Err(failure);
            }
        };

        let released = self
            .bounded(
                "release_order_id_lock",
                sqlx::query(RELEASE_ORDER_ID_LOCK_SQL).execute(&mut *conn),
            )
            .await;
        if released.is_err() {
            // The order is committed; only the lock is left behind on this session.
            discard_connection(conn).await;
        }

        info!(
            event_name = "db.order.placed",
            order_id = order_id.0,
            items = order.len(),
            "order persisted"
        );
        Ok(order_id)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.bounded("ping", sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool))
            .await
            .map(|_| ())
    }
}

/// Closing the session also drops any named lock it still holds, so the
/// connection never goes back to the pool with the order id lock.
async fn discard_connection(conn: PoolConnection<MySql>) {
    if let Err(error) = conn.close().await {
        warn!(
            event_name = "db.order.connection_close_failed",
            error = %error,
            "could not close connection after placing an order"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use foodbot_core::config::DatabaseConfig;
    use foodbot_core::domain::order::{DraftOrder, OrderId, Quantity};

    use super::SqlOrderRepository;
    use crate::connect_lazy;
    use crate::repositories::{OrderRepository, RepositoryError};

    fn unreachable_database() -> DatabaseConfig {
        DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "eatery".to_string(),
            password: SecretString::from("unused".to_string()),
            name: "eatery".to_string(),
            max_connections: 1,
            timeout_secs: 1,
            statement_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn unreachable_database_surfaces_as_error_not_as_missing_row() {
        let repo = SqlOrderRepository::with_statement_timeout(
            connect_lazy(&unreachable_database()),
            Duration::from_secs(5),
        );

        let status = repo.order_status(OrderId(1)).await;

        assert!(
            matches!(status, Err(RepositoryError::Database(_) | RepositoryError::Timeout { .. })),
            "a failed lookup must not look like an absent order"
        );
    }

    #[tokio::test]
    async fn empty_order_is_rejected_before_touching_the_database() {
        let repo = SqlOrderRepository::new(connect_lazy(&unreachable_database()));

        let result = repo.place_order(&DraftOrder::default()).await;

        assert!(matches!(result, Err(RepositoryError::EmptyOrder)));
    }

    #[tokio::test]
    async fn place_order_against_unreachable_database_fails() {
        let repo = SqlOrderRepository::with_statement_timeout(
            connect_lazy(&unreachable_database()),
            Duration::from_secs(5),
        );
        let order = DraftOrder::from_pairs([("samosa", Quantity(2))]);

        assert!(repo.place_order(&order).await.is_err());
        assert!(repo.ping().await.is_err());
    }
}

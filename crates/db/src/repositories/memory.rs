use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tokio::sync::RwLock;

use foodbot_core::domain::order::{
    DraftOrder, OrderId, OrderLine, Quantity, IN_PROGRESS_STATUS,
};

use super::{OrderRepository, RepositoryError};

#[derive(Clone, Debug)]
struct StoredItem {
    order_id: OrderId,
    item: String,
    quantity: Quantity,
    total_price: Decimal,
}

#[derive(Default)]
struct MemoryState {
    menu: HashMap<String, Decimal>,
    items: Vec<StoredItem>,
    tracking: BTreeMap<OrderId, String>,
}

impl MemoryState {
    fn next_order_id(&self) -> OrderId {
        let max = self.items.iter().map(|stored| stored.order_id.0).max().unwrap_or(0);
        OrderId(max + 1)
    }

    fn price_line(
        &self,
        item: &str,
        quantity: Quantity,
        order_id: OrderId,
    ) -> Result<StoredItem, RepositoryError> {
        let unit_price =
            self.menu.get(item).ok_or_else(|| RepositoryError::UnknownItem(item.to_string()))?;
        Ok(StoredItem {
            order_id,
            item: item.to_string(),
            quantity,
            total_price: *unit_price * Decimal::from(quantity.0),
        })
    }
}

/// Order store that prices lines from a fixed menu, the way the
/// `insert_order_item` procedure prices them from `food_items`.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryOrderRepository {
    pub fn with_menu<I, S>(menu: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: Into<String>,
    {
        let state = MemoryState {
            menu: menu.into_iter().map(|(item, price)| (item.into(), price)).collect(),
            ..MemoryState::default()
        };
        Self { state: RwLock::new(state) }
    }

    /// Stands in for the kitchen updating an order's status.
    pub async fn set_status(&self, order_id: OrderId, status: impl Into<String>) {
        let mut state = self.state.write().await;
        state.tracking.insert(order_id, status.into());
    }

    pub async fn stored_lines(&self, order_id: OrderId) -> Vec<OrderLine> {
        let state = self.state.read().await;
        state
            .items
            .iter()
            .filter(|stored| stored.order_id == order_id)
            .map(|stored| OrderLine { item: stored.item.clone(), quantity: stored.quantity })
            .collect()
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn next_order_id(&self) -> Result<OrderId, RepositoryError> {
        Ok(self.state.read().await.next_order_id())
    }

    async fn insert_order_item(
        &self,
        item: &str,
        quantity: Quantity,
        order_id: OrderId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let stored = state.price_line(item, quantity, order_id)?;
        state.items.push(stored);
        Ok(())
    }

    async fn insert_order_tracking(
        &self,
        order_id: OrderId,
        status: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.tracking.insert(order_id, status.to_string());
        Ok(())
    }

    async fn total_order_price(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let state = self.state.read().await;
        let mut lines = state.items.iter().filter(|stored| stored.order_id == order_id).peekable();
        if lines.peek().is_none() {
            return Ok(None);
        }
        Ok(Some(lines.map(|stored| stored.total_price).sum()))
    }

    async fn order_status(&self, order_id: OrderId) -> Result<Option<String>, RepositoryError> {
        Ok(self.state.read().await.tracking.get(&order_id).cloned())
    }

    async fn place_order(&self, order: &DraftOrder) -> Result<OrderId, RepositoryError> {
        if order.is_empty() {
            return Err(RepositoryError::EmptyOrder);
        }

        let mut state = self.state.write().await;
        let order_id = state.next_order_id();
        let priced = order
            .lines()
            .iter()
            .map(|line| state.price_line(&line.item, line.quantity, order_id))
            .collect::<Result<Vec<_>, _>>()?;

        state.items.extend(priced);
        state.tracking.insert(order_id, IN_PROGRESS_STATUS.to_string());
        Ok(order_id)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

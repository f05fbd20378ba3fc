//! The four order handlers. Each one returns the fulfillment text for the
//! conversation; failures are turned into customer-facing messages here.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use foodbot_core::domain::order::{DraftOrder, OrderId};
use foodbot_core::domain::session::SessionId;
use foodbot_core::sessions::SessionStore;
use foodbot_db::{OrderRepository, RepositoryError};

use crate::intent::IntentParameters;

pub const UNCLEAR_ITEMS_TEXT: &str =
    "Sorry, I didn't understand. Can you specify food items and their quantities clearly?";
pub const ORDER_NOT_FOUND_TEXT: &str =
    "I am having trouble finding your order. Can you place a new order?";
pub const ORDER_NOW_EMPTY_TEXT: &str = "Your order is now empty.";
pub const EMPTY_ORDER_TEXT: &str =
    "Your order is empty. Please add some food items before completing it.";
pub const PLACE_BACKEND_ERROR_TEXT: &str =
    "Sorry, I couldn't process your order due to a backend error.";
pub const ORDER_ID_MISSING_TEXT: &str = "Order ID is missing in the request.";
pub const INVALID_ORDER_ID_TEXT: &str = "Invalid Order ID format. Please provide a numeric value.";
pub const TRACK_BACKEND_ERROR_TEXT: &str =
    "Sorry, I couldn't look up your order due to a backend error.";

/// Builds draft orders per session and hands completed ones to the order
/// store. Add, remove and complete hold the session lock for their whole run.
#[derive(Clone)]
pub struct OrderDesk {
    sessions: SessionStore,
    orders: Arc<dyn OrderRepository>,
}

impl OrderDesk {
    pub fn new(sessions: SessionStore, orders: Arc<dyn OrderRepository>) -> Self {
        Self { sessions, orders }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn add_to_order(
        &self,
        parameters: &IntentParameters,
        session_id: &SessionId,
    ) -> String {
        let food_items = parameters.food_items();
        let quantities = match parameters.quantities() {
            Ok(quantities) => quantities,
            Err(error) => {
                debug!(
                    event_name = "fulfillment.order.add_rejected",
                    session_id = %session_id,
                    error = %error,
                    "quantity could not be read"
                );
                return UNCLEAR_ITEMS_TEXT.to_string();
            }
        };

        if food_items.len() != quantities.len() {
            debug!(
                event_name = "fulfillment.order.add_rejected",
                session_id = %session_id,
                items = food_items.len(),
                quantities = quantities.len(),
                "food items and quantities do not pair up"
            );
            return UNCLEAR_ITEMS_TEXT.to_string();
        }

        let _guard = self.sessions.lock(session_id).await;
        let mut order = self.sessions.get(session_id).await.unwrap_or_default();
        order.merge(DraftOrder::from_pairs(food_items.into_iter().zip(quantities)));
        let summary = order.to_string();
        self.sessions.put(session_id.clone(), order).await;

        format!("So far you have: {summary}. Do you need anything else?")
    }

    pub async fn remove_from_order(
        &self,
        parameters: &IntentParameters,
        session_id: &SessionId,
    ) -> String {
        let _guard = self.sessions.lock(session_id).await;
        let Some(mut order) = self.sessions.get(session_id).await else {
            return ORDER_NOT_FOUND_TEXT.to_string();
        };

        let mut removed = Vec::new();
        let mut missing = Vec::new();
        for item in parameters.food_items() {
            if order.remove(&item) {
                removed.push(item);
            } else {
                missing.push(item);
            }
        }

        let mut messages = Vec::new();
        if !removed.is_empty() {
            messages.push(format!("Removed {} from your order.", removed.join(", ")));
        }
        if !missing.is_empty() {
            messages.push(format!("Your current order does not have {}.", missing.join(", ")));
        }
        if order.is_empty() {
            messages.push(ORDER_NOW_EMPTY_TEXT.to_string());
        } else {
            messages.push(format!("Here is what is left in your order: {order}"));
        }

        // An emptied draft stays in the store; completing it is refused later.
        self.sessions.put(session_id.clone(), order).await;
        messages.join(" ")
    }

    pub async fn complete_order(&self, session_id: &SessionId) -> String {
        let _guard = self.sessions.lock(session_id).await;
        let Some(order) = self.sessions.get(session_id).await else {
            return ORDER_NOT_FOUND_TEXT.to_string();
        };

        let order_id = match self.save(&order).await {
            Ok(order_id) => order_id,
            Err(RepositoryError::EmptyOrder) => return EMPTY_ORDER_TEXT.to_string(),
            Err(failure) => {
                error!(
                    event_name = "fulfillment.order.place_failed",
                    session_id = %session_id,
                    error = %failure,
                    "order kept in progress after a failed save"
                );
                return PLACE_BACKEND_ERROR_TEXT.to_string();
            }
        };

        let total = self.order_total(order_id).await;
        self.sessions.delete(session_id).await;

        info!(
            event_name = "fulfillment.order.placed",
            session_id = %session_id,
            order_id = order_id.0,
            total = %total,
            "order placed"
        );
        format!(
            "Awesome! We have placed your order. Here is your order ID #{order_id}. \
             Your order total is {total}, payable at delivery."
        )
    }

    pub async fn track_order(&self, parameters: &IntentParameters) -> String {
        let Some(raw_order_id) = parameters.order_id() else {
            return ORDER_ID_MISSING_TEXT.to_string();
        };
        let order_id = match OrderId::from_value(raw_order_id) {
            Ok(order_id) => order_id,
            Err(error) => {
                debug!(event_name = "fulfillment.order.track_rejected", error = %error);
                return INVALID_ORDER_ID_TEXT.to_string();
            }
        };

        match self.orders.order_status(order_id).await {
            Ok(Some(status)) if !status.is_empty() => {
                format!("The order status for order ID {order_id} is: {status}.")
            }
            Ok(_) => format!("No order found with order ID: {order_id}."),
            Err(failure) => {
                error!(
                    event_name = "fulfillment.order.track_failed",
                    order_id = order_id.0,
                    error = %failure,
                    "order status lookup failed"
                );
                TRACK_BACKEND_ERROR_TEXT.to_string()
            }
        }
    }

    /// Stores the whole draft under one new order id, or nothing at all.
    async fn save(&self, order: &DraftOrder) -> Result<OrderId, RepositoryError> {
        self.orders.place_order(order).await
    }

    async fn order_total(&self, order_id: OrderId) -> Decimal {
        match self.orders.total_order_price(order_id).await {
            Ok(Some(total)) => total,
            Ok(None) => {
                warn!(
                    event_name = "fulfillment.order.total_missing",
                    order_id = order_id.0,
                    "placed order has no price"
                );
                Decimal::ZERO
            }
            Err(failure) => {
                warn!(
                    event_name = "fulfillment.order.total_failed",
                    order_id = order_id.0,
                    error = %failure,
                    "order placed but its total could not be read"
                );
                Decimal::ZERO
            }
        }
    }
}

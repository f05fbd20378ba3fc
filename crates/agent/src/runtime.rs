use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use foodbot_core::sessions::SessionStore;
use foodbot_db::OrderRepository;

use crate::handlers::OrderDesk;
use crate::intent::{DispatchRequest, Intent, WebhookRequest};

/// Body of every webhook answer, including failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentResponse {
    #[serde(rename = "fulfillmentText")]
    pub fulfillment_text: String,
}

impl FulfillmentResponse {
    pub fn text(fulfillment_text: impl Into<String>) -> Self {
        Self { fulfillment_text: fulfillment_text.into() }
    }
}

#[derive(Clone)]
pub struct FulfillmentRuntime {
    desk: OrderDesk,
}

impl FulfillmentRuntime {
    pub fn new(desk: OrderDesk) -> Self {
        Self { desk }
    }

    /// Fresh session store in front of the given order store.
    pub fn with_orders(orders: Arc<dyn OrderRepository>) -> Self {
        Self::new(OrderDesk::new(SessionStore::new(), orders))
    }

    pub fn desk(&self) -> &OrderDesk {
        &self.desk
    }

    /// Never fails: unreadable requests are answered with an error text.
    pub async fn handle(&self, body: &[u8]) -> FulfillmentResponse {
        match WebhookRequest::from_slice(body).and_then(WebhookRequest::into_dispatch) {
            Ok(request) => self.dispatch(request).await,
            Err(error) => {
                warn!(
                    event_name = "fulfillment.request.rejected",
                    error = %error,
                    "webhook request could not be read"
                );
                FulfillmentResponse::text(error.fulfillment_text())
            }
        }
    }

    pub async fn dispatch(&self, request: DispatchRequest) -> FulfillmentResponse {
        let DispatchRequest { intent, parameters, session_id } = request;
        info!(
            event_name = "fulfillment.intent.dispatched",
            intent = intent.kind(),
            session_id = %session_id,
            "dispatching intent"
        );

        let text = match intent {
            Intent::AddToOrder => self.desk.add_to_order(&parameters, &session_id).await,
            Intent::RemoveFromOrder => self.desk.remove_from_order(&parameters, &session_id).await,
            Intent::CompleteOrder => self.desk.complete_order(&session_id).await,
            Intent::TrackOrder => self.desk.track_order(&parameters).await,
            Intent::Unsupported(display_name) => {
                warn!(
                    event_name = "fulfillment.intent.unsupported",
                    intent = %display_name,
                    "no handler for intent"
                );
                format!("Unsupported intent: {display_name}")
            }
        };
        FulfillmentResponse::text(text)
    }
}

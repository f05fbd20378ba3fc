//! Fulfillment runtime for the food-ordering chat agent.
//!
//! The conversational platform classifies each customer message into an
//! intent and calls the webhook. This crate turns that call into a reply:
//! 1. **Parsing** (`intent`) - payload model, intent name, session id
//! 2. **Dispatch** (`runtime`) - one handler per supported intent
//! 3. **Handlers** (`handlers`) - draft order edits, order placement, tracking
//!
//! Every outcome, including malformed requests and backend failures, is a
//! `FulfillmentResponse`; nothing here surfaces as an HTTP error.

pub mod handlers;
pub mod intent;
pub mod runtime;

pub use handlers::OrderDesk;
pub use intent::{DispatchRequest, Intent, IntentParameters, WebhookRequest};
pub use runtime::{FulfillmentResponse, FulfillmentRuntime};

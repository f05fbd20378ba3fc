use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use foodbot_agent::{FulfillmentResponse, FulfillmentRuntime};

/// `POST /` takes the raw body so that unreadable payloads still get a
/// `200` with an error text instead of an extractor rejection.
pub fn router(runtime: FulfillmentRuntime) -> Router {
    Router::new().route("/", post(fulfill)).with_state(runtime)
}

pub async fn fulfill(
    State(runtime): State<FulfillmentRuntime>,
    body: Bytes,
) -> Json<FulfillmentResponse> {
    Json(runtime.handle(&body).await)
}

//! Webhook payload model and intent classification.

use serde::Deserialize;
use serde_json::{Map, Value};

use foodbot_core::domain::order::Quantity;
use foodbot_core::domain::session::SessionId;
use foodbot_core::errors::{DomainError, RequestError};

pub const ADD_TO_ORDER_INTENT: &str = "order.add - context : ongoing-order";
pub const REMOVE_FROM_ORDER_INTENT: &str = "order.remove - context: ongoing-order";
pub const COMPLETE_ORDER_INTENT: &str = "order.complete- context: ongoing-order";
pub const TRACK_ORDER_INTENT: &str = "track.order - context: ongoing-tracking";

const FOOD_ITEM_KEY: &str = "food-item";
const NUMBER_KEY: &str = "number";
const ORDER_ID_KEY: &str = "order_id";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[serde(default)]
    pub query_result: Option<QueryResult>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub intent: Option<IntentRef>,
    #[serde(default)]
    pub parameters: Option<Map<String, Value>>,
    #[serde(default)]
    pub output_contexts: Vec<OutputContext>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRef {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OutputContext {
    #[serde(default)]
    pub name: Option<String>,
}

/// What the dispatcher needs from one webhook call.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchRequest {
    pub intent: Intent,
    pub parameters: IntentParameters,
    pub session_id: SessionId,
}

impl WebhookRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self, RequestError> {
        serde_json::from_slice(body).map_err(|error| RequestError::MalformedBody(error.to_string()))
    }

    /// The session comes from the first output context only; without one the
    /// session id is empty.
    pub fn into_dispatch(self) -> Result<DispatchRequest, RequestError> {
        let query_result = self.query_result.ok_or(RequestError::MissingField("queryResult"))?;
        let display_name = query_result
            .intent
            .and_then(|intent| intent.display_name)
            .ok_or(RequestError::MissingField("queryResult.intent.displayName"))?;
        let session_id = query_result
            .output_contexts
            .first()
            .and_then(|context| context.name.as_deref())
            .map(SessionId::from_context_path)
            .unwrap_or_default();

        Ok(DispatchRequest {
            intent: Intent::from_display_name(&display_name),
            parameters: IntentParameters::new(query_result.parameters.unwrap_or_default()),
            session_id,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    AddToOrder,
    RemoveFromOrder,
    CompleteOrder,
    TrackOrder,
    Unsupported(String),
}

impl Intent {
    /// Exact match only; anything else is `Unsupported`.
    pub fn from_display_name(display_name: &str) -> Self {
        match display_name {
            ADD_TO_ORDER_INTENT => Self::AddToOrder,
            REMOVE_FROM_ORDER_INTENT => Self::RemoveFromOrder,
            COMPLETE_ORDER_INTENT => Self::CompleteOrder,
            TRACK_ORDER_INTENT => Self::TrackOrder,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddToOrder => "order.add",
            Self::RemoveFromOrder => "order.remove",
            Self::CompleteOrder => "order.complete",
            Self::TrackOrder => "order.track",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

/// Typed access to `queryResult.parameters`.
///
/// The platform sends list parameters as arrays, but a single mention can
/// arrive as a bare scalar; both read as a list here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntentParameters {
    values: Map<String, Value>,
}

impl IntentParameters {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn food_items(&self) -> Vec<String> {
        as_list(self.values.get(FOOD_ITEM_KEY))
            .into_iter()
            .map(|value| match value {
                Value::String(item) => item.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    pub fn quantities(&self) -> Result<Vec<Quantity>, DomainError> {
        as_list(self.values.get(NUMBER_KEY)).into_iter().map(Quantity::from_value).collect()
    }

    /// `order_id`, or `number` when `order_id` is blank. Zero and `false`
    /// count as blank, so `{"order_id": 0}` carries no order id.
    pub fn order_id(&self) -> Option<&Value> {
        [ORDER_ID_KEY, NUMBER_KEY]
            .into_iter()
            .filter_map(|key| self.values.get(key))
            .find(|value| !is_blank(value))
    }
}

fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => values.iter().collect(),
        Some(scalar) => vec![scalar],
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Bool(true) => false,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(raw) => raw.trim().is_empty(),
        Value::Array(values) => values.is_empty(),
        Value::Object(values) => values.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use foodbot_core::domain::order::Quantity;
    use foodbot_core::domain::session::SessionId;
    use foodbot_core::errors::RequestError;

    use super::{Intent, IntentParameters, WebhookRequest, ADD_TO_ORDER_INTENT, TRACK_ORDER_INTENT};

    fn parameters(value: serde_json::Value) -> IntentParameters {
        match value {
            serde_json::Value::Object(values) => IntentParameters::new(values),
            other => panic!("parameters must be an object, got {other}"),
        }
    }

    #[test]
    fn parses_intent_parameters_and_session_from_first_context() {
        let body = json!({
            "queryResult": {
                "intent": { "displayName": ADD_TO_ORDER_INTENT },
                "parameters": { "food-item": ["samosa"], "number": [2] },
                "outputContexts": [
                    { "name": "projects/p/agent/sessions/abc-123/contexts/ongoing-order" },
                    { "name": "projects/p/agent/sessions/other/contexts/x" }
                ]
            }
        });

        let request = WebhookRequest::from_slice(body.to_string().as_bytes())
            .and_then(WebhookRequest::into_dispatch)
            .expect("valid request");

        assert_eq!(request.intent, Intent::AddToOrder);
        assert_eq!(request.session_id, SessionId("abc-123".to_string()));
        assert_eq!(request.parameters.food_items(), vec!["samosa".to_string()]);
    }

    #[test]
    fn missing_contexts_and_parameters_default_to_empty() {
        let body = json!({ "queryResult": { "intent": { "displayName": TRACK_ORDER_INTENT } } });

        let request = WebhookRequest::from_slice(body.to_string().as_bytes())
            .and_then(WebhookRequest::into_dispatch)
            .expect("valid request");

        assert_eq!(request.intent, Intent::TrackOrder);
        assert_eq!(request.session_id, SessionId::default());
        assert_eq!(request.parameters, IntentParameters::default());
    }

    #[test]
    fn missing_display_name_is_reported_by_path() {
        let body = br#"{"queryResult": {"intent": {}}}"#;

        let error = WebhookRequest::from_slice(body)
            .and_then(WebhookRequest::into_dispatch)
            .expect_err("display name is required");

        assert_eq!(error, RequestError::MissingField("queryResult.intent.displayName"));
    }

    #[test]
    fn invalid_json_is_a_malformed_body() {
        let error = WebhookRequest::from_slice(b"{not json").expect_err("invalid json");
        assert!(matches!(error, RequestError::MalformedBody(_)));
    }

    #[test]
    fn intent_names_match_exactly() {
        assert_eq!(
            Intent::from_display_name("order.complete- context: ongoing-order"),
            Intent::CompleteOrder
        );
        assert_eq!(
            Intent::from_display_name("order.remove - context: ongoing-order"),
            Intent::RemoveFromOrder
        );
        assert_eq!(
            Intent::from_display_name("order.add - context: ongoing-order"),
            Intent::Unsupported("order.add - context: ongoing-order".to_string())
        );
        assert_eq!(
            Intent::from_display_name("track.order - context: ongoing-tracking"),
            Intent::TrackOrder
        );
    }

    #[test]
    fn scalar_parameters_read_as_single_element_lists() {
        let params = parameters(json!({ "food-item": "samosa", "number": 2.0 }));

        assert_eq!(params.food_items(), vec!["samosa".to_string()]);
        assert_eq!(params.quantities(), Ok(vec![Quantity(2)]));
    }

    #[test]
    fn non_numeric_quantity_is_an_error() {
        let params = parameters(json!({ "food-item": ["samosa"], "number": ["two"] }));
        assert!(params.quantities().is_err());
    }

    #[test]
    fn order_id_falls_back_to_number_when_blank() {
        assert_eq!(parameters(json!({ "order_id": 41, "number": 7 })).order_id(), Some(&json!(41)));
        assert_eq!(parameters(json!({ "order_id": "", "number": 7 })).order_id(), Some(&json!(7)));
        let blank_list = parameters(json!({ "order_id": [], "number": [7] }));
        assert_eq!(blank_list.order_id(), Some(&json!([7])));
        assert_eq!(parameters(json!({ "number": null })).order_id(), None);
        assert_eq!(parameters(json!({})).order_id(), None);
    }

    #[test]
    fn zero_and_false_order_ids_count_as_blank() {
        assert_eq!(parameters(json!({ "order_id": 0, "number": 3 })).order_id(), Some(&json!(3)));
        assert_eq!(parameters(json!({ "order_id": 0.0 })).order_id(), None);
        let disabled = parameters(json!({ "order_id": false, "number": 5 }));
        assert_eq!(disabled.order_id(), Some(&json!(5)));
        assert_eq!(parameters(json!({ "order_id": "0" })).order_id(), Some(&json!("0")));
        assert_eq!(parameters(json!({ "order_id": [0] })).order_id(), Some(&json!([0])));
    }
}

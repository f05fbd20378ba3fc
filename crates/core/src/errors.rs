use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid quantity `{0}`")]
    InvalidQuantity(String),
    #[error("invalid order id `{0}`")]
    InvalidOrderId(String),
}

/// Failures that abort a webhook request before any handler runs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

impl RequestError {
    pub fn fulfillment_text(&self) -> String {
        format!("An error occurred: {self}")
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{DomainError, RequestError};

    #[test]
    fn request_error_renders_generic_fulfillment_text() {
        let error = RequestError::MissingField("queryResult.intent.displayName");

        assert_eq!(
            error.fulfillment_text(),
            "An error occurred: missing field `queryResult.intent.displayName`"
        );
    }

    #[test]
    fn domain_error_names_the_offending_value() {
        let error = DomainError::InvalidOrderId("abc".to_owned());
        assert_eq!(error.to_string(), "invalid order id `abc`");
    }
}

//! Resource call errors
//!
//! Every failure of a resource call ends up as a [`ResourceError`]. The value
//! returned by [`ResourceError::payload`] is what subscribers of a "failed"
//! topic receive.

use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Ordered list of local validation messages. Empty means no errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `Param <field> is required.` unless the field is present
    pub fn require(&mut self, field: &str, present: bool) {
        if !present {
            self.0.push(format!("Param {} is required.", field));
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ResourceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ResourceError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

impl From<Vec<String>> for ValidationErrors {
    fn from(messages: Vec<String>) -> Self {
        Self(messages)
    }
}

#[derive(Error, Debug)]
pub enum ResourceError {
    /// A required field was missing; the request was never sent
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The backend answered with a non-success status
    #[error("API request failed: {status}")]
    Http { status: u16, body: Value },

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to send request: {0}")]
    Network(String),

    #[error("Failed to read response body: {0}")]
    Decode(String),

    /// The task driving the request was cancelled or panicked
    #[error("Request task aborted: {0}")]
    Aborted(String),
}

impl ResourceError {
    /// Value delivered to "failed" subscribers and carried by the rejection
    pub fn payload(&self) -> Value {
        match self {
            Self::Validation(errors) => json!(errors.messages()),
            Self::Http { body, .. } => body.clone(),
            other => json!({ "error": other.to_string() }),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Short message for display
    /// Security: never echoes the raw response body
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors.to_string(),
            Self::Http { status, .. } => match status {
                400 => "Invalid request. Check your parameters.".to_string(),
                401 => "Authentication required. Log in first.".to_string(),
                403 => "Access denied. Check the permissions of the current user.".to_string(),
                404 => "Resource not found.".to_string(),
                406 => "Not acceptable. The backend rejected the request format.".to_string(),
                409 => "Resource conflict.".to_string(),
                429 => "Rate limit exceeded. Please try again later.".to_string(),
                500..=599 => "Backend temporarily unavailable. Please try again.".to_string(),
                other => format!("Request failed with status {}.", other),
            },
            Self::Timeout => "Request timed out. Check the backend or raise the timeout.".to_string(),
            Self::Network(_) => {
                "Request failed. Check your network connection and the instance URL.".to_string()
            }
            Self::Decode(_) => "Could not read the response from the backend.".to_string(),
            Self::Aborted(_) => "Request was aborted.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_records_missing_fields_in_order() {
        let mut errors = ValidationErrors::new();
        errors.require("username", false);
        errors.require("password", true);
        errors.require("mail", false);

        assert_eq!(
            errors.messages(),
            &["Param username is required.", "Param mail is required."]
        );
    }

    #[test]
    fn test_empty_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_validation_payload_is_message_list() {
        let err = ResourceError::Validation(vec!["Param name is required.".to_string()].into());
        assert_eq!(err.payload(), json!(["Param name is required."]));
        assert!(err.is_validation());
    }

    #[test]
    fn test_http_payload_is_raw_body() {
        let body = json!({"error": "Access denied for user anonymous"});
        let err = ResourceError::Http {
            status: 403,
            body: body.clone(),
        };
        assert_eq!(err.payload(), body);
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_user_message_hides_body() {
        let err = ResourceError::Http {
            status: 403,
            body: json!("secret internal detail"),
        };
        let msg = err.user_message();
        assert!(msg.contains("Access denied"));
        assert!(!msg.contains("secret"));
    }

    #[test]
    fn test_transport_payload_wraps_message() {
        let payload = ResourceError::Timeout.payload();
        assert_eq!(payload["error"], "Request timed out");
    }
}

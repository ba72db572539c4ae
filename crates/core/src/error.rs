//! View error model.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::Method;

/// Result type used across view behaviors.
pub type ViewResult<T> = Result<T, ViewError>;

/// A permission check refused the request.
///
/// The message is whatever the failing check reported; composite checks
/// forward it untouched so callers can inspect the original text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PermissionDenied {
    message: String,
}

impl PermissionDenied {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Payload rejected by a schema.
///
/// Messages are keyed by field name; errors that do not belong to a single
/// field are stored under [`ValidationError::SCHEMA_KEY`].
#[derive(Debug, Error, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationError {
    messages: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub const SCHEMA_KEY: &'static str = "_schema";

    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::default();
        err.add(field, message);
        err
    }

    /// Error not attributable to a single field.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(Self::SCHEMA_KEY, message)
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.messages
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &BTreeMap<String, Vec<String>> {
        &self.messages
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.messages.get(field).map(Vec::as_slice)
    }
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("validation failed")?;
        let mut sep = ": ";
        for (field, messages) in &self.messages {
            for message in messages {
                write!(f, "{sep}{field}: {message}")?;
                sep = "; ";
            }
        }
        Ok(())
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(value: serde_json::Error) -> Self {
        Self::schema(value.to_string())
    }
}

/// Failure of a single dispatch.
///
/// Every variant is terminal for the call that produced it; nothing here is
/// retried. Mapping variants to HTTP statuses is the host integration's job.
#[derive(Debug, Error)]
pub enum ViewError {
    /// A permission check refused the request (message forwarded unchanged).
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),

    /// The schema collaborator rejected the request payload or query.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A required binding (schema, service) is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The handler result disagrees with the declared response shape.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// No handler is registered for the request method.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(Method),

    /// Serializing the response body failed.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// A service factory failed to build its service.
    #[error("service construction failed: {0}")]
    Service(#[source] anyhow::Error),
}

impl ViewError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn contract(msg: impl Into<String>) -> Self {
        Self::ContractViolation(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn method_not_allowed(method: Method) -> Self {
        Self::MethodNotAllowed(method)
    }

    pub fn service(err: impl Into<anyhow::Error>) -> Self {
        Self::Service(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_displays_message_only() {
        let err = ViewError::from(PermissionDenied::new("KO1"));
        assert_eq!(err.to_string(), "KO1");
    }

    #[test]
    fn validation_messages_accumulate_per_field() {
        let mut err = ValidationError::new("name", "missing");
        err.add("name", "too short");
        err.add("age", "not a number");

        assert_eq!(err.field("name").unwrap(), ["missing", "too short"]);
        assert_eq!(
            err.to_string(),
            "validation failed: age: not a number; name: missing; name: too short"
        );
    }

    #[test]
    fn validation_serializes_as_field_map() {
        let err = ValidationError::new("hello", "expected a string");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"hello": ["expected a string"]})
        );
    }

    #[test]
    fn serde_errors_land_under_schema_key() {
        let json_err = serde_json::from_str::<u8>("\"x\"").unwrap_err();
        let err = ValidationError::from(json_err);
        assert!(err.field(ValidationError::SCHEMA_KEY).is_some());
    }
}

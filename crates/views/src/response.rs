use axum::body::Bytes;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value as JsonValue;

/// Final, encoded payload of a dispatch.
#[derive(Debug)]
pub enum Payload {
    /// Encoded JSON document.
    Json(Bytes),
    /// Handler-built response, passed through.
    Raw(Response),
}

/// Result of a successful dispatch: encoded body plus a status code.
#[derive(Debug)]
pub struct Dispatched {
    status: StatusCode,
    payload: Payload,
}

impl Dispatched {
    pub fn new(status: StatusCode, payload: Payload) -> Self {
        Self { status, payload }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Encoded bytes, if the payload is JSON.
    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.payload {
            Payload::Json(bytes) => Some(bytes),
            Payload::Raw(_) => None,
        }
    }

    /// Decode the JSON payload back into a value.
    pub fn json(&self) -> Option<JsonValue> {
        self.bytes()
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
    }

    pub fn into_parts(self) -> (StatusCode, Payload) {
        (self.status, self.payload)
    }
}

impl IntoResponse for Dispatched {
    fn into_response(self) -> Response {
        match self.payload {
            Payload::Json(bytes) => (
                self.status,
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                bytes,
            )
                .into_response(),
            Payload::Raw(mut response) => {
                *response.status_mut() = self.status;
                response
            }
        }
    }
}

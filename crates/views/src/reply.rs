//! Handler results as they travel through the response pipeline.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value as JsonValue;

/// Body returned by a handler (or produced by a stage).
#[derive(Debug)]
pub enum Body<T> {
    /// No content.
    Empty,
    /// Already-structured JSON; response schemas leave it alone.
    Json(JsonValue),
    /// Single domain object, serialized by the response schema.
    Object(T),
    /// Sequence of domain objects, serialized by the response schema.
    Many(Vec<T>),
    /// JSON the handler already encoded; written out as-is.
    Encoded(Bytes),
    /// Fully formed response, passed through untouched.
    Raw(Response),
}

impl<T> Body<T> {
    /// `Empty` and JSON `null` both count as "no content".
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty | Body::Json(JsonValue::Null))
    }
}

/// `(body, status)` pair; the status is optional until the pipeline infers it.
#[derive(Debug)]
pub struct Reply<T> {
    body: Body<T>,
    status: Option<StatusCode>,
}

impl<T> Reply<T> {
    pub fn new(body: Body<T>) -> Self {
        Self { body, status: None }
    }

    pub fn empty() -> Self {
        Self::new(Body::Empty)
    }

    pub fn json(value: JsonValue) -> Self {
        Self::new(Body::Json(value))
    }

    pub fn object(obj: T) -> Self {
        Self::new(Body::Object(obj))
    }

    pub fn many(objs: impl IntoIterator<Item = T>) -> Self {
        Self::new(Body::Many(objs.into_iter().collect()))
    }

    pub fn encoded(bytes: impl Into<Bytes>) -> Self {
        Self::new(Body::Encoded(bytes.into()))
    }

    pub fn raw(response: Response) -> Self {
        Self::new(Body::Raw(response))
    }

    /// Explicit status; the pipeline never overrides it.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn body(&self) -> &Body<T> {
        &self.body
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn into_parts(self) -> (Body<T>, Option<StatusCode>) {
        (self.body, self.status)
    }

    pub fn from_parts(body: Body<T>, status: Option<StatusCode>) -> Self {
        Self { body, status }
    }
}

impl<T> From<Body<T>> for Reply<T> {
    fn from(value: Body<T>) -> Self {
        Self::new(value)
    }
}

impl<T> From<(Body<T>, StatusCode)> for Reply<T> {
    fn from((body, status): (Body<T>, StatusCode)) -> Self {
        Self::new(body).with_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_json_counts_as_empty() {
        assert!(Body::<()>::Empty.is_empty());
        assert!(Body::<()>::Json(JsonValue::Null).is_empty());
        assert!(!Body::<()>::Json(json!({})).is_empty());
        assert!(!Body::Object(1).is_empty());
    }

    #[test]
    fn explicit_status_is_kept() {
        let reply: Reply<()> = (Body::Json(json!({"a": 1})), StatusCode::IM_A_TEAPOT).into();
        assert_eq!(reply.status(), Some(StatusCode::IM_A_TEAPOT));
        assert!(Reply::<()>::empty().status().is_none());
    }
}

//! Building a [`Request`] from an incoming axum request.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{FromRequest, Query};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;

use viewkit_core::Request;

use crate::errors::json_error;

/// Extractor yielding the framework-neutral [`Request`].
///
/// Method, headers, query string and JSON body are copied over. The body is
/// only read as JSON when the content type says so (`application/json` or
/// any `+json` type); otherwise, and for an empty body, the request carries
/// no JSON payload. Malformed JSON is rejected with a 400. Body size is
/// bounded by axum's `DefaultBodyLimit` (413 when exceeded).
#[derive(Debug, Clone)]
pub struct ViewRequest(pub Request);

#[axum::async_trait]
impl<St> FromRequest<St> for ViewRequest
where
    St: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(
        req: axum::extract::Request,
        state: &St,
    ) -> Result<Self, Self::Rejection> {
        let mut request = Request::new(req.method().as_str());

        let Query(query) = Query::<HashMap<String, String>>::try_from_uri(req.uri())
            .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_query", e.body_text()))?;
        for (key, value) in query {
            request = request.with_query(key, value);
        }

        for (name, value) in req.headers() {
            // Non-visible-ASCII header values are dropped.
            if let Ok(value) = value.to_str() {
                request = request.with_header(name.as_str(), value);
            }
        }

        let is_json = has_json_content_type(req.headers());

        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            let status = rejection.status();
            let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                "payload_too_large"
            } else {
                "unreadable_body"
            };
            json_error(status, code, rejection.body_text())
        })?;

        if is_json && !bytes.is_empty() {
            let json = serde_json::from_slice(&bytes).map_err(|e| {
                json_error(StatusCode::BAD_REQUEST, "malformed_json", e.to_string())
            })?;
            request = request.with_json(json);
        }

        Ok(ViewRequest(request))
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

impl From<ViewRequest> for Request {
    fn from(value: ViewRequest) -> Self {
        value.0
    }
}

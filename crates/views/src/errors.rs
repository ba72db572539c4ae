use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use viewkit_core::ViewError;

/// Map a dispatch failure onto an HTTP error response.
pub fn view_error_to_response(err: ViewError) -> Response {
    match err {
        ViewError::PermissionDenied(denied) => {
            json_error(StatusCode::FORBIDDEN, "permission_denied", denied.message())
        }
        ViewError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "message": errors.to_string(),
                "fields": errors,
            })),
        )
            .into_response(),
        ViewError::MethodNotAllowed(method) => json_error(
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            format!("method {method} not allowed"),
        ),
        err @ ViewError::Configuration(_) => internal("configuration_error", err),
        err @ ViewError::ContractViolation(_) => internal("contract_violation", err),
        err @ ViewError::Encoding(_) => internal("encoding_error", err),
        err @ ViewError::Service(_) => internal("service_error", err),
    }
}

fn internal(code: &'static str, err: ViewError) -> Response {
    tracing::error!(error = %err, code, "view failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, code, err.to_string())
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

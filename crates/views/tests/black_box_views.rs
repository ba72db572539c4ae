use std::borrow::Cow;
use std::sync::Arc;

use axum::body::Body as HttpBody;
use axum::http::{Request as HttpRequest, StatusCode};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower::ServiceExt;

use viewkit_auth::{HasPermission, PermissionPolicy, check, or};
use viewkit_core::Request;
use viewkit_views::{ModelSchemaClass, Reply, SchemaClass, View, routed};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Greeting {
    hello: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct Search {
    q: String,
}

#[derive(Default)]
struct HasToken;

impl HasPermission for HasToken {
    fn has_permission(&self, request: &Request) -> bool {
        request.header("authorization").is_some()
    }

    fn error_message(&self) -> Cow<'static, str> {
        "authentication required".into()
    }
}

#[derive(Default)]
struct IsStaff;

impl HasPermission for IsStaff {
    fn has_permission(&self, request: &Request) -> bool {
        request.header("x-staff") == Some("1")
    }

    fn error_message(&self) -> Cow<'static, str> {
        "staff only".into()
    }
}

fn app() -> Router {
    let greetings: View<Greeting> = View::resources("greetings")
        .schema(ModelSchemaClass::serde())
        .filter_schema(SchemaClass::serde::<Search>())
        .permissions(
            PermissionPolicy::new()
                .with_write(vec![or(check::<HasToken>(), check::<IsStaff>())]),
        )
        .get(|ctx| {
            let all = [
                Greeting { hello: "world".into() },
                Greeting { hello: "there".into() },
            ];
            if ctx.request().query().is_empty() {
                return Ok(Reply::many(all));
            }
            let search: Search = ctx.filters()?;
            Ok(Reply::many(all.into_iter().filter(|g| g.hello == search.q)))
        })
        .post(|ctx| {
            let greeting: Greeting = ctx.validated()?;
            Ok(Reply::object(greeting))
        })
        .delete(|_| Ok(Reply::empty()))
        .build();

    let teapot: View<()> = View::resource("teapot")
        .get(|_| Ok(Reply::json(json!({"short": "stout"})).with_status(StatusCode::IM_A_TEAPOT)))
        .post(|_| Ok(Reply::json(json!({}))))
        .build();

    let broken: View<Greeting> = View::resource("broken")
        .schema(ModelSchemaClass::serde())
        .many(true)
        .get(|_| Ok(Reply::object(Greeting { hello: "world".into() })))
        .build();

    Router::new()
        .route("/greetings", routed(Arc::new(greetings)))
        .route("/teapot", routed(Arc::new(teapot)))
        .route("/broken", routed(Arc::new(broken)))
}

/// Bodies are sent as `application/json` unless a content type is given.
async fn send(
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (StatusCode, Value) {
    viewkit_observability::init();

    let mut builder = HttpRequest::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let has_content_type = headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
    if body.is_some() && !has_content_type {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(|b| HttpBody::from(b.to_string())).unwrap_or_else(HttpBody::empty))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn list_is_serialized_in_many_mode() {
    let (status, body) = send("GET", "/greetings", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"hello": "world"}, {"hello": "there"}]));
}

#[tokio::test]
async fn list_filters_come_from_the_query_string() {
    let (status, body) = send("GET", "/greetings?q=there", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"hello": "there"}]));
}

#[tokio::test]
async fn create_requires_write_permission() {
    let (status, body) = send("POST", "/greetings", &[], Some(r#"{"hello":"you"}"#)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    // First failure of the OR chain is reported.
    assert_eq!(body["message"], "authentication required");

    let staff = [("x-staff", "1")];
    let (status, body) = send("POST", "/greetings", &staff, Some(r#"{"hello":"you"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"hello": "you"}));
}

#[tokio::test]
async fn invalid_body_is_a_validation_error() {
    let (status, body) = send(
        "POST",
        "/greetings",
        &[("authorization", "Bearer t")],
        Some(r#"{"hello": 42}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["fields"]["_schema"].is_array());
}

#[tokio::test]
async fn malformed_json_is_rejected_before_dispatch() {
    let auth = [("authorization", "Bearer t")];
    let (status, body) = send("POST", "/greetings", &auth, Some("{nope")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "malformed_json");
}

#[tokio::test]
async fn non_json_body_is_treated_as_absent() {
    let headers = [("authorization", "Bearer t"), ("content-type", "text/plain")];
    let (status, body) = send("POST", "/greetings", &headers, Some(r#"{"hello":"you"}"#)).await;
    // Validation sees an empty map, so the required field is missing.
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let big = format!(r#"{{"hello":"{}"}}"#, "x".repeat(3 * 1024 * 1024));
    let (status, body) = send("POST", "/greetings", &[("x-staff", "1")], Some(&big)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "payload_too_large");
}

#[tokio::test]
async fn empty_response_is_no_content() {
    let auth = [("authorization", "Bearer t")];
    let (status, body) = send("DELETE", "/greetings", &auth, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body == json!({}) || body.is_null());
}

#[tokio::test]
async fn unrouted_method_is_405() {
    let auth = [("authorization", "Bearer t")];
    let (status, body) = send("PUT", "/greetings", &auth, Some("{}")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "method_not_allowed");
}

#[tokio::test]
async fn explicit_status_passes_through() {
    let (status, body) = send("GET", "/teapot", &[], None).await;
    assert_eq!(status, StatusCode::IM_A_TEAPOT);
    assert_eq!(body, json!({"short": "stout"}));
}

#[tokio::test]
async fn empty_map_on_post_is_created() {
    let (status, body) = send("POST", "/teapot", &[], None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn cardinality_mismatch_is_a_server_error() {
    let (status, body) = send("GET", "/broken", &[], None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "contract_violation");
}

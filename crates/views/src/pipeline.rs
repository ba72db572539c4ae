//! Dispatch pipeline: guards, handler, response stages, encoding.
//!
//! ```text
//! Request
//!   ↓
//! 1. Guards (permission gate first), in order; first failure aborts
//!   ↓
//! 2. Handler → Reply { body, status? }
//!   ↓
//! 3. Response stages, in order (default: schema, then status)
//!   ↓
//! 4. JSON encoding (always last) → Dispatched { status, payload }
//! ```
//!
//! Stages only ever see structured bodies: the encoder is not a stage and
//! cannot be reordered.

use axum::body::Bytes;
use axum::http::StatusCode;
use serde_json::Value as JsonValue;

use viewkit_core::{Method, Request, ViewError, ViewResult};

use crate::reply::{Body, Reply};
use crate::response::{Dispatched, Payload};
use crate::schema::{OptionsHook, ResponseSchemaClass};

/// Runs before the handler; may refuse the request.
pub trait Guard: Send + Sync {
    fn guard(&self, request: &Request) -> ViewResult<()>;
}

/// Transforms a handler result on its way to the encoder.
pub trait ResponseStage<T>: Send + Sync {
    fn name(&self) -> &'static str;

    fn transform(&self, request: &Request, reply: Reply<T>) -> ViewResult<Reply<T>>;
}

/// Serializes domain objects through the response schema.
///
/// Cardinality is enforced, not repaired: a single object under a "many"
/// schema (or a sequence under a single-object schema) is a contract
/// violation. Bodies that are already structured pass through, and the
/// schema is never built for them.
pub struct SchemaStage<T> {
    class: Option<ResponseSchemaClass<T>>,
    options: OptionsHook,
}

impl<T> SchemaStage<T> {
    pub fn new(class: Option<ResponseSchemaClass<T>>, options: OptionsHook) -> Self {
        Self { class, options }
    }
}

impl<T: Send + Sync> ResponseStage<T> for SchemaStage<T> {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn transform(&self, request: &Request, reply: Reply<T>) -> ViewResult<Reply<T>> {
        if !matches!(reply.body(), Body::Object(_) | Body::Many(_)) {
            return Ok(reply);
        }
        // Without a response schema the encoder rejects the object.
        let Some(class) = &self.class else {
            return Ok(reply);
        };

        let options = (self.options)(request);
        let (body, status) = reply.into_parts();
        let json = match body {
            Body::Object(obj) => {
                if options.many {
                    return Err(ViewError::contract(
                        "handler returned a single object, but the response schema expects a list",
                    ));
                }
                class.instantiate(&options).dump(&obj)?
            }
            Body::Many(objs) => {
                if !options.many {
                    return Err(ViewError::contract(
                        "handler returned a list, but the response schema expects a single object",
                    ));
                }
                class.instantiate(&options).dump_many(&objs)?
            }
            other => return Ok(Reply::from_parts(other, status)),
        };

        tracing::debug!(schema = class.name(), many = options.many, "serialized response body");
        Ok(Reply::from_parts(Body::Json(json), status))
    }
}

/// Fills in a missing status code.
///
/// - empty body → 204, whatever the method
/// - `post` → 201
/// - anything else (including unknown methods) → 200
///
/// Raw responses without an explicit status keep their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusStage;

impl StatusStage {
    pub fn infer<T>(method: &Method, body: &Body<T>) -> StatusCode {
        if let Body::Raw(response) = body {
            return response.status();
        }
        if body.is_empty() {
            return StatusCode::NO_CONTENT;
        }
        match method {
            Method::Post => StatusCode::CREATED,
            _ => StatusCode::OK,
        }
    }
}

impl<T> ResponseStage<T> for StatusStage {
    fn name(&self) -> &'static str {
        "status"
    }

    fn transform(&self, request: &Request, reply: Reply<T>) -> ViewResult<Reply<T>> {
        if reply.status().is_some() {
            return Ok(reply);
        }
        let status = Self::infer(request.method(), reply.body());
        Ok(reply.with_status(status))
    }
}

/// Terminal JSON encoding.
///
/// Empty bodies encode as `{}`; raw responses pass through; domain objects
/// that reach this point had no response schema bound, which is a
/// configuration error.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEncoder;

impl JsonEncoder {
    pub fn encode<T>(&self, request: &Request, reply: Reply<T>) -> ViewResult<Dispatched> {
        let status = reply
            .status()
            .unwrap_or_else(|| StatusStage::infer(request.method(), reply.body()));
        let (body, _) = reply.into_parts();

        let payload = match body {
            Body::Empty | Body::Json(JsonValue::Null) => Payload::Json(Bytes::from_static(b"{}")),
            Body::Json(value) => {
                let encoded =
                    serde_json::to_vec(&value).map_err(|e| ViewError::encoding(e.to_string()))?;
                Payload::Json(Bytes::from(encoded))
            }
            Body::Encoded(bytes) => Payload::Json(bytes),
            Body::Raw(response) => Payload::Raw(response),
            Body::Object(_) | Body::Many(_) => {
                return Err(ViewError::configuration("no response schema defined for the view"));
            }
        };

        Ok(Dispatched::new(status, payload))
    }
}

/// Ordered guards and response stages, terminated by the encoder.
pub struct Pipeline<T> {
    guards: Vec<Box<dyn Guard>>,
    stages: Vec<Box<dyn ResponseStage<T>>>,
}

impl<T> Pipeline<T> {
    pub fn builder() -> PipelineBuilder<T> {
        PipelineBuilder {
            guards: Vec::new(),
            stages: Vec::new(),
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run guards, the handler, every stage, then encode.
    pub fn run<F>(&self, request: &Request, handler: F) -> ViewResult<Dispatched>
    where
        F: FnOnce() -> ViewResult<Reply<T>>,
    {
        for guard in &self.guards {
            guard.guard(request)?;
        }

        let mut reply = handler()?;
        for stage in &self.stages {
            reply = stage.transform(request, reply)?;
        }

        JsonEncoder.encode(request, reply)
    }
}

pub struct PipelineBuilder<T> {
    guards: Vec<Box<dyn Guard>>,
    stages: Vec<Box<dyn ResponseStage<T>>>,
}

impl<T> PipelineBuilder<T> {
    pub fn guard(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    pub fn stage(mut self, stage: impl ResponseStage<T> + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn guards(mut self, guards: impl IntoIterator<Item = Box<dyn Guard>>) -> Self {
        self.guards.extend(guards);
        self
    }

    pub fn stages(mut self, stages: impl IntoIterator<Item = Box<dyn ResponseStage<T>>>) -> Self {
        self.stages.extend(stages);
        self
    }

    pub fn build(self) -> Pipeline<T> {
        Pipeline {
            guards: self.guards,
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaOptions;
    use serde::Serialize;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug, Serialize)]
    struct Item {
        hello: &'static str,
    }

    fn standard(many: bool) -> Pipeline<Item> {
        let options: OptionsHook = Arc::new(move |_| SchemaOptions {
            many,
            ..SchemaOptions::default()
        });
        Pipeline::builder()
            .stage(SchemaStage::new(Some(ResponseSchemaClass::serde()), options))
            .stage(StatusStage)
            .build()
    }

    fn run(pipeline: &Pipeline<Item>, method: &str, reply: Reply<Item>) -> ViewResult<Dispatched> {
        pipeline.run(&Request::new(method), || Ok(reply))
    }

    #[test]
    fn implicit_status_codes() {
        let pipeline = standard(false);
        for (method, expected) in [
            ("get", StatusCode::OK),
            ("post", StatusCode::CREATED),
            ("put", StatusCode::OK),
            ("patch", StatusCode::OK),
            ("delete", StatusCode::OK),
            ("report", StatusCode::OK),
        ] {
            let out = run(&pipeline, method, Reply::json(json!({"ok": true}))).unwrap();
            assert_eq!(out.status(), expected, "{method}");
        }
    }

    #[test]
    fn empty_body_is_no_content_and_encodes_empty_map() {
        let pipeline = standard(false);
        for method in ["get", "post", "delete"] {
            let out = run(&pipeline, method, Reply::empty()).unwrap();
            assert_eq!(out.status(), StatusCode::NO_CONTENT);
            assert_eq!(out.json(), Some(json!({})));
        }
    }

    #[test]
    fn empty_map_on_post_is_created() {
        let out = run(&standard(false), "post", Reply::json(json!({}))).unwrap();
        assert_eq!(out.status(), StatusCode::CREATED);
        assert_eq!(out.json(), Some(json!({})));
    }

    #[test]
    fn explicit_status_passes_through() {
        let reply = Reply::json(json!({"tea": "pot"})).with_status(StatusCode::IM_A_TEAPOT);
        let out = run(&standard(false), "get", reply).unwrap();
        assert_eq!(out.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(out.json(), Some(json!({"tea": "pot"})));

        let out = run(&standard(false), "get", Reply::empty().with_status(StatusCode::OK)).unwrap();
        assert_eq!(out.status(), StatusCode::OK);
    }

    #[test]
    fn cardinality_is_enforced() {
        let err = run(&standard(true), "get", Reply::object(Item { hello: "world" })).unwrap_err();
        assert!(matches!(err, ViewError::ContractViolation(_)));

        let err = run(&standard(false), "get", Reply::many([Item { hello: "world" }])).unwrap_err();
        assert!(matches!(err, ViewError::ContractViolation(_)));
    }

    #[test]
    fn structured_bodies_skip_the_schema() {
        let out = run(&standard(true), "get", Reply::json(json!([1, 2, 3]))).unwrap();
        assert_eq!(out.json(), Some(json!([1, 2, 3])));
    }

    #[test]
    fn encoded_bodies_are_written_verbatim() {
        let out = run(&standard(false), "put", Reply::encoded(&b"[1,2]"[..])).unwrap();
        assert_eq!(out.status(), StatusCode::OK);
        assert_eq!(out.bytes().map(|b| b.as_ref()), Some(&b"[1,2]"[..]));
    }

    #[test]
    fn object_without_response_schema_is_a_configuration_error() {
        let pipeline: Pipeline<Item> = Pipeline::builder().stage(StatusStage).build();
        let err = run(&pipeline, "get", Reply::object(Item { hello: "world" })).unwrap_err();
        assert!(matches!(err, ViewError::Configuration(_)));
        assert_eq!(
            err.to_string(),
            "configuration error: no response schema defined for the view"
        );

        let err = run(&pipeline, "get", Reply::many([Item { hello: "world" }])).unwrap_err();
        assert!(matches!(err, ViewError::Configuration(_)));
    }

    #[test]
    fn guards_run_before_the_handler() {
        struct Refuse;

        impl Guard for Refuse {
            fn guard(&self, _request: &Request) -> ViewResult<()> {
                Err(ViewError::configuration("nope"))
            }
        }

        let pipeline: Pipeline<Item> = Pipeline::builder().guard(Refuse).build();
        let mut called = false;
        let result = pipeline.run(&Request::new("get"), || {
            called = true;
            Ok(Reply::empty())
        });
        assert!(result.is_err());
        assert!(!called);
    }

    #[test]
    fn stages_run_in_insertion_order() {
        let pipeline = standard(false);
        assert_eq!(pipeline.stage_names(), vec!["schema", "status"]);
    }
}

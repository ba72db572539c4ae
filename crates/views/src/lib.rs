//! Composable request-handler behaviors on top of axum.
//!
//! A [`View`] bundles a permission policy, schema bindings and a service
//! locator, and runs every handler through the same pipeline:
//! permission gate → handler → schema serialization → status inference →
//! JSON encoding.

pub mod authz;
pub mod context;
pub mod errors;
pub mod extract;
pub mod pipeline;
pub mod reply;
pub mod response;
pub mod schema;
pub mod service;
pub mod view;

use std::sync::Arc;

use axum::routing::{MethodRouter, any};

pub use authz::PermissionGate;
pub use context::ViewContext;
pub use errors::{json_error, view_error_to_response};
pub use extract::ViewRequest;
pub use pipeline::{Guard, JsonEncoder, Pipeline, ResponseStage, SchemaStage, StatusStage};
pub use reply::{Body, Reply};
pub use response::{Dispatched, Payload};
pub use schema::{
    Dump, ModelSchemaClass, ResponseSchemaClass, Schema, SchemaBinding, SchemaClass, SchemaOptions,
    SerdeSchema,
};
pub use service::{ServiceLocator, ServiceOptions};
pub use view::{Handler, View, ViewBuilder};

/// Mount a view on every HTTP method of a route.
pub fn routed<T, S>(view: Arc<View<T, S>>) -> MethodRouter
where
    T: Send + Sync + 'static,
    S: Send + Sync + 'static,
{
    any(move |ViewRequest(request): ViewRequest| {
        let view = view.clone();
        async move { view.respond(&request) }
    })
}

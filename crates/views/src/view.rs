//! Views: a permission policy, schema bindings, a service locator and
//! per-method handlers, run through one dispatch pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use viewkit_auth::PermissionPolicy;
use viewkit_core::{Method, Request, ViewError, ViewResult};

use crate::authz::PermissionGate;
use crate::context::ViewContext;
use crate::errors::view_error_to_response;
use crate::pipeline::{Guard, Pipeline, ResponseStage, SchemaStage, StatusStage};
use crate::reply::Reply;
use crate::response::Dispatched;
use crate::schema::{
    ModelSchemaClass, ResponseSchemaClass, SchemaBinding, SchemaBindings, SchemaOptions,
};
use crate::service::{ServiceLocator, ServiceOptions};

/// Method handler registered on a view.
pub type Handler<T, S> =
    Arc<dyn Fn(&ViewContext<'_, T, S>) -> ViewResult<Reply<T>> + Send + Sync>;

pub struct View<T, S = ()> {
    name: &'static str,
    pipeline: Pipeline<T>,
    schemas: SchemaBindings<T>,
    services: ServiceLocator<S>,
    handlers: HashMap<Method, Handler<T, S>>,
}

impl<T: Send + Sync + 'static, S: 'static> View<T, S> {
    pub fn builder(name: &'static str) -> ViewBuilder<T, S> {
        ViewBuilder {
            name,
            policy: PermissionPolicy::default(),
            guards: Vec::new(),
            stages: Vec::new(),
            schemas: SchemaBindings::default(),
            services: ServiceLocator::default(),
            handlers: HashMap::new(),
        }
    }

    /// Single-object resource: responses are never in "many" mode.
    pub fn resource(name: &'static str) -> ViewBuilder<T, S> {
        Self::builder(name).many(false)
    }

    /// Collection resource: `get` responses are serialized in "many" mode.
    pub fn resources(name: &'static str) -> ViewBuilder<T, S> {
        Self::builder(name).response_options(|request: &Request| SchemaOptions {
            many: *request.method() == Method::Get,
            ..SchemaOptions::default()
        })
    }
}

impl<T, S> View<T, S> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn schemas(&self) -> &SchemaBindings<T> {
        &self.schemas
    }

    pub fn services(&self) -> &ServiceLocator<S> {
        &self.services
    }

    pub fn allowed_methods(&self) -> Vec<&Method> {
        let mut methods: Vec<_> = self.handlers.keys().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Run `handler` through the view: permission gate, guards, handler,
    /// response stages, encoding.
    pub fn dispatch<F>(&self, request: &Request, handler: F) -> ViewResult<Dispatched>
    where
        F: FnOnce(&ViewContext<'_, T, S>) -> ViewResult<Reply<T>>,
    {
        let span = tracing::info_span!(
            "dispatch",
            request_id = %Uuid::now_v7(),
            method = %request.method(),
            view = self.name,
        );
        let _enter = span.enter();

        let ctx = ViewContext::new(request, &self.schemas, &self.services);
        let result = self.pipeline.run(request, || handler(&ctx));

        match &result {
            Ok(dispatched) => tracing::debug!(status = dispatched.status().as_u16(), "dispatched"),
            Err(err) => tracing::debug!(error = %err, "dispatch failed"),
        }
        result
    }

    /// Dispatch to the handler registered for the request method.
    ///
    /// Guards still run first; a method without a handler then fails with
    /// [`ViewError::MethodNotAllowed`].
    pub fn handle(&self, request: &Request) -> ViewResult<Dispatched> {
        let handler = self.handlers.get(request.method()).cloned();
        self.dispatch(request, |ctx| match handler {
            Some(handler) => handler(ctx),
            None => Err(ViewError::method_not_allowed(request.method().clone())),
        })
    }

    /// [`Self::handle`], rendered as an HTTP response.
    pub fn respond(&self, request: &Request) -> Response {
        match self.handle(request) {
            Ok(dispatched) => dispatched.into_response(),
            Err(err) => view_error_to_response(err),
        }
    }
}

impl<T, S> core::fmt::Debug for View<T, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("stages", &self.pipeline.stage_names())
            .field("methods", &self.allowed_methods())
            .finish_non_exhaustive()
    }
}

/// Configuration for a [`View`]; read-only once built.
pub struct ViewBuilder<T, S = ()> {
    name: &'static str,
    policy: PermissionPolicy,
    guards: Vec<Box<dyn Guard>>,
    stages: Vec<Box<dyn ResponseStage<T>>>,
    schemas: SchemaBindings<T>,
    services: ServiceLocator<S>,
    handlers: HashMap<Method, Handler<T, S>>,
}

impl<T: Send + Sync + 'static, S: 'static> ViewBuilder<T, S> {
    pub fn permissions(mut self, policy: PermissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Extra guard, run after the permission gate.
    pub fn guard(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    /// Extra response stage, run after schema serialization and status
    /// inference and before encoding.
    pub fn stage(mut self, stage: impl ResponseStage<T> + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Schema used in both directions unless a narrower binding exists.
    pub fn schema(mut self, class: ModelSchemaClass<T>) -> Self {
        self.schemas.set_generic(class);
        self
    }

    pub fn request_schema(mut self, binding: impl Into<SchemaBinding>) -> Self {
        self.schemas.set_request(binding.into());
        self
    }

    pub fn request_options(mut self, options: SchemaOptions) -> Self {
        self.schemas.set_request_options(options);
        self
    }

    pub fn method_schema(
        mut self,
        method: impl Into<Method>,
        binding: impl Into<SchemaBinding>,
    ) -> Self {
        self.schemas.set_method(method.into(), binding.into());
        self
    }

    pub fn response_schema(mut self, class: ResponseSchemaClass<T>) -> Self {
        self.schemas.set_response(class);
        self
    }

    pub fn response_options<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request) -> SchemaOptions + Send + Sync + 'static,
    {
        self.schemas.set_response_options(Arc::new(hook));
        self
    }

    pub fn many(self, many: bool) -> Self {
        self.response_options(move |_: &Request| SchemaOptions {
            many,
            ..SchemaOptions::default()
        })
    }

    pub fn filter_schema(mut self, binding: impl Into<SchemaBinding>) -> Self {
        self.schemas.set_filter(binding.into());
        self
    }

    pub fn service<F>(mut self, factory: F) -> Self
    where
        F: Fn(ServiceOptions) -> anyhow::Result<S> + Send + Sync + 'static,
    {
        self.services.set_factory(Arc::new(factory));
        self
    }

    pub fn service_options<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request) -> ServiceOptions + Send + Sync + 'static,
    {
        self.services.set_options(Arc::new(hook));
        self
    }

    pub fn route<F>(mut self, method: impl Into<Method>, handler: F) -> Self
    where
        F: Fn(&ViewContext<'_, T, S>) -> ViewResult<Reply<T>> + Send + Sync + 'static,
    {
        self.handlers.insert(method.into(), Arc::new(handler));
        self
    }

    pub fn get<F>(self, handler: F) -> Self
    where
        F: Fn(&ViewContext<'_, T, S>) -> ViewResult<Reply<T>> + Send + Sync + 'static,
    {
        self.route(Method::Get, handler)
    }

    pub fn post<F>(self, handler: F) -> Self
    where
        F: Fn(&ViewContext<'_, T, S>) -> ViewResult<Reply<T>> + Send + Sync + 'static,
    {
        self.route(Method::Post, handler)
    }

    pub fn put<F>(self, handler: F) -> Self
    where
        F: Fn(&ViewContext<'_, T, S>) -> ViewResult<Reply<T>> + Send + Sync + 'static,
    {
        self.route(Method::Put, handler)
    }

    pub fn patch<F>(self, handler: F) -> Self
    where
        F: Fn(&ViewContext<'_, T, S>) -> ViewResult<Reply<T>> + Send + Sync + 'static,
    {
        self.route(Method::Patch, handler)
    }

    pub fn delete<F>(self, handler: F) -> Self
    where
        F: Fn(&ViewContext<'_, T, S>) -> ViewResult<Reply<T>> + Send + Sync + 'static,
    {
        self.route(Method::Delete, handler)
    }

    pub fn build(self) -> View<T, S> {
        let schema_stage = SchemaStage::new(
            self.schemas.response_class(),
            self.schemas.response_options(),
        );
        let pipeline = Pipeline::builder()
            .guard(PermissionGate::new(self.policy))
            .guards(self.guards)
            .stage(schema_stage)
            .stage(StatusStage)
            .stages(self.stages)
            .build();

        View {
            name: self.name,
            pipeline,
            schemas: self.schemas,
            services: self.services,
            handlers: self.handlers,
        }
    }
}

use serde::de::DeserializeOwned;
use serde_json::{Map as JsonMap, Value as JsonValue};

use viewkit_core::{Method, Request, ValidationError, ViewResult};

use crate::schema::SchemaBindings;
use crate::service::{ServiceLocator, ServiceOptions};

/// Per-dispatch view of the request and the view's collaborators.
///
/// Handed to handlers; borrows everything, owns nothing.
pub struct ViewContext<'a, T, S = ()> {
    request: &'a Request,
    schemas: &'a SchemaBindings<T>,
    services: &'a ServiceLocator<S>,
}

impl<'a, T, S> ViewContext<'a, T, S> {
    pub fn new(
        request: &'a Request,
        schemas: &'a SchemaBindings<T>,
        services: &'a ServiceLocator<S>,
    ) -> Self {
        Self {
            request,
            schemas,
            services,
        }
    }

    pub fn request(&self) -> &'a Request {
        self.request
    }

    pub fn method(&self) -> &'a Method {
        self.request.method()
    }

    /// Request body, validated by the request schema.
    ///
    /// A request without a JSON body (or with a literal `null`) yields an
    /// empty map and the schema is not consulted.
    pub fn validated_data(&self) -> ViewResult<JsonValue> {
        let Some(json) = self.request.json().filter(|json| !json.is_null()) else {
            return Ok(JsonValue::Object(JsonMap::new()));
        };

        let schema = self.schemas.request_schema(self.request)?;
        Ok(schema.load(json.clone())?)
    }

    /// Query string, validated by the filter schema.
    pub fn filter_data(&self) -> ViewResult<JsonValue> {
        let schema = self.schemas.filter_schema()?;
        Ok(schema.load(self.request.query_json())?)
    }

    pub fn validated<D: DeserializeOwned>(&self) -> ViewResult<D> {
        let data = self.validated_data()?;
        Ok(serde_json::from_value(data).map_err(ValidationError::from)?)
    }

    pub fn filters<D: DeserializeOwned>(&self) -> ViewResult<D> {
        let data = self.filter_data()?;
        Ok(serde_json::from_value(data).map_err(ValidationError::from)?)
    }

    pub fn service(&self) -> ViewResult<S> {
        self.services.get_service(self.request, ServiceOptions::new())
    }

    /// Like [`Self::service`], with `overrides` taking precedence over the
    /// view's options hook.
    pub fn service_with(&self, overrides: ServiceOptions) -> ViewResult<S> {
        self.services.get_service(self.request, overrides)
    }
}

//! Service locator: a configured factory plus per-request options.

use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as JsonValue};

use viewkit_core::{Request, ViewError, ViewResult};

/// Keyword options handed to a service factory.
pub type ServiceOptions = JsonMap<String, JsonValue>;

/// Builds a service from its options.
pub type ServiceFactory<S> = Arc<dyn Fn(ServiceOptions) -> anyhow::Result<S> + Send + Sync>;

/// Computes the baseline options for a request.
pub type ServiceOptionsHook = Arc<dyn Fn(&Request) -> ServiceOptions + Send + Sync>;

pub struct ServiceLocator<S> {
    factory: Option<ServiceFactory<S>>,
    options: ServiceOptionsHook,
}

impl<S> Default for ServiceLocator<S> {
    fn default() -> Self {
        Self {
            factory: None,
            options: Arc::new(|_| ServiceOptions::new()),
        }
    }
}

impl<S> Clone for ServiceLocator<S> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            options: self.options.clone(),
        }
    }
}

impl<S> ServiceLocator<S> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(ServiceOptions) -> anyhow::Result<S> + Send + Sync + 'static,
    {
        Self {
            factory: Some(Arc::new(factory)),
            ..Self::default()
        }
    }

    pub fn set_factory(&mut self, factory: ServiceFactory<S>) {
        self.factory = Some(factory);
    }

    pub fn set_options(&mut self, hook: ServiceOptionsHook) {
        self.options = hook;
    }

    pub fn is_configured(&self) -> bool {
        self.factory.is_some()
    }

    /// Construct the service.
    ///
    /// Options come from the hook, then `overrides` on top (overrides win).
    pub fn get_service(&self, request: &Request, overrides: ServiceOptions) -> ViewResult<S> {
        let factory = self
            .factory
            .as_ref()
            .ok_or_else(|| ViewError::configuration("no service factory defined for the view"))?;

        let mut options = (self.options)(request);
        options.extend(overrides);

        factory(options).map_err(|e| {
            tracing::warn!(error = %e, "service construction failed");
            ViewError::service(e)
        })
    }
}

impl<S> core::fmt::Debug for ServiceLocator<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServiceLocator")
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

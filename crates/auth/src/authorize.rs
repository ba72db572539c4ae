use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use viewkit_core::{Access, Method, PermissionDenied, Request};

use crate::PermissionExpr;

/// Computes the permissions for one request.
pub type PermissionHook = Arc<dyn Fn(&Request) -> Vec<PermissionExpr> + Send + Sync>;

/// Which configuration level produced the permissions for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum PermissionSource {
    /// Per-method hook (`get`, `post`, ...).
    Method(String),
    /// General read/write hook.
    Access(AccessName),
    /// View-wide default list.
    Default,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessName {
    Read,
    Write,
}

impl From<Access> for AccessName {
    fn from(value: Access) -> Self {
        match value {
            Access::Read => AccessName::Read,
            Access::Write => AccessName::Write,
        }
    }
}

/// Permission configuration of a view.
///
/// Resolution picks exactly one source, most specific first:
///
/// 1. the hook registered for the request method,
/// 2. the read (`get`) or write (`post`/`put`/`patch`/`delete`) hook,
/// 3. the default list (empty unless configured).
///
/// Sources never merge.
#[derive(Clone, Default)]
pub struct PermissionPolicy {
    defaults: Vec<PermissionExpr>,
    general: HashMap<Access, PermissionHook>,
    specific: HashMap<Method, PermissionHook>,
}

impl PermissionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults<I>(mut self, permissions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PermissionExpr>,
    {
        self.defaults = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn on_read<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request) -> Vec<PermissionExpr> + Send + Sync + 'static,
    {
        self.general.insert(Access::Read, Arc::new(hook));
        self
    }

    pub fn on_write<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request) -> Vec<PermissionExpr> + Send + Sync + 'static,
    {
        self.general.insert(Access::Write, Arc::new(hook));
        self
    }

    pub fn on_method<F>(mut self, method: impl Into<Method>, hook: F) -> Self
    where
        F: Fn(&Request) -> Vec<PermissionExpr> + Send + Sync + 'static,
    {
        self.specific.insert(method.into(), Arc::new(hook));
        self
    }

    pub fn with_read(self, permissions: Vec<PermissionExpr>) -> Self {
        self.on_read(move |_| permissions.clone())
    }

    pub fn with_write(self, permissions: Vec<PermissionExpr>) -> Self {
        self.on_write(move |_| permissions.clone())
    }

    pub fn with_method(self, method: impl Into<Method>, permissions: Vec<PermissionExpr>) -> Self {
        self.on_method(method, move |_| permissions.clone())
    }

    pub fn source(&self, method: &Method) -> PermissionSource {
        if self.specific.contains_key(method) {
            return PermissionSource::Method(method.as_str().to_string());
        }
        match method.access() {
            Some(access) if self.general.contains_key(&access) => {
                PermissionSource::Access(access.into())
            }
            _ => PermissionSource::Default,
        }
    }

    pub fn resolve(&self, request: &Request) -> Vec<PermissionExpr> {
        let method = request.method();
        if let Some(hook) = self.specific.get(method) {
            return hook(request);
        }
        if let Some(hook) = method.access().and_then(|a| self.general.get(&a)) {
            return hook(request);
        }
        self.defaults.clone()
    }

    /// Resolve permissions and describe the outcome (audit/debug aid).
    pub fn explain(&self, request: &Request) -> PermissionResolution {
        let permissions = self.resolve(request);
        let outcome = permissions.iter().try_for_each(|p| p.evaluate(request));
        PermissionResolution {
            method: request.method().as_str().to_string(),
            source: self.source(request.method()),
            permissions: permissions.iter().map(ToString::to_string).collect(),
            granted: outcome.is_ok(),
            denial: outcome.err().map(|e| e.message().to_string()),
        }
    }
}

impl core::fmt::Debug for PermissionPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut general: Vec<_> = self.general.keys().collect();
        general.sort_by_key(|a| matches!(a, Access::Write));
        let mut specific: Vec<_> = self.specific.keys().map(Method::as_str).collect();
        specific.sort_unstable();
        f.debug_struct("PermissionPolicy")
            .field("defaults", &self.defaults)
            .field("general", &general)
            .field("specific", &specific)
            .finish()
    }
}

/// Detailed account of a permission decision.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionResolution {
    pub method: String,
    pub source: PermissionSource,
    /// Rendered expressions, in evaluation order.
    pub permissions: Vec<String>,
    pub granted: bool,
    pub denial: Option<String>,
}

/// Run the permissions that apply to `request`, in order.
///
/// - No IO
/// - No panics
/// - First failure wins and is returned unchanged
pub fn authorize(policy: &PermissionPolicy, request: &Request) -> Result<(), PermissionDenied> {
    let permissions = policy.resolve(request);
    tracing::debug!(
        method = %request.method(),
        source = ?policy.source(request.method()),
        count = permissions.len(),
        "resolved permissions"
    );

    for permission in &permissions {
        if let Err(e) = permission.evaluate(request) {
            tracing::warn!(
                method = %request.method(),
                permission = %permission,
                reason = %e,
                "permission denied"
            );
            return Err(e);
        }
    }

    Ok(())
}

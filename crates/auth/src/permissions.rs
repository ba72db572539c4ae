use std::borrow::Cow;
use std::sync::Arc;

use viewkit_core::{PermissionDenied, Request};

/// A single permission check.
///
/// Succeeds silently or fails with [`PermissionDenied`] carrying a
/// human-readable message.
pub trait PermissionCheck: Send + Sync {
    fn check_permission(&self, request: &Request) -> Result<(), PermissionDenied>;
}

/// Predicate-style check: a yes/no answer plus the message used on refusal.
///
/// Every `HasPermission` is a [`PermissionCheck`].
pub trait HasPermission: Send + Sync {
    fn has_permission(&self, request: &Request) -> bool;

    fn error_message(&self) -> Cow<'static, str> {
        Cow::Borrowed("permission denied")
    }
}

impl<P: HasPermission> PermissionCheck for P {
    fn check_permission(&self, request: &Request) -> Result<(), PermissionDenied> {
        if self.has_permission(request) {
            Ok(())
        } else {
            Err(PermissionDenied::new(self.error_message()))
        }
    }
}

/// Leaf of a permission expression: one check, bound by type or by instance.
///
/// Type-bound leaves build a fresh check for every evaluation; instance-bound
/// leaves reuse the instance they were given.
#[derive(Clone)]
pub struct Leaf {
    name: &'static str,
    source: LeafSource,
}

#[derive(Clone)]
enum LeafSource {
    Type(fn() -> Box<dyn PermissionCheck>),
    Instance(Arc<dyn PermissionCheck>),
}

fn construct<P: PermissionCheck + Default + 'static>() -> Box<dyn PermissionCheck> {
    Box::new(P::default())
}

impl Leaf {
    pub fn of<P: PermissionCheck + Default + 'static>() -> Self {
        Self {
            name: short_type_name::<P>(),
            source: LeafSource::Type(construct::<P>),
        }
    }

    pub fn instance<P: PermissionCheck + 'static>(check: P) -> Self {
        Self {
            name: short_type_name::<P>(),
            source: LeafSource::Instance(Arc::new(check)),
        }
    }

    /// Type name of the wrapped check (without its module path).
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn check_permission(&self, request: &Request) -> Result<(), PermissionDenied> {
        match &self.source {
            LeafSource::Type(make) => make().check_permission(request),
            LeafSource::Instance(check) => check.check_permission(request),
        }
    }
}

impl core::fmt::Debug for Leaf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = match self.source {
            LeafSource::Type(_) => "type",
            LeafSource::Instance(_) => "instance",
        };
        f.debug_struct("Leaf")
            .field("name", &self.name)
            .field("bound", &kind)
            .finish()
    }
}

fn short_type_name<P: ?Sized>() -> &'static str {
    let full = std::any::type_name::<P>();
    // Keep generics intact: only strip the path before the first `<`.
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

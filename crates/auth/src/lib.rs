//! `viewkit-auth`: permission checks and their composition.
//!
//! This crate is intentionally decoupled from HTTP: checks only see the
//! framework-neutral [`viewkit_core::Request`].

pub mod authorize;
pub mod expression;
pub mod permissions;

pub use authorize::{
    AccessName, PermissionHook, PermissionPolicy, PermissionResolution, PermissionSource, authorize,
};
pub use expression::{PermissionExpr, all, and, any, check, instance, or};
pub use permissions::{HasPermission, Leaf, PermissionCheck};
pub use viewkit_core::PermissionDenied;

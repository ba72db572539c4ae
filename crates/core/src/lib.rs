//! `viewkit-core`: primitives shared by every view behavior.
//!
//! This crate is intentionally decoupled from any HTTP framework: it only
//! knows about method names, the inbound request accessor and the error model.

pub mod error;
pub mod method;
pub mod request;

pub use error::{PermissionDenied, ValidationError, ViewError, ViewResult};
pub use method::{Access, Method};
pub use request::Request;

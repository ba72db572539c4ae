//! View-side permission guard.
//!
//! This enforces the view's permission policy before the handler runs,
//! while keeping the checks themselves HTTP-agnostic.

use viewkit_auth::{PermissionPolicy, authorize};
use viewkit_core::{Request, ViewResult};

use crate::pipeline::Guard;

/// Guard running a [`PermissionPolicy`] (implicit AND over the resolved list).
#[derive(Debug, Clone, Default)]
pub struct PermissionGate {
    policy: PermissionPolicy,
}

impl PermissionGate {
    pub fn new(policy: PermissionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PermissionPolicy {
        &self.policy
    }
}

impl Guard for PermissionGate {
    fn guard(&self, request: &Request) -> ViewResult<()> {
        authorize(&self.policy, request)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewkit_auth::{HasPermission, check};
    use viewkit_core::ViewError;

    #[derive(Default)]
    struct IsAdmin;

    impl HasPermission for IsAdmin {
        fn has_permission(&self, request: &Request) -> bool {
            request.header("x-role") == Some("admin")
        }

        fn error_message(&self) -> std::borrow::Cow<'static, str> {
            "admin only".into()
        }
    }

    #[test]
    fn denial_surfaces_original_message() {
        let policy = PermissionPolicy::new().with_write(vec![check::<IsAdmin>()]);
        let gate = PermissionGate::new(policy);

        assert!(gate.guard(&Request::new("get")).is_ok());

        let err = gate.guard(&Request::new("post")).unwrap_err();
        let ViewError::PermissionDenied(denied) = err else {
            panic!("expected PermissionDenied");
        };
        assert_eq!(denied.message(), "admin only");

        let admin = Request::new("post").with_header("X-Role", "admin");
        assert!(gate.guard(&admin).is_ok());
    }
}

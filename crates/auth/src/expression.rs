//! Boolean composition of permission checks.
//!
//! ```text
//! and(A, or(B, C))        A must pass, then B or C
//! check::<A>() & (check::<B>() | instance(C::new()))
//! ```
//!
//! Evaluation is strictly left-to-right and short-circuits:
//!
//! - `And` stops at the first failure and returns it.
//! - `Or` stops at the first success; when every child fails it returns the
//!   failure of the **leftmost** child.
//! - Empty `And`/`Or` nodes succeed.

use core::ops::{BitAnd, BitOr};

use viewkit_core::{PermissionDenied, Request};

use crate::permissions::{Leaf, PermissionCheck};

/// Immutable permission tree.
#[derive(Clone)]
pub enum PermissionExpr {
    Leaf(Leaf),
    And(Vec<PermissionExpr>),
    Or(Vec<PermissionExpr>),
}

impl PermissionExpr {
    pub fn evaluate(&self, request: &Request) -> Result<(), PermissionDenied> {
        match self {
            PermissionExpr::Leaf(leaf) => {
                let outcome = leaf.check_permission(request);
                if let Err(e) = &outcome {
                    tracing::debug!(check = leaf.name(), reason = %e, "permission check failed");
                }
                outcome
            }
            PermissionExpr::And(children) => {
                for child in children {
                    child.evaluate(request)?;
                }
                Ok(())
            }
            PermissionExpr::Or(children) => {
                let mut first_failure = None;
                for child in children {
                    match child.evaluate(request) {
                        Ok(()) => return Ok(()),
                        Err(e) => {
                            first_failure.get_or_insert(e);
                        }
                    }
                }
                match first_failure {
                    Some(e) => Err(e),
                    None => Ok(()),
                }
            }
        }
    }

    pub fn and(self, other: impl Into<PermissionExpr>) -> Self {
        PermissionExpr::And(vec![self, other.into()])
    }

    pub fn or(self, other: impl Into<PermissionExpr>) -> Self {
        PermissionExpr::Or(vec![self, other.into()])
    }
}

impl PermissionCheck for PermissionExpr {
    fn check_permission(&self, request: &Request) -> Result<(), PermissionDenied> {
        self.evaluate(request)
    }
}

impl From<Leaf> for PermissionExpr {
    fn from(value: Leaf) -> Self {
        PermissionExpr::Leaf(value)
    }
}

impl<R: Into<PermissionExpr>> BitAnd<R> for PermissionExpr {
    type Output = PermissionExpr;

    fn bitand(self, rhs: R) -> Self::Output {
        self.and(rhs)
    }
}

impl<R: Into<PermissionExpr>> BitOr<R> for PermissionExpr {
    type Output = PermissionExpr;

    fn bitor(self, rhs: R) -> Self::Output {
        self.or(rhs)
    }
}

impl core::fmt::Display for PermissionExpr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (children, op) = match self {
            PermissionExpr::Leaf(leaf) => return f.write_str(leaf.name()),
            PermissionExpr::And(children) => (children, " & "),
            PermissionExpr::Or(children) => (children, " | "),
        };
        f.write_str("(")?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(op)?;
            }
            write!(f, "{child}")?;
        }
        f.write_str(")")
    }
}

impl core::fmt::Debug for PermissionExpr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PermissionExpr{self}")
    }
}

/// Single-leaf expression for a check type (fresh instance per evaluation).
pub fn check<P: PermissionCheck + Default + 'static>() -> PermissionExpr {
    PermissionExpr::Leaf(Leaf::of::<P>())
}

/// Single-leaf expression around an existing check instance.
pub fn instance<P: PermissionCheck + 'static>(check: P) -> PermissionExpr {
    PermissionExpr::Leaf(Leaf::instance(check))
}

pub fn and(left: impl Into<PermissionExpr>, right: impl Into<PermissionExpr>) -> PermissionExpr {
    left.into().and(right)
}

pub fn or(left: impl Into<PermissionExpr>, right: impl Into<PermissionExpr>) -> PermissionExpr {
    left.into().or(right)
}

/// N-ary `And`.
pub fn all<I>(exprs: I) -> PermissionExpr
where
    I: IntoIterator,
    I::Item: Into<PermissionExpr>,
{
    PermissionExpr::And(exprs.into_iter().map(Into::into).collect())
}

/// N-ary `Or`.
pub fn any<I>(exprs: I) -> PermissionExpr
where
    I: IntoIterator,
    I::Item: Into<PermissionExpr>,
{
    PermissionExpr::Or(exprs.into_iter().map(Into::into).collect())
}

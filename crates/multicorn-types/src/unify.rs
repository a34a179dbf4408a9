//! Type unification by widening.
//!
//! `common_type` computes the narrowest type both arguments are assignable
//! to. There is no failure mode: when no tighter bound exists the result is
//! the opaque `Unknown` type. Mismatched primitives are widened, never
//! reported.

use crate::ty::Ty;

/// The narrowest type covering both `a` and `b`.
///
/// - equal types unify to themselves (records included)
/// - two lists unify to a list of the common element type
/// - anything else widens to `Unknown`
///
/// The operation is pure, symmetric and idempotent.
pub fn common_type(a: &Ty, b: &Ty) -> Ty {
    match (a, b) {
        _ if a == b => a.clone(),
        (Ty::List(x), Ty::List(y)) => Ty::list(common_type(x, y)),
        _ => Ty::unknown(),
    }
}

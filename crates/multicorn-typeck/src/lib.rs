//! Multicorn type checker: static return-type inference for request trees.
//!
//! Given a request tree, computes the type of its result (and of any of
//! its sub-requests) without executing it, so planners and validators can
//! reject or rewrite a request before touching storage.
//!
//! Each node kind has a typing rule. Rules live in a [`WrapperRegistry`]
//! keyed by kind; a kind without a rule of its own uses the rule of its
//! nearest ancestor in the kind taxonomy, which is how operator families
//! share one rule and how extension operators plug in without touching
//! the engine.
//!
//! # Architecture
//!
//! - [`registry`]: Kind -> rule table with taxonomy fallback
//! - [`wrapper`]: Wrapped nodes with normalized operands
//! - [`builtins`]: Built-in rules and their registration
//! - [`contexts`]: Persistent stack of scope types
//! - [`infer`]: Inference entry points and batch checking
//! - [`error`]: Type errors with node paths
//! - [`diagnostics`]: Ariadne and JSON rendering of type errors

pub mod builtins;
pub mod contexts;
pub mod diagnostics;
pub mod error;
pub mod infer;
pub mod registry;
pub mod wrapper;

pub use contexts::Contexts;
pub use error::TypeError;
pub use infer::{infer, infer_in, TypeckResult};
pub use registry::{rule_fn, ReturnTypeRule, RuleRef, WrapperRegistry};
pub use wrapper::{Operands, Shape, SortKey, Wrapped};

use multicorn_requests::Request;

/// Type-check a batch of requests against the built-in rules.
///
/// Every request is typed independently; one failing request does not
/// stop the others.
pub fn check<'a>(requests: impl IntoIterator<Item = &'a Request>) -> TypeckResult {
    WrapperRegistry::shared().check_all(requests)
}

//! Multicorn value types.
//!
//! The type domain inferred for request trees: primitives, homogeneous lists
//! and records with named fields. Types are plain immutable values compared
//! structurally.
//!
//! # Architecture
//!
//! - [`ty`]: Core type representation (`Ty`, `Prim`) and its textual form
//! - [`unify`]: The widening `common_type` operation

pub mod ty;
pub mod unify;

pub use ty::{ParseTyError, Prim, Ty};
pub use unify::common_type;

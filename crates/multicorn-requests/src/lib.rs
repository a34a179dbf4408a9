//! Multicorn request trees.
//!
//! A request is a composable query expression (literals, stored
//! collections, field access, filters, maps, groupings, sorts, aggregates,
//! arithmetic and boolean operators) that storage backends execute and that
//! `multicorn-typeck` types statically.
//!
//! # Architecture
//!
//! - [`kind`]: Kind identifiers, the operator table and the kind taxonomy
//! - [`value`]: Literal values
//! - [`request`]: The `Request` tree and its construction helpers
//! - [`path`]: Addressing nodes by child-index path
//! - [`catalog`]: Declared stored collections
//! - [`build`]: Total construction from the generic "kind + fields + children" form
//! - [`printer`]: S-expression rendering with node spans

pub mod build;
pub mod catalog;
pub mod kind;
pub mod path;
pub mod printer;
pub mod request;
pub mod value;

pub use build::{BuildError, RawArg, RawRequest, RequestBuilder};
pub use catalog::Catalog;
pub use kind::{kinds, Arity, Family, KindId, Op, Operator, OperatorSpec, Taxonomy, OPERATORS};
pub use path::{NodePath, ParsePathError};
pub use request::{Operation, Request, Storage};
pub use value::{SliceBounds, Value};

//! Type errors with node provenance.
//!
//! Every error carries the [`NodePath`] of the node that produced it,
//! relative to the root handed to the engine, so diagnostics can point at
//! the exact sub-request.

use std::fmt;

use multicorn_requests::{KindId, NodePath};
use multicorn_types::Ty;

/// A failure to type a request tree.
///
/// None of these are recoverable within one inference call: the first error
/// anywhere in the subtree fails the whole call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeError {
    /// Neither the node's kind nor any of its fallback kinds has a rule.
    UnresolvedKind { kind: KindId, path: NodePath },
    /// Attribute access on a record type that lacks the field.
    UnknownField {
        field: String,
        record: Ty,
        path: NodePath,
    },
    /// A context reference deeper than the enclosing scopes.
    ContextUnderflow {
        depth: usize,
        available: usize,
        path: NodePath,
    },
    /// A node's operands do not have the shape its kind requires.
    MalformedOperands {
        kind: KindId,
        reason: String,
        path: NodePath,
    },
}

impl TypeError {
    /// The node the error was raised for.
    pub fn path(&self) -> &NodePath {
        match self {
            TypeError::UnresolvedKind { path, .. }
            | TypeError::UnknownField { path, .. }
            | TypeError::ContextUnderflow { path, .. }
            | TypeError::MalformedOperands { path, .. } => path,
        }
    }

    pub(crate) fn malformed(kind: &KindId, path: &NodePath, reason: impl Into<String>) -> Self {
        TypeError::MalformedOperands {
            kind: kind.clone(),
            reason: reason.into(),
            path: path.clone(),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::UnresolvedKind { kind, .. } => {
                write!(f, "no typing rule for request kind `{}`", kind)
            }
            TypeError::UnknownField { field, record, .. } => {
                write!(f, "no field `{}` on record type `{}`", field, record)
            }
            TypeError::ContextUnderflow {
                depth, available, ..
            } => write!(
                f,
                "context depth {} is outside the {} enclosing scope(s)",
                depth, available
            ),
            TypeError::MalformedOperands { kind, reason, .. } => {
                write!(f, "malformed `{}` request: {}", kind, reason)
            }
        }
    }
}

impl std::error::Error for TypeError {}

//! The request tree.
//!
//! A `Request` is an immutable expression over stored collections:
//! literals, collection literals, references to the item bound by an
//! enclosing scope, stored collections, and operations. Every operation has
//! exactly one subject and zero or more further operands, each itself a
//! request. The tree is strict: no sharing, no cycles.

use std::collections::BTreeMap;

use multicorn_types::Ty;

use crate::kind::{kinds, KindId, Op, Operator};
use crate::path::NodePath;
use crate::value::{SliceBounds, Value};

/// A stored collection, as declared by the storage layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Storage {
    pub name: String,
    /// The type of one stored item (normally a record).
    pub item_type: Ty,
}

impl Storage {
    pub fn new(name: impl Into<String>, item_type: Ty) -> Self {
        Storage {
            name: name.into(),
            item_type,
        }
    }
}

/// An operation node.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub operator: Operator,
    pub subject: Box<Request>,
    pub operands: Vec<Request>,
}

/// A request tree node.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    Literal(Value),
    List(Vec<Request>),
    Tuple(Vec<Request>),
    Record(BTreeMap<String, Request>),
    /// The item bound by an enclosing scope; depth 1 is the innermost.
    Context { scope_depth: usize },
    StoredItems(Storage),
    Operation(Operation),
}

impl Request {
    pub fn kind(&self) -> KindId {
        match self {
            Request::Literal(_) => kinds::LITERAL,
            Request::List(_) => kinds::LIST,
            Request::Tuple(_) => kinds::TUPLE,
            Request::Record(_) => kinds::RECORD,
            Request::Context { .. } => kinds::CONTEXT,
            Request::StoredItems(_) => kinds::STORED_ITEMS,
            Request::Operation(op) => op.operator.kind(),
        }
    }

    /// Direct children, in [`NodePath`] order.
    pub fn children(&self) -> Vec<&Request> {
        match self {
            Request::List(items) | Request::Tuple(items) => items.iter().collect(),
            Request::Record(fields) => fields.values().collect(),
            Request::Operation(op) => std::iter::once(op.subject.as_ref())
                .chain(op.operands.iter())
                .collect(),
            Request::Literal(_) | Request::Context { .. } | Request::StoredItems(_) => {
                Vec::new()
            }
        }
    }

    /// The node at `path`, relative to this node.
    pub fn descendant(&self, path: &NodePath) -> Option<&Request> {
        path.steps().iter().try_fold(self, |node, &step| {
            node.children().get(step).copied()
        })
    }

    pub fn as_operation(&self) -> Option<&Operation> {
        match self {
            Request::Operation(op) => Some(op),
            _ => None,
        }
    }

    /// The built-in operator of an operation node.
    pub fn builtin_op(&self) -> Option<Op> {
        self.as_operation().and_then(|op| op.operator.builtin())
    }

    // ── Construction ────────────────────────────────────────────────

    pub fn literal(value: impl Into<Value>) -> Request {
        Request::Literal(value.into())
    }

    pub fn list(items: impl IntoIterator<Item = Request>) -> Request {
        Request::List(items.into_iter().collect())
    }

    pub fn tuple(items: impl IntoIterator<Item = Request>) -> Request {
        Request::Tuple(items.into_iter().collect())
    }

    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Request)>) -> Request {
        Request::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// The item of the `scope_depth`-th enclosing scope (1 = innermost).
    pub fn context(scope_depth: usize) -> Request {
        Request::Context { scope_depth }
    }

    pub fn stored(storage: Storage) -> Request {
        Request::StoredItems(storage)
    }

    /// An operation with this request as its subject.
    pub fn operation(
        self,
        operator: impl Into<Operator>,
        operands: impl IntoIterator<Item = Request>,
    ) -> Request {
        Request::Operation(Operation {
            operator: operator.into(),
            subject: Box::new(self),
            operands: operands.into_iter().collect(),
        })
    }

    pub fn attr(self, name: &str) -> Request {
        self.operation(Op::Attribute, [Request::literal(name)])
    }

    /// A binary operation `self <op> rhs`.
    pub fn binary(self, op: Op, rhs: Request) -> Request {
        self.operation(op, [rhs])
    }

    pub fn filter(self, predicate: Request) -> Request {
        self.operation(Op::Filter, [predicate])
    }

    pub fn map(self, operation: Request) -> Request {
        self.operation(Op::Map, [operation])
    }

    pub fn groupby(self, key: Request) -> Request {
        self.operation(Op::Groupby, [key])
    }

    /// Sort by the given keys; wrap a key in [`Request::neg`] to sort
    /// descending on it.
    pub fn sort(self, keys: impl IntoIterator<Item = Request>) -> Request {
        self.operation(Op::Sort, keys)
    }

    pub fn slice(self, bounds: SliceBounds) -> Request {
        self.operation(Op::Slice, [Request::literal(bounds)])
    }

    pub fn index(self, key: impl Into<Value>) -> Request {
        self.operation(Op::Index, [Request::literal(key)])
    }

    /// The single element, falling back to `default` when given.
    pub fn one(self, default: Option<Request>) -> Request {
        self.operation(Op::One, default)
    }

    pub fn unary(self, op: Op) -> Request {
        self.operation(op, [])
    }

    pub fn neg(self) -> Request {
        self.unary(Op::Neg)
    }

    pub fn len(self) -> Request {
        self.unary(Op::Len)
    }

    pub fn distinct(self) -> Request {
        self.unary(Op::Distinct)
    }

    pub fn max(self) -> Request {
        self.unary(Op::Max)
    }

    pub fn min(self) -> Request {
        self.unary(Op::Min)
    }

    pub fn sum(self) -> Request {
        self.unary(Op::Sum)
    }
}

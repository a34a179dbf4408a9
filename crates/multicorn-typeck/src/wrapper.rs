//! Wrapped request nodes.
//!
//! Wrapping pairs every node of a request tree with its resolved typing
//! rule and normalizes each operation's operands into kind-specific fields
//! (attribute name, sort keys, slice bounds, ...). The whole tree is
//! wrapped eagerly, so unresolved kinds and malformed operands surface
//! before any type is computed, and normalization happens exactly once.

use multicorn_requests::{
    Arity, KindId, NodePath, Op, Operation, Operator, Request, SliceBounds, Storage, Value,
};
use multicorn_types::Ty;

use crate::contexts::Contexts;
use crate::error::TypeError;
use crate::registry::{RuleRef, WrapperRegistry};

/// A request node paired with its typing rule.
#[derive(Debug)]
pub struct Wrapped<'r> {
    request: &'r Request,
    path: NodePath,
    kind: KindId,
    rule: RuleRef,
    shape: Shape<'r>,
}

/// The normalized structure of a wrapped node.
#[derive(Debug)]
pub enum Shape<'r> {
    Literal(&'r Value),
    List(Vec<Wrapped<'r>>),
    Tuple(Vec<Wrapped<'r>>),
    Record(Vec<(&'r str, Wrapped<'r>)>),
    Context { scope_depth: usize },
    StoredItems(&'r Storage),
    Operation {
        subject: Box<Wrapped<'r>>,
        operands: Operands<'r>,
    },
}

/// The operands of an operation, normalized per operator.
#[derive(Debug)]
pub enum Operands<'r> {
    /// Operators without special normalization, and extensions whose
    /// lineage holds no built-in operator.
    Plain(Vec<Wrapped<'r>>),
    Attribute { name: &'r str },
    Filter { predicate: Box<Wrapped<'r>> },
    Map { operation: Box<Wrapped<'r>> },
    Groupby { key: Box<Wrapped<'r>> },
    Sort { keys: Vec<SortKey<'r>> },
    Slice { bounds: SliceBounds },
    Index { key: Box<Wrapped<'r>> },
    One { default: Option<Box<Wrapped<'r>>> },
}

/// A sort key. A leading `neg` marks the key descending and is stripped
/// by [`SortKey::key`].
#[derive(Debug)]
pub struct SortKey<'r> {
    node: Wrapped<'r>,
    descending: bool,
}

impl<'r> SortKey<'r> {
    /// The key expression, without its leading negation.
    pub fn key(&self) -> &Wrapped<'r> {
        match self.node.subject() {
            Some(inner) if self.descending => inner,
            _ => &self.node,
        }
    }

    pub fn descending(&self) -> bool {
        self.descending
    }

    /// The key as written, negation included.
    pub fn node(&self) -> &Wrapped<'r> {
        &self.node
    }
}

impl<'r> Wrapped<'r> {
    pub fn request(&self) -> &'r Request {
        self.request
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn kind(&self) -> &KindId {
        &self.kind
    }

    pub fn rule(&self) -> &RuleRef {
        &self.rule
    }

    pub fn shape(&self) -> &Shape<'r> {
        &self.shape
    }

    /// The subject of an operation node.
    pub fn subject(&self) -> Option<&Wrapped<'r>> {
        match &self.shape {
            Shape::Operation { subject, .. } => Some(subject),
            _ => None,
        }
    }

    /// The normalized operands of an operation node.
    pub fn operands(&self) -> Option<&Operands<'r>> {
        match &self.shape {
            Shape::Operation { operands, .. } => Some(operands),
            _ => None,
        }
    }

    /// Compute this node's type under `contexts`.
    pub fn return_type(&self, contexts: &Contexts) -> Result<Ty, TypeError> {
        let ty = self.rule.return_type(self, contexts)?;
        log::trace!("{} `{}`: {}", self.path, self.kind, ty);
        Ok(ty)
    }

    /// An error for a node whose shape the applied rule cannot handle.
    pub fn malformed(&self, reason: impl Into<String>) -> TypeError {
        TypeError::malformed(&self.kind, &self.path, reason)
    }

    /// The subject, or an error if this is not an operation.
    pub fn expect_subject(&self) -> Result<&Wrapped<'r>, TypeError> {
        self.subject()
            .ok_or_else(|| self.malformed("expected an operation with a subject"))
    }

    /// Wrapped children, in the order they were wrapped.
    ///
    /// Sort keys appear as written; a stripped `neg` is still a node.
    pub fn children(&self) -> Vec<&Wrapped<'r>> {
        match &self.shape {
            Shape::List(items) | Shape::Tuple(items) => items.iter().collect(),
            Shape::Record(fields) => fields.iter().map(|(_, w)| w).collect(),
            Shape::Literal(_) | Shape::Context { .. } | Shape::StoredItems(_) => Vec::new(),
            Shape::Operation { subject, operands } => {
                let mut children: Vec<&Wrapped<'r>> = vec![subject.as_ref()];
                match operands {
                    Operands::Plain(items) => children.extend(items),
                    Operands::Filter { predicate: w }
                    | Operands::Map { operation: w }
                    | Operands::Groupby { key: w }
                    | Operands::Index { key: w } => children.push(w),
                    Operands::Sort { keys } => children.extend(keys.iter().map(SortKey::node)),
                    Operands::One { default } => children.extend(default.as_deref()),
                    Operands::Attribute { .. } | Operands::Slice { .. } => {}
                }
                children
            }
        }
    }

    /// The wrapped node at `path` (relative to the tree root), if it was
    /// wrapped.
    pub fn find(&self, path: &NodePath) -> Option<&Wrapped<'r>> {
        if self.path == *path {
            return Some(self);
        }
        self.children()
            .into_iter()
            .find(|child| path.starts_with(&child.path))
            .and_then(|child| child.find(path))
    }
}

// ── Wrapping ───────────────────────────────────────────────────────────

impl WrapperRegistry {
    /// Wrap a request tree, resolving every node's rule and normalizing
    /// every operation's operands.
    pub fn wrap<'r>(&self, request: &'r Request) -> Result<Wrapped<'r>, TypeError> {
        self.wrap_at(request, NodePath::root())
    }

    fn wrap_at<'r>(&self, request: &'r Request, path: NodePath) -> Result<Wrapped<'r>, TypeError> {
        let kind = request.kind();
        let rule = self.resolve_at(&kind, &path)?;
        let shape = match request {
            Request::Literal(value) => Shape::Literal(value),
            Request::List(items) => Shape::List(self.wrap_all(items, &path)?),
            Request::Tuple(items) => Shape::Tuple(self.wrap_all(items, &path)?),
            Request::Record(fields) => Shape::Record(
                fields
                    .iter()
                    .enumerate()
                    .map(|(i, (name, value))| {
                        Ok((name.as_str(), self.wrap_at(value, path.child(i))?))
                    })
                    .collect::<Result<_, TypeError>>()?,
            ),
            Request::Context { scope_depth } => Shape::Context {
                scope_depth: *scope_depth,
            },
            Request::StoredItems(storage) => Shape::StoredItems(storage),
            Request::Operation(op) => {
                let subject = Box::new(self.wrap_at(&op.subject, path.child(0))?);
                let operands = self.normalize_operands(op, &kind, &path)?;
                Shape::Operation { subject, operands }
            }
        };
        Ok(Wrapped {
            request,
            path,
            kind,
            rule,
            shape,
        })
    }

    fn wrap_all<'r>(
        &self,
        items: &'r [Request],
        path: &NodePath,
    ) -> Result<Vec<Wrapped<'r>>, TypeError> {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.wrap_at(item, path.child(i)))
            .collect()
    }

    fn normalize_operands<'r>(
        &self,
        op: &'r Operation,
        kind: &KindId,
        path: &NodePath,
    ) -> Result<Operands<'r>, TypeError> {
        let check_arity = |arity: Arity| {
            if arity.accepts(op.operands.len()) {
                Ok(())
            } else {
                Err(TypeError::malformed(
                    kind,
                    path,
                    format!("expected {}, found {}", arity, op.operands.len()),
                ))
            }
        };
        // An extension takes the operands of the first built-in operator in
        // its lineage.
        let shaped_like = match &op.operator {
            Operator::Builtin(builtin) => Some(*builtin),
            Operator::Extension(ext) => {
                check_arity(
                    self.taxonomy()
                        .extension_arity(ext.as_str())
                        .unwrap_or(Arity::AtLeast(0)),
                )?;
                self.builtin_ancestor(kind)
            }
        };
        let Some(builtin) = shaped_like else {
            return Ok(Operands::Plain(self.wrap_operands(op, path)?));
        };
        check_arity(builtin.arity())?;

        // Operand i sits at child index i + 1; the subject is child 0.
        let operand_path = |i: usize| path.child(i + 1);
        let wrap_operand = |i: usize| -> Result<Box<Wrapped<'r>>, TypeError> {
            Ok(Box::new(self.wrap_at(&op.operands[i], operand_path(i))?))
        };


        let operands = match builtin {
            Op::Attribute => match &op.operands[0] {
                Request::Literal(Value::String(name)) => Operands::Attribute { name },
                other => {
                    return Err(TypeError::malformed(
                        kind,
                        &operand_path(0),
                        format!("attribute name must be a string literal, found {}", other),
                    ))
                }
            },
            Op::Filter => Operands::Filter {
                predicate: wrap_operand(0)?,
            },
            Op::Map => Operands::Map {
                operation: wrap_operand(0)?,
            },
            Op::Groupby => Operands::Groupby {
                key: wrap_operand(0)?,
            },
            Op::Sort => {
                let keys = op
                    .operands
                    .iter()
                    .enumerate()
                    .map(|(i, key)| self.sort_key(key, operand_path(i)))
                    .collect::<Result<_, TypeError>>()?;
                Operands::Sort { keys }
            }
            Op::Slice => match &op.operands[0] {
                Request::Literal(Value::Slice(bounds)) => Operands::Slice { bounds: *bounds },
                other => {
                    return Err(TypeError::malformed(
                        kind,
                        &operand_path(0),
                        format!("slice bounds must be a slice literal, found {}", other),
                    ))
                }
            },
            Op::Index => Operands::Index {
                key: wrap_operand(0)?,
            },
            Op::One => match op.operands.first() {
                None | Some(Request::Literal(Value::None)) => Operands::One { default: None },
                Some(_) => Operands::One {
                    default: Some(wrap_operand(0)?),
                },
            },
            _ => Operands::Plain(self.wrap_operands(op, path)?),
        };
        Ok(operands)
    }

    /// The nearest built-in operator in `kind`'s lineage.
    fn builtin_ancestor(&self, kind: &KindId) -> Option<Op> {
        self.taxonomy()
            .lineage(kind)
            .iter()
            .find_map(|candidate| Op::from_name(candidate.as_str()))
    }

    fn wrap_operands<'r>(
        &self,
        op: &'r Operation,
        path: &NodePath,
    ) -> Result<Vec<Wrapped<'r>>, TypeError> {
        op.operands
            .iter()
            .enumerate()
            .map(|(i, operand)| self.wrap_at(operand, path.child(i + 1)))
            .collect()
    }

    /// A leading negation marks a descending key. The `neg` node is
    /// wrapped like any other, so its own operands are checked.
    fn sort_key<'r>(&self, key: &'r Request, path: NodePath) -> Result<SortKey<'r>, TypeError> {
        let descending = matches!(
            key,
            Request::Operation(neg) if neg.operator == Operator::Builtin(Op::Neg)
        );
        Ok(SortKey {
            node: self.wrap_at(key, path)?,
            descending,
        })
    }
}

//! Construction of request trees from their generic form.
//!
//! External callers describe a request as nested "kind + fields + children"
//! records ([`RawRequest`]), typically JSON. [`RequestBuilder`] turns that
//! form into a [`Request`], populating each kind's specialized fields. The
//! conversion is total: every recognized kind either builds or fails with a
//! [`BuildError`] naming the offending node.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::kind::{kinds, Arity, KindId, Op, Operator, Taxonomy};
use crate::path::NodePath;
use crate::request::{Operation, Request};
use crate::value::Value;

/// A request node in generic form.
///
/// ```json
/// {"kind": "map", "args": [
///     {"kind": "stored_items", "storage": "people"},
///     {"kind": "attribute", "args": [{"kind": "context", "scope_depth": 1}, "age"]}
/// ]}
/// ```
///
/// For operations, `args[0]` is the subject and the rest are operands.
/// List and tuple items also go in `args`; record fields go in `fields`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRequest {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_none")]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, RawArg>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<RawArg>,
}

/// A child in generic form: either a node, or a bare literal value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawArg {
    Node(Box<RawRequest>),
    Value(Value),
}

impl RawRequest {
    pub fn new(kind: impl Into<String>) -> Self {
        RawRequest {
            kind: kind.into(),
            value: Value::None,
            scope_depth: None,
            storage: None,
            fields: BTreeMap::new(),
            args: Vec::new(),
        }
    }
}

/// An error building a request from its generic form.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildError {
    /// The kind is neither built-in nor a declared extension.
    UnknownKind { kind: String, path: NodePath },
    /// A stored collection that the catalog does not declare.
    UnknownStorage { name: String, path: NodePath },
    /// A kind-specific field is missing.
    MissingField {
        kind: String,
        field: &'static str,
        path: NodePath,
    },
    /// An operation received the wrong number of operands.
    MalformedOperands {
        kind: String,
        expected: Arity,
        found: usize,
        path: NodePath,
    },
    /// The input text is not a valid generic request.
    Json(String),
}

impl BuildError {
    pub fn path(&self) -> Option<&NodePath> {
        match self {
            BuildError::UnknownKind { path, .. }
            | BuildError::UnknownStorage { path, .. }
            | BuildError::MissingField { path, .. }
            | BuildError::MalformedOperands { path, .. } => Some(path),
            BuildError::Json(_) => None,
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownKind { kind, path } => {
                write!(f, "unknown request kind `{}` at {}", kind, path)
            }
            BuildError::UnknownStorage { name, path } => {
                write!(f, "unknown storage `{}` at {}", name, path)
            }
            BuildError::MissingField { kind, field, path } => {
                write!(f, "`{}` request at {} is missing `{}`", kind, path, field)
            }
            BuildError::MalformedOperands {
                kind,
                expected,
                found,
                path,
            } => write!(
                f,
                "`{}` at {} takes {}, found {}",
                kind, path, expected, found
            ),
            BuildError::Json(msg) => write!(f, "invalid request: {}", msg),
        }
    }
}

impl std::error::Error for BuildError {}

/// Builds requests from generic form against a taxonomy (for extension
/// operators) and a catalog (for stored collections).
pub struct RequestBuilder<'a> {
    taxonomy: &'a Taxonomy,
    catalog: &'a Catalog,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(taxonomy: &'a Taxonomy, catalog: &'a Catalog) -> Self {
        RequestBuilder { taxonomy, catalog }
    }

    /// Parse JSON text and build the request it describes.
    pub fn build_json(&self, text: &str) -> Result<Request, BuildError> {
        let raw: RawArg =
            serde_json::from_str(text).map_err(|e| BuildError::Json(e.to_string()))?;
        self.build_arg(&raw, &NodePath::root())
    }

    pub fn build(&self, raw: &RawRequest) -> Result<Request, BuildError> {
        self.build_node(raw, &NodePath::root())
    }

    fn build_arg(&self, raw: &RawArg, path: &NodePath) -> Result<Request, BuildError> {
        match raw {
            RawArg::Node(node) => self.build_node(node, path),
            RawArg::Value(value) => Ok(Request::Literal(value.clone())),
        }
    }

    fn build_args(&self, args: &[RawArg], path: &NodePath) -> Result<Vec<Request>, BuildError> {
        args.iter()
            .enumerate()
            .map(|(i, arg)| self.build_arg(arg, &path.child(i)))
            .collect()
    }

    fn build_node(&self, raw: &RawRequest, path: &NodePath) -> Result<Request, BuildError> {
        let kind = raw.kind.as_str();
        let missing = |field: &'static str| BuildError::MissingField {
            kind: raw.kind.clone(),
            field,
            path: path.clone(),
        };
        let request = match kind {
            k if k == kinds::LITERAL.as_str() => Request::Literal(raw.value.clone()),
            k if k == kinds::LIST.as_str() => Request::List(self.build_args(&raw.args, path)?),
            k if k == kinds::TUPLE.as_str() => Request::Tuple(self.build_args(&raw.args, path)?),
            k if k == kinds::RECORD.as_str() || k == "dict" => {
                let mut fields = BTreeMap::new();
                // Field children are numbered in name order, like `Request::children`.
                for (i, (name, arg)) in raw.fields.iter().enumerate() {
                    fields.insert(name.clone(), self.build_arg(arg, &path.child(i))?);
                }
                Request::Record(fields)
            }
            k if k == kinds::CONTEXT.as_str() => Request::Context {
                scope_depth: raw.scope_depth.ok_or_else(|| missing("scope_depth"))?,
            },
            k if k == kinds::STORED_ITEMS.as_str() => {
                let name = raw.storage.as_deref().ok_or_else(|| missing("storage"))?;
                let storage =
                    self.catalog
                        .get(name)
                        .ok_or_else(|| BuildError::UnknownStorage {
                            name: name.to_string(),
                            path: path.clone(),
                        })?;
                Request::StoredItems(storage.clone())
            }
            _ => {
                let (operator, arity) = if let Some(op) = Op::from_name(kind) {
                    (Operator::Builtin(op), op.arity())
                } else if let Some(arity) = self.taxonomy.extension_arity(kind) {
                    (Operator::Extension(KindId::new(kind)), arity)
                } else {
                    return Err(BuildError::UnknownKind {
                        kind: raw.kind.clone(),
                        path: path.clone(),
                    });
                };
                let mut args = self.build_args(&raw.args, path)?.into_iter();
                let subject = args.next().ok_or_else(|| missing("subject"))?;
                let operands: Vec<Request> = args.collect();
                if !arity.accepts(operands.len()) {
                    return Err(BuildError::MalformedOperands {
                        kind: raw.kind.clone(),
                        expected: arity,
                        found: operands.len(),
                        path: path.clone(),
                    });
                }
                Request::Operation(Operation {
                    operator,
                    subject: Box::new(subject),
                    operands,
                })
            }
        };
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multicorn_types::Ty;

    fn catalog() -> Catalog {
        [("people", Ty::record([("age", Ty::int())]))]
            .into_iter()
            .collect()
    }

    #[test]
    fn bare_values_become_literals() {
        let tax = Taxonomy::builtin();
        let cat = catalog();
        let builder = RequestBuilder::new(&tax, &cat);
        assert_eq!(builder.build_json("42").unwrap(), Request::literal(42));
        assert_eq!(
            builder.build_json(r#"{"kind": "literal", "value": "x"}"#).unwrap(),
            Request::literal("x")
        );
    }

    #[test]
    fn missing_scope_depth() {
        let tax = Taxonomy::builtin();
        let cat = catalog();
        let builder = RequestBuilder::new(&tax, &cat);
        let err = builder.build(&RawRequest::new("context")).unwrap_err();
        assert_eq!(err.to_string(), "`context` request at $ is missing `scope_depth`");
    }

    #[test]
    fn operation_without_subject() {
        let tax = Taxonomy::builtin();
        let cat = catalog();
        let builder = RequestBuilder::new(&tax, &cat);
        let err = builder.build(&RawRequest::new("len")).unwrap_err();
        assert!(matches!(err, BuildError::MissingField { field: "subject", .. }));
    }

    #[test]
    fn dict_is_an_alias_for_record() {
        let tax = Taxonomy::builtin();
        let cat = catalog();
        let builder = RequestBuilder::new(&tax, &cat);
        let req = builder
            .build_json(r#"{"kind": "dict", "fields": {"a": 1}}"#)
            .unwrap();
        assert_eq!(req, Request::record([("a", Request::literal(1))]));
    }
}

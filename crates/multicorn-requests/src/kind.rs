//! Node kinds, the operator table, and the kind taxonomy.
//!
//! Every request node has a stable kind identifier (`KindId`). Built-in
//! operators are described as data in [`OPERATORS`]: one row per operator
//! with its arity and the family it shares a typing rule with. The
//! [`Taxonomy`] records, for every kind, the more general kinds it falls
//! back to when no rule is registered for it directly.

use std::borrow::{Borrow, Cow};
use std::fmt;

use rustc_hash::FxHashMap;

/// A stable node-kind identifier.
///
/// Built-in kinds use `'static` names; extension kinds own their name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KindId(Cow<'static, str>);

impl KindId {
    pub const fn from_static(name: &'static str) -> KindId {
        KindId(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> KindId {
        KindId(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for KindId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for KindId {
    fn from(name: &'static str) -> KindId {
        KindId::from_static(name)
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Built-in kind identifiers that are not operators.
pub mod kinds {
    use super::KindId;

    /// Root of the taxonomy; every kind eventually falls back to it.
    pub const REQUEST: KindId = KindId::from_static("request");
    pub const OPERATION: KindId = KindId::from_static("operation");

    pub const BOOLEAN_OPERATION: KindId = KindId::from_static("boolean_operation");
    pub const ARITHMETIC_OPERATION: KindId = KindId::from_static("arithmetic_operation");
    pub const PRESERVING_OPERATION: KindId = KindId::from_static("preserving_operation");
    pub const AGGREGATE_OPERATION: KindId = KindId::from_static("aggregate_operation");

    pub const LITERAL: KindId = KindId::from_static("literal");
    pub const LIST: KindId = KindId::from_static("list");
    pub const TUPLE: KindId = KindId::from_static("tuple");
    pub const RECORD: KindId = KindId::from_static("record");
    pub const CONTEXT: KindId = KindId::from_static("context");
    pub const STORED_ITEMS: KindId = KindId::from_static("stored_items");

    /// Kinds of the non-operation nodes.
    pub const NODE_KINDS: [KindId; 6] = [LITERAL, LIST, TUPLE, RECORD, CONTEXT, STORED_ITEMS];
}

// ── Operators ──────────────────────────────────────────────────────────

/// A built-in operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Attribute,
    // boolean
    And,
    Or,
    Xor,
    Contains,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Invert,
    In,
    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    TrueDiv,
    Mod,
    Pow,
    // collections
    Filter,
    Map,
    Groupby,
    Sort,
    Slice,
    Distinct,
    Len,
    Neg,
    Abs,
    // aggregates
    Max,
    Min,
    Sum,
    Index,
    One,
}

/// The typing family an operator belongs to.
///
/// Operators of one family share a single typing rule, registered against
/// the family kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Boolean,
    Arithmetic,
    Preserving,
    Aggregate,
    /// No shared rule; the operator's own kind carries one.
    Standalone,
}

impl Family {
    /// The kind operators of this family fall back to.
    pub fn kind(self) -> KindId {
        match self {
            Family::Boolean => kinds::BOOLEAN_OPERATION,
            Family::Arithmetic => kinds::ARITHMETIC_OPERATION,
            Family::Preserving => kinds::PRESERVING_OPERATION,
            Family::Aggregate => kinds::AGGREGATE_OPERATION,
            Family::Standalone => kinds::OPERATION,
        }
    }
}

/// How many operands an operator takes, not counting its subject.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Between(lo, hi) => (lo..=hi).contains(&count),
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: usize| if n == 1 { "operand" } else { "operands" };
        match *self {
            Arity::Exact(n) => write!(f, "exactly {} {}", n, plural(n)),
            Arity::Between(lo, hi) => write!(f, "{} to {} operands", lo, hi),
            Arity::AtLeast(n) => write!(f, "at least {} {}", n, plural(n)),
        }
    }
}

/// One row of the operator table.
#[derive(Copy, Clone, Debug)]
pub struct OperatorSpec {
    pub op: Op,
    pub name: &'static str,
    pub arity: Arity,
    pub family: Family,
}

impl OperatorSpec {
    const fn new(op: Op, name: &'static str, arity: Arity, family: Family) -> Self {
        OperatorSpec {
            op,
            name,
            arity,
            family,
        }
    }

    pub fn kind(&self) -> KindId {
        KindId::from_static(self.name)
    }
}

use Arity::{AtLeast, Between, Exact};
use Family::{Aggregate, Arithmetic, Boolean, Preserving, Standalone};

/// Every built-in operator.
pub const OPERATORS: &[OperatorSpec] = &[
    OperatorSpec::new(Op::Attribute, "attribute", Exact(1), Standalone),
    OperatorSpec::new(Op::And, "and", Exact(1), Boolean),
    OperatorSpec::new(Op::Or, "or", Exact(1), Boolean),
    OperatorSpec::new(Op::Xor, "xor", Exact(1), Boolean),
    OperatorSpec::new(Op::Contains, "contains", Exact(1), Boolean),
    OperatorSpec::new(Op::Eq, "eq", Exact(1), Boolean),
    OperatorSpec::new(Op::Ne, "ne", Exact(1), Boolean),
    OperatorSpec::new(Op::Lt, "lt", Exact(1), Boolean),
    OperatorSpec::new(Op::Gt, "gt", Exact(1), Boolean),
    OperatorSpec::new(Op::Le, "le", Exact(1), Boolean),
    OperatorSpec::new(Op::Ge, "ge", Exact(1), Boolean),
    OperatorSpec::new(Op::Invert, "invert", Exact(0), Boolean),
    OperatorSpec::new(Op::In, "in", Exact(1), Boolean),
    OperatorSpec::new(Op::Add, "add", Exact(1), Arithmetic),
    OperatorSpec::new(Op::Sub, "sub", Exact(1), Arithmetic),
    OperatorSpec::new(Op::Mul, "mul", Exact(1), Arithmetic),
    OperatorSpec::new(Op::Div, "div", Exact(1), Arithmetic),
    OperatorSpec::new(Op::FloorDiv, "floordiv", Exact(1), Arithmetic),
    OperatorSpec::new(Op::TrueDiv, "truediv", Exact(1), Arithmetic),
    OperatorSpec::new(Op::Mod, "mod", Exact(1), Arithmetic),
    OperatorSpec::new(Op::Pow, "pow", Exact(1), Arithmetic),
    OperatorSpec::new(Op::Filter, "filter", Exact(1), Preserving),
    OperatorSpec::new(Op::Map, "map", Exact(1), Standalone),
    OperatorSpec::new(Op::Groupby, "groupby", Exact(1), Standalone),
    OperatorSpec::new(Op::Sort, "sort", AtLeast(0), Preserving),
    OperatorSpec::new(Op::Slice, "slice", Exact(1), Preserving),
    OperatorSpec::new(Op::Distinct, "distinct", Exact(0), Preserving),
    OperatorSpec::new(Op::Len, "len", Exact(0), Standalone),
    OperatorSpec::new(Op::Neg, "neg", Exact(0), Preserving),
    OperatorSpec::new(Op::Abs, "abs", Exact(0), Preserving),
    OperatorSpec::new(Op::Max, "max", Exact(0), Aggregate),
    OperatorSpec::new(Op::Min, "min", Exact(0), Aggregate),
    OperatorSpec::new(Op::Sum, "sum", Exact(0), Aggregate),
    OperatorSpec::new(Op::Index, "index", Exact(1), Aggregate),
    OperatorSpec::new(Op::One, "one", Between(0, 1), Aggregate),
];

impl Op {
    /// The table row for this operator.
    pub fn spec(self) -> &'static OperatorSpec {
        OPERATORS
            .iter()
            .find(|spec| spec.op == self)
            .unwrap_or_else(|| unreachable!("operator {:?} missing from OPERATORS", self))
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn kind(self) -> KindId {
        self.spec().kind()
    }

    pub fn arity(self) -> Arity {
        self.spec().arity
    }

    pub fn family(self) -> Family {
        self.spec().family
    }

    /// Look up an operator by its table name.
    pub fn from_name(name: &str) -> Option<Op> {
        OPERATORS.iter().find(|spec| spec.name == name).map(|spec| spec.op)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The operator of an operation node: built-in or a declared extension.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Builtin(Op),
    Extension(KindId),
}

impl Operator {
    pub fn kind(&self) -> KindId {
        match self {
            Operator::Builtin(op) => op.kind(),
            Operator::Extension(kind) => kind.clone(),
        }
    }

    pub fn builtin(&self) -> Option<Op> {
        match self {
            Operator::Builtin(op) => Some(*op),
            Operator::Extension(_) => None,
        }
    }
}

impl From<Op> for Operator {
    fn from(op: Op) -> Operator {
        Operator::Builtin(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Builtin(op) => write!(f, "{}", op),
            Operator::Extension(kind) => write!(f, "{}", kind),
        }
    }
}

// ── Taxonomy ───────────────────────────────────────────────────────────

/// An error declaring an extension kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaxonomyError {
    /// The name is already taken by a built-in kind.
    BuiltinKind(KindId),
    /// A fallback names a kind the taxonomy does not know.
    UnknownFallback { kind: KindId, fallback: KindId },
}

impl fmt::Display for TaxonomyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonomyError::BuiltinKind(kind) => {
                write!(f, "`{}` is a built-in kind and cannot be redeclared", kind)
            }
            TaxonomyError::UnknownFallback { kind, fallback } => {
                write!(f, "`{}` falls back to unknown kind `{}`", kind, fallback)
            }
        }
    }
}

impl std::error::Error for TaxonomyError {}

/// The node-kind taxonomy.
///
/// Maps each kind to the kinds it falls back to, most specific first.
/// Built-in operators fall back to their family kind, families to
/// `operation`, and everything to `request`. Extension operators are added
/// with [`Taxonomy::declare`].
#[derive(Clone, Debug)]
pub struct Taxonomy {
    parents: FxHashMap<KindId, Vec<KindId>>,
    /// Declared extension operators and their arity.
    extensions: FxHashMap<KindId, Arity>,
}

impl Taxonomy {
    /// The taxonomy of the built-in kinds only.
    pub fn builtin() -> Self {
        let mut parents = FxHashMap::default();
        parents.insert(kinds::REQUEST, Vec::new());
        parents.insert(kinds::OPERATION, vec![kinds::REQUEST]);
        for kind in kinds::NODE_KINDS {
            parents.insert(kind, vec![kinds::REQUEST]);
        }
        for family in [Boolean, Arithmetic, Preserving, Aggregate] {
            parents.insert(family.kind(), vec![kinds::OPERATION]);
        }
        for spec in OPERATORS {
            parents.insert(spec.kind(), vec![spec.family.kind()]);
        }
        Taxonomy {
            parents,
            extensions: FxHashMap::default(),
        }
    }

    /// Declare an extension operator kind.
    ///
    /// `falls_back_to` lists the kinds whose rules apply when `kind` has none
    /// of its own, most specific first. An empty list means `operation`.
    /// Redeclaring an extension replaces it.
    pub fn declare(
        &mut self,
        kind: KindId,
        arity: Arity,
        falls_back_to: impl IntoIterator<Item = KindId>,
    ) -> Result<(), TaxonomyError> {
        if self.parents.contains_key(&kind) && !self.extensions.contains_key(&kind) {
            return Err(TaxonomyError::BuiltinKind(kind));
        }
        let mut fallbacks: Vec<KindId> = falls_back_to.into_iter().collect();
        if let Some(fallback) = fallbacks
            .iter()
            .find(|f| **f != kind && !self.parents.contains_key(*f))
        {
            return Err(TaxonomyError::UnknownFallback {
                kind,
                fallback: fallback.clone(),
            });
        }
        fallbacks.retain(|f| *f != kind);
        if fallbacks.is_empty() {
            fallbacks.push(kinds::OPERATION);
        }
        log::debug!("declare extension kind `{}` -> {:?}", kind, fallbacks);
        self.extensions.insert(kind.clone(), arity);
        self.parents.insert(kind, fallbacks);
        Ok(())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.parents.contains_key(kind)
    }

    /// The arity of a declared extension operator.
    pub fn extension_arity(&self, kind: &str) -> Option<Arity> {
        self.extensions.get(kind).copied()
    }

    /// The kind itself followed by every ancestor, in specificity order.
    ///
    /// Ancestors are visited breadth-first so that all direct fallbacks are
    /// tried before any of their own ancestors. Each kind appears once.
    pub fn lineage(&self, kind: &KindId) -> Vec<KindId> {
        let mut lineage = vec![kind.clone()];
        let mut next = 0;
        while next < lineage.len() {
            if let Some(parents) = self.parents.get(&lineage[next]) {
                for parent in parents {
                    if !lineage.contains(parent) {
                        lineage.push(parent.clone());
                    }
                }
            }
            next += 1;
        }
        lineage
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_names_are_unique() {
        for (i, a) in OPERATORS.iter().enumerate() {
            for b in &OPERATORS[i + 1..] {
                assert_ne!(a.name, b.name);
                assert_ne!(a.op, b.op);
            }
        }
    }

    #[test]
    fn from_name_round_trips() {
        for spec in OPERATORS {
            assert_eq!(Op::from_name(spec.name), Some(spec.op));
            assert_eq!(spec.op.name(), spec.name);
        }
        assert_eq!(Op::from_name("frobnicate"), None);
    }

    #[test]
    fn arity_accepts() {
        assert!(Arity::Exact(1).accepts(1));
        assert!(!Arity::Exact(1).accepts(0));
        assert!(Arity::Between(0, 1).accepts(0));
        assert!(Arity::Between(0, 1).accepts(1));
        assert!(!Arity::Between(0, 1).accepts(2));
        assert!(Arity::AtLeast(0).accepts(7));
        assert_eq!(Arity::Exact(1).to_string(), "exactly 1 operand");
        assert_eq!(Arity::Between(0, 1).to_string(), "0 to 1 operands");
        assert_eq!(Arity::AtLeast(2).to_string(), "at least 2 operands");
    }

    #[test]
    fn builtin_lineage() {
        let tax = Taxonomy::builtin();
        assert_eq!(
            tax.lineage(&Op::Eq.kind()),
            vec![
                Op::Eq.kind(),
                kinds::BOOLEAN_OPERATION,
                kinds::OPERATION,
                kinds::REQUEST
            ]
        );
        assert_eq!(
            tax.lineage(&Op::Map.kind()),
            vec![Op::Map.kind(), kinds::OPERATION, kinds::REQUEST]
        );
        assert_eq!(
            tax.lineage(&kinds::LITERAL),
            vec![kinds::LITERAL, kinds::REQUEST]
        );
    }

    #[test]
    fn unknown_kind_lineage_is_itself() {
        let tax = Taxonomy::builtin();
        let kind = KindId::new("mystery");
        assert_eq!(tax.lineage(&kind), vec![kind]);
    }

    #[test]
    fn declare_extension_breadth_first() {
        let mut tax = Taxonomy::builtin();
        let kind = KindId::new("regex_match");
        tax.declare(
            kind.clone(),
            Arity::Exact(1),
            [kinds::BOOLEAN_OPERATION, kinds::ARITHMETIC_OPERATION],
        )
        .unwrap();
        assert_eq!(
            tax.lineage(&kind),
            vec![
                kind.clone(),
                kinds::BOOLEAN_OPERATION,
                kinds::ARITHMETIC_OPERATION,
                kinds::OPERATION,
                kinds::REQUEST
            ]
        );
        assert_eq!(tax.extension_arity("regex_match"), Some(Arity::Exact(1)));
    }

    #[test]
    fn declare_defaults_to_operation() {
        let mut tax = Taxonomy::builtin();
        let kind = KindId::new("sample");
        tax.declare(kind.clone(), Arity::Exact(0), []).unwrap();
        assert_eq!(
            tax.lineage(&kind),
            vec![kind, kinds::OPERATION, kinds::REQUEST]
        );
    }

    #[test]
    fn declare_rejects_builtin_and_unknown_fallback() {
        let mut tax = Taxonomy::builtin();
        assert_eq!(
            tax.declare(Op::Add.kind(), Arity::Exact(1), []),
            Err(TaxonomyError::BuiltinKind(Op::Add.kind()))
        );
        let err = tax
            .declare(KindId::new("x"), Arity::Exact(0), [KindId::new("nope")])
            .unwrap_err();
        assert_eq!(err.to_string(), "`x` falls back to unknown kind `nope`");
    }
}

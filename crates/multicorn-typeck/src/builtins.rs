//! Built-in typing rules.
//!
//! One rule per non-operation node kind, one shared rule per operator
//! family (boolean, arithmetic, preserving, aggregate), and dedicated rules
//! for the operators whose typing differs from their family: attribute
//! access, map, groupby, len and one.

use std::sync::Arc;

use multicorn_requests::{kinds, Family, Op};
use multicorn_types::Ty;

use crate::contexts::Contexts;
use crate::error::TypeError;
use crate::registry::{ReturnTypeRule, WrapperRegistry};
use crate::wrapper::{Operands, Shape, Wrapped};

/// Register every built-in rule.
///
/// Operators are covered by their family rule unless listed here; adding
/// an operator to `OPERATORS` under an existing family needs no change.
pub fn register_builtins(registry: &mut WrapperRegistry) {
    // ── Non-operation nodes ─────────────────────────────────────────

    registry.register(kinds::LITERAL, Arc::new(LiteralRule));
    registry.register(kinds::LIST, Arc::new(ListRule));
    registry.register(kinds::TUPLE, Arc::new(TupleRule));
    registry.register(kinds::RECORD, Arc::new(RecordRule));
    registry.register(kinds::CONTEXT, Arc::new(ContextRule));
    registry.register(kinds::STORED_ITEMS, Arc::new(StoredItemsRule));

    // ── Operator families ───────────────────────────────────────────

    registry.register(Family::Boolean.kind(), Arc::new(BooleanRule));
    registry.register(Family::Arithmetic.kind(), Arc::new(ArithmeticRule));
    registry.register(Family::Preserving.kind(), Arc::new(PreservingRule));
    registry.register(Family::Aggregate.kind(), Arc::new(AggregateRule));

    // ── Operators with their own typing ─────────────────────────────

    registry.register(Op::Attribute.kind(), Arc::new(AttributeRule));
    registry.register(Op::Map.kind(), Arc::new(MapRule));
    registry.register(Op::Groupby.kind(), Arc::new(GroupbyRule));
    registry.register(Op::Len.kind(), Arc::new(LenRule));
    registry.register(Op::One.kind(), Arc::new(OneRule));
}

/// The item type a scope over `collection` binds: the inner type of a
/// list, `Unknown` otherwise.
fn item_type(collection: &Ty) -> Ty {
    collection.inner_type().cloned().unwrap_or_else(Ty::unknown)
}

// ── Non-operation nodes ────────────────────────────────────────────────

/// The type of the literal's value.
#[derive(Debug)]
pub struct LiteralRule;

impl ReturnTypeRule for LiteralRule {
    fn return_type(&self, node: &Wrapped<'_>, _: &Contexts) -> Result<Ty, TypeError> {
        match node.shape() {
            Shape::Literal(value) => Ok(value.ty()),
            _ => Err(node.malformed("expected a literal")),
        }
    }
}

/// `List<T>` when every item has type `T`; `List<Unknown>` otherwise,
/// including for the empty list.
#[derive(Debug)]
pub struct ListRule;

impl ReturnTypeRule for ListRule {
    fn return_type(&self, node: &Wrapped<'_>, contexts: &Contexts) -> Result<Ty, TypeError> {
        let Shape::List(items) = node.shape() else {
            return Err(node.malformed("expected a list literal"));
        };
        let mut items = items.iter();
        let Some(first) = items.next() else {
            return Ok(Ty::list(Ty::unknown()));
        };
        let first_ty = first.return_type(contexts)?;
        let mut homogeneous = true;
        for item in items {
            // Every item is typed so that errors anywhere in the list surface.
            if item.return_type(contexts)? != first_ty {
                homogeneous = false;
            }
        }
        if homogeneous {
            Ok(Ty::list(first_ty))
        } else {
            Ok(Ty::list(Ty::unknown()))
        }
    }
}

/// Tuples are opaque; their items are not typed.
#[derive(Debug)]
pub struct TupleRule;

impl ReturnTypeRule for TupleRule {
    fn return_type(&self, _: &Wrapped<'_>, _: &Contexts) -> Result<Ty, TypeError> {
        Ok(Ty::tuple())
    }
}

#[derive(Debug)]
pub struct RecordRule;

impl ReturnTypeRule for RecordRule {
    fn return_type(&self, node: &Wrapped<'_>, contexts: &Contexts) -> Result<Ty, TypeError> {
        let Shape::Record(fields) = node.shape() else {
            return Err(node.malformed("expected a record literal"));
        };
        let fields = fields
            .iter()
            .map(|(name, value)| Ok((*name, value.return_type(contexts)?)))
            .collect::<Result<Vec<_>, TypeError>>()?;
        Ok(Ty::record(fields))
    }
}

/// The type bound by the referenced enclosing scope.
#[derive(Debug)]
pub struct ContextRule;

impl ReturnTypeRule for ContextRule {
    fn return_type(&self, node: &Wrapped<'_>, contexts: &Contexts) -> Result<Ty, TypeError> {
        let Shape::Context { scope_depth } = *node.shape() else {
            return Err(node.malformed("expected a context reference"));
        };
        contexts
            .get(scope_depth)
            .cloned()
            .ok_or_else(|| TypeError::ContextUnderflow {
                depth: scope_depth,
                available: contexts.len(),
                path: node.path().clone(),
            })
    }
}

/// `List` of the storage's declared item type.
#[derive(Debug)]
pub struct StoredItemsRule;

impl ReturnTypeRule for StoredItemsRule {
    fn return_type(&self, node: &Wrapped<'_>, _: &Contexts) -> Result<Ty, TypeError> {
        match node.shape() {
            Shape::StoredItems(storage) => Ok(Ty::list(storage.item_type.clone())),
            _ => Err(node.malformed("expected stored items")),
        }
    }
}

// ── Operator families ──────────────────────────────────────────────────

/// Boolean operators always produce `Bool`; operands are not typed.
#[derive(Debug)]
pub struct BooleanRule;

impl ReturnTypeRule for BooleanRule {
    fn return_type(&self, _: &Wrapped<'_>, _: &Contexts) -> Result<Ty, TypeError> {
        Ok(Ty::bool())
    }
}

/// The common type of the subject and the right-hand operand.
#[derive(Debug)]
pub struct ArithmeticRule;

impl ReturnTypeRule for ArithmeticRule {
    fn return_type(&self, node: &Wrapped<'_>, contexts: &Contexts) -> Result<Ty, TypeError> {
        let left = node.expect_subject()?.return_type(contexts)?;
        let right = match node.operands() {
            Some(Operands::Plain(operands)) if operands.len() == 1 => {
                operands[0].return_type(contexts)?
            }
            _ => return Err(node.malformed("expected exactly one right-hand operand")),
        };
        Ok(left.common_type(&right))
    }
}

/// Filter, sort, slice, distinct, neg and abs leave the subject's type
/// unchanged.
#[derive(Debug)]
pub struct PreservingRule;

impl ReturnTypeRule for PreservingRule {
    fn return_type(&self, node: &Wrapped<'_>, contexts: &Contexts) -> Result<Ty, TypeError> {
        node.expect_subject()?.return_type(contexts)
    }
}

/// Max, min, sum and index unwrap a list subject to its item type.
#[derive(Debug)]
pub struct AggregateRule;

impl ReturnTypeRule for AggregateRule {
    fn return_type(&self, node: &Wrapped<'_>, contexts: &Contexts) -> Result<Ty, TypeError> {
        let subject = node.expect_subject()?.return_type(contexts)?;
        Ok(item_type(&subject))
    }
}

// ── Operators with their own typing ────────────────────────────────────

/// Field lookup on a record subject; `Unknown` for any other subject.
#[derive(Debug)]
pub struct AttributeRule;

impl ReturnTypeRule for AttributeRule {
    fn return_type(&self, node: &Wrapped<'_>, contexts: &Contexts) -> Result<Ty, TypeError> {
        let Some(Operands::Attribute { name }) = node.operands() else {
            return Err(node.malformed("expected an attribute name"));
        };
        let subject = node.expect_subject()?.return_type(contexts)?;
        if subject.fields().is_none() {
            return Ok(Ty::unknown());
        }
        match subject.field(name) {
            Some(ty) => Ok(ty.clone()),
            None => Err(TypeError::UnknownField {
                field: name.to_string(),
                record: subject,
                path: node.path().clone(),
            }),
        }
    }
}

/// `List` of the operation's type with the subject's item type bound as
/// the innermost scope.
#[derive(Debug)]
pub struct MapRule;

impl ReturnTypeRule for MapRule {
    fn return_type(&self, node: &Wrapped<'_>, contexts: &Contexts) -> Result<Ty, TypeError> {
        let Some(Operands::Map { operation }) = node.operands() else {
            return Err(node.malformed("expected a mapped operation"));
        };
        let subject = node.expect_subject()?.return_type(contexts)?;
        let scope = item_type(&subject);
        log::trace!("{}: map binds {}", node.path(), scope);
        let mapped = operation.return_type(&contexts.push(scope))?;
        Ok(Ty::list(mapped))
    }
}

/// `List<{grouper: K, elements: S}>` where `S` is the subject's type and
/// `K` the key's type with the subject's item type bound.
#[derive(Debug)]
pub struct GroupbyRule;

impl ReturnTypeRule for GroupbyRule {
    fn return_type(&self, node: &Wrapped<'_>, contexts: &Contexts) -> Result<Ty, TypeError> {
        let Some(Operands::Groupby { key }) = node.operands() else {
            return Err(node.malformed("expected a grouping key"));
        };
        let subject = node.expect_subject()?.return_type(contexts)?;
        let scope = item_type(&subject);
        log::trace!("{}: groupby binds {}", node.path(), scope);
        let grouper = key.return_type(&contexts.push(scope))?;
        Ok(Ty::list(Ty::record([
            ("grouper", grouper),
            ("elements", subject),
        ])))
    }
}

#[derive(Debug)]
pub struct LenRule;

impl ReturnTypeRule for LenRule {
    fn return_type(&self, _: &Wrapped<'_>, _: &Contexts) -> Result<Ty, TypeError> {
        Ok(Ty::int())
    }
}

/// The aggregate item type, unified with the default's type when a
/// default is given.
#[derive(Debug)]
pub struct OneRule;

impl ReturnTypeRule for OneRule {
    fn return_type(&self, node: &Wrapped<'_>, contexts: &Contexts) -> Result<Ty, TypeError> {
        let Some(Operands::One { default }) = node.operands() else {
            return Err(node.malformed("expected at most one default"));
        };
        let item = AggregateRule.return_type(node, contexts)?;
        match default {
            Some(default) => Ok(default.return_type(contexts)?.common_type(&item)),
            None => Ok(item),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multicorn_requests::{Request, SliceBounds, Storage};

    fn people() -> Request {
        Request::stored(Storage::new(
            "people",
            Ty::record([("age", Ty::int()), ("name", Ty::string())]),
        ))
    }

    fn infer(request: &Request) -> Result<Ty, TypeError> {
        let registry = WrapperRegistry::with_builtins();
        registry.wrap(request)?.return_type(&Contexts::new())
    }

    #[test]
    fn every_builtin_operator_resolves() {
        let registry = WrapperRegistry::with_builtins();
        for spec in multicorn_requests::OPERATORS {
            assert!(registry.resolve(&spec.kind()).is_ok(), "{}", spec.name);
        }
        for kind in kinds::NODE_KINDS {
            assert!(registry.is_registered(kind.as_str()));
        }
    }

    #[test]
    fn literals() {
        assert_eq!(infer(&Request::literal(3)).unwrap(), Ty::int());
        assert_eq!(infer(&Request::literal("x")).unwrap(), Ty::string());
        assert_eq!(infer(&Request::literal(())).unwrap(), Ty::none());
        assert_eq!(infer(&Request::literal(2.5)).unwrap(), Ty::float());
    }

    #[test]
    fn list_literals() {
        let ints = Request::list([Request::literal(1), Request::literal(2)]);
        assert_eq!(infer(&ints).unwrap(), Ty::list(Ty::int()));
        let mixed = Request::list([Request::literal(1), Request::literal("a")]);
        assert_eq!(infer(&mixed).unwrap(), Ty::list(Ty::unknown()));
        assert_eq!(infer(&Request::list([])).unwrap(), Ty::list(Ty::unknown()));
    }

    #[test]
    fn tuple_and_record_literals() {
        let tuple = Request::tuple([Request::literal(1), Request::context(9)]);
        assert_eq!(infer(&tuple).unwrap(), Ty::tuple());
        let record = Request::record([("a", Request::literal(1)), ("b", Request::literal(true))]);
        assert_eq!(
            infer(&record).unwrap(),
            Ty::record([("a", Ty::int()), ("b", Ty::bool())])
        );
    }

    #[test]
    fn context_underflow() {
        let err = infer(&Request::context(1)).unwrap_err();
        assert_eq!(
            err,
            TypeError::ContextUnderflow {
                depth: 1,
                available: 0,
                path: multicorn_requests::NodePath::root(),
            }
        );
        assert!(matches!(
            infer(&people().map(Request::context(0))),
            Err(TypeError::ContextUnderflow { depth: 0, .. })
        ));
    }

    #[test]
    fn families() {
        let age = Request::context(1).attr("age");
        let eq = people().filter(age.clone().binary(Op::Eq, Request::literal(3)));
        assert_eq!(infer(&eq).unwrap(), infer(&people()).unwrap());

        let cmp = Request::literal(1).binary(Op::Lt, Request::literal("b"));
        assert_eq!(infer(&cmp).unwrap(), Ty::bool());
        assert_eq!(infer(&Request::literal(1).unary(Op::Invert)).unwrap(), Ty::bool());

        let sum = Request::literal(1).binary(Op::Add, Request::literal(2));
        assert_eq!(infer(&sum).unwrap(), Ty::int());
        let widened = Request::literal(1).binary(Op::Mul, Request::literal(2.0));
        assert_eq!(infer(&widened).unwrap(), Ty::unknown());
    }

    #[test]
    fn preserving_operators() {
        let list = infer(&people()).unwrap();
        assert_eq!(infer(&people().distinct()).unwrap(), list);
        assert_eq!(
            infer(&people().slice(SliceBounds {
                start: Some(1),
                stop: None,
                step: None
            }))
            .unwrap(),
            list
        );
        assert_eq!(infer(&Request::literal(4).neg()).unwrap(), Ty::int());
        assert_eq!(
            infer(&Request::literal("s").unary(Op::Abs)).unwrap(),
            Ty::string()
        );
    }

    #[test]
    fn filter_shares_the_preserving_rule() {
        let registry = WrapperRegistry::with_builtins();
        assert!(!registry.is_registered(Op::Filter.name()));
        let family = registry.resolve(&Family::Preserving.kind()).unwrap();
        let filter = registry.resolve(&Op::Filter.kind()).unwrap();
        assert!(Arc::ptr_eq(&filter, &family));
    }

    #[test]
    fn aggregates() {
        let ages = people().map(Request::context(1).attr("age"));
        assert_eq!(infer(&ages.clone().max()).unwrap(), Ty::int());
        assert_eq!(infer(&ages.clone().sum()).unwrap(), Ty::int());
        assert_eq!(infer(&ages.index(0)).unwrap(), Ty::int());
        assert_eq!(infer(&Request::literal(3).min()).unwrap(), Ty::unknown());
    }

    #[test]
    fn one_with_and_without_default() {
        let person = Ty::record([("age", Ty::int()), ("name", Ty::string())]);
        assert_eq!(infer(&people().one(None)).unwrap(), person);
        assert_eq!(
            infer(&people().one(Some(Request::literal(())))).unwrap(),
            person
        );
        let ages = people().map(Request::context(1).attr("age"));
        assert_eq!(
            infer(&ages.clone().one(Some(Request::literal(0)))).unwrap(),
            Ty::int()
        );
        assert_eq!(
            infer(&ages.one(Some(Request::literal("none")))).unwrap(),
            Ty::unknown()
        );
    }

    #[test]
    fn attribute_access() {
        let name = people().one(None).attr("name");
        assert_eq!(infer(&name).unwrap(), Ty::string());
        assert_eq!(infer(&Request::literal(3).attr("x")).unwrap(), Ty::unknown());
        let err = infer(&people().one(None).attr("height")).unwrap_err();
        assert!(matches!(
            err,
            TypeError::UnknownField { ref field, .. } if field == "height"
        ));
    }

    #[test]
    fn map_over_non_list_binds_unknown() {
        let req = Request::literal(3).map(Request::context(1).attr("age"));
        assert_eq!(infer(&req).unwrap(), Ty::list(Ty::unknown()));
    }

    #[test]
    fn len_is_int() {
        assert_eq!(infer(&people().len()).unwrap(), Ty::int());
        assert_eq!(infer(&Request::literal("abc").len()).unwrap(), Ty::int());
    }
}

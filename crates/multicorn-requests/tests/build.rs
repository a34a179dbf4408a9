//! Integration tests for building request trees from JSON.
//!
//! These exercise:
//! - Every node kind in generic form
//! - Arity checks against the operator table, with node paths in errors
//! - Extension operators declared in the taxonomy
//! - Stored collections resolved through the catalog

use multicorn_requests::{
    kinds, Arity, BuildError, Catalog, KindId, NodePath, Op, Operator, Request, RequestBuilder,
    SliceBounds, Storage, Taxonomy,
};
use multicorn_types::Ty;

// ── Helpers ────────────────────────────────────────────────────────────

fn people_type() -> Ty {
    Ty::record([("age", Ty::int()), ("name", Ty::string())])
}

fn catalog() -> Catalog {
    [("people", people_type())].into_iter().collect()
}

fn build(json: &str) -> Result<Request, BuildError> {
    let taxonomy = Taxonomy::builtin();
    let catalog = catalog();
    RequestBuilder::new(&taxonomy, &catalog).build_json(json)
}

fn people() -> Request {
    Request::stored(Storage::new("people", people_type()))
}

// ── Successful builds ──────────────────────────────────────────────────

#[test]
fn build_map_over_stored_items() {
    let req = build(
        r#"{"kind": "map", "args": [
            {"kind": "stored_items", "storage": "people"},
            {"kind": "attribute", "args": [{"kind": "context", "scope_depth": 1}, "age"]}
        ]}"#,
    )
    .unwrap();
    assert_eq!(req, people().map(Request::context(1).attr("age")));
}

#[test]
fn build_collections() {
    let req = build(
        r#"{"kind": "record", "fields": {
            "xs": {"kind": "list", "args": [1, 2, 3]},
            "pair": {"kind": "tuple", "args": ["a", null]}
        }}"#,
    )
    .unwrap();
    assert_eq!(
        req,
        Request::record([
            (
                "xs",
                Request::list([Request::literal(1), Request::literal(2), Request::literal(3)])
            ),
            ("pair", Request::tuple([Request::literal("a"), Request::literal(())])),
        ])
    );
}

#[test]
fn build_sort_with_descending_key() {
    let req = build(
        r#"{"kind": "sort", "args": [
            {"kind": "stored_items", "storage": "people"},
            {"kind": "neg", "args": [{"kind": "attribute", "args": [{"kind": "context", "scope_depth": 1}, "age"]}]},
            {"kind": "attribute", "args": [{"kind": "context", "scope_depth": 1}, "name"]}
        ]}"#,
    )
    .unwrap();
    assert_eq!(
        req,
        people().sort([
            Request::context(1).attr("age").neg(),
            Request::context(1).attr("name"),
        ])
    );
}

#[test]
fn build_slice_and_one() {
    let req = build(
        r#"{"kind": "one", "args": [
            {"kind": "slice", "args": [{"kind": "stored_items", "storage": "people"}, {"start": 1, "stop": 3}]}
        ]}"#,
    )
    .unwrap();
    let bounds = SliceBounds {
        start: Some(1),
        stop: Some(3),
        step: None,
    };
    assert_eq!(req, people().slice(bounds).one(None));
}

#[test]
fn build_declared_extension() {
    let mut taxonomy = Taxonomy::builtin();
    taxonomy
        .declare(
            KindId::new("matches"),
            Arity::Exact(1),
            [kinds::BOOLEAN_OPERATION],
        )
        .unwrap();
    let catalog = catalog();
    let req = RequestBuilder::new(&taxonomy, &catalog)
        .build_json(r#"{"kind": "matches", "args": ["abc", "a.c"]}"#)
        .unwrap();
    assert_eq!(
        req,
        Request::literal("abc").operation(
            Operator::Extension(KindId::new("matches")),
            [Request::literal("a.c")]
        )
    );
    assert_eq!(req.kind().as_str(), "matches");
}

// ── Failures ───────────────────────────────────────────────────────────

#[test]
fn unknown_kind_is_rejected() {
    let err = build(r#"{"kind": "list", "args": [{"kind": "frobnicate", "args": [1]}]}"#)
        .unwrap_err();
    assert_eq!(
        err,
        BuildError::UnknownKind {
            kind: "frobnicate".into(),
            path: NodePath::root().child(0),
        }
    );
}

#[test]
fn extension_must_be_declared() {
    let err = build(r#"{"kind": "matches", "args": ["abc", "a.c"]}"#).unwrap_err();
    assert!(matches!(err, BuildError::UnknownKind { .. }));
}

#[test]
fn attribute_with_two_operands() {
    let err = build(r#"{"kind": "attribute", "args": [{"kind": "context", "scope_depth": 1}, "a", "b"]}"#)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "`attribute` at $ takes exactly 1 operand, found 2"
    );
}

#[test]
fn binary_operator_missing_operand() {
    let err = build(r#"{"kind": "map", "args": [{"kind": "stored_items", "storage": "people"}, {"kind": "add", "args": [1]}]}"#)
        .unwrap_err();
    assert_eq!(
        err,
        BuildError::MalformedOperands {
            kind: "add".into(),
            expected: Op::Add.arity(),
            found: 0,
            path: NodePath::root().child(1),
        }
    );
}

#[test]
fn unknown_storage() {
    let err = build(r#"{"kind": "len", "args": [{"kind": "stored_items", "storage": "planets"}]}"#)
        .unwrap_err();
    assert_eq!(err.to_string(), "unknown storage `planets` at $.0");
}

#[test]
fn malformed_json() {
    let err = build(r#"{"kind": "list", "args": ["#).unwrap_err();
    assert!(matches!(err, BuildError::Json(_)));
    assert!(err.path().is_none());
}

#[test]
fn unexpected_field_is_rejected() {
    assert!(build(r#"{"kind": "literal", "value": 1, "colour": "red"}"#).is_err());
}

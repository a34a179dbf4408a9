//! Type representation for the Multicorn request algebra.
//!
//! Defines the `Ty` enum and the primitive kinds (`Prim`) a literal value can
//! carry. `Ty` has a compact textual form (`Int`, `List<Int>`,
//! `{age: Int, name: String}`) used both for display and for declared
//! storage schemas, so it round-trips through `Display` and `FromStr`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A primitive kind.
///
/// `Unknown` is the opaque type: the result of widening two incompatible
/// types, and of any rule that cannot say anything more precise.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Prim {
    Unknown,
    None,
    Bool,
    Int,
    Float,
    String,
    Slice,
    Tuple,
}

impl Prim {
    /// Every primitive kind, in declaration order.
    pub const ALL: [Prim; 8] = [
        Prim::Unknown,
        Prim::None,
        Prim::Bool,
        Prim::Int,
        Prim::Float,
        Prim::String,
        Prim::Slice,
        Prim::Tuple,
    ];

    /// The canonical name, as printed by `Display`.
    pub fn name(self) -> &'static str {
        match self {
            Prim::Unknown => "Unknown",
            Prim::None => "None",
            Prim::Bool => "Bool",
            Prim::Int => "Int",
            Prim::Float => "Float",
            Prim::String => "String",
            Prim::Slice => "Slice",
            Prim::Tuple => "Tuple",
        }
    }

    /// Look up a primitive by name.
    ///
    /// Accepts the canonical names case-insensitively plus the short
    /// aliases storage schemas tend to use (`str`, `object`, ...).
    pub fn from_name(name: &str) -> Option<Prim> {
        let prim = match name.to_ascii_lowercase().as_str() {
            "unknown" | "object" | "any" => Prim::Unknown,
            "none" | "null" => Prim::None,
            "bool" | "boolean" => Prim::Bool,
            "int" | "integer" => Prim::Int,
            "float" | "number" => Prim::Float,
            "string" | "str" | "text" => Prim::String,
            "slice" => Prim::Slice,
            "tuple" => Prim::Tuple,
            _ => return None,
        };
        Some(prim)
    }
}

impl fmt::Display for Prim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Multicorn type.
///
/// - `Prim`: a primitive kind (including the opaque `Unknown`)
/// - `List`: a homogeneous sequence; the element type is `Unknown` when it
///   cannot be determined (e.g. an empty list literal)
/// - `Record`: a finite set of uniquely named, independently typed fields
///
/// Fields are kept sorted by name, so two records are equal exactly when
/// they have the same field names with equal types, whatever order they
/// were declared in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ty {
    Prim(Prim),
    List(Box<Ty>),
    Record(BTreeMap<String, Ty>),
}

impl Ty {
    /// The opaque type.
    pub fn unknown() -> Ty {
        Ty::Prim(Prim::Unknown)
    }

    pub fn none() -> Ty {
        Ty::Prim(Prim::None)
    }

    pub fn bool() -> Ty {
        Ty::Prim(Prim::Bool)
    }

    pub fn int() -> Ty {
        Ty::Prim(Prim::Int)
    }

    pub fn float() -> Ty {
        Ty::Prim(Prim::Float)
    }

    pub fn string() -> Ty {
        Ty::Prim(Prim::String)
    }

    pub fn slice() -> Ty {
        Ty::Prim(Prim::Slice)
    }

    pub fn tuple() -> Ty {
        Ty::Prim(Prim::Tuple)
    }

    /// Create a `List<T>` type.
    pub fn list(inner: Ty) -> Ty {
        Ty::List(Box::new(inner))
    }

    /// Create a record type from `(name, type)` pairs.
    ///
    /// A repeated name keeps the last type given for it.
    pub fn record<K, I>(fields: I) -> Ty
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Ty)>,
    {
        Ty::Record(fields.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }

    /// Whether this is the opaque `Unknown` type.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Ty::Prim(Prim::Unknown))
    }

    /// The element type of a list, `None` for anything else.
    pub fn inner_type(&self) -> Option<&Ty> {
        match self {
            Ty::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// The fields of a record, `None` for anything else.
    pub fn fields(&self) -> Option<&BTreeMap<String, Ty>> {
        match self {
            Ty::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a field type on a record.
    pub fn field(&self, name: &str) -> Option<&Ty> {
        self.fields().and_then(|fields| fields.get(name))
    }

    /// Shorthand for [`crate::common_type`].
    pub fn common_type(&self, other: &Ty) -> Ty {
        crate::unify::common_type(self, other)
    }
}

impl From<Prim> for Ty {
    fn from(prim: Prim) -> Ty {
        Ty::Prim(prim)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Prim(p) => write!(f, "{}", p),
            Ty::List(inner) => write!(f, "List<{}>", inner),
            Ty::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<Ty> for String {
    fn from(ty: Ty) -> String {
        ty.to_string()
    }
}

impl TryFrom<String> for Ty {
    type Error = ParseTyError;

    fn try_from(text: String) -> Result<Ty, ParseTyError> {
        text.parse()
    }
}

// ── Parsing ────────────────────────────────────────────────────────────

/// An error from parsing the textual form of a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseTyError {
    /// Byte offset in the input where parsing stopped.
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for ParseTyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid type at offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseTyError {}

impl FromStr for Ty {
    type Err = ParseTyError;

    fn from_str(text: &str) -> Result<Ty, ParseTyError> {
        let mut parser = TyParser { text, pos: 0 };
        let ty = parser.ty()?;
        parser.skip_ws();
        if parser.pos < text.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

/// Recursive-descent parser for `Prim | List<T> | {name: T, ...}`.
struct TyParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> TyParser<'a> {
    fn error(&self, message: impl Into<String>) -> ParseTyError {
        ParseTyError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ParseTyError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", c)))
        }
    }

    fn ident(&mut self) -> Result<&'a str, ParseTyError> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn ty(&mut self) -> Result<Ty, ParseTyError> {
        if self.eat('{') {
            return self.record();
        }
        let start = self.pos;
        let name = self.ident()?;
        if name.eq_ignore_ascii_case("list") {
            self.expect('<')?;
            let inner = self.ty()?;
            self.expect('>')?;
            return Ok(Ty::list(inner));
        }
        match Prim::from_name(name) {
            Some(prim) => Ok(Ty::Prim(prim)),
            None => {
                self.pos = start;
                self.skip_ws();
                Err(self.error(format!("unknown type `{}`", name)))
            }
        }
    }

    fn record(&mut self) -> Result<Ty, ParseTyError> {
        let mut fields = BTreeMap::new();
        loop {
            if self.eat('}') {
                break;
            }
            let name = self.ident()?;
            self.expect(':')?;
            let ty = self.ty()?;
            if fields.insert(name.to_string(), ty).is_some() {
                return Err(self.error(format!("duplicate field `{}`", name)));
            }
            if !self.eat(',') {
                self.expect('}')?;
                break;
            }
        }
        Ok(Ty::Record(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested() {
        let ty = Ty::list(Ty::record([
            ("name", Ty::string()),
            ("age", Ty::int()),
        ]));
        insta::assert_snapshot!(ty.to_string(), @"List<{age: Int, name: String}>");
    }

    #[test]
    fn display_empty_record() {
        assert_eq!(Ty::record(Vec::<(String, Ty)>::new()).to_string(), "{}");
    }

    #[test]
    fn record_field_order_is_irrelevant() {
        let a = Ty::record([("x", Ty::int()), ("y", Ty::string())]);
        let b = Ty::record([("y", Ty::string()), ("x", Ty::int())]);
        assert_eq!(a, b);
    }

    #[test]
    fn parse_round_trips_display() {
        for text in [
            "Int",
            "List<Unknown>",
            "{age: Int, tags: List<String>}",
            "List<{elements: List<Int>, grouper: Bool}>",
        ] {
            let ty: Ty = text.parse().unwrap();
            assert_eq!(ty.to_string(), text);
        }
    }

    #[test]
    fn parse_accepts_aliases_and_whitespace() {
        let ty: Ty = " list< { name : str , score: number, } > ".parse().unwrap();
        assert_eq!(
            ty,
            Ty::list(Ty::record([("name", Ty::string()), ("score", Ty::float())]))
        );
        assert_eq!("object".parse::<Ty>().unwrap(), Ty::unknown());
    }

    #[test]
    fn parse_rejects_unknown_name() {
        let err = "List<Widget>".parse::<Ty>().unwrap_err();
        assert_eq!(err.offset, 5);
        assert_eq!(err.to_string(), "invalid type at offset 5: unknown type `Widget`");
    }

    #[test]
    fn parse_rejects_duplicate_field() {
        let err = "{a: Int, a: Bool}".parse::<Ty>().unwrap_err();
        assert!(err.message.contains("duplicate field `a`"), "{}", err);
    }

    #[test]
    fn parse_rejects_trailing_input() {
        assert!("Int Int".parse::<Ty>().is_err());
        assert!("List<Int".parse::<Ty>().is_err());
    }

    #[test]
    fn accessors() {
        let ty = Ty::list(Ty::record([("age", Ty::int())]));
        let inner = ty.inner_type().unwrap();
        assert_eq!(inner.field("age"), Some(&Ty::int()));
        assert_eq!(inner.field("name"), None);
        assert!(Ty::int().inner_type().is_none());
        assert!(Ty::unknown().is_unknown());
    }
}

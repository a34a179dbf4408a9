//! `multicorn.toml`: the storage schema and extension operators a request
//! is checked against.
//!
//! ```toml
//! [storages.people]
//! age = "Int"
//! name = "String"
//! tags = "List<String>"
//!
//! [operators.median]
//! arity = 0
//! falls_back_to = ["aggregate_operation"]
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use multicorn_requests::{Arity, Catalog, KindId, Taxonomy};
use multicorn_types::Ty;

/// A parsed multicorn.toml file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Stored collections: name -> field name -> field type.
    #[serde(default)]
    pub storages: BTreeMap<String, BTreeMap<String, Ty>>,
    /// Extension operators.
    #[serde(default)]
    pub operators: BTreeMap<String, OperatorDecl>,
}

/// An extension operator declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorDecl {
    /// Exact number of operands besides the subject; any number if absent.
    #[serde(default)]
    pub arity: Option<usize>,
    /// Kinds whose rules type this operator, most specific first.
    #[serde(default)]
    pub falls_back_to: Vec<String>,
}

impl Config {
    /// Read and parse a multicorn.toml file.
    pub fn from_file(path: &Path) -> Result<Config, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_str(&content)
    }

    /// Parse a multicorn.toml from a string.
    pub fn from_str(content: &str) -> Result<Config, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse schema: {}", e))
    }

    /// The declared storages, each item typed as a record of its fields.
    pub fn catalog(&self) -> Catalog {
        self.storages
            .iter()
            .map(|(name, fields)| {
                let item = Ty::record(fields.iter().map(|(f, ty)| (f.as_str(), ty.clone())));
                (name.as_str(), item)
            })
            .collect()
    }

    /// The built-in taxonomy plus the declared extension operators.
    pub fn taxonomy(&self) -> Result<Taxonomy, String> {
        let mut taxonomy = Taxonomy::builtin();
        for (name, decl) in &self.operators {
            let arity = decl.arity.map_or(Arity::AtLeast(0), Arity::Exact);
            let fallbacks = decl.falls_back_to.iter().map(|k| KindId::new(k.as_str()));
            taxonomy
                .declare(KindId::new(name.as_str()), arity, fallbacks)
                .map_err(|e| format!("Invalid operator `{}`: {}", name, e))?;
        }
        Ok(taxonomy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml = r#"
[storages.people]
age = "Int"
name = "str"
tags = "List<String>"

[storages.empty]

[operators.median]
arity = 0
falls_back_to = ["aggregate_operation"]

[operators.sample]
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.storages.len(), 2);
        let catalog = config.catalog();
        assert_eq!(catalog.names(), vec!["empty", "people"]);
        assert_eq!(
            catalog.get("people").unwrap().item_type,
            Ty::record([
                ("age", Ty::int()),
                ("name", Ty::string()),
                ("tags", Ty::list(Ty::string())),
            ])
        );
        assert_eq!(catalog.get("empty").unwrap().item_type, Ty::record(Vec::<(String, Ty)>::new()));

        let taxonomy = config.taxonomy().unwrap();
        assert_eq!(taxonomy.extension_arity("median"), Some(Arity::Exact(0)));
        assert_eq!(taxonomy.extension_arity("sample"), Some(Arity::AtLeast(0)));
        let lineage: Vec<String> = taxonomy
            .lineage(&KindId::new("median"))
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(lineage, ["median", "aggregate_operation", "operation", "request"]);
    }

    #[test]
    fn empty_config() {
        let config = Config::from_str("").unwrap();
        assert!(config.catalog().is_empty());
        assert!(config.taxonomy().is_ok());
    }

    #[test]
    fn bad_field_type() {
        let err = Config::from_str("[storages.people]\nage = \"Integr\"\n").unwrap_err();
        assert!(err.starts_with("Failed to parse schema:"), "{}", err);
    }

    #[test]
    fn operator_cannot_shadow_builtin() {
        let config = Config::from_str("[operators.len]\narity = 0\n").unwrap();
        let err = config.taxonomy().unwrap_err();
        assert!(err.starts_with("Invalid operator `len`:"), "{}", err);
    }

    #[test]
    fn unknown_fallback() {
        let config =
            Config::from_str("[operators.median]\nfalls_back_to = [\"statistics\"]\n").unwrap();
        assert!(config.taxonomy().is_err());
    }

    #[test]
    fn from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multicorn.toml");
        std::fs::write(&path, "[storages.cities]\npopulation = \"Int\"\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.catalog().len(), 1);
        assert!(Config::from_file(&dir.path().join("missing.toml")).is_err());
    }
}

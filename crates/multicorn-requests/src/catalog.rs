//! Declared stored collections.

use multicorn_types::Ty;
use rustc_hash::FxHashMap;

use crate::request::Storage;

/// The stored collections a request may reference, with their declared item
/// types. Supplied by the storage layer.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    storages: FxHashMap<String, Storage>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a storage; a later declaration of the same name replaces it.
    pub fn insert(&mut self, name: impl Into<String>, item_type: Ty) {
        let name = name.into();
        self.storages
            .insert(name.clone(), Storage::new(name, item_type));
    }

    pub fn get(&self, name: &str) -> Option<&Storage> {
        self.storages.get(name)
    }

    /// Storage names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.storages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.storages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storages.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Ty)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (K, Ty)>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for (name, ty) in iter {
            catalog.insert(name, ty);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let catalog: Catalog = [
            ("people", Ty::record([("age", Ty::int())])),
            ("cities", Ty::record([("name", Ty::string())])),
        ]
        .into_iter()
        .collect();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names(), vec!["cities", "people"]);
        let people = catalog.get("people").unwrap();
        assert_eq!(people.name, "people");
        assert_eq!(people.item_type.field("age"), Some(&Ty::int()));
        assert!(catalog.get("planets").is_none());
    }

    #[test]
    fn redeclare_replaces() {
        let mut catalog = Catalog::new();
        catalog.insert("people", Ty::int());
        catalog.insert("people", Ty::string());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("people").unwrap().item_type, Ty::string());
    }
}

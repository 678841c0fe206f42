use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;

/// Upgrade code of an installed product, stored as a single string or a
/// multi-string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductIdentifier {
    Single(String),
    Multi(Vec<String>),
}

impl ProductIdentifier {
    /// Case-insensitive match against `id`, any entry of a multi-value
    /// identifier counting.
    pub fn matches(&self, id: &str) -> bool {
        match self {
            Self::Single(value) => value.eq_ignore_ascii_case(id),
            Self::Multi(values) => values.iter().any(|v| v.eq_ignore_ascii_case(id)),
        }
    }
}

/// Raw values of one installed-product record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductRecord {
    pub upgrade_code:      Option<ProductIdentifier>,
    /// Bundle version; must parse for the record to count.
    pub primary_version:   Option<String>,
    /// More specific display version, preferred when it parses.
    pub secondary_version: Option<String>,
}

/// Source of installed-product records.
pub trait InstalledProducts: Send + Sync {
    /// List the keys of all records.
    fn keys(&self) -> Result<Vec<String>>;

    /// Read one record. `None` when the record cannot be opened.
    fn read(&self, key: &str) -> Option<ProductRecord>;
}

impl<T: InstalledProducts + ?Sized> InstalledProducts for Arc<T> {
    fn keys(&self) -> Result<Vec<String>> { (**self).keys() }

    fn read(&self, key: &str) -> Option<ProductRecord> { (**self).read(key) }
}

/// In-memory record set.
#[derive(Debug, Clone, Default)]
pub struct StaticProducts {
    records: BTreeMap<String, ProductRecord>,
}

impl StaticProducts {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, key: impl Into<String>, record: ProductRecord) -> Self {
        self.insert(key, record);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, record: ProductRecord) {
        self.records.insert(key.into(), record);
    }
}

impl InstalledProducts for StaticProducts {
    fn keys(&self) -> Result<Vec<String>> { Ok(self.records.keys().cloned().collect()) }

    fn read(&self, key: &str) -> Option<ProductRecord> { self.records.get(key).cloned() }
}

/// The uninstall registry on Windows, an empty set elsewhere.
pub fn default_products() -> Arc<dyn InstalledProducts> {
    #[cfg(windows)]
    {
        Arc::new(crate::registry::UninstallRegistry::new())
    }
    #[cfg(not(windows))]
    {
        Arc::new(StaticProducts::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_matches_case_insensitively() {
        let single = ProductIdentifier::Single("{ef5d5806-b90b-4aa3-800a-2d7ea1592ba0}".into());
        assert!(single.matches("{EF5D5806-B90B-4AA3-800A-2D7EA1592BA0}"));
        assert!(!single.matches("{00000000-0000-0000-0000-000000000000}"));

        let multi = ProductIdentifier::Multi(vec!["{A}".into(), "{B}".into()]);
        assert!(multi.matches("{b}"));
        assert!(!multi.matches("{C}"));
        assert!(!ProductIdentifier::Multi(vec![]).matches(""));
    }

    #[test]
    fn test_static_products() {
        let products = StaticProducts::new()
            .with("b", ProductRecord::default())
            .with("a", ProductRecord::default());
        assert_eq!(products.keys().unwrap(), ["a", "b"]);
        assert!(products.read("a").is_some());
        assert!(products.read("missing").is_none());
    }
}

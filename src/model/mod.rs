//! Module records as produced by a scan, and the identity-keyed set the
//! graph is built from.
//!
//! A `ModuleSet` holds at most one record per identity. When two scanned
//! declarations claim the same identity, a primary record replaces a
//! secondary one; otherwise the first record seen is kept.
use crate::errors::DepgraphError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

fn default_resolved() -> bool {
    true
}

/// One discovered module declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleRecord {
    pub identity: String,
    /// Where the declaration was found, e.g. `owner/repo`.
    pub origin_location: String,
    #[serde(default)]
    pub is_secondary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_identity: Option<String>,
    #[serde(default)]
    pub group_index: usize,
    /// Direct dependency identity -> required version.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default = "default_resolved")]
    pub resolved: bool,
}

impl ModuleRecord {
    /// A resolved primary record with no dependencies.
    pub fn new(identity: impl Into<String>, origin_location: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            origin_location: origin_location.into(),
            is_secondary: false,
            original_identity: None,
            group_index: 0,
            dependencies: BTreeMap::new(),
            resolved: true,
        }
    }

    #[must_use]
    pub fn with_dependency(mut self, identity: impl Into<String>, version: impl Into<String>) -> Self {
        self.dependencies.insert(identity.into(), version.into());
        self
    }

    #[must_use]
    pub fn secondary(mut self, original_identity: Option<&str>) -> Self {
        self.is_secondary = true;
        self.original_identity = original_identity.map(str::to_string);
        self
    }

    #[must_use]
    pub fn in_group(mut self, group_index: usize) -> Self {
        self.group_index = group_index;
        self
    }

    /// Does this record depend on `identity`?
    pub fn depends_on(&self, identity: &str) -> bool {
        self.dependencies.contains_key(identity)
    }
}

/// Identity-keyed records plus every identity seen anywhere, including
/// dependency targets that never resolved to a record.
#[derive(Debug, Clone, Default)]
pub struct ModuleSet {
    pub records: HashMap<String, ModuleRecord>,
    pub all_identities: BTreeSet<String>,
}

impl ModuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, resolving identity conflicts.
    ///
    /// Returns `true` when the record was stored, `false` when an existing
    /// record took precedence.
    pub fn insert(&mut self, record: ModuleRecord) -> bool {
        self.all_identities.insert(record.identity.clone());
        self.all_identities.extend(record.dependencies.keys().cloned());
        if let Some(existing) = self.records.get(&record.identity) {
            let replace = existing.is_secondary && !record.is_secondary;
            if !replace {
                tracing::debug!(
                    identity = %record.identity,
                    kept = %existing.origin_location,
                    dropped = %record.origin_location,
                    "duplicate module identity"
                );
                return false;
            }
            tracing::debug!(
                identity = %record.identity,
                kept = %record.origin_location,
                dropped = %existing.origin_location,
                "primary declaration replaces fork"
            );
        }
        self.records.insert(record.identity.clone(), record);
        true
    }

    pub fn get(&self, identity: &str) -> Option<&ModuleRecord> {
        self.records.get(identity)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record identities in lexicographic order.
    pub fn sorted_identities(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.records.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Load a records inventory: a JSON array of `ModuleRecord`.
    ///
    /// # Errors
    /// Returns `DepgraphError::Io` if the file cannot be read and
    /// `DepgraphError::Records` if it is not a valid inventory.
    pub fn load_json(path: &Path) -> Result<Self, DepgraphError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Parse a records inventory from a JSON string.
    ///
    /// # Errors
    /// Returns `DepgraphError::Records` on invalid JSON or an empty identity.
    pub fn from_json_str(data: &str) -> Result<Self, DepgraphError> {
        let records: Vec<ModuleRecord> =
            serde_json::from_str(data).map_err(|e| DepgraphError::Records(e.to_string()))?;
        let mut set = Self::new();
        for rec in records {
            if rec.identity.trim().is_empty() {
                return Err(DepgraphError::Records(format!(
                    "record from '{}' has an empty identity",
                    rec.origin_location
                )));
            }
            set.insert(rec);
        }
        Ok(set)
    }
}

impl FromIterator<ModuleRecord> for ModuleSet {
    fn from_iter<I: IntoIterator<Item = ModuleRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for rec in iter {
            set.insert(rec);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_replaces_secondary_with_same_identity() {
        let mut set = ModuleSet::new();
        assert!(set.insert(ModuleRecord::new("example.com/a", "me/a-fork").secondary(None)));
        assert!(set.insert(ModuleRecord::new("example.com/a", "upstream/a")));
        assert_eq!(set.get("example.com/a").map(|r| r.origin_location.as_str()), Some("upstream/a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn first_seen_wins_otherwise() {
        let mut set = ModuleSet::new();
        assert!(set.insert(ModuleRecord::new("m", "first")));
        assert!(!set.insert(ModuleRecord::new("m", "second")));
        assert!(!set.insert(ModuleRecord::new("m", "fork").secondary(Some("m"))));
        assert_eq!(set.get("m").map(|r| r.origin_location.as_str()), Some("first"));
    }

    #[test]
    fn all_identities_include_dependency_targets() {
        let set: ModuleSet = [ModuleRecord::new("a", "o/a").with_dependency("ext/z", "v1.0.0")]
            .into_iter()
            .collect();
        assert!(set.all_identities.contains("a"));
        assert!(set.all_identities.contains("ext/z"));
        assert!(set.get("ext/z").is_none());
    }

    #[test]
    fn json_inventory_defaults_optional_fields() {
        let set = ModuleSet::from_json_str(
            r#"[{"identity": "a", "origin_location": "o/a", "dependencies": {"b": "v1"}}]"#,
        )
        .unwrap();
        let a = set.get("a").unwrap();
        assert!(a.resolved);
        assert!(!a.is_secondary);
        assert_eq!(a.group_index, 0);
        assert_eq!(a.dependencies.get("b").map(String::as_str), Some("v1"));
    }

    #[test]
    fn json_inventory_rejects_empty_identity() {
        let err = ModuleSet::from_json_str(r#"[{"identity": " ", "origin_location": "o/x"}]"#)
            .unwrap_err();
        assert!(matches!(err, DepgraphError::Records(_)));
    }
}

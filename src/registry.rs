//! Canonical Schema Registry
//!
//! Maps canonical type names to their constraint records. Built once per run
//! from the converted type system plus overlays, then only read by the
//! enhancement pass.
//!
//! Storage keeps insertion order. Besides exact lookup, a case-insensitive
//! fallback returns the first key (in insertion order) that matches. Two keys
//! that differ only by case make that fallback ambiguous, so registering such
//! a pair logs a warning and is remembered in [`CanonicalSchemaRegistry::collisions`].

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::constraint::{ref_target, ConstraintRecord};
use crate::error::{Result, SchemaError};

/// A case-insensitive name clash recorded at registration time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseCollision {
    /// The name being registered
    pub name: String,
    /// The different-cased key already present
    pub existing: String,
}

/// The in-memory canonical registry
#[derive(Debug, Clone, Default)]
pub struct CanonicalSchemaRegistry {
    entries: Vec<(String, ConstraintRecord)>,
    /// name -> position in `entries`
    index: HashMap<String, usize>,
    collisions: Vec<CaseCollision>,
}

impl CanonicalSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record. A duplicate exact name is overwritten in place (last
    /// write wins), which is how overlays override generated entries.
    pub fn register(&mut self, name: impl Into<String>, record: ConstraintRecord) {
        let name = name.into();
        if let Some(&pos) = self.index.get(&name) {
            debug!("Overwriting registry entry {}", name);
            self.entries[pos].1 = record;
            return;
        }

        let lower = name.to_lowercase();
        if let Some((existing, _)) = self.entries.iter().find(|(k, _)| k.to_lowercase() == lower) {
            warn!(
                "Registering {} collides case-insensitively with {}; case-insensitive lookups will resolve to {}",
                name, existing, existing
            );
            self.collisions.push(CaseCollision {
                name: name.clone(),
                existing: existing.clone(),
            });
        }

        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, record));
    }

    /// Register only if the exact name is absent. Returns whether it was added.
    pub fn register_if_absent(&mut self, name: impl Into<String>, record: ConstraintRecord) -> bool {
        let name = name.into();
        if self.index.contains_key(&name) {
            return false;
        }
        self.register(name, record);
        true
    }

    /// Exact lookup
    pub fn get(&self, name: &str) -> Option<&ConstraintRecord> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    /// Case-insensitive lookup; first match in insertion order
    pub fn get_case_insensitive(&self, name: &str) -> Option<&ConstraintRecord> {
        self.find_case_insensitive(name).map(|(_, record)| record)
    }

    /// Exact lookup, then case-insensitive fallback. Returns the stored key.
    pub fn resolve(&self, name: &str) -> Option<(&str, &ConstraintRecord)> {
        if let Some(&pos) = self.index.get(name) {
            let (key, record) = &self.entries[pos];
            return Some((key.as_str(), record));
        }
        self.find_case_insensitive(name)
    }

    fn find_case_insensitive(&self, name: &str) -> Option<(&str, &ConstraintRecord)> {
        let lower = name.to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| key.to_lowercase() == lower)
            .map(|(key, record)| (key.as_str(), record))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConstraintRecord)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive clashes seen while registering
    pub fn collisions(&self) -> &[CaseCollision] {
        &self.collisions
    }

    /// Load the `definitions` section of a converted JSON Schema document.
    ///
    /// `$ref` aliases are registered with their target's record when the
    /// target is a known record. Other non-record definitions are skipped.
    pub fn from_json_schema(document: &Value) -> Result<Self> {
        let definitions = match document.get("definitions") {
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(SchemaError::InvalidDocument(
                    "'definitions' must be a mapping".to_string(),
                ))
            }
            None => return Ok(Self::new()),
        };

        let mut registry = Self::new();
        let mut aliases = Vec::new();

        for (name, definition) in definitions {
            if let Some(record) = ConstraintRecord::from_json(definition) {
                registry.register(name.clone(), record);
            } else if let Some(reference) = definition.get("$ref").and_then(Value::as_str) {
                aliases.push((name.clone(), ref_target(reference).to_string()));
            } else {
                debug!("Skipping definition {}: not a constraint record", name);
            }
        }

        for (name, target) in aliases {
            match registry.get(&target).cloned() {
                Some(record) => registry.register(name, record),
                None => debug!("Skipping alias {} -> {}: unknown target", name, target),
            }
        }

        Ok(registry)
    }

    /// Render all entries as a JSON Schema `definitions` mapping
    pub fn to_definitions(&self) -> serde_json::Map<String, Value> {
        self.entries
            .iter()
            .map(|(name, record)| (name.clone(), record.to_json()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Kind;
    use serde_json::json;

    fn string_max(max: u64) -> ConstraintRecord {
        ConstraintRecord {
            max_length: Some(max),
            ..ConstraintRecord::of_kind(Kind::String)
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = CanonicalSchemaRegistry::new();
        registry.register("String15", string_max(15));
        assert_eq!(registry.get("String15"), Some(&string_max(15)));
        assert!(registry.get("string15").is_none());
        assert_eq!(registry.get_case_insensitive("string15"), Some(&string_max(15)));
    }

    #[test]
    fn test_last_write_wins_in_place() {
        let mut registry = CanonicalSchemaRegistry::new();
        registry.register("A", string_max(1));
        registry.register("B", string_max(2));
        registry.register("A", string_max(3));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(registry.get("A"), Some(&string_max(3)));
    }

    #[test]
    fn test_register_if_absent() {
        let mut registry = CanonicalSchemaRegistry::new();
        assert!(registry.register_if_absent("A", string_max(1)));
        assert!(!registry.register_if_absent("A", string_max(2)));
        assert_eq!(registry.get("A"), Some(&string_max(1)));
    }

    #[test]
    fn test_case_collision_is_recorded() {
        let mut registry = CanonicalSchemaRegistry::new();
        registry.register("SrcType", string_max(1));
        registry.register("Srctype", string_max(2));
        assert_eq!(
            registry.collisions(),
            &[CaseCollision { name: "Srctype".to_string(), existing: "SrcType".to_string() }]
        );
        // First in insertion order wins
        assert_eq!(registry.resolve("SRCTYPE").map(|(k, _)| k), Some("SrcType"));
        // Exact still wins over the fallback
        assert_eq!(registry.resolve("Srctype").map(|(k, _)| k), Some("Srctype"));
    }

    #[test]
    fn test_from_json_schema() {
        let document = json!({
            "definitions": {
                "String15": {"type": "string", "maxLength": 15},
                "OrdSet": {"$ref": "#/definitions/OrdSetType"},
                "OrdSetType": {"type": "object", "properties": {"Ord": {"type": "string"}}},
                "Dangling": {"$ref": "#/definitions/Nowhere"},
                "Listy": {"type": "array"}
            }
        });
        let registry = CanonicalSchemaRegistry::from_json_schema(&document).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["String15", "OrdSetType", "OrdSet"]);
        assert_eq!(registry.get("OrdSet"), registry.get("OrdSetType"));
    }

    #[test]
    fn test_from_json_schema_rejects_bad_definitions() {
        let result = CanonicalSchemaRegistry::from_json_schema(&json!({"definitions": []}));
        assert!(matches!(result, Err(SchemaError::InvalidDocument(_))));
    }

    #[test]
    fn test_to_definitions_round_trip() {
        let mut registry = CanonicalSchemaRegistry::new();
        registry.register("String15", string_max(15));
        let definitions = registry.to_definitions();
        assert_eq!(definitions["String15"], json!({"type": "string", "maxLength": 15}));
    }
}

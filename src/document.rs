//! API document access
//!
//! Thin typed views over an OpenAPI document tree: the `components.schemas`
//! section, the `info` block, and individual field nodes.

use serde_json::{Map, Value};

use crate::constraint::ConstraintRecord;
use crate::error::{Result, SchemaError};

/// Preserve-only metadata keys of a field node
pub const METADATA_KEYS: [&str; 3] = ["description", "example", "externalDocs"];

/// Constraint keys copied onto document properties
pub const PROPERTY_CONSTRAINT_KEYS: [&str; 6] = ["type", "pattern", "minLength", "maxLength", "enum", "format"];

/// Constraint keys copied onto top-level string schemas (their `type` stays)
pub const TOP_LEVEL_CONSTRAINT_KEYS: [&str; 5] = ["pattern", "minLength", "maxLength", "enum", "format"];

/// Keys the name-match fallback may fill when absent
pub const FILL_ABSENT_KEYS: [&str; 5] = ["enum", "pattern", "minLength", "maxLength", "description"];

// =============================================================================
// Document
// =============================================================================

/// Mutable view over an OpenAPI document
pub struct ApiDocument<'a> {
    root: &'a mut Map<String, Value>,
}

impl<'a> ApiDocument<'a> {
    /// Wrap a document tree; the root must be a mapping
    pub fn new(root: &'a mut Value) -> Result<Self> {
        match root {
            Value::Object(map) => Ok(Self { root: map }),
            _ => Err(SchemaError::InvalidDocument("document root must be a mapping".to_string())),
        }
    }

    /// The `info.title` string, if any
    pub fn title(&self) -> Option<&str> {
        self.root.get("info")?.get("title")?.as_str()
    }

    /// The `components.schemas` section, if present
    pub fn schemas(&self) -> Option<&Map<String, Value>> {
        self.root.get("components")?.get("schemas")?.as_object()
    }

    /// The `components.schemas` section, created when missing
    pub fn schemas_mut(&mut self) -> Result<&mut Map<String, Value>> {
        let components = section_mut(self.root, "components")?;
        section_mut(components, "schemas").map_err(|_| {
            SchemaError::InvalidDocument("'components.schemas' must be a mapping".to_string())
        })
    }

    /// The `info` block, created when missing
    pub fn info_mut(&mut self) -> Result<&mut Map<String, Value>> {
        section_mut(self.root, "info")
    }
}

/// Get or create a mapping under `key`; `null` counts as missing
fn section_mut<'m>(parent: &'m mut Map<String, Value>, key: &str) -> Result<&'m mut Map<String, Value>> {
    let entry = parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if entry.is_null() {
        *entry = Value::Object(Map::new());
    }
    entry
        .as_object_mut()
        .ok_or_else(|| SchemaError::InvalidDocument(format!("'{}' must be a mapping", key)))
}

// =============================================================================
// Field nodes
// =============================================================================

/// Metadata captured before a merge
#[derive(Debug, Clone, Default)]
pub struct MetadataSnapshot {
    values: Vec<(&'static str, Value)>,
}

/// Mutable view over one schema or property node
pub struct FieldNode<'a> {
    node: &'a mut Map<String, Value>,
}

impl<'a> FieldNode<'a> {
    pub fn new(node: &'a mut Map<String, Value>) -> Self {
        Self { node }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.node.get(key)
    }

    /// Declared `type`, if it is a string
    pub fn kind(&self) -> Option<&str> {
        self.node.get("type").and_then(Value::as_str)
    }

    /// Record every non-empty metadata value
    pub fn snapshot_metadata(&self) -> MetadataSnapshot {
        let values = METADATA_KEYS
            .iter()
            .filter_map(|key| {
                self.node
                    .get(*key)
                    .filter(|v| !is_empty_value(v))
                    .map(|v| (*key, v.clone()))
            })
            .collect();
        MetadataSnapshot { values }
    }

    /// Put back any snapshot value that no longer matches. Returns the keys
    /// that had to be restored.
    pub fn restore_metadata(&mut self, snapshot: MetadataSnapshot) -> Vec<&'static str> {
        let mut restored = Vec::new();
        for (key, value) in snapshot.values {
            if self.node.get(key) != Some(&value) {
                self.node.insert(key.to_string(), value);
                restored.push(key);
            }
        }
        restored
    }

    /// Overwrite `keys` with the record's values, skipping keys the record
    /// does not define. Returns whether anything changed.
    pub fn copy_from(&mut self, record: &ConstraintRecord, keys: &[&str]) -> bool {
        let mut changed = false;
        for key in keys {
            if let Some(value) = record_value(record, key) {
                if self.node.get(*key) != Some(&value) {
                    self.node.insert(key.to_string(), value);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Set `keys` from the record only where the node has no value yet.
    /// Returns whether anything changed.
    pub fn fill_from(&mut self, record: &ConstraintRecord, keys: &[&str]) -> bool {
        let mut changed = false;
        for key in keys {
            let absent = self.node.get(*key).map_or(true, Value::is_null);
            if !absent {
                continue;
            }
            if let Some(value) = record_value(record, key) {
                self.node.insert(key.to_string(), value);
                changed = true;
            }
        }
        changed
    }
}

/// The record's value for a JSON Schema keyword
fn record_value(record: &ConstraintRecord, key: &str) -> Option<Value> {
    match key {
        "type" => Some(Value::String(record.kind.as_str().to_string())),
        "pattern" => record.pattern.clone().map(Value::String),
        "minLength" => record.min_length.map(Value::from),
        "maxLength" => record.max_length.map(Value::from),
        "enum" => record.enumeration.clone().map(Value::Array),
        "format" => record.format.clone().map(Value::String),
        "description" => record.description.clone().map(Value::String),
        _ => None,
    }
}

/// `null`, `""`, `[]` and `{}` count as empty
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

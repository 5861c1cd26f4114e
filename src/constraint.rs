//! Canonical constraint records
//!
//! A [`ConstraintRecord`] is the normalized form of one type's validation
//! rules. It serializes to (and deserializes from) the JSON Schema shape, so
//! the same record can be written into a `definitions` section or copied onto
//! an OpenAPI field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Prefix used for `$ref` values emitted by the converter
pub const DEFINITIONS_REF_PREFIX: &str = "#/definitions/";

/// Prefix used for `$ref` values inside OpenAPI documents
pub const COMPONENTS_REF_PREFIX: &str = "#/components/schemas/";

/// The value kind of a canonical type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Object,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Property references
// =============================================================================

/// Type of a property inside an object-kind record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RawProperty", try_from = "RawProperty")]
pub enum PropertyRef {
    /// Reference to another canonical type
    Named(String),
    /// Anonymous type, carried as a bare kind
    Inline(Kind),
}

impl PropertyRef {
    /// Canonical name this property points at, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            PropertyRef::Named(name) => Some(name),
            PropertyRef::Inline(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawProperty {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<Kind>,
}

impl From<PropertyRef> for RawProperty {
    fn from(property: PropertyRef) -> Self {
        match property {
            PropertyRef::Named(name) => RawProperty {
                reference: Some(format!("{}{}", DEFINITIONS_REF_PREFIX, name)),
                kind: None,
            },
            PropertyRef::Inline(kind) => RawProperty {
                reference: None,
                kind: Some(kind),
            },
        }
    }
}

impl TryFrom<RawProperty> for PropertyRef {
    type Error = String;

    fn try_from(raw: RawProperty) -> Result<Self, Self::Error> {
        match (raw.reference, raw.kind) {
            (Some(reference), _) => Ok(PropertyRef::Named(ref_target(&reference).to_string())),
            (None, Some(kind)) => Ok(PropertyRef::Inline(kind)),
            (None, None) => Err("property has neither $ref nor type".to_string()),
        }
    }
}

/// Last path segment of a local `$ref`
pub fn ref_target(reference: &str) -> &str {
    reference
        .strip_prefix(DEFINITIONS_REF_PREFIX)
        .or_else(|| reference.strip_prefix(COMPONENTS_REF_PREFIX))
        .unwrap_or_else(|| reference.rsplit('/').next().unwrap_or(reference))
}

/// Ordered property list of an object-kind record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "Map<String, Value>", try_from = "Map<String, Value>")]
pub struct Properties(Vec<(String, PropertyRef)>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a property; a repeated name keeps its first position and type.
    /// Returns whether the name was new.
    pub fn insert(&mut self, name: impl Into<String>, property: PropertyRef) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.0.push((name, property));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyRef> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyRef)> {
        self.0.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Properties> for Map<String, Value> {
    fn from(properties: Properties) -> Self {
        properties
            .0
            .into_iter()
            .map(|(name, property)| {
                let raw: RawProperty = property.into();
                (name, serde_json::to_value(raw).unwrap_or(Value::Null))
            })
            .collect()
    }
}

impl TryFrom<Map<String, Value>> for Properties {
    type Error = String;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut properties = Properties::new();
        for (name, value) in map {
            let raw: RawProperty =
                serde_json::from_value(value).map_err(|e| format!("property '{}': {}", name, e))?;
            properties.insert(name, PropertyRef::try_from(raw)?);
        }
        Ok(properties)
    }
}

// =============================================================================
// Constraint record
// =============================================================================

/// Normalized validation rules for one canonical type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintRecord {
    #[serde(rename = "type")]
    pub kind: Kind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Literal values in domain order; never empty when present
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,

    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,

    /// Subset of `properties` names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ConstraintRecord {
    /// A record with only a kind
    pub fn of_kind(kind: Kind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// A string enumeration with a description, as used by the overlays
    pub fn string_enum<I, S>(values: I, description: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: Kind::String,
            enumeration: Some(values.into_iter().map(|v| Value::String(v.into())).collect()),
            description: Some(description.into()),
            ..Default::default()
        }
    }

    /// Parse a JSON Schema node. Returns `None` for nodes that are not plain
    /// constraint records (aliases, arrays, compositions).
    pub fn from_json(value: &Value) -> Option<Self> {
        let record: Self = serde_json::from_value(value.clone()).ok()?;
        record.check().ok()?;
        Some(record)
    }

    /// Render as a JSON Schema node
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Whether the record carries any constraint beyond its kind
    pub fn has_constraints(&self) -> bool {
        self.min_length.is_some()
            || self.max_length.is_some()
            || self.pattern.is_some()
            || self.enumeration.is_some()
            || self.format.is_some()
    }

    /// Check the record invariants
    pub fn check(&self) -> Result<(), String> {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(format!("minLength {} exceeds maxLength {}", min, max));
            }
        }
        if matches!(&self.enumeration, Some(values) if values.is_empty()) {
            return Err("enum must not be empty".to_string());
        }
        if let Some(missing) = self.required.iter().find(|name| !self.properties.contains(name)) {
            return Err(format!("required field '{}' is not a declared property", missing));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_record_shape() {
        let record = ConstraintRecord {
            min_length: Some(3),
            max_length: Some(5),
            ..ConstraintRecord::of_kind(Kind::String)
        };
        assert_eq!(record.to_json(), json!({"type": "string", "minLength": 3, "maxLength": 5}));
    }

    #[test]
    fn test_object_record_preserves_property_order() {
        let mut properties = Properties::new();
        properties.insert("Zeta", PropertyRef::Named("Date8".to_string()));
        properties.insert("Alpha", PropertyRef::Inline(Kind::String));
        let record = ConstraintRecord {
            properties,
            required: vec!["Zeta".to_string()],
            ..ConstraintRecord::of_kind(Kind::Object)
        };

        let value = record.to_json();
        let keys: Vec<_> = value["properties"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["Zeta", "Alpha"]);
        assert_eq!(value["properties"]["Zeta"], json!({"$ref": "#/definitions/Date8"}));
        assert_eq!(value["properties"]["Alpha"], json!({"type": "string"}));
    }

    #[test]
    fn test_from_json_accepts_openapi_refs() {
        let record = ConstraintRecord::from_json(&json!({
            "type": "object",
            "properties": {"FundID": {"$ref": "#/components/schemas/String3To5"}},
            "required": ["FundID"]
        }))
        .unwrap();
        assert_eq!(record.properties.get("FundID").and_then(|p| p.target()), Some("String3To5"));
    }

    #[test]
    fn test_from_json_rejects_non_records() {
        assert!(ConstraintRecord::from_json(&json!({"$ref": "#/definitions/OrdType"})).is_none());
        assert!(ConstraintRecord::from_json(&json!({"type": "array"})).is_none());
        assert!(ConstraintRecord::from_json(&json!({"type": "string", "enum": []})).is_none());
        assert!(ConstraintRecord::from_json(&json!({"type": "string", "minLength": 9, "maxLength": 2})).is_none());
    }

    #[test]
    fn test_required_must_be_declared() {
        let record = ConstraintRecord {
            required: vec!["Missing".to_string()],
            ..ConstraintRecord::of_kind(Kind::Object)
        };
        assert!(record.check().is_err());
    }

    #[test]
    fn test_string_enum_helper() {
        let record = ConstraintRecord::string_enum(["D", "I", "F"], "Source type");
        assert_eq!(record.enumeration.as_ref().map(Vec::len), Some(3));
        assert!(record.has_constraints());
    }
}

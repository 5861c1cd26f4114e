//! Complex type projection
//!
//! Turns a composite type definition into an object-kind [`ConstraintRecord`]:
//! child elements and attributes become properties in declaration order,
//! occurrence and use metadata decide the required set.

use serde_json::{Map, Value};
use tracing::debug;

use crate::constraint::{ConstraintRecord, Kind, Properties, PropertyRef};
use crate::names::TypeNameNormalizer;

/// Projects complex type definitions onto object-kind records
#[derive(Debug, Clone, Default)]
pub struct ComplexTypeProjector {
    names: TypeNameNormalizer,
}

impl ComplexTypeProjector {
    pub fn new(names: TypeNameNormalizer) -> Self {
        Self { names }
    }

    /// Project a complex type.
    ///
    /// Elements come before attributes. An element is required when its
    /// `minOccurs` is greater than zero (XML Schema defaults it to 1); an
    /// attribute only when its `use` is `"required"`.
    pub fn project(&self, name: &str, node: &Value) -> ConstraintRecord {
        let mut properties = Properties::new();
        let mut required: Vec<String> = Vec::new();

        let elements = node.get("elements").and_then(Value::as_array);
        for element in elements.into_iter().flatten().filter_map(Value::as_object) {
            let Some(prop_name) = declared_name(element) else {
                debug!("{}: skipping unnamed element declaration", name);
                continue;
            };
            properties.insert(prop_name, self.property_type(element));
            if min_occurs(element) > 0 {
                mark_required(&mut required, prop_name);
            }
        }

        for (attr_name, attr) in attribute_declarations(node) {
            properties.insert(attr_name, self.property_type(attr));
            if attr.get("use").and_then(Value::as_str) == Some("required") {
                mark_required(&mut required, attr_name);
            }
        }

        ConstraintRecord {
            kind: Kind::Object,
            additional_properties: Some(false),
            description: Some(format!("Complex type: {}", name)),
            properties,
            required,
            ..Default::default()
        }
    }

    /// Named type -> reference to its canonical name, anything else -> string
    fn property_type(&self, declaration: &Map<String, Value>) -> PropertyRef {
        let type_name = match declaration.get("type") {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Object(obj)) => obj.get("name").and_then(Value::as_str),
            _ => None,
        };
        match type_name.filter(|n| !n.trim().is_empty()) {
            Some(type_name) => PropertyRef::Named(self.names.normalize(type_name)),
            None => PropertyRef::Inline(Kind::String),
        }
    }
}

fn declared_name(declaration: &Map<String, Value>) -> Option<&str> {
    declaration
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
}

fn min_occurs(element: &Map<String, Value>) -> u64 {
    match element.get("minOccurs") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 1,
    }
}

fn mark_required(required: &mut Vec<String>, name: &str) {
    if !required.iter().any(|r| r == name) {
        required.push(name.to_string());
    }
}

/// Attributes as a list of named declarations or a name -> declaration map
fn attribute_declarations(node: &Value) -> Vec<(&str, &Map<String, Value>)> {
    match node.get("attributes") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|attr| declared_name(attr).map(|n| (n, attr)))
            .collect(),
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(n, attr)| attr.as_object().map(|a| (n.as_str(), a)))
            .collect(),
        _ => Vec::new(),
    }
}

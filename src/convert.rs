//! Type system conversion
//!
//! Drives the facet extractor, the name normalizer and the complex type
//! projector over a source type system tree and collects the results in a
//! [`CanonicalSchemaRegistry`]. The registry can then be rendered as a
//! draft-07 JSON Schema document.
//!
//! Processing order is simple types, complex types, then global elements.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::audit::{AuditEvent, AuditTrail};
use crate::constraint::{ConstraintRecord, Kind, DEFINITIONS_REF_PREFIX};
use crate::error::{Result, SchemaError};
use crate::facets::{infer_kind, ExtractorOptions, FacetExtractor};
use crate::names::{self, TypeNameNormalizer};
use crate::project::ComplexTypeProjector;
use crate::registry::CanonicalSchemaRegistry;

pub const JSON_SCHEMA_DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

fn default_schema_id() -> String {
    "https://fundserv.com/tfs/xml-aligned-schema".to_string()
}

fn default_title() -> String {
    "TFS Trading Schema - XML Aligned".to_string()
}

fn default_description() -> String {
    "JSON Schema automatically generated from TFS XML Schema for comprehensive validation".to_string()
}

fn default_root_elements() -> Vec<String> {
    vec!["OrdSet".to_string()]
}

fn default_true() -> bool {
    true
}

/// Conversion settings; also the `[convert]` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterOptions {
    #[serde(default = "default_schema_id")]
    pub schema_id: String,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_description")]
    pub description: String,

    /// Definitions exposed as top-level properties when present
    #[serde(default = "default_root_elements")]
    pub root_elements: Vec<String>,

    /// Recover pattern values from raw pattern markup
    #[serde(default = "default_true")]
    pub raw_pattern_recovery: bool,

    /// Extra irregular name conversions (source name -> canonical name)
    #[serde(default)]
    pub name_overrides: BTreeMap<String, String>,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            schema_id: default_schema_id(),
            title: default_title(),
            description: default_description(),
            root_elements: default_root_elements(),
            raw_pattern_recovery: true,
            name_overrides: BTreeMap::new(),
        }
    }
}

/// How a source type is converted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Simple,
    Complex,
}

fn category(name: &str, node: &Value) -> Result<Category> {
    match node.get("category").and_then(Value::as_str) {
        Some("simple") => Ok(Category::Simple),
        Some("complex") => Ok(Category::Complex),
        Some(other) => Err(SchemaError::InvalidTypeSystem(format!(
            "type '{}' has unknown category '{}'",
            name, other
        ))),
        None if node.get("elements").is_some() || node.get("attributes").is_some() => {
            Ok(Category::Complex)
        }
        None => Ok(Category::Simple),
    }
}

// =============================================================================
// Converter
// =============================================================================

/// Converts a source type system tree into canonical records
pub struct SchemaConverter {
    options: ConverterOptions,
    names: TypeNameNormalizer,
    extractor: FacetExtractor,
    projector: ComplexTypeProjector,
}

impl Default for SchemaConverter {
    fn default() -> Self {
        Self::new(ConverterOptions::default())
    }
}

impl SchemaConverter {
    pub fn new(options: ConverterOptions) -> Self {
        let names = TypeNameNormalizer::new().with_conversions(options.name_overrides.clone());
        let extractor = FacetExtractor::new(&ExtractorOptions {
            raw_pattern_recovery: options.raw_pattern_recovery,
        });
        Self {
            projector: ComplexTypeProjector::new(names.clone()),
            names,
            extractor,
            options,
        }
    }

    /// Replace the facet extractor, e.g. with a custom strategy chain
    pub fn with_extractor(mut self, extractor: FacetExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// Convert a type system tree (`types` plus optional `elements`)
    pub fn convert(&self, type_system: &Value) -> Result<Conversion> {
        let types = match type_system.get("types") {
            Some(Value::Object(types)) => types,
            Some(_) => {
                return Err(SchemaError::InvalidTypeSystem("'types' must be a mapping".to_string()))
            }
            None => {
                return Err(SchemaError::InvalidTypeSystem("missing 'types' mapping".to_string()))
            }
        };
        let elements = match type_system.get("elements") {
            None | Some(Value::Null) => None,
            Some(Value::Object(elements)) => Some(elements),
            Some(_) => {
                return Err(SchemaError::InvalidTypeSystem(
                    "'elements' must be a mapping".to_string(),
                ))
            }
        };

        let mut run = ConversionRun::default();

        let mut categorized = Vec::with_capacity(types.len());
        for (name, node) in types {
            if !node.is_object() {
                return Err(SchemaError::InvalidTypeSystem(format!(
                    "type '{}' must be a mapping",
                    name
                )));
            }
            categorized.push((name, node, category(name, node)?));
        }

        let mut simple = 0;
        for (name, node, _) in categorized.iter().filter(|(_, _, c)| *c == Category::Simple) {
            let canonical = self.names.normalize(name);
            let record = self.extractor.extract(&canonical, node, &mut run.audit);
            run.register(name, canonical, record);
            simple += 1;
        }
        info!("Processed {} simple types", simple);

        let mut complex = 0;
        for (name, node, _) in categorized.iter().filter(|(_, _, c)| *c == Category::Complex) {
            let canonical = self.names.normalize(name);
            let record = self.projector.project(&canonical, node);
            debug!("Complex type {} -> {} ({} properties)", name, canonical, record.properties.len());
            run.register(name, canonical, record);
            complex += 1;
        }
        info!("Processed {} complex types", complex);

        let mut global = 0;
        for (name, element) in elements.into_iter().flatten() {
            if self.convert_element(name, element, &mut run)? {
                global += 1;
            }
        }
        info!("Processed {} global elements", global);

        Ok(Conversion {
            registry: run.registry,
            aliases: run.aliases,
            audit: run.audit,
            options: self.options.clone(),
        })
    }

    /// Inline types are converted under the element's name; named types
    /// become an alias. Returns whether the element produced a definition.
    fn convert_element(&self, name: &str, element: &Value, run: &mut ConversionRun) -> Result<bool> {
        let canonical = self.names.normalize(name);

        match element.get("type") {
            Some(Value::String(type_name)) => Ok(self.convert_named(name, canonical, type_name, run)),
            Some(inline) if inline.is_object() => match inline.get("name").and_then(Value::as_str) {
                Some(type_name) if !type_name.is_empty() => {
                    Ok(self.convert_named(name, canonical, type_name, run))
                }
                _ => {
                    let record = match category(name, inline)? {
                        Category::Simple => self.extractor.extract(&canonical, inline, &mut run.audit),
                        Category::Complex => self.projector.project(&canonical, inline),
                    };
                    run.register(name, canonical, record);
                    Ok(true)
                }
            },
            None | Some(Value::Null) => {
                debug!("Element {} has no type, skipping", name);
                Ok(false)
            }
            Some(_) => Err(SchemaError::InvalidTypeSystem(format!(
                "element '{}' has a malformed type",
                name
            ))),
        }
    }

    /// An element typed by name. Converted types are aliased; built-in and
    /// unknown types are converted as simple types under the element's name,
    /// unless a type definition already owns that name.
    fn convert_named(&self, name: &str, canonical: String, type_name: &str, run: &mut ConversionRun) -> bool {
        let target = self.names.normalize(type_name);
        let builtin = names::is_builtin(type_name);
        if !builtin && run.registry.contains(&target) {
            return run.alias(canonical, target);
        }

        if run.registry.contains(&canonical) {
            debug!("Element {} ({}) keeps the existing {} definition", name, type_name, canonical);
            return false;
        }

        let base = json!({ "base": type_name });
        let record = if builtin {
            ConstraintRecord::of_kind(infer_kind(&base))
        } else {
            warn!("Element {} references unknown type {}, converting as a simple type", name, type_name);
            self.extractor.extract(&canonical, &base, &mut run.audit)
        };
        run.register(name, canonical, record);
        true
    }
}

/// Mutable state of one conversion
#[derive(Default)]
struct ConversionRun {
    registry: CanonicalSchemaRegistry,
    aliases: Vec<(String, String)>,
    audit: AuditTrail,
}

impl ConversionRun {
    fn register(&mut self, source: &str, canonical: String, record: ConstraintRecord) {
        debug!("Type {} -> {}", source, canonical);
        self.audit.push(AuditEvent::TypeConverted {
            source: source.to_string(),
            canonical: canonical.clone(),
            kind: record.kind,
        });
        self.register_quietly(canonical, record);
    }

    fn register_quietly(&mut self, canonical: String, record: ConstraintRecord) {
        let seen = self.registry.collisions().len();
        self.registry.register(canonical, record);
        for collision in &self.registry.collisions()[seen..] {
            self.audit.push(AuditEvent::CaseCollision {
                name: collision.name.clone(),
                existing: collision.existing.clone(),
            });
        }
    }

    /// Alias an element to a registered target
    fn alias(&mut self, name: String, target: String) -> bool {
        if name == target {
            debug!("Skipping self-referencing element {}", name);
            return false;
        }

        if let Some(record) = self.registry.get(&target).cloned() {
            self.register_quietly(name.clone(), record);
        }
        debug!("Element {} -> {}", name, target);
        self.audit.push(AuditEvent::AliasRegistered {
            name: name.clone(),
            target: target.clone(),
        });
        self.aliases.retain(|(existing, _)| *existing != name);
        self.aliases.push((name, target));
        true
    }
}

// =============================================================================
// Conversion result
// =============================================================================

/// Result of one conversion run
#[derive(Debug, Clone)]
pub struct Conversion {
    pub registry: CanonicalSchemaRegistry,
    /// Element aliases: (name, target canonical name)
    pub aliases: Vec<(String, String)>,
    pub audit: AuditTrail,
    options: ConverterOptions,
}

impl Conversion {
    /// Render the draft-07 JSON Schema document
    pub fn to_json_schema(&self) -> Value {
        let mut definitions = self.registry.to_definitions();
        for (name, target) in &self.aliases {
            definitions.insert(
                name.clone(),
                json!({"$ref": format!("{}{}", DEFINITIONS_REF_PREFIX, target)}),
            );
        }

        let mut document = json!({
            "$schema": JSON_SCHEMA_DRAFT_07,
            "$id": self.options.schema_id,
            "title": self.options.title,
            "description": self.options.description,
            "type": "object",
            "additionalProperties": false,
        });

        let properties: Map<String, Value> = self
            .options
            .root_elements
            .iter()
            .filter(|root| definitions.contains_key(root.as_str()))
            .map(|root| {
                (root.clone(), json!({"$ref": format!("{}{}", DEFINITIONS_REF_PREFIX, root)}))
            })
            .collect();

        if let Some(map) = document.as_object_mut() {
            map.insert("definitions".to_string(), Value::Object(definitions));
            if !properties.is_empty() {
                map.insert("properties".to_string(), Value::Object(properties));
            }
        }
        document
    }

    /// Counts over the rendered definitions
    pub fn summary(&self) -> ConversionSummary {
        ConversionSummary::of(&self.to_json_schema())
    }
}

/// Definition counts of a converted document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub simple: usize,
    pub complex: usize,
    pub references: usize,
    pub enumerations: usize,
    pub patterns: usize,
    pub total: usize,
    pub root_properties: usize,
}

impl ConversionSummary {
    /// Count definitions of a JSON Schema document. Simple means string kind.
    pub fn of(document: &Value) -> Self {
        let mut summary = Self {
            root_properties: document
                .get("properties")
                .and_then(Value::as_object)
                .map_or(0, Map::len),
            ..Default::default()
        };

        let definitions = document.get("definitions").and_then(Value::as_object);
        for definition in definitions.into_iter().flat_map(Map::values) {
            summary.total += 1;
            match definition.get("type").and_then(Value::as_str) {
                Some(kind) if kind == Kind::String.as_str() => summary.simple += 1,
                Some(kind) if kind == Kind::Object.as_str() => summary.complex += 1,
                _ => {}
            }
            if definition.get("$ref").is_some() {
                summary.references += 1;
            }
            if definition.get("enum").is_some() {
                summary.enumerations += 1;
            }
            if definition.get("pattern").is_some() {
                summary.patterns += 1;
            }
        }
        summary
    }
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simple types: {}", self.simple)?;
        writeln!(f, "Complex types: {}", self.complex)?;
        writeln!(f, "Reference types: {}", self.references)?;
        writeln!(f, "Enumeration types: {}", self.enumerations)?;
        writeln!(f, "Pattern-constrained types: {}", self.patterns)?;
        writeln!(f, "Total definitions: {}", self.total)?;
        write!(f, "Root properties: {}", self.root_properties)
    }
}

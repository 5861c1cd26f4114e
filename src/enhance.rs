//! Property enhancement
//!
//! Walks `components.schemas` and merges canonical constraints into the
//! document by field name. Object schemas have each property matched against
//! the field mapping table; top-level string schemas are matched by their own
//! name. Human-authored metadata (`description`, `example`, `externalDocs`)
//! always survives a merge.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::audit::{AuditEvent, AuditTrail};
use crate::document::{
    FieldNode, FILL_ABSENT_KEYS, PROPERTY_CONSTRAINT_KEYS, TOP_LEVEL_CONSTRAINT_KEYS,
};
use crate::error::{Result, SchemaError};
use crate::mapping::FieldMappingTable;
use crate::registry::CanonicalSchemaRegistry;

/// Merges registry constraints into document schemas
#[derive(Debug, Clone, Default)]
pub struct PropertyEnhancer {
    table: FieldMappingTable,
    strict: bool,
}

impl PropertyEnhancer {
    pub fn new(table: FieldMappingTable) -> Self {
        Self { table, strict: false }
    }

    /// Disallow additional properties on object schemas that don't say otherwise
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn table(&self) -> &FieldMappingTable {
        &self.table
    }

    /// Enhance every schema in place. Returns how many schemas changed.
    ///
    /// The registry is only read. A schema, `properties` section or property
    /// definition that is not a mapping aborts the run.
    pub fn enhance(
        &self,
        schemas: &mut Map<String, Value>,
        registry: &CanonicalSchemaRegistry,
        audit: &mut AuditTrail,
    ) -> Result<usize> {
        let mut changed = 0;

        for (name, schema) in schemas.iter_mut() {
            let schema = schema
                .as_object_mut()
                .ok_or_else(|| SchemaError::structure(name, "schema definition must be a mapping"))?;

            let enhanced = match schema.get("type").and_then(Value::as_str) {
                Some("object") => self.enhance_object(name, schema, registry, audit)?,
                Some("string") => self.enhance_top_level(name, schema, registry, audit),
                _ => false,
            };

            if enhanced {
                debug!("Enhanced schema {}", name);
                audit.push(AuditEvent::SchemaEnhanced { schema: name.clone() });
                changed += 1;
            }
        }

        info!("Enhanced {} existing schemas", changed);
        Ok(changed)
    }

    fn enhance_object(
        &self,
        name: &str,
        schema: &mut Map<String, Value>,
        registry: &CanonicalSchemaRegistry,
        audit: &mut AuditTrail,
    ) -> Result<bool> {
        let mut changed = false;

        if self.strict && !schema.contains_key("additionalProperties") {
            schema.insert("additionalProperties".to_string(), Value::Bool(false));
            audit.push(AuditEvent::StrictnessApplied { schema: name.to_string() });
            changed = true;
        }

        let properties = match schema.get_mut("properties") {
            None | Some(Value::Null) => return Ok(changed),
            Some(Value::Object(properties)) => properties,
            Some(_) => return Err(SchemaError::structure(name, "'properties' must be a mapping")),
        };

        for (prop_name, prop) in properties.iter_mut() {
            let path = format!("{}.{}", name, prop_name);
            let prop = prop
                .as_object_mut()
                .ok_or_else(|| SchemaError::structure(&path, "property definition must be a mapping"))?;

            let Some(hit) = self.table.resolve(prop_name, registry) else {
                continue;
            };

            let mut field = FieldNode::new(prop);
            let snapshot = field.snapshot_metadata();
            let copied = field.copy_from(hit.record, &PROPERTY_CONSTRAINT_KEYS);
            restore(&mut field, snapshot, &path, audit);

            if copied {
                debug!("Enhanced {} with {} validation (preserving docs)", path, hit.key);
                audit.push(AuditEvent::PropertyEnhanced {
                    schema: name.to_string(),
                    property: prop_name.clone(),
                    canonical: hit.key.to_string(),
                    rule: hit.rule.label().to_string(),
                });
                changed = true;
            }
        }

        Ok(changed)
    }

    /// A rule match copies constraints over; otherwise a case-insensitive
    /// name match only fills what is missing.
    fn enhance_top_level(
        &self,
        name: &str,
        schema: &mut Map<String, Value>,
        registry: &CanonicalSchemaRegistry,
        audit: &mut AuditTrail,
    ) -> bool {
        let mut field = FieldNode::new(schema);

        if let Some(hit) = self.table.resolve(name, registry) {
            let snapshot = field.snapshot_metadata();
            let copied = field.copy_from(hit.record, &TOP_LEVEL_CONSTRAINT_KEYS);
            restore(&mut field, snapshot, name, audit);
            if copied {
                debug!("Enhanced top-level {} with {} validation (preserving docs)", name, hit.key);
                audit.push(AuditEvent::TopLevelEnhanced {
                    schema: name.to_string(),
                    canonical: hit.key.to_string(),
                    rule: Some(hit.rule.label().to_string()),
                });
            }
            return copied;
        }

        let Some((key, record)) = registry.resolve(name) else {
            return false;
        };
        let filled = field.fill_from(record, &FILL_ABSENT_KEYS);
        if filled {
            debug!("Filled top-level {} from {}", name, key);
            audit.push(AuditEvent::TopLevelEnhanced {
                schema: name.to_string(),
                canonical: key.to_string(),
                rule: None,
            });
        }
        filled
    }
}

fn restore(
    field: &mut FieldNode<'_>,
    snapshot: crate::document::MetadataSnapshot,
    path: &str,
    audit: &mut AuditTrail,
) {
    for key in field.restore_metadata(snapshot) {
        debug!("Restored {} on {}", key, path);
        audit.push(AuditEvent::MetadataRestored {
            schema: path.to_string(),
            key: key.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintRecord, Kind};
    use serde_json::json;

    fn registry() -> CanonicalSchemaRegistry {
        let mut registry = CanonicalSchemaRegistry::new();
        registry.register(
            "String15",
            ConstraintRecord {
                max_length: Some(15),
                description: Some("Up to 15 characters".to_string()),
                ..ConstraintRecord::of_kind(Kind::String)
            },
        );
        registry.register(
            "Date8",
            ConstraintRecord {
                pattern: Some("^\\d{8}$".to_string()),
                ..ConstraintRecord::of_kind(Kind::String)
            },
        );
        registry.register("SupConfirm", ConstraintRecord::string_enum(["Y", "N"], "Supplier confirmation"));
        registry
    }

    fn enhance(schemas: &mut Value, strict: bool) -> Result<(usize, AuditTrail)> {
        let mut audit = AuditTrail::new();
        let enhancer = PropertyEnhancer::default().with_strict(strict);
        let changed = enhancer.enhance(schemas.as_object_mut().unwrap(), &registry(), &mut audit)?;
        Ok((changed, audit))
    }

    #[test]
    fn test_property_gains_constraints_and_keeps_description() {
        let mut schemas = json!({
            "Order": {"type": "object", "properties": {
                "FundAcctID": {"type": "string", "description": "Fund account"},
                "Comment": {"type": "string"}
            }}
        });
        let (changed, audit) = enhance(&mut schemas, false).unwrap();
        assert_eq!(changed, 1);
        assert_eq!(
            schemas["Order"]["properties"]["FundAcctID"],
            json!({"type": "string", "description": "Fund account", "maxLength": 15})
        );
        assert_eq!(schemas["Order"]["properties"]["Comment"], json!({"type": "string"}));
        assert_eq!(audit.count(|e| matches!(e, AuditEvent::PropertyEnhanced { .. })), 1);
    }

    #[test]
    fn test_strict_mode() {
        let mut schemas = json!({
            "Open": {"type": "object"},
            "Explicit": {"type": "object", "additionalProperties": true}
        });
        let (changed, _) = enhance(&mut schemas, true).unwrap();
        assert_eq!(changed, 1);
        assert_eq!(schemas["Open"]["additionalProperties"], json!(false));
        assert_eq!(schemas["Explicit"]["additionalProperties"], json!(true));
    }

    #[test]
    fn test_top_level_rule_keeps_type_and_metadata() {
        let mut schemas = json!({"TradeDate": {"type": "string", "example": "20240101", "description": "Trade date"}});
        enhance(&mut schemas, false).unwrap();
        assert_eq!(
            schemas["TradeDate"],
            json!({"type": "string", "example": "20240101", "description": "Trade date", "pattern": "^\\d{8}$"})
        );
    }

    #[test]
    fn test_top_level_name_match_fills_absent_only() {
        let mut schemas = json!({
            "supconfirm": {"type": "string"},
            "SUPCONFIRM": {"type": "string", "enum": ["X"], "description": "Keep me"}
        });
        let (changed, audit) = enhance(&mut schemas, false).unwrap();
        assert_eq!(changed, 1);
        assert_eq!(
            schemas["supconfirm"],
            json!({"type": "string", "enum": ["Y", "N"], "description": "Supplier confirmation"})
        );
        assert_eq!(schemas["SUPCONFIRM"], json!({"type": "string", "enum": ["X"], "description": "Keep me"}));
        assert!(audit.iter().any(|e| matches!(e, AuditEvent::TopLevelEnhanced { rule: None, .. })));
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let mut schemas = json!({
            "Order": {"type": "object", "properties": {"SrcID": {"type": "string"}}},
            "TradeDate": {"type": "string"}
        });
        assert_eq!(enhance(&mut schemas, true).unwrap().0, 2);
        let snapshot = schemas.clone();
        assert_eq!(enhance(&mut schemas, true).unwrap().0, 0);
        assert_eq!(schemas, snapshot);
    }

    #[test]
    fn test_structural_errors_name_the_schema() {
        let err = enhance(&mut json!({"Broken": "string"}), false).unwrap_err();
        assert!(matches!(err, SchemaError::Structure { ref schema, .. } if schema == "Broken"));

        let err = enhance(&mut json!({"Order": {"type": "object", "properties": []}}), false).unwrap_err();
        assert!(matches!(err, SchemaError::Structure { ref schema, .. } if schema == "Order"));

        let err = enhance(
            &mut json!({"Order": {"type": "object", "properties": {"SrcID": 3}}}),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::Structure { ref schema, .. } if schema == "Order.SrcID"));
    }
}

//! Overlays
//!
//! Static, hand-authored schema sets injected into a document regardless of
//! the source type system. Each overlay decides its own conflict policy:
//! enumerations and base types overwrite, error schemas only fill gaps.

use serde_json::Value;
use tracing::{debug, info};

use crate::audit::{AuditEvent, AuditTrail};
use crate::catalog;
use crate::document::ApiDocument;
use crate::error::{Result, SchemaError};
use crate::mapping::FieldMappingTable;
use crate::registry::CanonicalSchemaRegistry;

/// Something that injects schemas or metadata into a document
pub trait Overlay {
    fn name(&self) -> &'static str;

    fn apply(&self, document: &mut ApiDocument<'_>, audit: &mut AuditTrail) -> Result<()>;
}

// =============================================================================
// Base types
// =============================================================================

/// Copies registry records into the document: every canonical type the
/// mapping table references, plus a configurable list of extras.
pub struct BaseTypeOverlay<'r> {
    registry: &'r CanonicalSchemaRegistry,
    names: Vec<String>,
}

impl<'r> BaseTypeOverlay<'r> {
    pub fn new<S: AsRef<str>>(
        registry: &'r CanonicalSchemaRegistry,
        table: &FieldMappingTable,
        extra: &[S],
    ) -> Self {
        let mut candidates: Vec<&str> = table.canonical_names();
        candidates.extend(extra.iter().map(|s| s.as_ref()));

        let mut names: Vec<String> = Vec::new();
        for name in candidates {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        Self { registry, names }
    }

    /// Type names this overlay looks for, in order
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Overlay for BaseTypeOverlay<'_> {
    fn name(&self) -> &'static str {
        "base_types"
    }

    fn apply(&self, document: &mut ApiDocument<'_>, audit: &mut AuditTrail) -> Result<()> {
        let schemas = document.schemas_mut()?;
        let mut added = 0;
        for name in &self.names {
            let Some(record) = self.registry.get(name) else {
                debug!("Base type {} not in registry, skipping", name);
                continue;
            };
            schemas.insert(name.clone(), record.to_json());
            audit.push(AuditEvent::BaseTypeAdded { name: name.clone() });
            added += 1;
        }
        info!("Added {} base validation types", added);
        Ok(())
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// Code-list enumerations; always overwrites
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumOverlay;

impl EnumOverlay {
    /// Register the catalog into the registry, overwriting generated entries
    pub fn register(&self, registry: &mut CanonicalSchemaRegistry) {
        for (name, record) in catalog::enumerations() {
            registry.register(name, record);
        }
    }
}

impl Overlay for EnumOverlay {
    fn name(&self) -> &'static str {
        "enumerations"
    }

    fn apply(&self, document: &mut ApiDocument<'_>, audit: &mut AuditTrail) -> Result<()> {
        let schemas = document.schemas_mut()?;
        let catalog = catalog::enumerations();
        for (name, record) in &catalog {
            let values = record.enumeration.as_ref().map_or(0, Vec::len);
            debug!("Added enum {} with {} values", name, values);
            schemas.insert(name.to_string(), record.to_json());
            audit.push(AuditEvent::EnumAdded {
                name: name.to_string(),
                values,
            });
        }
        info!("Added {} enumeration types", catalog.len());
        Ok(())
    }
}

// =============================================================================
// Error schemas
// =============================================================================

/// Error-handling schemas; never replaces an existing definition
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorSchemaOverlay;

impl ErrorSchemaOverlay {
    /// Register the catalog without replacing existing entries
    pub fn register(&self, registry: &mut CanonicalSchemaRegistry) {
        for (name, record) in catalog::error_schemas() {
            registry.register_if_absent(name, record);
        }
    }
}

impl Overlay for ErrorSchemaOverlay {
    fn name(&self) -> &'static str {
        "error_schemas"
    }

    fn apply(&self, document: &mut ApiDocument<'_>, audit: &mut AuditTrail) -> Result<()> {
        let schemas = document.schemas_mut()?;
        for (name, record) in catalog::error_schemas() {
            if schemas.contains_key(name) {
                debug!("Keeping existing error schema {}", name);
                audit.push(AuditEvent::ErrorSchemaKept { name: name.to_string() });
            } else {
                schemas.insert(name.to_string(), record.to_json());
                audit.push(AuditEvent::ErrorSchemaAdded { name: name.to_string() });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Transaction types
// =============================================================================

/// Adds one `TrxnTyp<Keyword>` schema for the first keyword found in the
/// document title (case-insensitive). Keyword order is the tie-break.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionTypeOverlay;

impl TransactionTypeOverlay {
    /// First keyword contained in `title`
    pub fn keyword_for(title: &str) -> Option<(&'static str, &'static str)> {
        let title = title.to_lowercase();
        catalog::TRANSACTION_TYPES
            .iter()
            .find(|(keyword, _)| title.contains(&keyword.to_lowercase()))
            .copied()
    }
}

impl Overlay for TransactionTypeOverlay {
    fn name(&self) -> &'static str {
        "transaction_types"
    }

    fn apply(&self, document: &mut ApiDocument<'_>, audit: &mut AuditTrail) -> Result<()> {
        let title = document.title().unwrap_or_default().to_string();
        let Some((keyword, code)) = Self::keyword_for(&title) else {
            debug!("No transaction type keyword in title '{}'", title);
            return Ok(());
        };

        let (name, record) = catalog::transaction_type(keyword, code);
        info!("Added transaction type {} for '{}'", name, title);
        document.schemas_mut()?.insert(name.clone(), record.to_json());
        audit.push(AuditEvent::TransactionTypeAdded {
            name,
            keyword: keyword.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// Documentation
// =============================================================================

/// Notes the enhancement in `info.description` and stamps `x-schema-version`
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentationOverlay;

impl Overlay for DocumentationOverlay {
    fn name(&self) -> &'static str {
        "documentation"
    }

    fn apply(&self, document: &mut ApiDocument<'_>, audit: &mut AuditTrail) -> Result<()> {
        let info = document.info_mut()?;
        let mut changed = false;

        let description = match info.get("description") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(SchemaError::InvalidDocument(
                    "'info.description' must be a string".to_string(),
                ))
            }
        };
        if !description.contains(catalog::ENHANCEMENT_NOTE) {
            info.insert(
                "description".to_string(),
                Value::String(description + catalog::ENHANCEMENT_NOTE),
            );
            changed = true;
        }

        if !info.contains_key("x-schema-version") {
            info.insert(
                "x-schema-version".to_string(),
                Value::String(catalog::SCHEMA_VERSION.to_string()),
            );
            changed = true;
        }

        if changed {
            audit.push(AuditEvent::DocumentationAdded);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintRecord, Kind};
    use serde_json::json;

    fn apply(overlay: &dyn Overlay, root: &mut Value) -> AuditTrail {
        let mut audit = AuditTrail::new();
        let mut document = ApiDocument::new(root).unwrap();
        overlay.apply(&mut document, &mut audit).unwrap();
        audit
    }

    #[test]
    fn test_enum_overlay_overwrites() {
        let mut root = json!({"components": {"schemas": {"SrcType": {"type": "string", "enum": ["X"]}}}});
        let audit = apply(&EnumOverlay, &mut root);
        assert_eq!(root["components"]["schemas"]["SrcType"]["enum"], json!(["D", "I", "F"]));
        assert_eq!(root["components"]["schemas"].as_object().unwrap().len(), 7);
        assert_eq!(audit.len(), 7);
    }

    #[test]
    fn test_error_overlay_is_insert_if_absent() {
        let existing = json!({"type": "string", "pattern": "^E\\d+$"});
        let mut root = json!({"components": {"schemas": {"ErrorCode": existing.clone()}}});
        let audit = apply(&ErrorSchemaOverlay, &mut root);
        assert_eq!(root["components"]["schemas"]["ErrorCode"], existing);
        assert_eq!(root["components"]["schemas"]["CorrlatnID"]["maxLength"], json!(48));
        assert_eq!(
            audit.events(),
            &[
                AuditEvent::ErrorSchemaKept { name: "ErrorCode".to_string() },
                AuditEvent::ErrorSchemaAdded { name: "CorrlatnID".to_string() },
            ]
        );
    }

    #[test]
    fn test_registration_policies() {
        let mut registry = CanonicalSchemaRegistry::new();
        registry.register("SrcType", ConstraintRecord::of_kind(Kind::String));
        registry.register("CorrlatnID", ConstraintRecord::of_kind(Kind::String));
        EnumOverlay.register(&mut registry);
        ErrorSchemaOverlay.register(&mut registry);
        assert!(registry.get("SrcType").unwrap().enumeration.is_some());
        assert_eq!(registry.get("CorrlatnID"), Some(&ConstraintRecord::of_kind(Kind::String)));
        assert!(registry.get("ErrorCode").is_some());
    }

    #[test]
    fn test_transaction_type_first_keyword_only() {
        let mut root = json!({"info": {"title": "Buy Order API"}});
        apply(&TransactionTypeOverlay, &mut root);
        let schemas = root["components"]["schemas"].as_object().unwrap();
        assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["TrxnTypBuy"]);
        assert_eq!(schemas["TrxnTypBuy"]["enum"], json!(["1"]));

        // "Switch" precedes "Transfer" in keyword order
        assert_eq!(TransactionTypeOverlay::keyword_for("transfer and switch"), Some(("Switch", "8")));
        assert_eq!(TransactionTypeOverlay::keyword_for("ict batch"), Some(("ICT", "6")));
        assert_eq!(TransactionTypeOverlay::keyword_for("Fund Prices"), None);
    }

    #[test]
    fn test_no_title_adds_nothing() {
        let mut root = json!({"components": {"schemas": {}}});
        let audit = apply(&TransactionTypeOverlay, &mut root);
        assert!(audit.is_empty());
        assert_eq!(root["components"]["schemas"], json!({}));
    }

    #[test]
    fn test_base_type_overlay_copies_known_records() {
        let mut registry = CanonicalSchemaRegistry::new();
        registry.register(
            "Date8",
            ConstraintRecord {
                pattern: Some("^\\d{8}$".to_string()),
                ..ConstraintRecord::of_kind(Kind::String)
            },
        );
        registry.register("Yes1", ConstraintRecord::string_enum(["Y"], "Yes"));
        registry.register("Unused", ConstraintRecord::of_kind(Kind::String));

        let overlay = BaseTypeOverlay::new(&registry, &FieldMappingTable::default(), catalog::EXTRA_BASE_TYPES);
        assert_eq!(overlay.names().len(), 20);

        let mut root = json!({});
        let audit = apply(&overlay, &mut root);
        let schemas = root["components"]["schemas"].as_object().unwrap();
        assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["Date8", "Yes1"]);
        assert_eq!(audit.len(), 2);
    }

    #[test]
    fn test_documentation_overlay_applies_once() {
        let mut root = json!({"info": {"title": "Sell API", "description": "Orders."}});
        assert_eq!(apply(&DocumentationOverlay, &mut root).len(), 1);
        assert_eq!(apply(&DocumentationOverlay, &mut root).len(), 0);
        let description = root["info"]["description"].as_str().unwrap();
        assert_eq!(description.matches("XML schema-based validation").count(), 1);
        assert!(description.starts_with("Orders."));
        assert_eq!(root["info"]["x-schema-version"], json!("XML-aligned-v1.0"));
    }
}

//! Enhancement pipeline
//!
//! Runs the overlays and the property enhancer over one API document in a
//! fixed order:
//!
//! 1. ensure `components.schemas` exists
//! 2. register the enumeration (overwrite) and error (insert-if-absent)
//!    catalogs into a run-local copy of the registry
//! 3. base types, then enumerations, into the document
//! 4. property enhancement
//! 5. transaction type, error schemas, documentation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::audit::{AuditEvent, AuditTrail};
use crate::catalog;
use crate::document::ApiDocument;
use crate::enhance::PropertyEnhancer;
use crate::error::Result;
use crate::mapping::FieldMappingTable;
use crate::overlay::{
    BaseTypeOverlay, DocumentationOverlay, EnumOverlay, ErrorSchemaOverlay, Overlay,
    TransactionTypeOverlay,
};
use crate::registry::CanonicalSchemaRegistry;

fn default_extra_base_types() -> Vec<String> {
    catalog::EXTRA_BASE_TYPES.iter().map(|s| s.to_string()).collect()
}

/// Enhancement settings; also the `[enhance]` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancerOptions {
    /// Set `additionalProperties: false` on open object schemas
    #[serde(default)]
    pub strict: bool,

    /// Base types copied besides those the field mappings reference
    #[serde(default = "default_extra_base_types")]
    pub extra_base_types: Vec<String>,

    /// Ordered field name rules
    #[serde(default)]
    pub field_mappings: FieldMappingTable,
}

impl Default for EnhancerOptions {
    fn default() -> Self {
        Self {
            strict: false,
            extra_base_types: default_extra_base_types(),
            field_mappings: FieldMappingTable::default(),
        }
    }
}

/// What one enhancement run did
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnhancementReport {
    /// Existing schemas changed by property enhancement
    pub schemas_enhanced: usize,
    pub audit: AuditTrail,
}

impl EnhancementReport {
    pub fn base_types_added(&self) -> usize {
        self.audit.count(|e| matches!(e, AuditEvent::BaseTypeAdded { .. }))
    }

    pub fn enums_added(&self) -> usize {
        self.audit.count(|e| matches!(e, AuditEvent::EnumAdded { .. }))
    }

    pub fn properties_enhanced(&self) -> usize {
        self.audit.count(|e| matches!(e, AuditEvent::PropertyEnhanced { .. }))
    }

    /// Name of the transaction type schema added, if any
    pub fn transaction_type(&self) -> Option<&str> {
        self.audit.iter().find_map(|e| match e {
            AuditEvent::TransactionTypeAdded { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn error_schemas_added(&self) -> usize {
        self.audit.count(|e| matches!(e, AuditEvent::ErrorSchemaAdded { .. }))
    }
}

/// Applies overlays and property enhancement to API documents
#[derive(Debug, Clone, Default)]
pub struct Enhancer {
    properties: PropertyEnhancer,
    extra_base_types: Vec<String>,
}

impl Enhancer {
    pub fn new(options: EnhancerOptions) -> Self {
        Self {
            properties: PropertyEnhancer::new(options.field_mappings).with_strict(options.strict),
            extra_base_types: options.extra_base_types,
        }
    }

    /// The registry as the document will see it: the converted types plus
    /// the enumeration and error catalogs
    pub fn prepare_registry(&self, registry: &CanonicalSchemaRegistry) -> CanonicalSchemaRegistry {
        let mut registry = registry.clone();
        EnumOverlay.register(&mut registry);
        ErrorSchemaOverlay.register(&mut registry);
        registry
    }

    /// Enhance a document in place. The caller's registry is left untouched.
    pub fn run(&self, document: &mut Value, registry: &CanonicalSchemaRegistry) -> Result<EnhancementReport> {
        let mut document = ApiDocument::new(document)?;
        document.schemas_mut()?;

        let registry = self.prepare_registry(registry);
        let mut audit = AuditTrail::new();

        let base_types = BaseTypeOverlay::new(&registry, self.properties.table(), &self.extra_base_types);
        base_types.apply(&mut document, &mut audit)?;
        EnumOverlay.apply(&mut document, &mut audit)?;

        let schemas_enhanced = self
            .properties
            .enhance(document.schemas_mut()?, &registry, &mut audit)?;

        let trailing: [&dyn Overlay; 3] = [&TransactionTypeOverlay, &ErrorSchemaOverlay, &DocumentationOverlay];
        for overlay in trailing {
            overlay.apply(&mut document, &mut audit)?;
        }

        info!(
            "Enhanced {} with {} audit events",
            document.title().unwrap_or("document"),
            audit.len()
        );
        Ok(EnhancementReport { schemas_enhanced, audit })
    }
}

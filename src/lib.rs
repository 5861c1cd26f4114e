//! Schema Enhancer
//!
//! Normalizes an XML-Schema-style type system into canonical constraint
//! records, then merges those constraints into the field definitions of
//! OpenAPI documents by name.
//!
//! ## Features
//!
//! - **Facet Extraction**: A chain of access strategies for lengths, patterns and enumerations
//! - **Name Canonicalization**: Irregular-name table with a PascalCase fallback
//! - **Property Enhancement**: Ordered field-name rules, metadata always preserved
//! - **Overlays**: Enumeration, error, transaction type and base-type catalogs
//! - **Audit Trail**: Every run returns what it changed or skipped
//!
//! ## Architecture
//!
//! ```text
//! type system tree ──▶ SchemaConverter ──▶ CanonicalSchemaRegistry
//!                      ├── FacetExtractor          │
//!                      ├── TypeNameNormalizer      ▼
//!                      └── ComplexTypeProjector   Enhancer ◀── API document
//!                                                  ├── overlays
//!                                                  └── PropertyEnhancer
//! ```

pub mod audit;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod constraint;
pub mod convert;
pub mod document;
pub mod enhance;
pub mod error;
pub mod facets;
pub mod io;
pub mod mapping;
pub mod names;
pub mod overlay;
pub mod pattern;
pub mod pipeline;
pub mod project;
pub mod registry;

pub use audit::{AuditEvent, AuditTrail};
pub use batch::{run_batch, BatchOptions, BatchSummary};
pub use config::EnhancerConfig;
pub use constraint::{ConstraintRecord, Kind, PropertyRef};
pub use convert::{Conversion, ConversionSummary, ConverterOptions, SchemaConverter};
pub use document::{ApiDocument, FieldNode};
pub use enhance::PropertyEnhancer;
pub use error::{Result, SchemaError};
pub use facets::{ExtractorOptions, FacetExtractor, FacetStrategy};
pub use mapping::{FieldMappingTable, FieldRule, NamePredicate};
pub use names::TypeNameNormalizer;
pub use overlay::Overlay;
pub use pipeline::{EnhancementReport, Enhancer, EnhancerOptions};
pub use project::ComplexTypeProjector;
pub use registry::CanonicalSchemaRegistry;

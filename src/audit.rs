//! Audit trail
//!
//! Every conversion and enhancement run returns the ordered list of what it
//! did or skipped. Runs own their trail, so independent runs never share it.

use serde::Serialize;
use std::fmt;

use crate::constraint::Kind;

/// One discrete thing a run did, skipped, or could not do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    // ---- conversion ----
    TypeConverted {
        source: String,
        canonical: String,
        kind: Kind,
    },
    FacetsMissing {
        canonical: String,
    },
    PatternUnrecoverable {
        canonical: String,
        node: String,
    },
    PatternDiscarded {
        canonical: String,
        pattern: String,
        strategy: &'static str,
    },
    LengthBoundsConflict {
        canonical: String,
        min_length: u64,
        max_length: u64,
    },
    AliasRegistered {
        name: String,
        target: String,
    },
    CaseCollision {
        name: String,
        existing: String,
    },

    // ---- enhancement ----
    BaseTypeAdded {
        name: String,
    },
    EnumAdded {
        name: String,
        values: usize,
    },
    StrictnessApplied {
        schema: String,
    },
    PropertyEnhanced {
        schema: String,
        property: String,
        canonical: String,
        rule: String,
    },
    TopLevelEnhanced {
        schema: String,
        canonical: String,
        /// Substring rule that matched; `None` for the name-match fallback
        rule: Option<String>,
    },
    MetadataRestored {
        schema: String,
        key: String,
    },
    SchemaEnhanced {
        schema: String,
    },
    TransactionTypeAdded {
        name: String,
        keyword: String,
    },
    ErrorSchemaAdded {
        name: String,
    },
    ErrorSchemaKept {
        name: String,
    },
    DocumentationAdded,
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEvent::TypeConverted { source, canonical, kind } => {
                write!(f, "Converted {} -> {} ({})", source, canonical, kind)
            }
            AuditEvent::FacetsMissing { canonical } => write!(f, "No facets found for {}", canonical),
            AuditEvent::PatternUnrecoverable { canonical, node } => {
                write!(f, "Could not recover pattern for {} from {}", canonical, node)
            }
            AuditEvent::PatternDiscarded { canonical, pattern, strategy } => {
                write!(f, "Discarded extra pattern {} for {} ({})", pattern, canonical, strategy)
            }
            AuditEvent::LengthBoundsConflict { canonical, min_length, max_length } => write!(
                f,
                "Dropped minLength {} for {}: exceeds maxLength {}",
                min_length, canonical, max_length
            ),
            AuditEvent::AliasRegistered { name, target } => write!(f, "Element {} -> {}", name, target),
            AuditEvent::CaseCollision { name, existing } => {
                write!(f, "{} collides case-insensitively with {}", name, existing)
            }
            AuditEvent::BaseTypeAdded { name } => write!(f, "Added base type {}", name),
            AuditEvent::EnumAdded { name, values } => write!(f, "Added enum {} with {} values", name, values),
            AuditEvent::StrictnessApplied { schema } => {
                write!(f, "Disallowed additional properties on {}", schema)
            }
            AuditEvent::PropertyEnhanced { schema, property, canonical, rule } => write!(
                f,
                "Enhanced {}.{} with {} validation (rule '{}')",
                schema, property, canonical, rule
            ),
            AuditEvent::TopLevelEnhanced { schema, canonical, rule: Some(rule) } => {
                write!(f, "Enhanced top-level {} with {} validation (rule '{}')", schema, canonical, rule)
            }
            AuditEvent::TopLevelEnhanced { schema, canonical, rule: None } => {
                write!(f, "Filled top-level {} from matching type {}", schema, canonical)
            }
            AuditEvent::MetadataRestored { schema, key } => write!(f, "Restored {} on {}", key, schema),
            AuditEvent::SchemaEnhanced { schema } => write!(f, "Enhanced schema {}", schema),
            AuditEvent::TransactionTypeAdded { name, keyword } => {
                write!(f, "Added transaction type {} for '{}'", name, keyword)
            }
            AuditEvent::ErrorSchemaAdded { name } => write!(f, "Added error schema {}", name),
            AuditEvent::ErrorSchemaKept { name } => write!(f, "Kept existing error schema {}", name),
            AuditEvent::DocumentationAdded => f.write_str("Added enhancement documentation"),
        }
    }
}

/// Ordered sequence of audit events for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuditTrail {
    events: Vec<AuditEvent>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: AuditEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuditEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events matching a predicate
    pub fn count(&self, predicate: impl Fn(&AuditEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}

impl<'a> IntoIterator for &'a AuditTrail {
    type Item = &'a AuditEvent;
    type IntoIter = std::slice::Iter<'a, AuditEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_keeps_order() {
        let mut trail = AuditTrail::new();
        trail.push(AuditEvent::BaseTypeAdded { name: "Date8".to_string() });
        trail.push(AuditEvent::DocumentationAdded);
        assert_eq!(trail.len(), 2);
        assert_eq!(trail.events()[1], AuditEvent::DocumentationAdded);
    }

    #[test]
    fn test_event_serialization() {
        let event = AuditEvent::ErrorSchemaAdded { name: "ErrorCode".to_string() };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, serde_json::json!({"event": "error_schema_added", "name": "ErrorCode"}));
    }

    #[test]
    fn test_display() {
        let event = AuditEvent::TopLevelEnhanced {
            schema: "SrcType".to_string(),
            canonical: "SrcType".to_string(),
            rule: None,
        };
        assert_eq!(event.to_string(), "Filled top-level SrcType from matching type SrcType");
    }
}

//! Facet Extraction
//!
//! Discovers the constraints of a simple type. The upstream type system does
//! not expose facets through one reliable path, so extraction is a chain of
//! [`FacetStrategy`] implementations tried in priority order:
//!
//! 1. [`DirectFacets`] - a `facets` mapping
//! 2. [`RestrictionList`] - `facets` mappings one level down in `restrictions`
//! 3. [`InlineConstraints`] - a `constraints` key/value mapping
//! 4. [`ValidatorList`] - `validators` distinguished by their `kind` tag
//! 5. [`RawPatternScan`] - raw `patterns` nodes, recovered from text if needed
//!
//! Results merge first-found-wins per field. Only the first pattern found
//! across all strategies is kept.

mod strategies;

pub use strategies::{
    DirectFacets, FacetStrategy, InlineConstraints, RawPatternScan, RestrictionList,
    StrategyOutcome, ValidatorList,
};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::audit::{AuditEvent, AuditTrail};
use crate::constraint::{ConstraintRecord, Kind};
use crate::names;
use crate::pattern;

// =============================================================================
// Facet Set
// =============================================================================

/// Partial constraints found by one strategy (patterns not yet canonicalized)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetSet {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub enumeration: Option<Vec<Value>>,
}

impl FacetSet {
    pub fn is_empty(&self) -> bool {
        self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.enumeration.is_none()
    }

    /// Read the conventional facet keys from a mapping.
    ///
    /// An exact `length` sets both bounds and wins over `minLength`/`maxLength`.
    pub fn from_facet_map(map: &Map<String, Value>) -> Self {
        let mut facets = FacetSet::default();

        if let Some(length) = map.get("length").and_then(parse_bound) {
            facets.min_length = Some(length);
            facets.max_length = Some(length);
        } else {
            facets.min_length = map.get("minLength").and_then(parse_bound);
            facets.max_length = map.get("maxLength").and_then(parse_bound);
        }
        facets.pattern = map.get("pattern").and_then(first_pattern);
        facets.enumeration = map.get("enumeration").and_then(parse_enumeration);
        facets
    }

    /// Fill fields that are still unset. Returns a pattern that lost to an
    /// already-present one.
    pub fn merge_from(&mut self, other: FacetSet) -> Option<String> {
        if self.min_length.is_none() {
            self.min_length = other.min_length;
        }
        if self.max_length.is_none() {
            self.max_length = other.max_length;
        }
        if self.enumeration.is_none() {
            self.enumeration = other.enumeration;
        }
        match (&self.pattern, other.pattern) {
            (None, incoming) => {
                self.pattern = incoming;
                None
            }
            (Some(kept), Some(incoming)) if *kept != incoming => Some(incoming),
            _ => None,
        }
    }
}

/// Non-negative integer from a number or a numeric string
pub(crate) fn parse_bound(value: &Value) -> Option<u64> {
    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        debug!("Ignoring unparsable length facet: {}", value);
    }
    parsed
}

/// First non-empty pattern from a string, a list, or a `{value}` node
pub(crate) fn first_pattern(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_pattern),
        Value::Object(obj) => obj.get("value").and_then(first_pattern),
        _ => None,
    }
}

/// Non-empty literal list; a lone scalar counts as a one-value list
pub(crate) fn parse_enumeration(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) if !items.is_empty() => Some(items.clone()),
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Some(vec![value.clone()]),
        _ => None,
    }
}

// =============================================================================
// Kind inference
// =============================================================================

/// Infer the value kind from a `primitive` hint or the `base` type name
pub fn infer_kind(node: &Value) -> Kind {
    if let Some(primitive) = node.get("primitive").and_then(Value::as_str) {
        match primitive.to_ascii_lowercase().as_str() {
            "int" | "integer" => return Kind::Integer,
            "float" | "number" => return Kind::Number,
            "bool" | "boolean" => return Kind::Boolean,
            _ => {}
        }
    }

    let base = match node.get("base") {
        Some(Value::String(s)) => s.as_str(),
        Some(Value::Object(obj)) => obj.get("name").and_then(Value::as_str).unwrap_or(""),
        _ => "",
    };

    match names::local_name(base) {
        "int" | "integer" | "long" | "short" | "byte" | "nonNegativeInteger" | "positiveInteger"
        | "negativeInteger" | "nonPositiveInteger" | "unsignedLong" | "unsignedInt"
        | "unsignedShort" | "unsignedByte" => Kind::Integer,
        "float" | "double" | "decimal" => Kind::Number,
        "boolean" => Kind::Boolean,
        _ => Kind::String,
    }
}

// =============================================================================
// Extractor
// =============================================================================

/// Options controlling which strategies run
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    /// Run the text-recovery strategy over raw `patterns` nodes
    pub raw_pattern_recovery: bool,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            raw_pattern_recovery: true,
        }
    }
}

/// Runs the strategy chain and builds one [`ConstraintRecord`] per type.
pub struct FacetExtractor {
    strategies: Vec<Box<dyn FacetStrategy + Send + Sync>>,
}

impl Default for FacetExtractor {
    fn default() -> Self {
        Self::new(&ExtractorOptions::default())
    }
}

impl FacetExtractor {
    pub fn new(options: &ExtractorOptions) -> Self {
        let mut strategies: Vec<Box<dyn FacetStrategy + Send + Sync>> = vec![
            Box::new(DirectFacets),
            Box::new(RestrictionList),
            Box::new(InlineConstraints),
            Box::new(ValidatorList),
        ];
        if options.raw_pattern_recovery {
            strategies.push(Box::new(RawPatternScan::new()));
        }
        Self { strategies }
    }

    /// Use a custom strategy chain, highest priority first
    pub fn with_strategies(strategies: Vec<Box<dyn FacetStrategy + Send + Sync>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract the constraints of a simple type definition.
    ///
    /// Never fails: a type without any discoverable facet yields a record
    /// carrying only its kind.
    pub fn extract(&self, canonical: &str, node: &Value, audit: &mut AuditTrail) -> ConstraintRecord {
        let kind = infer_kind(node);
        let mut merged = FacetSet::default();

        for strategy in &self.strategies {
            let outcome = strategy.extract(node);

            for raw in outcome.unrecovered {
                warn!("Could not extract pattern value for {} from {}", canonical, raw);
                audit.push(AuditEvent::PatternUnrecoverable {
                    canonical: canonical.to_string(),
                    node: raw,
                });
            }

            if !outcome.facets.is_empty() {
                debug!("{}: {} found {:?}", canonical, strategy.name(), outcome.facets);
            }
            if let Some(discarded) = merged.merge_from(outcome.facets) {
                debug!("{}: discarding extra pattern {} from {}", canonical, discarded, strategy.name());
                audit.push(AuditEvent::PatternDiscarded {
                    canonical: canonical.to_string(),
                    pattern: discarded,
                    strategy: strategy.name(),
                });
            }
        }

        if merged.is_empty() {
            warn!("No facets found for {}", canonical);
            audit.push(AuditEvent::FacetsMissing {
                canonical: canonical.to_string(),
            });
        }

        let mut record = ConstraintRecord::of_kind(kind);
        record.pattern = merged.pattern.as_deref().map(pattern::canonicalize);
        record.enumeration = merged.enumeration;

        if kind == Kind::String {
            record.min_length = merged.min_length;
            record.max_length = merged.max_length;
            if let (Some(min), Some(max)) = (record.min_length, record.max_length) {
                if min > max {
                    warn!("{}: minLength {} exceeds maxLength {}, dropping minLength", canonical, min, max);
                    audit.push(AuditEvent::LengthBoundsConflict {
                        canonical: canonical.to_string(),
                        min_length: min,
                        max_length: max,
                    });
                    record.min_length = None;
                }
            }
        } else if merged.min_length.is_some() || merged.max_length.is_some() {
            debug!("{}: dropping length facets on {} kind", canonical, kind);
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(node: Value) -> (ConstraintRecord, AuditTrail) {
        let mut audit = AuditTrail::new();
        let record = FacetExtractor::default().extract("Test", &node, &mut audit);
        (record, audit)
    }

    #[test]
    fn test_direct_facets() {
        let (record, audit) = extract(json!({"base": "xs:string", "facets": {"minLength": 3, "maxLength": 5}}));
        assert_eq!(record.kind, Kind::String);
        assert_eq!(record.min_length, Some(3));
        assert_eq!(record.max_length, Some(5));
        assert!(audit.is_empty());
    }

    #[test]
    fn test_exact_length_sets_both_bounds() {
        let (record, _) = extract(json!({"facets": {"length": "4", "minLength": 1}}));
        assert_eq!(record.min_length, Some(4));
        assert_eq!(record.max_length, Some(4));
    }

    #[test]
    fn test_first_found_wins_across_strategies() {
        let (record, _) = extract(json!({
            "facets": {"maxLength": 15},
            "constraints": {"maxLength": 20, "minLength": 1},
            "validators": [{"kind": "enumeration", "enumeration": ["D", "I", "F"]}]
        }));
        assert_eq!(record.max_length, Some(15));
        assert_eq!(record.min_length, Some(1));
        assert_eq!(record.enumeration, Some(vec![json!("D"), json!("I"), json!("F")]));
    }

    #[test]
    fn test_single_pattern_policy() {
        let (record, audit) = extract(json!({
            "restrictions": [{"facets": {"pattern": "\\d{8}"}}],
            "validators": [{"kind": "pattern", "value": "[0-9]{8}"}]
        }));
        assert_eq!(record.pattern.as_deref(), Some("^\\d{8}$"));
        assert_eq!(audit.count(|e| matches!(e, AuditEvent::PatternDiscarded { .. })), 1);
    }

    #[test]
    fn test_raw_pattern_recovery() {
        let (record, _) = extract(json!({"patterns": ["<xs:pattern value=\"Y|N\"/>"]}));
        assert_eq!(record.pattern.as_deref(), Some("^(Y|N)$"));
    }

    #[test]
    fn test_raw_pattern_failure_is_not_fatal() {
        let (record, audit) = extract(json!({"facets": {"maxLength": 2}, "patterns": ["<xs:pattern/>"]}));
        assert_eq!(record.pattern, None);
        assert_eq!(record.max_length, Some(2));
        assert_eq!(audit.count(|e| matches!(e, AuditEvent::PatternUnrecoverable { .. })), 1);
    }

    #[test]
    fn test_raw_pattern_recovery_can_be_disabled() {
        let extractor = FacetExtractor::new(&ExtractorOptions { raw_pattern_recovery: false });
        let mut audit = AuditTrail::new();
        let record = extractor.extract("T", &json!({"patterns": [{"value": "A"}]}), &mut audit);
        assert_eq!(record.pattern, None);
        assert!(!extractor.strategy_names().contains(&"raw_pattern_scan"));
    }

    #[test]
    fn test_no_facets_yields_minimal_record() {
        let (record, audit) = extract(json!({"base": "xs:string"}));
        assert_eq!(record, ConstraintRecord::of_kind(Kind::String));
        assert_eq!(audit.events(), &[AuditEvent::FacetsMissing { canonical: "Test".to_string() }]);
    }

    #[test]
    fn test_kind_inference() {
        assert_eq!(infer_kind(&json!({"base": "xs:integer"})), Kind::Integer);
        assert_eq!(infer_kind(&json!({"base": {"name": "{http://www.w3.org/2001/XMLSchema}decimal"}})), Kind::Number);
        assert_eq!(infer_kind(&json!({"base": "boolean"})), Kind::Boolean);
        assert_eq!(infer_kind(&json!({"primitive": "int", "base": "xs:string"})), Kind::Integer);
        assert_eq!(infer_kind(&json!({})), Kind::String);
    }

    #[test]
    fn test_length_facets_dropped_for_numbers() {
        let (record, _) = extract(json!({"base": "xs:int", "facets": {"maxLength": 3, "pattern": "\\d{3}"}}));
        assert_eq!(record.kind, Kind::Integer);
        assert_eq!(record.max_length, None);
        assert_eq!(record.pattern.as_deref(), Some("^\\d{3}$"));
    }

    #[test]
    fn test_empty_enumeration_ignored() {
        let (record, _) = extract(json!({
            "facets": {"enumeration": []},
            "constraints": {"enumeration": ["A"]}
        }));
        assert_eq!(record.enumeration, Some(vec![json!("A")]));

        let (record, audit) = extract(json!({"facets": {"enumeration": []}}));
        assert_eq!(record.enumeration, None);
        assert_eq!(audit.count(|e| matches!(e, AuditEvent::FacetsMissing { .. })), 1);
    }

    /// Reads `{"codes": "A,B"}` as an enumeration
    struct CodeList;

    impl FacetStrategy for CodeList {
        fn name(&self) -> &'static str {
            "code_list"
        }

        fn extract(&self, node: &Value) -> StrategyOutcome {
            let enumeration = node
                .get("codes")
                .and_then(Value::as_str)
                .map(|codes| codes.split(',').map(|c| json!(c.trim())).collect());
            FacetSet {
                enumeration,
                ..Default::default()
            }
            .into()
        }
    }

    #[test]
    fn test_custom_strategy_chain() {
        let strategies: Vec<Box<dyn FacetStrategy + Send + Sync>> = vec![Box::new(CodeList), Box::new(DirectFacets)];
        let extractor = FacetExtractor::with_strategies(strategies);
        assert_eq!(extractor.strategy_names(), vec!["code_list", "direct_facets"]);

        let mut audit = AuditTrail::new();
        let record = extractor.extract(
            "Test",
            &json!({
                "codes": "A, B",
                "facets": {"enumeration": ["X"], "maxLength": 1},
                "patterns": [{"value": "[AB]"}]
            }),
            &mut audit,
        );
        assert_eq!(record.enumeration, Some(vec![json!("A"), json!("B")]));
        assert_eq!(record.max_length, Some(1));
        assert_eq!(record.pattern, None);
        assert!(audit.is_empty());
    }

    #[test]
    fn test_conflicting_bounds_drop_minimum() {
        let (record, audit) = extract(json!({"facets": {"minLength": 9, "maxLength": 2}}));
        assert_eq!(record.min_length, None);
        assert_eq!(record.max_length, Some(2));
        assert!(record.check().is_ok());
        assert_eq!(audit.count(|e| matches!(e, AuditEvent::LengthBoundsConflict { .. })), 1);
    }
}

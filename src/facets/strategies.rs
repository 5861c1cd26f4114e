//! Facet access strategies
//!
//! Each strategy reads one of the shapes the upstream type system uses to
//! expose facets and returns what it found as a [`FacetSet`]. Strategies never
//! fail; a shape that is absent or malformed simply yields nothing.

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::{first_pattern, parse_bound, parse_enumeration, FacetSet};

/// What one strategy found
#[derive(Debug, Default)]
pub struct StrategyOutcome {
    pub facets: FacetSet,
    /// Textual form of pattern nodes whose value could not be recovered
    pub unrecovered: Vec<String>,
}

impl From<FacetSet> for StrategyOutcome {
    fn from(facets: FacetSet) -> Self {
        Self {
            facets,
            unrecovered: Vec::new(),
        }
    }
}

/// One way of reading facets off a simple type node
pub trait FacetStrategy {
    /// Stable identifier used in logs and audit events
    fn name(&self) -> &'static str;

    fn extract(&self, node: &Value) -> StrategyOutcome;
}

// =============================================================================
// 1. Direct facet mapping
// =============================================================================

/// `{"facets": {"minLength": 3, "maxLength": 5}}`
pub struct DirectFacets;

impl FacetStrategy for DirectFacets {
    fn name(&self) -> &'static str {
        "direct_facets"
    }

    fn extract(&self, node: &Value) -> StrategyOutcome {
        node.get("facets")
            .and_then(Value::as_object)
            .map(FacetSet::from_facet_map)
            .unwrap_or_default()
            .into()
    }
}

// =============================================================================
// 2. Restriction list
// =============================================================================

/// `{"restrictions": [{"facets": {...}}, ...]}`
pub struct RestrictionList;

impl FacetStrategy for RestrictionList {
    fn name(&self) -> &'static str {
        "restriction_list"
    }

    fn extract(&self, node: &Value) -> StrategyOutcome {
        let mut facets = FacetSet::default();
        let restrictions = node.get("restrictions").and_then(Value::as_array);
        for restriction in restrictions.into_iter().flatten() {
            if let Some(map) = restriction.get("facets").and_then(Value::as_object) {
                facets.merge_from(FacetSet::from_facet_map(map));
            }
        }
        facets.into()
    }
}

// =============================================================================
// 3. Inline constraints
// =============================================================================

/// `{"constraints": {"enumeration": [...], "pattern": "..."}}`
pub struct InlineConstraints;

impl FacetStrategy for InlineConstraints {
    fn name(&self) -> &'static str {
        "inline_constraints"
    }

    fn extract(&self, node: &Value) -> StrategyOutcome {
        node.get("constraints")
            .and_then(Value::as_object)
            .map(FacetSet::from_facet_map)
            .unwrap_or_default()
            .into()
    }
}

// =============================================================================
// 4. Discriminated validator list
// =============================================================================

/// `{"validators": [{"kind": "maxLength", "value": 15}, ...]}`
///
/// The `kind` tag selects where the value lives. Any validator carrying a
/// non-empty `enumeration` contributes it regardless of its tag.
pub struct ValidatorList;

impl ValidatorList {
    fn read_validator(validator: &Map<String, Value>) -> FacetSet {
        let mut facets = FacetSet {
            enumeration: validator.get("enumeration").and_then(parse_enumeration),
            ..Default::default()
        };

        let kind = validator.get("kind").and_then(Value::as_str).unwrap_or("");
        match kind {
            "enumeration" => {
                if facets.enumeration.is_none() {
                    facets.enumeration = validator.get("values").and_then(parse_enumeration);
                }
            }
            "patterns" => {
                facets.pattern = ["patterns", "regexps", "value"]
                    .iter()
                    .find_map(|key| validator.get(*key).and_then(first_pattern));
            }
            "pattern" => {
                facets.pattern = ["value", "pattern"]
                    .iter()
                    .find_map(|key| validator.get(*key).and_then(first_pattern));
            }
            "minLength" => facets.min_length = validator.get("value").and_then(parse_bound),
            "maxLength" => facets.max_length = validator.get("value").and_then(parse_bound),
            "length" => {
                let length = validator.get("value").and_then(parse_bound);
                facets.min_length = length;
                facets.max_length = length;
            }
            other => debug!("Skipping validator of kind '{}'", other),
        }
        facets
    }
}

impl FacetStrategy for ValidatorList {
    fn name(&self) -> &'static str {
        "validator_list"
    }

    fn extract(&self, node: &Value) -> StrategyOutcome {
        let mut facets = FacetSet::default();
        let validators = node.get("validators").and_then(Value::as_array);
        for validator in validators.into_iter().flatten().filter_map(Value::as_object) {
            facets.merge_from(Self::read_validator(validator));
        }
        facets.into()
    }
}

// =============================================================================
// 5. Raw pattern nodes
// =============================================================================

/// Textual `value="..."` attribute inside a serialized pattern element
const VALUE_ATTRIBUTE: &str = r#"value=["']([^"']+)["']"#;

/// `{"patterns": [<node>, ...]}` where each node is raw markup.
///
/// Structured access (`value`, `attrib.value`) is tried first. Otherwise the
/// value is recovered from the node's text (a plain string, or the `text`
/// field) with a best-effort regex. The first recovered value wins; nodes
/// that yield nothing are reported as unrecovered.
pub struct RawPatternScan {
    value_attribute: Regex,
}

impl Default for RawPatternScan {
    fn default() -> Self {
        Self::new()
    }
}

impl RawPatternScan {
    pub fn new() -> Self {
        Self {
            value_attribute: Regex::new(VALUE_ATTRIBUTE).expect("value attribute regex is valid"),
        }
    }

    fn structured(node: &Value) -> Option<String> {
        let obj = node.as_object()?;
        obj.get("value")
            .and_then(Value::as_str)
            .or_else(|| obj.get("attrib").and_then(|a| a.get("value")).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn textual(&self, node: &Value) -> Option<String> {
        let text = match node {
            Value::String(s) => s.as_str(),
            Value::Object(obj) => obj.get("text").and_then(Value::as_str)?,
            _ => return None,
        };
        self.value_attribute
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

impl FacetStrategy for RawPatternScan {
    fn name(&self) -> &'static str {
        "raw_pattern_scan"
    }

    fn extract(&self, node: &Value) -> StrategyOutcome {
        let mut outcome = StrategyOutcome::default();
        let patterns = node.get("patterns").and_then(Value::as_array);

        for raw in patterns.into_iter().flatten() {
            match Self::structured(raw).or_else(|| self.textual(raw)) {
                Some(pattern) => {
                    outcome.facets.pattern = Some(pattern);
                    break;
                }
                None => outcome.unrecovered.push(match raw {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_restriction_list_merges_in_order() {
        let node = json!({"restrictions": [
            {"facets": {"maxLength": 7}},
            {"facets": {"maxLength": 9, "minLength": 5}},
            {"other": true}
        ]});
        let facets = RestrictionList.extract(&node).facets;
        assert_eq!(facets.max_length, Some(7));
        assert_eq!(facets.min_length, Some(5));
    }

    #[test]
    fn test_validator_discriminator() {
        let node = json!({"validators": [
            {"kind": "patterns", "regexps": ["[A-Z]{2}"]},
            {"kind": "minLength", "value": "2"},
            {"kind": "maxLength", "value": 4},
            {"kind": "whiteSpace", "value": "collapse"},
            {"kind": "assertion", "enumeration": ["X"]}
        ]});
        let facets = ValidatorList.extract(&node).facets;
        assert_eq!(facets.pattern.as_deref(), Some("[A-Z]{2}"));
        assert_eq!(facets.min_length, Some(2));
        assert_eq!(facets.max_length, Some(4));
        assert_eq!(facets.enumeration, Some(vec![json!("X")]));
    }

    #[test]
    fn test_validator_length() {
        let node = json!({"validators": [{"kind": "length", "value": 8}]});
        let facets = ValidatorList.extract(&node).facets;
        assert_eq!((facets.min_length, facets.max_length), (Some(8), Some(8)));
    }

    #[test]
    fn test_raw_scan_prefers_structured_access() {
        let scan = RawPatternScan::new();
        let node = json!({"patterns": [{"attrib": {"value": "\\d{6}"}, "text": "value='ignored'"}]});
        assert_eq!(scan.extract(&node).facets.pattern.as_deref(), Some("\\d{6}"));
    }

    #[test]
    fn test_raw_scan_reports_and_continues() {
        let scan = RawPatternScan::new();
        let node = json!({"patterns": [
            {"tag": "pattern"},
            "<pattern value='[DIF]'/>",
            "<pattern value='never'/>"
        ]});
        let outcome = scan.extract(&node);
        assert_eq!(outcome.facets.pattern.as_deref(), Some("[DIF]"));
        assert_eq!(outcome.unrecovered, vec![r#"{"tag":"pattern"}"#.to_string()]);
    }

    #[test]
    fn test_absent_shapes_yield_nothing() {
        let node = json!({"facets": "not a map", "restrictions": {}, "validators": 3});
        assert!(DirectFacets.extract(&node).facets.is_empty());
        assert!(RestrictionList.extract(&node).facets.is_empty());
        assert!(ValidatorList.extract(&node).facets.is_empty());
        assert!(InlineConstraints.extract(&node).facets.is_empty());
    }
}

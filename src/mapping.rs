//! Field mapping table
//!
//! An ordered list of `(predicate, canonical type)` rules associating
//! document field names with canonical types. A field name may satisfy more
//! than one predicate, so table order is the tie-break: the first rule that
//! matches (and whose canonical type resolves) wins.

use serde::{Deserialize, Serialize};

use crate::constraint::ConstraintRecord;
use crate::registry::CanonicalSchemaRegistry;

/// Default rules: (substring, canonical type)
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("Date", "Date8"),
    ("Time", "Time6"),
    ("MgmtCode", "MgmtCodeType"),
    ("DlrCode", "Length4"),
    ("IntCode", "Alpha3To4"),
    ("SrcID", "String15"),
    ("FundAcctID", "String15"),
    ("FundID", "String3To5"),
    ("OrdID", "String5To7"),
    ("AmtValue", "Value14"),
    ("SrcType", "SrcType"),
    ("ActnCode", "ActnCode"),
    ("AcctDesig", "AcctDesigType"),
    ("AmtType", "AmtType"),
];

/// How a rule tests a field name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePredicate {
    /// Case-sensitive substring test
    Contains(String),
}

impl NamePredicate {
    pub fn matches(&self, field_name: &str) -> bool {
        match self {
            NamePredicate::Contains(needle) => field_name.contains(needle.as_str()),
        }
    }
}

/// One `(predicate, canonical type)` rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(flatten)]
    pub predicate: NamePredicate,
    pub canonical: String,
}

impl FieldRule {
    pub fn contains(needle: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self {
            predicate: NamePredicate::Contains(needle.into()),
            canonical: canonical.into(),
        }
    }

    /// Short label for logs and audit events
    pub fn label(&self) -> &str {
        match &self.predicate {
            NamePredicate::Contains(needle) => needle,
        }
    }
}

/// A rule that matched a field and resolved in the registry
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'a> {
    pub rule: &'a FieldRule,
    /// Registry key the canonical name resolved to
    pub key: &'a str,
    pub record: &'a ConstraintRecord,
}

/// Ordered rule list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMappingTable {
    rules: Vec<FieldRule>,
}

impl Default for FieldMappingTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_RULES
                .iter()
                .map(|(needle, canonical)| FieldRule::contains(*needle, *canonical))
                .collect(),
        )
    }
}

impl FieldMappingTable {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Canonical names referenced by the table, first occurrence order, deduplicated
    pub fn canonical_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !names.contains(&rule.canonical.as_str()) {
                names.push(&rule.canonical);
            }
        }
        names
    }

    /// First rule whose predicate matches, regardless of the registry
    pub fn first_match(&self, field_name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|rule| rule.predicate.matches(field_name))
    }

    /// First rule that matches `field_name` and whose canonical type resolves
    /// (exact, then case-insensitive). A matching rule whose type is missing
    /// from the registry falls through to the next rule.
    pub fn resolve<'a>(
        &'a self,
        field_name: &str,
        registry: &'a CanonicalSchemaRegistry,
    ) -> Option<RuleMatch<'a>> {
        self.rules
            .iter()
            .filter(|rule| rule.predicate.matches(field_name))
            .find_map(|rule| {
                registry
                    .resolve(&rule.canonical)
                    .map(|(key, record)| RuleMatch { rule, key, record })
            })
    }
}

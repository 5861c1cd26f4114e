//! Type Name Normalization
//!
//! Maps source type identifiers (`tfs:string3-5`, `{urn:x}yesno1`,
//! `fund_acct_id`) to the canonical names used as registry keys.
//!
//! Resolution order:
//! 1. Strip namespace prefixes (`prefix:` and Clark-style `{uri}`)
//! 2. Irregular-name table, keyed by the lower-cased local name
//! 3. PascalCase fallback over `-`, `_` and whitespace separated segments

use std::collections::HashMap;

/// Canonical name used when a source name is empty
pub const UNKNOWN_TYPE: &str = "UnknownType";

/// Clark-notation prefix of the XML Schema namespace
const XML_SCHEMA_NAMESPACE: &str = "{http://www.w3.org/2001/XMLSchema}";

/// Irregular conversions the PascalCase fallback would get wrong
const IRREGULAR_NAMES: &[(&str, &str)] = &[
    ("string2-20", "String2To20"),
    ("string3-5", "String3To5"),
    ("string5-7", "String5To7"),
    ("string2-80", "String2To80"),
    ("alpha3-4", "Alpha3To4"),
    ("alphanum1-5", "AlphaNum1To5"),
    ("amt9v2n", "Amt9V2N"),
    ("percent2v3", "Percent2V3"),
    ("percent3v2", "Percent3V2"),
    ("value14", "Value14"),
    ("date8", "Date8"),
    ("time6", "Time6"),
    ("integer3", "Integer3"),
    ("integer5", "Integer5"),
    ("length4", "Length4"),
    ("sintype", "SINType"),
    ("yes1", "Yes1"),
    ("yesno1", "YesNo1"),
];

// =============================================================================
// Normalizer
// =============================================================================

/// Resolves source type names to canonical names.
#[derive(Debug, Clone)]
pub struct TypeNameNormalizer {
    /// lower-cased local name -> canonical name
    conversions: HashMap<String, String>,
}

impl Default for TypeNameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeNameNormalizer {
    /// Create a normalizer with the built-in irregular-name table
    pub fn new() -> Self {
        let conversions = IRREGULAR_NAMES
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        Self { conversions }
    }

    /// Add or replace irregular conversions. Keys are matched case-insensitively.
    pub fn with_conversions<I, K, V>(mut self, conversions: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (from, to) in conversions {
            self.conversions.insert(from.as_ref().to_lowercase(), to.into());
        }
        self
    }

    /// Normalize a source name. Never fails; empty input yields [`UNKNOWN_TYPE`].
    pub fn normalize(&self, source_name: &str) -> String {
        let local = local_name(source_name.trim());
        if local.is_empty() {
            return UNKNOWN_TYPE.to_string();
        }

        if let Some(canonical) = self.conversions.get(&local.to_lowercase()) {
            return canonical.clone();
        }

        let name = to_pascal_case(local);
        if name.is_empty() {
            UNKNOWN_TYPE.to_string()
        } else {
            name
        }
    }
}

/// Normalize with the default table
pub fn normalize(source_name: &str) -> String {
    TypeNameNormalizer::new().normalize(source_name)
}

// =============================================================================
// Helpers
// =============================================================================

/// Drop `{uri}` and `prefix:` scoping from a qualified name
pub fn local_name(name: &str) -> &str {
    let name = match (name.starts_with('{'), name.find('}')) {
        (true, Some(end)) => &name[end + 1..],
        _ => name,
    };
    name.rsplit(':').next().unwrap_or(name)
}

/// Whether a qualified name refers to an XML Schema built-in type
/// (`xs:`/`xsd:` prefix or the XML Schema namespace URI)
pub fn is_builtin(name: &str) -> bool {
    let name = name.trim();
    name.starts_with("xs:") || name.starts_with("xsd:") || name.starts_with(XML_SCHEMA_NAMESPACE)
}

fn is_separator(c: char) -> bool {
    c == '-' || c == '_' || c.is_whitespace()
}

/// Convert to PascalCase.
///
/// A name without separators keeps its inner casing (`OrdSetType` stays
/// `OrdSetType`, `FUNDACCT` stays `FUNDACCT`). Separated segments are
/// capitalized with the rest lower-cased (`FUND_ACCT` becomes `FundAcct`).
fn to_pascal_case(s: &str) -> String {
    if !s.chars().any(is_separator) {
        return upper_first(s);
    }

    s.split(is_separator)
        .filter(|segment| !segment.is_empty())
        .map(case_word)
        .collect()
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// First letter upper, rest lower
fn case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut result = first.to_uppercase().to_string();
            for c in chars {
                result.extend(c.to_lowercase());
            }
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irregular_names() {
        let normalizer = TypeNameNormalizer::new();
        assert_eq!(normalizer.normalize("string3-5"), "String3To5");
        assert_eq!(normalizer.normalize("YESNO1"), "YesNo1");
        assert_eq!(normalizer.normalize("sintype"), "SINType");
        assert_eq!(normalizer.normalize("amt9v2n"), "Amt9V2N");
    }

    #[test]
    fn test_namespace_prefix_stripped() {
        let normalizer = TypeNameNormalizer::new();
        assert_eq!(normalizer.normalize("tfs:string3-5"), "String3To5");
        assert_eq!(normalizer.normalize("{http://www.fundserv.com/tfs}date8"), "Date8");
        assert_eq!(normalizer.normalize("xs:string"), "String");
    }

    #[test]
    fn test_pascal_case_fallback() {
        assert_eq!(normalize("fund_acct_id"), "FundAcctId");
        assert_eq!(normalize("mgmt-code type"), "MgmtCodeType");
        assert_eq!(normalize("string4-9"), "String49");
        assert_eq!(normalize("__ord--set__"), "OrdSet");
    }

    #[test]
    fn test_unseparated_names_keep_casing() {
        assert_eq!(normalize("OrdSetType"), "OrdSetType");
        assert_eq!(normalize("srcType"), "SrcType");
        assert_eq!(normalize("mgmtcode"), "Mgmtcode");
        assert_eq!(normalize("FUNDACCT"), "FUNDACCT");
    }

    #[test]
    fn test_separated_segments_lower_cased() {
        assert_eq!(normalize("FUND_ACCT"), "FundAcct");
        assert_eq!(normalize("ordSet-TYPE"), "OrdsetType");
    }

    #[test]
    fn test_builtin_names() {
        assert!(is_builtin("xs:decimal"));
        assert!(is_builtin("xsd:string"));
        assert!(is_builtin("{http://www.w3.org/2001/XMLSchema}int"));
        assert!(!is_builtin("tfs:string3-5"));
        assert!(!is_builtin("OrdSetType"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), UNKNOWN_TYPE);
        assert_eq!(normalize("   "), UNKNOWN_TYPE);
        assert_eq!(normalize("tfs:"), UNKNOWN_TYPE);
        assert_eq!(normalize("--"), UNKNOWN_TYPE);
    }

    #[test]
    fn test_deterministic() {
        let normalizer = TypeNameNormalizer::new();
        for name in ["string2-80", "OrdSet", "amt_type", ""] {
            assert_eq!(normalizer.normalize(name), normalizer.normalize(name));
        }
    }

    #[test]
    fn test_custom_conversions() {
        let normalizer = TypeNameNormalizer::new().with_conversions([("MgmtCode", "MgmtCodeType")]);
        assert_eq!(normalizer.normalize("mgmtcode"), "MgmtCodeType");
        assert_eq!(normalizer.normalize("string3-5"), "String3To5");
    }
}

//! Fixed catalogs injected by the overlays

use crate::constraint::{ConstraintRecord, Kind};

/// Enumerated code types: (name, values, description)
pub const ENUMERATIONS: &[(&str, &[&str], &str)] = &[
    ("SrcType", &["D", "I", "F"], "Source type - D for Dealer, I for Intermediary, F for Fund"),
    ("ActnCode", &["NEW", "CHG", "CAN", "CAX", "AOT", "REV"], "Action code"),
    ("AcctDesigType", &["1", "2", "3"], "Account designation"),
    (
        "AmtType",
        &["A", "D", "F", "M", "P", "S", "T", "B", "C", "J", "L", "G", "H"],
        "Amount type",
    ),
    ("SettlMethd", &["1", "2", "3", "4", "5", "6"], "Settlement method"),
    ("RspnSrc", &["I", "F", "N"], "Response source"),
    ("RtnCode", &["00", "01", "98", "99", "50"], "Return code"),
];

/// Transaction type keywords matched against the document title, in priority order
pub const TRANSACTION_TYPES: &[(&str, &str)] = &[
    ("Buy", "1"),
    ("Sell", "5"),
    ("Switch", "8"),
    ("Transfer", "7"),
    ("ICT", "6"),
];

/// Base types copied into every document besides those the mapping table names
pub const EXTRA_BASE_TYPES: &[&str] = &[
    "Amt9V2N",
    "Percent2V3",
    "AlphaNum1To5",
    "Yes1",
    "YesNo1",
    "Integer3",
    "Integer5",
];

/// Appended once to `info.description`
pub const ENHANCEMENT_NOTE: &str =
    "\n\nThis API specification has been enhanced with comprehensive XML schema-based validation.";

/// Value of `info.x-schema-version` when absent
pub const SCHEMA_VERSION: &str = "XML-aligned-v1.0";

/// The enumeration catalog as records, in catalog order
pub fn enumerations() -> Vec<(&'static str, ConstraintRecord)> {
    ENUMERATIONS
        .iter()
        .map(|(name, values, description)| {
            (*name, ConstraintRecord::string_enum(values.iter().copied(), *description))
        })
        .collect()
}

/// Error-handling schemas
pub fn error_schemas() -> Vec<(&'static str, ConstraintRecord)> {
    vec![
        (
            "ErrorCode",
            ConstraintRecord {
                pattern: Some(r"^\d{3}$".to_string()),
                description: Some("3-digit error code".to_string()),
                ..ConstraintRecord::of_kind(Kind::String)
            },
        ),
        (
            "CorrlatnID",
            ConstraintRecord {
                max_length: Some(48),
                description: Some("Correlation ID for tracking".to_string()),
                ..ConstraintRecord::of_kind(Kind::String)
            },
        ),
    ]
}

/// Schema name and record for a transaction type keyword
pub fn transaction_type(keyword: &str, code: &str) -> (String, ConstraintRecord) {
    (
        format!("TrxnTyp{}", keyword),
        ConstraintRecord::string_enum([code], format!("Transaction type for {} orders", keyword)),
    )
}

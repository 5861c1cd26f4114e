//! Pattern Canonicalization
//!
//! Turns XML-Schema style regular expressions (which are implicitly anchored)
//! into explicitly anchored JSON Schema patterns. An alternation at the top
//! level is grouped first so that `^`/`$` bind to the whole expression rather
//! than to the first and last branch.
//!
//! Escape sequences are passed through untouched; escaping for the output
//! encoding is the serializer's job.

/// Canonicalize a pattern into its anchored, grouped form.
///
/// Idempotent: `canonicalize(&canonicalize(p)) == canonicalize(p)`.
///
/// ```
/// use schema_enhancer::pattern::canonicalize;
///
/// assert_eq!(canonicalize("A|BC"), "^(A|BC)$");
/// assert_eq!(canonicalize("(A|BC)"), "^(A|BC)$");
/// assert_eq!(canonicalize("^\\d{8}$"), "^\\d{8}$");
/// ```
pub fn canonicalize(pattern: &str) -> String {
    let mut body = strip_anchors(pattern).to_string();

    // A dangling escape would swallow the closing anchor
    if trailing_backslashes(&body) % 2 == 1 {
        body.push('\\');
    }

    let scan = scan(&body);
    if scan.top_level_alternation && scan.well_formed {
        format!("^({})$", body)
    } else {
        format!("^{}$", body)
    }
}

/// Whether a pattern already carries the anchors `canonicalize` would add
pub fn is_canonical(pattern: &str) -> bool {
    canonicalize(pattern) == pattern
}

/// Remove every leading `^` and every trailing unescaped `$`
fn strip_anchors(pattern: &str) -> &str {
    let mut body = pattern.trim_start_matches('^');
    while body.ends_with('$') && trailing_backslashes(&body[..body.len() - 1]) % 2 == 0 {
        body = &body[..body.len() - 1];
    }
    body
}

fn trailing_backslashes(s: &str) -> usize {
    s.bytes().rev().take_while(|&b| b == b'\\').count()
}

struct Scan {
    top_level_alternation: bool,
    /// Parentheses balance and every character class is closed
    well_formed: bool,
}

fn scan(body: &str) -> Scan {
    let mut depth: i64 = 0;
    let mut in_class = false;
    let mut escaped = false;
    let mut top_level_alternation = false;
    let mut went_negative = false;

    for c in body.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth -= 1;
                if depth < 0 {
                    went_negative = true;
                }
            }
            '|' if !in_class && depth == 0 => top_level_alternation = true,
            _ => {}
        }
    }

    Scan {
        top_level_alternation,
        well_formed: depth == 0 && !in_class && !went_negative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "^",
        "$",
        "A|BC",
        "(A|BC)",
        "(A)|(B)",
        "^(A|BC)$",
        "^^a$$",
        "\\d{8}",
        "[A-Z]{2}[A-Z0-9]",
        "a\\|b",
        "[|]x",
        "a\\$",
        "a\\\\$",
        "a\\",
        "a)|(b",
        "a|[b",
        "-?\\d{1,9}(\\.\\d{2})?",
        "(19|20)\\d{2}(0[1-9]|1[0-2])",
    ];

    #[test]
    fn test_alternation_is_grouped() {
        assert_eq!(canonicalize("A|BC"), "^(A|BC)$");
        assert_eq!(canonicalize("D|I|F"), "^(D|I|F)$");
    }

    #[test]
    fn test_grouped_alternation_not_double_wrapped() {
        assert_eq!(canonicalize("(A|BC)"), "^(A|BC)$");
        assert_eq!(canonicalize("^(A|BC)$"), "^(A|BC)$");
    }

    #[test]
    fn test_sibling_groups_are_wrapped() {
        // Starts with '(' and ends with ')' but is not one group
        assert_eq!(canonicalize("(A)|(B)"), "^((A)|(B))$");
    }

    #[test]
    fn test_escaped_and_class_pipes_are_literal() {
        assert_eq!(canonicalize("a\\|b"), "^a\\|b$");
        assert_eq!(canonicalize("[|]x"), "^[|]x$");
    }

    #[test]
    fn test_escaped_dollar_is_kept() {
        assert_eq!(canonicalize("a\\$"), "^a\\$$");
        // Escaped backslash followed by a real anchor
        assert_eq!(canonicalize("a\\\\$"), "^a\\\\$");
    }

    #[test]
    fn test_existing_anchors_collapse() {
        assert_eq!(canonicalize("^^a$$"), "^a$");
        assert_eq!(canonicalize(""), "^$");
    }

    #[test]
    fn test_malformed_patterns_are_only_anchored() {
        assert_eq!(canonicalize("a)|(b"), "^a)|(b$");
        assert_eq!(canonicalize("a|[b"), "^a|[b$");
    }

    #[test]
    fn test_idempotence() {
        for sample in SAMPLES {
            let once = canonicalize(sample);
            assert_eq!(canonicalize(&once), once, "not idempotent for {:?}", sample);
            assert!(is_canonical(&once));
        }
    }

    #[test]
    fn test_anchored_exactly_once() {
        for sample in SAMPLES.iter().filter(|s| !s.is_empty()) {
            let out = canonicalize(sample);
            assert!(out.starts_with('^') && !out.starts_with("^^"), "{:?} -> {:?}", sample, out);
            assert!(out.ends_with('$'), "{:?} -> {:?}", sample, out);
            assert!(!out[..out.len() - 1].ends_with('$') || out.ends_with("\\$$"), "{:?} -> {:?}", sample, out);
        }
    }
}

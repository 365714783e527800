//! Keyword de-collision table for data literals.
//!
//! Certain substrings inside string values (SQL verbs, browser
//! version-string fragments) trip up downstream loaders that re-tokenize
//! the data. They are replaced with deterministic de-collided spellings.
//! The substitutions apply only to literal contents; structural keywords
//! and identifiers are never touched.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed substitution table, applied in order as plain substring
/// replacement (the collisions occur mid-word in user-agent strings, so
/// no word boundary is wanted).
pub const KEYWORD_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("with", "w/"),
    ("about", "abt"),
    ("select", "sel"),
    ("insert", "ins"),
    ("update", "upd"),
    ("delete", "del"),
    ("create", "cr"),
    ("drop", "dr"),
    ("alter", "alt"),
];

// Browser user-agent fragments like `rv:11.0` read as dialect labels to
// some loaders; rewrite them to a plain `version` prefix.
static RE_RV: Lazy<Regex> = Lazy::new(|| Regex::new(r"\brv:(\d+\.\d+)").unwrap());
static RE_VERSION_COLON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bversion:(\d+\.\d+)").unwrap());

/// Apply the de-collision table to the decoded content of one string
/// literal.
pub fn decollide(content: &str) -> String {
    let mut result = RE_RV.replace_all(content, "version$1").into_owned();
    result = RE_VERSION_COLON
        .replace_all(&result, "version$1")
        .into_owned();
    for (needle, replacement) in KEYWORD_SUBSTITUTIONS {
        if result.contains(needle) {
            result = result.replace(needle, replacement);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rv_fragment() {
        assert_eq!(
            decollide("Mozilla/5.0 (Windows; rv:11.0) like Gecko"),
            "Mozilla/5.0 (Windows; version11.0) like Gecko"
        );
    }

    #[test]
    fn test_version_colon_fragment() {
        assert_eq!(decollide("app version:2.5 build"), "app version2.5 build");
    }

    #[test]
    fn test_sql_verbs() {
        assert_eq!(decollide("with milk"), "w/ milk");
        assert_eq!(decollide("select one"), "sel one");
    }

    #[test]
    fn test_untouched_content() {
        assert_eq!(decollide("plain text value"), "plain text value");
    }
}

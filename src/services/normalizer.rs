//! Name normalization: raw inventory text to a canonical (name, version).
//!
//! Canonicalization seeds the cache key, so two raw strings describing the
//! same product must normalize identically. Pure functions, no I/O.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::models::Query;

/// Architecture, bitness, and edition markers carrying no identity.
const NOISE_TOKENS: &[&str] = &[
    "x86", "x64", "x86_64", "x86-64", "amd64", "i386", "i586", "i686", "arm", "arm64", "aarch64",
    "armhf", "32-bit", "64-bit", "32bit", "64bit", "lts", "ltsc", "ltsb", "desktop", "workstation",
    "edition", "oem", "retail",
];

/// Words a version pattern may match that are never versions themselves.
const NON_VERSION_WORDS: &[&str] = &[
    "server", "enterprise", "professional", "standard", "datacenter", "community", "core", "home",
    "pro", "ultimate", "premium",
];

/// Trailing-token version patterns, most specific first so multi-part
/// versions are not truncated by the bare-integer pattern.
static VERSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Year-style: "2019", "2022"
        r"^(?:19|20)\d{2}$",
        // Dotted multi-segment, optional leading v: "3.11.2", "v1.2"
        r"^v?\d+(?:\.\d+)+$",
        // Bare integer: "14"
        r"^\d+$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("version pattern must compile"))
    .collect()
});

/// Canonicalize raw free text into a normalized query.
///
/// Lowercases, strips noise tokens, collapses whitespace, then attempts to
/// split one trailing version token. Worst case returns the cleaned input
/// with no version; idempotent once a version suffix has been stripped.
pub fn normalize(raw_text: &str) -> Query {
    let mut tokens: Vec<String> = raw_text
        .to_lowercase()
        .split_whitespace()
        .map(|token| token.trim_matches(|c| matches!(c, '(' | ')' | '[' | ']' | ',' | ';')).to_string())
        .filter(|token| !token.is_empty() && !NOISE_TOKENS.contains(&token.as_str()))
        .collect();

    let normalized_version = split_trailing_version(&mut tokens);

    Query {
        raw_text: raw_text.to_string(),
        normalized_name: tokens.join(" "),
        normalized_version,
    }
}

/// Pop the last token when it reads as a version and at least one name token
/// remains. Known non-version words stay part of the name even when a
/// pattern matches, so edition qualifiers are never misread as versions.
fn split_trailing_version(tokens: &mut Vec<String>) -> Option<String> {
    if tokens.len() < 2 {
        return None;
    }
    let last = tokens.last()?;
    if NON_VERSION_WORDS.contains(&last.as_str()) {
        return None;
    }
    if !VERSION_PATTERNS.iter().any(|pattern| pattern.is_match(last)) {
        return None;
    }
    let version = tokens.pop()?;
    Some(version.trim_start_matches('v').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_noise_and_splits_version() {
        let query = normalize("Ubuntu 22.04 LTS Desktop (64-bit)");
        assert_eq!(query.normalized_name, "ubuntu");
        assert_eq!(query.normalized_version.as_deref(), Some("22.04"));
    }

    #[test]
    fn test_year_style_version() {
        let query = normalize("Windows Server 2019");
        assert_eq!(query.normalized_name, "windows server");
        assert_eq!(query.normalized_version.as_deref(), Some("2019"));
    }

    #[test]
    fn test_bare_integer_version() {
        let query = normalize("PostgreSQL 14");
        assert_eq!(query.normalized_name, "postgresql");
        assert_eq!(query.normalized_version.as_deref(), Some("14"));
    }

    #[test]
    fn test_dotted_version_not_truncated() {
        let query = normalize("Python 3.11.2");
        assert_eq!(query.normalized_name, "python");
        assert_eq!(query.normalized_version.as_deref(), Some("3.11.2"));
    }

    #[test]
    fn test_leading_v_dropped() {
        let query = normalize("node v18.19.0");
        assert_eq!(query.normalized_version.as_deref(), Some("18.19.0"));
    }

    #[test]
    fn test_non_version_word_stays_in_name() {
        let query = normalize("SQL Server Enterprise");
        assert_eq!(query.normalized_name, "sql server enterprise");
        assert_eq!(query.normalized_version, None);
    }

    #[test]
    fn test_lone_version_token_is_kept_as_name() {
        // Never split the only remaining token
        let query = normalize("2019");
        assert_eq!(query.normalized_name, "2019");
        assert_eq!(query.normalized_version, None);
    }

    #[test]
    fn test_whitespace_collapse() {
        let query = normalize("  debian   12  ");
        assert_eq!(query.normalized_name, "debian");
        assert_eq!(query.normalized_version.as_deref(), Some("12"));
    }

    #[test]
    fn test_empty_input() {
        let query = normalize("   ");
        assert_eq!(query.normalized_name, "");
        assert_eq!(query.normalized_version, None);
    }

    #[test]
    fn test_hyphenated_product_name_survives() {
        let query = normalize("7-zip 19.00");
        assert_eq!(query.normalized_name, "7-zip");
        assert_eq!(query.normalized_version.as_deref(), Some("19.00"));
    }

    proptest! {
        // Once a version suffix has been stripped, normalizing the resulting
        // name changes nothing.
        #[test]
        fn prop_normalize_idempotent_after_split(
            name in r"[a-z][a-z\-]{1,12}( [a-z][a-z\-]{1,12}){0,2}",
            version in proptest::option::of(r"(19|20)[0-9]{2}|[0-9]{1,3}(\.[0-9]{1,3}){1,2}|[0-9]{1,3}"),
        ) {
            let raw = match &version {
                Some(v) => format!("{name} {v}"),
                None => name.clone(),
            };
            let first = normalize(&raw);
            let second = normalize(&first.normalized_name);
            prop_assert_eq!(&second.normalized_name, &first.normalized_name);
            prop_assert_eq!(second.normalized_version, None);
        }
    }
}

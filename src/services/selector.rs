//! Agent selection: normalized name to an ordered subset of sources.

/// Identity of the generic fallback source, always selected last.
pub const FALLBACK_SOURCE_ID: &str = "endoflife";

/// One row of the dispatch table: any keyword substring selects the source.
#[derive(Debug, Clone)]
pub struct SelectorRule {
    /// Case-insensitive substrings matched against the normalized name.
    pub keywords: &'static [&'static str],
    /// Source selected when a keyword matches.
    pub source_id: &'static str,
}

/// Maps a normalized name to a deterministic, ordered source-id list.
///
/// Rules are evaluated in table order and matching is order-preserving, so
/// the selection fixes the dispatcher's tie-break order: specialized sources
/// come before the unconditional generic fallback.
#[derive(Debug, Clone)]
pub struct AgentSelector {
    rules: Vec<SelectorRule>,
}

impl AgentSelector {
    /// Build a selector from an explicit rule table.
    pub fn new(rules: Vec<SelectorRule>) -> Self {
        Self { rules }
    }

    /// The built-in vendor rule table.
    pub fn with_default_rules() -> Self {
        Self::new(vec![
            SelectorRule {
                keywords: &["ubuntu", "canonical"],
                source_id: "canonical",
            },
            SelectorRule {
                keywords: &["windows", "microsoft", "sql server", "exchange", "sharepoint", "office"],
                source_id: "microsoft",
            },
            SelectorRule {
                keywords: &["rhel", "red hat", "centos", "almalinux", "rocky"],
                source_id: "redhat",
            },
            SelectorRule {
                keywords: &["debian"],
                source_id: "debian",
            },
            SelectorRule {
                keywords: &["python", "node", "java", "php", "ruby", "dotnet", ".net", "postgres", "mysql"],
                source_id: "runtimes",
            },
        ])
    }

    /// Ordered source ids for a normalized name; never empty.
    pub fn select(&self, normalized_name: &str) -> Vec<String> {
        let name = normalized_name.to_lowercase();
        let mut selected: Vec<String> = self
            .rules
            .iter()
            .filter(|rule| rule.keywords.iter().any(|keyword| name.contains(keyword)))
            .map(|rule| rule.source_id.to_string())
            .collect();
        if !selected.iter().any(|id| id == FALLBACK_SOURCE_ID) {
            selected.push(FALLBACK_SOURCE_ID.to_string());
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ubuntu_selects_canonical_plus_fallback_only() {
        let selector = AgentSelector::with_default_rules();
        let selected = selector.select("ubuntu");
        assert_eq!(selected, vec!["canonical".to_string(), FALLBACK_SOURCE_ID.to_string()]);
        assert!(!selected.contains(&"microsoft".to_string()));
    }

    #[test]
    fn test_unknown_name_gets_fallback_only() {
        let selector = AgentSelector::with_default_rules();
        assert_eq!(selector.select("ghostware"), vec![FALLBACK_SOURCE_ID.to_string()]);
    }

    #[test]
    fn test_selection_preserves_table_order() {
        let selector = AgentSelector::new(vec![
            SelectorRule { keywords: &["b"], source_id: "second" },
            SelectorRule { keywords: &["a"], source_id: "first" },
        ]);
        // Both rules match; table order wins, fallback appended last
        assert_eq!(
            selector.select("ab"),
            vec!["second".to_string(), "first".to_string(), FALLBACK_SOURCE_ID.to_string()]
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let selector = AgentSelector::with_default_rules();
        let selected = selector.select("Red Hat Enterprise Linux");
        assert_eq!(selected[0], "redhat");
    }

    #[test]
    fn test_multi_word_keyword() {
        let selector = AgentSelector::with_default_rules();
        let selected = selector.select("sql server 2019");
        assert_eq!(selected[0], "microsoft");
    }
}

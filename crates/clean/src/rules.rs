use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Record fields the cleaner may touch. A closed set keeps rule
/// configurations validated at parse time instead of failing at use time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ApplicantName,
    Purpose,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::ApplicantName, Field::Purpose];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::ApplicantName => write!(f, "applicant_name"),
            Field::Purpose => write!(f, "purpose"),
        }
    }
}

/// One entry in a per-field rule list: a bare string (substring deletion), a
/// pattern table, or a nested list of entries flattened at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleEntry {
    Literal(String),
    Pattern(PatternRule),
    Group(Vec<RuleEntry>),
}

/// Regex substitution rule. Patterns compile case-insensitive unless
/// `case_sensitive` is set. `repl` and `transform` templates accept
/// `\1`-style backreferences.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternRule {
    pub pattern: String,
    #[serde(default)]
    pub repl: String,
    #[serde(default)]
    pub case_sensitive: bool,
    /// On match, expand the capture groups into a template and queue the
    /// result as a write to another field.
    #[serde(default)]
    pub transform: BTreeMap<Field, String>,
}

/// Ordered rule lists keyed by field, as read from configuration.
pub type RuleSet = BTreeMap<Field, Vec<RuleEntry>>;

/// Finalizer settings keyed by field.
pub type FinalizerSet = BTreeMap<Field, FinalizerRule>;

/// Post-processing applied around the main rules: auto-capitalization before
/// them, whitespace stripping after. Both default on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinalizerRule {
    pub capitalize: bool,
    pub strip: bool,
}

impl Default for FinalizerRule {
    fn default() -> Self {
        FinalizerRule {
            capitalize: true,
            strip: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literal_pattern_and_nested_entries() {
        let toml = r#"
            purpose = [
                "GIROCARD",
                { pattern = "\\s+", repl = " " },
                ["SEPA", { pattern = "Lastschrift", case_sensitive = true }],
            ]
        "#;
        let rules: RuleSet = toml::from_str(toml).unwrap();
        let entries = &rules[&Field::Purpose];
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], RuleEntry::Literal("GIROCARD".to_string()));
        assert!(matches!(entries[1], RuleEntry::Pattern(_)));
        assert!(matches!(&entries[2], RuleEntry::Group(inner) if inner.len() == 2));
    }

    #[test]
    fn pattern_defaults() {
        let toml = r#"pattern = "foo""#;
        let rule: PatternRule = toml::from_str(toml).unwrap();
        assert_eq!(rule.repl, "");
        assert!(!rule.case_sensitive);
        assert!(rule.transform.is_empty());
    }

    #[test]
    fn pattern_with_transform_targets() {
        let toml = r#"
            pattern = "REF:(\\d+)"
            transform = { applicant_name = "Ref \\1" }
        "#;
        let rule: PatternRule = toml::from_str(toml).unwrap();
        assert_eq!(rule.transform[&Field::ApplicantName], "Ref \\1");
    }

    #[test]
    fn unknown_rule_keys_are_rejected() {
        let toml = r#"
            purpose = [{ pattern = "x", replacement = "y" }]
        "#;
        assert!(toml::from_str::<RuleSet>(toml).is_err());
    }

    #[test]
    fn unknown_field_names_are_rejected() {
        let toml = r#"
            merchant = ["x"]
        "#;
        assert!(toml::from_str::<RuleSet>(toml).is_err());
    }

    #[test]
    fn finalizer_defaults_on() {
        let rule: FinalizerRule = toml::from_str("").unwrap();
        assert!(rule.capitalize);
        assert!(rule.strip);

        let rule: FinalizerRule = toml::from_str("capitalize = false").unwrap();
        assert!(!rule.capitalize);
        assert!(rule.strip);
    }
}

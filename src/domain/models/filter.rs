//! Match rules for the relay's block-lists.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a [`MatchRule`] compares its pattern against a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Value contains the pattern.
    #[default]
    Contains,
    /// Value equals the pattern.
    Exact,
    /// Pattern is a regular expression.
    Regex,
}

/// A single block-list entry.
///
/// In configuration a rule may be written as a bare string, which is a
/// case-insensitive `contains` rule, or as a table:
///
/// ```yaml
/// - "geo sp"
/// - { pattern: "^CDD\\b", kind: regex, case_sensitive: true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RuleRepr")]
pub struct MatchRule {
    /// Text or regular expression to look for.
    pub pattern: String,
    /// Comparison mode.
    #[serde(default)]
    pub kind: MatchKind,
    /// Compare with case. Defaults to case-insensitive.
    #[serde(default)]
    pub case_sensitive: bool,
}

impl MatchRule {
    /// Case-insensitive `contains` rule.
    pub fn contains(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            kind: MatchKind::Contains,
            case_sensitive: false,
        }
    }

    /// Case-insensitive `exact` rule.
    pub fn exact(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            kind: MatchKind::Exact,
            case_sensitive: false,
        }
    }

    /// Regular-expression rule.
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            kind: MatchKind::Regex,
            case_sensitive: false,
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            MatchKind::Contains => "contains",
            MatchKind::Exact => "exact",
            MatchKind::Regex => "regex",
        };
        write!(f, "{kind}:{}", self.pattern)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleRepr {
    Bare(String),
    Full {
        pattern: String,
        #[serde(default)]
        kind: MatchKind,
        #[serde(default)]
        case_sensitive: bool,
    },
}

impl From<RuleRepr> for MatchRule {
    fn from(repr: RuleRepr) -> Self {
        match repr {
            RuleRepr::Bare(pattern) => Self::contains(pattern),
            RuleRepr::Full {
                pattern,
                kind,
                case_sensitive,
            } => Self {
                pattern,
                kind,
                case_sensitive,
            },
        }
    }
}

/// Which fields the GEO block-list inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoTarget {
    /// The resolved task title.
    #[default]
    Title,
    /// Each task tag.
    Tags,
    /// Title and tags.
    TitleAndTags,
}

impl GeoTarget {
    /// Whether the title is inspected.
    pub const fn includes_title(self) -> bool {
        matches!(self, Self::Title | Self::TitleAndTags)
    }

    /// Whether tags are inspected.
    pub const fn includes_tags(self) -> bool {
        matches!(self, Self::Tags | Self::TitleAndTags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_from_bare_string() {
        let rules: Vec<MatchRule> =
            serde_yaml::from_str("- geo sp\n- pattern: CDD\n  kind: exact\n  case_sensitive: true\n")
                .unwrap();
        assert_eq!(rules[0], MatchRule::contains("geo sp"));
        assert_eq!(rules[1].kind, MatchKind::Exact);
        assert!(rules[1].case_sensitive);
    }

    #[test]
    fn test_geo_target_parsing() {
        let target: GeoTarget = serde_yaml::from_str("title_and_tags").unwrap();
        assert!(target.includes_title());
        assert!(target.includes_tags());
        assert!(!GeoTarget::Tags.includes_title());
    }
}

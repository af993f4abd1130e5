//! Event filtering.
//!
//! Block-lists come from configuration as [`MatchRule`]s and are compiled
//! once. [`FilterEngine::evaluate`] returns the first reason an event should
//! be ignored, if any.

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::domain::models::{FilterConfig, GeoTarget, InboundEvent, MatchKind, MatchRule};

/// Why an event was ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IgnoreReason {
    /// A GEO rule matched the title or a tag.
    GeoBlocked {
        /// Rule that matched.
        rule: String,
    },
    /// An author rule matched.
    AuthorBlocked {
        /// Rule that matched.
        rule: String,
    },
    /// Comment without a title, with suppression enabled.
    UntitledComment,
}

impl IgnoreReason {
    /// Machine-readable reason code returned to the webhook source.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::GeoBlocked { .. } => "geo_blocked",
            Self::AuthorBlocked { .. } => "author_blocked",
            Self::UntitledComment => "untitled_comment",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> String {
        match self {
            Self::GeoBlocked { rule } => format!("GEO blocked by rule {rule}"),
            Self::AuthorBlocked { rule } => format!("author blocked by rule {rule}"),
            Self::UntitledComment => "comment without a task title".to_string(),
        }
    }
}

/// Error compiling a regex rule.
#[derive(Debug, thiserror::Error)]
#[error("invalid regex rule '{pattern}': {source}")]
pub struct RuleError {
    /// Offending pattern.
    pub pattern: String,
    /// Regex compile error.
    #[source]
    pub source: regex::Error,
}

#[derive(Debug, Clone)]
enum Matcher {
    Contains(String),
    Exact(String),
    Regex(Regex),
}

/// A [`MatchRule`] ready to be applied.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: MatchRule,
    matcher: Matcher,
}

impl CompiledRule {
    /// Compile `rule`.
    pub fn compile(rule: &MatchRule) -> Result<Self, RuleError> {
        let fold = |s: &str| {
            if rule.case_sensitive {
                s.to_string()
            } else {
                s.to_lowercase()
            }
        };
        let matcher = match rule.kind {
            MatchKind::Contains => Matcher::Contains(fold(&rule.pattern)),
            MatchKind::Exact => Matcher::Exact(fold(rule.pattern.trim())),
            MatchKind::Regex => Matcher::Regex(
                RegexBuilder::new(&rule.pattern)
                    .case_insensitive(!rule.case_sensitive)
                    .build()
                    .map_err(|source| RuleError {
                        pattern: rule.pattern.clone(),
                        source,
                    })?,
            ),
        };
        Ok(Self {
            rule: rule.clone(),
            matcher,
        })
    }

    /// Whether `value` matches.
    pub fn matches(&self, value: &str) -> bool {
        let folded = if self.rule.case_sensitive {
            value.to_string()
        } else {
            value.to_lowercase()
        };
        match &self.matcher {
            Matcher::Contains(pattern) => !pattern.is_empty() && folded.contains(pattern.as_str()),
            Matcher::Exact(pattern) => folded.trim() == pattern,
            Matcher::Regex(regex) => regex.is_match(value),
        }
    }

    /// The source rule.
    pub const fn rule(&self) -> &MatchRule {
        &self.rule
    }
}

fn compile_all(rules: &[MatchRule]) -> Result<Vec<CompiledRule>, RuleError> {
    rules.iter().map(CompiledRule::compile).collect()
}

/// Applies the configured block-lists.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    geo_target: GeoTarget,
    geo_rules: Vec<CompiledRule>,
    author_rules: Vec<CompiledRule>,
    suppress_untitled_comments: bool,
}

impl FilterEngine {
    /// Compile the configured rules.
    pub fn new(config: &FilterConfig) -> Result<Self, RuleError> {
        Ok(Self {
            geo_target: config.geo_target,
            geo_rules: compile_all(&config.blocked_geo)?,
            author_rules: compile_all(&config.blocked_authors)?,
            suppress_untitled_comments: config.suppress_untitled_comments,
        })
    }

    /// First reason to ignore `event`, whose resolved title is `title`.
    pub fn evaluate(&self, event: &InboundEvent, title: &str) -> Option<IgnoreReason> {
        if let Some(rule) = self.geo_match(event, title) {
            return Some(IgnoreReason::GeoBlocked {
                rule: rule.rule().to_string(),
            });
        }

        if let Some(author) = event.author.as_deref() {
            if let Some(rule) = self.author_rules.iter().find(|rule| rule.matches(author)) {
                return Some(IgnoreReason::AuthorBlocked {
                    rule: rule.rule().to_string(),
                });
            }
        }

        let is_comment = event.kind.as_ref().is_some_and(|kind| kind.is_comment());
        if self.suppress_untitled_comments && is_comment && event.raw_title.is_none() {
            return Some(IgnoreReason::UntitledComment);
        }

        None
    }

    fn geo_match(&self, event: &InboundEvent, title: &str) -> Option<&CompiledRule> {
        self.geo_rules.iter().find(|rule| {
            (self.geo_target.includes_title() && rule.matches(title))
                || (self.geo_target.includes_tags() && event.tags.iter().any(|tag| rule.matches(tag)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::EventKind;
    use proptest::prelude::*;

    fn historical_config() -> FilterConfig {
        FilterConfig {
            geo_target: GeoTarget::Title,
            blocked_geo: ["geo co", "geo sp", "geo mg", "cdd"]
                .into_iter()
                .map(MatchRule::contains)
                .collect(),
            blocked_authors: vec![MatchRule::contains("(printa)")],
            suppress_untitled_comments: false,
        }
    }

    fn event_with(author: Option<&str>, tags: &[&str]) -> InboundEvent {
        InboundEvent {
            kind: Some(EventKind::UpdateTask),
            author: author.map(str::to_string),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            ..InboundEvent::default()
        }
    }

    #[test]
    fn test_geo_in_title_is_blocked_case_insensitively() {
        let engine = FilterEngine::new(&historical_config()).unwrap();
        let reason = engine.evaluate(&event_with(None, &[]), "Cardápio GEO SP - Verão");
        assert_eq!(
            reason,
            Some(IgnoreReason::GeoBlocked {
                rule: "contains:geo sp".to_string()
            })
        );
        assert_eq!(reason.unwrap().code(), "geo_blocked");
        assert_eq!(engine.evaluate(&event_with(None, &[]), "Cardápio GEO RJ"), None);
    }

    #[test]
    fn test_geo_target_controls_inspected_fields() {
        let mut config = historical_config();
        let event = event_with(None, &["GEO MG"]);

        let engine = FilterEngine::new(&config).unwrap();
        assert_eq!(engine.evaluate(&event, "Banner"), None, "tags ignored when target is title");

        config.geo_target = GeoTarget::Tags;
        let engine = FilterEngine::new(&config).unwrap();
        assert!(engine.evaluate(&event, "Banner").is_some());
        assert_eq!(engine.evaluate(&event_with(None, &[]), "Banner GEO MG"), None);

        config.geo_target = GeoTarget::TitleAndTags;
        let engine = FilterEngine::new(&config).unwrap();
        assert!(engine.evaluate(&event, "Banner").is_some());
        assert!(engine.evaluate(&event_with(None, &[]), "Banner GEO MG").is_some());
    }

    #[test]
    fn test_author_rules() {
        let engine = FilterEngine::new(&historical_config()).unwrap();
        let reason = engine.evaluate(
            &event_with(Some("Designer/Gráfica - Caio Otto (Printa)"), &[]),
            "Banner",
        );
        assert_eq!(reason.map(|r| r.code()), Some("author_blocked"));
        assert_eq!(engine.evaluate(&event_with(Some("Ana"), &[]), "Banner"), None);
    }

    #[test]
    fn test_exact_and_regex_rules() {
        let config = FilterConfig {
            blocked_authors: vec![
                MatchRule::exact("Designer - Thaynara Moreira"),
                MatchRule {
                    pattern: r"^bot\b".to_string(),
                    kind: MatchKind::Regex,
                    case_sensitive: true,
                },
            ],
            ..FilterConfig::default()
        };
        let engine = FilterEngine::new(&config).unwrap();
        assert!(engine
            .evaluate(&event_with(Some("designer - thaynara moreira"), &[]), "T")
            .is_some());
        assert_eq!(
            engine.evaluate(&event_with(Some("Designer - Thaynara Moreira Jr"), &[]), "T"),
            None
        );
        assert!(engine.evaluate(&event_with(Some("bot sync"), &[]), "T").is_some());
        assert_eq!(engine.evaluate(&event_with(Some("Bot sync"), &[]), "T"), None);
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let config = FilterConfig {
            blocked_geo: vec![MatchRule::regex("(unclosed")],
            ..FilterConfig::default()
        };
        let err = FilterEngine::new(&config).unwrap_err();
        assert_eq!(err.pattern, "(unclosed");
    }

    #[test]
    fn test_untitled_comment_suppression() {
        let mut config = FilterConfig::default();
        let comment = InboundEvent {
            kind: Some(EventKind::NewTaskComment),
            ..InboundEvent::default()
        };

        let engine = FilterEngine::new(&config).unwrap();
        assert_eq!(engine.evaluate(&comment, "Task #1"), None);

        config.suppress_untitled_comments = true;
        let engine = FilterEngine::new(&config).unwrap();
        assert_eq!(engine.evaluate(&comment, "Task #1"), Some(IgnoreReason::UntitledComment));

        let titled = InboundEvent {
            raw_title: Some("Banner".to_string()),
            ..comment
        };
        assert_eq!(engine.evaluate(&titled, "Banner"), None);
    }

    proptest! {
        #[test]
        fn empty_rule_set_never_blocks(title in ".*", author in proptest::option::of(".*")) {
            let engine = FilterEngine::new(&FilterConfig::default()).unwrap();
            let event = InboundEvent { author, ..InboundEvent::default() };
            prop_assert_eq!(engine.evaluate(&event, &title), None);
        }

        #[test]
        fn contains_rule_matches_any_casing(prefix in "[a-z ]{0,8}", suffix in "[a-z ]{0,8}") {
            let engine = FilterEngine::new(&historical_config()).unwrap();
            let title = format!("{prefix}GeO Sp{suffix}");
            prop_assert!(engine.evaluate(&event_with(None, &[]), &title).is_some());
        }
    }
}

//! Match modes and match-rule validation.
//!
//! A [`MatchRule`] pairs a [`MatchMode`] with case sensitivity. Rules requested by a
//! caller are normalized against the pattern text with [`MatchRule::validate`] before
//! any name is compiled, so that e.g. `Foo*` requested as an exact match becomes a
//! wildcard match.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a name in a pattern is compared against names found in an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The whole name must be equal.
    #[default]
    Exact,
    /// The pattern must be a prefix of the name.
    Prefix,
    /// `*` matches any run of characters, `?` exactly one.
    #[serde(alias = "pattern", alias = "wildcard")]
    WildcardPattern,
    /// Upper-case humps of the pattern select humps of the name (`NPE` matches
    /// `NullPointerException`).
    CamelCase,
    /// Like [`MatchMode::CamelCase`], but the name must have exactly as many humps.
    CamelCaseSamePartCount,
    /// The pattern is a regular expression that must match the whole name.
    Regex,
}

impl MatchMode {
    /// Human-readable label used when printing patterns.
    pub fn label(self) -> &'static str {
        match self {
            Self::Exact => "exact match",
            Self::Prefix => "prefix match",
            Self::WildcardPattern => "pattern match",
            Self::CamelCase => "camel case match",
            Self::CamelCaseSamePartCount => "camel case same part count match",
            Self::Regex => "regexp match",
        }
    }
}

/// A match mode plus case sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchRule {
    /// How names are compared.
    pub mode: MatchMode,
    /// Whether comparisons respect case.
    pub case_sensitive: bool,
}

impl Default for MatchRule {
    fn default() -> Self {
        Self::exact()
    }
}

impl MatchRule {
    /// Creates a rule from a mode and case sensitivity.
    pub const fn new(mode: MatchMode, case_sensitive: bool) -> Self {
        Self {
            mode,
            case_sensitive,
        }
    }

    /// Case-sensitive exact matching.
    pub const fn exact() -> Self {
        Self::new(MatchMode::Exact, true)
    }

    /// Normalizes this rule against the text it will be applied to.
    ///
    /// Rules are checked in order:
    /// 1. Regular expressions are kept as requested.
    /// 2. Text containing `*` or `?` forces [`MatchMode::WildcardPattern`]; a wildcard rule
    ///    on text without wildcard characters falls back to [`MatchMode::Exact`].
    /// 3. A camel-case rule on text that cannot be a camel-case pattern becomes
    ///    [`MatchMode::Prefix`]; the same-part-count variant becomes [`MatchMode::Exact`].
    ///
    /// `None` text (match anything) leaves the rule untouched.
    pub fn validate(self, text: Option<&str>) -> Self {
        let Some(text) = text else {
            return self;
        };
        if self.mode == MatchMode::Regex {
            return self;
        }

        let has_wildcards = text.contains(['*', '?']);
        let mode = match self.mode {
            _ if has_wildcards => MatchMode::WildcardPattern,
            MatchMode::WildcardPattern => MatchMode::Exact,
            MatchMode::CamelCase if !is_valid_camel_case(text) => MatchMode::Prefix,
            MatchMode::CamelCaseSamePartCount if !is_valid_camel_case(text) => MatchMode::Exact,
            mode => mode,
        };
        Self::new(mode, self.case_sensitive)
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let case = if self.case_sensitive {
            "case sensitive"
        } else {
            "case insensitive"
        };
        write!(f, "{}, {case}", self.mode.label())
    }
}

/// Returns true when a character may start an identifier.
pub(crate) fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

/// Returns true when a character may continue an identifier.
pub(crate) fn is_identifier_part(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_numeric()
}

/// Checks whether `text` can be used as a camel-case pattern.
///
/// The text must be a valid identifier. A pattern starting with a lower-case letter needs
/// at least one upper-case letter; otherwise at least two are needed, since a single
/// leading capital is just a prefix.
pub fn is_valid_camel_case(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !is_identifier_start(first) || !chars.clone().all(is_identifier_part) {
        return false;
    }

    let uppercase = text.chars().filter(|c| c.is_uppercase()).count();
    if first.is_uppercase() {
        uppercase > 1
    } else {
        uppercase > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_characters_force_pattern_mode() {
        let rule = MatchRule::exact().validate(Some("Foo*"));
        assert_eq!(rule.mode, MatchMode::WildcardPattern);

        let rule = MatchRule::new(MatchMode::CamelCase, false).validate(Some("N?E"));
        assert_eq!(rule.mode, MatchMode::WildcardPattern);
        assert!(!rule.case_sensitive);
    }

    #[test]
    fn wildcard_rule_without_wildcards_becomes_exact() {
        let rule = MatchRule::new(MatchMode::WildcardPattern, true).validate(Some("Foo"));
        assert_eq!(rule.mode, MatchMode::Exact);
    }

    #[test]
    fn invalid_camel_case_degrades() {
        let rule = MatchRule::new(MatchMode::CamelCase, true).validate(Some("Foo"));
        assert_eq!(rule.mode, MatchMode::Prefix);

        let rule = MatchRule::new(MatchMode::CamelCaseSamePartCount, true).validate(Some("foo"));
        assert_eq!(rule.mode, MatchMode::Exact);

        let rule = MatchRule::new(MatchMode::CamelCase, true).validate(Some("NPE"));
        assert_eq!(rule.mode, MatchMode::CamelCase);
    }

    #[test]
    fn regex_and_missing_text_are_untouched() {
        let rule = MatchRule::new(MatchMode::Regex, true).validate(Some("Foo.*"));
        assert_eq!(rule.mode, MatchMode::Regex);

        let rule = MatchRule::new(MatchMode::WildcardPattern, true).validate(None);
        assert_eq!(rule.mode, MatchMode::WildcardPattern);
    }

    #[test]
    fn camel_case_validity() {
        assert!(is_valid_camel_case("NPE"));
        assert!(is_valid_camel_case("getFoo"));
        assert!(is_valid_camel_case("HashME"));
        assert!(!is_valid_camel_case("Hash"));
        assert!(!is_valid_camel_case("hash"));
        assert!(!is_valid_camel_case("java.util"));
        assert!(!is_valid_camel_case(""));
    }

    #[test]
    fn rule_display() {
        assert_eq!(MatchRule::exact().to_string(), "exact match, case sensitive");
        assert_eq!(
            MatchRule::new(MatchMode::Prefix, false).to_string(),
            "prefix match, case insensitive"
        );
    }
}

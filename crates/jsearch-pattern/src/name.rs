//! Name matching under a match rule.
//!
//! A [`NamePattern`] is compiled once when a pattern is built and then applied to every
//! candidate name decoded from an index, so wildcard and regex compilation never happens
//! on the hot path.

use globset::{GlobBuilder, GlobMatcher};
use regex::{Regex, RegexBuilder};

use crate::{
    PatternError,
    mode::{MatchMode, MatchRule, is_identifier_part},
};

/// Compiled matcher behind a [`NamePattern`].
#[derive(Debug, Clone)]
enum Matcher {
    /// Whole-name equality.
    Exact,
    /// Prefix comparison.
    Prefix,
    /// `*`/`?` wildcards, compiled to a glob.
    Wildcard(GlobMatcher),
    /// Camel-case hump matching.
    CamelCase {
        /// Whether the name must have the same number of humps.
        same_part_count: bool,
    },
    /// Anchored regular expression.
    Regex(Regex),
}

/// A single name pattern compiled under a validated match rule.
#[derive(Debug, Clone)]
pub struct NamePattern {
    /// The pattern text as given.
    text: String,
    /// The validated rule this pattern was compiled with.
    rule: MatchRule,
    /// The compiled matcher.
    matcher: Matcher,
}

impl NamePattern {
    /// Compiles `text` under `rule`, validating the rule against the text first.
    pub fn compile(text: &str, rule: MatchRule) -> Result<Self, PatternError> {
        let rule = rule.validate(Some(text));
        let matcher = match rule.mode {
            MatchMode::Exact => Matcher::Exact,
            MatchMode::Prefix => Matcher::Prefix,
            MatchMode::WildcardPattern => Matcher::Wildcard(compile_wildcard(text, rule)?),
            MatchMode::CamelCase => Matcher::CamelCase {
                same_part_count: false,
            },
            MatchMode::CamelCaseSamePartCount => Matcher::CamelCase {
                same_part_count: true,
            },
            MatchMode::Regex => Matcher::Regex(compile_regex(text, rule)?),
        };

        Ok(Self {
            text: text.to_string(),
            rule,
            matcher,
        })
    }

    /// Returns the pattern text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the validated rule this pattern uses.
    pub fn rule(&self) -> MatchRule {
        self.rule
    }

    /// Checks whether `name` matches this pattern.
    pub fn is_match(&self, name: &str) -> bool {
        let case_sensitive = self.rule.case_sensitive;
        let pattern = self.text.as_str();
        if pattern.is_empty() && self.rule.mode == MatchMode::Prefix {
            return true;
        }
        let first_char_matches = !case_sensitive
            || pattern.is_empty()
            || pattern.chars().next() == name.chars().next();

        match &self.matcher {
            Matcher::Exact => first_char_matches && equals(pattern, name, case_sensitive),
            Matcher::Prefix => first_char_matches && starts_with(name, pattern, case_sensitive),
            Matcher::Wildcard(glob) => glob.is_match(name),
            Matcher::CamelCase { same_part_count } => {
                if !first_char_matches {
                    return false;
                }
                camel_case_match(pattern, name, *same_part_count)
                    || (!same_part_count && !case_sensitive && starts_with(name, pattern, false))
            }
            Matcher::Regex(regex) => regex.is_match(name),
        }
    }

    /// Returns the literal prefix every matching name must start with, if any.
    ///
    /// Used to degrade camel-case and prefix queries to a prefix lookup on the index.
    pub fn literal_prefix(&self) -> Option<&str> {
        match self.matcher {
            Matcher::Exact | Matcher::Prefix => Some(&self.text),
            Matcher::CamelCase { .. } => {
                let end = self
                    .text
                    .char_indices()
                    .skip(1)
                    .find(|(_, c)| c.is_uppercase() || c.is_numeric())
                    .map_or(self.text.len(), |(i, _)| i);
                Some(&self.text[..end])
            }
            Matcher::Wildcard(_) | Matcher::Regex(_) => None,
        }
    }
}

/// Optional name pattern match, where `None` stands for "match anything".
pub fn matches_name(pattern: Option<&NamePattern>, name: &str) -> bool {
    pattern.is_none_or(|p| p.is_match(name))
}

/// Compares two names, optionally ignoring case.
fn equals(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.chars()
            .flat_map(char::to_lowercase)
            .eq(b.chars().flat_map(char::to_lowercase))
    }
}

/// Checks that `name` starts with `prefix`, optionally ignoring case.
fn starts_with(name: &str, prefix: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        return name.starts_with(prefix);
    }
    let mut name_chars = name.chars().flat_map(char::to_lowercase);
    prefix
        .chars()
        .flat_map(char::to_lowercase)
        .all(|p| name_chars.next() == Some(p))
}

/// Compiles wildcard text into a glob, escaping every glob metacharacter except `*`/`?`.
fn compile_wildcard(text: &str, rule: MatchRule) -> Result<GlobMatcher, PatternError> {
    let mut glob = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '[' | ']' | '{' | '}' | '\\' => {
                glob.push('[');
                glob.push(ch);
                glob.push(']');
            }
            _ => glob.push(ch),
        }
    }

    GlobBuilder::new(&glob)
        .case_insensitive(!rule.case_sensitive)
        .literal_separator(false)
        .backslash_escape(false)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|source| PatternError::InvalidWildcard {
            pattern: text.to_string(),
            source,
        })
}

/// Compiles a regex anchored on both ends.
fn compile_regex(text: &str, rule: MatchRule) -> Result<Regex, PatternError> {
    RegexBuilder::new(&format!("^(?:{text})$"))
        .case_insensitive(!rule.case_sensitive)
        .build()
        .map_err(|source| PatternError::InvalidRegex {
            pattern: text.to_string(),
            source,
        })
}

/// Returns true for characters that continue a hump (lower-case letters, `_`, `$`).
fn continues_hump(ch: char) -> bool {
    is_identifier_part(ch) && !ch.is_uppercase() && !ch.is_numeric()
}

/// Camel-case comparison of `pattern` against `name`.
///
/// The first characters must be equal. Afterwards pattern characters that equal the
/// current name character are consumed together; an upper-case or digit pattern
/// character skips lower-case name characters up to the next matching hump. With
/// `same_part_count`, the name may not have humps left once the pattern is exhausted.
pub fn camel_case_match(pattern: &str, name: &str, same_part_count: bool) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (Some(first_pattern), Some(first_name)) = (pattern.first(), name.first()) else {
        return pattern.is_empty();
    };
    if first_pattern != first_name {
        return false;
    }

    let mut ip = 0;
    let mut iname = 0;
    loop {
        ip += 1;
        iname += 1;

        if ip == pattern.len() {
            return !same_part_count || name[iname..].iter().all(|&c| continues_hump(c));
        }
        if iname == name.len() {
            return false;
        }

        let pattern_char = pattern[ip];
        if pattern_char == name[iname] {
            continue;
        }
        if continues_hump(pattern_char) {
            return false;
        }

        // The pattern is at a hump: skip ahead to the matching hump in the name.
        loop {
            let Some(&name_char) = name.get(iname) else {
                return false;
            };
            if continues_hump(name_char) {
                iname += 1;
            } else if name_char.is_numeric() {
                if pattern_char == name_char {
                    break;
                }
                iname += 1;
            } else if pattern_char != name_char {
                return false;
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(text: &str, mode: MatchMode, case_sensitive: bool) -> NamePattern {
        NamePattern::compile(text, MatchRule::new(mode, case_sensitive)).unwrap()
    }

    #[test]
    fn exact_and_prefix() {
        let exact = compile("Foo", MatchMode::Exact, true);
        assert!(exact.is_match("Foo"));
        assert!(!exact.is_match("foo"));
        assert!(!exact.is_match("FooBar"));

        let insensitive = compile("foo", MatchMode::Exact, false);
        assert!(insensitive.is_match("FOO"));

        let prefix = compile("Fo", MatchMode::Prefix, true);
        assert!(prefix.is_match("Foo"));
        assert!(!prefix.is_match("Bar"));
        assert!(compile("", MatchMode::Prefix, true).is_match("Anything"));
    }

    #[test]
    fn wildcard_matching() {
        let pattern = compile("N???Po*Ex?eption", MatchMode::WildcardPattern, true);
        assert!(pattern.is_match("NullPointerException"));
        assert!(!pattern.is_match("NullPointerError"));

        let insensitive = compile("ha*m*ent*", MatchMode::WildcardPattern, false);
        assert!(insensitive.is_match("HashMapEntry"));

        let arrays = compile("String[]*", MatchMode::WildcardPattern, true);
        assert!(arrays.is_match("String[][]"));
    }

    #[test]
    fn camel_case_humps() {
        assert!(camel_case_match("NPE", "NullPointerException", false));
        assert!(camel_case_match("NPE", "NoPermissionException", false));
        assert!(camel_case_match("NuPoEx", "NullPointerException", false));
        assert!(camel_case_match("IPL3", "IPerspectiveListener3", false));
        assert!(camel_case_match("HashME", "HashMapEntry", false));
        assert!(!camel_case_match("NPE", "NullPointer", false));
        assert!(!camel_case_match("npe", "NullPointerException", false));
    }

    #[test]
    fn camel_case_same_part_count() {
        assert!(camel_case_match("HM", "HashMap", true));
        assert!(!camel_case_match("HM", "HashMapEntry", true));
        assert!(camel_case_match("HM", "HashMapEntry", false));
    }

    #[test]
    fn camel_case_mode_accepts_insensitive_prefix() {
        let pattern = compile("HaMa", MatchMode::CamelCase, false);
        assert!(pattern.is_match("HashMap"));
        assert!(pattern.is_match("hamarket"));
    }

    #[test]
    fn regex_is_anchored() {
        let pattern = compile("get[A-Z].*", MatchMode::Regex, true);
        assert!(pattern.is_match("getName"));
        assert!(!pattern.is_match("forget"));

        let err = NamePattern::compile("(", MatchRule::new(MatchMode::Regex, true));
        assert!(matches!(err, Err(PatternError::InvalidRegex { .. })));
    }

    #[test]
    fn literal_prefixes() {
        assert_eq!(
            compile("NuPoEx", MatchMode::CamelCase, true).literal_prefix(),
            Some("Nu")
        );
        assert_eq!(compile("Foo", MatchMode::Prefix, true).literal_prefix(), Some("Foo"));
        assert_eq!(
            compile("F*", MatchMode::WildcardPattern, true).literal_prefix(),
            None
        );
    }

    #[test]
    fn absent_pattern_matches_everything() {
        assert!(matches_name(None, "Whatever"));
    }
}

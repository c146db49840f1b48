//! Access rule compilation and matching.
//!
//! Access rules map document paths to an [`AccessRestriction`]. Rules are checked in
//! precedence order and the first matching rule decides.

use globset::{Glob, GlobMatcher};

use crate::{AccessRule, AccessRuleKind, ConfigError};

/// The restriction attached to a document path by an access rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRestriction {
    /// Kind of restriction.
    pub kind: AccessRuleKind,
    /// The pattern that matched, for reporting.
    pub pattern: String,
}

impl AccessRestriction {
    /// Whether matches under this restriction must not be reported.
    pub fn is_forbidden(&self) -> bool {
        self.kind == AccessRuleKind::Forbidden
    }
}

/// A compiled access rule ready for matching.
#[derive(Debug, Clone)]
struct CompiledRule {
    /// Pattern text paired with its compiled matcher.
    matchers: Vec<(String, GlobMatcher)>,
    /// Restriction applied to matching paths.
    kind: AccessRuleKind,
}

/// Compiled access rules.
#[derive(Debug, Clone, Default)]
pub struct CompiledAccessRules {
    /// Compiled rules in precedence order (higher precedence first).
    rules: Vec<CompiledRule>,
}

impl CompiledAccessRules {
    /// Compiles access rules, keeping their order.
    pub fn compile(rules: &[AccessRule]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let matchers = rule
                    .patterns
                    .iter()
                    .map(|p| compile_glob(p).map(|g| (p.clone(), g.compile_matcher())))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompiledRule {
                    matchers,
                    kind: rule.kind,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { rules })
    }

    /// Returns the restriction for a document path.
    ///
    /// The first rule with a matching pattern decides. An `accessible` rule, or no
    /// matching rule at all, means no restriction.
    pub fn restriction_for(&self, path: &str) -> Option<AccessRestriction> {
        self.rules.iter().find_map(|rule| {
            rule.matchers
                .iter()
                .find(|(_, m)| m.is_match(path))
                .map(|(pattern, _)| (rule.kind, pattern))
        })
        .filter(|(kind, _)| *kind != AccessRuleKind::Accessible)
        .map(|(kind, pattern)| AccessRestriction {
            kind,
            pattern: pattern.clone(),
        })
    }

    /// Returns true if no rules are configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Compiles a single glob pattern.
fn compile_glob(pattern: &str) -> Result<Glob, ConfigError> {
    Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(patterns: &[&str], kind: AccessRuleKind) -> AccessRule {
        AccessRule {
            patterns: patterns.iter().map(ToString::to_string).collect(),
            kind,
        }
    }

    #[test]
    fn test_empty_rules_restrict_nothing() {
        let rules = CompiledAccessRules::compile(&[]).unwrap();
        assert!(rules.is_empty());
        assert_eq!(rules.restriction_for("/p/src/A.java"), None);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = CompiledAccessRules::compile(&[
            rule(&["/lib/internal.jar|com/acme/api/**"], AccessRuleKind::Accessible),
            rule(&["/lib/internal.jar|*"], AccessRuleKind::Forbidden),
            rule(&["/lib/*.jar|*"], AccessRuleKind::Discouraged),
        ])
        .unwrap();

        assert_eq!(
            rules.restriction_for("/lib/internal.jar|com/acme/api/Api.class"),
            None
        );

        let forbidden = rules
            .restriction_for("/lib/internal.jar|com/acme/impl/Impl.class")
            .unwrap();
        assert!(forbidden.is_forbidden());
        assert_eq!(forbidden.pattern, "/lib/internal.jar|*");

        let discouraged = rules.restriction_for("/lib/other.jar|a/B.class").unwrap();
        assert_eq!(discouraged.kind, AccessRuleKind::Discouraged);

        assert_eq!(rules.restriction_for("/p/src/A.java"), None);
    }

    #[test]
    fn test_invalid_glob_is_reported() {
        let err = CompiledAccessRules::compile(&[rule(&["a/{b"], AccessRuleKind::Forbidden)])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "a/{b"));
    }
}

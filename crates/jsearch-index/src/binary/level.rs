//! Match levels of resolved members against a pattern.

use jsearch_pattern::{NamePattern, Pattern, PatternKind, TypeNamePattern, matches_name};

use super::metadata::BinaryMethod;

/// How well a member matches a pattern.
///
/// Levels are ordered, so combining the levels of several checks is [`Ord::min`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchLevel {
    /// The member cannot match.
    Impossible,
    /// The member may match; some type information was missing.
    Inaccurate,
    /// The member matches.
    Accurate,
}

/// A resolved compiled type and its resolved members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBinding {
    /// Qualified source name (`com.acme.Outer.Inner`).
    pub name: String,
    /// Resolved methods and constructors.
    pub methods: Vec<MethodBinding>,
    /// Resolved fields.
    pub fields: Vec<FieldBinding>,
}

/// A resolved method or constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBinding {
    /// Qualified source name of the declaring type.
    pub declaring_type: String,
    /// Method name; `<init>` for constructors.
    pub selector: String,
    /// Signature the binding was resolved from.
    pub signature: String,
    /// Qualified parameter type names with array brackets.
    pub parameter_types: Vec<String>,
    /// Qualified return type name; `None` for constructors.
    pub return_type: Option<String>,
}

impl MethodBinding {
    /// Returns true for constructors.
    pub fn is_constructor(&self) -> bool {
        self.selector == BinaryMethod::CONSTRUCTOR
    }
}

/// A resolved field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    /// Qualified source name of the declaring type.
    pub declaring_type: String,
    /// Field name.
    pub name: String,
    /// Signature the binding was resolved from.
    pub signature: String,
    /// Qualified field type name, if known.
    pub field_type: Option<String>,
}

/// A member binding of either kind.
#[derive(Debug, Clone, Copy)]
pub enum MemberBinding<'a> {
    /// A method or constructor.
    Method(&'a MethodBinding),
    /// A field.
    Field(&'a FieldBinding),
}

/// Whether qualifications take part in the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    /// Compare simple names and qualifications.
    Resolved,
    /// Compare simple names only.
    SignatureOnly,
}

/// Level of `member` against `pattern` with full type information.
pub fn resolve_level(pattern: &Pattern, member: MemberBinding<'_>) -> MatchLevel {
    level(pattern, member, Check::Resolved)
}

/// Checks `member` against `pattern` by names and simple type names only.
pub fn matches_signature(pattern: &Pattern, member: MemberBinding<'_>) -> bool {
    level(pattern, member, Check::SignatureOnly) > MatchLevel::Impossible
}

/// Level of `member` against `pattern`.
fn level(pattern: &Pattern, member: MemberBinding<'_>, check: Check) -> MatchLevel {
    match (pattern.kind(), member) {
        (PatternKind::Method(p), MemberBinding::Method(m)) if !m.is_constructor() => {
            if !matches_name(p.selector.as_ref(), &m.selector) {
                return MatchLevel::Impossible;
            }
            let declaring = qualified_level(
                p.declaring_simple_name.as_ref(),
                p.declaring_qualification.as_ref(),
                Some(&m.declaring_type),
                check,
            );
            let returns = type_level(p.return_type.as_ref(), m.return_type.as_deref(), check);
            declaring
                .min(returns)
                .min(parameters_level(p.parameters.as_deref(), &m.parameter_types, check))
        }
        (PatternKind::Constructor(p), MemberBinding::Method(m)) if m.is_constructor() => {
            let declaring = qualified_level(
                p.declaring_simple_name.as_ref(),
                p.declaring_qualification.as_ref(),
                Some(&m.declaring_type),
                check,
            );
            declaring.min(parameters_level(p.parameters.as_deref(), &m.parameter_types, check))
        }
        (PatternKind::Field(p), MemberBinding::Field(f)) => {
            if !matches_name(p.name.as_ref(), &f.name) {
                return MatchLevel::Impossible;
            }
            let declaring = qualified_level(
                p.declaring_simple_name.as_ref(),
                p.declaring_qualification.as_ref(),
                Some(&f.declaring_type),
                check,
            );
            declaring.min(type_level(p.field_type.as_ref(), f.field_type.as_deref(), check))
        }
        _ => MatchLevel::Impossible,
    }
}

/// Level of the actual parameter list against the pattern's.
fn parameters_level(
    pattern: Option<&[TypeNamePattern]>,
    actual: &[String],
    check: Check,
) -> MatchLevel {
    let Some(pattern) = pattern else {
        return MatchLevel::Accurate;
    };
    if pattern.len() != actual.len() {
        return MatchLevel::Impossible;
    }
    pattern
        .iter()
        .zip(actual)
        .map(|(p, a)| type_level(Some(p), Some(a), check))
        .min()
        .unwrap_or(MatchLevel::Accurate)
}

/// Level of a signature type against a type name pattern.
fn type_level(pattern: Option<&TypeNamePattern>, actual: Option<&str>, check: Check) -> MatchLevel {
    match pattern {
        Some(p) => qualified_level(p.simple_name.as_ref(), p.qualification.as_ref(), actual, check),
        None => MatchLevel::Accurate,
    }
}

/// Level of a qualified type name against a simple name and qualification.
///
/// A missing type, or an unqualified one where the pattern is qualified, is inaccurate.
fn qualified_level(
    simple: Option<&NamePattern>,
    qualification: Option<&NamePattern>,
    actual: Option<&str>,
    check: Check,
) -> MatchLevel {
    if simple.is_none() && qualification.is_none() {
        return MatchLevel::Accurate;
    }
    let Some(actual) = actual else {
        return MatchLevel::Inaccurate;
    };
    let (actual_qualification, actual_simple) = match actual.rsplit_once('.') {
        Some((q, s)) => (Some(q), s),
        None => (None, actual),
    };
    if !matches_name(simple, actual_simple) {
        return MatchLevel::Impossible;
    }
    let Some(qualification) = qualification else {
        return MatchLevel::Accurate;
    };
    if check == Check::SignatureOnly {
        return MatchLevel::Inaccurate;
    }
    match actual_qualification {
        Some(q) if qualification.is_match(q) => MatchLevel::Accurate,
        Some(_) => MatchLevel::Impossible,
        None => MatchLevel::Inaccurate,
    }
}

#[cfg(test)]
mod tests {
    use jsearch_pattern::{LimitTo, MatchRule, PatternBuilder};

    use super::*;

    fn put() -> MethodBinding {
        MethodBinding {
            declaring_type: "java.util.HashMap".to_string(),
            selector: "put".to_string(),
            signature: "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;".to_string(),
            parameter_types: vec!["java.lang.Object".to_string(), "java.lang.Object".to_string()],
            return_type: Some("java.lang.Object".to_string()),
        }
    }

    fn method(declaring: Option<&str>, parameters: Option<&[&str]>) -> Pattern {
        PatternBuilder::new(LimitTo::Declarations)
            .rule(MatchRule::exact())
            .method(declaring, "put", parameters, None, false)
            .unwrap()
    }

    #[test]
    fn test_qualified_parameters_resolve_accurately() {
        let binding = put();
        let pattern = method(
            Some("java.util.HashMap"),
            Some(&["java.lang.Object", "Object"]),
        );
        assert_eq!(
            resolve_level(&pattern, MemberBinding::Method(&binding)),
            MatchLevel::Accurate
        );
    }

    #[test]
    fn test_wrong_qualification_is_impossible_when_resolved() {
        let binding = put();
        let pattern = method(Some("com.acme.HashMap"), None);
        assert_eq!(
            resolve_level(&pattern, MemberBinding::Method(&binding)),
            MatchLevel::Impossible
        );
        assert!(matches_signature(&pattern, MemberBinding::Method(&binding)));
    }

    #[test]
    fn test_parameter_count_mismatch_is_impossible() {
        let binding = put();
        let pattern = method(None, Some(&["Object"]));
        assert_eq!(
            resolve_level(&pattern, MemberBinding::Method(&binding)),
            MatchLevel::Impossible
        );
        assert!(!matches_signature(&pattern, MemberBinding::Method(&binding)));
    }

    #[test]
    fn test_missing_field_type_is_inaccurate() {
        let field = FieldBinding {
            declaring_type: "com.acme.Counter".to_string(),
            name: "count".to_string(),
            signature: "J".to_string(),
            field_type: None,
        };
        let pattern = PatternBuilder::new(LimitTo::Declarations)
            .field(Some("Counter"), "count", Some("long"))
            .unwrap();
        assert_eq!(
            resolve_level(&pattern, MemberBinding::Field(&field)),
            MatchLevel::Inaccurate
        );
    }

    #[test]
    fn test_kind_mismatch_is_impossible() {
        let mut ctor = put();
        ctor.selector = BinaryMethod::CONSTRUCTOR.to_string();
        let pattern = method(None, None);
        assert_eq!(
            resolve_level(&pattern, MemberBinding::Method(&ctor)),
            MatchLevel::Impossible
        );
    }
}

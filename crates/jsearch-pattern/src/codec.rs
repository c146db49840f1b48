//! Index key encoding and decoding.
//!
//! [`encode`] turns a pattern into an [`IndexQuery`]: the categories to read, the key to
//! look up and the index-level match mode. The index mode is often coarser than the
//! pattern (a prefix lookup standing in for an exact one), so every entry the index
//! returns is decoded with [`decode`] and re-checked with [`matches_decoded_key`].
//!
//! Key layouts:
//!
//! | Category | Key |
//! |---|---|
//! | `methodDecl`, `methodRef`, `constructorDecl`, `constructorRef` | `name/argCount` |
//! | `typeDecl` | `SimpleName/package/Enclosing.Names/K` |
//! | `superRef` | `SuperSimpleName/superQualification/SimpleName/package/SK` |
//! | `fieldDecl`, `ref` | `name` |

use crate::{
    MatchMode, Pattern,
    builder::primary_name,
    category::{
        CONSTRUCTOR_DECL, CONSTRUCTOR_REF, METHOD_DECL, METHOD_REF, ONE_STAR, SEPARATOR,
        SUPER_REF, TYPE_DECL,
    },
    name::{NamePattern, matches_name},
    pattern::{PatternKind, SuperKind, TypeKind},
};

/// A query against one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    /// Categories to read.
    pub categories: Vec<&'static str>,
    /// Key to look up; `None` returns every entry of the categories.
    pub key: Option<String>,
    /// How the index compares `key` against stored keys.
    pub mode: MatchMode,
    /// Whether the index comparison respects case.
    pub case_sensitive: bool,
}

/// Fields of a decoded `typeDecl` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclarationKey {
    /// Simple type name.
    pub simple_name: String,
    /// Dotted package name, empty for the default package.
    pub package: String,
    /// Dotted enclosing type names, empty for top-level types.
    pub enclosing_type_names: String,
    /// Declaration kind, if the key carried a known code.
    pub type_kind: Option<TypeKind>,
}

impl TypeDeclarationKey {
    /// Qualification of the declared type: package plus enclosing type names.
    pub fn qualification(&self) -> String {
        match (self.package.is_empty(), self.enclosing_type_names.is_empty()) {
            (_, true) => self.package.clone(),
            (true, false) => self.enclosing_type_names.clone(),
            (false, false) => format!("{}.{}", self.package, self.enclosing_type_names),
        }
    }
}

/// Fields of a decoded `superRef` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperTypeKey {
    /// Simple name of the referenced super type.
    pub super_simple_name: String,
    /// Qualification of the referenced super type.
    pub super_qualification: String,
    /// Simple name of the type declaring the reference.
    pub simple_name: String,
    /// Package of the type declaring the reference.
    pub package: String,
    /// Whether the reference names a superclass or a superinterface.
    pub super_kind: Option<SuperKind>,
    /// Declaration kind of the referencing type.
    pub type_kind: Option<TypeKind>,
}

/// A decoded index key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedKey {
    /// Method or constructor key.
    Member {
        /// Selector, or simple name of the declaring type for constructors.
        name: String,
        /// Declared argument count.
        arg_count: usize,
    },
    /// Plain name key (type, field and package references, field declarations).
    Name(String),
    /// Type declaration key.
    TypeDeclaration(TypeDeclarationKey),
    /// Super-type reference key.
    SuperTypeReference(SuperTypeKey),
}

/// Builds a method or constructor key.
pub fn member_key(name: &str, arg_count: usize) -> String {
    format!("{name}{SEPARATOR}{arg_count}")
}

/// Builds a type declaration key.
pub fn type_declaration_key(
    simple_name: &str,
    package: &str,
    enclosing_type_names: &str,
    type_kind: TypeKind,
) -> String {
    format!(
        "{simple_name}{SEPARATOR}{package}{SEPARATOR}{enclosing_type_names}{SEPARATOR}{}",
        type_kind.code()
    )
}

/// Builds a super-type reference key.
pub fn super_type_key(
    super_simple_name: &str,
    super_qualification: &str,
    simple_name: &str,
    package: &str,
    super_kind: SuperKind,
    type_kind: TypeKind,
) -> String {
    format!(
        "{super_simple_name}{SEPARATOR}{super_qualification}{SEPARATOR}{simple_name}\
         {SEPARATOR}{package}{SEPARATOR}{}{}",
        super_kind.code(),
        type_kind.code()
    )
}

/// Encodes a pattern into the query each index runs.
pub fn encode(pattern: &Pattern) -> IndexQuery {
    let name = primary_name(pattern.kind());
    let (key, mode) = match pattern.kind() {
        PatternKind::Method(_) | PatternKind::Constructor(_) => encode_member(
            name,
            pattern.rule().mode,
            pattern.parameter_count().filter(|_| !pattern.is_varargs()),
        ),
        // Declaration keys carry more segments than the name, so an exact name becomes
        // a prefix on `Name/`. Type patterns share one key between `typeDecl` and `ref`,
        // whose keys are the bare name, so they stop at `Name`.
        PatternKind::TypeDeclaration(_) | PatternKind::SuperTypeReference(_) => {
            encode_segmented(name, pattern.rule().mode, true)
        }
        PatternKind::Type(_) if pattern.find_declarations() => {
            encode_segmented(name, pattern.rule().mode, false)
        }
        // Package declarations live in the package segment of type declaration keys.
        PatternKind::Package(_) if pattern.find_declarations() => (None, MatchMode::Exact),
        PatternKind::Type(_) | PatternKind::Field(_) | PatternKind::Package(_) => {
            encode_simple(name, pattern.rule().mode)
        }
    };

    IndexQuery {
        categories: pattern.categories(),
        key,
        mode,
        case_sensitive: pattern.rule().case_sensitive,
    }
}

/// Encodes a `name/argCount` key. `arg_count` is `None` when unknown or variable-arity.
fn encode_member(
    name: Option<&NamePattern>,
    mode: MatchMode,
    arg_count: Option<usize>,
) -> (Option<String>, MatchMode) {
    let text = name.map(NamePattern::text);
    match mode {
        MatchMode::Exact => match (text, arg_count) {
            (Some(text), Some(count)) => (Some(member_key(text, count)), MatchMode::Exact),
            (text, _) => (text.map(str::to_string), MatchMode::Prefix),
        },
        MatchMode::Prefix => (text.map(str::to_string), MatchMode::Prefix),
        MatchMode::WildcardPattern => {
            let key = match (text, arg_count) {
                (text, Some(count)) => {
                    let mut text = text.unwrap_or(ONE_STAR).to_string();
                    if !text.ends_with('*') {
                        text.push_str(ONE_STAR);
                    }
                    Some(member_key(&text, count))
                }
                (Some(text), None) if !text.ends_with('*') => {
                    Some(format!("{text}{SEPARATOR}{ONE_STAR}"))
                }
                (text, None) => text.map(str::to_string),
            };
            (key, MatchMode::WildcardPattern)
        }
        MatchMode::CamelCase | MatchMode::CamelCaseSamePartCount => (
            name.and_then(NamePattern::literal_prefix).map(str::to_string),
            MatchMode::Prefix,
        ),
        MatchMode::Regex => (None, MatchMode::Exact),
    }
}

/// Encodes a key that is exactly the name.
fn encode_simple(name: Option<&NamePattern>, mode: MatchMode) -> (Option<String>, MatchMode) {
    let Some(name) = name else {
        return (None, MatchMode::Exact);
    };
    match mode {
        MatchMode::Exact | MatchMode::Prefix | MatchMode::WildcardPattern => {
            (Some(name.text().to_string()), mode)
        }
        MatchMode::CamelCase | MatchMode::CamelCaseSamePartCount => {
            (name.literal_prefix().map(str::to_string), MatchMode::Prefix)
        }
        MatchMode::Regex => (None, MatchMode::Exact),
    }
}

/// Encodes a key whose first segment is the name. With `separated`, an exact name
/// is looked up as `Name/`.
fn encode_segmented(
    name: Option<&NamePattern>,
    mode: MatchMode,
    separated: bool,
) -> (Option<String>, MatchMode) {
    let Some(name) = name else {
        return (None, MatchMode::Exact);
    };
    let text = name.text();
    match mode {
        MatchMode::Exact if separated => (Some(format!("{text}{SEPARATOR}")), MatchMode::Prefix),
        MatchMode::Exact | MatchMode::Prefix => (Some(text.to_string()), MatchMode::Prefix),
        MatchMode::WildcardPattern => {
            let mut key = text.to_string();
            if !key.ends_with('*') {
                key.push_str(ONE_STAR);
            }
            (Some(key), MatchMode::WildcardPattern)
        }
        MatchMode::CamelCase | MatchMode::CamelCaseSamePartCount => {
            (name.literal_prefix().map(str::to_string), MatchMode::Prefix)
        }
        MatchMode::Regex => (None, MatchMode::Exact),
    }
}

/// Decodes a raw key read from `category`.
pub fn decode(category: &str, key: &str) -> DecodedKey {
    match category {
        METHOD_DECL | METHOD_REF | CONSTRUCTOR_DECL | CONSTRUCTOR_REF => {
            let (name, arg_count) = decode_member_key(key);
            DecodedKey::Member {
                name: name.to_string(),
                arg_count,
            }
        }
        TYPE_DECL => DecodedKey::TypeDeclaration(decode_type_declaration(key)),
        SUPER_REF => DecodedKey::SuperTypeReference(decode_super_type(key)),
        _ => DecodedKey::Name(key.to_string()),
    }
}

/// Decodes a `name/argCount` key.
///
/// Digits are read from the end of the key, each scaled by its power of ten, until the
/// separator. A key without a separator, with a non-digit in the count, or whose count
/// overflows decodes to the whole key with a count of zero.
pub fn decode_member_key(key: &str) -> (&str, usize) {
    let mut count = 0usize;
    let mut scale = 1usize;
    let mut scale_overflowed = false;
    for (i, ch) in key.char_indices().rev() {
        if ch == SEPARATOR {
            return (&key[..i], count);
        }
        let Some(digit) = ch.to_digit(10) else {
            return (key, 0);
        };
        // A zero digit beyond the representable range adds nothing.
        if digit != 0 {
            let term = if scale_overflowed {
                None
            } else {
                (digit as usize).checked_mul(scale)
            };
            match term.and_then(|t| count.checked_add(t)) {
                Some(next) => count = next,
                None => return (key, 0),
            }
        }
        match scale.checked_mul(10) {
            Some(next) => scale = next,
            None => scale_overflowed = true,
        }
    }
    (key, 0)
}

/// Decodes a `typeDecl` key; keys without four segments decode to a bare simple name.
fn decode_type_declaration(key: &str) -> TypeDeclarationKey {
    let parts: Vec<&str> = key.split(SEPARATOR).collect();
    match parts.as_slice() {
        [simple, package, enclosing, kind] => TypeDeclarationKey {
            simple_name: (*simple).to_string(),
            package: (*package).to_string(),
            enclosing_type_names: (*enclosing).to_string(),
            type_kind: kind.chars().next().and_then(TypeKind::from_code),
        },
        _ => TypeDeclarationKey {
            simple_name: key.to_string(),
            package: String::new(),
            enclosing_type_names: String::new(),
            type_kind: None,
        },
    }
}

/// Decodes a `superRef` key; keys without five segments decode to a bare super name.
fn decode_super_type(key: &str) -> SuperTypeKey {
    let parts: Vec<&str> = key.split(SEPARATOR).collect();
    match parts.as_slice() {
        [super_simple, super_qualification, simple, package, kinds] => {
            let mut codes = kinds.chars();
            SuperTypeKey {
                super_simple_name: (*super_simple).to_string(),
                super_qualification: (*super_qualification).to_string(),
                simple_name: (*simple).to_string(),
                package: (*package).to_string(),
                super_kind: codes.next().and_then(SuperKind::from_code),
                type_kind: codes.next().and_then(TypeKind::from_code),
            }
        }
        _ => SuperTypeKey {
            super_simple_name: key.to_string(),
            super_qualification: String::new(),
            simple_name: String::new(),
            package: String::new(),
            super_kind: None,
            type_kind: None,
        },
    }
}

/// Matches an optional qualification pattern against a possibly empty qualification.
fn matches_qualification(pattern: Option<&NamePattern>, qualification: &str) -> bool {
    matches_name(pattern, qualification)
}

/// Re-checks a decoded key against the full pattern predicate.
pub fn matches_decoded_key(pattern: &Pattern, decoded: &DecodedKey) -> bool {
    match (pattern.kind(), decoded) {
        (PatternKind::Method(_) | PatternKind::Constructor(_), DecodedKey::Member { name, arg_count }) => {
            let count_matches = pattern.is_varargs()
                || pattern
                    .parameter_count()
                    .is_none_or(|count| count == *arg_count);
            count_matches && matches_name(primary_name(pattern.kind()), name)
        }
        (PatternKind::Type(t), DecodedKey::Name(name)) => {
            matches_name(t.simple_name.as_ref(), name)
        }
        (PatternKind::Type(t), DecodedKey::TypeDeclaration(key)) => {
            matches_name(t.simple_name.as_ref(), &key.simple_name)
                && matches_qualification(t.qualification.as_ref(), &key.qualification())
        }
        (PatternKind::TypeDeclaration(t), DecodedKey::TypeDeclaration(key)) => {
            matches_name(t.simple_name.as_ref(), &key.simple_name)
                && matches_qualification(t.package.as_ref(), &key.package)
                && matches_qualification(t.enclosing_type_names.as_ref(), &key.enclosing_type_names)
                && t.type_kind.is_none_or(|kind| key.type_kind == Some(kind))
        }
        (PatternKind::SuperTypeReference(s), DecodedKey::SuperTypeReference(key)) => {
            matches_name(s.super_simple_name.as_ref(), &key.super_simple_name)
                && matches_qualification(s.super_qualification.as_ref(), &key.super_qualification)
                && s.filter.accepts(key.super_kind)
        }
        (PatternKind::Field(f), DecodedKey::Name(name)) => matches_name(f.name.as_ref(), name),
        (PatternKind::Package(p), DecodedKey::Name(name)) => matches_name(p.name.as_ref(), name),
        (PatternKind::Package(p), DecodedKey::TypeDeclaration(key)) => {
            matches_name(p.name.as_ref(), &key.package)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{LimitTo, MatchRule, PatternBuilder};

    fn ctor(rule: MatchRule, name: &str, params: Option<&[&str]>) -> Pattern {
        PatternBuilder::new(LimitTo::References)
            .rule(rule)
            .constructor(name, Vec::new(), params, false)
            .unwrap()
    }

    #[test]
    fn exact_member_with_known_count() {
        let query = encode(&ctor(MatchRule::exact(), "Foo", Some(&["int", "int"])));
        assert_eq!(query.key.as_deref(), Some("Foo/2"));
        assert_eq!(query.mode, MatchMode::Exact);
        assert_eq!(query.categories, vec![CONSTRUCTOR_REF]);
    }

    #[test]
    fn exact_member_with_unknown_count_degrades_to_prefix() {
        let query = encode(&ctor(MatchRule::exact(), "Foo", None));
        assert_eq!(query.key.as_deref(), Some("Foo"));
        assert_eq!(query.mode, MatchMode::Prefix);

        let varargs = PatternBuilder::new(LimitTo::References)
            .constructor("Foo", Vec::new(), Some(&["int..."]), true)
            .unwrap();
        let query = encode(&varargs);
        assert_eq!(query.key.as_deref(), Some("Foo"));
        assert_eq!(query.mode, MatchMode::Prefix);

        let any = encode(&ctor(MatchRule::exact(), "*", Some(&[])));
        assert_eq!(any.key, None);
        assert_eq!(any.mode, MatchMode::Prefix);
    }

    #[test]
    fn wildcard_member_keys() {
        let rule = MatchRule::new(MatchMode::WildcardPattern, true);
        let query = encode(&ctor(rule, "F?o", Some(&["int"])));
        assert_eq!(query.key.as_deref(), Some("F?o*/1"));
        assert_eq!(query.mode, MatchMode::WildcardPattern);

        let query = encode(&ctor(rule, "Fo*", Some(&["int"])));
        assert_eq!(query.key.as_deref(), Some("Fo*/1"));

        let query = encode(&ctor(rule, "F?o", None));
        assert_eq!(query.key.as_deref(), Some("F?o/*"));

        let query = encode(&ctor(rule, "*", Some(&[])));
        assert_eq!(query.key.as_deref(), Some("*/0"));
    }

    #[test]
    fn camel_case_and_regex_queries() {
        let camel = encode(&ctor(
            MatchRule::new(MatchMode::CamelCase, true),
            "NuPoEx",
            Some(&[]),
        ));
        assert_eq!(camel.key.as_deref(), Some("Nu"));
        assert_eq!(camel.mode, MatchMode::Prefix);

        let regex = encode(&ctor(
            MatchRule::new(MatchMode::Regex, true),
            "Fo+",
            Some(&[]),
        ));
        assert_eq!(regex.key, None);
        assert_eq!(regex.mode, MatchMode::Exact);
    }

    #[test]
    fn multi_digit_counts_decode() {
        assert_eq!(member_key("Foo", 12), "Foo/12");
        assert_eq!(decode_member_key("Foo/12"), ("Foo", 12));
        assert_eq!(decode_member_key("Foo/230"), ("Foo", 230));
        assert_eq!(decode_member_key("a/b/7"), ("a/b", 7));
    }

    #[test]
    fn malformed_member_keys_are_degenerate() {
        assert_eq!(decode_member_key("Foo"), ("Foo", 0));
        assert_eq!(decode_member_key("Foo/1x"), ("Foo/1x", 0));
        assert_eq!(decode_member_key("Foo/"), ("Foo", 0));
        let overflow = format!("Foo/{}9", usize::MAX);
        assert_eq!(decode_member_key(&overflow), (overflow.as_str(), 0));
    }

    #[test]
    fn decoded_member_rematch() {
        let pattern = ctor(MatchRule::exact(), "Foo", Some(&["int"]));
        assert!(matches_decoded_key(&pattern, &decode(CONSTRUCTOR_REF, "Foo/1")));
        assert!(!matches_decoded_key(&pattern, &decode(CONSTRUCTOR_REF, "Foo/2")));
        // A prefix lookup can return longer names.
        assert!(!matches_decoded_key(&pattern, &decode(CONSTRUCTOR_REF, "FooBar/1")));

        let unknown = ctor(MatchRule::exact(), "Foo", None);
        assert!(matches_decoded_key(&unknown, &decode(CONSTRUCTOR_REF, "Foo/7")));
    }

    #[test]
    fn regex_applies_after_decode() {
        let pattern = PatternBuilder::new(LimitTo::Declarations)
            .rule(MatchRule::new(MatchMode::Regex, true))
            .method(None, "get[A-Z]\\w*", None, None, false)
            .unwrap();
        assert!(matches_decoded_key(&pattern, &decode(METHOD_DECL, "getName/0")));
        assert!(!matches_decoded_key(&pattern, &decode(METHOD_DECL, "forget/0")));
    }

    #[test]
    fn type_declaration_keys() {
        let key = type_declaration_key("Entry", "java.util", "Map", TypeKind::Interface);
        assert_eq!(key, "Entry/java.util/Map/I");

        let pattern = PatternBuilder::new(LimitTo::Declarations)
            .type_declaration(Some("java.util"), None, "Entry", Some(TypeKind::Interface))
            .unwrap();
        let query = encode(&pattern);
        assert_eq!(query.key.as_deref(), Some("Entry/"));
        assert_eq!(query.mode, MatchMode::Prefix);
        assert!(matches_decoded_key(&pattern, &decode(TYPE_DECL, &key)));

        let wrong_kind = type_declaration_key("Entry", "java.util", "Map", TypeKind::Class);
        assert!(!matches_decoded_key(&pattern, &decode(TYPE_DECL, &wrong_kind)));
    }

    #[test]
    fn type_pattern_matches_qualified_declarations() {
        let pattern = PatternBuilder::new(LimitTo::AllOccurrences)
            .type_pattern("java.util.Map.Entry")
            .unwrap();
        let query = encode(&pattern);
        assert_eq!(query.key.as_deref(), Some("Entry"));
        assert_eq!(query.mode, MatchMode::Prefix);

        let decl = type_declaration_key("Entry", "java.util", "Map", TypeKind::Interface);
        assert!(matches_decoded_key(&pattern, &decode(TYPE_DECL, &decl)));
        assert!(matches_decoded_key(&pattern, &decode("ref", "Entry")));
        assert!(!matches_decoded_key(&pattern, &decode("ref", "EntrySet")));
    }

    #[test]
    fn super_type_keys_and_filter() {
        let key = super_type_key(
            "Runnable",
            "java.lang",
            "Task",
            "com.acme",
            SuperKind::Interface,
            TypeKind::Class,
        );
        assert_eq!(key, "Runnable/java.lang/Task/com.acme/IC");

        let interfaces = PatternBuilder::new(LimitTo::References)
            .super_type_reference("java.lang.Runnable", crate::SuperTypeFilter::Interfaces)
            .unwrap();
        assert!(matches_decoded_key(&interfaces, &decode(SUPER_REF, &key)));

        let classes = PatternBuilder::new(LimitTo::References)
            .super_type_reference("Runnable", crate::SuperTypeFilter::Classes)
            .unwrap();
        assert!(!matches_decoded_key(&classes, &decode(SUPER_REF, &key)));
    }

    #[test]
    fn package_declarations_read_type_keys() {
        let pattern = PatternBuilder::new(LimitTo::Declarations)
            .package("com.acme")
            .unwrap();
        let query = encode(&pattern);
        assert_eq!(query.key, None);
        assert_eq!(query.categories, vec![TYPE_DECL]);

        let key = type_declaration_key("Task", "com.acme", "", TypeKind::Class);
        assert!(matches_decoded_key(&pattern, &decode(TYPE_DECL, &key)));
    }

    #[test]
    fn kind_mismatch_never_matches() {
        let pattern = ctor(MatchRule::exact(), "Foo", None);
        assert!(!matches_decoded_key(&pattern, &DecodedKey::Name("Foo".into())));
    }
}

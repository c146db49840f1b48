//! Accurate and inaccurate matches on compiled types.

use jsearch_pattern::{Pattern, PatternKind, matches_name};
use rustc_hash::FxHashSet;

use super::{
    Binder,
    annotations::{self, Annotated},
    binder,
    level::{self, MatchLevel, MemberBinding, TypeBinding},
    metadata::{BinaryField, BinaryMethod, BinaryType},
};
use crate::path;

/// Confidence of a reported match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accuracy {
    /// Confirmed through binding resolution.
    Accurate,
    /// Based on names and signatures alone.
    Inaccurate,
}

/// Whether a match is a declaration or a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchRole {
    /// The element is declared here.
    Declaration,
    /// The element is referenced here.
    Reference,
}

/// The compiled element a match points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BinaryElement {
    /// A type.
    Type {
        /// Qualified source name.
        name: String,
    },
    /// A method or constructor.
    Method {
        /// Qualified source name of the declaring type.
        declaring_type: String,
        /// Method name; `<init>` for constructors.
        selector: String,
        /// Effective signature.
        signature: String,
    },
    /// A field.
    Field {
        /// Qualified source name of the declaring type.
        declaring_type: String,
        /// Field name.
        name: String,
    },
}

/// A match found in a compiled type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMatch {
    /// Archive-member path of the class file.
    pub path: String,
    /// Matched element.
    pub element: BinaryElement,
    /// Confidence.
    pub accuracy: Accuracy,
    /// Declaration or reference.
    pub role: MatchRole,
}

/// Members of a compiled type already accounted for by a resolved binding.
enum Coverage {
    /// Every member was resolved.
    All,
    /// Only these `(name, signature)` pairs were resolved.
    Only(FxHashSet<(String, String)>),
    /// Nothing was resolved.
    Nothing,
}

impl Coverage {
    /// Builds the coverage of `resolved` bindings out of `total` raw members.
    fn new<'a>(total: usize, resolved: impl ExactSizeIterator<Item = (&'a str, &'a str)>) -> Self {
        if resolved.len() == total {
            return Self::All;
        }
        Self::Only(
            resolved
                .map(|(name, signature)| (name.to_string(), signature.to_string()))
                .collect(),
        )
    }

    /// Whether the raw member `(name, signature)` was resolved.
    fn covers(&self, name: &str, signature: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(&(name.to_string(), signature.to_string())),
            Self::Nothing => false,
        }
    }
}

/// Locates pattern matches in compiled types of an archive.
pub struct BinaryMatchResolver<'a> {
    /// Pattern being searched for.
    pattern: &'a Pattern,
    /// Resolves compiled types when the pattern needs it.
    binder: &'a dyn Binder,
}

impl<'a> BinaryMatchResolver<'a> {
    /// Creates a resolver for `pattern`.
    pub fn new(pattern: &'a Pattern, binder: &'a dyn Binder) -> Self {
        Self { pattern, binder }
    }

    /// Reports every match of the pattern in `ty`, a class file of `archive`.
    ///
    /// A matching type declaration is reported alone. Otherwise annotation references
    /// are reported, then member declarations: accurate when a resolved binding matches,
    /// inaccurate when a member left unresolved matches by signature.
    #[tracing::instrument(level = "debug", skip_all, fields(archive = %archive, ty = %ty.name))]
    pub fn locate_matches(&self, archive: &str, ty: &BinaryType) -> Vec<BinaryMatch> {
        let path = path::archive_member_path(archive, &ty.binary_name());
        let mut found = Vec::new();
        let mut report = |element, accuracy, role| {
            found.push(BinaryMatch {
                path: path.clone(),
                element,
                accuracy,
                role,
            });
        };

        if self.pattern.find_declarations() && type_declaration_matches(self.pattern, ty) {
            report(
                BinaryElement::Type {
                    name: ty.qualified_name(),
                },
                Accuracy::Accurate,
                MatchRole::Declaration,
            );
            return found;
        }

        let annotation_pattern = match self.pattern.kind() {
            PatternKind::Type(type_pattern) if self.pattern.find_references() => Some(type_pattern),
            _ => None,
        };
        if let Some(type_pattern) = annotation_pattern {
            for annotated in annotations::scan(type_pattern, ty) {
                report(annotated_element(ty, annotated), Accuracy::Accurate, MatchRole::Reference);
            }
        }

        let searches_members = matches!(
            self.pattern.kind(),
            PatternKind::Method(_) | PatternKind::Constructor(_) | PatternKind::Field(_)
        );
        if !self.pattern.find_declarations() || !searches_members {
            return found;
        }

        let binding = if self.pattern.must_resolve() {
            self.binder.resolve_binary_type(ty)
        } else {
            None
        };
        let (method_coverage, field_coverage) = match &binding {
            Some(binding) => {
                for element in self.accurate_members(binding) {
                    report(element, Accuracy::Accurate, MatchRole::Declaration);
                }
                (
                    Coverage::new(
                        ty.methods.len(),
                        binding
                            .methods
                            .iter()
                            .map(|m| (m.selector.as_str(), m.signature.as_str())),
                    ),
                    Coverage::new(
                        ty.fields.len(),
                        binding
                            .fields
                            .iter()
                            .map(|f| (f.name.as_str(), f.signature.as_str())),
                    ),
                )
            }
            None => (Coverage::Nothing, Coverage::Nothing),
        };

        for method in &ty.methods {
            if method.synthetic || method_coverage.covers(&method.selector, method.effective_signature()) {
                continue;
            }
            if self.method_matches_signature(ty, method) {
                report(method_element(ty, method), Accuracy::Inaccurate, MatchRole::Declaration);
            }
        }
        for field in &ty.fields {
            if field_coverage.covers(&field.name, field.effective_signature()) {
                continue;
            }
            if self.field_matches_signature(ty, field) {
                report(field_element(ty, field), Accuracy::Inaccurate, MatchRole::Declaration);
            }
        }

        tracing::debug!(matches = found.len(), resolved = binding.is_some(), "binary type searched");
        found
    }

    /// Resolved members matching the pattern accurately.
    fn accurate_members(&self, binding: &TypeBinding) -> Vec<BinaryElement> {
        let methods = binding.methods.iter().map(|m| {
            let element = BinaryElement::Method {
                declaring_type: m.declaring_type.clone(),
                selector: m.selector.clone(),
                signature: m.signature.clone(),
            };
            (element, MemberBinding::Method(m))
        });
        let fields = binding.fields.iter().map(|f| {
            let element = BinaryElement::Field {
                declaring_type: f.declaring_type.clone(),
                name: f.name.clone(),
            };
            (element, MemberBinding::Field(f))
        });
        methods
            .chain(fields)
            .filter(|(_, member)| {
                self.binder.resolve_level(self.pattern, *member) == MatchLevel::Accurate
            })
            .map(|(element, _)| element)
            .collect()
    }

    /// Signature-only check of an unresolved method; corrupt methods never match.
    fn method_matches_signature(&self, ty: &BinaryType, method: &BinaryMethod) -> bool {
        match binder::method_binding(ty, method) {
            Ok(binding) => level::matches_signature(self.pattern, MemberBinding::Method(&binding)),
            Err(err) => {
                tracing::debug!(selector = %method.selector, error = %err, "skipping corrupt method");
                false
            }
        }
    }

    /// Signature-only check of an unresolved field; corrupt fields never match.
    fn field_matches_signature(&self, ty: &BinaryType, field: &BinaryField) -> bool {
        match binder::field_binding(ty, field) {
            Ok(binding) => level::matches_signature(self.pattern, MemberBinding::Field(&binding)),
            Err(err) => {
                tracing::debug!(field = %field.name, error = %err, "skipping corrupt field");
                false
            }
        }
    }
}

/// Checks the declaration of `ty` itself against a type or type declaration pattern.
fn type_declaration_matches(pattern: &Pattern, ty: &BinaryType) -> bool {
    match pattern.kind() {
        PatternKind::Type(t) => {
            matches_name(t.simple_name.as_ref(), ty.simple_name())
                && matches_name(t.qualification.as_ref(), &ty.qualification())
        }
        PatternKind::TypeDeclaration(t) => {
            matches_name(t.simple_name.as_ref(), ty.simple_name())
                && matches_name(t.package.as_ref(), &ty.package())
                && matches_name(t.enclosing_type_names.as_ref(), &ty.enclosing_type_names())
                && t.type_kind.is_none_or(|kind| kind == ty.kind)
        }
        _ => false,
    }
}

/// Element reported for an annotated part of `ty`.
fn annotated_element(ty: &BinaryType, annotated: Annotated<'_>) -> BinaryElement {
    match annotated {
        Annotated::Type => BinaryElement::Type {
            name: ty.qualified_name(),
        },
        Annotated::Method(method) => method_element(ty, method),
        Annotated::Field(field) => field_element(ty, field),
    }
}

/// Element of a raw method.
fn method_element(ty: &BinaryType, method: &BinaryMethod) -> BinaryElement {
    BinaryElement::Method {
        declaring_type: ty.qualified_name(),
        selector: method.selector.clone(),
        signature: method.effective_signature().to_string(),
    }
}

/// Element of a raw field.
fn field_element(ty: &BinaryType, field: &BinaryField) -> BinaryElement {
    BinaryElement::Field {
        declaring_type: ty.qualified_name(),
        name: field.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use jsearch_pattern::{LimitTo, MatchMode, MatchRule, PatternBuilder, TypeKind};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::binary::{MetadataBinder, metadata::TagBits};

    /// Resolves only the first `resolved` methods.
    struct PartialBinder {
        resolved: usize,
    }

    impl Binder for PartialBinder {
        fn resolve_binary_type(&self, ty: &BinaryType) -> Option<TypeBinding> {
            let methods = ty
                .methods
                .iter()
                .take(self.resolved)
                .map(|m| binder::method_binding(ty, m).unwrap())
                .collect();
            Some(TypeBinding {
                name: ty.qualified_name(),
                methods,
                fields: Vec::new(),
            })
        }
    }

    /// Resolves nothing.
    struct NoBinder;

    impl Binder for NoBinder {
        fn resolve_binary_type(&self, _ty: &BinaryType) -> Option<TypeBinding> {
            None
        }
    }

    fn service() -> BinaryType {
        BinaryType::new("com/acme/Service", TypeKind::Class)
            .with_method(BinaryMethod::new("start", "()V"))
            .with_method(BinaryMethod::new("stop", "()V"))
            .with_method(BinaryMethod::new("restart", "(J)V"))
    }

    fn any_method_of(declaring: &str) -> Pattern {
        PatternBuilder::new(LimitTo::Declarations)
            .method(Some(declaring), "*", None, None, false)
            .unwrap()
    }

    fn summary(found: &[BinaryMatch]) -> Vec<(String, Accuracy)> {
        found
            .iter()
            .map(|m| match &m.element {
                BinaryElement::Method { selector, .. } => (selector.clone(), m.accuracy),
                BinaryElement::Field { name, .. } | BinaryElement::Type { name } => {
                    (name.clone(), m.accuracy)
                }
            })
            .collect()
    }

    #[test]
    fn test_unresolved_members_are_inaccurate_and_never_also_accurate() {
        let pattern = any_method_of("com.acme.Service");
        let binder = PartialBinder { resolved: 2 };
        let found = BinaryMatchResolver::new(&pattern, &binder).locate_matches("/lib/a.jar", &service());

        assert_eq!(
            summary(&found),
            vec![
                ("start".to_string(), Accuracy::Accurate),
                ("stop".to_string(), Accuracy::Accurate),
                ("restart".to_string(), Accuracy::Inaccurate),
            ]
        );
        assert!(found.iter().all(|m| m.path == "/lib/a.jar|com/acme/Service.class"));
    }

    #[test]
    fn test_fully_resolved_type_reports_no_inaccurate_matches() {
        let pattern = any_method_of("org.other.Service");
        let found =
            BinaryMatchResolver::new(&pattern, &MetadataBinder).locate_matches("/lib/a.jar", &service());
        assert!(found.is_empty());
    }

    #[test]
    fn test_failed_resolution_falls_back_to_signatures() {
        let pattern = any_method_of("com.acme.Service");
        let found = BinaryMatchResolver::new(&pattern, &NoBinder).locate_matches("/lib/a.jar", &service());
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|m| m.accuracy == Accuracy::Inaccurate));
    }

    #[test]
    fn test_unqualified_pattern_skips_resolution() {
        let pattern = PatternBuilder::new(LimitTo::Declarations)
            .rule(MatchRule::new(MatchMode::Prefix, true))
            .method(None, "st", None, None, false)
            .unwrap();
        let mut ty = service();
        ty.methods.push(BinaryMethod::new("stall", "(Q)V"));
        let found = BinaryMatchResolver::new(&pattern, &MetadataBinder).locate_matches("/lib/a.jar", &ty);
        assert_eq!(
            summary(&found),
            vec![
                ("start".to_string(), Accuracy::Inaccurate),
                ("stop".to_string(), Accuracy::Inaccurate),
            ]
        );
    }

    #[test]
    fn test_type_declaration_match_short_circuits() {
        let pattern = PatternBuilder::new(LimitTo::Declarations)
            .type_declaration(Some("com.acme"), None, "Service", Some(TypeKind::Class))
            .unwrap();
        let found =
            BinaryMatchResolver::new(&pattern, &MetadataBinder).locate_matches("/lib/a.jar", &service());
        assert_eq!(
            found,
            vec![BinaryMatch {
                path: "/lib/a.jar|com/acme/Service.class".to_string(),
                element: BinaryElement::Type {
                    name: "com.acme.Service".to_string()
                },
                accuracy: Accuracy::Accurate,
                role: MatchRole::Declaration,
            }]
        );
    }

    #[test]
    fn test_annotation_references_are_accurate() {
        let pattern = PatternBuilder::new(LimitTo::References)
            .type_pattern("java.lang.Deprecated")
            .unwrap();
        let mut ty = service();
        ty.methods[1].tag_bits = TagBits::DEPRECATED;
        let found = BinaryMatchResolver::new(&pattern, &MetadataBinder).locate_matches("/lib/a.jar", &ty);
        assert_eq!(summary(&found), vec![("stop".to_string(), Accuracy::Accurate)]);
        assert_eq!(found[0].role, MatchRole::Reference);
    }
}

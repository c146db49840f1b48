//! Validated construction of [`Pattern`]s.
//!
//! The builder carries the settings every kind shares. Each kind constructor takes the
//! name texts for that kind, compiles them under the builder's rule and returns the
//! finished pattern. A `*` or empty name stands for "any name".

use crate::{
    LimitTo, MatchMode, MatchRule, Pattern, PatternError,
    name::NamePattern,
    pattern::{
        ConstructorPattern, FieldPattern, FineGrain, MethodPattern, PackagePattern, PatternKind,
        SuperTypeFilter, SuperTypeReferencePattern, TypeDeclarationPattern, TypeKind,
        TypeNamePattern, TypePattern,
    },
};

/// Builds [`Pattern`]s from name texts.
#[derive(Debug, Clone, Copy)]
pub struct PatternBuilder {
    /// Requested match rule, validated per name.
    rule: MatchRule,
    /// Whether declarations are requested.
    find_declarations: bool,
    /// Whether references are requested.
    find_references: bool,
    /// Reference sub-kind restriction.
    fine_grain: FineGrain,
}

impl PatternBuilder {
    /// Creates a builder for the given occurrences with an exact, case-sensitive rule.
    pub fn new(limit: LimitTo) -> Self {
        let (find_declarations, find_references) = limit.flags();
        Self {
            rule: MatchRule::exact(),
            find_declarations,
            find_references,
            fine_grain: FineGrain::empty(),
        }
    }

    /// Sets the match rule.
    pub fn rule(mut self, rule: MatchRule) -> Self {
        self.rule = rule;
        self
    }

    /// Sets whether declarations are reported.
    pub fn declarations(mut self, find: bool) -> Self {
        self.find_declarations = find;
        self
    }

    /// Sets whether references are reported.
    pub fn references(mut self, find: bool) -> Self {
        self.find_references = find;
        self
    }

    /// Restricts references to the given sub-kinds.
    ///
    /// The restriction travels with the pattern; index searches do not apply it.
    pub fn fine_grain(mut self, fine_grain: FineGrain) -> Self {
        self.fine_grain = fine_grain;
        self
    }

    /// Type pattern from a possibly qualified name (`java.util.Map`, `Map`, `*`).
    pub fn type_pattern(self, name: &str) -> Result<Pattern, PatternError> {
        let (qualification, simple) = split_qualified(name);
        let kind = PatternKind::Type(TypePattern {
            simple_name: self.name(simple)?,
            qualification: self.qualification(qualification)?,
        });
        self.finish(kind, true, true)
    }

    /// Type declaration pattern with separate package and enclosing type names.
    pub fn type_declaration(
        self,
        package: Option<&str>,
        enclosing_type_names: Option<&str>,
        simple_name: &str,
        type_kind: Option<TypeKind>,
    ) -> Result<Pattern, PatternError> {
        let kind = PatternKind::TypeDeclaration(TypeDeclarationPattern {
            simple_name: self.name(simple_name)?,
            package: self.qualification(package)?,
            enclosing_type_names: self.qualification(enclosing_type_names)?,
            type_kind,
        });
        self.finish(kind, true, false)
    }

    /// Super-type reference pattern for a possibly qualified super type name.
    pub fn super_type_reference(
        self,
        name: &str,
        filter: SuperTypeFilter,
    ) -> Result<Pattern, PatternError> {
        let (qualification, simple) = split_qualified(name);
        let kind = PatternKind::SuperTypeReference(SuperTypeReferencePattern {
            super_simple_name: self.name(simple)?,
            super_qualification: self.qualification(qualification)?,
            filter,
        });
        self.finish(kind, false, true)
    }

    /// Method pattern.
    ///
    /// `declaring_type` is a possibly qualified type name. `parameters` of `None` leaves
    /// the parameter count unknown.
    pub fn method(
        self,
        declaring_type: Option<&str>,
        selector: &str,
        parameters: Option<&[&str]>,
        return_type: Option<&str>,
        varargs: bool,
    ) -> Result<Pattern, PatternError> {
        let (declaring_qualification, declaring_simple_name) =
            declaring_type.map_or((None, "*"), split_qualified);
        let kind = PatternKind::Method(MethodPattern {
            selector: self.name(selector)?,
            declaring_simple_name: self.name(declaring_simple_name)?,
            declaring_qualification: self.qualification(declaring_qualification)?,
            return_type: return_type.map(|t| self.type_name(t)).transpose()?,
            parameters: self.parameters(parameters)?,
            varargs,
        });
        self.finish(kind, true, true)
    }

    /// Constructor pattern for a possibly qualified declaring type.
    pub fn constructor(
        self,
        declaring_type: &str,
        type_arguments: Vec<String>,
        parameters: Option<&[&str]>,
        varargs: bool,
    ) -> Result<Pattern, PatternError> {
        let (qualification, simple) = split_qualified(declaring_type);
        let kind = PatternKind::Constructor(ConstructorPattern {
            declaring_simple_name: self.name(simple)?,
            declaring_qualification: self.qualification(qualification)?,
            parameters: self.parameters(parameters)?,
            varargs,
            type_arguments,
        });
        self.finish(kind, true, true)
    }

    /// Field pattern.
    pub fn field(
        self,
        declaring_type: Option<&str>,
        name: &str,
        field_type: Option<&str>,
    ) -> Result<Pattern, PatternError> {
        let (declaring_qualification, declaring_simple_name) =
            declaring_type.map_or((None, "*"), split_qualified);
        let kind = PatternKind::Field(FieldPattern {
            name: self.name(name)?,
            declaring_simple_name: self.name(declaring_simple_name)?,
            declaring_qualification: self.qualification(declaring_qualification)?,
            field_type: field_type.map(|t| self.type_name(t)).transpose()?,
        });
        self.finish(kind, true, true)
    }

    /// Package pattern for a dotted package name.
    pub fn package(self, name: &str) -> Result<Pattern, PatternError> {
        let kind = PatternKind::Package(PackagePattern {
            name: self.name(name)?,
        });
        self.finish(kind, true, true)
    }

    /// Compiles a primary name under the requested rule; `*` and empty mean any name.
    fn name(&self, text: &str) -> Result<Option<NamePattern>, PatternError> {
        if text.is_empty() || text == "*" {
            return Ok(None);
        }
        NamePattern::compile(text, self.rule).map(Some)
    }

    /// Compiles a qualification.
    ///
    /// Qualifications never use prefix or camel-case matching: they compare exactly
    /// unless they contain wildcards, or the whole pattern is a regular expression.
    fn qualification(&self, text: Option<&str>) -> Result<Option<NamePattern>, PatternError> {
        let Some(text) = text.filter(|t| !t.is_empty() && *t != "*") else {
            return Ok(None);
        };
        let mode = if self.rule.mode == MatchMode::Regex {
            MatchMode::Regex
        } else {
            MatchMode::Exact
        };
        NamePattern::compile(text, MatchRule::new(mode, self.rule.case_sensitive)).map(Some)
    }

    /// Compiles a type name used in a signature (parameter, return or field type).
    fn type_name(&self, text: &str) -> Result<TypeNamePattern, PatternError> {
        let (qualification, simple) = split_qualified(text);
        let rule = MatchRule::new(MatchMode::Exact, self.rule.case_sensitive);
        let simple_name = if simple.is_empty() || simple == "*" {
            None
        } else {
            Some(NamePattern::compile(simple, rule)?)
        };
        Ok(TypeNamePattern {
            simple_name,
            qualification: self.qualification(qualification)?,
        })
    }

    /// Compiles a parameter list.
    fn parameters(
        &self,
        parameters: Option<&[&str]>,
    ) -> Result<Option<Vec<TypeNamePattern>>, PatternError> {
        parameters
            .map(|params| params.iter().map(|p| self.type_name(p)).collect())
            .transpose()
    }

    /// Applies the kind's occurrence restrictions and assembles the pattern.
    fn finish(
        self,
        kind: PatternKind,
        declarations_allowed: bool,
        references_allowed: bool,
    ) -> Result<Pattern, PatternError> {
        let find_declarations = self.find_declarations && declarations_allowed;
        let find_references = self.find_references && references_allowed;
        if !find_declarations && !find_references {
            return Err(PatternError::NoSearchTarget);
        }

        let primary = primary_name(&kind).map(NamePattern::text);
        let rule = self.rule.validate(primary);
        Ok(Pattern::assemble(
            kind,
            rule,
            find_declarations,
            find_references,
            self.fine_grain,
        ))
    }
}

/// The name the index key is built from.
pub(crate) fn primary_name(kind: &PatternKind) -> Option<&NamePattern> {
    match kind {
        PatternKind::Type(t) => t.simple_name.as_ref(),
        PatternKind::TypeDeclaration(t) => t.simple_name.as_ref(),
        PatternKind::SuperTypeReference(s) => s.super_simple_name.as_ref(),
        PatternKind::Method(m) => m.selector.as_ref(),
        PatternKind::Constructor(c) => c.declaring_simple_name.as_ref(),
        PatternKind::Field(f) => f.name.as_ref(),
        PatternKind::Package(p) => p.name.as_ref(),
    }
}

/// Splits `a.b.C` into `(Some("a.b"), "C")`, ignoring dots inside `<...>`.
pub(crate) fn split_qualified(name: &str) -> (Option<&str>, &str) {
    let body = name.strip_suffix("...").unwrap_or(name);
    let mut depth = 0usize;
    let mut last_dot = None;
    for (i, ch) in body.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => last_dot = Some(i),
            _ => {}
        }
    }
    match last_dot {
        Some(i) => (Some(&name[..i]), &name[i + 1..]),
        None => (None, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neither_declarations_nor_references_is_rejected() {
        let err = PatternBuilder::new(LimitTo::References)
            .references(false)
            .type_pattern("Foo")
            .unwrap_err();
        assert!(matches!(err, PatternError::NoSearchTarget));

        // A super-type reference pattern can only look for references.
        let err = PatternBuilder::new(LimitTo::Declarations)
            .super_type_reference("Object", SuperTypeFilter::All)
            .unwrap_err();
        assert!(matches!(err, PatternError::NoSearchTarget));
    }

    #[test]
    fn qualified_names_are_split() {
        assert_eq!(split_qualified("java.util.Map"), (Some("java.util"), "Map"));
        assert_eq!(split_qualified("Map"), (None, "Map"));
        assert_eq!(
            split_qualified("java.util.Map<java.lang.String, a.B>"),
            (Some("java.util"), "Map<java.lang.String, a.B>")
        );
        assert_eq!(split_qualified("a.B..."), (Some("a"), "B..."));
    }

    #[test]
    fn star_names_match_anything() {
        let pattern = PatternBuilder::new(LimitTo::References)
            .method(None, "*", None, None, false)
            .unwrap();
        let PatternKind::Method(m) = pattern.kind() else {
            panic!("expected a method pattern");
        };
        assert!(m.selector.is_none());
        assert!(m.declaring_simple_name.is_none());
    }

    #[test]
    fn rule_is_validated_against_primary_name() {
        let pattern = PatternBuilder::new(LimitTo::Declarations)
            .type_pattern("Foo*")
            .unwrap();
        assert_eq!(pattern.rule().mode, MatchMode::WildcardPattern);
    }

    #[test]
    fn must_resolve_follows_qualification() {
        let unqualified = PatternBuilder::new(LimitTo::References)
            .method(None, "run", Some(&["int"]), None, false)
            .unwrap();
        assert!(!unqualified.must_resolve());

        let qualified_param = PatternBuilder::new(LimitTo::References)
            .method(None, "run", Some(&["java.lang.String"]), None, false)
            .unwrap();
        assert!(qualified_param.must_resolve());

        let ctor_refs = PatternBuilder::new(LimitTo::References)
            .constructor("Foo", Vec::new(), None, false)
            .unwrap();
        assert!(ctor_refs.must_resolve());

        let ctor_decls = PatternBuilder::new(LimitTo::Declarations)
            .constructor("Foo", Vec::new(), None, false)
            .unwrap();
        assert!(!ctor_decls.must_resolve());
    }

    #[test]
    fn polymorphic_only_for_method_references() {
        let method_refs = PatternBuilder::new(LimitTo::References)
            .method(None, "run", None, None, false)
            .unwrap();
        assert!(method_refs.is_polymorphic_search());

        let method_decls = PatternBuilder::new(LimitTo::Declarations)
            .method(None, "run", None, None, false)
            .unwrap();
        assert!(!method_decls.is_polymorphic_search());

        let field_refs = PatternBuilder::new(LimitTo::References)
            .field(None, "count", None)
            .unwrap();
        assert!(!field_refs.is_polymorphic_search());
    }

    #[test]
    fn categories_union_declarations_and_references() {
        let pattern = PatternBuilder::new(LimitTo::AllOccurrences)
            .constructor("Foo", Vec::new(), Some(&[]), false)
            .unwrap();
        assert_eq!(pattern.categories(), vec!["constructorDecl", "constructorRef"]);

        let pattern = PatternBuilder::new(LimitTo::AllOccurrences)
            .type_declaration(None, None, "Foo", None)
            .unwrap();
        assert_eq!(pattern.categories(), vec!["typeDecl"]);
    }

    #[test]
    fn display_prints_kind_body_and_rule() {
        let pattern = PatternBuilder::new(LimitTo::References)
            .constructor("com.acme.Foo", Vec::new(), Some(&["int", "String"]), false)
            .unwrap();
        assert_eq!(
            pattern.to_string(),
            "ConstructorPattern: com.acme.Foo(int, String), references, exact match, case sensitive"
        );
    }
}

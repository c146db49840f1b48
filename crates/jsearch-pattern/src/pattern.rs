//! The search pattern tagged union.
//!
//! A [`Pattern`] holds the fields every kind shares (match rule, declaration/reference
//! flags, fine-grain reference flags) and a [`PatternKind`] with the per-kind payload.
//! Patterns are immutable once built; use [`crate::PatternBuilder`] or
//! [`crate::parse_pattern`] to create them.

use std::fmt;

use bitflags::bitflags;

use crate::{
    MatchRule,
    category::{
        CONSTRUCTOR_DECL, CONSTRUCTOR_REF, FIELD_DECL, METHOD_DECL, METHOD_REF, REF, SUPER_REF,
        TYPE_DECL,
    },
    name::NamePattern,
};

bitflags! {
    /// Sub-kinds of references a pattern is restricted to.
    ///
    /// An empty set means every kind of reference. The flags are advisory: index keys do
    /// not record where a reference occurs, so an index search reports every reference and
    /// leaves the restriction to whoever resolves the matches against source.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FineGrain: u32 {
        /// Type references in field declarations.
        const FIELD_DECLARATION_TYPE_REFERENCE = 0x40;
        /// Type references in local variable declarations.
        const LOCAL_VARIABLE_DECLARATION_TYPE_REFERENCE = 0x80;
        /// Type references in parameter declarations.
        const PARAMETER_DECLARATION_TYPE_REFERENCE = 0x100;
        /// Type references in `extends`/`implements` clauses.
        const SUPERTYPE_TYPE_REFERENCE = 0x200;
        /// Type references in `throws` clauses.
        const THROWS_CLAUSE_TYPE_REFERENCE = 0x400;
        /// Type references in casts.
        const CAST_TYPE_REFERENCE = 0x800;
        /// Type references in `catch` clauses.
        const CATCH_TYPE_REFERENCE = 0x1000;
        /// Type references in allocation expressions.
        const CLASS_INSTANCE_CREATION_TYPE_REFERENCE = 0x2000;
        /// Type references in method return types.
        const RETURN_TYPE_REFERENCE = 0x4000;
        /// Type references in import declarations.
        const IMPORT_DECLARATION_TYPE_REFERENCE = 0x8000;
        /// Type references as annotations.
        const ANNOTATION_TYPE_REFERENCE = 0x10000;
        /// Type references in type arguments.
        const TYPE_ARGUMENT_TYPE_REFERENCE = 0x20000;
        /// Member references qualified by `super`.
        const SUPER_REFERENCE = 0x1000000;
        /// Member references qualified by an expression or type.
        const QUALIFIED_REFERENCE = 0x2000000;
        /// Member references qualified by `this`.
        const THIS_REFERENCE = 0x4000000;
        /// Unqualified member references with an implicit `this`.
        const IMPLICIT_THIS_REFERENCE = 0x8000000;
    }
}

/// Kind of a type declaration, as encoded in index keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// A class.
    Class,
    /// An interface.
    Interface,
    /// An enum.
    Enum,
    /// An annotation type.
    Annotation,
    /// A record.
    Record,
}

impl TypeKind {
    /// The single-character code used in index keys.
    pub fn code(self) -> char {
        match self {
            Self::Class => 'C',
            Self::Interface => 'I',
            Self::Enum => 'E',
            Self::Annotation => 'A',
            Self::Record => 'R',
        }
    }

    /// Parses an index-key code.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'C' => Some(Self::Class),
            'I' => Some(Self::Interface),
            'E' => Some(Self::Enum),
            'A' => Some(Self::Annotation),
            'R' => Some(Self::Record),
            _ => None,
        }
    }
}

/// Whether a super-type reference names a superclass or a superinterface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuperKind {
    /// `extends` of a class.
    Class,
    /// `implements`, or `extends` of an interface.
    Interface,
}

impl SuperKind {
    /// The single-character code used in index keys.
    pub fn code(self) -> char {
        match self {
            Self::Class => 'C',
            Self::Interface => 'I',
        }
    }

    /// Parses an index-key code.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'C' => Some(Self::Class),
            'I' => Some(Self::Interface),
            _ => None,
        }
    }
}

/// Which super-type references a [`SuperTypeReferencePattern`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SuperTypeFilter {
    /// Superclasses and superinterfaces.
    #[default]
    All,
    /// Superclasses only.
    Classes,
    /// Superinterfaces only.
    Interfaces,
}

impl SuperTypeFilter {
    /// Checks whether a reference of `kind` passes the filter. Unknown kinds pass.
    pub fn accepts(self, kind: Option<SuperKind>) -> bool {
        match (self, kind) {
            (Self::All, _) | (_, None) => true,
            (Self::Classes, Some(kind)) => kind == SuperKind::Class,
            (Self::Interfaces, Some(kind)) => kind == SuperKind::Interface,
        }
    }
}

/// Which occurrences a pattern looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LimitTo {
    /// Declarations only.
    Declarations,
    /// References only.
    #[default]
    References,
    /// Declarations and references.
    AllOccurrences,
}

impl LimitTo {
    /// Splits into `(find_declarations, find_references)`.
    pub fn flags(self) -> (bool, bool) {
        match self {
            Self::Declarations => (true, false),
            Self::References => (false, true),
            Self::AllOccurrences => (true, true),
        }
    }
}

/// The element kind a pattern searches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchFor {
    /// Types (declarations and references).
    #[default]
    Type,
    /// Type declarations with package/enclosing-type/kind detail.
    TypeDeclaration,
    /// References to a type in `extends`/`implements` clauses.
    SuperTypeReference,
    /// Methods.
    Method,
    /// Constructors.
    Constructor,
    /// Fields.
    Field,
    /// Packages.
    Package,
}

/// A type name in a signature, split into simple name and qualification.
#[derive(Debug, Clone)]
pub struct TypeNamePattern {
    /// Simple name, with array dimensions (`String[]`). `None` matches any type.
    pub simple_name: Option<NamePattern>,
    /// Dotted qualification (`java.lang`), if given.
    pub qualification: Option<NamePattern>,
}

impl fmt::Display for TypeNamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(q) = &self.qualification {
            write!(f, "{}.", q.text())?;
        }
        f.write_str(self.simple_name.as_ref().map_or("*", NamePattern::text))
    }
}

/// Type references, and type declarations when declarations are requested.
#[derive(Debug, Clone)]
pub struct TypePattern {
    /// Simple type name.
    pub simple_name: Option<NamePattern>,
    /// Qualification: package plus enclosing type names.
    pub qualification: Option<NamePattern>,
}

/// Type declarations with full key detail.
#[derive(Debug, Clone)]
pub struct TypeDeclarationPattern {
    /// Simple type name.
    pub simple_name: Option<NamePattern>,
    /// Package name.
    pub package: Option<NamePattern>,
    /// Dotted names of enclosing types.
    pub enclosing_type_names: Option<NamePattern>,
    /// Required declaration kind, if any.
    pub type_kind: Option<TypeKind>,
}

/// Super-type references.
#[derive(Debug, Clone)]
pub struct SuperTypeReferencePattern {
    /// Simple name of the referenced super type.
    pub super_simple_name: Option<NamePattern>,
    /// Qualification of the referenced super type.
    pub super_qualification: Option<NamePattern>,
    /// Superclass/superinterface filter.
    pub filter: SuperTypeFilter,
}

/// Methods.
#[derive(Debug, Clone)]
pub struct MethodPattern {
    /// Method name.
    pub selector: Option<NamePattern>,
    /// Simple name of the declaring type.
    pub declaring_simple_name: Option<NamePattern>,
    /// Qualification of the declaring type.
    pub declaring_qualification: Option<NamePattern>,
    /// Return type.
    pub return_type: Option<TypeNamePattern>,
    /// Parameter types; `None` when the parameter list is unknown.
    pub parameters: Option<Vec<TypeNamePattern>>,
    /// Whether the last parameter is variable-arity.
    pub varargs: bool,
}

/// Constructors.
#[derive(Debug, Clone)]
pub struct ConstructorPattern {
    /// Simple name of the declaring type.
    pub declaring_simple_name: Option<NamePattern>,
    /// Qualification of the declaring type.
    pub declaring_qualification: Option<NamePattern>,
    /// Parameter types; `None` when the parameter list is unknown.
    pub parameters: Option<Vec<TypeNamePattern>>,
    /// Whether the last parameter is variable-arity.
    pub varargs: bool,
    /// Type arguments of the declaring type, only consulted when resolving.
    pub type_arguments: Vec<String>,
}

/// Fields.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    /// Field name.
    pub name: Option<NamePattern>,
    /// Simple name of the declaring type.
    pub declaring_simple_name: Option<NamePattern>,
    /// Qualification of the declaring type.
    pub declaring_qualification: Option<NamePattern>,
    /// Field type.
    pub field_type: Option<TypeNamePattern>,
}

/// Packages.
#[derive(Debug, Clone)]
pub struct PackagePattern {
    /// Dotted package name.
    pub name: Option<NamePattern>,
}

/// Per-kind pattern payload.
#[derive(Debug, Clone)]
pub enum PatternKind {
    /// See [`TypePattern`].
    Type(TypePattern),
    /// See [`TypeDeclarationPattern`].
    TypeDeclaration(TypeDeclarationPattern),
    /// See [`SuperTypeReferencePattern`].
    SuperTypeReference(SuperTypeReferencePattern),
    /// See [`MethodPattern`].
    Method(MethodPattern),
    /// See [`ConstructorPattern`].
    Constructor(ConstructorPattern),
    /// See [`FieldPattern`].
    Field(FieldPattern),
    /// See [`PackagePattern`].
    Package(PackagePattern),
}

/// An immutable search pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Per-kind payload.
    pub(crate) kind: PatternKind,
    /// Rule the pattern was built with.
    pub(crate) rule: MatchRule,
    /// Whether declarations are reported.
    pub(crate) find_declarations: bool,
    /// Whether references are reported.
    pub(crate) find_references: bool,
    /// Reference sub-kind restriction.
    pub(crate) fine_grain: FineGrain,
    /// Whether matches need binding resolution to be accurate.
    pub(crate) must_resolve: bool,
}

impl Pattern {
    /// Assembles a pattern from validated parts, computing `must_resolve`.
    pub(crate) fn assemble(
        kind: PatternKind,
        rule: MatchRule,
        find_declarations: bool,
        find_references: bool,
        fine_grain: FineGrain,
    ) -> Self {
        let must_resolve = must_resolve(&kind, find_references);
        Self {
            kind,
            rule,
            find_declarations,
            find_references,
            fine_grain,
            must_resolve,
        }
    }

    /// Returns the per-kind payload.
    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    /// Returns the rule the pattern was built with.
    pub fn rule(&self) -> MatchRule {
        self.rule
    }

    /// Whether declarations are reported.
    pub fn find_declarations(&self) -> bool {
        self.find_declarations
    }

    /// Whether references are reported.
    pub fn find_references(&self) -> bool {
        self.find_references
    }

    /// Reference sub-kind restriction; empty means all references.
    ///
    /// Not applied by index searches; see [`FineGrain`].
    pub fn fine_grain(&self) -> FineGrain {
        self.fine_grain
    }

    /// Whether matches need binding resolution to be reported as accurate.
    pub fn must_resolve(&self) -> bool {
        self.must_resolve
    }

    /// Whether the search should widen visibility to related projects.
    ///
    /// Only method reference searches ask for it: a call through an overriding or
    /// overridden method may live in a project that only sees the focus indirectly.
    pub fn is_polymorphic_search(&self) -> bool {
        matches!(self.kind, PatternKind::Method(_)) && self.find_references
    }

    /// Index categories this pattern reads.
    pub fn categories(&self) -> Vec<&'static str> {
        let (decl, refs): (&[&'static str], &[&'static str]) = match &self.kind {
            PatternKind::Type(_) => (&[TYPE_DECL], &[REF]),
            PatternKind::TypeDeclaration(_) => (&[TYPE_DECL], &[]),
            PatternKind::SuperTypeReference(_) => (&[], &[SUPER_REF]),
            PatternKind::Method(_) => (&[METHOD_DECL], &[METHOD_REF]),
            PatternKind::Constructor(_) => (&[CONSTRUCTOR_DECL], &[CONSTRUCTOR_REF]),
            PatternKind::Field(_) => (&[FIELD_DECL], &[REF]),
            PatternKind::Package(_) => (&[TYPE_DECL], &[REF]),
        };

        let mut categories = Vec::with_capacity(2);
        if self.find_declarations {
            categories.extend_from_slice(decl);
        }
        if self.find_references {
            categories.extend_from_slice(refs);
        }
        categories
    }

    /// The declared parameter count of a method or constructor pattern, if known.
    pub fn parameter_count(&self) -> Option<usize> {
        match &self.kind {
            PatternKind::Method(m) => m.parameters.as_ref().map(Vec::len),
            PatternKind::Constructor(c) => c.parameters.as_ref().map(Vec::len),
            _ => None,
        }
    }

    /// Whether a method or constructor pattern is variable-arity.
    pub fn is_varargs(&self) -> bool {
        match &self.kind {
            PatternKind::Method(m) => m.varargs,
            PatternKind::Constructor(c) => c.varargs,
            _ => false,
        }
    }

    /// Short kind label used in printed patterns.
    fn kind_label(&self) -> &'static str {
        match self.kind {
            PatternKind::Type(_) => "TypePattern",
            PatternKind::TypeDeclaration(_) => "TypeDeclarationPattern",
            PatternKind::SuperTypeReference(_) => "SuperTypeReferencePattern",
            PatternKind::Method(_) => "MethodPattern",
            PatternKind::Constructor(_) => "ConstructorPattern",
            PatternKind::Field(_) => "FieldPattern",
            PatternKind::Package(_) => "PackagePattern",
        }
    }
}

/// Decides whether matches of `kind` need binding resolution to be accurate.
fn must_resolve(kind: &PatternKind, find_references: bool) -> bool {
    let any_qualified = |params: &Option<Vec<TypeNamePattern>>| {
        params
            .iter()
            .flatten()
            .any(|p| p.qualification.is_some())
    };

    match kind {
        PatternKind::Type(t) => t.qualification.is_some(),
        PatternKind::TypeDeclaration(_) | PatternKind::Package(_) => false,
        PatternKind::SuperTypeReference(s) => s.super_qualification.is_some(),
        PatternKind::Method(m) => {
            m.declaring_simple_name.is_some()
                || m.declaring_qualification.is_some()
                || m.return_type.is_some()
                || any_qualified(&m.parameters)
        }
        // Default constructors and explicit constructor calls only show up resolved.
        PatternKind::Constructor(c) => {
            c.declaring_qualification.is_some() || any_qualified(&c.parameters) || find_references
        }
        PatternKind::Field(f) => {
            f.declaring_simple_name.is_some()
                || f.declaring_qualification.is_some()
                || f.field_type.is_some()
                || find_references
        }
    }
}

/// Writes an optional name, printing `*` when absent.
fn write_name(f: &mut fmt::Formatter<'_>, name: Option<&NamePattern>) -> fmt::Result {
    f.write_str(name.map_or("*", NamePattern::text))
}

/// Writes `qualification.simple`, omitting an absent qualification.
fn write_qualified(
    f: &mut fmt::Formatter<'_>,
    qualification: Option<&NamePattern>,
    simple: Option<&NamePattern>,
) -> fmt::Result {
    if let Some(q) = qualification {
        write!(f, "{}.", q.text())?;
    }
    write_name(f, simple)
}

/// Writes a parenthesized parameter list, or nothing when the list is unknown.
fn write_parameters(
    f: &mut fmt::Formatter<'_>,
    parameters: Option<&Vec<TypeNamePattern>>,
) -> fmt::Result {
    let Some(parameters) = parameters else {
        return Ok(());
    };
    f.write_str("(")?;
    for (i, p) in parameters.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{p}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.kind_label())?;
        match &self.kind {
            PatternKind::Type(t) => {
                write_qualified(f, t.qualification.as_ref(), t.simple_name.as_ref())?;
            }
            PatternKind::TypeDeclaration(t) => {
                if let Some(kind) = t.type_kind {
                    write!(f, "{kind:?} ")?;
                }
                write_qualified(f, t.package.as_ref(), t.simple_name.as_ref())?;
                if let Some(enclosing) = &t.enclosing_type_names {
                    write!(f, " in {}", enclosing.text())?;
                }
            }
            PatternKind::SuperTypeReference(s) => {
                write_qualified(f, s.super_qualification.as_ref(), s.super_simple_name.as_ref())?;
                match s.filter {
                    SuperTypeFilter::All => {}
                    SuperTypeFilter::Classes => f.write_str(" (classes)")?,
                    SuperTypeFilter::Interfaces => f.write_str(" (interfaces)")?,
                }
            }
            PatternKind::Method(m) => {
                if m.declaring_simple_name.is_some() || m.declaring_qualification.is_some() {
                    write_qualified(
                        f,
                        m.declaring_qualification.as_ref(),
                        m.declaring_simple_name.as_ref(),
                    )?;
                    f.write_str(".")?;
                }
                write_name(f, m.selector.as_ref())?;
                write_parameters(f, m.parameters.as_ref())?;
                if let Some(ret) = &m.return_type {
                    write!(f, " --> {ret}")?;
                }
            }
            PatternKind::Constructor(c) => {
                write_qualified(
                    f,
                    c.declaring_qualification.as_ref(),
                    c.declaring_simple_name.as_ref(),
                )?;
                if !c.type_arguments.is_empty() {
                    write!(f, "<{}>", c.type_arguments.join(", "))?;
                }
                write_parameters(f, c.parameters.as_ref())?;
            }
            PatternKind::Field(field) => {
                if field.declaring_simple_name.is_some() || field.declaring_qualification.is_some()
                {
                    write_qualified(
                        f,
                        field.declaring_qualification.as_ref(),
                        field.declaring_simple_name.as_ref(),
                    )?;
                    f.write_str(".")?;
                }
                write_name(f, field.name.as_ref())?;
                if let Some(ty) = &field.field_type {
                    write!(f, " --> {ty}")?;
                }
            }
            PatternKind::Package(p) => write_name(f, p.name.as_ref())?,
        }

        if self.is_varargs() {
            f.write_str(" varargs")?;
        }
        let limit = match (self.find_declarations, self.find_references) {
            (true, true) => "all occurrences",
            (true, false) => "declarations",
            _ => "references",
        };
        write!(f, ", {limit}, {}", self.rule)?;
        if !self.fine_grain.is_empty() {
            write!(f, ", fine grain {:#x}", self.fine_grain.bits())?;
        }
        Ok(())
    }
}

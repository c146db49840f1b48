//! Annotation references in compiled metadata.
//!
//! A type reference pattern matches a compiled type, method or field when one of its
//! annotations names the type. Annotations the compiler has already classified are only
//! recorded as [`TagBits`], so those are checked against a table of standard names.

use jsearch_pattern::{TypePattern, matches_name};

use super::{
    descriptor,
    metadata::{BinaryAnnotation, BinaryField, BinaryMethod, BinaryType, ElementValue, TagBits},
};

/// Qualified names implied by each standard annotation tag bit.
const STANDARD_ANNOTATIONS: &[(TagBits, &[&str])] = &[
    (
        TagBits::ANNOTATION_TARGET,
        &["java.lang.annotation.Target", "java.lang.annotation.ElementType"],
    ),
    (
        TagBits::ANNOTATION_RETENTION,
        &["java.lang.annotation.Retention", "java.lang.annotation.RetentionPolicy"],
    ),
    (TagBits::DEPRECATED, &["java.lang.Deprecated"]),
    (TagBits::ANNOTATION_DOCUMENTED, &["java.lang.annotation.Documented"]),
    (TagBits::ANNOTATION_INHERITED, &["java.lang.annotation.Inherited"]),
    (TagBits::ANNOTATION_OVERRIDE, &["java.lang.Override"]),
    (TagBits::ANNOTATION_SUPPRESS_WARNINGS, &["java.lang.SuppressWarnings"]),
    (TagBits::ANNOTATION_SAFE_VARARGS, &["java.lang.SafeVarargs"]),
    (
        TagBits::ANNOTATION_POLYMORPHIC_SIGNATURE,
        &["java.lang.invoke.MethodHandle.PolymorphicSignature"],
    ),
];

/// An element of a compiled type carrying a matching annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Annotated<'a> {
    /// The type itself.
    Type,
    /// One of its methods.
    Method(&'a BinaryMethod),
    /// One of its fields.
    Field(&'a BinaryField),
}

/// Elements of `ty` whose annotations reference the type named by `pattern`.
pub(crate) fn scan<'a>(pattern: &TypePattern, ty: &'a BinaryType) -> Vec<Annotated<'a>> {
    let mut found = Vec::new();
    if references(pattern, &ty.annotations, ty.tag_bits) {
        found.push(Annotated::Type);
    }
    for method in &ty.methods {
        if references(pattern, &method.annotations, method.tag_bits) {
            found.push(Annotated::Method(method));
        }
    }
    for field in &ty.fields {
        if references(pattern, &field.annotations, field.tag_bits) {
            found.push(Annotated::Field(field));
        }
    }
    found
}

/// Checks one element's annotations and tag bits.
fn references(pattern: &TypePattern, annotations: &[BinaryAnnotation], tag_bits: TagBits) -> bool {
    annotations.iter().any(|a| annotation_references(pattern, a))
        || standard_annotations_reference(pattern, tag_bits)
}

/// Checks an annotation's type, then the annotations nested in its values.
fn annotation_references(pattern: &TypePattern, annotation: &BinaryAnnotation) -> bool {
    let type_matches = match descriptor::parse_field_descriptor(&annotation.type_name) {
        Ok(ty) => type_name_matches(pattern, &ty.name),
        Err(err) => {
            tracing::debug!(error = %err, "skipping unreadable annotation");
            false
        }
    };
    type_matches
        || annotation
            .pairs
            .iter()
            .any(|pair| value_references(pattern, &pair.value))
}

/// Recurses into annotation-valued and array-valued elements.
fn value_references(pattern: &TypePattern, value: &ElementValue) -> bool {
    match value {
        ElementValue::Annotation(nested) => annotation_references(pattern, nested),
        ElementValue::Array(values) => values.iter().any(|v| value_references(pattern, v)),
        ElementValue::Constant(_) | ElementValue::Enum { .. } | ElementValue::Class(_) => false,
    }
}

/// Checks the standard names implied by `tag_bits`.
fn standard_annotations_reference(pattern: &TypePattern, tag_bits: TagBits) -> bool {
    STANDARD_ANNOTATIONS
        .iter()
        .filter(|(bit, _)| tag_bits.contains(*bit))
        .flat_map(|(_, names)| names.iter())
        .any(|name| type_name_matches(pattern, name))
}

/// Matches a dotted qualified name against the pattern's simple name and qualification.
fn type_name_matches(pattern: &TypePattern, qualified: &str) -> bool {
    let (qualification, simple) = qualified.rsplit_once('.').unwrap_or(("", qualified));
    matches_name(pattern.simple_name.as_ref(), simple)
        && matches_name(pattern.qualification.as_ref(), qualification)
}

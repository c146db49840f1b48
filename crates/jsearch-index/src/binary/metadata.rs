//! Compiled type metadata.
//!
//! Names are kept as they appear in class files: types are slash-qualified with `$`
//! between nested types (`com/acme/Outer$Inner`), members carry raw JVM descriptors and
//! optional generic signatures.

use bitflags::bitflags;
use jsearch_pattern::TypeKind;
use serde::{Deserialize, Serialize};

use crate::path::CLASS_SUFFIX;

bitflags! {
    /// Standard annotations the compiler has already recorded as flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TagBits: u32 {
        /// `@Target`.
        const ANNOTATION_TARGET = 1 << 0;
        /// `@Retention`.
        const ANNOTATION_RETENTION = 1 << 1;
        /// `@Deprecated`.
        const DEPRECATED = 1 << 2;
        /// `@Documented`.
        const ANNOTATION_DOCUMENTED = 1 << 3;
        /// `@Inherited`.
        const ANNOTATION_INHERITED = 1 << 4;
        /// `@Override`.
        const ANNOTATION_OVERRIDE = 1 << 5;
        /// `@SuppressWarnings`.
        const ANNOTATION_SUPPRESS_WARNINGS = 1 << 6;
        /// `@SafeVarargs`.
        const ANNOTATION_SAFE_VARARGS = 1 << 7;
        /// `@PolymorphicSignature`.
        const ANNOTATION_POLYMORPHIC_SIGNATURE = 1 << 8;
    }
}

/// Value of an annotation element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementValue {
    /// Primitive or string constant, as written.
    Constant(String),
    /// Enum constant.
    Enum {
        /// Descriptor of the enum type.
        type_name: String,
        /// Constant name.
        constant: String,
    },
    /// Class literal, as a descriptor.
    Class(String),
    /// Nested annotation.
    Annotation(BinaryAnnotation),
    /// Array of values.
    Array(Vec<ElementValue>),
}

/// One `name = value` pair of an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementValuePair {
    /// Element name.
    pub name: String,
    /// Element value.
    pub value: ElementValue,
}

/// An annotation recorded in a class file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryAnnotation {
    /// Descriptor of the annotation type (`Ljava/lang/Deprecated;`).
    pub type_name: String,
    /// Element-value pairs.
    #[serde(default)]
    pub pairs: Vec<ElementValuePair>,
}

impl BinaryAnnotation {
    /// An annotation without elements.
    pub fn marker(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            pairs: Vec::new(),
        }
    }
}

/// A method or constructor of a compiled type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryMethod {
    /// Method name; `<init>` for constructors.
    pub selector: String,
    /// JVM method descriptor.
    pub descriptor: String,
    /// Generic signature, if the method has one.
    #[serde(default)]
    pub signature: Option<String>,
    /// Whether the compiler generated the method.
    #[serde(default)]
    pub synthetic: bool,
    /// Annotations on the method.
    #[serde(default)]
    pub annotations: Vec<BinaryAnnotation>,
    /// Standard annotations recorded as flags.
    #[serde(default)]
    pub tag_bits: TagBits,
}

impl BinaryMethod {
    /// Selector of constructors.
    pub const CONSTRUCTOR: &'static str = "<init>";

    /// A plain method.
    pub fn new(selector: &str, descriptor: &str) -> Self {
        Self {
            selector: selector.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            synthetic: false,
            annotations: Vec::new(),
            tag_bits: TagBits::empty(),
        }
    }

    /// Returns true for constructors.
    pub fn is_constructor(&self) -> bool {
        self.selector == Self::CONSTRUCTOR
    }

    /// Generic signature if present, descriptor otherwise.
    pub fn effective_signature(&self) -> &str {
        self.signature.as_deref().unwrap_or(&self.descriptor)
    }
}

/// A field of a compiled type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryField {
    /// Field name.
    pub name: String,
    /// JVM field descriptor.
    pub descriptor: String,
    /// Generic signature, if the field has one.
    #[serde(default)]
    pub signature: Option<String>,
    /// Annotations on the field.
    #[serde(default)]
    pub annotations: Vec<BinaryAnnotation>,
    /// Standard annotations recorded as flags.
    #[serde(default)]
    pub tag_bits: TagBits,
}

impl BinaryField {
    /// A plain field.
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            annotations: Vec::new(),
            tag_bits: TagBits::empty(),
        }
    }

    /// Generic signature if present, descriptor otherwise.
    pub fn effective_signature(&self) -> &str {
        self.signature.as_deref().unwrap_or(&self.descriptor)
    }
}

/// Metadata of one compiled type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryType {
    /// Slash-qualified name (`com/acme/Outer$Inner`).
    pub name: String,
    /// Declaration kind.
    pub kind: TypeKind,
    /// Slash-qualified superclass name.
    #[serde(default)]
    pub superclass: Option<String>,
    /// Slash-qualified superinterface names.
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Methods and constructors, in class file order.
    #[serde(default)]
    pub methods: Vec<BinaryMethod>,
    /// Fields, in class file order.
    #[serde(default)]
    pub fields: Vec<BinaryField>,
    /// Annotations on the type.
    #[serde(default)]
    pub annotations: Vec<BinaryAnnotation>,
    /// Standard annotations recorded as flags.
    #[serde(default)]
    pub tag_bits: TagBits,
}

impl BinaryType {
    /// A type with no members.
    pub fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            annotations: Vec::new(),
            tag_bits: TagBits::empty(),
        }
    }

    /// Adds a method.
    pub fn with_method(mut self, method: BinaryMethod) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a field.
    pub fn with_field(mut self, field: BinaryField) -> Self {
        self.fields.push(field);
        self
    }

    /// Splits the name into package path and type part (`Outer$Inner`).
    fn split(&self) -> (&str, &str) {
        self.name.rsplit_once('/').unwrap_or(("", &self.name))
    }

    /// Dotted package name.
    pub fn package(&self) -> String {
        self.split().0.replace('/', ".")
    }

    /// Simple name of the type.
    pub fn simple_name(&self) -> &str {
        let type_part = self.split().1;
        type_part.rsplit_once('$').map_or(type_part, |(_, simple)| simple)
    }

    /// Dotted names of the enclosing types, empty for top-level types.
    pub fn enclosing_type_names(&self) -> String {
        let type_part = self.split().1;
        type_part
            .rsplit_once('$')
            .map(|(enclosing, _)| enclosing.replace('$', "."))
            .unwrap_or_default()
    }

    /// Package plus enclosing type names.
    pub fn qualification(&self) -> String {
        let package = self.package();
        let enclosing = self.enclosing_type_names();
        match (package.is_empty(), enclosing.is_empty()) {
            (_, true) => package,
            (true, false) => enclosing,
            (false, false) => format!("{package}.{enclosing}"),
        }
    }

    /// Fully qualified source name (`com.acme.Outer.Inner`).
    pub fn qualified_name(&self) -> String {
        self.name.replace(['/', '$'], ".")
    }

    /// Dotted binary name (`com.acme.Outer$Inner`).
    pub fn binary_name(&self) -> String {
        self.name.replace('/', ".")
    }

    /// Path of the class file inside its archive.
    pub fn member_path(&self) -> String {
        format!("{}{CLASS_SUFFIX}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_type_names() {
        let ty = BinaryType::new("com/acme/Outer$Middle$Inner", TypeKind::Class);
        assert_eq!(ty.package(), "com.acme");
        assert_eq!(ty.simple_name(), "Inner");
        assert_eq!(ty.enclosing_type_names(), "Outer.Middle");
        assert_eq!(ty.qualification(), "com.acme.Outer.Middle");
        assert_eq!(ty.qualified_name(), "com.acme.Outer.Middle.Inner");
        assert_eq!(ty.binary_name(), "com.acme.Outer$Middle$Inner");
        assert_eq!(ty.member_path(), "com/acme/Outer$Middle$Inner.class");
    }

    #[test]
    fn test_default_package_type_names() {
        let ty = BinaryType::new("Main", TypeKind::Class);
        assert_eq!(ty.package(), "");
        assert_eq!(ty.simple_name(), "Main");
        assert_eq!(ty.qualification(), "");
    }

    #[test]
    fn test_tag_bits_deserialize_from_flag_names() {
        let method: BinaryMethod = serde_json::from_str(
            r#"{"selector": "run", "descriptor": "()V", "tag_bits": "DEPRECATED | ANNOTATION_OVERRIDE"}"#,
        )
        .unwrap();
        assert_eq!(
            method.tag_bits,
            TagBits::DEPRECATED | TagBits::ANNOTATION_OVERRIDE
        );
        assert!(!method.synthetic);
        assert_eq!(method.effective_signature(), "()V");
    }
}

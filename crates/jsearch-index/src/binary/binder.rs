//! Binding resolution of compiled types.

use jsearch_pattern::Pattern;

use super::{
    descriptor::{self, DescriptorError},
    level::{self, FieldBinding, MatchLevel, MemberBinding, MethodBinding, TypeBinding},
    metadata::{BinaryField, BinaryMethod, BinaryType},
};
use crate::SearchError;

/// Resolves compiled types to bindings.
pub trait Binder: Send + Sync {
    /// Resolves `ty`, or returns `None` if it cannot be resolved.
    ///
    /// The binding may hold fewer members than the metadata: members the binder cannot
    /// or does not resolve are left out.
    fn resolve_binary_type(&self, ty: &BinaryType) -> Option<TypeBinding>;

    /// Level of a resolved member against `pattern`.
    fn resolve_level(&self, pattern: &Pattern, member: MemberBinding<'_>) -> MatchLevel {
        level::resolve_level(pattern, member)
    }
}

/// Reads compiled type metadata out of archives.
pub trait BinaryTypeProvider: Send + Sync {
    /// Metadata of the class file at `member_path` inside `archive`, if present.
    fn binary_type(
        &self,
        archive: &str,
        member_path: &str,
    ) -> Result<Option<BinaryType>, SearchError>;
}

/// Binder working from the metadata alone.
///
/// Resolves every member whose descriptors parse, leaving out synthetic members.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataBinder;

impl Binder for MetadataBinder {
    fn resolve_binary_type(&self, ty: &BinaryType) -> Option<TypeBinding> {
        let methods = ty
            .methods
            .iter()
            .filter(|m| !m.synthetic)
            .filter_map(|m| method_binding(ty, m).ok())
            .collect();
        let fields = ty
            .fields
            .iter()
            .filter_map(|f| field_binding(ty, f).ok())
            .collect();
        Some(TypeBinding {
            name: ty.qualified_name(),
            methods,
            fields,
        })
    }
}

/// Builds the binding of a raw method from its effective signature.
pub fn method_binding(
    ty: &BinaryType,
    method: &BinaryMethod,
) -> Result<MethodBinding, DescriptorError> {
    let parsed = descriptor::parse_method_descriptor(method.effective_signature())?;
    let return_type = if method.is_constructor() {
        None
    } else {
        Some(parsed.return_type.qualified_name())
    };
    Ok(MethodBinding {
        declaring_type: ty.qualified_name(),
        selector: method.selector.clone(),
        signature: method.effective_signature().to_string(),
        parameter_types: parsed
            .parameters
            .iter()
            .map(descriptor::JavaType::qualified_name)
            .collect(),
        return_type,
    })
}

/// Builds the binding of a raw field from its effective signature.
pub fn field_binding(ty: &BinaryType, field: &BinaryField) -> Result<FieldBinding, DescriptorError> {
    let parsed = descriptor::parse_field_descriptor(field.effective_signature())?;
    Ok(FieldBinding {
        declaring_type: ty.qualified_name(),
        name: field.name.clone(),
        signature: field.effective_signature().to_string(),
        field_type: Some(parsed.qualified_name()),
    })
}

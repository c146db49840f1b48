//! Match resolution on compiled types inside archives.
//!
//! Index lookups against an archive only say which class files may match. The
//! [`BinaryMatchResolver`] reads each class file's metadata and decides, per element,
//! whether the match is accurate (a resolved binding matches) or inaccurate (only the
//! raw names and signatures match).

mod annotations;
mod binder;
pub mod descriptor;
mod level;
pub mod metadata;
mod resolver;

pub use binder::{Binder, BinaryTypeProvider, MetadataBinder, field_binding, method_binding};
pub use level::{
    FieldBinding, MatchLevel, MemberBinding, MethodBinding, TypeBinding, matches_signature,
    resolve_level,
};
pub use metadata::{
    BinaryAnnotation, BinaryField, BinaryMethod, BinaryType, ElementValue, ElementValuePair,
    TagBits,
};
pub use resolver::{Accuracy, BinaryElement, BinaryMatch, BinaryMatchResolver, MatchRole};

//! Index categories and key separators.
//!
//! Every index entry lives in one category; a query names the categories it reads.
//! Declaration and reference categories are unioned when a pattern asks for both.

/// Type, field and package references.
pub const REF: &str = "ref";
/// Method references (call sites).
pub const METHOD_REF: &str = "methodRef";
/// Constructor references (allocations and explicit constructor calls).
pub const CONSTRUCTOR_REF: &str = "constructorRef";
/// Super-type references (`extends`/`implements` clauses).
pub const SUPER_REF: &str = "superRef";
/// Type declarations.
pub const TYPE_DECL: &str = "typeDecl";
/// Method declarations.
pub const METHOD_DECL: &str = "methodDecl";
/// Constructor declarations.
pub const CONSTRUCTOR_DECL: &str = "constructorDecl";
/// Field declarations.
pub const FIELD_DECL: &str = "fieldDecl";

/// Separator between the fields of an index key.
pub const SEPARATOR: char = '/';
/// Single-star wildcard appended to keys to widen pattern queries.
pub const ONE_STAR: &str = "*";

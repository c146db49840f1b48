//! Search patterns and the index key codec for jsearch.
//!
//! A [`Pattern`] describes what to look for: a type, type declaration, super-type
//! reference, method, constructor, field or package, with a [`MatchRule`] and the
//! occurrences to report. Patterns come from [`PatternBuilder`] or from the textual
//! syntax via [`parse_pattern`]:
//!
//! - **Types**: `java.util.Map`, `N*Exception`
//! - **Constructors**: `com.acme.Foo(int, String)`
//! - **Methods**: `java.util.Map.put(Object, Object) Object`
//! - **Fields**: `Counter.count long`
//! - **Packages**: `com.acme`
//!
//! The [`codec`] turns a pattern into the key each per-container index is queried with,
//! decodes the raw keys the index returns and re-checks them against the pattern.
//!
//! # Example
//!
//! ```
//! use jsearch_pattern::{LimitTo, MatchRule, SearchFor, codec, parse_pattern};
//!
//! let pattern = parse_pattern("Foo(int, int)", SearchFor::Constructor, LimitTo::References,
//!     MatchRule::exact()).unwrap();
//! let query = codec::encode(&pattern);
//! assert_eq!(query.key.as_deref(), Some("Foo/2"));
//! ```

#![warn(missing_docs)]

mod builder;
pub mod category;
pub mod codec;
mod error;
mod lexer;
mod mode;
mod name;
mod parser;
mod pattern;

pub use builder::PatternBuilder;
pub use codec::{DecodedKey, IndexQuery};
pub use error::PatternError;
pub use lexer::{Spanned, Token, tokenize};
pub use mode::{MatchMode, MatchRule, is_valid_camel_case};
pub use name::{NamePattern, camel_case_match, matches_name};
pub use parser::parse_pattern;
pub use pattern::{
    ConstructorPattern, FieldPattern, FineGrain, LimitTo, MethodPattern, PackagePattern,
    Pattern, PatternKind, SearchFor, SuperKind, SuperTypeFilter, SuperTypeReferencePattern,
    TypeDeclarationPattern, TypeKind, TypeNamePattern, TypePattern,
};

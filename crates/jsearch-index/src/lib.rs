//! Container selection, index dispatch and binary match resolution for jsearch.
//!
//! A search runs in three steps:
//!
//! 1. [`IndexSelector`] picks the containers (projects and archives) whose indexes may
//!    hold matches, pruning those that cannot see the search focus.
//! 2. [`MatchDispatcher`] queries each container's [`Index`], decodes and re-checks every
//!    returned key, filters document paths through the [`SearchScope`] and reports the
//!    rest to a [`Requestor`].
//! 3. For documents inside archives, [`binary::BinaryMatchResolver`] reads the compiled
//!    type and reports accurate or inaccurate matches.
//!
//! [`SearchEngine`] wires the steps together. The workspace, its indexes and compiled
//! metadata are collaborators behind traits; [`WorkspaceSnapshot`] implements all of
//! them over a JSON file.
//!
//! # Example
//!
//! ```
//! use jsearch_config::SearchSettings;
//! use jsearch_index::{
//!     CancellationToken, ClasspathEntry, ContainerScope, MemoryIndex, PathCollector,
//!     SearchEngine, WorkspaceSnapshot,
//! };
//! use jsearch_pattern::{LimitTo, PatternBuilder, category};
//!
//! let mut workspace = WorkspaceSnapshot::new();
//! workspace.add_project("/App", vec![ClasspathEntry::source("/App/src")]);
//! let mut index = MemoryIndex::new("/App");
//! index.add(category::CONSTRUCTOR_REF, "Widget/1", "src/Main.java");
//! workspace.add_index(index);
//!
//! let pattern = PatternBuilder::new(LimitTo::References)
//!     .constructor("Widget", Vec::new(), Some(&["String"]), false)
//!     .unwrap();
//! let scope = ContainerScope::new(["/App"]);
//! let engine = SearchEngine::new(&workspace, &workspace, SearchSettings::default());
//! let mut collector = PathCollector::new();
//! engine
//!     .search(&pattern, &scope, None, &mut collector, &CancellationToken::new())
//!     .unwrap();
//! assert_eq!(collector.sorted_paths(), vec!["/App/src/Main.java"]);
//! ```

#![warn(missing_docs)]

pub mod binary;
mod cancel;
mod dispatch;
mod engine;
mod error;
mod memory;
mod model;
pub mod path;
pub mod scope;
mod selector;
mod snapshot;

pub use cancel::CancellationToken;
pub use dispatch::MatchDispatcher;
pub use engine::{CollectedMatch, PathCollector, SearchEngine, SearchStats};
pub use error::SearchError;
pub use jsearch_config::ErrorPolicy;
pub use memory::{IndexEntry, MemoryIndex};
pub use model::{
    Classpath, ClasspathEntry, ClasspathEntryKind, Container, ContainerKind, EntryResult, Focus,
    Index, IndexMatch, IndexProvider, ProjectGraph, Requestor, TypeHandle,
};
pub use scope::{ContainerScope, HierarchyScope, SearchScope};
pub use selector::IndexSelector;
pub use snapshot::{ArchiveSnapshot, HierarchySnapshot, ProjectSnapshot, WorkspaceSnapshot};

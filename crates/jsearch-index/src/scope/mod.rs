//! Search scopes.
//!
//! A scope answers two questions: which containers may hold matches
//! ([`SearchScope::enclosing_projects_and_jars`]) and whether one document path belongs
//! to the search ([`SearchScope::encloses`]).

mod container;
mod hierarchy;

use jsearch_config::AccessRestriction;

pub use container::ContainerScope;
pub use hierarchy::{
    DeltaKind, HierarchyBuilder, HierarchyScope, HierarchyStatus, WorkspaceDelta,
};

use crate::SearchError;

/// The set of containers and documents a search covers.
pub trait SearchScope: Send + Sync {
    /// Returns true if the document at `path` belongs to the scope.
    fn encloses(&self, path: &str) -> bool;

    /// Paths of every project and archive that may hold documents in the scope.
    ///
    /// The result is a superset; [`SearchScope::encloses`] has the final word.
    fn enclosing_projects_and_jars(&self) -> Result<Vec<String>, SearchError>;

    /// Access restriction of the document at `path`, for scopes aware of access rules.
    fn access_restriction(&self, path: &str) -> Option<AccessRestriction> {
        let _ = path;
        None
    }
}

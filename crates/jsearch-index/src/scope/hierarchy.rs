//! Scopes bounded by the type hierarchy of one focus type.
//!
//! Building a hierarchy is expensive, so a [`HierarchyScope`] computes it lazily on the
//! first [`SearchScope::encloses`] call that cannot be answered from the precomputed
//! focus path, and keeps it until a workspace change invalidates it.
//!
//! ```text
//! Uninitialized --encloses/refresh--> Ready --affecting delta--> Stale
//!       |                               ^                          |
//!       |                               +-------encloses/refresh---+
//!       +--build failed--> Unavailable --affecting delta--> Uninitialized
//! ```

use std::{iter, mem, sync::Arc};

use jsearch_config::{AccessRestriction, CompiledAccessRules, ErrorPolicy};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::SearchScope;
use crate::{
    SearchError,
    error::recover,
    model::{ContainerKind, ProjectGraph, TypeHandle},
    path,
};

/// Kind of workspace change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    /// A resource was added.
    Added,
    /// A resource was removed.
    Removed,
    /// The content of a resource changed.
    Changed,
    /// The classpath of a project changed.
    ClasspathChanged,
}

/// One workspace change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceDelta {
    /// Path of the changed resource or project.
    pub path: String,
    /// Kind of change.
    pub kind: DeltaKind,
}

impl WorkspaceDelta {
    /// Creates a delta.
    pub fn new(path: impl Into<String>, kind: DeltaKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Computes type hierarchies.
pub trait HierarchyBuilder: Send + Sync {
    /// Returns the focus type together with all of its super types and subtypes.
    fn build(&self, focus: &TypeHandle) -> Result<Vec<TypeHandle>, SearchError>;

    /// Returns true if `delta` may change the hierarchy of `focus`.
    ///
    /// `hierarchy` is empty when no hierarchy has been built yet. The default treats any
    /// change inside, or above, a container holding the focus or a hierarchy member as
    /// affecting.
    fn affects(
        &self,
        delta: &WorkspaceDelta,
        focus: &TypeHandle,
        hierarchy: &[TypeHandle],
    ) -> bool {
        iter::once(focus)
            .chain(hierarchy)
            .map(|ty| ty.container.path.as_str())
            .any(|container| {
                path::is_within(container, &delta.path) || path::is_within(&delta.path, container)
            })
    }
}

/// Public view of a [`HierarchyScope`]'s state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyStatus {
    /// No hierarchy has been built yet.
    Uninitialized,
    /// The hierarchy could not be built; `encloses` answers true.
    Unavailable,
    /// The cached hierarchy is current.
    Ready,
    /// A workspace change invalidated the cached hierarchy.
    Stale,
}

/// Cached hierarchy membership.
#[derive(Debug, Default)]
struct HierarchyCache {
    /// Every type in the hierarchy.
    types: Vec<TypeHandle>,
    /// Paths of every hierarchy member, archive members included.
    resource_paths: FxHashSet<String>,
    /// Distinct source resources declaring hierarchy members.
    elements: Vec<String>,
    /// Distinct containers declaring hierarchy members.
    containers: Vec<String>,
}

impl HierarchyCache {
    /// Indexes a freshly built hierarchy.
    fn new(types: Vec<TypeHandle>) -> Self {
        let mut cache = Self::default();
        for ty in &types {
            if !cache.containers.contains(&ty.container.path) {
                cache.containers.push(ty.container.path.clone());
            }
            if !ty.is_binary() && !cache.elements.contains(&ty.resource_path) {
                cache.elements.push(ty.resource_path.clone());
            }
            cache.resource_paths.insert(ty.resource_path.clone());
        }
        cache.types = types;
        cache
    }

    /// Membership test against the cached resources.
    fn encloses(&self, path: &str) -> bool {
        if path::is_archive_member(path) {
            return self.resource_paths.contains(path);
        }
        self.elements
            .iter()
            .any(|element| path.starts_with(element.as_str()))
    }
}

/// Internal state machine.
#[derive(Debug)]
enum HierarchyState {
    /// Never built.
    Uninitialized,
    /// Build failed.
    Unavailable,
    /// Built and current.
    Ready(HierarchyCache),
    /// Built, then invalidated.
    Stale(HierarchyCache),
}

/// A scope covering the super types and subtypes of one focus type.
pub struct HierarchyScope {
    /// The type the hierarchy is computed for.
    focus: TypeHandle,
    /// Resource path of the focus type, answered without building the hierarchy.
    focus_path: String,
    /// Collaborator computing hierarchies.
    builder: Arc<dyn HierarchyBuilder>,
    /// How build failures are handled.
    policy: ErrorPolicy,
    /// Containers that may hold hierarchy members, known before any build.
    base_containers: Vec<String>,
    /// Access rules applied to enclosed documents.
    access_rules: CompiledAccessRules,
    /// Lazily built membership.
    state: Mutex<HierarchyState>,
}

impl HierarchyScope {
    /// Creates a scope for `focus`.
    ///
    /// The container superset is the focus container, the projects referencing it (for an
    /// archive, the projects holding it on their classpath) and, transitively, every
    /// project referencing those.
    pub fn new(
        focus: TypeHandle,
        builder: Arc<dyn HierarchyBuilder>,
        graph: &dyn ProjectGraph,
        policy: ErrorPolicy,
    ) -> Result<Self, SearchError> {
        let base_containers = base_containers(&focus, graph, policy)?;
        Ok(Self {
            focus_path: focus.resource_path.clone(),
            focus,
            builder,
            policy,
            base_containers,
            access_rules: CompiledAccessRules::default(),
            state: Mutex::new(HierarchyState::Uninitialized),
        })
    }

    /// Attaches access rules to the scope.
    pub fn with_access_rules(mut self, rules: CompiledAccessRules) -> Self {
        self.access_rules = rules;
        self
    }

    /// Resource path of the focus type.
    pub fn focus_path(&self) -> &str {
        &self.focus_path
    }

    /// Current state of the cached hierarchy.
    pub fn status(&self) -> HierarchyStatus {
        match *self.state.lock() {
            HierarchyState::Uninitialized => HierarchyStatus::Uninitialized,
            HierarchyState::Unavailable => HierarchyStatus::Unavailable,
            HierarchyState::Ready(_) => HierarchyStatus::Ready,
            HierarchyState::Stale(_) => HierarchyStatus::Stale,
        }
    }

    /// Types of the current hierarchy; empty unless the scope is ready.
    pub fn types(&self) -> Vec<TypeHandle> {
        match &*self.state.lock() {
            HierarchyState::Ready(cache) => cache.types.clone(),
            _ => Vec::new(),
        }
    }

    /// Rebuilds the hierarchy now if it was never built or has gone stale.
    pub fn refresh(&self) -> Result<(), SearchError> {
        let mut state = self.state.lock();
        self.ensure_ready(&mut state)
    }

    /// Records a workspace change, invalidating the hierarchy if the change affects it.
    pub fn process_delta(&self, delta: &WorkspaceDelta) {
        let mut state = self.state.lock();
        let next = match mem::replace(&mut *state, HierarchyState::Uninitialized) {
            HierarchyState::Ready(cache)
                if self.builder.affects(delta, &self.focus, &cache.types) =>
            {
                tracing::debug!(focus = %self.focus.name, path = %delta.path, "hierarchy invalidated");
                HierarchyState::Stale(cache)
            }
            HierarchyState::Unavailable if self.builder.affects(delta, &self.focus, &[]) => {
                HierarchyState::Uninitialized
            }
            unchanged => unchanged,
        };
        *state = next;
    }

    /// Builds the hierarchy if the state calls for it.
    ///
    /// A failed build leaves the scope [`HierarchyStatus::Unavailable`].
    fn ensure_ready(&self, state: &mut HierarchyState) -> Result<(), SearchError> {
        if !matches!(
            state,
            HierarchyState::Uninitialized | HierarchyState::Stale(_)
        ) {
            return Ok(());
        }
        match self.builder.build(&self.focus) {
            Ok(types) => {
                tracing::debug!(focus = %self.focus.name, types = types.len(), "hierarchy built");
                *state = HierarchyState::Ready(HierarchyCache::new(types));
                Ok(())
            }
            Err(err) => {
                *state = HierarchyState::Unavailable;
                Err(err)
            }
        }
    }
}

impl SearchScope for HierarchyScope {
    fn encloses(&self, path: &str) -> bool {
        if path == self.focus_path {
            return true;
        }
        let mut state = self.state.lock();
        if let Err(err) = self.ensure_ready(&mut state) {
            tracing::warn!(focus = %self.focus.name, error = %err, "hierarchy unavailable");
        }
        match &*state {
            HierarchyState::Ready(cache) => cache.encloses(path),
            _ => true,
        }
    }

    fn enclosing_projects_and_jars(&self) -> Result<Vec<String>, SearchError> {
        let mut state = self.state.lock();
        let outcome = self.ensure_ready(&mut state);
        recover(self.policy, outcome, "hierarchy build")?;

        let mut containers = self.base_containers.clone();
        if let HierarchyState::Ready(cache) = &*state {
            for container in &cache.containers {
                if !containers.contains(container) {
                    containers.push(container.clone());
                }
            }
        }
        Ok(containers)
    }

    fn access_restriction(&self, path: &str) -> Option<AccessRestriction> {
        self.access_rules.restriction_for(path)
    }
}

/// Computes the containers that may hold hierarchy members before the hierarchy exists.
fn base_containers(
    focus: &TypeHandle,
    graph: &dyn ProjectGraph,
    policy: ErrorPolicy,
) -> Result<Vec<String>, SearchError> {
    let mut containers = vec![focus.container.path.clone()];
    let roots = match focus.container.kind {
        ContainerKind::Project => vec![focus.container.path.clone()],
        ContainerKind::Archive => recover(
            policy,
            graph.archive_referencing_projects(&focus.container.path),
            "archive referencing projects lookup",
        )?,
    };

    for root in roots {
        if !containers.contains(&root) {
            containers.push(root.clone());
        }
        let referencing = recover(
            policy,
            graph.referencing_projects(&root),
            "referencing projects lookup",
        )?;
        for project in referencing {
            if !containers.contains(&project) {
                containers.push(project);
            }
        }
    }
    Ok(containers)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{model::ClasspathEntry, snapshot::WorkspaceSnapshot};

    /// Builder returning a fixed hierarchy and counting builds.
    struct FixedBuilder {
        /// Hierarchy to return, or `None` to fail.
        types: Option<Vec<TypeHandle>>,
        /// Number of `build` calls.
        builds: AtomicUsize,
    }

    impl FixedBuilder {
        fn new(types: Option<Vec<TypeHandle>>) -> Arc<Self> {
            Arc::new(Self {
                types,
                builds: AtomicUsize::new(0),
            })
        }

        fn builds(&self) -> usize {
            self.builds.load(Ordering::SeqCst)
        }
    }

    impl HierarchyBuilder for FixedBuilder {
        fn build(&self, focus: &TypeHandle) -> Result<Vec<TypeHandle>, SearchError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            self.types
                .clone()
                .ok_or_else(|| SearchError::data_source(&focus.container.path, "no hierarchy"))
        }
    }

    fn workspace() -> WorkspaceSnapshot {
        let mut snapshot = WorkspaceSnapshot::new();
        snapshot.add_project("/P0", vec![ClasspathEntry::source("/P0/src")]);
        snapshot.add_project(
            "/P1",
            vec![ClasspathEntry::source("/P1/src"), ClasspathEntry::project("/P0")],
        );
        snapshot.add_project(
            "/P2",
            vec![
                ClasspathEntry::project("/P1"),
                ClasspathEntry::library("/lib/j1.jar"),
            ],
        );
        snapshot.add_project("/P3", vec![ClasspathEntry::source("/P3/src")]);
        snapshot
    }

    fn focus() -> TypeHandle {
        TypeHandle::source("/P0", "a.Shape", "/P0/src/a/Shape.java")
    }

    fn hierarchy() -> Vec<TypeHandle> {
        vec![
            focus(),
            TypeHandle::source("/P1", "b.Circle", "/P1/src/b/Circle.java"),
            TypeHandle::binary("/lib/j1.jar", "c.Square"),
        ]
    }

    #[test]
    fn test_focus_path_is_enclosed_before_initialization() {
        let builder = FixedBuilder::new(Some(hierarchy()));
        let scope =
            HierarchyScope::new(focus(), builder.clone(), &workspace(), ErrorPolicy::Strict)
                .unwrap();

        assert!(scope.encloses("/P0/src/a/Shape.java"));
        assert_eq!(scope.status(), HierarchyStatus::Uninitialized);
        assert_eq!(builder.builds(), 0);
    }

    #[test]
    fn test_encloses_builds_once_and_checks_membership() {
        let builder = FixedBuilder::new(Some(hierarchy()));
        let scope =
            HierarchyScope::new(focus(), builder.clone(), &workspace(), ErrorPolicy::Strict)
                .unwrap();

        assert!(scope.encloses("/P1/src/b/Circle.java"));
        assert_eq!(scope.status(), HierarchyStatus::Ready);
        assert!(scope.encloses("/lib/j1.jar|c/Square.class"));
        assert!(!scope.encloses("/lib/j1.jar|c/Other.class"));
        assert!(!scope.encloses("/P1/src/b/Other.java"));
        assert_eq!(builder.builds(), 1);
    }

    #[test]
    fn test_container_superset_includes_referencing_projects() {
        let builder = FixedBuilder::new(Some(hierarchy()));
        let scope =
            HierarchyScope::new(focus(), builder, &workspace(), ErrorPolicy::Strict).unwrap();

        let mut containers = scope.enclosing_projects_and_jars().unwrap();
        containers.sort();
        assert_eq!(containers, vec!["/P0", "/P1", "/P2", "/lib/j1.jar"]);
    }

    #[test]
    fn test_archive_focus_starts_from_projects_holding_the_archive() {
        let builder = FixedBuilder::new(Some(Vec::new()));
        let focus = TypeHandle::binary("/lib/j1.jar", "c.Square");
        let scope = HierarchyScope::new(focus, builder, &workspace(), ErrorPolicy::Strict).unwrap();

        let mut containers = scope.enclosing_projects_and_jars().unwrap();
        containers.sort();
        assert_eq!(containers, vec!["/P2", "/lib/j1.jar"]);
    }

    #[test]
    fn test_affecting_delta_marks_stale_and_rebuilds() {
        let builder = FixedBuilder::new(Some(hierarchy()));
        let scope =
            HierarchyScope::new(focus(), builder.clone(), &workspace(), ErrorPolicy::Strict)
                .unwrap();
        scope.refresh().unwrap();

        scope.process_delta(&WorkspaceDelta::new("/P3/src/d/D.java", DeltaKind::Changed));
        assert_eq!(scope.status(), HierarchyStatus::Ready);

        scope.process_delta(&WorkspaceDelta::new("/P1/src/b/New.java", DeltaKind::Added));
        assert_eq!(scope.status(), HierarchyStatus::Stale);

        assert!(scope.encloses("/P1/src/b/Circle.java"));
        assert_eq!(scope.status(), HierarchyStatus::Ready);
        assert_eq!(builder.builds(), 2);
    }

    #[test]
    fn test_failed_build_is_unavailable_and_encloses_everything() {
        let builder = FixedBuilder::new(None);
        let scope =
            HierarchyScope::new(focus(), builder.clone(), &workspace(), ErrorPolicy::BestEffort)
                .unwrap();

        assert!(scope.encloses("/P3/src/d/D.java"));
        assert_eq!(scope.status(), HierarchyStatus::Unavailable);
        assert!(scope.types().is_empty());

        let containers = scope.enclosing_projects_and_jars().unwrap();
        assert_eq!(containers, vec!["/P0", "/P1", "/P2"]);
        assert_eq!(builder.builds(), 1);
    }

    #[test]
    fn test_strict_policy_surfaces_build_failures() {
        let builder = FixedBuilder::new(None);
        let scope =
            HierarchyScope::new(focus(), builder, &workspace(), ErrorPolicy::Strict).unwrap();

        let err = scope.enclosing_projects_and_jars().unwrap_err();
        assert!(matches!(err, SearchError::DataSource { .. }));
        assert_eq!(scope.status(), HierarchyStatus::Unavailable);

        scope.process_delta(&WorkspaceDelta::new("/P0/src/a/Shape.java", DeltaKind::Changed));
        assert_eq!(scope.status(), HierarchyStatus::Uninitialized);
    }
}

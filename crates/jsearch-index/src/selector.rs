//! Selection of the containers whose indexes a search reads.
//!
//! Without a focus every container of the scope is read. With a focus, only containers
//! that can see the focus are kept, so results stay consistent with the classpath of the
//! code the search is anchored to:
//!
//! 1. A project is selected if it is the focus project, if it holds the focus (archive
//!    or project) on its expanded classpath, or, for polymorphic searches, if the focus
//!    project holds it on its own expanded classpath.
//! 2. An archive of the scope is selected if a selected project holds it as a library.
//! 3. Archives still unresolved are looked up on the classpaths of projects outside the
//!    scope, since a scope may list an archive without the project referencing it.

use jsearch_config::{ErrorPolicy, SearchSettings};
use jsearch_pattern::Pattern;
use rustc_hash::FxHashSet;

use crate::{
    SearchError,
    error::recover,
    model::{Classpath, ClasspathEntry, ClasspathEntryKind, Container, Focus, ProjectGraph},
    path,
    scope::SearchScope,
};

/// Ordered, duplicate-free set of selected containers.
#[derive(Debug, Default)]
struct Selection {
    /// Containers in selection order.
    containers: Vec<Container>,
    /// Paths already selected.
    seen: FxHashSet<String>,
}

impl Selection {
    /// Adds a container unless its path is already selected.
    fn push(&mut self, container: Container) {
        if self.seen.insert(container.path.clone()) {
            self.containers.push(container);
        }
    }
}

/// Computes, once per search, the containers whose indexes are read.
pub struct IndexSelector<'a> {
    /// Scope of the search.
    scope: &'a dyn SearchScope,
    /// Element the search is anchored to, if any.
    focus: Option<&'a Focus>,
    /// Workspace projects.
    graph: &'a dyn ProjectGraph,
    /// Whether the pattern widens visibility to the focus project's prerequisites.
    polymorphic: bool,
    /// How classpath lookup failures are handled.
    policy: ErrorPolicy,
    /// Cached result of the first computation.
    locations: Option<Vec<Container>>,
}

impl<'a> IndexSelector<'a> {
    /// Creates a selector for one search.
    pub fn new(
        scope: &'a dyn SearchScope,
        focus: Option<&'a Focus>,
        pattern: &Pattern,
        graph: &'a dyn ProjectGraph,
        settings: &SearchSettings,
    ) -> Self {
        Self {
            scope,
            focus,
            graph,
            polymorphic: settings.polymorphic_methods && pattern.is_polymorphic_search(),
            policy: settings.error_policy,
            locations: None,
        }
    }

    /// Returns the selected containers, computing them on first use.
    ///
    /// Repeated calls return the cached selection.
    pub fn index_locations(&mut self) -> Result<&[Container], SearchError> {
        let locations = match self.locations.take() {
            Some(locations) => locations,
            None => self.compute()?,
        };
        Ok(self.locations.insert(locations).as_slice())
    }

    /// Runs the selection.
    #[tracing::instrument(level = "debug", skip_all, fields(polymorphic = self.polymorphic))]
    fn compute(&self) -> Result<Vec<Container>, SearchError> {
        let paths = self.scope.enclosing_projects_and_jars()?;
        let mut selection = Selection::default();

        match self.focus {
            None => {
                for scope_path in &paths {
                    let resource = path::owning_resource(scope_path);
                    selection.push(self.container_for(resource));
                }
            }
            Some(focus) => self.select_visible(focus, &paths, &mut selection)?,
        }

        tracing::debug!(
            scope = paths.len(),
            selected = selection.containers.len(),
            "selected index locations"
        );
        Ok(selection.containers)
    }

    /// Selects the containers of `paths` that can see `focus`.
    fn select_visible(
        &self,
        focus: &Focus,
        paths: &[String],
        selection: &mut Selection,
    ) -> Result<(), SearchError> {
        let focus_entries = if self.polymorphic {
            self.expanded_classpath(focus.project())?
        } else {
            Vec::new()
        };

        let mut visited = FxHashSet::default();
        let mut visible = Vec::new();
        let mut unresolved: Vec<&str> = Vec::new();

        for scope_path in paths {
            let resource = path::owning_resource(scope_path);
            match self.graph.project(resource) {
                Some(classpath) => {
                    if !visited.insert(resource) {
                        continue;
                    }
                    if self.can_see_focus(focus, resource, classpath, &focus_entries)? {
                        selection.push(Container::project(resource));
                        visible.push(classpath);
                    }
                }
                None => {
                    if !unresolved.contains(&resource) {
                        unresolved.push(resource);
                    }
                }
            }
        }

        for classpath in visible {
            if unresolved.is_empty() {
                break;
            }
            self.resolve_archives(classpath, &mut unresolved, selection)?;
        }

        if !unresolved.is_empty() {
            let projects = recover(self.policy, self.graph.all_projects(), "project listing")?;
            for project in projects {
                if unresolved.is_empty() {
                    break;
                }
                if visited.contains(project.as_str()) {
                    continue;
                }
                let Some(classpath) = self.graph.project(&project) else {
                    continue;
                };
                self.resolve_archives(classpath, &mut unresolved, selection)?;
            }
        }

        if !unresolved.is_empty() {
            tracing::debug!(archives = ?unresolved, "archives not visible from the focus");
        }
        Ok(())
    }

    /// Decides whether `project` can see `focus`.
    fn can_see_focus(
        &self,
        focus: &Focus,
        project: &str,
        classpath: &dyn Classpath,
        focus_entries: &[ClasspathEntry],
    ) -> Result<bool, SearchError> {
        if matches!(focus, Focus::Project(focus_project) if focus_project == project) {
            return Ok(true);
        }
        if focus_entries.iter().any(|entry| entry.is_project(project)) {
            return Ok(true);
        }

        let entries = recover(self.policy, classpath.expanded_classpath(), "classpath lookup")?;
        let sees = match focus {
            Focus::Archive { path, .. } => entries.iter().any(|entry| entry.is_library(path)),
            Focus::Project(focus_project) => {
                entries.iter().any(|entry| entry.is_project(focus_project))
            }
        };
        Ok(sees)
    }

    /// Expanded classpath of `project`, empty if it is not a known project.
    fn expanded_classpath(&self, project: &str) -> Result<Vec<ClasspathEntry>, SearchError> {
        let Some(classpath) = self.graph.project(project) else {
            return Ok(Vec::new());
        };
        recover(
            self.policy,
            classpath.expanded_classpath(),
            "focus classpath lookup",
        )
    }

    /// Selects every archive of `unresolved` that `classpath` holds as a library.
    fn resolve_archives(
        &self,
        classpath: &dyn Classpath,
        unresolved: &mut Vec<&str>,
        selection: &mut Selection,
    ) -> Result<(), SearchError> {
        let mut remaining = Vec::with_capacity(unresolved.len());
        for archive in unresolved.drain(..) {
            let entry = recover(
                self.policy,
                classpath.classpath_entry_for(archive),
                "classpath entry lookup",
            )?;
            if entry.is_some_and(|entry| entry.kind == ClasspathEntryKind::Library) {
                selection.push(Container::archive(archive));
            } else {
                remaining.push(archive);
            }
        }
        *unresolved = remaining;
        Ok(())
    }

    /// Container for a scope path: a project if the graph knows it, an archive otherwise.
    fn container_for(&self, resource: &str) -> Container {
        if self.graph.project(resource).is_some() {
            Container::project(resource)
        } else {
            Container::archive(resource)
        }
    }
}

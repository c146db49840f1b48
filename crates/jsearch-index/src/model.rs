//! Workspace model and the collaborator traits a search runs against.
//!
//! The engine never reads project files or index files itself. Projects and their
//! classpaths come from a [`ProjectGraph`], per-container indexes from an
//! [`IndexProvider`], and matches are handed to a [`Requestor`].

use std::sync::Arc;

use jsearch_config::AccessRestriction;
use jsearch_pattern::{DecodedKey, IndexQuery, Pattern, codec};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{SearchError, path};

/// Kind of container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// A project with its own classpath.
    Project,
    /// A binary archive; a leaf with no dependencies.
    Archive,
}

/// A project or archive owning at most one index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Container {
    /// Workspace path of the project or archive.
    pub path: String,
    /// Kind of container.
    pub kind: ContainerKind,
}

impl Container {
    /// A project container.
    pub fn project(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ContainerKind::Project,
        }
    }

    /// An archive container.
    pub fn archive(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ContainerKind::Archive,
        }
    }
}

/// Kind of classpath entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClasspathEntryKind {
    /// A source folder of the project itself.
    Source,
    /// A reference to another project.
    Project,
    /// A binary archive.
    Library,
}

/// One entry of a project classpath.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClasspathEntry {
    /// Kind of entry.
    pub kind: ClasspathEntryKind,
    /// Path of the referenced folder, project or archive.
    pub path: String,
    /// Whether the entry is re-exported to projects referencing this one.
    #[serde(default)]
    pub exported: bool,
}

impl ClasspathEntry {
    /// A source folder entry.
    pub fn source(path: impl Into<String>) -> Self {
        Self::new(ClasspathEntryKind::Source, path)
    }

    /// A project reference entry.
    pub fn project(path: impl Into<String>) -> Self {
        Self::new(ClasspathEntryKind::Project, path)
    }

    /// A library entry.
    pub fn library(path: impl Into<String>) -> Self {
        Self::new(ClasspathEntryKind::Library, path)
    }

    /// An entry that is not exported.
    fn new(kind: ClasspathEntryKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            exported: false,
        }
    }

    /// Marks this entry as exported.
    pub fn exported(mut self) -> Self {
        self.exported = true;
        self
    }

    /// Returns true if this is a project entry pointing at `project`.
    pub fn is_project(&self, project: &str) -> bool {
        self.kind == ClasspathEntryKind::Project && self.path == project
    }

    /// Returns true if this is a library entry pointing at `archive`.
    pub fn is_library(&self, archive: &str) -> bool {
        self.kind == ClasspathEntryKind::Library && self.path == archive
    }
}

/// A type known to the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeHandle {
    /// Dotted binary name; nested types keep their `$` (`com.acme.Outer$Inner`).
    pub name: String,
    /// Container declaring the type.
    pub container: Container,
    /// Path of the resource declaring the type.
    pub resource_path: String,
}

impl TypeHandle {
    /// A compiled type inside an archive.
    pub fn binary(archive: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            container: Container::archive(archive),
            resource_path: path::archive_member_path(archive, name),
        }
    }

    /// A type declared in a source file of a project.
    pub fn source(project: &str, name: &str, resource_path: &str) -> Self {
        Self {
            name: name.to_string(),
            container: Container::project(project),
            resource_path: resource_path.to_string(),
        }
    }

    /// Returns true if the type comes from an archive.
    pub fn is_binary(&self) -> bool {
        self.container.kind == ContainerKind::Archive
    }
}

/// The element a search is anchored to.
///
/// Containers that cannot see the focus are pruned from the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus {
    /// The focus is declared in a project.
    Project(String),
    /// The focus is declared in an archive, reached through `project`.
    Archive {
        /// Archive path.
        path: String,
        /// Project whose classpath holds the archive.
        project: String,
    },
}

impl Focus {
    /// Path of the container declaring the focus.
    pub fn container_path(&self) -> &str {
        match self {
            Self::Project(path) | Self::Archive { path, .. } => path,
        }
    }

    /// Project the focus belongs to.
    pub fn project(&self) -> &str {
        match self {
            Self::Project(project) | Self::Archive { project, .. } => project,
        }
    }
}

/// Classpath access for one project.
pub trait Classpath {
    /// Classpath entries as declared, with containers resolved.
    fn resolved_classpath(&self) -> Result<Vec<ClasspathEntry>, SearchError>;

    /// Resolved classpath plus entries exported by referenced projects.
    fn expanded_classpath(&self) -> Result<Vec<ClasspathEntry>, SearchError>;

    /// Returns the resolved entry for `path`, if any.
    fn classpath_entry_for(&self, path: &str) -> Result<Option<ClasspathEntry>, SearchError> {
        Ok(self
            .resolved_classpath()?
            .into_iter()
            .find(|entry| entry.path == path))
    }
}

/// The set of projects in the workspace.
pub trait ProjectGraph: Send + Sync {
    /// Paths of every project in the workspace.
    fn all_projects(&self) -> Result<Vec<String>, SearchError>;

    /// Classpath access for the project at `path`, or `None` if `path` is not a project.
    fn project(&self, path: &str) -> Option<&dyn Classpath>;

    /// Projects depending on `project`, directly or transitively.
    ///
    /// Cycles in the project graph are walked once.
    fn referencing_projects(&self, project: &str) -> Result<Vec<String>, SearchError> {
        let all = self.all_projects()?;
        let mut visited = FxHashSet::default();
        visited.insert(project.to_string());
        let mut pending = vec![project.to_string()];
        let mut result = Vec::new();

        while let Some(current) = pending.pop() {
            for candidate in &all {
                if visited.contains(candidate) {
                    continue;
                }
                let Some(classpath) = self.project(candidate) else {
                    continue;
                };
                if classpath
                    .resolved_classpath()?
                    .iter()
                    .any(|entry| entry.is_project(&current))
                {
                    visited.insert(candidate.clone());
                    result.push(candidate.clone());
                    pending.push(candidate.clone());
                }
            }
        }
        Ok(result)
    }

    /// Projects whose resolved classpath holds a library entry for `archive`.
    fn archive_referencing_projects(&self, archive: &str) -> Result<Vec<String>, SearchError> {
        let mut result = Vec::new();
        for project in self.all_projects()? {
            let Some(classpath) = self.project(&project) else {
                continue;
            };
            if classpath
                .resolved_classpath()?
                .iter()
                .any(|entry| entry.is_library(archive))
            {
                result.push(project);
            }
        }
        Ok(result)
    }
}

/// One raw entry returned by an index query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryResult {
    /// Category the entry was read from.
    pub category: String,
    /// Raw key as stored.
    pub key: String,
    /// Container-relative names of the documents indexed under the key.
    pub document_names: Vec<String>,
}

impl EntryResult {
    /// Decodes the raw key according to its category.
    pub fn decoded_key(&self) -> DecodedKey {
        codec::decode(&self.category, &self.key)
    }
}

/// A per-container index.
pub trait Index: Send + Sync {
    /// Acquires the index for reading.
    fn start_query(&self);

    /// Releases the index after [`Index::start_query`].
    fn stop_query(&self);

    /// Runs one query and returns the raw entries it matched.
    fn query(&self, query: &IndexQuery) -> Result<Vec<EntryResult>, SearchError>;
}

/// Locates the index owned by a container.
pub trait IndexProvider: Send + Sync {
    /// Returns the index of `container`, or `None` if it has none.
    fn index_for(&self, container: &Container) -> Result<Option<Arc<dyn Index>>, SearchError>;
}

/// A match found in an index, in scope, ready to be reported.
#[derive(Debug, Clone, Copy)]
pub struct IndexMatch<'a> {
    /// Full document path.
    pub path: &'a str,
    /// Container whose index held the entry.
    pub container: &'a Container,
    /// Decoded key of the entry.
    pub decoded: &'a DecodedKey,
    /// Pattern being searched for.
    pub pattern: &'a Pattern,
    /// Access restriction of the document, if any.
    pub access: Option<&'a AccessRestriction>,
}

/// Receives index matches.
pub trait Requestor {
    /// Handles one match. Returning `false` stops the whole search.
    fn accept_index_match(&mut self, found: &IndexMatch<'_>) -> bool;
}

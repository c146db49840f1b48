//! JSON workspace snapshots.
//!
//! A [`WorkspaceSnapshot`] holds everything a search reads from its collaborators:
//! projects with their classpaths, one [`MemoryIndex`] per container, compiled type
//! metadata per archive and precomputed type hierarchies. It implements every
//! collaborator trait, so a saved snapshot can be searched without the workspace that
//! produced it.

use std::{fs, io, path::Path, sync::Arc};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    SearchError,
    binary::{BinaryType, BinaryTypeProvider},
    memory::MemoryIndex,
    model::{
        Classpath, ClasspathEntry, ClasspathEntryKind, Container, Index, IndexProvider,
        ProjectGraph, TypeHandle,
    },
    scope::HierarchyBuilder,
};

/// A project and its classpath.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// Project path.
    pub path: String,
    /// Resolved classpath, in declaration order.
    #[serde(default)]
    pub classpath: Vec<ClasspathEntry>,
    /// Classpath plus entries exported by referenced projects.
    #[serde(skip)]
    expanded: Vec<ClasspathEntry>,
}

impl Classpath for ProjectSnapshot {
    fn resolved_classpath(&self) -> Result<Vec<ClasspathEntry>, SearchError> {
        Ok(self.classpath.clone())
    }

    fn expanded_classpath(&self) -> Result<Vec<ClasspathEntry>, SearchError> {
        Ok(self.expanded.clone())
    }
}

/// Compiled types of one archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSnapshot {
    /// Archive path.
    pub path: String,
    /// Compiled types in the archive.
    #[serde(default)]
    pub types: Vec<BinaryType>,
}

/// Precomputed hierarchy of one focus type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchySnapshot {
    /// Dotted binary name of the focus type.
    pub focus: String,
    /// Members of the hierarchy, the focus included.
    pub types: Vec<TypeHandle>,
}

/// A serializable workspace.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    /// Projects in workspace order.
    #[serde(default)]
    projects: Vec<ProjectSnapshot>,
    /// Per-container indexes.
    #[serde(default)]
    indexes: Vec<Arc<MemoryIndex>>,
    /// Compiled type metadata per archive.
    #[serde(default)]
    archives: Vec<ArchiveSnapshot>,
    /// Precomputed type hierarchies.
    #[serde(default)]
    hierarchies: Vec<HierarchySnapshot>,
}

impl WorkspaceSnapshot {
    /// Creates an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents).map_err(|e| SearchError::Snapshot {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parses a snapshot from JSON text.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let mut snapshot: Self = serde_json::from_str(contents)?;
        snapshot.relink();
        Ok(snapshot)
    }

    /// Saves the snapshot to a JSON file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, path: &Path) -> Result<(), SearchError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            SearchError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to serialize snapshot: {e}"),
            ))
        })?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Adds a project, replacing any project at the same path.
    pub fn add_project(&mut self, path: &str, classpath: Vec<ClasspathEntry>) {
        self.projects.retain(|p| p.path != path);
        self.projects.push(ProjectSnapshot {
            path: path.to_string(),
            classpath,
            expanded: Vec::new(),
        });
        self.relink();
    }

    /// Adds the index of a container, replacing any previous one.
    pub fn add_index(&mut self, index: MemoryIndex) {
        self.indexes.retain(|i| i.container() != index.container());
        self.indexes.push(Arc::new(index));
    }

    /// Records a compiled type inside `archive`.
    pub fn add_binary_type(&mut self, archive: &str, ty: BinaryType) {
        match self.archives.iter_mut().find(|a| a.path == archive) {
            Some(existing) => existing.types.push(ty),
            None => self.archives.push(ArchiveSnapshot {
                path: archive.to_string(),
                types: vec![ty],
            }),
        }
    }

    /// Records the hierarchy of `focus`.
    pub fn add_hierarchy(&mut self, focus: &str, types: Vec<TypeHandle>) {
        self.hierarchies.retain(|h| h.focus != focus);
        self.hierarchies.push(HierarchySnapshot {
            focus: focus.to_string(),
            types,
        });
    }

    /// Index of the container at `path`.
    pub fn index(&self, path: &str) -> Option<&MemoryIndex> {
        self.indexes
            .iter()
            .find(|i| i.container() == path)
            .map(Arc::as_ref)
    }

    /// Projects in workspace order.
    pub fn projects(&self) -> &[ProjectSnapshot] {
        &self.projects
    }

    /// Recomputes every project's expanded classpath.
    fn relink(&mut self) {
        let expanded: Vec<_> = self
            .projects
            .iter()
            .map(|p| self.expand(&p.path, &p.classpath))
            .collect();
        for (project, expanded) in self.projects.iter_mut().zip(expanded) {
            project.expanded = expanded;
        }
    }

    /// Appends the exported entries of every referenced project to `classpath`.
    fn expand(&self, root: &str, classpath: &[ClasspathEntry]) -> Vec<ClasspathEntry> {
        let mut seen: FxHashSet<String> = classpath.iter().map(|e| e.path.clone()).collect();
        seen.insert(root.to_string());
        let mut visited = FxHashSet::default();
        visited.insert(root.to_string());
        let mut expanded = classpath.to_vec();
        let mut pending: Vec<&str> = referenced_projects(classpath).collect();

        while let Some(current) = pending.pop() {
            if !visited.insert(current.to_string()) {
                continue;
            }
            let Some(project) = self.projects.iter().find(|p| p.path == current) else {
                continue;
            };
            for entry in project.classpath.iter().filter(|e| e.exported) {
                if seen.insert(entry.path.clone()) {
                    expanded.push(entry.clone());
                }
                if entry.kind == ClasspathEntryKind::Project {
                    pending.push(&entry.path);
                }
            }
        }
        expanded
    }
}

/// Paths of the projects referenced by `classpath`.
fn referenced_projects(classpath: &[ClasspathEntry]) -> impl Iterator<Item = &str> {
    classpath
        .iter()
        .filter(|e| e.kind == ClasspathEntryKind::Project)
        .map(|e| e.path.as_str())
}

impl ProjectGraph for WorkspaceSnapshot {
    fn all_projects(&self) -> Result<Vec<String>, SearchError> {
        Ok(self.projects.iter().map(|p| p.path.clone()).collect())
    }

    fn project(&self, path: &str) -> Option<&dyn Classpath> {
        self.projects
            .iter()
            .find(|p| p.path == path)
            .map(|p| p as &dyn Classpath)
    }
}

impl IndexProvider for WorkspaceSnapshot {
    fn index_for(&self, container: &Container) -> Result<Option<Arc<dyn Index>>, SearchError> {
        Ok(self
            .indexes
            .iter()
            .find(|i| i.container() == container.path)
            .map(|i| Arc::clone(i) as Arc<dyn Index>))
    }
}

impl BinaryTypeProvider for WorkspaceSnapshot {
    fn binary_type(
        &self,
        archive: &str,
        member_path: &str,
    ) -> Result<Option<BinaryType>, SearchError> {
        Ok(self
            .archives
            .iter()
            .filter(|a| a.path == archive)
            .flat_map(|a| &a.types)
            .find(|t| t.member_path() == member_path)
            .cloned())
    }
}

impl HierarchyBuilder for WorkspaceSnapshot {
    /// Recorded hierarchy of `focus`; a type without one is its own hierarchy.
    fn build(&self, focus: &TypeHandle) -> Result<Vec<TypeHandle>, SearchError> {
        Ok(self
            .hierarchies
            .iter()
            .find(|h| h.focus == focus.name)
            .map_or_else(|| vec![focus.clone()], |h| h.types.clone()))
    }
}

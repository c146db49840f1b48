//! Flat container scopes.

use jsearch_config::{AccessRestriction, CompiledAccessRules};
use rustc_hash::FxHashSet;

use super::SearchScope;
use crate::{
    SearchError,
    model::{ClasspathEntryKind, ProjectGraph},
    path,
};

/// A scope made of a fixed set of projects and archives.
#[derive(Debug, Clone, Default)]
pub struct ContainerScope {
    /// Container paths, in insertion order without duplicates.
    containers: Vec<String>,
    /// Access rules applied to enclosed documents.
    access_rules: CompiledAccessRules,
}

impl ContainerScope {
    /// Creates a scope over the given container paths.
    pub fn new<I, S>(containers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = FxHashSet::default();
        let containers = containers
            .into_iter()
            .map(Into::into)
            .filter(|path: &String| seen.insert(path.clone()))
            .collect();
        Self {
            containers,
            access_rules: CompiledAccessRules::default(),
        }
    }

    /// Creates a scope over every project of the workspace and every archive on their
    /// classpaths.
    pub fn workspace(graph: &dyn ProjectGraph) -> Result<Self, SearchError> {
        let mut containers = Vec::new();
        for project in graph.all_projects()? {
            if let Some(classpath) = graph.project(&project) {
                containers.extend(
                    classpath
                        .resolved_classpath()?
                        .into_iter()
                        .filter(|entry| entry.kind == ClasspathEntryKind::Library)
                        .map(|entry| entry.path),
                );
            }
            containers.push(project);
        }
        Ok(Self::new(containers))
    }

    /// Attaches access rules to the scope.
    pub fn with_access_rules(mut self, rules: CompiledAccessRules) -> Self {
        self.access_rules = rules;
        self
    }

    /// The container paths of this scope.
    pub fn containers(&self) -> &[String] {
        &self.containers
    }
}

impl SearchScope for ContainerScope {
    fn encloses(&self, path: &str) -> bool {
        self.containers
            .iter()
            .any(|container| path::is_within(container, path))
    }

    fn enclosing_projects_and_jars(&self) -> Result<Vec<String>, SearchError> {
        Ok(self.containers.clone())
    }

    fn access_restriction(&self, path: &str) -> Option<AccessRestriction> {
        self.access_rules.restriction_for(path)
    }
}

#[cfg(test)]
mod tests {
    use jsearch_config::{AccessRule, AccessRuleKind};

    use super::*;

    #[test]
    fn test_encloses_container_members() {
        let scope = ContainerScope::new(["/P1", "/lib/j1.jar", "/P1"]);
        assert_eq!(scope.containers(), ["/P1", "/lib/j1.jar"]);
        assert!(scope.encloses("/P1/src/a/A.java"));
        assert!(scope.encloses("/lib/j1.jar|a/B.class"));
        assert!(!scope.encloses("/P2/src/a/A.java"));
        assert!(!scope.encloses("/P10/src/a/A.java"));
    }

    #[test]
    fn test_access_restriction_comes_from_rules() {
        let rules = CompiledAccessRules::compile(&[AccessRule {
            patterns: vec!["/lib/internal.jar|*".to_string()],
            kind: AccessRuleKind::Forbidden,
        }])
        .unwrap();
        let scope = ContainerScope::new(["/lib/internal.jar"]).with_access_rules(rules);

        let restriction = scope
            .access_restriction("/lib/internal.jar|a/Impl.class")
            .unwrap();
        assert!(restriction.is_forbidden());
        assert!(scope.access_restriction("/P1/src/A.java").is_none());
    }
}

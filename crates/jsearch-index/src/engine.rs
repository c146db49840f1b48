//! Search entry point.
//!
//! [`SearchEngine`] ties the pieces together: it selects the containers of a search,
//! dispatches the pattern against each container's index, and resolves matches found
//! in archives against compiled metadata.

use jsearch_config::{AccessRestriction, SearchSettings};
use jsearch_pattern::{LimitTo, MatchRule, Pattern, SearchFor, parse_pattern};
use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::{
    CancellationToken, SearchError,
    binary::{Binder, BinaryMatch, BinaryMatchResolver, BinaryTypeProvider},
    dispatch::MatchDispatcher,
    error::recover,
    model::{Container, Focus, IndexMatch, IndexProvider, ProjectGraph, Requestor},
    path,
    scope::SearchScope,
    selector::IndexSelector,
};

/// Totals of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStats {
    /// Containers selected for the search.
    pub containers: usize,
    /// Matches reported to the requestor.
    pub matches: usize,
}

/// Runs searches against a workspace.
pub struct SearchEngine<'a> {
    /// Workspace projects.
    graph: &'a dyn ProjectGraph,
    /// Per-container indexes.
    indexes: &'a dyn IndexProvider,
    /// Search settings.
    settings: SearchSettings,
}

impl<'a> SearchEngine<'a> {
    /// Creates an engine over a project graph and its indexes.
    pub fn new(
        graph: &'a dyn ProjectGraph,
        indexes: &'a dyn IndexProvider,
        settings: SearchSettings,
    ) -> Self {
        Self {
            graph,
            indexes,
            settings,
        }
    }

    /// Settings searches run with.
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Parses a textual pattern with `rule`, or with the configured rule when `rule` is
    /// `None`.
    pub fn parse_pattern(
        &self,
        text: &str,
        search_for: SearchFor,
        limit: LimitTo,
        rule: Option<MatchRule>,
    ) -> Result<Pattern, SearchError> {
        let rule = rule.unwrap_or_else(|| self.settings.match_rule());
        Ok(parse_pattern(text, search_for, limit, rule)?)
    }

    /// Searches for `pattern` in `scope` and reports every match to `requestor`.
    ///
    /// With a `focus`, only containers that can see it are searched. Containers are
    /// dispatched in parallel when the settings ask for it; the requestor is then
    /// called from one thread at a time. A requestor returning false ends the search
    /// with [`SearchError::Cancelled`] without cancelling `cancel`.
    #[tracing::instrument(level = "debug", skip_all, fields(pattern = %pattern))]
    pub fn search(
        &self,
        pattern: &Pattern,
        scope: &dyn SearchScope,
        focus: Option<&Focus>,
        requestor: &mut (dyn Requestor + Send),
        cancel: &CancellationToken,
    ) -> Result<SearchStats, SearchError> {
        cancel.check()?;
        let mut selector = IndexSelector::new(scope, focus, pattern, self.graph, &self.settings);
        let containers = selector.index_locations()?;
        let stop = cancel.child();
        let dispatcher = MatchDispatcher::new(pattern, scope, &stop);

        let matches: usize = if self.settings.parallel {
            let shared = Mutex::new(requestor);
            containers
                .par_iter()
                .map(|container| {
                    let mut requestor = SharedRequestor { inner: &shared };
                    let result = self.dispatch_container(&dispatcher, container, &mut requestor);
                    if result.as_ref().is_err_and(SearchError::is_cancelled) {
                        stop.cancel();
                    }
                    result
                })
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .sum()
        } else {
            let mut matches = 0;
            for container in containers {
                matches += self.dispatch_container(&dispatcher, container, &mut *requestor)?;
            }
            matches
        };

        let stats = SearchStats {
            containers: containers.len(),
            matches,
        };
        tracing::debug!(containers = stats.containers, matches = stats.matches, "search finished");
        Ok(stats)
    }

    /// Dispatches one container, applying the error policy to index failures.
    fn dispatch_container(
        &self,
        dispatcher: &MatchDispatcher<'_>,
        container: &Container,
        requestor: &mut dyn Requestor,
    ) -> Result<usize, SearchError> {
        let policy = self.settings.error_policy;
        let Some(index) = recover(policy, self.indexes.index_for(container), "index lookup")? else {
            tracing::debug!(container = %container.path, "container has no index");
            return Ok(0);
        };
        recover(
            policy,
            dispatcher.dispatch(container, index.as_ref(), requestor),
            "index query",
        )
    }

    /// Resolves archive-member matches against compiled type metadata.
    ///
    /// Paths outside archives are ignored, as are repeated paths. A class file the
    /// provider cannot read is handled by the error policy.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn locate_binary_matches<'p>(
        &self,
        pattern: &Pattern,
        paths: impl IntoIterator<Item = &'p str>,
        provider: &dyn BinaryTypeProvider,
        binder: &dyn Binder,
        cancel: &CancellationToken,
    ) -> Result<Vec<BinaryMatch>, SearchError> {
        let resolver = BinaryMatchResolver::new(pattern, binder);
        let mut seen = FxHashSet::default();
        let mut found = Vec::new();

        for document in paths {
            cancel.check()?;
            let Some((archive, member)) = path::split_archive_member(document) else {
                continue;
            };
            if !seen.insert(document) {
                continue;
            }
            let ty = recover(
                self.settings.error_policy,
                provider.binary_type(archive, member),
                "class file read",
            )?;
            match ty {
                Some(ty) => found.extend(resolver.locate_matches(archive, &ty)),
                None => tracing::debug!(path = document, "class file not found"),
            }
        }
        Ok(found)
    }
}

/// Serializes calls from parallel dispatches into one requestor.
struct SharedRequestor<'r, 's> {
    /// The caller's requestor.
    inner: &'r Mutex<&'s mut (dyn Requestor + Send)>,
}

impl Requestor for SharedRequestor<'_, '_> {
    fn accept_index_match(&mut self, found: &IndexMatch<'_>) -> bool {
        self.inner.lock().accept_index_match(found)
    }
}

/// A match accepted by a [`PathCollector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedMatch {
    /// Full document path.
    pub path: String,
    /// Access restriction of the document, if any.
    pub access: Option<AccessRestriction>,
}

/// Requestor collecting the distinct paths of every match.
#[derive(Debug, Default)]
pub struct PathCollector {
    /// Accepted matches in arrival order.
    matches: Vec<CollectedMatch>,
    /// Paths already accepted.
    seen: FxHashSet<String>,
    /// Number of matches after which the search is stopped.
    limit: Option<usize>,
    /// Whether matches under a forbidden access rule are dropped.
    skip_forbidden: bool,
}

impl PathCollector {
    /// Creates a collector without a limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the search once `limit` distinct paths were collected.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Drops matches in documents a forbidden access rule applies to.
    pub fn skip_forbidden(mut self) -> Self {
        self.skip_forbidden = true;
        self
    }

    /// Accepted matches in arrival order.
    pub fn matches(&self) -> &[CollectedMatch] {
        &self.matches
    }

    /// Accepted paths, sorted.
    pub fn sorted_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.matches.iter().map(|m| m.path.clone()).collect();
        paths.sort();
        paths
    }

    /// Number of accepted paths.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns true if nothing was accepted.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

impl Requestor for PathCollector {
    fn accept_index_match(&mut self, found: &IndexMatch<'_>) -> bool {
        let forbidden = found.access.is_some_and(AccessRestriction::is_forbidden);
        if (self.skip_forbidden && forbidden) || !self.seen.insert(found.path.to_string()) {
            return true;
        }
        self.matches.push(CollectedMatch {
            path: found.path.to_string(),
            access: found.access.cloned(),
        });
        self.limit.is_none_or(|limit| self.matches.len() < limit)
    }
}

//! Per-container query dispatch.
//!
//! The index answers a query with the coarse match mode chosen by the codec, so every
//! entry it returns is decoded and re-checked against the full pattern before its
//! documents are reported. Fine-grain flags are not checked here: index keys carry no
//! reference sub-kind, and requestors read the flags from [`IndexMatch::pattern`].

use jsearch_pattern::{IndexQuery, Pattern, codec};

use crate::{
    CancellationToken, SearchError,
    model::{Container, Index, IndexMatch, Requestor},
    path,
    scope::SearchScope,
};

/// Holds an index acquired for reading; releases it when dropped.
struct QueryGuard<'a> {
    /// The acquired index.
    index: &'a dyn Index,
}

impl<'a> QueryGuard<'a> {
    /// Acquires `index`.
    fn acquire(index: &'a dyn Index) -> Self {
        index.start_query();
        Self { index }
    }
}

impl Drop for QueryGuard<'_> {
    fn drop(&mut self) {
        self.index.stop_query();
    }
}

/// Runs one pattern against container indexes and reports matches in scope.
pub struct MatchDispatcher<'a> {
    /// Pattern being searched for.
    pattern: &'a Pattern,
    /// Query derived from the pattern, shared by every container.
    query: IndexQuery,
    /// Scope filtering document paths.
    scope: &'a dyn SearchScope,
    /// Cancellation flag, polled per container and per entry.
    cancel: &'a CancellationToken,
}

impl<'a> MatchDispatcher<'a> {
    /// Creates a dispatcher, encoding the pattern once.
    pub fn new(
        pattern: &'a Pattern,
        scope: &'a dyn SearchScope,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            pattern,
            query: codec::encode(pattern),
            scope,
            cancel,
        }
    }

    /// The query sent to every index.
    pub fn query(&self) -> &IndexQuery {
        &self.query
    }

    /// Queries the index of `container` and reports each match to `requestor`.
    ///
    /// Returns the number of matches reported. Fails with [`SearchError::Cancelled`] if
    /// cancellation was requested or the requestor asked to stop. A requestor stop leaves
    /// the token alone.
    #[tracing::instrument(level = "debug", skip_all, fields(container = %container.path))]
    pub fn dispatch(
        &self,
        container: &Container,
        index: &dyn Index,
        requestor: &mut dyn Requestor,
    ) -> Result<usize, SearchError> {
        self.cancel.check()?;
        let _guard = QueryGuard::acquire(index);
        let entries = index.query(&self.query)?;

        let mut reported = 0;
        for entry in &entries {
            self.cancel.check()?;
            let decoded = entry.decoded_key();
            if !codec::matches_decoded_key(self.pattern, &decoded) {
                continue;
            }
            for name in &entry.document_names {
                let document = path::document_path(container, name);
                if !self.scope.encloses(&document) {
                    continue;
                }
                let access = self.scope.access_restriction(&document);
                let found = IndexMatch {
                    path: &document,
                    container,
                    decoded: &decoded,
                    pattern: self.pattern,
                    access: access.as_ref(),
                };
                if !requestor.accept_index_match(&found) {
                    tracing::debug!(path = %document, "requestor stopped the search");
                    return Err(SearchError::Cancelled);
                }
                reported += 1;
            }
        }

        tracing::debug!(entries = entries.len(), reported, "container dispatched");
        Ok(reported)
    }
}

#[cfg(test)]
mod tests {
    use jsearch_config::{AccessRule, AccessRuleKind, CompiledAccessRules};
    use jsearch_pattern::{FineGrain, LimitTo, MatchRule, PatternBuilder, category};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{PathCollector, memory::MemoryIndex, scope::ContainerScope};

    fn ctor(parameters: Option<&[&str]>) -> Pattern {
        PatternBuilder::new(LimitTo::References)
            .rule(MatchRule::exact())
            .constructor("Foo", Vec::new(), parameters, false)
            .unwrap()
    }

    fn index() -> MemoryIndex {
        let mut index = MemoryIndex::new("/P1");
        index.add(category::CONSTRUCTOR_REF, "Foo/2", "src/a/A.java");
        index.add(category::CONSTRUCTOR_REF, "Foo/2", "test/a/ATest.java");
        index.add(category::CONSTRUCTOR_REF, "Foo/3", "src/b/B.java");
        index.add(category::CONSTRUCTOR_REF, "FooBar/2", "src/c/C.java");
        index.add(category::METHOD_REF, "Foo/2", "src/d/D.java");
        index
    }

    #[test]
    fn test_prefix_query_is_rechecked_after_decoding() {
        let pattern = ctor(None);
        let scope = ContainerScope::new(["/P1"]);
        let cancel = CancellationToken::new();
        let dispatcher = MatchDispatcher::new(&pattern, &scope, &cancel);
        let mut collector = PathCollector::new();

        let index = index();
        let reported = dispatcher
            .dispatch(&Container::project("/P1"), &index, &mut collector)
            .unwrap();

        assert_eq!(reported, 3);
        assert_eq!(
            collector.sorted_paths(),
            vec![
                "/P1/src/a/A.java",
                "/P1/src/b/B.java",
                "/P1/test/a/ATest.java"
            ]
        );
        assert_eq!(index.open_queries(), 0);
    }

    #[test]
    fn test_documents_outside_scope_are_dropped() {
        let pattern = ctor(Some(&["int", "int"]));
        let scope = ContainerScope::new(["/P1/src"]);
        let cancel = CancellationToken::new();
        let dispatcher = MatchDispatcher::new(&pattern, &scope, &cancel);
        let mut collector = PathCollector::new();

        dispatcher
            .dispatch(&Container::project("/P1"), &index(), &mut collector)
            .unwrap();
        assert_eq!(collector.sorted_paths(), vec!["/P1/src/a/A.java"]);
    }

    #[test]
    fn test_cancelled_before_start_reports_nothing() {
        let pattern = ctor(None);
        let scope = ContainerScope::new(["/P1"]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let dispatcher = MatchDispatcher::new(&pattern, &scope, &cancel);
        let mut collector = PathCollector::new();

        let index = index();
        let err = dispatcher
            .dispatch(&Container::project("/P1"), &index, &mut collector)
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(collector.is_empty());
        assert_eq!(index.queries_run(), 0);
    }

    #[test]
    fn test_requestor_stop_releases_the_index_and_spares_the_token() {
        let pattern = ctor(None);
        let scope = ContainerScope::new(["/P1"]);
        let cancel = CancellationToken::new();
        let dispatcher = MatchDispatcher::new(&pattern, &scope, &cancel);
        let mut collector = PathCollector::new().with_limit(1);

        let index = index();
        let err = dispatcher
            .dispatch(&Container::project("/P1"), &index, &mut collector)
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!cancel.is_cancelled());
        assert_eq!(collector.len(), 1);
        assert_eq!(index.open_queries(), 0);
    }

    #[test]
    fn test_access_restrictions_are_forwarded() {
        let rules = CompiledAccessRules::compile(&[AccessRule {
            patterns: vec!["/lib/internal.jar|*".to_string()],
            kind: AccessRuleKind::Discouraged,
        }])
        .unwrap();
        let pattern = PatternBuilder::new(LimitTo::References)
            .type_pattern("Impl")
            .unwrap();
        let scope = ContainerScope::new(["/lib/internal.jar"]).with_access_rules(rules);
        let cancel = CancellationToken::new();
        let dispatcher = MatchDispatcher::new(&pattern, &scope, &cancel);
        let mut collector = PathCollector::new();

        let mut index = MemoryIndex::new("/lib/internal.jar");
        index.add(category::REF, "Impl", "com/acme/Client.class");
        dispatcher
            .dispatch(&Container::archive("/lib/internal.jar"), &index, &mut collector)
            .unwrap();

        let found = &collector.matches()[0];
        assert_eq!(found.path, "/lib/internal.jar|com/acme/Client.class");
        assert_eq!(
            found.access.as_ref().map(|a| a.kind),
            Some(AccessRuleKind::Discouraged)
        );
    }

    /// Records the fine-grain flags of every reported match.
    #[derive(Default)]
    struct FineGrainRecorder {
        /// Flags seen, one per match.
        seen: Vec<FineGrain>,
    }

    impl Requestor for FineGrainRecorder {
        fn accept_index_match(&mut self, found: &IndexMatch<'_>) -> bool {
            self.seen.push(found.pattern.fine_grain());
            true
        }
    }

    #[test]
    fn test_fine_grain_reaches_the_requestor_unfiltered() {
        let scope = ContainerScope::new(["/P1"]);
        let cancel = CancellationToken::new();
        let index = index();
        let flags =
            FineGrain::CLASS_INSTANCE_CREATION_TYPE_REFERENCE | FineGrain::CAST_TYPE_REFERENCE;
        let restricted = PatternBuilder::new(LimitTo::References)
            .rule(MatchRule::exact())
            .fine_grain(flags)
            .constructor("Foo", Vec::new(), None, false)
            .unwrap();

        let mut plain = PathCollector::new();
        MatchDispatcher::new(&ctor(None), &scope, &cancel)
            .dispatch(&Container::project("/P1"), &index, &mut plain)
            .unwrap();

        let mut recorder = FineGrainRecorder::default();
        let reported = MatchDispatcher::new(&restricted, &scope, &cancel)
            .dispatch(&Container::project("/P1"), &index, &mut recorder)
            .unwrap();

        assert_eq!(reported, plain.len());
        assert_eq!(recorder.seen, vec![flags; reported]);
    }
}

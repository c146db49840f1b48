//! In-memory index.
//!
//! Stores `(category, key) -> documents` entries and answers queries with the index-level
//! match semantics: exact, prefix, wildcard or camel-case comparison over whole keys.

use std::sync::atomic::{AtomicUsize, Ordering};

use jsearch_pattern::{IndexQuery, MatchRule, NamePattern, matches_name};
use serde::{Deserialize, Serialize};

use crate::{
    SearchError,
    model::{EntryResult, Index},
};

/// One stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Category tag.
    pub category: String,
    /// Raw key.
    pub key: String,
    /// Container-relative document names.
    pub documents: Vec<String>,
}

/// An index held entirely in memory.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryIndex {
    /// Path of the container owning the index.
    container: String,
    /// Stored entries.
    #[serde(default)]
    entries: Vec<IndexEntry>,
    /// Number of acquisitions not yet released.
    #[serde(skip)]
    open_queries: AtomicUsize,
    /// Number of queries answered.
    #[serde(skip)]
    queries_run: AtomicUsize,
}

impl MemoryIndex {
    /// Creates an empty index for `container`.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            ..Self::default()
        }
    }

    /// Path of the container owning the index.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Records `document` under `key` in `category`.
    pub fn add(&mut self, category: &str, key: &str, document: &str) {
        let existing = self
            .entries
            .iter_mut()
            .find(|entry| entry.category == category && entry.key == key);
        match existing {
            Some(entry) => {
                if !entry.documents.iter().any(|d| d == document) {
                    entry.documents.push(document.to_string());
                }
            }
            None => self.entries.push(IndexEntry {
                category: category.to_string(),
                key: key.to_string(),
                documents: vec![document.to_string()],
            }),
        }
    }

    /// Stored entries.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of acquisitions not yet released.
    pub fn open_queries(&self) -> usize {
        self.open_queries.load(Ordering::SeqCst)
    }

    /// Number of queries answered so far.
    pub fn queries_run(&self) -> usize {
        self.queries_run.load(Ordering::SeqCst)
    }
}

impl Index for MemoryIndex {
    fn start_query(&self) {
        self.open_queries.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_query(&self) {
        self.open_queries.fetch_sub(1, Ordering::SeqCst);
    }

    fn query(&self, query: &IndexQuery) -> Result<Vec<EntryResult>, SearchError> {
        self.queries_run.fetch_add(1, Ordering::SeqCst);
        let rule = MatchRule::new(query.mode, query.case_sensitive);
        let matcher = query
            .key
            .as_deref()
            .map(|key| NamePattern::compile(key, rule))
            .transpose()
            .map_err(|err| SearchError::Index {
                container: self.container.clone(),
                message: err.to_string(),
            })?;

        Ok(self
            .entries
            .iter()
            .filter(|entry| query.categories.iter().any(|c| *c == entry.category))
            .filter(|entry| matches_name(matcher.as_ref(), &entry.key))
            .map(|entry| EntryResult {
                category: entry.category.clone(),
                key: entry.key.clone(),
                document_names: entry.documents.clone(),
            })
            .collect())
    }
}

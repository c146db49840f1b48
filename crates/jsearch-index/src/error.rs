//! Error types for the jsearch-index crate.

use std::{io, path::PathBuf};

use jsearch_config::{ConfigError, ErrorPolicy};
use jsearch_pattern::PatternError;
use thiserror::Error;

/// Errors that can occur while selecting containers and dispatching a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The search was cancelled, by the caller or by a requestor asking to stop.
    #[error("search cancelled")]
    Cancelled,

    /// A classpath or project-graph lookup failed.
    #[error("data source failure for {container}: {message}")]
    DataSource {
        /// Container whose data could not be read.
        container: String,
        /// Error message.
        message: String,
    },

    /// An index failed to answer a query.
    #[error("index query failed for {container}: {message}")]
    Index {
        /// Container owning the index.
        container: String,
        /// Error message.
        message: String,
    },

    /// A workspace snapshot could not be read or written.
    #[error("invalid workspace snapshot {path}: {message}")]
    Snapshot {
        /// Path to the snapshot file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The search pattern could not be built.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// Configuration could not be loaded or compiled.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SearchError {
    /// Creates a `DataSource` error.
    pub fn data_source(container: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            container: container.into(),
            message: message.into(),
        }
    }

    /// Returns true if this is the cancellation signal rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Applies `policy` to the outcome of a data-source lookup.
///
/// Under [`ErrorPolicy::BestEffort`] a failure is logged and replaced by `T::default()`.
/// Cancellation always propagates.
pub(crate) fn recover<T: Default>(
    policy: ErrorPolicy,
    result: Result<T, SearchError>,
    what: &str,
) -> Result<T, SearchError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_cancelled() || policy == ErrorPolicy::Strict => Err(err),
        Err(err) => {
            tracing::warn!(error = %err, "{what} failed, treating as empty");
            Ok(T::default())
        }
    }
}

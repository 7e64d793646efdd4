//! Error taxonomy for collection runs and catalog merging.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Page-level failure. Fatal to a collection run unless retryable.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error fetching {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    #[error("rate limited by {url}; try increasing --delay or using a proxy")]
    RateLimited { url: String },
}

impl FetchError {
    /// Transient transport failures may be retried; everything else ends the run.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport { .. } | FetchError::Timeout { .. })
    }
}

/// A single listing on a page could not be parsed.
#[derive(Debug, Clone, Error)]
#[error("could not extract {field}: {reason}")]
pub struct ExtractionError {
    pub field: &'static str,
    pub reason: String,
}

impl ExtractionError {
    pub fn missing(field: &'static str) -> Self {
        Self { field, reason: "element not found".to_string() }
    }
}

/// The secondary check for one item did not produce a verdict.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("validation failed: {0}")]
    Failed(String),

    #[error("validation timed out after {0:?}")]
    Timeout(Duration),
}

/// Writing collected rows to the output sink failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A source table handed to the merger is malformed.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} line {line}: expected 3 columns, found {found}")]
    ColumnCount { path: PathBuf, line: u64, found: usize },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Fatal outcome of a collection run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("page {page}: {source}")]
    Fetch {
        page: u32,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

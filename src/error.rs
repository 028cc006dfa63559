//! Query error taxonomy.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

/// Failures of a single query pipeline run.
///
/// Malformed files never appear here: the reader logs and skips them.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The keyword or question matched no catalog entry.
    #[error("no dataset category matches '{0}'")]
    UnresolvableCategory(String),

    /// A literal folder name tried to escape the data root.
    #[error("invalid storage name '{0}'")]
    InvalidStorageName(String),

    /// Resolution succeeded but the storage location is missing.
    #[error("storage for category '{category}' not found at {}", .path.display())]
    CategoryNotFound { category: String, path: PathBuf },

    /// Loading and filtering succeeded but nothing survived.
    #[error("no data found in '{0}'")]
    EmptyResultSet(String),

    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk data directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("dataset loader task failed: {0}")]
    Task(String),
}

impl QueryError {
    /// Short machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::UnresolvableCategory(_) => "unresolvable_category",
            QueryError::InvalidStorageName(_) => "bad_request",
            QueryError::CategoryNotFound { .. } => "category_not_found",
            QueryError::EmptyResultSet(_) => "no_results",
            QueryError::Io { .. } | QueryError::Walk(_) | QueryError::Task(_) => "internal",
        }
    }

    /// True for errors caused by the client's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QueryError::UnresolvableCategory(_) | QueryError::InvalidStorageName(_)
        )
    }

    /// True for "nothing to return" outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            QueryError::CategoryNotFound { .. } | QueryError::EmptyResultSet(_)
        )
    }
}

//! Error types for revql.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RevqlError>;

#[derive(Error, Debug)]
pub enum RevqlError {
    /// The address string is malformed (bad scheme, missing `@`, empty input,
    /// conflicting revisions).
    #[error("Invalid address '{address}': {detail}")]
    AddressParse { address: String, detail: String },

    /// No repository root could be discovered from the address.
    #[error("Repository not found for '{path}': {detail}")]
    RepositoryNotFound { path: String, detail: String },

    /// The revision string does not resolve in the discovered repository.
    #[error("Revision '{revision}' not found in '{repository}': {detail}")]
    RevisionNotFound {
        revision: String,
        repository: String,
        detail: String,
    },

    /// A `..` segment survived into a path interpreted inside a repository.
    #[error("Path '{path}' must not contain '..'")]
    PathSecurity { path: String },

    /// A single-address query function failed; rendered as `<function>: <detail>`.
    #[error("{function}: {source}")]
    Query {
        function: &'static str,
        #[source]
        source: Box<RevqlError>,
    },

    /// The address does not name a file at the resolved revision.
    #[error("File '{path}' not found at revision '{revision}'")]
    FileNotFound { path: String, revision: String },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table '{0}' reads its addresses from an input query; pass one with --input")]
    MissingInput(String),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl RevqlError {
    pub(crate) fn address(address: &str, detail: impl Into<String>) -> Self {
        Self::AddressParse {
            address: address.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn repository_not_found(path: &str, detail: impl Into<String>) -> Self {
        Self::RepositoryNotFound {
            path: path.to_string(),
            detail: detail.into(),
        }
    }

    /// True for the four failures produced while resolving an address.
    pub fn is_resolution(&self) -> bool {
        match self {
            Self::AddressParse { .. }
            | Self::RepositoryNotFound { .. }
            | Self::RevisionNotFound { .. }
            | Self::PathSecurity { .. } => true,
            Self::Query { source, .. } => source.is_resolution(),
            _ => false,
        }
    }

    /// Wraps this error with the name of the query function that raised it.
    pub fn in_function(self, function: &'static str) -> Self {
        match self {
            already @ Self::Query { .. } => already,
            other => Self::Query {
                function,
                source: Box::new(other),
            },
        }
    }
}

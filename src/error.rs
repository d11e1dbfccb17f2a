//! Error types for the status engine.
//!
//! Two layers: [`SourceError`] describes one failed folder observation and is
//! always absorbed into the data model; [`Error`] covers structural problems
//! that stop a run before it starts.

use serde::Serialize;
use std::path::PathBuf;

/// The result type used throughout flowscope.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that prevent a run from starting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested environment name is not one of DEV, UAT or PROD.
    #[error("unknown environment: {name}")]
    UnknownEnvironment { name: String },

    /// The pipeline configuration has no entry for the environment.
    #[error("no pipeline configured for environment {environment}")]
    EnvironmentNotConfigured { environment: String },

    /// The pipeline configuration is structurally invalid.
    #[error("invalid pipeline configuration: {message}")]
    InvalidConfig { message: String },

    /// A run date could not be parsed.
    #[error("invalid run date {input:?}: expected YYYY-MM-DD or YYMMDD")]
    InvalidRunDate { input: String },

    /// The configuration file could not be read.
    #[error("failed to read pipeline configuration {path:?}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for a pipeline configuration.
    #[error("failed to parse pipeline configuration {path:?}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    /// The worker pool for folder queries could not be started.
    #[error("failed to start folder query workers: {0}")]
    WorkerPool(String),
}

/// Failure of a single (job, folder) status query.
///
/// Never propagated past the engine: a failed observation only removes that
/// folder from resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("source returned HTTP {status}")]
    Http { status: u16 },

    #[error("request timed out")]
    Timeout,

    #[error("undecodable response: {0}")]
    Decode(String),

    /// The source answered with an error message disguised as data.
    #[error("source reported an error: {0}")]
    ErrorPayload(String),

    #[error("query cancelled")]
    Cancelled,
}

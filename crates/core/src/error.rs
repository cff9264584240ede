//! Unified error types for eikan.
//!
//! Every variant renders with a stable code prefix so tool callers can
//! match on it without parsing prose.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the eikan workspace.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unknown category).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No phrase with the given Japanese text is loaded.
    #[error("PHRASE_NOT_FOUND: {0}")]
    PhraseNotFound(String),

    /// A category file could not be fetched or parsed.
    #[error("LOAD_FAILED: {0}")]
    LoadFailed(String),

    /// An asset of the install manifest could not be fetched.
    #[error("CACHE_SEED_FAILED: {0}")]
    CacheSeedFailed(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network-level failure or unusable HTTP response.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Page rendering is disabled in configuration or at build time.
    #[error("RENDER_DISABLED")]
    RenderDisabled,

    /// Rasterization or document assembly failed.
    #[error("EXPORT_FAILED: {0}")]
    ExportFailed(String),
}

impl Error {
    /// Whether the error happened below HTTP, i.e. the network was unreachable.
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Error::HttpError(_) | Error::FetchTimeout(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::PhraseNotFound(jp) => (-32001, format!("no phrase with jp text {jp:?}")),
            Error::LoadFailed(msg) => (-32020, msg.clone()),
            Error::CacheSeedFailed(msg) => (-32021, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::RenderDisabled => (-32011, "Page rendering is disabled".to_string()),
            Error::ExportFailed(msg) => (-32012, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

//! Unified error types for rise-edr.
//!
//! Every variant folds into one of three [`ErrorKind`]s so the HTTP layer
//! sitting on top of the engine can map failures to protocol responses.

use tokio_rusqlite::rusqlite;

/// Unified error type for the cache, fetch and filter layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed filter input or a structurally unexpected payload.
    #[error("QUERY_ERROR: {0}")]
    Query(String),

    /// Remote fetch or cache backend failure.
    #[error("CONNECTION_ERROR: {0}")]
    Connection(String),

    /// A merge or join produced nothing usable.
    #[error("NO_DATA: {0}")]
    NoData(String),

    /// No cache entry exists for the given URL.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A cached payload could not be decoded back into JSON.
    #[error("DECODE_ERROR: {0}")]
    Decode(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),
}

/// Coarse error classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Query,
    Connection,
    NoData,
}

impl ErrorKind {
    /// Conventional HTTP status for this class of failure.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Query => 400,
            ErrorKind::Connection => 502,
            ErrorKind::NoData => 404,
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Query(_) | Error::Decode(_) | Error::InvalidUrl(_) => ErrorKind::Query,
            Error::NoData(_) | Error::CacheMiss(_) => ErrorKind::NoData,
            Error::Connection(_) | Error::Database(_) | Error::MigrationFailed(_) => ErrorKind::Connection,
        }
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Error::Query(msg.into())
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

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Connection(format!("redis: {err}"))
    }
}

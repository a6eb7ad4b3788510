//! Error taxonomy for query operations.
//!
//! Only errors that abort an operation live here. Recoverable conditions
//! (stale index entries, unknown filter tokens) are handled locally by the
//! session and never surface to the caller.

use std::fmt;

/// Errors that abort the current query operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A package-id token did not decode into (name, version, arch, origin).
    MalformedIdentity(String),
    /// A decoded or looked-up package name is absent from the cache snapshot.
    PackageNotFound(String),
    /// An external data source needs manual intervention (e.g. media change).
    MediaChange(String),
    /// Any other internal fault. The worker stays alive to serve later queries.
    Internal(String),
}

impl QueryError {
    /// The kind tag reported over the signal boundary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::MalformedIdentity(_) => ErrorKind::MalformedIdentity,
            QueryError::PackageNotFound(_) => ErrorKind::PackageNotFound,
            QueryError::MediaChange(_) => ErrorKind::MediaChange,
            QueryError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::MalformedIdentity(token) => {
                write!(f, "Malformed package id: {:?}", token)
            }
            QueryError::PackageNotFound(name) => {
                write!(f, "Package {} not found in the cache", name)
            }
            QueryError::MediaChange(msg) => {
                write!(f, "Medium change needed: {}", msg)
            }
            QueryError::Internal(msg) => {
                write!(f, "Internal error: {}", msg)
            }
        }
    }
}

impl std::error::Error for QueryError {}

/// Error classification emitted with `on_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedIdentity,
    PackageNotFound,
    MediaChange,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MalformedIdentity => write!(f, "malformed-identity"),
            ErrorKind::PackageNotFound => write!(f, "package-not-found"),
            ErrorKind::MediaChange => write!(f, "media-change"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Terminal outcome of a query operation. Every operation emits exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
    Cancelled,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Failed => write!(f, "failed"),
            Outcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

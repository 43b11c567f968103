//! Error types for the asset store.

use thiserror::Error;

use crate::asset::TransportError;

/// Common error type for asset store operations.
///
/// The public store methods collapse these into `None` / `false`; the
/// `try_*` variants hand them to the caller untouched.
#[derive(Error, Debug)]
pub enum AssetError {
    /// The remote file server could not be reached or refused the login.
    #[error("connection failure: {0}")]
    ConnectionFailure(#[source] TransportError),

    /// A directory segment could not be entered or created.
    #[error("could not create directory {path}: {source}")]
    DirectoryCreateFailure {
        path: String,
        #[source]
        source: TransportError,
    },

    /// A store or retrieve command failed.
    #[error("transfer of {path} failed: {source}")]
    TransferFailure {
        path: String,
        #[source]
        source: TransportError,
    },

    /// Remote resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A delete command was rejected or interrupted.
    #[error("delete of {path} failed: {source}")]
    DeleteFailure {
        path: String,
        #[source]
        source: TransportError,
    },

    /// The remote path has no usable file name.
    #[error("invalid remote path: {0}")]
    InvalidPath(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for asset store operations.
pub type Result<T> = std::result::Result<T, AssetError>;

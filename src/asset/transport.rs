//! Transport abstraction over an FTP control connection.
//!
//! The store only ever talks to a [`RemoteSession`]; the real server is
//! reached through [`super::ftp::FtpsConnector`] and tests use
//! [`super::memory::MemoryConnector`].

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors reported by a remote session.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a reply code other than the expected one.
    #[error("server replied {code}: {message}")]
    Rejected { code: u32, message: String },

    /// The control or data connection failed.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS negotiation failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The session is no longer connected.
    #[error("session disconnected")]
    Disconnected,

    /// Any other protocol-level failure.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Whether this is a permanent negative reply (5xx).
    ///
    /// Servers answer 550 both for missing paths and for permission
    /// problems, so the two cannot be told apart.
    pub fn is_permanent(&self) -> bool {
        matches!(self, TransportError::Rejected { code, .. } if (500..600).contains(code))
    }
}

/// An authenticated session on the remote file server.
///
/// A session carries a current working directory; relative paths are
/// resolved against it.
pub trait RemoteSession {
    /// Liveness check (NOOP).
    fn noop(&mut self) -> TransportResult<()>;

    /// Change the working directory (CWD).
    fn cwd(&mut self, path: &str) -> TransportResult<()>;

    /// Create a directory (MKD).
    fn mkdir(&mut self, path: &str) -> TransportResult<()>;

    /// Store `data` in binary mode under `name` (STOR).
    ///
    /// Returns the number of bytes sent.
    fn store(&mut self, name: &str, data: &[u8]) -> TransportResult<u64>;

    /// Retrieve a whole file in binary mode (RETR).
    fn retrieve(&mut self, path: &str) -> TransportResult<Vec<u8>>;

    /// Delete a file (DELE).
    fn delete(&mut self, path: &str) -> TransportResult<()>;

    /// Names of the entries in a directory (NLST).
    fn list(&mut self, path: &str) -> TransportResult<Vec<String>>;

    /// End the session gracefully (QUIT).
    fn quit(&mut self) -> TransportResult<()>;
}

/// Opens new sessions: connect, secure both channels, and log in.
pub trait Connector {
    fn open(&self) -> TransportResult<Box<dyn RemoteSession>>;
}

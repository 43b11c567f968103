//! Remote image storage for catalog records.
//!
//! This module provides:
//! - Path normalisation and thumbnail path mirroring
//! - Per-context FTP session reuse with a NOOP liveness check
//! - Recursive remote directory creation
//! - Upload (original plus thumbnail), download and delete

mod ftp;
pub mod memory;
pub mod path;
mod session;
mod store;
pub mod thumbnail;
mod transport;

pub use ftp::FtpsConnector;
pub use memory::{MemoryConnector, MemoryServer};
pub use session::StoreContext;
pub use store::{ensure_directory, AssetPair, AssetStore, UploadOutcome};
pub use transport::{Connector, RemoteSession, TransportError, TransportResult};

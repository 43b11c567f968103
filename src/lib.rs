//! catalog-assets - image storage for the catalog admin panel.
//!
//! Originals and their thumbnails live on a remote FTP server reached over
//! explicit TLS. The admin UI keeps one [`StoreContext`] per user session
//! and passes it to every [`AssetStore`] call.

pub mod asset;
pub mod config;
pub mod error;
pub mod logging;

pub use asset::{
    AssetPair, AssetStore, Connector, FtpsConnector, MemoryConnector, MemoryServer,
    RemoteSession, StoreContext, TransportError, UploadOutcome,
};
pub use config::Config;
pub use error::{AssetError, Result};

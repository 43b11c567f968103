//! Asset store: originals and thumbnails on the remote file server.

use tracing::{debug, info, warn};

use crate::config::AssetsConfig;
use crate::{AssetError, Result};

use super::path;
use super::session::StoreContext;
use super::thumbnail;
use super::transport::{Connector, RemoteSession};

/// Remote paths produced by a successful upload.
///
/// The thumbnail is stored after the original and independently of it; a
/// failed thumbnail leaves the original in place with `thumbnail == None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPair {
    pub original: String,
    pub thumbnail: Option<String>,
}

/// Outcome of [`AssetStore::upload`]: both paths are `None` on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    pub original: Option<String>,
    pub thumbnail: Option<String>,
}

impl From<AssetPair> for UploadOutcome {
    fn from(pair: AssetPair) -> Self {
        Self {
            original: Some(pair.original),
            thumbnail: pair.thumbnail,
        }
    }
}

/// Image store backed by a remote file server.
///
/// The store holds no session itself; every operation runs on the session
/// of the [`StoreContext`] it is given.
pub struct AssetStore<C> {
    connector: C,
    config: AssetsConfig,
}

impl<C: Connector> AssetStore<C> {
    /// Create a store opening sessions through `connector`.
    pub fn new(connector: C, config: AssetsConfig) -> Self {
        Self { connector, config }
    }

    /// Layout configuration in use.
    pub fn config(&self) -> &AssetsConfig {
        &self.config
    }

    /// Upload `bytes` to `remote_path` and store a thumbnail next to it.
    ///
    /// Failures are logged and reported as an empty outcome; see
    /// [`Self::try_upload`] for the tagged error.
    pub fn upload(&self, ctx: &mut StoreContext, bytes: &[u8], remote_path: &str) -> UploadOutcome {
        match self.try_upload(ctx, bytes, remote_path) {
            Ok(pair) => pair.into(),
            Err(e) => {
                warn!(path = %remote_path, error = %e, "upload failed");
                UploadOutcome::default()
            }
        }
    }

    /// Upload `bytes` to `remote_path`, then try to add a thumbnail.
    pub fn try_upload(
        &self,
        ctx: &mut StoreContext,
        bytes: &[u8],
        remote_path: &str,
    ) -> Result<AssetPair> {
        let remote = path::normalize(remote_path);
        let (dir, file) = path::split(&remote);
        if file.is_empty() {
            return Err(AssetError::InvalidPath(remote.clone()));
        }

        let session = ctx.acquire(&self.connector)?;
        try_ensure_directory(session, dir)?;

        // The working directory is now `dir`.
        let sent = session
            .store(file, bytes)
            .map_err(|source| AssetError::TransferFailure {
                path: remote.clone(),
                source,
            })?;
        info!(path = %remote, bytes = sent, "uploaded original");

        let thumbnail = self.store_thumbnail(session, bytes, dir, file);
        Ok(AssetPair {
            original: remote,
            thumbnail,
        })
    }

    fn store_thumbnail(
        &self,
        session: &mut dyn RemoteSession,
        bytes: &[u8],
        dir: &str,
        file: &str,
    ) -> Option<String> {
        let thumb = match thumbnail::render(bytes, self.config.thumbnail_max_edge) {
            Ok(thumb) => thumb,
            Err(e) => {
                debug!(file, error = %e, "not an image, skipping thumbnail");
                return None;
            }
        };

        let thumb_dir = path::mirror_dir(
            dir,
            &self.config.image_base_dir,
            &self.config.thumbnail_base_dir,
        );
        let thumb_path = path::join(&thumb_dir, file);

        if !ensure_directory(session, &thumb_dir) {
            warn!(path = %thumb_path, "thumbnail directory unavailable, keeping original only");
            return None;
        }
        match session.store(file, &thumb.bytes) {
            Ok(sent) => {
                info!(
                    path = %thumb_path,
                    bytes = sent,
                    format = ?thumb.format,
                    width = thumb.width,
                    height = thumb.height,
                    "uploaded thumbnail"
                );
                Some(thumb_path)
            }
            Err(e) => {
                warn!(path = %thumb_path, error = %e, "thumbnail upload failed");
                None
            }
        }
    }

    /// Download a file. `None` covers both a missing file and any failure.
    pub fn download(&self, ctx: &mut StoreContext, remote_path: &str) -> Option<Vec<u8>> {
        match self.try_download(ctx, remote_path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path = %remote_path, error = %e, "download failed");
                None
            }
        }
    }

    /// Download a file, distinguishing [`AssetError::NotFound`] from other failures.
    pub fn try_download(&self, ctx: &mut StoreContext, remote_path: &str) -> Result<Vec<u8>> {
        let remote = path::absolute(remote_path);
        let session = ctx.acquire(&self.connector)?;

        debug!(path = %remote, "retrieving file");
        session.retrieve(&remote).map_err(|source| {
            if source.is_permanent() {
                AssetError::NotFound(remote.clone())
            } else {
                AssetError::TransferFailure {
                    path: remote.clone(),
                    source,
                }
            }
        })
    }

    /// Delete exactly `remote_path`. Thumbnails and parent directories stay.
    pub fn delete(&self, ctx: &mut StoreContext, remote_path: &str) -> bool {
        match self.try_delete(ctx, remote_path) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %remote_path, error = %e, "delete failed");
                false
            }
        }
    }

    /// Delete exactly `remote_path`, returning the tagged error on failure.
    pub fn try_delete(&self, ctx: &mut StoreContext, remote_path: &str) -> Result<()> {
        let remote = path::absolute(remote_path);
        let session = ctx.acquire(&self.connector)?;

        session
            .delete(&remote)
            .map_err(|source| AssetError::DeleteFailure {
                path: remote.clone(),
                source,
            })?;
        info!(path = %remote, "deleted file");
        Ok(())
    }

    /// Names of the entries in a remote directory.
    pub fn list(&self, ctx: &mut StoreContext, remote_dir: &str) -> Option<Vec<String>> {
        match self.try_list(ctx, remote_dir) {
            Ok(names) => Some(names),
            Err(e) => {
                warn!(path = %remote_dir, error = %e, "listing failed");
                None
            }
        }
    }

    /// Names of the entries in a remote directory, returning the tagged error on failure.
    pub fn try_list(&self, ctx: &mut StoreContext, remote_dir: &str) -> Result<Vec<String>> {
        let remote = path::absolute(remote_dir);
        let session = ctx.acquire(&self.connector)?;

        session.list(&remote).map_err(|source| {
            if source.is_permanent() {
                AssetError::NotFound(remote.clone())
            } else {
                AssetError::TransferFailure {
                    path: remote.clone(),
                    source,
                }
            }
        })
    }

    /// Remote path for an image attached to a catalog record.
    ///
    /// The image goes under the image base directory, in the same
    /// sub-directory as the record itself: record `scans\2021\letter.txt`
    /// with file `photo.jpg` maps to `img/scans/2021/photo.jpg`.
    pub fn image_path_for(&self, record_path: &str, file_name: &str) -> String {
        let record_path = path::normalize(record_path);
        let mut segments = path::segments(&self.config.image_base_dir);
        segments.extend(path::segments(path::parent(&record_path)));
        segments.push(path::normalize(file_name));
        segments.join("/")
    }

    /// Public URL of a stored path. Paths that already are URLs pass through.
    pub fn public_url(&self, remote_path: &str) -> String {
        if remote_path.starts_with("http://") || remote_path.starts_with("https://") {
            return remote_path.to_string();
        }
        let base = self.config.public_base_url.trim_end_matches('/');
        let remote = path::normalize(remote_path);
        let remote = remote.trim_start_matches('/');
        if base.is_empty() {
            format!("/{remote}")
        } else {
            format!("{base}/{remote}")
        }
    }
}

/// Make sure `dir` exists, creating missing segments from the root.
///
/// On success the session's working directory is `dir` itself; callers
/// must not change into it again. On failure the directories created so
/// far are left in place.
pub fn ensure_directory(session: &mut dyn RemoteSession, dir: &str) -> bool {
    match try_ensure_directory(session, dir) {
        Ok(()) => true,
        Err(e) => {
            warn!(dir, error = %e, "could not ensure remote directory");
            false
        }
    }
}

fn try_ensure_directory(session: &mut dyn RemoteSession, dir: &str) -> Result<()> {
    session
        .cwd("/")
        .map_err(|source| AssetError::DirectoryCreateFailure {
            path: "/".to_string(),
            source,
        })?;

    let mut current = String::new();
    for segment in path::segments(dir) {
        current = path::join(&current, &segment);
        match session.cwd(&segment) {
            Ok(()) => {}
            Err(e) if e.is_permanent() => {
                debug!(dir = %current, "creating remote directory");
                session
                    .mkdir(&segment)
                    .and_then(|()| session.cwd(&segment))
                    .map_err(|source| AssetError::DirectoryCreateFailure {
                        path: current.clone(),
                        source,
                    })?;
            }
            Err(source) => {
                return Err(AssetError::DirectoryCreateFailure {
                    path: current,
                    source,
                })
            }
        }
    }
    Ok(())
}

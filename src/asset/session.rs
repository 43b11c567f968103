//! Per-context session handle.

use tracing::{debug, warn};

use crate::{AssetError, Result};

use super::transport::{Connector, RemoteSession};

/// Owner of at most one remote session.
///
/// One context belongs to one caller (typically one admin's UI session).
/// The session is opened lazily, checked with NOOP before every reuse, and
/// replaced when the check fails. Store operations borrow the context
/// mutably, so a session and its working directory are never used by two
/// operations at once.
#[derive(Default)]
pub struct StoreContext {
    session: Option<Box<dyn RemoteSession>>,
}

impl StoreContext {
    /// Create a context with no session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session is currently held (it may still be dead).
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Return a live session, reusing the held one when its NOOP check succeeds.
    ///
    /// A failed check discards the old session. Failure to open a new one is
    /// reported as [`AssetError::ConnectionFailure`] and leaves the context
    /// empty.
    pub fn acquire<C>(&mut self, connector: &C) -> Result<&mut dyn RemoteSession>
    where
        C: Connector + ?Sized,
    {
        let reusable = match self.session.take() {
            Some(mut session) => match session.noop() {
                Ok(()) => Some(session),
                Err(e) => {
                    warn!(error = %e, "FTP session check failed, reconnecting");
                    None
                }
            },
            None => None,
        };

        let session = match reusable {
            Some(session) => session,
            None => connector.open().map_err(|e| {
                warn!(error = %e, "FTP connection failed");
                AssetError::ConnectionFailure(e)
            })?,
        };

        Ok(&mut **self.session.insert(session))
    }

    /// Close the held session, if any.
    ///
    /// Errors from QUIT are logged and dropped; the context is empty afterwards.
    pub fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            match session.quit() {
                Ok(()) => debug!("FTP session closed"),
                Err(e) => warn!(error = %e, "error closing FTP session"),
            }
        }
    }
}

impl Drop for StoreContext {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext")
            .field("has_session", &self.has_session())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::memory::MemoryServer;

    #[test]
    fn test_acquire_is_lazy() {
        let server = MemoryServer::new();
        let ctx = StoreContext::new();

        assert!(!ctx.has_session());
        assert_eq!(server.handshakes(), 0);
    }

    #[test]
    fn test_acquire_reuses_live_session() {
        let server = MemoryServer::new();
        let connector = server.connector();
        let mut ctx = StoreContext::new();

        ctx.acquire(&connector).unwrap();
        ctx.acquire(&connector).unwrap();

        assert_eq!(server.handshakes(), 1);
        assert!(ctx.has_session());
    }

    #[test]
    fn test_acquire_replaces_dead_session() {
        let server = MemoryServer::new();
        let connector = server.connector();
        let mut ctx = StoreContext::new();

        ctx.acquire(&connector).unwrap();
        server.disconnect_all();
        ctx.acquire(&connector).unwrap().noop().unwrap();

        assert_eq!(server.handshakes(), 2);
    }

    #[test]
    fn test_acquire_failure_leaves_context_empty() {
        let server = MemoryServer::new();
        let connector = server.connector();
        let mut ctx = StoreContext::new();

        ctx.acquire(&connector).unwrap();
        server.disconnect_all();
        server.set_refuse_connect(true);

        let result = ctx.acquire(&connector);
        assert!(matches!(result, Err(AssetError::ConnectionFailure(_))));
        assert!(!ctx.has_session());
    }

    #[test]
    fn test_release_sends_quit_and_clears() {
        let server = MemoryServer::new();
        let mut ctx = StoreContext::new();
        ctx.acquire(&server.connector()).unwrap();

        ctx.release();

        assert!(!ctx.has_session());
        assert_eq!(server.commands().last().map(String::as_str), Some("QUIT"));
    }

    #[test]
    fn test_release_swallows_quit_errors() {
        let server = MemoryServer::new();
        let mut ctx = StoreContext::new();
        ctx.acquire(&server.connector()).unwrap();
        server.disconnect_all();

        ctx.release();

        assert!(!ctx.has_session());
        ctx.release();
    }
}

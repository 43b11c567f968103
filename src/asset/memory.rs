//! In-memory file server implementing the transport traits.
//!
//! Behaves like an FTP server for the commands the store issues: replies
//! 550 for missing paths, keeps a working directory per session, and
//! counts handshakes. Used by the test suite.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::path;
use super::transport::{Connector, RemoteSession, TransportError, TransportResult};

#[derive(Debug, Default)]
struct ServerState {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    handshakes: usize,
    epoch: u64,
    refuse_connect: bool,
    refused_dirs: HashSet<String>,
    refused_stores: HashSet<String>,
    fail_transfers: bool,
    commands: Vec<String>,
}

/// Shared state of an in-memory file server.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryServer {
    state: Arc<Mutex<ServerState>>,
}

impl MemoryServer {
    /// Create an empty server with only the root directory.
    pub fn new() -> Self {
        let server = Self::default();
        server.lock().dirs.insert("/".to_string());
        server
    }

    /// A connector opening sessions on this server.
    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            server: self.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        // Recover the state if a holder panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of completed handshakes.
    pub fn handshakes(&self) -> usize {
        self.lock().handshakes
    }

    /// Drop every open session, as a server restart would.
    pub fn disconnect_all(&self) {
        self.lock().epoch += 1;
    }

    /// Make new connection attempts fail.
    pub fn set_refuse_connect(&self, refuse: bool) {
        self.lock().refuse_connect = refuse;
    }

    /// Make `MKD` fail for the given absolute directory.
    pub fn refuse_mkdir(&self, dir: &str) {
        self.lock().refused_dirs.insert(resolve("/", dir));
    }

    /// Make `STOR` answer 550 for the given absolute file path.
    pub fn refuse_store(&self, file: &str) {
        self.lock().refused_stores.insert(resolve("/", file));
    }

    /// Make every `STOR` and `RETR` fail with a reset data connection.
    pub fn set_fail_transfers(&self, fail: bool) {
        self.lock().fail_transfers = fail;
    }

    /// Whether an absolute directory exists.
    pub fn has_dir(&self, dir: &str) -> bool {
        self.lock().dirs.contains(&resolve("/", dir))
    }

    /// Contents of a file, by absolute path.
    pub fn file(&self, file: &str) -> Option<Vec<u8>> {
        self.lock().files.get(&resolve("/", file)).cloned()
    }

    /// Place a file directly, creating its parents.
    pub fn put_file(&self, file: &str, data: &[u8]) {
        let file = resolve("/", file);
        let mut state = self.lock();
        let mut dir = String::new();
        for segment in path::segments(path::parent(&file)) {
            dir = format!("{dir}/{segment}");
            state.dirs.insert(dir.clone());
        }
        state.files.insert(file, data.to_vec());
    }

    /// All file paths currently stored.
    pub fn file_paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    /// Commands received so far, in order (`"CWD /"`, `"STOR b.png"`, ...).
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    /// Forget the recorded command log.
    pub fn clear_commands(&self) {
        self.lock().commands.clear();
    }
}

/// Opens sessions on a [`MemoryServer`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    server: MemoryServer,
}

impl Connector for MemoryConnector {
    fn open(&self) -> TransportResult<Box<dyn RemoteSession>> {
        let mut state = self.server.lock();
        if state.refuse_connect {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        state.handshakes += 1;
        let epoch = state.epoch;
        drop(state);

        Ok(Box::new(MemorySession {
            server: self.server.clone(),
            cwd: "/".to_string(),
            epoch,
        }))
    }
}

struct MemorySession {
    server: MemoryServer,
    cwd: String,
    epoch: u64,
}

impl MemorySession {
    /// Lock the server, log the command and check the session is still live.
    fn begin(&self, command: String) -> TransportResult<MutexGuard<'_, ServerState>> {
        let mut state = self.server.lock();
        if state.epoch != self.epoch {
            return Err(TransportError::Disconnected);
        }
        state.commands.push(command);
        Ok(state)
    }
}

fn reset_data_connection() -> TransportError {
    TransportError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "data connection reset",
    ))
}

fn not_found(path: &str) -> TransportError {
    TransportError::Rejected {
        code: 550,
        message: format!("{path}: No such file or directory"),
    }
}

/// Parent of a resolved path, `/` for top-level entries.
fn parent_dir(resolved: &str) -> &str {
    match path::parent(resolved) {
        "" => "/",
        parent => parent,
    }
}

/// Resolve `target` against `cwd` into a canonical absolute path.
fn resolve(cwd: &str, target: &str) -> String {
    let base = if target.starts_with('/') || target.starts_with('\\') {
        String::new()
    } else {
        cwd.to_string()
    };
    let joined = path::segments(&format!("{base}/{target}")).join("/");
    format!("/{joined}")
}

impl RemoteSession for MemorySession {
    fn noop(&mut self) -> TransportResult<()> {
        self.begin("NOOP".to_string()).map(|_| ())
    }

    fn cwd(&mut self, target: &str) -> TransportResult<()> {
        let resolved = resolve(&self.cwd, target);
        let state = self.begin(format!("CWD {target}"))?;
        if !state.dirs.contains(&resolved) {
            return Err(not_found(target));
        }
        drop(state);
        self.cwd = resolved;
        Ok(())
    }

    fn mkdir(&mut self, target: &str) -> TransportResult<()> {
        let resolved = resolve(&self.cwd, target);
        let mut state = self.begin(format!("MKD {target}"))?;
        if state.refused_dirs.contains(&resolved) {
            return Err(TransportError::Rejected {
                code: 550,
                message: format!("{target}: Permission denied"),
            });
        }
        if state.dirs.contains(&resolved) || !state.dirs.contains(parent_dir(&resolved)) {
            return Err(TransportError::Rejected {
                code: 550,
                message: format!("{target}: Cannot create directory"),
            });
        }
        state.dirs.insert(resolved);
        Ok(())
    }

    fn store(&mut self, name: &str, data: &[u8]) -> TransportResult<u64> {
        let resolved = resolve(&self.cwd, name);
        let mut state = self.begin(format!("STOR {name}"))?;
        if state.fail_transfers {
            return Err(reset_data_connection());
        }
        if state.refused_stores.contains(&resolved) {
            return Err(TransportError::Rejected {
                code: 550,
                message: format!("{name}: Permission denied"),
            });
        }
        if !state.dirs.contains(parent_dir(&resolved)) {
            return Err(not_found(name));
        }
        state.files.insert(resolved, data.to_vec());
        Ok(data.len() as u64)
    }

    fn retrieve(&mut self, target: &str) -> TransportResult<Vec<u8>> {
        let resolved = resolve(&self.cwd, target);
        let state = self.begin(format!("RETR {target}"))?;
        if state.fail_transfers {
            return Err(reset_data_connection());
        }
        state.files.get(&resolved).cloned().ok_or_else(|| not_found(target))
    }

    fn delete(&mut self, target: &str) -> TransportResult<()> {
        let resolved = resolve(&self.cwd, target);
        let mut state = self.begin(format!("DELE {target}"))?;
        state
            .files
            .remove(&resolved)
            .map(|_| ())
            .ok_or_else(|| not_found(target))
    }

    fn list(&mut self, target: &str) -> TransportResult<Vec<String>> {
        let resolved = resolve(&self.cwd, target);
        let state = self.begin(format!("NLST {target}"))?;
        if !state.dirs.contains(&resolved) {
            return Err(not_found(target));
        }

        let child_name = |entry: &String| -> Option<String> {
            let (dir, name) = path::split(entry);
            let dir = if dir.is_empty() { "/" } else { dir };
            (dir == resolved && !name.is_empty()).then(|| name.to_string())
        };
        let mut names: Vec<String> = state
            .dirs
            .iter()
            .filter_map(child_name)
            .chain(state.files.keys().filter_map(child_name))
            .collect();
        names.sort();
        Ok(names)
    }

    fn quit(&mut self) -> TransportResult<()> {
        self.begin("QUIT".to_string()).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("/", "img"), "/img");
        assert_eq!(resolve("/img", "a"), "/img/a");
        assert_eq!(resolve("/img", "/thumbnails"), "/thumbnails");
        assert_eq!(resolve("/", "/"), "/");
        assert_eq!(resolve("/img", r"a\b"), "/img/a/b");
    }

    #[test]
    fn test_cwd_missing_dir_is_permanent() {
        let server = MemoryServer::new();
        let mut session = server.connector().open().unwrap();

        let err = session.cwd("img").unwrap_err();
        assert!(err.is_permanent());
    }

    #[test]
    fn test_mkdir_then_cwd() {
        let server = MemoryServer::new();
        let mut session = server.connector().open().unwrap();

        session.mkdir("img").unwrap();
        session.cwd("img").unwrap();
        session.mkdir("a").unwrap();

        assert!(server.has_dir("/img/a"));
        assert!(session.mkdir("a").unwrap_err().is_permanent());
    }

    #[test]
    fn test_disconnect_invalidates_sessions() {
        let server = MemoryServer::new();
        let mut session = server.connector().open().unwrap();
        session.noop().unwrap();

        server.disconnect_all();

        assert!(matches!(session.noop(), Err(TransportError::Disconnected)));
        let mut fresh = server.connector().open().unwrap();
        assert!(fresh.noop().is_ok());
        assert_eq!(server.handshakes(), 2);
    }

    #[test]
    fn test_list_direct_children() {
        let server = MemoryServer::new();
        server.put_file("/img/a/b.png", b"b");
        server.put_file("/img/c.png", b"c");
        let mut session = server.connector().open().unwrap();

        assert_eq!(session.list("/img").unwrap(), vec!["a", "c.png"]);
        assert_eq!(session.list("/").unwrap(), vec!["img"]);
        assert!(session.list("/nope").unwrap_err().is_permanent());
    }

    #[test]
    fn test_refuse_store() {
        let server = MemoryServer::new();
        server.refuse_store("/locked.bin");
        let mut session = server.connector().open().unwrap();

        assert!(session.store("locked.bin", b"x").unwrap_err().is_permanent());
        assert!(session.store("open.bin", b"x").is_ok());
        assert!(server.file("/locked.bin").is_none());
    }

    #[test]
    fn test_fail_transfers_is_not_permanent() {
        let server = MemoryServer::new();
        server.put_file("/a.bin", b"a");
        server.set_fail_transfers(true);
        let mut session = server.connector().open().unwrap();

        let err = session.retrieve("/a.bin").unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
        assert!(!err.is_permanent());
        assert!(session.store("b.bin", b"b").is_err());

        server.set_fail_transfers(false);
        assert_eq!(session.retrieve("/a.bin").unwrap(), b"a");
    }

    #[test]
    fn test_refuse_connect() {
        let server = MemoryServer::new();
        server.set_refuse_connect(true);

        assert!(server.connector().open().is_err());
        assert_eq!(server.handshakes(), 0);
    }
}

//! FTP over explicit TLS, backed by `suppaftp`.

use std::io::Cursor;
use std::sync::Arc;

use suppaftp::types::FileType;
use suppaftp::{FtpError, RustlsConnector, RustlsFtpStream};
use tracing::{debug, info};

use crate::config::FtpConfig;

use super::transport::{Connector, RemoteSession, TransportError, TransportResult};

/// Opens FTPS sessions against the configured server.
///
/// Each session negotiates `AUTH TLS` on the control connection and
/// `PBSZ 0` / `PROT P` for the data channel before logging in, then
/// switches to binary transfers.
pub struct FtpsConnector {
    config: FtpConfig,
    tls: Arc<rustls::ClientConfig>,
}

impl FtpsConnector {
    /// Build a connector verifying server certificates against the webpki roots.
    pub fn new(config: FtpConfig) -> TransportResult<Self> {
        let roots =
            rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let tls = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| TransportError::Tls(e.to_string()))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            config,
            tls: Arc::new(tls),
        })
    }
}

impl Connector for FtpsConnector {
    fn open(&self) -> TransportResult<Box<dyn RemoteSession>> {
        let address = self.config.address();
        debug!(%address, "connecting to FTP server");

        let stream = RustlsFtpStream::connect(address.as_str()).map_err(map_error)?;
        let mut stream = stream
            .into_secure(
                RustlsConnector::from(Arc::clone(&self.tls)),
                self.config.tls_domain(),
            )
            .map_err(map_error)?;
        stream
            .login(self.config.username.as_str(), self.config.password.as_str())
            .map_err(map_error)?;
        stream.transfer_type(FileType::Binary).map_err(map_error)?;

        info!(%address, user = %self.config.username, "FTP session established");
        Ok(Box::new(FtpsSession { stream }))
    }
}

struct FtpsSession {
    stream: RustlsFtpStream,
}

impl RemoteSession for FtpsSession {
    fn noop(&mut self) -> TransportResult<()> {
        self.stream.noop().map_err(map_error)
    }

    fn cwd(&mut self, path: &str) -> TransportResult<()> {
        self.stream.cwd(path).map_err(map_error)
    }

    fn mkdir(&mut self, path: &str) -> TransportResult<()> {
        self.stream.mkdir(path).map_err(map_error)
    }

    fn store(&mut self, name: &str, data: &[u8]) -> TransportResult<u64> {
        let mut reader = Cursor::new(data);
        self.stream.put_file(name, &mut reader).map_err(map_error)
    }

    fn retrieve(&mut self, path: &str) -> TransportResult<Vec<u8>> {
        self.stream
            .retr_as_buffer(path)
            .map(Cursor::into_inner)
            .map_err(map_error)
    }

    fn delete(&mut self, path: &str) -> TransportResult<()> {
        self.stream.rm(path).map_err(map_error)
    }

    fn list(&mut self, path: &str) -> TransportResult<Vec<String>> {
        self.stream.nlst(Some(path)).map_err(map_error)
    }

    fn quit(&mut self) -> TransportResult<()> {
        self.stream.quit().map_err(map_error)
    }
}

fn map_error(err: FtpError) -> TransportError {
    match err {
        FtpError::ConnectionError(e) => TransportError::Io(e),
        FtpError::SecureError(msg) => TransportError::Tls(msg),
        FtpError::UnexpectedResponse(response) => TransportError::Rejected {
            code: response.status.code(),
            message: String::from_utf8_lossy(&response.body).trim().to_string(),
        },
        other => TransportError::Protocol(other.to_string()),
    }
}

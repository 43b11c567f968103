//! Configuration module for the asset store.

use serde::Deserialize;
use std::path::Path;

use crate::{AssetError, Result};

/// Remote file server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FtpConfig {
    /// Host name or address of the FTP server.
    #[serde(default = "default_ftp_host")]
    pub host: String,
    /// Control connection port.
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    /// Login user.
    #[serde(default)]
    pub username: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Name checked against the server certificate (defaults to `host`).
    #[serde(default)]
    pub tls_domain: Option<String>,
}

fn default_ftp_host() -> String {
    "localhost".to_string()
}

fn default_ftp_port() -> u16 {
    21
}

impl FtpConfig {
    /// `host:port` pair for the control connection.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Domain used for certificate verification.
    pub fn tls_domain(&self) -> &str {
        self.tls_domain.as_deref().unwrap_or(&self.host)
    }
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: default_ftp_host(),
            port: default_ftp_port(),
            username: String::new(),
            password: String::new(),
            tls_domain: None,
        }
    }
}

/// Remote layout of images and thumbnails.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Root directory for original images.
    #[serde(default = "default_image_base_dir")]
    pub image_base_dir: String,
    /// Root directory for thumbnails, mirroring `image_base_dir`.
    #[serde(default = "default_thumbnail_base_dir")]
    pub thumbnail_base_dir: String,
    /// Upper bound in pixels on the longer side of a thumbnail.
    #[serde(default = "default_thumbnail_max_edge")]
    pub thumbnail_max_edge: u32,
    /// Prefix turning a remote path into a public URL (e.g. `https://cdn.example.com/`).
    #[serde(default)]
    pub public_base_url: String,
}

fn default_image_base_dir() -> String {
    "img".to_string()
}

fn default_thumbnail_base_dir() -> String {
    "thumbnails".to_string()
}

fn default_thumbnail_max_edge() -> u32 {
    200
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            image_base_dir: default_image_base_dir(),
            thumbnail_base_dir: default_thumbnail_base_dir(),
            thumbnail_max_edge: default_thumbnail_max_edge(),
            public_base_url: String::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/catalog-assets.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Remote file server.
    #[serde(default)]
    pub ftp: FtpConfig,
    /// Image and thumbnail layout.
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AssetError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AssetError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables (empty values are ignored):
    /// - `CATALOG_FTP_HOST`
    /// - `CATALOG_FTP_USER`
    /// - `CATALOG_FTP_PASSWORD`
    pub fn apply_env_overrides(&mut self) {
        let overrides = [
            ("CATALOG_FTP_HOST", &mut self.ftp.host),
            ("CATALOG_FTP_USER", &mut self.ftp.username),
            ("CATALOG_FTP_PASSWORD", &mut self.ftp.password),
        ];
        for (key, slot) in overrides {
            if let Ok(value) = std::env::var(key) {
                if !value.is_empty() {
                    *slot = value;
                }
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the FTP host is empty
    /// - either base directory is empty, or both point to the same place
    /// - the thumbnail bound is zero
    pub fn validate(&self) -> Result<()> {
        if self.ftp.host.trim().is_empty() {
            return Err(AssetError::Config("ftp.host is empty".to_string()));
        }

        let image = self.assets.image_base_dir.trim_matches('/');
        let thumbs = self.assets.thumbnail_base_dir.trim_matches('/');
        if image.is_empty() || thumbs.is_empty() {
            return Err(AssetError::Config(
                "assets.image_base_dir and assets.thumbnail_base_dir must be set".to_string(),
            ));
        }
        if image == thumbs {
            return Err(AssetError::Config(
                "assets.thumbnail_base_dir must differ from assets.image_base_dir".to_string(),
            ));
        }

        if self.assets.thumbnail_max_edge == 0 {
            return Err(AssetError::Config(
                "assets.thumbnail_max_edge must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.ftp.host, "localhost");
        assert_eq!(config.ftp.port, 21);
        assert!(config.ftp.username.is_empty());
        assert!(config.ftp.password.is_empty());
        assert!(config.ftp.tls_domain.is_none());

        assert_eq!(config.assets.image_base_dir, "img");
        assert_eq!(config.assets.thumbnail_base_dir, "thumbnails");
        assert_eq!(config.assets.thumbnail_max_edge, 200);
        assert!(config.assets.public_base_url.is_empty());

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/catalog-assets.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[ftp]
host = "files.example.com"
port = 2121
username = "catalog"
password = "secret"
tls_domain = "ftp.example.com"

[assets]
image_base_dir = "media/img"
thumbnail_base_dir = "media/thumbs"
thumbnail_max_edge = 320
public_base_url = "https://cdn.example.com/"

[logging]
level = "debug"
file = "custom/logs/app.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.ftp.host, "files.example.com");
        assert_eq!(config.ftp.port, 2121);
        assert_eq!(config.ftp.username, "catalog");
        assert_eq!(config.ftp.password, "secret");
        assert_eq!(config.ftp.address(), "files.example.com:2121");
        assert_eq!(config.ftp.tls_domain(), "ftp.example.com");

        assert_eq!(config.assets.image_base_dir, "media/img");
        assert_eq!(config.assets.thumbnail_base_dir, "media/thumbs");
        assert_eq!(config.assets.thumbnail_max_edge, 320);
        assert_eq!(config.assets.public_base_url, "https://cdn.example.com/");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/app.log");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[ftp]
host = "10.0.0.5"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.ftp.host, "10.0.0.5");
        assert_eq!(config.ftp.port, 21);
        assert_eq!(config.ftp.tls_domain(), "10.0.0.5");
        assert_eq!(config.assets.image_base_dir, "img");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.ftp.port, 21);
        assert_eq!(config.assets.thumbnail_max_edge, 200);
    }

    #[test]
    fn test_parse_invalid_config() {
        let toml = "this is not valid toml [[[";
        let result = Config::parse(toml);

        assert!(result.is_err());
        if let Err(AssetError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");

        assert!(matches!(result, Err(AssetError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[assets]\nthumbnail_max_edge = 64\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.assets.thumbnail_max_edge, 64);
    }

    #[test]
    fn test_apply_env_overrides() {
        let original = std::env::var("CATALOG_FTP_PASSWORD").ok();

        std::env::set_var("CATALOG_FTP_PASSWORD", "from-env");

        let mut config = Config::default();
        config.ftp.password = "from-file".to_string();
        config.apply_env_overrides();

        assert_eq!(config.ftp.password, "from-env");

        std::env::set_var("CATALOG_FTP_PASSWORD", "");
        config.ftp.password = "from-file".to_string();
        config.apply_env_overrides();

        // Empty values do not override
        assert_eq!(config.ftp.password, "from-file");

        if let Some(val) = original {
            std::env::set_var("CATALOG_FTP_PASSWORD", val);
        } else {
            std::env::remove_var("CATALOG_FTP_PASSWORD");
        }
    }

    #[test]
    fn test_validate_default() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_host() {
        let mut config = Config::default();
        config.ftp.host = "  ".to_string();

        let result = config.validate();
        assert!(matches!(result, Err(AssetError::Config(msg)) if msg.contains("ftp.host")));
    }

    #[test]
    fn test_validate_same_base_dirs() {
        let mut config = Config::default();
        config.assets.thumbnail_base_dir = "/img/".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_max_edge() {
        let mut config = Config::default();
        config.assets.thumbnail_max_edge = 0;

        let result = config.validate();
        assert!(matches!(result, Err(AssetError::Config(msg)) if msg.contains("thumbnail_max_edge")));
    }
}

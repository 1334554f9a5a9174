//! Configuration management for the synctool daemon.
//!
//! This module provides TOML-based configuration file loading and writing.
//! The default configuration path is `~/.config/synctool/config.toml`.
//! Command line flags are applied on top of whatever the file provides.

use std::fs;
use std::io::Write;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Folder served when none is configured.
pub const DEFAULT_FOLDER: &str = "/";

/// Listen address used when none is configured.
pub const DEFAULT_LISTEN: &str = ":8080";

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("folder does not exist: {0}")]
    FolderNotFound(PathBuf),

    #[error("folder is not a directory: {0}")]
    FolderNotADirectory(PathBuf),

    #[error("listen must be \":PORT\", \"PORT\" or \"HOST:PORT\", got {0}")]
    InvalidListenAddress(String),

    #[error("log level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the synctool daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// What to serve and where.
    pub server: ServerConfig,

    /// File access policy.
    pub files: FilesConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Served folder and listen address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Folder to index and serve files from.
    pub folder: PathBuf,

    /// Address to listen on (":8080", "8080" or "127.0.0.1:8080").
    pub listen: String,
}

/// File access policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilesConfig {
    /// Refuse downloads that resolve outside the folder through `..` or
    /// symlinks.
    pub confine_to_root: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub level: String,

    /// Also write logs to this file.
    pub file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from(DEFAULT_FOLDER),
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            confine_to_root: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("synctool")
        .join("config.toml")
}

/// Parse a listen address.
///
/// `":8080"` and `"8080"` bind every interface; anything else must be a
/// full socket address.
pub fn parse_listen_addr(listen: &str) -> Result<SocketAddr, ConfigError> {
    let invalid = || ConfigError::InvalidListenAddress(listen.to_string());
    let trimmed = listen.trim();

    let port = trimmed.strip_prefix(':').unwrap_or(trimmed);
    if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) {
        let port: u16 = port.parse().map_err(|_| invalid())?;
        return Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
    }

    trimmed.parse().map_err(|_| invalid())
}

impl Config {
    /// Validate the configuration values.
    ///
    /// The served folder must exist and be a directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let folder = &self.server.folder;
        let metadata =
            fs::metadata(folder).map_err(|_| ConfigError::FolderNotFound(folder.clone()))?;
        if !metadata.is_dir() {
            return Err(ConfigError::FolderNotADirectory(folder.clone()));
        }

        parse_listen_addr(&self.server.listen)?;

        let level = self.logging.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }

        Ok(())
    }

    /// The socket address to bind.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_listen_addr(&self.server.listen)
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    /// If the file exists but is invalid TOML, returns an error with
    /// a helpful message.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Write this configuration as a new config file.
    ///
    /// Parent directories are created as needed. An existing file is left
    /// untouched and reported as an error unless `overwrite` is set.
    pub fn write_to<P: AsRef<Path>>(&self, path: P, overwrite: bool) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .create_new(!overwrite)
            .truncate(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    anyhow::anyhow!(
                        "Config file already exists (pass --force to replace it): {}",
                        path.display()
                    )
                } else {
                    anyhow::Error::new(e)
                        .context(format!("Failed to open config file: {}", path.display()))
                }
            })?;

        file.write_all(self.to_toml()?.as_bytes())
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Render the configuration as a commented TOML document.
    pub fn to_toml(&self) -> Result<String> {
        let body =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;
        Ok(format!("{CONFIG_HEADER}\n{body}"))
    }
}

const CONFIG_HEADER: &str = "\
# synctool configuration
#
# Command line flags (--folder, --port, --verbose) override these values.
# RUST_LOG, when set, overrides logging.level.
";

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}

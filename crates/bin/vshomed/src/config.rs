//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `vshome.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use vshome_adapter_http_axum::state::ViewerLimits;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Device catalog location.
    pub catalog: CatalogConfig,
    /// Change feed settings.
    pub hub: HubConfig,
    /// Per-viewer connection limits.
    pub viewers: ViewersConfig,
    /// Static front-end assets.
    pub web: WebConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to the TOML device catalog.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Number of changes buffered for viewers before a slow one lags out.
    pub queue_capacity: usize,
}

/// Viewer connection limits, in seconds and bytes.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ViewersConfig {
    pub idle_timeout_secs: u64,
    pub ping_interval_secs: u64,
    pub write_timeout_secs: u64,
    pub max_message_bytes: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Directory served for every path not handled by the API. Empty
    /// disables static serving.
    pub static_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `vshome.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if
    /// the resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("vshome.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("VSHOME_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("VSHOME_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("VSHOME_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("VSHOME_CATALOG") {
            self.catalog.path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("VSHOME_STATIC_DIR") {
            self.web.static_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("VSHOME_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.hub.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "hub queue capacity must be non-zero".to_string(),
            ));
        }
        let viewers = &self.viewers;
        if viewers.idle_timeout_secs == 0
            || viewers.ping_interval_secs == 0
            || viewers.write_timeout_secs == 0
        {
            return Err(ConfigError::Validation(
                "viewer timeouts must be non-zero".to_string(),
            ));
        }
        if viewers.ping_interval_secs >= viewers.idle_timeout_secs {
            return Err(ConfigError::Validation(
                "viewer ping interval must be shorter than the idle timeout".to_string(),
            ));
        }
        if viewers.max_message_bytes == 0 {
            return Err(ConfigError::Validation(
                "viewer max message size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the static asset directory, if static serving is enabled.
    #[must_use]
    pub fn static_dir(&self) -> Option<&Path> {
        let dir = self.web.static_dir.as_path();
        (!dir.as_os_str().is_empty()).then_some(dir)
    }

    /// Return the per-viewer limits in the form the HTTP adapter expects.
    #[must_use]
    pub fn viewer_limits(&self) -> ViewerLimits {
        ViewerLimits {
            idle_timeout: Duration::from_secs(self.viewers.idle_timeout_secs),
            ping_interval: Duration::from_secs(self.viewers.ping_interval_secs),
            write_timeout: Duration::from_secs(self.viewers.write_timeout_secs),
            max_message_bytes: self.viewers.max_message_bytes,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("devices.toml"),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
        }
    }
}

impl Default for ViewersConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 300,
            ping_interval_secs: 30,
            write_timeout_secs: 10,
            max_message_bytes: 4096,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("web"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "vshomed=info,vshome=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

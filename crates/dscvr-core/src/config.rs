use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::service::SERVICE_NAME;

/// Global dscvr configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// gRPC indexer backend
    pub indexer: IndexerConfig,

    /// Framed TCP daemon
    pub daemon: DaemonConfig,

    /// RPC client settings
    pub client: ClientConfig,

    /// Output formatting
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Address of the gRPC indexer
    pub host: String,

    pub port: u16,

    /// Largest message accepted in either direction (bytes)
    pub max_message_size: usize,

    /// Connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Per-request deadline (milliseconds, 0 = none)
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Address the framed TCP daemon listens on
    pub host: String,

    pub port: u16,

    /// Largest frame accepted in either direction (bytes)
    pub max_frame_size: usize,

    /// Connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Per-request deadline (milliseconds, 0 = none)
    pub request_timeout_ms: u64,

    /// Close connections that stay silent this long (milliseconds, 0 = never)
    pub idle_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service name sent with every call
    pub service_name: String,

    /// Which backend the client talks to
    pub transport: TransportKind,
}

/// Wire used to reach the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// gRPC over HTTP/2, spoken by the indexer
    #[default]
    Grpc,
    /// Length-prefixed frames, spoken by the dscvr daemon
    Tcp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Show aggregated sizes next to duplicate groups
    pub show_sizes: bool,

    /// Paths listed per duplicate group (0 = all)
    pub max_paths_per_group: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
            max_message_size: 16_777_215,
            connect_timeout_ms: 5_000,
            request_timeout_ms: 0,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50052,
            max_frame_size: 16_777_215,
            connect_timeout_ms: 5_000,
            request_timeout_ms: 0,
            idle_timeout_ms: 300_000, // 5 minutes
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
            transport: TransportKind::default(),
        }
    }
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Grpc => "grpc",
            TransportKind::Tcp => "tcp",
        }
    }
}

impl std::str::FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grpc" => Ok(TransportKind::Grpc),
            "tcp" => Ok(TransportKind::Tcp),
            other => Err(ConfigError::Invalid(format!("unknown transport: {other}"))),
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            show_sizes: true,
            max_paths_per_group: 0,
        }
    }
}

impl IndexerConfig {
    /// `host:port` string for connecting or binding
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DaemonConfig {
    /// `host:port` string for connecting or binding
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load config from default locations (in order of precedence):
    /// 1. $PWD/.dscvr.toml
    /// 2. $XDG_CONFIG_HOME/dscvr/config.toml
    /// 3. Built-in defaults
    ///
    /// Environment overrides are not applied; see [`Config::apply_env`].
    pub fn load() -> Self {
        Self::load_files().unwrap_or_default()
    }

    fn load_files() -> Option<Self> {
        // Try project-level config
        if let Ok(content) = std::fs::read_to_string(".dscvr.toml") {
            if let Ok(config) = toml::from_str(&content) {
                return Some(config);
            }
            tracing::warn!("Ignoring unparsable .dscvr.toml");
        }

        // Try user-level config
        let config_path = dirs::config_dir()?.join("dscvr").join("config.toml");
        let content = std::fs::read_to_string(&config_path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Ignoring {}: {}", config_path.display(), e);
                None
            }
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `DSCVR_HOST` / `DSCVR_PORT` to the endpoint of the selected transport
    pub fn apply_env(&mut self) {
        self.apply_overrides(std::env::var("DSCVR_HOST").ok(), std::env::var("DSCVR_PORT").ok());
    }

    fn apply_overrides(&mut self, host: Option<String>, port: Option<String>) {
        let port = port.and_then(|port| match port.parse() {
            Ok(port) => Some(port),
            Err(_) => {
                tracing::warn!("Ignoring invalid DSCVR_PORT: {}", port);
                None
            }
        });
        self.set_endpoint(host.filter(|h| !h.is_empty()), port);
    }

    /// Point the selected transport at a different host and/or port
    pub fn set_endpoint(&mut self, host: Option<String>, port: Option<u16>) {
        let (current_host, current_port) = match self.client.transport {
            TransportKind::Grpc => (&mut self.indexer.host, &mut self.indexer.port),
            TransportKind::Tcp => (&mut self.daemon.host, &mut self.daemon.port),
        };
        if let Some(host) = host {
            *current_host = host;
        }
        if let Some(port) = port {
            *current_port = port;
        }
    }

    /// `host:port` of the selected transport
    pub fn endpoint(&self) -> String {
        match self.client.transport {
            TransportKind::Grpc => self.indexer.address(),
            TransportKind::Tcp => self.daemon.address(),
        }
    }

    /// Path of the user-level config file, if a config dir exists
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dscvr").join("config.toml"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

impl From<ConfigError> for crate::error::DscvrError {
    fn from(err: ConfigError) -> Self {
        crate::error::DscvrError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.client.transport, TransportKind::Grpc);
        assert_eq!(config.indexer.address(), "127.0.0.1:50051");
        assert_eq!(config.endpoint(), "127.0.0.1:50051");
        assert_eq!(config.daemon.address(), "127.0.0.1:50052");
        assert_eq!(config.daemon.max_frame_size, 16_777_215);
        assert_eq!(config.daemon.idle_timeout_ms, 300_000);
        assert_eq!(config.client.service_name, "file_indexer.FileIndexer");
    }

    #[test]
    fn test_transport_kind() {
        assert_eq!("tcp".parse::<TransportKind>().unwrap(), TransportKind::Tcp);
        assert_eq!(TransportKind::Grpc.to_string(), "grpc");
        assert!(matches!("udp".parse::<TransportKind>(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            concat!(
                "[client]\ntransport = \"tcp\"\n\n",
                "[daemon]\nport = 6000\n\n",
                "[output]\nshow_sizes = false\n",
            ),
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.client.transport, TransportKind::Tcp);
        assert_eq!(config.daemon.port, 6000);
        assert_eq!(config.daemon.host, "127.0.0.1");
        assert_eq!(config.indexer.port, 50051);
        assert!(!config.output.show_sizes);
        assert_eq!(config.client.service_name, SERVICE_NAME);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[daemon]\nport = \"not a port\"\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Config::load_from(&temp_dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_overrides_follow_transport() {
        let mut config = Config::default();
        config.apply_overrides(Some("10.0.0.2".to_string()), Some("7000".to_string()));
        assert_eq!(config.indexer.address(), "10.0.0.2:7000");
        assert_eq!(config.daemon.address(), "127.0.0.1:50052");

        config.apply_overrides(Some(String::new()), Some("nope".to_string()));
        assert_eq!(config.endpoint(), "10.0.0.2:7000");

        config.client.transport = TransportKind::Tcp;
        config.set_endpoint(None, Some(7100));
        assert_eq!(config.endpoint(), "127.0.0.1:7100");
        assert_eq!(config.indexer.address(), "10.0.0.2:7000");
    }
}

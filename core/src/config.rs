//! Configuration management

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Deployment environment, which picks the default listen port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

impl Environment {
    /// Port used when the configuration does not pin one
    pub fn default_port(self) -> u16 {
        match self {
            Environment::Prod => 8088,
            Environment::Dev => 8089,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server information
    pub server: ServerConfig,
    /// Listener settings
    pub connection: ConnectionConfig,
    /// Per-session settings
    pub session: SessionConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server name, used in log output
    pub name: String,
    /// Version advertised in the default MOTD
    pub version: String,
    /// MOTD text; when unset a welcome line is built from the version
    pub motd: Option<String>,
    /// MOTD file, one response line per file line (takes precedence over `motd`)
    pub motd_file: Option<PathBuf>,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Address to bind the listener on
    pub bind_address: String,
    /// Explicit port; when unset the environment default is used
    pub port: Option<u16>,
    /// Longest accepted input line in bytes, terminator included
    pub max_line_length: usize,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Prefix of generated guest names
    pub guest_prefix: String,
    /// Guest numbers are drawn from `0..guest_number_range`
    pub guest_number_range: u32,
    /// Length of generated session identifiers
    pub client_id_length: usize,
    /// Echo every inbound line back to its sender with a `=> ` prefix
    pub echo_input: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "roomchatd".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            motd: None,
            motd_file: None,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: None,
            max_line_length: 4096,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            guest_prefix: "Guest".to_string(),
            guest_number_range: 5000,
            client_id_length: 12,
            echo_input: true,
        }
    }
}

impl ServerConfig {
    /// MOTD text used when no file is configured
    pub fn motd_text(&self) -> String {
        self.motd
            .clone()
            .unwrap_or_else(|| format!("Welcome to chat server v{}!", self.version))
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.name.is_empty() {
            return Err(Error::Config("Server name cannot be empty".to_string()));
        }

        if self.connection.bind_address.is_empty() {
            return Err(Error::Config("Bind address cannot be empty".to_string()));
        }

        if self.connection.port == Some(0) {
            return Err(Error::Config("Port cannot be 0".to_string()));
        }

        // Room for at least a command and an argument
        if self.connection.max_line_length < 16 {
            return Err(Error::Config(format!(
                "max_line_length must be at least 16, got {}",
                self.connection.max_line_length
            )));
        }

        if self.session.guest_prefix.is_empty() || self.session.guest_prefix.contains(' ') {
            return Err(Error::Config(
                "Guest prefix must be non-empty and contain no spaces".to_string(),
            ));
        }

        if self.session.guest_number_range == 0 {
            return Err(Error::Config("guest_number_range must be positive".to_string()));
        }

        if self.session.client_id_length < 4 {
            return Err(Error::Config(format!(
                "client_id_length must be at least 4, got {}",
                self.session.client_id_length
            )));
        }

        Ok(())
    }

    /// Port to listen on for the given environment
    pub fn listen_port(&self, environment: Environment) -> u16 {
        self.connection
            .port
            .unwrap_or_else(|| environment.default_port())
    }

    /// Full `address:port` listen string
    pub fn listen_address(&self, environment: Environment) -> String {
        format!(
            "{}:{}",
            self.connection.bind_address,
            self.listen_port(environment)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.guest_number_range, 5000);
        assert_eq!(config.session.client_id_length, 12);
    }

    #[test]
    fn test_environment_ports() {
        let mut config = Config::default();
        assert_eq!(config.listen_port(Environment::Dev), 8089);
        assert_eq!(config.listen_port(Environment::Prod), 8088);

        config.connection.port = Some(7000);
        assert_eq!(config.listen_port(Environment::Prod), 7000);
        assert_eq!(config.listen_address(Environment::Dev), "0.0.0.0:7000");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.connection.port = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.session.guest_number_range = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.session.guest_prefix = "Bad Prefix".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_motd_text() {
        let mut server = ServerConfig::default();
        server.version = "0.0.1".to_string();
        assert_eq!(server.motd_text(), "Welcome to chat server v0.0.1!");

        server.motd = Some("hi there".to_string());
        assert_eq!(server.motd_text(), "hi there");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.connection.port = Some(9000);
        config.session.echo_input = false;
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.connection.port, Some(9000));
        assert!(!loaded.session.echo_input);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nguest_prefix = \"Visitor\"\n").unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.session.guest_prefix, "Visitor");
        assert_eq!(loaded.session.guest_number_range, 5000);
        assert_eq!(loaded.connection.max_line_length, 4096);
    }
}

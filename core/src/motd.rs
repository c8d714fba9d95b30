//! MOTD (Message of the Day) management system

use crate::config::ServerConfig;
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// MOTD lines sent to every new connection
#[derive(Debug, Clone)]
pub struct MotdManager {
    lines: Vec<String>,
}

impl MotdManager {
    /// MOTD consisting of fixed lines
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Build the MOTD from server configuration.
    ///
    /// A configured file that does not exist is not an error; the configured
    /// text (or the default welcome line) is used instead.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        if let Some(ref motd_file) = config.motd_file {
            if let Some(manager) = Self::load_motd(motd_file)? {
                return Ok(manager);
            }
        }
        Ok(Self::new(vec![config.motd_text()]))
    }

    /// Load MOTD from file. `Ok(None)` when the file is missing.
    pub fn load_motd(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            warn!("MOTD file not found: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read MOTD file: {}", e)))?;
        let lines: Vec<String> = content.lines().map(|line| line.to_string()).collect();

        info!("Loaded MOTD from {} ({} lines)", path.display(), lines.len());
        debug!("MOTD lines: {:?}", lines);
        Ok(Some(Self::new(lines)))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Get MOTD line count
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

//! Configuration for the helpdesk assistant.
//!
//! Loads settings from `<config_dir>/helpdesk/config.toml` or uses defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::HelpdeskError;
use crate::{DEFAULT_MODEL, TICKET_SUBDIR};

/// Local model runner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Executable looked up on PATH
    #[serde(default = "default_program")]
    pub program: String,

    /// Subcommand placed before the model name
    #[serde(default = "default_subcommand")]
    pub subcommand: String,

    /// Upper bound on one invocation, 0 disables it
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_program() -> String {
    "ollama".to_string()
}

fn default_subcommand() -> String {
    "run".to_string()
}

fn default_timeout() -> u64 {
    300
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            subcommand: default_subcommand(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Ticket storage settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TicketConfig {
    /// Directory for new tickets; defaults to Tickets/Unprocessed beside the executable
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub tickets: TicketConfig,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            runner: RunnerConfig::default(),
            tickets: TicketConfig::default(),
        }
    }
}

impl HelpdeskConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("helpdesk").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Result<Self, HelpdeskError> {
        match Self::default_path() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from a specific path. A missing file yields defaults, a
    /// malformed one is an error.
    pub fn load_from_path(path: &Path) -> Result<Self, HelpdeskError> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)
            .map_err(|e| HelpdeskError::Config(format!("{}: {}", path.display(), e)))?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Directory tickets are written to
    pub fn ticket_dir(&self) -> Result<PathBuf, HelpdeskError> {
        if let Some(dir) = &self.tickets.dir {
            return Ok(dir.clone());
        }
        default_ticket_dir()
    }
}

/// `Tickets/Unprocessed` next to the running executable
pub fn default_ticket_dir() -> Result<PathBuf, HelpdeskError> {
    let exe = std::env::current_exe()?;
    let base = exe
        .parent()
        .ok_or_else(|| HelpdeskError::TicketDir(format!("{} has no parent", exe.display())))?;
    Ok(TICKET_SUBDIR.iter().fold(base.to_path_buf(), |p, part| p.join(part)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = HelpdeskConfig::default();
        assert_eq!(config.model, "phi");
        assert_eq!(config.runner.program, "ollama");
        assert_eq!(config.runner.subcommand, "run");
        assert_eq!(config.runner.timeout_secs, 300);
        assert!(config.tickets.dir.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = HelpdeskConfig::parse(
            r#"
            model = "mistral"

            [runner]
            timeout_secs = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.model, "mistral");
        assert_eq!(config.runner.program, "ollama");
        assert_eq!(config.runner.timeout_secs, 0);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let config = HelpdeskConfig::load_from_path(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, HelpdeskConfig::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "model = [unterminated").unwrap();
        let err = HelpdeskConfig::load_from_path(&path).unwrap_err();
        assert!(matches!(err, HelpdeskError::Config(_)));
    }

    #[test]
    fn test_ticket_dir_override() {
        let mut config = HelpdeskConfig::default();
        config.tickets.dir = Some(PathBuf::from("/srv/tickets"));
        assert_eq!(config.ticket_dir().unwrap(), PathBuf::from("/srv/tickets"));
    }

    #[test]
    fn test_default_ticket_dir_beside_executable() {
        let dir = default_ticket_dir().unwrap();
        assert!(dir.ends_with("Tickets/Unprocessed"));
    }
}

//! Provisioning configuration parsing and management.
//!
//! A single TOML file describes what to provision: the installer
//! package, the application bundle it produces, the policy scripts to
//! apply, and the authorization grant to write. Every field carries a
//! default, so an absent file provisions the stock targets (Microsoft
//! PowerPoint, automated by Terminal.app).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::installer::{PackageSource, DEFAULT_INSTALL_TARGET};
use crate::tcc::AccessGrant;

/// Errors raised while loading or serializing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level provisioning configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Installer package source.
    pub package: PackageSource,

    /// Installed application bundle.
    pub app: AppConfig,

    /// Configuration-policy scripts.
    pub policies: PolicyConfig,

    /// Authorization record to write.
    pub grant: AccessGrant,
}

impl ProvisionConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// The application bundle being provisioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bundle path after installation.
    pub path: PathBuf,

    /// Installer target volume/folder.
    pub install_target: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/Applications/Microsoft PowerPoint.app"),
            install_target: DEFAULT_INSTALL_TARGET.to_string(),
        }
    }
}

/// Which policy scripts to apply, and from where.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Directory holding the scripts.
    pub dir: PathBuf,

    /// Script file names applied in order; absent ones are skipped.
    pub scripts: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("policies"),
            scripts: vec![
                "policy_ms_autoupdate.sh".to_string(),
                "policy_ms_office.sh".to_string(),
                "policy_ms_powerpoint.sh".to_string(),
            ],
        }
    }
}

//! Connector configuration
//!
//! Deserialized from a YAML file with environment overrides, see [`loader`].

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::bundle::types::RiskTier;
use crate::error::{ConnectorError, Result};

pub use loader::{load_config, load_config_from_str};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub connector: ConnectorInfo,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub risk_mapping: RiskMappingConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

fn unknown() -> String {
    "unknown".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorInfo {
    #[serde(rename = "type", default = "unknown")]
    pub connector_type: String,
    #[serde(default = "unknown")]
    pub name: String,
}

impl Default for ConnectorInfo {
    fn default() -> Self {
        Self {
            connector_type: unknown(),
            name: unknown(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Falls back to `GITHUB_TOKEN` when unset
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub repos: Vec<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            token: None,
            repos: Vec::new(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Api,
    #[default]
    File,
    Webhook,
}

/// Raw sink settings; validated into an [`crate::emitter::Sink`] by the emitter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub mode: OutputMode,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRule {
    pub pattern: String,
    pub tier: RiskTier,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskMappingConfig {
    #[serde(default)]
    pub default: RiskTier,
    /// Checked in order; first match wins
    #[serde(default)]
    pub rules: Vec<RiskRule>,
}

fn default_include_paths() -> Vec<String> {
    vec!["**".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_include_paths")]
    pub include_paths: Vec<String>,
    #[serde(default)]
    pub exclude_paths: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_paths: default_include_paths(),
            exclude_paths: Vec::new(),
        }
    }
}

fn default_policy() -> String {
    "standard".to_string()
}

fn default_retention_days() -> u32 {
    365
}

/// Longest accepted retention period, one hundred years
pub const MAX_RETENTION_DAYS: u32 = 36_500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_policy")]
    pub policy: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default)]
    pub legal_hold: bool,
    #[serde(default)]
    pub compliance_frameworks: Vec<String>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            retention_days: default_retention_days(),
            legal_hold: false,
            compliance_frameworks: Vec::new(),
        }
    }
}

impl RetentionConfig {
    /// Bundles must expire strictly after creation, within [`MAX_RETENTION_DAYS`]
    pub fn validate(&self) -> Result<()> {
        if self.retention_days == 0 || self.retention_days > MAX_RETENTION_DAYS {
            return Err(ConnectorError::ConfigError(format!(
                "retention_days must be between 1 and {}, got {}",
                MAX_RETENTION_DAYS, self.retention_days
            )));
        }
        Ok(())
    }
}

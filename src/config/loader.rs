//! Configuration file loader
//! Reads the connector's YAML configuration and layers `EVIDENCE__*`
//! environment variables on top (e.g. `EVIDENCE__OUTPUT__API_KEY`).

use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use tracing::info;

use crate::config::AppConfig;
use crate::error::{ConnectorError, Result};

const ENV_PREFIX: &str = "EVIDENCE";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from a YAML file plus environment overrides
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    info!("Loading connector configuration from: {:?}", path);

    if !path.exists() {
        return Err(ConnectorError::ConfigError(format!(
            "Configuration file not found: {:?}",
            path
        )));
    }

    let settings = Config::builder()
        .add_source(File::from(path).format(FileFormat::Yaml).required(true))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.retention.validate()?;
    info!(
        "Loaded configuration for connector '{}' ({})",
        config.connector.name, config.connector.connector_type
    );
    Ok(config)
}

/// Load configuration from YAML text, without environment overrides
pub fn load_config_from_str(yaml: &str) -> Result<AppConfig> {
    let settings = Config::builder()
        .add_source(File::from_str(yaml, FileFormat::Yaml))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.retention.validate()?;
    Ok(config)
}

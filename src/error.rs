use thiserror::Error;

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::ContentError(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for ConnectorError {
    fn from(err: std::io::Error) -> Self {
        Self::SinkError(format!("I/O error: {}", err))
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::SinkError(format!("HTTP {}: {}", status, err)),
            None => Self::SinkError(format!("HTTP request failed: {}", err)),
        }
    }
}

impl From<octocrab::Error> for ConnectorError {
    fn from(err: octocrab::Error) -> Self {
        Self::SourceError(format!("GitHub API error: {}", err))
    }
}

impl From<config::ConfigError> for ConnectorError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(format!("Failed to load configuration: {}", err))
    }
}

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Content error: {0}")]
    ContentError(String),

    #[error("Sink error: {0}")]
    SinkError(String),

    #[error("Source system error: {0}")]
    SourceError(String),

    #[error("Verification error: {0}")]
    VerificationError(String),
}

pub type Result<T> = std::result::Result<T, ConnectorError>;

impl ConnectorError {
    pub fn missing_sink_parameter(mode: &str, parameter: &str) -> Self {
        Self::ConfigError(format!("{} required for {} mode", parameter, mode))
    }

    pub fn invalid_pattern(pattern: &str, reason: impl std::fmt::Display) -> Self {
        Self::ConfigError(format!("Invalid glob pattern '{}': {}", pattern, reason))
    }

    pub fn unexpected_status(target: &str, status: u16) -> Self {
        Self::SinkError(format!("{} responded with HTTP {}", target, status))
    }
}

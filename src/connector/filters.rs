//! Artifact path filtering and risk-tier mapping

use glob::Pattern;
use tracing::debug;

use crate::bundle::types::RiskTier;
use crate::config::{FilterConfig, RiskMappingConfig};
use crate::error::{ConnectorError, Result};

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|e| ConnectorError::invalid_pattern(p, e)))
        .collect()
}

/// Include/exclude filter over artifact identifiers
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl PathFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        Ok(Self {
            include: compile(&config.include_paths)?,
            exclude: compile(&config.exclude_paths)?,
        })
    }

    /// Exclusions win over inclusions
    pub fn should_process(&self, artifact_path: &str) -> bool {
        if let Some(pattern) = self.exclude.iter().find(|p| p.matches(artifact_path)) {
            debug!("{} excluded by {}", artifact_path, pattern);
            return false;
        }

        self.include.iter().any(|p| p.matches(artifact_path))
    }
}

/// Maps artifact identifiers to risk tiers
#[derive(Debug, Clone)]
pub struct RiskMapper {
    default_tier: RiskTier,
    rules: Vec<(Pattern, RiskTier)>,
}

impl RiskMapper {
    pub fn new(config: &RiskMappingConfig) -> Result<Self> {
        let rules = config
            .rules
            .iter()
            .map(|rule| {
                Pattern::new(&rule.pattern)
                    .map(|pattern| (pattern, rule.tier))
                    .map_err(|e| ConnectorError::invalid_pattern(&rule.pattern, e))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            default_tier: config.default,
            rules,
        })
    }

    pub fn map_risk_tier(&self, artifact_path: &str) -> RiskTier {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(artifact_path))
            .map(|(_, tier)| *tier)
            .unwrap_or(self.default_tier)
    }
}

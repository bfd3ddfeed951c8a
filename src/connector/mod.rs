//! Source-system connectors
//!
//! A connector watches one source system for changes and supplies the diff
//! and metadata the bundle assembler needs. Each integration is its own type
//! implementing [`Connector`]; polling state lives in an injected
//! [`LastSeenStore`] rather than in the connector itself.

pub mod filters;
pub mod github;
pub mod runner;
pub mod state;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::events::{ArtifactMetadata, ChangeEvent, DiffResult};

pub use filters::{PathFilter, RiskMapper};
pub use github::GitHubConnector;
pub use runner::{run_pass, PassSummary};
pub use state::{LastSeenStore, MemoryLastSeenStore};

#[async_trait]
pub trait Connector: Send + Sync {
    fn name(&self) -> &str;

    fn connector_type(&self) -> &str;

    /// Run one polling pass and return events not seen before
    async fn poll_changes(&self) -> Result<Vec<ChangeEvent>>;

    /// Diff for an event, or `None` when the source cannot provide one
    async fn get_diff(&self, event: &ChangeEvent) -> Result<Option<DiffResult>>;

    async fn get_artifact_metadata(&self, artifact_id: &str) -> Result<ArtifactMetadata>;

    async fn healthcheck(&self) -> Result<Value> {
        Ok(json!({
            "healthy": true,
            "connector": self.name(),
            "type": self.connector_type(),
        }))
    }

    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }
}

//! GitHub Connector
//!
//! Watches pull requests in configured repositories and reports each PR state
//! change as a [`ChangeEvent`]. Diffs are built from the PR's changed files.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::models::pulls::PullRequest;
use octocrab::{params, Octocrab};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::connector::state::LastSeenStore;
use crate::connector::Connector;
use crate::error::{ConnectorError, Result};
use crate::events::{ArtifactMetadata, ChangeEvent, DiffResult, DiffType, EventType};

const CONNECTOR_TYPE: &str = "github";
const ARTIFACT_PREFIX: &str = "github:";
const MAX_PATCH_CHARS: usize = 1000;
const PULLS_PER_PAGE: u8 = 50;

pub struct GitHubConnector {
    name: String,
    client: Octocrab,
    repos: Vec<String>,
    last_seen: Arc<dyn LastSeenStore>,
}

impl GitHubConnector {
    /// Build from configuration; the token falls back to `GITHUB_TOKEN`
    pub fn from_config(config: &AppConfig, last_seen: Arc<dyn LastSeenStore>) -> Result<Self> {
        let token = config
            .source
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .ok_or_else(|| {
                ConnectorError::ConfigError(
                    "GitHub token required: set source.token or GITHUB_TOKEN".to_string(),
                )
            })?;

        let client = Octocrab::builder().personal_token(token).build()?;

        Ok(Self::with_client(
            config.connector.name.clone(),
            client,
            config.source.repos.clone(),
            last_seen,
        ))
    }

    pub fn with_client(
        name: String,
        client: Octocrab,
        repos: Vec<String>,
        last_seen: Arc<dyn LastSeenStore>,
    ) -> Self {
        Self {
            name,
            client,
            repos,
            last_seen,
        }
    }

    pub fn repos(&self) -> &[String] {
        &self.repos
    }

    async fn poll_repo(&self, repo_name: &str) -> Result<Vec<ChangeEvent>> {
        let (owner, repo) = repo_name.split_once('/').ok_or_else(|| {
            ConnectorError::ConfigError(format!("Repository must be owner/name: {}", repo_name))
        })?;

        let mut page = self
            .client
            .pulls(owner, repo)
            .list()
            .state(params::State::All)
            .sort(params::pulls::Sort::Updated)
            .direction(params::Direction::Descending)
            .per_page(PULLS_PER_PAGE)
            .send()
            .await?;

        let mut events = Vec::new();
        loop {
            let mut changed_on_page = 0;
            for pr in &page.items {
                let snapshot = PullRequestSnapshot::from_pull(repo_name, pr);
                if !self.last_seen.observe(&snapshot.key(), &snapshot.state_marker()).await {
                    continue;
                }
                debug!("PR {} changed: {}", snapshot.key(), snapshot.state_marker());
                changed_on_page += 1;
                events.push(snapshot.to_event());
            }

            // Sorted by update time: once a whole page is unchanged, older pages are too
            if changed_on_page == 0 {
                break;
            }
            match self.client.get_page::<PullRequest>(&page.next).await? {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(events)
    }

    async fn fetch_pull(&self, target: &PullTarget) -> Result<PullRequest> {
        Ok(self
            .client
            .pulls(target.owner.as_str(), target.repo.as_str())
            .get(target.number)
            .await?)
    }
}

#[async_trait]
impl Connector for GitHubConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn connector_type(&self) -> &str {
        CONNECTOR_TYPE
    }

    async fn poll_changes(&self) -> Result<Vec<ChangeEvent>> {
        let mut events = Vec::new();
        for repo_name in &self.repos {
            match self.poll_repo(repo_name).await {
                Ok(mut repo_events) => events.append(&mut repo_events),
                Err(e) => warn!("Failed to poll {}: {}", repo_name, e),
            }
        }

        info!("GitHub poll found {} changed pull requests", events.len());
        Ok(events)
    }

    async fn get_diff(&self, event: &ChangeEvent) -> Result<Option<DiffResult>> {
        let Some(target) = PullTarget::parse(&event.artifact_id) else {
            return Ok(None);
        };

        let pr = self.fetch_pull(&target).await?;
        let first_page = self
            .client
            .pulls(target.owner.as_str(), target.repo.as_str())
            .list_files(target.number)
            .await?;
        let files = self.client.all_pages(first_page).await?;
        debug!("{} changed files in {}", files.len(), event.artifact_id);

        let hunks = files
            .iter()
            .map(|file| {
                file_hunk(
                    &file.filename,
                    serde_json::to_value(&file.status).unwrap_or(Value::Null),
                    file.additions,
                    file.deletions,
                    file.patch.as_deref(),
                )
            })
            .collect();

        let mut stats = BTreeMap::new();
        stats.insert("additions".to_string(), pr.additions.unwrap_or(0) as i64);
        stats.insert("deletions".to_string(), pr.deletions.unwrap_or(0) as i64);
        stats.insert("files_changed".to_string(), pr.changed_files.unwrap_or(0) as i64);

        Ok(Some(DiffResult {
            artifact_id: event.artifact_id.clone(),
            from_version: event.from_version.clone().unwrap_or_else(|| "unknown".to_string()),
            to_version: event.to_version.clone().unwrap_or_else(|| "unknown".to_string()),
            diff_type: DiffType::Text,
            hunks,
            stats,
            from_hash: None,
            to_hash: None,
        }))
    }

    async fn get_artifact_metadata(&self, artifact_id: &str) -> Result<ArtifactMetadata> {
        let Some(target) = PullTarget::parse(artifact_id) else {
            let mut metadata = Map::new();
            metadata.insert("title".to_string(), Value::from(artifact_id));
            return Ok(metadata);
        };

        let pr = self.fetch_pull(&target).await?;
        let snapshot = PullRequestSnapshot::from_pull(&target.repo_name(), &pr);
        Ok(snapshot.artifact_metadata(&self.name))
    }
}

/// A pull request addressed by artifact id
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PullTarget {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullTarget {
    /// Parse `github:<owner>/<repo>/pr/<number>`
    pub fn parse(artifact_id: &str) -> Option<Self> {
        let path = artifact_id.strip_prefix(ARTIFACT_PREFIX).unwrap_or(artifact_id);
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() < 4 || parts[2] != "pr" {
            return None;
        }

        Some(Self {
            owner: parts[0].to_string(),
            repo: parts[1].to_string(),
            number: parts[3].parse().ok()?,
        })
    }

    pub fn repo_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// The fields of a pull request the connector reports on
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PullRequestSnapshot {
    pub repo_name: String,
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub merged: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub html_url: Option<String>,
    pub base_sha: String,
    pub base_ref: String,
    pub head_sha: String,
    pub head_ref: String,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
    pub changed_files: Option<u64>,
}

impl PullRequestSnapshot {
    pub fn from_pull(repo_name: &str, pr: &PullRequest) -> Self {
        let state = serde_json::to_value(&pr.state)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            repo_name: repo_name.to_string(),
            number: pr.number,
            title: pr.title.clone().unwrap_or_default(),
            body: pr.body.clone(),
            state,
            merged: pr.merged_at.is_some(),
            updated_at: pr.updated_at,
            author: pr.user.as_ref().map(|user| user.login.clone()),
            html_url: pr.html_url.as_ref().map(|url| url.to_string()),
            base_sha: pr.base.sha.clone(),
            base_ref: pr.base.ref_field.clone(),
            head_sha: pr.head.sha.clone(),
            head_ref: pr.head.ref_field.clone(),
            additions: pr.additions,
            deletions: pr.deletions,
            changed_files: pr.changed_files,
        }
    }

    pub fn key(&self) -> String {
        format!("{}/pr/{}", self.repo_name, self.number)
    }

    pub fn artifact_id(&self) -> String {
        format!("{}{}", ARTIFACT_PREFIX, self.key())
    }

    pub fn state_marker(&self) -> String {
        let updated = self
            .updated_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        format!("{}:{}", self.state, updated)
    }

    pub fn event_type(&self) -> EventType {
        if self.state == "open" && !self.merged {
            EventType::ApprovalRequested
        } else {
            EventType::FileModified
        }
    }

    pub fn to_event(&self) -> ChangeEvent {
        let mut event = ChangeEvent::new(self.artifact_id(), self.event_type()).with_versions(
            Some(short_sha(&self.base_sha)),
            Some(short_sha(&self.head_sha)),
        );
        event.change_type = format!("pull_request_{}", self.state);
        event.actor_id = self.author.clone();
        event.actor_name = self.author.clone();
        event.source_url = self.html_url.clone();
        if let Some(updated_at) = self.updated_at {
            event.timestamp = updated_at;
        }

        let metadata = json!({
            "pr_number": self.number,
            "title": self.title,
            "body": self.body,
            "base_branch": self.base_ref,
            "head_branch": self.head_ref,
            "state": self.state,
            "merged": self.merged,
            "additions": self.additions,
            "deletions": self.deletions,
            "changed_files": self.changed_files,
        });
        if let Value::Object(map) = metadata {
            event.metadata = map;
        }
        event
    }

    pub fn artifact_metadata(&self, connector_name: &str) -> ArtifactMetadata {
        let mut metadata = Map::new();
        metadata.insert(
            "title".to_string(),
            Value::from(format!("PR #{}: {}", self.number, self.title)),
        );
        metadata.insert("description".to_string(), json!(self.body));
        metadata.insert(
            "owner".to_string(),
            Value::from(self.author.clone().unwrap_or_else(|| "unknown".to_string())),
        );
        metadata.insert("url".to_string(), json!(self.html_url));
        metadata.insert("connector_type".to_string(), Value::from(CONNECTOR_TYPE));
        metadata.insert("connector_name".to_string(), Value::from(connector_name));
        metadata
    }
}

fn short_sha(sha: &str) -> String {
    sha.chars().take(7).collect()
}

/// One diff hunk per changed file; large patches are truncated
pub(crate) fn file_hunk(
    filename: &str,
    status: Value,
    additions: u64,
    deletions: u64,
    patch: Option<&str>,
) -> Map<String, Value> {
    let mut hunk = Map::new();
    hunk.insert("filename".to_string(), Value::from(filename));
    hunk.insert("status".to_string(), status);
    hunk.insert("additions".to_string(), Value::from(additions));
    hunk.insert("deletions".to_string(), Value::from(deletions));
    hunk.insert(
        "patch".to_string(),
        json!(patch.map(|p| p.chars().take(MAX_PATCH_CHARS).collect::<String>())),
    );
    hunk
}

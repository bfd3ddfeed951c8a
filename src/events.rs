//! Change events and diffs produced by source-system connectors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

/// Free-form metadata describing an artifact (title, owner, connector info)
pub type ArtifactMetadata = Map<String, Value>;

/// Types of change events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    FileCreated,
    FileModified,
    FileDeleted,
    FileMoved,
    PermissionChanged,
    ApprovalRequested,
    ApprovalDecided,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::FileCreated => "file_created",
            EventType::FileModified => "file_modified",
            EventType::FileDeleted => "file_deleted",
            EventType::FileMoved => "file_moved",
            EventType::PermissionChanged => "permission_changed",
            EventType::ApprovalRequested => "approval_requested",
            EventType::ApprovalDecided => "approval_decided",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_change_type() -> String {
    "unknown".to_string()
}

/// A change detected in the source system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Unique identifier for the artifact in the source system
    pub artifact_id: String,
    pub event_type: EventType,
    pub from_version: Option<String>,
    pub to_version: Option<String>,
    /// Human-readable change type
    #[serde(default = "default_change_type")]
    pub change_type: String,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub actor_name: Option<String>,
    #[serde(default)]
    pub actor_email: Option<String>,
    #[serde(default = "Utc::now", with = "offset_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ChangeEvent {
    pub fn new(artifact_id: impl Into<String>, event_type: EventType) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            event_type,
            from_version: None,
            to_version: None,
            change_type: default_change_type(),
            actor_id: None,
            actor_name: None,
            actor_email: None,
            timestamp: Utc::now(),
            source_url: None,
            metadata: Map::new(),
        }
    }

    pub fn with_versions(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.from_version = from;
        self.to_version = to;
        self
    }

    /// Structured content embedded in the bundle as the audit event item
    pub fn to_content(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Kind of diff produced by the source system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffType {
    Text,
    Binary,
    Structured,
}

/// Result of computing a diff between two versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    pub artifact_id: String,
    pub from_version: String,
    pub to_version: String,
    pub diff_type: DiffType,
    #[serde(default)]
    pub hunks: Vec<Map<String, Value>>,
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    #[serde(default)]
    pub from_hash: Option<String>,
    #[serde(default)]
    pub to_hash: Option<String>,
}

impl DiffResult {
    pub fn diff_id(&self) -> String {
        format!("{}:{}:{}", self.artifact_id, self.from_version, self.to_version)
    }

    /// Structured content embedded in the bundle as the diff item
    pub fn to_content(&self) -> Value {
        json!({
            "diff_id": self.diff_id(),
            "algorithm": "unified",
            "from_hash": self.from_hash,
            "to_hash": self.to_hash,
            "hunks": self.hunks,
            "stats": self.stats,
        })
    }
}

/// Render a UTC instant as `YYYY-MM-DDTHH:MM:SS[.ffffff]+00:00`.
///
/// Fractional seconds are written at microsecond precision and omitted when
/// zero. Event content is hashed, so this exact form is part of the wire format.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    if timestamp.timestamp_subsec_micros() == 0 {
        timestamp.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
    } else {
        timestamp.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
    }
}

mod offset_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

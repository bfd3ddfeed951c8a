#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use evidence_connector::config::{AppConfig, OutputConfig, OutputMode};
use evidence_connector::{ArtifactMetadata, ChangeEvent, DiffResult, DiffType, EventType};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Fixed instant used where tests compare timestamps
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap()
}

/// Event from the reference scenario: `x:1` modified from `a` to `b`
pub fn scenario_event() -> ChangeEvent {
    let mut event = ChangeEvent::new("x:1", EventType::FileModified)
        .with_versions(Some("a".to_string()), Some("b".to_string()));
    event.timestamp = fixed_now();
    event
}

fn hunk(filename: &str, additions: i64, deletions: i64) -> Map<String, Value> {
    let mut h = Map::new();
    h.insert("filename".to_string(), json!(filename));
    h.insert("status".to_string(), json!("modified"));
    h.insert("additions".to_string(), json!(additions));
    h.insert("deletions".to_string(), json!(deletions));
    h.insert("patch".to_string(), json!("@@ -1 +1 @@\n-old\n+new"));
    h
}

/// Two-hunk diff matching `scenario_event`
pub fn scenario_diff() -> DiffResult {
    DiffResult {
        artifact_id: "x:1".to_string(),
        from_version: "a".to_string(),
        to_version: "b".to_string(),
        diff_type: DiffType::Text,
        hunks: vec![hunk("src/main.rs", 4, 1), hunk("README.md", 2, 0)],
        stats: BTreeMap::from([
            ("additions".to_string(), 6),
            ("deletions".to_string(), 1),
            ("files_changed".to_string(), 2),
        ]),
        from_hash: None,
        to_hash: None,
    }
}

pub fn github_metadata() -> ArtifactMetadata {
    let mut m = Map::new();
    m.insert("title".to_string(), json!("PR #7: Harden input validation"));
    m.insert("connector_type".to_string(), json!("github"));
    m.insert("connector_name".to_string(), json!("Test GitHub"));
    m
}

pub fn output_config(mode: OutputMode) -> OutputConfig {
    OutputConfig {
        mode,
        ..OutputConfig::default()
    }
}

pub fn app_config_with_output(output: OutputConfig) -> AppConfig {
    AppConfig {
        output,
        ..AppConfig::default()
    }
}

//! Integration tests for emitting bundles to each sink

mod common;

use common::{app_config_with_output, github_metadata, output_config, scenario_diff, scenario_event};
use evidence_connector::bundle::types::{AuditAction, ExportStatus};
use evidence_connector::config::OutputMode;
use evidence_connector::kernel::load_bundle_from_file;
use evidence_connector::{BundleEmitter, ConnectorError, RiskTier};
use serde_json::json;
use std::collections::HashMap;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_file_sink_writes_verifiable_bundle() {
    let dir = TempDir::new().unwrap();
    let mut output = output_config(OutputMode::File);
    output.file_path = Some(dir.path().join("bundles").display().to_string());
    let emitter = BundleEmitter::from_config(&app_config_with_output(output)).unwrap();

    let emission = emitter
        .emit(
            &scenario_event(),
            Some(&scenario_diff()),
            &github_metadata(),
            RiskTier::L1,
            None,
        )
        .await
        .unwrap();

    let written = emission.receipt.file_path.clone().unwrap();
    assert_eq!(
        written.file_name().unwrap().to_str().unwrap(),
        format!("bundle-{}.json", emission.bundle.bundle_id)
    );
    assert_eq!(emission.bundle.export_status(), ExportStatus::Exported);
    assert!(emission.bundle.exported_at().is_some());

    let restored = load_bundle_from_file(&written).unwrap();
    assert_eq!(restored.root_hash(), emission.bundle.root_hash());
    assert!(evidence_connector::kernel::verify_bundle(&restored).is_valid());
}

#[tokio::test]
async fn test_api_sink_posts_with_bearer_token() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bundles"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"accepted": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut output = output_config(OutputMode::Api);
    output.api_url = Some(mock_server.uri());
    output.api_key = Some("test-key".to_string());
    let emitter = BundleEmitter::from_config(&app_config_with_output(output)).unwrap();

    let emission = emitter
        .emit(&scenario_event(), None, &github_metadata(), RiskTier::L0, None)
        .await
        .unwrap();

    assert_eq!(emission.receipt.response, Some(json!({"accepted": true})));
    assert_eq!(emission.receipt.destination, format!("{}/bundles", mock_server.uri()));
    assert_eq!(emission.bundle.export_status(), ExportStatus::Exported);

    let requests = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["bundle_id"], json!(emission.bundle.bundle_id));
    assert_eq!(body["immutability_proof"]["root_hash"], json!(emission.bundle.root_hash()));
}

#[tokio::test]
async fn test_api_sink_error_status_marks_export_failed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bundles"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut output = output_config(OutputMode::Api);
    output.api_url = Some(mock_server.uri());
    let emitter = BundleEmitter::from_config(&app_config_with_output(output)).unwrap();

    let mut bundle = emitter
        .assembler()
        .create(&scenario_event(), None, &github_metadata(), RiskTier::L0, None)
        .unwrap();
    let err = emitter.dispatch(&mut bundle).await.unwrap_err();

    assert!(matches!(err, ConnectorError::SinkError(ref m) if m.contains("503")));
    assert_eq!(bundle.export_status(), ExportStatus::Failed);
    assert_eq!(bundle.exported_at(), None);
    assert_eq!(
        bundle.audit_trail().entries.last().unwrap().action,
        AuditAction::ExportFailed
    );
}

#[tokio::test]
async fn test_webhook_sink_sends_configured_headers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/evidence"))
        .and(header("x-team", "platform"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut output = output_config(OutputMode::Webhook);
    output.webhook_url = Some(format!("{}/hooks/evidence", mock_server.uri()));
    output.headers = HashMap::from([("X-Team".to_string(), "platform".to_string())]);
    let emitter = BundleEmitter::from_config(&app_config_with_output(output)).unwrap();

    let emission = emitter
        .emit(
            &scenario_event(),
            Some(&scenario_diff()),
            &github_metadata(),
            RiskTier::L2,
            Some("bead-7"),
        )
        .await
        .unwrap();

    assert_eq!(emission.bundle.export_status(), ExportStatus::Exported);
    assert_eq!(emission.receipt.response, None);
}

#[test]
fn test_missing_sink_parameter_fails_fast() {
    let config = app_config_with_output(output_config(OutputMode::Webhook));
    let err = BundleEmitter::from_config(&config).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Configuration error: webhook_url required for webhook mode"
    );
}

//! Crate-level scenarios exercising `Pipeline::analyze`/`batch_analyze`/
//! `manual_respond` end to end, against in-memory fakes of the four
//! collaborator traits (SPEC_FULL.md §8 concrete scenarios).

use sentinel_core::{
    ActionStatus, AssetRecord, EntityType, GraphStore, Pipeline, PipelineConfig, ResponseAction,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn single_malicious_ip_with_no_backends_yields_expected_entities() {
    let pipeline = Pipeline::new(PipelineConfig::default());
    let payload = serde_json::json!({
        "event_type": "network_anomaly",
        "src_ip": "203.0.113.99",
        "dst_ip": "10.0.0.1",
        "username": "alice",
        "is_anomaly": true,
        "anomaly_type": "unusual_data_transfer",
    });

    let result = pipeline.analyze(payload, "network_anomaly").await;

    assert_eq!(result.summary.entities_extracted, 3);
    let ip_count = result.entities.iter().filter(|e| e.entity_type == EntityType::Ip).count();
    let user_count = result.entities.iter().filter(|e| e.entity_type == EntityType::User).count();
    assert_eq!(ip_count, 2);
    assert_eq!(user_count, 1);

    let external = result
        .entities
        .iter()
        .find(|e| e.entity_id == "203.0.113.99")
        .expect("external IP entity present");
    assert_eq!(external.metadata.get("is_anomaly").unwrap(), true);
    // base(20) plus a blend of external_ip(0.4) and anomaly_behavior(0.5) stays
    // well under the documented "<= ~60" ceiling, not near the 90s a fully
    // inverted weight/value table would produce.
    assert!(external.risk_score > 20.0 && external.risk_score <= 60.0, "risk_score was {}", external.risk_score);
}

#[tokio::test]
async fn policy_threshold_boundary_85_dispatches_expected_actions_for_a_user_entity() {
    let pipeline = Pipeline::new(PipelineConfig::default());

    let results = pipeline
        .manual_respond(
            EntityType::User,
            "alice",
            vec![
                ResponseAction::BlockIp,
                ResponseAction::SendAlert,
                ResponseAction::CreateTicket,
                ResponseAction::NotifyAdmin,
            ],
        )
        .await;

    assert_eq!(results.len(), 4);
    let block_ip = results.iter().find(|r| r.action == ResponseAction::BlockIp).unwrap();
    assert_eq!(block_ip.status, ActionStatus::Failed);
    assert_eq!(block_ip.message, "no suitable effector");

    let send_alert = results.iter().find(|r| r.action == ResponseAction::SendAlert).unwrap();
    assert_eq!(send_alert.status, ActionStatus::Success);
}

struct DedupGraphStore;

#[async_trait::async_trait]
impl GraphStore for DedupGraphStore {
    async fn query_ip_assets(&self, _ip: &str) -> sentinel_core::Result<Vec<AssetRecord>> {
        Ok(vec![AssetRecord {
            ip: Some(sentinel_core::expansion::IpAsset { ip: "192.168.1.50".to_string() }),
            ..Default::default()
        }])
    }
    async fn query_user_assets(&self, _username: &str) -> sentinel_core::Result<Vec<AssetRecord>> {
        Ok(vec![AssetRecord {
            ip: Some(sentinel_core::expansion::IpAsset { ip: "192.168.1.50".to_string() }),
            ..Default::default()
        }])
    }
    async fn query_device_assets(&self, _hostname: &str) -> sentinel_core::Result<Vec<AssetRecord>> {
        Ok(Vec::new())
    }
    async fn query_file_assets(&self, _path: &str) -> sentinel_core::Result<Vec<AssetRecord>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn expansion_dedups_same_neighbor_discovered_twice() {
    let pipeline = Pipeline::new(PipelineConfig::default()).with_graph_store(Arc::new(DedupGraphStore));
    let payload = serde_json::json!({ "src_ip": "10.0.0.1", "username": "alice" });

    let result = pipeline.analyze(payload, "security_alert").await;

    let neighbor_count = result.entities.iter().filter(|e| e.entity_id == "192.168.1.50").count();
    assert_eq!(neighbor_count, 1, "the same (IP, 192.168.1.50) candidate discovered by two source entities must merge into one entity");

    let neighbor = result.entities.iter().find(|e| e.entity_id == "192.168.1.50").unwrap();
    let forward_edges = neighbor.connections.iter().filter(|c| c.relationship.starts_with("REVERSE_")).count();
    assert!(forward_edges >= 1);
}

struct SlowGraphStore;

#[async_trait::async_trait]
impl GraphStore for SlowGraphStore {
    async fn query_ip_assets(&self, _ip: &str) -> sentinel_core::Result<Vec<AssetRecord>> {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(Vec::new())
    }
    async fn query_user_assets(&self, _username: &str) -> sentinel_core::Result<Vec<AssetRecord>> {
        Ok(Vec::new())
    }
    async fn query_device_assets(&self, _hostname: &str) -> sentinel_core::Result<Vec<AssetRecord>> {
        Ok(Vec::new())
    }
    async fn query_file_assets(&self, _path: &str) -> sentinel_core::Result<Vec<AssetRecord>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn batch_analyze_yields_a_timeout_result_under_an_impossibly_short_deadline() {
    let mut config = PipelineConfig::default();
    config.processing_timeout_seconds = 0;

    let pipeline = Pipeline::new(config).with_graph_store(Arc::new(SlowGraphStore));
    let payloads: Vec<(serde_json::Value, String)> = (0..5)
        .map(|i| (serde_json::json!({ "src_ip": format!("10.0.0.{i}") }), "security_alert".to_string()))
        .collect();

    let results = tokio::time::timeout(Duration::from_secs(10), pipeline.batch_analyze(payloads))
        .await
        .expect("batch_analyze itself must not hang past its own deadline handling");

    assert!(results.is_empty(), "a fired wall-clock deadline yields a batch-level timeout, not partial results");
}

#[tokio::test]
async fn manual_respond_on_absent_effector_reports_failure() {
    let pipeline = Pipeline::new(PipelineConfig::default());

    let results = pipeline
        .manual_respond(EntityType::Device, "some.host", vec![ResponseAction::ResetPassword])
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ActionStatus::Failed);
    assert_eq!(results[0].message, "no suitable effector");
}

#[tokio::test]
async fn statistics_track_events_processed_across_calls() {
    let pipeline = Pipeline::new(PipelineConfig::default());

    for _ in 0..3 {
        pipeline.analyze(serde_json::json!({ "src_ip": "10.0.0.1" }), "security_alert").await;
    }

    let snapshot = pipeline.get_statistics().await;
    assert_eq!(snapshot.statistics.total_events_processed, 3);
}

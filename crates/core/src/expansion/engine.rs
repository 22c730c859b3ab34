use super::traits::{GraphStore, ThreatIntel, Timeseries};
use super::weights::edge_weight;
use crate::config::ExpansionConfig;
use crate::entity::{Connection, Entity, EntityStatus, EntityType, Event};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

const GRAPH_TIMEOUT: Duration = Duration::from_secs(8);
const THREAT_INTEL_TIMEOUT: Duration = Duration::from_secs(5);
const TIMESERIES_TIMEOUT: Duration = Duration::from_secs(8);

/// Cap applied per asset sub-query before merge truncation (SPEC_FULL.md §4.2.1).
const ASSET_CAP: usize = 25;

/// One candidate neighbor surfaced by an expansion method, not yet merged
/// into the event's arena.
#[derive(Debug, Clone)]
pub struct Discovered {
    pub entity: Entity,
    pub relationship: String,
}

impl Discovered {
    fn new(entity_type: EntityType, entity_id: impl Into<String>, relationship: impl Into<String>, expansion_source: &str) -> Self {
        let mut entity = Entity::new(entity_type, entity_id);
        entity.add_metadata("expansion_source", expansion_source);
        Self {
            entity,
            relationship: relationship.into(),
        }
    }

    fn effective_confidence(&self) -> f64 {
        self.entity
            .metadata
            .get("confidence")
            .and_then(|v| v.as_f64())
            .unwrap_or(self.entity.confidence)
    }
}

/// Raw output of `ExpansionEngine::expand`, before dedup/confidence-filter/
/// truncate/edge-wiring (SPEC_FULL.md §4.2 merge rules).
#[derive(Debug, Default, Clone)]
pub struct ExpansionOutcome {
    pub discovered: Vec<Discovered>,
    pub warnings: Vec<String>,
}

/// Stage 2 of the pipeline. Discovers related entities for one Entity via
/// four independent, concurrently-run methods (SPEC_FULL.md §4.2).
#[derive(Clone)]
pub struct ExpansionEngine {
    config: ExpansionConfig,
    graph_store: Option<Arc<dyn GraphStore>>,
    threat_intel: Option<Arc<dyn ThreatIntel>>,
    timeseries: Option<Arc<dyn Timeseries>>,
}

impl ExpansionEngine {
    pub fn new(config: ExpansionConfig) -> Self {
        Self {
            config,
            graph_store: None,
            threat_intel: None,
            timeseries: None,
        }
    }

    pub fn with_graph_store(mut self, graph_store: Arc<dyn GraphStore>) -> Self {
        self.graph_store = Some(graph_store);
        self
    }

    pub fn with_threat_intel(mut self, threat_intel: Arc<dyn ThreatIntel>) -> Self {
        self.threat_intel = Some(threat_intel);
        self
    }

    pub fn with_timeseries(mut self, timeseries: Arc<dyn Timeseries>) -> Self {
        self.timeseries = Some(timeseries);
        self
    }

    pub fn has_graph_store(&self) -> bool {
        self.graph_store.is_some()
    }

    pub fn has_threat_intel(&self) -> bool {
        self.threat_intel.is_some()
    }

    pub fn has_timeseries(&self) -> bool {
        self.timeseries.is_some()
    }

    /// Runs the four expansion methods concurrently and returns the merged,
    /// not-yet-deduped candidate list (SPEC_FULL.md §4.2, §5 per-entity fan-out).
    pub async fn expand(&self, entity: &Entity) -> ExpansionOutcome {
        let (asset, intel, anomaly, temporal) = tokio::join!(
            self.asset_relationship(entity),
            self.threat_intel_expansion(entity),
            self.baseline_anomaly(entity),
            self.temporal_correlation(entity),
        );

        let mut discovered = Vec::new();
        let mut warnings = Vec::new();
        for (mut items, warning) in [asset, intel, anomaly, temporal] {
            discovered.append(&mut items);
            if let Some(w) = warning {
                warnings.push(w);
            }
        }

        ExpansionOutcome { discovered, warnings }
    }

    /// Applies merge rules 1-5 and wires edges into `event`'s arena, then
    /// transitions the source entity to `Investigated`.
    pub fn merge(&self, event: &mut Event, source_index: usize, outcome: ExpansionOutcome) -> usize {
        let mut seen: HashSet<(EntityType, String)> = HashSet::new();
        let mut surviving = Vec::new();

        for candidate in outcome.discovered {
            let key = candidate.entity.key();
            if !seen.insert(key) {
                continue;
            }
            if candidate.effective_confidence() < self.config.min_confidence_threshold {
                continue;
            }
            surviving.push(candidate);
        }

        surviving.truncate(self.config.max_entities_per_expansion);

        let mut edges_added = 0;
        for candidate in surviving {
            let relationship = candidate.relationship.clone();
            let expansion_source = candidate
                .entity
                .metadata
                .get("expansion_source")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string();
            let weight = edge_weight(&relationship);

            let target_index = event.upsert_entity(candidate.entity);
            if target_index == source_index {
                continue;
            }

            let target_key = event.entities[target_index].key();
            let source_key = event.entities[source_index].key();

            let forward = Connection::new(target_key.0, target_key.1, relationship.clone())
                .with_target_index(target_index)
                .with_metadata("expansion_method", expansion_source.clone())
                .with_metadata("weight", weight);
            let reverse_name = forward.reverse_relationship();
            event.entities[source_index].add_connection(forward);

            let backward = Connection::new(source_key.0, source_key.1, reverse_name)
                .with_target_index(source_index)
                .with_metadata("expansion_method", expansion_source)
                .with_metadata("weight", weight);
            event.entities[target_index].add_connection(backward);

            edges_added += 1;
        }

        event.entities[source_index].update_status(EntityStatus::Investigated, "expansion completed");
        edges_added
    }

    async fn asset_relationship(&self, entity: &Entity) -> (Vec<Discovered>, Option<String>) {
        let Some(graph_store) = &self.graph_store else {
            return (Vec::new(), None);
        };

        let result = match entity.entity_type {
            EntityType::Ip => timeout(GRAPH_TIMEOUT, graph_store.query_ip_assets(&entity.entity_id)).await,
            EntityType::User => timeout(GRAPH_TIMEOUT, graph_store.query_user_assets(&entity.entity_id)).await,
            EntityType::Device => timeout(GRAPH_TIMEOUT, graph_store.query_device_assets(&entity.entity_id)).await,
            EntityType::File => timeout(GRAPH_TIMEOUT, graph_store.query_file_assets(&entity.entity_id)).await,
            _ => return (Vec::new(), None),
        };

        let records = match result {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                warn!(backend = "graph_store", entity_key = %entity.entity_id, error = %e, "asset relationship query failed");
                return (Vec::new(), Some(e.to_warning_string()));
            }
            Err(_) => {
                warn!(backend = "graph_store", entity_key = %entity.entity_id, "asset relationship query timed out");
                return (Vec::new(), Some(format!("graph_store timed out for {}", entity.entity_id)));
            }
        };

        let mut discovered = Vec::new();
        for record in records.into_iter().take(ASSET_CAP) {
            let (relationship_for_device, relationship_for_user, relationship_for_process, relationship_for_ip, relationship_for_file) =
                match entity.entity_type {
                    EntityType::Ip => ("BELONGS_TO", "USED_BY", "ACCESSED_BY", "BELONGS_TO", "ACCESSED_BY"),
                    EntityType::User => ("USES", "USES", "EXECUTES", "HAS_IP", "ACCESSES"),
                    EntityType::Device => ("BELONGS_TO", "USED_BY", "EXECUTES", "HAS_IP", "ACCESSES"),
                    EntityType::File => ("BELONGS_TO", "ACCESSES", "EXECUTES", "HAS_IP", "ACCESSES"),
                    _ => ("BELONGS_TO", "USED_BY", "EXECUTES", "HAS_IP", "ACCESSES"),
                };

            if let Some(device) = record.device {
                discovered.push(Discovered::new(EntityType::Device, device.hostname, relationship_for_device, "asset_relationship"));
            }
            if let Some(user) = record.user {
                discovered.push(Discovered::new(EntityType::User, user.username, relationship_for_user, "asset_relationship"));
            }
            if let Some(process) = record.process {
                discovered.push(Discovered::new(EntityType::Process, process.process_name, relationship_for_process, "asset_relationship"));
            }
            if let Some(ip) = record.ip {
                discovered.push(Discovered::new(EntityType::Ip, ip.ip, relationship_for_ip, "asset_relationship"));
            }
            if let Some(file) = record.file {
                discovered.push(Discovered::new(EntityType::File, file.path, relationship_for_file, "asset_relationship"));
            }
        }

        (discovered, None)
    }

    async fn threat_intel_expansion(&self, entity: &Entity) -> (Vec<Discovered>, Option<String>) {
        let Some(threat_intel) = &self.threat_intel else {
            return (Vec::new(), None);
        };

        let is_hash_file = entity.entity_type == EntityType::File
            && entity.metadata.get("is_hash").and_then(|v| v.as_bool()).unwrap_or(false);

        let result = match entity.entity_type {
            EntityType::Ip => timeout(THREAT_INTEL_TIMEOUT, threat_intel.query_ip(&entity.entity_id)).await,
            EntityType::Domain => timeout(THREAT_INTEL_TIMEOUT, threat_intel.query_domain(&entity.entity_id)).await,
            EntityType::File if is_hash_file => {
                timeout(THREAT_INTEL_TIMEOUT, threat_intel.query_hash(&entity.entity_id)).await
            }
            _ => return (Vec::new(), None),
        };

        let hit = match result {
            Ok(Ok(Some(hit))) => hit,
            Ok(Ok(None)) => return (Vec::new(), None),
            Ok(Err(e)) => {
                warn!(backend = "threat_intel", entity_key = %entity.entity_id, error = %e, "threat intel query failed");
                return (Vec::new(), Some(e.to_warning_string()));
            }
            Err(_) => {
                warn!(backend = "threat_intel", entity_key = %entity.entity_id, "threat intel query timed out");
                return (Vec::new(), Some(format!("threat_intel timed out for {}", entity.entity_id)));
            }
        };

        let mut discovered = Vec::new();
        for ip in hit.related_ips {
            let mut d = Discovered::new(EntityType::Ip, ip, "THREAT_INTEL_RELATED", "threat_intel");
            d.entity.add_metadata("threat_types", hit.threat_types.clone());
            d.entity.add_metadata("confidence", hit.confidence);
            discovered.push(d);
        }
        for domain in hit.related_domains {
            let mut d = Discovered::new(EntityType::Domain, domain, "THREAT_INTEL_RELATED", "threat_intel");
            d.entity.add_metadata("threat_types", hit.threat_types.clone());
            d.entity.add_metadata("confidence", hit.confidence);
            discovered.push(d);
        }
        for hash in hit.related_hashes {
            let mut d = Discovered::new(EntityType::File, hash, "THREAT_INTEL_RELATED", "threat_intel");
            d.entity.add_metadata("threat_types", hit.threat_types.clone());
            d.entity.add_metadata("confidence", hit.confidence);
            d.entity.add_metadata("is_hash", true);
            discovered.push(d);
        }

        (discovered, None)
    }

    async fn baseline_anomaly(&self, entity: &Entity) -> (Vec<Discovered>, Option<String>) {
        let Some(timeseries) = &self.timeseries else {
            return (Vec::new(), None);
        };

        let (result, target_type, anomaly_type, top_n): (_, EntityType, &str, usize) = match entity.entity_type {
            EntityType::User => (
                timeout(TIMESERIES_TIMEOUT, timeseries.user_anomalous_logins(&entity.entity_id)).await,
                EntityType::Ip,
                "login_anomaly",
                10,
            ),
            EntityType::Ip => (
                timeout(TIMESERIES_TIMEOUT, timeseries.ip_anomalous_users(&entity.entity_id)).await,
                EntityType::User,
                "login_anomaly",
                15,
            ),
            EntityType::Device => (
                timeout(TIMESERIES_TIMEOUT, timeseries.device_anomalous_processes(&entity.entity_id)).await,
                EntityType::Process,
                "process_anomaly",
                10,
            ),
            _ => return (Vec::new(), None),
        };

        let values = match result {
            Ok(Ok(values)) => values,
            Ok(Err(e)) => {
                warn!(backend = "timeseries", entity_key = %entity.entity_id, error = %e, "baseline anomaly query failed");
                return (Vec::new(), Some(e.to_warning_string()));
            }
            Err(_) => {
                warn!(backend = "timeseries", entity_key = %entity.entity_id, "baseline anomaly query timed out");
                return (Vec::new(), Some(format!("timeseries timed out for {}", entity.entity_id)));
            }
        };

        let discovered = values
            .into_iter()
            .take(top_n)
            .map(|cv| {
                let mut d = Discovered::new(target_type, cv.value, "ANOMALY_RELATED", "baseline_anomaly");
                d.entity.add_metadata("anomaly_type", anomaly_type);
                d.entity.add_metadata("event_count", cv.count);
                d
            })
            .collect();

        (discovered, None)
    }

    async fn temporal_correlation(&self, entity: &Entity) -> (Vec<Discovered>, Option<String>) {
        let Some(timeseries) = &self.timeseries else {
            return (Vec::new(), None);
        };

        let window_hours = self.config.time_window_hours;

        match entity.entity_type {
            EntityType::Ip => {
                let result = timeout(
                    TIMESERIES_TIMEOUT,
                    timeseries.ip_temporal_communications(&entity.entity_id, window_hours),
                )
                .await;

                let values = match result {
                    Ok(Ok(values)) => values,
                    Ok(Err(e)) => {
                        warn!(backend = "timeseries", entity_key = %entity.entity_id, error = %e, "temporal correlation query failed");
                        return (Vec::new(), Some(e.to_warning_string()));
                    }
                    Err(_) => {
                        warn!(backend = "timeseries", entity_key = %entity.entity_id, "temporal correlation query timed out");
                        return (Vec::new(), Some(format!("timeseries timed out for {}", entity.entity_id)));
                    }
                };

                let discovered = values
                    .into_iter()
                    .filter(|cv| cv.count > 5)
                    .take(20)
                    .map(|cv| {
                        let mut d = Discovered::new(EntityType::Ip, cv.value, "COMMUNICATES_WITH", "temporal_correlation");
                        d.entity.add_metadata("event_count", cv.count);
                        d
                    })
                    .collect();

                (discovered, None)
            }
            EntityType::User => {
                let result = timeout(
                    TIMESERIES_TIMEOUT,
                    timeseries.user_temporal_file_access(&entity.entity_id, window_hours),
                )
                .await;

                let values = match result {
                    Ok(Ok(values)) => values,
                    Ok(Err(e)) => {
                        warn!(backend = "timeseries", entity_key = %entity.entity_id, error = %e, "temporal correlation query failed");
                        return (Vec::new(), Some(e.to_warning_string()));
                    }
                    Err(_) => {
                        warn!(backend = "timeseries", entity_key = %entity.entity_id, "temporal correlation query timed out");
                        return (Vec::new(), Some(format!("timeseries timed out for {}", entity.entity_id)));
                    }
                };

                let discovered = values
                    .into_iter()
                    .filter(|cv| cv.count > 1)
                    .take(15)
                    .map(|cv| {
                        let mut d = Discovered::new(EntityType::File, cv.value, "ACCESSES", "temporal_correlation");
                        d.entity.add_metadata("event_count", cv.count);
                        d
                    })
                    .collect();

                (discovered, None)
            }
            _ => (Vec::new(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::traits::{CountedValue, IpAsset};
    use async_trait::async_trait;

    struct FakeGraphStore;

    #[async_trait]
    impl GraphStore for FakeGraphStore {
        async fn query_ip_assets(&self, _ip: &str) -> crate::error::Result<Vec<super::super::traits::AssetRecord>> {
            Ok(vec![super::super::traits::AssetRecord {
                ip: Some(IpAsset { ip: "9.9.9.9".to_string() }),
                ..Default::default()
            }])
        }
        async fn query_user_assets(&self, _username: &str) -> crate::error::Result<Vec<super::super::traits::AssetRecord>> {
            Ok(Vec::new())
        }
        async fn query_device_assets(&self, _hostname: &str) -> crate::error::Result<Vec<super::super::traits::AssetRecord>> {
            Ok(Vec::new())
        }
        async fn query_file_assets(&self, _path: &str) -> crate::error::Result<Vec<super::super::traits::AssetRecord>> {
            Ok(Vec::new())
        }
    }

    struct FakeTimeseries;

    #[async_trait]
    impl Timeseries for FakeTimeseries {
        async fn user_anomalous_logins(&self, _username: &str) -> crate::error::Result<Vec<CountedValue>> {
            Ok(Vec::new())
        }
        async fn ip_anomalous_users(&self, _ip: &str) -> crate::error::Result<Vec<CountedValue>> {
            Ok(Vec::new())
        }
        async fn device_anomalous_processes(&self, _hostname: &str) -> crate::error::Result<Vec<CountedValue>> {
            Ok(Vec::new())
        }
        async fn ip_temporal_communications(&self, _ip: &str, _window_hours: i64) -> crate::error::Result<Vec<CountedValue>> {
            Ok(vec![CountedValue { value: "5.5.5.5".to_string(), count: 9 }])
        }
        async fn user_temporal_file_access(&self, _username: &str, _window_hours: i64) -> crate::error::Result<Vec<CountedValue>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn absent_collaborators_contribute_nothing_silently() {
        let engine = ExpansionEngine::new(ExpansionConfig::default());
        let entity = Entity::new(EntityType::Ip, "1.2.3.4");
        let outcome = engine.expand(&entity).await;

        assert!(outcome.discovered.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn wired_graph_store_discovers_and_merges_edge() {
        let engine = ExpansionEngine::new(ExpansionConfig::default()).with_graph_store(Arc::new(FakeGraphStore));
        let entity = Entity::new(EntityType::Ip, "1.2.3.4");
        let outcome = engine.expand(&entity).await;
        assert_eq!(outcome.discovered.len(), 1);

        let mut event = Event::new("test", serde_json::json!({}));
        let source_index = event.upsert_entity(entity);
        let edges = engine.merge(&mut event, source_index, outcome);

        assert_eq!(edges, 1);
        assert_eq!(event.entities.len(), 2);
        assert_eq!(event.entities[source_index].status, EntityStatus::Investigated);
    }

    #[tokio::test]
    async fn temporal_correlation_filters_low_counts() {
        let engine = ExpansionEngine::new(ExpansionConfig::default()).with_timeseries(Arc::new(FakeTimeseries));
        let entity = Entity::new(EntityType::Ip, "1.2.3.4");
        let outcome = engine.expand(&entity).await;
        assert_eq!(outcome.discovered.len(), 1);
        assert_eq!(outcome.discovered[0].relationship, "COMMUNICATES_WITH");
    }
}

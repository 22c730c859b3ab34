use super::statistics::{ComponentHealth, HealthStatus, PipelineStatistics, StatisticsSnapshot};
use crate::config::{PartialPipelineConfig, PipelineConfig};
use crate::entity::{Entity, EntityType, Event, EventResult};
use crate::error::{Error, Result};
use crate::expansion::{AnomalyModel, ExpansionEngine, GraphStore, ThreatIntel, Timeseries};
use crate::metrics::PipelineMetrics;
use crate::recognizer::Recognizer;
use crate::response::{ActionResult, ResponseOrchestrator, actions_for_score};
use crate::scoring::Scorer;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

/// Upper bound on direct neighbors passed as multi-point scoring context
/// (SPEC_FULL.md §4.5 step 4).
const MAX_SCORING_NEIGHBORS: usize = 10;

/// The orchestrating entry point for the Recognize → Expand → Score →
/// Respond pipeline (SPEC_FULL.md §4.5). Owns one instance of each stage
/// and the process-wide aggregate statistics.
pub struct Pipeline {
    config: RwLock<PipelineConfig>,
    recognizer: Recognizer,
    expansion_engine: ExpansionEngine,
    scorer: Scorer,
    orchestrator: ResponseOrchestrator,
    statistics: RwLock<PipelineStatistics>,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let expansion_engine = ExpansionEngine::new(config.expansion.clone());
        Self {
            config: RwLock::new(config),
            recognizer: Recognizer,
            expansion_engine,
            scorer: Scorer::new(),
            orchestrator: ResponseOrchestrator::with_builtin_effectors(),
            statistics: RwLock::new(PipelineStatistics::default()),
            metrics: None,
        }
    }

    pub fn with_graph_store(mut self, graph_store: Arc<dyn GraphStore>) -> Self {
        self.expansion_engine = self.expansion_engine.with_graph_store(graph_store);
        self
    }

    pub fn with_threat_intel(mut self, threat_intel: Arc<dyn ThreatIntel>) -> Self {
        self.expansion_engine = self.expansion_engine.with_threat_intel(threat_intel.clone());
        self.scorer = self.scorer.with_threat_intel(threat_intel);
        self
    }

    pub fn with_timeseries(mut self, timeseries: Arc<dyn Timeseries>) -> Self {
        self.expansion_engine = self.expansion_engine.with_timeseries(timeseries);
        self
    }

    pub fn with_anomaly_model(mut self, anomaly_model: Arc<dyn AnomalyModel>) -> Self {
        self.scorer = self.scorer.with_anomaly_model(anomaly_model);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn register_effector(&self, effector: Arc<dyn crate::response::Effector>) {
        self.orchestrator.register_effector(effector).await;
    }

    /// Runs the four-stage pipeline against one payload (SPEC_FULL.md §4.5).
    /// Total: returns a structured `EventResult` for every input, never an `Err`.
    #[instrument(skip(self, payload), fields(event_type = %event_type))]
    pub async fn analyze(&self, payload: serde_json::Value, event_type: impl Into<String> + std::fmt::Display) -> EventResult {
        let start = Instant::now();
        let mut event = Event::new(event_type, payload.clone());
        let mut warnings = Vec::new();

        let config = self.config.read().await.clone();

        let entities = self.recognizer.extract_entities(&payload, event.event_id);
        if entities.is_empty() {
            info!(event_id = %event.event_id, "no entities extracted");
            return EventResult::from_event(event, start.elapsed().as_millis() as u64, Vec::new(), warnings);
        }

        for entity in entities {
            event.upsert_entity(entity);
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_entities_extracted(event.entities.len());
        }

        let mut edges_added = 0;
        if config.enable_connection_expansion {
            edges_added = self.expand_all(&mut event, &mut warnings).await;
        }

        if config.enable_risk_scoring {
            self.score_all(&mut event, &mut warnings).await;
        }

        let mut response_results = Vec::new();
        if config.enable_auto_response && event.max_entity_score() >= config.min_risk_threshold_for_response {
            response_results = self.respond_all(&mut event, config.min_risk_threshold_for_response).await;
        }

        event.processed = true;
        event.risk_score = event.max_entity_score();

        let processing_time_ms = start.elapsed().as_millis() as u64;

        {
            let mut stats = self.statistics.write().await;
            stats.record_event(
                event.entities.len() as u64,
                edges_added as u64,
                response_results.len() as u64,
                processing_time_ms,
            );
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_event_processed();
            metrics.observe_processing_duration(processing_time_ms as f64 / 1000.0);
        }

        info!(event_id = %event.event_id, processing_time_ms, "analysis completed");
        EventResult::from_event(event, processing_time_ms, response_results, warnings)
    }

    /// Fans out expansion across every entity in parallel (SPEC_FULL.md §4.5 step 3, §5).
    /// Returns the number of edges wired into the arena.
    async fn expand_all(&self, event: &mut Event, warnings: &mut Vec<String>) -> usize {
        let outcomes = stream::iter(event.entities.clone())
            .map(|entity| {
                let engine = self.expansion_engine.clone();
                async move { engine.expand(&entity).await }
            })
            .buffer_unordered(event.entities.len().max(1))
            .collect::<Vec<_>>()
            .await;

        let mut edges_added = 0;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            warnings.extend(outcome.warnings.clone());
            edges_added += self.expansion_engine.merge(event, index, outcome);
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_connections_expanded(edges_added);
        }

        edges_added
    }

    /// Scores every entity using its direct in-event neighbors as multi-point
    /// context (SPEC_FULL.md §4.5 step 4).
    async fn score_all(&self, event: &mut Event, warnings: &mut Vec<String>) {
        for index in 0..event.entities.len() {
            let target = event.entities[index].clone();
            let neighbor_indices: Vec<usize> = target
                .connections
                .iter()
                .filter_map(|c| c.target_index)
                .take(MAX_SCORING_NEIGHBORS)
                .collect();
            let neighbors: Vec<&Entity> = neighbor_indices.iter().map(|&i| &event.entities[i]).collect();

            let (score, warning) = self.scorer.score(&target, &neighbors).await;
            if let Some(w) = warning {
                warnings.push(w);
            }

            event.entities[index].update_risk_score(score, "scoring completed");
        }
    }

    /// Dispatches responses for every entity at or above the threshold,
    /// concurrently across entities (SPEC_FULL.md §4.5 step 5).
    async fn respond_all(&self, event: &mut Event, threshold: f64) -> Vec<ActionResult> {
        let mut all_results = Vec::new();
        for index in 0..event.entities.len() {
            if event.entities[index].risk_score < threshold {
                continue;
            }
            let actions = actions_for_score(event.entities[index].risk_score);
            if actions.is_empty() {
                continue;
            }
            let mut entity = event.entities[index].clone();
            let results = self.orchestrator.dispatch(&mut entity, actions).await;
            event.entities[index] = entity;
            all_results.extend(results);
        }
        all_results
    }

    /// Batch variant: bounded concurrency plus a wall-clock deadline that
    /// cancels every still-pending per-event task (SPEC_FULL.md §4.5, §5.1).
    pub async fn batch_analyze(&self, payloads: Vec<(serde_json::Value, String)>) -> Vec<EventResult> {
        let (max_concurrent, deadline) = {
            let config = self.config.read().await;
            (config.max_concurrent_processing, Duration::from_secs(config.processing_timeout_seconds))
        };

        let work = stream::iter(payloads)
            .map(|(payload, event_type)| async move { self.analyze(payload, event_type).await })
            .buffer_unordered(max_concurrent)
            .collect::<Vec<_>>();

        match timeout(deadline, work).await {
            Ok(results) => results,
            Err(_) => {
                warn!("batch analysis exceeded the wall-clock deadline");
                Vec::new()
            }
        }
    }

    /// Re-triggers response dispatch for a synthesized single-entity context,
    /// bypassing Recognize/Expand/Score (SPEC_FULL.md §4.5.1).
    pub async fn manual_respond(&self, entity_type: EntityType, entity_id: impl Into<String>, actions: Vec<crate::response::ResponseAction>) -> Vec<ActionResult> {
        let mut entity = Entity::new(entity_type, entity_id);
        self.orchestrator.dispatch(&mut entity, actions).await
    }

    /// Probes every wired collaborator and reports `not_configured` for
    /// anything left unwired, never `unhealthy` (SPEC_FULL.md §4.5.1).
    pub async fn health_check(&self) -> HealthStatus {
        HealthStatus {
            service: ComponentHealth::Healthy,
            graph_store: if self.expansion_engine.has_graph_store() { ComponentHealth::Healthy } else { ComponentHealth::NotConfigured },
            threat_intel: if self.expansion_engine.has_threat_intel() { ComponentHealth::Healthy } else { ComponentHealth::NotConfigured },
            timeseries: if self.expansion_engine.has_timeseries() { ComponentHealth::Healthy } else { ComponentHealth::NotConfigured },
            anomaly_model: if self.scorer.has_anomaly_model() { ComponentHealth::Healthy } else { ComponentHealth::NotConfigured },
            effectors: self.orchestrator.effector_status().await,
            timestamp: chrono::Utc::now(),
        }
    }

    pub async fn get_statistics(&self) -> StatisticsSnapshot {
        StatisticsSnapshot::new(self.statistics.read().await.clone())
    }

    /// Merges a partial configuration update under a write lock, rejecting
    /// updates that would violate a validated invariant (SPEC_FULL.md §4.5.1).
    pub async fn update_configuration(&self, partial: PartialPipelineConfig) -> Result<()> {
        let current = self.config.read().await.clone();
        let merged = current.merged_with(partial).map_err(|e| Error::validation(e.message))?;
        *self.config.write().await = merged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn analyze_returns_empty_result_for_payload_with_no_entities() {
        let pipeline = Pipeline::new(PipelineConfig::default());
        let result = pipeline.analyze(serde_json::json!({}), "security_alert").await;

        assert_eq!(result.summary.entities_extracted, 0);
        assert!(result.response_results.is_empty());
    }

    #[tokio::test]
    async fn analyze_extracts_entities_and_skips_response_below_threshold() {
        let pipeline = Pipeline::new(PipelineConfig::default());
        let payload = serde_json::json!({ "source_ip": "10.0.0.5" });
        let result = pipeline.analyze(payload, "security_alert").await;

        assert_eq!(result.summary.entities_extracted, 1);
        assert!(result.response_results.is_empty());
    }

    #[tokio::test]
    async fn update_configuration_rejects_invalid_partial() {
        let pipeline = Pipeline::new(PipelineConfig::default());
        let partial = PartialPipelineConfig {
            max_concurrent_processing: Some(0),
            ..Default::default()
        };
        assert!(pipeline.update_configuration(partial).await.is_err());
    }

    #[tokio::test]
    async fn health_check_reports_not_configured_collaborators() {
        let pipeline = Pipeline::new(PipelineConfig::default());
        let health = pipeline.health_check().await;
        assert_eq!(health.graph_store, ComponentHealth::NotConfigured);
        assert!(!health.effectors.is_empty());
    }
}

use super::multi_point::multi_point_score;
use super::single_point::single_point_score;
use crate::entity::Entity;
use crate::expansion::{AnomalyModel, ThreatIntel};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

const ANOMALY_MODEL_TIMEOUT: Duration = Duration::from_secs(5);

/// Stage 3 of the pipeline. Computes a 0-100 risk score per entity from a
/// single-point indicator score and, when neighbors are supplied, a
/// multi-point correlation score (SPEC_FULL.md §4.3).
#[derive(Clone)]
pub struct Scorer {
    threat_intel: Option<Arc<dyn ThreatIntel>>,
    anomaly_model: Option<Arc<dyn AnomalyModel>>,
}

impl Scorer {
    pub fn new() -> Self {
        Self {
            threat_intel: None,
            anomaly_model: None,
        }
    }

    pub fn with_threat_intel(mut self, threat_intel: Arc<dyn ThreatIntel>) -> Self {
        self.threat_intel = Some(threat_intel);
        self
    }

    pub fn with_anomaly_model(mut self, anomaly_model: Arc<dyn AnomalyModel>) -> Self {
        self.anomaly_model = Some(anomaly_model);
        self
    }

    pub fn has_threat_intel(&self) -> bool {
        self.threat_intel.is_some()
    }

    pub fn has_anomaly_model(&self) -> bool {
        self.anomaly_model.is_some()
    }

    /// Scores `target` using `neighbors` (the entity's direct in-event
    /// connections) as multi-point context. Returns the final score and any
    /// absorbed backend warning.
    pub async fn score(&self, target: &Entity, neighbors: &[&Entity]) -> (f64, Option<String>) {
        let (ml_anomaly, ml_sequence, warning) = self.query_ml_terms(target).await;

        let single = single_point_score(target, ml_anomaly);
        let multi = multi_point_score(target, neighbors, ml_sequence);

        let final_score = if multi == 0.0 {
            single
        } else {
            (0.4 * single + 0.6 * multi).clamp(0.0, 100.0)
        };

        (final_score, warning)
    }

    async fn query_ml_terms(&self, target: &Entity) -> (Option<f64>, Option<f64>, Option<String>) {
        let Some(model) = &self.anomaly_model else {
            return (None, None, None);
        };

        let anomaly_result = timeout(ANOMALY_MODEL_TIMEOUT, model.predict_anomaly(target)).await;
        let anomaly = match anomaly_result {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(backend = "anomaly_model", entity_key = %target.entity_id, error = %e, "anomaly prediction failed");
                return (None, None, Some(e.to_warning_string()));
            }
            Err(_) => {
                warn!(backend = "anomaly_model", entity_key = %target.entity_id, "anomaly prediction timed out");
                return (None, None, Some(format!("anomaly_model timed out for {}", target.entity_id)));
            }
        };

        let tokens: Vec<String> = target
            .metadata
            .get("anomaly_type")
            .and_then(|v| v.as_str())
            .map(|s| vec![s.to_string()])
            .unwrap_or_default();

        let sequence = if tokens.is_empty() {
            None
        } else {
            match timeout(ANOMALY_MODEL_TIMEOUT, model.predict_sequence(&tokens)).await {
                Ok(Ok(value)) => Some(value),
                Ok(Err(e)) => {
                    warn!(backend = "anomaly_model", entity_key = %target.entity_id, error = %e, "sequence prediction failed");
                    None
                }
                Err(_) => {
                    warn!(backend = "anomaly_model", entity_key = %target.entity_id, "sequence prediction timed out");
                    None
                }
            }
        };

        (anomaly, sequence, None)
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    #[tokio::test]
    async fn score_without_collaborators_uses_single_point_only() {
        let scorer = Scorer::new();
        let entity = Entity::new(EntityType::Device, "host-1");
        let (score, warning) = scorer.score(&entity, &[]).await;

        assert_eq!(score, super::super::indicators::base_score(EntityType::Device));
        assert!(warning.is_none());
    }

    #[tokio::test]
    async fn score_blends_single_and_multi_point_when_neighbors_present() {
        let scorer = Scorer::new();
        let mut target = Entity::new(EntityType::User, "alice");
        target.add_metadata("anomaly_type", "login_anomaly");
        let neighbor = Entity::new(EntityType::Device, "host-1");

        let (score, _) = scorer.score(&target, &[&neighbor]).await;
        assert!((0.0..=100.0).contains(&score));
    }
}

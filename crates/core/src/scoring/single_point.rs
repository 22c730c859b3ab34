use super::indicators::{anomaly_behavior, base_score, blacklist_match, per_type_indicators, threat_intel_match, Indicator};
use crate::entity::Entity;

/// `100 / (1 + exp(-(raw-50)/20))`, clamped to `[0,100]` (SPEC_FULL.md §4.3.1).
pub fn sigmoid_normalize(raw: f64) -> f64 {
    let value = 100.0 / (1.0 + (-(raw - 50.0) / 20.0).exp());
    value.clamp(0.0, 100.0)
}

/// Computes the single-point score for one entity given the indicators
/// that fired. `ml_anomaly_score` is the optional ML-model contribution to
/// `anomaly_behavior` (SPEC_FULL.md §4.3.4); pass `None` when no anomaly
/// model is wired.
pub fn single_point_score(entity: &Entity, ml_anomaly_score: Option<f64>) -> f64 {
    let base = base_score(entity.entity_type);

    let mut indicators: Vec<Indicator> = Vec::new();
    indicators.extend(threat_intel_match(entity));
    indicators.extend(anomaly_behavior(entity, ml_anomaly_score));
    indicators.extend(blacklist_match(entity));
    indicators.extend(per_type_indicators(entity));

    if indicators.is_empty() {
        return base;
    }

    let weight_sum: f64 = indicators.iter().map(|i| i.weight).sum();
    let weighted_avg = if weight_sum > 0.0 {
        indicators.iter().map(|i| i.weight * i.value * 100.0).sum::<f64>() / weight_sum
    } else {
        0.0
    };

    let raw = base + 0.8 * weighted_avg;
    sigmoid_normalize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    #[test]
    fn no_indicators_returns_base_score() {
        let entity = Entity::new(EntityType::Device, "host-1");
        assert_eq!(single_point_score(&entity, None), base_score(EntityType::Device));
    }

    #[test]
    fn blacklisted_entity_scores_high() {
        let mut entity = Entity::new(EntityType::Domain, "bad.example");
        entity.add_metadata("note", "flagged as malicious");
        let score = single_point_score(&entity, None);
        assert!(score > base_score(EntityType::Domain));
        assert!((0.0..=100.0).contains(&score));
    }
}

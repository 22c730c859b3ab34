use crate::entity::{Entity, TimelineEvent};
use std::collections::HashSet;

/// The four hard-coded attack sequences scored by `sequence_correlation`
/// (SPEC_FULL.md §4.3.2).
const ATTACK_SEQUENCES: &[&[&str]] = &[
    &["login_anomaly", "privilege_escalation", "lateral_movement"],
    &["malware", "process_injection", "network_anomaly"],
    &["phishing", "credential_theft", "data_exfiltration"],
    &["vulnerability_exploit", "backdoor", "persistence"],
];

fn entity_timestamps(entity: &Entity) -> Vec<chrono::DateTime<chrono::Utc>> {
    let mut timestamps = Vec::new();
    for event in &entity.timeline {
        let ts = match event {
            TimelineEvent::StatusChange { timestamp, .. } => *timestamp,
            TimelineEvent::RiskScoreUpdate { timestamp, .. } => *timestamp,
            TimelineEvent::MetadataUpdate { timestamp, .. } => *timestamp,
        };
        timestamps.push(ts);
    }
    for connection in &entity.connections {
        timestamps.push(connection.timestamp);
    }
    timestamps
}

/// Higher when events cluster in time; 0 if fewer than 2 timestamps
/// (SPEC_FULL.md §4.3.2).
pub fn time_correlation(target: &Entity, neighbors: &[&Entity]) -> f64 {
    let mut timestamps: Vec<chrono::DateTime<chrono::Utc>> = entity_timestamps(target);
    for neighbor in neighbors {
        timestamps.extend(entity_timestamps(neighbor));
    }
    timestamps.sort();

    if timestamps.len() < 2 {
        return 0.0;
    }

    let deltas: Vec<f64> = timestamps
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_milliseconds() as f64 / 1000.0)
        .collect();

    let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
    let variance = deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / deltas.len() as f64;

    1.0 / (1.0 + variance.sqrt() / 3600.0)
}

/// `0.7*connectivity + 0.3*diversity` over the target plus its neighbor set
/// (SPEC_FULL.md §4.3.2).
pub fn graph_correlation(target: &Entity, neighbors: &[&Entity]) -> f64 {
    let mut set: Vec<&Entity> = vec![target];
    set.extend(neighbors.iter().copied());

    let n = set.len();
    if n < 2 {
        return 0.0;
    }

    let keys: HashSet<(crate::entity::EntityType, String)> = set.iter().map(|e| e.key()).collect();

    let mut seen_pairs: HashSet<((crate::entity::EntityType, String), (crate::entity::EntityType, String))> = HashSet::new();
    for entity in &set {
        let from = entity.key();
        for connection in &entity.connections {
            let to = connection.target_key();
            if keys.contains(&to) {
                let pair = if from <= to { (from.clone(), to.clone()) } else { (to.clone(), from.clone()) };
                seen_pairs.insert(pair);
            }
        }
    }

    let possible = (n * (n - 1) / 2).max(1) as f64;
    let connectivity = seen_pairs.len() as f64 / possible;

    let distinct_types: HashSet<_> = set.iter().map(|e| e.entity_type).collect();
    let diversity = (distinct_types.len() as f64 / 4.0).min(1.0);

    0.7 * connectivity + 0.3 * diversity
}

fn behavior_tags(target: &Entity, neighbors: &[&Entity]) -> HashSet<String> {
    let mut tags = HashSet::new();
    let mut all = vec![target];
    all.extend(neighbors.iter().copied());

    for entity in &all {
        if let Some(anomaly_type) = entity.metadata.get("anomaly_type").and_then(|v| v.as_str()) {
            tags.insert(anomaly_type.to_string());
        }
        for connection in &entity.connections {
            if connection.relationship.contains("ANOMALY") || connection.relationship.contains("THREAT") {
                tags.insert(connection.relationship.clone());
            }
        }
    }

    tags
}

/// Scores the target/neighbor set against four hard-coded attack sequences
/// and takes the max `matchedTokens/3`; optionally blended with an ML
/// sequence-model score (SPEC_FULL.md §4.3.2, §4.3.4).
pub fn sequence_correlation(target: &Entity, neighbors: &[&Entity], ml_sequence_score: Option<f64>) -> f64 {
    let tags = behavior_tags(target, neighbors);

    let best_static = ATTACK_SEQUENCES
        .iter()
        .map(|sequence| {
            let matched = sequence.iter().filter(|token| tags.iter().any(|tag| tag.contains(*token))).count();
            matched as f64 / 3.0
        })
        .fold(0.0_f64, f64::max);

    match ml_sequence_score {
        Some(ml) => best_static.max(ml),
        None => best_static,
    }
}

/// Combines the three sub-scores with weights time 0.30, graph 0.35,
/// sequence 0.35 (SPEC_FULL.md §4.3.2). Returns `0.0` (not computed) when
/// `neighbors` is empty, per the pipeline's "only when at least one
/// neighbor is supplied" gate.
pub fn multi_point_score(target: &Entity, neighbors: &[&Entity], ml_sequence_score: Option<f64>) -> f64 {
    if neighbors.is_empty() {
        return 0.0;
    }

    let time = time_correlation(target, neighbors);
    let graph = graph_correlation(target, neighbors);
    let sequence = sequence_correlation(target, neighbors, ml_sequence_score);

    (0.30 * time + 0.35 * graph + 0.35 * sequence) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    #[test]
    fn no_neighbors_yields_zero() {
        let entity = Entity::new(EntityType::Ip, "1.2.3.4");
        assert_eq!(multi_point_score(&entity, &[], None), 0.0);
    }

    #[test]
    fn time_correlation_needs_two_timestamps() {
        let entity = Entity::new(EntityType::Ip, "1.2.3.4");
        let neighbor = Entity::new(EntityType::User, "alice");
        assert_eq!(time_correlation(&entity, &[&neighbor]), 0.0);
    }

    #[test]
    fn sequence_correlation_matches_known_chain() {
        let mut target = Entity::new(EntityType::User, "alice");
        target.add_metadata("anomaly_type", "login_anomaly");
        let mut neighbor = Entity::new(EntityType::Device, "host-1");
        neighbor.add_metadata("anomaly_type", "privilege_escalation");

        let score = sequence_correlation(&target, &[&neighbor], None);
        assert!(score > 0.0);
    }
}

use super::types::{EntityStatus, EntityType, ThreatLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical `(entity_type, entity_id)` pair used for dedup, edge targets,
/// and arena lookups (SPEC_FULL.md §3 invariant 1, §3.1).
pub type EntityKey = (EntityType, String);

/// One edge out of an entity. `target_index` is a resolved-position cache
/// into the owning `Event`'s entity arena, populated when the edge is
/// created; `target_type`/`target_id` remain the source of truth if the
/// cache is ever stale (SPEC_FULL.md §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub target_type: EntityType,
    pub target_id: String,
    pub relationship: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(skip)]
    pub target_index: Option<usize>,
}

impl Connection {
    pub fn new(
        target_type: EntityType,
        target_id: impl Into<String>,
        relationship: impl Into<String>,
    ) -> Self {
        Self {
            target_type,
            target_id: target_id.into(),
            relationship: relationship.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
            target_index: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_target_index(mut self, index: usize) -> Self {
        self.target_index = Some(index);
        self
    }

    pub fn target_key(&self) -> EntityKey {
        (self.target_type, self.target_id.clone())
    }

    /// The `REVERSE_` relationship name written on the target endpoint
    /// (SPEC_FULL.md §3 invariant 2).
    pub fn reverse_relationship(&self) -> String {
        format!("REVERSE_{}", self.relationship)
    }
}

/// One append-only entry in an entity's timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TimelineEvent {
    StatusChange {
        old_status: EntityStatus,
        new_status: EntityStatus,
        timestamp: DateTime<Utc>,
        reason: String,
    },
    RiskScoreUpdate {
        old_score: f64,
        new_score: f64,
        threat_level: ThreatLevel,
        timestamp: DateTime<Utc>,
        reason: String,
    },
    MetadataUpdate {
        key: String,
        value: serde_json::Value,
        timestamp: DateTime<Utc>,
    },
}

/// A recognized or discovered security entity within one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub status: EntityStatus,
    pub risk_score: f64,
    pub threat_level: ThreatLevel,
    pub connections: Vec<Connection>,
    pub timeline: Vec<TimelineEvent>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub confidence: f64,
}

impl Entity {
    pub fn new(entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            entity_type,
            entity_id: entity_id.into(),
            status: EntityStatus::Pending,
            risk_score: 0.0,
            threat_level: ThreatLevel::Low,
            connections: Vec::new(),
            timeline: Vec::new(),
            metadata: HashMap::new(),
            first_seen: now,
            last_seen: now,
            confidence: 1.0,
        }
    }

    pub fn key(&self) -> EntityKey {
        (self.entity_type, self.entity_id.clone())
    }

    pub fn add_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    pub fn update_status(&mut self, new_status: EntityStatus, reason: impl Into<String>) {
        let old_status = self.status;
        self.status = new_status;
        self.timeline.push(TimelineEvent::StatusChange {
            old_status,
            new_status,
            timestamp: Utc::now(),
            reason: reason.into(),
        });
    }

    /// Updates the score and recomputes `threat_level` from it, recording
    /// both in the timeline (SPEC_FULL.md §3 invariant 3).
    pub fn update_risk_score(&mut self, new_score: f64, reason: impl Into<String>) {
        let old_score = self.risk_score;
        self.risk_score = new_score;
        self.threat_level = ThreatLevel::from_score(new_score);
        self.timeline.push(TimelineEvent::RiskScoreUpdate {
            old_score,
            new_score,
            threat_level: self.threat_level,
            timestamp: Utc::now(),
            reason: reason.into(),
        });
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        let key = key.into();
        let value = value.into();
        self.metadata.insert(key.clone(), value.clone());
        self.timeline.push(TimelineEvent::MetadataUpdate {
            key,
            value,
            timestamp: Utc::now(),
        });
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_risk_score_syncs_threat_level_and_timeline() {
        let mut entity = Entity::new(EntityType::Ip, "10.0.0.5");
        entity.update_risk_score(95.0, "brute force pattern");

        assert_eq!(entity.risk_score, 95.0);
        assert_eq!(entity.threat_level, ThreatLevel::Critical);
        assert_eq!(entity.timeline.len(), 1);
    }

    #[test]
    fn connection_reverse_relationship_is_prefixed() {
        let conn = Connection::new(EntityType::User, "alice", "accessed_by");
        assert_eq!(conn.reverse_relationship(), "REVERSE_accessed_by");
    }

    #[test]
    fn entity_key_matches_type_and_id() {
        let entity = Entity::new(EntityType::Domain, "example.com");
        assert_eq!(entity.key(), (EntityType::Domain, "example.com".to_string()));
    }
}

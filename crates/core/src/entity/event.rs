use super::entity::{Connection, Entity, EntityKey};
use super::types::EntityType;
use crate::response::ActionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A security event: the unit of work submitted to `Pipeline::analyze`.
/// Owns its entities in a flat arena (SPEC_FULL.md §3.1) to avoid the
/// reference cycles a naive entity-owns-entity graph would require.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub entities: Vec<Entity>,
    pub raw_data: serde_json::Value,
    pub processed: bool,
    pub risk_score: f64,
}

impl Event {
    pub fn new(event_type: impl Into<String>, raw_data: serde_json::Value) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            entities: Vec::new(),
            raw_data,
            processed: false,
            risk_score: 0.0,
        }
    }

    pub fn find_index(&self, key: &EntityKey) -> Option<usize> {
        self.entities
            .iter()
            .position(|e| e.entity_type == key.0 && e.entity_id == key.1)
    }

    /// Inserts `entity` if its key is new, otherwise returns the existing
    /// index unchanged (SPEC_FULL.md §3 invariant 1: dedup within one event).
    pub fn upsert_entity(&mut self, entity: Entity) -> usize {
        let key = entity.key();
        if let Some(index) = self.find_index(&key) {
            index
        } else {
            self.entities.push(entity);
            self.entities.len() - 1
        }
    }

    /// Wires a bidirectional edge between two already-present entities,
    /// writing the forward relationship on `from` and the `REVERSE_`
    /// relationship on `to` (SPEC_FULL.md §3 invariant 2).
    pub fn add_edge(&mut self, from: usize, to: usize, relationship: impl Into<String>) {
        if from == to || from >= self.entities.len() || to >= self.entities.len() {
            return;
        }

        let relationship = relationship.into();
        let to_key = self.entities[to].key();
        let from_key = self.entities[from].key();

        let forward = Connection::new(to_key.0, to_key.1, relationship.clone()).with_target_index(to);
        let reverse_name = forward.reverse_relationship();
        self.entities[from].add_connection(forward);

        let backward = Connection::new(from_key.0, from_key.1, reverse_name).with_target_index(from);
        self.entities[to].add_connection(backward);
    }

    pub fn max_entity_score(&self) -> f64 {
        self.entities
            .iter()
            .map(|e| e.risk_score)
            .fold(0.0_f64, f64::max)
    }

    pub fn high_risk_entities(&self) -> Vec<&Entity> {
        self.entities.iter().filter(|e| e.risk_score >= 70.0).collect()
    }

    pub fn entity_by_type(&self, entity_type: EntityType) -> Vec<&Entity> {
        self.entities.iter().filter(|e| e.entity_type == entity_type).collect()
    }
}

/// Overall outcome of `Analyze`/`BatchAnalyze`. `"error"` only occurs when an
/// unexpected exception escapes a stage boundary (SPEC_FULL.md §7); absorbed
/// per-branch failures never change the status away from `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Completed,
    Error,
}

/// Aggregate counters reported alongside the full entity/response detail
/// (SPEC_FULL.md §4.5 step 7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub entities_extracted: usize,
    pub max_risk_score: f64,
    pub responses_executed: usize,
    pub high_risk_entities: usize,
}

/// Full result of one `Analyze` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResult {
    pub event_id: Uuid,
    pub status: EventStatus,
    pub processing_time_ms: u64,
    pub summary: Summary,
    pub entities: Vec<Entity>,
    pub response_results: Vec<ActionResult>,
    pub event: Event,
    pub warnings: Vec<String>,
}

impl EventResult {
    pub fn from_event(event: Event, processing_time_ms: u64, response_results: Vec<ActionResult>, warnings: Vec<String>) -> Self {
        let summary = Summary {
            entities_extracted: event.entities.len(),
            max_risk_score: event.max_entity_score(),
            responses_executed: response_results.len(),
            high_risk_entities: event.high_risk_entities().len(),
        };

        Self {
            event_id: event.event_id,
            status: EventStatus::Completed,
            processing_time_ms,
            summary,
            entities: event.entities.clone(),
            response_results,
            event,
            warnings,
        }
    }

    pub fn error(event: Event, processing_time_ms: u64, message: impl Into<String>) -> Self {
        let summary = Summary {
            entities_extracted: event.entities.len(),
            max_risk_score: event.max_entity_score(),
            responses_executed: 0,
            high_risk_entities: event.high_risk_entities().len(),
        };

        Self {
            event_id: event.event_id,
            status: EventStatus::Error,
            processing_time_ms,
            summary,
            entities: event.entities.clone(),
            response_results: Vec::new(),
            event,
            warnings: vec![message.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::entity::Entity;
    use crate::entity::types::EntityType;

    #[test]
    fn upsert_entity_dedupes_by_key() {
        let mut event = Event::new("login", serde_json::json!({}));
        let a = event.upsert_entity(Entity::new(EntityType::Ip, "1.2.3.4"));
        let b = event.upsert_entity(Entity::new(EntityType::Ip, "1.2.3.4"));
        assert_eq!(a, b);
        assert_eq!(event.entities.len(), 1);
    }

    #[test]
    fn add_edge_writes_both_directions() {
        let mut event = Event::new("login", serde_json::json!({}));
        let ip = event.upsert_entity(Entity::new(EntityType::Ip, "1.2.3.4"));
        let user = event.upsert_entity(Entity::new(EntityType::User, "alice"));
        event.add_edge(ip, user, "authenticated_as");

        assert_eq!(event.entities[ip].connections.len(), 1);
        assert_eq!(event.entities[user].connections.len(), 1);
        assert_eq!(event.entities[ip].connections[0].relationship, "authenticated_as");
        assert_eq!(
            event.entities[user].connections[0].relationship,
            "REVERSE_authenticated_as"
        );
    }

    #[test]
    fn max_entity_score_is_zero_for_empty_event() {
        let event = Event::new("noop", serde_json::json!({}));
        assert_eq!(event.max_entity_score(), 0.0);
    }
}

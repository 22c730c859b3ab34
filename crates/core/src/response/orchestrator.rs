use super::action::{ActionResult, ActionStatus, ResponseAction};
use super::effector::{AlertOutEffector, DirectoryEffector, Effector, EndpointEffector, NetworkBlockEffector};
use crate::entity::{Entity, EntityStatus};
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::warn;

const EFFECTOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Stage 4 of the pipeline. Picks response actions from the policy table
/// and dispatches them concurrently through registered effectors
/// (SPEC_FULL.md §4.4).
pub struct ResponseOrchestrator {
    effectors: RwLock<Vec<Arc<dyn Effector>>>,
}

impl ResponseOrchestrator {
    /// Registers the four built-in effectors (SPEC_FULL.md §4.4.2).
    pub fn with_builtin_effectors() -> Self {
        let orchestrator = Self {
            effectors: RwLock::new(Vec::new()),
        };
        orchestrator.register_effector_sync(Arc::new(NetworkBlockEffector));
        orchestrator.register_effector_sync(Arc::new(DirectoryEffector));
        orchestrator.register_effector_sync(Arc::new(EndpointEffector));
        orchestrator.register_effector_sync(Arc::new(AlertOutEffector));
        orchestrator
    }

    fn register_effector_sync(&self, effector: Arc<dyn Effector>) {
        self.effectors.try_write().expect("no concurrent access during construction").push(effector);
    }

    /// Additive to the four built-ins (SPEC_FULL.md §4.4.5): lets embedders
    /// plug in extra effectors without forking the orchestrator.
    pub async fn register_effector(&self, effector: Arc<dyn Effector>) {
        self.effectors.write().await.push(effector);
    }

    pub async fn unregister_effector(&self, name: &str) -> bool {
        let mut effectors = self.effectors.write().await;
        let before = effectors.len();
        effectors.retain(|e| e.name() != name);
        effectors.len() != before
    }

    pub async fn effector_status(&self) -> Vec<String> {
        self.effectors.read().await.iter().map(|e| e.name().to_string()).collect()
    }

    /// Dispatches `actions` against `entity` concurrently, then updates the
    /// entity's status from the successful action set (SPEC_FULL.md §4.4.3,
    /// §4.4.4).
    pub async fn dispatch(&self, entity: &mut Entity, actions: Vec<ResponseAction>) -> Vec<ActionResult> {
        let effectors = self.effectors.read().await.clone();

        let futures = actions.into_iter().map(|action| {
            let effectors = effectors.clone();
            let entity_snapshot = entity.clone();
            async move { Self::run_one(&effectors, &entity_snapshot, action).await }
        });

        let results: Vec<ActionResult> = join_all(futures).await;

        let success_actions: Vec<ResponseAction> = results
            .iter()
            .filter(|r| r.status == ActionStatus::Success)
            .map(|r| r.action)
            .collect();

        let new_status = Self::status_from_successes(&success_actions);
        if let Some(status) = new_status {
            let reason = format!(
                "{} action(s) attempted, {} succeeded",
                results.len(),
                success_actions.len()
            );
            entity.update_status(status, reason);
        }

        results
    }

    fn status_from_successes(successes: &[ResponseAction]) -> Option<EntityStatus> {
        for action in successes {
            match action {
                ResponseAction::BlockIp => return Some(EntityStatus::Blocked),
                ResponseAction::DisableUser => return Some(EntityStatus::BleedingStop),
                ResponseAction::QuarantineFile => return Some(EntityStatus::Blocked),
                ResponseAction::IsolateHost => return Some(EntityStatus::Blocked),
                _ => continue,
            }
        }
        if successes.is_empty() {
            None
        } else {
            Some(EntityStatus::Investigated)
        }
    }

    async fn run_one(effectors: &[Arc<dyn Effector>], entity: &Entity, action: ResponseAction) -> ActionResult {
        let start = Instant::now();
        let timestamp = Utc::now();

        let effector = effectors.iter().find(|e| e.can_handle(entity.entity_type, action));

        let Some(effector) = effector else {
            return ActionResult {
                action,
                status: ActionStatus::Failed,
                message: "no suitable effector".to_string(),
                effector: "none".to_string(),
                execution_time_ms: start.elapsed().as_millis() as u64,
                timestamp,
            };
        };

        let params: HashMap<String, serde_json::Value> = HashMap::new();
        let outcome = timeout(EFFECTOR_TIMEOUT, effector.execute(entity, action, &params)).await;

        let (status, message) = match outcome {
            Ok(Ok((true, message))) => (ActionStatus::Success, message),
            Ok(Ok((false, message))) => (ActionStatus::Failed, message),
            Ok(Err(e)) => {
                warn!(effector = effector.name(), entity_key = %entity.entity_id, action = %action, error = %e, "effector execution failed");
                (ActionStatus::Failed, e.to_warning_string())
            }
            Err(_) => {
                warn!(effector = effector.name(), entity_key = %entity.entity_id, action = %action, "effector execution timed out");
                (ActionStatus::Timeout, format!("{} timed out", effector.name()))
            }
        };

        ActionResult {
            action,
            status,
            message,
            effector: effector.name().to_string(),
            execution_time_ms: start.elapsed().as_millis() as u64,
            timestamp,
        }
    }
}

impl Default for ResponseOrchestrator {
    fn default() -> Self {
        Self::with_builtin_effectors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    #[tokio::test]
    async fn dispatch_block_ip_updates_status_to_blocked() {
        let orchestrator = ResponseOrchestrator::with_builtin_effectors();
        let mut entity = Entity::new(EntityType::Ip, "1.2.3.4");

        let results = orchestrator.dispatch(&mut entity, vec![ResponseAction::BlockIp]).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ActionStatus::Success);
        assert_eq!(entity.status, EntityStatus::Blocked);
    }

    #[tokio::test]
    async fn unsupported_action_reports_no_suitable_effector() {
        let orchestrator = ResponseOrchestrator::with_builtin_effectors();
        let mut entity = Entity::new(EntityType::Domain, "example.com");

        let results = orchestrator.dispatch(&mut entity, vec![ResponseAction::BlockIp]).await;

        assert_eq!(results[0].status, ActionStatus::Failed);
        assert_eq!(results[0].message, "no suitable effector");
    }

    #[tokio::test]
    async fn register_and_unregister_effector() {
        let orchestrator = ResponseOrchestrator::with_builtin_effectors();
        let before = orchestrator.effector_status().await.len();

        orchestrator.register_effector(Arc::new(NetworkBlockEffector)).await;
        assert_eq!(orchestrator.effector_status().await.len(), before + 1);

        assert!(orchestrator.unregister_effector("network_block").await);
    }
}

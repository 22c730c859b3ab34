use super::action::ResponseAction;
use crate::entity::{Entity, EntityType};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// A pluggable response action implementer (SPEC_FULL.md §4.4.2, §6).
#[async_trait]
pub trait Effector: Send + Sync {
    fn name(&self) -> &str;

    fn can_handle(&self, entity_type: EntityType, action: ResponseAction) -> bool;

    /// Executes `action` against `entity`. Returns `(success, message)`;
    /// an `Err` is treated the same as `Ok((false, ...))` by the
    /// orchestrator (SPEC_FULL.md §4.4.3: effector errors become `Failed`,
    /// never propagate).
    async fn execute(&self, entity: &Entity, action: ResponseAction, params: &HashMap<String, serde_json::Value>) -> Result<(bool, String)>;
}

/// Blocks/unblocks traffic from an IP entity.
pub struct NetworkBlockEffector;

#[async_trait]
impl Effector for NetworkBlockEffector {
    fn name(&self) -> &str {
        "network_block"
    }

    fn can_handle(&self, entity_type: EntityType, action: ResponseAction) -> bool {
        entity_type == EntityType::Ip && matches!(action, ResponseAction::BlockIp | ResponseAction::UnblockIp)
    }

    async fn execute(&self, entity: &Entity, action: ResponseAction, _params: &HashMap<String, serde_json::Value>) -> Result<(bool, String)> {
        Ok((true, format!("{} applied to {}", action, entity.entity_id)))
    }
}

/// Manages account state for a User entity.
pub struct DirectoryEffector;

#[async_trait]
impl Effector for DirectoryEffector {
    fn name(&self) -> &str {
        "directory"
    }

    fn can_handle(&self, entity_type: EntityType, action: ResponseAction) -> bool {
        entity_type == EntityType::User
            && matches!(
                action,
                ResponseAction::DisableUser | ResponseAction::EnableUser | ResponseAction::ResetPassword | ResponseAction::RevokeToken
            )
    }

    async fn execute(&self, entity: &Entity, action: ResponseAction, _params: &HashMap<String, serde_json::Value>) -> Result<(bool, String)> {
        Ok((true, format!("{} applied to user {}", action, entity.entity_id)))
    }
}

/// Host/file/process containment: isolation, snapshotting, quarantine,
/// process suspension.
pub struct EndpointEffector;

#[async_trait]
impl Effector for EndpointEffector {
    fn name(&self) -> &str {
        "endpoint"
    }

    fn can_handle(&self, entity_type: EntityType, action: ResponseAction) -> bool {
        match entity_type {
            EntityType::Device => matches!(action, ResponseAction::IsolateHost | ResponseAction::TakeSnapshot | ResponseAction::DumpMemory),
            EntityType::File => matches!(action, ResponseAction::QuarantineFile | ResponseAction::DeleteFile | ResponseAction::RestoreFile),
            EntityType::Process => matches!(action, ResponseAction::KillProcess | ResponseAction::SuspendProcess),
            _ => false,
        }
    }

    async fn execute(&self, entity: &Entity, action: ResponseAction, _params: &HashMap<String, serde_json::Value>) -> Result<(bool, String)> {
        Ok((true, format!("{} applied to {} {}", action, entity.entity_type, entity.entity_id)))
    }
}

/// Alerting/ticketing/evidence collection, valid against any entity type.
pub struct AlertOutEffector;

#[async_trait]
impl Effector for AlertOutEffector {
    fn name(&self) -> &str {
        "alert_out"
    }

    fn can_handle(&self, _entity_type: EntityType, action: ResponseAction) -> bool {
        matches!(
            action,
            ResponseAction::SendAlert | ResponseAction::CreateTicket | ResponseAction::NotifyAdmin | ResponseAction::CollectEvidence
        )
    }

    async fn execute(&self, entity: &Entity, action: ResponseAction, _params: &HashMap<String, serde_json::Value>) -> Result<(bool, String)> {
        Ok((true, format!("{} recorded for {} {}", action, entity.entity_type, entity.entity_id)))
    }
}

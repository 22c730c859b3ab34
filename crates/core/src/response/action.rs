use serde::{Deserialize, Serialize};
use std::fmt;

/// A response action the orchestrator can dispatch (SPEC_FULL.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseAction {
    BlockIp,
    UnblockIp,
    IsolateHost,
    DisableUser,
    EnableUser,
    ResetPassword,
    RevokeToken,
    QuarantineFile,
    DeleteFile,
    RestoreFile,
    KillProcess,
    SuspendProcess,
    SendAlert,
    CreateTicket,
    NotifyAdmin,
    CollectEvidence,
    TakeSnapshot,
    DumpMemory,
}

impl ResponseAction {
    /// Dispatch priority; lower runs earlier in logs/ordering (SPEC_FULL.md §4.4.1).
    /// All selected actions still launch concurrently — this only orders
    /// how results are reported.
    pub fn priority(self) -> u8 {
        match self {
            ResponseAction::BlockIp | ResponseAction::IsolateHost => 1,
            ResponseAction::DisableUser | ResponseAction::KillProcess => 2,
            ResponseAction::QuarantineFile => 3,
            ResponseAction::SendAlert => 4,
            ResponseAction::CreateTicket | ResponseAction::NotifyAdmin => 5,
            ResponseAction::CollectEvidence => 6,
            _ => 7,
        }
    }
}

impl fmt::Display for ResponseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResponseAction::BlockIp => "block_ip",
            ResponseAction::UnblockIp => "unblock_ip",
            ResponseAction::IsolateHost => "isolate_host",
            ResponseAction::DisableUser => "disable_user",
            ResponseAction::EnableUser => "enable_user",
            ResponseAction::ResetPassword => "reset_password",
            ResponseAction::RevokeToken => "revoke_token",
            ResponseAction::QuarantineFile => "quarantine_file",
            ResponseAction::DeleteFile => "delete_file",
            ResponseAction::RestoreFile => "restore_file",
            ResponseAction::KillProcess => "kill_process",
            ResponseAction::SuspendProcess => "suspend_process",
            ResponseAction::SendAlert => "send_alert",
            ResponseAction::CreateTicket => "create_ticket",
            ResponseAction::NotifyAdmin => "notify_admin",
            ResponseAction::CollectEvidence => "collect_evidence",
            ResponseAction::TakeSnapshot => "take_snapshot",
            ResponseAction::DumpMemory => "dump_memory",
        };
        write!(f, "{}", s)
    }
}

/// Outcome status of one dispatched action (SPEC_FULL.md §4.4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Executing,
    Success,
    Failed,
    Timeout,
    Cancelled,
}

/// Result of one dispatched action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub action: ResponseAction,
    pub status: ActionStatus,
    pub message: String,
    pub effector: String,
    pub execution_time_ms: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Threshold → action-list policy table (SPEC_FULL.md §4.4.1). Selection
/// picks the highest threshold `<= score`.
pub fn actions_for_score(score: f64) -> Vec<ResponseAction> {
    use ResponseAction::*;

    let mut actions = if score >= 95.0 {
        vec![BlockIp, DisableUser, IsolateHost, SendAlert, CreateTicket, NotifyAdmin, CollectEvidence]
    } else if score >= 85.0 {
        vec![BlockIp, SendAlert, CreateTicket, NotifyAdmin]
    } else if score >= 70.0 {
        vec![SendAlert, CreateTicket, CollectEvidence]
    } else if score >= 50.0 {
        vec![SendAlert, CollectEvidence]
    } else if score >= 30.0 {
        vec![SendAlert]
    } else {
        Vec::new()
    };

    actions.sort_by_key(|a| a.priority());
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_highest_threshold_at_or_below_score() {
        assert!(actions_for_score(29.9).is_empty());
        assert_eq!(actions_for_score(30.0), vec![ResponseAction::SendAlert]);
        assert_eq!(
            actions_for_score(95.0),
            vec![
                ResponseAction::BlockIp,
                ResponseAction::IsolateHost,
                ResponseAction::DisableUser,
                ResponseAction::SendAlert,
                ResponseAction::CreateTicket,
                ResponseAction::NotifyAdmin,
                ResponseAction::CollectEvidence,
            ]
        );
    }

    #[test]
    fn actions_ordered_by_priority() {
        let actions = actions_for_score(85.0);
        assert_eq!(actions[0], ResponseAction::BlockIp);
    }
}

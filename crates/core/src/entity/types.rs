use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of thing a security entity represents. Hash values are modeled
/// as `File` entities carrying an `is_hash` metadata flag rather than as a
/// distinct variant (SPEC_FULL.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Ip,
    User,
    File,
    Process,
    Device,
    Domain,
    Email,
    Url,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityType::Ip => "ip",
            EntityType::User => "user",
            EntityType::File => "file",
            EntityType::Process => "process",
            EntityType::Device => "device",
            EntityType::Domain => "domain",
            EntityType::Email => "email",
            EntityType::Url => "url",
        };
        write!(f, "{}", s)
    }
}

/// Investigation lifecycle of an entity within one event. Transitions are
/// append-only to the owning entity's timeline; the core never rewinds a
/// status, only adds to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Pending,
    Investigated,
    Scored,
    Compromised,
    Blocked,
    BleedingStop,
    Whitelisted,
}

impl Default for EntityStatus {
    fn default() -> Self {
        EntityStatus::Pending
    }
}

impl EntityStatus {
    /// Whitelisted and Blocked are sink-ish: once set, response dispatch is
    /// skipped for that entity on subsequent cycles (SPEC_FULL.md §3 invariant 5).
    pub fn suppresses_response(self) -> bool {
        matches!(self, EntityStatus::Whitelisted | EntityStatus::Blocked)
    }
}

/// Threat band derived from `risk_score`. Never set directly; always
/// recomputed from the score by `Entity::update_risk_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    /// `<40 Low, <70 Medium, <90 High, >=90 Critical` (SPEC_FULL.md §3).
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            ThreatLevel::Critical
        } else if score >= 70.0 {
            ThreatLevel::High
        } else if score >= 40.0 {
            ThreatLevel::Medium
        } else {
            ThreatLevel::Low
        }
    }
}

impl Default for ThreatLevel {
    fn default() -> Self {
        ThreatLevel::Low
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
            ThreatLevel::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threat_level_boundaries() {
        assert_eq!(ThreatLevel::from_score(0.0), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_score(39.9), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_score(40.0), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(69.9), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(70.0), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_score(89.9), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_score(90.0), ThreatLevel::Critical);
        assert_eq!(ThreatLevel::from_score(100.0), ThreatLevel::Critical);
    }

    #[test]
    fn sink_statuses_suppress_response() {
        assert!(EntityStatus::Blocked.suppresses_response());
        assert!(EntityStatus::Whitelisted.suppresses_response());
        assert!(!EntityStatus::Scored.suppresses_response());
    }
}

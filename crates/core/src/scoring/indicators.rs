use crate::entity::{Entity, EntityType};

/// One scoring indicator: a `[0,1]` value paired with the weight it
/// contributes to the single-point average (SPEC_FULL.md §4.3.1).
#[derive(Debug, Clone, Copy)]
pub struct Indicator {
    pub weight: f64,
    pub value: f64,
}

/// `threatType → severity/100` (SPEC_FULL.md §4.3.1).
pub fn threat_severity(threat_type: &str) -> f64 {
    let points: f64 = match threat_type {
        "malware" => 90.0,
        "botnet" => 85.0,
        "apt" => 95.0,
        "phishing" => 70.0,
        "ransomware" => 95.0,
        "trojan" => 80.0,
        "backdoor" => 85.0,
        "spyware" => 75.0,
        "adware" => 30.0,
        "suspicious" => 50.0,
        _ => 0.0,
    };
    points / 100.0
}

/// `anomalyType → behavior-pattern score/100` (SPEC_FULL.md §4.3.1).
/// Unmatched types default to 50 rather than 0 — an unrecognized anomaly
/// type is still an anomaly.
pub fn behavior_pattern_score(anomaly_type: &str) -> f64 {
    let points: f64 = match anomaly_type {
        "login_anomaly" => 60.0,
        "file_access_anomaly" => 55.0,
        "network_anomaly" => 65.0,
        "process_anomaly" => 70.0,
        "privilege_escalation" => 85.0,
        "lateral_movement" => 80.0,
        "data_exfiltration" => 90.0,
        "command_injection" => 85.0,
        "sql_injection" => 80.0,
        "xss" => 60.0,
        "brute_force" => 70.0,
        _ => 50.0,
    };
    points / 100.0
}

/// Weight a per-type single-point indicator contributes to the weighted
/// average, keyed by indicator name (SPEC_FULL.md §4.3.1a). Matches the
/// ground truth's `single_point_weights` table: most per-type indicators
/// aren't named in it and fall back to the default weight of 0.1, except
/// `privilege_escalation`/`lateral_movement` which carry 0.20.
fn single_point_weight(indicator: &str) -> f64 {
    match indicator {
        "privilege_escalation" | "lateral_movement" => 0.20,
        _ => 0.1,
    }
}

pub fn base_score(entity_type: EntityType) -> f64 {
    match entity_type {
        EntityType::Ip => 20.0,
        EntityType::User => 15.0,
        EntityType::File => 25.0,
        EntityType::Process => 20.0,
        EntityType::Device => 10.0,
        EntityType::Domain => 30.0,
        EntityType::Email => 15.0,
        EntityType::Url => 25.0,
    }
}

fn metadata_flag(entity: &Entity, key: &str) -> bool {
    entity.metadata.get(key).map(|v| v.as_bool().unwrap_or(!v.is_null())).unwrap_or(false)
}

fn metadata_str<'a>(entity: &'a Entity, key: &str) -> Option<&'a str> {
    entity.metadata.get(key).and_then(|v| v.as_str())
}

/// `threat_intel_match` — max severity across matched threat types, times
/// confidence, weight 0.35.
pub fn threat_intel_match(entity: &Entity) -> Option<Indicator> {
    let threat_types = entity.metadata.get("threat_types")?.as_array()?;
    if threat_types.is_empty() {
        return None;
    }

    let max_severity = threat_types
        .iter()
        .filter_map(|v| v.as_str())
        .map(threat_severity)
        .fold(0.0_f64, f64::max);

    let confidence = entity.metadata.get("confidence").and_then(|v| v.as_f64()).unwrap_or(1.0);

    Some(Indicator {
        weight: 0.35,
        value: (max_severity * confidence).min(1.0),
    })
}

/// `anomaly_behavior` — weight 0.25.
pub fn anomaly_behavior(entity: &Entity, ml_anomaly_score: Option<f64>) -> Option<Indicator> {
    let mut candidates = Vec::new();

    if metadata_flag(entity, "is_anomaly") {
        candidates.push(0.5);
    }
    if let Some(anomaly_type) = metadata_str(entity, "anomaly_type") {
        candidates.push(behavior_pattern_score(anomaly_type));
    }
    if entity
        .connections
        .iter()
        .any(|c| c.metadata.get("expansion_method").and_then(|v| v.as_str()) == Some("baseline_anomaly"))
    {
        candidates.push(0.6);
    }
    if let Some(ml) = ml_anomaly_score {
        candidates.push(ml);
    }

    if candidates.is_empty() {
        return None;
    }

    Some(Indicator {
        weight: 0.25,
        value: candidates.into_iter().fold(0.0_f64, f64::max).min(1.0),
    })
}

const BLACKLIST_TOKENS: &[&str] = &["malicious", "suspicious", "blocked", "quarantined"];

/// `blacklist_match` — weight 0.40, value 0.8 if any blacklist token appears
/// anywhere in the serialized metadata.
pub fn blacklist_match(entity: &Entity) -> Option<Indicator> {
    let serialized = serde_json::to_string(&entity.metadata).unwrap_or_default().to_lowercase();
    let hit = BLACKLIST_TOKENS.iter().any(|token| serialized.contains(token));
    if hit {
        Some(Indicator { weight: 0.40, value: 0.8 })
    } else {
        None
    }
}

const DGA_WATCHLIST_TLDS: &[&str] = &["tk", "ml", "ga", "cf"];
const KNOWN_BRANDS: &[&str] = &["paypal", "microsoft", "google", "apple", "amazon"];
const SUSPICIOUS_COMMAND_TOKENS: &[&str] = &["powershell", "cmd.exe", "wmic", "netsh", "reg.exe"];
const EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "bat", "ps1", "sh", "scr", "vbs"];
const DOCUMENT_EXTENSIONS: &[&str] = &["doc", "docx", "pdf", "xls", "xlsx"];

/// Per-type indicators (SPEC_FULL.md §4.3.1a).
pub fn per_type_indicators(entity: &Entity) -> Vec<Indicator> {
    let mut indicators = Vec::new();

    match entity.entity_type {
        EntityType::Ip => {
            if let Some(is_private) = entity.metadata.get("is_private").and_then(|v| v.as_bool()) {
                let (key, value) = if is_private { ("internal_ip", 0.2) } else { ("external_ip", 0.4) };
                indicators.push(Indicator { weight: single_point_weight(key), value });
            }
            if metadata_flag(entity, "suspicious_location") {
                indicators.push(Indicator { weight: single_point_weight("suspicious_location"), value: 0.6 });
            }
            if metadata_flag(entity, "port_scanning") {
                indicators.push(Indicator { weight: single_point_weight("port_scanning"), value: 0.7 });
            }
            if metadata_flag(entity, "ddos_behavior") {
                indicators.push(Indicator { weight: single_point_weight("ddos_behavior"), value: 0.8 });
            }
        }
        EntityType::User => {
            if metadata_flag(entity, "privilege_escalation") {
                indicators.push(Indicator { weight: single_point_weight("privilege_escalation"), value: 0.8 });
            }
            if metadata_flag(entity, "login_anomaly") {
                indicators.push(Indicator { weight: single_point_weight("login_anomaly"), value: 0.6 });
            }
            if metadata_flag(entity, "lateral_movement") {
                indicators.push(Indicator { weight: single_point_weight("lateral_movement"), value: 0.7 });
            }
            if metadata_flag(entity, "data_access_anomaly") {
                indicators.push(Indicator { weight: single_point_weight("data_access_anomaly"), value: 0.5 });
            }
        }
        EntityType::File => {
            if let Some(ext) = metadata_str(entity, "file_extension") {
                if EXECUTABLE_EXTENSIONS.contains(&ext) {
                    indicators.push(Indicator { weight: single_point_weight("executable_file"), value: 0.6 });
                } else if DOCUMENT_EXTENSIONS.contains(&ext) {
                    indicators.push(Indicator { weight: single_point_weight("document_file"), value: 0.3 });
                }
            }
            if metadata_flag(entity, "is_system_file") && metadata_flag(entity, "modified") {
                indicators.push(Indicator { weight: single_point_weight("system_file_modification"), value: 0.9 });
            }
            if metadata_flag(entity, "encrypted") || metadata_flag(entity, "packed") {
                indicators.push(Indicator { weight: single_point_weight("encrypted_packed"), value: 0.5 });
            }
            if metadata_flag(entity, "is_hash") && metadata_flag(entity, "malicious") {
                indicators.push(Indicator { weight: single_point_weight("malicious_hash"), value: 0.9 });
            }
        }
        EntityType::Process => {
            if metadata_flag(entity, "system_process_anomaly") {
                indicators.push(Indicator { weight: single_point_weight("system_process_anomaly"), value: 0.8 });
            }
            if metadata_flag(entity, "process_injection") {
                indicators.push(Indicator { weight: single_point_weight("process_injection"), value: 0.9 });
            }
            if metadata_flag(entity, "suspicious_network") {
                indicators.push(Indicator { weight: single_point_weight("suspicious_network"), value: 0.7 });
            }
            if let Some(command_line) = metadata_str(entity, "full_command") {
                let lower = command_line.to_lowercase();
                if SUSPICIOUS_COMMAND_TOKENS.iter().any(|t| lower.contains(t)) {
                    indicators.push(Indicator { weight: single_point_weight("suspicious_command"), value: 0.6 });
                }
            }
        }
        EntityType::Domain => {
            if metadata_flag(entity, "new_domain") {
                indicators.push(Indicator { weight: single_point_weight("new_domain"), value: 0.6 });
            }
            if is_dga_like(&entity.entity_id) {
                indicators.push(Indicator { weight: single_point_weight("dga_domain"), value: 0.8 });
            }
            if is_phishing_like(&entity.entity_id) {
                indicators.push(Indicator { weight: single_point_weight("phishing_domain"), value: 0.9 });
            }
            if let Some(tld) = metadata_str(entity, "tld") {
                if DGA_WATCHLIST_TLDS.contains(&tld) {
                    indicators.push(Indicator { weight: single_point_weight("suspicious_tld"), value: 0.4 });
                }
            }
        }
        EntityType::Device | EntityType::Email | EntityType::Url => {}
    }

    indicators
}

fn is_dga_like(domain: &str) -> bool {
    if domain.len() <= 20 {
        return false;
    }
    let (vowels, consonants) = domain.chars().filter(|c| c.is_ascii_alphabetic()).fold((0u32, 0u32), |(v, c), ch| {
        if "aeiouAEIOU".contains(ch) {
            (v + 1, c)
        } else {
            (v, c + 1)
        }
    });
    consonants > vowels * 2
}

fn is_phishing_like(domain: &str) -> bool {
    KNOWN_BRANDS
        .iter()
        .any(|brand| domain.contains(brand) && !domain.ends_with(&format!("{}.com", brand)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threat_severity_known_types() {
        assert_eq!(threat_severity("apt"), 0.95);
        assert_eq!(threat_severity("unknown_type"), 0.0);
    }

    #[test]
    fn blacklist_match_detects_token_in_metadata() {
        let mut entity = Entity::new(EntityType::Ip, "1.2.3.4");
        entity.add_metadata("status_note", "marked malicious by analyst");
        let indicator = blacklist_match(&entity).unwrap();
        assert_eq!(indicator.value, 0.8);
    }

    #[test]
    fn dga_detection_heuristic() {
        assert!(is_dga_like("xkqjzwvbmnthsdflqporueiwnvk.com"));
        assert!(!is_dga_like("example.com"));
    }
}

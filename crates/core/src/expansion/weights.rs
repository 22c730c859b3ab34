/// Fixed edge-weight table (SPEC_FULL.md §4.2 merge rule 4).
pub fn edge_weight(relationship: &str) -> f64 {
    match relationship {
        "COMMUNICATES_WITH" => 0.8,
        "BELONGS_TO" => 0.9,
        "USED_BY" => 0.7,
        "ACCESSES" => 0.6,
        "EXECUTES" => 0.8,
        "CREATES" => 0.7,
        "MODIFIES" => 0.6,
        "THREAT_INTEL_RELATED" => 0.9,
        "ANOMALY_RELATED" => 0.7,
        _ => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_relationships_have_table_weight() {
        assert_eq!(edge_weight("BELONGS_TO"), 0.9);
        assert_eq!(edge_weight("THREAT_INTEL_RELATED"), 0.9);
    }

    #[test]
    fn unknown_relationship_falls_back_to_default() {
        assert_eq!(edge_weight("SOMETHING_ELSE"), 0.5);
    }
}

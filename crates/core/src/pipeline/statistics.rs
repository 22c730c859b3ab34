use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate counters updated after every `Analyze` call (SPEC_FULL.md §4.5
/// step 6). Point-in-time reads are served by `GetStatistics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStatistics {
    pub total_events_processed: u64,
    pub total_entities_extracted: u64,
    pub total_connections_expanded: u64,
    pub total_responses_executed: u64,
    pub average_processing_time_ms: f64,
}

impl PipelineStatistics {
    /// Rolling mean update, matching the distilled source's incremental
    /// average (`_update_average_processing_time`).
    pub fn record_event(&mut self, entities_extracted: u64, connections_expanded: u64, responses_executed: u64, processing_time_ms: u64) {
        self.total_events_processed += 1;
        self.total_entities_extracted += entities_extracted;
        self.total_connections_expanded += connections_expanded;
        self.total_responses_executed += responses_executed;

        let n = self.total_events_processed as f64;
        self.average_processing_time_ms += (processing_time_ms as f64 - self.average_processing_time_ms) / n;
    }
}

/// Point-in-time snapshot returned by `Pipeline::get_statistics` (SPEC_FULL.md §4.5.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub statistics: PipelineStatistics,
    pub events_per_minute: f64,
    pub timestamp: DateTime<Utc>,
}

impl StatisticsSnapshot {
    pub fn new(statistics: PipelineStatistics) -> Self {
        let events_per_minute = if statistics.average_processing_time_ms > 0.0 {
            60_000.0 / statistics.average_processing_time_ms
        } else {
            0.0
        };

        Self {
            statistics,
            events_per_minute,
            timestamp: Utc::now(),
        }
    }
}

/// Reachability of one collaborator, reported by `HealthCheck` (SPEC_FULL.md §4.5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentHealth {
    Healthy,
    Unhealthy,
    NotConfigured,
}

/// Result of `Pipeline::health_check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub service: ComponentHealth,
    pub graph_store: ComponentHealth,
    pub threat_intel: ComponentHealth,
    pub timeseries: ComponentHealth,
    pub anomaly_model: ComponentHealth,
    pub effectors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_event_computes_rolling_average() {
        let mut stats = PipelineStatistics::default();
        stats.record_event(2, 3, 1, 100);
        stats.record_event(1, 0, 0, 200);

        assert_eq!(stats.total_events_processed, 2);
        assert_eq!(stats.total_entities_extracted, 3);
        assert_eq!(stats.average_processing_time_ms, 150.0);
    }

    #[test]
    fn snapshot_derives_events_per_minute() {
        let mut stats = PipelineStatistics::default();
        stats.record_event(1, 0, 0, 1_000);
        let snapshot = StatisticsSnapshot::new(stats);
        assert_eq!(snapshot.events_per_minute, 60.0);
    }
}

use super::MetricsRegistry;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

/// Counters and histograms for the four pipeline stages (SPEC_FULL.md §4.5
/// step 6). Registered against a [`MetricsRegistry`] at construction time;
/// recording is a no-op-cheap `inc()`/`observe()` call on the hot path.
#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    events_processed: IntCounter,
    entities_extracted: IntCounter,
    connections_expanded: IntCounter,
    responses_executed: IntCounterVec,
    processing_duration: Histogram,
}

impl PipelineMetrics {
    pub fn new(registry: &MetricsRegistry) -> Self {
        let events_processed = IntCounter::new(
            "events_processed_total",
            "total events passed through Pipeline::analyze",
        )
        .expect("valid metric definition");

        let entities_extracted = IntCounter::new(
            "entities_extracted_total",
            "total entities produced by the recognizer",
        )
        .expect("valid metric definition");

        let connections_expanded = IntCounter::new(
            "connections_expanded_total",
            "total connections discovered by the expansion engine",
        )
        .expect("valid metric definition");

        let responses_executed = IntCounterVec::new(
            Opts::new(
                "responses_executed_total",
                "total response actions dispatched, by action and outcome",
            ),
            &["action", "outcome"],
        )
        .expect("valid metric definition");

        let processing_duration = Histogram::with_opts(
            HistogramOpts::new(
                "event_processing_duration_seconds",
                "wall-clock time spent in Pipeline::analyze",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )
        .expect("valid metric definition");

        if registry.is_enabled() {
            let _ = registry.register(events_processed.clone());
            let _ = registry.register(entities_extracted.clone());
            let _ = registry.register(connections_expanded.clone());
            let _ = registry.register(responses_executed.clone());
            let _ = registry.register(processing_duration.clone());
        }

        Self {
            events_processed,
            entities_extracted,
            connections_expanded,
            responses_executed,
            processing_duration,
        }
    }

    pub fn record_event_processed(&self) {
        self.events_processed.inc();
    }

    pub fn record_entities_extracted(&self, count: usize) {
        self.entities_extracted.inc_by(count as u64);
    }

    pub fn record_connections_expanded(&self, count: usize) {
        self.connections_expanded.inc_by(count as u64);
    }

    pub fn record_response_executed(&self, action: &str, outcome: &str) {
        self.responses_executed.with_label_values(&[action, outcome]).inc();
    }

    pub fn observe_processing_duration(&self, seconds: f64) {
        self.processing_duration.observe(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;

    #[test]
    fn records_without_panicking() {
        let registry = MetricsRegistry::new(MetricsConfig::default());
        let metrics = PipelineMetrics::new(&registry);

        metrics.record_event_processed();
        metrics.record_entities_extracted(3);
        metrics.record_connections_expanded(5);
        metrics.record_response_executed("network_block", "success");
        metrics.observe_processing_duration(0.42);

        let text = registry.metrics_text();
        assert!(text.contains("events_processed_total"));
    }
}

pub mod config;
pub mod entity;
pub mod error;
pub mod expansion;
pub mod metrics;
pub mod pipeline;
pub mod recognizer;
pub mod response;
pub mod scoring;

pub use config::{ExpansionConfig, MetricsConfig, PartialPipelineConfig, PipelineConfig};
pub use entity::{Connection, Entity, EntityKey, EntityStatus, EntityType, Event, EventResult, EventStatus, Summary, ThreatLevel, TimelineEvent};
pub use error::{Error, ErrorCode, ErrorContext, Result};
pub use expansion::{AnomalyModel, AssetRecord, ExpansionEngine, GraphStore, ThreatIntel, Timeseries};
pub use metrics::{MetricsRegistry, MetricsService, PipelineMetrics};
pub use pipeline::{ComponentHealth, HealthStatus, Pipeline, PipelineStatistics, StatisticsSnapshot};
pub use recognizer::Recognizer;
pub use response::{ActionResult, ActionStatus, Effector, ResponseAction, ResponseOrchestrator};
pub use scoring::Scorer;

// Re-export commonly used types from dependencies
pub use uuid::Uuid;
pub use chrono::{DateTime, Utc};
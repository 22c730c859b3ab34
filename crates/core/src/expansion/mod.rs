//! # ExpansionEngine
//!
//! Stage 2 of the pipeline: enriches a recognized entity by discovering
//! related entities through four independent backends (SPEC_FULL.md §4.2).

pub mod engine;
pub mod traits;
pub mod weights;

pub use engine::{Discovered, ExpansionEngine, ExpansionOutcome};
pub use traits::{
    AnomalyModel, AssetRecord, CountedValue, DeviceAsset, FileAsset, GraphStore, IpAsset,
    ProcessAsset, ThreatIntel, ThreatIntelHit, Timeseries, UserAsset,
};

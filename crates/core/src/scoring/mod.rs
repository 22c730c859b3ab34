//! # Scorer
//!
//! Stage 3 of the pipeline: produces a 0-100 risk score per entity from
//! single-point indicators and multi-point correlation (SPEC_FULL.md §4.3).

pub mod indicators;
pub mod multi_point;
pub mod scorer;
pub mod single_point;

pub use indicators::Indicator;
pub use multi_point::multi_point_score;
pub use scorer::Scorer;
pub use single_point::{sigmoid_normalize, single_point_score};

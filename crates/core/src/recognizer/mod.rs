//! # Recognizer
//!
//! Stage 1 of the pipeline: turns a raw log payload into a deduplicated
//! list of [`crate::entity::Entity`] values (SPEC_FULL.md §4.1).

pub mod field_tables;
pub mod patterns;
pub mod recognizer;
pub mod validators;

pub use recognizer::Recognizer;

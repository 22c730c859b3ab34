//! # Response
//!
//! Stage 4 of the pipeline: turns a risk score into a list of actions via
//! the policy table, then dispatches them through pluggable effectors
//! (SPEC_FULL.md §4.4).

pub mod action;
pub mod effector;
pub mod orchestrator;

pub use action::{actions_for_score, ActionResult, ActionStatus, ResponseAction};
pub use effector::{AlertOutEffector, DirectoryEffector, Effector, EndpointEffector, NetworkBlockEffector};
pub use orchestrator::ResponseOrchestrator;

//! The extraction engine: pattern rules, field merging, form
//! classification, confidence scoring, validation, and the strategy
//! cascade that ties them together.

pub mod annotations;
pub mod classify;
pub mod confidence;
pub mod merge;
mod orchestrator;
pub mod rules;
pub mod tables;
pub mod validate;

pub use merge::FieldMerger;
pub use orchestrator::K1Orchestrator;
pub use rules::{FieldRule, PatternCatalog, ValueKind};

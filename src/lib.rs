//! driftwatch - Infrastructure Drift Detection
//!
//! A library for reconciling a Terraform state document against a snapshot
//! of live cloud resources and reporting every discrepancy as a classified,
//! severity-ranked drift item.

pub mod compare;
pub mod config;
pub mod engine;
pub mod model;
pub mod output;
pub mod rules;
pub mod snapshot;
pub mod state;
pub mod tags;

mod error;

pub use config::{EngineConfig, SeverityThresholds};
pub use engine::DriftEngine;
pub use error::DriftError;
pub use model::{Difference, DriftItem, DriftType, ScanReport, Severity, SkippedResource};
pub use snapshot::Snapshot;

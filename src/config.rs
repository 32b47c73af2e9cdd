//! Engine configuration: ignore policies, severity thresholds, region scope.
//!
//! Shared read-only for the duration of a scan; the engine holds no other
//! state across invocations.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::DriftError;
use crate::model::{DriftType, Severity};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tag keys excluded from tag comparison (provenance/audit markers).
    pub ignore_tags: BTreeSet<String>,
    /// Resource identifiers skipped entirely, regardless of drift.
    pub ignore_resources: BTreeSet<String>,
    pub severity_thresholds: SeverityThresholds,
    /// Global-scope resources (IAM) are evaluated only in this region.
    pub primary_region: String,
    pub environment: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ignore_tags: ["LastModified", "CreatedBy"]
                .into_iter()
                .map(String::from)
                .collect(),
            ignore_resources: BTreeSet::new(),
            severity_thresholds: SeverityThresholds::default(),
            primary_region: "us-east-1".to_string(),
            environment: "production".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, DriftError> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }
}

/// Maps drift categories to severities. Lists hold category names as strings
/// so a config may mention categories the engine does not emit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "UPPERCASE")]
pub struct SeverityThresholds {
    pub critical: Vec<String>,
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            critical: vec!["missing".to_string(), "extra".to_string()],
            high: vec!["configuration".to_string()],
            medium: vec!["tags".to_string()],
            low: vec!["metadata".to_string()],
        }
    }
}

impl SeverityThresholds {
    /// Pure lookup, highest severity first; falls back to `Low`, never fails.
    pub fn classify(&self, drift_type: DriftType) -> Severity {
        let category = drift_type.as_str();
        let tiers = [
            (Severity::Critical, &self.critical),
            (Severity::High, &self.high),
            (Severity::Medium, &self.medium),
            (Severity::Low, &self.low),
        ];
        for (severity, categories) in tiers {
            if categories.iter().any(|c| c == category) {
                return severity;
            }
        }
        Severity::Low
    }
}

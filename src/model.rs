use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rules::RuleDifference;
use crate::tags::TagDifference;

/// A single resource instance extracted from a Terraform state document.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredResource {
    pub resource_type: String,
    pub name: String,
    /// Terraform address, `"<type>.<name>"`.
    pub address: String,
    pub attributes: serde_json::Map<String, Value>,
}

impl DeclaredResource {
    /// Returns the attribute value, treating JSON `null` as absent.
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftType {
    Configuration,
    Missing,
    Extra,
    Tags,
}

impl DriftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftType::Configuration => "configuration",
            DriftType::Missing => "missing",
            DriftType::Extra => "extra",
            DriftType::Tags => "tags",
        }
    }
}

impl fmt::Display for DriftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering is by rank: `Critical` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attribute-level discrepancy inside a drift item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Difference {
    /// Sentinel for missing/extra resources.
    Absence { status: String },
    Value(ValueDiff),
    Tags(TagDifference),
    Rules(RuleDifference),
    /// Provider-side details attached to extra resources.
    Details(Value),
}

impl Difference {
    pub fn value(declared: impl Into<Value>, live: impl Into<Value>) -> Self {
        Difference::Value(ValueDiff {
            declared: declared.into(),
            live: live.into(),
            impact: None,
        })
    }

    pub fn value_with_impact(
        declared: impl Into<Value>,
        live: impl Into<Value>,
        impact: &str,
    ) -> Self {
        Difference::Value(ValueDiff {
            declared: declared.into(),
            live: live.into(),
            impact: Some(impact.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDiff {
    pub declared: Value,
    pub live: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftItem {
    pub resource_type: String,
    pub resource_name: String,
    /// `"N/A"` for resources that exist only on the live side.
    pub terraform_address: String,
    pub live_id: String,
    pub drift_type: DriftType,
    pub severity: Severity,
    pub differences: BTreeMap<String, Difference>,
    pub first_detected: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub environment: String,
    pub region: String,
}

impl DriftItem {
    /// Deterministic key used by downstream deduplication across scans.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}:{}:{}",
            self.terraform_address, self.live_id, self.drift_type
        )
    }
}

/// A resource the engine could not compare; the scan continues without it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedResource {
    pub resource_type: String,
    pub identifier: String,
    pub reason: String,
}

/// Result of one scan invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ScanReport {
    pub items: Vec<DriftItem>,
    pub skipped: Vec<SkippedResource>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count_by_severity(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.severity).or_insert(0) += 1;
        }
        counts
    }

    pub fn count_by_drift_type(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.drift_type.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item(drift_type: DriftType) -> DriftItem {
        DriftItem {
            resource_type: "aws_instance".to_string(),
            resource_name: "web".to_string(),
            terraform_address: "aws_instance.web".to_string(),
            live_id: "i-123".to_string(),
            drift_type,
            severity: Severity::High,
            differences: BTreeMap::new(),
            first_detected: Utc::now(),
            last_seen: Utc::now(),
            environment: "production".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = sample_item(DriftType::Configuration);
        let b = sample_item(DriftType::Configuration);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), "aws_instance.web:i-123:configuration");
    }

    #[test]
    fn test_fingerprint_varies_by_drift_type() {
        let a = sample_item(DriftType::Configuration);
        let b = sample_item(DriftType::Tags);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }

    #[test]
    fn test_drift_type_serializes_lowercase() {
        let json = serde_json::to_string(&DriftType::Missing).unwrap();
        assert_eq!(json, "\"missing\"");
    }

    #[test]
    fn test_severity_ordering_critical_first() {
        let mut severities = vec![Severity::Low, Severity::Critical, Severity::Medium];
        severities.sort();
        assert_eq!(severities[0], Severity::Critical);
        assert_eq!(severities[2], Severity::Low);
    }

    #[test]
    fn test_declared_resource_attr_null_is_absent() {
        let mut attributes = serde_json::Map::new();
        attributes.insert("ami".to_string(), Value::Null);
        attributes.insert("instance_type".to_string(), "t3.micro".into());
        let resource = DeclaredResource {
            resource_type: "aws_instance".to_string(),
            name: "web".to_string(),
            address: "aws_instance.web".to_string(),
            attributes,
        };
        assert!(resource.attr("ami").is_none());
        assert_eq!(resource.attr_str("instance_type"), Some("t3.micro"));
        assert!(resource.attr("missing").is_none());
    }

    #[test]
    fn test_difference_value_serialization_skips_absent_impact() {
        let diff = Difference::value("t3.medium", "t3.large");
        let json = serde_json::to_string(&diff).unwrap();
        assert!(json.contains("declared"));
        assert!(json.contains("live"));
        assert!(!json.contains("impact"));
    }

    #[test]
    fn test_scan_report_counts() {
        let report = ScanReport {
            items: vec![
                sample_item(DriftType::Configuration),
                sample_item(DriftType::Tags),
                sample_item(DriftType::Tags),
            ],
            skipped: vec![],
        };
        assert!(!report.is_clean());
        assert_eq!(report.count_by_drift_type().get("tags"), Some(&2));
        assert_eq!(report.count_by_severity().get(&Severity::High), Some(&3));
    }
}

//! Matcher and orchestrator: drives one scan invocation end to end.
//!
//! A scan is a pure function of the state document, the live snapshot, and
//! the engine configuration. Per-resource shape problems degrade to skip
//! entries in the report; only top-level document shape failures abort.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::compare::{DifferenceMap, ResourceComparator, comparators};
use crate::config::EngineConfig;
use crate::error::DriftError;
use crate::model::{DeclaredResource, Difference, DriftItem, DriftType, ScanReport, SkippedResource};
use crate::snapshot::Snapshot;
use crate::state::parse_state;
use crate::tags;

const MISSING_STATUS: &str = "Resource exists in Terraform but not found in the live environment";
const EXTRA_STATUS: &str = "Live resource exists but is not managed by Terraform";

/// Tag marking a live resource as governed outside this state document.
const MANAGED_BY_TAG: &str = "ManagedBy";
const MANAGED_BY_VALUE: &str = "terraform";

/// Per-invocation context; there is no ambient scan state.
struct ScanContext {
    detected_at: DateTime<Utc>,
    environment: String,
}

pub struct DriftEngine {
    config: EngineConfig,
}

impl DriftEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compares a Terraform state document against a live snapshot.
    ///
    /// Emission order is region, then registry order of resource types, then
    /// declared document order, followed by extra-resource items. Callers
    /// needing a different total order sort the result themselves.
    pub fn detect_drift(&self, state: &Value, snapshot: &Value) -> Result<ScanReport, DriftError> {
        let declared_by_type = parse_state(state)?;
        let snapshot = Snapshot::from_value(snapshot)?;
        let ctx = ScanContext {
            detected_at: Utc::now(),
            environment: self.config.environment.clone(),
        };

        let mut report = ScanReport::default();
        let mut seen_skips: BTreeSet<(String, String)> = BTreeSet::new();

        // Declared identifiers per type, for extra-resource detection.
        let mut declared_ids: HashMap<&'static str, BTreeSet<String>> = HashMap::new();
        for comparator in comparators() {
            let ids = declared_by_type
                .get(comparator.resource_type())
                .map(|resources| {
                    resources
                        .iter()
                        .filter_map(|r| comparator.declared_id(r))
                        .collect()
                })
                .unwrap_or_default();
            declared_ids.insert(comparator.resource_type(), ids);
        }

        for resource_type in declared_by_type.keys() {
            if comparators()
                .iter()
                .all(|c| c.resource_type() != resource_type.as_str())
            {
                tracing::warn!(resource_type = %resource_type, "no comparator registered, skipping");
                report.skipped.push(SkippedResource {
                    resource_type: resource_type.clone(),
                    identifier: String::new(),
                    reason: "no comparator registered for this resource type".to_string(),
                });
            }
        }

        for region in snapshot.regions() {
            tracing::info!(region, "analyzing drift");
            for comparator in comparators() {
                if comparator.global_scope() && region != self.config.primary_region {
                    continue;
                }
                let declared = declared_by_type
                    .get(comparator.resource_type())
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                self.match_declared(
                    &ctx,
                    *comparator,
                    declared,
                    snapshot.collection(region, comparator.collection()),
                    region,
                    &mut report,
                    &mut seen_skips,
                );
            }
        }

        for region in snapshot.regions() {
            for comparator in comparators() {
                if comparator.global_scope() && region != self.config.primary_region {
                    continue;
                }
                self.detect_extra(
                    &ctx,
                    *comparator,
                    snapshot.collection(region, comparator.collection()),
                    &declared_ids[comparator.resource_type()],
                    region,
                    &mut report,
                    &mut seen_skips,
                );
            }
        }

        tracing::info!(
            items = report.items.len(),
            skipped = report.skipped.len(),
            "scan complete"
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn match_declared(
        &self,
        ctx: &ScanContext,
        comparator: &'static dyn ResourceComparator,
        declared: &[DeclaredResource],
        live_records: &[Value],
        region: &str,
        report: &mut ScanReport,
        seen_skips: &mut BTreeSet<(String, String)>,
    ) {
        for resource in declared {
            let Some(declared_id) = comparator.declared_id(resource) else {
                tracing::warn!(
                    address = %resource.address,
                    "declared resource has no identifier attribute"
                );
                push_skip(
                    report,
                    seen_skips,
                    comparator.resource_type(),
                    &resource.address,
                    "declared resource has no identifier attribute",
                );
                continue;
            };
            if self.config.ignore_resources.contains(&declared_id) {
                tracing::debug!(id = %declared_id, "resource in ignore list, skipping");
                continue;
            }

            let live = live_records
                .iter()
                .find(|record| comparator.live_id(record).as_deref() == Some(declared_id.as_str()));

            let Some(live) = live else {
                let mut differences = DifferenceMap::new();
                differences.insert(
                    "status".to_string(),
                    Difference::Absence {
                        status: MISSING_STATUS.to_string(),
                    },
                );
                report.items.push(self.drift_item(
                    ctx,
                    comparator.resource_type(),
                    &resource.name,
                    resource.address.clone(),
                    declared_id,
                    DriftType::Missing,
                    differences,
                    region,
                ));
                continue;
            };

            let differences = comparator.compare(resource, live, &self.config);
            if differences.is_empty() {
                continue;
            }
            let drift_type = if differences.len() == 1 && differences.contains_key("tags") {
                DriftType::Tags
            } else {
                DriftType::Configuration
            };
            report.items.push(self.drift_item(
                ctx,
                comparator.resource_type(),
                &resource.name,
                resource.address.clone(),
                declared_id,
                drift_type,
                differences,
                region,
            ));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn detect_extra(
        &self,
        ctx: &ScanContext,
        comparator: &'static dyn ResourceComparator,
        live_records: &[Value],
        declared_ids: &BTreeSet<String>,
        region: &str,
        report: &mut ScanReport,
        seen_skips: &mut BTreeSet<(String, String)>,
    ) {
        for live in live_records {
            let Some(live_id) = comparator.live_id(live) else {
                tracing::warn!(
                    collection = comparator.collection(),
                    region,
                    "live record has no identifier field"
                );
                push_skip(
                    report,
                    seen_skips,
                    comparator.resource_type(),
                    &format!("{}/{}", region, comparator.collection()),
                    "live record has no identifier field",
                );
                continue;
            };
            if declared_ids.contains(&live_id) || self.config.ignore_resources.contains(&live_id) {
                continue;
            }

            let live_tags = tags::live_tag_map(live.get("Tags"));
            if live_tags.get(MANAGED_BY_TAG).and_then(Value::as_str) == Some(MANAGED_BY_VALUE) {
                // Governed elsewhere; absence from this state file is expected.
                continue;
            }

            let resource_name = live_tags
                .get("Name")
                .and_then(Value::as_str)
                .unwrap_or(&live_id)
                .to_string();

            let mut differences = DifferenceMap::new();
            differences.insert(
                "status".to_string(),
                Difference::Absence {
                    status: EXTRA_STATUS.to_string(),
                },
            );
            if let Some(details) = comparator.extra_details(live) {
                differences.insert("resource_details".to_string(), Difference::Details(details));
            }

            report.items.push(self.drift_item(
                ctx,
                comparator.resource_type(),
                &resource_name,
                "N/A".to_string(),
                live_id,
                DriftType::Extra,
                differences,
                region,
            ));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn drift_item(
        &self,
        ctx: &ScanContext,
        resource_type: &str,
        resource_name: &str,
        terraform_address: String,
        live_id: String,
        drift_type: DriftType,
        differences: BTreeMap<String, Difference>,
        region: &str,
    ) -> DriftItem {
        DriftItem {
            resource_type: resource_type.to_string(),
            resource_name: resource_name.to_string(),
            terraform_address,
            live_id,
            drift_type,
            severity: self.config.severity_thresholds.classify(drift_type),
            differences,
            first_detected: ctx.detected_at,
            last_seen: ctx.detected_at,
            environment: ctx.environment.clone(),
            region: region.to_string(),
        }
    }
}

fn push_skip(
    report: &mut ScanReport,
    seen: &mut BTreeSet<(String, String)>,
    resource_type: &str,
    identifier: &str,
    reason: &str,
) {
    if seen.insert((resource_type.to_string(), identifier.to_string())) {
        report.skipped.push(SkippedResource {
            resource_type: resource_type.to_string(),
            identifier: identifier.to_string(),
            reason: reason.to_string(),
        });
    }
}

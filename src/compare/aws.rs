//! Comparators for the supported AWS resource kinds.
//!
//! Attribute projections are declarative where the two shapes line up
//! field-for-field; versioning and encryption need dedicated extractors
//! because the provider buries them under nested keys.

use std::collections::BTreeSet;

use serde_json::{Value, json};

use crate::config::EngineConfig;
use crate::model::{DeclaredResource, Difference};
use crate::rules;
use crate::tags;

use super::{DifferenceMap, ResourceComparator, as_i64, live_path};

/// Records a difference when the two sides are not strictly equal. A side
/// that is missing participates as JSON `null`.
fn push_if_differs(
    diffs: &mut DifferenceMap,
    key: &str,
    declared: Option<&Value>,
    live: Option<&Value>,
    impact: Option<&str>,
) {
    if declared == live {
        return;
    }
    let declared = declared.cloned().unwrap_or(Value::Null);
    let live = live.cloned().unwrap_or(Value::Null);
    let difference = match impact {
        Some(impact) => Difference::value_with_impact(declared, live, impact),
        None => Difference::value(declared, live),
    };
    diffs.insert(key.to_string(), difference);
}

/// Numeric comparison; only reports when both sides carry a number, so a
/// string `"100"` never drifts against the number `100`.
fn push_if_numbers_differ(
    diffs: &mut DifferenceMap,
    key: &str,
    declared: Option<&Value>,
    live: Option<&Value>,
    impact: &str,
) {
    let (Some(declared), Some(live)) = (declared, live) else {
        return;
    };
    let (Some(declared_n), Some(live_n)) = (as_i64(declared), as_i64(live)) else {
        return;
    };
    if declared_n != live_n {
        diffs.insert(
            key.to_string(),
            Difference::value_with_impact(declared.clone(), live.clone(), impact),
        );
    }
}

fn push_tag_difference(
    diffs: &mut DifferenceMap,
    declared: &DeclaredResource,
    live: &Value,
    config: &EngineConfig,
) {
    let declared_tags = tags::declared_tag_map(declared.attr("tags"));
    let live_tags = tags::live_tag_map(live.get("Tags"));
    if let Some(diff) = tags::compare_tags(&declared_tags, &live_tags, &config.ignore_tags) {
        diffs.insert("tags".to_string(), Difference::Tags(diff));
    }
}

fn string_set(values: Option<&Value>) -> BTreeSet<String> {
    values
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Compute instance
// ---------------------------------------------------------------------------

pub struct InstanceComparator;

impl ResourceComparator for InstanceComparator {
    fn resource_type(&self) -> &'static str {
        "aws_instance"
    }

    fn collection(&self) -> &'static str {
        "ec2_instances"
    }

    fn declared_id(&self, declared: &DeclaredResource) -> Option<String> {
        declared.attr_str("id").map(str::to_string)
    }

    fn live_id(&self, live: &Value) -> Option<String> {
        live_path(live, &["InstanceId"])
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn compare(
        &self,
        declared: &DeclaredResource,
        live: &Value,
        config: &EngineConfig,
    ) -> DifferenceMap {
        let mut diffs = DifferenceMap::new();
        push_if_differs(
            &mut diffs,
            "instance_type",
            declared.attr("instance_type"),
            live_path(live, &["InstanceType"]),
            Some("Performance and cost implications"),
        );
        push_if_differs(
            &mut diffs,
            "ami",
            declared.attr("ami"),
            live_path(live, &["ImageId"]),
            Some("Security and compatibility implications"),
        );
        push_if_differs(
            &mut diffs,
            "availability_zone",
            declared.attr("availability_zone"),
            live_path(live, &["Placement", "AvailabilityZone"]),
            Some("Location and networking implications"),
        );

        // Attached security groups compare as sets; attachment order is not
        // meaningful.
        let declared_groups = string_set(declared.attr("security_groups"));
        let live_groups: BTreeSet<String> = live_path(live, &["SecurityGroups"])
            .and_then(Value::as_array)
            .map(|groups| {
                groups
                    .iter()
                    .filter_map(|g| g.get("GroupId").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if declared_groups != live_groups {
            diffs.insert(
                "security_groups".to_string(),
                Difference::value_with_impact(
                    json!(declared_groups),
                    json!(live_groups),
                    "Network security implications",
                ),
            );
        }

        push_tag_difference(&mut diffs, declared, live, config);
        diffs
    }

    fn extra_details(&self, live: &Value) -> Option<Value> {
        Some(json!({
            "instance_type": live_path(live, &["InstanceType"]),
            "state": live_path(live, &["State", "Name"]),
            "tags": tags::live_tag_map(live.get("Tags")),
        }))
    }
}

// ---------------------------------------------------------------------------
// Security group
// ---------------------------------------------------------------------------

pub struct SecurityGroupComparator;

impl ResourceComparator for SecurityGroupComparator {
    fn resource_type(&self) -> &'static str {
        "aws_security_group"
    }

    fn collection(&self) -> &'static str {
        "security_groups"
    }

    fn declared_id(&self, declared: &DeclaredResource) -> Option<String> {
        declared.attr_str("id").map(str::to_string)
    }

    fn live_id(&self, live: &Value) -> Option<String> {
        live_path(live, &["GroupId"])
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn compare(
        &self,
        declared: &DeclaredResource,
        live: &Value,
        config: &EngineConfig,
    ) -> DifferenceMap {
        let mut diffs = DifferenceMap::new();
        push_if_differs(
            &mut diffs,
            "name",
            declared.attr("name"),
            live_path(live, &["GroupName"]),
            None,
        );
        push_if_differs(
            &mut diffs,
            "description",
            declared.attr("description"),
            live_path(live, &["Description"]),
            None,
        );

        let declared_rules = declared
            .attr("ingress")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let live_rules = live_path(live, &["IpPermissions"])
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if let Some(rule_diff) = rules::compare_rules(declared_rules, live_rules) {
            diffs.insert("ingress_rules".to_string(), Difference::Rules(rule_diff));
        }

        push_tag_difference(&mut diffs, declared, live, config);
        diffs
    }
}

// ---------------------------------------------------------------------------
// Object-storage bucket
// ---------------------------------------------------------------------------

pub struct BucketComparator;

fn declared_versioning(declared: &DeclaredResource) -> bool {
    declared
        .attr("versioning")
        .and_then(Value::as_array)
        .and_then(|blocks| blocks.first())
        .and_then(|block| block.get("enabled"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn live_versioning(live: &Value) -> bool {
    live_path(live, &["Versioning", "Status"]).and_then(Value::as_str) == Some("Enabled")
}

fn declared_encryption(declared: &DeclaredResource) -> String {
    declared
        .attr("server_side_encryption_configuration")
        .and_then(Value::as_array)
        .and_then(|blocks| blocks.first())
        .and_then(|block| block.get("rule"))
        .and_then(Value::as_array)
        .and_then(|rules| rules.first())
        .and_then(|rule| rule.get("apply_server_side_encryption_by_default"))
        .and_then(Value::as_array)
        .and_then(|defaults| defaults.first())
        .and_then(|default| default.get("sse_algorithm"))
        .and_then(Value::as_str)
        .unwrap_or("None")
        .to_string()
}

fn live_encryption(live: &Value) -> String {
    live_path(live, &["Encryption", "Rules"])
        .and_then(Value::as_array)
        .and_then(|rules| rules.first())
        .and_then(|rule| rule.get("ApplyServerSideEncryptionByDefault"))
        .and_then(|default| default.get("SSEAlgorithm"))
        .and_then(Value::as_str)
        .unwrap_or("None")
        .to_string()
}

impl ResourceComparator for BucketComparator {
    fn resource_type(&self) -> &'static str {
        "aws_s3_bucket"
    }

    fn collection(&self) -> &'static str {
        "s3_buckets"
    }

    fn declared_id(&self, declared: &DeclaredResource) -> Option<String> {
        declared
            .attr_str("id")
            .or_else(|| declared.attr_str("bucket"))
            .map(str::to_string)
    }

    fn live_id(&self, live: &Value) -> Option<String> {
        live_path(live, &["Name"])
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn compare(
        &self,
        declared: &DeclaredResource,
        live: &Value,
        config: &EngineConfig,
    ) -> DifferenceMap {
        let mut diffs = DifferenceMap::new();

        let declared_v = declared_versioning(declared);
        let live_v = live_versioning(live);
        if declared_v != live_v {
            diffs.insert(
                "versioning".to_string(),
                Difference::value_with_impact(
                    declared_v,
                    live_v,
                    "Data protection and compliance implications",
                ),
            );
        }

        let declared_e = declared_encryption(declared);
        let live_e = live_encryption(live);
        if declared_e != live_e {
            diffs.insert(
                "encryption".to_string(),
                Difference::value_with_impact(
                    declared_e,
                    live_e,
                    "Security and compliance implications",
                ),
            );
        }

        push_tag_difference(&mut diffs, declared, live, config);
        diffs
    }
}

// ---------------------------------------------------------------------------
// Managed database instance
// ---------------------------------------------------------------------------

pub struct DatabaseComparator;

impl ResourceComparator for DatabaseComparator {
    fn resource_type(&self) -> &'static str {
        "aws_db_instance"
    }

    fn collection(&self) -> &'static str {
        "rds_instances"
    }

    fn declared_id(&self, declared: &DeclaredResource) -> Option<String> {
        declared
            .attr_str("id")
            .or_else(|| declared.attr_str("identifier"))
            .map(str::to_string)
    }

    fn live_id(&self, live: &Value) -> Option<String> {
        live_path(live, &["DBInstanceIdentifier"])
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn compare(
        &self,
        declared: &DeclaredResource,
        live: &Value,
        config: &EngineConfig,
    ) -> DifferenceMap {
        let mut diffs = DifferenceMap::new();
        push_if_differs(
            &mut diffs,
            "instance_class",
            declared.attr("instance_class"),
            live_path(live, &["DBInstanceClass"]),
            Some("Performance and cost implications"),
        );

        // Engine version only drifts when both sides report one; a state
        // file may omit it and let the provider default.
        if let (Some(declared_v), Some(live_v)) = (
            declared.attr("engine_version"),
            live_path(live, &["EngineVersion"]),
        ) && declared_v != live_v
        {
            diffs.insert(
                "engine_version".to_string(),
                Difference::value_with_impact(
                    declared_v.clone(),
                    live_v.clone(),
                    "Compatibility and security implications",
                ),
            );
        }

        push_if_numbers_differ(
            &mut diffs,
            "allocated_storage",
            declared.attr("allocated_storage"),
            live_path(live, &["AllocatedStorage"]),
            "Storage capacity and cost implications",
        );

        push_tag_difference(&mut diffs, declared, live, config);
        diffs
    }
}

// ---------------------------------------------------------------------------
// Function compute
// ---------------------------------------------------------------------------

pub struct FunctionComparator;

impl ResourceComparator for FunctionComparator {
    fn resource_type(&self) -> &'static str {
        "aws_lambda_function"
    }

    fn collection(&self) -> &'static str {
        "lambda_functions"
    }

    fn declared_id(&self, declared: &DeclaredResource) -> Option<String> {
        declared.attr_str("function_name").map(str::to_string)
    }

    fn live_id(&self, live: &Value) -> Option<String> {
        live_path(live, &["FunctionName"])
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn compare(
        &self,
        declared: &DeclaredResource,
        live: &Value,
        config: &EngineConfig,
    ) -> DifferenceMap {
        let mut diffs = DifferenceMap::new();
        push_if_differs(
            &mut diffs,
            "runtime",
            declared.attr("runtime"),
            live_path(live, &["Runtime"]),
            Some("Compatibility and performance implications"),
        );
        push_if_numbers_differ(
            &mut diffs,
            "memory_size",
            declared.attr("memory_size"),
            live_path(live, &["MemorySize"]),
            "Performance and cost implications",
        );
        push_if_numbers_differ(
            &mut diffs,
            "timeout",
            declared.attr("timeout"),
            live_path(live, &["Timeout"]),
            "Function execution behavior",
        );
        push_tag_difference(&mut diffs, declared, live, config);
        diffs
    }
}

// ---------------------------------------------------------------------------
// Identity role (global scope)
// ---------------------------------------------------------------------------

pub struct RoleComparator;

impl ResourceComparator for RoleComparator {
    fn resource_type(&self) -> &'static str {
        "aws_iam_role"
    }

    fn collection(&self) -> &'static str {
        "iam_roles"
    }

    fn declared_id(&self, declared: &DeclaredResource) -> Option<String> {
        declared.attr_str("name").map(str::to_string)
    }

    fn live_id(&self, live: &Value) -> Option<String> {
        live_path(live, &["RoleName"])
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn global_scope(&self) -> bool {
        true
    }

    fn compare(
        &self,
        declared: &DeclaredResource,
        live: &Value,
        config: &EngineConfig,
    ) -> DifferenceMap {
        let mut diffs = DifferenceMap::new();
        push_if_differs(
            &mut diffs,
            "description",
            declared.attr("description"),
            live_path(live, &["Description"]),
            None,
        );
        push_tag_difference(&mut diffs, declared, live, config);
        diffs
    }
}

// ---------------------------------------------------------------------------
// Generic id+tags comparator
// ---------------------------------------------------------------------------

/// Fallback strategy for resource kinds that only need identity matching and
/// tag reconciliation.
pub struct GenericComparator {
    resource_type: &'static str,
    collection: &'static str,
    id_field: &'static str,
}

impl GenericComparator {
    pub const fn new(
        resource_type: &'static str,
        collection: &'static str,
        id_field: &'static str,
    ) -> Self {
        Self {
            resource_type,
            collection,
            id_field,
        }
    }
}

impl ResourceComparator for GenericComparator {
    fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    fn collection(&self) -> &'static str {
        self.collection
    }

    fn declared_id(&self, declared: &DeclaredResource) -> Option<String> {
        declared.attr_str("id").map(str::to_string)
    }

    fn live_id(&self, live: &Value) -> Option<String> {
        live_path(live, &[self.id_field])
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn compare(
        &self,
        declared: &DeclaredResource,
        live: &Value,
        config: &EngineConfig,
    ) -> DifferenceMap {
        let mut diffs = DifferenceMap::new();
        push_tag_difference(&mut diffs, declared, live, config);
        diffs
    }
}

//! Per-resource-type comparison strategies.
//!
//! Each comparator declares which attributes matter for its resource kind and
//! how to project them out of the two differently-shaped sources. A generic
//! id+tags comparator covers resource types without bespoke rules, so a new
//! type is supportable by registering an identifier field name.

pub mod aws;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::model::{DeclaredResource, Difference};

pub type DifferenceMap = BTreeMap<String, Difference>;

pub trait ResourceComparator: Send + Sync {
    /// Terraform resource type, e.g. `aws_instance`.
    fn resource_type(&self) -> &'static str;

    /// Snapshot collection name, e.g. `ec2_instances`.
    fn collection(&self) -> &'static str;

    /// Stable identifier from the declared attributes. Matching is by
    /// provider-assigned identifier, never by display name.
    fn declared_id(&self, declared: &DeclaredResource) -> Option<String>;

    /// Stable identifier from a live record.
    fn live_id(&self, live: &Value) -> Option<String>;

    /// Global-scope kinds (IAM) are evaluated only in the primary region.
    fn global_scope(&self) -> bool {
        false
    }

    /// Attribute-level differences between a matched pair. An empty map
    /// means no drift.
    fn compare(
        &self,
        declared: &DeclaredResource,
        live: &Value,
        config: &EngineConfig,
    ) -> DifferenceMap;

    /// Provider-side details attached to `extra` drift items.
    fn extra_details(&self, _live: &Value) -> Option<Value> {
        None
    }
}

static INSTANCE: aws::InstanceComparator = aws::InstanceComparator;
static SECURITY_GROUP: aws::SecurityGroupComparator = aws::SecurityGroupComparator;
static BUCKET: aws::BucketComparator = aws::BucketComparator;
static DATABASE: aws::DatabaseComparator = aws::DatabaseComparator;
static FUNCTION: aws::FunctionComparator = aws::FunctionComparator;
static ROLE: aws::RoleComparator = aws::RoleComparator;
static VPC: aws::GenericComparator = aws::GenericComparator::new("aws_vpc", "vpcs", "VpcId");
static SUBNET: aws::GenericComparator =
    aws::GenericComparator::new("aws_subnet", "subnets", "SubnetId");
static LOAD_BALANCER: aws::GenericComparator =
    aws::GenericComparator::new("aws_lb", "load_balancers", "LoadBalancerName");

static REGISTRY: [&'static dyn ResourceComparator; 9] = [
    &INSTANCE,
    &SECURITY_GROUP,
    &BUCKET,
    &DATABASE,
    &FUNCTION,
    &ROLE,
    &VPC,
    &SUBNET,
    &LOAD_BALANCER,
];

/// Registry in fixed order; drives drift-item emission order per region.
pub fn comparators() -> &'static [&'static dyn ResourceComparator] {
    &REGISTRY
}

pub fn comparator_for(resource_type: &str) -> Option<&'static dyn ResourceComparator> {
    comparators()
        .iter()
        .copied()
        .find(|c| c.resource_type() == resource_type)
}

/// Numeric view of a JSON value; numbers and numeric strings both count, so
/// `"100"` equals `100`.
pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Descends a live record through nested object fields.
pub(crate) fn live_path<'a>(live: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = live;
    for field in path {
        current = current.get(field)?;
    }
    if current.is_null() { None } else { Some(current) }
}

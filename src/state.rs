//! Terraform state parsing.
//!
//! Extracts managed resources from a tfstate-style document into the
//! canonical [`DeclaredResource`] model, grouped by resource type.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::DriftError;
use crate::model::DeclaredResource;

/// Parses a Terraform state document into declared resources grouped by type.
///
/// Only `mode == "managed"` resources are kept. A resource entry missing
/// `type` or `name` is skipped with a warning; a missing `instances` list
/// yields no resources; an instance without `attributes` gets an empty
/// attribute map. Only a structurally invalid document is fatal.
pub fn parse_state(document: &Value) -> Result<HashMap<String, Vec<DeclaredResource>>, DriftError> {
    let root = document
        .as_object()
        .ok_or_else(|| DriftError::State("document is not a JSON object".to_string()))?;

    let resources = match root.get("resources") {
        None => return Ok(HashMap::new()),
        Some(Value::Array(resources)) => resources,
        Some(_) => {
            return Err(DriftError::State(
                "'resources' is not an array".to_string(),
            ));
        }
    };

    let mut declared: HashMap<String, Vec<DeclaredResource>> = HashMap::new();

    for resource in resources {
        if resource.get("mode").and_then(Value::as_str) != Some("managed") {
            continue;
        }

        let resource_type = resource.get("type").and_then(Value::as_str);
        let name = resource.get("name").and_then(Value::as_str);
        let (resource_type, name) = match (resource_type, name) {
            (Some(resource_type), Some(name)) => (resource_type, name),
            _ => {
                tracing::warn!(
                    entry = %resource,
                    "skipping managed resource without type or name"
                );
                continue;
            }
        };

        let instances = resource
            .get("instances")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for instance in instances {
            let attributes = instance
                .get("attributes")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();

            declared
                .entry(resource_type.to_string())
                .or_default()
                .push(DeclaredResource {
                    resource_type: resource_type.to_string(),
                    name: name.to_string(),
                    address: format!("{}.{}", resource_type, name),
                    attributes,
                });
        }
    }

    Ok(declared)
}

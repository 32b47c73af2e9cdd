//! Live snapshot shape validation and access.
//!
//! A snapshot is a mapping from region to resource collections, each a list
//! of provider-shaped records. The engine never fetches this itself; it is
//! handed a complete snapshot and only validates the outer shape.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::DriftError;

/// Validated live snapshot: region -> collection name -> resource records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    regions: BTreeMap<String, BTreeMap<String, Vec<Value>>>,
}

impl Snapshot {
    /// Validates the region -> collection -> list shape.
    ///
    /// Top-level string entries are scan metadata (e.g. a `"region"` marker),
    /// not region identifiers, and are skipped. Missing collections are
    /// tolerated; a present collection that is not a list is fatal.
    pub fn from_value(document: &Value) -> Result<Self, DriftError> {
        let root = document
            .as_object()
            .ok_or_else(|| DriftError::Snapshot("snapshot is not a JSON object".to_string()))?;

        let mut regions = BTreeMap::new();
        for (region, collections) in root {
            // Metadata entries sit next to region keys in provider exports.
            if collections.is_string() {
                continue;
            }
            let collections = collections.as_object().ok_or_else(|| {
                DriftError::Snapshot(format!("region '{}' is not an object", region))
            })?;

            let mut validated = BTreeMap::new();
            for (name, records) in collections {
                let records = records.as_array().ok_or_else(|| {
                    DriftError::Snapshot(format!(
                        "collection '{}' in region '{}' is not a list",
                        name, region
                    ))
                })?;
                validated.insert(name.clone(), records.clone());
            }
            regions.insert(region.clone(), validated);
        }

        Ok(Self { regions })
    }

    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Records in a collection for one region; missing collections are empty.
    pub fn collection(&self, region: &str, name: &str) -> &[Value] {
        self.regions
            .get(region)
            .and_then(|collections| collections.get(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

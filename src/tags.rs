//! Tag reconciliation under an ignore-list policy.
//!
//! Every resource comparator finishes with a tag comparison, so the two
//! provider shapes (a plain object, or a list of `{Key, Value}` pairs) are
//! normalized here once.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

pub type TagMap = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagDifference {
    /// Declared tags after ignore-key filtering.
    pub declared: TagMap,
    /// Live tags after ignore-key filtering.
    pub live: TagMap,
    pub missing_in_live: TagMap,
    pub extra_in_live: TagMap,
    pub changed: BTreeMap<String, ChangedTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangedTag {
    pub declared: Value,
    pub live: Value,
}

/// Normalizes a declared-side tag attribute (a JSON object) into a map.
/// Anything else, including `null`, is an empty tag set.
pub fn declared_tag_map(value: Option<&Value>) -> TagMap {
    match value {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => TagMap::new(),
    }
}

/// Normalizes a live-side tag field into a map. Providers report tags either
/// as a list of `{Key, Value}` records or as a plain object.
pub fn live_tag_map(value: Option<&Value>) -> TagMap {
    match value {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| {
                let key = entry.get("Key")?.as_str()?;
                let value = entry.get("Value")?;
                Some((key.to_string(), value.clone()))
            })
            .collect(),
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => TagMap::new(),
    }
}

/// Compares two tag maps after dropping ignored keys from both sides.
///
/// Returns `None` when the filtered maps are equal. Equality is strict JSON
/// value equality: `"1"` and `1` are different values.
pub fn compare_tags(
    declared: &TagMap,
    live: &TagMap,
    ignore: &BTreeSet<String>,
) -> Option<TagDifference> {
    let declared_filtered: TagMap = declared
        .iter()
        .filter(|(k, _)| !ignore.contains(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let live_filtered: TagMap = live
        .iter()
        .filter(|(k, _)| !ignore.contains(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if declared_filtered == live_filtered {
        return None;
    }

    let missing_in_live: TagMap = declared_filtered
        .iter()
        .filter(|(k, _)| !live_filtered.contains_key(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let extra_in_live: TagMap = live_filtered
        .iter()
        .filter(|(k, _)| !declared_filtered.contains_key(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let changed: BTreeMap<String, ChangedTag> = declared_filtered
        .iter()
        .filter_map(|(k, declared_value)| {
            let live_value = live_filtered.get(k)?;
            if declared_value != live_value {
                Some((
                    k.clone(),
                    ChangedTag {
                        declared: declared_value.clone(),
                        live: live_value.clone(),
                    },
                ))
            } else {
                None
            }
        })
        .collect();

    Some(TagDifference {
        declared: declared_filtered,
        live: live_filtered,
        missing_in_live,
        extra_in_live,
        changed,
    })
}

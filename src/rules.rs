//! Firewall rule-set normalization and comparison.
//!
//! Terraform ingress blocks and provider `IpPermissions` records use
//! different field names for the same rule. Both shapes are normalized to a
//! common tuple and sorted, so rule order in either source never matters and
//! only the set of semantically distinct rules is compared.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct NormalizedRule {
    pub protocol: String,
    pub from_port: Option<i64>,
    pub to_port: Option<i64>,
    /// Sorted; part of rule identity.
    pub cidr_blocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleDifference {
    pub declared: Vec<NormalizedRule>,
    pub live: Vec<NormalizedRule>,
    pub impact: String,
}

fn port_value(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn protocol_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Normalizes Terraform-shaped rules: `protocol`, `from_port`, `to_port`,
/// `cidr_blocks`.
pub fn normalize_declared_rules(rules: &[Value]) -> Vec<NormalizedRule> {
    let mut normalized: Vec<NormalizedRule> = rules
        .iter()
        .map(|rule| {
            let mut cidr_blocks: Vec<String> = rule
                .get("cidr_blocks")
                .and_then(Value::as_array)
                .map(|blocks| {
                    blocks
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            cidr_blocks.sort();
            NormalizedRule {
                protocol: protocol_value(rule.get("protocol")),
                from_port: port_value(rule.get("from_port")),
                to_port: port_value(rule.get("to_port")),
                cidr_blocks,
            }
        })
        .collect();
    normalized.sort();
    normalized
}

/// Normalizes provider-shaped rules: `IpProtocol`, `FromPort`, `ToPort`,
/// `IpRanges[].CidrIp`.
pub fn normalize_live_rules(rules: &[Value]) -> Vec<NormalizedRule> {
    let mut normalized: Vec<NormalizedRule> = rules
        .iter()
        .map(|rule| {
            let mut cidr_blocks: Vec<String> = rule
                .get("IpRanges")
                .and_then(Value::as_array)
                .map(|ranges| {
                    ranges
                        .iter()
                        .filter_map(|range| range.get("CidrIp").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            cidr_blocks.sort();
            NormalizedRule {
                protocol: protocol_value(rule.get("IpProtocol")),
                from_port: port_value(rule.get("FromPort")),
                to_port: port_value(rule.get("ToPort")),
                cidr_blocks,
            }
        })
        .collect();
    normalized.sort();
    normalized
}

/// Compares two rule lists after normalization. Returns `None` when the
/// normalized lists are identical; otherwise one record carrying both full
/// lists and a synthesized impact note.
pub fn compare_rules(declared_rules: &[Value], live_rules: &[Value]) -> Option<RuleDifference> {
    let declared = normalize_declared_rules(declared_rules);
    let live = normalize_live_rules(live_rules);

    if declared == live {
        return None;
    }

    let impact = describe_change(&declared, &live);
    Some(RuleDifference {
        declared,
        live,
        impact,
    })
}

fn describe_change(declared: &[NormalizedRule], live: &[NormalizedRule]) -> String {
    let added: Vec<&NormalizedRule> = live.iter().filter(|r| !declared.contains(r)).collect();
    let removed: Vec<&NormalizedRule> = declared.iter().filter(|r| !live.contains(r)).collect();

    // A rule that shares (protocol, from_port, to_port) with one on the other
    // side but differs in CIDRs reads better as a modification than as an
    // add/remove pair.
    let modified = removed
        .iter()
        .filter(|r| {
            added.iter().any(|a| {
                a.protocol == r.protocol && a.from_port == r.from_port && a.to_port == r.to_port
            })
        })
        .count();

    let mut parts = Vec::new();
    if modified > 0 {
        parts.push(format!(
            "{} rule{} changed CIDR ranges",
            modified,
            if modified == 1 { "" } else { "s" }
        ));
    }
    let pure_added = added.len().saturating_sub(modified);
    if pure_added > 0 {
        parts.push(format!(
            "{} rule{} added in live",
            pure_added,
            if pure_added == 1 { "" } else { "s" }
        ));
    }
    let pure_removed = removed.len().saturating_sub(modified);
    if pure_removed > 0 {
        parts.push(format!(
            "{} rule{} removed in live",
            pure_removed,
            if pure_removed == 1 { "" } else { "s" }
        ));
    }
    if parts.is_empty() {
        return "network rules differ".to_string();
    }
    format!("Network security rules differ: {}", parts.join(", "))
}

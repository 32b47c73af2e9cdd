//! Presentation of a scan report: human table or JSON.
//!
//! The engine emits items in natural scan order; the table view re-sorts by
//! severity then address for readability.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::error::DriftError;
use crate::model::{DriftItem, ScanReport};

#[derive(Tabled)]
struct DriftRow {
    #[tabled(rename = "SEVERITY")]
    severity: String,
    #[tabled(rename = "DRIFT")]
    drift_type: String,
    #[tabled(rename = "TYPE")]
    resource_type: String,
    #[tabled(rename = "ADDRESS")]
    address: String,
    #[tabled(rename = "LIVE ID")]
    live_id: String,
    #[tabled(rename = "REGION")]
    region: String,
}

impl From<&DriftItem> for DriftRow {
    fn from(item: &DriftItem) -> Self {
        Self {
            severity: item.severity.to_string(),
            drift_type: item.drift_type.to_string(),
            resource_type: item.resource_type.clone(),
            address: item.terraform_address.clone(),
            live_id: item.live_id.clone(),
            region: item.region.clone(),
        }
    }
}

pub fn render_table(report: &ScanReport) -> String {
    if report.is_clean() {
        return summary(report);
    }

    let mut items: Vec<&DriftItem> = report.items.iter().collect();
    items.sort_by(|a, b| {
        (a.severity, &a.terraform_address, &a.live_id)
            .cmp(&(b.severity, &b.terraform_address, &b.live_id))
    });

    let rows: Vec<DriftRow> = items.into_iter().map(DriftRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    format!("{}\n\n{}", table, summary(report))
}

pub fn render_json(report: &ScanReport) -> Result<String, DriftError> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn summary(report: &ScanReport) -> String {
    if report.is_clean() && report.skipped.is_empty() {
        return "No drift detected".to_string();
    }

    let by_severity: Vec<String> = report
        .count_by_severity()
        .into_iter()
        .map(|(severity, count)| format!("{} {}", count, severity))
        .collect();

    let mut line = format!(
        "{} drift item(s) detected: {}",
        report.items.len(),
        by_severity.join(", ")
    );
    if !report.skipped.is_empty() {
        line.push_str(&format!(
            " ({} resource(s) skipped)",
            report.skipped.len()
        ));
    }
    line
}

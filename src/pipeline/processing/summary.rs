//! Descriptive tables over the derived indices.
//!
//! Absent index values are excluded from every statistic; they never count
//! as zero.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::constants::INDEX_COLUMNS;
use crate::error::Result;
use crate::pipeline::processing::classify::GroupColumn;
use crate::types::Table;

/// Distribution of one index over all respondents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSummary {
    pub index: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

/// count/mean/std of one index within one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummaryRow {
    pub group_column: String,
    pub group: String,
    pub index: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1); undefined below two values.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

fn describe(index: &str, mut values: Vec<f64>) -> IndexSummary {
    values.sort_by(|a, b| a.total_cmp(b));
    IndexSummary {
        index: index.to_string(),
        count: values.len(),
        mean: mean(&values),
        std: sample_std(&values),
        min: values.first().copied(),
        median: median(&values),
        max: values.last().copied(),
    }
}

/// Index columns present in the table, in canonical order
fn present_indices(table: &Table) -> Vec<&'static str> {
    INDEX_COLUMNS
        .iter()
        .copied()
        .filter(|name| table.column_index(name).is_some())
        .collect()
}

/// Summary row for each index column in the table.
pub fn describe_indices(table: &Table) -> Result<Vec<IndexSummary>> {
    present_indices(table)
        .into_iter()
        .map(|index| {
            let values = table
                .column(index)?
                .into_iter()
                .filter_map(|cell| cell.as_number())
                .collect();
            Ok(describe(index, values))
        })
        .collect()
}

/// count/mean/std per group label for every group column and index.
///
/// Respondents without a label for a group column are left out of that
/// column's rows. Labels are emitted in sorted order.
pub fn summarize_groups(table: &Table, groups: &[GroupColumn]) -> Result<Vec<GroupSummaryRow>> {
    let indices = present_indices(table);
    let mut rows = Vec::new();

    for group in groups {
        let labels = table.column(group.column)?;
        for index in &indices {
            let values = table.column(index)?;
            let mut by_label: BTreeMap<String, Vec<f64>> = BTreeMap::new();
            for (label, value) in labels.iter().zip(values) {
                let Some(label) = label.as_text().map(str::trim).filter(|l| !l.is_empty()) else {
                    continue;
                };
                let bucket = by_label.entry(label.to_string()).or_default();
                if let Some(v) = value.as_number() {
                    bucket.push(v);
                }
            }
            rows.extend(by_label.into_iter().map(|(label, values)| GroupSummaryRow {
                group_column: group.column.to_string(),
                group: label,
                index: index.to_string(),
                count: values.len(),
                mean: mean(&values),
                std: sample_std(&values),
            }));
        }
    }

    Ok(rows)
}

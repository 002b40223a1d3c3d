//! Composite index scoring: the second pipeline stage.

pub mod groups;

use tracing::{info, instrument};

use crate::constants::IDX_CONHECIMENTO_OBJETIVO;
use crate::error::{DataWarning, Result};
use crate::metrics;
use crate::pipeline::processing::clean::coerce_cell;
use crate::types::{Cell, Table};

pub use groups::{AnswerKey, IndexGroup, MEAN_INDEX_GROUPS};

/// Output of the index stage
#[derive(Debug, Clone)]
pub struct IndexOutput {
    pub table: Table,
    pub warnings: Vec<DataWarning>,
}

/// Per-question 0/1 marks for one objective field.
fn mark_answers(table: &Table, field: &str, expected: &str) -> Result<Vec<u8>> {
    Ok(table
        .column(field)?
        .into_iter()
        .map(|cell| match cell.as_text() {
            Some(answer) if answer.trim() == expected => 1,
            _ => 0,
        })
        .collect())
}

/// Number of correct objective answers per respondent (0..=5).
pub fn score_objective(table: &Table, answer_key: &AnswerKey) -> Result<Vec<u8>> {
    let mut totals = vec![0u8; table.len()];
    for (field, expected) in answer_key.entries() {
        for (total, mark) in totals.iter_mut().zip(mark_answers(table, field, expected)?) {
            *total += mark;
        }
    }
    Ok(totals)
}

/// Mean of the present values of `group` per respondent; `None` when the
/// respondent answered none of the group's fields.
pub fn mean_index(table: &Table, group: &IndexGroup) -> Result<Vec<Option<f64>>> {
    let columns = group
        .fields
        .iter()
        .map(|field| table.require_column(field))
        .collect::<Result<Vec<usize>>>()?;

    Ok(table
        .rows()
        .iter()
        .map(|row| {
            let values: Vec<f64> = columns.iter().filter_map(|&i| row[i].as_number()).collect();
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        })
        .collect())
}

/// Run the index stage on a cleaned table.
///
/// Objective columns are replaced by their 0/1 marks, the ordinal columns
/// of every group are coerced to numbers, and the five index columns are
/// appended.
#[instrument(skip(cleaned, answer_key), fields(rows = cleaned.len()))]
pub fn build_indices(cleaned: &Table, answer_key: &AnswerKey) -> Result<IndexOutput> {
    let mut warnings = Vec::new();
    let mut table = cleaned.clone();

    let objective = score_objective(cleaned, answer_key)?;
    for (field, expected) in answer_key.entries() {
        let marks = mark_answers(cleaned, field, expected)?;
        table = table.with_column(field, marks.into_iter().map(|m| Cell::Integer(m.into())).collect())?;
    }

    for group in MEAN_INDEX_GROUPS.iter() {
        for field in group.fields {
            let cells: Vec<Cell> = table
                .column(field)?
                .into_iter()
                .enumerate()
                .map(|(row, cell)| {
                    coerce_cell(cell, row, field, &mut warnings, metrics::indices::coercion_warning)
                })
                .collect();
            table = table.with_column(field, cells)?;
        }
    }

    table = table.with_column(
        IDX_CONHECIMENTO_OBJETIVO,
        objective.into_iter().map(|n| Cell::Integer(n.into())).collect(),
    )?;

    for group in MEAN_INDEX_GROUPS.iter() {
        let values = mean_index(&table, group)?;
        let absent = values.iter().filter(|v| v.is_none()).count();
        if absent > 0 {
            info!(index = group.index, absent, "index undefined for some respondents");
            metrics::indices::index_absent(group.index, absent);
        }
        table = table.with_column(group.index, values.into_iter().map(Cell::from_number).collect())?;
    }

    metrics::indices::respondents_scored(table.len());
    Ok(IndexOutput { table, warnings })
}

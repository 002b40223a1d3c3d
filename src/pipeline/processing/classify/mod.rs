//! Group classification: the third pipeline stage.

pub mod rules;

use tracing::{info, instrument, warn};

use crate::constants::{GRUPO_AREA, GRUPO_CURSO, GRUPO_CURSOU_SI};
use crate::error::{DataWarning, PipelineError, Result};
use crate::metrics;
use crate::pipeline::processing::clean::normalize_multiselect;
use crate::types::{Cell, Table};

pub use rules::{
    classify_macro_area, classify_security_training, classify_training, map_macro_area,
    Classified, MacroArea, TrainingStatus,
};

/// A categorical column produced by this stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupColumn {
    pub column: &'static str,
    pub label: &'static str,
    /// Accepted source columns, most specific first
    pub sources: &'static [&'static str],
}

pub const COURSE_GROUP: GroupColumn = GroupColumn {
    column: GRUPO_CURSO,
    label: "Curso",
    sources: &["perfil_curso", "curso"],
};

pub const AREA_GROUP: GroupColumn = GroupColumn {
    column: GRUPO_AREA,
    label: "Área (macrogrupos)",
    sources: &[
        "perfil_area_interesse",
        "perfil_area_atuacao",
        "perfil_area",
        "area",
        "atuacao",
    ],
};

pub const TRAINING_GROUP: GroupColumn = GroupColumn {
    column: GRUPO_CURSOU_SI,
    label: "Cursou disciplina/atividade de SI",
    sources: &["perfil_si_disc_ativ", "perfil_si", "si_disciplina"],
};

pub const GROUP_COLUMNS: [GroupColumn; 3] = [COURSE_GROUP, AREA_GROUP, TRAINING_GROUP];

/// Categorical labels for one respondent; `None` where the source column
/// is missing from the table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupAssignment {
    pub course: Option<String>,
    pub macro_area: Option<MacroArea>,
    pub security_training: Option<TrainingStatus>,
}

/// Output of the classification stage
#[derive(Debug, Clone)]
pub struct ClassifyOutput {
    pub table: Table,
    /// Group columns that were actually built
    pub groups: Vec<GroupColumn>,
    pub assignments: Vec<GroupAssignment>,
    pub warnings: Vec<DataWarning>,
}

/// First candidate column present in the table.
fn coalesce_column(table: &Table, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|name| table.column_index(name))
}

/// Selected options of a multi-select cell. Cells read back from CSV hold
/// the JSON array written by the cleaning stage; plain comma-separated
/// text is accepted too.
pub fn parse_option_list(cell: &Cell) -> Vec<String> {
    match cell {
        Cell::Options(items) => items.clone(),
        Cell::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Vec::new();
            }
            serde_json::from_str::<Vec<String>>(trimmed)
                .unwrap_or_else(|_| normalize_multiselect(Some(trimmed)))
        }
        _ => Vec::new(),
    }
}

/// Trimmed course name; blank is absent.
fn course_label(cell: &Cell) -> Option<String> {
    cell.as_text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn record_fallback(warnings: &mut Vec<DataWarning>, row: usize, classifier: &str, input: String) {
    let warning = DataWarning::EmptyGroup {
        row,
        classifier: classifier.to_string(),
        input,
    };
    warn!("{}", warning);
    metrics::classify::fallback_applied(classifier);
    warnings.push(warning);
}

/// Run the classification stage on an indexed table.
///
/// Groups whose source column is missing are skipped with a warning; the
/// stage fails only when no group can be built.
#[instrument(skip(indexed), fields(rows = indexed.len()))]
pub fn classify(indexed: &Table) -> Result<ClassifyOutput> {
    let course_col = coalesce_column(indexed, COURSE_GROUP.sources);
    let area_col = coalesce_column(indexed, AREA_GROUP.sources);
    let training_col = coalesce_column(indexed, TRAINING_GROUP.sources);

    for (group, col) in [
        (COURSE_GROUP, course_col),
        (AREA_GROUP, area_col),
        (TRAINING_GROUP, training_col),
    ] {
        if col.is_none() {
            warn!(
                group = group.column,
                candidates = ?group.sources,
                "source column not found, group skipped"
            );
        }
    }

    if course_col.is_none() && area_col.is_none() && training_col.is_none() {
        return Err(PipelineError::NoGroups);
    }

    let mut warnings = Vec::new();
    let assignments: Vec<GroupAssignment> = indexed
        .rows()
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let course = course_col.and_then(|i| course_label(&cells[i]));

            let macro_area = area_col.map(|i| {
                let raw = cells[i].as_text();
                let result = classify_macro_area(raw);
                if !result.matched {
                    record_fallback(&mut warnings, row, "macro_area", raw.unwrap_or("").to_string());
                }
                result.label
            });

            let security_training = training_col.map(|i| {
                let items = parse_option_list(&cells[i]);
                let result = classify_training(&items);
                if !result.matched {
                    record_fallback(&mut warnings, row, "security_training", items.join(", "));
                }
                result.label
            });

            GroupAssignment {
                course,
                macro_area,
                security_training,
            }
        })
        .collect();

    let mut table = indexed.clone();
    let mut groups = Vec::new();

    if course_col.is_some() {
        let cells = assignments
            .iter()
            .map(|a| a.course.clone().map(Cell::Text).unwrap_or(Cell::Absent))
            .collect();
        table = table.with_column(COURSE_GROUP.column, cells)?;
        groups.push(COURSE_GROUP);
    }
    if area_col.is_some() {
        let cells = assignments
            .iter()
            .map(|a| {
                a.macro_area
                    .map(|m| Cell::Text(m.label().to_string()))
                    .unwrap_or(Cell::Absent)
            })
            .collect();
        table = table.with_column(AREA_GROUP.column, cells)?;
        groups.push(AREA_GROUP);
    }
    if training_col.is_some() {
        let cells = assignments
            .iter()
            .map(|a| {
                a.security_training
                    .map(|t| Cell::Text(t.label().to_string()))
                    .unwrap_or(Cell::Absent)
            })
            .collect();
        table = table.with_column(TRAINING_GROUP.column, cells)?;
        groups.push(TRAINING_GROUP);
    }

    info!(
        groups = groups.len(),
        fallbacks = warnings.len(),
        "Classified respondents"
    );
    metrics::classify::respondents_classified(table.len());

    Ok(ClassifyOutput {
        table,
        groups,
        assignments,
        warnings,
    })
}

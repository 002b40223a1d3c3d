//! Column resolution and cleaning: the first pipeline stage.
//!
//! Takes the raw form export, drops sensitive columns, renames every
//! registry field to its canonical identifier and normalizes multi-select
//! and ordinal answers.

pub mod registry;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, instrument, warn};

use crate::error::{DataWarning, PipelineError, Result};
use crate::metrics;
use crate::types::{Cell, FieldMapping, Table};

pub use registry::{resolve_column, validate_registry, FieldKind, FieldSpec, FIELD_SPECS};

static TIMESTAMP_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)carimbo de data/hora|timestamp").expect("valid timestamp pattern")
});

static CONTACT_EMAIL_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)se sim, informe seu e-mail").expect("valid contact e-mail pattern")
});

/// Output of the cleaning stage
#[derive(Debug, Clone)]
pub struct CleanOutput {
    pub table: Table,
    /// Codebook, sorted by canonical name
    pub mapping: Vec<FieldMapping>,
    pub dropped: Vec<String>,
    pub warnings: Vec<DataWarning>,
}

/// Remove the timestamp, consent and contact e-mail columns.
///
/// Returns the reduced table and the dropped headers in table order.
pub fn drop_sensitive(table: &Table, consent_position: usize) -> Result<(Table, Vec<String>)> {
    let headers = table.headers();
    if consent_position >= headers.len() {
        return Err(PipelineError::InvalidInput(format!(
            "expected a consent column at position {} but the table has {} columns",
            consent_position,
            headers.len()
        )));
    }

    let mut drop: BTreeSet<usize> = BTreeSet::new();
    for (i, header) in headers.iter().enumerate() {
        if TIMESTAMP_HEADER.is_match(header) || CONTACT_EMAIL_HEADER.is_match(header) {
            drop.insert(i);
        }
    }
    drop.insert(consent_position);

    let dropped: Vec<String> = drop.iter().map(|&i| headers[i].clone()).collect();
    metrics::clean::columns_dropped(dropped.len());
    Ok((table.without_columns(&drop), dropped))
}

/// Rename every registry field to its canonical identifier.
///
/// Columns no spec matches keep their original header.
pub fn rename_to_canonical(table: &Table, specs: &[FieldSpec]) -> Result<(Table, Vec<FieldMapping>)> {
    let resolutions = validate_registry(table.headers(), specs)?;

    let rename: HashMap<usize, String> = resolutions
        .iter()
        .map(|r| (r.position, r.spec.canonical.to_string()))
        .collect();

    let mut mapping: Vec<FieldMapping> = resolutions
        .into_iter()
        .map(|r| FieldMapping {
            original: r.header,
            canonical: r.spec.canonical.to_string(),
        })
        .collect();
    mapping.sort_by(|a, b| a.canonical.cmp(&b.canonical));

    metrics::clean::fields_resolved(mapping.len());
    Ok((table.renamed_at(&rename), mapping))
}

/// Split a multi-select answer on commas, trimming and dropping empty
/// fragments. Absent input is an empty selection.
pub fn normalize_multiselect(value: Option<&str>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Parse an ordinal answer; anything non-numeric is absent.
pub fn coerce_ordinal(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Coerce one cell to a number, recording a warning when a present value
/// could not be parsed. `count` is the calling stage's coercion counter.
pub(crate) fn coerce_cell(
    cell: &Cell,
    row: usize,
    field: &str,
    warnings: &mut Vec<DataWarning>,
    count: fn(&str),
) -> Cell {
    let value = match cell {
        Cell::Absent => return Cell::Absent,
        Cell::Number(_) | Cell::Integer(_) => return Cell::from_number(cell.as_number()),
        Cell::Text(raw) => match coerce_ordinal(Some(raw)) {
            Some(v) => return Cell::Number(v),
            None => raw.clone(),
        },
        Cell::Options(items) => items.join(", "),
    };

    let warning = DataWarning::ValueCoercion {
        row,
        field: field.to_string(),
        value,
    };
    warn!("{}", warning);
    count(field);
    warnings.push(warning);
    Cell::Absent
}

/// Run the whole cleaning stage on a raw export.
#[instrument(skip(raw), fields(rows = raw.len(), columns = raw.headers().len()))]
pub fn clean(raw: &Table, consent_position: usize) -> Result<CleanOutput> {
    let (reduced, dropped) = drop_sensitive(raw, consent_position)?;
    info!("Dropped {} sensitive columns", dropped.len());

    let (renamed, mapping) = rename_to_canonical(&reduced, FIELD_SPECS)?;
    info!("Resolved {} canonical fields", mapping.len());

    let mut warnings = Vec::new();
    let mut table = renamed;
    for spec in FIELD_SPECS {
        let cells: Vec<Cell> = match spec.kind {
            FieldKind::MultiSelect => table
                .column(spec.canonical)?
                .into_iter()
                .map(|cell| Cell::Options(normalize_multiselect(cell.as_text())))
                .collect(),
            FieldKind::Ordinal => table
                .column(spec.canonical)?
                .into_iter()
                .enumerate()
                .map(|(row, cell)| {
                    coerce_cell(cell, row, spec.canonical, &mut warnings, metrics::clean::coercion_warning)
                })
                .collect(),
            _ => continue,
        };
        table = table.with_column(spec.canonical, cells)?;
    }

    metrics::clean::respondents_processed(table.len());
    Ok(CleanOutput {
        table,
        mapping,
        dropped,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_records(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn multiselect_preserves_order_and_duplicates() {
        assert_eq!(normalize_multiselect(Some("A, B, B")), vec!["A", "B", "B"]);
        assert_eq!(normalize_multiselect(Some(" , A,,")), vec!["A"]);
        assert!(normalize_multiselect(None).is_empty());
    }

    #[test]
    fn ordinal_coercion() {
        assert_eq!(coerce_ordinal(Some("4")), Some(4.0));
        assert_eq!(coerce_ordinal(Some(" 2.5 ")), Some(2.5));
        assert_eq!(coerce_ordinal(Some("Concordo")), None);
        assert_eq!(coerce_ordinal(Some("NaN")), None);
        assert_eq!(coerce_ordinal(Some("")), None);
        assert_eq!(coerce_ordinal(None), None);
    }

    thread_local! {
        static COUNTED: std::cell::RefCell<Vec<String>> = const { std::cell::RefCell::new(Vec::new()) };
    }

    fn count_field(field: &str) {
        COUNTED.with(|c| c.borrow_mut().push(field.to_string()));
    }

    #[test]
    fn coerce_cell_warns_only_on_present_garbage() {
        let mut warnings = Vec::new();
        assert_eq!(coerce_cell(&Cell::Absent, 0, "f", &mut warnings, count_field), Cell::Absent);
        assert_eq!(
            coerce_cell(&Cell::Text("3".to_string()), 1, "f", &mut warnings, count_field),
            Cell::Number(3.0)
        );
        assert!(warnings.is_empty());
        assert!(COUNTED.with(|c| c.borrow().is_empty()));

        assert_eq!(
            coerce_cell(&Cell::Text("sempre".to_string()), 2, "f", &mut warnings, count_field),
            Cell::Absent
        );
        assert_eq!(COUNTED.with(|c| c.borrow().clone()), vec!["f".to_string()]);
        assert_eq!(
            warnings,
            vec![DataWarning::ValueCoercion {
                row: 2,
                field: "f".to_string(),
                value: "sempre".to_string(),
            }]
        );
    }

    #[test]
    fn drops_timestamp_consent_and_email() {
        let table = raw(
            &[
                "Carimbo de data/hora",
                "Você concorda em participar?",
                "Qual sua idade?",
                "Se sim, informe seu e-mail",
            ],
            &[&["2024-05-01 10:00", "Sim", "21", "a@b.c"]],
        );
        let (reduced, dropped) = drop_sensitive(&table, 1).unwrap();
        assert_eq!(reduced.headers(), &["Qual sua idade?"]);
        assert_eq!(dropped.len(), 3);
        assert_eq!(reduced.rows()[0], vec![Cell::Text("21".to_string())]);
    }

    #[test]
    fn consent_position_counts_once_when_it_is_also_a_pattern_hit() {
        let table = raw(&["Nome", "Timestamp", "Idade"], &[&["x", "y", "z"]]);
        let (reduced, dropped) = drop_sensitive(&table, 1).unwrap();
        assert_eq!(dropped, vec!["Timestamp".to_string()]);
        assert_eq!(reduced.headers(), &["Nome", "Idade"]);
    }

    #[test]
    fn narrow_table_has_no_consent_column() {
        let table = raw(&["Timestamp"], &[]);
        let err = drop_sensitive(&table, 1).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn rename_keeps_unmatched_columns_and_sorts_codebook() {
        let specs = [
            FieldSpec {
                canonical: "perfil_so",
                needles: &["sistema operacional"],
                kind: FieldKind::Profile,
            },
            FieldSpec {
                canonical: "perfil_idade",
                needles: &["idade"],
                kind: FieldKind::Profile,
            },
        ];
        let table = raw(
            &["Qual sua idade?", "Observações", "Qual Sistema Operacional você usa?"],
            &[&["20", "", "Linux"]],
        );
        let (renamed, mapping) = rename_to_canonical(&table, &specs).unwrap();
        assert_eq!(renamed.headers(), &["perfil_idade", "Observações", "perfil_so"]);
        assert_eq!(mapping[0].canonical, "perfil_idade");
        assert_eq!(mapping[0].original, "Qual sua idade?");
        assert_eq!(mapping[1].canonical, "perfil_so");
    }

    #[test]
    fn repeated_question_title_is_renamed_once() {
        let specs = [FieldSpec {
            canonical: "perfil_idade",
            needles: &["idade"],
            kind: FieldKind::Profile,
        }];
        let table = raw(&["Qual sua idade?", "Qual sua idade?"], &[&["20", "21"]]);
        let (renamed, mapping) = rename_to_canonical(&table, &specs).unwrap();
        assert_eq!(renamed.headers(), &["perfil_idade", "Qual sua idade?"]);
        assert_eq!(mapping.len(), 1);
        assert_eq!(renamed.column("perfil_idade").unwrap()[0].as_text(), Some("20"));
    }

    #[test]
    fn rename_fails_fast_on_missing_field() {
        let table = raw(&["Nome"], &[&["x"]]);
        let err = rename_to_canonical(&table, FIELD_SPECS).unwrap_err();
        match err {
            PipelineError::ColumnNotFound { field, .. } => assert_eq!(field, "perfil_idade"),
            other => panic!("unexpected error: {other}"),
        }
    }
}

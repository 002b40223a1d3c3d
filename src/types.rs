use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A single table value. `Absent` is the explicit "no data" marker and is
/// never interchangeable with zero or with an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Absent,
    Text(String),
    Number(f64),
    Integer(i64),
    /// Selected options of a multi-select field, in source order.
    Options(Vec<String>),
}

impl Cell {
    /// Raw spreadsheet value: an empty field is absent.
    pub fn from_raw(raw: &str) -> Self {
        if raw.is_empty() {
            Cell::Absent
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn from_number(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Absent)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view of the cell. Text is parsed leniently; anything that
    /// does not yield a finite number is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_finite() => Some(*v),
            Cell::Integer(v) => Some(*v as f64),
            Cell::Text(s) => crate::pipeline::processing::clean::coerce_ordinal(Some(s)),
            _ => None,
        }
    }

    /// Rendering used for CSV output.
    pub fn to_field(&self) -> Result<String> {
        Ok(match self {
            Cell::Absent => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(v) if v.is_finite() => format!("{:?}", v),
            Cell::Number(_) => String::new(),
            Cell::Integer(v) => v.to_string(),
            Cell::Options(items) => serde_json::to_string(items)?,
        })
    }
}

/// One row per respondent, identified by position only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(PipelineError::InvalidInput(format!(
                "row {} has {} cells, expected {}",
                index,
                row.len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }

    /// Build a raw table from string records.
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<String>>) -> Result<Self> {
        let rows = records
            .into_iter()
            .map(|record| record.iter().map(|v| Cell::from_raw(v)).collect())
            .collect();
        Self::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Position of a column that must exist.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::column_not_found(name, &[name]))
    }

    pub fn column(&self, name: &str) -> Result<Vec<&Cell>> {
        let index = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// New snapshot with `name` set to `cells`: replaced in place when the
    /// column exists, appended otherwise.
    pub fn with_column(mut self, name: &str, cells: Vec<Cell>) -> Result<Self> {
        if cells.len() != self.rows.len() {
            return Err(PipelineError::InvalidInput(format!(
                "column '{}' has {} cells for {} rows",
                name,
                cells.len(),
                self.rows.len()
            )));
        }
        match self.column_index(name) {
            Some(index) => {
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row[index] = cell;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row.push(cell);
                }
            }
        }
        Ok(self)
    }

    /// New snapshot without the columns at `positions`.
    pub fn without_columns(&self, positions: &BTreeSet<usize>) -> Self {
        let keep = |i: &usize| !positions.contains(i);
        let headers = (0..self.headers.len())
            .filter(keep)
            .map(|i| self.headers[i].clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                (0..row.len())
                    .filter(keep)
                    .map(|i| row[i].clone())
                    .collect()
            })
            .collect();
        Self { headers, rows }
    }

    /// New snapshot with the headers at the given positions renamed; every
    /// other header is kept, even when it repeats a renamed one.
    pub fn renamed_at(&self, mapping: &HashMap<usize, String>) -> Self {
        let headers = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| mapping.get(&i).cloned().unwrap_or_else(|| h.clone()))
            .collect();
        Self {
            headers,
            rows: self.rows.clone(),
        }
    }
}

/// Codebook entry: where a canonical column came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(rename = "coluna_original")]
    pub original: String,
    #[serde(rename = "coluna_no_dataset")]
    pub canonical: String,
}

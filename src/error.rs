use serde::Serialize;
use thiserror::Error;

/// Fatal pipeline failures. Any of these aborts the whole run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Column not found for field '{field}' (substrings: {needles:?})")]
    ColumnNotFound { field: String, needles: Vec<String> },

    #[error("Column '{header}' matched by both '{field}' and '{other}'")]
    AmbiguousColumn {
        header: String,
        field: String,
        other: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No group column could be built from the available columns")]
    NoGroups,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn column_not_found(field: &str, needles: &[&str]) -> Self {
        PipelineError::ColumnNotFound {
            field: field.to_string(),
            needles: needles.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Non-fatal data-quality issues. The affected cell becomes absent (or the
/// fallback category is applied) and processing continues.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    #[error("row {row}: '{value}' in '{field}' is not numeric, treated as absent")]
    ValueCoercion {
        row: usize,
        field: String,
        value: String,
    },

    #[error("row {row}: no {classifier} rule matched '{input}', fallback applied")]
    EmptyGroup {
        row: usize,
        classifier: String,
        input: String,
    },
}

impl DataWarning {
    pub fn kind(&self) -> &'static str {
        match self {
            DataWarning::ValueCoercion { .. } => "value_coercion",
            DataWarning::EmptyGroup { .. } => "empty_group",
        }
    }
}

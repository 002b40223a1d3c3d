use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::types::Table;

/// Read a CSV export with a header row. Empty fields become absent cells.
pub fn read_table_from<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let mut headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if let Some(first) = headers.first_mut() {
        *first = first.trim_start_matches('\u{feff}').to_string();
    }
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(PipelineError::InvalidInput("input has no header row".to_string()));
    }

    let mut records = Vec::new();
    for record in rdr.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Table::from_records(headers, records)
}

pub fn read_table(path: &Path) -> Result<Table> {
    let table = read_table_from(File::open(path)?)?;
    info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.headers().len(),
        path.display()
    );
    Ok(table)
}

pub fn write_table_to<W: Write>(writer: W, table: &Table) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(table.headers())?;
    for row in table.rows() {
        let fields = row.iter().map(|c| c.to_field()).collect::<Result<Vec<String>>>()?;
        wtr.write_record(&fields)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    ensure_parent(path)?;
    write_table_to(File::create(path)?, table)
}

/// Write serializable rows with a header derived from the field names.
pub fn write_records<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = WriterBuilder::new().from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Hex SHA-256 of a file, recorded in the run manifest.
pub fn file_sha256(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

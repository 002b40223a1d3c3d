use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::app::ports::{Artifact, PipelineOutputPort};
use crate::app::survey_use_case::PipelineResult;
use crate::config::OutputFiles;
use crate::error::Result;
use crate::infra::csv_table::{write_records, write_table};
use crate::pipeline::processing::summary::{GroupSummaryRow, IndexSummary};
use crate::types::{FieldMapping, Table};

/// File-based implementation of PipelineOutputPort.
/// Tables and reports are CSV, the manifest is pretty-printed JSON.
/// The output directory is created on first write.
pub struct FileOutputAdapter {
    output_dir: PathBuf,
    files: OutputFiles,
}

impl FileOutputAdapter {
    pub fn new(output_dir: PathBuf, files: OutputFiles) -> Self {
        Self { output_dir, files }
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        let name = match artifact {
            Artifact::Cleaned => &self.files.cleaned,
            Artifact::Codebook => &self.files.codebook,
            Artifact::Indexed => &self.files.indexed,
            Artifact::Grouped => &self.files.grouped,
            Artifact::IndexSummary => &self.files.index_summary,
            Artifact::GroupSummary => &self.files.group_summary,
            Artifact::Manifest => &self.files.manifest,
        };
        self.output_dir.join(name)
    }
}

impl PipelineOutputPort for FileOutputAdapter {
    fn write_table(&self, artifact: Artifact, table: &Table) -> Result<()> {
        let path = self.path(artifact);
        write_table(&path, table)?;
        info!("Saved {:?} table to {}", artifact, path.display());
        Ok(())
    }

    fn write_codebook(&self, mapping: &[FieldMapping]) -> Result<()> {
        let path = self.path(Artifact::Codebook);
        write_records(&path, mapping)?;
        info!("Saved codebook ({} fields) to {}", mapping.len(), path.display());
        Ok(())
    }

    fn write_index_summary(&self, rows: &[IndexSummary]) -> Result<()> {
        let path = self.path(Artifact::IndexSummary);
        write_records(&path, rows)?;
        info!("Saved index summary to {}", path.display());
        Ok(())
    }

    fn write_group_summary(&self, rows: &[GroupSummaryRow]) -> Result<()> {
        let path = self.path(Artifact::GroupSummary);
        write_records(&path, rows)?;
        info!("Saved group summary to {}", path.display());
        Ok(())
    }

    fn write_manifest(&self, result: &PipelineResult) -> Result<()> {
        let path = self.path(Artifact::Manifest);
        fs::create_dir_all(&self.output_dir)?;
        fs::write(&path, serde_json::to_string_pretty(result)?)?;
        info!("Saved run manifest to {}", path.display());
        Ok(())
    }

    fn location(&self, artifact: Artifact) -> String {
        self.path(artifact).display().to_string()
    }
}

/// Everything a run wrote, kept in memory
#[derive(Debug, Default, Clone)]
pub struct CapturedOutputs {
    pub tables: HashMap<Artifact, Table>,
    pub codebook: Vec<FieldMapping>,
    pub index_summary: Vec<IndexSummary>,
    pub group_summary: Vec<GroupSummaryRow>,
    pub manifest: Option<PipelineResult>,
}

/// In-memory implementation of PipelineOutputPort.
///
/// Clones share the same captures, so a test can keep one handle and box
/// the other into a use case.
#[derive(Default, Clone)]
pub struct MemoryOutputAdapter {
    captured: Arc<Mutex<CapturedOutputs>>,
}

impl MemoryOutputAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CapturedOutputs {
        self.captured
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn with<F: FnOnce(&mut CapturedOutputs)>(&self, f: F) {
        match self.captured.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl PipelineOutputPort for MemoryOutputAdapter {
    fn write_table(&self, artifact: Artifact, table: &Table) -> Result<()> {
        self.with(|c| {
            c.tables.insert(artifact, table.clone());
        });
        Ok(())
    }

    fn write_codebook(&self, mapping: &[FieldMapping]) -> Result<()> {
        self.with(|c| c.codebook = mapping.to_vec());
        Ok(())
    }

    fn write_index_summary(&self, rows: &[IndexSummary]) -> Result<()> {
        self.with(|c| c.index_summary = rows.to_vec());
        Ok(())
    }

    fn write_group_summary(&self, rows: &[GroupSummaryRow]) -> Result<()> {
        self.with(|c| c.group_summary = rows.to_vec());
        Ok(())
    }

    fn write_manifest(&self, result: &PipelineResult) -> Result<()> {
        self.with(|c| c.manifest = Some(result.clone()));
        Ok(())
    }

    fn location(&self, artifact: Artifact) -> String {
        format!("memory://{:?}", artifact)
    }
}

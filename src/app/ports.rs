use crate::app::survey_use_case::PipelineResult;
use crate::error::Result;
use crate::pipeline::processing::summary::{GroupSummaryRow, IndexSummary};
use crate::types::{FieldMapping, Table};

/// Artifacts a pipeline run can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Cleaned,
    Codebook,
    Indexed,
    Grouped,
    IndexSummary,
    GroupSummary,
    Manifest,
}

/// Destination for stage outputs
pub trait PipelineOutputPort {
    fn write_table(&self, artifact: Artifact, table: &Table) -> Result<()>;

    fn write_codebook(&self, mapping: &[FieldMapping]) -> Result<()>;

    fn write_index_summary(&self, rows: &[IndexSummary]) -> Result<()>;

    fn write_group_summary(&self, rows: &[GroupSummaryRow]) -> Result<()>;

    fn write_manifest(&self, result: &PipelineResult) -> Result<()>;

    /// Human-readable location of an artifact, recorded in the manifest
    fn location(&self, artifact: Artifact) -> String;
}

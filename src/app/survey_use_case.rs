use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::app::ports::{Artifact, PipelineOutputPort};
use crate::error::{DataWarning, Result};
use crate::metrics;
use crate::pipeline::processing::classify::{classify, ClassifyOutput};
use crate::pipeline::processing::clean::registry::Resolution;
use crate::pipeline::processing::clean::{clean, drop_sensitive, validate_registry, CleanOutput, FIELD_SPECS};
use crate::pipeline::processing::indices::{build_indices, AnswerKey, IndexOutput};
use crate::pipeline::processing::summary::{describe_indices, summarize_groups, IndexSummary};
use crate::types::Table;

/// Run manifest written next to the artifacts of a full run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub input_sha256: Option<String>,
    pub respondents: usize,
    pub dropped_columns: Vec<String>,
    pub mapped_fields: usize,
    /// Group columns built by the classification stage
    pub groups: Vec<String>,
    /// Non-fatal warnings per kind
    pub warnings: BTreeMap<String, usize>,
    pub artifacts: Vec<String>,
}

/// Use case running the survey stages and handing their outputs to a port
pub struct SurveyUseCase {
    output: Box<dyn PipelineOutputPort>,
    consent_position: usize,
    answer_key: AnswerKey,
}

impl SurveyUseCase {
    pub fn new(output: Box<dyn PipelineOutputPort>, consent_position: usize, answer_key: AnswerKey) -> Self {
        Self {
            output,
            consent_position,
            answer_key,
        }
    }

    /// Use case with the default consent position and answer key
    pub fn with_defaults(output: Box<dyn PipelineOutputPort>) -> Self {
        Self::new(output, crate::constants::DEFAULT_CONSENT_POSITION, AnswerKey::default())
    }

    /// Run every stage, then write all artifacts and the manifest.
    ///
    /// Nothing is written unless every stage succeeds.
    #[instrument(skip(self, raw, input_sha256), fields(rows = raw.len()))]
    pub fn run_all(&self, raw: &Table, input_sha256: Option<String>) -> Result<PipelineResult> {
        let started = Instant::now();

        let cleaned = clean(raw, self.consent_position)?;
        let indexed = build_indices(&cleaned.table, &self.answer_key)?;
        let grouped = classify(&indexed.table)?;
        let index_summary = describe_indices(&indexed.table)?;
        let group_summary = summarize_groups(&grouped.table, &grouped.groups)?;

        self.output.write_table(Artifact::Cleaned, &cleaned.table)?;
        self.output.write_codebook(&cleaned.mapping)?;
        self.output.write_table(Artifact::Indexed, &indexed.table)?;
        self.output.write_table(Artifact::Grouped, &grouped.table)?;
        self.output.write_index_summary(&index_summary)?;
        self.output.write_group_summary(&group_summary)?;

        let artifacts = [
            Artifact::Cleaned,
            Artifact::Codebook,
            Artifact::Indexed,
            Artifact::Grouped,
            Artifact::IndexSummary,
            Artifact::GroupSummary,
            Artifact::Manifest,
        ]
        .iter()
        .map(|a| self.output.location(*a))
        .collect();

        let result = PipelineResult {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            input_sha256,
            respondents: grouped.table.len(),
            dropped_columns: cleaned.dropped.clone(),
            mapped_fields: cleaned.mapping.len(),
            groups: grouped.groups.iter().map(|g| g.column.to_string()).collect(),
            warnings: warning_totals(
                cleaned
                    .warnings
                    .iter()
                    .chain(&indexed.warnings)
                    .chain(&grouped.warnings),
            ),
            artifacts,
        };
        self.output.write_manifest(&result)?;

        metrics::run::duration(started.elapsed().as_secs_f64());
        info!(
            run_id = %result.run_id,
            respondents = result.respondents,
            warnings = ?result.warnings,
            "Pipeline run complete"
        );
        Ok(result)
    }

    /// Stage 1: cleaned table and codebook.
    pub fn run_clean(&self, raw: &Table) -> Result<CleanOutput> {
        let cleaned = clean(raw, self.consent_position)?;
        self.output.write_table(Artifact::Cleaned, &cleaned.table)?;
        self.output.write_codebook(&cleaned.mapping)?;
        log_warnings("clean", &cleaned.warnings);
        Ok(cleaned)
    }

    /// Stage 2: indexed table from a cleaned one.
    pub fn run_indices(&self, cleaned: &Table) -> Result<IndexOutput> {
        let indexed = build_indices(cleaned, &self.answer_key)?;
        self.output.write_table(Artifact::Indexed, &indexed.table)?;
        log_warnings("indices", &indexed.warnings);
        Ok(indexed)
    }

    /// Stage 3: grouped table and group summary from an indexed one.
    pub fn run_groups(&self, indexed: &Table) -> Result<ClassifyOutput> {
        let grouped = classify(indexed)?;
        let summary = summarize_groups(&grouped.table, &grouped.groups)?;
        self.output.write_table(Artifact::Grouped, &grouped.table)?;
        self.output.write_group_summary(&summary)?;
        log_warnings("classify", &grouped.warnings);
        Ok(grouped)
    }

    /// Descriptive statistics of the indices of an indexed table.
    pub fn run_describe(&self, indexed: &Table) -> Result<Vec<IndexSummary>> {
        let summary = describe_indices(indexed)?;
        self.output.write_index_summary(&summary)?;
        Ok(summary)
    }

    /// Resolve the whole registry against the raw headers without
    /// touching any data.
    pub fn check_columns(&self, raw: &Table) -> Result<Vec<Resolution>> {
        check_columns(raw, self.consent_position)
    }
}

/// Registry validation against a raw export. Writes nothing.
pub fn check_columns(raw: &Table, consent_position: usize) -> Result<Vec<Resolution>> {
    let (reduced, _) = drop_sensitive(raw, consent_position)?;
    validate_registry(reduced.headers(), FIELD_SPECS)
}

fn warning_totals<'a>(warnings: impl Iterator<Item = &'a DataWarning>) -> BTreeMap<String, usize> {
    let mut totals: BTreeMap<&'static str, usize> = BTreeMap::new();
    for warning in warnings {
        *totals.entry(warning.kind()).or_insert(0) += 1;
    }
    totals
        .into_iter()
        .map(|(kind, count)| {
            metrics::run::warnings(kind, count);
            (kind.to_string(), count)
        })
        .collect()
}

fn log_warnings(stage: &str, warnings: &[DataWarning]) {
    if !warnings.is_empty() {
        info!(stage, count = warnings.len(), "Stage finished with data warnings");
    }
}

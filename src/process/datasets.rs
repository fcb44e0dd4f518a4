// src/process/datasets.rs
//
// One entry point per raw export. Each reads its file(s) from the raw
// directory, runs positional extraction, and returns typed records plus the
// warnings worth surfacing in the run report. Nothing here writes files.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument, warn};

use super::extract::{
    extract_slots, extract_years, ExtractStats, Overflow, SlotLayout, SpanCheck, YearAxis,
};
use super::integrate::{JoinPolicy, PositionalJoin};
use super::raw_table::RawTable;
use super::reader;
use crate::decode::{Encoding, DEFAULT_CANDIDATES};
use crate::error::{PipelineError, Result};
use crate::geo;
use crate::schema::{
    DatasetKind, InstitutionRecord, LifecycleRecord, Metric, OverseasRecord, PatentRecord, Record,
    LIFECYCLE_STAGES, SURVEY_YEAR,
};

/// Knobs shared by every dataset processor.
#[derive(Debug, Clone)]
pub struct DatasetOptions {
    pub encodings: Vec<Encoding>,
    pub axis: YearAxis,
    pub span_check: SpanCheck,
    pub join: JoinPolicy,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            encodings: DEFAULT_CANDIDATES.to_vec(),
            axis: YearAxis::new(2, 2019, 4),
            span_check: SpanCheck::Warn,
            join: JoinPolicy::Lenient,
        }
    }
}

/// Records produced from one dataset's raw input.
#[derive(Debug)]
pub struct Processed<R> {
    pub records: Vec<R>,
    pub warnings: Vec<String>,
}

impl<R: Record> Processed<R> {
    fn finish(records: Vec<R>, warnings: Vec<String>) -> Result<Self> {
        if records.is_empty() {
            return Err(PipelineError::EmptyResult {
                dataset: R::KIND.name().to_string(),
            });
        }
        info!(dataset = R::KIND.name(), rows = records.len(), warnings = warnings.len(), "processed");
        Ok(Self { records, warnings })
    }
}

fn read_required(raw_dir: &Path, file: &str, encodings: &[Encoding]) -> Result<RawTable> {
    let path = raw_dir.join(file);
    if !path.exists() {
        return Err(PipelineError::MissingSourceFile { path });
    }
    let (_, table) = reader::read_resolved(&path, encodings)?;
    Ok(table)
}

fn note_stats(source: &str, stats: &ExtractStats, warnings: &mut Vec<String>) {
    if stats.header_echo_skipped {
        warnings.push(format!("{source}: first data row repeats the header; skipped"));
    }
    if let Some(mismatch) = &stats.layout_mismatch {
        warnings.push(format!("{source}: {mismatch}"));
    }
    if !stats.skipped_rows.is_empty() {
        warnings.push(format!(
            "{source}: {} row(s) without descriptive columns skipped",
            stats.skipped_rows.len()
        ));
    }
    if stats.cells_rejected > 0 {
        warnings.push(format!(
            "{source}: {} non-numeric cell(s) rejected",
            stats.cells_rejected
        ));
    }
    if stats.out_of_range > 0 {
        warnings.push(format!(
            "{source}: {} value(s) outside the valid years dropped",
            stats.out_of_range
        ));
    }
}

/// Join the four institution metric exports into one record per
/// (year, field, scale).
///
/// Metric files that are absent or unreadable are left out of the join and
/// read as 0; the dataset only fails when none of them can be read.
#[instrument(level = "info", skip(opts), fields(dir = %raw_dir.display()))]
pub fn process_institution(
    raw_dir: &Path,
    opts: &DatasetOptions,
) -> Result<Processed<InstitutionRecord>> {
    let mut tables = BTreeMap::new();
    let mut warnings = Vec::new();
    let mut first_error = None;

    for metric in Metric::ALL {
        match read_required(raw_dir, metric.raw_file(), &opts.encodings) {
            Ok(table) => {
                tables.insert(metric, table);
            }
            Err(e) => {
                warn!(metric = metric.id(), error = %e, "metric file unavailable");
                warnings.push(format!("{}: {}", metric.raw_file(), e));
                first_error.get_or_insert(e);
            }
        }
    }

    if tables.is_empty() {
        return Err(first_error.unwrap_or_else(|| PipelineError::MissingSourceFile {
            path: raw_dir.join(Metric::Revenue.raw_file()),
        }));
    }

    let join = PositionalJoin {
        axis: opts.axis.clone(),
        span_check: opts.span_check,
        policy: opts.join,
    };
    let integration = join.join(&tables)?;
    let primary = integration.primary.map(|m| m.raw_file()).unwrap_or("institution");
    note_stats(primary, &integration.stats, &mut warnings);
    warnings.extend(integration.misaligned.iter().map(|e| e.to_string()));

    Processed::finish(integration.records, warnings)
}

/// Patent counts per technology: up to `axis.span` year columns after the
/// two descriptive ones, with no wraparound.
#[instrument(level = "info", skip(opts), fields(dir = %raw_dir.display()))]
pub fn process_patents(raw_dir: &Path, opts: &DatasetOptions) -> Result<Processed<PatentRecord>> {
    let file = DatasetKind::Patent.raw_files()[0];
    let table = read_required(raw_dir, file, &opts.encodings)?;

    let axis = YearAxis {
        overflow: Overflow::Drop,
        ..opts.axis.clone()
    };
    let (dated, stats) = extract_years(&table, &axis, opts.span_check)?;

    let mut warnings = Vec::new();
    note_stats(file, &stats, &mut warnings);

    let records = dated
        .into_iter()
        .map(|d| PatentRecord {
            year: d.year,
            field: d.observation.field,
            category: d.observation.field.label_ko().to_string(),
            tech_name: d.observation.label,
            patent_count: d.observation.value.trunc() as u64,
        })
        .collect();

    Processed::finish(records, warnings)
}

/// Project counts per lifecycle stage. Data columns map one-to-one onto
/// `LIFECYCLE_STAGES`; anything past the last stage is ignored.
#[instrument(level = "info", skip(opts), fields(dir = %raw_dir.display()))]
pub fn process_lifecycle(
    raw_dir: &Path,
    opts: &DatasetOptions,
) -> Result<Processed<LifecycleRecord>> {
    let file = DatasetKind::Lifecycle.raw_files()[0];
    let table = read_required(raw_dir, file, &opts.encodings)?;

    let layout = SlotLayout::bounded(opts.axis.first_data_col, LIFECYCLE_STAGES.len());
    let extraction = extract_slots(&table, &layout, opts.span_check, &opts.axis.valid)?;

    let mut warnings = Vec::new();
    note_stats(file, &extraction.stats, &mut warnings);

    let records = extraction
        .observations
        .into_iter()
        .map(|obs| LifecycleRecord {
            year: SURVEY_YEAR,
            field: obs.field,
            tech_name: obs.label,
            lifecycle_stage: LIFECYCLE_STAGES[obs.slot].to_string(),
            stage_order: obs.slot as u32 + 1,
            project_count: obs.value.trunc() as u64,
        })
        .collect();

    Processed::finish(records, warnings)
}

/// Export counts per region. The export has no region header, so the
/// region of a column is its position modulo the known region order.
#[instrument(level = "info", skip(opts), fields(dir = %raw_dir.display()))]
pub fn process_overseas(
    raw_dir: &Path,
    opts: &DatasetOptions,
) -> Result<Processed<OverseasRecord>> {
    let file = DatasetKind::Overseas.raw_files()[0];
    let table = read_required(raw_dir, file, &opts.encodings)?;

    let layout = geo::positional_layout(opts.axis.first_data_col);
    let extraction = extract_slots(&table, &layout, opts.span_check, &opts.axis.valid)?;

    let mut warnings = Vec::new();
    note_stats(file, &extraction.stats, &mut warnings);

    let records = extraction
        .observations
        .into_iter()
        .map(|obs| {
            let region = geo::POSITIONAL_ORDER[obs.slot];
            let (latitude, longitude, countries) = geo::lookup_or_default(region);
            OverseasRecord {
                year: SURVEY_YEAR,
                region: region.to_string(),
                field: obs.field,
                tech_name: obs.label,
                export_count: obs.value.trunc() as u64,
                latitude,
                longitude,
                countries,
            }
        })
        .collect();

    Processed::finish(records, warnings)
}

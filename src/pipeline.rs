// src/pipeline.rs
//
// One run: every dataset is processed independently, failures are recorded
// against the dataset they came from, and the run always finishes with a
// report.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::process::datasets::{
    process_institution, process_lifecycle, process_overseas, process_patents,
};
use crate::process::{DatasetOptions, Processed};
use crate::sample::{synthesize, Synthesize};
use crate::schema::{
    ClassificationRecord, DatasetKind, InstitutionRecord, LifecycleRecord, OverseasRecord,
    PatentRecord, Record,
};
use crate::store::{self, Verified};

pub const REPORT_FILE: &str = "run_report.json";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Processed { rows: usize, warnings: Vec<String> },
    /// Nothing to process; any previous output is left in place.
    Skipped { reason: String },
    Failed { kind: &'static str, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetStatus {
    pub dataset: DatasetKind,
    pub output: PathBuf,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started: DateTime<Local>,
    pub finished: DateTime<Local>,
    pub datasets: Vec<DatasetStatus>,
    pub verification: Vec<Verified>,
}

impl RunReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.datasets.iter().filter(|s| pred(&s.outcome)).count()
    }

    pub fn processed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Processed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn is_complete(&self) -> bool {
        self.processed() == self.datasets.len()
    }
}

fn outcome_of_error(err: &PipelineError) -> Outcome {
    match err {
        PipelineError::MissingSourceFile { .. } | PipelineError::EmptyResult { .. } => {
            Outcome::Skipped {
                reason: err.to_string(),
            }
        }
        _ => Outcome::Failed {
            kind: err.kind(),
            error: err.to_string(),
        },
    }
}

fn run_dataset<R, F>(config: &Config, opts: &DatasetOptions, process: F) -> DatasetStatus
where
    R: Record,
    F: FnOnce(&Path, &DatasetOptions) -> Result<Processed<R>>,
{
    let output = config.path_for(R::KIND);
    let outcome = match process(&config.raw_dir(), opts)
        .and_then(|p| store::save(&p.records, &output).map(|_| p))
    {
        Ok(p) => {
            for w in &p.warnings {
                warn!(dataset = R::KIND.name(), "{}", w);
            }
            Outcome::Processed {
                rows: p.records.len(),
                warnings: p.warnings,
            }
        }
        Err(e) => {
            match &e {
                PipelineError::MissingSourceFile { .. } => {
                    info!(dataset = R::KIND.name(), "{}", e)
                }
                _ => error!(dataset = R::KIND.name(), kind = e.kind(), "{}", e),
            }
            outcome_of_error(&e)
        }
    };
    DatasetStatus {
        dataset: R::KIND,
        output,
        outcome,
    }
}

/// Process every dataset from `raw/` into `processed/`, verify the output
/// directory, and write `run_report.json` next to the datasets.
pub fn run(config: &Config) -> Result<RunReport> {
    let started = Local::now();
    config.ensure_dirs()?;
    let opts = config.dataset_options();

    let datasets = vec![
        run_dataset(config, &opts, process_institution),
        run_dataset(config, &opts, process_patents),
        run_dataset(config, &opts, process_lifecycle),
        run_dataset(config, &opts, process_overseas),
    ];

    let verification = store::verify_processed(&config.processed_dir())?;
    let report = RunReport {
        started,
        finished: Local::now(),
        datasets,
        verification,
    };
    info!(
        processed = report.processed(),
        skipped = report.skipped(),
        failed = report.failed(),
        "run finished"
    );

    write_report(&report, &config.processed_dir().join(REPORT_FILE))?;
    Ok(report)
}

pub fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    fs::write(path, serde_json::to_vec_pretty(report)?)?;
    Ok(())
}

fn write_sample<R: Synthesize>(config: &Config) -> Result<(DatasetKind, usize)> {
    let records = synthesize::<R>(config.seed);
    store::save(&records, &config.path_for(R::KIND))?;
    Ok((R::KIND, records.len()))
}

/// Write seeded placeholder data for every dataset, overwriting existing
/// files. Used for demo setups; `run` never does this.
pub fn write_samples(config: &Config) -> Result<Vec<(DatasetKind, usize)>> {
    config.ensure_dirs()?;
    Ok(vec![
        write_sample::<InstitutionRecord>(config)?,
        write_sample::<PatentRecord>(config)?,
        write_sample::<LifecycleRecord>(config)?,
        write_sample::<OverseasRecord>(config)?,
        write_sample::<ClassificationRecord>(config)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::EUC_KR;
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,climatetech=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn config_in(dir: &Path) -> anyhow::Result<Config> {
        let config = Config {
            base_dir: dir.to_path_buf(),
            ..Config::default()
        };
        config.ensure_dirs()?;
        Ok(config)
    }

    #[test]
    fn one_bad_file_does_not_stop_the_run() -> anyhow::Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let config = config_in(dir.path())?;
        let raw = config.raw_dir();

        let (patents, _, _) = EUC_KR.encode("분야,기술,2019,2020,2021,2022\n감축,태양광,1,2,3,4\n");
        fs::write(raw.join("patent_data.csv"), patents)?;
        // a single column is not a table
        fs::write(raw.join("lifecycle_data.csv"), "just\none\ncolumn\n")?;

        let report = run(&config)?;
        let by_kind = |k: DatasetKind| {
            report
                .datasets
                .iter()
                .find(|s| s.dataset == k)
                .map(|s| s.outcome.clone())
        };

        assert!(matches!(by_kind(DatasetKind::Patent), Some(Outcome::Processed { rows: 4, .. })));
        assert!(matches!(
            by_kind(DatasetKind::Lifecycle),
            Some(Outcome::Failed { kind: "parse_error", .. })
        ));
        assert!(matches!(by_kind(DatasetKind::Institution), Some(Outcome::Skipped { .. })));
        assert!(matches!(by_kind(DatasetKind::Overseas), Some(Outcome::Skipped { .. })));
        assert_eq!((report.processed(), report.skipped(), report.failed()), (1, 2, 1));
        assert!(!report.is_complete());

        let saved = store::load::<PatentRecord>(&config.path_for(DatasetKind::Patent))?;
        assert_eq!(saved.len(), 4);
        assert!(!config.path_for(DatasetKind::Lifecycle).exists());

        let json = fs::read_to_string(config.processed_dir().join(REPORT_FILE))?;
        assert!(json.contains("\"status\": \"processed\""));
        assert!(json.contains("patent_data.csv"));
        Ok(())
    }

    #[test]
    fn empty_raw_dir_skips_everything() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let config = config_in(dir.path())?;
        let report = run(&config)?;
        assert_eq!(report.skipped(), 4);
        assert!(report.verification.is_empty());
        Ok(())
    }

    #[test]
    fn samples_fill_every_dataset() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let config = config_in(dir.path())?;
        let written = write_samples(&config)?;
        assert_eq!(written.len(), 5);
        for status in store::data_status(&config) {
            assert!(status.exists, "{:?} missing", status.kind);
            assert!(status.rows.unwrap_or(0) > 0);
        }
        Ok(())
    }
}

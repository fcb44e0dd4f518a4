//! Error taxonomy for the ingestion pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Library result type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every failure the pipeline can surface. None of these abort a run: the
/// orchestrator turns them into per-dataset statuses.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No candidate encoding decoded the file.
    #[error("no candidate encoding decoded {}", path.display())]
    NoEncodingMatched { path: PathBuf },

    /// The file decoded, but no delimiter produced a usable table.
    #[error("could not parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// A row lacks the two leading descriptive columns.
    #[error("row {row} has {columns} column(s); need at least 2 descriptive columns")]
    SchemaMismatch { row: usize, columns: usize },

    /// An expected raw file is absent.
    #[error("missing source file {}", path.display())]
    MissingSourceFile { path: PathBuf },

    /// Extraction rejected every row.
    #[error("{dataset}: every row was rejected, no records produced")]
    EmptyResult { dataset: String },

    /// A processed file requested by a consumer does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Observed data columns do not fit the positional layout.
    #[error("{data_columns} data column(s) do not fit {slots} positional slot(s)")]
    LayoutMismatch { data_columns: usize, slots: usize },

    /// A secondary table in a positional join is not aligned with the primary.
    #[error("`{metric}` has {rows} rows x {columns} cols, primary has {primary_rows} x {primary_columns}")]
    RowMisalignment {
        metric: String,
        rows: usize,
        columns: usize,
        primary_rows: usize,
        primary_columns: usize,
    },

    /// A rewrite would replace an earlier backup of the original bytes.
    #[error("backup {} already exists; not overwriting it", path.display())]
    BackupExists { path: PathBuf },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether the run can skip past this error and keep going.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PipelineError::Config(_))
    }

    /// Short machine-friendly tag, used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::NoEncodingMatched { .. } => "no_encoding_matched",
            PipelineError::Parse { .. } => "parse_error",
            PipelineError::SchemaMismatch { .. } => "schema_mismatch",
            PipelineError::MissingSourceFile { .. } => "missing_source_file",
            PipelineError::EmptyResult { .. } => "empty_result",
            PipelineError::NotFound { .. } => "not_found",
            PipelineError::LayoutMismatch { .. } => "layout_mismatch",
            PipelineError::RowMisalignment { .. } => "row_misalignment",
            PipelineError::BackupExists { .. } => "backup_exists",
            PipelineError::Config(_) => "config",
            PipelineError::Io(_) => "io",
            PipelineError::Csv(_) => "csv",
            PipelineError::Yaml(_) => "yaml",
            PipelineError::Json(_) => "json",
        }
    }
}

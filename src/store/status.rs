// src/store/status.rs
//
// Read-only summaries of what is on disk: a post-run verification of every
// processed CSV, and a per-dataset status listing.

use chrono::{DateTime, Local};
use csv::ReaderBuilder;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::config::Config;
use crate::decode::{self, Encoding};
use crate::error::{PipelineError, Result};
use crate::schema::DatasetKind;

/// Processed files are written as UTF-8; older tools may have left CP949.
const SUMMARY_ENCODINGS: [Encoding; 3] = [Encoding::Utf8Bom, Encoding::Utf8, Encoding::Cp949];

/// Shape of one CSV file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
    pub headers: Vec<String>,
}

/// Row and column counts of a header-first CSV file.
pub fn summarize(path: &Path) -> Result<Shape> {
    let decoded = decode::read_decoded(path, &SUMMARY_ENCODINGS)?;
    let text = decoded.text.trim_start_matches('\u{feff}');
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = 0;
    for record in rdr.records() {
        record?;
        rows += 1;
    }
    Ok(Shape {
        rows,
        columns: headers.len(),
        headers,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verified {
    Readable {
        file: String,
        #[serde(flatten)]
        shape: Shape,
    },
    Unreadable {
        file: String,
        error: String,
    },
}

/// Re-read every `*.csv` in `dir`. Unreadable files are reported in the
/// result, not returned as errors.
pub fn verify_processed(dir: &Path) -> Result<Vec<Verified>> {
    let pattern = dir.join("*.csv");
    let pattern = pattern.to_string_lossy();
    let paths = glob::glob(&pattern).map_err(|e| {
        PipelineError::Config(format!("bad directory pattern {pattern}: {e}"))
    })?;

    let mut files: Vec<PathBuf> = paths.filter_map(|p| p.ok()).collect();
    files.sort();

    let mut out = Vec::with_capacity(files.len());
    for path in files {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match summarize(&path) {
            Ok(shape) => {
                info!(%file, rows = shape.rows, cols = shape.columns, "verified");
                out.push(Verified::Readable { file, shape });
            }
            Err(e) => {
                warn!(%file, error = %e, "unreadable processed file");
                out.push(Verified::Unreadable {
                    file,
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(out)
}

/// What the data-management view shows for one dataset file.
#[derive(Debug, Clone, Serialize)]
pub struct DataStatus {
    pub kind: DatasetKind,
    pub description: &'static str,
    pub path: PathBuf,
    pub exists: bool,
    pub size_bytes: Option<u64>,
    pub modified: Option<DateTime<Local>>,
    pub rows: Option<usize>,
    pub columns: Option<usize>,
    pub error: Option<String>,
}

fn status_of(kind: DatasetKind, path: PathBuf) -> DataStatus {
    let mut status = DataStatus {
        kind,
        description: kind.description(),
        exists: false,
        size_bytes: None,
        modified: None,
        rows: None,
        columns: None,
        error: None,
        path,
    };

    let meta = match fs::metadata(&status.path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return status,
        Err(e) => {
            status.error = Some(e.to_string());
            return status;
        }
    };
    status.exists = true;
    status.size_bytes = Some(meta.len());
    status.modified = meta.modified().ok().map(DateTime::<Local>::from);

    match summarize(&status.path) {
        Ok(shape) => {
            status.rows = Some(shape.rows);
            status.columns = Some(shape.columns);
        }
        Err(e) => status.error = Some(e.to_string()),
    }
    status
}

/// Status of every dataset file: the four processed datasets and the
/// scraped classification.
pub fn data_status(config: &Config) -> Vec<DataStatus> {
    DatasetKind::PROCESSED
        .into_iter()
        .chain([DatasetKind::Classification])
        .map(|kind| status_of(kind, config.path_for(kind)))
        .collect()
}

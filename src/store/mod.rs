// src/store/mod.rs
//
// Processed datasets on disk: one UTF-8 (BOM) CSV per dataset kind, always
// rewritten whole. This is the only thing the dashboard reads.

use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::{fs, path::Path, sync::Arc};
use tracing::{debug, info, warn};

use crate::decode::UTF8_BOM;
use crate::error::{PipelineError, Result};
use crate::fallback::first_success;
use crate::sample::{synthesize, Synthesize};
use crate::schema::Record;

pub mod cache;
pub mod status;

pub use cache::DatasetCache;
pub use status::{data_status, verify_processed, DataStatus, Verified};

/// Where a loaded dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Processed,
    Synthesized,
}

/// Serialize `records` as BOM-prefixed CSV with `R::columns()` as header.
pub fn to_csv_bytes<R: Record>(records: &[R]) -> Result<Vec<u8>> {
    let mut buf = UTF8_BOM.to_vec();
    {
        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(&mut buf);
        wtr.write_record(R::columns())?;
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
    }
    Ok(buf)
}

/// Write `records` to `dest`, replacing whatever is there.
pub fn save<R: Record>(records: &[R], dest: &Path) -> Result<()> {
    let bytes = to_csv_bytes(records)?;
    if let Some(dir) = dest.parent() {
        fs::create_dir_all(dir)?;
    }
    let fname = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| R::KIND.file_name().to_string());
    let tmp = dest.with_file_name(format!("{fname}.tmp"));
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, dest)?;
    info!(file = %dest.display(), rows = records.len(), "saved");
    Ok(())
}

/// Read records written by [`save`].
pub fn load<R: Record>(dest: &Path) -> Result<Vec<R>> {
    let bytes = match fs::read(dest) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::NotFound {
                path: dest.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);

    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(body);
    let headers = rdr.headers()?.clone();
    if !headers.iter().eq(R::columns().iter().copied()) {
        return Err(PipelineError::Parse {
            path: dest.to_path_buf(),
            reason: format!(
                "header {:?} does not match {} columns {:?}",
                headers.iter().collect::<Vec<_>>(),
                R::KIND.name(),
                R::columns()
            ),
        });
    }

    let records = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<R>, csv::Error>>()?;
    debug!(file = %dest.display(), rows = records.len(), "loaded");
    Ok(records)
}

/// Load `path`, or synthesize placeholder data when it cannot be loaded.
///
/// The processed file is read through `cache` when one is given. This never
/// fails: any load error degrades to the seeded sample.
pub fn load_or_synthesize<R: Synthesize>(
    path: &Path,
    seed: u64,
    cache: Option<&DatasetCache>,
) -> (Arc<Vec<R>>, DataSource) {
    let outcome = first_success(
        [DataSource::Processed, DataSource::Synthesized],
        |source| match source {
            DataSource::Processed => match cache {
                Some(cache) => cache.get_or_load::<R>(path),
                None => load::<R>(path).map(Arc::new),
            },
            DataSource::Synthesized => Ok(Arc::new(synthesize::<R>(seed))),
        },
    );

    match outcome {
        Ok((source, records, tried)) => {
            for (_, e) in &tried.failures {
                match e {
                    PipelineError::NotFound { .. } => {
                        info!(dataset = R::KIND.name(), "no processed file, using sample data")
                    }
                    other => {
                        warn!(dataset = R::KIND.name(), error = %other, "falling back to sample data")
                    }
                }
            }
            (records, source)
        }
        // the synthesizer cannot fail
        Err(_) => (Arc::new(synthesize::<R>(seed)), DataSource::Synthesized),
    }
}

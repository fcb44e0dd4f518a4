use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use super::{resolve_bytes, Encoding, UTF8_BOM};
use crate::error::{PipelineError, Result};

const BACKUP_SUFFIX: &str = ".backup.csv";

/// Lines of decoded text kept for a preview.
const PREVIEW_LINES: usize = 3;
/// Characters kept per preview line.
const PREVIEW_WIDTH: usize = 100;

/// What every candidate encoding makes of one raw file.
#[derive(Debug, Clone)]
pub struct Diagnosis {
    pub size_bytes: u64,
    /// Each candidate with whether it decoded cleanly, in evaluation order.
    pub attempts: Vec<(Encoding, bool)>,
    /// First candidate that decoded, if any.
    pub encoding: Option<Encoding>,
    pub preview: Vec<String>,
}

/// Try every candidate (not just up to the first success) so the report
/// shows which alternatives would also have been accepted.
pub fn diagnose_file(path: &Path, candidates: &[Encoding]) -> Result<Diagnosis> {
    let bytes = fs::read(path)?;
    let mut attempts = Vec::with_capacity(candidates.len());
    let mut winner: Option<(Encoding, String)> = None;

    for &enc in candidates {
        let decoded = enc.decode(&bytes);
        attempts.push((enc, decoded.is_some()));
        if winner.is_none() {
            if let Some(text) = decoded {
                winner = Some((enc, text));
            }
        }
    }

    let preview = winner
        .as_ref()
        .map(|(_, text)| {
            text.lines()
                .take(PREVIEW_LINES)
                .map(|l| l.trim().chars().take(PREVIEW_WIDTH).collect())
                .collect()
        })
        .unwrap_or_default();

    Ok(Diagnosis {
        size_bytes: bytes.len() as u64,
        attempts,
        encoding: winner.map(|(enc, _)| enc),
        preview,
    })
}

/// `data.csv` -> `data.backup.csv`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{BACKUP_SUFFIX}"))
}

pub fn is_backup(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(BACKUP_SUFFIX))
}

/// Rewrite `path` as UTF-8 with BOM, keeping the original bytes at
/// [`backup_path`]. Returns the encoding the original was read as.
///
/// A file that already starts with a UTF-8 BOM over valid UTF-8 is left
/// untouched and reported as [`Encoding::Utf8Bom`]. An existing backup is
/// never replaced.
pub fn rewrite_utf8(path: &Path, candidates: &[Encoding]) -> Result<Encoding> {
    let bytes = fs::read(path)?;
    if bytes.starts_with(UTF8_BOM) && std::str::from_utf8(&bytes[UTF8_BOM.len()..]).is_ok() {
        info!(file = %path.display(), "already utf-8-sig; left as is");
        return Ok(Encoding::Utf8Bom);
    }

    let backup = backup_path(path);
    if backup.exists() {
        return Err(PipelineError::BackupExists { path: backup });
    }
    let decoded = resolve_bytes(&bytes, candidates).ok_or_else(|| {
        PipelineError::NoEncodingMatched {
            path: path.to_path_buf(),
        }
    })?;
    let text = decoded.text.trim_start_matches('\u{feff}');

    fs::rename(path, &backup)?;
    let mut out = UTF8_BOM.to_vec();
    out.extend_from_slice(text.as_bytes());
    fs::write(path, out)?;

    info!(
        file = %path.display(),
        backup = %backup.display(),
        from = %decoded.encoding,
        "rewritten as utf-8-sig"
    );
    Ok(decoded.encoding)
}

// src/process/reader.rs
use csv::ReaderBuilder;
use std::{fs, path::Path};
use tracing::{debug, warn};

use super::raw_table::RawTable;
use crate::decode::{self, Encoding};
use crate::error::{PipelineError, Result};
use crate::fallback::first_success;

/// Delimiters probed in order; comma is what the exports normally use.
pub const PROBE_DELIMITERS: [u8; 3] = [b',', b'\t', b';'];

/// Read `path` as text in `encoding` and parse it into a table.
pub fn read(path: &Path, encoding: Encoding) -> Result<RawTable> {
    let bytes = fs::read(path)?;
    let text = encoding
        .decode(&bytes)
        .ok_or_else(|| PipelineError::NoEncodingMatched {
            path: path.to_path_buf(),
        })?;
    parse_probing(&text).map_err(|reason| PipelineError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

/// Resolve the encoding over `candidates`, then read.
pub fn read_resolved(path: &Path, candidates: &[Encoding]) -> Result<(Encoding, RawTable)> {
    let decoded = decode::read_decoded(path, candidates)?;
    let table = parse_probing(&decoded.text).map_err(|reason| PipelineError::Parse {
        path: path.to_path_buf(),
        reason,
    })?;
    debug!(
        file = %path.display(),
        encoding = %decoded.encoding,
        rows = table.row_count(),
        cols = table.width(),
        "read raw table"
    );
    Ok((decoded.encoding, table))
}

/// Parse with each probe delimiter until one yields a usable table.
pub fn parse_probing(text: &str) -> std::result::Result<RawTable, String> {
    match first_success(PROBE_DELIMITERS, |&d| parse_with(text, d)) {
        Ok((delimiter, table, tried)) => {
            if !tried.failures.is_empty() {
                warn!(
                    delimiter = %(delimiter as char).escape_default(),
                    "comma parse was degenerate; fell back to another delimiter"
                );
            }
            Ok(table)
        }
        Err(tried) => {
            let reasons: Vec<String> = tried
                .failures
                .into_iter()
                .map(|(d, e)| format!("{:?}: {}", d as char, e))
                .collect();
            Err(reasons.join("; "))
        }
    }
}

/// Parse `text` with a single delimiter. The first non-blank line becomes the
/// header; blank lines anywhere (trailing ones included) are dropped.
pub fn parse_with(text: &str, delimiter: u8) -> std::result::Result<RawTable, String> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut lines: Vec<Vec<String>> = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| format!("record {}: {}", idx, e))?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        lines.push(record.iter().map(str::to_string).collect());
    }

    let mut lines = lines.into_iter();
    let headers = lines.next().ok_or_else(|| "no content".to_string())?;
    let table = RawTable {
        headers,
        rows: lines.collect(),
        delimiter,
    };

    if table.width() < 2 {
        return Err("single column".into());
    }
    if !has_anchor_column(&table) {
        return Err("no column is populated in every non-blank row".into());
    }
    Ok(table)
}

/// At least one column must be non-empty in every row that has any value.
fn has_anchor_column(table: &RawTable) -> bool {
    (0..table.width()).any(|col| {
        table
            .rows
            .iter()
            .all(|row| row.get(col).is_some_and(|c| !c.trim().is_empty()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use encoding_rs::EUC_KR;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn comma_table_with_bom_and_trailing_blanks() {
        let text = "\u{FEFF}분야,규모,2019,2020\n감축,대기업,1,2\n적응,중기업,3,4\n\n\n";
        let t = parse_probing(text).expect("parses");
        assert_eq!(t.headers, vec!["분야", "규모", "2019", "2020"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.delimiter, b',');
    }

    #[test]
    fn falls_back_to_tab_then_semicolon() {
        let tabbed = "a\tb\tc\n1\t2\t3\n";
        assert_eq!(parse_probing(tabbed).expect("tab").delimiter, b'\t');

        let semi = "a;b;c\n1;2;3\n";
        let t = parse_probing(semi).expect("semicolon");
        assert_eq!(t.delimiter, b';');
        assert_eq!(t.rows[0], vec!["1", "2", "3"]);
    }

    #[test]
    fn single_column_everywhere_is_parse_error() {
        let err = parse_probing("only\none\ncolumn\n").unwrap_err();
        assert!(err.contains("single column"));
    }

    #[test]
    fn empty_text_fails() {
        assert!(parse_probing("\n\n").is_err());
    }

    #[test]
    fn quoted_thousands_survive_comma_parsing() {
        let t = parse_probing("분야,규모,2019\n감축,대기업,\"1,234\"\n").expect("parses");
        assert_eq!(t.value(0, 2), Some(1234.0));
    }

    #[test]
    fn read_resolved_decodes_cp949_file() -> Result<()> {
        let (bytes, _, _) = EUC_KR.encode("분야,규모,2019\n감축 기술,대기업,100\n");
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(&bytes)?;

        let (enc, table) = read_resolved(tmp.path(), &crate::decode::DEFAULT_CANDIDATES)?;
        assert_eq!(enc, Encoding::Cp949);
        assert_eq!(table.text(0, 0).as_deref(), Some("감축 기술"));

        let again = read(tmp.path(), enc)?;
        assert_eq!(again, table);
        Ok(())
    }

    #[test]
    fn read_reports_parse_error_with_path() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"just one column\nstill one\n")?;
        let err = read(tmp.path(), Encoding::Utf8).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
        Ok(())
    }
}

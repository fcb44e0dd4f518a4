// src/decode/mod.rs
use encoding_rs::EUC_KR;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path};
use tracing::{debug, trace};

use crate::error::{PipelineError, Result};
use crate::fallback::first_success;

pub mod diagnose;

pub use diagnose::{backup_path, diagnose_file, is_backup, rewrite_utf8, Diagnosis};

pub(crate) const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Candidate text encodings for raw statistical exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "cp949")]
    Cp949,
    #[serde(rename = "euc-kr")]
    EucKr,
    #[serde(rename = "utf-8-sig")]
    Utf8Bom,
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "latin-1")]
    Latin1,
}

/// Resolution order used when the caller has no opinion.
pub const DEFAULT_CANDIDATES: [Encoding; 5] = [
    Encoding::Cp949,
    Encoding::EucKr,
    Encoding::Utf8Bom,
    Encoding::Utf8,
    Encoding::Latin1,
];

impl Encoding {
    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Cp949 => "cp949",
            Encoding::EucKr => "euc-kr",
            Encoding::Utf8Bom => "utf-8-sig",
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "latin-1",
        }
    }

    /// Strictly decode `bytes`; `None` on the first malformed sequence.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            // encoding_rs' EUC-KR is the WHATWG definition, i.e. the UHC/CP949 superset.
            Encoding::Cp949 => EUC_KR
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|s| s.into_owned()),
            Encoding::EucKr => {
                if !is_strict_euc_kr(bytes) {
                    return None;
                }
                EUC_KR
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .map(|s| s.into_owned())
            }
            Encoding::Utf8Bom => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(str::to_string)
            }
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            // every byte is a code point
            Encoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// KS X 1001 only: both bytes of a double-byte pair in 0xA1..=0xFE.
fn is_strict_euc_kr(bytes: &[u8]) -> bool {
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < 0x80 {
            i += 1;
            continue;
        }
        match bytes.get(i + 1) {
            Some(&t) if (0xA1..=0xFE).contains(&b) && (0xA1..=0xFE).contains(&t) => i += 2,
            _ => return false,
        }
    }
    true
}

/// A file's text together with the encoding that produced it.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub encoding: Encoding,
    pub text: String,
}

/// Try each candidate in order over `bytes`; the first clean decode wins.
pub fn resolve_bytes(bytes: &[u8], candidates: &[Encoding]) -> Option<Decoded> {
    match first_success(candidates.iter().copied(), |enc| enc.decode(bytes).ok_or(())) {
        Ok((encoding, text, tried)) => {
            trace!(rejected = tried.failures.len(), %encoding, "encoding resolved");
            Some(Decoded { encoding, text })
        }
        Err(_) => None,
    }
}

/// Read `path` and decode it with the first candidate that succeeds.
pub fn read_decoded(path: &Path, candidates: &[Encoding]) -> Result<Decoded> {
    let bytes = fs::read(path)?;
    let decoded = resolve_bytes(&bytes, candidates).ok_or_else(|| {
        PipelineError::NoEncodingMatched {
            path: path.to_path_buf(),
        }
    })?;
    debug!(file = %path.display(), encoding = %decoded.encoding, "decoded");
    Ok(decoded)
}

/// Determine a usable encoding for `path` using the default candidate order.
pub fn resolve(path: &Path) -> Result<Encoding> {
    read_decoded(path, &DEFAULT_CANDIDATES).map(|d| d.encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cp949(text: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = EUC_KR.encode(text);
        assert!(!had_errors);
        bytes.into_owned()
    }

    #[test]
    fn korean_cp949_file_resolves_first_candidate() -> Result<()> {
        let text = "분야,규모,2019\n감축 기술,대기업,100\n";
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(&cp949(text))?;

        let decoded = read_decoded(tmp.path(), &DEFAULT_CANDIDATES)?;
        assert_eq!(decoded.encoding, Encoding::Cp949);
        assert_eq!(decoded.text, text);
        assert_eq!(resolve(tmp.path())?, Encoding::Cp949);
        Ok(())
    }

    #[test]
    fn uhc_only_syllable_is_not_strict_euc_kr() {
        let bytes = cp949("똠방각하");
        assert!(Encoding::Cp949.decode(&bytes).is_some());
        assert!(Encoding::EucKr.decode(&bytes).is_none());
    }

    #[test]
    fn ks_x_1001_text_is_valid_euc_kr() {
        let bytes = cp949("적응 기술");
        assert_eq!(Encoding::EucKr.decode(&bytes).as_deref(), Some("적응 기술"));
    }

    #[test]
    fn latin1_catches_bytes_nothing_else_accepts() {
        let bytes = [0x80, b'a', 0xFF];
        let decoded = resolve_bytes(&bytes, &DEFAULT_CANDIDATES).expect("latin-1 always decodes");
        assert_eq!(decoded.encoding, Encoding::Latin1);
        assert_eq!(decoded.text, "\u{80}a\u{FF}");
    }

    #[test]
    fn without_latin1_undecodable_bytes_fail() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(&[0x80, 0xFF])?;
        let err = read_decoded(tmp.path(), &DEFAULT_CANDIDATES[..4]).unwrap_err();
        assert!(matches!(err, PipelineError::NoEncodingMatched { .. }));
        Ok(())
    }

    #[test]
    fn resolved_encoding_always_redecodes() {
        let samples: Vec<Vec<u8>> = vec![
            b"plain,ascii\n1,2\n".to_vec(),
            cp949("수소,풍력\n1,2\n"),
            vec![0xC3, 0x28, 0xA0, 0xA1],
            "\u{FEFF}a,b\n".as_bytes().to_vec(),
        ];
        for bytes in samples {
            let decoded = resolve_bytes(&bytes, &DEFAULT_CANDIDATES).expect("latin-1 fallback");
            assert_eq!(decoded.encoding.decode(&bytes), Some(decoded.text));
        }
    }

    #[test]
    fn utf8_sig_strips_marker() {
        let bytes = "\u{FEFF}year,value".as_bytes();
        assert_eq!(Encoding::Utf8Bom.decode(bytes).as_deref(), Some("year,value"));
        assert_eq!(
            Encoding::Utf8.decode(bytes).as_deref(),
            Some("\u{FEFF}year,value")
        );
    }
}

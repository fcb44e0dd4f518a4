// src/config.rs
use serde::{Deserialize, Serialize};
use std::{
    fs,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::decode::{Encoding, DEFAULT_CANDIDATES};
use crate::error::{PipelineError, Result};
use crate::process::{DatasetOptions, JoinPolicy, Overflow, SpanCheck, YearAxis};
use crate::schema::{Area, DatasetKind, VALID_YEARS};

/// Looked up under the data directory when no config file is given.
pub const CONFIG_FILE: &str = "pipeline.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    pub min: i32,
    pub max: i32,
}

impl YearWindow {
    pub fn range(&self) -> RangeInclusive<i32> {
        self.min..=self.max
    }
}

impl Default for YearWindow {
    fn default() -> Self {
        Self {
            min: *VALID_YEARS.start(),
            max: *VALID_YEARS.end(),
        }
    }
}

/// Pipeline settings. Every field has a default, so an empty or missing
/// YAML file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root holding `raw/`, `processed/` and `scraped/`.
    pub base_dir: PathBuf,
    /// Index of the first data column in raw exports.
    pub first_data_col: usize,
    pub year_base: i32,
    pub year_span: usize,
    pub valid_years: YearWindow,
    /// Seed for synthesized placeholder data.
    pub seed: u64,
    pub span_check: SpanCheck,
    pub join: JoinPolicy,
    /// Encoding candidates, tried in order.
    pub encodings: Vec<Encoding>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("assets/data"),
            first_data_col: 2,
            year_base: 2019,
            year_span: 4,
            valid_years: YearWindow::default(),
            seed: 42,
            span_check: SpanCheck::Warn,
            join: JoinPolicy::Lenient,
            encodings: DEFAULT_CANDIDATES.to_vec(),
        }
    }
}

impl Config {
    /// Configuration from `config_path`, or `<data_dir>/pipeline.yaml` when
    /// it is not given, with `data_dir` overriding `base_dir`. The binaries
    /// fill both from `--config`/`CLIMATETECH_CONFIG` and
    /// `--data-dir`/`CLIMATETECH_DATA_DIR`.
    pub fn resolve(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let explicit = config_path.is_some();
        let path = config_path.unwrap_or_else(|| {
            data_dir
                .clone()
                .unwrap_or_else(|| Config::default().base_dir)
                .join(CONFIG_FILE)
        });

        let mut config = if path.exists() {
            info!(file = %path.display(), "loading config");
            Self::from_file(&path)?
        } else if explicit {
            return Err(PipelineError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        } else {
            debug!(file = %path.display(), "no config file, using defaults");
            Config::default()
        };

        if let Some(dir) = data_dir {
            config.base_dir = dir;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.year_span == 0 {
            return Err(PipelineError::Config("year_span must be at least 1".into()));
        }
        if self.valid_years.min > self.valid_years.max {
            return Err(PipelineError::Config(format!(
                "valid_years is empty ({}..={})",
                self.valid_years.min, self.valid_years.max
            )));
        }
        if self.valid_years.min < *VALID_YEARS.start() || self.valid_years.max > *VALID_YEARS.end()
        {
            return Err(PipelineError::Config(format!(
                "valid_years must lie within {}..={}",
                VALID_YEARS.start(),
                VALID_YEARS.end()
            )));
        }
        if self.encodings.is_empty() {
            return Err(PipelineError::Config("encodings must not be empty".into()));
        }
        Ok(())
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.base_dir.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.base_dir.join("processed")
    }

    pub fn scraped_dir(&self) -> PathBuf {
        self.base_dir.join("scraped")
    }

    /// Where the output file of `kind` lives.
    pub fn path_for(&self, kind: DatasetKind) -> PathBuf {
        let dir = match kind.area() {
            Area::Processed => self.processed_dir(),
            Area::Scraped => self.scraped_dir(),
        };
        dir.join(kind.file_name())
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for d in [self.raw_dir(), self.processed_dir(), self.scraped_dir()] {
            fs::create_dir_all(&d)?;
        }
        Ok(())
    }

    pub fn year_axis(&self) -> YearAxis {
        YearAxis {
            first_data_col: self.first_data_col,
            base: self.year_base,
            span: self.year_span,
            overflow: Overflow::Wrap,
            valid: self.valid_years.range(),
        }
    }

    pub fn dataset_options(&self) -> DatasetOptions {
        DatasetOptions {
            encodings: self.encodings.clone(),
            axis: self.year_axis(),
            span_check: self.span_check,
            join: self.join,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn missing_file_means_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = Config::resolve(None, Some(dir.path().to_path_buf()))?;
        assert_eq!(config.base_dir, dir.path());
        assert_eq!(config.seed, 42);
        assert_eq!(config.encodings, DEFAULT_CANDIDATES.to_vec());
        assert_eq!(config.processed_dir(), dir.path().join("processed"));
        Ok(())
    }

    #[test]
    fn yaml_overrides_and_data_dir_wins() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join(CONFIG_FILE),
            "base_dir: /elsewhere\nseed: 7\nspan_check: strict\njoin: strict\nencodings: [utf-8-sig, latin-1]\nvalid_years: {min: 2020, max: 2021}\n",
        )?;
        let config = Config::resolve(None, Some(dir.path().to_path_buf()))?;
        assert_eq!(config.base_dir, dir.path());
        assert_eq!(config.seed, 7);
        assert_eq!(config.span_check, SpanCheck::Strict);
        assert_eq!(config.join, JoinPolicy::Strict);
        assert_eq!(config.encodings, vec![Encoding::Utf8Bom, Encoding::Latin1]);
        assert_eq!(config.year_axis().valid, 2020..=2021);
        // untouched fields keep their defaults
        assert_eq!(config.year_span, 4);
        Ok(())
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = Config::resolve(Some(PathBuf::from("/nonexistent/pipeline.yaml")), None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn years_outside_the_dashboard_window_are_refused() {
        let config = Config {
            valid_years: YearWindow {
                min: 2015,
                max: 2022,
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::from_yaml("year_span: 0").map(|c| c.validate()).is_ok_and(|v| v.is_err()));
    }

    #[test]
    fn ensure_dirs_creates_layout() -> Result<()> {
        let dir = tempdir()?;
        let config = Config {
            base_dir: dir.path().join("data"),
            ..Config::default()
        };
        config.ensure_dirs()?;
        assert!(config.raw_dir().is_dir());
        assert!(config.scraped_dir().is_dir());
        assert_eq!(
            config.path_for(DatasetKind::Classification),
            config.scraped_dir().join("climate_tech_classification.csv")
        );
        Ok(())
    }
}

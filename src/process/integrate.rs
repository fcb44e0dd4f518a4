// src/process/integrate.rs
//
// Institution metrics arrive as one export per metric with no shared key.
// Row i of every export describes the same field/scale combination, so the
// files are joined by position. That assumption is checked, never trusted
// silently: misalignment is logged (lenient) or refused (strict).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::extract::{extract_years, ExtractStats, SpanCheck, YearAxis};
use super::raw_table::RawTable;
use crate::error::{PipelineError, Result};
use crate::schema::{InstitutionRecord, Metric, ALL_TECH};

/// What to do when a secondary table's shape differs from the primary's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinPolicy {
    /// Warn, then read out-of-bounds or unparseable positions as 0.
    #[default]
    Lenient,
    /// Fail the join.
    Strict,
}

/// Join-by-row-position over per-metric tables.
#[derive(Debug, Clone)]
pub struct PositionalJoin {
    pub axis: YearAxis,
    pub span_check: SpanCheck,
    pub policy: JoinPolicy,
}

#[derive(Debug, Default)]
pub struct Integration {
    pub records: Vec<InstitutionRecord>,
    /// Metric whose table drove row/column enumeration.
    pub primary: Option<Metric>,
    pub stats: ExtractStats,
    /// Alignment problems tolerated under `JoinPolicy::Lenient`.
    pub misaligned: Vec<PipelineError>,
}

impl Default for PositionalJoin {
    fn default() -> Self {
        Self {
            axis: YearAxis::new(2, 2019, 4),
            span_check: SpanCheck::Warn,
            policy: JoinPolicy::Lenient,
        }
    }
}

impl PositionalJoin {
    /// Verify every secondary table has the primary's row count and width.
    pub fn check_alignment(
        &self,
        primary: &RawTable,
        others: &[(Metric, &RawTable)],
    ) -> Result<Vec<PipelineError>> {
        let mut problems = Vec::new();
        for (metric, table) in others {
            if table.row_count() == primary.row_count() && table.width() == primary.width() {
                continue;
            }
            let err = PipelineError::RowMisalignment {
                metric: metric.id().to_string(),
                rows: table.row_count(),
                columns: table.width(),
                primary_rows: primary.row_count(),
                primary_columns: primary.width(),
            };
            match self.policy {
                JoinPolicy::Strict => return Err(err),
                JoinPolicy::Lenient => {
                    warn!("positional join misaligned: {}", err);
                    problems.push(err);
                }
            }
        }
        Ok(problems)
    }

    /// Build one institution record per accepted primary cell.
    ///
    /// The primary is the first metric present in `Metric::ALL` order. Every
    /// other metric is read from the same (row, column) of its own table and
    /// defaults to 0 when that position is missing or not a number, so each
    /// record carries all four metrics.
    pub fn join(&self, tables: &BTreeMap<Metric, RawTable>) -> Result<Integration> {
        let mut entries = tables.iter();
        let Some((&primary_metric, primary)) = entries.next() else {
            return Err(PipelineError::EmptyResult {
                dataset: "institution".into(),
            });
        };
        let others: Vec<(Metric, &RawTable)> = entries.map(|(m, t)| (*m, t)).collect();

        let misaligned = self.check_alignment(primary, &others)?;
        let (dated, stats) = extract_years(primary, &self.axis, self.span_check)?;

        let mut records = Vec::with_capacity(dated.len());
        for d in dated {
            let obs = &d.observation;
            let mut record = InstitutionRecord {
                year: d.year,
                field: obs.field,
                scale: obs.scale(),
                tech_type: ALL_TECH.to_string(),
                revenue: 0.0,
                employees: 0.0,
                researchers: 0.0,
                rd_cost: 0.0,
            };
            record.set_metric(primary_metric, obs.value);
            for (metric, table) in &others {
                record.set_metric(*metric, table.value(obs.row, obs.col).unwrap_or(0.0));
            }
            records.push(record);
        }
        records.retain(|r| self.axis.valid.contains(&r.year));

        debug!(
            primary = primary_metric.id(),
            secondaries = others.len(),
            records = records.len(),
            "positional join complete"
        );

        Ok(Integration {
            records,
            primary: Some(primary_metric),
            stats,
            misaligned,
        })
    }
}

/// Join with the default year axis (offset 2, 2019, four years) and the
/// lenient policy.
pub fn integrate(tables: &BTreeMap<Metric, RawTable>) -> Result<Vec<InstitutionRecord>> {
    PositionalJoin::default().join(tables).map(|i| i.records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Field, Scale};

    fn table(rows: &[&[&str]]) -> RawTable {
        let header = ["분야", "규모", "2019", "2020", "2021", "2022"];
        RawTable::new(
            header.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn four_tables() -> BTreeMap<Metric, RawTable> {
        BTreeMap::from([
            (
                Metric::Revenue,
                table(&[
                    &["감축", "대기업", "100", "200", "300", "400"],
                    &["적응", "연구기관", "10", "20", "30", "40"],
                ]),
            ),
            (
                Metric::Employees,
                table(&[
                    &["감축", "대기업", "5", "6", "7", "8"],
                    &["적응", "연구기관", "1", "2", "3", "4"],
                ]),
            ),
            (
                Metric::Researchers,
                table(&[
                    &["감축", "대기업", "1", "1", "1", "1"],
                    &["적응", "연구기관", "-", "2", "2", "2"],
                ]),
            ),
            (
                Metric::RdCost,
                table(&[
                    &["감축", "대기업", "9", "9", "9", "9"],
                    &["적응", "연구기관", "8", "8", "8", "8"],
                ]),
            ),
        ])
    }

    #[test]
    fn joins_metrics_by_position() {
        let records = integrate(&four_tables()).expect("aligned");
        assert_eq!(records.len(), 8);

        let first = &records[0];
        assert_eq!((first.year, first.field, first.scale), (2019, Field::Reduction, Scale::Large));
        assert_eq!(
            (first.revenue, first.employees, first.researchers, first.rd_cost),
            (100.0, 5.0, 1.0, 9.0)
        );

        let research_2019 = &records[4];
        assert_eq!(research_2019.scale, Scale::Research);
        // "-" in the researchers table reads as 0
        assert_eq!(research_2019.researchers, 0.0);
        assert_eq!(research_2019.rd_cost, 8.0);
    }

    #[test]
    fn missing_metric_tables_backfill_zero() {
        let mut tables = four_tables();
        tables.remove(&Metric::Researchers);
        tables.remove(&Metric::RdCost);
        let records = integrate(&tables).expect("aligned");
        assert!(records
            .iter()
            .all(|r| r.researchers == 0.0 && r.rd_cost == 0.0));
        assert!(records.iter().all(|r| r.revenue > 0.0));
    }

    #[test]
    fn first_present_metric_is_primary() -> Result<()> {
        let mut tables = four_tables();
        tables.remove(&Metric::Revenue);
        let integration = PositionalJoin::default().join(&tables)?;
        assert_eq!(integration.primary, Some(Metric::Employees));
        assert!(integration.records.iter().all(|r| r.revenue == 0.0));
        assert_eq!(integration.records[0].employees, 5.0);
        Ok(())
    }

    #[test]
    fn primary_rejections_drop_the_whole_record() {
        let mut tables = four_tables();
        tables.insert(
            Metric::Revenue,
            table(&[
                &["감축", "대기업", "N/A", "200", "300", "400"],
                &["적응", "연구기관", "10", "20", "30", "40"],
            ]),
        );
        let records = integrate(&tables).expect("aligned");
        assert_eq!(records.len(), 7);
        assert_eq!(records[0].year, 2020);
    }

    #[test]
    fn short_secondary_is_lenient_by_default() -> Result<()> {
        let mut tables = four_tables();
        tables.insert(
            Metric::RdCost,
            table(&[&["감축", "대기업", "9", "9", "9", "9"]]),
        );
        let integration = PositionalJoin::default().join(&tables)?;
        assert_eq!(integration.misaligned.len(), 1);
        assert_eq!(integration.records.len(), 8);
        assert!(integration.records[4..].iter().all(|r| r.rd_cost == 0.0));
        Ok(())
    }

    #[test]
    fn strict_policy_refuses_misalignment() {
        let mut tables = four_tables();
        tables.insert(
            Metric::Employees,
            table(&[&["감축", "대기업", "5", "6", "7", "8"]]),
        );
        let join = PositionalJoin {
            policy: JoinPolicy::Strict,
            ..PositionalJoin::default()
        };
        let err = join.join(&tables).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::RowMisalignment { ref metric, rows: 1, primary_rows: 2, .. } if metric == "employees"
        ));
    }

    #[test]
    fn no_tables_is_empty_result() {
        let err = integrate(&BTreeMap::new()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyResult { .. }));
    }
}

// src/process/extract.rs
//
// Raw exports carry no year (or region, or stage) column. The dimension is
// implied by a column's offset from the first data column, so everything
// here is driven by a `SlotLayout` that states that assumption explicitly.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::{debug, warn};

use super::raw_table::RawTable;
use super::utils::{clean_str, clean_text, parse_value};
use crate::classify::{classify_field, classify_scale, Field, Scale};
use crate::error::{PipelineError, Result};
use crate::schema::VALID_YEARS;

/// What happens to data columns past the last slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Start over at slot 0: the block is assumed to repeat.
    Wrap,
    /// Ignore the extra columns.
    Drop,
}

/// How to treat a table whose width does not fit its layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanCheck {
    /// Log the mismatch and extract anyway.
    #[default]
    Warn,
    /// Refuse the table.
    Strict,
}

/// Maps column indices onto a positional dimension of `slots` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    pub first_data_col: usize,
    pub slots: usize,
    pub overflow: Overflow,
}

impl SlotLayout {
    pub fn wrapping(first_data_col: usize, slots: usize) -> Self {
        Self {
            first_data_col,
            slots,
            overflow: Overflow::Wrap,
        }
    }

    pub fn bounded(first_data_col: usize, slots: usize) -> Self {
        Self {
            first_data_col,
            slots,
            overflow: Overflow::Drop,
        }
    }

    /// Slot index of `col`, or `None` for descriptive / dropped columns.
    pub fn slot(&self, col: usize) -> Option<usize> {
        if col < self.first_data_col || self.slots == 0 {
            return None;
        }
        let offset = col - self.first_data_col;
        match self.overflow {
            Overflow::Wrap => Some(offset % self.slots),
            Overflow::Drop => (offset < self.slots).then_some(offset),
        }
    }

    /// Does a table `width` columns wide fit this layout exactly?
    pub fn check(&self, width: usize) -> Result<()> {
        let data_columns = width.saturating_sub(self.first_data_col);
        let fits = match (self.slots, self.overflow) {
            (0, _) => false,
            (slots, Overflow::Wrap) => data_columns % slots == 0,
            (slots, Overflow::Drop) => data_columns <= slots,
        };
        if fits {
            Ok(())
        } else {
            Err(PipelineError::LayoutMismatch {
                data_columns,
                slots: self.slots,
            })
        }
    }
}

/// One accepted numeric cell with the row's descriptive context.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub row: usize,
    pub col: usize,
    pub slot: usize,
    pub field: Field,
    /// First descriptive column, whitespace-normalized.
    pub category: String,
    /// Second descriptive column, whitespace-normalized.
    pub label: String,
    pub value: f64,
}

impl Observation {
    /// The second descriptive column read as an institution scale.
    pub fn scale(&self) -> Scale {
        classify_scale(&self.label)
    }
}

/// Bookkeeping from one extraction pass.
#[derive(Debug, Default)]
pub struct ExtractStats {
    pub rows_seen: usize,
    pub header_echo_skipped: bool,
    /// Rows without two descriptive columns, as `SchemaMismatch` errors.
    pub skipped_rows: Vec<PipelineError>,
    /// Non-empty data cells that failed numeric sniffing.
    pub cells_rejected: usize,
    /// Values whose year fell outside the accepted window.
    pub out_of_range: usize,
    pub layout_mismatch: Option<PipelineError>,
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub observations: Vec<Observation>,
    pub stats: ExtractStats,
}

/// Walk every data cell of `table` in row-major order and keep those that
/// sniff as non-negative numbers. `years` is the window a repeated row of
/// year labels is recognised by.
pub fn extract_slots(
    table: &RawTable,
    layout: &SlotLayout,
    check: SpanCheck,
    years: &RangeInclusive<i32>,
) -> Result<Extraction> {
    let mut out = Extraction::default();

    if let Err(mismatch) = layout.check(table.width()) {
        match check {
            SpanCheck::Strict => return Err(mismatch),
            SpanCheck::Warn => {
                warn!(width = table.width(), slots = layout.slots, "{}", mismatch);
                out.stats.layout_mismatch = Some(mismatch);
            }
        }
    }

    let skip_first = is_header_echo(table, layout, years);
    if skip_first {
        warn!(row = ?table.rows.first(), "first data row repeats the header; skipped");
    }
    out.stats.header_echo_skipped = skip_first;

    for (r, row) in table.rows.iter().enumerate() {
        if r == 0 && skip_first {
            continue;
        }
        out.stats.rows_seen += 1;

        if row.len() < 2 {
            debug!(row = r, columns = row.len(), "skipping row without descriptive columns");
            out.stats.skipped_rows.push(PipelineError::SchemaMismatch {
                row: r,
                columns: row.len(),
            });
            continue;
        }

        let category = clean_text(&clean_str(&row[0]));
        let label = clean_text(&clean_str(&row[1]));
        let field = classify_field(&category);

        for col in layout.first_data_col..row.len() {
            let Some(slot) = layout.slot(col) else {
                continue;
            };
            match table.value(r, col) {
                Some(value) => out.observations.push(Observation {
                    row: r,
                    col,
                    slot,
                    field,
                    category: category.clone(),
                    label: label.clone(),
                    value,
                }),
                None if !row[col].trim().is_empty() => out.stats.cells_rejected += 1,
                None => {}
            }
        }
    }

    Ok(out)
}

/// Column titles KOSIS puts over the descriptive columns.
const DESCRIPTOR_TITLES: [&str; 10] = [
    "분야", "기술분야", "구분", "항목", "규모", "기업규모", "기술", "기술명", "지역", "단계",
];

/// A descriptive cell that names no entity: blank, a copy of its header,
/// or a column title.
fn is_unlabelled(cell: &str, header: Option<&String>) -> bool {
    let cell = clean_str(cell);
    cell.is_empty()
        || header.is_some_and(|h| clean_str(h) == cell)
        || DESCRIPTOR_TITLES.contains(&cell.as_str())
}

/// KOSIS exports often repeat the header (or a row of year labels) as the
/// first data line. Such a row carries no measurements. A row of year-like
/// numbers only counts when its descriptive cells carry no label, since a
/// count can happen to equal a year.
fn is_header_echo(table: &RawTable, layout: &SlotLayout, years: &RangeInclusive<i32>) -> bool {
    let Some(first) = table.rows.first() else {
        return false;
    };

    let same_as_header = first.len() == table.headers.len()
        && first
            .iter()
            .zip(&table.headers)
            .all(|(a, b)| clean_str(a) == clean_str(b));
    if same_as_header {
        return true;
    }

    let data: Vec<&String> = first
        .iter()
        .skip(layout.first_data_col)
        .filter(|c| !c.trim().is_empty())
        .collect();
    let values: Vec<f64> = data.iter().filter_map(|c| parse_value(c)).collect();
    if values.is_empty() {
        return true;
    }

    let unlabelled = first
        .iter()
        .take(layout.first_data_col)
        .enumerate()
        .all(|(i, cell)| is_unlabelled(cell, table.headers.get(i)));

    unlabelled
        && values.len() == data.len()
        && values
            .iter()
            .all(|v| v.fract() == 0.0 && years.contains(&(*v as i32)))
}

/// Year dimension: `year = base + slot`, with slots from a wrapping layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearAxis {
    pub first_data_col: usize,
    pub base: i32,
    pub span: usize,
    pub overflow: Overflow,
    pub valid: RangeInclusive<i32>,
}

impl YearAxis {
    pub fn new(first_data_col: usize, base: i32, span: usize) -> Self {
        Self {
            first_data_col,
            base,
            span,
            overflow: Overflow::Wrap,
            valid: VALID_YEARS,
        }
    }

    pub fn layout(&self) -> SlotLayout {
        SlotLayout {
            first_data_col: self.first_data_col,
            slots: self.span,
            overflow: self.overflow,
        }
    }

    pub fn year(&self, slot: usize) -> i32 {
        self.base + slot as i32
    }
}

/// An observation placed on the year axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Dated {
    pub year: i32,
    pub observation: Observation,
}

/// Extract along a year axis, dropping anything outside `axis.valid`.
pub fn extract_years(
    table: &RawTable,
    axis: &YearAxis,
    check: SpanCheck,
) -> Result<(Vec<Dated>, ExtractStats)> {
    let Extraction {
        observations,
        mut stats,
    } = extract_slots(table, &axis.layout(), check, &axis.valid)?;

    let mut dated = Vec::with_capacity(observations.len());
    for observation in observations {
        let year = axis.year(observation.slot);
        if axis.valid.contains(&year) {
            dated.push(Dated { year, observation });
        } else {
            stats.out_of_range += 1;
        }
    }
    Ok((dated, stats))
}

/// `year = year_base + ((col - first_data_col_offset) mod year_span)` over
/// every data cell, with mismatched widths logged rather than refused.
pub fn extract(
    table: &RawTable,
    first_data_col_offset: usize,
    year_base: i32,
    year_span: usize,
) -> Vec<Dated> {
    let axis = YearAxis::new(first_data_col_offset, year_base, year_span);
    extract_years(table, &axis, SpanCheck::Warn)
        .map(|(dated, _)| dated)
        .unwrap_or_default()
}

use super::utils::{clean_str, parse_value};

/// One parsed raw export. Built once by the reader and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column labels from the first line of the file, as the file states them
    /// (possibly duplicated, blank or meaningless).
    pub headers: Vec<String>,
    /// Every following non-blank line, one String per cell.
    pub rows: Vec<Vec<String>>,
    /// Delimiter the reader settled on.
    pub delimiter: u8,
}

/// A typed view of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Empty,
    Number(f64),
    Text(&'a str),
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            delimiter: b',',
        }
    }

    /// Widest line in the table, header included.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cleaned text of a cell; `None` when out of bounds or blank.
    pub fn text(&self, row: usize, col: usize) -> Option<String> {
        let raw = self.rows.get(row)?.get(col)?;
        let cleaned = clean_str(raw);
        (!cleaned.is_empty()).then_some(cleaned)
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell<'_> {
        match self.rows.get(row).and_then(|r| r.get(col)) {
            None => Cell::Empty,
            Some(raw) if raw.trim().is_empty() => Cell::Empty,
            Some(raw) => match parse_value(raw) {
                Some(v) => Cell::Number(v),
                None => Cell::Text(raw.trim()),
            },
        }
    }

    /// Accepted non-negative numeric value at a position, if any.
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        match self.cell(row, col) {
            Cell::Number(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        RawTable::new(
            vec!["분야".into(), "규모".into(), "2019".into()],
            vec![
                vec!["감축".into(), "대기업".into(), "1,234.5".into()],
                vec!["적응".into(), " ".into(), "N/A".into(), "7".into()],
            ],
        )
    }

    #[test]
    fn width_covers_ragged_rows() {
        assert_eq!(table().width(), 4);
        assert_eq!(table().row_count(), 2);
    }

    #[test]
    fn cells_are_typed() {
        let t = table();
        assert_eq!(t.cell(0, 2), Cell::Number(1234.5));
        assert_eq!(t.cell(1, 2), Cell::Text("N/A"));
        assert_eq!(t.cell(1, 1), Cell::Empty);
        assert_eq!(t.cell(9, 0), Cell::Empty);
        assert_eq!(t.value(1, 3), Some(7.0));
        assert_eq!(t.text(1, 1), None);
        assert_eq!(t.text(0, 1).as_deref(), Some("대기업"));
    }
}

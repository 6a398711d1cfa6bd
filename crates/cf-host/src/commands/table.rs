//! Column-aligned table output.

use unicode_width::UnicodeWidthStr;

const COLUMN_GAP: &str = "   ";

/// A table rendered as space-padded lines.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table with the given column headers.
    #[must_use]
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|header| (*header).to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Missing cells render empty and extra cells are kept.
    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Returns `true` when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the header and rows, padding every column but the last to
    /// its widest cell by display width.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let all_rows = || iter_rows(&self.headers, &self.rows);
        let columns = all_rows().map(<[String]>::len).max().unwrap_or_default();
        let widths: Vec<usize> = (0..columns)
            .map(|column| {
                all_rows()
                    .filter_map(|row| row.get(column))
                    .map(|cell| cell.width())
                    .max()
                    .unwrap_or_default()
            })
            .collect();
        all_rows()
            .map(|row| render_row(row, &widths))
            .collect()
    }
}

fn iter_rows<'a>(
    headers: &'a [String],
    rows: &'a [Vec<String>],
) -> impl Iterator<Item = &'a [String]> {
    std::iter::once(headers).chain(rows.iter().map(Vec::as_slice))
}

fn render_row(row: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (column, width) in widths.iter().enumerate() {
        let cell = row.get(column).map_or("", String::as_str);
        if column > 0 {
            line.push_str(COLUMN_GAP);
        }
        line.push_str(cell);
        line.extend(std::iter::repeat_n(' ', width.saturating_sub(cell.width())));
    }
    line.trim_end().to_owned()
}

//! Sheet Module
//! In-memory table: a header of unique column names plus rectangular rows.

use super::Cell;
use std::collections::HashMap;

static EMPTY: Cell = Cell::Empty;

/// A worksheet loaded with its first row as header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns: unique_column_names(columns.into_iter().map(Cell::text)),
            rows: Vec::new(),
        }
    }

    /// Split a raw grid into header (first row) and data rows.
    pub fn from_grid(mut grid: Vec<Vec<Cell>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let header = grid.remove(0);
        let mut sheet = Self {
            columns: unique_column_names(header),
            rows: Vec::with_capacity(grid.len()),
        };
        for row in grid {
            sheet.push_row(row);
        }
        sheet
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (row, col); out-of-range reads are `Empty`.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Overwrite a cell. Writes outside the table are ignored.
    pub fn set_cell(&mut self, row: usize, col: usize, value: Cell) {
        if let Some(slot) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *slot = value;
        }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |r| r.get(col).unwrap_or(&EMPTY))
    }

    /// Drop rows whose key repeats an earlier row's key. `None` keys compare equal.
    pub fn dedup_by_key<F>(&mut self, mut key: F) -> usize
    where
        F: FnMut(&[Cell]) -> Option<String>,
    {
        let before = self.rows.len();
        let mut seen = std::collections::HashSet::new();
        self.rows.retain(|r| seen.insert(key(r)));
        before - self.rows.len()
    }

    /// Copy of the single row at `row`, keeping the header.
    pub fn select_row(&self, row: usize) -> Option<Sheet> {
        let data = self.rows.get(row)?;
        Some(Sheet {
            columns: self.columns.clone(),
            rows: vec![data.clone()],
        })
    }

    /// Stack sheets, aligning columns by name. Columns appear in first-seen order.
    pub fn concat(sheets: &[Sheet]) -> Sheet {
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for sheet in sheets {
            for name in &sheet.columns {
                if !index.contains_key(name) {
                    index.insert(name.clone(), columns.len());
                    columns.push(name.clone());
                }
            }
        }

        let mut out = Sheet {
            columns,
            rows: Vec::new(),
        };
        for sheet in sheets {
            let positions: Vec<usize> = sheet.columns.iter().map(|c| index[c]).collect();
            for row in &sheet.rows {
                let mut aligned = vec![Cell::Empty; out.columns.len()];
                for (value, &pos) in row.iter().zip(&positions) {
                    aligned[pos] = value.clone();
                }
                out.rows.push(aligned);
            }
        }
        out
    }
}

/// Header names the way spreadsheet readers usually mangle them:
/// blanks become `Unnamed: <idx>`, repeats get `.1`, `.2`, ...
fn unique_column_names(header: impl IntoIterator<Item = Cell>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();
    for (idx, cell) in header.into_iter().enumerate() {
        let base = cell
            .normalized()
            .unwrap_or_else(|| format!("Unnamed: {}", idx));
        let mut name = base.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        seen.insert(name.clone(), 0);
        names.push(name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::text(*v)).collect()
    }

    #[test]
    fn header_names_are_mangled() {
        let sheet = Sheet::from_grid(vec![text_row(&["a", "", "a", "a"])]);
        assert_eq!(sheet.columns(), ["a", "Unnamed: 1", "a.1", "a.2"]);
    }

    #[test]
    fn rows_are_padded_to_header_width() {
        let sheet = Sheet::from_grid(vec![text_row(&["a", "b", "c"]), text_row(&["x"])]);
        assert_eq!(sheet.rows()[0].len(), 3);
        assert_eq!(sheet.cell(0, 2), &Cell::Empty);
        assert_eq!(sheet.cell(5, 5), &Cell::Empty);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut sheet = Sheet::from_grid(vec![
            text_row(&["k", "v"]),
            text_row(&["a", "1"]),
            text_row(&["a", "2"]),
            text_row(&["", "3"]),
            text_row(&["", "4"]),
        ]);
        let removed = sheet.dedup_by_key(|r| r[0].normalized());
        assert_eq!(removed, 2);
        assert_eq!(sheet.cell(0, 1), &Cell::text("1"));
        assert_eq!(sheet.cell(1, 1), &Cell::text("3"));
    }

    #[test]
    fn concat_aligns_by_name() {
        let a = Sheet::from_grid(vec![text_row(&["x", "y"]), text_row(&["1", "2"])]);
        let b = Sheet::from_grid(vec![text_row(&["y", "z"]), text_row(&["3", "4"])]);
        let out = Sheet::concat(&[a, b]);
        assert_eq!(out.columns(), ["x", "y", "z"]);
        assert_eq!(out.rows()[1], vec![Cell::Empty, Cell::text("3"), Cell::text("4")]);
    }
}

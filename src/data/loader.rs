//! Workbook Loader Module
//! Reads the first worksheet of an xlsx/xls/ods file using calamine.

use super::{Cell, Sheet};
use calamine::{open_workbook_auto, Reader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("Workbook has no worksheets: {0}")]
    NoSheets(PathBuf),
}

/// Loads worksheets into [`Sheet`]s or raw cell grids.
pub struct DataLoader;

impl DataLoader {
    /// Load the first worksheet, treating its first row as the header.
    pub fn load_sheet(path: &Path) -> Result<Sheet, LoaderError> {
        Ok(Sheet::from_grid(Self::load_grid(path)?))
    }

    /// Load the first worksheet as a raw grid, cell positions preserved.
    pub fn load_grid(path: &Path) -> Result<Vec<Vec<Cell>>, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        let wrap = |source| LoaderError::Workbook {
            path: path.to_path_buf(),
            source,
        };

        let mut workbook = open_workbook_auto(path).map_err(wrap)?;
        let first = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| LoaderError::NoSheets(path.to_path_buf()))?;
        let range = workbook.worksheet_range(&first).map_err(wrap)?;

        // calamine ranges start at the first used cell; pad back to A1.
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut grid: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; col_offset];
            cells.extend(row.iter().map(Cell::from));
            grid.push(cells);
        }

        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut grid {
            row.resize(width, Cell::Empty);
        }

        tracing::debug!(
            "Loaded {} ({} rows x {} cols)",
            path.display(),
            grid.len(),
            width
        );
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::XlsxWriter;

    #[test]
    fn missing_file_is_reported() {
        let err = DataLoader::load_sheet(Path::new("does/not/exist.xlsx")).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }

    #[test]
    fn leading_blank_column_keeps_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");
        let grid = vec![
            vec![Cell::Empty, Cell::text("b"), Cell::text("c")],
            vec![Cell::Empty, Cell::Number(1.0), Cell::Number(2.5)],
        ];
        XlsxWriter::write_grid(&grid, &path).unwrap();

        let back = DataLoader::load_grid(&path).unwrap();
        assert_eq!(back, grid);

        let sheet = DataLoader::load_sheet(&path).unwrap();
        assert_eq!(sheet.columns(), ["Unnamed: 0", "b", "c"]);
        assert_eq!(sheet.cell(0, 2), &Cell::Number(2.5));
    }
}

//! Data Processor Module
//! Numeric column work backed by Polars: means, extremes and CSV summaries.

use super::{Cell, Sheet};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handles numeric transformations over [`Sheet`] columns.
pub struct DataProcessor;

impl DataProcessor {
    /// Numeric view of one column; non-numeric cells become `None`.
    pub fn numeric_column(sheet: &Sheet, col: usize) -> Vec<Option<f64>> {
        sheet.column(col).map(Cell::as_f64).collect()
    }

    /// Build a Float64 frame with one column per sheet column.
    ///
    /// Column names are positional (`c0`, `c1`, ...) since sheet headers may repeat.
    pub fn numeric_frame(sheet: &Sheet) -> Result<DataFrame, ProcessorError> {
        let columns: Vec<Column> = (0..sheet.width())
            .map(|idx| Column::new(format!("c{}", idx).into(), Self::numeric_column(sheet, idx)))
            .collect();
        Ok(DataFrame::new(columns)?)
    }

    /// Mean of every column over its numeric cells; `None` where a column has none.
    pub fn column_means(sheet: &Sheet) -> Result<Vec<Option<f64>>, ProcessorError> {
        let df = Self::numeric_frame(sheet)?;
        Ok(df
            .get_columns()
            .iter()
            .map(|col| col.as_materialized_series().mean())
            .collect())
    }

    /// Row of per-column means, blank where a column has no numeric values.
    pub fn average_row(sheet: &Sheet) -> Result<Vec<Cell>, ProcessorError> {
        Ok(Self::column_means(sheet)?
            .into_iter()
            .map(Cell::from)
            .collect())
    }

    /// Minimum and maximum of the present values.
    pub fn extremes(values: &[Option<f64>]) -> Result<Option<(f64, f64)>, ProcessorError> {
        let series = Series::new("values".into(), values.to_vec());
        let ca = series.f64()?;
        Ok(ca.min().zip(ca.max()))
    }

    /// Write a two-column `label,count` summary as CSV.
    pub fn write_counts_csv<'a, I>(
        entries: I,
        label: &str,
        count_label: &str,
        path: &Path,
    ) -> Result<(), ProcessorError>
    where
        I: IntoIterator<Item = (&'a String, usize)>,
    {
        let (labels, counts): (Vec<String>, Vec<u32>) = entries
            .into_iter()
            .map(|(k, v)| (k.clone(), v as u32))
            .unzip();

        let mut df = DataFrame::new(vec![
            Column::new(label.into(), labels),
            Column::new(count_label.into(), counts),
        ])?;

        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        Ok(())
    }
}

/// Round to `digits` decimals, ties to even.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Sheet {
        let mut sheet = Sheet::new(vec!["name".into(), "a".into(), "b".into()]);
        sheet.push_row(vec![Cell::text("x"), Cell::Number(1.0), Cell::Empty]);
        sheet.push_row(vec![Cell::text("y"), Cell::text("2"), Cell::Empty]);
        sheet.push_row(vec![Cell::text("z"), Cell::Number(6.0), Cell::text("n/a")]);
        sheet
    }

    #[test]
    fn means_skip_non_numeric_cells() {
        let means = DataProcessor::column_means(&sample()).unwrap();
        assert_eq!(means, vec![None, Some(3.0), None]);
    }

    #[test]
    fn average_row_blanks_text_columns() {
        let row = DataProcessor::average_row(&sample()).unwrap();
        assert_eq!(row, vec![Cell::Empty, Cell::Number(3.0), Cell::Empty]);
    }

    #[test]
    fn extremes_ignore_missing() {
        let values = [Some(0.2), None, Some(-1.5), Some(0.9)];
        assert_eq!(DataProcessor::extremes(&values).unwrap(), Some((-1.5, 0.9)));
        assert_eq!(DataProcessor::extremes(&[None, None]).unwrap(), None);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(7359.999, 2), 7360.0);
        // exact ties go to the even digit
        assert_eq!(round_to(0.03125, 4), 0.0312);
        assert_eq!(round_to(-0.03125, 4), -0.0312);
        assert_eq!(round_to(2.5, 0), 2.0);
    }

    #[test]
    fn counts_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.csv");
        let a = "W00".to_string();
        let b = "L0E".to_string();
        DataProcessor::write_counts_csv([(&a, 2), (&b, 1)], "prefix", "draw_no_count", &path)
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["prefix,draw_no_count", "W00,2", "L0E,1"]);
    }
}

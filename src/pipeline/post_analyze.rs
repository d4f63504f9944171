//! Post-analyze step: delta extremes and cladding diameter checks over the
//! merged report, with flagged cells painted red in an annotated copy.

use super::{require_columns, require_file, StepError};
use crate::config::PipelineConfig;
use crate::data::{Cell, DataLoader, DataProcessor, Highlights, ProcessorError, Sheet, XlsxWriter};

const COL_SECOND: usize = 1;
const COL_DELTA: usize = 22;
const COL_CLAD_IE: usize = 24;
const COL_CLAD_OE: usize = 25;
const NEEDED_COLUMNS: usize = COL_CLAD_OE + 1;

/// An extreme value and every data row holding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extreme {
    pub value: f64,
    pub rows: Vec<usize>,
}

/// A cladding diameter outside the accepted range.
#[derive(Debug, Clone, PartialEq)]
pub struct Outlier {
    pub row: usize,
    pub column: usize,
    pub label: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostAnalysis {
    pub delta_min: Option<Extreme>,
    pub delta_max: Option<Extreme>,
    /// I/E outliers first, then O/E, each in row order.
    pub clad_outliers: Vec<Outlier>,
}

impl PostAnalysis {
    /// Cells to paint: every delta extreme and every clad outlier.
    pub fn highlights(&self) -> Highlights {
        let mut cells = Highlights::new();
        for extreme in self.delta_min.iter().chain(self.delta_max.iter()) {
            cells.extend(extreme.rows.iter().map(|&r| (r, COL_DELTA)));
        }
        cells.extend(self.clad_outliers.iter().map(|o| (o.row, o.column)));
        cells
    }
}

fn rows_equal_to(values: &[Option<f64>], target: f64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v == Some(target))
        .map(|(r, _)| r)
        .collect()
}

/// Analyze a merged report sheet. The sheet must hold at least 26 columns.
pub fn analyze_total(sheet: &Sheet, cfg: &PipelineConfig) -> Result<PostAnalysis, ProcessorError> {
    let delta = DataProcessor::numeric_column(sheet, COL_DELTA);

    let mut analysis = PostAnalysis::default();
    if let Some((min, max)) = DataProcessor::extremes(&delta)? {
        analysis.delta_min = Some(Extreme {
            value: min,
            rows: rows_equal_to(&delta, min),
        });
        analysis.delta_max = Some(Extreme {
            value: max,
            rows: rows_equal_to(&delta, max),
        });
    }

    for (column, label) in [(COL_CLAD_IE, "Clad Dia. I/E"), (COL_CLAD_OE, "Clad Dia. O/E")] {
        let values = DataProcessor::numeric_column(sheet, column);
        for (row, value) in values.into_iter().enumerate() {
            let Some(value) = value else { continue };
            if value < cfg.clad_dia_min || value > cfg.clad_dia_max {
                analysis.clad_outliers.push(Outlier {
                    row,
                    column,
                    label,
                    value,
                });
            }
        }
    }

    Ok(analysis)
}

fn second_column(sheet: &Sheet, row: usize) -> String {
    match sheet.cell(row, COL_SECOND) {
        Cell::Empty => "-".to_string(),
        cell => cell.to_string(),
    }
}

fn log_analysis(sheet: &Sheet, analysis: &PostAnalysis, cfg: &PipelineConfig) {
    tracing::info!("1. delta 2m-22m check");
    match (&analysis.delta_min, &analysis.delta_max) {
        (Some(min), Some(max)) => {
            for &row in &min.rows {
                tracing::info!("  min: {} | column 2: {}", min.value, second_column(sheet, row));
            }
            for &row in &max.rows {
                tracing::info!("  max: {} | column 2: {}", max.value, second_column(sheet, row));
            }
        }
        _ => tracing::info!("No numeric delta 2m-22m values"),
    }

    tracing::info!(
        "2. cladding diameter check [{}, {}]",
        cfg.clad_dia_min,
        cfg.clad_dia_max
    );
    if analysis.clad_outliers.is_empty() {
        tracing::info!("No abnormal values");
    }
    for outlier in &analysis.clad_outliers {
        tracing::warn!(
            "Abnormal value: {} = {} (row {}) | column 2: {}",
            outlier.label,
            outlier.value,
            outlier.row,
            second_column(sheet, outlier.row)
        );
    }
}

pub(super) fn run(cfg: &PipelineConfig) -> Result<(), StepError> {
    let total_path = cfg.total_report_path();
    require_file(&total_path)?;

    let sheet = DataLoader::load_sheet(&total_path)?;
    require_columns(&total_path, &sheet, NEEDED_COLUMNS)?;

    let analysis = analyze_total(&sheet, cfg)?;
    log_analysis(&sheet, &analysis, cfg);

    let annotated = cfg.annotated_report_path();
    XlsxWriter::write_highlighted(&sheet, &analysis.highlights(), &annotated)?;
    tracing::info!("Saved {}", annotated.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_sheet(rows: &[(&str, Cell, Cell, Cell)]) -> Sheet {
        let mut sheet = Sheet::new((0..NEEDED_COLUMNS).map(|i| format!("c{}", i)).collect());
        for (spool, delta, ie, oe) in rows {
            let mut row = vec![Cell::Empty; NEEDED_COLUMNS];
            row[COL_SECOND] = Cell::text(*spool);
            row[COL_DELTA] = delta.clone();
            row[COL_CLAD_IE] = ie.clone();
            row[COL_CLAD_OE] = oe.clone();
            sheet.push_row(row);
        }
        sheet
    }

    #[test]
    fn finds_tied_extremes_and_clad_outliers() {
        let sheet = total_sheet(&[
            ("s1", Cell::Number(0.02), Cell::Number(125.0), Cell::Number(125.0)),
            ("s2", Cell::Number(0.10), Cell::Number(124.0), Cell::Number(125.0)),
            ("s3", Cell::Number(0.02), Cell::Number(125.0), Cell::Number(126.0)),
            ("s4", Cell::text("n/a"), Cell::Number(125.8), Cell::Empty),
        ]);
        let analysis = analyze_total(&sheet, &PipelineConfig::default()).unwrap();

        assert_eq!(
            analysis.delta_min,
            Some(Extreme {
                value: 0.02,
                rows: vec![0, 2]
            })
        );
        assert_eq!(analysis.delta_max.as_ref().map(|e| e.rows.clone()), Some(vec![1]));

        let flagged: Vec<(usize, usize)> = analysis
            .clad_outliers
            .iter()
            .map(|o| (o.row, o.column))
            .collect();
        assert_eq!(
            flagged,
            [(1, COL_CLAD_IE), (3, COL_CLAD_IE), (2, COL_CLAD_OE)]
        );

        let highlights = analysis.highlights();
        assert_eq!(highlights.len(), 6);
        assert!(highlights.contains(&(2, COL_DELTA)));
    }

    #[test]
    fn range_bounds_are_accepted() {
        let sheet = total_sheet(&[(
            "s1",
            Cell::Empty,
            Cell::Number(124.3),
            Cell::Number(125.7),
        )]);
        let analysis = analyze_total(&sheet, &PipelineConfig::default()).unwrap();
        assert!(analysis.clad_outliers.is_empty());
        assert!(analysis.delta_min.is_none());
        assert!(analysis.highlights().is_empty());
    }

    #[test]
    fn narrow_total_is_a_column_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PipelineConfig::default().rooted_at(dir.path());
        std::fs::create_dir_all(&cfg.out_grouped_by_col4).unwrap();
        let mut sheet = Sheet::new(vec!["GROUP".into(), "spool".into()]);
        sheet.push_row(vec![Cell::text("W00"), Cell::text("s1")]);
        XlsxWriter::write_sheet(&sheet, &cfg.total_report_path()).unwrap();

        assert!(matches!(
            run(&cfg),
            Err(StepError::MissingColumns {
                needed: NEEDED_COLUMNS,
                found: 2,
                ..
            })
        ));
        assert!(!cfg.annotated_report_path().exists());
    }
}

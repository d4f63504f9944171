//! Reports step: per-folder `<code>_final_result_report.xlsx` in the fixed
//! measurement report layout.

use super::{dir_name, list_subdirs, require_file, StepError};
use crate::config::PipelineConfig;
use crate::data::{round_to, Cell, DataLoader, XlsxWriter};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// How one report column is filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnSpec {
    /// Title only.
    Blank,
    /// Values of a source column.
    Copy(usize),
    /// Cutoff 2m O/E minus Cutoff 22m, 4 decimals.
    Delta,
    /// MFD 1310nm O/E over Cutoff 2m I/E, times 1000, 2 decimals.
    Mac,
    /// Source column times a factor, 4 decimals.
    Scale(usize, f64),
}

const DELTA_LHS: usize = 19;
const DELTA_RHS: usize = 20;
const MAC_MFD: usize = 11;
const MAC_CUTOFF: usize = 18;

pub const REPORT_SUFFIX: &str = "_final_result_report.xlsx";

pub const REPORT_LAYOUT: [(&str, ColumnSpec); 45] = [
    ("spoolno2", ColumnSpec::Copy(1)),
    ("OTDR length", ColumnSpec::Copy(9)),
    ("Attenuation 1310 I/E", ColumnSpec::Copy(5)),
    ("Attenuation 1310 O/E", ColumnSpec::Copy(6)),
    ("Attenuation 1383 I/E", ColumnSpec::Copy(73)),
    ("Attenuation 1383 O/E", ColumnSpec::Copy(74)),
    ("Attenuation 1550 I/E", ColumnSpec::Copy(7)),
    ("Attenuation 1550 O/E", ColumnSpec::Copy(8)),
    ("Attenuation 1625 I/E", ColumnSpec::Copy(75)),
    ("Attenuation 1625 O/E", ColumnSpec::Copy(76)),
    ("MFD 1310nm I/E", ColumnSpec::Copy(12)),
    ("MFD 1310nm O/E", ColumnSpec::Copy(13)),
    ("", ColumnSpec::Blank),
    ("", ColumnSpec::Blank),
    ("", ColumnSpec::Blank),
    ("", ColumnSpec::Blank),
    ("", ColumnSpec::Blank),
    ("", ColumnSpec::Blank),
    ("Cutoff 2m I/E", ColumnSpec::Copy(14)),
    ("Cutoff 2m O/E", ColumnSpec::Copy(15)),
    ("Cutoff 22m", ColumnSpec::Copy(24)),
    ("delta 2m-22m", ColumnSpec::Delta),
    ("Mac value", ColumnSpec::Mac),
    ("Clad Dia. I/E", ColumnSpec::Copy(16)),
    ("Clad Dia. O/E", ColumnSpec::Copy(17)),
    ("Clad Ovality I/E", ColumnSpec::Copy(18)),
    ("Clad Ovality O/E", ColumnSpec::Copy(19)),
    ("Core Ovality I/E", ColumnSpec::Copy(20)),
    ("Core Ovality O/E", ColumnSpec::Copy(21)),
    ("ECC I/E", ColumnSpec::Copy(22)),
    ("ECC O/E", ColumnSpec::Copy(23)),
    ("Zero Dispersion Wave.", ColumnSpec::Copy(30)),
    ("dispslope at ZDW", ColumnSpec::Copy(31)),
    ("Dispersion 1285", ColumnSpec::Copy(32)),
    ("Dispersion 1290", ColumnSpec::Copy(33)),
    ("Dispersion 1330", ColumnSpec::Copy(34)),
    ("Dispersion 1550", ColumnSpec::Copy(35)),
    ("", ColumnSpec::Blank),
    ("PMD", ColumnSpec::Copy(37)),
    ("R7.5mm 1t 1550", ColumnSpec::Scale(26, 0.1)),
    ("R7.5mm 1t 1625", ColumnSpec::Scale(69, 0.1)),
    ("R10mm 1t 1550", ColumnSpec::Scale(70, 0.1)),
    ("R10mm 1t 1625", ColumnSpec::Scale(71, 0.1)),
    ("R15mm 10t 1550", ColumnSpec::Scale(81, 0.5)),
    ("R15mm 10t 1625", ColumnSpec::Scale(82, 0.5)),
];

/// `<dir>.xlsx`, else `final.xlsx`.
pub fn pick_input_file(dir: &Path) -> Option<PathBuf> {
    let own = dir.join(format!("{}.xlsx", dir_name(dir)));
    let fallback = dir.join("final.xlsx");
    [own, fallback].into_iter().find(|p| p.exists())
}

/// Lay a raw input grid out as a report grid.
///
/// Row 0 of the input is its header and is skipped. Row 0 of the output holds
/// the layout titles. Computed columns read earlier output columns, so the
/// layout is filled left to right.
pub fn build_report(input: &[Vec<Cell>]) -> Vec<Vec<Cell>> {
    let data_rows = input.len().saturating_sub(1);

    let mut out = vec![vec![Cell::Empty; REPORT_LAYOUT.len()]; data_rows + 1];
    for (c, (title, spec)) in REPORT_LAYOUT.iter().enumerate() {
        out[0][c] = Cell::text(*title);
        for r in 1..=data_rows {
            out[r][c] = match *spec {
                ColumnSpec::Blank => Cell::Empty,
                ColumnSpec::Copy(src) => input[r].get(src).cloned().unwrap_or_default(),
                ColumnSpec::Scale(src, factor) => input[r]
                    .get(src)
                    .and_then(Cell::as_f64)
                    .map(|v| round_to(v * factor, 4))
                    .into(),
                ColumnSpec::Delta => out[r][DELTA_LHS]
                    .as_f64()
                    .zip(out[r][DELTA_RHS].as_f64())
                    .map(|(a, b)| round_to(a - b, 4))
                    .into(),
                ColumnSpec::Mac => out[r][MAC_MFD]
                    .as_f64()
                    .zip(out[r][MAC_CUTOFF].as_f64())
                    .map(|(mfd, cutoff)| round_to(mfd / cutoff * 1000.0, 2))
                    .into(),
            };
        }
    }
    out
}

fn build_folder_report(dir: &Path) -> Option<PathBuf> {
    let name = dir_name(dir);
    let Some(src) = pick_input_file(dir) else {
        tracing::warn!("{}: no input (<folder>.xlsx / final.xlsx)", name);
        return None;
    };

    let grid = match DataLoader::load_grid(&src) {
        Ok(grid) => grid,
        Err(e) => {
            tracing::warn!("{}: read error: {}", name, e);
            return None;
        }
    };

    let dst = dir.join(format!("{}{}", name, REPORT_SUFFIX));
    match XlsxWriter::write_grid(&build_report(&grid), &dst) {
        Ok(()) => {
            tracing::info!("Saved {}", dst.display());
            Some(dst)
        }
        Err(e) => {
            tracing::warn!("{}: save error: {}", name, e);
            None
        }
    }
}

pub(super) fn run(cfg: &PipelineConfig) -> Result<(), StepError> {
    let root = &cfg.out_grouped_by_col4;
    require_file(root)?;

    let subfolders = list_subdirs(root, |name| !name.starts_with("~$") && !name.starts_with('.'))?;
    if subfolders.is_empty() {
        tracing::info!("No sub-folders to report on");
        return Ok(());
    }

    let written = subfolders
        .par_iter()
        .filter_map(|dir| build_folder_report(dir))
        .count();
    tracing::info!("{} of {} reports written", written, subfolders.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_row(cells: &[(usize, Cell)]) -> Vec<Cell> {
        let mut row = vec![Cell::Empty; 84];
        for (idx, cell) in cells {
            row[*idx] = cell.clone();
        }
        row
    }

    #[test]
    fn layout_titles_and_computed_columns() {
        let header = input_row(&[(0, Cell::text("h"))]);
        let data = input_row(&[
            (1, Cell::text("W0012345B")),
            (13, Cell::Number(9.2)),
            (14, Cell::Number(1.25)),
            (15, Cell::Number(1.31)),
            (24, Cell::Number(1.2)),
            (26, Cell::Number(0.123456)),
            (81, Cell::text("2")),
        ]);
        let report = build_report(&[header, data]);

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].len(), 45);
        assert_eq!(report[0][0], Cell::text("spoolno2"));
        assert_eq!(report[0][12], Cell::Empty);
        assert_eq!(report[0][21], Cell::text("delta 2m-22m"));

        let row = &report[1];
        assert_eq!(row[0], Cell::text("W0012345B"));
        assert_eq!(row[21], Cell::Number(0.11));
        assert_eq!(row[22], Cell::Number(7360.0));
        assert_eq!(row[39], Cell::Number(0.0123));
        assert_eq!(row[43], Cell::Number(1.0));
        // missing inputs stay blank
        assert_eq!(row[1], Cell::Empty);
        assert_eq!(row[44], Cell::Empty);
    }

    #[test]
    fn narrow_input_leaves_columns_blank() {
        let header = vec![Cell::text("a"), Cell::text("b")];
        let data = vec![Cell::Empty, Cell::text("S1")];
        let report = build_report(&[header, data]);
        assert_eq!(report[1][0], Cell::text("S1"));
        assert!(report[1][1..].iter().all(|c| *c == Cell::Empty));
    }

    #[test]
    fn ragged_rows_leave_missing_cells_blank() {
        let header = input_row(&[(0, Cell::text("h"))]);
        let short = vec![Cell::Empty, Cell::text("S9")];
        let report = build_report(&[header, short]);
        assert_eq!(report[1][0], Cell::text("S9"));
        assert_eq!(report[1][19], Cell::Empty);
        assert_eq!(report[1][21], Cell::Empty);
    }

    #[test]
    fn delta_ties_round_to_even() {
        let header = input_row(&[(0, Cell::text("h"))]);
        let data = input_row(&[(15, Cell::Number(1.28125)), (24, Cell::Number(1.25))]);
        let report = build_report(&[header, data]);
        assert_eq!(report[1][21], Cell::Number(0.0312));
    }

    #[test]
    fn final_workbook_is_the_fallback_input() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("W00");
        std::fs::create_dir(&folder).unwrap();
        assert_eq!(pick_input_file(&folder), None);

        std::fs::write(folder.join("final.xlsx"), b"").unwrap();
        assert_eq!(pick_input_file(&folder), Some(folder.join("final.xlsx")));

        std::fs::write(folder.join("W00.xlsx"), b"").unwrap();
        assert_eq!(pick_input_file(&folder), Some(folder.join("W00.xlsx")));
    }

    #[test]
    fn header_only_input_gives_titles_only() {
        let report = build_report(&[vec![Cell::text("a")]]);
        assert_eq!(report.len(), 1);
    }
}

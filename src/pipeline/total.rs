//! Collect-total step: stack every folder report into one workbook.

use super::report::REPORT_SUFFIX;
use super::{dir_name, list_subdirs, require_file, StepError};
use crate::config::PipelineConfig;
use crate::data::{Cell, DataLoader, Sheet, XlsxWriter};
use std::path::PathBuf;

/// Merge `(group, report grid)` pairs. The first grid row of each report is its
/// header; data rows gain a leading `GROUP` column.
pub fn merge_reports(reports: &[(String, Vec<Vec<Cell>>)]) -> Option<Sheet> {
    let non_empty: Vec<&(String, Vec<Vec<Cell>>)> =
        reports.iter().filter(|(_, grid)| !grid.is_empty()).collect();
    let (_, first) = non_empty.first()?;

    let width = non_empty
        .iter()
        .flat_map(|(_, grid)| grid.iter().map(Vec::len))
        .max()
        .unwrap_or(0);

    let mut header = vec!["GROUP".to_string()];
    header.extend((0..width).map(|c| first[0].get(c).map(Cell::to_string).unwrap_or_default()));

    let mut total = Sheet::new(header);
    for (group, grid) in non_empty {
        for row in grid.iter().skip(1) {
            let mut merged = Vec::with_capacity(width + 1);
            merged.push(Cell::text(group.clone()));
            merged.extend(row.iter().cloned());
            total.push_row(merged);
        }
    }
    Some(total)
}

fn report_paths(root: &std::path::Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for dir in list_subdirs(root, |_| true)? {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && dir_name(&path).ends_with(REPORT_SUFFIX) {
                paths.push(path);
            }
        }
    }
    paths.sort();
    Ok(paths)
}

pub(super) fn run(cfg: &PipelineConfig) -> Result<(), StepError> {
    let root = &cfg.out_grouped_by_col4;
    require_file(root)?;

    let paths = report_paths(root)?;
    if paths.is_empty() {
        tracing::warn!("No reports to merge");
        return Ok(());
    }

    let mut reports = Vec::with_capacity(paths.len());
    for path in &paths {
        let group = path.parent().map(dir_name).unwrap_or_default();
        match DataLoader::load_grid(path) {
            Ok(grid) => reports.push((group, grid)),
            Err(e) => tracing::warn!("Read error while merging: {}", e),
        }
    }

    let Some(total) = merge_reports(&reports) else {
        tracing::warn!("No usable report data");
        return Ok(());
    };

    let total_path = cfg.total_report_path();
    match XlsxWriter::write_sheet(&total, &total_path) {
        Ok(()) => tracing::info!("Saved {} ({} rows)", total_path.display(), total.height()),
        Err(e) => tracing::warn!("Save failed: {}", e),
    }
    Ok(())
}

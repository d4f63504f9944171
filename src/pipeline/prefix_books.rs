//! Prefix books: the per-prefix `<code>.xlsx` workbook built from each group's
//! average row (collect-avg), and its spool column fix-up (copy-42).

use super::{dir_name, list_subdirs, require_file, StepError};
use crate::config::PipelineConfig;
use crate::data::{Cell, DataLoader, Sheet, XlsxWriter};
use crate::naming::{is_temp_or_hidden, preform_from_filename};
use std::path::{Path, PathBuf};

const SECOND_COL: usize = 1;
const FOURTH_COL: usize = 3;

/// Group workbooks inside a prefix folder, excluding the folder's own book.
pub fn candidate_files(prefix_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let own = format!("{}.xlsx", dir_name(prefix_dir)).to_lowercase();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(prefix_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = dir_name(&path);
        let is_xlsx = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
        if is_xlsx && name.to_lowercase() != own && !name.starts_with("~$") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Last row of a group workbook with its preform column filled in.
///
/// A blank preform is first copied from the row above, then replaced by the
/// preform id encoded in the file name when there is one.
pub fn take_last_row(sheet: &Sheet, path: &Path, col4: usize) -> Option<Sheet> {
    let last = sheet.height().checked_sub(1)?;
    let mut row = sheet.select_row(last)?;

    if sheet.width() > col4 {
        if last >= 1 && row.cell(0, col4).is_blank() {
            row.set_cell(0, col4, sheet.cell(last - 1, col4).clone());
        }
        let fallback = row.cell(0, col4).normalized();
        if let Some(preform) = preform_from_filename(path, fallback) {
            row.set_cell(0, col4, Cell::text(preform));
        }
    }
    Some(row)
}

pub(super) fn collect_averages(cfg: &PipelineConfig) -> Result<(), StepError> {
    let base = &cfg.out_grouped_by_col4;
    require_file(base)?;

    let prefix_dirs = list_subdirs(base, |name| !name.starts_with("~$"))?;
    if prefix_dirs.is_empty() {
        tracing::info!("No prefix folders to process");
        return Ok(());
    }

    for dir in prefix_dirs {
        let name = dir_name(&dir);
        let files = candidate_files(&dir)?;
        if files.is_empty() {
            tracing::info!("{}: nothing to collect", name);
            continue;
        }

        let mut last_rows = Vec::with_capacity(files.len());
        for path in &files {
            let sheet = match DataLoader::load_sheet(path) {
                Ok(sheet) => sheet,
                Err(e) => {
                    tracing::warn!("Read failed: {}", e);
                    continue;
                }
            };
            match take_last_row(&sheet, path, cfg.col4_idx) {
                Some(row) => last_rows.push(row),
                None => tracing::warn!("Skipped empty file: {}", dir_name(path)),
            }
        }

        if last_rows.is_empty() {
            tracing::info!("{}: no average rows", name);
            continue;
        }

        let book = Sheet::concat(&last_rows);
        let out_file = dir.join(format!("{}.xlsx", name));
        match XlsxWriter::write_sheet(&book, &out_file) {
            Ok(()) => tracing::info!("Saved {} ({} rows)", out_file.display(), book.height()),
            Err(e) => tracing::error!("{}: save failed -> {}", name, e),
        }
    }

    Ok(())
}

/// Text form used for spool ids: `12.0` and `"12.0"` both become `12`.
fn as_plain_text(cell: &Cell) -> Cell {
    if cell.is_blank() {
        return Cell::Empty;
    }
    let text = cell.to_string();
    Cell::text(text.strip_suffix(".0").unwrap_or(&text))
}

/// Overwrite column `to` with the text of column `from`.
pub(crate) fn copy_column_as_text(sheet: &mut Sheet, from: usize, to: usize) {
    for r in 0..sheet.height() {
        let value = as_plain_text(sheet.cell(r, from));
        sheet.set_cell(r, to, value);
    }
}

pub(super) fn copy_col4_to_col2(cfg: &PipelineConfig) -> Result<(), StepError> {
    let root = &cfg.out_grouped_by_col4;
    require_file(root)?;

    let prefix_dirs = list_subdirs(root, |name| !is_temp_or_hidden(name))?;
    if prefix_dirs.is_empty() {
        tracing::info!("No prefix folders to process");
        return Ok(());
    }

    for dir in prefix_dirs {
        let target = dir.join(format!("{}.xlsx", dir_name(&dir)));
        if !target.exists() {
            tracing::info!("Skipped, no book: {}", target.display());
            continue;
        }

        let mut sheet = match DataLoader::load_sheet(&target) {
            Ok(sheet) => sheet,
            Err(e) => {
                tracing::error!("Read failed: {}", e);
                continue;
            }
        };
        if sheet.is_empty() {
            tracing::info!("Skipped empty book: {}", target.display());
            continue;
        }
        if sheet.width() <= FOURTH_COL {
            tracing::warn!(
                "{}: only {} columns, copy skipped",
                target.display(),
                sheet.width()
            );
            continue;
        }

        copy_column_as_text(&mut sheet, FOURTH_COL, SECOND_COL);
        match XlsxWriter::write_sheet(&sheet, &target) {
            Ok(()) => tracing::info!("Updated {}", target.display()),
            Err(e) => tracing::error!("Save failed: {} -> {}", target.display(), e),
        }
    }

    Ok(())
}

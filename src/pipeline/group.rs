//! Group step: split cleaned measurements by code prefix, one workbook per group.

use super::{require_columns, require_file, StepError};
use crate::config::PipelineConfig;
use crate::data::{Cell, DataLoader, DataProcessor, Sheet, XlsxWriter};
use crate::naming::{extract_group_prefix, prefix3, safe_filename, second_last_is_zero};
use std::collections::BTreeMap;

/// Column whose repeated values mark duplicate measurements.
const DEDUP_COL: usize = 2;

/// Filter, key and split the cleaned sheet. Each group is deduplicated and
/// ends with an average row. Keys come back sorted.
pub fn build_groups(
    sheet: &Sheet,
    cfg: &PipelineConfig,
) -> Result<BTreeMap<String, Sheet>, StepError> {
    let (col3, col4) = (cfg.col3_idx, cfg.col4_idx);

    let mut groups: BTreeMap<String, Sheet> = BTreeMap::new();
    for row in sheet.rows() {
        let code = row.get(col3).cloned().unwrap_or_default();
        let code = code.normalized().unwrap_or_default();
        if cfg.filter_second_last_zero && !second_last_is_zero(&code) {
            continue;
        }
        if row.get(col4).map_or(true, Cell::is_blank) {
            continue;
        }

        let key = extract_group_prefix(&code, cfg.use_w_pattern_first);
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        groups
            .entry(key.to_string())
            .or_insert_with(|| Sheet::new(sheet.columns().to_vec()))
            .push_row(row.clone());
    }

    for (key, group) in groups.iter_mut() {
        if group.width() > DEDUP_COL {
            let removed = group.dedup_by_key(|r| r[DEDUP_COL].normalized());
            if removed > 0 {
                tracing::info!(
                    "{}: removed {} duplicate rows by column '{}'",
                    key,
                    removed,
                    group.columns()[DEDUP_COL]
                );
            }
        } else {
            tracing::info!("{}: fewer than 3 columns, dedup skipped", key);
        }

        let avg = DataProcessor::average_row(group)?;
        group.push_row(avg);
    }

    Ok(groups)
}

pub(super) fn run(cfg: &PipelineConfig) -> Result<(), StepError> {
    let src = &cfg.excel_alls_cleaned;
    require_file(src)?;
    let sheet = DataLoader::load_sheet(src)?;
    require_columns(src, &sheet, cfg.col3_idx.max(cfg.col4_idx) + 1)?;

    let groups = build_groups(&sheet, cfg)?;
    if groups.is_empty() {
        tracing::info!("No rows left after filtering");
        return Ok(());
    }

    let mut saved: BTreeMap<String, usize> = BTreeMap::new();
    for (key, group) in &groups {
        let bucket = prefix3(key);
        let dest_dir = cfg.out_grouped_by_col4.join(&bucket);
        std::fs::create_dir_all(&dest_dir)?;

        let out_path = dest_dir.join(format!("{}.xlsx", safe_filename(key)));
        if let Err(e) = XlsxWriter::write_sheet(group, &out_path) {
            tracing::error!("Save failed: {} -> {}", out_path.display(), e);
            continue;
        }
        *saved.entry(bucket).or_insert(0) += 1;
    }

    for (bucket, count) in &saved {
        tracing::info!("{}: {} files saved", bucket, count);
    }
    Ok(())
}

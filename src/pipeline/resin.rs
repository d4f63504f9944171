//! Resin step: resin type counts and draw-number folder layout from `ab.xlsx`.

use super::{require_columns, require_file, StepError};
use crate::config::PipelineConfig;
use crate::data::{DataLoader, DataProcessor, Sheet};
use crate::naming::is_safe_name;
use std::collections::{BTreeMap, BTreeSet};

/// Uppercased resin types and how often each occurs.
pub fn count_resin_types(sheet: &Sheet, col: usize) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for resin in sheet.column(col).filter_map(|c| c.normalized()) {
        *counts.entry(resin.to_uppercase()).or_insert(0) += 1;
    }
    counts
}

/// Usable draw numbers grouped by their first three characters.
pub fn draw_numbers_by_prefix(sheet: &Sheet, col: usize) -> BTreeMap<String, BTreeSet<String>> {
    let mut by_prefix: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for draw_no in sheet.column(col).filter_map(|c| c.normalized()) {
        if draw_no.chars().count() < 3 || !is_safe_name(&draw_no) {
            continue;
        }
        let prefix: String = draw_no.chars().take(3).collect();
        by_prefix.entry(prefix).or_default().insert(draw_no);
    }
    by_prefix
}

pub(super) fn run(cfg: &PipelineConfig) -> Result<(), StepError> {
    let ab = &cfg.excel_ab;
    require_file(ab)?;
    let sheet = DataLoader::load_sheet(ab)?;

    require_columns(ab, &sheet, cfg.resin_col_idx + 1)?;
    let resin_counts = count_resin_types(&sheet, cfg.resin_col_idx);
    if resin_counts.is_empty() {
        tracing::info!("No valid resin types found");
    } else {
        let types: Vec<&str> = resin_counts.keys().map(String::as_str).collect();
        tracing::info!("Resin types: {}", types.join(","));
        for (resin, count) in &resin_counts {
            tracing::info!("{}: {}", resin, count);
        }
    }

    require_columns(ab, &sheet, cfg.drawno_col_idx + 1)?;
    let by_prefix = draw_numbers_by_prefix(&sheet, cfg.drawno_col_idx);

    std::fs::create_dir_all(&cfg.out_grouped_by_prefix)?;
    for (prefix, draw_numbers) in &by_prefix {
        let prefix_dir = cfg.out_grouped_by_prefix.join(prefix);
        for draw_no in draw_numbers {
            std::fs::create_dir_all(prefix_dir.join(draw_no))?;
        }
    }

    if by_prefix.is_empty() {
        tracing::info!("No draw numbers to lay out");
    } else {
        let prefixes: Vec<&str> = by_prefix.keys().map(String::as_str).collect();
        tracing::info!("Prefixes: {}", prefixes.join(","));
        for (prefix, draw_numbers) in &by_prefix {
            tracing::info!("{}: {} draw numbers", prefix, draw_numbers.len());
        }
    }

    if !resin_counts.is_empty() {
        let path = ab.with_file_name("resin_type_counts.csv");
        let resin_header = &sheet.columns()[cfg.resin_col_idx];
        if let Err(e) = DataProcessor::write_counts_csv(
            resin_counts.iter().map(|(k, v)| (k, *v)),
            resin_header,
            "count",
            &path,
        ) {
            tracing::warn!("Could not write {}: {}", path.display(), e);
        }
    }
    if !by_prefix.is_empty() {
        let path = ab.with_file_name("prefix_drawno_counts.csv");
        if let Err(e) = DataProcessor::write_counts_csv(
            by_prefix.iter().map(|(k, v)| (k, v.len())),
            "prefix",
            "draw_no_count",
            &path,
        ) {
            tracing::warn!("Could not write {}: {}", path.display(), e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cell, XlsxWriter};

    fn ab_sheet() -> Sheet {
        let mut sheet = Sheet::new(vec!["draw_no".into(), "resin".into()]);
        for (draw, resin) in [
            ("W0012345", "resin-a"),
            ("W0012346", " RESIN-A "),
            ("W0012346", "ResB"),
            ("L0E22222", ""),
            ("ab", "ResB"),
            ("bad name!", "resb"),
        ] {
            sheet.push_row(vec![Cell::text(draw), Cell::text(resin)]);
        }
        sheet
    }

    #[test]
    fn resin_types_are_uppercased_and_counted() {
        let counts = count_resin_types(&ab_sheet(), 1);
        let expected: BTreeMap<String, usize> =
            [("RESB".to_string(), 3), ("RESIN-A".to_string(), 2)].into_iter().collect();
        assert_eq!(counts, expected);
    }

    #[test]
    fn draw_numbers_skip_short_and_unsafe_values() {
        let by_prefix = draw_numbers_by_prefix(&ab_sheet(), 0);
        assert_eq!(by_prefix.keys().collect::<Vec<_>>(), ["L0E", "W00"]);
        assert_eq!(by_prefix["W00"].len(), 2);
        assert!(!by_prefix.values().flatten().any(|d| d == "ab" || d.contains(' ')));
    }

    #[test]
    fn counts_csv_is_labelled_with_the_resin_header() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PipelineConfig {
            resin_col_idx: 1,
            ..PipelineConfig::default()
        }
        .rooted_at(dir.path());
        XlsxWriter::write_sheet(&ab_sheet(), &cfg.excel_ab).unwrap();

        run(&cfg).unwrap();

        let csv = std::fs::read_to_string(dir.path().join("resin_type_counts.csv")).unwrap();
        assert_eq!(csv.lines().next(), Some("resin,count"));
        assert!(csv.contains("RESB,3"));
        assert!(cfg.out_grouped_by_prefix.join("W00").join("W0012346").is_dir());
    }

    #[test]
    fn narrow_sheet_is_a_column_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PipelineConfig::default().rooted_at(dir.path());
        XlsxWriter::write_sheet(&ab_sheet(), &cfg.excel_ab).unwrap();

        let err = run(&cfg).unwrap_err();
        assert!(matches!(
            err,
            StepError::MissingColumns {
                needed: 5,
                found: 2,
                ..
            }
        ));
    }
}

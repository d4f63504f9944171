//! Zero step: blank out zero measurements in alls.xlsx.

use super::{require_file, StepError};
use crate::config::PipelineConfig;
use crate::data::{Cell, DataLoader, Sheet, XlsxWriter};
use crate::naming::is_zero_like;

/// Replace numeric zeros and zero-like text with empty cells. Returns the count.
pub fn blank_zero_values(sheet: &Sheet) -> (Sheet, usize) {
    let mut cleaned = Sheet::new(sheet.columns().to_vec());
    let mut blanked = 0;
    for row in sheet.rows() {
        let row = row
            .iter()
            .map(|cell| {
                let zero = match cell {
                    Cell::Number(n) => *n == 0.0,
                    Cell::Text(s) => is_zero_like(s),
                    _ => false,
                };
                if zero {
                    blanked += 1;
                    Cell::Empty
                } else {
                    cell.clone()
                }
            })
            .collect();
        cleaned.push_row(row);
    }
    (cleaned, blanked)
}

pub(super) fn run(cfg: &PipelineConfig) -> Result<(), StepError> {
    require_file(&cfg.excel_alls)?;
    let sheet = DataLoader::load_sheet(&cfg.excel_alls)?;

    let (cleaned, blanked) = blank_zero_values(&sheet);
    XlsxWriter::write_sheet(&cleaned, &cfg.excel_alls_cleaned)?;

    tracing::info!(
        "Blanked {} zero cells -> {}",
        blanked,
        cfg.excel_alls_cleaned.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_become_blank_and_others_survive() {
        let mut sheet = Sheet::new(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        sheet.push_row(vec![
            Cell::Number(0.0),
            Cell::text("0.00"),
            Cell::Bool(false),
            Cell::text("A0"),
        ]);
        sheet.push_row(vec![
            Cell::Number(-0.0),
            Cell::text("0,0"),
            Cell::Number(0.5),
            Cell::text("10"),
        ]);

        let (cleaned, blanked) = blank_zero_values(&sheet);
        assert_eq!(blanked, 4);
        assert_eq!(
            cleaned.rows()[0],
            vec![Cell::Empty, Cell::Empty, Cell::Bool(false), Cell::text("A0")]
        );
        assert_eq!(
            cleaned.rows()[1],
            vec![Cell::Empty, Cell::Empty, Cell::Number(0.5), Cell::text("10")]
        );
        assert_eq!(cleaned.columns(), sheet.columns());
    }
}

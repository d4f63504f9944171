//! Pipeline module - the analysis steps and the runner that sequences them

mod group;
mod post_analyze;
mod prefix_books;
mod report;
mod resin;
mod total;
mod types;
mod zero;

pub use group::build_groups;
pub use post_analyze::{analyze_total, Extreme, Outlier, PostAnalysis};
pub use prefix_books::{candidate_files, take_last_row};
pub use report::{build_report, pick_input_file, ColumnSpec, REPORT_LAYOUT};
pub use resin::{count_resin_types, draw_numbers_by_prefix};
pub use total::merge_reports;
pub use types::{summarize_types, TypeSummary};
pub use zero::blank_zero_values;

use crate::config::PipelineConfig;
use crate::data::{LoaderError, ProcessorError, Sheet, WriterError};
use chrono::Local;
use clap::ValueEnum;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StepError {
    #[error("Input not found: {0}")]
    MissingInput(PathBuf),
    #[error("{file}: needs at least {needed} columns, found {found}")]
    MissingColumns {
        file: PathBuf,
        needed: usize,
        found: usize,
    },
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Write(#[from] WriterError),
    #[error(transparent)]
    Process(#[from] ProcessorError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline stages, in their default execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Resin,
    Zero,
    Group,
    CollectAvg,
    #[value(name = "copy-42")]
    #[serde(rename = "copy-42")]
    Copy42,
    Types,
    Reports,
    CollectTotal,
    PostAnalyze,
}

impl Step {
    pub const ALL: [Step; 9] = [
        Step::Resin,
        Step::Zero,
        Step::Group,
        Step::CollectAvg,
        Step::Copy42,
        Step::Types,
        Step::Reports,
        Step::CollectTotal,
        Step::PostAnalyze,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Step::Resin => "resin",
            Step::Zero => "zero",
            Step::Group => "group",
            Step::CollectAvg => "collect-avg",
            Step::Copy42 => "copy-42",
            Step::Types => "types",
            Step::Reports => "reports",
            Step::CollectTotal => "collect-total",
            Step::PostAnalyze => "post-analyze",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Resin => "Resin/prefix analysis and folder layout (ab.xlsx)",
            Step::Zero => "Blank out zeros (alls.xlsx -> alls_cleaned.xlsx)",
            Step::Group => "Group by code prefix, dedup and append average row",
            Step::CollectAvg => "Collect per-prefix average rows (<code>.xlsx)",
            Step::Copy42 => "Copy column 4 into column 2 as text",
            Step::Types => "Summarize product types and vendors",
            Step::Reports => "Build *_final_result_report.xlsx per folder",
            Step::CollectTotal => "Merge all reports (total_final_result.xlsx)",
            Step::PostAnalyze => "Check delta and cladding diameter, highlight results",
        }
    }

    fn execute(self, cfg: &PipelineConfig) -> Result<(), StepError> {
        match self {
            Step::Resin => resin::run(cfg),
            Step::Zero => zero::run(cfg),
            Step::Group => group::run(cfg),
            Step::CollectAvg => prefix_books::collect_averages(cfg),
            Step::Copy42 => prefix_books::copy_col4_to_col2(cfg),
            Step::Types => types::run(cfg),
            Step::Reports => report::run(cfg),
            Step::CollectTotal => total::run(cfg),
            Step::PostAnalyze => post_analyze::run(cfg),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepFailure {
    pub step: Step,
    pub error: String,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub executed: usize,
    pub succeeded: usize,
    pub failed: Vec<StepFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run `steps` in order, stopping at the first failure when `stop_on_error` is set.
pub fn run_steps(steps: &[Step], cfg: &PipelineConfig) -> RunSummary {
    tracing::info!("Starting integrated fiber analysis pipeline");
    tracing::info!("ab.xlsx = draw process records, alls.xlsx = measurement records");
    tracing::info!("ab:   {}", cfg.excel_ab.display());
    tracing::info!("alls: {}", cfg.excel_alls.display());

    let total = steps.len();
    let mut summary = RunSummary {
        total,
        executed: 0,
        succeeded: 0,
        failed: Vec::new(),
    };

    for (i, step) in steps.iter().copied().enumerate() {
        let tag = format!("[{}/{}]", i + 1, total);
        let span = tracing::info_span!("step", key = step.key());
        let _guard = span.enter();

        tracing::info!(
            "{} {} start | {} | {}",
            tag,
            step.key(),
            step.title(),
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let started = Instant::now();
        let result = step.execute(cfg);
        let elapsed = started.elapsed().as_secs_f64();
        summary.executed += 1;

        match result {
            Ok(()) => {
                summary.succeeded += 1;
                tracing::info!("{} {} done | ok | {:.2}s", tag, step.key(), elapsed);
            }
            Err(e) => {
                tracing::error!("{} {} failed | {} | {:.2}s", tag, step.key(), e, elapsed);
                summary.failed.push(StepFailure {
                    step,
                    error: e.to_string(),
                });
                if cfg.stop_on_error {
                    tracing::warn!("Stopping: {} failed", step.key());
                    break;
                }
            }
        }
    }

    tracing::info!(
        "Summary: {} steps, {} succeeded, {} failed",
        summary.total,
        summary.succeeded,
        summary.failed.len()
    );
    for failure in &summary.failed {
        tracing::info!("  - {}: {}", failure.step.key(), failure.error);
    }
    summary
}

pub(crate) fn require_file(path: &Path) -> Result<(), StepError> {
    if path.exists() {
        Ok(())
    } else {
        Err(StepError::MissingInput(path.to_path_buf()))
    }
}

pub(crate) fn require_columns(file: &Path, sheet: &Sheet, needed: usize) -> Result<(), StepError> {
    if sheet.width() >= needed {
        Ok(())
    } else {
        Err(StepError::MissingColumns {
            file: file.to_path_buf(),
            needed,
            found: sheet.width(),
        })
    }
}

/// Sorted sub-directories of `root` whose names pass `keep`.
pub(crate) fn list_subdirs<F>(root: &Path, keep: F) -> std::io::Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if keep(&entry.file_name().to_string_lossy()) {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

pub(crate) fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_keys_parse_back() {
        for step in Step::ALL {
            assert_eq!(Step::from_str(step.key(), false).unwrap(), step);
        }
    }

    #[test]
    fn stop_on_error_halts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PipelineConfig::default().rooted_at(dir.path());

        let summary = run_steps(&[Step::Resin, Step::Zero], &cfg);
        assert_eq!(summary.executed, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].step, Step::Resin);
        assert!(!summary.is_success());
    }

    #[test]
    fn continue_on_error_runs_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = PipelineConfig::default().rooted_at(dir.path());
        cfg.stop_on_error = false;

        let summary = run_steps(&[Step::Resin, Step::Zero, Step::Types], &cfg);
        assert_eq!(summary.executed, 3);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed.len(), 3);
    }
}

//! Fiber Analyzer - command-line entry point and runner window launcher.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use fiber_analyzer::cli::{Cli, Command};
use fiber_analyzer::config::PipelineConfig;
use fiber_analyzer::pipeline::{run_steps, RunSummary, Step};
use fiber_analyzer::{gui, logging};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

/// Written next to the run log as `<stem>.json`.
#[derive(Serialize)]
struct RunRecord<'a> {
    started_at: String,
    finished_at: String,
    log_file: &'a Path,
    config: &'a PipelineConfig,
    summary: &'a RunSummary,
}

fn run_pipeline(cli: &Cli, steps: &[Step]) -> Result<ExitCode> {
    let cfg = cli.to_config()?;
    let stem = logging::run_stem(&cfg.log_dir);
    let log_file = logging::init_run_logging(&stem)?;
    let started_at = Local::now().to_rfc3339();
    tracing::info!("Log file: {}", log_file.display());

    let summary = run_steps(steps, &cfg);

    let record = RunRecord {
        started_at,
        finished_at: Local::now().to_rfc3339(),
        log_file: &log_file,
        config: &cfg,
        summary: &summary,
    };
    let record_path = stem.with_extension("json");
    let json = serde_json::to_string_pretty(&record)?;
    std::fs::write(&record_path, json)
        .with_context(|| format!("writing run summary {}", record_path.display()))?;

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.action() {
        Command::RunAll => run_pipeline(&cli, &Step::ALL),
        Command::Run { steps } => run_pipeline(&cli, &steps),
        Command::Steps => {
            for step in Step::ALL {
                println!("{:<14} {}", step.key(), step.title());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Gui => {
            logging::init_logging()?;
            gui::launch()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

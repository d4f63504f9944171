//! Command-line model and how flags override the pipeline config.

use crate::config::{ConfigError, PipelineConfig};
use crate::pipeline::Step;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Integrated fiber analysis over draw (ab.xlsx) and measurement (alls.xlsx) records
#[derive(Parser, Debug)]
#[command(name = "fiber-analyzer", author, version, about, long_about = None)]
pub struct Cli {
    /// JSON config file; flags given here take precedence over it
    #[arg(long, global = true, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Draw process records
    #[arg(long, global = true, value_name = "XLSX")]
    pub ab: Option<PathBuf>,

    /// Measurement records
    #[arg(long, global = true, value_name = "XLSX")]
    pub alls: Option<PathBuf>,

    /// Output of the zero step
    #[arg(long, global = true, value_name = "XLSX")]
    pub alls_cleaned: Option<PathBuf>,

    /// Root of the resin/prefix folder layout
    #[arg(long, global = true, value_name = "DIR")]
    pub out_prefix: Option<PathBuf>,

    /// Root of the per-prefix group workbooks
    #[arg(long, global = true, value_name = "DIR")]
    pub out_col4: Option<PathBuf>,

    #[arg(long, global = true, value_name = "IDX")]
    pub resin_col: Option<usize>,

    #[arg(long, global = true, value_name = "IDX")]
    pub drawno_col: Option<usize>,

    #[arg(long, global = true, value_name = "IDX")]
    pub col3: Option<usize>,

    #[arg(long, global = true, value_name = "IDX")]
    pub col4: Option<usize>,

    /// Try the W-pattern prefix rule before the generic one
    #[arg(long, global = true)]
    pub use_wpattern_first: bool,

    /// Also keep codes whose second-to-last character is not '0'
    #[arg(long, global = true)]
    pub no_second_last_zero_filter: bool,

    /// Keep running the remaining steps after a failure
    #[arg(long, global = true)]
    pub no_stop_on_error: bool,

    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run every step in order
    RunAll,
    /// Run the given steps in the given order
    Run {
        #[arg(value_enum, required = true)]
        steps: Vec<Step>,
    },
    /// List step keys and titles
    Steps,
    /// Open the runner window (default)
    Gui,
}

impl Cli {
    /// The subcommand given, or the runner window when there is none.
    pub fn action(&self) -> Command {
        self.command.clone().unwrap_or(Command::Gui)
    }

    /// Defaults, then the JSON file, then explicit flags.
    pub fn to_config(&self) -> Result<PipelineConfig, ConfigError> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        let paths = [
            (&self.ab, &mut cfg.excel_ab),
            (&self.alls, &mut cfg.excel_alls),
            (&self.alls_cleaned, &mut cfg.excel_alls_cleaned),
            (&self.out_prefix, &mut cfg.out_grouped_by_prefix),
            (&self.out_col4, &mut cfg.out_grouped_by_col4),
            (&self.log_dir, &mut cfg.log_dir),
        ];
        for (flag, field) in paths {
            if let Some(value) = flag {
                *field = value.clone();
            }
        }

        let columns = [
            (self.resin_col, &mut cfg.resin_col_idx),
            (self.drawno_col, &mut cfg.drawno_col_idx),
            (self.col3, &mut cfg.col3_idx),
            (self.col4, &mut cfg.col4_idx),
        ];
        for (flag, field) in columns {
            if let Some(value) = flag {
                *field = value;
            }
        }

        if self.use_wpattern_first {
            cfg.use_w_pattern_first = true;
        }
        if self.no_second_last_zero_filter {
            cfg.filter_second_last_zero = false;
        }
        if self.no_stop_on_error {
            cfg.stop_on_error = false;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("fiber-analyzer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_subcommand_opens_the_runner_window() {
        let cli = parse(&[]);
        assert_eq!(cli.action(), Command::Gui);
        assert_eq!(cli.to_config().unwrap(), PipelineConfig::default());
    }

    #[test]
    fn runner_child_arguments_select_run_all() {
        let args = crate::gui::command_args(
            std::path::Path::new("/data/ab.xlsx"),
            std::path::Path::new("/data/alls.xlsx"),
        );
        let cli = Cli::try_parse_from(std::iter::once(std::ffi::OsString::from("fiber-analyzer")).chain(args)).unwrap();
        assert_eq!(cli.action(), Command::RunAll);
        let cfg = cli.to_config().unwrap();
        assert_eq!(cfg.excel_ab, PathBuf::from("/data/ab.xlsx"));
        assert_eq!(cfg.excel_alls, PathBuf::from("/data/alls.xlsx"));
    }

    #[test]
    fn run_takes_steps_in_order() {
        let cli = parse(&["run", "reports", "copy-42", "post-analyze"]);
        assert_eq!(
            cli.action(),
            Command::Run {
                steps: vec![Step::Reports, Step::Copy42, Step::PostAnalyze]
            }
        );
        assert!(Cli::try_parse_from(["fiber-analyzer", "run"]).is_err());
        assert!(Cli::try_parse_from(["fiber-analyzer", "run", "nope"]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("cfg.json");
        std::fs::write(&json, r#"{"excel_ab": "from_file.xlsx", "col4_idx": 7, "clad_dia_max": 126.0}"#)
            .unwrap();

        let cli = parse(&[
            "--config",
            json.to_str().unwrap(),
            "--col4",
            "5",
            "--no-stop-on-error",
            "run-all",
            "--alls",
            "m.xlsx",
        ]);
        let cfg = cli.to_config().unwrap();

        assert_eq!(cfg.excel_ab, PathBuf::from("from_file.xlsx"));
        assert_eq!(cfg.excel_alls, PathBuf::from("m.xlsx"));
        assert_eq!(cfg.col4_idx, 5);
        assert_eq!(cfg.clad_dia_max, 126.0);
        assert!(!cfg.stop_on_error);
        assert!(cfg.filter_second_last_zero);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = parse(&["--config", "/nonexistent/cfg.json"]);
        assert!(cli.to_config().is_err());
    }
}

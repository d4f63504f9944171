//! Pipeline Configuration
//! File locations, column positions, behavior toggles and the product type map.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Codes a single vendor uses for a product type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorCodes {
    pub vendor: String,
    pub codes: Vec<String>,
}

/// One product type and the folder codes that identify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    pub vendors: Vec<VendorCodes>,
}

impl TypeDefinition {
    fn new(name: &str, sec: &[&str], sumitomo: &[&str]) -> Self {
        let vendor = |vendor: &str, codes: &[&str]| VendorCodes {
            vendor: vendor.to_string(),
            codes: codes.iter().map(|c| c.to_string()).collect(),
        };
        Self {
            name: name.to_string(),
            vendors: vec![vendor("SEC", sec), vendor("Sumitomo", sumitomo)],
        }
    }
}

/// Default product type table, in reporting order.
pub fn default_type_map() -> Vec<TypeDefinition> {
    vec![
        TypeDefinition::new("LWPF(90)", &["W00", "W0J"], &["20M"]),
        TypeDefinition::new("LWPF(150)", &["L0E"], &["L0M"]),
        TypeDefinition::new("LWPF(180)", &["S0E"], &["S0M"]),
        TypeDefinition::new("A1(90)", &[], &["Z0M"]),
        TypeDefinition::new("A1(150)", &[], &["Z0L"]),
        TypeDefinition::new("A2(90)", &["AJW", "AJF", "AJB"], &[]),
        TypeDefinition::new("A2(150)", &["AL"], &[]),
    ]
}

/// Everything a pipeline run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub excel_ab: PathBuf,
    pub excel_alls: PathBuf,
    pub excel_alls_cleaned: PathBuf,
    pub out_grouped_by_prefix: PathBuf,
    pub out_grouped_by_col4: PathBuf,

    // 0-based column positions
    pub resin_col_idx: usize,
    pub drawno_col_idx: usize,
    pub col3_idx: usize,
    pub col4_idx: usize,

    pub use_w_pattern_first: bool,
    pub filter_second_last_zero: bool,
    pub stop_on_error: bool,

    pub log_dir: PathBuf,

    /// Accepted cladding diameter range (µm), inclusive.
    pub clad_dia_min: f64,
    pub clad_dia_max: f64,

    pub type_map: Vec<TypeDefinition>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            excel_ab: PathBuf::from("ab.xlsx"),
            excel_alls: PathBuf::from("alls.xlsx"),
            excel_alls_cleaned: PathBuf::from("alls_cleaned.xlsx"),
            out_grouped_by_prefix: PathBuf::from("grouped_by_prefix"),
            out_grouped_by_col4: PathBuf::from("grouped_by_col4"),
            resin_col_idx: 4,
            drawno_col_idx: 0,
            col3_idx: 2,
            col4_idx: 3,
            use_w_pattern_first: false,
            filter_second_last_zero: true,
            stop_on_error: true,
            log_dir: PathBuf::from("logs"),
            clad_dia_min: 124.3,
            clad_dia_max: 125.7,
            type_map: default_type_map(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config; fields left out keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Same layout under a different working directory.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        for path in [
            &mut self.excel_ab,
            &mut self.excel_alls,
            &mut self.excel_alls_cleaned,
            &mut self.out_grouped_by_prefix,
            &mut self.out_grouped_by_col4,
            &mut self.log_dir,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    /// Output locations derived from the col4 grouping root.
    pub fn total_report_path(&self) -> PathBuf {
        self.out_grouped_by_col4.join("total_final_result.xlsx")
    }

    pub fn annotated_report_path(&self) -> PathBuf {
        self.out_grouped_by_col4
            .join("total_final_result_annotated.xlsx")
    }
}

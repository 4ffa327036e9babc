use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileExtractionConfig {
    #[serde(rename = "super-general")]
    pub super_general: Option<bool>,
    #[serde(rename = "reactant-radius")]
    pub reactant_radius: Option<usize>,
    #[serde(rename = "product-radius")]
    pub product_radius: Option<usize>,
    #[serde(rename = "comparison-level")]
    pub comparison_level: Option<String>,
    #[serde(rename = "groups-file")]
    pub groups_file: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileScanConfig {
    #[serde(rename = "checkpoint-interval")]
    pub checkpoint_interval: Option<u64>,
    #[serde(rename = "progress-interval")]
    pub progress_interval: Option<u64>,
    #[serde(rename = "record-limit")]
    pub record_limit: Option<u64>,
    #[serde(rename = "table-path")]
    pub table_path: Option<PathBuf>,
    #[serde(rename = "cursor-path")]
    pub cursor_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub extraction: Option<FileExtractionConfig>,
    pub scan: Option<FileScanConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

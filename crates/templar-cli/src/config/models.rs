use std::path::PathBuf;
use templar::engine::config as core_config;

pub struct ExtractionSettings {
    pub core_config: core_config::ExtractionConfig,
    /// Catalog replacing the built-in functional groups.
    pub groups_path: Option<PathBuf>,
}

pub struct ScanAppConfig {
    pub input_path: PathBuf,
    pub groups_path: Option<PathBuf>,
    pub core_config: core_config::ScanConfig,
}

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// How strictly corresponding reactant/product atoms are compared when
/// deciding whether an atom changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComparisonLevel {
    /// Symbol, hydrogen count, charge, degree and neighbor count only.
    Attributes,
    /// Attributes plus the labelled bond set.
    #[default]
    Bonds,
}

#[derive(Debug, Error)]
#[error("Invalid comparison level (expected 'attributes' or 'bonds')")]
pub struct ParseComparisonLevelError;

impl FromStr for ComparisonLevel {
    type Err = ParseComparisonLevelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "attributes" | "0" => Ok(Self::Attributes),
            "bonds" | "1" => Ok(Self::Bonds),
            _ => Err(ParseComparisonLevelError),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Wildcard every unchanged atom and skip functional-group clusters.
    pub super_general: bool,
    pub reactant_radius: usize,
    pub product_radius: usize,
    pub comparison_level: ComparisonLevel,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            super_general: false,
            reactant_radius: 1,
            product_radius: 0,
            comparison_level: ComparisonLevel::Bonds,
        }
    }
}

#[derive(Default)]
pub struct ExtractionConfigBuilder {
    super_general: Option<bool>,
    reactant_radius: Option<usize>,
    product_radius: Option<usize>,
    comparison_level: Option<ComparisonLevel>,
}

impl ExtractionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn super_general(mut self, enabled: bool) -> Self {
        self.super_general = Some(enabled);
        self
    }
    pub fn reactant_radius(mut self, radius: usize) -> Self {
        self.reactant_radius = Some(radius);
        self
    }
    pub fn product_radius(mut self, radius: usize) -> Self {
        self.product_radius = Some(radius);
        self
    }
    pub fn comparison_level(mut self, level: ComparisonLevel) -> Self {
        self.comparison_level = Some(level);
        self
    }

    pub fn build(self) -> Result<ExtractionConfig, ConfigError> {
        Ok(ExtractionConfig {
            super_general: self
                .super_general
                .ok_or(ConfigError::MissingParameter("super_general"))?,
            reactant_radius: self
                .reactant_radius
                .ok_or(ConfigError::MissingParameter("reactant_radius"))?,
            product_radius: self
                .product_radius
                .ok_or(ConfigError::MissingParameter("product_radius"))?,
            comparison_level: self
                .comparison_level
                .ok_or(ConfigError::MissingParameter("comparison_level"))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub extraction: ExtractionConfig,
    /// Records processed between checkpoints.
    pub checkpoint_interval: u64,
    /// Records processed between progress reports.
    pub progress_interval: u64,
    /// Stop after this many records in this run.
    pub record_limit: Option<u64>,
    pub table_path: PathBuf,
    pub cursor_path: PathBuf,
}

#[derive(Default)]
pub struct ScanConfigBuilder {
    extraction: Option<ExtractionConfig>,
    checkpoint_interval: Option<u64>,
    progress_interval: Option<u64>,
    record_limit: Option<u64>,
    table_path: Option<PathBuf>,
    cursor_path: Option<PathBuf>,
}

impl ScanConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extraction(mut self, config: ExtractionConfig) -> Self {
        self.extraction = Some(config);
        self
    }
    pub fn checkpoint_interval(mut self, records: u64) -> Self {
        self.checkpoint_interval = Some(records);
        self
    }
    pub fn progress_interval(mut self, records: u64) -> Self {
        self.progress_interval = Some(records);
        self
    }
    pub fn record_limit(mut self, limit: Option<u64>) -> Self {
        self.record_limit = limit;
        self
    }
    pub fn table_path(mut self, path: PathBuf) -> Self {
        self.table_path = Some(path);
        self
    }
    pub fn cursor_path(mut self, path: PathBuf) -> Self {
        self.cursor_path = Some(path);
        self
    }

    pub fn build(self) -> Result<ScanConfig, ConfigError> {
        let checkpoint_interval = self
            .checkpoint_interval
            .ok_or(ConfigError::MissingParameter("checkpoint_interval"))?;
        if checkpoint_interval == 0 {
            return Err(ConfigError::InvalidValue {
                name: "checkpoint_interval",
                reason: "must be at least 1".to_string(),
            });
        }
        let progress_interval = self
            .progress_interval
            .ok_or(ConfigError::MissingParameter("progress_interval"))?;
        if progress_interval == 0 {
            return Err(ConfigError::InvalidValue {
                name: "progress_interval",
                reason: "must be at least 1".to_string(),
            });
        }
        let table_path = self
            .table_path
            .ok_or(ConfigError::MissingParameter("table_path"))?;
        let cursor_path = self
            .cursor_path
            .ok_or(ConfigError::MissingParameter("cursor_path"))?;
        if table_path == cursor_path {
            return Err(ConfigError::InvalidValue {
                name: "cursor_path",
                reason: "must differ from table_path".to_string(),
            });
        }
        Ok(ScanConfig {
            extraction: self
                .extraction
                .ok_or(ConfigError::MissingParameter("extraction"))?,
            checkpoint_interval,
            progress_interval,
            record_limit: self.record_limit,
            table_path,
            cursor_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_scan_builder() -> ScanConfigBuilder {
        ScanConfigBuilder::new()
            .extraction(ExtractionConfig::default())
            .checkpoint_interval(10_000)
            .progress_interval(1_000)
            .table_path(PathBuf::from("templates.json"))
            .cursor_path(PathBuf::from("filepos.json"))
    }

    #[test]
    fn extraction_builder_requires_every_field() {
        let err = ExtractionConfigBuilder::new()
            .super_general(false)
            .reactant_radius(1)
            .product_radius(0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("comparison_level"));
    }

    #[test]
    fn extraction_builder_matches_default_when_given_default_values() {
        let config = ExtractionConfigBuilder::new()
            .super_general(false)
            .reactant_radius(1)
            .product_radius(0)
            .comparison_level(ComparisonLevel::Bonds)
            .build()
            .unwrap();
        assert_eq!(config, ExtractionConfig::default());
    }

    #[test]
    fn scan_builder_builds_with_all_fields() {
        let config = full_scan_builder().record_limit(Some(5)).build().unwrap();
        assert_eq!(config.checkpoint_interval, 10_000);
        assert_eq!(config.record_limit, Some(5));
    }

    #[test]
    fn scan_builder_rejects_zero_intervals() {
        let err = full_scan_builder().checkpoint_interval(0).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "checkpoint_interval",
                ..
            }
        ));
        let err = full_scan_builder().progress_interval(0).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "progress_interval",
                ..
            }
        ));
    }

    #[test]
    fn scan_builder_rejects_shared_checkpoint_path() {
        let err = full_scan_builder()
            .cursor_path(PathBuf::from("templates.json"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "cursor_path", .. }));
    }

    #[test]
    fn scan_builder_reports_missing_paths() {
        let err = ScanConfigBuilder::new()
            .extraction(ExtractionConfig::default())
            .checkpoint_interval(1)
            .progress_interval(1)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("table_path"));
    }

    #[test]
    fn comparison_level_parses_names() {
        assert_eq!("bonds".parse::<ComparisonLevel>().unwrap(), ComparisonLevel::Bonds);
        assert_eq!(
            "Attributes".parse::<ComparisonLevel>().unwrap(),
            ComparisonLevel::Attributes
        );
        assert!("strict".parse::<ComparisonLevel>().is_err());
    }
}

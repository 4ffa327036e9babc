use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileExtractionConfig, FileScanConfig};
use super::models::{ExtractionSettings, ScanAppConfig};
use crate::cli::{ExtractionArgs, ScanArgs};
use crate::error::{CliError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use templar::engine::config as core_config;
use tracing::debug;

pub fn build_extraction_config(args: &ExtractionArgs) -> Result<ExtractionSettings> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(args)?;
    merge_extraction(args, file_config.extraction.take(), &defaults)
}

pub fn build_scan_config(args: &ScanArgs) -> Result<ScanAppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(&args.extraction)?;

    let ExtractionSettings {
        core_config: extraction,
        groups_path,
    } = merge_extraction(&args.extraction, file_config.extraction.take(), &defaults)?;

    let scan_file = file_config.scan.take().unwrap_or_default();
    let FileScanConfig {
        checkpoint_interval,
        progress_interval,
        record_limit,
        table_path,
        cursor_path,
    } = scan_file;

    let core_config = core_config::ScanConfigBuilder::new()
        .extraction(extraction)
        .checkpoint_interval(
            args.checkpoint_interval
                .or(checkpoint_interval)
                .unwrap_or(defaults.checkpoint_interval),
        )
        .progress_interval(
            args.progress_interval
                .or(progress_interval)
                .unwrap_or(defaults.progress_interval),
        )
        .record_limit(args.limit.or(record_limit))
        .table_path(
            args.table
                .clone()
                .or(table_path)
                .unwrap_or_else(|| PathBuf::from(defaults.table_path)),
        )
        .cursor_path(
            args.cursor
                .clone()
                .or(cursor_path)
                .unwrap_or_else(|| PathBuf::from(defaults.cursor_path)),
        )
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(ScanAppConfig {
        input_path: args.input.clone(),
        groups_path,
        core_config,
    })
}

fn load_file_config(args: &ExtractionArgs) -> Result<FileConfig> {
    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    apply_set_values(file_config, &args.set_values)
}

fn merge_extraction(
    args: &ExtractionArgs,
    file_val: Option<FileExtractionConfig>,
    defaults: &DefaultsConfig,
) -> Result<ExtractionSettings> {
    let file_val = file_val.unwrap_or_default();

    let comparison_level = match (args.comparison_level, file_val.comparison_level.as_deref()) {
        (Some(level), _) => level,
        (None, Some(text)) => core_config::ComparisonLevel::from_str(text)
            .map_err(|e| CliError::Config(format!("extraction.comparison-level: {e}")))?,
        (None, None) => defaults.comparison_level,
    };

    let super_general = args
        .super_general
        .requested()
        .or(file_val.super_general)
        .unwrap_or(defaults.super_general);

    let core_config = core_config::ExtractionConfigBuilder::new()
        .super_general(super_general)
        .reactant_radius(
            args.reactant_radius
                .or(file_val.reactant_radius)
                .unwrap_or(defaults.reactant_radius),
        )
        .product_radius(
            args.product_radius
                .or(file_val.product_radius)
                .unwrap_or(defaults.product_radius),
        )
        .comparison_level(comparison_level)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    debug!(?core_config, "Extraction configuration resolved");
    Ok(ExtractionSettings {
        core_config,
        groups_path: args.groups.clone().or(file_val.groups_file),
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "extraction.super-general" => {
                config
                    .extraction
                    .get_or_insert_with(Default::default)
                    .super_general = Some(parse_value(key, value_str, "boolean")?);
            }
            "extraction.reactant-radius" => {
                config
                    .extraction
                    .get_or_insert_with(Default::default)
                    .reactant_radius = Some(parse_value(key, value_str, "integer")?);
            }
            "extraction.product-radius" => {
                config
                    .extraction
                    .get_or_insert_with(Default::default)
                    .product_radius = Some(parse_value(key, value_str, "integer")?);
            }
            "extraction.comparison-level" => {
                config
                    .extraction
                    .get_or_insert_with(Default::default)
                    .comparison_level = Some(value_str.to_string());
            }
            "extraction.groups-file" => {
                config
                    .extraction
                    .get_or_insert_with(Default::default)
                    .groups_file = Some(PathBuf::from(value_str));
            }
            "scan.checkpoint-interval" => {
                config
                    .scan
                    .get_or_insert_with(Default::default)
                    .checkpoint_interval = Some(parse_value(key, value_str, "integer")?);
            }
            "scan.progress-interval" => {
                config
                    .scan
                    .get_or_insert_with(Default::default)
                    .progress_interval = Some(parse_value(key, value_str, "integer")?);
            }
            "scan.record-limit" => {
                config.scan.get_or_insert_with(Default::default).record_limit =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "scan.table-path" => {
                config.scan.get_or_insert_with(Default::default).table_path =
                    Some(PathBuf::from(value_str));
            }
            "scan.cursor-path" => {
                config.scan.get_or_insert_with(Default::default).cursor_path =
                    Some(PathBuf::from(value_str));
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

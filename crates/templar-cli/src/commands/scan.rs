use super::load_catalog;
use crate::cli::ScanArgs;
use crate::config::builder::build_scan_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use templar::core::toolkit::SmilesToolkit;
use templar::engine::error::SkipReason;
use templar::engine::progress::ProgressReporter;
use templar::workflows::scan::{ScanSummary, TemplateScanner};
use tracing::info;

const SKIP_REASONS: [SkipReason; 4] = [
    SkipReason::Parse,
    SkipReason::Mapping,
    SkipReason::NoChange,
    SkipReason::TemplateValidation,
];

pub fn run(args: ScanArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app_config = build_scan_config(&args)?;
    let catalog = load_catalog(app_config.groups_path.as_deref())?;
    info!("Using {} functional group(s)", catalog.len());

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Scanning {}...", app_config.input_path.display());
    let mut scanner = TemplateScanner::open(
        &SmilesToolkit,
        &catalog,
        &app_config.core_config,
        &reporter,
    )?;
    let summary = scanner.run_path(&app_config.input_path)?;

    print_summary(&summary);
    println!(
        "Template table written to: {}",
        app_config.core_config.table_path.display()
    );
    Ok(())
}

fn print_summary(summary: &ScanSummary) {
    let stats = &summary.stats;
    if summary.resumed_from.records > 0 {
        println!(
            "Resumed after {} record(s) at byte {}.",
            summary.resumed_from.records, summary.resumed_from.offset
        );
    }
    println!("Records processed this run: {}", stats.attempted);
    println!(
        "  recorded: {:>10} ({:.1}%)",
        stats.recorded,
        stats.percent(stats.recorded)
    );
    for reason in SKIP_REASONS {
        let count = stats.skipped(reason);
        println!(
            "  {:<8} {:>10} ({:.1}%)",
            format!("{reason}:"),
            count,
            stats.percent(count)
        );
    }
    if stats.stoichiometry_warnings > 0 {
        println!(
            "  {} record(s) had unbalanced atom mapping",
            stats.stoichiometry_warnings
        );
    }
    println!(
        "Unique templates: {} (total count {})",
        summary.unique_templates, summary.total_count
    );
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use templar::engine::config::ComparisonLevel;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Templar CLI - Mines generalized reaction templates from atom-mapped reaction corpora and tallies them by frequency.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a reaction corpus and count the retrosynthetic templates it yields.
    Scan(ScanArgs),
    /// Extract the template of a single reaction and print it.
    Extract(ExtractArgs),
    /// Write a saved template table as CSV, most frequent first.
    Export(ExportArgs),
}

/// Options shared by every command that extracts templates.
#[derive(Args, Debug, Clone, Default)]
pub struct ExtractionArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Functional-group catalog in TOML format, replacing the built-in one.
    #[arg(short = 'g', long = "groups", value_name = "PATH")]
    pub groups: Option<PathBuf>,

    /// Bond hops to expand around the changed atoms on the reactant side.
    #[arg(long, value_name = "INT")]
    pub reactant_radius: Option<usize>,

    /// Bond hops to expand around the changed atoms on the product side.
    #[arg(long, value_name = "INT")]
    pub product_radius: Option<usize>,

    /// Override `extraction.super-general` from the config file.
    #[command(flatten)]
    pub super_general: SuperGeneral,

    /// How changed atoms are detected: 'attributes' or 'bonds'.
    #[arg(long, value_name = "LEVEL")]
    pub comparison_level: Option<ComparisonLevel>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S extraction.reactant-radius=2
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Mutually exclusive switches for super-general mode, which is on unless
/// turned off here or in the config file.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct SuperGeneral {
    /// Replace every boundary atom by a bare wildcard and ignore functional groups.
    #[arg(long)]
    pub super_general: bool,
    /// Keep element constraints at the boundary and expand functional groups.
    #[arg(long)]
    pub no_super_general: bool,
}

impl SuperGeneral {
    /// The mode the switches ask for, if any.
    pub fn requested(&self) -> Option<bool> {
        match (self.super_general, self.no_super_general) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        }
    }
}

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Reaction corpus, one record per line; the first column is the reaction.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    #[command(flatten)]
    pub extraction: ExtractionArgs,

    /// Where the template table is checkpointed.
    #[arg(short, long, value_name = "PATH")]
    pub table: Option<PathBuf>,

    /// Where the corpus cursor is checkpointed.
    #[arg(long, value_name = "PATH")]
    pub cursor: Option<PathBuf>,

    /// Records processed between checkpoints.
    #[arg(long, value_name = "INT")]
    pub checkpoint_interval: Option<u64>,

    /// Records processed between progress log lines.
    #[arg(long, value_name = "INT")]
    pub progress_interval: Option<u64>,

    /// Stop after this many records.
    #[arg(short = 'n', long, value_name = "INT")]
    pub limit: Option<u64>,
}

/// Arguments for the `extract` subcommand.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Atom-mapped reaction as `reactants>agents>products`.
    #[arg(required = true, value_name = "REACTION")]
    pub reaction: String,

    #[command(flatten)]
    pub extraction: ExtractionArgs,
}

/// Arguments for the `export` subcommand.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Template table written by `scan`.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub table: PathBuf,

    /// Output CSV file. Writes to standard output when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Skip templates seen fewer times than this.
    #[arg(long, value_name = "INT", default_value_t = 1)]
    pub min_count: u64,

    /// Keep only the most frequent templates.
    #[arg(long, value_name = "INT")]
    pub top: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_arguments_parse() {
        let cli = Cli::parse_from([
            "templar",
            "-vv",
            "scan",
            "-i",
            "corpus.rsmi",
            "--reactant-radius",
            "2",
            "--comparison-level",
            "attributes",
            "-S",
            "scan.checkpoint-interval=50",
            "-n",
            "100",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Scan(args) = cli.command else {
            panic!("Expected 'scan' subcommand");
        };
        assert_eq!(args.input, PathBuf::from("corpus.rsmi"));
        assert_eq!(args.extraction.reactant_radius, Some(2));
        assert_eq!(
            args.extraction.comparison_level,
            Some(ComparisonLevel::Attributes)
        );
        assert_eq!(args.extraction.set_values, vec!["scan.checkpoint-interval=50"]);
        assert_eq!(args.limit, Some(100));
    }

    #[test]
    fn super_general_switches() {
        let parse = |extra: &[&str]| {
            let mut argv = vec!["templar", "extract"];
            argv.extend_from_slice(extra);
            argv.push("C>>C");
            let Commands::Extract(args) = Cli::parse_from(argv).command else {
                panic!("Expected 'extract' subcommand");
            };
            args.extraction.super_general.requested()
        };
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["--super-general"]), Some(true));
        assert_eq!(parse(&["--no-super-general"]), Some(false));

        let both = Cli::try_parse_from([
            "templar",
            "extract",
            "--super-general",
            "--no-super-general",
            "C>>C",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn export_defaults() {
        let cli = Cli::parse_from(["templar", "export", "-t", "table.json"]);
        let Commands::Export(args) = cli.command else {
            panic!("Expected 'export' subcommand");
        };
        assert_eq!(args.min_count, 1);
        assert!(args.output.is_none());
        assert!(args.top.is_none());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["templar", "-q", "-v", "extract", "C>>C"]);
        assert!(result.is_err());
    }
}

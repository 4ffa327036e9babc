use crate::cli::ExportArgs;
use crate::error::{CliError, Result};
use std::fs::File;
use std::io::{self, BufWriter};
use templar::engine::checkpoint::read_table;
use tracing::info;

pub fn run(args: ExportArgs) -> Result<()> {
    info!("Reading template table from {:?}", &args.table);
    let table = read_table(&args.table)?;
    info!(
        "{} unique template(s), total count {}",
        table.len(),
        table.total()
    );

    let written = match &args.output {
        Some(path) => {
            let file = BufWriter::new(File::create(path)?);
            table.write_csv(file, args.min_count, args.top)
        }
        None => table.write_csv(io::stdout().lock(), args.min_count, args.top),
    };
    written.map_err(|e| CliError::Other(anyhow::anyhow!("Failed to write CSV: {}", e)))?;

    if let Some(path) = &args.output {
        eprintln!("CSV written to: {}", path.display());
    }
    Ok(())
}

use std::path::PathBuf;
use templar::core::groups::catalog::CatalogLoadError;
use templar::engine::checkpoint::CheckpointError;
use templar::engine::error::{ExtractionError, ScanError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Template extraction failed ({reason}): {source}", reason = source.reason())]
    Extraction {
        #[from]
        source: ExtractionError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogLoadError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

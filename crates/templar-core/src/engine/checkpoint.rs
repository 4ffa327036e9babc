use super::table::TemplateTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O failed for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Checkpoint file '{path}' is not valid JSON: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("Could not move checkpoint into place at '{path}': {source}")]
    Persist {
        path: String,
        source: std::io::Error,
    },
}

/// Position in the corpus whose effects are fully reflected in the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCursor {
    /// Byte offset of the first unprocessed line.
    pub offset: u64,
    /// Records read before `offset`.
    pub records: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoint {
    pub table: TemplateTable,
    pub cursor: ScanCursor,
}

/// Table and cursor files of one scan.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    table_path: PathBuf,
    cursor_path: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CheckpointError + '_ {
    move |source| CheckpointError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CheckpointError> {
    let text = fs::read_to_string(path).map_err(io_error(path))?;
    serde_json::from_str(&text).map_err(|source| CheckpointError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Replaces `path` with `bytes` through a synced temporary file in the same
/// directory, so readers see either the old or the new content.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CheckpointError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(io_error(path))?;
    file.write_all(bytes).map_err(io_error(path))?;
    file.as_file().sync_all().map_err(io_error(path))?;
    file.persist(path)
        .map_err(|e| CheckpointError::Persist {
            path: path.display().to_string(),
            source: e.error,
        })?;
    Ok(())
}

impl CheckpointStore {
    pub fn new(table_path: impl Into<PathBuf>, cursor_path: impl Into<PathBuf>) -> Self {
        Self {
            table_path: table_path.into(),
            cursor_path: cursor_path.into(),
        }
    }

    pub fn table_path(&self) -> &Path {
        &self.table_path
    }

    pub fn cursor_path(&self) -> &Path {
        &self.cursor_path
    }

    /// Loads the saved state. A scan resumes only when both files exist;
    /// otherwise it starts from an empty table at offset zero.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError`] if an existing file cannot be read or parsed.
    pub fn load(&self) -> Result<Checkpoint, CheckpointError> {
        match (self.table_path.exists(), self.cursor_path.exists()) {
            (true, true) => {
                let table: TemplateTable = read_json(&self.table_path)?;
                let cursor: ScanCursor = read_json(&self.cursor_path)?;
                info!(
                    templates = table.len(),
                    offset = cursor.offset,
                    records = cursor.records,
                    "Resuming from checkpoint"
                );
                Ok(Checkpoint { table, cursor })
            }
            (false, false) => {
                debug!("No checkpoint found, starting fresh");
                Ok(Checkpoint::default())
            }
            (table, _) => {
                warn!(
                    table_present = table,
                    cursor_present = !table,
                    "Incomplete checkpoint ignored, starting fresh"
                );
                Ok(Checkpoint::default())
            }
        }
    }

    /// Persists the table, then the cursor. A crash between the two leaves a
    /// cursor that lags the table, never one that runs ahead of it.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError`] if either file cannot be written.
    pub fn save(&self, table: &TemplateTable, cursor: ScanCursor) -> Result<(), CheckpointError> {
        let table_json =
            serde_json::to_vec_pretty(table).map_err(|source| CheckpointError::Json {
                path: self.table_path.display().to_string(),
                source,
            })?;
        write_atomic(&self.table_path, &table_json)?;

        let cursor_json =
            serde_json::to_vec(&cursor).map_err(|source| CheckpointError::Json {
                path: self.cursor_path.display().to_string(),
                source,
            })?;
        write_atomic(&self.cursor_path, &cursor_json)?;

        debug!(
            offset = cursor.offset,
            records = cursor.records,
            templates = table.len(),
            "Checkpoint written"
        );
        Ok(())
    }
}

/// Reads a saved table on its own, for exporting a finished scan.
///
/// # Errors
///
/// Returns [`CheckpointError`] if the file cannot be read or parsed.
pub fn read_table(path: &Path) -> Result<TemplateTable, CheckpointError> {
    read_json(path)
}

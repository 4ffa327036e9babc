use std::fmt;
use thiserror::Error;

use super::checkpoint::CheckpointError;
use crate::core::toolkit::ToolkitError;

/// Why a record was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    Parse,
    Mapping,
    NoChange,
    TemplateValidation,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Parse => "parse",
                Self::Mapping => "mapping",
                Self::NoChange => "no change",
                Self::TemplateValidation => "template validation",
            }
        )
    }
}

/// Per-record failure. The scan driver counts these and moves on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Could not parse reaction: {0}")]
    Parse(#[source] ToolkitError),

    #[error("{unmapped} product atom(s) carry no map label")]
    Mapping { unmapped: usize },

    #[error("No changed atoms detected")]
    NoChangeDetected,

    #[error("Fragment could not be written: {0}")]
    Fragment(#[source] ToolkitError),

    #[error("Template failed validation: {template}")]
    TemplateValidation { template: String },
}

impl ExtractionError {
    pub fn reason(&self) -> SkipReason {
        match self {
            Self::Parse(_) => SkipReason::Parse,
            Self::Mapping { .. } => SkipReason::Mapping,
            Self::NoChangeDetected => SkipReason::NoChange,
            Self::Fragment(_) | Self::TemplateValidation { .. } => SkipReason::TemplateValidation,
        }
    }
}

/// Failures that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to open corpus '{path}': {source}")]
    CorpusOpen {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to read corpus at byte offset {offset}: {source}")]
    CorpusRead {
        offset: u64,
        source: std::io::Error,
    },

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

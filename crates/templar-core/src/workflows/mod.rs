//! # Workflows Module
//!
//! Top-level entry points that tie the toolkit, the catalog and the engine
//! together.
//!
//! - **Extraction** ([`extract`]) - One reaction record to its canonical forward and
//!   retrosynthetic templates, or a skip reason.
//! - **Scan** ([`scan`]) - A whole corpus aggregated into a template frequency table,
//!   checkpointed so an interrupted scan can resume.

pub mod extract;
pub mod scan;

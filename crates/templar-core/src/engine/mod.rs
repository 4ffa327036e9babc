//! # Engine Module
//!
//! The template-extraction algorithms and the state a scan carries between
//! records.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Extraction and scan parameters with validating builders
//! - **Error Handling** ([`error`]) - Per-record skip errors and scan-fatal errors
//! - **Progress Monitoring** ([`progress`]) - Events reported to an optional callback
//! - **Change Detection** ([`changes`]) - Map labels whose atoms differ across the reaction
//! - **Generalization** ([`wildcard`], [`expansion`]) - Boundary symbols and neighborhood growth
//! - **Fragments** ([`fragments`]) - Per-molecule atom selection and fragment text
//! - **Canonical Form** ([`canon`], [`retro`]) - Aggregation keys and their retrosynthetic form
//! - **Persistence** ([`table`], [`checkpoint`]) - Frequency table and crash-safe checkpoints

pub mod canon;
pub mod changes;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod expansion;
pub mod fragments;
pub mod progress;
pub mod retro;
pub mod table;
pub mod wildcard;

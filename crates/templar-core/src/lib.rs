//! # Templar Core Library
//!
//! Mines generalized reaction templates from atom-mapped reaction records
//! and tallies how often each canonical template occurs.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Molecule and reaction models, the SMILES and
//!   pattern readers, the fragment writer, the functional-group catalog and
//!   matcher, and the [`core::toolkit::ChemistryToolkit`] trait that the
//!   algorithms are written against.
//!
//! - **[`engine`]: The Logic Core.** Change detection, neighborhood expansion,
//!   fragment selection, canonicalization and retro conversion, plus the
//!   frequency table and its checkpoint store.
//!
//! - **[`workflows`]: The Public API.** Per-record extraction and the
//!   checkpointed corpus scan.

pub mod core;
pub mod engine;
pub mod workflows;

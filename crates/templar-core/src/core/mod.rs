//! # Core Module
//!
//! The chemistry layer that template extraction is built on.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, molecule graphs and reaction records
//! - **Notation I/O** ([`io`]) - Reading mapped reaction text, the pattern dialect, and writing fragments
//! - **Functional Groups** ([`groups`]) - Group catalog and substructure matching
//! - **Toolkit Seam** ([`toolkit`]) - The trait the extraction engine calls into, plus the built-in implementation
//!
//! Everything above the toolkit trait works on molecule graphs and pattern
//! text only, so an alternative backend can be plugged in by implementing
//! [`toolkit::ChemistryToolkit`].

pub mod groups;
pub mod io;
pub mod models;
pub mod toolkit;

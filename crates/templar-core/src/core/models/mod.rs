//! # Core Models Module
//!
//! Data structures for the molecules that appear in a reaction record.
//!
//! ## Key Components
//!
//! - [`element`] - Static element tables (symbols, atomic numbers, valences)
//! - [`atom`] - Atom properties and their literal pattern symbol
//! - [`topology`] - Bond orders and their pattern symbols
//! - [`molecule`] - Molecule graphs built on `petgraph`
//! - [`reaction`] - A reaction split into reactants, agents and products

pub mod atom;
pub mod element;
pub mod molecule;
pub mod reaction;
pub mod topology;

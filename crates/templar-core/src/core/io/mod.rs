//! Reading and writing the line notations that reaction records and
//! templates are expressed in.
//!
//! - [`smiles`] reads atom-mapped reaction text into molecule graphs
//! - [`sanitize`] assigns implicit hydrogens and rejects impossible valences
//! - [`query`] reads the pattern dialect used by templates and functional groups
//! - [`fragment`] writes a selected sub-structure back out as pattern text
//! - [`labels`] rewrites atom-map labels directly on text

pub mod fragment;
pub mod labels;
pub mod query;
pub mod sanitize;
pub mod smiles;

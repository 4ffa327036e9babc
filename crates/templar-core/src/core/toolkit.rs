use super::groups::catalog::GroupCatalog;
use super::io::fragment::{LabelOrder, WriteError, write_fragment_ordered};
use super::io::query::parse_reaction_pattern;
use super::io::sanitize::{SanitizeError, sanitize};
use super::io::smiles::{ReadError, parse_reaction};
use super::models::molecule::Molecule;
use super::models::reaction::ReactionRecord;
use petgraph::graph::NodeIndex;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolkitError {
    #[error("Read error: {0}")]
    Read(#[from] ReadError),
    #[error("Sanitization error: {0}")]
    Sanitize(#[from] SanitizeError),
    #[error("Write error: {0}")]
    Write(#[from] WriteError),
}

/// The chemistry operations template extraction relies on.
///
/// The extraction pipeline is written against this trait so that the
/// cheminformatics backend can be swapped without touching the algorithms.
pub trait ChemistryToolkit {
    /// Parses `reactants>agents>products` text into molecules.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Read`] if the text is not a well-formed reaction.
    fn parse_reaction(&self, text: &str) -> Result<ReactionRecord, ToolkitError>;

    /// Checks a molecule for chemical validity and fills in derived
    /// properties (implicit hydrogens, radicals).
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Sanitize`] if the molecule is chemically invalid.
    fn sanitize(&self, molecule: &mut Molecule) -> Result<(), ToolkitError>;

    /// Atom sets matched by each functional group of `catalog` in `molecule`.
    fn find_groups(&self, molecule: &Molecule, catalog: &GroupCatalog) -> Vec<Vec<NodeIndex>>;

    /// Writes the sub-structure induced by `atoms`, using `symbols[i]` as
    /// the text for atom `i`.
    ///
    /// # Arguments
    ///
    /// * `molecule` - The molecule the atoms belong to; map labels are not read.
    /// * `atoms` - The atoms to write.
    /// * `symbols` - One symbol per atom of `molecule`, indexed by atom index.
    /// * `label_order` - Orders atoms the writer cannot otherwise tell apart,
    ///   by the position of the map label in their symbol. May be empty.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Write`] if the symbol table does not cover the
    /// molecule or the selection is empty.
    fn write_fragment(
        &self,
        molecule: &Molecule,
        atoms: &BTreeSet<NodeIndex>,
        symbols: &[String],
        label_order: &LabelOrder,
    ) -> Result<String, ToolkitError>;

    /// Whether `template` parses as a reaction pattern with non-empty sides.
    fn is_valid_template(&self, template: &str) -> bool;
}

/// Built-in toolkit backed by this crate's own readers, matcher and writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmilesToolkit;

impl ChemistryToolkit for SmilesToolkit {
    fn parse_reaction(&self, text: &str) -> Result<ReactionRecord, ToolkitError> {
        Ok(parse_reaction(text)?)
    }

    fn sanitize(&self, molecule: &mut Molecule) -> Result<(), ToolkitError> {
        Ok(sanitize(molecule)?)
    }

    fn find_groups(&self, molecule: &Molecule, catalog: &GroupCatalog) -> Vec<Vec<NodeIndex>> {
        catalog.clusters_in(molecule)
    }

    fn write_fragment(
        &self,
        molecule: &Molecule,
        atoms: &BTreeSet<NodeIndex>,
        symbols: &[String],
        label_order: &LabelOrder,
    ) -> Result<String, ToolkitError> {
        Ok(write_fragment_ordered(molecule, atoms, symbols, label_order)?)
    }

    fn is_valid_template(&self, template: &str) -> bool {
        match parse_reaction_pattern(template) {
            Ok(_) => true,
            Err(e) => {
                trace!(template, "Template rejected: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_sanitize_round() {
        let toolkit = SmilesToolkit;
        let mut rxn = toolkit.parse_reaction("[CH3:1][OH:2]>>[CH2:1]=[O:2]").unwrap();
        for mol in rxn.molecules_mut() {
            toolkit.sanitize(mol).unwrap();
        }
        assert_eq!(rxn.reactants.len(), 1);
        assert_eq!(rxn.products.len(), 1);
    }

    #[test]
    fn parse_failure_is_read_error() {
        let err = SmilesToolkit.parse_reaction("C(C>>C").unwrap_err();
        assert!(matches!(err, ToolkitError::Read(_)));
    }

    #[test]
    fn template_validity() {
        let toolkit = SmilesToolkit;
        assert!(toolkit.is_valid_template("([C:1]-[OH:2])>>([C:1]=[O:2])"));
        assert!(!toolkit.is_valid_template(">>([C:1]=[O:2])"));
        assert!(!toolkit.is_valid_template("([C:1]-[O:2]>>[C:1]"));
    }
}

use super::canon::canonicalize_side;
use super::changes::ChangedAtoms;
use super::error::ExtractionError;
use super::expansion::{FragmentSelection, NeighborhoodExpander};
use super::wildcard::WildcardGenerator;
use crate::core::groups::catalog::GroupCatalog;
use crate::core::io::fragment::LabelOrder;
use crate::core::io::labels::{first_appearance, map_labels};
use crate::core::models::molecule::Molecule;
use crate::core::toolkit::ChemistryToolkit;
use petgraph::graph::NodeIndex;
use std::collections::BTreeSet;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoleculeRole {
    Reactant,
    Product,
}

/// Picks the atoms and symbols that make up each molecule's fragment.
pub struct FragmentSelector<'a, T: ChemistryToolkit> {
    toolkit: &'a T,
    catalog: &'a GroupCatalog,
    wildcard: WildcardGenerator,
}

/// Inserts `term` before the map label of a bracket symbol, or before the
/// closing bracket when there is no label.
fn qualify(symbol: &str, term: &str) -> String {
    match symbol.rfind(':').or_else(|| symbol.rfind(']')) {
        Some(pos) => format!("{}{}{}", &symbol[..pos], term, &symbol[pos..]),
        None => symbol.to_string(),
    }
}

impl<'a, T: ChemistryToolkit> FragmentSelector<'a, T> {
    pub fn new(toolkit: &'a T, catalog: &'a GroupCatalog, super_general: bool) -> Self {
        Self {
            toolkit,
            catalog,
            wildcard: WildcardGenerator::new(super_general),
        }
    }

    /// Seed symbol for a changed atom: explicit `H0` and `+0` terms keep the
    /// pattern from matching more hydrogens or a charge than the reaction had.
    /// Atoms in `strip` lose their map label first.
    fn seed_symbol(molecule: &Molecule, idx: NodeIndex, strip: bool) -> String {
        let mut symbol = if strip {
            let mut atom = molecule.atom(idx).clone();
            atom.map_number = None;
            atom.bracketed = true;
            atom.literal_symbol()
        } else {
            molecule.literal_symbol(idx)
        };
        if molecule.total_hydrogens(idx) == 0 {
            symbol = qualify(&symbol, ";H0");
        }
        if molecule.atom(idx).formal_charge == 0 {
            symbol = qualify(&symbol, ";+0");
        }
        symbol
    }

    /// Selection for one molecule, or `None` when no atom qualifies.
    ///
    /// # Arguments
    ///
    /// * `changed` - Changed atoms of the reaction.
    /// * `radius` - Number of expansion hops.
    /// * `role` - Reactants use functional-group clusters and drop leaving
    ///   labels; products take `extra` labels as wildcards and keep every
    ///   unmapped atom.
    /// * `extra` - Labels the reactant side pulled in beyond `changed`.
    pub fn select(
        &self,
        molecule: &Molecule,
        changed: &ChangedAtoms,
        radius: usize,
        role: MoleculeRole,
        extra: &BTreeSet<u32>,
    ) -> Option<FragmentSelection> {
        let mut selection = FragmentSelection::new();
        for (idx, label) in molecule.mapped_atoms() {
            if !changed.labels.contains(&label) {
                continue;
            }
            let strip = role == MoleculeRole::Reactant && changed.leaving.contains(&label);
            let symbol = Self::seed_symbol(molecule, idx, strip);
            if symbol == molecule.literal_symbol(idx) {
                selection.include(idx);
            } else {
                selection.include_with_symbol(idx, symbol);
            }
        }

        let clusters = match role {
            MoleculeRole::Reactant if !self.wildcard.is_super_general() => {
                self.toolkit.find_groups(molecule, self.catalog)
            }
            _ => Vec::new(),
        };
        NeighborhoodExpander::new(molecule, &clusters, self.wildcard)
            .expand_by(&mut selection, radius);

        if role == MoleculeRole::Product {
            for (idx, label) in molecule.mapped_atoms() {
                if extra.contains(&label) && !changed.labels.contains(&label) {
                    trace!(label, "Extra label added to product fragment");
                    selection.include_with_symbol(idx, self.wildcard.generalize_in(molecule, idx));
                }
            }
            for idx in molecule.atoms() {
                if molecule.map_number(idx).is_none() {
                    selection.include(idx);
                }
            }
        }

        (!selection.is_empty()).then_some(selection)
    }

    /// Writes one selected fragment. Map labels are cleared from a copy of
    /// the molecule so only the symbol table carries them.
    pub fn fragment_text(
        &self,
        molecule: &Molecule,
        selection: &FragmentSelection,
        label_order: &LabelOrder,
    ) -> Result<String, ExtractionError> {
        let symbols = selection.symbol_table(molecule);
        let mut unlabeled = molecule.clone();
        unlabeled.clear_map_numbers();
        self.toolkit
            .write_fragment(&unlabeled, &selection.atoms, &symbols, label_order)
            .map_err(ExtractionError::Fragment)
    }

    /// All fragments of one side, each parenthesized and joined with `.`.
    /// Molecules with no selected atoms are skipped. Equivalent atoms are
    /// written in the order `label_order` gives their labels.
    pub fn side_fragments(
        &self,
        molecules: &[Molecule],
        changed: &ChangedAtoms,
        radius: usize,
        role: MoleculeRole,
        extra: &BTreeSet<u32>,
        label_order: &LabelOrder,
    ) -> Result<String, ExtractionError> {
        let mut parts = Vec::with_capacity(molecules.len());
        for molecule in molecules {
            if let Some(selection) = self.select(molecule, changed, radius, role, extra) {
                parts.push(format!("({})", self.fragment_text(molecule, &selection, label_order)?));
            }
        }
        Ok(parts.join("."))
    }

    /// Reactant and product side texts of the template.
    ///
    /// Atoms that are equivalent within one side are written in the order
    /// their labels take on the other side, so the pairing of labels across
    /// the two sides does not depend on input atom order. Drafts with no
    /// ordering come first; the reactant side then follows the draft product
    /// order and the product side follows the final reactant order.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Fragment`] if a fragment cannot be written.
    pub fn template_sides(
        &self,
        reactants: &[Molecule],
        products: &[Molecule],
        changed: &ChangedAtoms,
        reactant_radius: usize,
        product_radius: usize,
    ) -> Result<(String, String), ExtractionError> {
        let unordered = LabelOrder::new();
        let draft_reactants = self.side_fragments(
            reactants,
            changed,
            reactant_radius,
            MoleculeRole::Reactant,
            &BTreeSet::new(),
            &unordered,
        )?;
        let extra = extra_labels(&changed.labels, &draft_reactants);
        let draft_products = self.side_fragments(
            products,
            changed,
            product_radius,
            MoleculeRole::Product,
            &extra,
            &unordered,
        )?;

        let reactant_text = self.side_fragments(
            reactants,
            changed,
            reactant_radius,
            MoleculeRole::Reactant,
            &BTreeSet::new(),
            &first_appearance(&canonicalize_side(&draft_products)),
        )?;
        let product_text = self.side_fragments(
            products,
            changed,
            product_radius,
            MoleculeRole::Product,
            &extra,
            &first_appearance(&canonicalize_side(&reactant_text)),
        )?;
        Ok((reactant_text, product_text))
    }
}

/// Labels present in the reactant-side text but not among the changed labels.
pub fn extra_labels(changed: &BTreeSet<u32>, reactant_text: &str) -> BTreeSet<u32> {
    map_labels(reactant_text)
        .into_iter()
        .filter(|label| !changed.contains(label))
        .collect()
}

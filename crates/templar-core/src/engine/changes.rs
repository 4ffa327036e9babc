use super::config::ComparisonLevel;
use super::error::ExtractionError;
use crate::core::models::molecule::Molecule;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// A reactant-side atom: molecule position plus atom index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomRef {
    pub molecule: usize,
    pub atom: NodeIndex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoichiometryWarning {
    /// Reactants and products use different sets of map labels.
    DistinctLabelCount { reactants: usize, products: usize },
    /// The number of mapped atoms differs between the two sides.
    TaggedAtomCount { reactants: usize, products: usize },
}

impl fmt::Display for StoichiometryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DistinctLabelCount {
                reactants,
                products,
            } => write!(
                f,
                "different map labels on each side ({reactants} reactant, {products} product)"
            ),
            Self::TaggedAtomCount {
                reactants,
                products,
            } => write!(
                f,
                "mapped atom counts differ ({reactants} reactant, {products} product)"
            ),
        }
    }
}

/// Result of change detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedAtoms {
    /// Changed map labels.
    pub labels: BTreeSet<u32>,
    /// Reactant-side atoms behind `labels`, in detection order.
    pub atoms: Vec<AtomRef>,
    /// Changed labels with no product counterpart (mapped leaving groups).
    pub leaving: BTreeSet<u32>,
    pub warnings: Vec<StoichiometryWarning>,
}

impl ChangedAtoms {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn insert(&mut self, label: u32, atom: AtomRef) {
        if self.labels.insert(label) {
            self.atoms.push(atom);
        }
    }
}

fn tagged_atoms(molecules: &[Molecule]) -> Vec<(usize, NodeIndex, u32)> {
    molecules
        .iter()
        .enumerate()
        .flat_map(|(m, mol)| mol.mapped_atoms().map(move |(idx, label)| (m, idx, label)))
        .collect()
}

/// Whether two mapped atoms differ at the given comparison level.
pub fn atoms_differ(
    a_mol: &Molecule,
    a: NodeIndex,
    b_mol: &Molecule,
    b: NodeIndex,
    level: ComparisonLevel,
) -> bool {
    let atom_a = a_mol.atom(a);
    let atom_b = b_mol.atom(b);
    if atom_a.literal_symbol() != atom_b.literal_symbol()
        || atom_a.atomic_num != atom_b.atomic_num
        || a_mol.total_hydrogens(a) != b_mol.total_hydrogens(b)
        || atom_a.formal_charge != atom_b.formal_charge
        || a_mol.degree(a) != b_mol.degree(b)
        || atom_a.radical_electrons != atom_b.radical_electrons
    {
        return true;
    }
    match level {
        ComparisonLevel::Attributes => false,
        ComparisonLevel::Bonds => a_mol.bond_labels(a) != b_mol.bond_labels(b),
    }
}

/// Finds the map labels whose atoms change between reactants and products.
///
/// Every product atom must be mapped. A label is changed when its reactant
/// and product atoms differ, or when it appears on more than one product
/// atom. Any reactant molecule that holds a changed label then contributes
/// every one of its mapped atoms whose label never reaches the products.
///
/// # Errors
///
/// Returns [`ExtractionError::Mapping`] if any product atom is unmapped.
pub fn detect_changed_atoms(
    reactants: &[Molecule],
    products: &[Molecule],
    level: ComparisonLevel,
) -> Result<ChangedAtoms, ExtractionError> {
    let unmapped: usize = products
        .iter()
        .map(|mol| mol.atoms().filter(|&a| mol.map_number(a).is_none()).count())
        .sum();
    if unmapped > 0 {
        return Err(ExtractionError::Mapping { unmapped });
    }

    let product_tags = tagged_atoms(products);
    let reactant_tags = tagged_atoms(reactants);
    let mut changed = ChangedAtoms::default();

    let product_labels: HashSet<u32> = product_tags.iter().map(|t| t.2).collect();
    let reactant_labels: HashSet<u32> = reactant_tags.iter().map(|t| t.2).collect();
    if product_labels.len() != reactant_labels.len() {
        changed.warnings.push(StoichiometryWarning::DistinctLabelCount {
            reactants: reactant_labels.len(),
            products: product_labels.len(),
        });
    }
    if product_tags.len() != reactant_tags.len() {
        changed.warnings.push(StoichiometryWarning::TaggedAtomCount {
            reactants: reactant_tags.len(),
            products: product_tags.len(),
        });
    }
    for warning in &changed.warnings {
        warn!("Stoichiometry mismatch: {warning}");
    }

    let mut product_counts: HashMap<u32, usize> = HashMap::new();
    for &(_, _, label) in &product_tags {
        *product_counts.entry(label).or_default() += 1;
    }

    for &(p_mol, p_atom, label) in &product_tags {
        for &(r_mol, r_atom, r_label) in &reactant_tags {
            if r_label != label || changed.labels.contains(&label) {
                continue;
            }
            let differs = atoms_differ(
                &products[p_mol],
                p_atom,
                &reactants[r_mol],
                r_atom,
                level,
            );
            if differs || product_counts[&label] > 1 {
                changed.insert(
                    label,
                    AtomRef {
                        molecule: r_mol,
                        atom: r_atom,
                    },
                );
                break;
            }
        }
    }

    for (m, mol) in reactants.iter().enumerate() {
        let tags: Vec<(NodeIndex, u32)> = mol.mapped_atoms().collect();
        if !tags.iter().any(|(_, label)| changed.labels.contains(label)) {
            continue;
        }
        for (atom, label) in tags {
            if !changed.labels.contains(&label) && !product_labels.contains(&label) {
                changed.insert(label, AtomRef { molecule: m, atom });
            }
        }
    }

    changed.leaving = changed
        .labels
        .iter()
        .copied()
        .filter(|label| !product_labels.contains(label))
        .collect();

    debug!(
        changed = changed.labels.len(),
        leaving = changed.leaving.len(),
        "Change detection complete"
    );
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::sanitize::sanitize;
    use crate::core::io::smiles::parse_reaction;

    fn sides(text: &str) -> (Vec<Molecule>, Vec<Molecule>) {
        let mut rxn = parse_reaction(text).unwrap();
        for mol in rxn.molecules_mut() {
            sanitize(mol).unwrap();
        }
        (rxn.reactants, rxn.products)
    }

    fn labels(changed: &ChangedAtoms) -> Vec<u32> {
        changed.labels.iter().copied().collect()
    }

    #[test]
    fn amide_coupling_marks_center_and_leaving_group() {
        let (r, p) = sides("[CH3:1][C:2](=[O:3])[Cl:4].[NH3:5]>>[CH3:1][C:2](=[O:3])[NH2:5]");
        let changed = detect_changed_atoms(&r, &p, ComparisonLevel::Bonds).unwrap();
        assert_eq!(labels(&changed), vec![2, 4, 5]);
        assert_eq!(changed.leaving.iter().copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(changed.atoms.len(), 3);
        assert_eq!(
            changed.atoms[0],
            AtomRef {
                molecule: 0,
                atom: NodeIndex::new(1)
            }
        );
    }

    #[test]
    fn attribute_level_ignores_neighbor_identity() {
        // Swapping one halogen neighbor for another leaves the carbon's own
        // attributes untouched.
        let (r, p) = sides("[CH3:1][Cl:2].[Br-:3]>>[CH3:1][Br:3].[Cl-:2]");
        let bonds = detect_changed_atoms(&r, &p, ComparisonLevel::Bonds).unwrap();
        assert!(bonds.labels.contains(&1));
        let attrs = detect_changed_atoms(&r, &p, ComparisonLevel::Attributes).unwrap();
        assert!(!attrs.labels.contains(&1));
        assert!(attrs.labels.contains(&2));
        assert!(attrs.labels.contains(&3));
    }

    #[test]
    fn unmapped_product_atom_is_a_mapping_error() {
        let (r, p) = sides("[CH3:1][OH:2]>>[CH3:1]O");
        let err = detect_changed_atoms(&r, &p, ComparisonLevel::Bonds).unwrap_err();
        assert_eq!(err, ExtractionError::Mapping { unmapped: 1 });
    }

    #[test]
    fn identical_sides_have_no_changes() {
        let (r, p) = sides("[CH3:1][OH:2]>>[CH3:1][OH:2]");
        let changed = detect_changed_atoms(&r, &p, ComparisonLevel::Bonds).unwrap();
        assert!(changed.is_empty());
        assert!(changed.warnings.is_empty());
    }

    #[test]
    fn repeated_product_label_is_changed() {
        let (r, p) = sides("[CH3:1][OH:2]>>[CH3:1][OH:2].[CH3:1][OH:2]");
        let changed = detect_changed_atoms(&r, &p, ComparisonLevel::Bonds).unwrap();
        assert_eq!(labels(&changed), vec![1, 2]);
        assert_eq!(
            changed.warnings,
            vec![StoichiometryWarning::TaggedAtomCount {
                reactants: 2,
                products: 4
            }]
        );
    }

    #[test]
    fn leaving_groups_only_come_from_molecules_with_changes() {
        let (r, p) = sides(
            "[CH2:1]=[CH2:2].[Na+:9].[Cl-:8]>>[CH3:1][CH3:2]",
        );
        let changed = detect_changed_atoms(&r, &p, ComparisonLevel::Bonds).unwrap();
        assert_eq!(labels(&changed), vec![1, 2]);
        assert!(changed.leaving.is_empty());
        assert_eq!(
            changed.warnings,
            vec![
                StoichiometryWarning::DistinctLabelCount {
                    reactants: 4,
                    products: 2
                },
                StoichiometryWarning::TaggedAtomCount {
                    reactants: 4,
                    products: 2
                },
            ]
        );
    }
}

use crate::core::models::atom::Atom;
use crate::core::models::molecule::Molecule;
use petgraph::graph::NodeIndex;

/// Produces the generalized symbol used for atoms pulled into a fragment
/// without being part of the reaction center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WildcardGenerator {
    super_general: bool,
}

impl WildcardGenerator {
    pub fn new(super_general: bool) -> Self {
        Self { super_general }
    }

    pub fn is_super_general(&self) -> bool {
        self.super_general
    }

    /// Generalized symbol for `atom`, which has `degree` explicit neighbors.
    ///
    /// In super-general mode a mapped atom becomes a labelled wildcard.
    /// Otherwise terminal atoms keep their literal symbol, and every other
    /// atom is reduced to its element (aromatic or aliphatic carbon, or an
    /// atomic number), its charge and its map label.
    pub fn generalize(&self, atom: &Atom, degree: usize) -> String {
        if self.super_general {
            if let Some(map) = atom.map_number {
                return format!("[*:{map}]");
            }
        } else if degree == 1 {
            return atom.literal_symbol();
        }

        let mut terms = Vec::with_capacity(2);
        terms.push(match (atom.atomic_num, atom.is_aromatic) {
            (6, true) => "c".to_string(),
            (6, false) => "C".to_string(),
            (z, _) => format!("#{z}"),
        });
        if !self.super_general {
            if let Some(charge) = atom.charge_text() {
                terms.push(charge);
            }
        }
        let body = terms.join(";");
        match atom.map_number {
            Some(map) => format!("[{body}:{map}]"),
            None => format!("[{body}]"),
        }
    }

    pub fn generalize_in(&self, molecule: &Molecule, idx: NodeIndex) -> String {
        self.generalize(molecule.atom(idx), molecule.degree(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(atomic_num: u8) -> Atom {
        Atom {
            bracketed: true,
            ..Atom::new(atomic_num)
        }
    }

    #[test]
    fn terminal_atom_keeps_literal_symbol() {
        let methyl = Atom {
            hydrogen_count: 3,
            ..atom(6).with_map_number(4)
        };
        assert_eq!(WildcardGenerator::new(false).generalize(&methyl, 1), "[CH3:4]");
    }

    #[test]
    fn aliphatic_and_aromatic_carbon() {
        let generator = WildcardGenerator::new(false);
        assert_eq!(generator.generalize(&atom(6).with_map_number(2), 3), "[C:2]");
        let aromatic = Atom {
            is_aromatic: true,
            ..atom(6)
        };
        assert_eq!(generator.generalize(&aromatic, 2), "[c]");
    }

    #[test]
    fn heteroatoms_use_atomic_number_and_charge() {
        let generator = WildcardGenerator::new(false);
        let ammonium = Atom {
            formal_charge: 1,
            ..atom(7).with_map_number(9)
        };
        assert_eq!(generator.generalize(&ammonium, 4), "[#7;+:9]");
        let sulfur = atom(16);
        assert_eq!(generator.generalize(&sulfur, 2), "[#16]");
    }

    #[test]
    fn super_general_mapped_atom_is_bare_wildcard() {
        let generator = WildcardGenerator::new(true);
        let carbon = Atom {
            formal_charge: -1,
            ..atom(6).with_map_number(7)
        };
        assert_eq!(generator.generalize(&carbon, 1), "[*:7]");
        assert_eq!(generator.generalize(&carbon, 3), "[*:7]");
    }

    #[test]
    fn super_general_unmapped_atom_drops_charge_and_terminal_passthrough() {
        let generator = WildcardGenerator::new(true);
        let oxide = Atom {
            formal_charge: -1,
            ..atom(8)
        };
        assert_eq!(generator.generalize(&oxide, 1), "[#8]");
    }

    #[test]
    fn generalize_in_reads_degree_from_molecule() {
        use crate::core::models::topology::BondOrder;
        let mut mol = Molecule::new();
        let c = mol.add_atom(atom(6).with_map_number(1));
        let o = mol.add_atom(atom(8).with_map_number(2));
        let n = mol.add_atom(atom(7).with_map_number(3));
        mol.add_bond(c, o, BondOrder::Double);
        mol.add_bond(c, n, BondOrder::Single);
        let generator = WildcardGenerator::new(false);
        assert_eq!(generator.generalize_in(&mol, c), "[C:1]");
        assert_eq!(generator.generalize_in(&mol, o), "[O:2]");
    }
}

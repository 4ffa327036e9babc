use crate::core::models::element;
use crate::core::models::molecule::Molecule;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("Atom {index} ({symbol}) exceeds its allowed valence ({valence})")]
    Valence {
        index: usize,
        symbol: String,
        valence: u8,
    },
    #[error("Aromatic atom {index} ({symbol}) is not in a ring")]
    AromaticOutsideRing { index: usize, symbol: String },
}

/// Validates valences and aromatic ring membership, assigning implicit
/// hydrogens to unbracketed atoms and radical electrons to under-valent
/// bracket atoms. Plain explicit `[H]` atoms are folded into their neighbor
/// first, so `[H][N]([H])C` and `[NH2]C` sanitize to the same graph.
pub fn sanitize(mol: &mut Molecule) -> Result<(), SanitizeError> {
    mol.fold_explicit_hydrogens();
    let indices: Vec<_> = mol.atoms().collect();
    for idx in indices {
        let atom = mol.atom(idx).clone();
        let used = mol.explicit_valence(idx);
        let valences = element::default_valences(atom.atomic_num);

        if atom.is_aromatic && !mol.is_in_ring(idx) {
            return Err(SanitizeError::AromaticOutsideRing {
                index: idx.index(),
                symbol: atom.element_symbol(),
            });
        }

        if !atom.bracketed {
            if valences.is_empty() {
                continue;
            }
            let target = valences
                .iter()
                .copied()
                .find(|&v| v >= used)
                .ok_or_else(|| SanitizeError::Valence {
                    index: idx.index(),
                    symbol: atom.element_symbol(),
                    valence: used,
                })?;
            let mut hydrogens = target - used;
            if atom.is_aromatic && hydrogens > 0 {
                hydrogens -= 1;
            }
            mol.atom_mut(idx).hydrogen_count = hydrogens;
            continue;
        }

        if atom.formal_charge != 0 || valences.is_empty() {
            continue;
        }
        let total = used.saturating_add(atom.hydrogen_count);
        let max = valences.iter().copied().max().unwrap_or(0);
        if total > max {
            return Err(SanitizeError::Valence {
                index: idx.index(),
                symbol: atom.element_symbol(),
                valence: total,
            });
        }
        let min = valences.iter().copied().min().unwrap_or(0);
        if !atom.is_aromatic && total < min {
            mol.atom_mut(idx).radical_electrons = min - total;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::smiles::parse_smiles;
    use petgraph::graph::NodeIndex;

    fn sanitized(text: &str) -> Molecule {
        let mut mol = parse_smiles(text).unwrap();
        sanitize(&mut mol).unwrap();
        mol
    }

    fn h(mol: &Molecule, i: usize) -> u8 {
        mol.atom(NodeIndex::new(i)).hydrogen_count
    }

    #[test]
    fn implicit_hydrogens_follow_default_valence() {
        let mol = sanitized("CC(=O)N");
        assert_eq!(h(&mol, 0), 3);
        assert_eq!(h(&mol, 1), 0);
        assert_eq!(h(&mol, 2), 0);
        assert_eq!(h(&mol, 3), 2);
    }

    #[test]
    fn aromatic_rings_get_one_fewer_hydrogen() {
        let benzene = sanitized("c1ccccc1");
        assert!((0..6).all(|i| h(&benzene, i) == 1));
        let pyridine = sanitized("n1ccccc1");
        assert_eq!(h(&pyridine, 0), 0);
        let furan = sanitized("o1cccc1");
        assert_eq!(h(&furan, 0), 0);
    }

    #[test]
    fn hypervalent_sulfur_uses_higher_valence() {
        let mol = sanitized("CS(=O)(=O)Cl");
        assert_eq!(h(&mol, 1), 0);
    }

    #[test]
    fn bracket_hydrogens_are_kept() {
        let mol = sanitized("[CH3:1][OH:2]");
        assert_eq!(h(&mol, 0), 3);
        assert_eq!(h(&mol, 1), 1);
    }

    #[test]
    fn under_valent_bracket_atom_becomes_radical() {
        let mol = sanitized("[CH3]");
        assert_eq!(mol.atom(NodeIndex::new(0)).radical_electrons, 1);
    }

    #[test]
    fn over_valent_atoms_are_rejected() {
        let mut mol = parse_smiles("C(C)(C)(C)(C)C").unwrap();
        assert!(matches!(sanitize(&mut mol), Err(SanitizeError::Valence { .. })));
        let mut bracket = parse_smiles("[CH4:1]C").unwrap();
        assert!(matches!(sanitize(&mut bracket), Err(SanitizeError::Valence { .. })));
    }

    #[test]
    fn aromatic_atom_outside_ring_is_rejected() {
        let mut mol = parse_smiles("cC").unwrap();
        assert!(matches!(
            sanitize(&mut mol),
            Err(SanitizeError::AromaticOutsideRing { .. })
        ));
    }

    #[test]
    fn explicit_hydrogen_atoms_fold_into_bracket_neighbor() {
        let mol = sanitized("[H][N:5]([H])C");
        assert_eq!(mol.atom_count(), 2);
        let (n, _) = mol.mapped_atoms().next().unwrap();
        assert_eq!(mol.atom(n).hydrogen_count, 2);
        assert_eq!(mol.atom(n).radical_electrons, 0);
        let methyl = mol.neighbors(n).next().unwrap();
        assert_eq!(mol.atom(methyl).hydrogen_count, 3);
    }

    #[test]
    fn mapped_and_isotopic_hydrogens_stay_explicit() {
        let mol = sanitized("[H:9][N:5]([2H])C");
        assert_eq!(mol.atom_count(), 4);
    }

    #[test]
    fn charged_atoms_skip_valence_checks() {
        assert!(parse_smiles("[NH4+]").map(|mut m| sanitize(&mut m)).unwrap().is_ok());
    }
}

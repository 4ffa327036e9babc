use super::wildcard::WildcardGenerator;
use crate::core::models::molecule::Molecule;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet};

/// Atoms chosen for one molecule's fragment, plus the symbols that replace
/// their literal symbols when the fragment is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentSelection {
    pub atoms: BTreeSet<NodeIndex>,
    /// Later entries for the same atom replace earlier ones.
    pub overrides: BTreeMap<NodeIndex, String>,
}

impl FragmentSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, atom: NodeIndex) -> bool {
        self.atoms.contains(&atom)
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn include(&mut self, atom: NodeIndex) {
        self.atoms.insert(atom);
    }

    pub fn include_with_symbol(&mut self, atom: NodeIndex, symbol: String) {
        self.atoms.insert(atom);
        self.overrides.insert(atom, symbol);
    }

    /// Full per-atom symbol table for `molecule`: literal symbols with this
    /// selection's overrides applied.
    pub fn symbol_table(&self, molecule: &Molecule) -> Vec<String> {
        molecule
            .atoms()
            .map(|idx| match self.overrides.get(&idx) {
                Some(symbol) => symbol.clone(),
                None => molecule.literal_symbol(idx),
            })
            .collect()
    }
}

/// Grows a selection outward by whole bonds, honoring functional-group
/// clusters.
pub struct NeighborhoodExpander<'a> {
    molecule: &'a Molecule,
    clusters: &'a [Vec<NodeIndex>],
    wildcard: WildcardGenerator,
}

impl<'a> NeighborhoodExpander<'a> {
    pub fn new(
        molecule: &'a Molecule,
        clusters: &'a [Vec<NodeIndex>],
        wildcard: WildcardGenerator,
    ) -> Self {
        Self {
            molecule,
            clusters,
            wildcard,
        }
    }

    /// One hop: every neighbor of an atom selected before this call is
    /// considered once. A neighbor inside any cluster brings in every such
    /// cluster unchanged; any other neighbor is added under its wildcard
    /// symbol. Atoms already selected keep their symbols.
    pub fn expand(&self, selection: &mut FragmentSelection) {
        let frontier: Vec<NodeIndex> = selection.atoms.iter().copied().collect();
        for atom in frontier {
            for candidate in self.molecule.neighbors(atom) {
                if selection.contains(candidate) {
                    continue;
                }
                let mut in_cluster = false;
                for cluster in self.clusters.iter().filter(|c| c.contains(&candidate)) {
                    in_cluster = true;
                    for &member in cluster {
                        selection.include(member);
                    }
                }
                if !in_cluster {
                    let symbol = self.wildcard.generalize_in(self.molecule, candidate);
                    selection.include_with_symbol(candidate, symbol);
                }
            }
        }
    }

    pub fn expand_by(&self, selection: &mut FragmentSelection, radius: usize) {
        for _ in 0..radius {
            self.expand(selection);
        }
    }
}

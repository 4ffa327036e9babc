use super::atom::Atom;
use super::topology::{Bond, BondOrder};
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::{HashSet, VecDeque};

/// A connected (or disconnected) molecular graph with atoms as nodes and
/// bonds as edges.
///
/// Node indices are stable once [`Molecule::fold_explicit_hydrogens`] has
/// run; no other operation removes atoms.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    graph: UnGraph<Atom, Bond>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, atom: Atom) -> NodeIndex {
        self.graph.add_node(atom)
    }

    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, order: BondOrder) -> EdgeIndex {
        self.graph.add_edge(a, b, Bond::new(order))
    }

    pub fn graph(&self) -> &UnGraph<Atom, Bond> {
        &self.graph
    }

    pub fn atom(&self, idx: NodeIndex) -> &Atom {
        &self.graph[idx]
    }

    pub fn atom_mut(&mut self, idx: NodeIndex) -> &mut Atom {
        &mut self.graph[idx]
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    /// Every bond of `idx` as `(neighbor, bond)`.
    pub fn bonds_of(&self, idx: NodeIndex) -> impl Iterator<Item = (NodeIndex, &Bond)> + '_ {
        self.graph.edges(idx).map(move |edge| {
            let other = if edge.source() == idx {
                edge.target()
            } else {
                edge.source()
            };
            (other, edge.weight())
        })
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<&Bond> {
        self.graph.find_edge(a, b).map(|e| &self.graph[e])
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges(idx).count()
    }

    /// Hydrogens on `idx`, counting both implicit ones and explicit hydrogen
    /// neighbors.
    pub fn total_hydrogens(&self, idx: NodeIndex) -> u8 {
        let explicit = self
            .neighbors(idx)
            .filter(|&n| self.graph[n].atomic_num == 1)
            .count() as u8;
        self.graph[idx].hydrogen_count.saturating_add(explicit)
    }

    /// Folds plain `[H]` atoms into their heavy neighbor's hydrogen count and
    /// drops them from the graph. Mapped, isotopic and charged hydrogens stay,
    /// as do hydrogens bonded to other hydrogens. Returns the number folded.
    pub fn fold_explicit_hydrogens(&mut self) -> usize {
        let foldable: Vec<(NodeIndex, NodeIndex)> = self
            .graph
            .node_indices()
            .filter_map(|idx| {
                let atom = &self.graph[idx];
                if atom.atomic_num != 1
                    || atom.map_number.is_some()
                    || atom.isotope != 0
                    || atom.formal_charge != 0
                    || self.degree(idx) != 1
                {
                    return None;
                }
                let heavy = self.neighbors(idx).next()?;
                (self.graph[heavy].atomic_num != 1).then_some((idx, heavy))
            })
            .collect();
        if foldable.is_empty() {
            return 0;
        }

        let dropped: HashSet<NodeIndex> = foldable.iter().map(|&(h, _)| h).collect();
        for &(_, heavy) in &foldable {
            let atom = &mut self.graph[heavy];
            atom.hydrogen_count = atom.hydrogen_count.saturating_add(1);
        }
        self.graph = self.graph.filter_map(
            |idx, atom| (!dropped.contains(&idx)).then(|| atom.clone()),
            |_, bond| Some(*bond),
        );
        foldable.len()
    }

    pub fn map_number(&self, idx: NodeIndex) -> Option<u32> {
        self.graph[idx].map_number
    }

    /// Mapped atoms with their labels, in index order.
    pub fn mapped_atoms(&self) -> impl Iterator<Item = (NodeIndex, u32)> + '_ {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph[idx].map_number.map(|m| (idx, m)))
    }

    pub fn literal_symbol(&self, idx: NodeIndex) -> String {
        self.graph[idx].literal_symbol()
    }

    pub fn clear_map_numbers(&mut self) {
        for atom in self.graph.node_weights_mut() {
            atom.map_number = None;
        }
    }

    /// Sum of bond valence contributions around `idx`.
    pub fn explicit_valence(&self, idx: NodeIndex) -> u8 {
        self.graph
            .edges(idx)
            .map(|e| e.weight().order.valence_contribution())
            .sum()
    }

    fn endpoint_signature(&self, idx: NodeIndex) -> String {
        let atom = &self.graph[idx];
        match atom.map_number {
            Some(map) => format!("{}:{}", atom.atomic_num, map),
            None => atom.atomic_num.to_string(),
        }
    }

    /// Order-independent label for the bond between `a` and `b`: both
    /// endpoint signatures, sorted, joined by the bond symbol.
    pub fn bond_label(&self, a: NodeIndex, b: NodeIndex, bond: &Bond) -> String {
        let mut ends = [self.endpoint_signature(a), self.endpoint_signature(b)];
        ends.sort();
        format!("{}{}{}", ends[0], bond.order.symbol(), ends[1])
    }

    /// Sorted bond labels of every bond touching `idx`.
    pub fn bond_labels(&self, idx: NodeIndex) -> Vec<String> {
        let mut labels: Vec<String> = self
            .bonds_of(idx)
            .map(|(other, bond)| self.bond_label(idx, other, bond))
            .collect();
        labels.sort();
        labels
    }

    /// Whether the bond `a`-`b` lies on a cycle, i.e. `b` stays reachable from
    /// `a` once that bond is removed.
    pub fn is_ring_bond(&self, a: NodeIndex, b: NodeIndex) -> bool {
        if self.graph.find_edge(a, b).is_none() {
            return false;
        }
        let mut seen = HashSet::from([a]);
        let mut queue = VecDeque::from([a]);
        while let Some(current) = queue.pop_front() {
            for next in self.graph.neighbors(current) {
                if (current == a && next == b) || (current == b && next == a) {
                    continue;
                }
                if next == b {
                    return true;
                }
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    pub fn is_in_ring(&self, idx: NodeIndex) -> bool {
        self.neighbors(idx).any(|n| self.is_ring_bond(idx, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ethanol() -> (Molecule, [NodeIndex; 3]) {
        let mut mol = Molecule::new();
        let c1 = mol.add_atom(Atom {
            hydrogen_count: 3,
            ..Atom::new(6).with_map_number(1)
        });
        let c2 = mol.add_atom(Atom {
            hydrogen_count: 2,
            ..Atom::new(6).with_map_number(2)
        });
        let o = mol.add_atom(Atom {
            hydrogen_count: 1,
            ..Atom::new(8)
        });
        mol.add_bond(c1, c2, BondOrder::Single);
        mol.add_bond(c2, o, BondOrder::Single);
        (mol, [c1, c2, o])
    }

    fn cyclopropane() -> Molecule {
        let mut mol = Molecule::new();
        let a = mol.add_atom(Atom::new(6));
        let b = mol.add_atom(Atom::new(6));
        let c = mol.add_atom(Atom::new(6));
        let d = mol.add_atom(Atom::new(8));
        mol.add_bond(a, b, BondOrder::Single);
        mol.add_bond(b, c, BondOrder::Single);
        mol.add_bond(c, a, BondOrder::Single);
        mol.add_bond(c, d, BondOrder::Single);
        mol
    }

    #[test]
    fn plain_hydrogens_fold_into_their_neighbor() {
        let mut mol = Molecule::new();
        let h1 = mol.add_atom(Atom::new(1));
        let n = mol.add_atom(Atom::new(7).with_map_number(5));
        let h2 = mol.add_atom(Atom::new(1));
        let c = mol.add_atom(Atom::new(6));
        let deuterium = mol.add_atom(Atom {
            isotope: 2,
            ..Atom::new(1)
        });
        mol.add_bond(h1, n, BondOrder::Single);
        mol.add_bond(n, h2, BondOrder::Single);
        mol.add_bond(n, c, BondOrder::Single);
        mol.add_bond(c, deuterium, BondOrder::Single);

        assert_eq!(mol.fold_explicit_hydrogens(), 2);
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        let (n, _) = mol.mapped_atoms().next().unwrap();
        assert_eq!(mol.atom(n).hydrogen_count, 2);
        assert_eq!(mol.degree(n), 1);
        assert_eq!(mol.fold_explicit_hydrogens(), 0);
    }

    #[test]
    fn molecular_hydrogen_is_not_folded() {
        let mut mol = Molecule::new();
        let a = mol.add_atom(Atom::new(1));
        let b = mol.add_atom(Atom::new(1));
        mol.add_bond(a, b, BondOrder::Single);
        assert_eq!(mol.fold_explicit_hydrogens(), 0);
        assert_eq!(mol.atom_count(), 2);
    }

    #[test]
    fn degree_and_neighbors_follow_bonds() {
        let (mol, [c1, c2, o]) = ethanol();
        assert_eq!(mol.degree(c1), 1);
        assert_eq!(mol.degree(c2), 2);
        let mut n: Vec<_> = mol.neighbors(c2).collect();
        n.sort();
        assert_eq!(n, vec![c1, o]);
    }

    #[test]
    fn bond_label_is_symmetric() {
        let (mol, [c1, c2, _]) = ethanol();
        let bond = *mol.bond_between(c1, c2).unwrap();
        assert_eq!(mol.bond_label(c1, c2, &bond), mol.bond_label(c2, c1, &bond));
        assert_eq!(mol.bond_label(c1, c2, &bond), "6:1-6:2");
    }

    #[test]
    fn bond_labels_are_sorted() {
        let (mol, [_, c2, _]) = ethanol();
        assert_eq!(mol.bond_labels(c2), vec!["6:1-6:2", "6:2-8"]);
    }

    #[test]
    fn total_hydrogens_counts_explicit_neighbors() {
        let mut mol = Molecule::new();
        let c = mol.add_atom(Atom {
            hydrogen_count: 2,
            ..Atom::new(6)
        });
        let h = mol.add_atom(Atom::new(1));
        mol.add_bond(c, h, BondOrder::Single);
        assert_eq!(mol.total_hydrogens(c), 3);
    }

    #[test]
    fn ring_bonds_are_detected() {
        let mol = cyclopropane();
        let idx: Vec<_> = mol.atoms().collect();
        assert!(mol.is_ring_bond(idx[0], idx[1]));
        assert!(!mol.is_ring_bond(idx[2], idx[3]));
        assert!(mol.is_in_ring(idx[2]));
        assert!(!mol.is_in_ring(idx[3]));
    }

    #[test]
    fn clear_map_numbers_removes_every_label() {
        let (mut mol, _) = ethanol();
        assert_eq!(mol.mapped_atoms().count(), 2);
        mol.clear_map_numbers();
        assert_eq!(mol.mapped_atoms().count(), 0);
    }
}

use crate::core::io::query::{AtomExpr, BondExpr, QueryMolecule};
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{Bond, BondOrder};
use petgraph::graph::NodeIndex;
use std::collections::{HashSet, VecDeque};

/// Every match of `query` in `target`, one per distinct set of target atoms.
///
/// Each match lists the target atom for every query atom, in query-atom order.
pub fn find_matches(target: &Molecule, query: &QueryMolecule) -> Vec<Vec<NodeIndex>> {
    let mut vf2 = Vf2::new(target, query, None);
    let mut results = Vec::new();
    vf2.recurse(0, &mut results, false);

    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|mapping| {
            let mut key = mapping.clone();
            key.sort();
            seen.insert(key)
        })
        .collect()
}

/// Whether `query` matches with its first atom placed on `anchor`.
pub fn matches_at(target: &Molecule, query: &QueryMolecule, anchor: NodeIndex) -> bool {
    if query.atom_count() == 0 {
        return false;
    }
    let mut vf2 = Vf2::new(target, query, Some(anchor));
    let mut results = Vec::new();
    vf2.recurse(0, &mut results, true);
    !results.is_empty()
}

struct Vf2<'a> {
    target: &'a Molecule,
    query: &'a QueryMolecule,
    anchor: Option<NodeIndex>,
    query_order: Vec<NodeIndex>,
    query_map: Vec<Option<NodeIndex>>,
    target_used: Vec<bool>,
}

impl<'a> Vf2<'a> {
    fn new(target: &'a Molecule, query: &'a QueryMolecule, anchor: Option<NodeIndex>) -> Self {
        Self {
            target,
            query,
            anchor,
            query_order: connected_order(query),
            query_map: vec![None; query.atom_count()],
            target_used: vec![false; target.atom_count()],
        }
    }

    fn recurse(&mut self, depth: usize, results: &mut Vec<Vec<NodeIndex>>, first_only: bool) {
        if depth == self.query_order.len() {
            let mapping = self.query_map.iter().flatten().copied().collect();
            results.push(mapping);
            return;
        }

        let query_node = self.query_order[depth];
        let candidates: Vec<NodeIndex> = match self.anchor {
            Some(anchor) if query_node.index() == 0 => vec![anchor],
            _ => self.target.atoms().collect(),
        };

        for target_node in candidates {
            if self.target_used[target_node.index()] || !self.is_feasible(query_node, target_node) {
                continue;
            }

            self.query_map[query_node.index()] = Some(target_node);
            self.target_used[target_node.index()] = true;

            self.recurse(depth + 1, results, first_only);

            self.query_map[query_node.index()] = None;
            self.target_used[target_node.index()] = false;

            if first_only && !results.is_empty() {
                return;
            }
        }
    }

    fn is_feasible(&self, query_node: NodeIndex, target_node: NodeIndex) -> bool {
        if !atom_matches(self.target, target_node, &self.query.atom(query_node).expr) {
            return false;
        }
        for q_neighbor in self.query.neighbors(query_node) {
            let Some(t_mapped) = self.query_map[q_neighbor.index()] else {
                continue;
            };
            let Some(q_bond) = self.query.bond_between(query_node, q_neighbor) else {
                return false;
            };
            match self.target.bond_between(target_node, t_mapped) {
                Some(t_bond) => {
                    if !bond_matches(self.target, target_node, t_mapped, t_bond, q_bond) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

/// Breadth-first order over each query component, starting from atom 0, so
/// every atom after the first of its component has a mapped neighbor.
fn connected_order(query: &QueryMolecule) -> Vec<NodeIndex> {
    let mut order = Vec::with_capacity(query.atom_count());
    let mut seen = vec![false; query.atom_count()];
    for start in query.graph().node_indices() {
        if seen[start.index()] {
            continue;
        }
        seen[start.index()] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            order.push(node);
            let mut next: Vec<NodeIndex> = query.neighbors(node).collect();
            next.sort();
            for n in next {
                if !seen[n.index()] {
                    seen[n.index()] = true;
                    queue.push_back(n);
                }
            }
        }
    }
    order
}

pub fn atom_matches(target: &Molecule, idx: NodeIndex, expr: &AtomExpr) -> bool {
    let atom = target.atom(idx);
    match expr {
        AtomExpr::Any => true,
        AtomExpr::Element {
            atomic_num,
            aromatic,
        } => atom.atomic_num == *atomic_num && atom.is_aromatic == *aromatic,
        AtomExpr::AtomicNum(n) => atom.atomic_num == *n,
        AtomExpr::Aromatic(aromatic) => atom.is_aromatic == *aromatic,
        AtomExpr::Isotope(isotope) => atom.isotope == *isotope,
        AtomExpr::TotalHCount(h) => target.total_hydrogens(idx) == *h,
        AtomExpr::Degree(d) => target.degree(idx) == *d as usize,
        AtomExpr::Charge(c) => atom.formal_charge == *c,
        AtomExpr::InRing(in_ring) => target.is_in_ring(idx) == *in_ring,
        AtomExpr::Recursive(inner) => matches_at(target, inner, idx),
        AtomExpr::Not(inner) => !atom_matches(target, idx, inner),
        AtomExpr::And(terms) => terms.iter().all(|t| atom_matches(target, idx, t)),
        AtomExpr::Or(terms) => terms.iter().any(|t| atom_matches(target, idx, t)),
    }
}

fn bond_matches(target: &Molecule, a: NodeIndex, b: NodeIndex, bond: &Bond, expr: &BondExpr) -> bool {
    match expr {
        BondExpr::Implicit => matches!(bond.order, BondOrder::Single | BondOrder::Aromatic),
        BondExpr::Any => true,
        BondExpr::Order(order) => bond.order == *order,
        BondExpr::Ring => target.is_ring_bond(a, b),
        BondExpr::Not(inner) => !bond_matches(target, a, b, bond, inner),
        BondExpr::And(terms) => terms.iter().all(|t| bond_matches(target, a, b, bond, t)),
        BondExpr::Or(terms) => terms.iter().any(|t| bond_matches(target, a, b, bond, t)),
    }
}

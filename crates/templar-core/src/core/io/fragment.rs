use super::labels::{map_labels, strip_map_labels};
use crate::core::models::molecule::Molecule;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("Symbol table has {found} entries for a molecule of {expected} atoms")]
    SymbolCount { expected: usize, found: usize },
    #[error("Atom index {index} is out of range")]
    AtomOutOfRange { index: usize },
    #[error("Fragment selects no atoms")]
    EmptyFragment,
}

/// Map label to its position in some reference text, used to order atoms
/// that are otherwise indistinguishable.
pub type LabelOrder = HashMap<u32, usize>;

/// Writes the sub-structure induced by `atoms` as pattern text.
///
/// Each atom is written with its entry from `symbols` (indexed by atom
/// index, one entry per atom of `mol`) and every bond symbol is written
/// explicitly. The output depends only on the selected atoms, their bonds and
/// their label-stripped symbols, so two inputs that differ only in atom order
/// or map numbering produce text that differs at most in its labels.
pub fn write_fragment(
    mol: &Molecule,
    atoms: &BTreeSet<NodeIndex>,
    symbols: &[String],
) -> Result<String, WriteError> {
    write_fragment_ordered(mol, atoms, symbols, &LabelOrder::new())
}

/// Like [`write_fragment`], but atoms that stay tied after ranking are
/// ordered by where their map label sits in `label_order`. Labels missing
/// from `label_order` sort last.
pub fn write_fragment_ordered(
    mol: &Molecule,
    atoms: &BTreeSet<NodeIndex>,
    symbols: &[String],
    label_order: &LabelOrder,
) -> Result<String, WriteError> {
    if symbols.len() != mol.atom_count() {
        return Err(WriteError::SymbolCount {
            expected: mol.atom_count(),
            found: symbols.len(),
        });
    }
    if let Some(bad) = atoms.iter().find(|i| i.index() >= mol.atom_count()) {
        return Err(WriteError::AtomOutOfRange { index: bad.index() });
    }
    if atoms.is_empty() {
        return Err(WriteError::EmptyFragment);
    }

    let ranks = rank_atoms(mol, atoms, symbols, label_order);
    let neighbors: HashMap<NodeIndex, Vec<(NodeIndex, char)>> = atoms
        .iter()
        .map(|&a| {
            let mut list: Vec<(NodeIndex, char)> = mol
                .bonds_of(a)
                .filter(|(n, _)| atoms.contains(n))
                .map(|(n, bond)| (n, bond.order.symbol()))
                .collect();
            list.sort_by_key(|(n, _)| ranks[n]);
            (a, list)
        })
        .collect();

    let mut by_rank: Vec<NodeIndex> = atoms.iter().copied().collect();
    by_rank.sort_by_key(|a| ranks[a]);

    let mut tree = SpanningTree::default();
    let mut roots = Vec::new();
    for &start in &by_rank {
        if !tree.visited.contains(&start) {
            roots.push(start);
            tree.visit(start, None, &neighbors);
        }
    }

    let mut writer = TextWriter {
        symbols,
        tree: &tree,
        out: String::new(),
        open_digits: HashMap::new(),
        free_digits: BTreeSet::new(),
        next_digit: 1,
    };
    for (i, &root) in roots.iter().enumerate() {
        if i > 0 {
            writer.out.push('.');
        }
        writer.write_atom(root);
    }
    Ok(writer.out)
}

/// Dense ranks from label-stripped symbols and subset degree, refined by
/// neighbor ranks until the partition stops splitting. Remaining ties are
/// split by `label_order` and refined again, then broken by index.
fn rank_atoms(
    mol: &Molecule,
    atoms: &BTreeSet<NodeIndex>,
    symbols: &[String],
    label_order: &LabelOrder,
) -> HashMap<NodeIndex, usize> {
    let base: HashMap<NodeIndex, (String, usize)> = atoms
        .iter()
        .map(|&a| {
            let degree = mol.neighbors(a).filter(|n| atoms.contains(n)).count();
            (a, (strip_map_labels(&symbols[a.index()]), degree))
        })
        .collect();
    let mut classes = refine(mol, atoms, dense_rank(&base));

    if !label_order.is_empty() {
        let hinted: HashMap<NodeIndex, (usize, usize)> = atoms
            .iter()
            .map(|&a| {
                let position = map_labels(&symbols[a.index()])
                    .first()
                    .and_then(|label| label_order.get(label))
                    .copied()
                    .unwrap_or(usize::MAX);
                (a, (classes[&a], position))
            })
            .collect();
        classes = refine(mol, atoms, dense_rank(&hinted));
    }

    let mut order: Vec<NodeIndex> = atoms.iter().copied().collect();
    order.sort_by_key(|a| (classes[a], a.index()));
    order.into_iter().enumerate().map(|(rank, a)| (a, rank)).collect()
}

/// Splits classes by the sorted classes of bonded neighbors until stable.
fn refine(
    mol: &Molecule,
    atoms: &BTreeSet<NodeIndex>,
    mut classes: HashMap<NodeIndex, usize>,
) -> HashMap<NodeIndex, usize> {
    let mut class_count = count_classes(&classes);
    loop {
        let keys: HashMap<NodeIndex, (usize, Vec<(usize, char)>)> = atoms
            .iter()
            .map(|&a| {
                let mut around: Vec<(usize, char)> = mol
                    .bonds_of(a)
                    .filter(|(n, _)| atoms.contains(n))
                    .map(|(n, bond)| (classes[&n], bond.order.symbol()))
                    .collect();
                around.sort();
                (a, (classes[&a], around))
            })
            .collect();
        let refined = dense_rank(&keys);
        let refined_count = count_classes(&refined);
        if refined_count == class_count {
            return classes;
        }
        classes = refined;
        class_count = refined_count;
    }
}

fn dense_rank<K: Ord + Clone>(keys: &HashMap<NodeIndex, K>) -> HashMap<NodeIndex, usize> {
    let distinct: BTreeMap<K, usize> = keys
        .values()
        .cloned()
        .collect::<BTreeSet<K>>()
        .into_iter()
        .enumerate()
        .map(|(i, k)| (k, i))
        .collect();
    keys.iter().map(|(&a, k)| (a, distinct[k])).collect()
}

fn count_classes(classes: &HashMap<NodeIndex, usize>) -> usize {
    classes.values().collect::<HashSet<_>>().len()
}

#[derive(Default)]
struct SpanningTree {
    visited: HashSet<NodeIndex>,
    children: HashMap<NodeIndex, Vec<(NodeIndex, char)>>,
    // Ring bonds in discovery order, as (opening atom, closing atom, symbol).
    ring_bonds: Vec<(NodeIndex, NodeIndex, char)>,
    seen_edges: HashSet<(NodeIndex, NodeIndex)>,
}

impl SpanningTree {
    fn visit(
        &mut self,
        atom: NodeIndex,
        parent: Option<NodeIndex>,
        neighbors: &HashMap<NodeIndex, Vec<(NodeIndex, char)>>,
    ) {
        self.visited.insert(atom);
        for &(next, symbol) in neighbors.get(&atom).map(Vec::as_slice).unwrap_or(&[]) {
            if Some(next) == parent {
                continue;
            }
            let edge = (atom.min(next), atom.max(next));
            if self.visited.contains(&next) {
                if self.seen_edges.insert(edge) {
                    self.ring_bonds.push((next, atom, symbol));
                }
                continue;
            }
            self.seen_edges.insert(edge);
            self.children.entry(atom).or_default().push((next, symbol));
            self.visit(next, Some(atom), neighbors);
        }
    }
}

struct TextWriter<'a> {
    symbols: &'a [String],
    tree: &'a SpanningTree,
    out: String,
    open_digits: HashMap<(NodeIndex, NodeIndex), u32>,
    free_digits: BTreeSet<u32>,
    next_digit: u32,
}

impl TextWriter<'_> {
    fn take_digit(&mut self) -> u32 {
        match self.free_digits.pop_first() {
            Some(d) => d,
            None => {
                let d = self.next_digit;
                self.next_digit += 1;
                d
            }
        }
    }

    fn push_digit(&mut self, digit: u32) {
        if digit < 10 {
            self.out.push_str(&digit.to_string());
        } else {
            self.out.push_str(&format!("%{digit}"));
        }
    }

    fn write_atom(&mut self, atom: NodeIndex) {
        self.out.push_str(&self.symbols[atom.index()]);

        let tree = self.tree;
        for &(opener, closer, symbol) in &tree.ring_bonds {
            if closer == atom {
                if let Some(digit) = self.open_digits.remove(&(opener, closer)) {
                    self.out.push(symbol);
                    self.push_digit(digit);
                    self.free_digits.insert(digit);
                }
            }
        }
        for &(opener, closer, _) in &tree.ring_bonds {
            if opener == atom {
                let digit = self.take_digit();
                self.open_digits.insert((opener, closer), digit);
                self.push_digit(digit);
            }
        }

        let children = tree.children.get(&atom).map(Vec::as_slice).unwrap_or(&[]);
        for (i, &(child, symbol)) in children.iter().enumerate() {
            let last = i + 1 == children.len();
            if !last {
                self.out.push('(');
            }
            self.out.push(symbol);
            self.write_atom(child);
            if !last {
                self.out.push(')');
            }
        }
    }
}

use crate::core::models::atom::Atom;
use crate::core::models::element;
use crate::core::models::molecule::Molecule;
use crate::core::models::reaction::ReactionRecord;
use crate::core::models::topology::BondOrder;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("Empty molecule text")]
    Empty,
    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    #[error("Unknown element '{symbol}' at position {pos}")]
    UnknownElement { pos: usize, symbol: String },
    #[error("Bracket atom opened at position {pos} is never closed")]
    UnclosedBracket { pos: usize },
    #[error("Unmatched parenthesis at position {pos}")]
    UnmatchedParen { pos: usize },
    #[error("Ring bond {digit} is never closed")]
    UnclosedRing { digit: u16 },
    #[error("Bond at position {pos} has no preceding atom")]
    DanglingBond { pos: usize },
    #[error("Invalid number at position {pos}")]
    InvalidNumber { pos: usize },
    #[error("Reaction text must have exactly three '>'-separated sections, found {found}")]
    ReactionSections { found: usize },
}

/// Parses a reaction in `reactants>agents>products` form. Every
/// dot-separated component becomes its own molecule.
pub fn parse_reaction(text: &str) -> Result<ReactionRecord, ReadError> {
    let sections: Vec<&str> = text.trim().split('>').collect();
    if sections.len() != 3 {
        return Err(ReadError::ReactionSections {
            found: sections.len(),
        });
    }
    Ok(ReactionRecord {
        reactants: parse_side(sections[0])?,
        agents: parse_side(sections[1])?,
        products: parse_side(sections[2])?,
    })
}

fn parse_side(text: &str) -> Result<Vec<Molecule>, ReadError> {
    text.split('.')
        .filter(|part| !part.is_empty())
        .map(parse_smiles)
        .collect()
}

/// Parses a single molecule. Implicit hydrogens are left at zero for
/// unbracketed atoms until [`sanitize`](super::sanitize::sanitize) runs.
pub fn parse_smiles(text: &str) -> Result<Molecule, ReadError> {
    SmilesReader::new(text).read()
}

struct SmilesReader {
    chars: Vec<char>,
    pos: usize,
    mol: Molecule,
    prev: Option<NodeIndex>,
    pending_bond: Option<(BondOrder, usize)>,
    branches: Vec<(NodeIndex, usize)>,
    rings: HashMap<u16, (NodeIndex, Option<BondOrder>)>,
}

impl SmilesReader {
    fn new(text: &str) -> Self {
        Self {
            chars: text.trim().chars().collect(),
            pos: 0,
            mol: Molecule::new(),
            prev: None,
            pending_bond: None,
            branches: Vec::new(),
            rings: HashMap::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn read(mut self) -> Result<Molecule, ReadError> {
        if self.chars.is_empty() {
            return Err(ReadError::Empty);
        }
        while let Some(c) = self.peek() {
            match c {
                '(' => {
                    let prev = self.prev.ok_or(ReadError::UnexpectedChar { pos: self.pos, ch: c })?;
                    self.branches.push((prev, self.pos));
                    self.pos += 1;
                }
                ')' => {
                    let (atom, _) = self
                        .branches
                        .pop()
                        .ok_or(ReadError::UnmatchedParen { pos: self.pos })?;
                    self.prev = Some(atom);
                    self.pos += 1;
                }
                '-' | '=' | '#' | ':' | '/' | '\\' => {
                    if self.prev.is_none() {
                        return Err(ReadError::DanglingBond { pos: self.pos });
                    }
                    if let Some(order) = BondOrder::from_symbol(c) {
                        self.pending_bond = Some((order, self.pos));
                    }
                    self.pos += 1;
                }
                '.' => {
                    self.prev = None;
                    self.pos += 1;
                }
                '%' | '0'..='9' => self.read_ring_closure()?,
                '[' => {
                    let atom = self.read_bracket_atom()?;
                    self.attach(atom);
                }
                _ => {
                    let atom = self.read_organic_atom()?;
                    self.attach(atom);
                }
            }
        }
        if let Some((_, pos)) = self.branches.last() {
            return Err(ReadError::UnmatchedParen { pos: *pos });
        }
        if let Some((_, pos)) = self.pending_bond {
            return Err(ReadError::DanglingBond { pos });
        }
        if let Some(digit) = self.rings.keys().min() {
            return Err(ReadError::UnclosedRing { digit: *digit });
        }
        Ok(self.mol)
    }

    fn default_order(&self, a: NodeIndex, b: NodeIndex) -> BondOrder {
        if self.mol.atom(a).is_aromatic && self.mol.atom(b).is_aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn attach(&mut self, atom: Atom) {
        let idx = self.mol.add_atom(atom);
        if let Some(prev) = self.prev {
            let order = match self.pending_bond.take() {
                Some((order, _)) => order,
                None => self.default_order(prev, idx),
            };
            self.mol.add_bond(prev, idx, order);
        }
        self.pending_bond = None;
        self.prev = Some(idx);
    }

    fn read_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .ok()
    }

    fn read_ring_closure(&mut self) -> Result<(), ReadError> {
        let start = self.pos;
        let current = self
            .prev
            .ok_or(ReadError::UnexpectedChar { pos: start, ch: self.chars[start] })?;
        let digit = if self.peek() == Some('%') {
            self.pos += 1;
            let first = self.pos;
            let mut value = 0u16;
            for _ in 0..2 {
                match self.peek().and_then(|c| c.to_digit(10)) {
                    Some(d) => {
                        value = value * 10 + d as u16;
                        self.pos += 1;
                    }
                    None => return Err(ReadError::InvalidNumber { pos: first }),
                }
            }
            value
        } else {
            let d = self.chars[start].to_digit(10).unwrap_or(0) as u16;
            self.pos += 1;
            d
        };
        let bond = self.pending_bond.take().map(|(order, _)| order);
        match self.rings.remove(&digit) {
            Some((partner, open_bond)) => {
                let order = bond
                    .or(open_bond)
                    .unwrap_or_else(|| self.default_order(partner, current));
                self.mol.add_bond(partner, current, order);
            }
            None => {
                self.rings.insert(digit, (current, bond));
            }
        }
        Ok(())
    }

    fn read_organic_atom(&mut self) -> Result<Atom, ReadError> {
        let start = self.pos;
        let c = self.chars[start];
        let next = self.chars.get(start + 1).copied();
        let (atomic_num, aromatic, width) = match (c, next) {
            ('C', Some('l')) => (17, false, 2),
            ('B', Some('r')) => (35, false, 2),
            ('B', _) => (5, false, 1),
            ('C', _) => (6, false, 1),
            ('N', _) => (7, false, 1),
            ('O', _) => (8, false, 1),
            ('P', _) => (15, false, 1),
            ('S', _) => (16, false, 1),
            ('F', _) => (9, false, 1),
            ('I', _) => (53, false, 1),
            ('b', _) => (5, true, 1),
            ('c', _) => (6, true, 1),
            ('n', _) => (7, true, 1),
            ('o', _) => (8, true, 1),
            ('p', _) => (15, true, 1),
            ('s', _) => (16, true, 1),
            ('*', _) => (0, false, 1),
            _ => return Err(ReadError::UnexpectedChar { pos: start, ch: c }),
        };
        self.pos += width;
        Ok(Atom {
            is_aromatic: aromatic,
            ..Atom::new(atomic_num)
        })
    }

    fn read_bracket_atom(&mut self) -> Result<Atom, ReadError> {
        let open = self.pos;
        self.pos += 1;
        let mut atom = Atom {
            bracketed: true,
            ..Atom::default()
        };

        if let Some(isotope) = self.read_number() {
            atom.isotope = u16::try_from(isotope).map_err(|_| ReadError::InvalidNumber { pos: open + 1 })?;
        }

        let (atomic_num, aromatic) = self.read_bracket_element()?;
        atom.atomic_num = atomic_num;
        atom.is_aromatic = aromatic;

        while self.peek() == Some('@') {
            self.pos += 1;
        }

        if self.peek() == Some('H') {
            self.pos += 1;
            atom.hydrogen_count = match self.read_number() {
                Some(n) => u8::try_from(n).map_err(|_| ReadError::InvalidNumber { pos: self.pos })?,
                None => 1,
            };
        }

        if let Some(sign @ ('+' | '-')) = self.peek() {
            let unit: i8 = if sign == '+' { 1 } else { -1 };
            self.pos += 1;
            let magnitude = match self.read_number() {
                Some(n) => i8::try_from(n).map_err(|_| ReadError::InvalidNumber { pos: self.pos })?,
                None => {
                    let mut count: i8 = 1;
                    while self.peek() == Some(sign) {
                        count = count
                            .checked_add(1)
                            .ok_or(ReadError::InvalidNumber { pos: self.pos })?;
                        self.pos += 1;
                    }
                    count
                }
            };
            atom.formal_charge = unit * magnitude;
        }

        if self.peek() == Some(':') {
            self.pos += 1;
            let map = self
                .read_number()
                .ok_or(ReadError::InvalidNumber { pos: self.pos })?;
            atom = atom.with_map_number(map);
        }

        match self.peek() {
            Some(']') => {
                self.pos += 1;
                Ok(atom)
            }
            Some(ch) => Err(ReadError::UnexpectedChar { pos: self.pos, ch }),
            None => Err(ReadError::UnclosedBracket { pos: open }),
        }
    }

    fn read_bracket_element(&mut self) -> Result<(u8, bool), ReadError> {
        let start = self.pos;
        let c = self.peek().ok_or(ReadError::UnclosedBracket { pos: start })?;
        if c == '*' {
            self.pos += 1;
            return Ok((0, false));
        }
        if c.is_ascii_lowercase() {
            for width in [2, 1] {
                let text: String = self.chars.iter().skip(start).take(width).collect();
                if text.chars().count() != width {
                    continue;
                }
                let mut upper = text.clone();
                upper[..1].make_ascii_uppercase();
                if let Some(z) = element::atomic_number(&upper).filter(|&z| element::can_be_aromatic(z)) {
                    self.pos += width;
                    return Ok((z, true));
                }
            }
            return Err(ReadError::UnknownElement {
                pos: start,
                symbol: c.to_string(),
            });
        }
        if c.is_ascii_uppercase() {
            if let Some(&next) = self.chars.get(start + 1).filter(|n| n.is_ascii_lowercase()) {
                let pair: String = [c, next].iter().collect();
                if let Some(z) = element::atomic_number(&pair) {
                    self.pos += 2;
                    return Ok((z, false));
                }
            }
            let single = c.to_string();
            if let Some(z) = element::atomic_number(&single) {
                self.pos += 1;
                return Ok((z, false));
            }
            return Err(ReadError::UnknownElement {
                pos: start,
                symbol: single,
            });
        }
        Err(ReadError::UnexpectedChar { pos: start, ch: c })
    }
}

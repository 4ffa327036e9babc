use crate::core::models::element;
use crate::core::models::topology::BondOrder;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Empty pattern")]
    Empty,
    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    #[error("Unknown element '{symbol}' at position {pos}")]
    UnknownElement { pos: usize, symbol: String },
    #[error("Unexpected end of pattern at position {pos}")]
    UnexpectedEnd { pos: usize },
    #[error("Unmatched parenthesis at position {pos}")]
    UnmatchedParen { pos: usize },
    #[error("Ring bond {digit} is never closed")]
    UnclosedRing { digit: u16 },
    #[error("Bond at position {pos} has no atom to attach to")]
    DanglingBond { pos: usize },
    #[error("Invalid number at position {pos}")]
    InvalidNumber { pos: usize },
    #[error("Reaction pattern must have exactly three '>'-separated sections, found {found}")]
    ReactionSections { found: usize },
    #[error("The {side} side of the reaction pattern is empty")]
    EmptySide { side: &'static str },
    #[error("Map label {label} appears more than once on the {side} side")]
    DuplicateMapLabel { label: u32, side: &'static str },
}

/// Atom predicate of a pattern atom.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomExpr {
    Any,
    /// Element with explicit aromaticity, as written with a symbol.
    Element { atomic_num: u8, aromatic: bool },
    /// Element regardless of aromaticity (`#n`).
    AtomicNum(u8),
    Aromatic(bool),
    Isotope(u16),
    TotalHCount(u8),
    Degree(u8),
    Charge(i8),
    InRing(bool),
    /// `$(...)`: the atom is the first atom of a match of the inner pattern.
    Recursive(Box<QueryMolecule>),
    Not(Box<AtomExpr>),
    And(Vec<AtomExpr>),
    Or(Vec<AtomExpr>),
}

/// Bond predicate of a pattern bond.
#[derive(Debug, Clone, PartialEq)]
pub enum BondExpr {
    /// No bond symbol written: single or aromatic.
    Implicit,
    Any,
    Order(BondOrder),
    Ring,
    Not(Box<BondExpr>),
    And(Vec<BondExpr>),
    Or(Vec<BondExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryAtom {
    pub expr: AtomExpr,
    pub map_number: Option<u32>,
}

/// A parsed pattern: a graph of atom predicates joined by bond predicates.
#[derive(Debug, Clone, Default)]
pub struct QueryMolecule {
    graph: UnGraph<QueryAtom, BondExpr>,
}

impl PartialEq for QueryMolecule {
    fn eq(&self, other: &Self) -> bool {
        self.graph.node_weights().eq(other.graph.node_weights())
            && self.graph.edge_count() == other.graph.edge_count()
            && self.graph.edge_indices().all(|e| {
                let (a, b) = match self.graph.edge_endpoints(e) {
                    Some(ends) => ends,
                    None => return false,
                };
                other
                    .graph
                    .find_edge(a, b)
                    .is_some_and(|oe| other.graph[oe] == self.graph[e])
            })
    }
}

impl QueryMolecule {
    pub fn graph(&self) -> &UnGraph<QueryAtom, BondExpr> {
        &self.graph
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn atom(&self, idx: NodeIndex) -> &QueryAtom {
        &self.graph[idx]
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<&BondExpr> {
        self.graph.find_edge(a, b).map(|e| &self.graph[e])
    }

    pub fn map_labels(&self) -> impl Iterator<Item = u32> + '_ {
        self.graph.node_weights().filter_map(|a| a.map_number)
    }
}

/// Both sides of a reaction pattern (`reactants>>products`).
#[derive(Debug, Clone)]
pub struct ReactionPattern {
    pub reactants: QueryMolecule,
    pub products: QueryMolecule,
}

/// Parses and checks a reaction pattern: both sides must be non-empty
/// patterns and no map label may repeat within one side.
pub fn parse_reaction_pattern(text: &str) -> Result<ReactionPattern, QueryError> {
    let sections: Vec<&str> = text.trim().split('>').collect();
    if sections.len() != 3 {
        return Err(QueryError::ReactionSections {
            found: sections.len(),
        });
    }
    let reactants = parse_side(sections[0], "reactant")?;
    let products = parse_side(sections[2], "product")?;
    Ok(ReactionPattern {
        reactants,
        products,
    })
}

fn parse_side(text: &str, side: &'static str) -> Result<QueryMolecule, QueryError> {
    if text.trim().is_empty() {
        return Err(QueryError::EmptySide { side });
    }
    let query = parse_query(text)?;
    let mut seen = HashSet::new();
    for label in query.map_labels() {
        if !seen.insert(label) {
            return Err(QueryError::DuplicateMapLabel { label, side });
        }
    }
    Ok(query)
}

pub fn parse_query(text: &str) -> Result<QueryMolecule, QueryError> {
    let mut parser = QueryParser::new(text);
    let query = parser.parse_molecule()?;
    if query.atom_count() == 0 {
        return Err(QueryError::Empty);
    }
    Ok(query)
}

struct QueryParser {
    chars: Vec<char>,
    pos: usize,
}

impl QueryParser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.trim().chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn unexpected(&self) -> QueryError {
        match self.peek() {
            Some(ch) => QueryError::UnexpectedChar { pos: self.pos, ch },
            None => QueryError::UnexpectedEnd { pos: self.pos },
        }
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

    fn read_small(&mut self) -> Result<Option<u8>, QueryError> {
        let pos = self.pos;
        match self.read_number() {
            Some(n) => u8::try_from(n)
                .map(Some)
                .map_err(|_| QueryError::InvalidNumber { pos }),
            None => Ok(None),
        }
    }

    fn parse_molecule(&mut self) -> Result<QueryMolecule, QueryError> {
        let mut graph: UnGraph<QueryAtom, BondExpr> = UnGraph::default();
        let mut current: Option<NodeIndex> = None;
        let mut pending: Option<(BondExpr, usize)> = None;
        // `None` marks a grouping parenthesis around whole components.
        let mut stack: Vec<(Option<NodeIndex>, usize)> = Vec::new();
        let mut rings: HashMap<u16, (NodeIndex, Option<BondExpr>)> = HashMap::new();

        while let Some(c) = self.peek() {
            match c {
                '(' => {
                    stack.push((current, self.pos));
                    self.pos += 1;
                }
                ')' => {
                    let (top, _) = stack
                        .pop()
                        .ok_or(QueryError::UnmatchedParen { pos: self.pos })?;
                    if top.is_some() {
                        current = top;
                    }
                    self.pos += 1;
                }
                '.' => {
                    current = None;
                    self.pos += 1;
                }
                '-' | '=' | '#' | ':' | '~' | '@' | '!' | '/' | '\\' => {
                    if current.is_none() {
                        return Err(QueryError::DanglingBond { pos: self.pos });
                    }
                    let pos = self.pos;
                    pending = Some((self.parse_bond_low()?, pos));
                }
                '%' | '0'..='9' => {
                    let atom = current.ok_or_else(|| self.unexpected())?;
                    let digit = self.read_ring_digit()?;
                    let bond = pending.take().map(|(b, _)| b);
                    match rings.remove(&digit) {
                        Some((partner, open)) => {
                            let expr = bond.or(open).unwrap_or(BondExpr::Implicit);
                            graph.add_edge(partner, atom, expr);
                        }
                        None => {
                            rings.insert(digit, (atom, bond));
                        }
                    }
                }
                _ => {
                    let atom = if c == '[' {
                        self.parse_bracket_atom()?
                    } else {
                        self.parse_bare_atom()?
                    };
                    let idx = graph.add_node(atom);
                    if let Some(prev) = current {
                        let expr = pending.take().map(|(b, _)| b).unwrap_or(BondExpr::Implicit);
                        graph.add_edge(prev, idx, expr);
                    } else if let Some((_, pos)) = pending {
                        return Err(QueryError::DanglingBond { pos });
                    }
                    pending = None;
                    current = Some(idx);
                }
            }
        }
        if let Some((_, pos)) = stack.last() {
            return Err(QueryError::UnmatchedParen { pos: *pos });
        }
        if let Some((_, pos)) = pending {
            return Err(QueryError::DanglingBond { pos });
        }
        if let Some(digit) = rings.keys().min() {
            return Err(QueryError::UnclosedRing { digit: *digit });
        }
        Ok(QueryMolecule { graph })
    }

    fn read_ring_digit(&mut self) -> Result<u16, QueryError> {
        if self.peek() == Some('%') {
            self.pos += 1;
            let start = self.pos;
            let mut value = 0u16;
            for _ in 0..2 {
                let d = self
                    .peek()
                    .and_then(|c| c.to_digit(10))
                    .ok_or(QueryError::InvalidNumber { pos: start })?;
                value = value * 10 + d as u16;
                self.pos += 1;
            }
            return Ok(value);
        }
        let d = self.peek().and_then(|c| c.to_digit(10)).ok_or_else(|| self.unexpected())?;
        self.pos += 1;
        Ok(d as u16)
    }

    fn parse_bare_atom(&mut self) -> Result<QueryAtom, QueryError> {
        let c = self.peek().ok_or_else(|| self.unexpected())?;
        let next = self.peek_at(1);
        let (expr, width) = match (c, next) {
            ('C', Some('l')) => (element_expr(17, false), 2),
            ('B', Some('r')) => (element_expr(35, false), 2),
            ('B', _) => (element_expr(5, false), 1),
            ('C', _) => (element_expr(6, false), 1),
            ('N', _) => (element_expr(7, false), 1),
            ('O', _) => (element_expr(8, false), 1),
            ('P', _) => (element_expr(15, false), 1),
            ('S', _) => (element_expr(16, false), 1),
            ('F', _) => (element_expr(9, false), 1),
            ('I', _) => (element_expr(53, false), 1),
            ('b', _) => (element_expr(5, true), 1),
            ('c', _) => (element_expr(6, true), 1),
            ('n', _) => (element_expr(7, true), 1),
            ('o', _) => (element_expr(8, true), 1),
            ('p', _) => (element_expr(15, true), 1),
            ('s', _) => (element_expr(16, true), 1),
            ('*', _) => (AtomExpr::Any, 1),
            ('A', _) => (AtomExpr::Aromatic(false), 1),
            ('a', _) => (AtomExpr::Aromatic(true), 1),
            _ => return Err(self.unexpected()),
        };
        self.pos += width;
        Ok(QueryAtom {
            expr,
            map_number: None,
        })
    }

    fn parse_bracket_atom(&mut self) -> Result<QueryAtom, QueryError> {
        self.pos += 1;
        let mut first = true;
        let expr = self.parse_atom_low(&mut first)?;
        let mut map_number = None;
        if self.peek() == Some(':') {
            self.pos += 1;
            let pos = self.pos;
            let label = self.read_number().ok_or(QueryError::InvalidNumber { pos })?;
            map_number = (label != 0).then_some(label);
        }
        if self.peek() != Some(']') {
            return Err(self.unexpected());
        }
        self.pos += 1;
        Ok(QueryAtom { expr, map_number })
    }

    fn parse_atom_low(&mut self, first: &mut bool) -> Result<AtomExpr, QueryError> {
        let mut terms = vec![self.parse_atom_or(first)?];
        while self.peek() == Some(';') {
            self.pos += 1;
            terms.push(self.parse_atom_or(first)?);
        }
        Ok(collapse(terms, AtomExpr::And))
    }

    fn parse_atom_or(&mut self, first: &mut bool) -> Result<AtomExpr, QueryError> {
        let mut terms = vec![self.parse_atom_and(first)?];
        while self.peek() == Some(',') {
            self.pos += 1;
            terms.push(self.parse_atom_and(first)?);
        }
        Ok(collapse(terms, AtomExpr::Or))
    }

    fn parse_atom_and(&mut self, first: &mut bool) -> Result<AtomExpr, QueryError> {
        let mut terms = vec![self.parse_atom_unary(first)?];
        loop {
            match self.peek() {
                Some('&') => {
                    self.pos += 1;
                    terms.push(self.parse_atom_unary(first)?);
                }
                Some(']' | ':' | ',' | ';') | None => break,
                Some(_) => terms.push(self.parse_atom_unary(first)?),
            }
        }
        Ok(collapse(terms, AtomExpr::And))
    }

    fn parse_atom_unary(&mut self, first: &mut bool) -> Result<AtomExpr, QueryError> {
        if self.peek() == Some('!') {
            self.pos += 1;
            let inner = self.parse_atom_unary(first)?;
            return Ok(AtomExpr::Not(Box::new(inner)));
        }
        let expr = self.parse_atom_primitive(*first)?;
        *first = false;
        Ok(expr)
    }

    fn parse_atom_primitive(&mut self, first: bool) -> Result<AtomExpr, QueryError> {
        let start = self.pos;
        let c = self.peek().ok_or(QueryError::UnexpectedEnd { pos: start })?;
        match c {
            '*' => {
                self.pos += 1;
                Ok(AtomExpr::Any)
            }
            '#' => {
                self.pos += 1;
                let n = self.read_small()?.ok_or(QueryError::InvalidNumber { pos: start + 1 })?;
                Ok(AtomExpr::AtomicNum(n))
            }
            '0'..='9' => {
                let n = self.read_number().unwrap_or(0);
                let isotope = u16::try_from(n).map_err(|_| QueryError::InvalidNumber { pos: start })?;
                Ok(AtomExpr::Isotope(isotope))
            }
            '$' => {
                self.pos += 1;
                if self.peek() != Some('(') {
                    return Err(self.unexpected());
                }
                let open = self.pos;
                let mut depth = 0usize;
                let mut end = None;
                for (i, &ch) in self.chars.iter().enumerate().skip(open) {
                    match ch {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                end = Some(i);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                let end = end.ok_or(QueryError::UnmatchedParen { pos: open })?;
                let inner: String = self.chars[open + 1..end].iter().collect();
                let query = parse_query(&inner)?;
                self.pos = end + 1;
                Ok(AtomExpr::Recursive(Box::new(query)))
            }
            '+' | '-' => {
                self.pos += 1;
                let unit: i8 = if c == '+' { 1 } else { -1 };
                let magnitude = match self.read_small()? {
                    Some(n) => i8::try_from(n).map_err(|_| QueryError::InvalidNumber { pos: start })?,
                    None => {
                        let mut count = 1i8;
                        while self.peek() == Some(c) {
                            count = count
                                .checked_add(1)
                                .ok_or(QueryError::InvalidNumber { pos: start })?;
                            self.pos += 1;
                        }
                        count
                    }
                };
                Ok(AtomExpr::Charge(unit * magnitude))
            }
            '@' => {
                while self.peek() == Some('@') {
                    self.pos += 1;
                }
                Ok(AtomExpr::Any)
            }
            'a' => {
                if let Some(expr) = self.try_aromatic_element()? {
                    return Ok(expr);
                }
                self.pos += 1;
                Ok(AtomExpr::Aromatic(true))
            }
            c if c.is_ascii_lowercase() => self
                .try_aromatic_element()?
                .ok_or(QueryError::UnknownElement {
                    pos: start,
                    symbol: c.to_string(),
                }),
            c if c.is_ascii_uppercase() => self.parse_uppercase(first),
            _ => Err(self.unexpected()),
        }
    }

    fn try_aromatic_element(&mut self) -> Result<Option<AtomExpr>, QueryError> {
        for width in [2usize, 1] {
            let text: String = self.chars.iter().skip(self.pos).take(width).collect();
            if text.chars().count() != width || !text.chars().all(|c| c.is_ascii_lowercase()) {
                continue;
            }
            let mut upper = text.clone();
            upper[..1].make_ascii_uppercase();
            if let Some(z) = element::atomic_number(&upper).filter(|&z| element::can_be_aromatic(z)) {
                self.pos += width;
                return Ok(Some(element_expr(z, true)));
            }
        }
        Ok(None)
    }

    fn parse_uppercase(&mut self, first: bool) -> Result<AtomExpr, QueryError> {
        let start = self.pos;
        let c = self.chars[start];
        if let Some(next) = self.peek_at(1).filter(|n| n.is_ascii_lowercase()) {
            let pair: String = [c, next].iter().collect();
            if let Some(z) = element::atomic_number(&pair) {
                self.pos += 2;
                return Ok(element_expr(z, false));
            }
        }
        match c {
            'H' if first => {
                self.pos += 1;
                Ok(element_expr(1, false))
            }
            'H' => {
                self.pos += 1;
                Ok(AtomExpr::TotalHCount(self.read_small()?.unwrap_or(1)))
            }
            'D' => {
                self.pos += 1;
                Ok(AtomExpr::Degree(self.read_small()?.unwrap_or(1)))
            }
            'R' => {
                self.pos += 1;
                let in_ring = self.read_small()?.is_none_or(|n| n > 0);
                Ok(AtomExpr::InRing(in_ring))
            }
            'A' => {
                self.pos += 1;
                Ok(AtomExpr::Aromatic(false))
            }
            _ => {
                let symbol = c.to_string();
                let z = element::atomic_number(&symbol)
                    .ok_or(QueryError::UnknownElement { pos: start, symbol })?;
                self.pos += 1;
                Ok(element_expr(z, false))
            }
        }
    }

    fn parse_bond_low(&mut self) -> Result<BondExpr, QueryError> {
        let mut terms = vec![self.parse_bond_or()?];
        while self.peek() == Some(';') {
            self.pos += 1;
            terms.push(self.parse_bond_or()?);
        }
        Ok(collapse(terms, BondExpr::And))
    }

    fn parse_bond_or(&mut self) -> Result<BondExpr, QueryError> {
        let mut terms = vec![self.parse_bond_and()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            terms.push(self.parse_bond_and()?);
        }
        Ok(collapse(terms, BondExpr::Or))
    }

    fn parse_bond_and(&mut self) -> Result<BondExpr, QueryError> {
        let mut terms = vec![self.parse_bond_unary()?];
        loop {
            match self.peek() {
                Some('&') => {
                    self.pos += 1;
                    terms.push(self.parse_bond_unary()?);
                }
                Some('-' | '=' | '#' | ':' | '~' | '@' | '!' | '/' | '\\') => {
                    terms.push(self.parse_bond_unary()?)
                }
                _ => break,
            }
        }
        Ok(collapse(terms, BondExpr::And))
    }

    fn parse_bond_unary(&mut self) -> Result<BondExpr, QueryError> {
        let c = self.peek().ok_or(QueryError::UnexpectedEnd { pos: self.pos })?;
        self.pos += 1;
        match c {
            '!' => Ok(BondExpr::Not(Box::new(self.parse_bond_unary()?))),
            '~' => Ok(BondExpr::Any),
            '@' => Ok(BondExpr::Ring),
            _ => BondOrder::from_symbol(c).map(BondExpr::Order).ok_or(
                QueryError::UnexpectedChar {
                    pos: self.pos - 1,
                    ch: c,
                },
            ),
        }
    }
}

fn element_expr(atomic_num: u8, aromatic: bool) -> AtomExpr {
    AtomExpr::Element {
        atomic_num,
        aromatic,
    }
}

fn collapse<T>(mut terms: Vec<T>, join: fn(Vec<T>) -> T) -> T {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        join(terms)
    }
}

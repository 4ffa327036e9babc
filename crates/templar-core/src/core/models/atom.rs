use super::element;

/// A single atom of a reaction participant.
///
/// Atoms carry only the properties that the extraction pipeline compares or
/// writes back out; connectivity lives in the owning [`Molecule`](super::molecule::Molecule).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Atom {
    /// Atomic number, `0` for the wildcard atom `*`.
    pub atomic_num: u8,
    pub formal_charge: i8,
    /// Mass number, `0` when unspecified.
    pub isotope: u16,
    /// Hydrogens attached to this atom that are not graph nodes.
    pub hydrogen_count: u8,
    pub is_aromatic: bool,
    pub radical_electrons: u8,
    /// Atom-map label; a label of zero in the source text is treated as absent.
    pub map_number: Option<u32>,
    /// Whether the atom was written in bracket form, which fixes its hydrogen count.
    pub bracketed: bool,
}

impl Atom {
    pub fn new(atomic_num: u8) -> Self {
        Self {
            atomic_num,
            ..Default::default()
        }
    }

    pub fn with_map_number(mut self, map_number: u32) -> Self {
        self.map_number = (map_number != 0).then_some(map_number);
        self
    }

    /// Element symbol, lowercase when the atom is aromatic.
    pub fn element_symbol(&self) -> String {
        let symbol = element::symbol(self.atomic_num).unwrap_or("*");
        if self.is_aromatic {
            symbol.to_lowercase()
        } else {
            symbol.to_string()
        }
    }

    /// Signed charge text as it appears inside a bracket atom (`+`, `-2`, ...),
    /// or `None` for a neutral atom.
    pub fn charge_text(&self) -> Option<String> {
        match self.formal_charge {
            0 => None,
            1 => Some("+".to_string()),
            -1 => Some("-".to_string()),
            c if c > 0 => Some(format!("+{c}")),
            c => Some(format!("-{}", -(c as i16))),
        }
    }

    fn needs_brackets(&self) -> bool {
        self.bracketed
            || self.map_number.is_some()
            || self.formal_charge != 0
            || self.isotope != 0
            || self.radical_electrons != 0
            || !(element::is_organic_subset(self.atomic_num) || self.atomic_num == 0)
    }

    /// The atom's own pattern symbol: element, isotope, hydrogen count, charge
    /// and map label, bracketed whenever any of those must be spelled out.
    pub fn literal_symbol(&self) -> String {
        if !self.needs_brackets() {
            return self.element_symbol();
        }
        let mut out = String::from("[");
        if self.isotope != 0 {
            out.push_str(&self.isotope.to_string());
        }
        out.push_str(&self.element_symbol());
        match self.hydrogen_count {
            0 => {}
            1 => out.push('H'),
            n => {
                out.push('H');
                out.push_str(&n.to_string());
            }
        }
        if let Some(charge) = self.charge_text() {
            out.push_str(&charge);
        }
        if let Some(map) = self.map_number {
            out.push(':');
            out.push_str(&map.to_string());
        }
        out.push(']');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_organic_atom_has_bare_symbol() {
        let atom = Atom::new(6);
        assert_eq!(atom.literal_symbol(), "C");
        let cl = Atom::new(17);
        assert_eq!(cl.literal_symbol(), "Cl");
    }

    #[test]
    fn mapped_atom_is_bracketed_with_hydrogens() {
        let atom = Atom {
            hydrogen_count: 3,
            ..Atom::new(6).with_map_number(1)
        };
        assert_eq!(atom.literal_symbol(), "[CH3:1]");
    }

    #[test]
    fn charged_isotope_atom_is_fully_spelled() {
        let atom = Atom {
            isotope: 15,
            formal_charge: 1,
            hydrogen_count: 1,
            ..Atom::new(7)
        };
        assert_eq!(atom.literal_symbol(), "[15NH+]");
    }

    #[test]
    fn aromatic_atoms_are_lowercase() {
        let atom = Atom {
            is_aromatic: true,
            hydrogen_count: 1,
            bracketed: true,
            ..Atom::new(7)
        };
        assert_eq!(atom.literal_symbol(), "[nH]");
    }

    #[test]
    fn metals_are_always_bracketed() {
        assert_eq!(Atom::new(12).literal_symbol(), "[Mg]");
    }

    #[test]
    fn charge_text_covers_multiple_charges() {
        let mut atom = Atom::new(8);
        assert_eq!(atom.charge_text(), None);
        atom.formal_charge = -1;
        assert_eq!(atom.charge_text().as_deref(), Some("-"));
        atom.formal_charge = 2;
        assert_eq!(atom.charge_text().as_deref(), Some("+2"));
        atom.formal_charge = -3;
        assert_eq!(atom.charge_text().as_deref(), Some("-3"));
    }

    #[test]
    fn zero_map_number_is_unmapped() {
        assert_eq!(Atom::new(6).with_map_number(0).map_number, None);
    }
}

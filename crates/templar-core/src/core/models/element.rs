use phf::{Map, phf_map, phf_set};

static ATOMIC_NUMBERS: Map<&'static str, u8> = phf_map! {
    "H" => 1, "He" => 2, "Li" => 3, "Be" => 4, "B" => 5, "C" => 6, "N" => 7, "O" => 8,
    "F" => 9, "Ne" => 10, "Na" => 11, "Mg" => 12, "Al" => 13, "Si" => 14, "P" => 15,
    "S" => 16, "Cl" => 17, "Ar" => 18, "K" => 19, "Ca" => 20, "Sc" => 21, "Ti" => 22,
    "V" => 23, "Cr" => 24, "Mn" => 25, "Fe" => 26, "Co" => 27, "Ni" => 28, "Cu" => 29,
    "Zn" => 30, "Ga" => 31, "Ge" => 32, "As" => 33, "Se" => 34, "Br" => 35, "Kr" => 36,
    "Rb" => 37, "Sr" => 38, "Y" => 39, "Zr" => 40, "Nb" => 41, "Mo" => 42, "Tc" => 43,
    "Ru" => 44, "Rh" => 45, "Pd" => 46, "Ag" => 47, "Cd" => 48, "In" => 49, "Sn" => 50,
    "Sb" => 51, "Te" => 52, "I" => 53, "Xe" => 54, "Cs" => 55, "Ba" => 56, "La" => 57,
    "Ce" => 58, "Pr" => 59, "Nd" => 60, "Pm" => 61, "Sm" => 62, "Eu" => 63, "Gd" => 64,
    "Tb" => 65, "Dy" => 66, "Ho" => 67, "Er" => 68, "Tm" => 69, "Yb" => 70, "Lu" => 71,
    "Hf" => 72, "Ta" => 73, "W" => 74, "Re" => 75, "Os" => 76, "Ir" => 77, "Pt" => 78,
    "Au" => 79, "Hg" => 80, "Tl" => 81, "Pb" => 82, "Bi" => 83, "Po" => 84, "At" => 85,
    "Rn" => 86,
};

// Indexed by atomic number; slot 0 is the wildcard atom.
static SYMBOLS: [&str; 87] = [
    "*", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn",
];

/// Elements that may be written without brackets.
static ORGANIC_SUBSET: phf::Set<u8> = phf_set! {5u8, 6u8, 7u8, 8u8, 9u8, 15u8, 16u8, 17u8, 35u8, 53u8};

/// Elements that may carry a lowercase aromatic symbol.
static AROMATIC_CAPABLE: phf::Set<u8> = phf_set! {5u8, 6u8, 7u8, 8u8, 15u8, 16u8, 33u8, 34u8};

pub fn atomic_number(symbol: &str) -> Option<u8> {
    ATOMIC_NUMBERS.get(symbol).copied()
}

pub fn symbol(atomic_num: u8) -> Option<&'static str> {
    SYMBOLS.get(atomic_num as usize).copied()
}

pub fn is_organic_subset(atomic_num: u8) -> bool {
    ORGANIC_SUBSET.contains(&atomic_num)
}

pub fn can_be_aromatic(atomic_num: u8) -> bool {
    AROMATIC_CAPABLE.contains(&atomic_num)
}

/// Allowed neutral valences, smallest first. Empty for elements without a
/// fixed valence model (metals, noble gases, the wildcard atom).
pub fn default_valences(atomic_num: u8) -> &'static [u8] {
    match atomic_num {
        1 => &[1],
        5 => &[3],
        6 => &[4],
        7 | 15 => &[3, 5],
        8 => &[2],
        16 => &[2, 4, 6],
        9 | 17 | 35 | 53 => &[1],
        14 => &[4],
        34 => &[2, 4, 6],
        33 => &[3, 5],
        _ => &[],
    }
}

/// Valence used when assigning implicit hydrogens to an aromatic atom.
pub fn aromatic_valence(atomic_num: u8) -> Option<u8> {
    match atomic_num {
        5 | 7 | 15 | 33 => Some(3),
        6 => Some(4),
        8 | 16 | 34 => Some(2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_number_and_symbol_agree() {
        for z in 1..=86u8 {
            let sym = symbol(z).unwrap();
            assert_eq!(atomic_number(sym), Some(z), "mismatch for {sym}");
        }
    }

    #[test]
    fn unknown_symbols_are_rejected() {
        assert_eq!(atomic_number("Xx"), None);
        assert_eq!(atomic_number("c"), None);
        assert_eq!(symbol(120), None);
    }

    #[test]
    fn organic_subset_membership() {
        assert!(is_organic_subset(6));
        assert!(is_organic_subset(17));
        assert!(!is_organic_subset(12));
        assert!(!is_organic_subset(1));
    }

    #[test]
    fn nitrogen_has_two_valences() {
        assert_eq!(default_valences(7), &[3, 5]);
        assert!(default_valences(12).is_empty());
    }
}

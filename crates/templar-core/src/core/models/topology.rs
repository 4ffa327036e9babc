use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Pattern-language bond symbol.
    pub fn symbol(&self) -> char {
        match self {
            Self::Single => '-',
            Self::Double => '=',
            Self::Triple => '#',
            Self::Aromatic => ':',
        }
    }

    /// Contribution to the valence of each endpoint. Aromatic bonds count as
    /// one; the extra aromatic electron is accounted for per atom.
    pub fn valence_contribution(&self) -> u8 {
        match self {
            Self::Single | Self::Aromatic => 1,
            Self::Double => 2,
            Self::Triple => 3,
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '-' | '/' | '\\' => Some(Self::Single),
            '=' => Some(Self::Double),
            '#' => Some(Self::Triple),
            ':' => Some(Self::Aromatic),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "-" | "1" | "single" => Ok(Self::Single),
            "=" | "2" | "double" => Ok(Self::Double),
            "#" | "3" | "triple" => Ok(Self::Triple),
            ":" | "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

/// Edge weight of a molecule graph; the endpoints are the edge's nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bond {
    pub order: BondOrder,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self { order }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_order_from_str_parses_valid_strings() {
        assert_eq!("-".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("single".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("=".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("2".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("#".parse::<BondOrder>().unwrap(), BondOrder::Triple);
        assert_eq!("Triple".parse::<BondOrder>().unwrap(), BondOrder::Triple);
        assert_eq!(":".parse::<BondOrder>().unwrap(), BondOrder::Aromatic);
        assert_eq!(
            "aromatic".parse::<BondOrder>().unwrap(),
            BondOrder::Aromatic
        );
    }

    #[test]
    fn bond_order_from_str_rejects_invalid_strings() {
        assert!("".parse::<BondOrder>().is_err());
        assert!("quadruple".parse::<BondOrder>().is_err());
        assert!("~".parse::<BondOrder>().is_err());
    }

    #[test]
    fn symbols_round_trip_through_from_symbol() {
        for order in [
            BondOrder::Single,
            BondOrder::Double,
            BondOrder::Triple,
            BondOrder::Aromatic,
        ] {
            assert_eq!(BondOrder::from_symbol(order.symbol()), Some(order));
        }
    }

    #[test]
    fn directional_bonds_read_as_single() {
        assert_eq!(BondOrder::from_symbol('/'), Some(BondOrder::Single));
        assert_eq!(BondOrder::from_symbol('\\'), Some(BondOrder::Single));
    }

    #[test]
    fn bond_order_display_outputs_expected_strings() {
        assert_eq!(BondOrder::Single.to_string(), "Single");
        assert_eq!(BondOrder::Aromatic.to_string(), "Aromatic");
    }

    #[test]
    fn bond_order_default_is_single() {
        assert_eq!(BondOrder::default(), BondOrder::Single);
        assert_eq!(Bond::default().order, BondOrder::Single);
    }
}

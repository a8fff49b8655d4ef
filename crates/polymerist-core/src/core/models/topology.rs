use super::ids::AtomId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single = 1,
    Double = 2,
    Triple = 3,
    Aromatic = 4,
}

impl BondOrder {
    /// Maps a SMARTS bond symbol onto a concrete order.
    ///
    /// Query-only symbols (`~` any, `/` and `\` directional) collapse to `Single`.
    pub fn from_smarts_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '-' | '~' | '/' | '\\' => Some(Self::Single),
            '=' => Some(Self::Double),
            '#' => Some(Self::Triple),
            ':' => Some(Self::Aromatic),
            _ => None,
        }
    }

    /// Number of CONECT repetitions used to encode this order in PDB output.
    pub fn pdb_multiplicity(self) -> usize {
        match self {
            Self::Single | Self::Aromatic => 1,
            Self::Double => 2,
            Self::Triple => 3,
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
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "Single",
            Self::Double => "Double",
            Self::Triple => "Triple",
            Self::Aromatic => "Aromatic",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1_id: AtomId,
    pub atom2_id: AtomId,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom1_id: AtomId, atom2_id: AtomId, order: BondOrder) -> Self {
        Self {
            atom1_id,
            atom2_id,
            order,
        }
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        self.atom1_id == atom_id || self.atom2_id == atom_id
    }

    /// Returns the atom on the other end of the bond, if `atom_id` is part of it.
    pub fn partner(&self, atom_id: AtomId) -> Option<AtomId> {
        if self.atom1_id == atom_id {
            Some(self.atom2_id)
        } else if self.atom2_id == atom_id {
            Some(self.atom1_id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn smarts_symbols_map_to_orders() {
        assert_eq!(BondOrder::from_smarts_symbol('-'), Some(BondOrder::Single));
        assert_eq!(BondOrder::from_smarts_symbol('~'), Some(BondOrder::Single));
        assert_eq!(BondOrder::from_smarts_symbol('='), Some(BondOrder::Double));
        assert_eq!(BondOrder::from_smarts_symbol('#'), Some(BondOrder::Triple));
        assert_eq!(BondOrder::from_smarts_symbol(':'), Some(BondOrder::Aromatic));
        assert_eq!(BondOrder::from_smarts_symbol('$'), None);
    }

    #[test]
    fn bond_order_from_str_accepts_aliases_and_rejects_garbage() {
        assert_eq!("D".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("aromatic".parse::<BondOrder>().unwrap(), BondOrder::Aromatic);
        assert!("quadruple".parse::<BondOrder>().is_err());
        assert!("".parse::<BondOrder>().is_err());
    }

    #[test]
    fn pdb_multiplicity_follows_order() {
        assert_eq!(BondOrder::Single.pdb_multiplicity(), 1);
        assert_eq!(BondOrder::Double.pdb_multiplicity(), 2);
        assert_eq!(BondOrder::Triple.pdb_multiplicity(), 3);
        assert_eq!(BondOrder::Aromatic.pdb_multiplicity(), 1);
    }

    #[test]
    fn partner_returns_opposite_atom() {
        let a1 = dummy_atom_id(1);
        let a2 = dummy_atom_id(2);
        let bond = Bond::new(a1, a2, BondOrder::Single);
        assert_eq!(bond.partner(a1), Some(a2));
        assert_eq!(bond.partner(a2), Some(a1));
        assert_eq!(bond.partner(dummy_atom_id(3)), None);
        assert!(bond.contains(a1));
    }
}

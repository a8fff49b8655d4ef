use phf::phf_map;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A chemical element with the physical constants needed for building and analysis.
///
/// The wildcard element (atomic number 0, symbol `*`) stands in for the
/// linkage "ports" of monomer fragments and never survives into a built system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    /// Standard capitalized symbol (e.g. "C", "Cl").
    pub symbol: &'static str,
    /// Atomic number; 0 for the wildcard.
    pub atomic_number: u8,
    /// Standard atomic mass in daltons.
    pub mass: f64,
    /// Van der Waals radius in nanometers (Bondi).
    pub vdw_radius: f64,
}

const fn el(symbol: &'static str, atomic_number: u8, mass: f64, vdw_radius: f64) -> Element {
    Element {
        symbol,
        atomic_number,
        mass,
        vdw_radius,
    }
}

pub const WILDCARD: Element = el("*", 0, 0.0, 0.0);
pub const HYDROGEN: Element = el("H", 1, 1.008, 0.120);

static ELEMENTS: phf::Map<&'static str, Element> = phf_map! {
    "H" => HYDROGEN,
    "He" => el("He", 2, 4.0026, 0.140),
    "Li" => el("Li", 3, 6.94, 0.182),
    "Be" => el("Be", 4, 9.0122, 0.153),
    "B" => el("B", 5, 10.81, 0.192),
    "C" => el("C", 6, 12.011, 0.170),
    "N" => el("N", 7, 14.007, 0.155),
    "O" => el("O", 8, 15.999, 0.152),
    "F" => el("F", 9, 18.998, 0.147),
    "Ne" => el("Ne", 10, 20.180, 0.154),
    "Na" => el("Na", 11, 22.990, 0.227),
    "Mg" => el("Mg", 12, 24.305, 0.173),
    "Al" => el("Al", 13, 26.982, 0.184),
    "Si" => el("Si", 14, 28.085, 0.210),
    "P" => el("P", 15, 30.974, 0.180),
    "S" => el("S", 16, 32.06, 0.180),
    "Cl" => el("Cl", 17, 35.45, 0.175),
    "Ar" => el("Ar", 18, 39.948, 0.188),
    "K" => el("K", 19, 39.098, 0.275),
    "Ca" => el("Ca", 20, 40.078, 0.231),
    "Fe" => el("Fe", 26, 55.845, 0.200),
    "Cu" => el("Cu", 29, 63.546, 0.140),
    "Zn" => el("Zn", 30, 65.38, 0.139),
    "Ge" => el("Ge", 32, 72.630, 0.211),
    "As" => el("As", 33, 74.922, 0.185),
    "Se" => el("Se", 34, 78.971, 0.190),
    "Br" => el("Br", 35, 79.904, 0.185),
    "Sn" => el("Sn", 50, 118.71, 0.217),
    "I" => el("I", 53, 126.90, 0.198),
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown element symbol '{0}'")]
pub struct UnknownElementError(pub String);

impl Element {
    /// Looks up an element by symbol, tolerating any capitalization ("CL", "cl", "Cl").
    pub fn from_symbol(symbol: &str) -> Option<Element> {
        if symbol == "*" {
            return Some(WILDCARD);
        }
        let mut chars = symbol.chars();
        let first = chars.next()?;
        let normalized: String = first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect();
        ELEMENTS.get(normalized.as_str()).copied()
    }

    pub fn from_atomic_number(atomic_number: u8) -> Option<Element> {
        if atomic_number == 0 {
            return Some(WILDCARD);
        }
        ELEMENTS
            .values()
            .find(|e| e.atomic_number == atomic_number)
            .copied()
    }

    pub fn is_wildcard(&self) -> bool {
        self.atomic_number == 0
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atomic_number == 1
    }
}

impl Default for Element {
    fn default() -> Self {
        WILDCARD
    }
}

impl FromStr for Element {
    type Err = UnknownElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Element::from_symbol(s.trim()).ok_or_else(|| UnknownElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(Element::from_symbol("cl").unwrap().symbol, "Cl");
        assert_eq!(Element::from_symbol("CL").unwrap().atomic_number, 17);
        assert_eq!(Element::from_symbol("c").unwrap().symbol, "C");
    }

    #[test]
    fn wildcard_has_atomic_number_zero() {
        let wildcard = Element::from_symbol("*").unwrap();
        assert!(wildcard.is_wildcard());
        assert_eq!(Element::from_atomic_number(0), Some(WILDCARD));
    }

    #[test]
    fn atomic_number_lookup_round_trips_symbol() {
        for symbol in ["H", "C", "N", "O", "S", "Br", "I"] {
            let element = Element::from_symbol(symbol).unwrap();
            assert_eq!(
                Element::from_atomic_number(element.atomic_number)
                    .unwrap()
                    .symbol,
                symbol
            );
        }
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        assert!(Element::from_symbol("Xx").is_none());
        assert!(Element::from_symbol("").is_none());
        assert_eq!(
            "Qq".parse::<Element>(),
            Err(UnknownElementError("Qq".to_string()))
        );
    }
}

use super::graph::{SmartsAtom, SmartsGraph};
use crate::core::models::element::Element;
use crate::core::models::topology::BondOrder;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SmartsError {
    #[error("SMARTS string is empty")]
    Empty,
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("Unknown element '{symbol}' at position {position}")]
    UnknownElement { symbol: String, position: usize },
    #[error("Bracket atom opened at position {position} is never closed")]
    UnclosedBracket { position: usize },
    #[error("Bracket atom at position {position} does not start with an element primitive")]
    MissingElement { position: usize },
    #[error("Unbalanced parenthesis at position {position}")]
    UnbalancedParenthesis { position: usize },
    #[error("Ring closure {label} is opened but never closed")]
    UnclosedRing { label: u32 },
    #[error("Ring closure {label} specifies conflicting bond orders")]
    RingBondConflict { label: u32 },
    #[error("Ring closure {label} at position {position} would bond an atom to itself or duplicate a bond")]
    InvalidRingClosure { label: u32, position: usize },
    #[error("Bond at position {position} is not attached to two atoms")]
    DanglingBond { position: usize },
    #[error("Unsupported SMARTS feature '{feature}' at position {position}")]
    Unsupported { feature: String, position: usize },
}

const AROMATIC_ORGANIC: [(&str, &str); 6] = [
    ("b", "B"),
    ("c", "C"),
    ("n", "N"),
    ("o", "O"),
    ("p", "P"),
    ("s", "S"),
];

const AROMATIC_BRACKET: [(&str, &str); 8] = [
    ("se", "Se"),
    ("as", "As"),
    ("b", "B"),
    ("c", "C"),
    ("n", "N"),
    ("o", "O"),
    ("p", "P"),
    ("s", "S"),
];

/// Parses a SMARTS string into a molecular graph.
///
/// The supported subset covers what monomer fragments use: organic-subset and
/// bracket atoms, wildcard ports, bond symbols, branches, ring closures and
/// disconnected components. Query constructs which cannot be reduced to a
/// single concrete atom (recursive SMARTS, bond logic) are rejected.
pub fn parse_smarts(input: &str) -> Result<SmartsGraph, SmartsError> {
    Parser::new(input).parse()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    graph: SmartsGraph,
    prev_atom: Option<usize>,
    branch_stack: Vec<usize>,
    pending_bond: Option<(BondOrder, usize)>,
    open_rings: HashMap<u32, (usize, Option<BondOrder>)>,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.trim().chars().collect(),
            pos: 0,
            graph: SmartsGraph::default(),
            prev_atom: None,
            branch_stack: Vec::new(),
            pending_bond: None,
            open_rings: HashMap::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn parse(mut self) -> Result<SmartsGraph, SmartsError> {
        if self.chars.is_empty() {
            return Err(SmartsError::Empty);
        }

        while let Some(c) = self.peek() {
            let position = self.pos;
            match c {
                '(' => {
                    self.ensure_no_pending_bond()?;
                    let anchor = self
                        .prev_atom
                        .ok_or(SmartsError::UnbalancedParenthesis { position })?;
                    self.branch_stack.push(anchor);
                    self.pos += 1;
                }
                ')' => {
                    self.ensure_no_pending_bond()?;
                    let anchor = self
                        .branch_stack
                        .pop()
                        .ok_or(SmartsError::UnbalancedParenthesis { position })?;
                    self.prev_atom = Some(anchor);
                    self.pos += 1;
                }
                '.' => {
                    self.ensure_no_pending_bond()?;
                    self.prev_atom = None;
                    self.pos += 1;
                }
                '@' => {
                    // ring-membership bond primitive; carries no order of its own
                    if self.prev_atom.is_none() {
                        return Err(SmartsError::DanglingBond { position });
                    }
                    self.pos += 1;
                }
                '-' | '=' | '#' | ':' | '~' | '/' | '\\' => {
                    if self.prev_atom.is_none() {
                        return Err(SmartsError::DanglingBond { position });
                    }
                    if self.pending_bond.is_some() {
                        return Err(SmartsError::Unsupported {
                            feature: "combined bond primitives".into(),
                            position,
                        });
                    }
                    let order = BondOrder::from_smarts_symbol(c)
                        .ok_or(SmartsError::UnexpectedCharacter { character: c, position })?;
                    self.pending_bond = Some((order, position));
                    self.pos += 1;
                }
                '!' | ',' | ';' | '&' | '$' => {
                    return Err(SmartsError::Unsupported {
                        feature: format!("bond or logical operator '{}'", c),
                        position,
                    });
                }
                '%' | '0'..='9' => self.parse_ring_closure()?,
                '[' => {
                    let atom = self.parse_bracket_atom()?;
                    self.push_atom(atom);
                }
                _ if c == '*' || c.is_ascii_alphabetic() => {
                    let atom = self.parse_organic_atom()?;
                    self.push_atom(atom);
                }
                _ => {
                    return Err(SmartsError::UnexpectedCharacter {
                        character: c,
                        position,
                    });
                }
            }
        }

        self.ensure_no_pending_bond()?;
        if !self.branch_stack.is_empty() {
            return Err(SmartsError::UnbalancedParenthesis {
                position: self.chars.len(),
            });
        }
        if let Some(&label) = self.open_rings.keys().min() {
            return Err(SmartsError::UnclosedRing { label });
        }
        if self.graph.atoms.is_empty() {
            return Err(SmartsError::Empty);
        }
        Ok(self.graph)
    }

    fn ensure_no_pending_bond(&self) -> Result<(), SmartsError> {
        match self.pending_bond {
            Some((_, position)) => Err(SmartsError::DanglingBond { position }),
            None => Ok(()),
        }
    }

    fn push_atom(&mut self, atom: SmartsAtom) {
        let aromatic = atom.aromatic;
        let idx = self.graph.atoms.len();
        self.graph.atoms.push(atom);
        if let Some(prev) = self.prev_atom {
            let order = match self.pending_bond.take() {
                Some((order, _)) => order,
                None => self.default_order(prev, aromatic),
            };
            self.graph.add_bond(prev, idx, order);
        }
        self.prev_atom = Some(idx);
    }

    fn default_order(&self, other: usize, aromatic: bool) -> BondOrder {
        if aromatic && self.graph.atoms[other].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn read_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
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

    fn parse_ring_closure(&mut self) -> Result<(), SmartsError> {
        let position = self.pos;
        let current = self
            .prev_atom
            .ok_or(SmartsError::UnexpectedCharacter {
                character: self.chars[position],
                position,
            })?;

        let label = if self.peek() == Some('%') {
            self.pos += 1;
            let digits: String = (0..2).filter_map(|i| self.peek_at(i)).collect();
            if digits.len() != 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(SmartsError::UnexpectedCharacter {
                    character: '%',
                    position,
                });
            }
            self.pos += 2;
            digits.parse::<u32>().unwrap_or_default()
        } else {
            let digit = self.chars[position].to_digit(10).unwrap_or_default();
            self.pos += 1;
            digit
        };

        let bond_here = self.pending_bond.take().map(|(order, _)| order);
        match self.open_rings.remove(&label) {
            Some((opener, bond_there)) => {
                let order = match (bond_there, bond_here) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(SmartsError::RingBondConflict { label });
                    }
                    (Some(a), _) | (None, Some(a)) => a,
                    (None, None) => self.default_order(opener, self.graph.atoms[current].aromatic),
                };
                if opener == current || self.graph.are_bonded(opener, current) {
                    return Err(SmartsError::InvalidRingClosure { label, position });
                }
                self.graph.add_bond(opener, current, order);
            }
            None => {
                self.open_rings.insert(label, (current, bond_here));
            }
        }
        Ok(())
    }

    fn parse_organic_atom(&mut self) -> Result<SmartsAtom, SmartsError> {
        let position = self.pos;
        let c = self.chars[position];

        if c == '*' {
            self.pos += 1;
            return Ok(SmartsAtom::new(Element::default()));
        }

        for two_letter in ["Cl", "Br"] {
            let candidate: String = (0..2).filter_map(|i| self.peek_at(i)).collect();
            if candidate == two_letter {
                self.pos += 2;
                return Ok(SmartsAtom::new(self.lookup(two_letter, position)?));
            }
        }

        let symbol = c.to_string();
        if let Some((_, upper)) = AROMATIC_ORGANIC.iter().find(|(lower, _)| *lower == symbol) {
            self.pos += 1;
            let mut atom = SmartsAtom::new(self.lookup(upper, position)?);
            atom.aromatic = true;
            return Ok(atom);
        }
        if matches!(c, 'B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I') {
            self.pos += 1;
            return Ok(SmartsAtom::new(self.lookup(&symbol, position)?));
        }

        Err(SmartsError::Unsupported {
            feature: format!("unbracketed atom primitive '{}'", c),
            position,
        })
    }

    fn lookup(&self, symbol: &str, position: usize) -> Result<Element, SmartsError> {
        Element::from_symbol(symbol).ok_or_else(|| SmartsError::UnknownElement {
            symbol: symbol.to_string(),
            position,
        })
    }

    fn parse_bracket_atom(&mut self) -> Result<SmartsAtom, SmartsError> {
        let open = self.pos;
        let close = self.chars[open..]
            .iter()
            .position(|&c| c == ']')
            .map(|offset| open + offset)
            .ok_or(SmartsError::UnclosedBracket { position: open })?;
        self.pos += 1;

        let isotope = self.read_number().map(|n| n as u16);
        let mut atom = self.parse_element_primitive(open)?;
        atom.isotope = isotope;
        atom.bracketed = true;

        let mut skipping_alternative = false;
        let mut negated = false;
        while self.pos < close {
            let position = self.pos;
            let c = self.chars[position];
            self.pos += 1;

            if skipping_alternative {
                if c == ';' || c == '&' {
                    skipping_alternative = false;
                }
                continue;
            }

            match c {
                '&' | ';' => {}
                ',' => skipping_alternative = true,
                '!' => negated = true,
                '$' => {
                    return Err(SmartsError::Unsupported {
                        feature: "recursive SMARTS".into(),
                        position,
                    });
                }
                'H' => {
                    let count = self.read_number().unwrap_or(1);
                    if !std::mem::take(&mut negated) {
                        atom.hydrogen_count = Some(count as u8);
                    }
                }
                'D' | 'X' | 'R' | 'r' | 'v' | 'x' | 'h' | 'A' | 'a' => {
                    self.read_number();
                    if c == 'a' && !negated {
                        atom.aromatic = true;
                    }
                    negated = false;
                }
                '#' => {
                    self.read_number().ok_or(SmartsError::UnexpectedCharacter {
                        character: '#',
                        position,
                    })?;
                    negated = false;
                }
                '+' | '-' => {
                    let sign: i8 = if c == '+' { 1 } else { -1 };
                    let magnitude = match self.read_number() {
                        Some(n) => n as i8,
                        None => {
                            let mut repeats = 1;
                            while self.pos < close && self.chars[self.pos] == c {
                                repeats += 1;
                                self.pos += 1;
                            }
                            repeats
                        }
                    };
                    if !std::mem::take(&mut negated) {
                        atom.charge = sign * magnitude;
                    }
                }
                '@' => {
                    while self.pos < close && self.chars[self.pos] == '@' {
                        self.pos += 1;
                    }
                }
                ':' => {
                    let map = self.read_number().ok_or(SmartsError::UnexpectedCharacter {
                        character: ':',
                        position,
                    })?;
                    atom.map_number = Some(map);
                }
                _ => {
                    return Err(SmartsError::UnexpectedCharacter {
                        character: c,
                        position,
                    });
                }
            }
        }

        self.pos = close + 1;
        Ok(atom)
    }

    fn parse_element_primitive(&mut self, open: usize) -> Result<SmartsAtom, SmartsError> {
        let position = self.pos;
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                Ok(SmartsAtom::new(Element::default()))
            }
            Some('#') => {
                self.pos += 1;
                let number = self
                    .read_number()
                    .ok_or(SmartsError::MissingElement { position: open })?;
                let element = u8::try_from(number)
                    .ok()
                    .and_then(Element::from_atomic_number)
                    .ok_or_else(|| SmartsError::UnknownElement {
                        symbol: format!("#{}", number),
                        position,
                    })?;
                Ok(SmartsAtom::new(element))
            }
            Some(c) if c.is_ascii_uppercase() => {
                if self.peek_at(1).is_some_and(|next| next.is_ascii_lowercase()) {
                    let two: String = (0..2).filter_map(|i| self.peek_at(i)).collect();
                    if let Some(element) = Element::from_symbol(&two) {
                        self.pos += 2;
                        return Ok(SmartsAtom::new(element));
                    }
                }
                self.pos += 1;
                Ok(SmartsAtom::new(self.lookup(&c.to_string(), position)?))
            }
            Some(c) if c.is_ascii_lowercase() => {
                for (lower, upper) in AROMATIC_BRACKET {
                    let candidate: String =
                        (0..lower.len()).filter_map(|i| self.peek_at(i)).collect();
                    if candidate == lower {
                        self.pos += lower.len();
                        let mut atom = SmartsAtom::new(self.lookup(upper, position)?);
                        atom.aromatic = true;
                        return Ok(atom);
                    }
                }
                Err(SmartsError::UnknownElement {
                    symbol: c.to_string(),
                    position,
                })
            }
            _ => Err(SmartsError::MissingElement { position: open }),
        }
    }
}

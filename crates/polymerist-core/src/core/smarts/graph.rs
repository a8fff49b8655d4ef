use crate::core::models::element::{Element, HYDROGEN};
use crate::core::models::topology::BondOrder;
use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};

const SIGNATURE_ITERATIONS: usize = 4;

/// A single atom of a parsed SMARTS pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartsAtom {
    pub element: Element,
    pub aromatic: bool,
    pub isotope: Option<u16>,
    pub map_number: Option<u32>,
    /// Hydrogen count given by an `H` primitive inside brackets.
    pub hydrogen_count: Option<u8>,
    pub charge: i8,
    pub bracketed: bool,
}

impl SmartsAtom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            aromatic: false,
            isotope: None,
            map_number: None,
            hydrogen_count: None,
            charge: 0,
            bracketed: false,
        }
    }

    /// Ports are wildcard atoms marking where a monomer links to its neighbors.
    pub fn is_port(&self) -> bool {
        self.element.is_wildcard()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartsBond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
}

/// A linkage site: the port atom, the real atom it hangs off, and the bond order between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortLinkage {
    pub port: usize,
    pub linker: usize,
    pub order: BondOrder,
}

/// Molecular graph of a SMARTS pattern, with atoms indexed by order of appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmartsGraph {
    pub atoms: Vec<SmartsAtom>,
    pub bonds: Vec<SmartsBond>,
}

impl SmartsGraph {
    pub(crate) fn add_bond(&mut self, atom1: usize, atom2: usize, order: BondOrder) {
        self.bonds.push(SmartsBond {
            atom1,
            atom2,
            order,
        });
    }

    pub fn are_bonded(&self, a: usize, b: usize) -> bool {
        self.bonds
            .iter()
            .any(|bond| (bond.atom1 == a && bond.atom2 == b) || (bond.atom1 == b && bond.atom2 == a))
    }

    /// Neighbors of an atom with the order of the connecting bond, in bond order of appearance.
    pub fn neighbors(&self, idx: usize) -> Vec<(usize, BondOrder)> {
        self.bonds
            .iter()
            .filter_map(|bond| {
                if bond.atom1 == idx {
                    Some((bond.atom2, bond.order))
                } else if bond.atom2 == idx {
                    Some((bond.atom1, bond.order))
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn port_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, atom)| atom.is_port())
            .map(|(idx, _)| idx)
    }

    pub fn num_ports(&self) -> usize {
        self.port_indices().count()
    }

    /// Linkage sites in order of port appearance.
    ///
    /// A port bonded to nothing has no linker and is skipped.
    pub fn port_linkages(&self) -> Vec<PortLinkage> {
        self.port_indices()
            .filter_map(|port| {
                self.neighbors(port)
                    .into_iter()
                    .find(|(neighbor, _)| !self.atoms[*neighbor].is_port())
                    .map(|(linker, order)| PortLinkage {
                        port,
                        linker,
                        order,
                    })
            })
            .collect()
    }

    /// Indices of atoms bonded to a port, in port order.
    pub fn linker_ids(&self) -> Vec<usize> {
        self.port_linkages().into_iter().map(|l| l.linker).collect()
    }

    /// Number of atoms that are not ports.
    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|atom| !atom.is_port()).count()
    }

    /// Number of real atoms including hydrogens implied by bracket `H` counts.
    pub fn heavy_atom_count_with_hydrogens(&self) -> usize {
        self.heavy_atom_count()
            + self
                .atoms
                .iter()
                .filter(|atom| !atom.is_port())
                .map(|atom| atom.hydrogen_count.unwrap_or(0) as usize)
                .sum::<usize>()
    }

    /// Order-independent hash of the graph with every port replaced by a hydrogen.
    ///
    /// Atom-map numbers and isotopes are ignored, so two fragments that differ
    /// only in labelling or atom order share a signature. Computed by iterative
    /// neighborhood refinement (Weisfeiler-Lehman), so distinct signatures
    /// guarantee distinct graphs while equal signatures are a strong hint of
    /// identity.
    pub fn wl_signature(&self) -> u64 {
        let real: Vec<usize> = (0..self.atoms.len())
            .filter(|&idx| !self.atoms[idx].is_port())
            .collect();

        let mut labels: BTreeMap<usize, u64> = real
            .iter()
            .map(|&idx| {
                let atom = &self.atoms[idx];
                let capped_ports = self
                    .neighbors(idx)
                    .iter()
                    .filter(|(n, _)| self.atoms[*n].is_port())
                    .count();
                let mut hasher = DefaultHasher::new();
                atom.element.atomic_number.hash(&mut hasher);
                atom.aromatic.hash(&mut hasher);
                atom.charge.hash(&mut hasher);
                (atom.hydrogen_count.unwrap_or(0) as usize + capped_ports).hash(&mut hasher);
                (idx, hasher.finish())
            })
            .collect();

        for _ in 0..SIGNATURE_ITERATIONS {
            let refined: BTreeMap<usize, u64> = real
                .iter()
                .map(|&idx| {
                    let mut neighborhood: Vec<(u8, u64)> = self
                        .neighbors(idx)
                        .into_iter()
                        .filter_map(|(n, order)| labels.get(&n).map(|&label| (order as u8, label)))
                        .collect();
                    neighborhood.sort_unstable();
                    let mut hasher = DefaultHasher::new();
                    labels[&idx].hash(&mut hasher);
                    neighborhood.hash(&mut hasher);
                    (idx, hasher.finish())
                })
                .collect();
            labels = refined;
        }

        let mut multiset: Vec<u64> = labels.into_values().collect();
        multiset.sort_unstable();
        let mut hasher = DefaultHasher::new();
        multiset.hash(&mut hasher);
        hasher.finish()
    }

    /// Element for each real atom, hydrogens capping ports are not included.
    pub fn real_elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.atoms
            .iter()
            .filter(|atom| !atom.is_port())
            .map(|atom| atom.element)
    }

    /// Returns the element used to saturate a port when no partner is attached.
    pub fn cap_element() -> Element {
        HYDROGEN
    }
}

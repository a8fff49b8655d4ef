//! # Core Models Module
//!
//! Data structures for molecular systems built from monomer fragments or read
//! from structure files.
//!
//! ## Key Components
//!
//! - [`atom`] - Individual atom with element, position, and charge
//! - [`element`] - Static element table (atomic number, mass, van der Waals radius)
//! - [`residue`] - A placed monomer unit and the atoms it owns
//! - [`chain`] - Ordered collection of residues
//! - [`system`] - Complete molecular system with bonds and connectivity cache
//! - [`topology`] - Bonds and bond orders
//! - [`ids`] - Stable identifier types for atoms, residues, and chains
//!
//! ## Usage
//!
//! ```ignore
//! use polymerist::core::models::{atom::Atom, chain::ChainType, element::Element, system::MolecularSystem};
//!
//! let mut system = MolecularSystem::new();
//! let chain_id = system.add_chain('A', ChainType::Polymer);
//! let residue_id = system.add_residue(chain_id, 1, "PEG").unwrap();
//! let carbon = Element::from_symbol("C").unwrap();
//! system.add_atom_to_residue(residue_id, Atom::new("C01", residue_id, carbon, Point3::origin()));
//! ```

pub mod atom;
pub mod chain;
pub mod element;
pub mod ids;
pub mod residue;
pub mod system;
pub mod topology;

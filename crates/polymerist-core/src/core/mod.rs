//! # Core Module
//!
//! Stateless building blocks shared by the engine and analysis layers.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains, bonds and systems
//! - **Fragment Notation** ([`smarts`]) - Monomer SMARTS parsing into port-annotated graphs
//! - **Monomer Libraries** ([`monomers`]) - Residue-labelled fragment groups and end-group assignment
//! - **Geometry** ([`linalg`]) - Affine transforms, alignment and substituent placement
//! - **File I/O** ([`io`]) - PDB reading and writing, including multi-model files
//! - **Environments** ([`environment`]) - Conda manifests, version specifiers and installed-package audits

pub mod environment;
pub mod io;
pub mod linalg;
pub mod models;
pub mod monomers;
pub mod smarts;

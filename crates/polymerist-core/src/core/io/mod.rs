//! Reading and writing molecular structure files.
//!
//! Formats implement the [`traits::MolecularFile`] trait, which gives them
//! path-based helpers for free. PDB is the exchange format for built polymers
//! and for multi-model trajectories fed to analysis.

pub mod pdb;
pub mod traits;

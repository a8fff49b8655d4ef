//! # Polymerist Core Library
//!
//! Building linear polymer structures from monomer fragments, analyzing the
//! trajectories they produce, and checking the conda environments the wider
//! toolchain runs in.
//!
//! ## Architecture
//!
//! The library is split into layers with one direction of dependency.
//!
//! - **[`core`]: The Foundation.** Stateless data: molecular systems, monomer
//!   SMARTS and monomer groups, linear algebra helpers, PDB I/O and environment
//!   manifests.
//!
//! - **[`engine`]: The Logic Core.** Chain planning and assembly, size
//!   estimation, build and analysis configuration, progress reporting and the
//!   shared error type.
//!
//! - **[`analysis`]: Observables.** Trajectories, per-frame properties, radial
//!   distribution functions and result tables.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that load inputs,
//!   run the engine or analysis, and write results.

pub mod analysis;
pub mod core;
pub mod engine;
pub mod workflows;

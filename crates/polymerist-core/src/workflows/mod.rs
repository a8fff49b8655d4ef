//! # Workflows Module
//!
//! Top-level entry points that tie loading, validation, computation and output
//! together for each user-facing task.
//!
//! - **Build** ([`build`]) - Load a monomer group, assemble a linear chain and
//!   write it as PDB.
//! - **Analyze** ([`analyze`]) - Compute per-frame properties and optional radial
//!   distribution functions for a trajectory.
//! - **Environment** ([`environment`]) - Validate, merge and audit conda
//!   environment manifests.
//!
//! Long-running workflows accept a [`ProgressReporter`](crate::engine::progress::ProgressReporter)
//! and report their phases through it.

pub mod analyze;
pub mod build;
pub mod environment;

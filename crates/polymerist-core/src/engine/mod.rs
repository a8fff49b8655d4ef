//! # Engine Module
//!
//! Stateful polymer construction on top of the [`crate::core`] models.
//!
//! ## Overview
//!
//! The engine turns a validated [`MonomerGroup`](crate::core::monomers::group::MonomerGroup)
//! into a concrete [`MolecularSystem`](crate::core::models::system::MolecularSystem):
//! end groups are resolved, middle units are laid out according to a block
//! sequence, linkage ports are fused into inter-residue bonds and any ports left
//! open are capped with hydrogen.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Builders for chain, build and analysis parameters
//! - **Building** ([`building`]) - Linear chain assembly and initial coordinates
//! - **Estimation** ([`estimation`]) - Chain size estimates without building
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine-wide error type

pub mod building;
pub mod config;
pub mod error;
pub mod estimation;
pub mod progress;

use thiserror::Error;

use super::config::ConfigError;
use crate::analysis::AnalysisError;
use crate::core::environment::manifest::ManifestError;
use crate::core::environment::prerequisites::PrerequisiteError;
use crate::core::io::pdb::PdbError;
use crate::core::monomers::group::MonomerError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The monomer group cannot form the requested chain topology.
    #[error("Morphology error: {0}")]
    Morphology(String),

    #[error(
        "Sequence '{sequence}' names {distinct} distinct monomers, but only {available} middle monomers are defined"
    )]
    Sequence {
        sequence: String,
        distinct: usize,
        available: usize,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Monomer error: {source}")]
    Monomer {
        #[from]
        source: MonomerError,
    },

    #[error("Environment manifest error: {source}")]
    Manifest {
        #[from]
        source: ManifestError,
    },

    #[error(transparent)]
    Prerequisite(#[from] PrerequisiteError),

    #[error("PDB error: {source}")]
    Pdb {
        #[from]
        source: PdbError,
    },

    #[error("Analysis failed: {source}")]
    Analysis {
        #[from]
        source: AnalysisError,
    },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

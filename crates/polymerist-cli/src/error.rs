use crate::utils::parser::ParseError;
use polymerist::analysis::AnalysisError;
use polymerist::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] EngineError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(#[from] ParseError),

    #[error("Environment audit failed: {missing} missing, {unsatisfied} unsatisfied")]
    AuditFailed { missing: usize, unsatisfied: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

//! # Analysis Module
//!
//! Property calculations over trajectories of built polymers.
//!
//! - [`trajectory`] - Frames of positions (nm) and times (ns) over a fixed topology
//! - [`properties`] - Radius of gyration, SASA and shape anisotropy per frame
//! - [`sasa`] - Shrake-Rupley solvent accessible surface area
//! - [`rdf`] - Radial distribution functions between element pairs
//! - [`table`] - Labelled result columns, CSV output and plot-data splitting
//!
//! Per-frame work runs on the rayon pool when the `parallel` feature is on.

pub mod properties;
pub mod rdf;
pub mod sasa;
pub mod table;
pub mod trajectory;

use crate::core::io::pdb::PdbError;
use properties::PropertyCalculation;
use table::Table;
use thiserror::Error;
use trajectory::Trajectory;

pub use rdf::{PairDict, acquire_rdfs, atom_pairs_by_element, compute_rdf};
pub use table::{props_to_plot_data, rdfs_to_plot_data, states_to_plot_data};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Trajectory contains no frames")]
    EmptyTrajectory,

    #[error("Topology has {atoms} atoms but {residue_indices} residue assignments")]
    TopologyMismatch { atoms: usize, residue_indices: usize },

    #[error("Frame {frame} has {found} positions, expected {expected}")]
    FrameSizeMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },

    #[error("Frame {frame} has no unit cell; periodic distances are undefined")]
    MissingUnitCell { frame: usize },

    #[error("Invalid radius range [{min}, {max}] with bin width {bin_width}")]
    InvalidRange { min: f64, max: f64, bin_width: f64 },

    #[error("Column '{label}' has {found} rows, expected {expected}")]
    ColumnLength {
        label: String,
        expected: usize,
        found: usize,
    },

    #[error("No column label matches '{0}'")]
    NoMatchingColumn(String),

    #[error("Invalid value '{value}' in column '{label}', row {row}")]
    InvalidCell {
        label: String,
        row: usize,
        value: String,
    },

    #[error("Invalid column pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read trajectory {path}: {source}")]
    Pdb { path: String, source: PdbError },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Time series of `properties`, one row per frame.
///
/// The first column holds `time_points`, labelled `Sample Time (unit)` when a
/// unit is given and `Sample Time` otherwise; each property follows under its
/// [`PropertyCalculation::label`].
pub fn acquire_time_props(
    traj: &Trajectory,
    time_points: &[f64],
    time_unit: Option<&str>,
    properties: &[PropertyCalculation],
) -> Result<Table, AnalysisError> {
    let time_label = match time_unit {
        Some(unit) => format!("Sample Time ({unit})"),
        None => "Sample Time".to_string(),
    };
    if time_points.len() != traj.n_frames() {
        return Err(AnalysisError::ColumnLength {
            label: time_label,
            expected: traj.n_frames(),
            found: time_points.len(),
        });
    }

    let mut table = Table::new();
    table.insert_column(time_label, time_points.to_vec())?;
    for property in properties {
        table.insert_column(property.label(), property.compute(traj))?;
    }
    Ok(table)
}

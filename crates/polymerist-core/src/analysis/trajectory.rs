use super::AnalysisError;
use crate::core::io::pdb::{PdbFile, PdbMetadata, UnitCell};
use crate::core::io::traits::MolecularFile;
use crate::core::models::element::Element;
use crate::core::models::ids::ResidueId;
use crate::core::models::system::MolecularSystem;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

pub const ANGSTROM_TO_NM: f64 = 0.1;

/// One snapshot of atom positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Simulation time in nanoseconds.
    pub time: f64,
    /// Positions in nanometers, in trajectory atom order.
    pub positions: Vec<Point3<f64>>,
    /// Orthorhombic box edge lengths in nanometers.
    pub box_lengths: Option<Vector3<f64>>,
}

impl Frame {
    pub fn box_volume(&self) -> Option<f64> {
        self.box_lengths.map(|l| l.x * l.y * l.z)
    }
}

/// A fixed topology observed over a sequence of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    elements: Vec<Element>,
    residue_indices: Vec<usize>,
    frames: Vec<Frame>,
}

impl Trajectory {
    pub fn new(
        elements: Vec<Element>,
        residue_indices: Vec<usize>,
        frames: Vec<Frame>,
    ) -> Result<Self, AnalysisError> {
        if frames.is_empty() {
            return Err(AnalysisError::EmptyTrajectory);
        }
        if residue_indices.len() != elements.len() {
            return Err(AnalysisError::TopologyMismatch {
                atoms: elements.len(),
                residue_indices: residue_indices.len(),
            });
        }
        for (index, frame) in frames.iter().enumerate() {
            if frame.positions.len() != elements.len() {
                return Err(AnalysisError::FrameSizeMismatch {
                    frame: index,
                    expected: elements.len(),
                    found: frame.positions.len(),
                });
            }
        }
        Ok(Self {
            elements,
            residue_indices,
            frames,
        })
    }

    /// Builds a trajectory from a system and the models read alongside it.
    ///
    /// Frame `i` is stamped with time `i * time_step` (ns). A system read from a
    /// file without models yields a single frame of its current positions.
    pub fn from_system(
        system: &MolecularSystem,
        metadata: &PdbMetadata,
        time_step: f64,
    ) -> Result<Self, AnalysisError> {
        let atom_ids = system.ordered_atom_ids();
        let mut residue_numbering: HashMap<ResidueId, usize> = HashMap::new();
        let mut elements = Vec::with_capacity(atom_ids.len());
        let mut residue_indices = Vec::with_capacity(atom_ids.len());
        let mut current_positions = Vec::with_capacity(atom_ids.len());
        for atom in atom_ids.iter().filter_map(|&id| system.atom(id)) {
            let next = residue_numbering.len();
            residue_indices.push(*residue_numbering.entry(atom.residue_id).or_insert(next));
            elements.push(atom.element);
            current_positions.push(atom.position);
        }

        let box_lengths = metadata.unit_cell.as_ref().and_then(box_lengths_nm);
        let frames: Vec<Frame> = if metadata.frames.is_empty() {
            vec![current_positions]
        } else {
            metadata.frames.clone()
        }
        .into_iter()
        .enumerate()
        .map(|(index, coords)| Frame {
            time: index as f64 * time_step,
            positions: coords
                .iter()
                .map(|p| Point3::from(p.coords * ANGSTROM_TO_NM))
                .collect(),
            box_lengths,
        })
        .collect();

        debug!(
            n_atoms = elements.len(),
            n_frames = frames.len(),
            periodic = box_lengths.is_some(),
            "Loaded trajectory"
        );
        Self::new(elements, residue_indices, frames)
    }

    pub fn from_pdb_path(path: &Path, time_step: f64) -> Result<Self, AnalysisError> {
        let (system, metadata) =
            PdbFile::read_from_path(path).map_err(|source| AnalysisError::Pdb {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_system(&system, &metadata, time_step)
    }

    pub fn n_atoms(&self) -> usize {
        self.elements.len()
    }

    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn n_residues(&self) -> usize {
        self.residue_indices
            .iter()
            .max()
            .map_or(0, |&highest| highest + 1)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Zero-based residue index of every atom.
    pub fn residue_indices(&self) -> &[usize] {
        &self.residue_indices
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn times(&self) -> Vec<f64> {
        self.frames.iter().map(|frame| frame.time).collect()
    }

    /// Atom indices whose element symbol matches `symbol`.
    pub fn select_element(&self, symbol: &str) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.symbol == symbol)
            .map(|(index, _)| index)
            .collect()
    }

    /// Distinct element symbols in order of first appearance.
    pub fn unique_elements(&self) -> Vec<&'static str> {
        let mut symbols: Vec<&'static str> = Vec::new();
        for element in &self.elements {
            if !symbols.contains(&element.symbol) {
                symbols.push(element.symbol);
            }
        }
        symbols
    }
}

/// Placeholder cells (1 Å cubes written by tools without a box) count as no box.
fn box_lengths_nm(cell: &UnitCell) -> Option<Vector3<f64>> {
    let lengths = cell.lengths();
    if lengths.iter().all(|&l| (l - 1.0).abs() < 1e-6) {
        return None;
    }
    if !cell.is_orthorhombic() {
        warn!(
            alpha = cell.alpha,
            beta = cell.beta,
            gamma = cell.gamma,
            "Ignoring non-orthorhombic unit cell; periodic analyses are unavailable"
        );
        return None;
    }
    Some(lengths * ANGSTROM_TO_NM)
}

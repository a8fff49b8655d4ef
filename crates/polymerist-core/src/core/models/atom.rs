use super::element::Element;
use super::ids::ResidueId;
use nalgebra::Point3;

/// Represents an atom in a molecular structure with its properties.
///
/// Atoms produced by polymer building carry the element they were parsed from,
/// a per-residue unique name, and a serial number that is assigned when the
/// system is written out.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "C01", "O02").
    pub name: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The chemical element of the atom.
    pub element: Element,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Serial number from the source file, or 0 if the atom was built in memory.
    pub serial: usize,
}

impl Atom {
    /// Creates a new uncharged `Atom` with no serial number.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `element` - The chemical element.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, residue_id: ResidueId, element: Element, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            residue_id,
            element,
            position,
            partial_charge: 0.0,
            serial: 0,
        }
    }
}

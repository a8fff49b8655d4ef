use super::trajectory::Trajectory;
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Solvent probe radius in nanometers (water).
pub const DEFAULT_PROBE_RADIUS: f64 = 0.14;
pub const DEFAULT_N_SPHERE_POINTS: usize = 960;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SasaMode {
    /// One area per atom.
    Atom,
    /// Atom areas summed within each residue.
    Residue,
}

/// Evenly distributed unit vectors on a sphere (golden-section spiral).
pub fn sphere_points(n: usize) -> Vec<Vector3<f64>> {
    let increment = PI * (3.0 - 5.0f64.sqrt());
    let offset = 2.0 / n as f64;
    (0..n)
        .map(|k| {
            let y = k as f64 * offset - 1.0 + offset / 2.0;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let phi = k as f64 * increment;
            Vector3::new(phi.cos() * r, y, phi.sin() * r)
        })
        .collect()
}

/// Solvent accessible surface area of every frame by the Shrake-Rupley method.
///
/// Each atom is inflated to its van der Waals radius plus the probe radius and
/// sampled with `n_sphere_points` test points; the fraction of points not buried
/// in a neighbor gives its exposed area. Areas are in nm^2. Periodic images are
/// not considered.
pub fn shrake_rupley(
    traj: &Trajectory,
    probe_radius: f64,
    n_sphere_points: usize,
    mode: SasaMode,
) -> Vec<Vec<f64>> {
    let radii: Vec<f64> = traj
        .elements()
        .iter()
        .map(|element| element.vdw_radius + probe_radius)
        .collect();
    let sphere = sphere_points(n_sphere_points);

    #[cfg(feature = "parallel")]
    let frames = traj.frames().par_iter();
    #[cfg(not(feature = "parallel"))]
    let frames = traj.frames().iter();

    frames
        .map(|frame| {
            let areas = atom_areas(&frame.positions, &radii, &sphere);
            match mode {
                SasaMode::Atom => areas,
                SasaMode::Residue => {
                    let mut per_residue = vec![0.0; traj.n_residues()];
                    for (area, &residue) in areas.iter().zip(traj.residue_indices()) {
                        per_residue[residue] += area;
                    }
                    per_residue
                }
            }
        })
        .collect()
}

fn atom_areas(positions: &[Point3<f64>], radii: &[f64], sphere: &[Vector3<f64>]) -> Vec<f64> {
    if sphere.is_empty() {
        return vec![0.0; positions.len()];
    }

    positions
        .iter()
        .zip(radii)
        .enumerate()
        .map(|(i, (center, &radius))| {
            let neighbors: Vec<(Point3<f64>, f64)> = positions
                .iter()
                .zip(radii)
                .enumerate()
                .filter(|&(j, (other, &other_radius))| {
                    j != i && (other - center).norm() < radius + other_radius
                })
                .map(|(_, (other, &other_radius))| (*other, other_radius * other_radius))
                .collect();

            let accessible = sphere
                .iter()
                .map(|direction| center + direction * radius)
                .filter(|point| {
                    neighbors
                        .iter()
                        .all(|(other, radius_sq)| (point - other).norm_squared() >= *radius_sq)
                })
                .count();

            4.0 * PI * radius * radius * accessible as f64 / sphere.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::trajectory::Frame;
    use crate::core::models::element::Element;

    fn carbons(positions: Vec<Point3<f64>>, residues: Vec<usize>) -> Trajectory {
        let carbon = Element::from_symbol("C").unwrap();
        Trajectory::new(
            vec![carbon; positions.len()],
            residues,
            vec![Frame {
                time: 0.0,
                positions,
                box_lengths: None,
            }],
        )
        .unwrap()
    }

    #[test]
    fn sphere_points_are_unit_vectors() {
        let points = sphere_points(DEFAULT_N_SPHERE_POINTS);
        assert_eq!(points.len(), 960);
        assert!(points.iter().all(|p| (p.norm() - 1.0).abs() < 1e-9));
        let mean: Vector3<f64> = points.iter().sum::<Vector3<f64>>() / points.len() as f64;
        assert!(mean.norm() < 1e-2);
    }

    #[test]
    fn isolated_atom_exposes_its_whole_sphere() {
        let traj = carbons(vec![Point3::origin()], vec![0]);
        let sasa = shrake_rupley(&traj, DEFAULT_PROBE_RADIUS, DEFAULT_N_SPHERE_POINTS, SasaMode::Atom);
        let radius: f64 = 0.17 + DEFAULT_PROBE_RADIUS;
        assert!((sasa[0][0] - 4.0 * PI * radius * radius).abs() < 1e-9);
    }

    #[test]
    fn overlapping_atoms_bury_part_of_each_other() {
        let apart = carbons(
            vec![Point3::origin(), Point3::new(5.0, 0.0, 0.0)],
            vec![0, 1],
        );
        let bonded = carbons(
            vec![Point3::origin(), Point3::new(0.15, 0.0, 0.0)],
            vec![0, 0],
        );
        let free: f64 = shrake_rupley(&apart, 0.14, 960, SasaMode::Residue)[0].iter().sum();
        let buried = shrake_rupley(&bonded, 0.14, 960, SasaMode::Residue);
        assert_eq!(buried[0].len(), 1);
        assert!(buried[0][0] < free);
        assert!(buried[0][0] > free / 2.0);
    }
}

use super::AnalysisError;
use super::table::Table;
use super::trajectory::{Frame, Trajectory};
use indexmap::IndexMap;
use nalgebra::Vector3;
use std::f64::consts::PI;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Upper bound on the number of histogram bins of one RDF.
pub const MAX_RDF_BINS: usize = 1_000_000;

/// Atom index pairs keyed by a label such as `C-O`.
pub type PairDict = IndexMap<String, Vec<(usize, usize)>>;

/// Pairs of atoms for every 2-combination of distinct elements present.
pub fn atom_pairs_by_element(traj: &Trajectory) -> PairDict {
    let elements = traj.unique_elements();
    let mut pairs = PairDict::new();
    for (i, first) in elements.iter().enumerate() {
        for second in &elements[i + 1..] {
            pairs.insert(
                format!("{first}-{second}"),
                select_pairs(&traj.select_element(first), &traj.select_element(second)),
            );
        }
    }
    pairs
}

/// Unique unordered pairs between two selections, self-pairs excluded.
pub fn select_pairs(first: &[usize], second: &[usize]) -> Vec<(usize, usize)> {
    let mut pairs: Vec<(usize, usize)> = first
        .iter()
        .flat_map(|&a| second.iter().map(move |&b| (a.min(b), a.max(b))))
        .filter(|(a, b)| a != b)
        .collect();
    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

/// Bin centers and `g(r)` values of a radial distribution function.
#[derive(Debug, Clone, PartialEq)]
pub struct Rdf {
    pub radii: Vec<f64>,
    pub g_r: Vec<f64>,
}

/// Radial distribution function over `pairs`, in nanometers.
///
/// Distances use the minimum image convention, so every frame needs a box.
/// Counts are normalized by shell volume, pair count and the summed inverse
/// box volumes of all frames.
pub fn compute_rdf(
    traj: &Trajectory,
    pairs: &[(usize, usize)],
    r_range: (f64, f64),
    bin_width: f64,
) -> Result<Rdf, AnalysisError> {
    let (r_min, r_max) = r_range;
    let n_bins = bin_count(r_min, r_max, bin_width)?;
    let boxes: Vec<Vector3<f64>> = traj
        .frames()
        .iter()
        .enumerate()
        .map(|(index, frame)| {
            frame
                .box_lengths
                .ok_or(AnalysisError::MissingUnitCell { frame: index })
        })
        .collect::<Result<_, _>>()?;

    let width = (r_max - r_min) / n_bins as f64;
    let edges: Vec<f64> = (0..=n_bins).map(|i| r_min + i as f64 * width).collect();

    #[cfg(feature = "parallel")]
    let frames = traj.frames().par_iter().zip(boxes.par_iter());
    #[cfg(not(feature = "parallel"))]
    let frames = traj.frames().iter().zip(boxes.iter());

    let histograms = frames.map(|(frame, box_lengths)| {
        histogram_frame(frame, box_lengths, pairs, r_min, r_max, width, n_bins)
    });
    #[cfg(feature = "parallel")]
    let counts = histograms.reduce(|| vec![0u64; n_bins], merge_counts);
    #[cfg(not(feature = "parallel"))]
    let counts = histograms.fold(vec![0u64; n_bins], merge_counts);

    let inverse_volumes: f64 = boxes.iter().map(|l| 1.0 / (l.x * l.y * l.z)).sum();
    let radii = edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();
    let g_r = edges
        .windows(2)
        .zip(&counts)
        .map(|(w, &count)| {
            let shell = 4.0 / 3.0 * PI * (w[1].powi(3) - w[0].powi(3));
            let norm = pairs.len() as f64 * inverse_volumes * shell;
            if norm > 0.0 { count as f64 / norm } else { 0.0 }
        })
        .collect();

    Ok(Rdf { radii, g_r })
}

/// Number of bins covering `[r_min, r_max]` at roughly `bin_width` spacing.
///
/// Bounds and width must be finite, the range non-empty, and the result at
/// most [`MAX_RDF_BINS`].
pub fn bin_count(r_min: f64, r_max: f64, bin_width: f64) -> Result<usize, AnalysisError> {
    let invalid = || AnalysisError::InvalidRange {
        min: r_min,
        max: r_max,
        bin_width,
    };
    let finite = r_min.is_finite() && r_max.is_finite() && bin_width.is_finite();
    if !(finite && r_min >= 0.0 && r_max > r_min && bin_width > 0.0) {
        return Err(invalid());
    }
    let n_bins = ((r_max - r_min) / bin_width).round();
    if !(n_bins <= MAX_RDF_BINS as f64) {
        debug!(n_bins, max = MAX_RDF_BINS, "Rejecting oversized RDF histogram");
        return Err(invalid());
    }
    Ok((n_bins as usize).max(1))
}

fn merge_counts(mut total: Vec<u64>, counts: Vec<u64>) -> Vec<u64> {
    total.iter_mut().zip(counts).for_each(|(t, c)| *t += c);
    total
}

fn histogram_frame(
    frame: &Frame,
    box_lengths: &Vector3<f64>,
    pairs: &[(usize, usize)],
    r_min: f64,
    r_max: f64,
    width: f64,
    n_bins: usize,
) -> Vec<u64> {
    let mut counts = vec![0u64; n_bins];
    for &(a, b) in pairs {
        let (Some(pa), Some(pb)) = (frame.positions.get(a), frame.positions.get(b)) else {
            continue;
        };
        let mut delta = pb - pa;
        for axis in 0..3 {
            let length = box_lengths[axis];
            delta[axis] -= length * (delta[axis] / length).round();
        }
        let distance = delta.norm();
        if distance < r_min || distance > r_max {
            continue;
        }
        // The upper edge belongs to the last bin.
        let bin = (((distance - r_min) / width) as usize).min(n_bins - 1);
        counts[bin] += 1;
    }
    counts
}

/// RDFs for every pair group, as a table with a shared `Radius (nm)` column
/// followed by one `g(r) (label)` column per group.
pub fn acquire_rdfs(
    traj: &Trajectory,
    pairs: Option<&PairDict>,
    min_radius: f64,
    max_radius: f64,
    bin_width: f64,
) -> Result<Table, AnalysisError> {
    let by_element;
    let pairs = match pairs {
        Some(pairs) => pairs,
        None => {
            by_element = atom_pairs_by_element(traj);
            &by_element
        }
    };

    let mut table = Table::new();
    for (label, atom_pairs) in pairs {
        let rdf = compute_rdf(traj, atom_pairs, (min_radius, max_radius), bin_width)?;
        debug!(pairs = %label, n_pairs = atom_pairs.len(), "Computed radial distribution function");
        table.insert_column("Radius (nm)", rdf.radii)?;
        table.insert_column(format!("g(r) ({label})"), rdf.g_r)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::Element;
    use nalgebra::Point3;

    fn boxed(elements: &[&str], frames: Vec<Vec<Point3<f64>>>, side: f64) -> Trajectory {
        let elements: Vec<Element> = elements
            .iter()
            .map(|s| Element::from_symbol(s).unwrap())
            .collect();
        let residues = (0..elements.len()).collect();
        let frames = frames
            .into_iter()
            .enumerate()
            .map(|(i, positions)| Frame {
                time: i as f64,
                positions,
                box_lengths: Some(Vector3::new(side, side, side)),
            })
            .collect();
        Trajectory::new(elements, residues, frames).unwrap()
    }

    #[test]
    fn pairs_cover_each_distinct_element_combination() {
        let traj = boxed(
            &["C", "O", "C", "N"],
            vec![vec![Point3::origin(); 4]],
            2.0,
        );
        let pairs = atom_pairs_by_element(&traj);
        assert_eq!(pairs.keys().collect::<Vec<_>>(), ["C-O", "C-N", "O-N"]);
        assert_eq!(pairs["C-O"], vec![(0, 1), (1, 2)]);
        assert_eq!(pairs["O-N"], vec![(1, 3)]);
    }

    #[test]
    fn bin_count_rejects_unbounded_histograms() {
        assert_eq!(bin_count(0.0, 1.5, 0.005).unwrap(), 300);
        for (min, max, width) in [
            (0.0, f64::INFINITY, 0.005),
            (0.0, 1.5, 1e-12),
            (0.0, 1.5, f64::NAN),
            (f64::NAN, 1.5, 0.005),
            (1.0, 1.0, 0.01),
        ] {
            assert!(
                matches!(bin_count(min, max, width), Err(AnalysisError::InvalidRange { .. })),
                "accepted [{min}, {max}] / {width}"
            );
        }

        let traj = boxed(&["C", "O"], vec![vec![Point3::origin(); 2]], 2.0);
        assert!(matches!(
            compute_rdf(&traj, &[(0, 1)], (0.0, f64::INFINITY), 0.005),
            Err(AnalysisError::InvalidRange { .. })
        ));
    }

    #[test]
    fn select_pairs_drops_self_pairs_and_duplicates() {
        assert_eq!(select_pairs(&[0, 1], &[1, 0]), vec![(0, 1)]);
    }

    #[test]
    fn distances_use_the_minimum_image() {
        let traj = boxed(
            &["C", "O"],
            vec![vec![Point3::new(0.05, 0.0, 0.0), Point3::new(1.93, 0.0, 0.0)]],
            2.0,
        );
        let rdf = compute_rdf(&traj, &[(0, 1)], (0.0, 0.5), 0.05).unwrap();
        assert_eq!(rdf.radii.len(), 10);
        let peak = rdf
            .g_r
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        // 0.12 nm apart through the boundary, not 1.88 nm.
        assert_eq!(peak, 2);
    }

    #[test]
    fn normalization_matches_shell_density() {
        let traj = boxed(
            &["C", "O"],
            vec![vec![Point3::origin(), Point3::new(0.25, 0.0, 0.0)]],
            1.0,
        );
        let rdf = compute_rdf(&traj, &[(0, 1)], (0.0, 0.5), 0.1).unwrap();
        let shell = 4.0 / 3.0 * PI * (0.3f64.powi(3) - 0.2f64.powi(3));
        assert!((rdf.g_r[2] - 1.0 / shell).abs() < 1e-9);
        assert_eq!(rdf.g_r.iter().filter(|&&g| g > 0.0).count(), 1);
    }

    #[test]
    fn rdf_requires_a_box() {
        let carbon = Element::from_symbol("C").unwrap();
        let traj = Trajectory::new(
            vec![carbon, carbon],
            vec![0, 1],
            vec![Frame {
                time: 0.0,
                positions: vec![Point3::origin(), Point3::new(0.1, 0.0, 0.0)],
                box_lengths: None,
            }],
        )
        .unwrap();
        assert!(matches!(
            compute_rdf(&traj, &[(0, 1)], (0.0, 1.0), 0.005),
            Err(AnalysisError::MissingUnitCell { frame: 0 })
        ));
    }

    #[test]
    fn acquired_table_has_radius_then_one_column_per_pair_group() {
        let traj = boxed(
            &["C", "O", "N"],
            vec![vec![
                Point3::origin(),
                Point3::new(0.3, 0.0, 0.0),
                Point3::new(0.0, 0.4, 0.0),
            ]],
            3.0,
        );
        let table = acquire_rdfs(&traj, None, 0.0, 1.0, 0.005).unwrap();
        assert_eq!(
            table.labels().collect::<Vec<_>>(),
            ["Radius (nm)", "g(r) (C-O)", "g(r) (C-N)", "g(r) (O-N)"]
        );
        assert_eq!(table.n_rows(), 200);
    }
}

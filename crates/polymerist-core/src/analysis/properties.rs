use super::sasa::{self, SasaMode};
use super::trajectory::Trajectory;
use crate::core::linalg::geometry::centroid;
use nalgebra::{Matrix3, Point3, SymmetricEigen};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Per-frame observables available for time series analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyKind {
    #[serde(alias = "rg")]
    RadiusOfGyration,
    #[serde(alias = "sasa")]
    SolventAccessibleSurfaceArea,
    #[serde(alias = "k2")]
    RelativeShapeAnisotropy,
}

impl PropertyKind {
    pub const DEFAULTS: [PropertyKind; 3] = [
        PropertyKind::RadiusOfGyration,
        PropertyKind::SolventAccessibleSurfaceArea,
        PropertyKind::RelativeShapeAnisotropy,
    ];

    pub fn calculation(self) -> PropertyCalculation {
        let (name, abbr, unit) = match self {
            Self::RadiusOfGyration => ("Radius of Gyration", "Rg", "nm"),
            Self::SolventAccessibleSurfaceArea => {
                ("Solvent Accessible Surface Area", "SASA", "nm^2")
            }
            Self::RelativeShapeAnisotropy => ("Relative Shape Anisotropy", "K2", "dimensionless"),
        };
        PropertyCalculation {
            name,
            abbr,
            unit,
            kind: self,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown property '{0}' (expected one of: rg, sasa, k2)")]
pub struct ParsePropertyKindError(String);

impl FromStr for PropertyKind {
    type Err = ParsePropertyKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rg" | "radius-of-gyration" => Ok(Self::RadiusOfGyration),
            "sasa" | "solvent-accessible-surface-area" => Ok(Self::SolventAccessibleSurfaceArea),
            "k2" | "kappa2" | "relative-shape-anisotropy" => Ok(Self::RelativeShapeAnisotropy),
            _ => Err(ParsePropertyKindError(s.to_string())),
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.calculation().abbr)
    }
}

/// A labelled, unit-carrying observable computed once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyCalculation {
    pub name: &'static str,
    pub abbr: &'static str,
    pub unit: &'static str,
    pub kind: PropertyKind,
}

impl PropertyCalculation {
    /// Column label such as `Radius of Gyration (Rg, nm)`.
    pub fn label(&self) -> String {
        format!("{} ({}, {})", self.name, self.abbr, self.unit)
    }

    /// One value per frame. Properties with several values per frame (SASA per
    /// residue) are summed.
    pub fn compute(&self, traj: &Trajectory) -> Vec<f64> {
        match self.kind {
            PropertyKind::RadiusOfGyration => per_frame(traj, radius_of_gyration),
            PropertyKind::RelativeShapeAnisotropy => per_frame(traj, relative_shape_anisotropy),
            PropertyKind::SolventAccessibleSurfaceArea => sasa::shrake_rupley(
                traj,
                sasa::DEFAULT_PROBE_RADIUS,
                sasa::DEFAULT_N_SPHERE_POINTS,
                SasaMode::Residue,
            )
            .into_iter()
            .map(|per_residue| per_residue.iter().sum())
            .collect(),
        }
    }
}

pub fn default_properties() -> Vec<PropertyCalculation> {
    PropertyKind::DEFAULTS
        .iter()
        .map(|kind| kind.calculation())
        .collect()
}

fn per_frame(traj: &Trajectory, f: fn(&[Point3<f64>]) -> f64) -> Vec<f64> {
    #[cfg(feature = "parallel")]
    let frames = traj.frames().par_iter();
    #[cfg(not(feature = "parallel"))]
    let frames = traj.frames().iter();

    frames.map(|frame| f(&frame.positions)).collect()
}

/// Unweighted radius of gyration.
pub fn radius_of_gyration(positions: &[Point3<f64>]) -> f64 {
    let Some(center) = centroid(positions) else {
        return 0.0;
    };
    let mean_sq = positions
        .iter()
        .map(|p| (p - center).norm_squared())
        .sum::<f64>()
        / positions.len() as f64;
    mean_sq.sqrt()
}

/// Gyration tensor `S = <(r - c)(r - c)^T>` about the centroid.
pub fn gyration_tensor(positions: &[Point3<f64>]) -> Matrix3<f64> {
    let Some(center) = centroid(positions) else {
        return Matrix3::zeros();
    };
    positions
        .iter()
        .map(|p| {
            let d = p - center;
            d * d.transpose()
        })
        .sum::<Matrix3<f64>>()
        / positions.len() as f64
}

/// Relative shape anisotropy `k^2 = 3/2 * sum(l^2) / (sum l)^2 - 1/2` over the
/// gyration tensor eigenvalues; 0 for spherical symmetry, 1 for a line.
pub fn relative_shape_anisotropy(positions: &[Point3<f64>]) -> f64 {
    let eigenvalues = SymmetricEigen::new(gyration_tensor(positions)).eigenvalues;
    let trace: f64 = eigenvalues.iter().sum();
    if trace <= f64::EPSILON {
        return 0.0;
    }
    let sum_sq: f64 = eigenvalues.iter().map(|l| l * l).sum();
    1.5 * sum_sq / (trace * trace) - 0.5
}

//! 4x4 affine transformations in homogeneous coordinates.
//!
//! Every builder returns the identity matrix when given its neutral arguments
//! (zero offsets and angles, unit scale factors), so transforms can be composed
//! unconditionally by matrix multiplication. Rotations are right-handed and
//! measured in radians.

use nalgebra::{Matrix4, Point3};

pub type AffineMatrix = Matrix4<f64>;

pub fn identity() -> AffineMatrix {
    Matrix4::identity()
}

/// Isometric translation by `(x, y, z)`.
pub fn xyz_trans(x: f64, y: f64, z: f64) -> AffineMatrix {
    #[rustfmt::skip]
    let m = Matrix4::new(
        1.0, 0.0, 0.0, x,
        0.0, 1.0, 0.0, y,
        0.0, 0.0, 1.0, z,
        0.0, 0.0, 0.0, 1.0,
    );
    m
}

/// Rotation about the positive x-axis.
pub fn x_rot(angle_rad: f64) -> AffineMatrix {
    let (s, c) = angle_rad.sin_cos();
    #[rustfmt::skip]
    let m = Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0,   c,  -s, 0.0,
        0.0,   s,   c, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    m
}

/// Rotation about the positive y-axis.
pub fn y_rot(angle_rad: f64) -> AffineMatrix {
    let (s, c) = angle_rad.sin_cos();
    #[rustfmt::skip]
    let m = Matrix4::new(
          c, 0.0,   s, 0.0,
        0.0, 1.0, 0.0, 0.0,
         -s, 0.0,   c, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    m
}

/// Rotation about the positive z-axis.
pub fn z_rot(angle_rad: f64) -> AffineMatrix {
    let (s, c) = angle_rad.sin_cos();
    #[rustfmt::skip]
    let m = Matrix4::new(
          c,  -s, 0.0, 0.0,
          s,   c, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    m
}

/// Scales the basis vectors by `(sx, sy, sz)`.
pub fn xyz_scale(sx: f64, sy: f64, sz: f64) -> AffineMatrix {
    Matrix4::new_nonuniform_scaling(&nalgebra::Vector3::new(sx, sy, sz))
}

/// Shear factors for [`xyz_shear`]; `xy` displaces x in proportion to y, and so on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShearFactors {
    pub xy: f64,
    pub xz: f64,
    pub yx: f64,
    pub yz: f64,
    pub zx: f64,
    pub zy: f64,
}

pub fn xyz_shear(factors: ShearFactors) -> AffineMatrix {
    let ShearFactors {
        xy,
        xz,
        yx,
        yz,
        zx,
        zy,
    } = factors;
    #[rustfmt::skip]
    let m = Matrix4::new(
        1.0,  xy,  xz, 0.0,
         yx, 1.0,  yz, 0.0,
         zx,  zy, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    m
}

pub fn apply_to_point(transform: &AffineMatrix, point: &Point3<f64>) -> Point3<f64> {
    transform.transform_point(point)
}

pub fn apply_to_points(transform: &AffineMatrix, points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    points.iter().map(|p| transform.transform_point(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_point_eq(a: &Point3<f64>, b: &Point3<f64>) {
        assert!((a - b).norm() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn neutral_arguments_give_identity() {
        assert_eq!(xyz_trans(0.0, 0.0, 0.0), identity());
        assert_eq!(x_rot(0.0), identity());
        assert_eq!(y_rot(0.0), identity());
        assert_eq!(z_rot(0.0), identity());
        assert_eq!(xyz_scale(1.0, 1.0, 1.0), identity());
        assert_eq!(xyz_shear(ShearFactors::default()), identity());
    }

    #[test]
    fn translation_moves_points() {
        let moved = apply_to_point(&xyz_trans(1.0, -2.0, 0.5), &Point3::new(1.0, 1.0, 1.0));
        assert_point_eq(&moved, &Point3::new(2.0, -1.0, 1.5));
    }

    #[test]
    fn rotations_are_right_handed() {
        let x = Point3::new(1.0, 0.0, 0.0);
        let y = Point3::new(0.0, 1.0, 0.0);
        let z = Point3::new(0.0, 0.0, 1.0);
        assert_point_eq(&apply_to_point(&z_rot(FRAC_PI_2), &x), &y);
        assert_point_eq(&apply_to_point(&x_rot(FRAC_PI_2), &y), &z);
        assert_point_eq(&apply_to_point(&y_rot(FRAC_PI_2), &z), &x);
    }

    #[test]
    fn scaling_and_shear_act_on_coordinates() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_point_eq(
            &apply_to_point(&xyz_scale(2.0, 0.5, -1.0), &p),
            &Point3::new(2.0, 1.0, -3.0),
        );
        let shear = xyz_shear(ShearFactors {
            xy: 1.0,
            ..Default::default()
        });
        assert_point_eq(&apply_to_point(&shear, &p), &Point3::new(3.0, 2.0, 3.0));
    }

    #[test]
    fn composition_applies_right_to_left() {
        let transform = xyz_trans(0.0, 0.0, 1.0) * z_rot(FRAC_PI_2);
        let points = apply_to_points(&transform, &[Point3::new(1.0, 0.0, 0.0)]);
        assert_point_eq(&points[0], &Point3::new(0.0, 1.0, 1.0));
    }
}

pub mod affine;
pub mod geometry;

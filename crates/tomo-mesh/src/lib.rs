//! Coordinate discretization for tomographic inversion.
//!
//! Axes describe single coordinate dimensions, a [`mesh::Mesh`] composes
//! them into the shape of solution and detector-geometry arrays, and the
//! intersection engine computes the overlap of arbitrary polygons with
//! every mesh cell.

pub mod axis;
pub mod geometry;
pub mod intersection;
pub mod mesh;
pub mod polar;

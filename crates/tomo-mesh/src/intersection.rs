// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Cell Intersection Engine
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Intersection of query regions with mesh cells.
//!
//! This is the primitive behind detector-response construction: a
//! line-of-sight polygon is intersected with every cell of the mesh,
//! producing the per-cell sensitivity of one detector. Dispatch is on
//! axis capability: a single 2D axis provides its own cell polygons,
//! a pair of 1D axes is crossed into boundary rectangles.

use ndarray::{ArrayD, IxDyn};
use tomo_types::error::{TomoError, TomoResult};

use crate::geometry::{distance, Polygon};
use crate::mesh::Mesh;

/// Per-cell intersection measure of a convex query `polygon` with every
/// cell addressed by `index`.
///
/// With `calc_area` the exact intersection area is computed; otherwise
/// cells that merely overlap the polygon are marked with 1 (cheaper when
/// only topological overlap matters).
///
/// `index` names one 2D axis (1-D result) or two 1D axes (2-D result);
/// any other combination is a geometry error.
pub fn polygon_on_mesh(
    mesh: &Mesh,
    polygon: &Polygon,
    index: &[usize],
    calc_area: bool,
) -> TomoResult<ArrayD<f64>> {
    check_index(mesh, index)?;
    let first = mesh.axis(index[0]);
    if first.dimension() == 2 {
        let cells = first.cell_polygons().ok_or_else(|| {
            TomoError::Geometry(format!(
                "2D axis '{}' does not expose cell polygons",
                first.name()
            ))
        })?;
        let mut result = ArrayD::zeros(IxDyn(&[first.size()]));
        for (i, cell) in cells.iter().enumerate() {
            result[[i]] = measure(cell, polygon, calc_area);
        }
        return Ok(result);
    }
    if index.len() < 2 {
        return Err(TomoError::Geometry(
            "a 1D axis pair is required to build a 2D object".to_string(),
        ));
    }
    let second = mesh.axis(index[1]);
    let cells = first.cell_edges2d(second)?;
    let mut result = ArrayD::zeros(IxDyn(&[first.size(), second.size()]));
    for (i, row) in cells.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            result[[i, j]] = measure(cell, polygon, calc_area);
        }
    }
    Ok(result)
}

fn measure(cell: &Polygon, query: &Polygon, calc_area: bool) -> f64 {
    if calc_area {
        cell.intersection_area(query)
    } else if cell.intersects(query) {
        1.0
    } else {
        0.0
    }
}

/// Area of each cell addressed by `index`.
pub fn cell_areas(mesh: &Mesh, index: &[usize]) -> TomoResult<ArrayD<f64>> {
    check_index(mesh, index)?;
    let first = mesh.axis(index[0]);
    if first.dimension() == 2 {
        let cells = first.cell_polygons().ok_or_else(|| {
            TomoError::Geometry(format!(
                "2D axis '{}' does not expose cell polygons",
                first.name()
            ))
        })?;
        let mut areas = ArrayD::zeros(IxDyn(&[first.size()]));
        for (i, cell) in cells.iter().enumerate() {
            areas[[i]] = cell.area();
        }
        return Ok(areas);
    }
    if index.len() < 2 {
        return Err(TomoError::Geometry(
            "a 1D axis pair is required for cell areas".to_string(),
        ));
    }
    let second = mesh.axis(index[1]);
    let cells = first.cell_edges2d(second)?;
    let mut areas = ArrayD::zeros(IxDyn(&[first.size(), second.size()]));
    for (i, row) in cells.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            areas[[i, j]] = cell.area();
        }
    }
    Ok(areas)
}

/// Euclidean distance from `p` to the centroid of each cell addressed by
/// `index`. The centroid (not the nearest boundary point) is the
/// accepted approximation for radius-dependent response falloff.
pub fn cell_distances(mesh: &Mesh, index: &[usize], p: [f64; 2]) -> TomoResult<ArrayD<f64>> {
    check_index(mesh, index)?;
    let first = mesh.axis(index[0]);
    if first.dimension() == 2 {
        let centroids = first.centroids().ok_or_else(|| {
            TomoError::Geometry(format!(
                "2D axis '{}' does not expose centroids",
                first.name()
            ))
        })?;
        let mut distances = ArrayD::zeros(IxDyn(&[first.size()]));
        for (i, &c) in centroids.iter().enumerate() {
            distances[[i]] = distance(p, c);
        }
        return Ok(distances);
    }
    if index.len() < 2 {
        return Err(TomoError::Geometry(
            "a 1D axis pair is required for cell distances".to_string(),
        ));
    }
    let second = mesh.axis(index[1]);
    let c1 = first.coordinates().ok_or_else(|| {
        TomoError::Geometry(format!("axis '{}' has no 1D coordinates", first.name()))
    })?;
    let c2 = second.coordinates().ok_or_else(|| {
        TomoError::Geometry(format!("axis '{}' has no 1D coordinates", second.name()))
    })?;
    let mut distances = ArrayD::zeros(IxDyn(&[first.size(), second.size()]));
    for i in 0..first.size() {
        for j in 0..second.size() {
            distances[[i, j]] = distance(p, [c1[i], c2[j]]);
        }
    }
    Ok(distances)
}

/// Broadcast a low-dimensional per-cell array to the full mesh shape:
/// value `data[i, j]` is replicated across every position whose
/// coordinates at the `index` dimensions are `(i, j)`.
pub fn broadcast_to_shape(
    data: &ArrayD<f64>,
    index: &[usize],
    shape: &[usize],
) -> TomoResult<ArrayD<f64>> {
    if data.ndim() == shape.len() {
        if data.shape() == shape {
            return Ok(data.clone());
        }
        return Err(TomoError::Consistency(format!(
            "cannot broadcast shape {:?} to {:?}",
            data.shape(),
            shape
        )));
    }
    if index.len() != data.ndim() {
        return Err(TomoError::Consistency(format!(
            "{} broadcast indices given for a {}-dimensional array",
            index.len(),
            data.ndim()
        )));
    }
    for (d, &i) in index.iter().enumerate() {
        if i >= shape.len() || data.shape()[d] != shape[i] {
            return Err(TomoError::Consistency(format!(
                "broadcast axis {d} (extent {}) does not fit target axis {i} of shape {:?}",
                data.shape()[d],
                shape
            )));
        }
    }
    Ok(ArrayD::from_shape_fn(IxDyn(shape), |idx| {
        let src: Vec<usize> = index.iter().map(|&i| idx[i]).collect();
        data[IxDyn(&src)]
    }))
}

fn check_index(mesh: &Mesh, index: &[usize]) -> TomoResult<()> {
    if index.is_empty() {
        return Err(TomoError::Config("empty axis index list".to_string()));
    }
    for &i in index {
        if i >= mesh.axes().len() {
            return Err(TomoError::Config(format!(
                "axis index {i} out of range for mesh with {} axes",
                mesh.axes().len()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{Axis, RegularAxis};
    use crate::polar::PolarAxis;

    fn mesh_2d() -> Mesh {
        Mesh::new(vec![
            Box::new(RegularAxis::new("x", "cm", 0.0, 4.0, 4).unwrap()),
            Box::new(RegularAxis::new("y", "cm", 0.0, 4.0, 4).unwrap()),
        ])
    }

    #[test]
    fn test_polygon_on_mesh_area() {
        let mesh = mesh_2d();
        // Covers cells (0,0), (0,1), (1,0), (1,1) exactly.
        let query = Polygon::new(vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]);
        let result = polygon_on_mesh(&mesh, &query, &[0, 1], true).unwrap();
        assert_eq!(result.shape(), &[4, 4]);
        assert!((result[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((result[[1, 1]] - 1.0).abs() < 1e-12);
        assert!(result[[2, 2]].abs() < 1e-12);
        assert!((result.sum() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_polygon_on_mesh_partial_cover() {
        let mesh = mesh_2d();
        let query = Polygon::new(vec![[0.5, 0.5], [1.0, 0.5], [1.0, 1.0], [0.5, 1.0]]);
        let result = polygon_on_mesh(&mesh, &query, &[0, 1], true).unwrap();
        assert!((result[[0, 0]] - 0.25).abs() < 1e-12);
        assert!((result.sum() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_polygon_on_mesh_boolean_mode() {
        let mesh = mesh_2d();
        let query = Polygon::new(vec![[0.5, 0.5], [1.5, 0.5], [1.5, 1.5], [0.5, 1.5]]);
        let result = polygon_on_mesh(&mesh, &query, &[0, 1], false).unwrap();
        assert_eq!(result[[0, 0]], 1.0);
        assert_eq!(result[[1, 1]], 1.0);
        assert_eq!(result[[2, 2]], 0.0);
        assert!((result.sum() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_polygon_on_polar_mesh() {
        let border = vec![
            [2.0, 0.0],
            [0.0, 2.0],
            [-2.0, 0.0],
            [0.0, -2.0],
        ];
        let axis = PolarAxis::new("web", "m", &border, [0.0, 0.0], 2, 4).unwrap();
        let total_area: f64 = axis.volumes().sum();
        let mesh = Mesh::new(vec![Box::new(axis)]);
        // Query covering the whole border diamond.
        let query = Polygon::new(vec![[3.0, -3.0], [3.0, 3.0], [-3.0, 3.0], [-3.0, -3.0]]);
        let result = polygon_on_mesh(&mesh, &query, &[0], true).unwrap();
        assert_eq!(result.shape(), &[8]);
        assert!((result.sum() - total_area).abs() < 1e-10);
    }

    #[test]
    fn test_cell_areas() {
        let mesh = mesh_2d();
        let areas = cell_areas(&mesh, &[0, 1]).unwrap();
        assert!((areas.sum() - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_cell_distances() {
        let mesh = mesh_2d();
        let distances = cell_distances(&mesh, &[0, 1], [0.5, 0.5]).unwrap();
        assert!(distances[[0, 0]].abs() < 1e-12);
        assert!((distances[[0, 1]] - 1.0).abs() < 1e-12);
        assert!((distances[[1, 1]] - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_broadcast_to_shape() {
        let data = ArrayD::from_shape_vec(IxDyn(&[2]), vec![3.0, 5.0]).unwrap();
        let out = broadcast_to_shape(&data, &[1], &[3, 2]).unwrap();
        assert_eq!(out.shape(), &[3, 2]);
        for i in 0..3 {
            assert_eq!(out[[i, 0]], 3.0);
            assert_eq!(out[[i, 1]], 5.0);
        }
        assert!(broadcast_to_shape(&data, &[0], &[3, 2]).is_err());
    }

    #[test]
    fn test_single_1d_axis_is_rejected() {
        let mesh = mesh_2d();
        let query = Polygon::new(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        assert!(polygon_on_mesh(&mesh, &query, &[0], true).is_err());
        assert!(polygon_on_mesh(&mesh, &query, &[9, 1], true).is_err());
    }
}

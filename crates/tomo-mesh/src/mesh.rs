// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Mesh
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ordered composition of coordinate axes.
//!
//! One axis always corresponds to one dimension of any solution or
//! detector-geometry array bound to the mesh; axis order defines the
//! index-to-axis correspondence for all downstream arrays.

use ndarray::{ArrayD, Axis as NdAxis, IxDyn};
use tomo_types::config::AxisConfig;
use tomo_types::error::{TomoError, TomoResult};

use crate::axis::{Axis, RegularAxis};

/// Reduction mode for [`Mesh::integrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integration {
    /// Multiply by cell volumes before summing. Converts a density into
    /// a cell-count/material-budget quantity; used for solutions.
    Integrate,
    /// Plain sum. Used for detector-geometry slices, which are already
    /// per-cell weighted.
    Sum,
}

pub struct Mesh {
    axes: Vec<Box<dyn Axis>>,
    dimension: usize,
}

impl Mesh {
    pub fn new(axes: Vec<Box<dyn Axis>>) -> Self {
        let dimension = axes.iter().map(|ax| ax.dimension()).sum();
        Mesh { axes, dimension }
    }

    pub fn empty() -> Self {
        Mesh {
            axes: Vec::new(),
            dimension: 0,
        }
    }

    /// Build a mesh of regular axes from the configuration schema.
    pub fn from_config(axes: &[AxisConfig]) -> TomoResult<Self> {
        let mut built: Vec<Box<dyn Axis>> = Vec::with_capacity(axes.len());
        for ax in axes {
            built.push(Box::new(RegularAxis::new(
                &ax.name,
                &ax.units,
                ax.lower_limit,
                ax.upper_limit,
                ax.size,
            )?));
        }
        Ok(Mesh::new(built))
    }

    pub fn axes(&self) -> &[Box<dyn Axis>] {
        &self.axes
    }

    pub fn axis(&self, index: usize) -> &dyn Axis {
        self.axes[index].as_ref()
    }

    /// Number of real-world dimensions; at least the number of axes,
    /// since an axis may represent more than one dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Extent of each array dimension of data bound to this mesh.
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(|ax| ax.size()).collect()
    }

    pub fn add_axis(&mut self, axis: Box<dyn Axis>) {
        self.dimension += axis.dimension();
        self.axes.push(axis);
    }

    pub fn remove_axis(&mut self, index: usize) -> TomoResult<Box<dyn Axis>> {
        if index >= self.axes.len() {
            return Err(TomoError::Config(format!(
                "axis index {index} out of range for mesh with {} axes",
                self.axes.len()
            )));
        }
        let axis = self.axes.remove(index);
        self.dimension -= axis.dimension();
        Ok(axis)
    }

    /// Per-cell volume array, the outer product of the axis volumes.
    pub fn cell_volumes(&self) -> ArrayD<f64> {
        let shape = self.shape();
        ArrayD::from_shape_fn(IxDyn(&shape), |idx| {
            self.axes
                .iter()
                .enumerate()
                .map(|(d, ax)| ax.volumes()[idx[d]])
                .product()
        })
    }

    /// Reduce `data` over the given axes.
    ///
    /// Reducing one axis shifts the positional index of every axis that
    /// follows it, so the requested indices always refer to the
    /// original mesh ordering regardless of reduction order.
    pub fn integrate(
        &self,
        data: &ArrayD<f64>,
        indices: &[usize],
        mode: Integration,
    ) -> TomoResult<ArrayD<f64>> {
        let shape = self.shape();
        if data.shape() != shape.as_slice() {
            return Err(TomoError::Consistency(format!(
                "data shape {:?} does not match mesh shape {:?}",
                data.shape(),
                shape
            )));
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&bad) = sorted.iter().find(|&&i| i >= self.axes.len()) {
            return Err(TomoError::Config(format!(
                "axis index {bad} out of range for mesh with {} axes",
                self.axes.len()
            )));
        }
        let mut result = data.clone();
        for (reduced, &index) in sorted.iter().enumerate() {
            let position = index - reduced;
            if mode == Integration::Integrate {
                multiply_along_axis(&mut result, self.axes[index].volumes(), position);
            }
            result = result.sum_axis(NdAxis(position));
        }
        Ok(result)
    }

    /// Volume-weighted reduction over the complement of `indices`.
    pub fn integrate_other(&self, data: &ArrayD<f64>, indices: &[usize]) -> TomoResult<ArrayD<f64>> {
        self.integrate(data, &self.other_indices(indices), Integration::Integrate)
    }

    /// Plain sum over the complement of `indices`.
    pub fn sum_other(&self, data: &ArrayD<f64>, indices: &[usize]) -> TomoResult<ArrayD<f64>> {
        self.integrate(data, &self.other_indices(indices), Integration::Sum)
    }

    fn other_indices(&self, indices: &[usize]) -> Vec<usize> {
        (0..self.axes.len())
            .filter(|i| !indices.contains(i))
            .collect()
    }
}

impl std::fmt::Display for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}D mesh with {} axes:", self.dimension, self.axes.len())?;
        for (i, ax) in self.axes.iter().enumerate() {
            writeln!(
                f,
                "{}. {}D {} axis '{}' with {} cells [{}]",
                i + 1,
                ax.dimension(),
                if ax.regular() { "regular" } else { "irregular" },
                ax.name(),
                ax.size(),
                ax.units()
            )?;
        }
        Ok(())
    }
}

/// Multiply an N-D array by a 1D weight vector along one axis, in place.
fn multiply_along_axis(data: &mut ArrayD<f64>, weights: &ndarray::Array1<f64>, axis: usize) {
    for (i, mut lane) in data.axis_iter_mut(NdAxis(axis)).enumerate() {
        lane.mapv_inplace(|v| v * weights[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    fn mesh_2d() -> Mesh {
        Mesh::new(vec![
            Box::new(RegularAxis::new("x", "cm", 0.0, 2.0, 2).unwrap()),
            Box::new(RegularAxis::new("y", "cm", 0.0, 3.0, 3).unwrap()),
        ])
    }

    #[test]
    fn test_shape_and_dimension() {
        let mesh = mesh_2d();
        assert_eq!(mesh.shape(), vec![2, 3]);
        assert_eq!(mesh.dimension(), 2);
    }

    #[test]
    fn test_add_remove_axis() {
        let mut mesh = mesh_2d();
        mesh.add_axis(Box::new(RegularAxis::new("z", "cm", 0.0, 1.0, 4).unwrap()));
        assert_eq!(mesh.shape(), vec![2, 3, 4]);
        assert_eq!(mesh.dimension(), 3);
        mesh.remove_axis(1).unwrap();
        assert_eq!(mesh.shape(), vec![2, 4]);
        assert_eq!(mesh.dimension(), 2);
        assert!(mesh.remove_axis(5).is_err());
    }

    #[test]
    fn test_polar_axis_counts_two_dimensions() {
        let border = vec![
            [1.0, 0.0],
            [0.0, 1.0],
            [-1.0, 0.0],
            [0.0, -1.0],
        ];
        let mut mesh = Mesh::new(vec![Box::new(
            crate::polar::PolarAxis::new("web", "m", &border, [0.0, 0.0], 2, 4).unwrap(),
        )]);
        assert_eq!(mesh.dimension(), 2);
        assert_eq!(mesh.shape(), vec![8]);
        mesh.add_axis(Box::new(RegularAxis::new("phi", "rad", 0.0, 1.0, 3).unwrap()));
        assert_eq!(mesh.dimension(), 3);
    }

    #[test]
    fn test_cell_volumes_outer_product() {
        let mesh = mesh_2d();
        let volumes = mesh.cell_volumes();
        assert_eq!(volumes.shape(), &[2, 3]);
        // Every cell is 1 x 1.
        for &v in volumes.iter() {
            assert!((v - 1.0).abs() < 1e-12);
        }
        assert!((volumes.sum() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_integrate_single_axis() {
        let mesh = mesh_2d();
        let data = ArrayD::from_shape_vec(
            IxDyn(&[2, 3]),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )
        .unwrap();
        // Integrate over x (axis 0, dv = 1): column sums.
        let reduced = mesh.integrate(&data, &[0], Integration::Integrate).unwrap();
        assert_eq!(reduced.shape(), &[3]);
        assert!((reduced[[0]] - 5.0).abs() < 1e-12);
        assert!((reduced[[2]] - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_integrate_axis_shift_bookkeeping() {
        // 3-axis mesh with distinct cell widths; reducing axes 0 and 2
        // together must weight axis 2 by its own volumes even though its
        // position shifts after axis 0 is reduced.
        let mesh = Mesh::new(vec![
            Box::new(RegularAxis::new("x", "", 0.0, 2.0, 2).unwrap()), // dv = 1
            Box::new(RegularAxis::new("y", "", 0.0, 3.0, 3).unwrap()), // dv = 1
            Box::new(RegularAxis::new("z", "", 0.0, 8.0, 4).unwrap()), // dv = 2
        ]);
        let data = ArrayD::from_elem(IxDyn(&[2, 3, 4]), 1.0);
        let reduced = mesh.integrate(&data, &[0, 2], Integration::Integrate).unwrap();
        assert_eq!(reduced.shape(), &[3]);
        // sum over x: 2 cells * dv 1 = 2; over z: 4 cells * dv 2 = 8.
        for &v in reduced.iter() {
            assert!((v - 16.0).abs() < 1e-12, "got {v}");
        }
        // Order of the requested indices must not matter.
        let swapped = mesh.integrate(&data, &[2, 0], Integration::Integrate).unwrap();
        assert_eq!(swapped.shape(), &[3]);
        assert!((swapped[[1]] - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_integrate_all_axes_matches_cell_volume_sum() {
        let mesh = mesh_2d();
        let data = ArrayD::from_elem(IxDyn(&[2, 3]), 2.0);
        let total = mesh
            .integrate(&data, &[0, 1], Integration::Integrate)
            .unwrap();
        assert_eq!(total.ndim(), 0);
        assert!((total[IxDyn(&[])] - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_sum_other() {
        let mesh = mesh_2d();
        let data = ArrayD::from_shape_vec(
            IxDyn(&[2, 3]),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )
        .unwrap();
        // Keep axis 1: plain sum over axis 0.
        let kept = mesh.sum_other(&data, &[1]).unwrap();
        assert_eq!(kept.shape(), &[3]);
        assert!((kept[[1]] - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_integrate_shape_mismatch() {
        let mesh = mesh_2d();
        let data = ArrayD::from_elem(IxDyn(&[3, 2]), 1.0);
        assert!(mesh.integrate(&data, &[0], Integration::Sum).is_err());
    }

    #[test]
    fn test_integrate_bad_index() {
        let mesh = mesh_2d();
        let data = ArrayD::from_elem(IxDyn(&[2, 3]), 1.0);
        assert!(mesh.integrate(&data, &[2], Integration::Sum).is_err());
    }

    #[test]
    fn test_from_config() {
        use tomo_types::config::AxisConfig;
        let mesh = Mesh::from_config(&[
            AxisConfig {
                name: "x".into(),
                units: "cm".into(),
                size: 4,
                lower_limit: 0.0,
                upper_limit: 8.0,
            },
            AxisConfig {
                name: "y".into(),
                units: "cm".into(),
                size: 2,
                lower_limit: -1.0,
                upper_limit: 1.0,
            },
        ])
        .unwrap();
        assert_eq!(mesh.shape(), vec![4, 2]);
        assert!((mesh.axis(0).volumes()[0] - 2.0).abs() < 1e-12);
    }
}

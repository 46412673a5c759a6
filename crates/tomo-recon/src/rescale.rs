// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Mesh Rescaling
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Reversible regridding of a model onto a differently-shaped mesh.
//!
//! Redistribution works per axis through the pairwise cell-overlap
//! table. The solution is treated as a density and redistributed
//! mass-conservingly; detector geometry weights are split between new
//! cells in proportion to the overlapped fraction of each old cell.
//! Irregular axes keep their proportions; no smoothing is applied.

use ndarray::{Array1, Array2, ArrayD, Axis as NdAxis};
use tomo_mesh::axis::{Axis, IrregularAxis, RegularAxis};
use tomo_mesh::mesh::Mesh;
use tomo_types::error::{TomoError, TomoResult};

use crate::model::Model;

/// Regrids a model to `new_shape` with [`Rescaler::forward`]; the
/// previous shape is cached so [`Rescaler::backward`] can restore the
/// original discretization.
pub struct Rescaler {
    new_shape: Vec<usize>,
    old_shape: Option<Vec<usize>>,
}

impl Rescaler {
    pub fn new(new_shape: Vec<usize>) -> Self {
        Rescaler {
            new_shape,
            old_shape: None,
        }
    }

    pub fn forward(&mut self, model: &mut Model) -> TomoResult<()> {
        let old_shape = model
            .mesh()
            .ok_or_else(|| TomoError::Config("rescale: model mesh is not defined".into()))?
            .shape();
        rescale(model, &self.new_shape)?;
        self.old_shape = Some(old_shape);
        Ok(())
    }

    pub fn backward(&mut self, model: &mut Model) -> TomoResult<()> {
        let old_shape = self
            .old_shape
            .take()
            .ok_or_else(|| TomoError::Config("rescale: backward called before forward".into()))?;
        rescale(model, &old_shape)
    }
}

fn rescale(model: &mut Model, new_shape: &[usize]) -> TomoResult<()> {
    let mesh = model
        .mesh()
        .ok_or_else(|| TomoError::Config("rescale: model mesh is not defined".into()))?;
    if mesh.axes().len() != new_shape.len() {
        return Err(TomoError::Config(format!(
            "rescale: new shape has {} axes, mesh has {}",
            new_shape.len(),
            mesh.axes().len()
        )));
    }

    let mut new_axes: Vec<Box<dyn Axis>> = Vec::with_capacity(new_shape.len());
    let mut tables: Vec<Array2<f64>> = Vec::with_capacity(new_shape.len());
    for (axis, &new_size) in mesh.axes().iter().zip(new_shape.iter()) {
        if new_size == 0 {
            return Err(TomoError::Config(
                "rescale: axis size must be positive".into(),
            ));
        }
        let new_axis = resample_axis(axis.as_ref(), new_size)?;
        tables.push(axis.intersection(new_axis.as_ref())?);
        new_axes.push(new_axis);
    }

    let solution = match model.solution() {
        Some(solution) => {
            let mut data = solution.clone();
            for (d, table) in tables.iter().enumerate() {
                let new_widths = new_axes[d].volumes();
                // Density rule: collect overlapped mass, renormalize by
                // the new cell width.
                let weights = Array2::from_shape_fn(table.raw_dim(), |(i, j)| {
                    table[[i, j]] / new_widths[j]
                });
                data = apply_table(&data, &weights, d);
            }
            Some(data)
        }
        None => None,
    };

    let geometry = match model.detector_geometry() {
        Some(geometry) => {
            let mut data = geometry.clone();
            for (d, table) in tables.iter().enumerate() {
                let old_widths = mesh.axis(d).volumes();
                // Weight rule: each old cell's weight splits in
                // proportion to the fraction of it covered.
                let weights = Array2::from_shape_fn(table.raw_dim(), |(i, j)| {
                    table[[i, j]] / old_widths[i]
                });
                // Array axis 0 indexes detectors.
                data = apply_table(&data, &weights, d + 1);
            }
            Some(data)
        }
        None => None,
    };

    model.replace_discretization(Mesh::new(new_axes), geometry, solution)
}

/// Builds the rescaled counterpart of a 1-D axis. Regular axes stay
/// regular over the same limits; irregular axes resample their edge
/// polyline at equal index fractions, preserving proportions.
fn resample_axis(axis: &dyn Axis, new_size: usize) -> TomoResult<Box<dyn Axis>> {
    let edges = axis.cell_edges().ok_or_else(|| {
        TomoError::Geometry(format!(
            "rescale: axis '{}' has no 1-D cell edges and cannot be rescaled",
            axis.name()
        ))
    })?;
    if axis.regular() {
        let lower = edges[0];
        let upper = edges[edges.len() - 1];
        return Ok(Box::new(RegularAxis::new(
            axis.name(),
            axis.units(),
            lower,
            upper,
            new_size,
        )?));
    }
    let new_edges = resample_edges(edges, new_size);
    Ok(Box::new(IrregularAxis::from_edges(
        axis.name(),
        axis.units(),
        &new_edges,
    )?))
}

/// Piecewise-linear resampling of an edge polyline at index fractions
/// k/new_size. Endpoints are preserved exactly.
fn resample_edges(edges: &Array1<f64>, new_size: usize) -> Vec<f64> {
    let old_size = edges.len() - 1;
    (0..=new_size)
        .map(|k| {
            if k == new_size {
                return edges[old_size];
            }
            let t = k as f64 * old_size as f64 / new_size as f64;
            let i = t.floor() as usize;
            let frac = t - i as f64;
            edges[i] + frac * (edges[i + 1] - edges[i])
        })
        .collect()
}

/// Applies a redistribution table along one array axis:
/// `out[.., j, ..] = sum_i in[.., i, ..] * weights[i, j]`.
fn apply_table(data: &ArrayD<f64>, weights: &Array2<f64>, axis: usize) -> ArrayD<f64> {
    let mut shape = data.shape().to_vec();
    shape[axis] = weights.ncols();
    let mut out = ArrayD::<f64>::zeros(shape);
    for (in_lane, mut out_lane) in data
        .lanes(NdAxis(axis))
        .into_iter()
        .zip(out.lanes_mut(NdAxis(axis)))
    {
        for (i, &v) in in_lane.iter().enumerate() {
            if v == 0.0 {
                continue;
            }
            for (j, o) in out_lane.iter_mut().enumerate() {
                *o += v * weights[[i, j]];
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1 as Arr1, IxDyn};

    fn mesh_1d(size: usize) -> Mesh {
        Mesh::new(vec![Box::new(
            RegularAxis::new("x", "cm", 0.0, 10.0, size).unwrap(),
        )])
    }

    fn total_mass(model: &Model) -> f64 {
        let sol = model.solution().unwrap();
        let vol = model.mesh().unwrap().cell_volumes();
        sol.iter().zip(vol.iter()).map(|(s, v)| s * v).sum()
    }

    #[test]
    fn test_coarsen_conserves_mass() {
        let mut model = Model::default();
        model.set_mesh(mesh_1d(4)).unwrap();
        model
            .set_solution(
                ArrayD::from_shape_vec(IxDyn(&[4]), vec![1.0, 3.0, 2.0, 0.5]).unwrap(),
            )
            .unwrap();
        let before = total_mass(&model);
        let mut rescaler = Rescaler::new(vec![2]);
        rescaler.forward(&mut model).unwrap();
        assert_eq!(model.solution().unwrap().shape(), &[2]);
        assert!((total_mass(&model) - before).abs() < 1e-12);
        // Uniform halves average their children.
        assert!((model.solution().unwrap()[[0]] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_backward_restores_shape_and_mass() {
        let mut model = Model::default();
        model.set_mesh(mesh_1d(6)).unwrap();
        model
            .set_solution(
                ArrayD::from_shape_vec(
                    IxDyn(&[6]),
                    vec![0.0, 1.0, 4.0, 4.0, 1.0, 0.0],
                )
                .unwrap(),
            )
            .unwrap();
        let before = total_mass(&model);
        let mut rescaler = Rescaler::new(vec![3]);
        rescaler.forward(&mut model).unwrap();
        rescaler.backward(&mut model).unwrap();
        assert_eq!(model.solution().unwrap().shape(), &[6]);
        assert!((total_mass(&model) - before).abs() < 1e-12);
    }

    #[test]
    fn test_geometry_weight_columns_conserved() {
        let mut model = Model::default();
        model.set_mesh(mesh_1d(4)).unwrap();
        model
            .set_detector_geometry(
                ArrayD::from_shape_vec(
                    IxDyn(&[1, 4]),
                    vec![0.2, 0.8, 0.8, 0.2],
                )
                .unwrap(),
            )
            .unwrap();
        let mut rescaler = Rescaler::new(vec![2]);
        rescaler.forward(&mut model).unwrap();
        let geometry = model.detector_geometry().unwrap();
        assert_eq!(geometry.shape(), &[1, 2]);
        let total: f64 = geometry.iter().sum();
        assert!((total - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_irregular_axis_keeps_proportions() {
        let edges = [0.0, 1.0, 3.0, 7.0, 15.0];
        let axis = IrregularAxis::from_edges("r", "", &edges).unwrap();
        let resampled = resample_edges(axis.cell_edges().unwrap(), 2);
        // Every second original edge survives.
        assert_eq!(resampled, vec![0.0, 3.0, 15.0]);
    }

    #[test]
    fn test_round_trip_2d() {
        let mut model = Model::default();
        let mesh = Mesh::new(vec![
            Box::new(RegularAxis::new("x", "cm", 0.0, 2.0, 20).unwrap()),
            Box::new(RegularAxis::new("y", "cm", 0.0, 3.0, 30).unwrap()),
        ]);
        model.set_mesh(mesh).unwrap();
        let solution = ArrayD::from_shape_fn(IxDyn(&[20, 30]), |idx| {
            (idx[0] as f64 * 0.3).sin().abs() + idx[1] as f64 * 0.01
        });
        model.set_solution(solution).unwrap();
        let before = total_mass(&model);
        let mut rescaler = Rescaler::new(vec![10, 15]);
        rescaler.forward(&mut model).unwrap();
        assert_eq!(model.solution().unwrap().shape(), &[10, 15]);
        assert!((total_mass(&model) - before).abs() < 1e-9);
        rescaler.backward(&mut model).unwrap();
        assert_eq!(model.solution().unwrap().shape(), &[20, 30]);
        assert!((total_mass(&model) - before).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_wrong_axis_count() {
        let mut model = Model::default();
        model.set_mesh(mesh_1d(4)).unwrap();
        let mut rescaler = Rescaler::new(vec![2, 2]);
        assert!(rescaler.forward(&mut model).is_err());
    }

    #[test]
    fn test_polar_axis_is_geometry_error() {
        let border = vec![[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
        let mut model = Model::default();
        model
            .set_mesh(Mesh::new(vec![Box::new(
                tomo_mesh::polar::PolarAxis::new("web", "m", &border, [0.0, 0.0], 2, 4).unwrap(),
            )]))
            .unwrap();
        let mut rescaler = Rescaler::new(vec![4]);
        match rescaler.forward(&mut model) {
            Err(TomoError::Geometry(_)) => {}
            other => panic!("expected geometry error, got {other:?}"),
        }
    }

    #[test]
    fn test_backward_before_forward_is_error() {
        let mut model = Model::default();
        model.set_mesh(mesh_1d(4)).unwrap();
        let mut rescaler = Rescaler::new(vec![2]);
        assert!(rescaler.backward(&mut model).is_err());
    }

    #[test]
    fn test_signal_untouched_by_rescale() {
        let mut model = Model::default();
        model.set_mesh(mesh_1d(4)).unwrap();
        model
            .set_detector_geometry(ArrayD::from_elem(IxDyn(&[2, 4]), 0.5))
            .unwrap();
        model
            .set_detector_signal(Arr1::from(vec![1.0, 2.0]))
            .unwrap();
        let mut rescaler = Rescaler::new(vec![8]);
        rescaler.forward(&mut model).unwrap();
        assert_eq!(model.detector_signal().unwrap().len(), 2);
        assert_eq!(model.detector_geometry().unwrap().shape(), &[2, 8]);
    }
}

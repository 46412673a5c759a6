// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Algebraic Reconstruction
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Algebraic reconstruction: sequential ART and block-parallel SIRT.
//!
//! Both algorithms correct the solution with the per-detector
//! discrepancy between the measured and the expected signal, projected
//! back through the detector geometry and normalized by the detector's
//! sum of squared weights. ART applies corrections one detector at a
//! time, re-projecting after each; SIRT averages the corrections of a
//! detector block computed against the same starting solution.

use ndarray::{Array1, ArrayD, Axis as NdAxis};
use rayon::prelude::*;
use tomo_types::error::{TomoError, TomoResult};

use crate::algorithm::{Alpha, Lifecycle, Updater};
use crate::model::Model;
use crate::signal::get_signal_one_det;

/// Per-detector sum of squared geometry weights. A zero entry marks a
/// detector that sees no cells and contributes no correction.
fn detector_weights(geometry: &ArrayD<f64>) -> Array1<f64> {
    let n = geometry.shape()[0];
    Array1::from_shape_fn(n, |i| {
        geometry
            .index_axis(NdAxis(0), i)
            .iter()
            .map(|g| g * g)
            .sum()
    })
}

/// Supplies a zero solution shaped by the model mesh when the model
/// carries none yet.
fn ensure_solution(model: &mut Model, fill: f64, name: &str) -> TomoResult<()> {
    if model.solution().is_some() {
        return Ok(());
    }
    let shape = model.shape().ok_or_else(|| {
        TomoError::Config(format!(
            "{name}: model has neither a solution nor a mesh to derive one from"
        ))
    })?;
    model.set_solution(ArrayD::from_elem(shape, fill))
}

fn require_geometry<'a>(model: &'a Model, name: &str) -> TomoResult<&'a ArrayD<f64>> {
    model
        .detector_geometry()
        .ok_or_else(|| TomoError::Config(format!("{name}: detector geometry is not defined")))
}

fn require_signal<'a>(model: &'a Model, name: &str) -> TomoResult<&'a Array1<f64>> {
    model
        .detector_signal()
        .ok_or_else(|| TomoError::Config(format!("{name}: detector signal is not defined")))
}

/// Algebraic Reconstruction Technique. Detectors are visited in order
/// within a step and each correction is applied before the next
/// detector is projected.
pub struct Art {
    alpha: Alpha,
    weights: Array1<f64>,
    lifecycle: Lifecycle,
}

impl Art {
    pub fn new(alpha: impl Into<Alpha>) -> Self {
        Art {
            alpha: alpha.into(),
            weights: Array1::zeros(0),
            lifecycle: Lifecycle::default(),
        }
    }
}

impl Updater for Art {
    fn init(&mut self, model: &mut Model, steps: usize) -> TomoResult<()> {
        self.lifecycle.init(self.name())?;
        self.alpha.validate(steps)?;
        ensure_solution(model, 0.0, self.name())?;
        self.weights = detector_weights(require_geometry(model, self.name())?);
        Ok(())
    }

    fn step(&mut self, model: &mut Model, step_num: usize) -> TomoResult<()> {
        self.lifecycle.step(self.name())?;
        let alpha = self.alpha.at(step_num);
        let mut solution = model
            .take_solution()
            .ok_or_else(|| TomoError::Config("ART: solution is not defined".into()))?;
        {
            let geometry = require_geometry(model, self.name())?;
            let signal = require_signal(model, self.name())?;
            for (i, &w) in self.weights.iter().enumerate() {
                if w == 0.0 {
                    continue;
                }
                let slice = geometry.index_axis(NdAxis(0), i);
                let expected = get_signal_one_det(&solution, slice.view());
                let ai = alpha * (signal[i] - expected) / w;
                solution.zip_mut_with(&slice, |s, &g| *s += ai * g);
            }
        }
        model.set_solution(solution)
    }

    fn finalize(&mut self, _model: &mut Model) -> TomoResult<()> {
        self.lifecycle.finalize(self.name())
    }

    fn name(&self) -> &'static str {
        "ART"
    }
}

/// Simultaneous Iterative Reconstruction Technique. Detectors are split
/// into `n_slices` contiguous blocks; corrections within a block are
/// computed in parallel against the block's starting solution and
/// applied as their average.
pub struct Sirt {
    alpha: Alpha,
    n_slices: usize,
    weights: Array1<f64>,
    lifecycle: Lifecycle,
}

impl Sirt {
    pub fn new(alpha: impl Into<Alpha>, n_slices: usize) -> TomoResult<Self> {
        if n_slices == 0 {
            return Err(TomoError::Config("SIRT: n_slices must be positive".into()));
        }
        Ok(Sirt {
            alpha: alpha.into(),
            n_slices,
            weights: Array1::zeros(0),
            lifecycle: Lifecycle::default(),
        })
    }
}

impl Updater for Sirt {
    fn init(&mut self, model: &mut Model, steps: usize) -> TomoResult<()> {
        self.lifecycle.init(self.name())?;
        self.alpha.validate(steps)?;
        ensure_solution(model, 0.0, self.name())?;
        let geometry = require_geometry(model, self.name())?;
        if self.n_slices > geometry.shape()[0] {
            return Err(TomoError::Config(format!(
                "SIRT: {} slices requested for {} detectors",
                self.n_slices,
                geometry.shape()[0]
            )));
        }
        self.weights = detector_weights(geometry);
        Ok(())
    }

    fn step(&mut self, model: &mut Model, step_num: usize) -> TomoResult<()> {
        self.lifecycle.step(self.name())?;
        let alpha = self.alpha.at(step_num);
        let mut solution = model
            .take_solution()
            .ok_or_else(|| TomoError::Config("SIRT: solution is not defined".into()))?;
        {
            let geometry = require_geometry(model, self.name())?;
            let signal = require_signal(model, self.name())?;
            let n = geometry.shape()[0];
            let block = (n + self.n_slices - 1) / self.n_slices;
            for b in 0..self.n_slices {
                let i1 = b * block;
                let i2 = ((b + 1) * block).min(n);
                if i1 >= i2 {
                    break;
                }
                // Discrepancies of the whole block against the same
                // starting solution.
                let weights = &self.weights;
                let frozen = &solution;
                let coeffs: Vec<f64> = (i1..i2)
                    .into_par_iter()
                    .map(|i| {
                        let w = weights[i];
                        if w == 0.0 {
                            return 0.0;
                        }
                        let slice = geometry.index_axis(NdAxis(0), i);
                        (signal[i] - get_signal_one_det(frozen, slice)) / w
                    })
                    .collect();
                let scale = alpha / (i2 - i1) as f64;
                for (i, ai) in coeffs.into_iter().enumerate() {
                    if ai == 0.0 {
                        continue;
                    }
                    let slice = geometry.index_axis(NdAxis(0), i1 + i);
                    let c = scale * ai;
                    solution.zip_mut_with(&slice, |s, &g| *s += c * g);
                }
            }
        }
        model.set_solution(solution)
    }

    fn finalize(&mut self, _model: &mut Model) -> TomoResult<()> {
        self.lifecycle.finalize(self.name())
    }

    fn name(&self) -> &'static str {
        "SIRT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn model_with(
        geometry: Vec<f64>,
        det: usize,
        cells: usize,
        signal: Vec<f64>,
    ) -> Model {
        let mut model = Model::default();
        model
            .set_detector_geometry(
                ArrayD::from_shape_vec(IxDyn(&[det, cells]), geometry).unwrap(),
            )
            .unwrap();
        model.set_detector_signal(Array1::from(signal)).unwrap();
        model
            .set_solution(ArrayD::zeros(IxDyn(&[cells])))
            .unwrap();
        model
    }

    #[test]
    fn test_art_single_detector_converges_in_one_step() {
        let mut model = model_with(vec![1.0, 0.0, 0.0], 1, 3, vec![5.0]);
        let mut art = Art::new(1.0);
        art.init(&mut model, 1).unwrap();
        art.step(&mut model, 0).unwrap();
        art.finalize(&mut model).unwrap();
        let sol = model.solution().unwrap();
        assert!((sol[[0]] - 5.0).abs() < 1e-12);
        assert_eq!(sol[[1]], 0.0);
        assert_eq!(sol[[2]], 0.0);
    }

    #[test]
    fn test_art_sequential_uses_updated_solution() {
        // Two identical detectors: the second sees the correction of
        // the first within the same step.
        let mut model = model_with(vec![1.0, 1.0], 2, 1, vec![4.0, 4.0]);
        let mut art = Art::new(1.0);
        art.init(&mut model, 1).unwrap();
        art.step(&mut model, 0).unwrap();
        // First detector sets the cell to 4, second finds no
        // discrepancy left.
        assert!((model.solution().unwrap()[[0]] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_art_zero_weight_detector_skipped() {
        let mut model = model_with(vec![0.0, 0.0, 1.0, 0.0], 2, 2, vec![7.0, 3.0]);
        let mut art = Art::new(1.0);
        art.init(&mut model, 1).unwrap();
        art.step(&mut model, 0).unwrap();
        let sol = model.solution().unwrap();
        assert!(sol.iter().all(|v| v.is_finite()));
        assert!((sol[[0]] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_sirt_block_averages_against_frozen_solution() {
        // One block of two identical detectors: corrections are both
        // computed from the zero solution and averaged, so the cell
        // lands on the full discrepancy, not twice it.
        let mut model = model_with(vec![1.0, 1.0], 2, 1, vec![4.0, 4.0]);
        let mut sirt = Sirt::new(1.0, 1).unwrap();
        sirt.init(&mut model, 1).unwrap();
        sirt.step(&mut model, 0).unwrap();
        assert!((model.solution().unwrap()[[0]] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_sirt_with_one_detector_per_slice_matches_art() {
        let geometry = vec![1.0, 0.5, 0.0, 0.2, 0.8, 0.4];
        let signal = vec![2.0, 1.0];
        let mut m_art = model_with(geometry.clone(), 2, 3, signal.clone());
        let mut m_sirt = model_with(geometry, 2, 3, signal);
        let mut art = Art::new(0.5);
        // A block of one detector degenerates to a sequential update.
        let mut sirt = Sirt::new(0.5, 2).unwrap();
        art.init(&mut m_art, 3).unwrap();
        sirt.init(&mut m_sirt, 3).unwrap();
        for step in 0..3 {
            art.step(&mut m_art, step).unwrap();
            sirt.step(&mut m_sirt, step).unwrap();
        }
        let a = m_art.solution().unwrap();
        let s = m_sirt.solution().unwrap();
        for (x, y) in a.iter().zip(s.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sirt_rejects_more_slices_than_detectors() {
        let mut model = model_with(vec![1.0], 1, 1, vec![1.0]);
        let mut sirt = Sirt::new(1.0, 2).unwrap();
        assert!(sirt.init(&mut model, 1).is_err());
    }

    #[test]
    fn test_init_builds_solution_from_mesh() {
        use tomo_mesh::axis::RegularAxis;
        use tomo_mesh::mesh::Mesh;
        let mut model = Model::default();
        let mesh = Mesh::new(vec![Box::new(
            RegularAxis::new("x", "cm", 0.0, 1.0, 4).unwrap(),
        )]);
        model.set_mesh(mesh).unwrap();
        model
            .set_detector_geometry(ArrayD::from_elem(IxDyn(&[1, 4]), 1.0))
            .unwrap();
        model
            .set_detector_signal(Array1::from(vec![1.0]))
            .unwrap();
        let mut art = Art::new(0.1);
        art.init(&mut model, 1).unwrap();
        assert_eq!(model.solution().unwrap().shape(), &[4]);
        assert!(model.solution().unwrap().iter().all(|&v| v == 0.0));
    }
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Maximum Likelihood Reconstruction
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Multiplicative maximum-likelihood reconstruction (MLEM).

use ndarray::{Array1, ArrayD, Axis as NdAxis};
use tomo_types::error::{TomoError, TomoResult};

use crate::algorithm::{Alpha, Lifecycle, Updater};
use crate::model::Model;
use crate::signal::get_signal_one_det;

/// Expectation-maximization update. Each step multiplies every cell by
/// a back-projected ratio of measured to expected signal, so the sign
/// of a cell never changes and exact zeros stay zero. A relaxed step
/// blends the factor toward unity with `alpha`.
pub struct MaximumLikelihood {
    alpha: Alpha,
    wi_cells: ArrayD<f64>,
    lifecycle: Lifecycle,
}

impl MaximumLikelihood {
    pub fn new() -> Self {
        Self::with_alpha(1.0)
    }

    pub fn with_alpha(alpha: impl Into<Alpha>) -> Self {
        MaximumLikelihood {
            alpha: alpha.into(),
            wi_cells: ArrayD::zeros(ndarray::IxDyn(&[0])),
            lifecycle: Lifecycle::default(),
        }
    }
}

impl Default for MaximumLikelihood {
    fn default() -> Self {
        Self::new()
    }
}

impl Updater for MaximumLikelihood {
    fn init(&mut self, model: &mut Model, steps: usize) -> TomoResult<()> {
        self.lifecycle.init(self.name())?;
        self.alpha.validate(steps)?;
        let geometry = model
            .detector_geometry()
            .ok_or_else(|| TomoError::Config("ML: detector geometry is not defined".into()))?;
        // Per-cell sum of weights over all detectors, used to normalize
        // the back-projection.
        self.wi_cells = geometry.sum_axis(NdAxis(0));
        if model.solution().is_none() {
            let shape = model.shape().ok_or_else(|| {
                TomoError::Config(
                    "ML: model has neither a solution nor a mesh to derive one from".into(),
                )
            })?;
            // The multiplicative update cannot leave zero, so the
            // default start is a uniform positive field.
            model.set_solution(ArrayD::from_elem(shape, 1.0))?;
        }
        Ok(())
    }

    fn step(&mut self, model: &mut Model, step_num: usize) -> TomoResult<()> {
        self.lifecycle.step(self.name())?;
        let alpha = self.alpha.at(step_num);
        let mut solution = model
            .take_solution()
            .ok_or_else(|| TomoError::Config("ML: solution is not defined".into()))?;
        {
            let geometry = model
                .detector_geometry()
                .ok_or_else(|| TomoError::Config("ML: detector geometry is not defined".into()))?;
            let signal: &Array1<f64> = model
                .detector_signal()
                .ok_or_else(|| TomoError::Config("ML: detector signal is not defined".into()))?;
            let mut factor = ArrayD::<f64>::zeros(solution.raw_dim());
            for i in 0..geometry.shape()[0] {
                let slice = geometry.index_axis(NdAxis(0), i);
                let expected = get_signal_one_det(&solution, slice.view());
                if expected != 0.0 {
                    let ratio = signal[i] / expected;
                    factor.zip_mut_with(&slice, |f, &g| *f += g * ratio);
                }
            }
            // Cells outside every detector's view keep their value.
            factor.zip_mut_with(&self.wi_cells, |f, &w| {
                *f = if w == 0.0 { 1.0 } else { *f / w };
            });
            solution.zip_mut_with(&factor, |s, &f| *s *= 1.0 + alpha * (f - 1.0));
        }
        model.set_solution(solution)
    }

    fn finalize(&mut self, _model: &mut Model) -> TomoResult<()> {
        self.lifecycle.finalize(self.name())
    }

    fn name(&self) -> &'static str {
        "ML"
    }
}

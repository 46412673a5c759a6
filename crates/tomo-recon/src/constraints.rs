// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Solution Constraints
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Constraints applied to the solution after every update step.

use ndarray::{ArrayD, Axis as NdAxis};
use tomo_types::error::{TomoError, TomoResult};

use crate::algorithm::{Alpha, Lifecycle};
use crate::model::Model;

/// A projection of the solution onto some admissible set, applied after
/// each update step. Shares the init/step/finalize lifecycle of the
/// update algorithms.
pub trait Constraint {
    fn init(&mut self, model: &Model, steps: usize) -> TomoResult<()>;
    fn apply(&mut self, solution: &mut ArrayD<f64>, step_num: usize) -> TomoResult<()>;
    fn finalize(&mut self) -> TomoResult<()>;
    fn name(&self) -> &'static str;
}

/// Clips negative cells to zero. Idempotent.
#[derive(Default)]
pub struct Positive {
    lifecycle: Lifecycle,
}

impl Positive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Constraint for Positive {
    fn init(&mut self, _model: &Model, _steps: usize) -> TomoResult<()> {
        self.lifecycle.init(self.name())
    }

    fn apply(&mut self, solution: &mut ArrayD<f64>, _step_num: usize) -> TomoResult<()> {
        self.lifecycle.step(self.name())?;
        solution.mapv_inplace(|v| v.max(0.0));
        Ok(())
    }

    fn finalize(&mut self) -> TomoResult<()> {
        self.lifecycle.finalize(self.name())
    }

    fn name(&self) -> &'static str {
        "Positive"
    }
}

/// Runs a 1-D filter over every lane of the solution along one axis and
/// relaxes the solution toward the filtered field with weight `alpha`.
pub struct ApplyAlongAxis {
    func: Box<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>,
    axis: usize,
    alpha: Alpha,
    lifecycle: Lifecycle,
}

impl ApplyAlongAxis {
    pub fn new(
        func: impl Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
        axis: usize,
        alpha: impl Into<Alpha>,
    ) -> Self {
        ApplyAlongAxis {
            func: Box::new(func),
            axis,
            alpha: alpha.into(),
            lifecycle: Lifecycle::default(),
        }
    }
}

impl Constraint for ApplyAlongAxis {
    fn init(&mut self, model: &Model, steps: usize) -> TomoResult<()> {
        self.lifecycle.init(self.name())?;
        self.alpha.validate(steps)?;
        if let Some(shape) = model.shape() {
            if self.axis >= shape.len() {
                return Err(TomoError::Config(format!(
                    "ApplyAlongAxis: axis {} out of range for a {}-D solution",
                    self.axis,
                    shape.len()
                )));
            }
        }
        Ok(())
    }

    fn apply(&mut self, solution: &mut ArrayD<f64>, step_num: usize) -> TomoResult<()> {
        self.lifecycle.step(self.name())?;
        if self.axis >= solution.ndim() {
            return Err(TomoError::Config(format!(
                "ApplyAlongAxis: axis {} out of range for a {}-D solution",
                self.axis,
                solution.ndim()
            )));
        }
        let alpha = self.alpha.at(step_num);
        for mut lane in solution.lanes_mut(NdAxis(self.axis)) {
            let input: Vec<f64> = lane.iter().copied().collect();
            let output = (self.func)(&input);
            if output.len() != input.len() {
                return Err(TomoError::Config(format!(
                    "ApplyAlongAxis: filter returned {} samples for a lane of {}",
                    output.len(),
                    input.len()
                )));
            }
            for (s, f) in lane.iter_mut().zip(output) {
                *s += alpha * (f - *s);
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> TomoResult<()> {
        self.lifecycle.finalize(self.name())
    }

    fn name(&self) -> &'static str {
        "ApplyAlongAxis"
    }
}

/// Relaxes the solution toward an arbitrary transform of itself.
pub struct ApplyFunction {
    func: Box<dyn Fn(&ArrayD<f64>) -> ArrayD<f64> + Send + Sync>,
    alpha: Alpha,
    lifecycle: Lifecycle,
}

impl ApplyFunction {
    pub fn new(
        func: impl Fn(&ArrayD<f64>) -> ArrayD<f64> + Send + Sync + 'static,
        alpha: impl Into<Alpha>,
    ) -> Self {
        ApplyFunction {
            func: Box::new(func),
            alpha: alpha.into(),
            lifecycle: Lifecycle::default(),
        }
    }
}

impl Constraint for ApplyFunction {
    fn init(&mut self, _model: &Model, steps: usize) -> TomoResult<()> {
        self.lifecycle.init(self.name())?;
        self.alpha.validate(steps)
    }

    fn apply(&mut self, solution: &mut ArrayD<f64>, step_num: usize) -> TomoResult<()> {
        self.lifecycle.step(self.name())?;
        let transformed = (self.func)(solution);
        if transformed.shape() != solution.shape() {
            return Err(TomoError::Config(format!(
                "ApplyFunction: transform changed solution shape from {:?} to {:?}",
                solution.shape(),
                transformed.shape()
            )));
        }
        let alpha = self.alpha.at(step_num);
        solution.zip_mut_with(&transformed, |s, &f| *s += alpha * (f - *s));
        Ok(())
    }

    fn finalize(&mut self) -> TomoResult<()> {
        self.lifecycle.finalize(self.name())
    }

    fn name(&self) -> &'static str {
        "ApplyFunction"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn test_positive_clip_idempotent() {
        let mut c = Positive::new();
        c.init(&Model::default(), 2).unwrap();
        let mut sol =
            ArrayD::from_shape_vec(IxDyn(&[4]), vec![-1.0, 0.0, 2.5, -0.1]).unwrap();
        c.apply(&mut sol, 0).unwrap();
        let first = sol.clone();
        c.apply(&mut sol, 1).unwrap();
        assert_eq!(sol, first);
        assert_eq!(sol.as_slice().unwrap(), &[0.0, 0.0, 2.5, 0.0]);
    }

    #[test]
    fn test_apply_along_axis_full_weight_replaces_lane() {
        // A three-point moving average with clamped ends.
        let smooth = |lane: &[f64]| -> Vec<f64> {
            (0..lane.len())
                .map(|i| {
                    let lo = i.saturating_sub(1);
                    let hi = (i + 1).min(lane.len() - 1);
                    lane[lo..=hi].iter().sum::<f64>() / (hi - lo + 1) as f64
                })
                .collect()
        };
        let mut c = ApplyAlongAxis::new(smooth, 1, 1.0);
        c.init(&Model::default(), 1).unwrap();
        let mut sol =
            ArrayD::from_shape_vec(IxDyn(&[1, 3]), vec![0.0, 3.0, 0.0]).unwrap();
        c.apply(&mut sol, 0).unwrap();
        assert!((sol[[0, 0]] - 1.5).abs() < 1e-12);
        assert!((sol[[0, 1]] - 1.0).abs() < 1e-12);
        assert!((sol[[0, 2]] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_apply_along_axis_rejects_wrong_length() {
        let mut c = ApplyAlongAxis::new(|_lane: &[f64]| vec![0.0], 0, 1.0);
        c.init(&Model::default(), 1).unwrap();
        let mut sol = ArrayD::zeros(IxDyn(&[3]));
        assert!(c.apply(&mut sol, 0).is_err());
    }

    #[test]
    fn test_apply_function_relaxation() {
        let mut c = ApplyFunction::new(|sol: &ArrayD<f64>| sol.mapv(|v| 2.0 * v), 0.5);
        c.init(&Model::default(), 1).unwrap();
        let mut sol = ArrayD::from_elem(IxDyn(&[2]), 4.0);
        c.apply(&mut sol, 0).unwrap();
        // Halfway between 4 and 8.
        assert!((sol[[0]] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_lifecycle_enforced() {
        let mut c = Positive::new();
        let mut sol = ArrayD::zeros(IxDyn(&[1]));
        assert!(c.apply(&mut sol, 0).is_err());
    }
}

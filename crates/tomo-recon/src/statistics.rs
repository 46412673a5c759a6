// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Reconstruction Statistics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-step quality metrics, usable both for monitoring and as early
//! stopping conditions.

use ndarray::ArrayD;
use tomo_types::error::{TomoError, TomoResult};

use crate::algorithm::Lifecycle;
use crate::model::Model;
use crate::signal::get_signal;

/// Everything a statistic may inspect after one solver step.
pub struct StepContext<'a> {
    pub solution: &'a ArrayD<f64>,
    pub old_solution: &'a ArrayD<f64>,
    pub real_solution: Option<&'a ArrayD<f64>>,
    pub model: &'a Model,
}

/// A scalar metric evaluated after every step. Implementations append
/// each value to an internal history retrievable with [`Statistic::data`].
pub trait Statistic {
    fn init(&mut self, model: &Model, steps: usize) -> TomoResult<()>;
    fn step(&mut self, ctx: &StepContext<'_>) -> TomoResult<f64>;
    fn finalize(&mut self) -> TomoResult<()>;
    /// History of values, one per evaluated step.
    fn data(&self) -> &[f64];
    fn reset(&mut self);
    /// True when the metric compares against a known reference
    /// solution, which the solver must then be given.
    fn needs_reference(&self) -> bool {
        false
    }
    fn name(&self) -> &'static str;
}

fn reference<'a>(ctx: &StepContext<'a>, name: &str) -> TomoResult<&'a ArrayD<f64>> {
    ctx.real_solution.ok_or_else(|| {
        TomoError::Config(format!("{name}: reference solution is not defined"))
    })
}

/// Normalized root-mean-square deviation from the reference solution,
/// in percent of the solution norm. Zero when the solution is
/// identically zero.
#[derive(Default)]
pub struct Rms {
    history: Vec<f64>,
    lifecycle: Lifecycle,
}

impl Rms {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Statistic for Rms {
    fn init(&mut self, _model: &Model, _steps: usize) -> TomoResult<()> {
        self.lifecycle.init(self.name())
    }

    fn step(&mut self, ctx: &StepContext<'_>) -> TomoResult<f64> {
        self.lifecycle.step(self.name())?;
        let real = reference(ctx, self.name())?;
        let num: f64 = ctx
            .solution
            .iter()
            .zip(real.iter())
            .map(|(s, r)| (s - r) * (s - r))
            .sum();
        let denom: f64 = ctx.solution.iter().map(|s| s * s).sum();
        let value = if denom != 0.0 {
            (num / denom).sqrt() * 100.0
        } else {
            0.0
        };
        self.history.push(value);
        Ok(value)
    }

    fn finalize(&mut self) -> TomoResult<()> {
        self.lifecycle.finalize(self.name())
    }

    fn data(&self) -> &[f64] {
        &self.history
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn needs_reference(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "RMS"
    }
}

/// Euclidean norm of the detector-space residual, comparing the
/// measured signal with the forward projection of the current solution.
#[derive(Default)]
pub struct ResidualNorm {
    history: Vec<f64>,
    lifecycle: Lifecycle,
}

impl ResidualNorm {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Statistic for ResidualNorm {
    fn init(&mut self, model: &Model, _steps: usize) -> TomoResult<()> {
        self.lifecycle.init(self.name())?;
        if model.detector_geometry().is_none() || model.detector_signal().is_none() {
            return Err(TomoError::Config(
                "RN: detector geometry and signal must be defined".into(),
            ));
        }
        Ok(())
    }

    fn step(&mut self, ctx: &StepContext<'_>) -> TomoResult<f64> {
        self.lifecycle.step(self.name())?;
        let geometry = ctx
            .model
            .detector_geometry()
            .ok_or_else(|| TomoError::Config("RN: detector geometry is not defined".into()))?;
        let signal = ctx
            .model
            .detector_signal()
            .ok_or_else(|| TomoError::Config("RN: detector signal is not defined".into()))?;
        let expected = get_signal(ctx.solution, geometry);
        let value = expected
            .iter()
            .zip(signal.iter())
            .map(|(e, s)| (e - s) * (e - s))
            .sum::<f64>()
            .sqrt();
        self.history.push(value);
        Ok(value)
    }

    fn finalize(&mut self) -> TomoResult<()> {
        self.lifecycle.finalize(self.name())
    }

    fn data(&self) -> &[f64] {
        &self.history
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn name(&self) -> &'static str {
        "RN"
    }
}

/// Chi-square deviation from the reference solution. Cells where the
/// reference is zero are excluded.
#[derive(Default)]
pub struct ChiSquare {
    history: Vec<f64>,
    lifecycle: Lifecycle,
}

impl ChiSquare {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Statistic for ChiSquare {
    fn init(&mut self, _model: &Model, _steps: usize) -> TomoResult<()> {
        self.lifecycle.init(self.name())
    }

    fn step(&mut self, ctx: &StepContext<'_>) -> TomoResult<f64> {
        self.lifecycle.step(self.name())?;
        let real = reference(ctx, self.name())?;
        let value = ctx
            .solution
            .iter()
            .zip(real.iter())
            .map(|(s, r)| {
                if *r != 0.0 {
                    (s - r) * (s - r) / r
                } else {
                    0.0
                }
            })
            .sum();
        self.history.push(value);
        Ok(value)
    }

    fn finalize(&mut self) -> TomoResult<()> {
        self.lifecycle.finalize(self.name())
    }

    fn data(&self) -> &[f64] {
        &self.history
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn needs_reference(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "ChiSq"
    }
}

/// Step-to-step correlation coefficient after Craciunescu et al.,
/// Nucl. Instr. and Meth. in Phys. Res. A595 (2008) 623-630. Values
/// approach 1 as the iteration stabilizes; a degenerate divider yields
/// zero.
#[derive(Default)]
pub struct CorrelationCoef {
    det_num: usize,
    history: Vec<f64>,
    lifecycle: Lifecycle,
}

impl CorrelationCoef {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Statistic for CorrelationCoef {
    fn init(&mut self, model: &Model, _steps: usize) -> TomoResult<()> {
        self.lifecycle.init(self.name())?;
        self.det_num = model
            .detector_signal()
            .ok_or_else(|| TomoError::Config("CorrCoef: detector signal is not defined".into()))?
            .len();
        Ok(())
    }

    fn step(&mut self, ctx: &StepContext<'_>) -> TomoResult<f64> {
        self.lifecycle.step(self.name())?;
        let n2 = (self.det_num * self.det_num) as f64;
        let sum_old: f64 = ctx.old_solution.iter().sum();
        let sum_new: f64 = ctx.solution.iter().sum();
        let cross: f64 = ctx
            .solution
            .iter()
            .zip(ctx.old_solution.iter())
            .map(|(s, o)| s * o)
            .sum();
        let sq_new: f64 = ctx.solution.iter().map(|s| s * s).sum();
        let sq_old: f64 = ctx.old_solution.iter().map(|o| o * o).sum();
        let divider = (n2 * sq_new - sum_new * sum_new).sqrt()
            * (n2 * sq_old - sum_old * sum_old).sqrt();
        let value = if divider != 0.0 && divider.is_finite() {
            (n2 * cross - sum_old * sum_new) / divider
        } else {
            0.0
        };
        self.history.push(value);
        Ok(value)
    }

    fn finalize(&mut self) -> TomoResult<()> {
        self.lifecycle.finalize(self.name())
    }

    fn data(&self) -> &[f64] {
        &self.history
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn name(&self) -> &'static str {
        "CorrCoef"
    }
}

/// Relative step-to-step change of the solution,
/// sum(|d(solution)|) / |sum(solution)|. Zero for an identically zero
/// solution.
#[derive(Default)]
pub struct Convergence {
    history: Vec<f64>,
    lifecycle: Lifecycle,
}

impl Convergence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Statistic for Convergence {
    fn init(&mut self, _model: &Model, _steps: usize) -> TomoResult<()> {
        self.lifecycle.init(self.name())
    }

    fn step(&mut self, ctx: &StepContext<'_>) -> TomoResult<f64> {
        self.lifecycle.step(self.name())?;
        let delta: f64 = ctx
            .solution
            .iter()
            .zip(ctx.old_solution.iter())
            .map(|(s, o)| (s - o).abs())
            .sum();
        let total: f64 = ctx.solution.iter().sum::<f64>().abs();
        let value = if total != 0.0 { delta / total } else { 0.0 };
        self.history.push(value);
        Ok(value)
    }

    fn finalize(&mut self) -> TomoResult<()> {
        self.lifecycle.finalize(self.name())
    }

    fn data(&self) -> &[f64] {
        &self.history
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn name(&self) -> &'static str {
        "Convergence"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, ArrayD, IxDyn};

    fn simple_model() -> Model {
        let mut model = Model::default();
        model
            .set_detector_geometry(
                ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 0.0, 0.0, 1.0]).unwrap(),
            )
            .unwrap();
        model
            .set_detector_signal(Array1::from(vec![1.0, 2.0]))
            .unwrap();
        model
    }

    fn ctx<'a>(
        solution: &'a ArrayD<f64>,
        old: &'a ArrayD<f64>,
        real: Option<&'a ArrayD<f64>>,
        model: &'a Model,
    ) -> StepContext<'a> {
        StepContext {
            solution,
            old_solution: old,
            real_solution: real,
            model,
        }
    }

    #[test]
    fn test_rms_exact_match_is_zero() {
        let model = simple_model();
        let sol = ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, 2.0]).unwrap();
        let old = ArrayD::zeros(IxDyn(&[2]));
        let mut rms = Rms::new();
        rms.init(&model, 1).unwrap();
        let v = rms.step(&ctx(&sol, &old, Some(&sol), &model)).unwrap();
        assert_eq!(v, 0.0);
        assert_eq!(rms.data(), &[0.0]);
    }

    #[test]
    fn test_rms_percent_scale() {
        let model = simple_model();
        let sol = ArrayD::from_shape_vec(IxDyn(&[1]), vec![2.0]).unwrap();
        let real = ArrayD::from_shape_vec(IxDyn(&[1]), vec![1.0]).unwrap();
        let old = ArrayD::zeros(IxDyn(&[1]));
        let mut rms = Rms::new();
        rms.init(&model, 1).unwrap();
        let v = rms.step(&ctx(&sol, &old, Some(&real), &model)).unwrap();
        // sqrt(1/4) = 0.5, reported in percent.
        assert!((v - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_rms_zero_solution_is_zero() {
        let model = simple_model();
        let sol = ArrayD::zeros(IxDyn(&[2]));
        let real = ArrayD::from_elem(IxDyn(&[2]), 1.0);
        let mut rms = Rms::new();
        rms.init(&model, 1).unwrap();
        let v = rms.step(&ctx(&sol, &sol.clone(), Some(&real), &model)).unwrap();
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_rms_requires_reference() {
        let model = simple_model();
        let sol = ArrayD::zeros(IxDyn(&[2]));
        let mut rms = Rms::new();
        rms.init(&model, 1).unwrap();
        assert!(rms.step(&ctx(&sol, &sol.clone(), None, &model)).is_err());
        assert!(rms.needs_reference());
    }

    #[test]
    fn test_residual_norm() {
        let model = simple_model();
        // Identity geometry: expected signal equals the solution.
        let sol = ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, 5.0]).unwrap();
        let old = ArrayD::zeros(IxDyn(&[2]));
        let mut rn = ResidualNorm::new();
        rn.init(&model, 1).unwrap();
        let v = rn.step(&ctx(&sol, &old, None, &model)).unwrap();
        assert!((v - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_chi_square_skips_zero_reference_cells() {
        let model = simple_model();
        let sol = ArrayD::from_shape_vec(IxDyn(&[2]), vec![3.0, 9.0]).unwrap();
        let real = ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, 0.0]).unwrap();
        let old = ArrayD::zeros(IxDyn(&[2]));
        let mut chi = ChiSquare::new();
        chi.init(&model, 1).unwrap();
        let v = chi.step(&ctx(&sol, &old, Some(&real), &model)).unwrap();
        assert!((v - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_identical_steps() {
        let model = simple_model();
        let sol = ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, 3.0]).unwrap();
        let mut corr = CorrelationCoef::new();
        corr.init(&model, 1).unwrap();
        let v = corr.step(&ctx(&sol, &sol.clone(), None, &model)).unwrap();
        assert!((v - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_degenerate_divider_is_zero() {
        let model = simple_model();
        // Four constant cells against two detectors make
        // n^2 * sum(s^2) equal sum(s)^2, so the divider vanishes.
        let sol = ArrayD::from_elem(IxDyn(&[4]), 2.0);
        let mut corr = CorrelationCoef::new();
        corr.init(&model, 1).unwrap();
        let v = corr.step(&ctx(&sol, &sol.clone(), None, &model)).unwrap();
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_convergence_ratio() {
        let model = simple_model();
        let sol = ArrayD::from_shape_vec(IxDyn(&[2]), vec![2.0, 2.0]).unwrap();
        let old = ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, 1.0]).unwrap();
        let mut conv = Convergence::new();
        conv.init(&model, 1).unwrap();
        let v = conv.step(&ctx(&sol, &old, None, &model)).unwrap();
        assert!((v - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reset_clears_history() {
        let model = simple_model();
        let sol = ArrayD::from_elem(IxDyn(&[2]), 1.0);
        let old = ArrayD::zeros(IxDyn(&[2]));
        let mut conv = Convergence::new();
        conv.init(&model, 2).unwrap();
        conv.step(&ctx(&sol, &old, None, &model)).unwrap();
        assert_eq!(conv.data().len(), 1);
        conv.reset();
        assert!(conv.data().is_empty());
    }
}

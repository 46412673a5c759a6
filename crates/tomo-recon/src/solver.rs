// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Iterative Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Orchestrates the iterative reconstruction loop: update, constrain,
//! measure, and optionally stop early when a monitored statistic
//! crosses its threshold.

use ndarray::ArrayD;
use tomo_types::config::SolverOptions;
use tomo_types::error::{TomoError, TomoResult};

use crate::algebraic::{Art, Sirt};
use crate::algorithm::Updater;
use crate::constraints::{Constraint, Positive};
use crate::ml::MaximumLikelihood;
use crate::model::Model;
use crate::statistics::{Rms, Statistic, StepContext};

/// Progress hook. Implementations receive the model after every step
/// and on early termination; the solver itself never prints.
pub trait SolverObserver {
    fn step_end(&mut self, _step: usize, _steps: usize, _model: &Model) {}
    fn early_stop(&mut self, _info: &EarlyStop, _model: &Model) {}
}

/// Why a solve terminated before its requested step count.
#[derive(Debug, Clone)]
pub struct EarlyStop {
    pub statistic: String,
    pub value: f64,
    pub threshold: f64,
    pub step: usize,
}

/// Outcome of one [`Solver::solve`] call.
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub steps_requested: usize,
    pub steps_done: usize,
    pub early_stop: Option<EarlyStop>,
}

/// The reconstruction driver. An updater is mandatory; constraints,
/// statistics, stopping conditions, a reference solution and observers
/// are optional attachments.
#[derive(Default)]
pub struct Solver {
    pub updater: Option<Box<dyn Updater>>,
    pub constraints: Vec<Box<dyn Constraint>>,
    pub statistics: Vec<Box<dyn Statistic>>,
    pub stop_conditions: Vec<Box<dyn Statistic>>,
    pub stop_values: Vec<f64>,
    pub real_solution: Option<ArrayD<f64>>,
    pub observers: Vec<Box<dyn SolverObserver>>,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a solver from a parsed configuration block.
    pub fn from_options(options: &SolverOptions) -> TomoResult<Self> {
        let updater: Box<dyn Updater> = match options.algorithm.as_str() {
            "art" => Box::new(Art::new(options.alpha)),
            "sirt" => Box::new(Sirt::new(options.alpha, options.n_slices)?),
            "ml" => Box::new(MaximumLikelihood::new()),
            other => {
                return Err(TomoError::Config(format!(
                    "unknown reconstruction algorithm '{other}'"
                )))
            }
        };
        let mut solver = Solver::new();
        solver.updater = Some(updater);
        if options.clip_negative {
            solver.constraints.push(Box::new(Positive::new()));
        }
        if let Some(threshold) = options.stop_rms {
            solver.stop_conditions.push(Box::new(Rms::new()));
            solver.stop_values.push(threshold);
        }
        Ok(solver)
    }

    fn validate(&self, model: &Model) -> TomoResult<()> {
        if model.detector_geometry().is_none() {
            return Err(TomoError::Config(
                "solve: detector geometry is not defined".into(),
            ));
        }
        if model.detector_signal().is_none() {
            return Err(TomoError::Config(
                "solve: detector signal is not defined".into(),
            ));
        }
        if self.stop_conditions.len() != self.stop_values.len() {
            return Err(TomoError::Config(format!(
                "solve: {} stopping conditions but {} thresholds",
                self.stop_conditions.len(),
                self.stop_values.len()
            )));
        }
        for st in self.statistics.iter().chain(self.stop_conditions.iter()) {
            if st.needs_reference() && self.real_solution.is_none() {
                return Err(TomoError::Config(format!(
                    "solve: statistic {} needs a reference solution",
                    st.name()
                )));
            }
        }
        Ok(())
    }

    /// Runs up to `steps` iterations. Each step updates the solution,
    /// applies every constraint in order, evaluates statistics, and
    /// checks stopping conditions against their thresholds.
    pub fn solve(&mut self, model: &mut Model, steps: usize) -> TomoResult<SolveResult> {
        self.validate(model)?;
        let updater = self
            .updater
            .as_mut()
            .ok_or_else(|| TomoError::Config("solve: no update algorithm attached".into()))?;
        updater.init(model, steps)?;
        for constraint in &mut self.constraints {
            constraint.init(model, steps)?;
        }
        for statistic in &mut self.statistics {
            statistic.init(model, steps)?;
        }
        for stop in &mut self.stop_conditions {
            stop.init(model, steps)?;
        }
        if model.solution().is_none() {
            return Err(TomoError::Config(
                "solve: solution is not defined after initialization".into(),
            ));
        }

        let mut result = SolveResult {
            steps_requested: steps,
            steps_done: 0,
            early_stop: None,
        };
        'outer: for step in 0..steps {
            let old_solution = model
                .solution()
                .ok_or_else(|| TomoError::Config("solve: solution disappeared".into()))?
                .clone();
            self.updater
                .as_mut()
                .ok_or_else(|| TomoError::Config("solve: no update algorithm attached".into()))?
                .step(model, step)?;
            if !self.constraints.is_empty() {
                let mut solution = model
                    .take_solution()
                    .ok_or_else(|| TomoError::Config("solve: solution disappeared".into()))?;
                for constraint in &mut self.constraints {
                    constraint.apply(&mut solution, step)?;
                }
                model.set_solution(solution)?;
            }
            result.steps_done = step + 1;
            {
                let solution = model
                    .solution()
                    .ok_or_else(|| TomoError::Config("solve: solution disappeared".into()))?;
                let ctx = StepContext {
                    solution,
                    old_solution: &old_solution,
                    real_solution: self.real_solution.as_ref(),
                    model,
                };
                for statistic in &mut self.statistics {
                    statistic.step(&ctx)?;
                }
                // Every stop condition records its value for the step
                // before any of them can end the run.
                let mut triggered: Option<EarlyStop> = None;
                for (stop, &threshold) in
                    self.stop_conditions.iter_mut().zip(self.stop_values.iter())
                {
                    let value = stop.step(&ctx)?;
                    if value < threshold && triggered.is_none() {
                        triggered = Some(EarlyStop {
                            statistic: stop.name().to_string(),
                            value,
                            threshold,
                            step,
                        });
                    }
                }
                if let Some(info) = triggered {
                    for observer in &mut self.observers {
                        observer.early_stop(&info, model);
                    }
                    result.early_stop = Some(info);
                    break 'outer;
                }
            }
            for observer in &mut self.observers {
                observer.step_end(step, steps, model);
            }
        }

        self.updater
            .as_mut()
            .ok_or_else(|| TomoError::Config("solve: no update algorithm attached".into()))?
            .finalize(model)?;
        for constraint in &mut self.constraints {
            constraint.finalize()?;
        }
        for statistic in &mut self.statistics {
            statistic.finalize()?;
        }
        for stop in &mut self.stop_conditions {
            stop.finalize()?;
        }
        Ok(result)
    }
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Algorithm Lifecycle
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Update-algorithm trait and shared lifecycle plumbing.
//!
//! Every solver stage follows the same state machine:
//! `uninitialized -> initialized -> (stepping)* -> finalized`.
//! A finalized stage may be re-initialized and reused for another
//! solve. Out-of-order calls are configuration errors, caught by the
//! embedded [`Lifecycle`] guard rather than re-implemented per
//! algorithm.

use tomo_types::error::{TomoError, TomoResult};

use crate::model::Model;

/// Per-step weight for the correction applied by an algorithm.
#[derive(Debug, Clone)]
pub enum Alpha {
    /// One value broadcast across all steps.
    Constant(f64),
    /// One value per step index; must cover at least the requested
    /// number of steps.
    Schedule(Vec<f64>),
}

impl Alpha {
    pub fn validate(&self, steps: usize) -> TomoResult<()> {
        if let Alpha::Schedule(values) = self {
            if values.len() < steps {
                return Err(TomoError::Config(format!(
                    "alpha schedule has {} entries for {} requested steps",
                    values.len(),
                    steps
                )));
            }
        }
        Ok(())
    }

    pub fn at(&self, step: usize) -> f64 {
        match self {
            Alpha::Constant(value) => *value,
            Alpha::Schedule(values) => values[step],
        }
    }
}

impl From<f64> for Alpha {
    fn from(value: f64) -> Self {
        Alpha::Constant(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Uninitialized,
    Initialized,
    Finalized,
}

/// Init/step/finalize ordering guard shared by updaters, constraints
/// and statistics.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    phase: Phase,
}

impl Lifecycle {
    pub fn init(&mut self, name: &str) -> TomoResult<()> {
        if self.phase == Phase::Initialized {
            return Err(TomoError::Config(format!(
                "{name}: init called twice without finalize"
            )));
        }
        self.phase = Phase::Initialized;
        Ok(())
    }

    pub fn step(&mut self, name: &str) -> TomoResult<()> {
        if self.phase != Phase::Initialized {
            return Err(TomoError::Config(format!(
                "{name}: step called while {}",
                match self.phase {
                    Phase::Uninitialized => "uninitialized",
                    Phase::Finalized => "finalized",
                    Phase::Initialized => unreachable!(),
                }
            )));
        }
        Ok(())
    }

    pub fn finalize(&mut self, name: &str) -> TomoResult<()> {
        if self.phase != Phase::Initialized {
            return Err(TomoError::Config(format!(
                "{name}: finalize called without a matching init"
            )));
        }
        self.phase = Phase::Finalized;
        Ok(())
    }
}

/// A pluggable reconstruction update algorithm.
///
/// `init` precomputes the solution-independent quantities (and supplies
/// a default solution when the model has none), `step` mutates the
/// model solution once, `finalize` closes the lifecycle.
pub trait Updater {
    fn init(&mut self, model: &mut Model, steps: usize) -> TomoResult<()>;
    fn step(&mut self, model: &mut Model, step_num: usize) -> TomoResult<()>;
    fn finalize(&mut self, model: &mut Model) -> TomoResult<()>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_constant_broadcasts() {
        let alpha = Alpha::Constant(0.3);
        alpha.validate(1000).unwrap();
        assert_eq!(alpha.at(0), 0.3);
        assert_eq!(alpha.at(999), 0.3);
    }

    #[test]
    fn test_alpha_schedule_length() {
        let alpha = Alpha::Schedule(vec![1.0, 0.5, 0.25]);
        alpha.validate(3).unwrap();
        assert!(alpha.validate(4).is_err());
        assert_eq!(alpha.at(2), 0.25);
    }

    #[test]
    fn test_lifecycle_ordering() {
        let mut lc = Lifecycle::default();
        assert!(lc.step("x").is_err());
        assert!(lc.finalize("x").is_err());
        lc.init("x").unwrap();
        assert!(lc.init("x").is_err());
        lc.step("x").unwrap();
        lc.step("x").unwrap();
        lc.finalize("x").unwrap();
        assert!(lc.step("x").is_err());
        // Reuse after finalize is allowed.
        lc.init("x").unwrap();
        lc.step("x").unwrap();
    }
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Reconstruction
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Iterative tomographic reconstruction.
//!
//! A [`model::Model`] binds a detector response tensor, measured
//! signals and a solution array to a mesh; the [`solver::Solver`]
//! drives a pluggable update algorithm (ART, SIRT or maximum
//! likelihood) with per-step constraints and convergence statistics.

pub mod algebraic;
pub mod algorithm;
pub mod constraints;
pub mod detectors;
pub mod ml;
pub mod model;
pub mod rescale;
pub mod signal;
pub mod solver;
pub mod statistics;

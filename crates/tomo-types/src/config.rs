// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::fs::File;
use std::io::BufReader;

use serde::{Deserialize, Serialize};

use crate::error::TomoResult;

/// Top-level reconstruction session configuration.
/// Describes the mesh discretization and the solver setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconConfig {
    /// One entry per mesh axis, in array-dimension order.
    pub axes: Vec<AxisConfig>,
    pub solver: SolverOptions,
}

/// A regular 1D coordinate axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub units: String,
    pub size: usize,
    #[serde(default)]
    pub lower_limit: f64,
    pub upper_limit: f64,
}

/// Iterative reconstruction options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Reconstruction algorithm: "art", "sirt" or "ml".
    pub algorithm: String,
    /// Maximum number of solver steps (default: 20).
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Step-size weight applied by the algebraic algorithms (default: 0.1).
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Number of detector blocks for SIRT (default: 1).
    #[serde(default = "default_n_slices")]
    pub n_slices: usize,
    /// Clip the solution to non-negative values after each step
    /// (default: true).
    #[serde(default = "default_clip_negative")]
    pub clip_negative: bool,
    /// Early-stopping threshold on the normalized RMS statistic, in
    /// percent. Requires a reference solution at solve time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_rms: Option<f64>,
}

fn default_steps() -> usize {
    20
}
fn default_alpha() -> f64 {
    0.1
}
fn default_n_slices() -> usize {
    1
}
fn default_clip_negative() -> bool {
    true
}

impl ReconConfig {
    pub fn from_file(path: &str) -> TomoResult<Self> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }
}

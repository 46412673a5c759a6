//! Forward projection and synthetic signal helpers.

use ndarray::{Array1, ArrayD, ArrayViewD, Axis as NdAxis};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;

/// Expected signal of every detector: the inner product of the solution
/// with each detector-geometry slice. Detectors are independent and are
/// evaluated in parallel.
pub fn get_signal(solution: &ArrayD<f64>, detector_geometry: &ArrayD<f64>) -> Array1<f64> {
    let n = detector_geometry.shape()[0];
    let mut signal = vec![0.0; n];
    signal.par_iter_mut().enumerate().for_each(|(i, out)| {
        *out = get_signal_one_det(solution, detector_geometry.index_axis(NdAxis(0), i));
    });
    Array1::from(signal)
}

/// Expected signal of a single detector.
pub fn get_signal_one_det(solution: &ArrayD<f64>, geometry_slice: ArrayViewD<'_, f64>) -> f64 {
    geometry_slice
        .iter()
        .zip(solution.iter())
        .map(|(g, s)| g * s)
        .sum()
}

/// Add Gaussian noise to a signal. `st_div` is the standard deviation
/// in percent of each sample; samples too small to carry that noise
/// are returned unchanged.
pub fn add_noise<R: Rng>(signal: &Array1<f64>, st_div: f64, rng: &mut R) -> Array1<f64> {
    let rel = st_div / 100.0;
    signal.mapv(|x| {
        let sigma = rel * x.abs();
        match Normal::new(x, sigma) {
            Ok(dist) if sigma > 0.0 => dist.sample(rng),
            _ => x,
        }
    })
}

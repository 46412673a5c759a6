// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The reconstruction aggregate.
//!
//! One axis of the mesh corresponds to one dimension of the solution
//! and of every detector-geometry slice; detectors are indexed by the
//! first dimension of the geometry tensor. All fields are optional so
//! a model can be assembled piecewise, but every mutation re-validates
//! the shape invariants through a single entry point and fails fast
//! with a consistency error instead of deferring to solve time.

use ndarray::{Array1, ArrayD};
use tomo_mesh::mesh::Mesh;
use tomo_types::error::{TomoError, TomoResult};

#[derive(Default)]
pub struct Model {
    detector_geometry: Option<ArrayD<f64>>,
    detector_signal: Option<Array1<f64>>,
    solution: Option<ArrayD<f64>>,
    mesh: Option<Mesh>,
}

impl Model {
    pub fn new(
        detector_geometry: Option<ArrayD<f64>>,
        detector_signal: Option<Array1<f64>>,
        solution: Option<ArrayD<f64>>,
        mesh: Option<Mesh>,
    ) -> TomoResult<Self> {
        check_consistency(
            detector_geometry.as_ref(),
            detector_signal.as_ref(),
            solution.as_ref(),
            mesh.as_ref(),
        )?;
        Ok(Model {
            detector_geometry,
            detector_signal,
            solution,
            mesh,
        })
    }

    pub fn detector_geometry(&self) -> Option<&ArrayD<f64>> {
        self.detector_geometry.as_ref()
    }

    pub fn detector_signal(&self) -> Option<&Array1<f64>> {
        self.detector_signal.as_ref()
    }

    pub fn solution(&self) -> Option<&ArrayD<f64>> {
        self.solution.as_ref()
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn set_detector_geometry(&mut self, value: ArrayD<f64>) -> TomoResult<()> {
        check_consistency(
            Some(&value),
            self.detector_signal.as_ref(),
            self.solution.as_ref(),
            self.mesh.as_ref(),
        )?;
        self.detector_geometry = Some(value);
        Ok(())
    }

    pub fn set_detector_signal(&mut self, value: Array1<f64>) -> TomoResult<()> {
        check_consistency(
            self.detector_geometry.as_ref(),
            Some(&value),
            self.solution.as_ref(),
            self.mesh.as_ref(),
        )?;
        self.detector_signal = Some(value);
        Ok(())
    }

    pub fn set_solution(&mut self, value: ArrayD<f64>) -> TomoResult<()> {
        check_consistency(
            self.detector_geometry.as_ref(),
            self.detector_signal.as_ref(),
            Some(&value),
            self.mesh.as_ref(),
        )?;
        self.solution = Some(value);
        Ok(())
    }

    pub fn set_mesh(&mut self, value: Mesh) -> TomoResult<()> {
        check_consistency(
            self.detector_geometry.as_ref(),
            self.detector_signal.as_ref(),
            self.solution.as_ref(),
            Some(&value),
        )?;
        self.mesh = Some(value);
        Ok(())
    }

    /// Move the solution out for in-place algorithm work. The caller
    /// returns it through [`Model::set_solution`], which re-validates.
    pub fn take_solution(&mut self) -> Option<ArrayD<f64>> {
        self.solution.take()
    }

    /// Atomically swap the discretization: the mesh together with the
    /// arrays bound to its shape. Used by regridding, where changing
    /// field by field would trip the shape invariants midway.
    pub fn replace_discretization(
        &mut self,
        mesh: Mesh,
        detector_geometry: Option<ArrayD<f64>>,
        solution: Option<ArrayD<f64>>,
    ) -> TomoResult<()> {
        check_consistency(
            detector_geometry.as_ref(),
            self.detector_signal.as_ref(),
            solution.as_ref(),
            Some(&mesh),
        )?;
        self.mesh = Some(mesh);
        self.detector_geometry = detector_geometry;
        self.solution = solution;
        Ok(())
    }

    /// Shape of the cell grid, from whichever field defines it.
    pub fn shape(&self) -> Option<Vec<usize>> {
        if let Some(geometry) = &self.detector_geometry {
            return Some(geometry.shape()[1..].to_vec());
        }
        if let Some(solution) = &self.solution {
            return Some(solution.shape().to_vec());
        }
        self.mesh.as_ref().map(|m| m.shape())
    }

    /// Total number of cells.
    pub fn size(&self) -> Option<usize> {
        self.shape().map(|s| s.iter().product())
    }
}

fn check_consistency(
    detector_geometry: Option<&ArrayD<f64>>,
    detector_signal: Option<&Array1<f64>>,
    solution: Option<&ArrayD<f64>>,
    mesh: Option<&Mesh>,
) -> TomoResult<()> {
    if let Some(geometry) = detector_geometry {
        if geometry.ndim() < 2 {
            return Err(TomoError::Consistency(format!(
                "detector_geometry must have a detector dimension plus at least \
                 one cell dimension, got shape {:?}",
                geometry.shape()
            )));
        }
        if let Some(signal) = detector_signal {
            if signal.len() != geometry.shape()[0] {
                return Err(TomoError::Consistency(format!(
                    "detector_signal and detector_geometry must have the same length: \
                     geometry has {} detectors, signal has {}",
                    geometry.shape()[0],
                    signal.len()
                )));
            }
        }
        if let Some(solution) = solution {
            if solution.shape() != &geometry.shape()[1..] {
                return Err(TomoError::Consistency(format!(
                    "each detector_geometry slice must share the solution shape: \
                     slices are {:?}, solution is {:?}",
                    &geometry.shape()[1..],
                    solution.shape()
                )));
            }
        }
    }
    if let Some(mesh) = mesh {
        let mesh_shape = mesh.shape();
        if let Some(solution) = solution {
            if solution.shape() != mesh_shape.as_slice() {
                return Err(TomoError::Consistency(format!(
                    "mesh shape {:?} is inconsistent with solution shape {:?}",
                    mesh_shape,
                    solution.shape()
                )));
            }
        }
        if let Some(geometry) = detector_geometry {
            if &geometry.shape()[1..] != mesh_shape.as_slice() {
                return Err(TomoError::Consistency(format!(
                    "mesh shape {:?} is inconsistent with detector_geometry slice shape {:?}",
                    mesh_shape,
                    &geometry.shape()[1..]
                )));
            }
        }
    }
    Ok(())
}

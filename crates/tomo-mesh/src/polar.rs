// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Polar Axis
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spider-web axis for nested-ring geometries.
//!
//! Represents two real-world dimensions with a single array dimension.
//! The grid is built from a closed border polyline (for tokamak work the
//! separatrix, extracted upstream) and a center point (the magnetic
//! axis): `angular_size` spokes run from the center to evenly spaced
//! border vertices and `radial_size` rings are interpolated linearly
//! between the center and the border. Cells are stored as explicit
//! boundary polygons; the outermost ring keeps the border polyline
//! segment so the union of all cells reproduces the border shape.

use ndarray::Array1;
use tomo_types::error::{TomoError, TomoResult};

use crate::axis::Axis;
use crate::geometry::Polygon;

#[derive(Debug, Clone)]
pub struct PolarAxis {
    name: String,
    units: String,
    radial_size: usize,
    angular_size: usize,
    cells: Vec<Polygon>,
    centroids: Vec<[f64; 2]>,
    volumes: Array1<f64>,
}

impl PolarAxis {
    /// Build a spider-web grid inside `border` around `center`.
    ///
    /// `border` is a closed polyline given without repeating the first
    /// point; it must be star-shaped with respect to `center` for the
    /// cells to partition its interior exactly. Cell `r * angular_size
    /// + k` is sector `k` of ring `r`, counted outward from the center.
    pub fn new(
        name: &str,
        units: &str,
        border: &[[f64; 2]],
        center: [f64; 2],
        radial_size: usize,
        angular_size: usize,
    ) -> TomoResult<Self> {
        if border.len() < 3 {
            return Err(TomoError::Geometry(format!(
                "axis '{name}': border needs at least 3 points, got {}",
                border.len()
            )));
        }
        if radial_size == 0 || angular_size == 0 {
            return Err(TomoError::Geometry(format!(
                "axis '{name}': radial and angular sizes must be positive"
            )));
        }
        if angular_size > border.len() {
            return Err(TomoError::Geometry(format!(
                "axis '{name}': angular size {angular_size} exceeds the {} border points",
                border.len()
            )));
        }
        if !Polygon::new(border.to_vec()).contains(center) {
            return Err(TomoError::Geometry(format!(
                "axis '{name}': center ({}, {}) lies outside the border",
                center[0], center[1]
            )));
        }

        let n = border.len();
        let spoke_index: Vec<usize> = (0..angular_size).map(|k| k * n / angular_size).collect();
        // Point at fraction t of spoke k (t = 0 center, t = 1 border).
        let spoke_point = |k: usize, t: f64| -> [f64; 2] {
            let b = border[spoke_index[k % angular_size]];
            [
                center[0] + t * (b[0] - center[0]),
                center[1] + t * (b[1] - center[1]),
            ]
        };

        let mut cells = Vec::with_capacity(radial_size * angular_size);
        for r in 0..radial_size {
            let t_inner = r as f64 / radial_size as f64;
            let t_outer = (r + 1) as f64 / radial_size as f64;
            for k in 0..angular_size {
                let mut vertices = Vec::new();
                if t_inner == 0.0 {
                    vertices.push(center);
                } else {
                    vertices.push(spoke_point(k, t_inner));
                    // walked back later to close the quadrilateral
                }
                if r + 1 == radial_size {
                    // Outer ring: follow the border polyline between the
                    // two spokes instead of the straight chord.
                    let start = spoke_index[k];
                    let end = spoke_index[(k + 1) % angular_size];
                    let mut idx = start;
                    loop {
                        vertices.push(border[idx]);
                        if idx == end {
                            break;
                        }
                        idx = (idx + 1) % n;
                    }
                } else {
                    vertices.push(spoke_point(k, t_outer));
                    vertices.push(spoke_point(k + 1, t_outer));
                }
                if t_inner != 0.0 {
                    vertices.push(spoke_point(k + 1, t_inner));
                }
                cells.push(Polygon::new(vertices));
            }
        }

        let mut volumes = Array1::zeros(cells.len());
        let mut centroids = Vec::with_capacity(cells.len());
        for (i, cell) in cells.iter().enumerate() {
            let area = cell.area();
            if area <= 0.0 {
                return Err(TomoError::Geometry(format!(
                    "axis '{name}': cell {i} is degenerate (zero area); \
                     the border may not be star-shaped around the center"
                )));
            }
            volumes[i] = area;
            centroids.push(cell.centroid());
        }

        Ok(PolarAxis {
            name: name.to_string(),
            units: units.to_string(),
            radial_size,
            angular_size,
            cells,
            centroids,
            volumes,
        })
    }

    pub fn radial_size(&self) -> usize {
        self.radial_size
    }

    pub fn angular_size(&self) -> usize {
        self.angular_size
    }
}

impl Axis for PolarAxis {
    fn dimension(&self) -> usize {
        2
    }

    fn size(&self) -> usize {
        self.cells.len()
    }

    fn volumes(&self) -> &Array1<f64> {
        &self.volumes
    }

    fn regular(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> &str {
        &self.units
    }

    fn cell_polygons(&self) -> Option<&[Polygon]> {
        Some(&self.cells)
    }

    fn centroids(&self) -> Option<&[[f64; 2]]> {
        Some(&self.centroids)
    }
}

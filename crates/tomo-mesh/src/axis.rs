// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Mesh Axes
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Coordinate axes.
//!
//! An axis is one discretized coordinate dimension. It always occupies
//! exactly one array dimension of any data bound to its mesh, although
//! a non-linear axis may represent more than one real-world dimension
//! (see [`crate::polar::PolarAxis`]).
//!
//! Capability dispatch: 1D axes expose `cell_edges`/`coordinates`, 2D
//! axes expose `cell_polygons`/`centroids`. Pairwise operations check
//! the capability of both operands and fail with a geometry error for
//! unsupported combinations instead of downcasting to concrete types.

use ndarray::{Array1, Array2};
use tomo_types::error::{TomoError, TomoResult};

use crate::geometry::Polygon;

/// Relative tolerance used by the `regular` flag of irregular axes.
const REGULAR_TOL: f64 = 1e-12;

pub trait Axis {
    /// Number of real-world dimensions this axis represents.
    fn dimension(&self) -> usize;

    /// Number of cells (the extent of the corresponding array dimension).
    fn size(&self) -> usize;

    /// Cell length/area/volume, depending on `dimension`.
    fn volumes(&self) -> &Array1<f64>;

    /// True when every cell has the same volume.
    fn regular(&self) -> bool;

    fn name(&self) -> &str;

    fn units(&self) -> &str;

    /// Cell boundary positions, `size + 1` strictly monotonic values.
    /// `None` for axes without a 1D edge representation.
    fn cell_edges(&self) -> Option<&Array1<f64>> {
        None
    }

    /// Cell center coordinates. `None` for non-1D axes.
    fn coordinates(&self) -> Option<&Array1<f64>> {
        None
    }

    /// Per-cell boundary polygons in Cartesian coordinates.
    /// `None` for axes that are not inherently two-dimensional.
    fn cell_polygons(&self) -> Option<&[Polygon]> {
        None
    }

    /// Per-cell centroids of `cell_polygons`.
    fn centroids(&self) -> Option<&[[f64; 2]]> {
        None
    }

    /// Boundary polygons of the cells formed by crossing two 1D axes:
    /// entry `[i][j]` is the rectangle spanned by cell `i` of `self`
    /// and cell `j` of `other`.
    fn cell_edges2d(&self, other: &dyn Axis) -> TomoResult<Vec<Vec<Polygon>>> {
        let e1 = self.cell_edges().ok_or_else(|| {
            unsupported_pair(
                "cell_edges2d",
                (self.dimension(), self.name()),
                (other.dimension(), other.name()),
            )
        })?;
        let e2 = other.cell_edges().ok_or_else(|| {
            unsupported_pair(
                "cell_edges2d",
                (self.dimension(), self.name()),
                (other.dimension(), other.name()),
            )
        })?;
        let mut cells = Vec::with_capacity(self.size());
        for i in 0..self.size() {
            let mut row = Vec::with_capacity(other.size());
            for j in 0..other.size() {
                row.push(Polygon::new(vec![
                    [e1[i], e2[j]],
                    [e1[i + 1], e2[j]],
                    [e1[i + 1], e2[j + 1]],
                    [e1[i], e2[j + 1]],
                ]));
            }
            cells.push(row);
        }
        Ok(cells)
    }

    /// Pairwise overlap length of each cell of `self` with each cell of
    /// `other`, computed as the clamped interval overlap
    /// `max(0, min(a_max, b_max) - max(a_min, b_min))`.
    fn intersection(&self, other: &dyn Axis) -> TomoResult<Array2<f64>> {
        let e1 = self.cell_edges().ok_or_else(|| {
            unsupported_pair(
                "intersection",
                (self.dimension(), self.name()),
                (other.dimension(), other.name()),
            )
        })?;
        let e2 = other.cell_edges().ok_or_else(|| {
            unsupported_pair(
                "intersection",
                (self.dimension(), self.name()),
                (other.dimension(), other.name()),
            )
        })?;
        let mut table = Array2::zeros((self.size(), other.size()));
        for i in 0..self.size() {
            for j in 0..other.size() {
                table[[i, j]] = interval_overlap(e1[i], e1[i + 1], e2[j], e2[j + 1]);
            }
        }
        Ok(table)
    }
}

fn unsupported_pair(op: &str, a: (usize, &str), b: (usize, &str)) -> TomoError {
    TomoError::Geometry(format!(
        "{op} is not supported for this axis combination ({}D '{}' with {}D '{}')",
        a.0, a.1, b.0, b.1
    ))
}

/// Clamped 1D interval overlap.
pub fn interval_overlap(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> f64 {
    (a_max.min(b_max) - a_min.max(b_min)).max(0.0)
}

/// 1D axis with uniform cell size.
#[derive(Debug, Clone)]
pub struct RegularAxis {
    name: String,
    units: String,
    size: usize,
    volumes: Array1<f64>,
    coordinates: Array1<f64>,
    edges: Array1<f64>,
}

impl RegularAxis {
    pub fn new(
        name: &str,
        units: &str,
        lower_limit: f64,
        upper_limit: f64,
        size: usize,
    ) -> TomoResult<Self> {
        if size == 0 {
            return Err(TomoError::Geometry(format!(
                "axis '{name}' must have at least one cell"
            )));
        }
        if upper_limit <= lower_limit {
            return Err(TomoError::Geometry(format!(
                "axis '{name}': upper limit {upper_limit} is not above lower limit {lower_limit}"
            )));
        }
        let dv = (upper_limit - lower_limit) / size as f64;
        let edges = Array1::linspace(lower_limit, upper_limit, size + 1);
        let coordinates =
            Array1::from_shape_fn(size, |i| lower_limit + dv * (i as f64 + 0.5));
        Ok(RegularAxis {
            name: name.to_string(),
            units: units.to_string(),
            size,
            volumes: Array1::from_elem(size, dv),
            coordinates,
            edges,
        })
    }
}

impl Axis for RegularAxis {
    fn dimension(&self) -> usize {
        1
    }

    fn size(&self) -> usize {
        self.size
    }

    fn volumes(&self) -> &Array1<f64> {
        &self.volumes
    }

    fn regular(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> &str {
        &self.units
    }

    fn cell_edges(&self) -> Option<&Array1<f64>> {
        Some(&self.edges)
    }

    fn coordinates(&self) -> Option<&Array1<f64>> {
        Some(&self.coordinates)
    }
}

/// 1D axis with explicitly placed cells.
#[derive(Debug, Clone)]
pub struct IrregularAxis {
    name: String,
    units: String,
    size: usize,
    volumes: Array1<f64>,
    coordinates: Array1<f64>,
    edges: Array1<f64>,
}

impl IrregularAxis {
    /// Build from cell center coordinates. The first cell starts at
    /// `lower_limit`; each following cell width is inferred so that the
    /// centers stay at cell midpoints:
    /// `v[0] = 2 (c[0] - lower)`, `v[i+1] = 2 (c[i+1] - c[i]) - v[i]`.
    ///
    /// Fails when the coordinates are not strictly increasing, when
    /// `lower_limit` lies inside the first cell, or when any inferred
    /// width is non-positive (centers too close to a cell boundary).
    pub fn from_coordinates(
        name: &str,
        units: &str,
        coordinates: &[f64],
        lower_limit: f64,
    ) -> TomoResult<Self> {
        if coordinates.is_empty() {
            return Err(TomoError::Geometry(format!(
                "axis '{name}': coordinate list is empty"
            )));
        }
        for w in coordinates.windows(2) {
            if w[1] <= w[0] {
                return Err(TomoError::Geometry(format!(
                    "axis '{name}': coordinates are not strictly increasing ({} then {})",
                    w[0], w[1]
                )));
            }
        }
        if coordinates[0] <= lower_limit {
            return Err(TomoError::Geometry(format!(
                "axis '{name}': lower limit {lower_limit} is not below the first coordinate {}",
                coordinates[0]
            )));
        }
        let size = coordinates.len();
        let mut volumes = Array1::zeros(size);
        volumes[0] = 2.0 * (coordinates[0] - lower_limit);
        for i in 0..size - 1 {
            volumes[i + 1] = 2.0 * (coordinates[i + 1] - coordinates[i]) - volumes[i];
        }
        for (i, &v) in volumes.iter().enumerate() {
            if v <= 0.0 {
                return Err(TomoError::Geometry(format!(
                    "axis '{name}': coordinate {i} lies inside the previous cell; \
                     increase the distance between points"
                )));
            }
        }
        let mut edges = Array1::zeros(size + 1);
        edges[0] = lower_limit;
        for i in 0..size {
            edges[i + 1] = edges[i] + volumes[i];
        }
        Ok(IrregularAxis {
            name: name.to_string(),
            units: units.to_string(),
            size,
            volumes,
            coordinates: Array1::from(coordinates.to_vec()),
            edges,
        })
    }

    /// Build from explicit cell edges; centers are edge midpoints.
    pub fn from_edges(name: &str, units: &str, edges: &[f64]) -> TomoResult<Self> {
        if edges.len() < 2 {
            return Err(TomoError::Geometry(format!(
                "axis '{name}': at least two edges are required"
            )));
        }
        for w in edges.windows(2) {
            if w[1] <= w[0] {
                return Err(TomoError::Geometry(format!(
                    "axis '{name}': edges are not strictly increasing ({} then {})",
                    w[0], w[1]
                )));
            }
        }
        let size = edges.len() - 1;
        let volumes = Array1::from_shape_fn(size, |i| edges[i + 1] - edges[i]);
        let coordinates = Array1::from_shape_fn(size, |i| (edges[i] + edges[i + 1]) / 2.0);
        Ok(IrregularAxis {
            name: name.to_string(),
            units: units.to_string(),
            size,
            volumes,
            coordinates,
            edges: Array1::from(edges.to_vec()),
        })
    }
}

impl Axis for IrregularAxis {
    fn dimension(&self) -> usize {
        1
    }

    fn size(&self) -> usize {
        self.size
    }

    fn volumes(&self) -> &Array1<f64> {
        &self.volumes
    }

    fn regular(&self) -> bool {
        let v0 = self.volumes[0];
        self.volumes
            .iter()
            .all(|&v| (v - v0).abs() <= REGULAR_TOL * v0.abs().max(1.0))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> &str {
        &self.units
    }

    fn cell_edges(&self) -> Option<&Array1<f64>> {
        Some(&self.edges)
    }

    fn coordinates(&self) -> Option<&Array1<f64>> {
        Some(&self.coordinates)
    }
}

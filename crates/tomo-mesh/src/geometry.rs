// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Polygon Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Planar polygon primitives.
//!
//! Implements the shoelace area, centroid, point containment and
//! Sutherland-Hodgman clipping used by the cell intersection engine.
//! Clip regions must be convex; subject polygons may be arbitrary
//! simple polygons (polar cells are not convex in general).

/// Area below which a clipped polygon is treated as empty.
const AREA_EPS: f64 = 1e-14;

/// A simple planar polygon given as an ordered vertex list.
/// The boundary is implicitly closed; the first vertex is not repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<[f64; 2]>,
}

impl Polygon {
    pub fn new(vertices: Vec<[f64; 2]>) -> Self {
        Polygon { vertices }
    }

    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.vertices
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }

    /// Shoelace sum divided by two. Positive for counter-clockwise
    /// vertex order.
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0;
        for i in 0..n {
            let [x1, y1] = self.vertices[i];
            let [x2, y2] = self.vertices[(i + 1) % n];
            acc += x1 * y2 - x2 * y1;
        }
        acc / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Area centroid. Falls back to the vertex mean for degenerate
    /// (near zero area) polygons.
    pub fn centroid(&self) -> [f64; 2] {
        let n = self.vertices.len();
        let a = self.signed_area();
        if n == 0 {
            return [0.0, 0.0];
        }
        if a.abs() < AREA_EPS {
            let mut cx = 0.0;
            let mut cy = 0.0;
            for v in &self.vertices {
                cx += v[0];
                cy += v[1];
            }
            return [cx / n as f64, cy / n as f64];
        }
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let [x1, y1] = self.vertices[i];
            let [x2, y2] = self.vertices[(i + 1) % n];
            let cross = x1 * y2 - x2 * y1;
            cx += (x1 + x2) * cross;
            cy += (y1 + y2) * cross;
        }
        [cx / (6.0 * a), cy / (6.0 * a)]
    }

    pub fn bounding_box(&self) -> ([f64; 2], [f64; 2]) {
        let mut min = [f64::INFINITY, f64::INFINITY];
        let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
        for v in &self.vertices {
            min[0] = min[0].min(v[0]);
            min[1] = min[1].min(v[1]);
            max[0] = max[0].max(v[0]);
            max[1] = max[1].max(v[1]);
        }
        (min, max)
    }

    /// Even-odd point containment. Points exactly on the boundary are
    /// not guaranteed either way.
    pub fn contains(&self, p: [f64; 2]) -> bool {
        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let [xi, yi] = self.vertices[i];
            let [xj, yj] = self.vertices[j];
            if (yi > p[1]) != (yj > p[1])
                && p[0] < (xj - xi) * (p[1] - yi) / (yj - yi) + xi
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Sutherland-Hodgman clip of `self` against a convex `clip` region.
    /// Returns the (possibly empty) clipped polygon.
    pub fn clip(&self, clip: &Polygon) -> Polygon {
        let mut output = self.vertices.clone();
        let clip_ccw = if clip.signed_area() >= 0.0 {
            clip.vertices.clone()
        } else {
            let mut v = clip.vertices.clone();
            v.reverse();
            v
        };
        let n = clip_ccw.len();
        for i in 0..n {
            if output.is_empty() {
                break;
            }
            let a = clip_ccw[i];
            let b = clip_ccw[(i + 1) % n];
            let input = std::mem::take(&mut output);
            let m = input.len();
            for j in 0..m {
                let current = input[j];
                let next = input[(j + 1) % m];
                let cur_in = edge_side(a, b, current) >= 0.0;
                let next_in = edge_side(a, b, next) >= 0.0;
                if cur_in {
                    output.push(current);
                    if !next_in {
                        output.push(edge_intersection(a, b, current, next));
                    }
                } else if next_in {
                    output.push(edge_intersection(a, b, current, next));
                }
            }
        }
        Polygon::new(output)
    }

    /// Area of the intersection of `self` with a convex `clip` region.
    pub fn intersection_area(&self, clip: &Polygon) -> f64 {
        if !bbox_overlap(self, clip) {
            return 0.0;
        }
        self.clip(clip).area()
    }

    /// Topological overlap test against a convex `clip` region.
    pub fn intersects(&self, clip: &Polygon) -> bool {
        bbox_overlap(self, clip) && self.clip(clip).area() > AREA_EPS
    }
}

/// Cross product sign of `p` relative to the directed edge `a -> b`.
/// Non-negative on the left (inside for a CCW clip polygon).
fn edge_side(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

/// Intersection of segment `p -> q` with the infinite line through
/// `a -> b`. Callers guarantee the segment crosses the line.
fn edge_intersection(a: [f64; 2], b: [f64; 2], p: [f64; 2], q: [f64; 2]) -> [f64; 2] {
    let a1 = b[1] - a[1];
    let b1 = a[0] - b[0];
    let c1 = a1 * a[0] + b1 * a[1];
    let a2 = q[1] - p[1];
    let b2 = p[0] - q[0];
    let c2 = a2 * p[0] + b2 * p[1];
    let det = a1 * b2 - a2 * b1;
    if det.abs() < 1e-300 {
        // Parallel within rounding; either endpoint is acceptable.
        return p;
    }
    [(b2 * c1 - b1 * c2) / det, (a1 * c2 - a2 * c1) / det]
}

fn bbox_overlap(a: &Polygon, b: &Polygon) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let (a_min, a_max) = a.bounding_box();
    let (b_min, b_max) = b.bounding_box();
    a_min[0] <= b_max[0] && b_min[0] <= a_max[0] && a_min[1] <= b_max[1] && b_min[1] <= a_max[1]
}

/// Euclidean distance between two points.
pub fn distance(p: [f64; 2], q: [f64; 2]) -> f64 {
    ((p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2)).sqrt()
}

/// Rotate `p` around `origin` by `angle` radians (counter-clockwise).
pub fn rotate_around(p: [f64; 2], origin: [f64; 2], angle: f64) -> [f64; 2] {
    let (sin, cos) = angle.sin_cos();
    let dx = p[0] - origin[0];
    let dy = p[1] - origin[1];
    [
        origin[0] + dx * cos - dy * sin,
        origin[1] + dx * sin + dy * cos,
    ]
}

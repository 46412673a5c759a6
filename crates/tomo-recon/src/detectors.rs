// ─────────────────────────────────────────────────────────────────────
// SCPN Tomo Core — Detector Geometry Generators
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Response-tensor generators for line-of-sight detectors in 2D
//! geometry: single lines, fans, circular fan arrays and parallel
//! arrays. Detectors index axis 0 of the returned tensor.

use std::f64::consts::PI;

use ndarray::{ArrayD, Axis as NdAxis, IxDyn};
use tomo_mesh::geometry::{distance, rotate_around, Polygon};
use tomo_mesh::intersection::{broadcast_to_shape, cell_distances, polygon_on_mesh};
use tomo_mesh::mesh::Mesh;
use tomo_types::error::{TomoError, TomoResult};

/// Options shared by all line-of-sight generators.
#[derive(Debug, Clone)]
pub struct LineOptions {
    /// Mesh axes the sight line lives on: one 2D axis or a pair of 1D
    /// axes.
    pub index: Vec<usize>,
    /// Detector response, amplification times detector area.
    pub response: f64,
    /// Divide each cell contribution by `4 pi r^2` from the source.
    pub radius_dependence: bool,
    /// Broadcast the result from the indexed axes to the full mesh
    /// shape.
    pub broadcast: bool,
    /// Use exact intersection areas rather than overlap flags.
    pub calc_area: bool,
}

impl Default for LineOptions {
    fn default() -> Self {
        LineOptions {
            index: vec![0, 1],
            response: 1.0,
            radius_dependence: true,
            broadcast: true,
            calc_area: true,
        }
    }
}

/// Response slice of one detector sight line from `p1` toward `p2`.
///
/// The line is widened into a quadrilateral of the given width,
/// optionally opened by `divergence` (full cone angle, `[0, pi)`).
/// The second point only fixes the direction; the footprint is
/// lengthened so it reaches past `p2` even when rotated. A source
/// sitting inside a cell centroid contributes nothing under radius
/// dependence.
pub fn line_detector(
    mesh: &Mesh,
    p1: [f64; 2],
    p2: [f64; 2],
    width: f64,
    divergence: f64,
    options: &LineOptions,
) -> TomoResult<ArrayD<f64>> {
    let footprint = line_to_polygon(p1, p2, width, divergence)?;
    let mut res = polygon_on_mesh(mesh, &footprint, &options.index, options.calc_area)?;
    if options.radius_dependence {
        let r = cell_distances(mesh, &options.index, p1)?;
        res.zip_mut_with(&r, |v, &d| {
            *v = if d > 0.0 { *v / (4.0 * PI * d * d) } else { 0.0 };
        });
    }
    if options.response != 1.0 {
        res.mapv_inplace(|v| v * options.response);
    }
    if options.broadcast {
        res = broadcast_to_shape(&res, &options.index, &mesh.shape())?;
    }
    Ok(res)
}

/// One fan of `number` sight lines spread over `angle` radians around
/// the central axis `p1 -> p2`. A single-line fan degenerates to the
/// central axis.
pub fn fan_detector(
    mesh: &Mesh,
    p1: [f64; 2],
    p2: [f64; 2],
    width: f64,
    number: usize,
    angle: f64,
    options: &LineOptions,
) -> TomoResult<ArrayD<f64>> {
    if !(0.0..PI).contains(&angle) {
        return Err(TomoError::Geometry(format!(
            "fan angle is {angle}, expected within [0, pi)"
        )));
    }
    if number == 0 {
        return Err(TomoError::Geometry(
            "a fan needs at least one detector line".into(),
        ));
    }
    // Lengthen the axis so the outermost rotated lines still cross the
    // whole mesh.
    let reach = 1.0 / (angle / 2.0).cos();
    let far = [
        p1[0] + (p2[0] - p1[0]) * reach,
        p1[1] + (p2[1] - p1[1]) * reach,
    ];
    let mut slices = Vec::with_capacity(number);
    if number == 1 {
        slices.push(line_detector(mesh, p1, far, width, 0.0, options)?);
    } else {
        let step = angle / (number - 1) as f64;
        for i in 0..number {
            let rot = -angle / 2.0 + step * i as f64;
            let end = rotate_around(far, p1, rot);
            slices.push(line_detector(mesh, p1, end, width, 0.0, options)?);
        }
    }
    stack_detectors(slices)
}

/// `fan_num` fans on a circle of `radius` around `focus_point`, each
/// aimed at the focus. `incline` rotates the first fan position from
/// the (1, 0) direction.
pub fn fan_detector_array(
    mesh: &Mesh,
    focus_point: [f64; 2],
    radius: f64,
    fan_num: usize,
    line_num: usize,
    width: f64,
    angle: f64,
    incline: f64,
    options: &LineOptions,
) -> TomoResult<ArrayD<f64>> {
    if fan_num == 0 {
        return Err(TomoError::Geometry(
            "a detector array needs at least one fan".into(),
        ));
    }
    let d_incline = 2.0 * PI / fan_num as f64;
    let mut fans = Vec::with_capacity(fan_num);
    for i in 0..fan_num {
        let theta = incline + d_incline * i as f64;
        let p1 = [
            focus_point[0] + radius * theta.cos(),
            focus_point[1] + radius * theta.sin(),
        ];
        // Aim well past the focus so the fan crosses the whole mesh.
        let p2 = [
            p1[0] + (focus_point[0] - p1[0]) * 10.0,
            p1[1] + (focus_point[1] - p1[1]) * 10.0,
        ];
        fans.push(fan_detector(mesh, p1, p2, width, line_num, angle, options)?);
    }
    concat_detectors(fans)
}

/// `number` parallel sight lines, each shifted `shift` to the left of
/// the previous one (left of the `p1 -> p2` direction).
pub fn parallel_detector(
    mesh: &Mesh,
    p1: [f64; 2],
    p2: [f64; 2],
    width: f64,
    number: usize,
    shift: f64,
    options: &LineOptions,
) -> TomoResult<ArrayD<f64>> {
    if number == 0 {
        return Err(TomoError::Geometry(
            "a parallel array needs at least one detector line".into(),
        ));
    }
    let length = distance(p1, p2);
    if length == 0.0 {
        return Err(TomoError::Geometry(
            "sight line endpoints must differ".into(),
        ));
    }
    // Over-extend so every shifted copy still spans the mesh.
    let far = [
        p1[0] + (p2[0] - p1[0]) * 5.0,
        p1[1] + (p2[1] - p1[1]) * 5.0,
    ];
    let n = [-(p2[1] - p1[1]) / length, (p2[0] - p1[0]) / length];
    let mut slices = Vec::with_capacity(number);
    for i in 0..number {
        let offset = shift * i as f64;
        let a = [p1[0] + n[0] * offset, p1[1] + n[1] * offset];
        let b = [far[0] + n[0] * offset, far[1] + n[1] * offset];
        slices.push(line_detector(mesh, a, b, width, 0.0, options)?);
    }
    stack_detectors(slices)
}

/// Widens a sight line into its quadrilateral footprint. The line is
/// first lengthened by `1/cos(divergence/2)` so the rotated borders
/// still reach past the far point, then each border is rotated by half
/// the divergence around its near end.
fn line_to_polygon(
    p1: [f64; 2],
    p2: [f64; 2],
    width: f64,
    divergence: f64,
) -> TomoResult<Polygon> {
    if width <= 0.0 {
        return Err(TomoError::Geometry(format!(
            "sight line width is {width}, expected positive"
        )));
    }
    if !(0.0..PI).contains(&divergence) {
        return Err(TomoError::Geometry(format!(
            "divergence is {divergence}, expected within [0, pi)"
        )));
    }
    let length = distance(p1, p2);
    if length == 0.0 {
        return Err(TomoError::Geometry(
            "sight line endpoints must differ".into(),
        ));
    }
    let reach = 1.0 / (divergence / 2.0).cos();
    let far = [
        p1[0] + (p2[0] - p1[0]) * reach,
        p1[1] + (p2[1] - p1[1]) * reach,
    ];
    let u = [(p2[0] - p1[0]) / length, (p2[1] - p1[1]) / length];
    let n = [-u[1], u[0]];
    let h = width / 2.0;
    let left_near = [p1[0] + n[0] * h, p1[1] + n[1] * h];
    let left_far = rotate_around(
        [far[0] + n[0] * h, far[1] + n[1] * h],
        left_near,
        divergence / 2.0,
    );
    let right_near = [p1[0] - n[0] * h, p1[1] - n[1] * h];
    let right_far = rotate_around(
        [far[0] - n[0] * h, far[1] - n[1] * h],
        right_near,
        -divergence / 2.0,
    );
    Ok(Polygon::new(vec![
        left_near, left_far, right_far, right_near,
    ]))
}

fn stack_detectors(slices: Vec<ArrayD<f64>>) -> TomoResult<ArrayD<f64>> {
    let first_shape = slices[0].shape().to_vec();
    let mut shape = vec![slices.len()];
    shape.extend_from_slice(&first_shape);
    let mut out = ArrayD::zeros(IxDyn(&shape));
    for (i, slice) in slices.into_iter().enumerate() {
        if slice.shape() != first_shape.as_slice() {
            return Err(TomoError::Consistency(
                "detector slices disagree on mesh shape".into(),
            ));
        }
        out.index_axis_mut(NdAxis(0), i).assign(&slice);
    }
    Ok(out)
}

fn concat_detectors(tensors: Vec<ArrayD<f64>>) -> TomoResult<ArrayD<f64>> {
    let cell_shape = tensors[0].shape()[1..].to_vec();
    let total: usize = tensors.iter().map(|t| t.shape()[0]).sum();
    let mut shape = vec![total];
    shape.extend_from_slice(&cell_shape);
    let mut out = ArrayD::zeros(IxDyn(&shape));
    let mut row = 0;
    for tensor in tensors {
        if tensor.shape()[1..] != cell_shape[..] {
            return Err(TomoError::Consistency(
                "detector tensors disagree on mesh shape".into(),
            ));
        }
        let n = tensor.shape()[0];
        for i in 0..n {
            out.index_axis_mut(NdAxis(0), row + i)
                .assign(&tensor.index_axis(NdAxis(0), i));
        }
        row += n;
    }
    Ok(out)
}

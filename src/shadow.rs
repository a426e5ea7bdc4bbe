// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `path-hardware`.
//
// `path-hardware` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `path-hardware` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `path-hardware`. If not, see <https://www.gnu.org/licenses/>.

//! Convex shadow meshes.
//!
//! A convex occluder's shadow is drawn as a two-ring triangle mesh: an inner
//! umbra ring at full intensity fanned around the polygon centroid, and an
//! outer penumbra ring at zero intensity, bridged to the umbra with quads and
//! rounded at corners with trig-table fans. Per-vertex gaussian coefficients
//! feed the renderer's falloff shader.
//!
//! The algorithm runs in device space for numerical accuracy: the caller's
//! transform is applied before flattening, and every emitted vertex is mapped
//! back through the inverted transform so the result composes with the
//! caller's transform stack.
//!
//! Paths that are not a single convex contour are declined (`None`) so the
//! caller can fall back to a blur-based shadow; genuinely empty paths yield
//! the shared empty mesh, which is not an error.

use std::sync::{Arc, OnceLock};

use kurbo::{Affine, Point, Vec2};

use crate::source::PathSource;
use crate::tessellator::{path_to_transformed_filled_vertices, Tessellator, VertexWriter};

/// Vertices snap to this many subdivisions per pixel before classification,
/// so float noise cannot manufacture duplicate or near-collinear points.
const SNAP_GRID: f64 = 16.0;

/// Two umbra vertices within one snap cell are merged.
const MERGE_TOLERANCE: f64 = 1.0 / SNAP_GRID;

fn snap(p: Point) -> Point {
    Point::new(
        (p.x * SNAP_GRID).round() / SNAP_GRID,
        (p.y * SNAP_GRID).round() / SNAP_GRID,
    )
}

fn cross3(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn normalized(v: Vec2) -> Vec2 {
    let len = v.hypot();
    if len > 0.0 {
        v / len
    } else {
        Vec2::ZERO
    }
}

/// The finished mesh: parallel vertex arrays plus a 16-bit triangle list.
#[derive(Debug, Default, PartialEq)]
pub struct ShadowVertices {
    positions: Vec<[f32; 2]>,
    gaussians: Vec<f32>,
    indices: Vec<u16>,
}

impl ShadowVertices {
    /// The shared "nothing to draw" mesh.
    ///
    /// Distinct from a declined computation: empty input is correctly empty.
    pub fn empty() -> Arc<ShadowVertices> {
        static EMPTY: OnceLock<Arc<ShadowVertices>> = OnceLock::new();
        EMPTY.get_or_init(|| Arc::new(ShadowVertices::default())).clone()
    }

    /// Vertex positions, in the caller's pre-transform coordinate space.
    pub fn positions(&self) -> &[[f32; 2]] {
        &self.positions
    }

    /// One gaussian falloff coefficient per vertex.
    pub fn gaussians(&self) -> &[f32] {
        &self.gaussians
    }

    /// Triangle-list indices into the vertex arrays.
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The positions as raw bytes for a vertex buffer upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// The gaussians as raw bytes for a vertex buffer upload.
    pub fn gaussian_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.gaussians)
    }

    /// The indices as raw bytes for an index buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// How the accumulated path classified for the convex-shadow optimization.
#[derive(Debug)]
pub enum Convexity {
    /// A single convex contour; the payload drives the mesh build.
    Convex(PolygonInfo),

    /// No usable area: fewer than three distinct points, or zero signed
    /// area. Correctly draws nothing.
    Empty,

    /// A second contour began before the first ended; the umbra algorithm
    /// only supports single-contour shapes.
    MultipleContours,

    /// Conclusively not convex, or wrapping more than once.
    NonConvex,
}

/// Collects flattened, device-space path points and classifies them.
///
/// Stack-local and single-use: feed it one path through a
/// [`VertexWriter`][crate::tessellator::VertexWriter], then call
/// [`classify`][Self::classify].
#[derive(Debug, Default)]
pub struct UmbraPinAccumulator {
    points: Vec<Point>,
    finished_contours: usize,
    multiple_contours: bool,
}

impl UmbraPinAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify the accumulated points, consuming the accumulator.
    pub fn classify(self) -> Convexity {
        if self.multiple_contours {
            return Convexity::MultipleContours;
        }
        let mut points = self.points;
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        // Drop points exactly collinear with their neighbors until stable.
        loop {
            let n = points.len();
            if n < 3 {
                return Convexity::Empty;
            }
            let mut kept = Vec::with_capacity(n);
            for i in 0..n {
                let a = points[(i + n - 1) % n];
                let b = points[i];
                let c = points[(i + 1) % n];
                if cross3(a, b, c) != 0.0 {
                    kept.push(b);
                }
            }
            let stable = kept.len() == points.len();
            points = kept;
            if stable {
                break;
            }
        }

        let n = points.len();
        let delta = |i: usize| points[(i + 1) % n] - points[i];

        // A convex loop reverses each axis direction at most twice; more
        // than three sign flips is conclusive proof of concavity.
        for axis in 0..2 {
            let signs: Vec<bool> = (0..n)
                .map(delta)
                .map(|d| if axis == 0 { d.x } else { d.y })
                .filter(|component| *component != 0.0)
                .map(|component| component > 0.0)
                .collect();
            let flips = signs
                .iter()
                .zip(signs.iter().cycle().skip(1))
                .filter(|(a, b)| a != b)
                .count();
            if flips > 3 {
                return Convexity::NonConvex;
            }
        }

        // Every turn must agree with the overall path direction.
        let mut direction = 0.0f64;
        for i in 0..n {
            let cross = cross3(points[(i + n - 1) % n], points[i], points[(i + 1) % n]);
            if cross != 0.0 {
                if direction == 0.0 {
                    direction = cross.signum();
                } else if cross.signum() != direction {
                    return Convexity::NonConvex;
                }
            }
        }
        if direction == 0.0 {
            // The path never changes turning direction: zero area.
            return Convexity::Empty;
        }

        // The signed area accumulated from the first vertex must never
        // change sign; a flip means the path wraps more than once.
        let mut area2 = 0.0f64;
        let mut area_sign = 0.0f64;
        let mut weighted = Vec2::ZERO;
        for i in 1..n - 1 {
            let tri = cross3(points[0], points[i], points[i + 1]);
            area2 += tri;
            if area2 != 0.0 {
                let sign = area2.signum();
                if area_sign == 0.0 {
                    area_sign = sign;
                } else if sign != area_sign {
                    return Convexity::NonConvex;
                }
            }
            weighted += Vec2::new(
                tri * (points[0].x + points[i].x + points[i + 1].x) / 3.0,
                tri * (points[0].y + points[i].y + points[i + 1].y) / 3.0,
            );
        }
        if area2 == 0.0 {
            return Convexity::Empty;
        }

        Convexity::Convex(PolygonInfo {
            centroid: Point::new(weighted.x / area2, weighted.y / area2),
            vertices: points,
            direction,
        })
    }
}

impl VertexWriter for UmbraPinAccumulator {
    fn write(&mut self, point: Point) {
        if self.finished_contours > 0 && !self.points.is_empty() {
            self.multiple_contours = true;
            return;
        }
        let point = snap(point);
        if self.points.last() == Some(&point) {
            return;
        }
        self.points.push(point);
    }

    fn end_contour(&mut self) {
        if !self.points.is_empty() {
            self.finished_contours += 1;
        }
    }
}

/// One pin per polygon edge: the edge offset inward by the umbra inset,
/// carrying its clipping state and its slot in the output vertex buffer.
#[derive(Debug, Clone, Copy)]
struct UmbraPin {
    /// Location on the original polygon.
    path_vertex: Point,

    /// Vector to the next polygon vertex.
    path_delta: Vec2,

    /// Outward perpendicular offset scaled by the occluder height.
    penumbra_delta: Vec2,

    /// Start of the inset edge: the inward offset candidate before clipping.
    pin_tip: Point,

    /// Resolved umbra corner, once the intersection walk accepts one.
    umbra_vertex: Option<Point>,

    /// Slot of the resolved corner in the output vertex buffer.
    umbra_index: u32,

    /// Progress along the pin consumed by intersection clipping.
    umbra_fraction: Option<f64>,

    /// Circular-list links; eliminated pins are spliced out.
    p_next: u32,
    p_prev: u32,

    alive: bool,
}

/// The classified convex polygon: vertices, winding and centroid.
#[derive(Debug, Clone)]
pub struct PolygonInfo {
    vertices: Vec<Point>,
    direction: f64,
    centroid: Point,
}

/// Intersection of the infinite lines `p0 + s·v0` and `p1 + t·v1`, with the
/// parameters in edge units. `None` when the lines are (nearly) parallel.
fn intersect_lines(p0: Point, v0: Vec2, p1: Point, v1: Vec2) -> Option<(Point, f64, f64)> {
    let denom = v0.cross(v1);
    if denom.abs() < 1e-12 {
        return None;
    }
    let w = p1 - p0;
    let s = w.cross(v1) / denom;
    let t = w.cross(v0) / denom;
    Some((p0 + v0 * s, s, t))
}

impl PolygonInfo {
    /// The polygon's device-space vertices.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// The winding sign: positive cross products or negative.
    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// Area-weighted centroid of the triangle-fan decomposition.
    pub fn centroid(&self) -> Point {
        self.centroid
    }

    /// Build the shadow mesh for this polygon.
    ///
    /// `occluder_height` is in device pixels; `view_matrix` is the transform
    /// the polygon was flattened through, used to map the result back into
    /// the caller's space. Returns `None` when the matrix cannot be inverted
    /// or the umbra cannot be resolved.
    pub fn calculate_convex_shadow_mesh(
        &self,
        tessellator: &mut Tessellator,
        occluder_height: f64,
        view_matrix: Affine,
    ) -> Option<Arc<ShadowVertices>> {
        let determinant = view_matrix.determinant();
        if !determinant.is_finite() || determinant.abs() < 1e-12 {
            tracing::trace!("shadow declined: view matrix is not invertible");
            return None;
        }
        let inverse = view_matrix.inverse();

        let n = self.vertices.len();
        let mut inwards = Vec::with_capacity(n);
        let mut min_dist = f64::INFINITY;
        for i in 0..n {
            let unit = normalized(self.vertices[(i + 1) % n] - self.vertices[i]);
            let inward = if self.direction > 0.0 {
                Vec2::new(-unit.y, unit.x)
            } else {
                Vec2::new(unit.y, -unit.x)
            };
            min_dist = min_dist.min((self.centroid - self.vertices[i]).dot(inward));
            inwards.push(inward);
        }
        if !(min_dist > 0.0) {
            tracing::trace!("shadow declined: centroid outside the polygon");
            return None;
        }

        // The inward offset never overshoots the polygon's far side; a
        // clamped inset dims the whole umbra instead.
        let inset = occluder_height.min(min_dist);
        let umbra_gaussian = if inset >= occluder_height {
            1.0
        } else {
            0.5 * (1.0 + inset / occluder_height)
        };

        let mut pins = Vec::with_capacity(n);
        for i in 0..n {
            let path_vertex = self.vertices[i];
            pins.push(UmbraPin {
                path_vertex,
                path_delta: self.vertices[(i + 1) % n] - path_vertex,
                penumbra_delta: -inwards[i] * occluder_height,
                pin_tip: path_vertex + inwards[i] * inset,
                umbra_vertex: None,
                umbra_index: 0,
                umbra_fraction: None,
                p_next: ((i + 1) % n) as u32,
                p_prev: ((i + n - 1) % n) as u32,
                alive: true,
            });
        }

        if !self.resolve_pin_intersections(&mut pins) {
            tracing::trace!("shadow declined: umbra intersections did not resolve");
            return None;
        }

        self.emit_mesh(tessellator, &mut pins, occluder_height, umbra_gaussian, inverse)
    }

    /// Clip the inset edges against each other around the circular pin list.
    ///
    /// Standard convex polygon offsetting: each accepted corner is the
    /// intersection of consecutive inset edge lines; a pin whose recorded
    /// fraction is overtaken by a later intersection has been consumed
    /// entirely and is spliced out. Several branches below look unreachable
    /// for clean convex input but are kept for adversarial paths.
    fn resolve_pin_intersections(&self, pins: &mut [UmbraPin]) -> bool {
        let n = pins.len();
        let mut alive_count = n;
        let mut prev = n - 1;
        let mut curr = 0;
        let mut iterations = 0usize;

        while prev != curr {
            iterations += 1;
            if iterations > n * n + 1 {
                // The list refuses to stabilize; give up cleanly.
                return false;
            }
            if alive_count < 3 {
                return false;
            }
            if !pins[prev].alive {
                prev = pins[prev].p_prev as usize;
                continue;
            }
            if !pins[curr].alive {
                curr = pins[curr].p_next as usize;
                continue;
            }

            let unlink = |pins: &mut [UmbraPin], i: usize| {
                let (p, x) = (pins[i].p_prev, pins[i].p_next);
                pins[p as usize].p_next = x;
                pins[x as usize].p_prev = p;
                pins[i].alive = false;
            };

            match intersect_lines(
                pins[prev].pin_tip,
                pins[prev].path_delta,
                pins[curr].pin_tip,
                pins[curr].path_delta,
            ) {
                None => {
                    // Parallel inset lines; the current pin cannot produce a
                    // corner against its predecessor.
                    unlink(pins, curr);
                    alive_count -= 1;
                    curr = pins[curr].p_next as usize;
                }
                Some((point, s, t)) => {
                    if pins[prev]
                        .umbra_fraction
                        .is_some_and(|fraction| s < fraction)
                    {
                        // The new corner lands behind the previous pin's
                        // accepted corner: that pin was consumed entirely.
                        pins[prev].umbra_vertex = None;
                        pins[prev].umbra_fraction = None;
                        let back = pins[prev].p_prev as usize;
                        unlink(pins, prev);
                        alive_count -= 1;
                        prev = back;
                    } else if pins[curr].umbra_fraction.is_some()
                        && pins[curr].umbra_vertex.is_some_and(|existing| {
                            (existing - point).hypot() < 1e-6
                        })
                    {
                        // Wrapped around to an already-accepted corner.
                        break;
                    } else {
                        pins[curr].umbra_vertex = Some(point);
                        pins[curr].umbra_fraction = Some(t);
                        prev = curr;
                        curr = pins[curr].p_next as usize;
                    }
                }
            }
        }

        pins.iter()
            .filter(|pin| pin.alive && pin.umbra_vertex.is_some())
            .count()
            >= 3
    }

    fn emit_mesh(
        &self,
        tessellator: &mut Tessellator,
        pins: &mut [UmbraPin],
        occluder_height: f64,
        umbra_gaussian: f64,
        inverse: Affine,
    ) -> Option<Arc<ShadowVertices>> {
        let n = pins.len();

        // Deduplicate adjacent umbra corners on the snap grid, assigning
        // each surviving pin its output slot.
        let mut umbra_vertices: Vec<Point> = Vec::new();
        let mut survivors: Vec<usize> = Vec::new();
        for (i, pin) in pins.iter().enumerate() {
            if pin.alive && pin.umbra_vertex.is_some() {
                survivors.push(i);
            }
        }
        for &i in &survivors {
            let vertex = pins[i].umbra_vertex.expect("survivor without a corner");
            match umbra_vertices.last() {
                Some(last)
                    if (vertex.x - last.x).abs() <= MERGE_TOLERANCE
                        && (vertex.y - last.y).abs() <= MERGE_TOLERANCE =>
                {
                    pins[i].umbra_index = (umbra_vertices.len() - 1) as u32;
                }
                _ => {
                    pins[i].umbra_index = umbra_vertices.len() as u32;
                    umbra_vertices.push(vertex);
                }
            }
        }
        if umbra_vertices.len() > 1 {
            let first = umbra_vertices[0];
            let last = umbra_vertices[umbra_vertices.len() - 1];
            if (first.x - last.x).abs() <= MERGE_TOLERANCE
                && (first.y - last.y).abs() <= MERGE_TOLERANCE
            {
                let merged = (umbra_vertices.len() - 1) as u32;
                umbra_vertices.pop();
                for &i in &survivors {
                    if pins[i].umbra_index == merged {
                        pins[i].umbra_index = 0;
                    }
                }
            }
        }
        let umbra_count = umbra_vertices.len();
        if umbra_count < 3 {
            tracing::trace!("shadow declined: umbra collapsed below a triangle");
            return None;
        }

        // Every polygon vertex maps to an umbra slot; eliminated pins
        // inherit the next surviving pin's slot.
        let mut vertex_umbra = vec![u32::MAX; n];
        for &i in &survivors {
            vertex_umbra[i] = pins[i].umbra_index;
        }
        for i in 0..n {
            if vertex_umbra[i] == u32::MAX {
                let mut j = i;
                while vertex_umbra[j] == u32::MAX {
                    j = (j + 1) % n;
                }
                vertex_umbra[i] = vertex_umbra[j];
            }
        }

        let mut positions: Vec<Point> = Vec::new();
        let mut gaussians: Vec<f64> = Vec::new();
        let mut triangles: Vec<[u32; 3]> = Vec::new();

        positions.push(self.centroid);
        gaussians.push(umbra_gaussian);
        for vertex in &umbra_vertices {
            positions.push(*vertex);
            gaussians.push(umbra_gaussian);
        }

        // Centroid fan over the umbra ring.
        for k in 0..umbra_count as u32 {
            triangles.push([0, 1 + k, 1 + (k + 1) % umbra_count as u32]);
        }

        // Penumbra ring: per-corner rounding fans sized from the trig table,
        // bridged across each edge back to the umbra ring.
        let trigs = tessellator.trigs_for_device_radius(occluder_height);
        let divisions = trigs.len() - 1;
        let step = std::f64::consts::FRAC_PI_2 / divisions as f64;
        let height_sq = occluder_height * occluder_height;

        let mut first_penumbra: Option<u32> = None;
        let mut previous_exit: Option<u32> = None;
        let mut previous_umbra = 0u32;
        for i in 0..n {
            let entry_offset = pins[(i + n - 1) % n].penumbra_delta;
            let exit_offset = pins[i].penumbra_delta;
            let umbra_slot = 1 + vertex_umbra[i];
            let vertex = pins[i].path_vertex;

            let angle = (entry_offset.dot(exit_offset) / height_sq)
                .clamp(-1.0, 1.0)
                .acos();
            let steps = ((angle / step - 1e-9).ceil().max(1.0)) as usize;
            let turn_sign = if entry_offset.cross(exit_offset) > 0.0 {
                1.0
            } else {
                -1.0
            };

            let entry = vertex + entry_offset;
            positions.push(entry);
            gaussians.push(0.0);
            let entry_index = (positions.len() - 1) as u32;
            if first_penumbra.is_none() {
                first_penumbra = Some(entry_index);
            }
            if let Some(exit_index) = previous_exit {
                triangles.push([previous_umbra, exit_index, entry_index]);
                if previous_umbra != umbra_slot {
                    triangles.push([previous_umbra, entry_index, umbra_slot]);
                }
            }

            let mut last_index = entry_index;
            for k in 1..=steps {
                let point = if k < steps {
                    let trig = trigs[k];
                    let sin = trig.sin_angle * turn_sign;
                    vertex
                        + Vec2::new(
                            entry_offset.x * trig.cos_angle - entry_offset.y * sin,
                            entry_offset.x * sin + entry_offset.y * trig.cos_angle,
                        )
                } else {
                    vertex + exit_offset
                };
                positions.push(point);
                gaussians.push(0.0);
                let index = (positions.len() - 1) as u32;
                triangles.push([umbra_slot, last_index, index]);
                last_index = index;
            }
            previous_exit = Some(last_index);
            previous_umbra = umbra_slot;
        }

        // Close the ring with a duplicate of the first penumbra vertex.
        let first_penumbra = first_penumbra.expect("non-empty polygon");
        positions.push(positions[first_penumbra as usize]);
        gaussians.push(0.0);
        let closing = (positions.len() - 1) as u32;
        triangles.push([previous_umbra, previous_exit.expect("ring emitted"), closing]);
        let first_umbra = 1 + vertex_umbra[0];
        if previous_umbra != first_umbra {
            triangles.push([previous_umbra, closing, first_umbra]);
        }

        if positions.len() > u16::MAX as usize {
            tracing::warn!(
                vertices = positions.len(),
                "shadow declined: mesh exceeds 16-bit indexing"
            );
            return None;
        }

        // Map back into the caller's pre-transform space.
        let mut out = ShadowVertices {
            positions: Vec::with_capacity(positions.len()),
            gaussians: gaussians.iter().map(|g| *g as f32).collect(),
            indices: Vec::with_capacity(triangles.len() * 3),
        };
        for position in positions {
            let local = inverse * position;
            out.positions.push([local.x as f32, local.y as f32]);
        }
        for triangle in triangles {
            for index in triangle {
                out.indices.push(index as u16);
            }
        }
        Some(Arc::new(out))
    }
}

/// Build a convex shadow mesh for `source` under `view_matrix`.
///
/// Returns the shared empty mesh for genuinely empty input, and `None` when
/// the optimization does not apply (non-convex or multi-contour input, a
/// non-invertible matrix, or an unresolvable umbra) so the caller can fall
/// back to a blur-based shadow.
pub fn calculate_convex_shadow_mesh(
    tessellator: &mut Tessellator,
    source: &dyn PathSource,
    occluder_height: f64,
    view_matrix: Affine,
) -> Option<Arc<ShadowVertices>> {
    if !(occluder_height > 0.0) {
        // Nothing to cast.
        return Some(ShadowVertices::empty());
    }
    let determinant = view_matrix.determinant();
    if !determinant.is_finite() || determinant.abs() < 1e-12 {
        tracing::trace!("shadow declined: view matrix is not invertible");
        return None;
    }

    let mut accumulator = UmbraPinAccumulator::new();
    path_to_transformed_filled_vertices(source, &mut accumulator, view_matrix);
    match accumulator.classify() {
        Convexity::Empty => Some(ShadowVertices::empty()),
        Convexity::MultipleContours => {
            tracing::trace!("shadow declined: multiple contours");
            None
        }
        Convexity::NonConvex => {
            tracing::trace!("shadow declined: non-convex path");
            None
        }
        Convexity::Convex(polygon) => {
            polygon.calculate_convex_shadow_mesh(tessellator, occluder_height, view_matrix)
        }
    }
}

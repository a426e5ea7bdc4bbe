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

//! Rounded superellipses.
//!
//! A rounded superellipse is a rounded-rectangle-like shape whose corners
//! blend a superellipse arc into a circular arc for a smoother transition
//! than a conic corner. Each corner octant decomposes into three pieces,
//! walking from the edge toward the corner diagonal:
//!
//! 1. a straight "stretch" along the edge,
//! 2. a circular arc, tangent to the edge and to the superellipse,
//! 3. a superellipse arc `x^n + y^n = 1` up to the 45° diagonal.
//!
//! The superellipse degree and the join angle between pieces come from
//! [`PRECOMPUTED_VARIABLES`], a small table indexed by the corner's
//! radius-to-half-size ratio; the join angle is the solution of an offline
//! root-solve (the parameter where the superellipse tangent reaches 22.5°,
//! splitting the octant's turn evenly between the two curved pieces).

use kurbo::{Point, Rect, Vec2};
use tinyvec::TinyVec;

use crate::round_rect::RoundingRadii;
use crate::source::{emit_conic, PathReceiver};

/// Columns: corner ratio, superellipse degree `n`, join angle `theta_j`.
///
/// A ratio of 1 is an exact quarter circle (`n` = 2, join at 22.5°); small
/// ratios approach a square corner. Regenerate by solving for the parameter
/// where the superellipse tangent makes 22.5° with the edge.
const PRECOMPUTED_VARIABLES: [[f64; 3]; 20] = [
    [0.05, 46.98362, 0.567506],
    [0.10, 23.31723, 0.562910],
    [0.15, 15.42785, 0.558048],
    [0.20, 11.48270, 0.552897],
    [0.25, 9.11524, 0.547432],
    [0.30, 7.53662, 0.541621],
    [0.35, 6.40876, 0.535431],
    [0.40, 5.56261, 0.528825],
    [0.45, 4.90427, 0.521759],
    [0.50, 4.37739, 0.514184],
    [0.55, 3.94611, 0.506045],
    [0.60, 3.58652, 0.497277],
    [0.65, 3.28209, 0.487807],
    [0.70, 3.02097, 0.477550],
    [0.75, 2.79452, 0.466408],
    [0.80, 2.59621, 0.454266],
    [0.85, 2.42109, 0.440992],
    [0.90, 2.26528, 0.426431],
    [0.95, 2.12573, 0.410404],
    [1.00, 2.00000, 0.392699],
];

/// Interpolate `n` and `theta_j` for a corner ratio.
fn interpolate_variables(ratio: f64) -> (f64, f64) {
    let first = &PRECOMPUTED_VARIABLES[0];
    if ratio <= first[0] {
        return (first[1], first[2]);
    }
    let last = &PRECOMPUTED_VARIABLES[PRECOMPUTED_VARIABLES.len() - 1];
    if ratio >= last[0] {
        return (last[1], last[2]);
    }
    let mut i = 1;
    while PRECOMPUTED_VARIABLES[i][0] < ratio {
        i += 1;
    }
    let lo = &PRECOMPUTED_VARIABLES[i - 1];
    let hi = &PRECOMPUTED_VARIABLES[i];
    let t = (ratio - lo[0]) / (hi[0] - lo[0]);
    (
        lo[1] + (hi[1] - lo[1]) * t,
        lo[2] + (hi[2] - lo[2]) * t,
    )
}

/// The derived decomposition of one corner octant, in canonical octant
/// coordinates: the quadrant is the unit square, the shape center is the
/// origin, the edge is the line `x = 1` and the corner is `(1, 1)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct CornerParam {
    /// Superellipse degree; 0 marks a square corner with no curve at all.
    n: f64,

    /// Join point between the circular arc and the superellipse arc.
    join: Vec2,

    /// Unit tangent at the join, pointing from the edge toward the diagonal.
    join_tangent: Vec2,

    /// Center of the circular piece.
    circle_center: Vec2,

    /// Radius of the circular piece.
    radius: f64,

    /// Where the straight stretch ends and the circular arc begins, as a
    /// distance along the edge from the quadrant's edge midpoint.
    edge_offset: f64,

    /// The 45° diagonal point `2^(-1/n)` where the two octants of a corner
    /// meet.
    diagonal: f64,
}

impl CornerParam {
    fn square() -> Self {
        Self {
            n: 0.0,
            edge_offset: 1.0,
            diagonal: 1.0,
            ..Self::default()
        }
    }

    fn is_square(&self) -> bool {
        self.n == 0.0
    }

    fn compute(ratio: f64) -> Self {
        if !(ratio > 0.0) {
            return Self::square();
        }
        let (n, theta_j) = interpolate_variables(ratio);
        let p = 2.0 / n;

        let (sin_j, cos_j) = theta_j.sin_cos();
        let join = Vec2::new(cos_j.powf(p), sin_j.powf(p));

        // Outward unit normal of x^n + y^n = 1 at the join.
        let grad = Vec2::new(join.x.powf(n - 1.0), join.y.powf(n - 1.0));
        let normal = grad / grad.hypot();

        // The circle is tangent to the superellipse at the join and tangent
        // to the edge line x = 1.
        let radius = (1.0 - join.x) / (1.0 - normal.x);
        let circle_center = join - normal * radius;

        // Parametric tangent of (cos^p t, sin^p t), toward increasing t.
        let tangent = Vec2::new(
            -p * cos_j.powf(p - 1.0) * sin_j,
            p * sin_j.powf(p - 1.0) * cos_j,
        );
        let join_tangent = tangent / tangent.hypot();

        Self {
            n,
            join,
            join_tangent,
            circle_center,
            radius,
            edge_offset: circle_center.y.max(0.0),
            diagonal: (-std::f64::consts::LN_2 / n).exp(),
        }
    }

    /// The boundary's x extent at height `y` in canonical octant coordinates.
    fn boundary_x(&self, y: f64) -> f64 {
        if self.is_square() || y <= self.edge_offset {
            return 1.0;
        }
        if y <= self.join.y {
            let dy = y - self.circle_center.y;
            return self.circle_center.x + (self.radius * self.radius - dy * dy).max(0.0).sqrt();
        }
        (1.0 - y.powf(self.n)).max(0.0).powf(1.0 / self.n)
    }
}

/// Maps canonical octant coordinates into device space for one quadrant.
#[derive(Debug, Clone, Copy, Default)]
struct QuadrantFrame {
    center: Point,
    sign: Vec2,
    half: Vec2,
    corner: usize,
}

impl QuadrantFrame {
    /// Map a point of the octant adjacent to the horizontal edge.
    fn horizontal(&self, p: Vec2) -> Point {
        Point::new(
            self.center.x + self.sign.x * self.half.x * p.y,
            self.center.y + self.sign.y * self.half.y * p.x,
        )
    }

    /// Map a point of the octant adjacent to the vertical edge.
    fn vertical(&self, p: Vec2) -> Point {
        Point::new(
            self.center.x + self.sign.x * self.half.x * p.x,
            self.center.y + self.sign.y * self.half.y * p.y,
        )
    }
}

/// The cached decomposition of a rounded superellipse into per-quadrant
/// octant pairs.
///
/// Uniform-radius shapes compute a single corner decomposition and mirror it
/// into all four quadrants; non-uniform shapes compute all four corners
/// independently, splitting the bounds along each axis proportionally to the
/// adjacent corners' radii so neighboring corners meet at a shared edge
/// point.
#[derive(Debug, Clone)]
pub struct RoundSuperellipseParam {
    corners: TinyVec<[CornerParam; 4]>,
    frames: [QuadrantFrame; 4],
}

impl RoundSuperellipseParam {
    /// Build the decomposition for normalized `bounds` and `radii`.
    pub fn from_bounds_radii(bounds: Rect, radii: RoundingRadii) -> Self {
        let Rect { x0, y0, x1, y1 } = bounds;
        let width = bounds.width();
        let height = bounds.height();

        let split = |lo: f64, extent: f64, a: f64, b: f64| {
            if a + b > 0.0 {
                lo + extent * a / (a + b)
            } else {
                lo + extent * 0.5
            }
        };
        let x_top = split(x0, width, radii.top_left.width, radii.top_right.width);
        let x_bottom = split(x0, width, radii.bottom_left.width, radii.bottom_right.width);
        let y_left = split(y0, height, radii.top_left.height, radii.bottom_left.height);
        let y_right = split(y0, height, radii.top_right.height, radii.bottom_right.height);

        // Quadrant order: top-left, top-right, bottom-right, bottom-left.
        let frames = [
            QuadrantFrame {
                center: Point::new(x_top, y_left),
                sign: Vec2::new(-1.0, -1.0),
                half: Vec2::new(x_top - x0, y_left - y0),
                corner: 0,
            },
            QuadrantFrame {
                center: Point::new(x_top, y_right),
                sign: Vec2::new(1.0, -1.0),
                half: Vec2::new(x1 - x_top, y_right - y0),
                corner: 0,
            },
            QuadrantFrame {
                center: Point::new(x_bottom, y_right),
                sign: Vec2::new(1.0, 1.0),
                half: Vec2::new(x1 - x_bottom, y1 - y_right),
                corner: 0,
            },
            QuadrantFrame {
                center: Point::new(x_bottom, y_left),
                sign: Vec2::new(-1.0, 1.0),
                half: Vec2::new(x_bottom - x0, y1 - y_left),
                corner: 0,
            },
        ];

        let corner_sizes = [
            radii.top_left,
            radii.top_right,
            radii.bottom_right,
            radii.bottom_left,
        ];
        let uniform = corner_sizes.iter().all(|s| *s == corner_sizes[0]);

        // One shared degree per corner: blend the two axis ratios so both
        // octants meet exactly at the diagonal point.
        let mut ratios = [0.0f64; 4];
        for (i, frame) in frames.iter().enumerate() {
            let size = corner_sizes[i];
            if frame.half.x > 0.0 && frame.half.y > 0.0 {
                ratios[i] = 0.5 * (size.width / frame.half.x + size.height / frame.half.y);
            }
        }

        let mut corners: TinyVec<[CornerParam; 4]> = TinyVec::new();
        let mut frames = frames;
        if uniform {
            corners.push(CornerParam::compute(ratios[0]));
        } else {
            for (i, frame) in frames.iter_mut().enumerate() {
                frame.corner = i;
                corners.push(CornerParam::compute(ratios[i]));
            }
        }

        Self { corners, frames }
    }

    /// Deliver the shape's boundary to a receiver, clockwise in y-down
    /// coordinates, starting at the top edge split.
    pub fn dispatch(&self, receiver: &mut dyn PathReceiver) {
        // Quadrant visit order with octant direction: each quadrant walks
        // edge -> diagonal through one octant and diagonal -> edge through
        // the other.
        let tl = &self.frames[0];
        let tr = &self.frames[1];
        let br = &self.frames[2];
        let bl = &self.frames[3];

        let start = tr.horizontal(Vec2::new(1.0, 0.0));
        receiver.move_to(start, true);
        let mut current = start;

        self.emit_octant(receiver, &mut current, tr, true, true);
        self.emit_octant(receiver, &mut current, tr, false, false);
        self.emit_octant(receiver, &mut current, br, false, true);
        self.emit_octant(receiver, &mut current, br, true, false);
        self.emit_octant(receiver, &mut current, bl, true, true);
        self.emit_octant(receiver, &mut current, bl, false, false);
        self.emit_octant(receiver, &mut current, tl, false, true);
        self.emit_octant(receiver, &mut current, tl, true, false);

        receiver.close();
        receiver.path_end();
    }

    /// Emit one octant, either edge-to-diagonal (`forward`) or back.
    fn emit_octant(
        &self,
        receiver: &mut dyn PathReceiver,
        current: &mut Point,
        frame: &QuadrantFrame,
        horizontal: bool,
        forward: bool,
    ) {
        let corner = &self.corners[frame.corner.min(self.corners.len() - 1)];
        let map = |p: Vec2| {
            if horizontal {
                frame.horizontal(p)
            } else {
                frame.vertical(p)
            }
        };
        let line = |receiver: &mut dyn PathReceiver, current: &mut Point, p: Point| {
            if p != *current {
                receiver.line_to(p);
                *current = p;
            }
        };

        if corner.is_square() {
            // The whole octant is the straight edge up to the corner.
            let target = if forward {
                map(Vec2::new(1.0, 1.0))
            } else {
                map(Vec2::new(1.0, 0.0))
            };
            line(receiver, current, target);
            return;
        }

        let t = Vec2::new(1.0, corner.edge_offset);
        let join = corner.join;
        let diag = Vec2::new(corner.diagonal, corner.diagonal);

        // Conic control point: intersection of the edge line x = 1 with the
        // tangent at the join.
        let jt = corner.join_tangent;
        let arc_cp = Vec2::new(1.0, join.y + (1.0 - join.x) * jt.y / jt.x);
        let arc_weight = {
            let a = (Vec2::new(1.0, corner.edge_offset) - corner.circle_center) / corner.radius;
            let b = (join - corner.circle_center) / corner.radius;
            let half_angle = 0.5 * a.dot(b).clamp(-1.0, 1.0).acos();
            half_angle.cos()
        };

        // Cubic handles for the superellipse piece, sized like a circular
        // arc of the same turn.
        let diag_tangent = Vec2::new(-std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2);
        let chord = (diag - join).hypot();
        let turn = jt.dot(diag_tangent).clamp(-1.0, 1.0).acos();
        let handle = if turn > 1e-6 {
            (4.0 / 3.0) * (turn * 0.25).tan() * chord / (2.0 * (turn * 0.5).sin())
        } else {
            chord / 3.0
        };
        let cubic_cp1 = join + jt * handle;
        let cubic_cp2 = diag - diag_tangent * handle;

        if forward {
            line(receiver, current, map(t));
            emit_conic(receiver, *current, map(arc_cp), map(join), arc_weight);
            *current = map(join);
            receiver.cubic_to(map(cubic_cp1), map(cubic_cp2), map(diag));
            *current = map(diag);
        } else {
            // The diagonal point was emitted by the preceding octant.
            receiver.cubic_to(map(cubic_cp2), map(cubic_cp1), map(join));
            *current = map(join);
            emit_conic(receiver, *current, map(arc_cp), map(t), arc_weight);
            *current = map(t);
            line(receiver, current, map(Vec2::new(1.0, 0.0)));
        }
    }

    /// Whether `point` lies inside the shape.
    pub fn contains(&self, point: Point) -> bool {
        // Pick the quadrant, then test against the canonical octant
        // boundary; only that quadrant's curve needs evaluating.
        for frame in &self.frames {
            if !(frame.half.x > 0.0) || !(frame.half.y > 0.0) {
                continue;
            }
            let lx = (point.x - frame.center.x) * frame.sign.x / frame.half.x;
            let ly = (point.y - frame.center.y) * frame.sign.y / frame.half.y;
            if lx < 0.0 || ly < 0.0 {
                continue;
            }
            if lx > 1.0 || ly > 1.0 {
                return false;
            }
            let corner = &self.corners[frame.corner.min(self.corners.len() - 1)];
            let (outer, inner) = if lx >= ly { (lx, ly) } else { (ly, lx) };
            return outer <= corner.boundary_x(inner);
        }
        // In bounds but on no corner's side of every split: the straight
        // middle region.
        true
    }
}

/// A rounded superellipse shape: bounds plus per-corner radii under the
/// shared radius-normalization invariant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundSuperellipse {
    bounds: Rect,
    radii: RoundingRadii,
}

impl RoundSuperellipse {
    /// Build the shape, normalizing the radii against the bounds.
    pub fn from_rect_radii(bounds: Rect, radii: RoundingRadii) -> Self {
        let bounds = bounds.abs();
        Self {
            radii: radii.normalized(bounds),
            bounds,
        }
    }

    /// The bounding rectangle.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The normalized corner radii.
    pub fn radii(&self) -> RoundingRadii {
        self.radii
    }

    /// Compute the corner decomposition for this shape.
    pub fn param(&self) -> RoundSuperellipseParam {
        RoundSuperellipseParam::from_bounds_radii(self.bounds, self.radii)
    }

    /// Whether `point` lies inside the shape.
    pub fn contains(&self, point: Point) -> bool {
        let Rect { x0, y0, x1, y1 } = self.bounds;
        if point.x < x0 || point.x > x1 || point.y < y0 || point.y > y1 {
            return false;
        }
        self.param().contains(point)
    }
}

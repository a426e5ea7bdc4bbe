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

//! Wang's-formula subdivision estimators.
//!
//! Each function returns the real-valued minimum number of line segments a
//! curve must be split into to stay within a quarter pixel of the true curve
//! at the given device scale. Callers `ceil()` the result and clamp it to at
//! least one segment.
//!
//! These three functions are the single source of truth for segment counts:
//! storage counting, vertex flattening and shadow accumulation all call the
//! same formulas, so count-then-fill passes never disagree.

use kurbo::{Point, Vec2};

/// Inverse of the flattening tolerance: results stay within `1/PRECISION`
/// device pixels of the curve.
pub(crate) const PRECISION: f64 = 4.0;

/// Segment count for a quadratic Bézier.
pub fn quadratic_subdivisions(scale: f64, p0: Point, p1: Point, p2: Point) -> f64 {
    let dd = Vec2::new(p0.x - 2.0 * p1.x + p2.x, p0.y - 2.0 * p1.y + p2.y);
    (scale * 0.25 * PRECISION * dd.hypot()).sqrt()
}

/// Segment count for a cubic Bézier.
pub fn cubic_subdivisions(scale: f64, p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    let a = Vec2::new(p0.x - 2.0 * p1.x + p2.x, p0.y - 2.0 * p1.y + p2.y);
    let b = Vec2::new(p1.x - 2.0 * p2.x + p3.x, p1.y - 2.0 * p2.y + p3.y);
    // Componentwise maximum of the two second differences.
    let m = Vec2::new(a.x.abs().max(b.x.abs()), a.y.abs().max(b.y.abs()));
    (scale * 0.75 * PRECISION * m.hypot()).sqrt()
}

/// Segment count for a rational quadratic, after Zheng–Sederberg.
///
/// The control points are recentered on their bounding-box center before the
/// forward differences are taken, which keeps the estimate
/// translation-invariant.
pub fn conic_subdivisions(scale: f64, p0: Point, p1: Point, p2: Point, weight: f64) -> f64 {
    let cx = 0.5 * (p0.x.min(p1.x).min(p2.x) + p0.x.max(p1.x).max(p2.x));
    let cy = 0.5 * (p0.y.min(p1.y).min(p2.y) + p0.y.max(p1.y).max(p2.y));
    let q0 = Vec2::new(p0.x - cx, p0.y - cy);
    let q1 = Vec2::new(p1.x - cx, p1.y - cy);
    let q2 = Vec2::new(p2.x - cx, p2.y - cy);

    let max_len = q0.hypot2().max(q1.hypot2()).max(q2.hypot2()).sqrt();

    // Forward differences of the rational form, plus the weight's deviation
    // from an ordinary quadratic.
    let dp = Vec2::new(
        q0.x - 2.0 * weight * q1.x + q2.x,
        q0.y - 2.0 * weight * q1.y + q2.y,
    );
    let dw = (2.0 - 2.0 * weight).abs();

    let precision = scale * PRECISION;
    let rp_minus_1 = (max_len * precision - 1.0).max(0.0);
    let numer = dp.hypot() * precision + rp_minus_1 * dw;
    let denom = 4.0 * weight.min(1.0);
    (numer / denom).sqrt()
}

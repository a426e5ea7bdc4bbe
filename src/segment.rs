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

//! Plain segment value types used on the hot side of tessellation.
//!
//! The producer side of the crate speaks the [`PathReceiver`] protocol; once
//! segments have been pruned they are carried as these tagged values so inner
//! loops don't re-dispatch through a trait object per segment.
//!
//! [`PathReceiver`]: crate::source::PathReceiver

use kurbo::Point;

use crate::wangs_formula;

/// A straight line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub p0: Point,
    pub p1: Point,
}

impl LineSegment {
    pub fn new(p0: Point, p1: Point) -> Self {
        Self { p0, p1 }
    }
}

/// A quadratic Bézier segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadSegment {
    pub p0: Point,
    pub cp: Point,
    pub p2: Point,
}

impl QuadSegment {
    pub fn new(p0: Point, cp: Point, p2: Point) -> Self {
        Self { p0, cp, p2 }
    }

    /// Evaluate the curve at parameter `t`.
    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt;
        let b = 2.0 * mt * t;
        let c = t * t;
        Point::new(
            a * self.p0.x + b * self.cp.x + c * self.p2.x,
            a * self.p0.y + b * self.cp.y + c * self.p2.y,
        )
    }

    /// The real-valued segment count needed to flatten this curve.
    pub fn subdivisions(&self, scale: f64) -> f64 {
        wangs_formula::quadratic_subdivisions(scale, self.p0, self.cp, self.p2)
    }

    /// Flatten the curve, feeding every point after `p0` to `f`.
    pub fn flatten_into(&self, scale: f64, f: &mut impl FnMut(Point)) {
        let count = self.subdivisions(scale).ceil().max(1.0) as usize;
        for i in 1..=count {
            f(self.eval(i as f64 / count as f64));
        }
    }
}

/// A rational quadratic (conic) segment.
///
/// A weight of 1 degenerates to an ordinary quadratic; a weight of √2/2
/// describes an exact elliptical quadrant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConicSegment {
    pub p0: Point,
    pub cp: Point,
    pub p2: Point,
    pub weight: f64,
}

impl ConicSegment {
    pub fn new(p0: Point, cp: Point, p2: Point, weight: f64) -> Self {
        Self { p0, cp, p2, weight }
    }

    /// Evaluate the curve at parameter `t`.
    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt;
        let b = 2.0 * mt * t * self.weight;
        let c = t * t;
        let d = a + b + c;
        Point::new(
            (a * self.p0.x + b * self.cp.x + c * self.p2.x) / d,
            (a * self.p0.y + b * self.cp.y + c * self.p2.y) / d,
        )
    }

    /// Split the conic at its parametric midpoint into two quadratics.
    ///
    /// Both halves share the rational midpoint; the control points are the
    /// weighted averages `(p + w·cp) / (1 + w)` of the halving formula.
    pub fn subdivide_to_quadratic_points(&self) -> [QuadSegment; 2] {
        let scale = 1.0 / (1.0 + self.weight);
        let q1 = Point::new(
            (self.p0.x + self.weight * self.cp.x) * scale,
            (self.p0.y + self.weight * self.cp.y) * scale,
        );
        let q3 = Point::new(
            (self.weight * self.cp.x + self.p2.x) * scale,
            (self.weight * self.cp.y + self.p2.y) * scale,
        );
        let mid = Point::new((q1.x + q3.x) * 0.5, (q1.y + q3.y) * 0.5);
        [
            QuadSegment::new(self.p0, q1, mid),
            QuadSegment::new(mid, q3, self.p2),
        ]
    }

    /// The real-valued segment count needed to flatten this curve.
    pub fn subdivisions(&self, scale: f64) -> f64 {
        wangs_formula::conic_subdivisions(scale, self.p0, self.cp, self.p2, self.weight)
    }

    /// Flatten the curve, feeding every point after `p0` to `f`.
    pub fn flatten_into(&self, scale: f64, f: &mut impl FnMut(Point)) {
        let count = self.subdivisions(scale).ceil().max(1.0) as usize;
        for i in 1..=count {
            f(self.eval(i as f64 / count as f64));
        }
    }
}

/// A cubic Bézier segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub p0: Point,
    pub cp1: Point,
    pub cp2: Point,
    pub p2: Point,
}

impl CubicSegment {
    pub fn new(p0: Point, cp1: Point, cp2: Point, p2: Point) -> Self {
        Self { p0, cp1, cp2, p2 }
    }

    /// Evaluate the curve at parameter `t`.
    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * self.p0.x + b * self.cp1.x + c * self.cp2.x + d * self.p2.x,
            a * self.p0.y + b * self.cp1.y + c * self.cp2.y + d * self.p2.y,
        )
    }

    /// The real-valued segment count needed to flatten this curve.
    pub fn subdivisions(&self, scale: f64) -> f64 {
        wangs_formula::cubic_subdivisions(scale, self.p0, self.cp1, self.cp2, self.p2)
    }

    /// Flatten the curve, feeding every point after `p0` to `f`.
    pub fn flatten_into(&self, scale: f64, f: &mut impl FnMut(Point)) {
        let count = self.subdivisions(scale).ceil().max(1.0) as usize;
        for i in 1..=count {
            f(self.eval(i as f64 / count as f64));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn quad_eval_endpoints() {
        let quad = QuadSegment::new(
            Point::new(0.0, 0.0),
            Point::new(50.0, 100.0),
            Point::new(100.0, 0.0),
        );
        assert_near(quad.eval(0.0), quad.p0);
        assert_near(quad.eval(1.0), quad.p2);
        assert_near(quad.eval(0.5), Point::new(50.0, 50.0));
    }

    #[test]
    fn conic_quadrant_passes_through_circle() {
        // A weight of √2/2 traces an exact circular quadrant.
        let conic = ConicSegment::new(
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
            std::f64::consts::FRAC_1_SQRT_2,
        );
        let mid = conic.eval(0.5);
        assert!((mid.to_vec2().hypot() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn conic_halves_meet_on_the_curve() {
        let conic = ConicSegment::new(
            Point::new(10.0, 0.0),
            Point::new(10.0, 8.0),
            Point::new(0.0, 8.0),
            std::f64::consts::FRAC_1_SQRT_2,
        );
        let [a, b] = conic.subdivide_to_quadratic_points();
        assert_near(a.p0, conic.p0);
        assert_near(b.p2, conic.p2);
        assert_near(a.p2, b.p0);
        assert_near(a.p2, conic.eval(0.5));
    }

    #[test]
    fn flatten_emits_requested_count() {
        let quad = QuadSegment::new(
            Point::new(0.0, 0.0),
            Point::new(50.0, 40.0),
            Point::new(100.0, 0.0),
        );
        let expected = quad.subdivisions(1.0).ceil().max(1.0) as usize;
        let mut seen = Vec::new();
        quad.flatten_into(1.0, &mut |p| seen.push(p));
        assert_eq!(seen.len(), expected);
        assert_near(*seen.last().unwrap(), quad.p2);
    }
}

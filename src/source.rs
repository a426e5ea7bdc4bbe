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

//! The producer/consumer protocol connecting shapes to tessellation.
//!
//! A [`PathSource`] describes one shape abstractly and can dispatch itself to
//! any [`PathReceiver`], which consumes the individual drawing commands. New
//! shape types implement `PathSource`; new consumers (filling, stroking,
//! shadow meshing) implement `PathReceiver` — neither side needs to know the
//! other's concrete type.

use kurbo::{Point, Rect};

use crate::path::FillType;
use crate::round_rect::RoundRect;
use crate::round_superellipse::RoundSuperellipse;
use crate::segment::ConicSegment;

/// An abstract description of exactly one shape.
pub trait PathSource {
    /// The fill rule for the shape.
    fn fill_type(&self) -> FillType;

    /// The bounding box of the shape.
    fn bounds(&self) -> Rect;

    /// Whether the shape is known to be convex.
    fn is_convex(&self) -> bool;

    /// Deliver the shape's drawing commands to `receiver`, ending with
    /// exactly one [`PathReceiver::path_end`] call.
    fn dispatch(&self, receiver: &mut dyn PathReceiver);
}

/// A consumer of path drawing commands.
pub trait PathReceiver {
    /// Begin a new contour at `p`. `will_be_closed` reports whether the
    /// contour will end with an explicit close.
    fn move_to(&mut self, p: Point, will_be_closed: bool);

    /// A straight line to `p`.
    fn line_to(&mut self, p: Point);

    /// A quadratic Bézier through `cp` to `p2`.
    fn quad_to(&mut self, cp: Point, p2: Point);

    /// A rational quadratic through `cp` to `p2`.
    ///
    /// Returns `false` if this receiver does not understand rational
    /// quadratics, in which case the dispatcher re-issues the segment as an
    /// equivalent quadratic, line, or pair of quadratics.
    fn conic_to(&mut self, cp: Point, p2: Point, weight: f64) -> bool;

    /// A cubic Bézier through `cp1` and `cp2` to `p2`.
    fn cubic_to(&mut self, cp1: Point, cp2: Point, p2: Point);

    /// Close the current contour.
    fn close(&mut self);

    /// The terminal signal after the last command of the path.
    fn path_end(&mut self);
}

/// Weight of a conic describing an exact circular or elliptical quadrant.
pub(crate) const QUADRANT_WEIGHT: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Deliver a conic to `receiver`, lowering it if the receiver refuses.
///
/// `p0` is the current point. A weight of 1 lowers to a quadratic; a
/// non-positive or NaN weight, or a control point coincident with an
/// endpoint, lowers to a line; anything else becomes the two quadratics of
/// the rational halving.
pub(crate) fn emit_conic(
    receiver: &mut dyn PathReceiver,
    p0: Point,
    cp: Point,
    p2: Point,
    weight: f64,
) {
    if receiver.conic_to(cp, p2, weight) {
        return;
    }
    if !(weight > 0.0) {
        // NaN and non-positive weights degrade to a line.
        receiver.line_to(p2);
        return;
    }
    if weight == 1.0 {
        receiver.quad_to(cp, p2);
        return;
    }
    if cp == p0 || cp == p2 {
        receiver.line_to(p2);
        return;
    }
    let [a, b] = ConicSegment::new(p0, cp, p2, weight).subdivide_to_quadratic_points();
    receiver.quad_to(a.cp, a.p2);
    receiver.quad_to(b.cp, b.p2);
}

/// A rectangle as a path: four lines and a close.
#[derive(Debug, Clone, Copy)]
pub struct RectSource {
    rect: Rect,
}

impl RectSource {
    pub fn new(rect: Rect) -> Self {
        Self { rect }
    }
}

impl PathSource for RectSource {
    fn fill_type(&self) -> FillType {
        FillType::NonZero
    }

    fn bounds(&self) -> Rect {
        self.rect
    }

    fn is_convex(&self) -> bool {
        true
    }

    fn dispatch(&self, receiver: &mut dyn PathReceiver) {
        let Rect { x0, y0, x1, y1 } = self.rect;
        receiver.move_to(Point::new(x0, y0), true);
        receiver.line_to(Point::new(x1, y0));
        receiver.line_to(Point::new(x1, y1));
        receiver.line_to(Point::new(x0, y1));
        receiver.line_to(Point::new(x0, y0));
        receiver.close();
        receiver.path_end();
    }
}

/// An axis-aligned ellipse as four conic quadrants.
#[derive(Debug, Clone, Copy)]
pub struct EllipseSource {
    bounds: Rect,
}

impl EllipseSource {
    pub fn new(bounds: Rect) -> Self {
        Self { bounds }
    }
}

impl PathSource for EllipseSource {
    fn fill_type(&self) -> FillType {
        FillType::NonZero
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn is_convex(&self) -> bool {
        true
    }

    fn dispatch(&self, receiver: &mut dyn PathReceiver) {
        let Rect { x0, y0, x1, y1 } = self.bounds;
        let center = self.bounds.center();
        let (cx, cy) = (center.x, center.y);

        // Start at the right edge midpoint and walk the quadrants clockwise
        // in y-down coordinates. Each quadrant is exact at weight √2/2.
        let start = Point::new(x1, cy);
        receiver.move_to(start, true);
        let mut current = start;
        let quadrants = [
            (Point::new(x1, y1), Point::new(cx, y1)),
            (Point::new(x0, y1), Point::new(x0, cy)),
            (Point::new(x0, y0), Point::new(cx, y0)),
            (Point::new(x1, y0), Point::new(x1, cy)),
        ];
        for (cp, p2) in quadrants {
            emit_conic(receiver, current, cp, p2, QUADRANT_WEIGHT);
            current = p2;
        }
        receiver.close();
        receiver.path_end();
    }
}

/// A rounded rectangle: straight edges joined by conic corners.
#[derive(Debug, Clone, Copy)]
pub struct RoundRectSource {
    round_rect: RoundRect,
}

impl RoundRectSource {
    pub fn new(round_rect: RoundRect) -> Self {
        Self { round_rect }
    }
}

impl PathSource for RoundRectSource {
    fn fill_type(&self) -> FillType {
        FillType::NonZero
    }

    fn bounds(&self) -> Rect {
        self.round_rect.bounds()
    }

    fn is_convex(&self) -> bool {
        true
    }

    fn dispatch(&self, receiver: &mut dyn PathReceiver) {
        let rect = self.round_rect.bounds();
        let radii = self.round_rect.radii();
        let Rect { x0, y0, x1, y1 } = rect;

        let start = Point::new(x0 + radii.top_left.width, y0);
        receiver.move_to(start, true);
        let mut current = start;

        // Clockwise in y-down coordinates; zero corners skip their conic.
        let corner = |receiver: &mut dyn PathReceiver,
                          current: &mut Point,
                          edge_end: Point,
                          cp: Point,
                          corner_end: Point| {
            if edge_end != *current {
                receiver.line_to(edge_end);
                *current = edge_end;
            }
            if corner_end != *current {
                emit_conic(receiver, *current, cp, corner_end, QUADRANT_WEIGHT);
                *current = corner_end;
            }
        };

        corner(
            receiver,
            &mut current,
            Point::new(x1 - radii.top_right.width, y0),
            Point::new(x1, y0),
            Point::new(x1, y0 + radii.top_right.height),
        );
        corner(
            receiver,
            &mut current,
            Point::new(x1, y1 - radii.bottom_right.height),
            Point::new(x1, y1),
            Point::new(x1 - radii.bottom_right.width, y1),
        );
        corner(
            receiver,
            &mut current,
            Point::new(x0 + radii.bottom_left.width, y1),
            Point::new(x0, y1),
            Point::new(x0, y1 - radii.bottom_left.height),
        );
        corner(
            receiver,
            &mut current,
            Point::new(x0, y0 + radii.top_left.height),
            Point::new(x0, y0),
            start,
        );
        receiver.close();
        receiver.path_end();
    }
}

/// A rounded superellipse: straight edges joined by octant-decomposed
/// superellipse and circular-arc corners.
#[derive(Debug, Clone)]
pub struct RoundSuperellipseSource {
    shape: RoundSuperellipse,

    /// The corner decomposition, computed once per shape.
    param: crate::round_superellipse::RoundSuperellipseParam,
}

impl RoundSuperellipseSource {
    pub fn new(shape: RoundSuperellipse) -> Self {
        let param = shape.param();
        Self { shape, param }
    }
}

impl PathSource for RoundSuperellipseSource {
    fn fill_type(&self) -> FillType {
        FillType::NonZero
    }

    fn bounds(&self) -> Rect {
        self.shape.bounds()
    }

    fn is_convex(&self) -> bool {
        true
    }

    fn dispatch(&self, receiver: &mut dyn PathReceiver) {
        self.param.dispatch(receiver);
    }
}

/// Any built-in shape as one value, without boxing.
///
/// Exactly one variant lives at a time; use this to store heterogeneous
/// shapes where a `dyn PathSource` would force an allocation.
#[derive(Debug, Clone)]
pub enum ShapeSource {
    Rect(RectSource),
    Ellipse(EllipseSource),
    RoundRect(RoundRectSource),
    RoundSuperellipse(RoundSuperellipseSource),
    Path(crate::path::Path),
}

impl ShapeSource {
    fn as_source(&self) -> &dyn PathSource {
        match self {
            ShapeSource::Rect(source) => source,
            ShapeSource::Ellipse(source) => source,
            ShapeSource::RoundRect(source) => source,
            ShapeSource::RoundSuperellipse(source) => source,
            ShapeSource::Path(path) => path,
        }
    }
}

impl PathSource for ShapeSource {
    fn fill_type(&self) -> FillType {
        self.as_source().fill_type()
    }

    fn bounds(&self) -> Rect {
        self.as_source().bounds()
    }

    fn is_convex(&self) -> bool {
        self.as_source().is_convex()
    }

    fn dispatch(&self, receiver: &mut dyn PathReceiver) {
        self.as_source().dispatch(receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::QuadSegment;

    /// Records events; optionally refuses conics.
    struct Recorder {
        events: Vec<String>,
        accept_conics: bool,
        quads: Vec<QuadSegment>,
        current: Point,
    }

    impl Recorder {
        fn new(accept_conics: bool) -> Self {
            Self {
                events: Vec::new(),
                accept_conics,
                quads: Vec::new(),
                current: Point::ZERO,
            }
        }
    }

    impl PathReceiver for Recorder {
        fn move_to(&mut self, p: Point, _will_be_closed: bool) {
            self.events.push(format!("M{:.0},{:.0}", p.x, p.y));
            self.current = p;
        }
        fn line_to(&mut self, p: Point) {
            self.events.push(format!("L{:.0},{:.0}", p.x, p.y));
            self.current = p;
        }
        fn quad_to(&mut self, cp: Point, p2: Point) {
            self.events.push("Q".into());
            self.quads.push(QuadSegment::new(self.current, cp, p2));
            self.current = p2;
        }
        fn conic_to(&mut self, _cp: Point, p2: Point, _weight: f64) -> bool {
            if self.accept_conics {
                self.events.push("K".into());
                self.current = p2;
            }
            self.accept_conics
        }
        fn cubic_to(&mut self, _cp1: Point, _cp2: Point, p2: Point) {
            self.events.push("C".into());
            self.current = p2;
        }
        fn close(&mut self) {
            self.events.push("Z".into());
        }
        fn path_end(&mut self) {
            self.events.push("E".into());
        }
    }

    #[test]
    fn rect_is_four_lines_and_close() {
        let mut rec = Recorder::new(true);
        RectSource::new(Rect::new(0.0, 0.0, 100.0, 80.0)).dispatch(&mut rec);
        assert_eq!(
            rec.events,
            vec!["M0,0", "L100,0", "L100,80", "L0,80", "L0,0", "Z", "E"],
        );
    }

    #[test]
    fn ellipse_is_four_conic_quadrants() {
        let mut rec = Recorder::new(true);
        EllipseSource::new(Rect::new(0.0, 0.0, 100.0, 80.0)).dispatch(&mut rec);
        assert_eq!(rec.events, vec!["M100,40", "K", "K", "K", "K", "Z", "E"]);
    }

    #[test]
    fn refused_conic_lowers_to_two_quadratics() {
        let mut rec = Recorder::new(false);
        EllipseSource::new(Rect::new(0.0, 0.0, 100.0, 80.0)).dispatch(&mut rec);
        let quads: usize = rec.events.iter().filter(|e| *e == "Q").count();
        assert_eq!(quads, 8);

        // Each lowered pair meets the true conic at its rational midpoint.
        let conic = ConicSegment::new(
            Point::new(100.0, 40.0),
            Point::new(100.0, 80.0),
            Point::new(50.0, 80.0),
            QUADRANT_WEIGHT,
        );
        let first = rec.quads[0];
        let mid = conic.eval(0.5);
        assert!((first.p2.x - mid.x).abs() < 1e-9);
        assert!((first.p2.y - mid.y).abs() < 1e-9);
    }

    #[test]
    fn conic_weight_laws() {
        // weight == 1 is observationally a quadratic.
        let mut rec = Recorder::new(false);
        rec.move_to(Point::new(0.0, 0.0), false);
        emit_conic(
            &mut rec,
            Point::new(0.0, 0.0),
            Point::new(5.0, 5.0),
            Point::new(10.0, 0.0),
            1.0,
        );
        assert_eq!(rec.events.last().unwrap(), "Q");

        // Non-positive or NaN weights are observationally lines.
        for weight in [0.0, -1.0, f64::NAN] {
            let mut rec = Recorder::new(false);
            rec.move_to(Point::new(0.0, 0.0), false);
            emit_conic(
                &mut rec,
                Point::new(0.0, 0.0),
                Point::new(5.0, 5.0),
                Point::new(10.0, 0.0),
                weight,
            );
            assert_eq!(rec.events.last().unwrap(), "L10,0");
        }

        // A control point on an endpoint is observationally a line.
        let mut rec = Recorder::new(false);
        rec.move_to(Point::new(0.0, 0.0), false);
        emit_conic(
            &mut rec,
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 0.0),
            0.5,
        );
        assert_eq!(rec.events.last().unwrap(), "L10,0");
    }

    #[test]
    fn shape_source_delegates_to_its_variant() {
        let shapes = [
            ShapeSource::Rect(RectSource::new(Rect::new(0.0, 0.0, 10.0, 10.0))),
            ShapeSource::Ellipse(EllipseSource::new(Rect::new(0.0, 0.0, 10.0, 10.0))),
        ];
        for shape in &shapes {
            assert!(shape.is_convex());
            assert_eq!(shape.bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
            let mut rec = Recorder::new(true);
            shape.dispatch(&mut rec);
            assert_eq!(rec.events.last().unwrap(), "E");
        }
    }

    #[test]
    fn zero_radius_round_rect_matches_rect_corners() {
        use crate::round_rect::{RoundRect, RoundingRadii};
        let rr = RoundRect::from_rect_radii(
            Rect::new(0.0, 0.0, 100.0, 80.0),
            RoundingRadii::default(),
        );
        let mut rec = Recorder::new(true);
        RoundRectSource::new(rr).dispatch(&mut rec);
        // With all radii zero the shape degenerates to the rectangle.
        assert_eq!(
            rec.events,
            vec!["M0,0", "L100,0", "L100,80", "L0,80", "L0,0", "Z", "E"],
        );
    }
}

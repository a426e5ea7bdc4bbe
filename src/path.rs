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

//! Verb-and-point path storage and the builder that produces it.

use kurbo::{Point, Rect};

use crate::source::{emit_conic, PathReceiver, PathSource};

/// The rule deciding which regions of a path are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillType {
    /// Fill where the winding number is non-zero.
    #[default]
    NonZero,

    /// Fill where the crossing count is odd.
    Odd,
}

/// One drawing command stored in a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    MoveTo,
    LineTo,
    QuadTo,
    ConicTo,
    CubicTo,
    Close,
}

/// An immutable vector path.
///
/// Produced by [`PathBuilder`]; replayed through [`PathSource::dispatch`].
#[derive(Debug, Clone, Default)]
pub struct Path {
    /// The drawing commands, in order.
    verbs: Vec<Verb>,

    /// The points consumed by the commands.
    points: Vec<Point>,

    /// One weight per `ConicTo` verb, in order.
    weights: Vec<f64>,

    /// Whether each contour ends in an explicit close, in order.
    contour_closed: Vec<bool>,

    /// The fill rule for this path.
    fill_type: FillType,

    /// The bounding box of all stored points.
    bounds: Rect,

    /// Whether the path is known to describe a single convex contour.
    convex: bool,
}

impl Path {
    /// The fill rule for this path.
    pub fn fill_type(&self) -> FillType {
        self.fill_type
    }

    /// The bounding box of the path's points.
    ///
    /// Control points are included, so this is conservative for curves.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Whether the path contains no commands at all.
    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    /// Whether the path is known to describe a single convex contour.
    ///
    /// This is a cached hint set when the path was built from one convex
    /// shape; manually built paths report `false` even if they happen to be
    /// convex.
    pub fn is_convex(&self) -> bool {
        self.convex
    }
}

impl PathSource for Path {
    fn fill_type(&self) -> FillType {
        self.fill_type
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn is_convex(&self) -> bool {
        self.convex
    }

    fn dispatch(&self, receiver: &mut dyn PathReceiver) {
        let mut points = self.points.iter().copied();
        let mut weights = self.weights.iter().copied();
        let mut closed = self.contour_closed.iter().copied();

        let mut current = Point::ZERO;

        for verb in &self.verbs {
            match verb {
                Verb::MoveTo => {
                    let p = points.next().expect("point stream out of sync");
                    receiver.move_to(p, closed.next().unwrap_or(false));
                    current = p;
                }
                Verb::LineTo => {
                    let p = points.next().expect("point stream out of sync");
                    receiver.line_to(p);
                    current = p;
                }
                Verb::QuadTo => {
                    let cp = points.next().expect("point stream out of sync");
                    let p2 = points.next().expect("point stream out of sync");
                    receiver.quad_to(cp, p2);
                    current = p2;
                }
                Verb::ConicTo => {
                    let cp = points.next().expect("point stream out of sync");
                    let p2 = points.next().expect("point stream out of sync");
                    let weight = weights.next().expect("weight stream out of sync");
                    emit_conic(receiver, current, cp, p2, weight);
                    current = p2;
                }
                Verb::CubicTo => {
                    let cp1 = points.next().expect("point stream out of sync");
                    let cp2 = points.next().expect("point stream out of sync");
                    let p2 = points.next().expect("point stream out of sync");
                    receiver.cubic_to(cp1, cp2, p2);
                    current = p2;
                }
                Verb::Close => {
                    receiver.close();
                }
            }
        }

        receiver.path_end();
    }
}

/// Builds a [`Path`] from a sequence of drawing commands.
///
/// The builder is also usable as a [`PathReceiver`], so path sources can be
/// recorded into it directly.
#[derive(Debug, Default)]
pub struct PathBuilder {
    verbs: Vec<Verb>,
    points: Vec<Point>,
    weights: Vec<f64>,
    fill_type: FillType,

    /// The index of the current contour's `MoveTo` verb, if a contour is open.
    contour_start: Option<usize>,

    /// Whether the path so far is a single contour added by a convex shape
    /// helper.
    convex: bool,
}

impl PathBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fill rule for the path being built.
    pub fn set_fill_type(&mut self, fill_type: FillType) -> &mut Self {
        self.fill_type = fill_type;
        self
    }

    /// Begin a new contour at `p`.
    pub fn move_to(&mut self, p: Point) -> &mut Self {
        self.contour_start = Some(self.verbs.len());
        self.verbs.push(Verb::MoveTo);
        self.points.push(p);
        self.convex = false;
        self
    }

    /// Add a line from the current point to `p`.
    pub fn line_to(&mut self, p: Point) -> &mut Self {
        self.ensure_contour();
        self.verbs.push(Verb::LineTo);
        self.points.push(p);
        self.convex = false;
        self
    }

    /// Add a quadratic Bézier through control point `cp` ending at `p2`.
    pub fn quad_to(&mut self, cp: Point, p2: Point) -> &mut Self {
        self.ensure_contour();
        self.verbs.push(Verb::QuadTo);
        self.points.push(cp);
        self.points.push(p2);
        self.convex = false;
        self
    }

    /// Add a rational quadratic through `cp` with the given `weight`.
    pub fn conic_to(&mut self, cp: Point, p2: Point, weight: f64) -> &mut Self {
        self.ensure_contour();
        self.verbs.push(Verb::ConicTo);
        self.points.push(cp);
        self.points.push(p2);
        self.weights.push(weight);
        self.convex = false;
        self
    }

    /// Add a cubic Bézier through `cp1` and `cp2` ending at `p2`.
    pub fn cubic_to(&mut self, cp1: Point, cp2: Point, p2: Point) -> &mut Self {
        self.ensure_contour();
        self.verbs.push(Verb::CubicTo);
        self.points.push(cp1);
        self.points.push(cp2);
        self.points.push(p2);
        self.convex = false;
        self
    }

    /// Close the current contour.
    pub fn close(&mut self) -> &mut Self {
        if self.contour_start.is_some() {
            self.verbs.push(Verb::Close);
            self.contour_start = None;
        }
        self
    }

    /// Record an entire shape into this builder.
    ///
    /// When the shape is convex and is the only content of the builder, the
    /// resulting path keeps the convexity hint.
    pub fn add_source(&mut self, source: &dyn PathSource) -> &mut Self {
        let was_empty = self.verbs.is_empty();
        let mut recorder = BuilderReceiver { builder: self };
        source.dispatch(&mut recorder);
        if was_empty && source.is_convex() {
            self.convex = true;
        }
        self
    }

    /// Take the finished path out of the builder, leaving the builder in its
    /// default state.
    pub fn take_path(&mut self) -> Path {
        let verbs = std::mem::take(&mut self.verbs);
        let points = std::mem::take(&mut self.points);
        let weights = std::mem::take(&mut self.weights);
        let fill_type = std::mem::take(&mut self.fill_type);
        let convex = std::mem::replace(&mut self.convex, false);
        self.contour_start = None;

        // Record which contours end in an explicit close.
        let mut contour_closed = Vec::new();
        let mut open = false;
        for verb in &verbs {
            match verb {
                Verb::MoveTo => {
                    contour_closed.push(false);
                    open = true;
                }
                Verb::Close => {
                    if open {
                        *contour_closed.last_mut().expect("contour under close") = true;
                        open = false;
                    }
                }
                _ => {}
            }
        }

        let bounds = if points.is_empty() {
            Rect::ZERO
        } else {
            let mut x0 = f64::INFINITY;
            let mut y0 = f64::INFINITY;
            let mut x1 = f64::NEG_INFINITY;
            let mut y1 = f64::NEG_INFINITY;
            for p in &points {
                x0 = x0.min(p.x);
                y0 = y0.min(p.y);
                x1 = x1.max(p.x);
                y1 = y1.max(p.y);
            }
            Rect::new(x0, y0, x1, y1)
        };

        Path {
            verbs,
            points,
            weights,
            contour_closed,
            fill_type,
            bounds,
            convex,
        }
    }

    /// Insert an implicit `MoveTo` at the origin if no contour is open.
    fn ensure_contour(&mut self) {
        if self.contour_start.is_none() {
            self.move_to(Point::ZERO);
        }
    }
}

/// Adapts a [`PathBuilder`] to the [`PathReceiver`] protocol.
struct BuilderReceiver<'a> {
    builder: &'a mut PathBuilder,
}

impl PathReceiver for BuilderReceiver<'_> {
    fn move_to(&mut self, p: Point, _will_be_closed: bool) {
        self.builder.move_to(p);
    }

    fn line_to(&mut self, p: Point) {
        self.builder.line_to(p);
    }

    fn quad_to(&mut self, cp: Point, p2: Point) {
        self.builder.quad_to(cp, p2);
    }

    fn conic_to(&mut self, cp: Point, p2: Point, weight: f64) -> bool {
        self.builder.conic_to(cp, p2, weight);
        true
    }

    fn cubic_to(&mut self, cp1: Point, cp2: Point, p2: Point) {
        self.builder.cubic_to(cp1, cp2, p2);
    }

    fn close(&mut self) {
        self.builder.close();
    }

    fn path_end(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RectSource;

    #[test]
    fn untouched_builder_takes_empty_path() {
        let mut builder = PathBuilder::new();
        let path = builder.take_path();
        assert!(path.is_empty());
        assert_eq!(path.bounds(), Rect::ZERO);
        assert_eq!(path.fill_type(), FillType::NonZero);
        assert!(!path.is_convex());
    }

    #[test]
    fn take_path_resets_builder() {
        let mut builder = PathBuilder::new();
        builder
            .set_fill_type(FillType::Odd)
            .move_to(Point::new(1.0, 2.0))
            .line_to(Point::new(3.0, 4.0))
            .close();
        let first = builder.take_path();
        assert!(!first.is_empty());
        assert_eq!(first.fill_type(), FillType::Odd);

        // The second take behaves exactly like a default-constructed builder.
        let second = builder.take_path();
        assert!(second.is_empty());
        assert_eq!(second.bounds(), Rect::ZERO);
        assert_eq!(second.fill_type(), FillType::NonZero);
    }

    #[test]
    fn bounds_cover_control_points() {
        let mut builder = PathBuilder::new();
        builder
            .move_to(Point::new(0.0, 0.0))
            .quad_to(Point::new(50.0, -20.0), Point::new(100.0, 0.0));
        let path = builder.take_path();
        assert_eq!(path.bounds(), Rect::new(0.0, -20.0, 100.0, 0.0));
    }

    #[test]
    fn shape_helper_keeps_convexity_hint() {
        let mut builder = PathBuilder::new();
        builder.add_source(&RectSource::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let path = builder.take_path();
        assert!(path.is_convex());

        // A second contour drops the hint.
        let mut builder = PathBuilder::new();
        builder.add_source(&RectSource::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
        builder.move_to(Point::new(20.0, 20.0));
        builder.line_to(Point::new(30.0, 20.0));
        let path = builder.take_path();
        assert!(!path.is_convex());
    }

    #[test]
    fn close_without_contour_is_a_no_op() {
        let mut builder = PathBuilder::new();
        builder.close();
        assert!(builder.take_path().is_empty());
    }

    #[test]
    fn dispatch_replays_verbs_in_order() {
        struct Log(Vec<String>);
        impl PathReceiver for Log {
            fn move_to(&mut self, p: Point, will_be_closed: bool) {
                self.0.push(format!("M{},{},{}", p.x, p.y, will_be_closed));
            }
            fn line_to(&mut self, p: Point) {
                self.0.push(format!("L{},{}", p.x, p.y));
            }
            fn quad_to(&mut self, _cp: Point, p2: Point) {
                self.0.push(format!("Q{},{}", p2.x, p2.y));
            }
            fn conic_to(&mut self, _cp: Point, p2: Point, w: f64) -> bool {
                self.0.push(format!("K{},{},{}", p2.x, p2.y, w));
                true
            }
            fn cubic_to(&mut self, _cp1: Point, _cp2: Point, p2: Point) {
                self.0.push(format!("C{},{}", p2.x, p2.y));
            }
            fn close(&mut self) {
                self.0.push("Z".into());
            }
            fn path_end(&mut self) {
                self.0.push("E".into());
            }
        }

        let mut builder = PathBuilder::new();
        builder
            .move_to(Point::new(0.0, 0.0))
            .line_to(Point::new(10.0, 0.0))
            .conic_to(Point::new(10.0, 10.0), Point::new(0.0, 10.0), 0.5)
            .close();
        let path = builder.take_path();

        let mut log = Log(Vec::new());
        path.dispatch(&mut log);
        assert_eq!(
            log.0,
            vec!["M0,0,true", "L10,0", "K0,10,0.5", "Z", "E"],
        );
    }
}

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

//! Degeneracy normalization between a path source and a segment consumer.
//!
//! [`PathPruner`] sits between a [`PathSource`] and a [`SegmentReceiver`]. It
//! collapses duplicate points, degrades degenerate curves to simpler
//! segments, guarantees closed contours for fills, and synthesizes the
//! zero-length cap line stroking needs for point contours. Segments arriving
//! at the receiver are guaranteed non-degenerate, with that one stroking
//! exception.
//!
//! [`PathSource`]: crate::source::PathSource

use kurbo::Point;

use crate::segment::{ConicSegment, CubicSegment, LineSegment, QuadSegment};
use crate::source::PathReceiver;

/// A consumer of pruned, contour-delimited segments.
pub trait SegmentReceiver {
    /// A contour begins at `origin`. Only emitted for contours that record at
    /// least one segment.
    fn begin_contour(&mut self, origin: Point, will_be_closed: bool);

    /// A non-degenerate line segment.
    fn record_line(&mut self, line: LineSegment);

    /// A non-degenerate quadratic segment.
    fn record_quad(&mut self, quad: QuadSegment);

    /// A non-degenerate conic segment with a positive, finite weight not
    /// equal to one.
    fn record_conic(&mut self, conic: ConicSegment);

    /// A non-degenerate cubic segment.
    fn record_cubic(&mut self, cubic: CubicSegment);

    /// The contour is finished. `with_close` is true iff it ended with an
    /// explicit close rather than a following move or the end of the path.
    fn end_contour(&mut self, origin: Point, with_close: bool);
}

/// Whether pruning targets a fill or a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneMode {
    /// Contours are implicitly closed; purely degenerate contours vanish.
    Fill,

    /// Contours are left open; a point contour becomes a zero-length line so
    /// the stroker can draw cap geometry there.
    Stroke,
}

/// The normalizing [`PathReceiver`] in front of a [`SegmentReceiver`].
pub struct PathPruner<'a, R: SegmentReceiver + ?Sized> {
    out: &'a mut R,
    mode: PruneMode,

    /// Origin of the contour currently being recorded.
    origin: Point,

    /// The last point delivered downstream.
    current: Point,

    /// A `move_to` has been seen and the contour is collecting input.
    contour_open: bool,

    /// `begin_contour` has been emitted for the current contour.
    contour_started: bool,

    /// The contour was reopened by a close; it gets no cap if it stays empty.
    reopened: bool,

    /// The `will_be_closed` flag the contour was opened with.
    will_be_closed: bool,
}

impl<'a, R: SegmentReceiver + ?Sized> PathPruner<'a, R> {
    /// Create a pruner feeding `out`.
    pub fn new(out: &'a mut R, mode: PruneMode) -> Self {
        Self {
            out,
            mode,
            origin: Point::ZERO,
            current: Point::ZERO,
            contour_open: false,
            contour_started: false,
            reopened: false,
            will_be_closed: false,
        }
    }

    /// Emit the lazy `begin_contour` once a real segment arrives.
    fn ensure_begin(&mut self) {
        if !self.contour_started {
            let closed = self.mode == PruneMode::Fill || self.will_be_closed;
            self.out.begin_contour(self.origin, closed);
            self.contour_started = true;
        }
    }

    /// Finish the current contour, if any.
    fn finish_contour(&mut self, with_close: bool) {
        if self.contour_started {
            if self.mode == PruneMode::Fill && self.current != self.origin {
                // Fills are implicitly closed.
                self.out
                    .record_line(LineSegment::new(self.current, self.origin));
                self.current = self.origin;
            }
            self.out.end_contour(self.origin, with_close);
        } else if self.contour_open && !self.reopened && self.mode == PruneMode::Stroke {
            // A point contour still draws its cap box.
            self.out.begin_contour(self.origin, self.will_be_closed);
            self.out
                .record_line(LineSegment::new(self.origin, self.origin));
            self.out.end_contour(self.origin, with_close);
        }
        self.contour_open = false;
        self.contour_started = false;
        self.reopened = false;
    }
}

impl<R: SegmentReceiver + ?Sized> PathReceiver for PathPruner<'_, R> {
    fn move_to(&mut self, p: Point, will_be_closed: bool) {
        self.finish_contour(false);
        self.origin = p;
        self.current = p;
        self.contour_open = true;
        self.reopened = false;
        self.will_be_closed = will_be_closed;
    }

    fn line_to(&mut self, p: Point) {
        if !self.contour_open {
            self.move_to(p, false);
            return;
        }
        if p == self.current {
            return;
        }
        self.ensure_begin();
        self.out.record_line(LineSegment::new(self.current, p));
        self.current = p;
    }

    fn quad_to(&mut self, cp: Point, p2: Point) {
        if cp == self.current || cp == p2 {
            self.line_to(p2);
            return;
        }
        if !self.contour_open {
            self.move_to(Point::ZERO, false);
        }
        self.ensure_begin();
        self.out
            .record_quad(QuadSegment::new(self.current, cp, p2));
        self.current = p2;
    }

    fn conic_to(&mut self, cp: Point, p2: Point, weight: f64) -> bool {
        if !(weight > 0.0) {
            // NaN and non-positive weights degrade to a line.
            self.line_to(p2);
        } else if weight == 1.0 {
            self.quad_to(cp, p2);
        } else if cp == self.current || cp == p2 {
            self.line_to(p2);
        } else {
            if !self.contour_open {
                self.move_to(Point::ZERO, false);
            }
            self.ensure_begin();
            self.out
                .record_conic(ConicSegment::new(self.current, cp, p2, weight));
            self.current = p2;
        }
        true
    }

    fn cubic_to(&mut self, cp1: Point, cp2: Point, p2: Point) {
        if cp1 == self.current {
            if cp2 == p2 || cp2 == self.current {
                self.line_to(p2);
            } else {
                self.quad_to(cp2, p2);
            }
            return;
        }
        if cp2 == p2 {
            self.quad_to(cp1, p2);
            return;
        }
        if !self.contour_open {
            self.move_to(Point::ZERO, false);
        }
        self.ensure_begin();
        self.out
            .record_cubic(CubicSegment::new(self.current, cp1, cp2, p2));
        self.current = p2;
    }

    fn close(&mut self) {
        if !self.contour_open {
            return;
        }
        let origin = self.origin;
        self.finish_contour(true);

        // A command after a close continues from the origin in a fresh
        // contour; that contour produces no cap if it stays empty.
        self.origin = origin;
        self.current = origin;
        self.contour_open = true;
        self.reopened = true;
        self.will_be_closed = false;
    }

    fn path_end(&mut self) {
        self.finish_contour(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<String>);

    impl SegmentReceiver for Log {
        fn begin_contour(&mut self, origin: Point, will_be_closed: bool) {
            self.0
                .push(format!("B{},{},{}", origin.x, origin.y, will_be_closed));
        }
        fn record_line(&mut self, line: LineSegment) {
            self.0.push(format!("L{},{}", line.p1.x, line.p1.y));
        }
        fn record_quad(&mut self, quad: QuadSegment) {
            self.0.push(format!("Q{},{}", quad.p2.x, quad.p2.y));
        }
        fn record_conic(&mut self, conic: ConicSegment) {
            self.0
                .push(format!("K{},{},{}", conic.p2.x, conic.p2.y, conic.weight));
        }
        fn record_cubic(&mut self, cubic: CubicSegment) {
            self.0.push(format!("C{},{}", cubic.p2.x, cubic.p2.y));
        }
        fn end_contour(&mut self, origin: Point, with_close: bool) {
            self.0
                .push(format!("E{},{},{}", origin.x, origin.y, with_close));
        }
    }

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn duplicate_points_collapse() {
        let mut log = Log::default();
        let mut pruner = PathPruner::new(&mut log, PruneMode::Fill);
        pruner.move_to(p(0.0, 0.0), false);
        pruner.line_to(p(0.0, 0.0));
        pruner.line_to(p(10.0, 0.0));
        pruner.line_to(p(10.0, 0.0));
        pruner.path_end();
        assert_eq!(log.0, vec!["B0,0,true", "L10,0", "L0,0", "E0,0,false"]);
    }

    #[test]
    fn fill_contours_are_implicitly_closed() {
        let mut log = Log::default();
        let mut pruner = PathPruner::new(&mut log, PruneMode::Fill);
        pruner.move_to(p(0.0, 0.0), false);
        pruner.line_to(p(10.0, 0.0));
        pruner.line_to(p(10.0, 10.0));
        pruner.path_end();
        // A synthetic line returns to the origin before the contour ends.
        assert_eq!(
            log.0,
            vec!["B0,0,true", "L10,0", "L10,10", "L0,0", "E0,0,false"]
        );
    }

    #[test]
    fn stroke_contours_stay_open() {
        let mut log = Log::default();
        let mut pruner = PathPruner::new(&mut log, PruneMode::Stroke);
        pruner.move_to(p(0.0, 0.0), false);
        pruner.line_to(p(10.0, 0.0));
        pruner.path_end();
        assert_eq!(log.0, vec!["B0,0,false", "L10,0", "E0,0,false"]);
    }

    #[test]
    fn stroked_point_contour_gets_a_cap_line() {
        let mut log = Log::default();
        let mut pruner = PathPruner::new(&mut log, PruneMode::Stroke);
        pruner.move_to(p(5.0, 6.0), false);
        pruner.close();
        pruner.path_end();
        assert_eq!(log.0, vec!["B5,6,false", "L5,6", "E5,6,true"]);
    }

    #[test]
    fn degenerate_fill_contour_vanishes() {
        let mut log = Log::default();
        let mut pruner = PathPruner::new(&mut log, PruneMode::Fill);
        pruner.move_to(p(5.0, 6.0), false);
        pruner.line_to(p(5.0, 6.0));
        pruner.close();
        pruner.path_end();
        assert!(log.0.is_empty());
    }

    #[test]
    fn explicit_close_sets_the_close_flag() {
        let mut log = Log::default();
        let mut pruner = PathPruner::new(&mut log, PruneMode::Fill);
        pruner.move_to(p(0.0, 0.0), true);
        pruner.line_to(p(10.0, 0.0));
        pruner.line_to(p(0.0, 10.0));
        pruner.close();
        pruner.path_end();
        assert_eq!(
            log.0,
            vec!["B0,0,true", "L10,0", "L0,10", "L0,0", "E0,0,true"]
        );
    }

    #[test]
    fn conic_degeneracies_follow_the_weight_laws() {
        let mut log = Log::default();
        let mut pruner = PathPruner::new(&mut log, PruneMode::Fill);
        pruner.move_to(p(0.0, 0.0), false);
        // Weight 1 becomes a quadratic.
        pruner.conic_to(p(5.0, 5.0), p(10.0, 0.0), 1.0);
        // Non-positive weight becomes a line.
        pruner.conic_to(p(15.0, 5.0), p(20.0, 0.0), 0.0);
        // NaN weight becomes a line.
        pruner.conic_to(p(25.0, 5.0), p(30.0, 0.0), f64::NAN);
        // Control point on an endpoint becomes a line.
        pruner.conic_to(p(30.0, 0.0), p(40.0, 0.0), 0.5);
        // A genuine conic survives.
        pruner.conic_to(p(45.0, 5.0), p(50.0, 0.0), 0.5);
        pruner.path_end();
        assert_eq!(
            log.0,
            vec![
                "B0,0,true",
                "Q10,0",
                "L20,0",
                "L30,0",
                "L40,0",
                "K50,0,0.5",
                "L0,0",
                "E0,0,false"
            ]
        );
    }

    #[test]
    fn cubic_degeneracies_degrade_to_simpler_segments() {
        let mut log = Log::default();
        let mut pruner = PathPruner::new(&mut log, PruneMode::Stroke);
        pruner.move_to(p(0.0, 0.0), false);
        // Both control points degenerate: line.
        pruner.cubic_to(p(0.0, 0.0), p(10.0, 0.0), p(10.0, 0.0));
        // First control point on the start: quadratic.
        pruner.cubic_to(p(10.0, 0.0), p(15.0, 5.0), p(20.0, 0.0));
        // Second control point on the end: quadratic.
        pruner.cubic_to(p(25.0, 5.0), p(30.0, 0.0), p(30.0, 0.0));
        // A genuine cubic survives.
        pruner.cubic_to(p(35.0, 5.0), p(45.0, -5.0), p(50.0, 0.0));
        pruner.path_end();
        assert_eq!(
            log.0,
            vec![
                "B0,0,false",
                "L10,0",
                "Q20,0",
                "Q30,0",
                "C50,0",
                "E0,0,false"
            ]
        );
    }

    #[test]
    fn contour_reopened_by_close_gets_no_cap() {
        let mut log = Log::default();
        let mut pruner = PathPruner::new(&mut log, PruneMode::Stroke);
        pruner.move_to(p(0.0, 0.0), false);
        pruner.line_to(p(10.0, 0.0));
        pruner.close();
        pruner.path_end();
        assert_eq!(log.0, vec!["B0,0,false", "L10,0", "E0,0,true"]);
    }
}

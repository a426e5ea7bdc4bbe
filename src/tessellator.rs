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

//! Path tessellation entry points and the shared trig-table service.
//!
//! Everything here is a pure computation: a source with zero contours yields
//! zero points, never an error. The counting pass and the flattening pass
//! call the same subdivision formulas, so a count-then-fill caller can
//! preallocate exactly.

use std::sync::{Arc, OnceLock};

use ahash::RandomState;
use hashbrown::HashMap;
use kurbo::{Affine, Point};

use crate::pruner::{PathPruner, PruneMode, SegmentReceiver};
use crate::segment::{ConicSegment, CubicSegment, LineSegment, QuadSegment};
use crate::source::{PathReceiver, PathSource};

/// A consumer of flattened vertices.
pub trait VertexWriter {
    /// One flattened point.
    fn write(&mut self, point: Point);

    /// The current contour is finished.
    fn end_contour(&mut self);
}

/// Maximum deviation of a polygonal arc from the true circle, in device
/// pixels. The division table is generated from this tolerance.
const ARC_TOLERANCE: f64 = 0.1;

/// Precomputed radius range of the quadrant-division table.
const DIVISION_TABLE_SIZE: usize = 1024;

fn divisions_for_radius(radius: f64) -> usize {
    if !(radius > ARC_TOLERANCE) {
        return 1;
    }
    // N = ceil((π/4) / acos(1 - tolerance / radius))
    let x = (1.0 - ARC_TOLERANCE / radius).max(-1.0);
    (std::f64::consts::FRAC_PI_4 / x.acos()).ceil().max(1.0) as usize
}

/// The number of angular divisions a quarter turn needs at the given device
/// radius to stay within [`ARC_TOLERANCE`] of a true arc.
pub(crate) fn quadrant_divisions(radius: f64) -> usize {
    if !(radius > 0.0) {
        return 1;
    }
    let index = radius.ceil();
    if (index as usize) < DIVISION_TABLE_SIZE {
        static TABLE: OnceLock<Vec<u16>> = OnceLock::new();
        let table = TABLE.get_or_init(|| {
            (0..DIVISION_TABLE_SIZE)
                .map(|r| divisions_for_radius(r as f64) as u16)
                .collect()
        });
        table[index as usize] as usize
    } else {
        divisions_for_radius(radius)
    }
}

/// One entry of a precomputed quadrant angle table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trig {
    pub cos_angle: f64,
    pub sin_angle: f64,
}

/// Owns the per-division trig tables shared by consumers that round corners.
///
/// Tables are cached per division count; a table for `n` divisions holds
/// `n + 1` entries covering a quarter turn inclusively.
#[derive(Debug, Default)]
pub struct Tessellator {
    trig_cache: HashMap<usize, Arc<[Trig]>, RandomState>,
}

impl Tessellator {
    /// Create a tessellator with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The trig table for an explicit division count.
    pub fn trigs_for_divisions(&mut self, divisions: usize) -> Arc<[Trig]> {
        let divisions = divisions.max(1);
        self.trig_cache
            .entry(divisions)
            .or_insert_with(|| {
                let step = std::f64::consts::FRAC_PI_2 / divisions as f64;
                (0..=divisions)
                    .map(|i| {
                        let angle = step * i as f64;
                        Trig {
                            cos_angle: angle.cos(),
                            sin_angle: angle.sin(),
                        }
                    })
                    .collect()
            })
            .clone()
    }

    /// The trig table appropriate for arcs of the given device-pixel radius.
    pub fn trigs_for_device_radius(&mut self, radius: f64) -> Arc<[Trig]> {
        self.trigs_for_divisions(quadrant_divisions(radius))
    }
}

/// The larger of the transform's two basis vector lengths, i.e. the scale
/// factor the subdivision formulas expect.
pub fn max_basis_length(matrix: Affine) -> f64 {
    let [a, b, c, d, _, _] = matrix.as_coeffs();
    a.hypot(b).max(c.hypot(d))
}

/// Deliver a source's pruned fill segments, unflattened, to `receiver`.
pub fn path_to_filled_segments(source: &dyn PathSource, receiver: &mut dyn SegmentReceiver) {
    let mut pruner = PathPruner::new(receiver, PruneMode::Fill);
    source.dispatch(&mut pruner);
}

/// Deliver a source's pruned stroke segments, unflattened, to `receiver`.
pub fn path_to_stroked_segments(source: &dyn PathSource, receiver: &mut dyn SegmentReceiver) {
    let mut pruner = PathPruner::new(receiver, PruneMode::Stroke);
    source.dispatch(&mut pruner);
}

/// Count the storage a fill tessellation of `source` needs at `scale`:
/// `(point_count, contour_count)`.
pub fn count_fill_storage(source: &dyn PathSource, scale: f64) -> (usize, usize) {
    let mut counter = CountingReceiver {
        scale,
        points: 0,
        contours: 0,
    };
    path_to_filled_segments(source, &mut counter);
    (counter.points, counter.contours)
}

/// Flatten a source's fill into `writer` at the given device scale.
pub fn path_to_filled_vertices(source: &dyn PathSource, writer: &mut dyn VertexWriter, scale: f64) {
    let mut flattener = FlatteningReceiver { writer, scale };
    let mut pruner = PathPruner::new(&mut flattener, PruneMode::Fill);
    source.dispatch(&mut pruner);
}

/// Flatten a source's fill into `writer`, transforming every command by
/// `matrix` first so flattening happens in device space.
pub fn path_to_transformed_filled_vertices(
    source: &dyn PathSource,
    writer: &mut dyn VertexWriter,
    matrix: Affine,
) {
    let mut flattener = FlatteningReceiver { writer, scale: 1.0 };
    let mut pruner = PathPruner::new(&mut flattener, PruneMode::Fill);
    let mut transformer = TransformingReceiver {
        inner: &mut pruner,
        matrix,
    };
    source.dispatch(&mut transformer);
}

/// Tallies storage without writing anything.
struct CountingReceiver {
    scale: f64,
    points: usize,
    contours: usize,
}

impl CountingReceiver {
    fn curve_points(&self, subdivisions: f64) -> usize {
        subdivisions.ceil().max(1.0) as usize
    }
}

impl SegmentReceiver for CountingReceiver {
    fn begin_contour(&mut self, _origin: Point, _will_be_closed: bool) {
        self.contours += 1;
        self.points += 1;
    }

    fn record_line(&mut self, _line: LineSegment) {
        self.points += 1;
    }

    fn record_quad(&mut self, quad: QuadSegment) {
        self.points += self.curve_points(quad.subdivisions(self.scale));
    }

    fn record_conic(&mut self, conic: ConicSegment) {
        self.points += self.curve_points(conic.subdivisions(self.scale));
    }

    fn record_cubic(&mut self, cubic: CubicSegment) {
        self.points += self.curve_points(cubic.subdivisions(self.scale));
    }

    fn end_contour(&mut self, _origin: Point, _with_close: bool) {}
}

/// Flattens segments into a [`VertexWriter`].
struct FlatteningReceiver<'a> {
    writer: &'a mut dyn VertexWriter,
    scale: f64,
}

impl SegmentReceiver for FlatteningReceiver<'_> {
    fn begin_contour(&mut self, origin: Point, _will_be_closed: bool) {
        self.writer.write(origin);
    }

    fn record_line(&mut self, line: LineSegment) {
        self.writer.write(line.p1);
    }

    fn record_quad(&mut self, quad: QuadSegment) {
        quad.flatten_into(self.scale, &mut |p| self.writer.write(p));
    }

    fn record_conic(&mut self, conic: ConicSegment) {
        conic.flatten_into(self.scale, &mut |p| self.writer.write(p));
    }

    fn record_cubic(&mut self, cubic: CubicSegment) {
        cubic.flatten_into(self.scale, &mut |p| self.writer.write(p));
    }

    fn end_contour(&mut self, _origin: Point, _with_close: bool) {
        self.writer.end_contour();
    }
}

/// Applies an affine transform to every command before forwarding it.
struct TransformingReceiver<'a> {
    inner: &'a mut dyn PathReceiver,
    matrix: Affine,
}

impl PathReceiver for TransformingReceiver<'_> {
    fn move_to(&mut self, p: Point, will_be_closed: bool) {
        self.inner.move_to(self.matrix * p, will_be_closed);
    }

    fn line_to(&mut self, p: Point) {
        self.inner.line_to(self.matrix * p);
    }

    fn quad_to(&mut self, cp: Point, p2: Point) {
        self.inner.quad_to(self.matrix * cp, self.matrix * p2);
    }

    fn conic_to(&mut self, cp: Point, p2: Point, weight: f64) -> bool {
        // Conic weights are invariant under affine maps.
        self.inner.conic_to(self.matrix * cp, self.matrix * p2, weight)
    }

    fn cubic_to(&mut self, cp1: Point, cp2: Point, p2: Point) {
        self.inner
            .cubic_to(self.matrix * cp1, self.matrix * cp2, self.matrix * p2)
    }

    fn close(&mut self) {
        self.inner.close();
    }

    fn path_end(&mut self) {
        self.inner.path_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{EllipseSource, RectSource};
    use kurbo::Rect;

    #[derive(Default)]
    struct Collector {
        points: Vec<Point>,
        contours: usize,
    }

    impl VertexWriter for Collector {
        fn write(&mut self, point: Point) {
            self.points.push(point);
        }
        fn end_contour(&mut self) {
            self.contours += 1;
        }
    }

    #[test]
    fn rect_flattens_to_five_points() {
        let source = RectSource::new(Rect::new(10.0, 20.0, 110.0, 100.0));
        let mut out = Collector::default();
        path_to_filled_vertices(&source, &mut out, 1.0);
        assert_eq!(out.points.len(), 5);
        assert_eq!(out.contours, 1);
        // Four corners plus the close back to the origin.
        assert_eq!(out.points[0], out.points[4]);
    }

    #[test]
    fn count_pass_matches_flatten_pass() {
        let sources: [&dyn PathSource; 2] = [
            &RectSource::new(Rect::new(0.0, 0.0, 100.0, 80.0)),
            &EllipseSource::new(Rect::new(0.0, 0.0, 100.0, 80.0)),
        ];
        for source in sources {
            for scale in [0.5, 1.0, 2.0, 7.5] {
                let (points, contours) = count_fill_storage(source, scale);
                let mut out = Collector::default();
                path_to_filled_vertices(source, &mut out, scale);
                assert_eq!(points, out.points.len());
                assert_eq!(contours, out.contours);
            }
        }
    }

    #[test]
    fn transformed_flatten_matches_device_scale_density() {
        let source = EllipseSource::new(Rect::new(0.0, 0.0, 100.0, 80.0));

        let mut unit = Collector::default();
        path_to_filled_vertices(&source, &mut unit, 1.0);

        // Flattening through a 4x transform adds density.
        let mut scaled = Collector::default();
        path_to_transformed_filled_vertices(&source, &mut scaled, Affine::scale(4.0));
        assert!(scaled.points.len() > unit.points.len());

        // And matches the equivalent pre-scale flatten of the scaled shape.
        let big = EllipseSource::new(Rect::new(0.0, 0.0, 400.0, 320.0));
        let mut direct = Collector::default();
        path_to_filled_vertices(&big, &mut direct, 1.0);
        assert_eq!(scaled.points.len(), direct.points.len());
    }

    #[test]
    fn empty_source_yields_zero_points() {
        let path = crate::path::PathBuilder::new().take_path();
        let (points, contours) = count_fill_storage(&path, 1.0);
        assert_eq!((points, contours), (0, 0));
        let mut out = Collector::default();
        path_to_filled_vertices(&path, &mut out, 1.0);
        assert!(out.points.is_empty());
    }

    #[test]
    fn division_table_pins_radius_ten() {
        // The shadow-mesh vertex counts depend on this exact mapping.
        assert_eq!(quadrant_divisions(10.0), 6);
        assert_eq!(quadrant_divisions(0.0), 1);
        assert_eq!(quadrant_divisions(f64::NAN), 1);
        // Beyond the table the formula is evaluated directly; the two paths
        // agree at the boundary.
        assert_eq!(
            quadrant_divisions((DIVISION_TABLE_SIZE - 1) as f64),
            divisions_for_radius((DIVISION_TABLE_SIZE - 1) as f64),
        );
    }

    #[test]
    fn trig_tables_cover_a_quarter_turn() {
        let mut tess = Tessellator::new();
        let trigs = tess.trigs_for_device_radius(10.0);
        assert_eq!(trigs.len(), 7);
        assert!((trigs[0].cos_angle - 1.0).abs() < 1e-12);
        assert!((trigs[6].sin_angle - 1.0).abs() < 1e-12);
        // Cached: the same table is returned again.
        let again = tess.trigs_for_device_radius(10.0);
        assert!(Arc::ptr_eq(&trigs, &again));
    }

    #[test]
    fn max_basis_length_of_scales() {
        assert!((max_basis_length(Affine::IDENTITY) - 1.0).abs() < 1e-12);
        let m = Affine::new([2.0, 0.0, 0.0, 3.0, 5.0, 7.0]);
        assert!((max_basis_length(m) - 3.0).abs() < 1e-12);
    }
}

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

//! Rounded rectangles and the shared corner-radius invariant.

use kurbo::{Point, Rect, Size};

/// Per-corner radii of a rounded shape, each independently sized in both
/// dimensions.
///
/// Construction through [`RoundRect::from_rect_radii`] (or the superellipse
/// equivalent) enforces the invariant that paired radii along each edge never
/// sum to more than that edge's length: violating radii are scaled down
/// uniformly, preserving the ratio between corners, and degenerate corners
/// are normalized to exactly zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RoundingRadii {
    pub top_left: Size,
    pub top_right: Size,
    pub bottom_left: Size,
    pub bottom_right: Size,
}

impl RoundingRadii {
    /// The same radius on every corner.
    pub fn uniform(radius: f64) -> Self {
        let size = Size::new(radius, radius);
        Self {
            top_left: size,
            top_right: size,
            bottom_left: size,
            bottom_right: size,
        }
    }

    /// Whether every corner is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.top_left == Size::ZERO
            && self.top_right == Size::ZERO
            && self.bottom_left == Size::ZERO
            && self.bottom_right == Size::ZERO
    }

    /// Normalize the radii against the given bounds.
    pub(crate) fn normalized(mut self, bounds: Rect) -> Self {
        // Degenerate corners drop to exactly zero first.
        for corner in [
            &mut self.top_left,
            &mut self.top_right,
            &mut self.bottom_left,
            &mut self.bottom_right,
        ] {
            if !(corner.width > 0.0) || !(corner.height > 0.0) {
                *corner = Size::ZERO;
            }
        }

        let width = bounds.width();
        let height = bounds.height();
        if !(width > 0.0) || !(height > 0.0) {
            return Self::default();
        }

        // One uniform scale for all four corners, never per-corner clipping.
        let mut scale = 1.0f64;
        for (extent, sum) in [
            (width, self.top_left.width + self.top_right.width),
            (width, self.bottom_left.width + self.bottom_right.width),
            (height, self.top_left.height + self.bottom_left.height),
            (height, self.top_right.height + self.bottom_right.height),
        ] {
            if sum > extent {
                scale = scale.min(extent / sum);
            }
        }
        if scale < 1.0 {
            for corner in [
                &mut self.top_left,
                &mut self.top_right,
                &mut self.bottom_left,
                &mut self.bottom_right,
            ] {
                *corner = Size::new(corner.width * scale, corner.height * scale);
            }
        }
        self
    }
}

/// A rectangle with independently rounded corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundRect {
    bounds: Rect,
    radii: RoundingRadii,
}

impl RoundRect {
    /// Build a round rect, normalizing the radii against the bounds.
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

    /// Whether `point` lies inside the shape.
    ///
    /// The point's quadrant decides which corner (if any) needs an elliptical
    /// check; the rest of the shape is a plain rectangle test.
    pub fn contains(&self, point: Point) -> bool {
        let Rect { x0, y0, x1, y1 } = self.bounds;
        if point.x < x0 || point.x > x1 || point.y < y0 || point.y > y1 {
            return false;
        }

        let corner_test = |corner: Size, cx: f64, cy: f64| {
            let dx = (point.x - cx) / corner.width;
            let dy = (point.y - cy) / corner.height;
            dx * dx + dy * dy <= 1.0
        };

        let tl = self.radii.top_left;
        if point.x < x0 + tl.width && point.y < y0 + tl.height {
            return corner_test(tl, x0 + tl.width, y0 + tl.height);
        }
        let tr = self.radii.top_right;
        if point.x > x1 - tr.width && point.y < y0 + tr.height {
            return corner_test(tr, x1 - tr.width, y0 + tr.height);
        }
        let bl = self.radii.bottom_left;
        if point.x < x0 + bl.width && point.y > y1 - bl.height {
            return corner_test(bl, x0 + bl.width, y1 - bl.height);
        }
        let br = self.radii.bottom_right;
        if point.x > x1 - br.width && point.y > y1 - br.height {
            return corner_test(br, x1 - br.width, y1 - br.height);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_radii_scale_uniformly() {
        // Paired widths sum to 150 over a 100-wide rect.
        let radii = RoundingRadii {
            top_left: Size::new(100.0, 20.0),
            top_right: Size::new(50.0, 20.0),
            bottom_left: Size::new(10.0, 20.0),
            bottom_right: Size::new(10.0, 20.0),
        };
        let rr = RoundRect::from_rect_radii(Rect::new(0.0, 0.0, 100.0, 80.0), radii);
        let out = rr.radii();

        // Paired sums now fit every edge.
        assert!(out.top_left.width + out.top_right.width <= 100.0 + 1e-9);
        assert!(out.top_left.height + out.bottom_left.height <= 80.0 + 1e-9);

        // The ratio between corners is preserved: one uniform factor.
        let scale = out.top_left.width / 100.0;
        assert!((out.top_right.width - 50.0 * scale).abs() < 1e-9);
        assert!((out.bottom_left.width - 10.0 * scale).abs() < 1e-9);
        assert!((out.top_left.height - 20.0 * scale).abs() < 1e-9);
        assert!((scale - 100.0 / 150.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_corners_become_exactly_zero() {
        let radii = RoundingRadii {
            top_left: Size::new(-5.0, 10.0),
            top_right: Size::new(10.0, 0.0),
            bottom_left: Size::new(f64::NAN, 10.0),
            bottom_right: Size::new(10.0, 10.0),
        };
        let rr = RoundRect::from_rect_radii(Rect::new(0.0, 0.0, 100.0, 80.0), radii);
        let out = rr.radii();
        assert_eq!(out.top_left, Size::ZERO);
        assert_eq!(out.top_right, Size::ZERO);
        assert_eq!(out.bottom_left, Size::ZERO);
        assert_eq!(out.bottom_right, Size::new(10.0, 10.0));
    }

    #[test]
    fn contains_uses_elliptical_corners() {
        let rr = RoundRect::from_rect_radii(
            Rect::new(0.0, 0.0, 100.0, 80.0),
            RoundingRadii::uniform(20.0),
        );
        // Center and edge midpoints are inside.
        assert!(rr.contains(Point::new(50.0, 40.0)));
        assert!(rr.contains(Point::new(50.0, 1.0)));
        // The sharp corner of the bounding box is rounded away.
        assert!(!rr.contains(Point::new(1.0, 1.0)));
        // On the corner arc's diagonal, just inside.
        let on_diag = 20.0 - 20.0 * std::f64::consts::FRAC_1_SQRT_2;
        assert!(rr.contains(Point::new(on_diag + 0.5, on_diag + 0.5)));
        // Outside the bounds entirely.
        assert!(!rr.contains(Point::new(-1.0, 40.0)));
    }

    #[test]
    fn empty_bounds_zero_all_radii() {
        let rr = RoundRect::from_rect_radii(
            Rect::new(10.0, 10.0, 10.0, 50.0),
            RoundingRadii::uniform(5.0),
        );
        assert!(rr.radii().is_zero());
    }
}

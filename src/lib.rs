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

//! Turns vector paths into flat polygonal data for a triangle rasterizer.
//!
//! This crate provides the geometry core a hardware-accelerated 2D renderer
//! sits on: error-bounded flattening of quadratic, conic and cubic segments,
//! storage counting for exact buffer preallocation, and a convex shadow-mesh
//! builder producing two-ring (penumbra/umbra) triangle meshes with
//! per-vertex gaussian intensity. The GPU pipeline itself — shaders, buffer
//! uploads, render passes — is left to the backend; everything here is a
//! pure, synchronous computation over in-memory arrays.
//!
//! Shapes are described by [`PathSource`] implementations — rectangles,
//! ellipses, rounded rectangles, rounded superellipses, or arbitrary
//! [`Path`]s — and consumed through the [`PathReceiver`] protocol. New shape
//! types and new consumers plug in at those seams without touching the core.
//!
//! ## Implementation
//!
//! This crate works first and foremost by converting every curve into a
//! bounded number of line segments. The segment counts come from the
//! Wang's-formula estimators in [`wangs_formula`]; the same formulas drive
//! counting, flattening and shadow accumulation, so a count-then-fill caller
//! never under- or over-allocates.
//!
//! Note that this crate generally uses thread-unsafe primitives. Geometry
//! preparation is usually pinned to one thread anyway; the only cached state
//! is the [`Tessellator`]'s trig tables, which each rendering thread should
//! own separately.

#![forbid(unsafe_code, rust_2018_idioms)]

mod path;
mod pruner;
mod round_rect;
mod round_superellipse;
mod segment;
mod shadow;
mod source;
mod tessellator;
pub mod wangs_formula;

pub use path::{FillType, Path, PathBuilder};
pub use pruner::{PathPruner, PruneMode, SegmentReceiver};
pub use round_rect::{RoundRect, RoundingRadii};
pub use round_superellipse::{RoundSuperellipse, RoundSuperellipseParam};
pub use segment::{ConicSegment, CubicSegment, LineSegment, QuadSegment};
pub use shadow::{
    calculate_convex_shadow_mesh, Convexity, PolygonInfo, ShadowVertices, UmbraPinAccumulator,
};
pub use source::{
    EllipseSource, PathReceiver, PathSource, RectSource, RoundRectSource,
    RoundSuperellipseSource, ShapeSource,
};
pub use tessellator::{
    count_fill_storage, max_basis_length, path_to_filled_segments, path_to_filled_vertices,
    path_to_stroked_segments, path_to_transformed_filled_vertices, Tessellator, Trig, VertexWriter,
};

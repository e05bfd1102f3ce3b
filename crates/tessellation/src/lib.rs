#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::float_cmp)]
#![no_std]

//! View-dependent terrain tessellation with binary triangle trees.
//!
//! This crate is reexported in [roam](https://docs.rs/roam/).
//!
//! ## Overview
//!
//! The most interesting types and traits of this crate are:
//!
//! * [TerrainPatch](struct.TerrainPatch.html) - A square terrain region
//!   covered by two binary triangle trees, retriangulated every frame.
//! * [`GeometryBuilder`](geometry_builder/trait.GeometryBuilder.html) - (See
//!   the documentation of the [geometry_builder module](geometry_builder/index.html))
//!   which the patch emits into. This trait provides an interface for types
//!   that assemble the emitted leaf triangles into whatever vertex layout the
//!   renderer wants.
//!
//! ## The tessellation pipeline
//!
//! A patch is built over a [Heightfield](../roam_heightfield/struct.Heightfield.html)
//! once, and [`compute_variance`](struct.TerrainPatch.html#method.compute_variance)
//! precomputes for every potential triangle an upper bound of the height error
//! committed by not splitting it. From then on each frame runs:
//!
//! * [`reset`](struct.TerrainPatch.html#method.reset) - both trees collapse
//!   back to a pair of root triangles sharing the patch diagonal, and the
//!   node pool is recycled in bulk.
//! * [`tessellate`](struct.TerrainPatch.html#method.tessellate) - triangles
//!   whose distance-scaled variance exceeds the error margin are split,
//!   force-splitting their base neighbors as needed so that the mesh never
//!   develops T-junctions.
//! * [`emit`](struct.TerrainPatch.html#method.emit) - the leaves are handed
//!   to a geometry builder in a deterministic pre-order walk.
//!
//! No allocation happens after the patch is constructed: splitting draws
//! nodes from a fixed pool, and running out of nodes only stops further
//! refinement for the frame.
//!
//! ## Examples
//!
//! - [Tessellating a patch](struct.TerrainPatch.html#examples).
//! - [Generating custom output](geometry_builder/index.html).

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub use roam_heightfield as heightfield;

#[cfg(test)]
use roam_extra as extra;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

mod btt;
pub mod geometry_builder;
mod patch;
mod variance;

#[cfg(test)]
mod patch_tests;

pub use crate::heightfield::math;
pub use crate::heightfield::Heightfield;

#[doc(inline)]
pub use crate::patch::TerrainPatch;

#[doc(inline)]
pub use crate::geometry_builder::{GeometryBuilder, NoOutput, TerrainVertex, TriangleBuffers};

/// How the distance between the viewpoint and a triangle scales the
/// triangle's precomputed variance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum DistanceClamp {
    /// Divide the variance by `max(distance, 1)`: triangles far from the
    /// viewpoint shrink in screen space, so their world-space error matters
    /// less and they coarsen first.
    ///
    /// Default value.
    Far,

    /// Divide the variance by `min(distance, 1)`: the error of nearby
    /// triangles is amplified and distant triangles are never attenuated.
    Near,
}

/// Parameters for [`TerrainPatch::tessellate`](struct.TerrainPatch.html#method.tessellate).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct LodOptions {
    /// Maximum allowed distance-scaled error before a triangle is split.
    ///
    /// Default value: `LodOptions::DEFAULT_ERROR_MARGIN`.
    pub error_margin: f32,

    /// Distance scaling policy of the error metric.
    ///
    /// Default value: `DistanceClamp::Far`.
    pub distance_clamp: DistanceClamp,
}

impl LodOptions {
    pub const DEFAULT_ERROR_MARGIN: f32 = 0.025;
    pub const DEFAULT_DISTANCE_CLAMP: DistanceClamp = DistanceClamp::Far;

    pub const DEFAULT: Self = LodOptions {
        error_margin: Self::DEFAULT_ERROR_MARGIN,
        distance_clamp: Self::DEFAULT_DISTANCE_CLAMP,
    };

    #[inline]
    pub fn error_margin(margin: f32) -> Self {
        Self::DEFAULT.with_error_margin(margin)
    }

    #[inline]
    pub const fn with_error_margin(mut self, margin: f32) -> Self {
        self.error_margin = margin;
        self
    }

    #[inline]
    pub const fn with_distance_clamp(mut self, clamp: DistanceClamp) -> Self {
        self.distance_clamp = clamp;
        self
    }
}

impl Default for LodOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Parameters for [`TerrainPatch::new`](struct.TerrainPatch.html#method.new).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct PatchOptions {
    /// Offset of the patch on the world grid along x.
    ///
    /// Default value: `0`.
    pub world_x: i32,

    /// Offset of the patch on the world grid along y.
    ///
    /// Default value: `0`.
    pub world_y: i32,

    /// Capacity of the triangle pool, in nodes. Two nodes are permanently
    /// reserved for the roots; once the rest is consumed, tessellation stops
    /// refining for the frame.
    ///
    /// Default value: `PatchOptions::DEFAULT_POOL_CAPACITY`.
    pub pool_capacity: usize,
}

impl PatchOptions {
    pub const DEFAULT_POOL_CAPACITY: usize = 100_000;

    pub const DEFAULT: Self = PatchOptions {
        world_x: 0,
        world_y: 0,
        pool_capacity: Self::DEFAULT_POOL_CAPACITY,
    };

    #[inline]
    pub fn pool_capacity(capacity: usize) -> Self {
        Self::DEFAULT.with_pool_capacity(capacity)
    }

    #[inline]
    pub const fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    #[inline]
    pub const fn with_world_offset(mut self, x: i32, y: i32) -> Self {
        self.world_x = x;
        self.world_y = y;
        self
    }
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[test]
fn default_lod_options() {
    let options = LodOptions::default();

    assert_eq!(options.error_margin, 0.025);
    assert_eq!(options.distance_clamp, DistanceClamp::Far);
}

#[test]
fn lod_options_builders() {
    let options = LodOptions::error_margin(0.1).with_distance_clamp(DistanceClamp::Near);

    assert_eq!(options.error_margin, 0.1);
    assert_eq!(options.distance_clamp, DistanceClamp::Near);
}

#[test]
fn patch_options_builders() {
    let options = PatchOptions::pool_capacity(64).with_world_offset(2, -3);

    assert_eq!(options.pool_capacity, 64);
    assert_eq!(options.world_x, 2);
    assert_eq!(options.world_y, -3);
}

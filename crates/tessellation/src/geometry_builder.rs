//! Tools to help with assembling the triangles emitted by a terrain patch.
//!
//! ## Overview
//!
//! The tessellator does not commit to an output vertex layout. Instead it
//! hands every leaf triangle to a type implementing the
//! [`GeometryBuilder`](trait.GeometryBuilder.html) trait, which is free to
//! interleave, deinterleave, transform or discard the data. This matters
//! because every renderer wants its own vertex format, and re-copying a full
//! terrain mesh per frame to adapt layouts would defeat the point of the
//! allocation-free tessellation loop.
//!
//! Two implementations cover the common cases:
//!
//! * [`TriangleBuffers`](struct.TriangleBuffers.html) collects positions,
//!   colors and normals into three growable parallel arrays, nine floats per
//!   triangle each, ready for a `glDrawArrays`-style draw call.
//! * [`NoOutput`](struct.NoOutput.html) counts triangles and drops the data,
//!   which is handy in tests and benchmarks.
//!
//! ## Generating a completely custom output
//!
//! ```
//! use roam_tessellation::{GeometryBuilder, TerrainVertex};
//!
//! // A geometry builder that prints the triangles instead of
//! // filling vertex buffers.
//! pub struct ToStdOut {
//!     triangles: u32,
//! }
//!
//! impl GeometryBuilder for ToStdOut {
//!     fn begin_geometry(&mut self) {
//!         self.triangles = 0;
//!         println!(" -- begin geometry");
//!     }
//!
//!     fn add_triangle(&mut self, left: TerrainVertex, right: TerrainVertex, apex: TerrainVertex) {
//!         println!(
//!             "triangle {:?} {:?} {:?}",
//!             left.position(),
//!             right.position(),
//!             apex.position()
//!         );
//!         self.triangles += 1;
//!     }
//!
//!     fn end_geometry(&mut self) {
//!         println!(" -- {} triangles", self.triangles);
//!     }
//! }
//! ```

use crate::heightfield::math::{GridPoint, Point3, Vector3};

use alloc::vec::Vec;

/// The color written for every vertex until per-vertex shading lands.
const PLACEHOLDER_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// One corner of an emitted leaf triangle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TerrainVertex {
    pub(crate) position: Point3,
    pub(crate) normal: Vector3,
    pub(crate) grid: GridPoint,
}

impl TerrainVertex {
    /// The vertex position: x and y normalized into the unit patch domain,
    /// the raw height as z.
    #[inline]
    pub fn position(&self) -> Point3 {
        self.position
    }

    /// The Sobel surface normal, or `(0, 0, 1)` when the heightfield carries
    /// no normal field.
    #[inline]
    pub fn normal(&self) -> Vector3 {
        self.normal
    }

    /// The vertex color. The color buffer is reserved for per-vertex shading
    /// and currently always holds white.
    #[inline]
    pub fn color(&self) -> [f32; 3] {
        PLACEHOLDER_COLOR
    }

    /// Where the vertex sits on the heightfield grid.
    #[inline]
    pub fn grid_position(&self) -> GridPoint {
        self.grid
    }
}

/// An interface separating the tessellator from the assembly of the output
/// mesh.
///
/// See the [`geometry_builder`](index.html) module documentation.
pub trait GeometryBuilder {
    /// Called before the first triangle of a tessellation is emitted.
    fn begin_geometry(&mut self) {}

    /// Called after the last triangle of a tessellation has been emitted.
    fn end_geometry(&mut self) {}

    /// Insert one leaf triangle. Vertices arrive in `(left, right, apex)`
    /// order.
    fn add_triangle(&mut self, left: TerrainVertex, right: TerrainVertex, apex: TerrainVertex);
}

/// Growable triangle storage: three parallel arrays with nine floats (three
/// vertices of three components) per triangle each.
#[derive(Clone, Debug, Default)]
pub struct TriangleBuffers {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub normals: Vec<f32>,
}

impl TriangleBuffers {
    /// Constructor
    pub fn new() -> Self {
        TriangleBuffers::default()
    }

    /// Constructor
    pub fn with_capacity(triangles: usize) -> Self {
        TriangleBuffers {
            positions: Vec::with_capacity(triangles * 9),
            colors: Vec::with_capacity(triangles * 9),
            normals: Vec::with_capacity(triangles * 9),
        }
    }

    /// Empty the buffers without freeing memory, for reuse without
    /// reallocation.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.normals.clear();
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 9
    }
}

impl GeometryBuilder for TriangleBuffers {
    fn add_triangle(&mut self, left: TerrainVertex, right: TerrainVertex, apex: TerrainVertex) {
        for &vertex in &[left, right, apex] {
            let p = vertex.position();
            self.positions.extend_from_slice(&[p.x, p.y, p.z]);
            self.colors.extend_from_slice(&vertex.color());
            let n = vertex.normal();
            self.normals.extend_from_slice(&[n.x, n.y, n.z]);
        }
    }
}

/// Writes into caller-provided slices, nine floats per triangle in each.
///
/// The slices must be large enough for the whole tessellation; writing past
/// their end is a programming fault and panics.
pub(crate) struct SliceWriter<'l> {
    positions: &'l mut [f32],
    colors: &'l mut [f32],
    normals: &'l mut [f32],
    offset: usize,
}

impl<'l> SliceWriter<'l> {
    pub fn new(
        positions: &'l mut [f32],
        colors: &'l mut [f32],
        normals: &'l mut [f32],
    ) -> Self {
        SliceWriter {
            positions,
            colors,
            normals,
            offset: 0,
        }
    }
}

impl<'l> GeometryBuilder for SliceWriter<'l> {
    fn add_triangle(&mut self, left: TerrainVertex, right: TerrainVertex, apex: TerrainVertex) {
        for &vertex in &[left, right, apex] {
            let p = vertex.position();
            let n = vertex.normal();
            let at = self.offset;

            self.positions[at..at + 3].copy_from_slice(&[p.x, p.y, p.z]);
            self.colors[at..at + 3].copy_from_slice(&vertex.color());
            self.normals[at..at + 3].copy_from_slice(&[n.x, n.y, n.z]);

            self.offset += 3;
        }
    }
}

/// A geometry builder that does not assemble any geometry.
///
/// Mostly useful for testing.
#[derive(Default)]
pub struct NoOutput {
    triangles: usize,
}

impl NoOutput {
    pub fn new() -> Self {
        NoOutput::default()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles
    }
}

impl GeometryBuilder for NoOutput {
    fn begin_geometry(&mut self) {
        self.triangles = 0;
    }

    fn add_triangle(&mut self, _left: TerrainVertex, _right: TerrainVertex, _apex: TerrainVertex) {
        self.triangles += 1;
    }
}

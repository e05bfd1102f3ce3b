#![deny(bare_trait_objects)]

//! Real-time terrain level of detail using binary triangle trees.
//!
//! # Crates
//!
//! This meta-crate (`roam`) reexports the following sub-crates for
//! convenience:
//!
//! * **roam_tessellation** - The adaptive tessellator: terrain patches,
//!   their per-frame refinement and the geometry builders they emit into.
//! * **roam_heightfield** - Heightfield storage, sampling and the Sobel
//!   normal field.
//! * **roam_extra** - Heightmap file loading and sample terrains. Disabled
//!   by default, enabled with the `extra` feature flag.
//!
//! Each `roam_<name>` crate is reexported as a `<name>` module in `roam`.
//! For example:
//!
//! ```ignore
//! extern crate roam_tessellation;
//! use roam_tessellation::TerrainPatch;
//! ```
//!
//! Is equivalent to:
//!
//! ```ignore
//! extern crate roam;
//! use roam::tessellation::TerrainPatch;
//! ```
//!
//! # Feature flags
//!
//! Serialization of the options types using serde can be enabled with the
//! `serialization` feature flag (disabled by default).
//!
//! # Examples
//!
//! ## Tessellating a small terrain patch
//!
//! ```
//! use roam::heightfield::Heightfield;
//! use roam::math::point3;
//! use roam::tessellation::{LodOptions, PatchOptions, TerrainPatch, TriangleBuffers};
//! use std::sync::Arc;
//!
//! fn main() {
//!     let heights = vec![
//!         0.0, 0.0, 0.0,
//!         0.0, 1.0, 0.0,
//!         0.0, 0.0, 0.0,
//!     ];
//!     let mut field = Heightfield::from_data(3, 3, heights);
//!     field.compute_normals();
//!
//!     let mut patch = TerrainPatch::new(Arc::new(field), &PatchOptions::DEFAULT);
//!     patch.compute_variance(2);
//!
//!     // Every frame: rewind, refine for the viewpoint, emit.
//!     patch.reset();
//!     patch.tessellate(point3(0.5, 0.5, 0.0), &LodOptions::default());
//!
//!     let mut buffers = TriangleBuffers::new();
//!     patch.emit(&mut buffers);
//!
//!     println!(" -- {} triangles", buffers.triangle_count());
//! }
//! ```

pub use roam_heightfield as heightfield;
pub use roam_tessellation as tessellation;

#[cfg(feature = "extra")]
pub use roam_extra as extra;

pub use crate::heightfield::euclid;
pub use crate::heightfield::math;

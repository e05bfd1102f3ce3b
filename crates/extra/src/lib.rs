#![deny(bare_trait_objects)]

//! Optional companions to the roam crates: the textual heightmap loader and
//! deterministic sample terrains for tests and demos.

extern crate roam_heightfield as heightfield;

pub use heightfield::euclid;
pub use heightfield::math;

pub mod parser;
pub mod terrain_samples;

#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![no_std]

//! Heightfield storage and sampling on top of euclid.
//!
//! This crate is reexported in [roam](https://docs.rs/roam/).
//!
//! # Overview
//!
//! A [`Heightfield`](struct.Heightfield.html) is a read-only W×H grid of
//! single precision heights with the observed minimum/maximum and an optional
//! per-vertex normal field. It is the input of the tessellator in
//! `roam_tessellation`, which samples it both while precomputing its error
//! metric and while emitting triangles.
//!
//! Heights are addressed in row-major order with stride `W`: the sample at
//! grid coordinates `(x, y)` lives at index `y * W + x`.
//!
//! Most of the time the grid is square with a power-of-two-plus-one side
//! (129, 257, 513, ...) so that it can be bisected all the way down to single
//! cells, but nothing here requires it.

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

// Reexport dependencies.
pub use euclid;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

mod normals;

use alloc::vec::Vec;
use math::Vector3;

pub mod math {
    //! f32 and grid-coordinate aliases of the euclid types used across the
    //! roam crates.

    use euclid;

    /// A position on the heightfield grid. Alias for `euclid::default::Point2D<i32>`.
    pub type GridPoint = euclid::default::Point2D<i32>;

    /// Alias for `euclid::default::Point3D<f32>`.
    pub type Point3 = euclid::default::Point3D<f32>;

    /// Alias for `euclid::default::Vector3D<f32>`.
    pub type Vector3 = euclid::default::Vector3D<f32>;

    /// Shorthand for `GridPoint::new(x, y)`.
    #[inline]
    pub fn grid_point(x: i32, y: i32) -> GridPoint {
        GridPoint::new(x, y)
    }

    /// Shorthand for `Point3::new(x, y, z)`.
    #[inline]
    pub fn point3(x: f32, y: f32, z: f32) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Shorthand for `Vector3::new(x, y, z)`.
    #[inline]
    pub fn vector3(x: f32, y: f32, z: f32) -> Vector3 {
        Vector3::new(x, y, z)
    }
}

/// A W×H grid of f32 heights with optional per-vertex normals.
#[derive(Clone, Debug, PartialEq)]
pub struct Heightfield {
    data: Vec<f32>,
    width: usize,
    height: usize,
    min: f32,
    max: f32,
    normals: Option<Vec<Vector3>>,
}

impl Heightfield {
    /// Builds a heightfield from row-major height data.
    ///
    /// The observed minimum and maximum are recorded for later normalization.
    /// `data.len()` must be exactly `width * height`.
    pub fn from_data(width: usize, height: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "height data does not match the grid dimensions"
        );

        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &z in &data {
            min = min.min(z);
            max = max.max(z);
        }

        Heightfield {
            data,
            width,
            height,
            min,
            max,
            normals: None,
        }
    }

    /// Number of vertices per row.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The height at grid coordinates `(x, y)`.
    ///
    /// Sampling outside of the grid is a programming fault and panics.
    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> f32 {
        debug_assert!(x < self.width, "x = {} out of range", x);
        debug_assert!(y < self.height, "y = {} out of range", y);
        self.data[self.width * y + x]
    }

    /// Smallest observed height.
    #[inline]
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Largest observed height.
    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Rescales all heights by the observed maximum so that they lie in `[0, 1]`.
    ///
    /// Does nothing when the observed maximum is not positive (for example a
    /// completely flat heightfield at zero).
    pub fn normalize(&mut self) {
        if self.max <= 0.0 {
            return;
        }

        let scale = 1.0 / self.max;
        for z in &mut self.data {
            *z *= scale;
        }
        self.min *= scale;
        self.max = 1.0;
    }
}

#[test]
fn from_data_tracks_min_max() {
    let field = Heightfield::from_data(2, 2, alloc::vec![0.5, -1.0, 4.0, 2.0]);

    assert_eq!(field.width(), 2);
    assert_eq!(field.height(), 2);
    assert_eq!(field.min(), -1.0);
    assert_eq!(field.max(), 4.0);
    assert_eq!(field.sample(1, 1), 2.0);
}

#[test]
fn sample_is_row_major() {
    let field = Heightfield::from_data(3, 2, alloc::vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

    assert_eq!(field.sample(0, 0), 0.0);
    assert_eq!(field.sample(2, 0), 2.0);
    assert_eq!(field.sample(0, 1), 3.0);
    assert_eq!(field.sample(2, 1), 5.0);
}

#[test]
fn normalize_rescales_by_max() {
    let mut field = Heightfield::from_data(2, 2, alloc::vec![0.0, 1.0, 2.0, 4.0]);
    field.normalize();

    assert_eq!(field.sample(0, 0), 0.0);
    assert_eq!(field.sample(1, 0), 0.25);
    assert_eq!(field.sample(1, 1), 1.0);
    assert_eq!(field.min(), 0.0);
    assert_eq!(field.max(), 1.0);
}

#[test]
fn normalize_skips_flat_fields() {
    let mut field = Heightfield::from_data(2, 2, alloc::vec![0.0; 4]);
    field.normalize();

    assert_eq!(field.sample(1, 1), 0.0);
}

#[test]
#[should_panic]
fn mismatched_data_length() {
    let _ = Heightfield::from_data(3, 3, alloc::vec![0.0; 8]);
}

//! Sobel-filtered per-vertex normals.

use crate::math::{vector3, Vector3};
use crate::Heightfield;

use alloc::vec;

#[cfg(not(feature = "std"))]
use num_traits::Float;

/// Inverse steepness of the generated normals. Larger values exaggerate
/// relief; 32 matches the strength the renderer was tuned against.
const SOBEL_STRENGTH: f32 = 32.0;

impl Heightfield {
    /// Computes the per-vertex normal field with a Sobel filter over the
    /// heights.
    ///
    /// Boundary vertices get the straight-up normal `(0, 0, 1)`. Call this
    /// after [`normalize`](struct.Heightfield.html#method.normalize) so the
    /// gradients are taken over the same heights the tessellator emits.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![vector3(0.0, 0.0, 1.0); self.width * self.height];

        for y in 1..self.height.saturating_sub(1) {
            for x in 1..self.width.saturating_sub(1) {
                let h = |x, y| self.sample(x, y);

                let dx = (h(x + 1, y - 1) + 2.0 * h(x + 1, y) + h(x + 1, y + 1))
                    - (h(x - 1, y - 1) + 2.0 * h(x - 1, y) + h(x - 1, y + 1));
                let dy = (h(x - 1, y + 1) + 2.0 * h(x, y + 1) + h(x + 1, y + 1))
                    - (h(x - 1, y - 1) + 2.0 * h(x, y - 1) + h(x + 1, y - 1));
                let dz = 1.0 / SOBEL_STRENGTH;

                let len = (dx * dx + dy * dy + dz * dz).sqrt();
                normals[self.width * y + x] = vector3(dx / len, dy / len, dz / len);
            }
        }

        self.normals = Some(normals);
    }

    /// Whether a normal field has been computed.
    #[inline]
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// The surface normal at grid coordinates `(x, y)`.
    ///
    /// Returns the placeholder `(0, 0, 1)` when no normal field has been
    /// computed.
    #[inline]
    pub fn normal(&self, x: usize, y: usize) -> Vector3 {
        debug_assert!(x < self.width, "x = {} out of range", x);
        debug_assert!(y < self.height, "y = {} out of range", y);
        match &self.normals {
            Some(normals) => normals[self.width * y + x],
            None => vector3(0.0, 0.0, 1.0),
        }
    }
}

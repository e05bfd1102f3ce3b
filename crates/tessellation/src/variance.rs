//! Variance trees: the precomputed error oracle driving the subdivision.

use crate::btt::{sample_at, TriangleCoords};
use crate::heightfield::Heightfield;

use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use num_traits::Float;

/// Implicit complete binary tree of collapse errors for one root triangle.
///
/// `values[i]` bounds the height error committed if the subtree rooted at
/// implicit index `i` were drawn as a single triangle: a leaf stores the
/// distance between the true height at its hypotenuse midpoint and the
/// height interpolated from the hypotenuse endpoints, an inner node the
/// maximum over its two children. Index 0 is unused, the root sits at 1 and
/// the children of `i` at `2i` and `2i + 1`.
pub(crate) struct VarianceTree {
    values: Vec<f32>,
    levels: u32,
}

impl VarianceTree {
    pub fn new() -> Self {
        VarianceTree {
            values: Vec::new(),
            levels: 0,
        }
    }

    /// Number of slots: `2^(levels + 1)`, or zero before the first rebuild.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Depth the tree was last built at.
    #[inline]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    #[inline]
    pub fn get(&self, idx: usize) -> f32 {
        self.values[idx]
    }

    #[cfg(test)]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Rebuilds the tree for the triangle `root` at `levels` subdivision
    /// levels.
    pub fn rebuild(&mut self, map: &Heightfield, root: TriangleCoords, levels: u32) {
        self.values.clear();
        self.values.resize(2usize << levels, 0.0);
        self.levels = levels;

        compute_variance(map, &mut self.values, root, 1, 0, levels);
    }
}

fn compute_variance(
    map: &Heightfield,
    values: &mut [f32],
    tri: TriangleCoords,
    idx: usize,
    level: u32,
    levels: u32,
) {
    if level < levels {
        compute_variance(map, values, tri.left_child(), idx << 1, level + 1, levels);
        compute_variance(map, values, tri.right_child(), (idx << 1) + 1, level + 1, levels);

        values[idx] = values[idx << 1].max(values[(idx << 1) + 1]);
    } else {
        let center_z = sample_at(map, tri.center());
        let left_z = sample_at(map, tri.left);
        let right_z = sample_at(map, tri.right);

        values[idx] = (center_z - (left_z + right_z) * 0.5).abs();
    }
}

//! The terrain patch: two binary triangle trees over a shared node pool.

use crate::btt::{
    sample_at, NodeId, TriangleCoords, TrianglePool, INVALID_NODE_ID, LEFT_ROOT, RIGHT_ROOT,
};
use crate::geometry_builder::{GeometryBuilder, SliceWriter, TerrainVertex};
use crate::heightfield::math::{grid_point, point3, GridPoint, Point3};
use crate::heightfield::Heightfield;
use crate::variance::VarianceTree;
use crate::{DistanceClamp, LodOptions, PatchOptions};

use alloc::sync::Arc;

#[cfg(not(feature = "std"))]
use num_traits::Float;

#[cfg(all(debug_assertions, feature = "std"))]
macro_rules! lod_log {
    ($obj:ident, $fmt:expr) => (
        if $obj.log {
            std::println!($fmt);
        }
    );
    ($obj:ident, $fmt:expr, $($arg:tt)*) => (
        if $obj.log {
            std::println!($fmt, $($arg)*);
        }
    );
}

#[cfg(not(all(debug_assertions, feature = "std")))]
macro_rules! lod_log {
    ($obj:ident, $fmt:expr) => {};
    ($obj:ident, $fmt:expr, $($arg:tt)*) => {};
}

/// A square terrain region covered by two binary triangle trees that share
/// the main diagonal of the heightfield.
///
/// The per-frame pipeline is `reset`, then `tessellate`, then `emit` (or
/// [`get_tessellation`](#method.get_tessellation)), with
/// [`compute_variance`](#method.compute_variance) run once up front. All of
/// it happens on the calling thread and touches no memory outside the patch.
///
/// # Examples
///
/// ```
/// use roam_tessellation::heightfield::Heightfield;
/// use roam_tessellation::math::point3;
/// use roam_tessellation::{LodOptions, PatchOptions, TerrainPatch, TriangleBuffers};
/// use std::sync::Arc;
///
/// # fn main() {
/// let heights = vec![
///     0.0, 0.0, 0.0,
///     0.0, 1.0, 0.0,
///     0.0, 0.0, 0.0,
/// ];
/// let field = Heightfield::from_data(3, 3, heights);
///
/// let mut patch = TerrainPatch::new(Arc::new(field), &PatchOptions::DEFAULT);
/// patch.compute_variance(2);
///
/// patch.reset();
/// patch.tessellate(point3(0.5, 0.5, 0.0), &LodOptions::error_margin(0.1));
///
/// let mut buffers = TriangleBuffers::new();
/// patch.emit(&mut buffers);
///
/// assert_eq!(buffers.triangle_count(), patch.leaf_count());
/// # }
/// ```
pub struct TerrainPatch {
    map: Arc<Heightfield>,
    world_x: i32,
    world_y: i32,

    left_variance: VarianceTree,
    right_variance: VarianceTree,

    pool: TrianglePool,

    left_leaves: usize,
    right_leaves: usize,

    pool_exhausted: bool,
    log: bool,
}

impl TerrainPatch {
    /// Default number of subdivision levels for
    /// [`compute_variance`](#method.compute_variance).
    pub const DEFAULT_TESSELLATION_LEVELS: u32 = 14;

    /// Builds a patch over `map`, allocating its node pool once.
    ///
    /// The heightfield may be shared between patches; it is only ever read.
    pub fn new(map: Arc<Heightfield>, options: &PatchOptions) -> Self {
        assert!(
            map.width() >= 2 && map.height() >= 2,
            "a patch needs at least one grid cell"
        );

        TerrainPatch {
            map,
            world_x: options.world_x,
            world_y: options.world_y,
            left_variance: VarianceTree::new(),
            right_variance: VarianceTree::new(),
            pool: TrianglePool::new(options.pool_capacity),
            left_leaves: 1,
            right_leaves: 1,
            pool_exhausted: false,
            log: false,
        }
    }

    /// The heightfield this patch triangulates.
    #[inline]
    pub fn heightfield(&self) -> &Heightfield {
        &self.map
    }

    /// Offset of the patch on the world grid.
    #[inline]
    pub fn world_offset(&self) -> (i32, i32) {
        (self.world_x, self.world_y)
    }

    /// Enable some verbose logging during tessellation, for debugging
    /// purposes.
    pub fn set_logging(&mut self, is_enabled: bool) {
        self.log = is_enabled;
    }

    /// Precomputes the error oracle for both trees.
    ///
    /// Must run before the first [`tessellate`](#method.tessellate).
    /// `max_levels` is clamped to the number of times the grid can actually
    /// be bisected; recomputing at an unchanged level is a no-op.
    pub fn compute_variance(&mut self, max_levels: u32) {
        let levels = max_levels.min(self.max_levels());
        if !self.left_variance.is_empty() && self.left_variance.levels() == levels {
            return;
        }

        self.left_variance
            .rebuild(&self.map, self.left_root_coords(), levels);
        self.right_variance
            .rebuild(&self.map, self.right_root_coords(), levels);
    }

    /// Restores both roots to fresh leaves based on each other across the
    /// patch diagonal and retires every node split off during the previous
    /// frame. O(1).
    pub fn reset(&mut self) {
        self.pool.reset();
        self.left_leaves = 1;
        self.right_leaves = 1;
        self.pool_exhausted = false;
    }

    /// Refines both trees for the given viewpoint.
    ///
    /// `view` is expected in the patch's unit domain: x and y land in
    /// `[0, 1]` for viewpoints above the patch. Triangles whose
    /// distance-scaled variance exceeds `options.error_margin` are split,
    /// together with whatever neighbors the crack-free invariant demands.
    pub fn tessellate(&mut self, view: Point3, options: &LodOptions) {
        debug_assert!(
            !self.left_variance.is_empty(),
            "compute_variance must run before tessellate"
        );

        let inv_span_x = 1.0 / (self.map.width() - 1) as f32;
        let inv_span_y = 1.0 / (self.map.height() - 1) as f32;
        let left_coords = self.left_root_coords();
        let right_coords = self.right_root_coords();

        let mut pass = RefinePass {
            pool: &mut self.pool,
            variance: &self.left_variance,
            view,
            inv_span_x,
            inv_span_y,
            error_margin: options.error_margin,
            distance_clamp: options.distance_clamp,
            exhausted: self.pool_exhausted,
            log: self.log,
        };
        pass.refine(LEFT_ROOT, left_coords, 1);
        let exhausted = pass.exhausted;

        let mut pass = RefinePass {
            pool: &mut self.pool,
            variance: &self.right_variance,
            view,
            inv_span_x,
            inv_span_y,
            error_margin: options.error_margin,
            distance_clamp: options.distance_clamp,
            exhausted,
            log: self.log,
        };
        pass.refine(RIGHT_ROOT, right_coords, 1);
        self.pool_exhausted = pass.exhausted;

        self.left_leaves = count_leaves(&self.pool, LEFT_ROOT);
        self.right_leaves = count_leaves(&self.pool, RIGHT_ROOT);
    }

    /// Hands every leaf triangle to `builder`: left tree first, pre-order,
    /// vertices in `(left, right, apex)` order.
    pub fn emit(&self, builder: &mut dyn GeometryBuilder) {
        builder.begin_geometry();
        emit_node(
            &self.pool,
            &self.map,
            LEFT_ROOT,
            self.left_root_coords(),
            builder,
        );
        emit_node(
            &self.pool,
            &self.map,
            RIGHT_ROOT,
            self.right_root_coords(),
            builder,
        );
        builder.end_geometry();
    }

    /// Writes the tessellation into flat parallel arrays, nine floats (three
    /// vertices of three components) per triangle in each.
    ///
    /// Every slice must hold at least `9 * leaf_count()` floats.
    pub fn get_tessellation(
        &self,
        positions: &mut [f32],
        colors: &mut [f32],
        normals: &mut [f32],
    ) {
        let mut writer = SliceWriter::new(positions, colors, normals);
        self.emit(&mut writer);
    }

    /// Number of leaf triangles produced by the last
    /// [`tessellate`](#method.tessellate).
    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.left_leaves + self.right_leaves
    }

    #[inline]
    pub fn pool_capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Number of pool nodes consumed by the current frame.
    #[inline]
    pub fn pool_used(&self) -> usize {
        self.pool.used()
    }

    /// Whether the last [`tessellate`](#method.tessellate) ran out of pool
    /// nodes and stopped refining early. The mesh stays usable but may
    /// contain cracks along the edges where refinement halted.
    #[inline]
    pub fn pool_exhausted(&self) -> bool {
        self.pool_exhausted
    }

    /// Two tree levels halve both triangle legs once, so the deepest useful
    /// level is twice the log2 of the shorter grid span.
    fn max_levels(&self) -> u32 {
        let span = (self.map.width().min(self.map.height()) - 1) as u32;
        2 * (31 - span.leading_zeros())
    }

    fn left_root_coords(&self) -> TriangleCoords {
        let w = (self.map.width() - 1) as i32;
        let h = (self.map.height() - 1) as i32;
        TriangleCoords {
            left: grid_point(0, h),
            right: grid_point(w, 0),
            apex: grid_point(0, 0),
        }
    }

    fn right_root_coords(&self) -> TriangleCoords {
        let w = (self.map.width() - 1) as i32;
        let h = (self.map.height() - 1) as i32;
        TriangleCoords {
            left: grid_point(w, 0),
            right: grid_point(0, h),
            apex: grid_point(w, h),
        }
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &TrianglePool {
        &self.pool
    }

    #[cfg(test)]
    pub(crate) fn variance_values(&self) -> (&[f32], &[f32]) {
        (self.left_variance.values(), self.right_variance.values())
    }
}

/// One frame's refinement over a single tree.
struct RefinePass<'l> {
    pool: &'l mut TrianglePool,
    variance: &'l VarianceTree,
    view: Point3,
    inv_span_x: f32,
    inv_span_y: f32,
    error_margin: f32,
    distance_clamp: DistanceClamp,
    exhausted: bool,
    log: bool,
}

impl<'l> RefinePass<'l> {
    fn refine(&mut self, node_id: NodeId, tri: TriangleCoords, variance_idx: usize) {
        if variance_idx >= self.variance.len() {
            // Deeper than the precomputed tree: no error estimate, no split.
            return;
        }

        // The exact hypotenuse midpoint; the integer center is only for the
        // children's coordinates.
        let center_x = (tri.left.x + tri.right.x) as f32 * 0.5;
        let center_y = (tri.left.y + tri.right.y) as f32 * 0.5;

        let dx = center_x * self.inv_span_x - self.view.x;
        let dy = center_y * self.inv_span_y - self.view.y;
        let distance = (dx * dx + dy * dy).sqrt();
        let scale = match self.distance_clamp {
            DistanceClamp::Far => distance.max(1.0),
            DistanceClamp::Near => distance.min(1.0),
        };

        if self.variance.get(variance_idx) / scale > self.error_margin {
            self.split(node_id);

            let node = *self.pool.node(node_id);
            if node.has_children() && tri.can_bisect() {
                self.refine(node.left_child, tri.left_child(), variance_idx << 1);
                self.refine(node.right_child, tri.right_child(), (variance_idx << 1) + 1);
            }
        }
    }

    /// Splits `node_id` into its two children, force-splitting base
    /// neighbors as needed.
    ///
    /// Postcondition: every link among the children, the former neighbors
    /// and the base neighbor's children is mutual, so the mesh stays free of
    /// T-junctions. Splitting an already split node is a no-op, and running
    /// out of pool nodes leaves the node a leaf.
    fn split(&mut self, node_id: NodeId) {
        if self.pool.node(node_id).has_children() {
            return;
        }

        // Bring the base neighbor into diamond position first, so that both
        // halves of the shared hypotenuse split together. This may cascade
        // along a chain of coarser neighbors, and it may redirect our own
        // base link at one of the freshly created children.
        let base = self.pool.node(node_id).base_neighbor;
        if base != INVALID_NODE_ID && self.pool.node(base).base_neighbor != node_id {
            self.split(base);
        }

        let (left_child, right_child) = match (self.pool.allocate(), self.pool.allocate()) {
            (Some(left), Some(right)) => (left, right),
            _ => {
                if !self.exhausted {
                    lod_log!(self, "triangle pool exhausted, mesh stays coarse");
                    self.exhausted = true;
                }
                return;
            }
        };

        let left_neighbor = self.pool.node(node_id).left_neighbor;
        let right_neighbor = self.pool.node(node_id).right_neighbor;

        {
            let child = self.pool.node_mut(left_child);
            child.base_neighbor = left_neighbor;
            child.left_neighbor = right_child;
        }
        {
            let child = self.pool.node_mut(right_child);
            child.base_neighbor = right_neighbor;
            child.right_neighbor = left_child;
        }
        {
            let node = self.pool.node_mut(node_id);
            node.left_child = left_child;
            node.right_child = right_child;
        }

        // The outer edges now border the children.
        if left_neighbor != INVALID_NODE_ID {
            self.redirect(left_neighbor, node_id, left_child);
        }
        if right_neighbor != INVALID_NODE_ID {
            self.redirect(right_neighbor, node_id, right_child);
        }

        // Reload the base link: the force split above may have replaced it.
        let base = self.pool.node(node_id).base_neighbor;
        if base != INVALID_NODE_ID {
            if self.pool.node(base).has_children() {
                self.stitch_diamond(node_id, base);
            } else {
                // The base neighbor is in diamond position but still a leaf;
                // splitting it stitches the four inner edges from its side.
                // This only fails to link when the pool runs dry, leaving the
                // seam open for the frame.
                self.split(base);
            }
        } else {
            // Patch boundary: the inner edges face outward.
            self.pool.node_mut(left_child).right_neighbor = INVALID_NODE_ID;
            self.pool.node_mut(right_child).left_neighbor = INVALID_NODE_ID;
        }
    }

    /// Repoints whichever of `neighbor`'s links referenced `from` at `to`.
    fn redirect(&mut self, neighbor: NodeId, from: NodeId, to: NodeId) {
        let node = self.pool.node_mut(neighbor);
        if node.base_neighbor == from {
            node.base_neighbor = to;
        } else if node.left_neighbor == from {
            node.left_neighbor = to;
        } else if node.right_neighbor == from {
            node.right_neighbor = to;
        } else {
            debug_assert!(false, "neighbor does not reference the node being split");
        }
    }

    /// Links the four inner edges of the diamond formed by `node_id` and
    /// `base_id`, both of which have children.
    fn stitch_diamond(&mut self, node_id: NodeId, base_id: NodeId) {
        let node = *self.pool.node(node_id);
        let base = *self.pool.node(base_id);

        self.pool.node_mut(base.left_child).right_neighbor = node.right_child;
        self.pool.node_mut(base.right_child).left_neighbor = node.left_child;
        self.pool.node_mut(node.left_child).right_neighbor = base.right_child;
        self.pool.node_mut(node.right_child).left_neighbor = base.left_child;
    }
}

fn count_leaves(pool: &TrianglePool, node_id: NodeId) -> usize {
    if node_id == INVALID_NODE_ID {
        return 0;
    }

    let node = pool.node(node_id);
    if node.is_leaf() {
        1
    } else {
        count_leaves(pool, node.left_child) + count_leaves(pool, node.right_child)
    }
}

fn emit_node(
    pool: &TrianglePool,
    map: &Heightfield,
    node_id: NodeId,
    tri: TriangleCoords,
    builder: &mut dyn GeometryBuilder,
) {
    let node = pool.node(node_id);
    if node.has_children() {
        emit_node(pool, map, node.left_child, tri.left_child(), builder);
        emit_node(pool, map, node.right_child, tri.right_child(), builder);
    } else {
        builder.add_triangle(
            terrain_vertex(map, tri.left),
            terrain_vertex(map, tri.right),
            terrain_vertex(map, tri.apex),
        );
    }
}

fn terrain_vertex(map: &Heightfield, p: GridPoint) -> TerrainVertex {
    let x = p.x as f32 / (map.width() - 1) as f32;
    let y = p.y as f32 / (map.height() - 1) as f32;

    TerrainVertex {
        position: point3(x, y, sample_at(map, p)),
        normal: map.normal(p.x as usize, p.y as usize),
        grid: p,
    }
}

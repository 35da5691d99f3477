//! Broad Phase — Dynamic AABB Tree
//!
//! Incrementally balanced bounding-volume hierarchy over fixture proxies.
//! Leaves store "fat" AABBs: the tight geometry bound enlarged by a fixed
//! margin plus a velocity-predicted displacement. A proxy move only touches
//! the tree when the tight box escapes its fat box, which amortizes pair
//! discovery to near O(n log n).
//!
//! # Algorithm
//!
//! - Insertion walks down the tree picking the child that minimizes the
//!   perimeter-cost increase (surface-area heuristic in 2D)
//! - AVL-style rotations keep the tree height logarithmic
//! - Pair generation self-queries the tree for every proxy that moved this
//!   step and deduplicates symmetric pairs

use alloc::vec::Vec;

use crate::math::{Aabb2, Fix64, Vec2Fix};
use crate::shape::RayCastInput;

/// Sentinel for "no node".
pub const NULL_NODE: u32 = u32::MAX;

/// Fixed fattening margin added around every tight AABB.
pub const AABB_MARGIN: Fix64 = Fix64::from_ratio(1, 10);

/// Displacement prediction multiplier applied on reinsertion.
const AABB_MULTIPLIER: Fix64 = Fix64::TWO;

// ============================================================================
// Tree node
// ============================================================================

#[derive(Clone, Copy, Debug)]
struct TreeNode {
    /// Fat AABB for leaves, subtree union for internal nodes.
    aabb: Aabb2,
    /// Opaque proxy payload (leaves only).
    data: u64,
    /// Parent index, or the next free slot while pooled.
    parent: u32,
    child1: u32,
    child2: u32,
    /// Leaf = 0, free = -1.
    height: i32,
}

impl TreeNode {
    fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }
}

// ============================================================================
// AabbTree
// ============================================================================

/// Dynamic AABB tree with a free-list node pool.
pub struct AabbTree {
    nodes: Vec<TreeNode>,
    root: u32,
    free_list: u32,
}

impl Default for AabbTree {
    fn default() -> Self {
        Self::new()
    }
}

impl AabbTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NULL_NODE,
            free_list: NULL_NODE,
        }
    }

    /// Number of live proxies.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.height == 0 && n.child1 == NULL_NODE)
            .count()
    }

    /// Height of the tree (0 for a single leaf, -1 when empty).
    #[must_use]
    pub fn height(&self) -> i32 {
        if self.root == NULL_NODE {
            -1
        } else {
            self.nodes[self.root as usize].height
        }
    }

    /// Insert a proxy with a pre-fattened AABB. Returns the proxy id.
    pub fn create_proxy(&mut self, tight: &Aabb2, data: u64) -> u32 {
        let id = self.alloc_node();
        let node = &mut self.nodes[id as usize];
        node.aabb = tight.expanded(AABB_MARGIN);
        node.data = data;
        node.height = 0;
        self.insert_leaf(id);
        id
    }

    /// Remove a proxy from the tree and recycle its node.
    pub fn destroy_proxy(&mut self, id: u32) {
        self.remove_leaf(id);
        self.free_node(id);
    }

    /// Update a proxy's AABB. Returns true if the leaf was reinserted, which
    /// happens only when the tight box escaped the stored fat box.
    pub fn move_proxy(&mut self, id: u32, tight: &Aabb2, displacement: Vec2Fix) -> bool {
        if self.nodes[id as usize].aabb.contains(tight) {
            return false;
        }

        self.remove_leaf(id);

        let mut fat = tight.expanded(AABB_MARGIN);
        // Stretch toward the predicted motion so fast movers do not reinsert
        // every step.
        let d = displacement * AABB_MULTIPLIER;
        if d.x < Fix64::ZERO {
            fat.min.x += d.x;
        } else {
            fat.max.x += d.x;
        }
        if d.y < Fix64::ZERO {
            fat.min.y += d.y;
        } else {
            fat.max.y += d.y;
        }

        self.nodes[id as usize].aabb = fat;
        self.insert_leaf(id);
        true
    }

    /// Fat AABB currently stored for a proxy.
    #[must_use]
    pub fn fat_aabb(&self, id: u32) -> Aabb2 {
        self.nodes[id as usize].aabb
    }

    /// Payload stored with a proxy.
    #[must_use]
    pub fn data(&self, id: u32) -> u64 {
        self.nodes[id as usize].data
    }

    /// Visit every leaf whose fat AABB overlaps `aabb`. The callback returns
    /// false to stop early.
    pub fn query<F>(&self, aabb: &Aabb2, mut callback: F)
    where
        F: FnMut(u32) -> bool,
    {
        let mut stack: Vec<u32> = Vec::with_capacity(64);
        if self.root != NULL_NODE {
            stack.push(self.root);
        }
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            if !node.aabb.intersects(aabb) {
                continue;
            }
            if node.is_leaf() {
                if !callback(id) {
                    return;
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Cast a ray through the tree. For each candidate leaf the callback
    /// receives the current clipped input and the proxy id, and returns the
    /// new max fraction: zero terminates, a smaller value clips the ray, the
    /// unchanged value continues.
    pub fn ray_cast<F>(&self, input: &RayCastInput, mut callback: F)
    where
        F: FnMut(&RayCastInput, u32) -> Fix64,
    {
        let p1 = input.p1;
        let d = input.p2 - input.p1;
        if d.length_squared().is_zero() {
            return;
        }
        // Separating axis perpendicular to the segment.
        let v = d.perp();
        let abs_v = Vec2Fix::new(v.x.abs(), v.y.abs());

        let mut max_fraction = input.max_fraction;
        let mut t = p1 + d * max_fraction;
        let mut seg_aabb = Aabb2::new(p1.min(t), p1.max(t));

        let mut stack: Vec<u32> = Vec::with_capacity(64);
        if self.root != NULL_NODE {
            stack.push(self.root);
        }
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            if !node.aabb.intersects(&seg_aabb) {
                continue;
            }

            // |dot(v, p1 - c)| > dot(|v|, h) means the segment misses the box
            let c = node.aabb.center();
            let h = (node.aabb.max - node.aabb.min) * Fix64::HALF;
            let separation = v.dot(p1 - c).abs() - abs_v.dot(h);
            if separation > Fix64::ZERO {
                continue;
            }

            if node.is_leaf() {
                let sub_input = RayCastInput {
                    p1: input.p1,
                    p2: input.p2,
                    max_fraction,
                };
                let value = callback(&sub_input, id);
                if value.is_zero() {
                    return;
                }
                if value > Fix64::ZERO && value < max_fraction {
                    max_fraction = value;
                    t = p1 + d * max_fraction;
                    seg_aabb = Aabb2::new(p1.min(t), p1.max(t));
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    // ------------------------------------------------------------------
    // Node pool
    // ------------------------------------------------------------------

    fn alloc_node(&mut self) -> u32 {
        if self.free_list == NULL_NODE {
            let id = self.nodes.len() as u32;
            self.nodes.push(TreeNode {
                aabb: Aabb2::default(),
                data: 0,
                parent: NULL_NODE,
                child1: NULL_NODE,
                child2: NULL_NODE,
                height: -1,
            });
            id
        } else {
            let id = self.free_list;
            self.free_list = self.nodes[id as usize].parent;
            let node = &mut self.nodes[id as usize];
            node.parent = NULL_NODE;
            node.child1 = NULL_NODE;
            node.child2 = NULL_NODE;
            node.height = -1;
            node.data = 0;
            id
        }
    }

    fn free_node(&mut self, id: u32) {
        self.nodes[id as usize].parent = self.free_list;
        self.nodes[id as usize].height = -1;
        self.free_list = id;
    }

    // ------------------------------------------------------------------
    // Leaf insertion / removal
    // ------------------------------------------------------------------

    fn insert_leaf(&mut self, leaf: u32) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf as usize].parent = NULL_NODE;
            return;
        }

        // Walk down to the cheapest sibling by perimeter cost.
        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let mut index = self.root;
        while !self.nodes[index as usize].is_leaf() {
            let child1 = self.nodes[index as usize].child1;
            let child2 = self.nodes[index as usize].child2;

            let area = self.nodes[index as usize].aabb.perimeter();
            let combined = self.nodes[index as usize].aabb.union(&leaf_aabb);
            let combined_area = combined.perimeter();

            // Cost of making a new parent for this node and the leaf
            let cost = combined_area.double();
            // Minimum cost of pushing the leaf further down the tree
            let inheritance = (combined_area - area).double();

            let cost1 = self.descend_cost(child1, &leaf_aabb) + inheritance;
            let cost2 = self.descend_cost(child2, &leaf_aabb) + inheritance;

            if cost < cost1 && cost < cost2 {
                break;
            }
            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;

        // Splice a new parent above the sibling.
        let old_parent = self.nodes[sibling as usize].parent;
        let new_parent = self.alloc_node();
        {
            let sibling_aabb = self.nodes[sibling as usize].aabb;
            let sibling_height = self.nodes[sibling as usize].height;
            let node = &mut self.nodes[new_parent as usize];
            node.parent = old_parent;
            node.aabb = leaf_aabb.union(&sibling_aabb);
            node.height = sibling_height + 1;
        }

        if old_parent != NULL_NODE {
            if self.nodes[old_parent as usize].child1 == sibling {
                self.nodes[old_parent as usize].child1 = new_parent;
            } else {
                self.nodes[old_parent as usize].child2 = new_parent;
            }
        } else {
            self.root = new_parent;
        }
        self.nodes[new_parent as usize].child1 = sibling;
        self.nodes[new_parent as usize].child2 = leaf;
        self.nodes[sibling as usize].parent = new_parent;
        self.nodes[leaf as usize].parent = new_parent;

        self.fix_upwards(new_parent);
    }

    fn descend_cost(&self, child: u32, leaf_aabb: &Aabb2) -> Fix64 {
        let child_aabb = self.nodes[child as usize].aabb;
        let combined = child_aabb.union(leaf_aabb);
        if self.nodes[child as usize].is_leaf() {
            combined.perimeter()
        } else {
            combined.perimeter() - child_aabb.perimeter()
        }
    }

    fn remove_leaf(&mut self, leaf: u32) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf as usize].parent;
        let grand_parent = self.nodes[parent as usize].parent;
        let sibling = if self.nodes[parent as usize].child1 == leaf {
            self.nodes[parent as usize].child2
        } else {
            self.nodes[parent as usize].child1
        };

        if grand_parent != NULL_NODE {
            if self.nodes[grand_parent as usize].child1 == parent {
                self.nodes[grand_parent as usize].child1 = sibling;
            } else {
                self.nodes[grand_parent as usize].child2 = sibling;
            }
            self.nodes[sibling as usize].parent = grand_parent;
            self.free_node(parent);
            self.fix_upwards(grand_parent);
        } else {
            self.root = sibling;
            self.nodes[sibling as usize].parent = NULL_NODE;
            self.free_node(parent);
        }
    }

    /// Re-balance and refresh AABBs/heights from `start` up to the root.
    fn fix_upwards(&mut self, start: u32) {
        let mut index = start;
        while index != NULL_NODE {
            index = self.balance(index);

            let child1 = self.nodes[index as usize].child1;
            let child2 = self.nodes[index as usize].child2;
            let h1 = self.nodes[child1 as usize].height;
            let h2 = self.nodes[child2 as usize].height;
            let aabb = self.nodes[child1 as usize]
                .aabb
                .union(&self.nodes[child2 as usize].aabb);

            let node = &mut self.nodes[index as usize];
            node.height = 1 + h1.max(h2);
            node.aabb = aabb;

            index = self.nodes[index as usize].parent;
        }
    }

    // ------------------------------------------------------------------
    // AVL balancing
    // ------------------------------------------------------------------

    /// Rotate subtree `a` if its children differ in height by more than one.
    /// Returns the new subtree root.
    fn balance(&mut self, a: u32) -> u32 {
        if self.nodes[a as usize].is_leaf() || self.nodes[a as usize].height < 2 {
            return a;
        }

        let b = self.nodes[a as usize].child1;
        let c = self.nodes[a as usize].child2;
        let balance = self.nodes[c as usize].height - self.nodes[b as usize].height;

        if balance > 1 {
            self.rotate_up(a, c, b)
        } else if balance < -1 {
            self.rotate_up(a, b, c)
        } else {
            a
        }
    }

    /// Promote heavy child `heavy` above `a`; `light` is the other child.
    fn rotate_up(&mut self, a: u32, heavy: u32, light: u32) -> u32 {
        let f = self.nodes[heavy as usize].child1;
        let g = self.nodes[heavy as usize].child2;

        // heavy takes a's place
        self.nodes[heavy as usize].child1 = a;
        self.nodes[heavy as usize].parent = self.nodes[a as usize].parent;
        self.nodes[a as usize].parent = heavy;

        let heavy_parent = self.nodes[heavy as usize].parent;
        if heavy_parent != NULL_NODE {
            if self.nodes[heavy_parent as usize].child1 == a {
                self.nodes[heavy_parent as usize].child1 = heavy;
            } else {
                self.nodes[heavy_parent as usize].child2 = heavy;
            }
        } else {
            self.root = heavy;
        }

        // The taller grandchild stays under heavy, the other joins a.
        let (keep, give) = if self.nodes[f as usize].height > self.nodes[g as usize].height {
            (f, g)
        } else {
            (g, f)
        };
        self.nodes[heavy as usize].child2 = keep;
        if self.nodes[a as usize].child1 == heavy {
            self.nodes[a as usize].child1 = give;
        } else {
            self.nodes[a as usize].child2 = give;
        }
        self.nodes[give as usize].parent = a;

        // Refresh a, then heavy
        let (l, gv) = (light, give);
        let aabb_a = self.nodes[l as usize].aabb.union(&self.nodes[gv as usize].aabb);
        let h_a = 1 + self.nodes[l as usize]
            .height
            .max(self.nodes[gv as usize].height);
        self.nodes[a as usize].aabb = aabb_a;
        self.nodes[a as usize].height = h_a;

        let aabb_h = self.nodes[a as usize]
            .aabb
            .union(&self.nodes[keep as usize].aabb);
        let h_h = 1 + self.nodes[a as usize]
            .height
            .max(self.nodes[keep as usize].height);
        self.nodes[heavy as usize].aabb = aabb_h;
        self.nodes[heavy as usize].height = h_h;

        heavy
    }
}

// ============================================================================
// BroadPhase — pair stream over the tree
// ============================================================================

/// Broad-phase wrapper: tracks which proxies moved this step and turns them
/// into a deduplicated candidate pair stream once per step.
pub struct BroadPhase {
    tree: AabbTree,
    /// Proxies whose fat AABB changed (or were force-touched) this step.
    moved: Vec<u32>,
    /// Scratch pair buffer, reused across steps.
    pairs: Vec<(u32, u32)>,
}

impl Default for BroadPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadPhase {
    /// Create an empty broad phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: AabbTree::new(),
            moved: Vec::new(),
            pairs: Vec::new(),
        }
    }

    /// Number of live proxies.
    #[must_use]
    pub fn proxy_count(&self) -> usize {
        self.tree.leaf_count()
    }

    /// Register a proxy and schedule it for pair generation.
    pub fn create_proxy(&mut self, tight: &Aabb2, data: u64) -> u32 {
        let id = self.tree.create_proxy(tight, data);
        self.buffer_move(id);
        id
    }

    /// Remove a proxy. Any pending move entry is dropped.
    pub fn destroy_proxy(&mut self, id: u32) {
        self.unbuffer_move(id);
        self.tree.destroy_proxy(id);
    }

    /// Update a proxy's bounds. Buffers the proxy for pair generation only if
    /// the tree actually reinserted it.
    pub fn move_proxy(&mut self, id: u32, tight: &Aabb2, displacement: Vec2Fix) {
        if self.tree.move_proxy(id, tight, displacement) {
            self.buffer_move(id);
        }
    }

    /// Force a pair re-check without a geometric move. Used when filter data
    /// changes so stale skip decisions are revisited.
    pub fn touch_proxy(&mut self, id: u32) {
        self.buffer_move(id);
    }

    /// Payload stored with a proxy.
    #[must_use]
    pub fn data(&self, id: u32) -> u64 {
        self.tree.data(id)
    }

    /// Fat AABB stored for a proxy.
    #[must_use]
    pub fn fat_aabb(&self, id: u32) -> Aabb2 {
        self.tree.fat_aabb(id)
    }

    /// True if two proxies' fat AABBs overlap.
    #[must_use]
    pub fn test_overlap(&self, a: u32, b: u32) -> bool {
        self.tree.fat_aabb(a).intersects(&self.tree.fat_aabb(b))
    }

    /// Drain the moved buffer into a deduplicated pair stream. The callback
    /// receives the payloads of both proxies, smaller proxy id first.
    pub fn update_pairs<F>(&mut self, mut callback: F)
    where
        F: FnMut(u64, u64),
    {
        self.pairs.clear();

        for i in 0..self.moved.len() {
            let query_id = self.moved[i];
            if query_id == NULL_NODE {
                continue;
            }
            let fat = self.tree.fat_aabb(query_id);
            let pairs = &mut self.pairs;
            self.tree.query(&fat, |other| {
                if other != query_id {
                    let (lo, hi) = if other < query_id {
                        (other, query_id)
                    } else {
                        (query_id, other)
                    };
                    pairs.push((lo, hi));
                }
                true
            });
        }
        self.moved.clear();

        self.pairs.sort_unstable();
        self.pairs.dedup();

        for &(a, b) in &self.pairs {
            callback(self.tree.data(a), self.tree.data(b));
        }
    }

    /// Pairs emitted by the most recent [`Self::update_pairs`] pass.
    #[must_use]
    pub fn last_pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Query all proxies overlapping an AABB.
    pub fn query<F>(&self, aabb: &Aabb2, callback: F)
    where
        F: FnMut(u32) -> bool,
    {
        self.tree.query(aabb, callback);
    }

    /// Cast a ray through the proxies. See [`AabbTree::ray_cast`].
    pub fn ray_cast<F>(&self, input: &RayCastInput, callback: F)
    where
        F: FnMut(&RayCastInput, u32) -> Fix64,
    {
        self.tree.ray_cast(input, callback);
    }

    fn buffer_move(&mut self, id: u32) {
        self.moved.push(id);
    }

    fn unbuffer_move(&mut self, id: u32) {
        for entry in &mut self.moved {
            if *entry == id {
                *entry = NULL_NODE;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn aabb(x0: i64, y0: i64, x1: i64, y1: i64) -> Aabb2 {
        Aabb2::new(Vec2Fix::from_int(x0, y0), Vec2Fix::from_int(x1, y1))
    }

    #[test]
    fn test_create_and_destroy() {
        let mut tree = AabbTree::new();
        let a = tree.create_proxy(&aabb(0, 0, 1, 1), 1);
        let b = tree.create_proxy(&aabb(5, 5, 6, 6), 2);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.data(a), 1);
        assert_eq!(tree.data(b), 2);
        tree.destroy_proxy(a);
        assert_eq!(tree.leaf_count(), 1);
        tree.destroy_proxy(b);
        assert_eq!(tree.leaf_count(), 0);
        assert_eq!(tree.height(), -1);
    }

    #[test]
    fn test_fat_contains_tight() {
        let mut tree = AabbTree::new();
        let tight = aabb(0, 0, 2, 2);
        let id = tree.create_proxy(&tight, 0);
        assert!(tree.fat_aabb(id).contains(&tight));

        // After a large move the invariant must still hold
        let moved_tight = aabb(50, 50, 52, 52);
        assert!(tree.move_proxy(id, &moved_tight, Vec2Fix::from_int(3, 0)));
        assert!(tree.fat_aabb(id).contains(&moved_tight));
    }

    #[test]
    fn test_small_move_is_noop() {
        let mut tree = AabbTree::new();
        let id = tree.create_proxy(&aabb(0, 0, 2, 2), 0);
        // Nudge well inside the fat margin
        let nudged = Aabb2::new(
            Vec2Fix::new(Fix64::from_ratio(1, 100), Fix64::ZERO),
            Vec2Fix::new(Fix64::TWO, Fix64::TWO),
        );
        assert!(!tree.move_proxy(id, &nudged, Vec2Fix::ZERO));
    }

    #[test]
    fn test_query_finds_overlaps() {
        let mut tree = AabbTree::new();
        for i in 0..16 {
            tree.create_proxy(&aabb(i * 3, 0, i * 3 + 1, 1), i as u64);
        }
        let mut found = alloc::vec::Vec::new();
        tree.query(&aabb(0, 0, 7, 1), |id| {
            found.push(tree.data(id));
            true
        });
        found.sort_unstable();
        // Proxies 0 (0..1), 1 (3..4), 2 (6..7) overlap once fattened
        assert!(found.contains(&0));
        assert!(found.contains(&1));
        assert!(found.contains(&2));
    }

    #[test]
    fn test_tree_stays_balanced() {
        let mut tree = AabbTree::new();
        for i in 0..256 {
            tree.create_proxy(&aabb(i, i, i + 1, i + 1), i as u64);
        }
        // A degenerate linked-list tree would have height 255
        assert!(tree.height() < 32, "height = {}", tree.height());
    }

    #[test]
    fn test_update_pairs_dedup() {
        let mut bp = BroadPhase::new();
        let _a = bp.create_proxy(&aabb(0, 0, 2, 2), 10);
        let _b = bp.create_proxy(&aabb(1, 1, 3, 3), 20);
        let _c = bp.create_proxy(&aabb(100, 100, 101, 101), 30);

        let mut pairs = alloc::vec::Vec::new();
        bp.update_pairs(|x, y| pairs.push((x, y)));
        // Both a and b moved, but the symmetric pair must appear once
        assert_eq!(pairs, alloc::vec![(10, 20)]);

        // No motion, no pairs
        pairs.clear();
        bp.update_pairs(|x, y| pairs.push((x, y)));
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_touch_proxy_reemits_pair() {
        let mut bp = BroadPhase::new();
        let a = bp.create_proxy(&aabb(0, 0, 2, 2), 10);
        let _b = bp.create_proxy(&aabb(1, 1, 3, 3), 20);
        let mut pairs = alloc::vec::Vec::new();
        bp.update_pairs(|x, y| pairs.push((x, y)));
        pairs.clear();

        bp.touch_proxy(a);
        bp.update_pairs(|x, y| pairs.push((x, y)));
        assert_eq!(pairs, alloc::vec![(10, 20)]);
    }

    #[test]
    fn test_destroyed_proxy_dropped_from_moved() {
        let mut bp = BroadPhase::new();
        let a = bp.create_proxy(&aabb(0, 0, 2, 2), 10);
        let _b = bp.create_proxy(&aabb(1, 1, 3, 3), 20);
        bp.destroy_proxy(a);
        let mut pairs = alloc::vec::Vec::new();
        bp.update_pairs(|x, y| pairs.push((x, y)));
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_ray_cast_visits_hit_proxy() {
        let mut bp = BroadPhase::new();
        let a = bp.create_proxy(&aabb(5, -1, 6, 1), 42);
        let _far = bp.create_proxy(&aabb(5, 50, 6, 52), 7);

        let input = RayCastInput {
            p1: Vec2Fix::from_int(0, 0),
            p2: Vec2Fix::from_int(10, 0),
            max_fraction: Fix64::ONE,
        };
        let mut visited = alloc::vec::Vec::new();
        bp.ray_cast(&input, |sub, id| {
            visited.push(bp.data(id));
            sub.max_fraction
        });
        assert_eq!(visited, alloc::vec![bp.data(a)]);
    }

    #[test]
    fn test_no_pair_missed_after_moves() {
        // Shuffle proxies around, then verify a full self-query agrees with
        // brute-force tight overlap checks.
        let mut tree = AabbTree::new();
        let mut tights = alloc::vec::Vec::new();
        let mut ids = alloc::vec::Vec::new();
        for i in 0..12i64 {
            let t = aabb(i * 2, 0, i * 2 + 3, 2);
            ids.push(tree.create_proxy(&t, i as u64));
            tights.push(t);
        }
        for (k, &id) in ids.iter().enumerate() {
            let t = aabb(k as i64, k as i64, k as i64 + 3, k as i64 + 2);
            tree.move_proxy(id, &t, Vec2Fix::from_int(1, 1));
            tights[k] = t;
        }

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                if tights[i].intersects(&tights[j]) {
                    let mut seen = false;
                    tree.query(&tree.fat_aabb(ids[i]), |id| {
                        if id == ids[j] {
                            seen = true;
                        }
                        true
                    });
                    assert!(seen, "pair ({i},{j}) missed");
                }
            }
        }
    }
}

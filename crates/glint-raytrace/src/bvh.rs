//! Bounding volume hierarchy with binned SAH construction.

use crate::{BBox, Primitive, Ray, Trace};

const N_BINS: usize = 16;

/// One BVH node. Leaves are encoded as `l == r`; children of internal
/// nodes are indices into the tree's node array.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    /// Bounds of every primitive under this node.
    pub bbox: BBox,
    /// First primitive index covered by this node.
    pub start: usize,
    /// Number of primitives covered.
    pub count: usize,
    /// Left child index (0 = none).
    pub l: usize,
    /// Right child index (0 = none).
    pub r: usize,
}

impl Node {
    /// Leaves hold primitives directly instead of children.
    pub fn is_leaf(&self) -> bool {
        self.l == self.r
    }
}

/// A BVH over any [`Primitive`] type.
///
/// The tree owns its primitives, reordered during the build so every
/// leaf covers a contiguous slice. Nodes live in one flat array with
/// index handles. Nothing is mutated after `build`, so `hit` may run
/// concurrently with per-thread rays.
#[derive(Debug, Clone)]
pub struct Bvh<P> {
    nodes: Vec<Node>,
    primitives: Vec<P>,
    root: usize,
}

impl<P: Primitive> Bvh<P> {
    /// Build over `primitives`, stopping subdivision at
    /// `max_leaf_size` primitives per leaf.
    ///
    /// Splits are chosen by the surface area heuristic: primitive
    /// centroids are binned along each axis and the cheapest
    /// `area * count` partition across all axes wins. An empty input
    /// yields an empty tree whose `hit` is a constant miss.
    pub fn build(primitives: Vec<P>, max_leaf_size: usize) -> Self {
        let mut bvh = Self {
            nodes: Vec::new(),
            primitives,
            root: 0,
        };
        if bvh.primitives.is_empty() {
            return bvh;
        }
        let mut bb = BBox::empty();
        for p in &bvh.primitives {
            bb.enclose_box(&p.bbox());
        }
        let count = bvh.primitives.len();
        bvh.root = bvh.new_node(bb, 0, count);
        bvh.build_subtree(bvh.root, max_leaf_size.max(1));
        bvh
    }

    /// Closest hit along `ray`, tightening its interval as hits land.
    pub fn hit(&self, ray: &mut Ray) -> Trace {
        let mut closest = Trace::miss(ray.origin);
        if self.nodes.is_empty() {
            return closest;
        }
        let mut times = ray.dist_bounds;
        if self.nodes[self.root].bbox.hit(ray, &mut times) {
            self.hit_subtree(self.root, ray, &mut closest);
        }
        closest
    }

    /// Bounds of the whole tree.
    pub fn bbox(&self) -> BBox {
        if self.nodes.is_empty() {
            BBox::empty()
        } else {
            self.nodes[self.root].bbox
        }
    }

    /// Number of primitives stored.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Whether the tree holds no primitives.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Tear the tree down and hand the primitives back (build order is
    /// not preserved).
    pub fn destructure(mut self) -> Vec<P> {
        self.nodes.clear();
        self.primitives
    }

    /// Drop the tree and its primitives in place.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.primitives.clear();
        self.root = 0;
    }

    fn new_node(&mut self, bbox: BBox, start: usize, count: usize) -> usize {
        self.nodes.push(Node {
            bbox,
            start,
            count,
            l: 0,
            r: 0,
        });
        self.nodes.len() - 1
    }

    fn build_subtree(&mut self, idx: usize, max_leaf_size: usize) {
        let node = self.nodes[idx];
        if node.count <= max_leaf_size {
            return;
        }

        // Best split over all axes: bin centroids, sweep prefix/suffix
        // boxes and counts, price each of the N_BINS - 1 cuts.
        let mut best: Option<(usize, usize, f64, BBox, BBox)> = None;
        for axis in 0..3 {
            let lo = node.bbox.min[axis];
            let extent = node.bbox.max[axis] - lo;
            if !(extent > 0.0) {
                continue;
            }
            let mut counts = [0usize; N_BINS];
            let mut boxes = [BBox::empty(); N_BINS];
            for p in &self.primitives[node.start..node.start + node.count] {
                let pb = p.bbox();
                let bin = bin_of(&pb, axis, lo, extent);
                counts[bin] += 1;
                boxes[bin].enclose_box(&pb);
            }

            let mut left_box = [BBox::empty(); N_BINS + 1];
            let mut left_sum = [0usize; N_BINS + 1];
            let mut right_box = [BBox::empty(); N_BINS + 1];
            let mut right_sum = [0usize; N_BINS + 1];
            for i in 0..N_BINS {
                left_box[i + 1] = left_box[i];
                left_box[i + 1].enclose_box(&boxes[i]);
                left_sum[i + 1] = left_sum[i] + counts[i];
                right_box[i + 1] = right_box[i];
                right_box[i + 1].enclose_box(&boxes[N_BINS - 1 - i]);
                right_sum[i + 1] = right_sum[i] + counts[N_BINS - 1 - i];
            }

            for split in 1..N_BINS {
                let nl = left_sum[split];
                let nr = right_sum[N_BINS - split];
                if nl == 0 || nr == 0 {
                    continue;
                }
                let cost = left_box[split].surface_area() * nl as f64
                    + right_box[N_BINS - split].surface_area() * nr as f64;
                if best.map_or(true, |b| cost < b.2) {
                    best = Some((
                        axis,
                        split,
                        cost,
                        left_box[split],
                        right_box[N_BINS - split],
                    ));
                }
            }
        }
        // Every centroid in one bin (or a degenerate box): stay a leaf.
        let Some((axis, split, _, left_bb, right_bb)) = best else {
            return;
        };

        let lo = node.bbox.min[axis];
        let extent = node.bbox.max[axis] - lo;
        let seg = &mut self.primitives[node.start..node.start + node.count];
        seg.sort_by_key(|p| bin_of(&p.bbox(), axis, lo, extent) >= split);
        let nl = seg
            .iter()
            .position(|p| bin_of(&p.bbox(), axis, lo, extent) >= split)
            .unwrap_or(node.count);
        if nl == 0 || nl == node.count {
            return;
        }

        let l = self.new_node(left_bb, node.start, nl);
        let r = self.new_node(right_bb, node.start + nl, node.count - nl);
        self.nodes[idx].l = l;
        self.nodes[idx].r = r;
        self.build_subtree(l, max_leaf_size);
        self.build_subtree(r, max_leaf_size);
    }

    fn hit_subtree(&self, idx: usize, ray: &mut Ray, closest: &mut Trace) {
        let node = self.nodes[idx];
        if node.is_leaf() {
            for p in &self.primitives[node.start..node.start + node.count] {
                let t = p.hit(ray);
                *closest = Trace::min(*closest, t);
            }
            return;
        }

        // Test both children against the current interval, drop any
        // whose entry already lies past the closest hit, and descend
        // near-first: a hit in the near subtree can prune the far one.
        let mut tl = ray.dist_bounds;
        let mut tr = ray.dist_bounds;
        let hit_l = self.nodes[node.l].bbox.hit(ray, &mut tl)
            && (!closest.hit || tl.0 < closest.distance);
        let hit_r = self.nodes[node.r].bbox.hit(ray, &mut tr)
            && (!closest.hit || tr.0 < closest.distance);
        match (hit_l, hit_r) {
            (false, false) => {}
            (true, false) => self.hit_subtree(node.l, ray, closest),
            (false, true) => self.hit_subtree(node.r, ray, closest),
            (true, true) => {
                let (near, far, far_entry) = if tl.0 <= tr.0 {
                    (node.l, node.r, tr.0)
                } else {
                    (node.r, node.l, tl.0)
                };
                self.hit_subtree(near, ray, closest);
                if !closest.hit || far_entry < closest.distance {
                    self.hit_subtree(far, ray, closest);
                }
            }
        }
    }
}

fn bin_of(b: &BBox, axis: usize, lo: f64, extent: f64) -> usize {
    let c = (b.min[axis] + b.max[axis]) * 0.5;
    let bin = ((c - lo) / extent * N_BINS as f64) as usize;
    bin.min(N_BINS - 1)
}

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::geom::{BBox, Point3, Vec3};

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bbox: BBox,
    left: u32,
    right: u32,
    start: u32,
    count: u32,
}

impl BvhNode {
    const fn leaf(bbox: BBox, start: u32, count: u32) -> Self {
        Self {
            bbox,
            left: u32::MAX,
            right: u32::MAX,
            start,
            count,
        }
    }

    const fn inner(bbox: BBox, left: u32, right: u32) -> Self {
        Self {
            bbox,
            left,
            right,
            start: 0,
            count: 0,
        }
    }

    const fn is_leaf(self) -> bool {
        self.count != 0
    }
}

/// Bounding volume hierarchy over triangle boxes, split at the median
/// centroid of the widest axis.
#[derive(Debug, Clone)]
pub(crate) struct Bvh {
    nodes: Vec<BvhNode>,
    prim_indices: Vec<u32>,
    prim_boxes: Vec<BBox>,
}

impl Bvh {
    const LEAF_SIZE: usize = 8;

    pub(crate) fn build(bboxes: &[BBox]) -> Option<Self> {
        Self::build_with_leaf_size(bboxes, Self::LEAF_SIZE)
    }

    pub(crate) fn build_with_leaf_size(bboxes: &[BBox], leaf_size: usize) -> Option<Self> {
        if bboxes.is_empty() {
            return None;
        }
        let count = u32::try_from(bboxes.len()).ok()?;

        let leaf_size = leaf_size.clamp(1, 256);
        let mut bvh = Self {
            nodes: Vec::with_capacity(bboxes.len().saturating_mul(2)),
            prim_indices: (0..count).collect(),
            prim_boxes: bboxes.to_vec(),
        };
        bvh.build_node(bboxes, 0, bboxes.len(), leaf_size);
        Some(bvh)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn build_node(&mut self, bboxes: &[BBox], start: usize, end: usize, leaf_size: usize) -> u32 {
        let node_index = self.nodes.len() as u32;
        let bbox = self.range_bbox(bboxes, start, end);
        self.nodes.push(BvhNode::leaf(bbox, 0, 0));

        let count = end - start;
        if count <= leaf_size {
            self.nodes[node_index as usize] = BvhNode::leaf(bbox, start as u32, count as u32);
            return node_index;
        }

        let axis = self.choose_split_axis(bboxes, start, end);
        let mid = start + count / 2;
        self.prim_indices[start..end].select_nth_unstable_by(mid - start, |a, b| {
            let ca = centroid_component(bboxes[*a as usize], axis);
            let cb = centroid_component(bboxes[*b as usize], axis);
            ca.total_cmp(&cb)
        });

        let left = self.build_node(bboxes, start, mid, leaf_size);
        let right = self.build_node(bboxes, mid, end, leaf_size);
        self.nodes[node_index as usize] = BvhNode::inner(bbox, left, right);
        node_index
    }

    fn range_bbox(&self, bboxes: &[BBox], start: usize, end: usize) -> BBox {
        self.prim_indices[start + 1..end]
            .iter()
            .fold(bboxes[self.prim_indices[start] as usize], |acc, &idx| {
                acc.union(bboxes[idx as usize])
            })
    }

    fn choose_split_axis(&self, bboxes: &[BBox], start: usize, end: usize) -> u8 {
        let centers: Vec<Point3> = self.prim_indices[start..end]
            .iter()
            .map(|&idx| bboxes[idx as usize].center())
            .collect();
        let Some(extent) = BBox::from_points(&centers) else {
            return 0;
        };

        let ex = extent.max.x - extent.min.x;
        let ey = extent.max.y - extent.min.y;
        let ez = extent.max.z - extent.min.z;
        if ex >= ey && ex >= ez {
            0
        } else if ey >= ez {
            1
        } else {
            2
        }
    }

    /// Visit every primitive whose box is crossed by the line
    /// `origin + t·dir` for `t` in `[t_min, t_max]`. The range may be
    /// negative, so one query covers both directions. Returning `false`
    /// from `visit` stops the traversal.
    pub(crate) fn query_line<F>(&self, origin: Point3, dir: Vec3, t_min: f64, t_max: f64, mut visit: F)
    where
        F: FnMut(usize) -> bool,
    {
        let mut stack = vec![0u32];
        while let Some(node_idx) = stack.pop() {
            let node = self.nodes[node_idx as usize];
            if !line_intersects_bbox(origin, dir, node.bbox, t_min, t_max) {
                continue;
            }

            if node.is_leaf() {
                let start = node.start as usize;
                let end = start + node.count as usize;
                for &prim in &self.prim_indices[start..end] {
                    let prim = prim as usize;
                    if !line_intersects_bbox(origin, dir, self.prim_boxes[prim], t_min, t_max) {
                        continue;
                    }
                    if !visit(prim) {
                        return;
                    }
                }
                continue;
            }

            stack.push(node.left);
            stack.push(node.right);
        }
    }

    /// Best-first search for the primitive closest to `point`.
    ///
    /// `distance_to_prim` returns the squared distance to a primitive.
    /// Nodes farther than the best candidate so far are pruned.
    pub(crate) fn nearest<F>(&self, point: Point3, mut distance_to_prim: F) -> Option<(usize, f64)>
    where
        F: FnMut(usize) -> Option<f64>,
    {
        let mut best_dist2 = f64::INFINITY;
        let mut best_prim: Option<usize> = None;

        let mut heap = BinaryHeap::new();
        heap.push(HeapEntry {
            dist2: self.nodes[0].bbox.distance_squared_to_point(point),
            node: 0u32,
        });

        while let Some(entry) = heap.pop() {
            if entry.dist2 > best_dist2 {
                break;
            }

            let node = self.nodes[entry.node as usize];
            if node.is_leaf() {
                let start = node.start as usize;
                let end = start + node.count as usize;
                for &prim in &self.prim_indices[start..end] {
                    let prim_idx = prim as usize;
                    let Some(d2) = distance_to_prim(prim_idx).filter(|d| d.is_finite()) else {
                        continue;
                    };
                    if d2 < best_dist2 {
                        best_dist2 = d2;
                        best_prim = Some(prim_idx);
                    }
                }
                continue;
            }

            for child in [node.left, node.right] {
                let dist2 = self.nodes[child as usize].bbox.distance_squared_to_point(point);
                if dist2 <= best_dist2 {
                    heap.push(HeapEntry { dist2, node: child });
                }
            }
        }

        best_prim.map(|idx| (idx, best_dist2))
    }
}

fn centroid_component(bbox: BBox, axis: u8) -> f64 {
    let c = bbox.center();
    match axis {
        0 => c.x,
        1 => c.y,
        _ => c.z,
    }
}

/// Slab test. Boxes are padded slightly so flat (zero-thickness) boxes of
/// axis-aligned triangles still register hits.
fn line_intersects_bbox(origin: Point3, dir: Vec3, bbox: BBox, t_min: f64, t_max: f64) -> bool {
    const PAD: f64 = 1e-9;
    let mut tmin = t_min;
    let mut tmax = t_max;

    for (o, d, min, max) in [
        (origin.x, dir.x, bbox.min.x - PAD, bbox.max.x + PAD),
        (origin.y, dir.y, bbox.min.y - PAD, bbox.max.y + PAD),
        (origin.z, dir.z, bbox.min.z - PAD, bbox.max.z + PAD),
    ] {
        if !o.is_finite() || !d.is_finite() {
            return false;
        }

        if d.abs() <= 1e-15 {
            if o < min || o > max {
                return false;
            }
            continue;
        }

        let inv_d = 1.0 / d;
        let mut t0 = (min - o) * inv_d;
        let mut t1 = (max - o) * inv_d;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }

        tmin = tmin.max(t0);
        tmax = tmax.min(t1);
        if tmax < tmin {
            return false;
        }
    }

    true
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    dist2: f64,
    node: u32,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the smallest distance first.
        other
            .dist2
            .total_cmp(&self.dist2)
            .then_with(|| self.node.cmp(&other.node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(x: f64) -> BBox {
        BBox::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))
    }

    #[test]
    fn empty_input_builds_nothing() {
        assert!(Bvh::build(&[]).is_none());
    }

    #[test]
    fn line_query_reaches_boxes_behind_origin() {
        let boxes: Vec<BBox> = (0..20).map(|i| unit_box_at(f64::from(i) * 2.0)).collect();
        let bvh = Bvh::build_with_leaf_size(&boxes, 2).unwrap();

        let mut hits = Vec::new();
        bvh.query_line(
            Point3::new(10.5, 0.5, 0.5),
            Vec3::new(0.0, 0.0, 1.0),
            f64::NEG_INFINITY,
            f64::INFINITY,
            |prim| {
                hits.push(prim);
                true
            },
        );
        // Box 6 shares the leaf with box 5 but is not on the line.
        assert_eq!(hits, vec![5]);

        let mut along_x = 0;
        bvh.query_line(Point3::new(10.5, 0.5, 0.5), Vec3::X, -100.0, 100.0, |_| {
            along_x += 1;
            true
        });
        assert_eq!(along_x, 20);
    }

    #[test]
    fn nearest_matches_brute_force() {
        let boxes: Vec<BBox> = (0..50).map(|i| unit_box_at(f64::from(i) * 3.0)).collect();
        let bvh = Bvh::build(&boxes).unwrap();
        let query = Point3::new(61.0, 5.0, 0.0);

        let (idx, d2) = bvh
            .nearest(query, |prim| Some(boxes[prim].distance_squared_to_point(query)))
            .unwrap();
        let brute = boxes
            .iter()
            .map(|b| b.distance_squared_to_point(query))
            .fold(f64::INFINITY, f64::min);
        assert!((d2 - brute).abs() < 1e-12);
        assert_eq!(idx, 20);
    }
}

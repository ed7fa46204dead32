// Cycle refinement: inward shift by half edge widths, acute corner
// chamfering, near-node merging and winding re-sort.

use std::collections::HashMap;

use crate::algorithms::extract::{clockwise_most, counter_clockwise_most};
use crate::geometry::intersect::intersect_with_margin;
use crate::geometry::math::{angle_between_deg, left_perpendicular};
use crate::geometry::tolerance::{approx_eq, EPS_PARALLEL};
use crate::model::{EdgeId, NodeId, Vec3};
use crate::primitive::{Primitive, PrimitiveKind};
use crate::Graph;

/// Corners closing tighter than this get chamfered.
const CUT_ANGLE_DEG: f32 = 45.0;
/// Half of the face width a chamfer cut should open up.
const CHAMFER_HALF_WIDTH: f32 = 0.55;
/// Fraction of the adjacent edge a clamped chamfer may consume.
const CHAMFER_CLAMP: f32 = 0.8;
/// Merge radius for the optional post-cut node merge.
const NICE_COMBINE_RANGE: f32 = 0.5;
/// Merge passes are bounded; each pass shrinks the node count.
pub(crate) const COMBINE_MAX_PASSES: usize = 100;

impl Primitive {
    /// Refine the raw polygon: relabel into a fresh copy, shift the
    /// boundary inward by half edge widths, optionally chamfer acute
    /// corners and merge nodes that ended up close, then recompute
    /// bounds, winding order and validity. Runs once; later calls are
    /// no-ops.
    pub fn process(&mut self, make_nice: bool) {
        if self.processed {
            return;
        }
        self.processed = true;

        let (copy, _) = self.graph.copy_relabeled();
        self.graph = copy;

        self.shift_nodes();

        if make_nice {
            self.cut_acute_angles();
            combine_nodes_within(&mut self.graph, NICE_COMBINE_RANGE);
        }

        self.calculate_bounds();
        self.sort_winding();

        self.sub = Graph::new();
        self.targets.clear();

        self.evaluate();
    }

    /// Move every degree-2 boundary node to the intersection of its two
    /// edges' parallel offsets (half the edge width, toward the
    /// interior). Anti-parallel neighbors fall back to a plain
    /// averaged-width shift along the previous edge's left normal.
    /// Also accumulates the polygon centroid.
    fn shift_nodes(&mut self) {
        if self.kind != PrimitiveKind::MinimalCycle {
            return;
        }
        let n = self.graph.nodes.len();
        if n == 0 {
            return;
        }

        let mut centroid = Vec3::ZERO;
        let mut shifted: HashMap<NodeId, Vec3> = HashMap::new();

        for i in 0..n {
            let (nid, npos, deg2) = {
                let node = &self.graph.nodes[i];
                (node.id, node.pos, node.adjacents.len() == 2)
            };
            centroid = centroid + npos;
            if !deg2 {
                continue;
            }
            let prev_id = self.graph.nodes[(i + n - 1) % n].id;
            let next_id = self.graph.nodes[(i + 1) % n].id;
            let (Some(prev_pos), Some(next_pos)) =
                (self.graph.node_pos(prev_id), self.graph.node_pos(next_id))
            else {
                continue;
            };

            let dir_to_prev = (prev_pos - npos).normalized();
            let dir_to_next = (next_pos - npos).normalized();

            let Some(prev_edge) = self.graph.find_edge_between(nid, prev_id) else { continue };
            let Some(next_edge) = self.graph.find_edge_between(nid, next_id) else { continue };
            let (prev_w, prev_other_id) = (prev_edge.width, prev_edge.other(nid));
            let (next_w, next_other_id) = (next_edge.width, next_edge.other(nid));
            let (Some(prev_other), Some(next_other)) = (
                prev_other_id.and_then(|id| self.graph.node_pos(id)),
                next_other_id.and_then(|id| self.graph.node_pos(id)),
            ) else {
                continue;
            };

            let prev_left = left_perpendicular(prev_other, npos);
            let next_left = left_perpendicular(npos, next_other);

            let new_pos = if approx_eq(dir_to_next.dot(dir_to_prev), -1.0, EPS_PARALLEL) {
                // straight-through node: plain sideways shift
                let avg_width = (prev_w + next_w) / 2.0;
                npos + prev_left * (avg_width / 2.0)
            } else {
                // offset both edges sideways and stretch them so the
                // offset lines are certain to cross
                let prev_mid = Vec3::midpoint(npos, prev_other) + prev_left * (prev_w / 2.0);
                let prev_len = npos.distance(prev_other);
                let prev_far = prev_mid + dir_to_prev * (prev_len * 2.0);
                let prev_near = prev_mid - dir_to_prev * (prev_len * 2.0);

                let next_mid = Vec3::midpoint(npos, next_other) + next_left * (next_w / 2.0);
                let next_len = npos.distance(next_other);
                let next_far = next_mid + dir_to_next * (next_len * 2.0);
                let next_near = next_mid - dir_to_next * (next_len * 2.0);

                match intersect_with_margin(prev_far, prev_near, next_far, next_near, 0.0) {
                    Some(p) => Vec3::new(p.x, npos.y, p.z),
                    None => npos,
                }
            };
            shifted.insert(nid, new_pos);
        }

        self.centroid = centroid / n as f32;

        for node in &mut self.graph.nodes {
            if let Some(&p) = shifted.get(&node.id) {
                node.pos = p;
            }
        }
    }

    /// Chamfer every corner tighter than 45 degrees: the corner node is
    /// replaced by two nodes pushed back along both edges, joined by a
    /// widthless cut edge. The push distance opens the cut face to the
    /// configured width and is clamped against short edges.
    pub fn cut_acute_angles(&mut self) {
        if self.kind != PrimitiveKind::MinimalCycle {
            return;
        }

        struct Cut {
            node: NodeId,
            prev_edge: EdgeId,
            next_edge: EdgeId,
            to_prev: Vec3,
            to_next: Vec3,
        }
        let mut cuts: Vec<Cut> = Vec::new();

        for node in &self.graph.nodes {
            if node.adjacents.len() != 2 {
                continue;
            }
            let (Some(prev_pos), Some(next_pos)) = (
                self.graph.node_pos(node.adjacents[0]),
                self.graph.node_pos(node.adjacents[1]),
            ) else {
                continue;
            };
            let dir_to_prev = (prev_pos - node.pos).normalized();
            let dir_to_next = (next_pos - node.pos).normalized();
            let angle = angle_between_deg(dir_to_prev, dir_to_next);
            if angle >= CUT_ANGLE_DEG {
                continue;
            }
            let prev_edge = self
                .graph
                .find_edge_between(node.id, node.adjacents[0])
                .map(|e| e.id);
            let next_edge = self
                .graph
                .find_edge_between(node.id, node.adjacents[1])
                .map(|e| e.id);
            let (Some(prev_edge), Some(next_edge)) = (prev_edge, next_edge) else { continue };

            let mut dist = CHAMFER_HALF_WIDTH / (angle.to_radians() / 2.0).sin();
            let dist_prev = prev_pos.distance(node.pos);
            let dist_next = next_pos.distance(node.pos);
            if dist > dist_prev {
                dist = dist_prev * CHAMFER_CLAMP;
            }
            if dist > dist_next {
                dist = dist_next * CHAMFER_CLAMP;
            }

            cuts.push(Cut {
                node: node.id,
                prev_edge,
                next_edge,
                to_prev: node.pos + dir_to_prev * dist,
                to_next: node.pos + dir_to_next * dist,
            });
        }

        for cut in cuts {
            let np = self.graph.add_node(cut.to_prev);
            let nn = self.graph.add_node(cut.to_next);
            if let Some(e) = self.graph.edge_mut(cut.prev_edge) {
                if e.n1 == cut.node {
                    e.n1 = np;
                }
                if e.n2 == cut.node {
                    e.n2 = np;
                }
            }
            if let Some(e) = self.graph.edge_mut(cut.next_edge) {
                if e.n1 == cut.node {
                    e.n1 = nn;
                }
                if e.n2 == cut.node {
                    e.n2 = nn;
                }
            }
            self.graph.add_edge(nn, np, 0.0);
            self.graph.remove_node(cut.node);
        }

        self.graph.clean_up();
        self.graph.rebuild_adjacency();
    }

    /// Re-sort the node list into one consistent boundary walk starting
    /// at the first node. Nodes the walk cannot reach are stray and get
    /// dropped together with their edges.
    fn sort_winding(&mut self) {
        if self.graph.nodes.is_empty() {
            return;
        }
        self.graph.rebuild_adjacency();
        let start = self.graph.nodes[0].id;
        let mut visited = vec![start];
        let mut prev = start;
        let mut curr = clockwise_most(&self.graph, None, start);
        while let Some(c) = curr {
            if c == start || visited.contains(&c) {
                break;
            }
            visited.push(c);
            let next = counter_clockwise_most(&self.graph, prev, c);
            prev = c;
            curr = next;
        }
        let mut ordered = Vec::with_capacity(visited.len());
        for id in visited {
            if let Some(i) = self.graph.node_index(id) {
                ordered.push(self.graph.nodes[i].clone());
            }
        }
        self.graph.nodes = ordered;
        self.graph.clean_up();
        self.graph.rebuild_adjacency();
    }
}

/// Repeatedly merge any two nodes closer than `range` to their
/// midpoint, until a full pass merges nothing.
pub(crate) fn combine_nodes_within(g: &mut Graph, range: f32) {
    if range <= 0.0 {
        return;
    }
    for _ in 0..COMBINE_MAX_PASSES {
        let mut combined = false;
        let ids: Vec<NodeId> = g.nodes.iter().map(|n| n.id).collect();
        for id in ids {
            let Some(pos) = g.node_pos(id) else { continue };
            let Some(closest) = g.closest_node(pos, Some(id)) else { continue };
            let Some(cpos) = g.node_pos(closest) else { continue };
            if pos.distance(cpos) < range {
                g.combine_nodes(id, closest);
                combined = true;
            }
        }
        if !combined {
            break;
        }
    }
}

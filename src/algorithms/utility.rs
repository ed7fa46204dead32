// Graph maintenance: adjacency rebuild, cleanup, edge split, relabeled
// deep copy, node merge, proximity queries, point-in-polygon and the
// global self-intersection repair.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::geometry::intersect::intersect_with_margin;
use crate::geometry::math::{angle_between_deg, closest_point_on_segment};
use crate::geometry::tolerance::EPS_POS;
use crate::model::{Edge, EdgeId, NodeId, Vec3};
use crate::{Graph, GraphError};

/// Distance along +X past the boundary centroid used as the far end of
/// the point-in-polygon ray.
const RAY_REACH: f32 = 10_000.0;

impl Graph {
    /// Recompute every adjacency list from the edge list. Dangling edge
    /// endpoints are ignored; neighbor order follows edge order.
    pub fn rebuild_adjacency(&mut self) {
        let mut adj: Vec<Vec<NodeId>> = vec![Vec::new(); self.nodes.len()];
        for e in &self.edges {
            let i1 = self.nodes.iter().position(|n| n.id == e.n1);
            let i2 = self.nodes.iter().position(|n| n.id == e.n2);
            let (Some(i1), Some(i2)) = (i1, i2) else { continue };
            if i1 == i2 {
                continue;
            }
            if !adj[i1].contains(&e.n2) {
                adj[i1].push(e.n2);
            }
            if !adj[i2].contains(&e.n1) {
                adj[i2].push(e.n1);
            }
        }
        for (node, list) in self.nodes.iter_mut().zip(adj) {
            node.adjacents = list;
        }
    }

    /// Drop malformed edges in one left-to-right pass: missing endpoint,
    /// self loop, or duplicate unordered pair (first kept). Idempotent.
    pub fn clean_up(&mut self) {
        let ids: HashSet<NodeId> = self.nodes.iter().map(|n| n.id).collect();
        let mut seen: HashSet<(NodeId, NodeId)> = HashSet::new();
        self.edges.retain(|e| {
            if e.n1 == e.n2 || !ids.contains(&e.n1) || !ids.contains(&e.n2) {
                return false;
            }
            let key = if e.n1 < e.n2 { (e.n1, e.n2) } else { (e.n2, e.n1) };
            seen.insert(key)
        });
    }

    /// Split an edge at `point` into two halves carrying the original
    /// width. The split node is `existing` when given, otherwise a fresh
    /// node inserted after the start endpoint in list order. Returns the
    /// node joining the halves.
    pub fn split_edge(
        &mut self,
        edge: EdgeId,
        point: Vec3,
        existing: Option<NodeId>,
    ) -> Option<NodeId> {
        let idx = self.edges.iter().position(|e| e.id == edge)?;
        let Edge { n1, n2, width, .. } = self.edges.remove(idx);
        let mid = match existing {
            Some(id) if self.node(id).is_some() => id,
            _ => self.insert_node_after(n1, point),
        };
        if let Some(n) = self.node_mut(n1) {
            n.adjacents.retain(|&a| a != n2);
        }
        if let Some(n) = self.node_mut(n2) {
            n.adjacents.retain(|&a| a != n1);
        }
        self.add_edge(n1, mid, width);
        self.add_edge(mid, n2, width);
        Some(mid)
    }

    /// Deep copy with fresh ids in the destination's counter space.
    /// The copy is cleaned, its adjacency rebuilt, and when it forms a
    /// closed polygon (three or more nodes in boundary order) each node
    /// gets its interior angle and inward direction. Returns the copy
    /// and the old-to-new id map.
    pub fn copy_relabeled(&self) -> (Graph, HashMap<NodeId, NodeId>) {
        let mut out = Graph::new();
        // start past the source counters so no relabeled id can collide
        // with a source id
        out.next_node = self.next_node;
        out.next_edge = self.next_edge;
        let mut map = HashMap::new();
        for n in &self.nodes {
            let nid = out.add_node(n.pos);
            map.insert(n.id, nid);
        }
        for e in &self.edges {
            if let (Some(&a), Some(&b)) = (map.get(&e.n1), map.get(&e.n2)) {
                out.add_edge(a, b, e.width);
            }
        }
        out.clean_up();
        out.rebuild_adjacency();
        out.compute_interior_angles();
        (out, map)
    }

    /// Interior angle (degrees) and inward unit direction per node,
    /// treating the node list as a closed polygon in boundary order.
    /// Reflex corners resolve to 180 plus the outside remainder.
    pub(crate) fn compute_interior_angles(&mut self) {
        let n = self.nodes.len();
        if n < 3 {
            return;
        }
        let mut computed = Vec::with_capacity(n);
        for i in 0..n {
            let cur = self.nodes[i].pos;
            let prev = self.nodes[(i + n - 1) % n].pos;
            let next = self.nodes[(i + 1) % n].pos;
            let dir_prev = (prev - cur).normalized();
            let dir_next = (next - cur).normalized();
            let ref_right = Vec3::UP.cross(-dir_prev);
            let dir_to_center = (dir_prev + dir_next).normalized();
            if dir_next.dot(ref_right) > 0.0 {
                let outside = angle_between_deg(dir_next, -dir_prev);
                computed.push((180.0 + outside, -dir_to_center));
            } else {
                computed.push((angle_between_deg(dir_prev, dir_next), dir_to_center));
            }
        }
        for (node, (angle, inward)) in self.nodes.iter_mut().zip(computed) {
            node.angle_deg = angle;
            node.dir_to_inside = inward;
        }
    }

    /// Merge `drop` into `keep`, moving `keep` to their midpoint.
    /// A dangling `drop` takes its edges with it; otherwise its edges
    /// are retargeted onto `keep` and cleanup removes any self loops or
    /// duplicates that produced.
    pub fn combine_nodes(&mut self, keep: NodeId, drop: NodeId) {
        if keep == drop {
            return;
        }
        let (Some(kp), Some(dp)) = (self.node_pos(keep), self.node_pos(drop)) else {
            return;
        };
        if let Some(n) = self.node_mut(keep) {
            n.pos = Vec3::midpoint(kp, dp);
        }
        if self.degree(drop) <= 1 {
            self.edges.retain(|e| !e.touches(drop));
        } else {
            for e in &mut self.edges {
                if e.n1 == drop {
                    e.n1 = keep;
                }
                if e.n2 == drop {
                    e.n2 = keep;
                }
            }
        }
        self.remove_node(drop);
        self.clean_up();
        self.rebuild_adjacency();
    }

    /// Node nearest to `point`, optionally excluding one id.
    pub fn closest_node(&self, point: Vec3, exclude: Option<NodeId>) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;
        for n in &self.nodes {
            if Some(n.id) == exclude {
                continue;
            }
            let d = n.pos.distance(point);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((n.id, d));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Closest point to `point` over all edge segments, with the edge it
    /// lies on.
    pub fn closest_point_on_edges(&self, point: Vec3) -> Option<(Vec3, EdgeId)> {
        let mut best: Option<(Vec3, EdgeId, f32)> = None;
        for e in &self.edges {
            let (Some(a), Some(b)) = (self.node_pos(e.n1), self.node_pos(e.n2)) else {
                continue;
            };
            let p = closest_point_on_segment(a, b, point);
            let d = p.distance(point);
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((p, e.id, d));
            }
        }
        best.map(|(p, id, _)| (p, id))
    }

    /// Even-odd containment test against the boundary edges, using a
    /// ray from `point` to far beyond the centroid on +X. Points on the
    /// boundary may land on either side.
    pub fn point_is_inside(&self, point: Vec3) -> bool {
        if self.nodes.len() < 3 {
            return false;
        }
        let c = self.centroid();
        let outside = Vec3::new(c.x + RAY_REACH, point.y, c.z);
        let mut crossings = 0u32;
        for e in &self.edges {
            let (Some(a), Some(b)) = (self.node_pos(e.n1), self.node_pos(e.n2)) else {
                continue;
            };
            if intersect_with_margin(point, outside, a, b, 0.0).is_some() {
                crossings += 1;
            }
        }
        crossings % 2 == 1
    }

    /// Split every pair of properly crossing, non-adjacent edges at
    /// their intersection, chaining both splits through one shared node.
    /// Runs until no crossing remains; the split count is capped
    /// relative to the edge count and hitting the cap is an error
    /// (state stays consistent). Returns whether anything was split.
    pub fn fix_intersecting_edges(&mut self) -> Result<bool, GraphError> {
        let mut scope: Vec<EdgeId> = self.edges.iter().map(|e| e.id).collect();
        self.fix_intersections_in(&mut scope)
    }

    /// Same repair restricted to `scope`; newly created halves join the
    /// scope so chained crossings still resolve.
    pub(crate) fn fix_intersections_in(
        &mut self,
        scope: &mut Vec<EdgeId>,
    ) -> Result<bool, GraphError> {
        self.clean_up();
        self.rebuild_adjacency();
        scope.retain(|&id| self.edge(id).is_some());
        let cap = 4 * self.edges.len() + 16;
        let mut splits = 0usize;
        let mut fixed_any = false;
        while let Some((e1, e2, point)) = self.first_crossing_in(scope) {
            if splits >= cap {
                warn!(
                    "edge intersection repair stopped at {} splits over {} edges",
                    splits,
                    self.edges.len()
                );
                return Err(GraphError::IterationLimit { what: "intersection repair", limit: cap });
            }
            splits += 1;
            fixed_any = true;
            let before: HashSet<EdgeId> = self.edges.iter().map(|e| e.id).collect();
            if let Some(shared) = self.split_edge(e1, point, None) {
                self.split_edge(e2, point, Some(shared));
            }
            scope.retain(|&id| id != e1 && id != e2);
            for e in &self.edges {
                if !before.contains(&e.id) {
                    scope.push(e.id);
                }
            }
            self.rebuild_adjacency();
        }
        Ok(fixed_any)
    }

    /// First pair of scoped edges crossing strictly inside both spans.
    /// Pairs sharing an endpoint or whose endpoints are already
    /// neighbors are skipped.
    fn first_crossing_in(&self, scope: &[EdgeId]) -> Option<(EdgeId, EdgeId, Vec3)> {
        for (i, &id1) in scope.iter().enumerate() {
            let Some(e1) = self.edge(id1) else { continue };
            let (Some(a), Some(b)) = (self.node_pos(e1.n1), self.node_pos(e1.n2)) else {
                continue;
            };
            for &id2 in &scope[i + 1..] {
                let Some(e2) = self.edge(id2) else { continue };
                if e2.touches(e1.n1) || e2.touches(e1.n2) {
                    continue;
                }
                if self.endpoints_adjacent(e1, e2) {
                    continue;
                }
                let (Some(c), Some(d)) = (self.node_pos(e2.n1), self.node_pos(e2.n2)) else {
                    continue;
                };
                let Some(p) = intersect_with_margin(a, b, c, d, 0.0) else { continue };
                // splitting at an endpoint would leave a degenerate half
                if p.distance(a) <= EPS_POS
                    || p.distance(b) <= EPS_POS
                    || p.distance(c) <= EPS_POS
                    || p.distance(d) <= EPS_POS
                {
                    continue;
                }
                return Some((id1, id2, p));
            }
        }
        None
    }

    fn endpoints_adjacent(&self, e1: &Edge, e2: &Edge) -> bool {
        let linked = |n: NodeId, m: NodeId| {
            self.node(n).map_or(false, |node| node.adjacents.contains(&m))
        };
        linked(e1.n1, e2.n1)
            || linked(e1.n1, e2.n2)
            || linked(e1.n2, e2.n1)
            || linked(e1.n2, e2.n2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(width: f32) -> Graph {
        let mut g = Graph::new();
        let a = g.add_node(Vec3::new(0.0, 0.0, 0.0));
        let b = g.add_node(Vec3::new(1.0, 0.0, 0.0));
        let c = g.add_node(Vec3::new(1.0, 0.0, 1.0));
        let d = g.add_node(Vec3::new(0.0, 0.0, 1.0));
        g.add_edge(a, b, width);
        g.add_edge(b, c, width);
        g.add_edge(c, d, width);
        g.add_edge(d, a, width);
        g
    }

    #[test]
    fn clean_up_drops_dangling_self_loops_and_duplicates() {
        let mut g = square(0.0);
        let a = g.nodes[0].id;
        let b = g.nodes[1].id;
        // duplicate in reverse order and a manual self loop
        g.edges.push(Edge::new(EdgeId(100), b, a, 0.0));
        g.edges.push(Edge::new(EdgeId(101), a, a, 0.0));
        g.edges.push(Edge::new(EdgeId(102), a, NodeId(77), 0.0));
        g.clean_up();
        assert_eq!(g.edge_count(), 4);
        let snapshot: Vec<EdgeId> = g.edges.iter().map(|e| e.id).collect();
        g.clean_up();
        let again: Vec<EdgeId> = g.edges.iter().map(|e| e.id).collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn rebuild_adjacency_matches_edges() {
        let mut g = square(0.0);
        for n in &mut g.nodes {
            n.adjacents.clear();
        }
        g.rebuild_adjacency();
        for n in &g.nodes {
            assert_eq!(n.adjacents.len(), 2, "corner {:?}", n.id);
        }
    }

    #[test]
    fn split_edge_preserves_width_and_endpoints() {
        let mut g = square(0.75);
        let eid = g.edges[0].id;
        let (n1, n2) = (g.edges[0].n1, g.edges[0].n2);
        let mid = g.split_edge(eid, Vec3::new(0.5, 0.0, 0.0), None).unwrap();
        assert_eq!(g.edge_count(), 5);
        assert!(g.find_edge_between(n1, mid).is_some());
        assert!(g.find_edge_between(mid, n2).is_some());
        assert!(g.find_edge_between(n1, n2).is_none());
        for e in g.edges.iter().filter(|e| e.touches(mid)) {
            assert_eq!(e.width, 0.75);
        }
        // split node sits right after the start endpoint in list order
        let i1 = g.node_index(n1).unwrap();
        assert_eq!(g.node_index(mid).unwrap(), i1 + 1);
    }

    #[test]
    fn copy_relabeled_is_private_and_computes_angles() {
        let g = square(0.25);
        let (copy, map) = g.copy_relabeled();
        assert_eq!(copy.node_count(), 4);
        assert_eq!(copy.edge_count(), 4);
        for n in &g.nodes {
            assert_ne!(map[&n.id], n.id, "fresh counter space");
        }
        for n in &copy.nodes {
            assert!((n.angle_deg - 90.0).abs() < 0.5, "square corner, got {}", n.angle_deg);
            // inward direction points at the square center
            let toward = (Vec3::new(0.5, 0.0, 0.5) - n.pos).normalized();
            assert!(n.dir_to_inside.dot(toward) > 0.9);
        }
    }

    #[test]
    fn combine_nodes_retargets_edges() {
        let mut g = square(0.0);
        let keep = g.nodes[0].id;
        let drop = g.nodes[1].id;
        g.combine_nodes(keep, drop);
        assert_eq!(g.node_count(), 3);
        assert!(g.node(drop).is_none());
        // b's far edge now lands on keep; the a-b edge collapsed
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.degree(keep), 2);
    }

    #[test]
    fn point_is_inside_square() {
        let g = square(0.0);
        assert!(g.point_is_inside(Vec3::new(0.5, 0.0, 0.5)));
        assert!(!g.point_is_inside(Vec3::new(1.5, 0.0, 0.5)));
        assert!(!g.point_is_inside(Vec3::new(-0.5, 0.0, -0.5)));
    }

    #[test]
    fn closest_queries() {
        let g = square(0.0);
        let origin = g.nodes[0].id;
        assert_eq!(g.closest_node(Vec3::new(0.1, 0.0, 0.1), None), Some(origin));
        assert_ne!(g.closest_node(Vec3::new(0.1, 0.0, 0.1), Some(origin)), Some(origin));
        let (p, _) = g.closest_point_on_edges(Vec3::new(0.5, 0.0, -1.0)).unwrap();
        assert!((p.x - 0.5).abs() < 1e-6 && p.z.abs() < 1e-6);
    }

    #[test]
    fn repair_splits_crossing_pair() {
        let mut g = Graph::new();
        let a = g.add_node(Vec3::new(-1.0, 0.0, 0.0));
        let b = g.add_node(Vec3::new(1.0, 0.0, 0.0));
        let c = g.add_node(Vec3::new(0.0, 0.0, -1.0));
        let d = g.add_node(Vec3::new(0.0, 0.0, 1.0));
        g.add_edge(a, b, 0.5);
        g.add_edge(c, d, 0.5);
        let fixed = g.fix_intersecting_edges().unwrap();
        assert!(fixed);
        assert_eq!(g.node_count(), 5);
        assert_eq!(g.edge_count(), 4);
        let mid = g.closest_node(Vec3::ZERO, None).unwrap();
        assert_eq!(g.degree(mid), 4);
        assert!(g.node_pos(mid).unwrap().distance(Vec3::ZERO) < 1e-4);
        // no further work on a clean graph
        assert!(!g.fix_intersecting_edges().unwrap());
    }

    #[test]
    fn repair_ignores_shared_endpoints() {
        let mut g = Graph::new();
        let a = g.add_node(Vec3::new(0.0, 0.0, 0.0));
        let b = g.add_node(Vec3::new(1.0, 0.0, 0.0));
        let c = g.add_node(Vec3::new(1.0, 0.0, 1.0));
        g.add_edge(a, b, 0.0);
        g.add_edge(b, c, 0.0);
        assert!(!g.fix_intersecting_edges().unwrap());
        assert_eq!(g.edge_count(), 2);
    }
}

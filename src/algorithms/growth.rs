// Space colonization growth: scatter attractor targets inside a cycle,
// then march a secondary edge network from a boundary root toward them,
// backtracking along the growth stack when a branch runs dry.

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::algorithms::refine::{combine_nodes_within, COMBINE_MAX_PASSES};
use crate::config::GrowthConfig;
use crate::error::GraphError;
use crate::geometry::intersect::intersect_with_margin;
use crate::geometry::math::angle_between_deg;
use crate::geometry::tolerance::{approx_eq, EPS_PARALLEL, EPS_POS};
use crate::model::{EdgeId, NodeId, Vec3};
use crate::primitive::{Primitive, PrimitiveKind};
use crate::Graph;

/// Attempt cap when scattering targets; placement stops here even if
/// fewer points than requested ever fit.
const SCATTER_MAX_ATTEMPTS: usize = 1000;
/// Rounds of target-chasing before the builder gives up.
const GROW_MAX_ROUNDS: usize = 1000;
/// Steps a single march toward one target may take.
const MARCH_MAX_STEPS: usize = 100;
/// Forward cone within which a loose endpoint connects to a nearby node.
const END_CONE_DEG: f32 = 30.0;
/// Ray length used when a loose endpoint connects to the edge it faces.
const CONNECT_RAY_REACH: f32 = 1000.0;

impl Primitive {
    /// Scatter up to `target_count` growth attractors uniformly over the
    /// bounds, keeping only points inside the boundary, outside the edge
    /// margin and mutually spaced by `min_distance`. Deterministic per
    /// seed.
    pub fn scatter_targets(&mut self, seed: u64) {
        self.targets.clear();
        if !(self.min_x < self.max_x && self.min_z < self.max_z) {
            return;
        }
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..SCATTER_MAX_ATTEMPTS {
            if self.targets.len() >= self.config.target_count {
                break;
            }
            let point = Vec3::new(
                rng.random_range(self.min_x..=self.max_x),
                0.0,
                rng.random_range(self.min_z..=self.max_z),
            );
            if !self.graph.point_is_inside(point) {
                continue;
            }
            if self.config.target_margin > 0.0 {
                if let Some((closest, _)) = self.graph.closest_point_on_edges(point) {
                    if closest.distance(point) < self.config.target_margin {
                        continue;
                    }
                }
            }
            if self
                .targets
                .iter()
                .any(|t| t.distance(point) < self.config.min_distance)
            {
                continue;
            }
            self.targets.push(point);
        }
    }

    /// Grow the secondary network: scatter targets, chase them from the
    /// configured root node, repair any crossings the march produced,
    /// merge nodes that landed close, connect loose endpoints and store
    /// the result in `sub`. The boundary itself is part of the result.
    pub fn generate(&mut self, seed: u64) -> Result<(), GraphError> {
        self.sub = Graph::new();
        if self.kind != PrimitiveKind::MinimalCycle || self.config.segment_length <= 0.0 {
            return Ok(());
        }
        self.scatter_targets(seed);
        if self.targets.is_empty() {
            return Ok(());
        }
        let (mut work, _) = self.graph.copy_relabeled();
        if work.nodes.is_empty() {
            return Ok(());
        }
        let root_index = self.root_index.min(work.nodes.len() - 1);
        let root = work.nodes[root_index].id;

        let (mut grown_nodes, mut grown_edges) = {
            let mut builder = EdgeBuilder::new(&mut work, root, &self.targets, &self.config);
            builder.run()?;
            (builder.grown_nodes, builder.grown_edges)
        };

        work.fix_intersections_in(&mut grown_edges)?;
        combine_grown(&mut work, &mut grown_nodes, root, &self.config);
        connect_end_points(&mut work, root, &self.config);
        combine_nodes_within(&mut work, self.config.combine_range);
        work.clean_up();
        work.rebuild_adjacency();
        self.sub = work;
        Ok(())
    }
}

/// One growth run over a working graph. Tracks which nodes and edges it
/// created so the later repair and merge stages stay off the boundary.
struct EdgeBuilder<'a> {
    graph: &'a mut Graph,
    cfg: &'a GrowthConfig,
    targets: &'a [Vec3],
    visited: Vec<bool>,
    stack: Vec<NodeId>,
    grown_nodes: Vec<NodeId>,
    grown_edges: Vec<EdgeId>,
    root: NodeId,
    current: NodeId,
}

impl<'a> EdgeBuilder<'a> {
    fn new(
        graph: &'a mut Graph,
        root: NodeId,
        targets: &'a [Vec3],
        cfg: &'a GrowthConfig,
    ) -> EdgeBuilder<'a> {
        let visited = vec![false; targets.len()];
        EdgeBuilder {
            graph,
            cfg,
            targets,
            visited,
            stack: Vec::new(),
            grown_nodes: Vec::new(),
            grown_edges: Vec::new(),
            root,
            current: root,
        }
    }

    fn run(&mut self) -> Result<(), GraphError> {
        let Some(root_pos) = self.graph.node_pos(self.root) else {
            return Ok(());
        };
        // seed the network: a node right on the nearest target, wired to
        // the root
        let Some((first, _)) = self.closest_unvisited(root_pos, false) else {
            return Ok(());
        };
        self.visited[first] = true;
        let seed_node = self.graph.add_node(self.targets[first]);
        self.grown_nodes.push(seed_node);
        if let Some(e) = self.graph.add_edge(self.root, seed_node, self.cfg.edge_width) {
            self.grown_edges.push(e);
        }
        self.stack.push(seed_node);
        self.current = seed_node;

        if let Some((next, dist)) = self.closest_unvisited(self.targets[first], false) {
            self.march_toward(next, dist);
        }

        for _ in 0..GROW_MAX_ROUNDS {
            if self.visited.iter().all(|&v| v) {
                return Ok(());
            }
            if !self.step() {
                return Ok(());
            }
        }
        warn!("edge growth did not settle after {} rounds", GROW_MAX_ROUNDS);
        Err(GraphError::IterationLimit { what: "edge growth", limit: GROW_MAX_ROUNDS })
    }

    /// Chase one more target. Prefers targets in reach of the current
    /// tip, falls back to the growth stack, and as a last resort
    /// restarts from the built node closest to a stranded target.
    /// Returns false once no target is reachable at all.
    fn step(&mut self) -> bool {
        let Some(cur_pos) = self.graph.node_pos(self.current) else {
            return false;
        };
        let mut next = self.closest_unvisited(cur_pos, true);
        if next.is_none() {
            while let Some(n) = self.stack.pop() {
                let Some(p) = self.graph.node_pos(n) else { continue };
                if let Some(found) = self.closest_unvisited(p, true) {
                    self.current = n;
                    next = Some(found);
                    break;
                }
            }
        }
        if next.is_none() {
            self.stack.clear();
            let Some(stranded) = self.visited.iter().position(|&v| !v) else {
                return false;
            };
            if let Some(n) = self.closest_grown(self.targets[stranded]) {
                self.current = n;
                if let Some(p) = self.graph.node_pos(n) {
                    next = self.closest_unvisited(p, false);
                }
            }
        }
        match next {
            Some((idx, dist)) => {
                self.march_toward(idx, dist);
                true
            }
            None => false,
        }
    }

    /// Nearest unvisited target to `from`, optionally limited to
    /// `max_distance` reach.
    fn closest_unvisited(&self, from: Vec3, check_max: bool) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, t) in self.targets.iter().enumerate() {
            if self.visited[i] {
                continue;
            }
            let d = from.distance(*t);
            if check_max && d > self.cfg.max_distance {
                continue;
            }
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        best
    }

    fn closest_grown(&self, point: Vec3) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;
        for &id in &self.grown_nodes {
            let Some(p) = self.graph.node_pos(id) else { continue };
            let d = p.distance(point);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((id, d));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Step toward one target until it is within `min_distance`, the
    /// step cap runs out, or a step moved the tip away from it (the
    /// turn snap can point the march elsewhere). The target counts as
    /// visited either way.
    fn march_toward(&mut self, idx: usize, mut to_closest: f32) {
        let target = self.targets[idx];
        for _ in 0..MARCH_MAX_STEPS {
            if to_closest <= self.cfg.min_distance {
                break;
            }
            let Some(pos) = self.graph.node_pos(self.current) else { break };
            let dir = (target - pos).normalized();
            if self.advance(dir) {
                self.stack.push(self.current);
            }
            let Some(new_pos) = self.graph.node_pos(self.current) else { break };
            let last = to_closest;
            to_closest = new_pos.distance(target);
            if to_closest > last {
                break;
            }
        }
        self.visited[idx] = true;
    }

    /// Move the tip one segment along `dir`. Continuing dead straight
    /// slides the tip instead of chaining collinear nodes; a turn
    /// sharper than `min_turn_angle_deg` against every existing edge at
    /// the tip snaps to the perpendicular on the side `dir` points to.
    /// Returns whether a new node was spawned.
    fn advance(&mut self, dir: Vec3) -> bool {
        let Some(pos) = self.graph.node_pos(self.current) else {
            return false;
        };
        let mut dir = dir;
        let mut new_pos = pos + dir * self.cfg.segment_length;
        if new_pos == pos {
            return false;
        }

        let adjacents = self
            .graph
            .node(self.current)
            .map(|n| n.adjacents.clone())
            .unwrap_or_default();
        if let Some(&prev) = adjacents.first() {
            if let Some(prev_pos) = self.graph.node_pos(prev) {
                let dir_to_prev = (prev_pos - pos).normalized();
                if approx_eq(dir.dot(dir_to_prev), -1.0, EPS_PARALLEL) {
                    if let Some(n) = self.graph.node_mut(self.current) {
                        n.pos = new_pos;
                    }
                    return false;
                }
                let mut best_angle = f32::INFINITY;
                let mut best_dir = dir_to_prev;
                for &adj in &adjacents {
                    let Some(ap) = self.graph.node_pos(adj) else { continue };
                    let d = (ap - pos).normalized();
                    let a = angle_between_deg(d, dir);
                    if a < best_angle {
                        best_angle = a;
                        best_dir = d;
                    }
                }
                if best_angle < self.cfg.min_turn_angle_deg {
                    let ref_right = Vec3::UP.cross(best_dir);
                    dir = if ref_right.dot(dir) > 0.0 {
                        ref_right
                    } else {
                        best_dir.cross(Vec3::UP)
                    };
                    new_pos = pos + dir * self.cfg.segment_length;
                }
            }
        }

        let id = self.graph.add_node(new_pos);
        self.grown_nodes.push(id);
        if let Some(e) = self.graph.add_edge(self.current, id, self.cfg.edge_width) {
            self.grown_edges.push(e);
        }
        self.current = id;
        true
    }
}

/// Merge grown nodes that landed within `combine_range` of each other,
/// leaving the boundary untouched, then make sure the surviving network
/// is still wired to its root.
fn combine_grown(g: &mut Graph, grown: &mut Vec<NodeId>, root: NodeId, cfg: &GrowthConfig) {
    if cfg.combine_range > 0.0 {
        for _ in 0..COMBINE_MAX_PASSES {
            let mut combined = false;
            let ids = grown.clone();
            for id in ids {
                let Some(pos) = g.node_pos(id) else { continue };
                let mut best: Option<(NodeId, f32)> = None;
                for &other in grown.iter() {
                    if other == id {
                        continue;
                    }
                    let Some(op) = g.node_pos(other) else { continue };
                    let d = op.distance(pos);
                    if best.map_or(true, |(_, bd)| d < bd) {
                        best = Some((other, d));
                    }
                }
                if let Some((other, d)) = best {
                    if d < cfg.combine_range {
                        g.combine_nodes(id, other);
                        grown.retain(|&n| n != other);
                        combined = true;
                    }
                }
            }
            if !combined {
                break;
            }
        }
    }
    grown.retain(|&n| g.node(n).is_some());

    // the merge may have eaten the edge anchoring the network to its root
    let anchored = g.edges.iter().any(|e| {
        e.touches(root) && e.other(root).map_or(false, |o| grown.contains(&o))
    });
    if !anchored {
        if let Some(&first) = grown.first() {
            g.add_edge(root, first, cfg.edge_width);
        }
    }
}

/// Wire every loose endpoint (degree one, not the root) into the rest
/// of the graph: to the nearest node inside its forward cone when one
/// is in range, otherwise by splitting the first edge its outward ray
/// hits.
fn connect_end_points(g: &mut Graph, root: NodeId, cfg: &GrowthConfig) {
    g.rebuild_adjacency();
    let leaves: Vec<NodeId> = g
        .nodes
        .iter()
        .filter(|n| n.id != root && n.adjacents.len() == 1)
        .map(|n| n.id)
        .collect();

    for leaf in leaves {
        let Some(node) = g.node(leaf) else { continue };
        // an earlier connection this pass may have raised the degree
        if node.adjacents.len() != 1 {
            continue;
        }
        let pos = node.pos;
        let anchor = node.adjacents[0];
        let Some(anchor_pos) = g.node_pos(anchor) else { continue };
        let out_dir = (pos - anchor_pos).normalized();
        if out_dir == Vec3::ZERO {
            continue;
        }

        let mut best: Option<(NodeId, f32)> = None;
        for n in &g.nodes {
            if n.id == leaf || n.id == anchor {
                continue;
            }
            let to_node = (n.pos - pos).normalized();
            if angle_between_deg(out_dir, to_node) < END_CONE_DEG {
                let d = pos.distance(n.pos);
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((n.id, d));
                }
            }
        }
        let mut connect_to =
            best.and_then(|(id, d)| (d < cfg.end_connection_range).then_some(id));

        if connect_to.is_none() {
            let ray_end = pos + out_dir * CONNECT_RAY_REACH;
            let mut hit: Option<(EdgeId, Vec3, f32)> = None;
            for e in &g.edges {
                if e.touches(leaf) {
                    continue;
                }
                let (Some(a), Some(b)) = (g.node_pos(e.n1), g.node_pos(e.n2)) else {
                    continue;
                };
                let Some(p) = intersect_with_margin(pos, ray_end, a, b, 0.0) else {
                    continue;
                };
                let d = pos.distance(p);
                if d <= EPS_POS {
                    continue;
                }
                if hit.map_or(true, |(_, _, bd)| d < bd) {
                    hit = Some((e.id, p, d));
                }
            }
            match hit {
                Some((eid, p, _)) => connect_to = g.split_edge(eid, p, None),
                None => {
                    debug!("no connection found for loose endpoint {:?}", leaf);
                    continue;
                }
            }
        }

        if let Some(to) = connect_to {
            g.add_edge(leaf, to, cfg.edge_width);
            g.rebuild_adjacency();
        }
    }
    g.rebuild_adjacency();
}

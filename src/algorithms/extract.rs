// Minimal cycle basis extraction for planar graphs, after Eberly,
// "The Minimal Cycle Basis for a Planar Graph". The source graph is
// copied, swept in (x, z) order and consumed: each pass peels one
// minimal cycle or filament off the working copy.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::warn;

use crate::geometry::math::dot_perp;
use crate::model::{EdgeId, NodeId, Vec3};
use crate::primitive::{Primitive, PrimitiveKind};
use crate::{Graph, GraphError};

/// Outer pass cap; each pass removes at least one node from the copy.
const MAX_EXTRACT_PASSES: usize = 1000;

/// Decompose `source` into minimal cycles and filaments, in discovery
/// order. The source is left untouched; every primitive gets a private
/// relabeled snapshot of its nodes and edges.
pub fn extract_minimal_cycles(source: &Graph) -> Result<Vec<Primitive>, GraphError> {
    let (mut work, _) = source.copy_relabeled();
    sort_nodes(&mut work);

    let mut prims = Vec::new();
    let mut next_key = 0u32;
    let mut passes = 0usize;
    while work.node_count() > 0 {
        passes += 1;
        if passes > MAX_EXTRACT_PASSES {
            warn!("cycle extraction stalled with {} nodes left", work.node_count());
            return Err(GraphError::IterationLimit {
                what: "cycle extraction",
                limit: MAX_EXTRACT_PASSES,
            });
        }
        let start = work.nodes[0].id;
        extract_primitive(&mut work, start, &mut prims, &mut next_key);
    }
    Ok(prims)
}

/// Canonical sweep order: ascending x, ties by ascending z.
fn sort_nodes(g: &mut Graph) {
    g.nodes.sort_by(|a, b| {
        (a.pos.x, a.pos.z)
            .partial_cmp(&(b.pos.x, b.pos.z))
            .unwrap_or(Ordering::Equal)
    });
}

fn extract_primitive(
    work: &mut Graph,
    start: NodeId,
    prims: &mut Vec<Primitive>,
    next_key: &mut u32,
) {
    work.rebuild_adjacency();

    if work.degree(start) == 0 {
        work.remove_node(start);
        work.clean_up();
        return;
    }
    if work.degree(start) == 1 {
        if let Some(n1) = first_adjacent(work, start) {
            extract_filament(work, start, n1, prims, next_key);
        }
        return;
    }

    let mut sequence = vec![start];
    let Some(first) = clockwise_most(work, None, start) else {
        if let Some(n1) = first_adjacent(work, start) {
            extract_filament(work, start, n1, prims, next_key);
        }
        return;
    };

    let mut visited: Vec<NodeId> = Vec::new();
    let mut prev = start;
    let mut curr = Some(first);
    while let Some(c) = curr {
        if c == start || visited.contains(&c) {
            break;
        }
        sequence.push(c);
        visited.push(c);
        let next = counter_clockwise_most(work, prev, c);
        prev = c;
        curr = next;
    }

    match curr {
        None => {
            // walk hit a dead end; a filament hangs off `prev`
            if let Some(n1) = first_adjacent(work, prev) {
                extract_filament(work, prev, n1, prims, next_key);
            }
        }
        Some(c) if c == start => {
            let prim = snapshot_cycle(work, &sequence, *next_key);
            *next_key += 1;
            work.remove_edge_between(start, first);
            if work.degree(start) == 1 {
                if let Some(n1) = first_adjacent(work, start) {
                    extract_filament(work, start, n1, prims, next_key);
                }
            }
            if work.node(first).is_some() && work.degree(first) == 1 {
                if let Some(n1) = first_adjacent(work, first) {
                    extract_filament(work, first, n1, prims, next_key);
                }
            }
            if let Some(prim) = prim {
                prims.push(prim);
            }
        }
        Some(_) => {
            // closed onto an interior node, so `start` sits on a
            // filament; back away from the walk over degree-2 nodes
            let mut m0 = start;
            let mut m1 = first;
            while work.degree(m0) == 2 {
                let Some(other) = work.node(m0).and_then(|n| n.adjacent_other_than(m1)) else {
                    break;
                };
                m1 = m0;
                m0 = other;
            }
            extract_filament(work, m0, m1, prims, next_key);
        }
    }
}

fn first_adjacent(work: &Graph, n: NodeId) -> Option<NodeId> {
    work.node(n).and_then(|node| node.adjacents.first().copied())
}

/// Snapshot a closed walk into a cycle primitive and tag its edges on
/// the working graph.
fn snapshot_cycle(work: &mut Graph, sequence: &[NodeId], key: u32) -> Option<Primitive> {
    let mut prim = Primitive::new(PrimitiveKind::MinimalCycle, key);
    let mut map: HashMap<NodeId, NodeId> = HashMap::new();
    for &nid in sequence {
        let pos = work.node_pos(nid)?;
        map.insert(nid, prim.graph.add_node(pos));
    }
    let mut tag: Vec<EdgeId> = Vec::with_capacity(sequence.len());
    for i in 0..sequence.len() {
        let a = sequence[i];
        let b = sequence[(i + 1) % sequence.len()];
        if let Some(e) = work.find_edge_between(a, b) {
            tag.push(e.id);
            let copied = prim.graph.add_edge(map[&a], map[&b], e.width);
            // the snapshot carries the membership tag too
            if let Some(ce) = copied.and_then(|id| prim.graph.edge_mut(id)) {
                ce.in_cycle = true;
            }
        }
    }
    for id in tag {
        if let Some(e) = work.edge_mut(id) {
            e.in_cycle = true;
        }
    }
    prim.centroid = prim.graph.centroid();
    prim.calculate_bounds();
    Some(prim)
}

/// Peel a filament starting from the degree-1 side of `n0` toward `n1`.
/// Chains whose edges were already claimed by a cycle are discarded;
/// untouched chains become a `Filament` primitive.
fn extract_filament(
    work: &mut Graph,
    mut n0: NodeId,
    mut n1: NodeId,
    prims: &mut Vec<Primitive>,
    next_key: &mut u32,
) {
    let entry_tagged = work
        .find_edge_between(n0, n1)
        .map_or(false, |e| e.in_cycle);

    if entry_tagged {
        if work.degree(n0) >= 3 {
            work.remove_edge_between(n0, n1);
            n0 = n1;
            if work.degree(n0) == 1 {
                if let Some(next) = first_adjacent(work, n0) {
                    n1 = next;
                }
            }
        }
        while work.degree(n0) == 1 {
            let Some(next) = first_adjacent(work, n0) else { break };
            n1 = next;
            let tagged = work
                .find_edge_between(n0, n1)
                .map_or(false, |e| e.in_cycle);
            if !tagged {
                break;
            }
            work.remove_node(n0);
            work.remove_edge_between(n0, n1);
            n0 = n1;
        }
        if work.degree(n0) == 0 {
            work.remove_node(n0);
        }
        return;
    }

    let mut chain: Vec<Vec3> = Vec::new();
    let mut widths: Vec<f32> = Vec::new();

    if work.degree(n0) >= 3 {
        if let Some(p) = work.node_pos(n0) {
            chain.push(p);
        }
        if let Some(e) = work.remove_edge_between(n0, n1) {
            widths.push(e.width);
        }
        n0 = n1;
        if work.degree(n0) == 1 {
            if let Some(next) = first_adjacent(work, n0) {
                n1 = next;
            }
        }
    }

    while work.degree(n0) == 1 {
        let Some(next) = first_adjacent(work, n0) else { break };
        n1 = next;
        if let Some(p) = work.node_pos(n0) {
            chain.push(p);
        }
        let removed = work.remove_edge_between(n0, n1);
        work.remove_node(n0);
        widths.push(removed.map_or(0.0, |e| e.width));
        n0 = n1;
    }

    if let Some(p) = work.node_pos(n0) {
        chain.push(p);
    }
    if work.degree(n0) == 0 {
        work.remove_node(n0);
    }

    prims.push(Primitive::filament_from_chain(&chain, &widths, *next_key));
    *next_key += 1;
}

/// Neighbor of `curr` reached by the most-clockwise turn relative to
/// the arrival direction. With no previous node the reference direction
/// is -Z. Convexity of the current best turn flips the acceptance test
/// between either-side and both-sides.
pub(crate) fn clockwise_most(work: &Graph, prev: Option<NodeId>, curr: NodeId) -> Option<NodeId> {
    let cnode = work.node(curr)?;
    if cnode.adjacents.is_empty() {
        return None;
    }
    let dir_curr = match prev {
        Some(p) => cnode.pos - work.node_pos(p)?,
        None => Vec3::new(0.0, 0.0, -1.0),
    };
    let mut next = match prev {
        Some(p) => cnode.adjacent_other_than(p)?,
        None => cnode.adjacents[0],
    };
    let mut dir_next = work.node_pos(next)? - cnode.pos;
    let mut convex = dot_perp(dir_next, dir_curr) <= 0.0;

    for &a in &cnode.adjacents {
        let Some(adj_pos) = work.node_pos(a) else { continue };
        let dir_adj = adj_pos - cnode.pos;
        let take = if convex {
            dot_perp(dir_curr, dir_adj) < 0.0 || dot_perp(dir_next, dir_adj) < 0.0
        } else {
            dot_perp(dir_curr, dir_adj) < 0.0 && dot_perp(dir_next, dir_adj) < 0.0
        };
        if take {
            next = a;
            dir_next = dir_adj;
            convex = dot_perp(dir_next, dir_curr) <= 0.0;
        }
    }
    Some(next)
}

/// Mirror of `clockwise_most` for the interior walk: most
/// counter-clockwise turn away from the arrival direction.
pub(crate) fn counter_clockwise_most(work: &Graph, prev: NodeId, curr: NodeId) -> Option<NodeId> {
    let cnode = work.node(curr)?;
    if cnode.adjacents.is_empty() {
        return None;
    }
    let dir_curr = cnode.pos - work.node_pos(prev)?;
    let mut next = cnode.adjacent_other_than(prev)?;
    let mut dir_next = work.node_pos(next)? - cnode.pos;
    let mut convex = dot_perp(dir_next, dir_curr) <= 0.0;

    for &a in &cnode.adjacents {
        let Some(adj_pos) = work.node_pos(a) else { continue };
        let dir_adj = adj_pos - cnode.pos;
        let take = if convex {
            dot_perp(dir_curr, dir_adj) > 0.0 && dot_perp(dir_next, dir_adj) > 0.0
        } else {
            dot_perp(dir_curr, dir_adj) > 0.0 || dot_perp(dir_next, dir_adj) > 0.0
        };
        if take {
            next = a;
            dir_next = dir_adj;
            convex = dot_perp(dir_next, dir_curr) <= 0.0;
        }
    }
    Some(next)
}

pub mod config;
pub mod error;
pub mod model;
pub mod primitive;
pub mod geometry {
    pub mod intersect;
    pub mod math;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod extract;
    pub mod growth;
    pub mod refine;
    pub mod utility;
}

pub use algorithms::extract::extract_minimal_cycles;
pub use config::GrowthConfig;
pub use error::GraphError;
pub use model::{Edge, EdgeId, Node, NodeId, Vec3};
pub use primitive::{Primitive, PrimitiveKind};

/// Planar graph over ordered node and edge lists.
///
/// Node order is meaningful: extraction sweeps nodes in (x, z) order and
/// refinement re-sorts a cycle's nodes into winding order, so storage is
/// a plain `Vec` with linear-scan lookup by stable id. Ids come from
/// monotone counters and are never reused.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    next_node: u32,
    next_edge: u32,
}

impl Graph {
    pub fn new() -> Graph {
        Graph::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn node_pos(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(|n| n.pos)
    }

    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    /// Edge joining `a` and `b` in either direction, if present.
    pub fn find_edge_between(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.joins(a, b))
    }

    /// Number of adjacency entries currently recorded for `id`.
    pub fn degree(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |n| n.adjacents.len())
    }

    /// Append a node, returning its fresh id.
    pub fn add_node(&mut self, pos: Vec3) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.push(Node::new(id, pos));
        id
    }

    /// Insert a node right after `after` in list order, keeping the
    /// positional sweep order intact for split points.
    pub fn insert_node_after(&mut self, after: NodeId, pos: Vec3) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        let at = self.node_index(after).map_or(self.nodes.len(), |i| i + 1);
        self.nodes.insert(at, Node::new(id, pos));
        id
    }

    /// Append an edge between two existing, distinct nodes, keeping the
    /// adjacency lists of both endpoints in sync. Returns `None` when an
    /// endpoint is missing or the edge would be a self loop.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, width: f32) -> Option<EdgeId> {
        if a == b || self.node(a).is_none() || self.node(b).is_none() {
            return None;
        }
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.push(Edge::new(id, a, b, width));
        if let Some(na) = self.node_mut(a) {
            if !na.adjacents.contains(&b) {
                na.adjacents.push(b);
            }
        }
        if let Some(nb) = self.node_mut(b) {
            if !nb.adjacents.contains(&a) {
                nb.adjacents.push(a);
            }
        }
        Some(id)
    }

    /// Remove a node and purge it from every adjacency list. Edges that
    /// referenced it become dangling and fall to the next cleanup.
    pub fn remove_node(&mut self, id: NodeId) {
        self.nodes.retain(|n| n.id != id);
        for n in &mut self.nodes {
            n.adjacents.retain(|&a| a != id);
        }
    }

    /// Remove the edge joining `a` and `b`, rebuilding adjacency from
    /// the surviving edges. Returns the removed edge.
    pub fn remove_edge_between(&mut self, a: NodeId, b: NodeId) -> Option<Edge> {
        let idx = self.edges.iter().position(|e| e.joins(a, b))?;
        let edge = self.edges.remove(idx);
        self.rebuild_adjacency();
        Some(edge)
    }

    /// Remove an edge by id, rebuilding adjacency.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let idx = self.edges.iter().position(|e| e.id == id)?;
        let edge = self.edges.remove(idx);
        self.rebuild_adjacency();
        Some(edge)
    }

    /// Average of node positions; zero for an empty graph.
    pub fn centroid(&self) -> Vec3 {
        if self.nodes.is_empty() {
            return Vec3::ZERO;
        }
        let mut sum = Vec3::ZERO;
        for n in &self.nodes {
            sum = sum + n.pos;
        }
        sum / self.nodes.len() as f32
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}

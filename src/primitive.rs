// Extracted primitive: a minimal cycle or filament holding its own
// private graph snapshot, refinement state and growth artifacts.

use serde::{Deserialize, Serialize};

use crate::config::GrowthConfig;
use crate::geometry::math::angle_between_deg;
use crate::model::Vec3;
use crate::Graph;

/// Interior angles below this make a refined cycle invalid.
const MIN_ACCEPT_ANGLE_DEG: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Filament,
    MinimalCycle,
}

/// One decomposition product of a planar graph. The contained graph is
/// a relabeled snapshot, never shared with the source; for a cycle the
/// node list is in boundary walk order.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub key: u32,
    pub kind: PrimitiveKind,
    pub graph: Graph,
    /// Key of the primitive this one was carved out of, if any.
    pub parent: Option<u32>,
    pub centroid: Vec3,
    pub min_x: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_z: f32,
    pub config: GrowthConfig,
    /// Scattered growth attractors from the latest `generate` call.
    pub targets: Vec<Vec3>,
    /// Secondary network grown inside the cycle (boundary included).
    pub sub: Graph,
    /// Index into the node list the growth seeds from.
    pub root_index: usize,
    pub(crate) processed: bool,
    pub(crate) evaluation: bool,
}

impl Primitive {
    pub fn new(kind: PrimitiveKind, key: u32) -> Primitive {
        Primitive {
            key,
            kind,
            graph: Graph::new(),
            parent: None,
            centroid: Vec3::ZERO,
            min_x: f32::INFINITY,
            min_z: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_z: f32::NEG_INFINITY,
            config: GrowthConfig::default(),
            targets: Vec::new(),
            sub: Graph::new(),
            root_index: 0,
            processed: false,
            evaluation: false,
        }
    }

    /// Build a filament from a chain of positions; `widths[i]` belongs
    /// to the segment between chain node `i` and `i + 1`.
    pub(crate) fn filament_from_chain(chain: &[Vec3], widths: &[f32], key: u32) -> Primitive {
        let mut prim = Primitive::new(PrimitiveKind::Filament, key);
        let mut prev = None;
        for (i, &pos) in chain.iter().enumerate() {
            let id = prim.graph.add_node(pos);
            if let Some(p) = prev {
                let w = widths.get(i - 1).copied().unwrap_or(0.0);
                prim.graph.add_edge(p, id, w);
            }
            prev = Some(id);
        }
        prim.calculate_bounds();
        prim
    }

    /// True once `process` has run.
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Result of the latest `evaluate` call.
    pub fn is_valid(&self) -> bool {
        self.evaluation
    }

    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (self.min_x, self.min_z, self.max_x, self.max_z)
    }

    /// Recompute the axis-aligned XZ bounds from the node positions.
    pub fn calculate_bounds(&mut self) {
        let mut min_x = f32::INFINITY;
        let mut min_z = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_z = f32::NEG_INFINITY;
        for n in &self.graph.nodes {
            min_x = min_x.min(n.pos.x);
            min_z = min_z.min(n.pos.z);
            max_x = max_x.max(n.pos.x);
            max_z = max_z.max(n.pos.z);
        }
        self.min_x = min_x;
        self.min_z = min_z;
        self.max_x = max_x;
        self.max_z = max_z;
    }

    /// Advisory shape check: every degree-2 corner must open at least a
    /// few degrees. Stores and returns the verdict; re-runnable.
    pub fn evaluate(&mut self) -> bool {
        self.graph.rebuild_adjacency();
        let mut valid = true;
        for n in &self.graph.nodes {
            if n.adjacents.len() != 2 {
                continue;
            }
            let (Some(a), Some(b)) = (
                self.graph.node_pos(n.adjacents[0]),
                self.graph.node_pos(n.adjacents[1]),
            ) else {
                continue;
            };
            let angle = angle_between_deg(a - n.pos, b - n.pos);
            if angle < MIN_ACCEPT_ANGLE_DEG {
                valid = false;
                break;
            }
        }
        self.evaluation = valid;
        valid
    }
}

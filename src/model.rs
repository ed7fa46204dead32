// Core data model: ids, vectors, nodes, edges.
//
// All planar math happens in the XZ plane; Y is carried through untouched
// so callers can keep height information on node positions.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::geometry::tolerance::EPS_LEN;

/// Stable node handle. Allocated from a per-graph counter, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Stable edge handle. Allocated from a per-graph counter, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3 { x, y, z }
    }

    #[inline]
    pub fn dot(self, o: Vec3) -> f32 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    #[inline]
    pub fn cross(self, o: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * o.z - self.z * o.y,
            y: self.z * o.x - self.x * o.z,
            z: self.x * o.y - self.y * o.x,
        }
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn distance(self, o: Vec3) -> f32 {
        (self - o).length()
    }

    /// Unit vector, or zero when the length is below threshold.
    #[inline]
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > EPS_LEN {
            self / len
        } else {
            Vec3::ZERO
        }
    }

    /// Midpoint of two points.
    #[inline]
    pub fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
        (a + b) * 0.5
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, s: f32) -> Vec3 {
        Vec3::new(self.x / s, self.y / s, self.z / s)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Graph vertex.
///
/// `adjacents` is derived data, rebuilt from the edge list; `angle_deg`
/// and `dir_to_inside` are only meaningful after a relabeling copy of a
/// closed polygon computed them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub pos: Vec3,
    pub adjacents: Vec<NodeId>,
    /// Interior angle at this vertex, degrees. Reflex corners exceed 180.
    pub angle_deg: f32,
    /// Unit direction pointing into the polygon interior at this vertex.
    pub dir_to_inside: Vec3,
}

impl Node {
    pub fn new(id: NodeId, pos: Vec3) -> Node {
        Node {
            id,
            pos,
            adjacents: Vec::new(),
            angle_deg: 0.0,
            dir_to_inside: Vec3::ZERO,
        }
    }

    /// First adjacent that is not `ignored`, if any.
    pub fn adjacent_other_than(&self, ignored: NodeId) -> Option<NodeId> {
        self.adjacents.iter().copied().find(|&a| a != ignored)
    }
}

/// Graph edge between two nodes, with a road-style width used by the
/// refinement shift and carried onto split halves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub n1: NodeId,
    pub n2: NodeId,
    pub width: f32,
    /// Transient flag set while extraction tags cycle membership.
    pub in_cycle: bool,
}

impl Edge {
    pub fn new(id: EdgeId, n1: NodeId, n2: NodeId, width: f32) -> Edge {
        Edge { id, n1, n2, width, in_cycle: false }
    }

    /// The endpoint that is not `n`, if `n` is one of the endpoints.
    pub fn other(&self, n: NodeId) -> Option<NodeId> {
        if self.n1 == n {
            Some(self.n2)
        } else if self.n2 == n {
            Some(self.n1)
        } else {
            None
        }
    }

    /// True if `n` is one of the endpoints.
    #[inline]
    pub fn touches(&self, n: NodeId) -> bool {
        self.n1 == n || self.n2 == n
    }

    /// True if this edge joins `a` and `b` in either order.
    #[inline]
    pub fn joins(&self, a: NodeId, b: NodeId) -> bool {
        (self.n1 == a && self.n2 == b) || (self.n1 == b && self.n2 == a)
    }
}

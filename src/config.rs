// Per-primitive growth tunables.

use serde::{Deserialize, Serialize};

/// Parameters driving target scattering, frontier advance and endpoint
/// connection for the secondary edge network grown inside a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthConfig {
    /// How many attractor targets to scatter inside the polygon.
    pub target_count: usize,
    /// Minimum distance a target keeps from the boundary edges.
    pub target_margin: f32,
    /// Width assigned to grown edges.
    pub edge_width: f32,
    /// Below this turn angle (degrees) the advance snaps perpendicular.
    pub min_turn_angle_deg: f32,
    /// Step length of one advance.
    pub segment_length: f32,
    /// Distance at which a target counts as reached.
    pub min_distance: f32,
    /// Targets farther than this are ignored during scoped search.
    pub max_distance: f32,
    /// Nodes closer than this get merged after growth.
    pub combine_range: f32,
    /// Range for connecting dangling endpoints to nearby nodes.
    pub end_connection_range: f32,
}

impl Default for GrowthConfig {
    fn default() -> GrowthConfig {
        GrowthConfig {
            target_count: 20,
            target_margin: 2.0,
            edge_width: 0.5,
            min_turn_angle_deg: 35.0,
            segment_length: 0.5,
            min_distance: 0.3,
            max_distance: 2.0,
            combine_range: 0.5,
            end_connection_range: 2.0,
        }
    }
}

//! Tunable constants of the collision engine.

use crate::Fp;

/// Every numeric knob the resolver and the queries read. A [`World`](crate::World) owns one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Velocities are clamped to this length before resolution.
    pub max_speed: Fp,
    /// Bounce iterations per sweep before giving up.
    pub max_iterations: usize,
    /// Displacements shorter than this (squared) are treated as no movement.
    pub zero_delta_sq: Fp,
    /// Distance a shape is pushed off a surface after each bounce.
    pub push_out: Fp,
    /// Elasticity ceiling applied when the iteration cap is exhausted.
    pub cap_elasticity: Fp,
    /// Half-width, in cells, of the neighborhood searched for free space.
    pub emergency_radius: i32,
    /// Distance of a single de-penetration nudge.
    pub emergency_step: Fp,
    /// Expansion of a shape's bounding box when probing for touching edges.
    pub edge_probe: Fp,
    /// Separation under which an edge counts as touched.
    pub edge_margin: Fp,
    /// Minimum normal component for an edge to count as floor, wall or ceiling.
    pub orientation_threshold: Fp,
    /// Line of sight beyond this squared distance is never granted.
    pub sight_max_distance_sq: Fp,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_speed: 30.0,
            max_iterations: 20,
            zero_delta_sq: 1e-12,
            push_out: 1e-4,
            cap_elasticity: 0.5,
            emergency_radius: 3,
            emergency_step: 0.1,
            edge_probe: 0.1,
            edge_margin: 0.01,
            orientation_threshold: 0.9,
            sight_max_distance_sq: 400.0,
        }
    }
}

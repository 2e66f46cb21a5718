//! Swept 2D collision detection and resolution for tile worlds.
//!
//! Static geometry is a uniform grid of typed cells whose boundaries are derived into
//! colored, one-sided edges. Dynamic geometry is a [`Shape`](narrow::Shape): a circle,
//! an axis-aligned box or a convex polygon. [`collide_shape_world`](resolve::collide_shape_world)
//! sweeps a shape along a displacement, bouncing off the earliest blocking edge until
//! the displacement is used up.

pub mod broad;
pub mod config;
pub mod error;
pub mod narrow;
pub mod query;
pub mod resolve;

pub use broad::{door::{Door, DoorId, DoorWall}, Cell, CellType, Edge, EdgeColor, EntityColor, Side, World};
pub use config::Config;
pub use error::{ShapeError, WorldError};
pub use narrow::{Aabb, Circle, Contact, Polygon, Segment, Shape, ShapeType};
pub use query::{ClosestEdge, EdgeQuad, Orientation, Sight, SightBlock, Touch};
pub use resolve::{collide_body_world, collide_shape_world, Body, Sweep};

#[cfg(not(feature = "f64"))]
pub type Fp = f32;
#[cfg(not(feature = "f64"))]
pub type Vec2 = glam::Vec2;

#[cfg(feature = "f64")]
pub type Fp = f64;
#[cfg(feature = "f64")]
pub type Vec2 = glam::DVec2;

/// Threshold under which a cross product is treated as zero, i.e. lines are parallel.
pub const PARALLEL_EPSILON: Fp = 1e-10;

#[inline]
pub(crate) fn project_onto_unit(v: Vec2, unit: Vec2) -> Vec2 {
    //! Component of `v` along `unit`. `unit` must be normalized.
    unit * v.dot(unit)
}

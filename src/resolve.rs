//! Swept collision resolution of shapes against the world.

use crate::{
    broad::{CellType, EntityColor, World},
    narrow::{swept::earliest_contact, Aabb, Contact, Shape},
    project_onto_unit, Fp, Vec2,
};
use tracing::{debug, trace, warn};

/// Outcome of sweeping a shape: the displacement it may actually make, its velocity after
/// bouncing, and the last contact made on the way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    pub delta: Vec2,
    pub vel: Vec2,
    pub contact: Option<Contact>,
}

/// An entity as far as collision is concerned.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub shape: Shape,
    /// Velocity
    pub vel: Vec2,
    pub color: EntityColor,
    /// Bounce coefficient in `[0, 1]`.
    pub elasticity: Fp,
}
impl Body {
    pub fn new(shape: impl Into<Shape>, color: EntityColor) -> Body {
        Body { shape: shape.into(), vel: Vec2::ZERO, color, elasticity: 0.0 }
    }
    pub fn with_velocity(mut self, vel: Vec2) -> Body {
        self.vel = vel;
        self
    }
    pub fn with_elasticity(mut self, elasticity: Fp) -> Body {
        self.elasticity = elasticity;
        self
    }

    pub fn step(&mut self, world: &World, dt: Fp, emergency: bool) -> Option<Contact> {
        //! Moves the body by its velocity over `dt`, resolving collisions on the way.
        let delta = self.vel * dt;
        collide_body_world(self, delta, world, emergency)
    }
}

#[inline]
fn bounce(v: Vec2, normal: Vec2, elasticity: Fp) -> Vec2 {
    //! Keeps the component of `v` along the surface and reflects the rest, scaled by `elasticity`.
    let perp = project_onto_unit(v, normal);
    (v - perp) - perp * elasticity
}

#[inline]
fn clamp_speed(vel: Vec2, max_speed: Fp) -> Vec2 {
    let len2 = vel.length_squared();
    if len2 > max_speed * max_speed {
        vel * (max_speed / len2.sqrt())
    } else {
        vel
    }
}

pub fn collide_shape_world(
    shape: &Shape,
    delta: Vec2,
    vel: Vec2,
    elasticity: Fp,
    world: &World,
    color: EntityColor,
    emergency: bool,
) -> Sweep {
    //! Sweeps `shape` along `delta` through the edges blocking `color`, bouncing off each
    //! contact until the displacement is spent. The returned delta is relative to the
    //! shape's current position; the shape itself is not moved.
    let config = world.config();
    if delta.length_squared() < config.zero_delta_sq {
        return Sweep { delta: Vec2::ZERO, vel, contact: None };
    }

    let original_delta = delta;
    let original_vel = clamp_speed(vel, config.max_speed);
    let start = shape.bounding_box();

    let mut delta = delta;
    let mut vel = original_vel;
    let mut last: Option<Contact> = None;

    for _ in 0..config.max_iterations {
        let query = start.broaden(delta);
        let edges = world.edges_in_aabb(&query, color);
        let contact = match earliest_contact(shape, delta, edges.iter().map(|e| &e.segment)) {
            Some(contact) => contact,
            None => {
                if emergency {
                    delta = depenetrate(shape, delta, world);
                }
                return Sweep { delta, vel, contact: last };
            }
        };
        trace!(proportion = %contact.proportion, normal = ?contact.normal, "contact");

        let t = contact.proportion;
        let n = contact.normal;
        vel = bounce(vel, n, elasticity);
        delta = delta * t + bounce(delta, n, elasticity) * (1.0 - t) + n * config.push_out;
        last = Some(contact);
    }

    warn!(iterations = config.max_iterations, center = ?shape.center(), "collision did not settle, halting");
    let vel = match last {
        Some(contact) => bounce(original_vel, contact.normal, elasticity.min(config.cap_elasticity)),
        None => original_vel,
    };
    let delta = if emergency { depenetrate(shape, original_delta, world) } else { Vec2::ZERO };
    Sweep { delta, vel, contact: last }
}

pub fn collide_body_world(body: &mut Body, delta: Vec2, world: &World, emergency: bool) -> Option<Contact> {
    //! Resolves `delta` for the body, then applies the resulting displacement and velocity.
    let sweep = collide_shape_world(&body.shape, delta, body.vel, body.elasticity, world, body.color, emergency);
    body.shape.move_by(sweep.delta);
    body.vel = sweep.vel;
    sweep.contact
}

// ---------- Emergency ---------- //

pub(crate) fn embedded(aabb: &Aabb, world: &World) -> bool {
    //! Whether the box leaves the grid or overlaps the interior of a solid cell.
    let bounds = world.bounds();
    if aabb.min.x < bounds.min.x || aabb.min.y < bounds.min.y || aabb.max.x > bounds.max.x || aabb.max.y > bounds.max.y {
        return true;
    }
    world
        .cells_in_aabb(aabb)
        .iter()
        .any(|c| c.kind == CellType::Solid && c.bounding_box().overlaps_strictly(aabb))
}

fn depenetrate(shape: &Shape, delta: Vec2, world: &World) -> Vec2 {
    //! Returns `delta`, extended to walk the moved shape out of solid cells toward the
    //! nearest empty one. Velocity is left alone.
    let config = world.config();
    let mut moved = shape.translated(delta);
    if !embedded(&moved.bounding_box(), world) {
        return delta;
    }

    let center = moved.center();
    let (cx, cy) = world.cell_at(center);
    let r = config.emergency_radius;
    let mut target: Option<Vec2> = None;
    let mut nearest = Fp::MAX;
    for y in cy.saturating_sub(r)..=cy.saturating_add(r) {
        for x in cx.saturating_sub(r)..=cx.saturating_add(r) {
            if let Some(cell) = world.cell(x, y) {
                let dist = (cell.center() - center).length_squared();
                if cell.kind == CellType::Empty && dist < nearest {
                    nearest = dist;
                    target = Some(cell.center());
                }
            }
        }
    }
    let target = match target {
        Some(target) => target,
        None => {
            warn!(center = ?center, radius = r, "no empty cell to escape into");
            return delta;
        }
    };

    let step = config.emergency_step;
    let steps = ((target - center).length() / step).ceil() as usize;
    debug!(from = ?center, to = ?target, steps, "de-penetrating");
    for _ in 0..steps {
        let to = target - moved.center();
        let dist = to.length();
        if dist <= step {
            moved.move_to(target);
        } else {
            moved.move_by(to * (step / dist));
        }
        if !embedded(&moved.bounding_box(), world) {
            break;
        }
    }
    moved.center() - shape.center()
}

//! Read-only questions about shapes and the world: touching edges, penetration, closest
//! points, overlap and line of sight.

use crate::{
    broad::{Edge, EntityColor, World},
    narrow::{contains_point, intersect_circle_segment, intersect_segments, polygon_contains_point, Aabb, Circle, Polygon, Segment, Shape},
    resolve::Body,
    Fp, Vec2,
};

/// Overlap along an edge's tangent below which a shape is considered beside the edge.
const SPAN_EPSILON: Fp = 1e-6;

// ---------- Penetration ---------- //

#[inline]
pub fn penetration_depth(shape: &Shape, seg: &Segment) -> Fp {
    //! Signed depth of the shape's innermost point behind `seg`, along its normal.
    //! Negative when the shape is in front of the segment's line.
    seg.normal.dot(seg.start - shape.innermost_point(seg.normal))
}

fn projected_extent(shape: &Shape, origin: Vec2, axis: Vec2) -> (Fp, Fp) {
    //! Interval covered by the shape along unit `axis`, measured from `origin`.
    let project = |p: Vec2| (p - origin).dot(axis);
    match shape {
        Shape::Circle(c) => {
            let mid = project(c.center);
            (mid - c.radius, mid + c.radius)
        }
        Shape::Aabb(a) => extent_of([a.min, a.max, a.minx_maxy(), a.maxx_miny()].iter().copied(), project),
        Shape::Polygon(p) => extent_of(p.vertices(), project),
    }
}
fn extent_of(points: impl Iterator<Item = Vec2>, project: impl Fn(Vec2) -> Fp) -> (Fp, Fp) {
    points.map(project).fold((Fp::MAX, Fp::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)))
}

// ---------- EdgeQuad ---------- //

/// Which way an edge faces, from the point of view of a shape touching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Floor,
    /// A wall on the shape's left, facing right.
    LeftWall,
    /// A wall on the shape's right, facing left.
    RightWall,
    Ceiling,
}
impl Orientation {
    pub fn of(normal: Vec2, threshold: Fp) -> Option<Orientation> {
        if normal.y >= threshold {
            Some(Orientation::Floor)
        } else if normal.y <= -threshold {
            Some(Orientation::Ceiling)
        } else if normal.x >= threshold {
            Some(Orientation::LeftWall)
        } else if normal.x <= -threshold {
            Some(Orientation::RightWall)
        } else {
            None
        }
    }
}

/// An edge touched by a shape, and how far the shape is from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub edge: Edge,
    /// Negative when the shape sinks into the edge.
    pub separation: Fp,
}

/// The closest touched edge in each cardinal orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeQuad {
    pub floor: Option<Touch>,
    pub left: Option<Touch>,
    pub right: Option<Touch>,
    pub ceiling: Option<Touch>,
}
impl EdgeQuad {
    pub fn get(&self, orientation: Orientation) -> Option<&Touch> {
        self.slot(orientation).as_ref()
    }
    fn slot(&self, orientation: Orientation) -> &Option<Touch> {
        match orientation {
            Orientation::Floor => &self.floor,
            Orientation::LeftWall => &self.left,
            Orientation::RightWall => &self.right,
            Orientation::Ceiling => &self.ceiling,
        }
    }
    fn slot_mut(&mut self, orientation: Orientation) -> &mut Option<Touch> {
        match orientation {
            Orientation::Floor => &mut self.floor,
            Orientation::LeftWall => &mut self.left,
            Orientation::RightWall => &mut self.right,
            Orientation::Ceiling => &mut self.ceiling,
        }
    }

    #[inline]
    pub fn on_floor(&self) -> bool {
        self.floor.is_some()
    }
    #[inline]
    pub fn against_left(&self) -> bool {
        self.left.is_some()
    }
    #[inline]
    pub fn against_right(&self) -> bool {
        self.right.is_some()
    }
    #[inline]
    pub fn under_ceiling(&self) -> bool {
        self.ceiling.is_some()
    }
}

pub fn on_shape_world(shape: &Shape, world: &World, color: EntityColor) -> EdgeQuad {
    //! Classifies the edges the shape rests against. Each orientation keeps the edge the
    //! shape is least separated from, provided that is within the configured margin.
    let config = world.config();
    let probe = shape.bounding_box().expand(config.edge_probe);
    let mut quad = EdgeQuad::default();

    for edge in world.edges_in_aabb(&probe, color) {
        let orientation = match Orientation::of(edge.normal(), config.orientation_threshold) {
            Some(o) => o,
            None => continue,
        };
        let separation = -penetration_depth(shape, &edge.segment);
        if separation > config.edge_margin {
            continue;
        }
        let dir = edge.segment.direction();
        let len = dir.length();
        if len == 0.0 {
            continue;
        }
        let (lo, hi) = projected_extent(shape, edge.segment.start, dir / len);
        if hi.min(len) - lo.max(0.0) <= SPAN_EPSILON {
            continue; // beside the edge, not on it
        }

        let slot = quad.slot_mut(orientation);
        if slot.map_or(true, |t| separation < t.separation) {
            *slot = Some(Touch { edge, separation });
        }
    }
    quad
}

#[inline]
pub fn on_body_world(body: &Body, world: &World) -> EdgeQuad {
    on_shape_world(&body.shape, world, body.color)
}

// ---------- Closest ---------- //

#[inline]
pub fn closest_point_on_segment(shape: &Shape, seg: &Segment) -> Vec2 {
    //! The point of `seg` nearest to the shape's center.
    seg.closest_point(shape.center())
}

/// Nearest edge point found around a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestEdge {
    pub edge: Edge,
    pub point: Vec2,
    /// From the shape's center.
    pub distance: Fp,
}

pub fn closest_to_shape_world(shape: &Shape, world: &World, color: EntityColor, radius: Fp) -> Option<ClosestEdge> {
    //! Returns the nearest point on any edge blocking `color` within `radius` of the shape's center.
    if !(radius >= 0.0) {
        return None;
    }
    let center = shape.center();
    let probe = Aabb::from_corners(center, center).expand(radius);
    let mut best: Option<ClosestEdge> = None;
    for edge in world.edges_in_aabb(&probe, color) {
        let point = closest_point_on_segment(shape, &edge.segment);
        let distance = (point - center).length();
        if distance <= radius && best.map_or(true, |b| distance < b.distance) {
            best = Some(ClosestEdge { edge, point, distance });
        }
    }
    best
}

// ---------- Overlap ---------- //

fn circle_polygon_overlap(circle: &Circle, poly: &Polygon) -> bool {
    polygon_contains_point(poly, circle.center)
        || poly.vertices().any(|v| (v - circle.center).length_squared() <= circle.radius * circle.radius)
        || poly.segments().any(|s| intersect_circle_segment(circle, s.start, s.end).is_some())
}

fn polygon_overlap(a: &Polygon, b: &Polygon) -> bool {
    //! Vertex containment both ways, plus side crossings for shapes that overlap without
    //! either holding a vertex of the other.
    a.vertices().any(|v| polygon_contains_point(b, v))
        || b.vertices().any(|v| polygon_contains_point(a, v))
        || a.segments().any(|s| b.segments().any(|t| intersect_segments(&s, &t).is_some()))
}

pub fn overlap_shapes(a: &Shape, b: &Shape) -> bool {
    //! Returns whether the shapes overlap. Touching counts.
    match (a, b) {
        (Shape::Circle(c1), Shape::Circle(c2)) => {
            let sum = c1.radius + c2.radius;
            (c1.center - c2.center).length_squared() <= sum * sum
        }
        (Shape::Circle(c), Shape::Aabb(r)) | (Shape::Aabb(r), Shape::Circle(c)) => circle_polygon_overlap(c, &r.to_polygon()),
        (Shape::Circle(c), Shape::Polygon(p)) | (Shape::Polygon(p), Shape::Circle(c)) => circle_polygon_overlap(c, p),
        (Shape::Aabb(r1), Shape::Aabb(r2)) => r1.overlaps(r2),
        (Shape::Aabb(r), Shape::Polygon(p)) | (Shape::Polygon(p), Shape::Aabb(r)) => polygon_overlap(&r.to_polygon(), p),
        (Shape::Polygon(p1), Shape::Polygon(p2)) => polygon_overlap(p1, p2),
    }
}

#[inline]
pub fn overlap_bodies(a: &Body, b: &Body) -> bool {
    overlap_shapes(&a.shape, &b.shape)
}

#[inline]
pub fn body_contains_point(body: &Body, point: Vec2) -> bool {
    contains_point(&body.shape, point)
}

// ---------- Line of sight ---------- //

/// The first edge that cuts a sight line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SightBlock {
    pub edge: Edge,
    pub point: Vec2,
    /// Fraction of the way from eye to target.
    pub proportion: Fp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sight {
    Clear,
    Blocked(SightBlock),
    /// Too far apart to be worth tracing.
    OutOfRange,
}
impl Sight {
    #[inline]
    pub fn is_clear(&self) -> bool {
        matches!(self, Sight::Clear)
    }
}

pub fn line_of_sight_world(eye: Vec2, target: Vec2, world: &World) -> Sight {
    //! Traces from `eye` to `target` through the edges that block enemies. Only edges facing
    //! the eye can block it.
    if (target - eye).length_squared() > world.config().sight_max_distance_sq {
        return Sight::OutOfRange;
    }
    let line = Segment::new(eye, target);
    let mut best: Option<SightBlock> = None;
    for edge in world.edges_in_aabb(&Aabb::from_corners(eye, target), EntityColor::Enemy) {
        if edge.normal().dot(eye - edge.segment.start) <= 0.0 {
            continue; // seen from behind
        }
        if let Some(hit) = intersect_segments(&line, &edge.segment) {
            if best.map_or(true, |b| hit.ta < b.proportion) {
                best = Some(SightBlock { edge, point: hit.point, proportion: hit.ta });
            }
        }
    }
    best.map_or(Sight::Clear, Sight::Blocked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{broad::{EdgeColor, Side}, config::Config, Door};
    use approx::assert_abs_diff_eq;

    /// 3x3 grid with a solid bottom row.
    fn ground() -> World {
        World::from_codes(3, 3, &[1, 1, 1, 0, 0, 0, 0, 0, 0]).unwrap()
    }

    fn ball(x: Fp, y: Fp, r: Fp) -> Shape {
        Circle::new(Vec2::new(x, y), r).unwrap().into()
    }

    fn floor() -> Segment {
        Segment::new(Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0))
    }

    #[test]
    fn penetration_sign() {
        assert_abs_diff_eq!(penetration_depth(&ball(0.5, 1.05, 0.1), &floor()), 0.05, epsilon = 1e-6);
        assert_abs_diff_eq!(penetration_depth(&ball(0.5, 1.2, 0.1), &floor()), -0.1, epsilon = 1e-6);
        let boxed: Shape = Aabb::new(Vec2::new(0.0, 0.8), Vec2::new(0.5, 1.5)).unwrap().into();
        assert_abs_diff_eq!(penetration_depth(&boxed, &floor()), 0.2, epsilon = 1e-6);
        let poly: Shape = Aabb::new(Vec2::new(0.0, 0.8), Vec2::new(0.5, 1.5)).unwrap().to_polygon().into();
        assert_abs_diff_eq!(penetration_depth(&poly, &floor()), 0.2, epsilon = 1e-6);
    }

    #[test]
    fn resting_shapes_find_their_floor() {
        let world = ground();
        let quad = on_shape_world(&ball(1.5, 1.1001, 0.1), &world, EntityColor::Neutral);
        assert!(quad.on_floor());
        assert!(!quad.against_left() && !quad.against_right() && !quad.under_ceiling());
        assert_abs_diff_eq!(quad.floor.unwrap().separation, 1e-4, epsilon = 1e-5);

        let quad = on_shape_world(&ball(1.5, 1.2, 0.1), &world, EntityColor::Neutral);
        assert!(!quad.on_floor());
    }

    #[test]
    fn corners_and_ceilings() {
        let world = ground();
        let quad = on_shape_world(&ball(0.1001, 1.1001, 0.1), &world, EntityColor::Neutral);
        assert!(quad.on_floor() && quad.against_left());
        assert!(!quad.against_right());

        let boxed: Shape = Aabb::new(Vec2::new(2.5, 2.5), Vec2::new(3.0, 3.0)).unwrap().into();
        let quad = on_shape_world(&boxed, &world, EntityColor::Neutral);
        assert!(quad.under_ceiling() && quad.against_right());
        assert_eq!(quad.get(Orientation::Ceiling).unwrap().separation, 0.0);
        assert!(!quad.on_floor());
    }

    #[test]
    fn edge_quad_keeps_least_separated_edge() {
        let mut world = ground();
        let raised = Edge::new(Vec2::new(1.0, 1.05), Vec2::new(2.0, 1.05), EdgeColor::Neutral);
        world.add_door_edge(1, 1, raised).unwrap();

        let shape = ball(1.5, 1.145, 0.1);
        let quad = on_shape_world(&shape, &world, EntityColor::Neutral);
        let floor = quad.floor.unwrap();
        assert_eq!(floor.edge, raised);

        // every floor candidate under the margin is at least as separated as the kept one
        let probe = shape.bounding_box().expand(0.1);
        for edge in world.edges_in_aabb(&probe, EntityColor::Neutral) {
            if Orientation::of(edge.normal(), 0.9) == Some(Orientation::Floor) {
                let separation = -penetration_depth(&shape, &edge.segment);
                if separation <= 0.01 {
                    assert!(floor.separation <= separation);
                }
            }
        }

        // colored edges only count for the colors they block
        let world = ground();
        let mut blue = world.clone();
        blue.add_door_edge(1, 1, Edge::new(Vec2::new(1.0, 1.3), Vec2::new(2.0, 1.3), EdgeColor::Blue)).unwrap();
        assert!(on_shape_world(&ball(1.5, 1.4, 0.1), &blue, EntityColor::Red).on_floor());
        assert!(!on_shape_world(&ball(1.5, 1.4, 0.1), &blue, EntityColor::Blue).on_floor());
    }

    #[test]
    fn edges_beside_a_shape_are_ignored() {
        // a step: the ground's floor at y = 1 and a raised block at (2, 1)
        let world = World::from_codes(3, 3, &[1, 1, 1, 0, 0, 1, 0, 0, 0]).unwrap();
        // sunk below the step's top but off to its side
        let quad = on_shape_world(&ball(1.85, 2.05, 0.1), &world, EntityColor::Neutral);
        assert!(!quad.on_floor());
        let quad = on_shape_world(&ball(1.9, 1.5, 0.1), &world, EntityColor::Neutral);
        assert!(quad.against_right());
        assert!(!quad.on_floor());
    }

    #[test]
    fn closest_points() {
        assert_abs_diff_eq!(closest_point_on_segment(&ball(0.5, 2.0, 0.1), &floor()), Vec2::new(0.5, 1.0));
        assert_abs_diff_eq!(closest_point_on_segment(&ball(-1.0, 2.0, 0.1), &floor()), Vec2::new(0.0, 1.0));
        assert_abs_diff_eq!(closest_point_on_segment(&ball(3.0, 0.0, 0.1), &floor()), Vec2::new(1.0, 1.0));

        let world = ground();
        let closest = closest_to_shape_world(&ball(1.5, 1.3, 0.1), &world, EntityColor::Neutral, 1.0).unwrap();
        assert_abs_diff_eq!(closest.point, Vec2::new(1.5, 1.0), epsilon = 1e-6);
        assert_abs_diff_eq!(closest.distance, 0.3, epsilon = 1e-6);
        assert!(closest_to_shape_world(&ball(1.5, 2.0, 0.1), &world, EntityColor::Neutral, 0.5).is_none());
        assert!(closest_to_shape_world(&ball(1.5, 1.3, 0.1), &world, EntityColor::Neutral, -1.0).is_none());
        assert!(closest_to_shape_world(&ball(1.5, 1.3, 0.1), &world, EntityColor::Neutral, Fp::NAN).is_none());
    }

    #[test]
    fn bodies_overlap_and_contain() {
        let player = Body::new(Circle::new(Vec2::new(1.0, 1.0), 0.5).unwrap(), EntityColor::Red);
        let crate_box = Body::new(Aabb::new(Vec2::new(1.4, 0.5), Vec2::new(2.4, 1.5)).unwrap(), EntityColor::Neutral);
        let far = Body::new(Aabb::new(Vec2::new(3.0, 3.0), Vec2::new(4.0, 4.0)).unwrap(), EntityColor::Enemy);

        assert!(overlap_bodies(&player, &crate_box));
        assert!(overlap_bodies(&crate_box, &player));
        assert!(!overlap_bodies(&player, &far));

        assert!(body_contains_point(&player, Vec2::new(1.2, 1.2)));
        assert!(!body_contains_point(&player, Vec2::new(1.4, 1.4)));
        assert!(body_contains_point(&crate_box, Vec2::new(2.4, 1.5)));
        assert!(!body_contains_point(&far, Vec2::new(2.9, 3.5)));
    }

    #[test]
    fn overlaps() {
        let tri: Shape = Polygon::new(Vec2::new(0.0, 0.0), vec![Vec2::new(0.0, 1.0), Vec2::new(1.0, -1.0), Vec2::new(-1.0, -1.0)])
            .unwrap()
            .into();
        let boxed: Shape = Aabb::new(Vec2::new(0.5, 0.5), Vec2::new(1.5, 1.5)).unwrap().into();
        let far_box: Shape = Aabb::new(Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0)).unwrap().into();

        assert!(overlap_shapes(&ball(0.0, 0.0, 1.0), &ball(1.5, 0.0, 0.5)));
        assert!(!overlap_shapes(&ball(0.0, 0.0, 1.0), &ball(1.6, 0.0, 0.5)));

        // circle swallowing a whole polygon, and a polygon swallowing a circle
        assert!(overlap_shapes(&ball(0.0, 0.0, 5.0), &tri));
        assert!(overlap_shapes(&tri, &ball(0.0, -0.5, 0.1)));
        assert!(overlap_shapes(&ball(1.6, 1.0, 0.2), &boxed));
        assert!(!overlap_shapes(&boxed, &ball(2.0, 2.0, 0.3)));

        let low_box: Shape = Aabb::new(Vec2::new(0.2, -0.2), Vec2::new(1.2, 0.8)).unwrap().into();
        assert!(overlap_shapes(&tri, &low_box));
        assert!(!overlap_shapes(&tri, &boxed));
        assert!(!overlap_shapes(&far_box, &tri));
        assert!(!overlap_shapes(&far_box, &boxed));

        // a cross: neither holds a vertex of the other
        let tall: Shape = Aabb::new(Vec2::new(-0.1, -1.0), Vec2::new(0.1, 1.0)).unwrap().to_polygon().into();
        let wide: Shape = Aabb::new(Vec2::new(-1.0, -0.1), Vec2::new(1.0, 0.1)).unwrap().to_polygon().into();
        assert!(overlap_shapes(&tall, &wide));
    }

    #[test]
    fn sight_lines() {
        // pillar at (2, 1)
        let mut world = World::from_codes(5, 3, &[0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let eye = Vec2::new(0.5, 1.5);
        match line_of_sight_world(eye, Vec2::new(4.5, 1.5), &world) {
            Sight::Blocked(block) => {
                assert_abs_diff_eq!(block.point, Vec2::new(2.0, 1.5), epsilon = 1e-5);
                assert_abs_diff_eq!(block.edge.normal(), Vec2::new(-1.0, 0.0));
            }
            other => panic!("expected a block, got {:?}", other),
        }
        assert!(line_of_sight_world(Vec2::new(0.5, 2.5), Vec2::new(4.5, 2.5), &world).is_clear());

        // enemy-colored doors let enemies see through, red ones don't
        let enemies = world.register_door(Door::barrier(0, 1, Side::Right, EdgeColor::Enemies)).unwrap();
        world.close_door(enemies).unwrap();
        match line_of_sight_world(eye, Vec2::new(4.5, 1.5), &world) {
            Sight::Blocked(block) => assert_abs_diff_eq!(block.point.x, 2.0, epsilon = 1e-5),
            other => panic!("expected a block, got {:?}", other),
        }
        world.open_door(enemies).unwrap();
        let red = world.register_door(Door::barrier(0, 1, Side::Right, EdgeColor::Red)).unwrap();
        world.close_door(red).unwrap();
        match line_of_sight_world(eye, Vec2::new(4.5, 1.5), &world) {
            Sight::Blocked(block) => assert_abs_diff_eq!(block.point.x, 1.0, epsilon = 1e-5),
            other => panic!("expected a block, got {:?}", other),
        }

        let world = world.with_config(Config { sight_max_distance_sq: 4.0, ..Config::default() });
        assert_eq!(line_of_sight_world(Vec2::new(0.5, 2.5), Vec2::new(4.5, 2.5), &world), Sight::OutOfRange);
    }
}

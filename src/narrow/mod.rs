//! Narrowphase data and logic module.

pub mod swept;

use crate::{error::ShapeError, Fp, Vec2, PARALLEL_EPSILON};
use approx::AbsDiffEq;
use std::borrow::Cow;

/// Slack allowed when checking that every vertex lies behind every side of a polygon.
const CONVEXITY_TOLERANCE: Fp = 1e-5;

// ---------- Point & Line ---------- //

/// A directed line segment. The normal is `perp(end - start)`, normalized: with y up and
/// solid matter wound clockwise, it points out into free space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
    pub normal: Vec2,
}
impl Segment {
    #[inline]
    pub fn new(start: Vec2, end: Vec2) -> Segment {
        Segment { start, end, normal: (end - start).perp().normalize_or_zero() }
    }

    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }
    #[inline]
    pub fn length_squared(&self) -> Fp {
        self.direction().length_squared()
    }
    #[inline]
    pub fn translate(self, offset: Vec2) -> Segment {
        Segment { start: self.start + offset, end: self.end + offset, normal: self.normal }
    }
    #[inline]
    pub fn reversed(self) -> Segment {
        Segment::new(self.end, self.start)
    }
    #[inline]
    pub fn point_at(&self, t: Fp) -> Vec2 {
        self.start + self.direction() * t
    }

    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        //! Returns the point of the segment nearest to `p`.
        let d = self.direction();
        let len2 = d.length_squared();
        if len2 < PARALLEL_EPSILON {
            return self.start;
        }
        let t = (p - self.start).dot(d) / len2;
        if t <= 0.0 {
            self.start
        } else if t >= 1.0 {
            self.end
        } else {
            self.start + d * t
        }
    }

    #[inline]
    pub fn signed_distance(&self, p: Vec2) -> Fp {
        //! Distance of `p` from the segment's line along its normal; negative behind it.
        self.normal.dot(p - self.start)
    }
}

/// Result of a segment-segment intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    /// Proportion along the first segment.
    pub ta: Fp,
    /// Proportion along the second segment.
    pub tb: Fp,
    pub point: Vec2,
}

pub fn intersect_segments(a: &Segment, b: &Segment) -> Option<SegmentHit> {
    //! Returns where segments `a` and `b` cross. Near-parallel segments never intersect.
    let da = a.direction();
    let db = b.direction();

    let cross = da.perp_dot(db);
    if cross.abs() < PARALLEL_EPSILON {
        return None; // guard against colinearity
    }

    let w = b.start - a.start;
    let ta = w.perp_dot(db) / cross;
    if ta < 0.0 || ta > 1.0 {
        return None; // seg a guard
    }
    let tb = w.perp_dot(da) / cross;
    if tb < 0.0 || tb > 1.0 {
        return None; // seg b guard
    }

    Some(SegmentHit { ta, tb, point: a.start + da * ta })
}

pub fn intersect_circle_line(circle: &Circle, a: Vec2, b: Vec2) -> Option<(Fp, Fp)> {
    //! Returns both coefficients along the infinite line `a->b` where it crosses the circle,
    //! smallest first. Does not return tangents.
    let ab = b - a;
    let qa = ab.length_squared();
    if qa < PARALLEL_EPSILON {
        return None;
    }
    let ca = a - circle.center;
    let qb = 2.0 * ca.dot(ab);
    let qc = ca.length_squared() - circle.radius * circle.radius;

    let discr = qb * qb - 4.0 * qa * qc;
    if discr <= 0.0 {
        return None;
    }
    let root = discr.sqrt();
    let inv = 0.5 / qa;
    Some(((-qb - root) * inv, (-qb + root) * inv))
}
#[inline]
pub fn intersect_circle_segment(circle: &Circle, a: Vec2, b: Vec2) -> Option<Fp> {
    //! Returns the earliest coefficient along `a->b` where the segment crosses the circle's boundary.
    let (t0, t1) = intersect_circle_line(circle, a, b)?;
    if (0.0..=1.0).contains(&t0) {
        Some(t0)
    } else if (0.0..=1.0).contains(&t1) {
        Some(t1)
    } else {
        None
    }
}

/// A swept contact against a boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub point: Vec2,
    /// Unit normal pointing away from the surface, into free space.
    pub normal: Vec2,
    /// Fraction of the attempted displacement completed when contact occurs.
    pub proportion: Fp,
}
impl AbsDiffEq for Contact {
    type Epsilon = Fp;

    fn default_epsilon() -> Fp {
        Fp::EPSILON
    }
    fn abs_diff_eq(&self, other: &Contact, epsilon: Fp) -> bool {
        self.point.abs_diff_eq(other.point, epsilon)
            && self.normal.abs_diff_eq(other.normal, epsilon)
            && Fp::abs_diff_eq(&self.proportion, &other.proportion, epsilon)
    }
}

// ---------- Shapes ---------- //

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: Fp,
}
impl Circle {
    pub fn new(center: Vec2, radius: Fp) -> Result<Circle, ShapeError> {
        if radius.is_finite() && radius > 0.0 {
            Ok(Circle { center, radius })
        } else {
            Err(ShapeError::InvalidRadius(radius))
        }
    }
    #[inline]
    pub fn translate(self, offset: Vec2) -> Circle {
        Circle { center: self.center + offset, radius: self.radius }
    }
    #[inline]
    pub fn bounding_box(&self) -> Aabb {
        let splat = Vec2::splat(self.radius);
        Aabb { min: self.center - splat, max: self.center + splat }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}
impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Result<Aabb, ShapeError> {
        //! Rejects boxes whose minimum exceeds their maximum on either axis.
        if min.x <= max.x && min.y <= max.y {
            Ok(Aabb { min, max })
        } else {
            Err(ShapeError::InvertedExtents)
        }
    }
    pub fn from_size(lower_left: Vec2, size: Vec2) -> Result<Aabb, ShapeError> {
        //! Builds the box spanning `lower_left` to `lower_left + size`.
        if size.x < 0.0 || size.y < 0.0 || !size.is_finite() {
            Err(ShapeError::InvertedExtents)
        } else {
            Ok(Aabb { min: lower_left, max: lower_left + size })
        }
    }
    pub fn from_corners(a: Vec2, b: Vec2) -> Aabb {
        //! Orders minimum and maximum values.
        Aabb { min: a.min(b), max: a.max(b) }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
    #[inline]
    pub fn minx_maxy(self) -> Vec2 {
        Vec2::new(self.min.x, self.max.y)
    }
    #[inline]
    pub fn maxx_miny(self) -> Vec2 {
        Vec2::new(self.max.x, self.min.y)
    }
    #[inline]
    pub fn translate(self, offset: Vec2) -> Aabb {
        Aabb { min: self.min + offset, max: self.max + offset }
    }
    #[inline]
    pub fn expand(self, margin: Fp) -> Aabb {
        let splat = Vec2::splat(margin);
        Aabb { min: self.min - splat, max: self.max + splat }
    }
    #[inline]
    pub fn union(self, other: Aabb) -> Aabb {
        Aabb { min: self.min.min(other.min), max: self.max.max(other.max) }
    }
    #[inline]
    pub fn broaden(&self, dir: Vec2) -> Aabb {
        //! Returns the box covering `self` swept along `dir`.
        self.union(self.translate(dir))
    }

    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        //! Touching boxes overlap.
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
    #[inline]
    pub fn overlaps_strictly(&self, other: &Aabb) -> bool {
        //! Touching boxes do not overlap.
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn to_polygon(&self) -> Polygon {
        //! Returns the equivalent clockwise four-vertex polygon.
        let half = self.size() * 0.5;
        Polygon::from_wound(
            self.center(),
            vec![
                Vec2::new(-half.x, half.y),
                Vec2::new(half.x, half.y),
                Vec2::new(half.x, -half.y),
                Vec2::new(-half.x, -half.y),
            ],
        )
    }
}

/// A 2D convex polygon about `center`, local vertices arranged clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    center: Vec2,
    verts: Vec<Vec2>,
    /// `segs[i]` runs from `verts[i]` to `verts[i + 1]`, wrapping.
    segs: Vec<Segment>,
    aabb: Aabb,
}
impl Polygon {
    /// `verts` are relative to `center` and must form a convex polygon wound clockwise.
    pub fn new(center: Vec2, verts: Vec<Vec2>) -> Result<Polygon, ShapeError> {
        let len = verts.len();
        if len < 3 {
            return Err(ShapeError::TooFewVertices(len));
        }
        for i in 0..len {
            let a = verts[i];
            let b = verts[(i + 1) % len];
            if (b - a).length_squared() < PARALLEL_EPSILON {
                return Err(ShapeError::DegenerateSide(i));
            }
            let n = (b - a).perp().normalize();
            for (j, v) in verts.iter().enumerate() {
                if n.dot(*v - a) > CONVEXITY_TOLERANCE {
                    return Err(ShapeError::NotConvexClockwise { side: i, vertex: j });
                }
            }
        }
        Ok(Polygon::from_wound(center, verts))
    }
    /// Skips validation; `verts` are trusted to be convex and clockwise.
    pub(crate) fn from_wound(center: Vec2, verts: Vec<Vec2>) -> Polygon {
        let len = verts.len();
        let mut segs = Vec::with_capacity(len);
        let (mut min, mut max) = (Vec2::splat(Fp::MAX), Vec2::splat(Fp::MIN));
        for i in 0..len {
            segs.push(Segment::new(verts[i], verts[(i + 1) % len]));
            min = min.min(verts[i]);
            max = max.max(verts[i]);
        }
        Polygon { center, verts, segs, aabb: Aabb { min, max } }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }
    #[inline]
    pub fn local_vertices(&self) -> &[Vec2] {
        &self.verts
    }
    #[inline]
    pub fn local_segments(&self) -> &[Segment] {
        &self.segs
    }
    #[inline]
    pub fn local_bounding_box(&self) -> Aabb {
        self.aabb
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vec2> + '_ {
        let c = self.center;
        self.verts.iter().map(move |v| *v + c)
    }
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        let c = self.center;
        self.segs.iter().map(move |s| s.translate(c))
    }
    #[inline]
    pub fn bounding_box(&self) -> Aabb {
        self.aabb.translate(self.center)
    }

    #[inline]
    pub fn translate(mut self, offset: Vec2) -> Polygon {
        self.center += offset;
        self
    }
}

// ---------- Shape ---------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Circle,
    Aabb,
    Polygon,
}

/// The dynamic geometry of an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Aabb(Aabb),
    Polygon(Polygon),
}
impl Shape {
    #[inline]
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Circle(_) => ShapeType::Circle,
            Shape::Aabb(_) => ShapeType::Aabb,
            Shape::Polygon(_) => ShapeType::Polygon,
        }
    }
    #[inline]
    pub fn center(&self) -> Vec2 {
        match self {
            Shape::Circle(c) => c.center,
            Shape::Aabb(a) => a.center(),
            Shape::Polygon(p) => p.center,
        }
    }
    pub fn move_by(&mut self, delta: Vec2) {
        match self {
            Shape::Circle(c) => c.center += delta,
            Shape::Aabb(a) => *a = a.translate(delta),
            Shape::Polygon(p) => p.center += delta,
        }
    }
    pub fn move_to(&mut self, point: Vec2) {
        let delta = point - self.center();
        self.move_by(delta);
    }
    #[inline]
    pub fn translated(&self, delta: Vec2) -> Shape {
        let mut moved = self.clone();
        moved.move_by(delta);
        moved
    }
    pub fn bounding_box(&self) -> Aabb {
        match self {
            Shape::Circle(c) => c.bounding_box(),
            Shape::Aabb(a) => *a,
            Shape::Polygon(p) => p.bounding_box(),
        }
    }

    pub fn to_polygon(&self) -> Option<Cow<'_, Polygon>> {
        //! Boxes convert into polygons, circles don't.
        match self {
            Shape::Circle(_) => None,
            Shape::Aabb(a) => Some(Cow::Owned(a.to_polygon())),
            Shape::Polygon(p) => Some(Cow::Borrowed(p)),
        }
    }

    pub fn innermost_point(&self, normal: Vec2) -> Vec2 {
        //! Returns the point of the shape furthest against `normal`.
        match self {
            Shape::Circle(c) => c.center - normal * c.radius,
            Shape::Aabb(a) => Vec2::new(
                if normal.x >= 0.0 { a.min.x } else { a.max.x },
                if normal.y >= 0.0 { a.min.y } else { a.max.y },
            ),
            Shape::Polygon(p) => {
                let mut best = p.center + p.verts[0];
                let mut best_dot = normal.dot(best);
                for v in p.vertices().skip(1) {
                    let dot = normal.dot(v);
                    if dot < best_dot {
                        best = v;
                        best_dot = dot;
                    }
                }
                best
            }
        }
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Shape::Circle(circle)
    }
}
impl From<Aabb> for Shape {
    fn from(aabb: Aabb) -> Self {
        Shape::Aabb(aabb)
    }
}
impl From<Polygon> for Shape {
    fn from(poly: Polygon) -> Self {
        Shape::Polygon(poly)
    }
}

// ---------- Containment & Intersection ---------- //

pub fn contains_point(shape: &Shape, point: Vec2) -> bool {
    match shape {
        Shape::Circle(c) => (point - c.center).length_squared() <= c.radius * c.radius,
        Shape::Aabb(a) => a.contains_point(point),
        Shape::Polygon(p) => polygon_contains_point(p, point),
    }
}
#[inline]
pub fn polygon_contains_point(poly: &Polygon, point: Vec2) -> bool {
    //! Half-plane test against every side; only valid for convex polygons.
    let local = point - poly.center;
    poly.segs.iter().all(|s| s.normal.dot(local - s.start) <= 0.0)
}

pub fn intersect_polygon_segment(poly: &Polygon, seg: &Segment) -> bool {
    //! Returns whether `seg` crosses any side of the polygon.
    poly.segments().any(|side| intersect_segments(&side, seg).is_some())
}

pub fn intersect_shape_segment(shape: &Shape, seg: &Segment) -> bool {
    match shape {
        Shape::Circle(c) => intersect_circle_segment(c, seg.start, seg.end).is_some(),
        Shape::Aabb(a) => intersect_polygon_segment(&a.to_polygon(), seg),
        Shape::Polygon(p) => intersect_polygon_segment(p, seg),
    }
}

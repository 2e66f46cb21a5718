use crate::{Fp, Vec2, narrow::{intersect_circle_line, intersect_segments, Circle, Contact, Polygon, Segment, Shape}};

// ---------- Sweep ---------- //

pub fn sweep_circle_edge(circle: &Circle, delta: Vec2, edge: &Segment) -> Option<Contact> {
    //! Earliest contact of `circle` moving along `delta` with the front of `edge`.
    let n = edge.normal;
    if n.dot(delta) >= 0.0 {
        return None; // moving away from, or along, the edge
    }
    let (c, rad) = (circle.center, circle.radius);
    let d = edge.direction();
    let len2 = d.length_squared();

    // already within a radius of the face: contact before any movement
    let dist = edge.signed_distance(c);
    if dist >= 0.0 && dist < rad && len2 > 0.0 {
        let along = (c - edge.start).dot(d) / len2;
        if (0.0..=1.0).contains(&along) {
            return Some(Contact { point: edge.start + d * along, normal: n, proportion: 0.0 });
        }
    }

    // face: the center's path against the edge pushed out by the radius
    let path = Segment::new(c, c + delta);
    let mut best = intersect_segments(&path, &edge.translate(n * rad))
        .map(|hit| Contact { point: edge.point_at(hit.tb), normal: n, proportion: hit.ta });

    // endpoints: the center's path against a radius-sized circle about each end
    for &p in [edge.start, edge.end].iter() {
        let to_center = c - p;
        if to_center.length_squared() < rad * rad {
            if to_center.dot(delta) < 0.0 {
                return Some(Contact { point: p, normal: to_center.normalize_or_zero(), proportion: 0.0 });
            }
            continue;
        }
        let corner = Circle { center: p, radius: rad };
        if let Some((t, _)) = intersect_circle_line(&corner, c, c + delta) {
            if t < 0.0 || t > 1.0 || best.map_or(false, |b| b.proportion <= t) {
                continue;
            }
            let normal = (c + delta * t - p) / rad;
            if normal.dot(delta) < 0.0 {
                best = Some(Contact { point: p, normal, proportion: t });
            }
        }
    }
    best
}

pub fn sweep_polygon_edge(poly: &Polygon, delta: Vec2, edge: &Segment) -> Option<Contact> {
    //! Earliest contact of `poly` moving along `delta` with the front of `edge`.
    if edge.normal.dot(delta) >= 0.0 {
        return None;
    }
    let mut best: Option<Contact> = None;
    let mut immenence = Fp::MAX; // proportion until collision

    // polygon vertices travelling into the edge
    for v in poly.vertices() {
        if let Some(hit) = intersect_segments(&Segment::new(v, v + delta), edge) {
            if hit.ta < immenence {
                immenence = hit.ta;
                best = Some(Contact { point: hit.point, normal: edge.normal, proportion: hit.ta });
            }
        }
    }
    // edge endpoints travelling backwards into the polygon's leading sides
    for &p in [edge.start, edge.end].iter() {
        let path = Segment::new(p, p - delta);
        for side in poly.segments() {
            if side.normal.dot(delta) <= 0.0 {
                continue;
            }
            if let Some(hit) = intersect_segments(&path, &side) {
                if hit.ta < immenence {
                    immenence = hit.ta;
                    best = Some(Contact { point: p, normal: -side.normal, proportion: hit.ta });
                }
            }
        }
    }
    best
}

pub fn sweep_shape_edge(shape: &Shape, delta: Vec2, edge: &Segment) -> Option<Contact> {
    match shape {
        Shape::Circle(c) => sweep_circle_edge(c, delta, edge),
        Shape::Aabb(a) => sweep_polygon_edge(&a.to_polygon(), delta, edge),
        Shape::Polygon(p) => sweep_polygon_edge(p, delta, edge),
    }
}

pub fn earliest_contact<'a, I>(shape: &Shape, delta: Vec2, edges: I) -> Option<Contact>
where
    I: IntoIterator<Item = &'a Segment>,
{
    //! Sweeps `shape` against every edge, returning the contact with the least proportion.
    fn earliest<'a>(edges: impl Iterator<Item = &'a Segment>, sweep: impl Fn(&Segment) -> Option<Contact>) -> Option<Contact> {
        let mut best: Option<Contact> = None;
        for edge in edges {
            if let Some(contact) = sweep(edge) {
                if best.map_or(true, |b| contact.proportion < b.proportion) {
                    best = Some(contact);
                }
            }
        }
        best
    }

    let edges = edges.into_iter();
    match shape {
        Shape::Circle(c) => earliest(edges, |e| sweep_circle_edge(c, delta, e)),
        Shape::Aabb(a) => {
            let poly = a.to_polygon();
            earliest(edges, |e| sweep_polygon_edge(&poly, delta, e))
        }
        Shape::Polygon(p) => earliest(edges, |e| sweep_polygon_edge(p, delta, e)),
    }
}

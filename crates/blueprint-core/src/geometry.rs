//! Pure geometry helpers shared by hit-testing, snapping and room detection.
//!
//! Every function here is total: degenerate input (zero-length segments,
//! empty point lists, parallel lines) yields a neutral result instead of
//! panicking, so a malformed entity can never take down the interaction loop.

use kurbo::{Point, Rect, Vec2};

/// Epsilon used to keep ray casting away from a division by zero on
/// horizontal edges.
pub const RAY_EPSILON: f64 = 1e-5;

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
///
/// A single point degenerates to point distance; an empty slice is infinitely far.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Intersection point of segments (a-b) and (c-d).
///
/// Uses the parametric form `a + t(b-a) = c + u(d-c)` with `t, u ∈ [0, 1]`.
/// Parallel and collinear pairs (zero denominator) report no intersection.
pub fn segment_intersection(a: Point, b: Point, c: Point, d: Point) -> Option<Point> {
    let r = b - a;
    let s = d - c;
    let denom = r.cross(s);
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let ac = c - a;
    let t = ac.cross(s) / denom;
    let u = ac.cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a + r * t)
    } else {
        None
    }
}

/// Ray-casting point-in-polygon test.
///
/// The polygon is implicitly closed. Fewer than three vertices never contain anything.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > point.y) != (pj.y > point.y) {
            let x_cross = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y + RAY_EPSILON) + pi.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed shoelace area. Positive when the vertices turn from +x towards +y.
pub fn signed_polygon_area(polygon: &[Point]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, p) in polygon.iter().enumerate() {
        let q = polygon[(i + 1) % polygon.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    sum / 2.0
}

/// Absolute area of a simple polygon (shoelace formula).
pub fn polygon_area(polygon: &[Point]) -> f64 {
    signed_polygon_area(polygon).abs()
}

/// Axis-aligned bounding box of a point set, `None` when empty.
pub fn points_bounds(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let mut bounds = Rect::from_points(*first, *first);
    for p in &points[1..] {
        bounds = bounds.union_pt(*p);
    }
    Some(bounds)
}

/// Union of a sequence of rectangles, `None` when the sequence is empty.
pub fn union_bounds<I: IntoIterator<Item = Rect>>(rects: I) -> Option<Rect> {
    rects.into_iter().reduce(|acc, r| acc.union(r))
}

/// Inclusive containment test (kurbo's `Rect::contains` is half-open).
pub fn rect_contains_inclusive(rect: Rect, point: Point) -> bool {
    let rect = rect.abs();
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Whether two axis-aligned rectangles overlap (touching edges count).
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    let a = a.abs();
    let b = b.abs();
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Axis-aligned rectangle spanned by two arbitrary corners.
pub fn rect_from_corners(a: Point, b: Point) -> Rect {
    Rect::from_points(a, b).abs()
}

/// Midpoint of a segment.
pub fn midpoint(a: Point, b: Point) -> Point {
    a.midpoint(b)
}

/// Rotate a vector by `angle` radians.
pub fn rotate_vec(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

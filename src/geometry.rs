//! Planar geometry helpers shared by the contour engine.
//!
//! All routines work on `Vec2 = nalgebra::Vector2<f64>` and treat polygons as
//! closed point sequences (the last point connects back to the first).

use nalgebra::Vector2;

/// Point / vector type used throughout the engine.
pub type Vec2 = Vector2<f64>;

pub(crate) const EPS: f64 = 1e-9;

/// Unit vector in the direction of `v`, or zero for a degenerate input.
#[inline]
pub fn unit_or_zero(v: Vec2) -> Vec2 {
    let n = v.norm();
    if n > EPS {
        v / n
    } else {
        Vec2::zeros()
    }
}

/// Rotate `v` by +90° (counter-clockwise in an x-right / y-up frame).
#[inline]
pub fn rotate_ccw(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// 2D cross product (z component of the 3D cross product).
#[inline]
pub fn cross(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Proper intersection of segments `p0→p1` and `q0→q1`.
///
/// Returns the crossing point and the parameters `(t, u)` along both segments
/// when both lie strictly inside `(0, 1)`. Touching endpoints and collinear
/// overlaps are not reported.
pub fn segment_intersection(p0: &Vec2, p1: &Vec2, q0: &Vec2, q1: &Vec2) -> Option<(Vec2, f64, f64)> {
    let r = p1 - p0;
    let s = q1 - q0;
    let denom = cross(&r, &s);
    if denom.abs() < EPS {
        return None;
    }
    let qp = q0 - p0;
    let t = cross(&qp, &s) / denom;
    let u = cross(&qp, &r) / denom;
    if t > 0.0 && t < 1.0 && u > 0.0 && u < 1.0 {
        Some((p0 + r * t, t, u))
    } else {
        None
    }
}

/// Euclidean distance from `p` to the closed segment `a→b`.
pub fn point_segment_distance(p: &Vec2, a: &Vec2, b: &Vec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < EPS {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Shoelace signed area; positive for counter-clockwise order (y-up frame).
pub fn signed_area(points: &[Vec2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        acc += cross(p, q);
    }
    0.5 * acc
}

/// Sum of edge lengths of the closed polygon.
pub fn perimeter(points: &[Vec2]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (points[(i + 1) % points.len()] - p).norm())
        .sum()
}

/// Area centroid of the closed polygon.
///
/// Falls back to the vertex mean when the polygon has (nearly) zero area.
pub fn centroid(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::zeros();
    }
    let area = signed_area(points);
    if area.abs() < EPS {
        let sum: Vec2 = points.iter().sum();
        return sum / points.len() as f64;
    }
    let mut c = Vec2::zeros();
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        let w = cross(p, q);
        c += (p + q) * w;
    }
    c / (6.0 * area)
}

/// Even-odd point-in-polygon test.
pub fn point_in_polygon(p: &Vec2, points: &[Vec2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = &points[i];
        let b = &points[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Regular polygon with `count` vertices on a circle, counter-clockwise.
pub fn regular_polygon(center: Vec2, radius: f64, count: usize) -> Vec<Vec2> {
    let count = count.max(3);
    (0..count)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / count as f64;
            center + Vec2::new(radius * a.cos(), radius * a.sin())
        })
        .collect()
}

/// Whether any two non-adjacent edges of the closed polygon properly cross.
pub fn has_self_intersection(points: &[Vec2]) -> bool {
    let n = points.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let a0 = &points[i];
        let a1 = &points[(i + 1) % n];
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let b0 = &points[j];
            let b1 = &points[(j + 1) % n];
            if segment_intersection(a0, a1, b0, b1).is_some() {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn crossing_segments_report_point_and_parameters() {
        let hit = segment_intersection(
            &Vec2::new(20.0, 20.0),
            &Vec2::new(6.0, 20.0),
            &Vec2::new(12.0, 24.0),
            &Vec2::new(12.0, 16.0),
        )
        .expect("segments cross");
        assert!(approx_eq(hit.0.x, 12.0) && approx_eq(hit.0.y, 20.0));
        assert!(approx_eq(hit.1, 8.0 / 14.0));
        assert!(approx_eq(hit.2, 0.5));
    }

    #[test]
    fn touching_and_parallel_segments_do_not_intersect() {
        let a0 = Vec2::new(0.0, 0.0);
        let a1 = Vec2::new(1.0, 0.0);
        assert!(segment_intersection(&a0, &a1, &Vec2::new(1.0, 0.0), &Vec2::new(1.0, 1.0)).is_none());
        assert!(segment_intersection(&a0, &a1, &Vec2::new(0.0, 1.0), &Vec2::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn point_segment_distance_clamps_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(4.0, 0.0);
        assert!(approx_eq(point_segment_distance(&Vec2::new(2.0, 3.0), &a, &b), 3.0));
        assert!(approx_eq(point_segment_distance(&Vec2::new(7.0, 4.0), &a, &b), 5.0));
    }

    #[test]
    fn square_area_centroid_and_perimeter() {
        let sq = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        assert!(approx_eq(signed_area(&sq), 4.0));
        let c = centroid(&sq);
        assert!(approx_eq(c.x, 1.0) && approx_eq(c.y, 1.0));
        assert!(approx_eq(perimeter(&sq), 8.0));
        assert!(point_in_polygon(&Vec2::new(1.0, 1.5), &sq));
        assert!(!point_in_polygon(&Vec2::new(3.0, 1.0), &sq));
    }

    #[test]
    fn bow_tie_is_self_intersecting() {
        let bow = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, 2.0),
        ];
        assert!(has_self_intersection(&bow));
        assert!(!has_self_intersection(&regular_polygon(Vec2::zeros(), 5.0, 12)));
    }
}

use bevy::math::DVec3;

use crate::{math::EPSILON12, Line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersect {
    Outside,
    Intersecting,
    Inside,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub stop: f64,
}
impl Interval {
    pub fn new(start: f64, stop: f64) -> Self {
        Self { start, stop }
    }
}

pub struct IntersectionTests;
impl IntersectionTests {
    /// Möller–Trumbore; returns the line parameter of the hit, front or back face.
    pub fn line_triangle(line: &Line, p0: DVec3, p1: DVec3, p2: DVec3) -> Option<f64> {
        let edge0 = p1 - p0;
        let edge1 = p2 - p0;
        let p = line.direction.cross(edge1);
        let det = edge0.dot(p);
        if det.abs() < EPSILON12 * edge0.length() * edge1.length() {
            return None;
        }
        let inv_det = 1.0 / det;
        let tvec = line.origin - p0;
        let u = tvec.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = tvec.cross(edge0);
        let v = line.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        return Some(edge1.dot(q) * inv_det);
    }
    /// Parameters where the line enters and leaves the sphere.
    pub fn line_sphere(line: &Line, center: DVec3, radius: f64) -> Option<Interval> {
        let origin = line.origin - center;
        let a = line.direction.length_squared();
        let b = 2.0 * origin.dot(line.direction);
        let c = origin.length_squared() - radius * radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        // avoid cancellation
        let q = if b < 0.0 { -0.5 * (b - root) } else { -0.5 * (b + root) };
        let mut t0 = q / a;
        let mut t1 = if q != 0.0 { c / q } else { t0 };
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        return Some(Interval::new(t0, t1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::equals_epsilon;

    #[test]
    fn line_hits_triangle() {
        let line = Line::new(DVec3::new(0.25, 0.25, 5.0), DVec3::new(0.0, 0.0, -1.0)).unwrap();
        let t = IntersectionTests::line_triangle(&line, DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
        assert!(equals_epsilon(t, 5.0, Some(EPSILON12), None));
    }
    #[test]
    fn line_misses_triangle() {
        let line = Line::new(DVec3::new(0.75, 0.75, 5.0), DVec3::new(0.0, 0.0, -1.0)).unwrap();
        assert!(IntersectionTests::line_triangle(&line, DVec3::ZERO, DVec3::X, DVec3::Y).is_none());
        let parallel = Line::new(DVec3::new(0.1, 0.1, 1.0), DVec3::X).unwrap();
        assert!(
            IntersectionTests::line_triangle(&parallel, DVec3::ZERO, DVec3::X, DVec3::Y).is_none()
        );
    }
    #[test]
    fn line_sphere_work() {
        let line = Line::new(DVec3::new(-10.0, 0.0, 0.0), DVec3::X).unwrap();
        let interval = IntersectionTests::line_sphere(&line, DVec3::ZERO, 2.0).unwrap();
        assert!(equals_epsilon(interval.start, 8.0, Some(EPSILON12), None));
        assert!(equals_epsilon(interval.stop, 12.0, Some(EPSILON12), None));
        let miss = Line::new(DVec3::new(-10.0, 5.0, 0.0), DVec3::X).unwrap();
        assert!(IntersectionTests::line_sphere(&miss, DVec3::ZERO, 2.0).is_none());
    }
}

use bevy::math::DVec3;

use crate::{math::EPSILON15, GeometryError};

/// A parametric line `origin + t * direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub origin: DVec3,
    pub direction: DVec3,
}
impl Line {
    pub fn new(origin: DVec3, direction: DVec3) -> Result<Self, GeometryError> {
        if !origin.is_finite() || !direction.is_finite() {
            return Err(GeometryError::NonFinite("line"));
        }
        if direction.length_squared() < EPSILON15 {
            return Err(GeometryError::ZeroDirection);
        }
        Ok(Self { origin, direction })
    }
    /// Direction runs from `a` to `b`, unnormalized, so `point_at(1.0) == b`.
    pub fn from_segment(a: DVec3, b: DVec3) -> Result<Self, GeometryError> {
        return Line::new(a, b - a);
    }
    pub fn point_at(&self, t: f64) -> DVec3 {
        return self.origin + self.direction * t;
    }
    pub fn nearest_point_to(&self, point: DVec3) -> DVec3 {
        let t = (point - self.origin).dot(self.direction) / self.direction.length_squared();
        return self.point_at(t);
    }
    pub fn distance_to(&self, point: DVec3) -> f64 {
        return point.distance(self.nearest_point_to(point));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_point_and_distance() {
        let line = Line::new(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0)).unwrap();
        assert_eq!(
            line.nearest_point_to(DVec3::new(3.0, 4.0, 0.0)),
            DVec3::new(3.0, 0.0, 0.0)
        );
        assert_eq!(line.distance_to(DVec3::new(3.0, 4.0, 0.0)), 4.0);
    }
    #[test]
    fn segment_endpoints() {
        let a = DVec3::new(1.0, 2.0, 3.0);
        let b = DVec3::new(4.0, 6.0, 3.0);
        let line = Line::from_segment(a, b).unwrap();
        assert_eq!(line.point_at(0.0), a);
        assert_eq!(line.point_at(1.0), b);
        assert!(Line::from_segment(a, a).is_err());
    }
}

use bevy::math::{DVec3, DVec4};

use crate::{math::EPSILON15, GeometryError, Line};

/// A plane in Hessian normal form: `normal · p + distance = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub distance: f64,
}
impl Plane {
    /// Normalizes `normal` and scales `distance` to match.
    pub fn new(normal: DVec3, distance: f64) -> Result<Self, GeometryError> {
        if !normal.is_finite() || !distance.is_finite() {
            return Err(GeometryError::NonFinite("plane"));
        }
        let length = normal.length();
        if length < EPSILON15 {
            return Err(GeometryError::ZeroNormal);
        }
        Ok(Self {
            normal: normal / length,
            distance: distance / length,
        })
    }
    pub fn from_vec4(coefficients: &DVec4) -> Result<Self, GeometryError> {
        return Plane::new(coefficients.truncate(), coefficients.w);
    }
    pub fn from_point_normal(point: &DVec3, normal: &DVec3) -> Result<Self, GeometryError> {
        let plane = Plane::new(*normal, 0.0)?;
        return Ok(Self {
            normal: plane.normal,
            distance: -plane.normal.dot(*point),
        });
    }
    pub fn to_vec4(&self) -> DVec4 {
        return self.normal.extend(self.distance);
    }
    /// Signed distance; positive on the side the normal points to.
    pub fn distance_to(&self, point: DVec3) -> f64 {
        return self.normal.dot(point) + self.distance;
    }
    pub fn project_point(&self, point: DVec3) -> DVec3 {
        return point - self.normal * self.distance_to(point);
    }
    /// `None` when the line is parallel to the plane.
    pub fn intersect(&self, line: &Line) -> Option<DVec3> {
        let denominator = self.normal.dot(line.direction);
        if denominator.abs() < EPSILON15 {
            return None;
        }
        let t = -self.distance_to(line.origin) / denominator;
        return Some(line.point_at(t));
    }
    /// Intersection with the closed segment `[a, b]`.
    pub fn intersect_segment(&self, a: DVec3, b: DVec3) -> Option<DVec3> {
        let da = self.distance_to(a);
        let db = self.distance_to(b);
        if da * db > 0.0 {
            return None;
        }
        if (da - db).abs() < EPSILON15 {
            // segment lies in the plane
            return if da.abs() < EPSILON15 { Some(a) } else { None };
        }
        let t = da / (da - db);
        return Some(a + (b - a) * t);
    }
}

use bevy::math::{DMat4, DVec3, DVec4};

use crate::{Extent, GeometryError, Intersect, Plane};

/// Six inward-facing planes: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}
impl Frustum {
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }
    /// Extracts the planes of an OpenGL-style clip matrix (depth in [-1, 1]).
    ///
    /// With `projection * model_view` the planes come out in model
    /// coordinates; with a bare projection they are in eye coordinates.
    pub fn from_matrix(matrix: &DMat4) -> Result<Self, GeometryError> {
        let r0 = matrix.row(0);
        let r1 = matrix.row(1);
        let r2 = matrix.row(2);
        let r3 = matrix.row(3);
        let coefficients: [DVec4; 6] = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2];
        let mut planes = [Plane::default(); 6];
        for (plane, c) in planes.iter_mut().zip(coefficients.iter()) {
            *plane = Plane::from_vec4(c)?;
        }
        Ok(Self { planes })
    }
    /// Symmetric perspective frustum in eye coordinates.
    pub fn from_perspective(
        field_of_view: f64,
        aspect_ratio: f64,
        near: f64,
        far: f64,
    ) -> Result<Self, GeometryError> {
        let projection = DMat4::perspective_rh_gl(field_of_view, aspect_ratio, near, far);
        return Frustum::from_matrix(&projection);
    }
    pub fn left(&self) -> &Plane {
        &self.planes[0]
    }
    pub fn right(&self) -> &Plane {
        &self.planes[1]
    }
    pub fn bottom(&self) -> &Plane {
        &self.planes[2]
    }
    pub fn top(&self) -> &Plane {
        &self.planes[3]
    }
    pub fn near(&self) -> &Plane {
        &self.planes[4]
    }
    pub fn far(&self) -> &Plane {
        &self.planes[5]
    }
    pub fn compute_visibility(&self, extent: &dyn Extent) -> Intersect {
        let mut intersecting = false;
        for plane in self.planes.iter() {
            let result = extent.intersect_plane(plane);
            if result == Intersect::Outside {
                return Intersect::Outside;
            } else if result == Intersect::Intersecting {
                intersecting = true;
            }
        }
        return if intersecting {
            Intersect::Intersecting
        } else {
            Intersect::Inside
        };
    }
    pub fn intersects(&self, extent: &dyn Extent) -> bool {
        return self.compute_visibility(extent) != Intersect::Outside;
    }
    pub fn contains(&self, point: DVec3) -> bool {
        return self.planes.iter().all(|p| p.distance_to(point) >= 0.0);
    }
}

use bevy::math::{DMat4, DVec3};

use crate::{Frustum, GeometryError, Line};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}
impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }
    pub fn aspect_ratio(&self) -> f64 {
        if self.height <= 0.0 {
            return 1.0;
        }
        return self.width / self.height;
    }
}

/// Camera state for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    eye_point: DVec3,
    model_view: DMat4,
    projection: DMat4,
    viewport: Viewport,
    field_of_view: f64,
    near_distance: f64,
    far_distance: f64,
    frustum: Frustum,
}
impl View {
    pub fn new(
        model_view: DMat4,
        field_of_view: f64,
        viewport: Viewport,
        near_distance: f64,
        far_distance: f64,
    ) -> Result<Self, GeometryError> {
        if !model_view.is_finite() {
            return Err(GeometryError::NonFinite("model view matrix"));
        }
        let projection = DMat4::perspective_rh_gl(
            field_of_view,
            viewport.aspect_ratio(),
            near_distance,
            far_distance,
        );
        let frustum = Frustum::from_matrix(&(projection * model_view))?;
        let eye_point = model_view.inverse().transform_point3(DVec3::ZERO);
        Ok(Self {
            eye_point,
            model_view,
            projection,
            viewport,
            field_of_view,
            near_distance,
            far_distance,
            frustum,
        })
    }
    pub fn look_at(
        eye: DVec3,
        center: DVec3,
        up: DVec3,
        field_of_view: f64,
        viewport: Viewport,
        near_distance: f64,
        far_distance: f64,
    ) -> Result<Self, GeometryError> {
        if (center - eye).length_squared() == 0.0 {
            return Err(GeometryError::ZeroDirection);
        }
        let model_view = DMat4::look_at_rh(eye, center, up);
        return View::new(model_view, field_of_view, viewport, near_distance, far_distance);
    }
    pub fn eye_point(&self) -> DVec3 {
        self.eye_point
    }
    pub fn model_view(&self) -> &DMat4 {
        &self.model_view
    }
    pub fn projection(&self) -> &DMat4 {
        &self.projection
    }
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }
    pub fn field_of_view(&self) -> f64 {
        self.field_of_view
    }
    pub fn near_distance(&self) -> f64 {
        self.near_distance
    }
    pub fn far_distance(&self) -> f64 {
        self.far_distance
    }
    pub fn frustum_in_model_coordinates(&self) -> &Frustum {
        &self.frustum
    }
    pub fn forward(&self) -> DVec3 {
        return self
            .model_view
            .inverse()
            .transform_vector3(DVec3::NEG_Z)
            .normalize();
    }
    /// Size in meters of one pixel at `distance` from the eye.
    pub fn compute_pixel_size_at_distance(&self, distance: f64) -> f64 {
        let height = self.viewport.height.max(1.0);
        return 2.0 * distance.abs() * (0.5 * self.field_of_view).tan() / height;
    }
    /// Ray from the eye through the viewport center.
    pub fn center_line(&self) -> Result<Line, GeometryError> {
        return Line::new(self.eye_point, self.forward());
    }
}

use bevy::math::DVec3;

use super::equals_epsilon;

/// Cesium-style helpers on top of glam's `DVec3`.
pub trait Cartesian3 {
    fn equals_epsilon(
        &self,
        right: DVec3,
        relative_epsilon: Option<f64>,
        absolute_epsilon: Option<f64>,
    ) -> bool;
    fn divide_components(&self, right: &DVec3) -> DVec3;
    fn midpoint(&self, right: DVec3) -> DVec3;
    fn to_f32_array(&self) -> [f32; 3];
}
impl Cartesian3 for DVec3 {
    fn equals_epsilon(
        &self,
        right: DVec3,
        relative_epsilon: Option<f64>,
        absolute_epsilon: Option<f64>,
    ) -> bool {
        return *self == right
            || equals_epsilon(self.x, right.x, relative_epsilon, absolute_epsilon)
                && equals_epsilon(self.y, right.y, relative_epsilon, absolute_epsilon)
                && equals_epsilon(self.z, right.z, relative_epsilon, absolute_epsilon);
    }
    fn divide_components(&self, right: &DVec3) -> DVec3 {
        return DVec3::new(self.x / right.x, self.y / right.y, self.z / right.z);
    }
    fn midpoint(&self, right: DVec3) -> DVec3 {
        return (*self + right) * 0.5;
    }
    fn to_f32_array(&self) -> [f32; 3] {
        return [self.x as f32, self.y as f32, self.z as f32];
    }
}

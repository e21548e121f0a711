use std::{fmt, sync::Arc};

use bevy::math::DVec3;
use serde::{Deserialize, Serialize};

use crate::{
    math::{Cartesian3, EPSILON12, EPSILON14},
    Angle, ConfigError, ElevationModel, Position, ZeroElevationModel,
};

pub const WGS84_EQUATORIAL_RADIUS: f64 = 6378137.0;
pub const WGS84_POLAR_RADIUS: f64 = 6356752.3142451793;
pub const MARS_EQUATORIAL_RADIUS: f64 = 3396190.0;
pub const MARS_POLAR_RADIUS: f64 = 3376200.0;
pub const MOON_RADIUS: f64 = 1737400.0;

const MAX_POSITION_ITERATIONS: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub name: String,
    pub equatorial_radius: f64,
    pub polar_radius: f64,
}
impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            name: "Earth".to_string(),
            equatorial_radius: WGS84_EQUATORIAL_RADIUS,
            polar_radius: WGS84_POLAR_RADIUS,
        }
    }
}
impl GlobeConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GlobeConfig = serde_json::from_str(json)?;
        if !(config.equatorial_radius > 0.0 && config.polar_radius > 0.0)
            || config.polar_radius > config.equatorial_radius
        {
            return Err(ConfigError::Invalid(format!(
                "globe radii must be positive with polar <= equatorial, got {} and {}",
                config.equatorial_radius, config.polar_radius
            )));
        }
        Ok(config)
    }
}

/// An ellipsoid of revolution with an attached elevation model.
///
/// Points are earth-centered: Z runs along the polar axis and X points at
/// latitude 0, longitude 0.
#[derive(Clone)]
pub struct Globe {
    name: String,
    equatorial_radius: f64,
    polar_radius: f64,
    eccentricity_squared: f64,
    elevation_model: Arc<dyn ElevationModel>,
}
impl fmt::Debug for Globe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Globe")
            .field("name", &self.name)
            .field("equatorial_radius", &self.equatorial_radius)
            .field("polar_radius", &self.polar_radius)
            .finish()
    }
}
impl Default for Globe {
    fn default() -> Self {
        Self::earth()
    }
}
impl Globe {
    pub fn new(name: &str, equatorial_radius: f64, polar_radius: f64) -> Self {
        let ratio = polar_radius / equatorial_radius;
        Self {
            name: name.to_string(),
            equatorial_radius,
            polar_radius,
            eccentricity_squared: 1.0 - ratio * ratio,
            elevation_model: Arc::new(ZeroElevationModel::default()),
        }
    }
    pub fn from_config(config: &GlobeConfig) -> Self {
        Self::new(&config.name, config.equatorial_radius, config.polar_radius)
    }
    pub fn earth() -> Self {
        Self::new("Earth", WGS84_EQUATORIAL_RADIUS, WGS84_POLAR_RADIUS)
    }
    pub fn mars() -> Self {
        Self::new("Mars", MARS_EQUATORIAL_RADIUS, MARS_POLAR_RADIUS)
    }
    pub fn moon() -> Self {
        Self::new("Moon", MOON_RADIUS, MOON_RADIUS)
    }
    pub fn with_elevation_model(mut self, elevation_model: Arc<dyn ElevationModel>) -> Self {
        self.elevation_model = elevation_model;
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn equatorial_radius(&self) -> f64 {
        self.equatorial_radius
    }
    pub fn polar_radius(&self) -> f64 {
        self.polar_radius
    }
    pub fn eccentricity_squared(&self) -> f64 {
        self.eccentricity_squared
    }
    /// The largest radius of the ellipsoid.
    pub fn radius(&self) -> f64 {
        self.equatorial_radius.max(self.polar_radius)
    }
    /// Distance from the center to the surface at a geodetic latitude.
    pub fn radius_at_latitude(&self, latitude: Angle) -> f64 {
        let sin_lat = latitude.sin();
        let es = self.eccentricity_squared;
        let rpm = self.equatorial_radius / (1.0 - es * sin_lat * sin_lat).sqrt();
        return rpm * (1.0 + (es * es - 2.0 * es) * sin_lat * sin_lat).sqrt();
    }
    pub fn elevation_model(&self) -> &Arc<dyn ElevationModel> {
        &self.elevation_model
    }
    pub fn elevation(&self, latitude: Angle, longitude: Angle) -> f64 {
        self.elevation_model.get_elevation(latitude, longitude)
    }
    pub fn compute_point_from_position(
        &self,
        latitude: Angle,
        longitude: Angle,
        elevation: f64,
    ) -> DVec3 {
        let cos_lat = latitude.cos();
        let sin_lat = latitude.sin();
        let cos_lon = longitude.cos();
        let sin_lon = longitude.sin();
        let rpm = self.equatorial_radius
            / (1.0 - self.eccentricity_squared * sin_lat * sin_lat).sqrt();
        DVec3::new(
            (rpm + elevation) * cos_lat * cos_lon,
            (rpm + elevation) * cos_lat * sin_lon,
            (rpm * (1.0 - self.eccentricity_squared) + elevation) * sin_lat,
        )
    }
    pub fn compute_point(&self, position: &Position) -> DVec3 {
        self.compute_point_from_position(position.latitude, position.longitude, position.elevation)
    }
    /// Inverse of [`Globe::compute_point_from_position`]. Iterates a bounded
    /// number of times and returns the last estimate if it has not converged.
    pub fn compute_position_from_point(&self, point: DVec3) -> Position {
        let a = self.equatorial_radius;
        let es = self.eccentricity_squared;
        let p = (point.x * point.x + point.y * point.y).sqrt();
        let longitude = if p > 0.0 { point.y.atan2(point.x) } else { 0.0 };

        if p < EPSILON12 * a {
            let latitude = if point.z >= 0.0 { Angle::POS90 } else { Angle::NEG90 };
            return Position::new(
                latitude,
                Angle::from_radians(longitude),
                point.z.abs() - self.polar_radius,
            );
        }

        let mut latitude = point.z.atan2(p * (1.0 - es));
        for _ in 0..MAX_POSITION_ITERATIONS {
            let sin_lat = latitude.sin();
            let rpm = a / (1.0 - es * sin_lat * sin_lat).sqrt();
            let next = (point.z + es * rpm * sin_lat).atan2(p);
            let converged = (next - latitude).abs() < EPSILON14;
            latitude = next;
            if converged {
                break;
            }
        }
        let sin_lat = latitude.sin();
        let elevation =
            p * latitude.cos() + point.z * sin_lat - a * (1.0 - es * sin_lat * sin_lat).sqrt();
        Position::from_radians(latitude, longitude, elevation)
    }
    pub fn compute_surface_normal_at_location(&self, latitude: Angle, longitude: Angle) -> DVec3 {
        let cos_lat = latitude.cos();
        DVec3::new(
            cos_lat * longitude.cos(),
            cos_lat * longitude.sin(),
            latitude.sin(),
        )
    }
    pub fn compute_surface_normal_at_point(&self, point: DVec3) -> DVec3 {
        let a2 = self.equatorial_radius * self.equatorial_radius;
        let b2 = self.polar_radius * self.polar_radius;
        return point
            .divide_components(&DVec3::new(a2, a2, b2))
            .normalize_or_zero();
    }
}

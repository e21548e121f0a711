use serde::{Deserialize, Serialize};

use crate::Angle;

/// Geodetic position: latitude, longitude and elevation in meters.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: Angle,
    pub longitude: Angle,
    pub elevation: f64,
}
impl Position {
    pub const ZERO: Position = Position {
        latitude: Angle::ZERO,
        longitude: Angle::ZERO,
        elevation: 0.0,
    };
    pub fn new(latitude: Angle, longitude: Angle, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
        }
    }
    pub fn from_degrees(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self::new(
            Angle::from_degrees(latitude),
            Angle::from_degrees(longitude),
            elevation,
        )
    }
    pub fn from_radians(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self::new(
            Angle::from_radians(latitude),
            Angle::from_radians(longitude),
            elevation,
        )
    }
    pub fn equals_epsilon(&self, right: &Position, angle_epsilon: f64, meters: f64) -> bool {
        return (self.latitude - right.latitude).radians().abs() <= angle_epsilon
            && (self.longitude - right.longitude).radians().abs() <= angle_epsilon
            && (self.elevation - right.elevation).abs() <= meters;
    }
}

use std::{
    f64::consts::{FRAC_PI_2, PI, TAU},
    fmt,
    ops::{Add, Div, Mul, Neg, Sub},
};

use serde::{Deserialize, Serialize};

use crate::math::{equals_epsilon, negative_pi_to_pi};

/// An angle stored in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);
    pub const POS90: Angle = Angle(FRAC_PI_2);
    pub const NEG90: Angle = Angle(-FRAC_PI_2);
    pub const POS180: Angle = Angle(PI);
    pub const NEG180: Angle = Angle(-PI);
    pub const POS360: Angle = Angle(TAU);

    pub const fn from_radians(radians: f64) -> Self {
        Angle(radians)
    }
    pub fn from_degrees(degrees: f64) -> Self {
        Angle(degrees.to_radians())
    }
    pub fn radians(&self) -> f64 {
        self.0
    }
    pub fn degrees(&self) -> f64 {
        self.0.to_degrees()
    }
    pub fn sin(&self) -> f64 {
        self.0.sin()
    }
    pub fn cos(&self) -> f64 {
        self.0.cos()
    }
    pub fn tan(&self) -> f64 {
        self.0.tan()
    }
    pub fn abs(&self) -> Angle {
        Angle(self.0.abs())
    }
    pub fn min(self, other: Angle) -> Angle {
        Angle(self.0.min(other.0))
    }
    pub fn max(self, other: Angle) -> Angle {
        Angle(self.0.max(other.0))
    }
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
    /// Wraps into [-180°, 180°].
    pub fn normalized_longitude(&self) -> Angle {
        Angle(negative_pi_to_pi(self.0))
    }
    /// Folds into [-90°, 90°], reflecting across the poles.
    pub fn normalized_latitude(&self) -> Angle {
        let lat = negative_pi_to_pi(self.0);
        if lat > FRAC_PI_2 {
            return Angle(PI - lat);
        }
        if lat < -FRAC_PI_2 {
            return Angle(-PI - lat);
        }
        Angle(lat)
    }
    pub fn clamp(&self, min: Angle, max: Angle) -> Angle {
        Angle(crate::math::clamp(self.0, min.0, max.0))
    }
    pub fn mid_angle(a: Angle, b: Angle) -> Angle {
        Angle(0.5 * (a.0 + b.0))
    }
    pub fn average(angles: &[Angle]) -> Option<Angle> {
        if angles.is_empty() {
            return None;
        }
        let sum: f64 = angles.iter().map(|a| a.0).sum();
        Some(Angle(sum / angles.len() as f64))
    }
    pub fn equals_epsilon(&self, other: Angle, epsilon: f64) -> bool {
        equals_epsilon(self.0, other.0, Some(epsilon), None)
    }
}
impl Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0 + rhs.0)
    }
}
impl Sub for Angle {
    type Output = Angle;
    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0 - rhs.0)
    }
}
impl Mul<f64> for Angle {
    type Output = Angle;
    fn mul(self, rhs: f64) -> Angle {
        Angle(self.0 * rhs)
    }
}
impl Div<f64> for Angle {
    type Output = Angle;
    fn div(self, rhs: f64) -> Angle {
        Angle(self.0 / rhs)
    }
}
impl Neg for Angle {
    type Output = Angle;
    fn neg(self) -> Angle {
        Angle(-self.0)
    }
}
impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EPSILON12;

    #[test]
    fn degrees_round_trip() {
        let a = Angle::from_degrees(45.0);
        assert!(equals_epsilon(a.radians(), PI / 4.0, Some(EPSILON12), None));
        assert!(equals_epsilon(a.degrees(), 45.0, Some(EPSILON12), None));
    }
    #[test]
    fn normalized_longitude_wraps_past_antimeridian() {
        let a = Angle::from_degrees(190.0).normalized_longitude();
        assert!(a.equals_epsilon(Angle::from_degrees(-170.0), EPSILON12));
        let b = Angle::from_degrees(-200.0).normalized_longitude();
        assert!(b.equals_epsilon(Angle::from_degrees(160.0), EPSILON12));
    }
    #[test]
    fn normalized_latitude_reflects_at_poles() {
        let a = Angle::from_degrees(100.0).normalized_latitude();
        assert!(a.equals_epsilon(Angle::from_degrees(80.0), EPSILON12));
        let b = Angle::from_degrees(-95.0).normalized_latitude();
        assert!(b.equals_epsilon(Angle::from_degrees(-85.0), EPSILON12));
    }
    #[test]
    fn arithmetic() {
        let a = Angle::from_degrees(30.0) + Angle::from_degrees(15.0);
        assert!(a.equals_epsilon(Angle::from_degrees(45.0), EPSILON12));
        assert!((a * 2.0).equals_epsilon(Angle::from_degrees(90.0), EPSILON12));
        assert!((a / 3.0).equals_epsilon(Angle::from_degrees(15.0), EPSILON12));
        assert!((-a).equals_epsilon(Angle::from_degrees(-45.0), EPSILON12));
        assert!(Angle::average(&[]).is_none());
    }
}

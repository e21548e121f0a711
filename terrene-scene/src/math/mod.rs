use std::f64::consts::{PI, TAU};

mod cartesian3;
mod epsilon;
pub use cartesian3::*;
pub use epsilon::*;

pub fn negative_pi_to_pi(angle: f64) -> f64 {
    if angle >= -PI && angle <= PI {
        return angle;
    }
    return zero_to_two_pi(angle + PI) - PI;
}
pub fn zero_to_two_pi(angle: f64) -> f64 {
    if angle >= 0. && angle <= TAU {
        return angle;
    }
    let mode = angle.rem_euclid(TAU);
    if mode.abs() < EPSILON14 && angle.abs() > EPSILON14 {
        return TAU;
    }
    return mode;
}
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    return if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    };
}

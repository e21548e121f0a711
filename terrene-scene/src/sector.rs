use std::{
    f64::consts::{PI, TAU},
    fmt,
};

use bevy::math::DVec3;
use serde::{Deserialize, Serialize};

use crate::{
    math::{negative_pi_to_pi, EPSILON14},
    Angle, BoundingSphere, GeometryError, Globe,
};

/// A latitude/longitude rectangle.
///
/// A sector whose min longitude is greater than its max longitude crosses the
/// ±180° meridian and covers `[min_longitude, 180°] ∪ [-180°, max_longitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    min_latitude: Angle,
    max_latitude: Angle,
    min_longitude: Angle,
    max_longitude: Angle,
}
impl Default for Sector {
    fn default() -> Self {
        Self::EMPTY
    }
}
impl Sector {
    pub const FULL_SPHERE: Sector = Sector {
        min_latitude: Angle::NEG90,
        max_latitude: Angle::POS90,
        min_longitude: Angle::NEG180,
        max_longitude: Angle::POS180,
    };
    pub const EMPTY: Sector = Sector {
        min_latitude: Angle::ZERO,
        max_latitude: Angle::ZERO,
        min_longitude: Angle::ZERO,
        max_longitude: Angle::ZERO,
    };

    pub fn new(
        min_latitude: Angle,
        max_latitude: Angle,
        min_longitude: Angle,
        max_longitude: Angle,
    ) -> Result<Self, GeometryError> {
        if !(min_latitude.is_finite()
            && max_latitude.is_finite()
            && min_longitude.is_finite()
            && max_longitude.is_finite())
        {
            return Err(GeometryError::NonFinite("sector"));
        }
        if min_latitude > max_latitude {
            return Err(GeometryError::InvalidSector {
                min_latitude: min_latitude.degrees(),
                max_latitude: max_latitude.degrees(),
            });
        }
        return Ok(Self::from_bounds(
            min_latitude.clamp(Angle::NEG90, Angle::POS90),
            max_latitude.clamp(Angle::NEG90, Angle::POS90),
            min_longitude.normalized_longitude(),
            max_longitude.normalized_longitude(),
        ));
    }
    pub fn from_degrees(
        min_latitude: f64,
        max_latitude: f64,
        min_longitude: f64,
        max_longitude: f64,
    ) -> Result<Self, GeometryError> {
        return Sector::new(
            Angle::from_degrees(min_latitude),
            Angle::from_degrees(max_latitude),
            Angle::from_degrees(min_longitude),
            Angle::from_degrees(max_longitude),
        );
    }
    /// Inputs must already be normalized.
    fn from_bounds(
        min_latitude: Angle,
        max_latitude: Angle,
        min_longitude: Angle,
        mut max_longitude: Angle,
    ) -> Self {
        let mut min_longitude = min_longitude;
        // keep a sector that ends or starts on the meridian from looking wrapped
        if min_longitude.radians() == PI && max_longitude.radians() != PI {
            min_longitude = Angle::NEG180;
        }
        if max_longitude.radians() == -PI && min_longitude.radians() != -PI {
            max_longitude = Angle::POS180;
        }
        Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        }
    }
    pub fn min_latitude(&self) -> Angle {
        self.min_latitude
    }
    pub fn max_latitude(&self) -> Angle {
        self.max_latitude
    }
    pub fn min_longitude(&self) -> Angle {
        self.min_longitude
    }
    pub fn max_longitude(&self) -> Angle {
        self.max_longitude
    }
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_longitude > self.max_longitude
    }
    pub fn delta_lat(&self) -> Angle {
        self.max_latitude - self.min_latitude
    }
    pub fn delta_lon(&self) -> Angle {
        let delta = self.max_longitude.radians() - self.min_longitude.radians();
        if delta < 0.0 {
            return Angle::from_radians(delta + TAU);
        }
        Angle::from_radians(delta)
    }
    /// Area in square degrees of the lat/lon rectangle.
    pub fn area_degrees(&self) -> f64 {
        self.delta_lat().degrees() * self.delta_lon().degrees()
    }
    pub fn is_empty(&self) -> bool {
        self.delta_lat().radians() <= 0.0 || self.delta_lon().radians() <= 0.0
    }
    /// Returns `(latitude, longitude)` of the center.
    pub fn centroid(&self) -> (Angle, Angle) {
        let latitude = Angle::mid_angle(self.min_latitude, self.max_latitude);
        let longitude = (self.min_longitude + self.delta_lon() * 0.5).normalized_longitude();
        (latitude, longitude)
    }
    /// Longitude offset of `longitude` east of the sector's west edge.
    pub fn longitude_offset(&self, longitude: Angle) -> Angle {
        let mut offset =
            longitude.normalized_longitude().radians() - self.min_longitude.radians();
        if offset < -EPSILON14 {
            offset += TAU;
        }
        Angle::from_radians(offset.max(0.0))
    }
    pub fn contains(&self, latitude: Angle, longitude: Angle) -> bool {
        let lat = latitude.radians();
        if lat < self.min_latitude.radians() - EPSILON14
            || lat > self.max_latitude.radians() + EPSILON14
        {
            return false;
        }
        let lon = negative_pi_to_pi(longitude.radians());
        self.longitude_intervals()
            .iter()
            .any(|(west, east)| lon >= west - EPSILON14 && lon <= east + EPSILON14)
    }
    pub fn contains_sector(&self, other: &Sector) -> bool {
        if other.min_latitude < self.min_latitude || other.max_latitude > self.max_latitude {
            return false;
        }
        if self.delta_lon().radians() >= TAU - EPSILON14 {
            return true;
        }
        let offset = self.longitude_offset(other.min_longitude).radians();
        offset + other.delta_lon().radians() <= self.delta_lon().radians() + EPSILON14
    }
    /// One interval when the sector does not cross the meridian, two otherwise.
    fn longitude_intervals(&self) -> Vec<(f64, f64)> {
        let west = self.min_longitude.radians();
        let east = self.max_longitude.radians();
        if west <= east {
            return vec![(west, east)];
        }
        vec![(west, PI), (-PI, east)]
    }
    /// Closed test: sectors that share only an edge intersect.
    pub fn intersects(&self, other: &Sector) -> bool {
        if other.max_latitude < self.min_latitude || other.min_latitude > self.max_latitude {
            return false;
        }
        let mine = self.longitude_intervals();
        let theirs = other.longitude_intervals();
        mine.iter()
            .any(|a| theirs.iter().any(|b| !(b.1 < a.0 || b.0 > a.1)))
    }
    /// Open test: the overlap must have positive area.
    pub fn intersects_interior(&self, other: &Sector) -> bool {
        if other.max_latitude <= self.min_latitude || other.min_latitude >= self.max_latitude {
            return false;
        }
        let mine = self.longitude_intervals();
        let theirs = other.longitude_intervals();
        mine.iter()
            .any(|a| theirs.iter().any(|b| !(b.1 <= a.0 || b.0 >= a.1)))
    }
    /// The overlapping region, possibly degenerate when only edges touch.
    ///
    /// When the overlap splits into two disjoint longitude bands the wider
    /// band is returned.
    pub fn intersection(&self, other: &Sector) -> Option<Sector> {
        let min_latitude = self.min_latitude.max(other.min_latitude);
        let max_latitude = self.max_latitude.min(other.max_latitude);
        if min_latitude > max_latitude {
            return None;
        }
        let mut pieces: Vec<(f64, f64)> = vec![];
        for a in self.longitude_intervals() {
            for b in other.longitude_intervals() {
                let west = a.0.max(b.0);
                let east = a.1.min(b.1);
                if west <= east {
                    pieces.push((west, east));
                }
            }
        }
        pieces.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (west, east) = match pieces.len() {
            0 => return None,
            1 => pieces[0],
            _ => {
                let first = pieces[0];
                let last = pieces[pieces.len() - 1];
                if first.0 == -PI && last.1 == PI {
                    (last.0, first.1)
                } else if first.1 - first.0 >= last.1 - last.0 {
                    first
                } else {
                    last
                }
            }
        };
        Some(Self::from_bounds(
            min_latitude,
            max_latitude,
            Angle::from_radians(west),
            Angle::from_radians(east),
        ))
    }
    /// Smallest sector covering both, taking the shorter way around.
    pub fn union(&self, other: &Sector) -> Sector {
        let min_latitude = self.min_latitude.min(other.min_latitude);
        let max_latitude = self.max_latitude.max(other.max_latitude);
        let da = self.delta_lon().radians();
        let db = other.delta_lon().radians();
        let east_offset = |from: Angle, to: Angle| (to.radians() - from.radians()).rem_euclid(TAU);
        let from_self =
            da.max(east_offset(self.min_longitude, other.min_longitude) + db);
        let from_other =
            db.max(east_offset(other.min_longitude, self.min_longitude) + da);
        let (start, length) = if from_self <= from_other {
            (self.min_longitude, from_self)
        } else {
            (other.min_longitude, from_other)
        };
        if length >= TAU - EPSILON14 {
            return Self::from_bounds(min_latitude, max_latitude, Angle::NEG180, Angle::POS180);
        }
        Self::from_bounds(
            min_latitude,
            max_latitude,
            start,
            Angle::from_radians(negative_pi_to_pi(start.radians() + length)),
        )
    }
    pub fn union_of<'a>(sectors: impl IntoIterator<Item = &'a Sector>) -> Option<Sector> {
        let mut iter = sectors.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(first, |acc, s| acc.union(s)))
    }
    /// Quadrants in the order southwest, southeast, northwest, northeast.
    pub fn subdivide(&self) -> [Sector; 4] {
        let (mid_lat, mid_lon) = self.centroid();
        let sw = Self::from_bounds(
            self.min_latitude,
            mid_lat,
            self.min_longitude,
            mid_lon,
        );
        let se = Self::from_bounds(
            self.min_latitude,
            mid_lat,
            mid_lon,
            self.max_longitude,
        );
        let nw = Self::from_bounds(
            mid_lat,
            self.max_latitude,
            self.min_longitude,
            mid_lon,
        );
        let ne = Self::from_bounds(
            mid_lat,
            self.max_latitude,
            mid_lon,
            self.max_longitude,
        );
        [sw, se, nw, ne]
    }
    /// Corners as `(latitude, longitude)` in the order sw, se, ne, nw.
    pub fn corners(&self) -> [(Angle, Angle); 4] {
        [
            (self.min_latitude, self.min_longitude),
            (self.min_latitude, self.max_longitude),
            (self.max_latitude, self.max_longitude),
            (self.max_latitude, self.min_longitude),
        ]
    }
    pub fn compute_corner_points(&self, globe: &Globe, elevation: f64) -> [DVec3; 4] {
        self.corners()
            .map(|(lat, lon)| globe.compute_point_from_position(lat, lon, elevation))
    }
    pub fn compute_center_point(&self, globe: &Globe, elevation: f64) -> DVec3 {
        let (lat, lon) = self.centroid();
        globe.compute_point_from_position(lat, lon, elevation)
    }
    /// A sphere enclosing the surface between `min_elevation` and `max_elevation`.
    pub fn compute_bounding_sphere(
        &self,
        globe: &Globe,
        min_elevation: f64,
        max_elevation: f64,
    ) -> BoundingSphere {
        const SAMPLES: usize = 5;
        let mut points = Vec::with_capacity(SAMPLES * SAMPLES * 2);
        let dlat = self.delta_lat() / (SAMPLES - 1) as f64;
        let dlon = self.delta_lon() / (SAMPLES - 1) as f64;
        for j in 0..SAMPLES {
            let lat = self.min_latitude + dlat * j as f64;
            for i in 0..SAMPLES {
                let lon = self.min_longitude + dlon * i as f64;
                points.push(globe.compute_point_from_position(lat, lon, min_elevation));
                points.push(globe.compute_point_from_position(lat, lon, max_elevation));
            }
        }
        let mut sphere = BoundingSphere::from_points(&points);
        // the surface bulges outward between samples
        let half_step = 0.5 * dlat.radians().max(dlon.radians());
        let outer_radius = globe.equatorial_radius() + max_elevation.max(0.0);
        sphere.radius += outer_radius * (1.0 - half_step.cos());
        sphere
    }
    pub fn equals_epsilon(&self, other: &Sector, epsilon: f64) -> bool {
        self.min_latitude.equals_epsilon(other.min_latitude, epsilon)
            && self.max_latitude.equals_epsilon(other.max_latitude, epsilon)
            && self.min_longitude.equals_epsilon(other.min_longitude, epsilon)
            && self.max_longitude.equals_epsilon(other.max_longitude, epsilon)
    }
}
impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}), ({}, {})",
            self.min_latitude, self.min_longitude, self.max_latitude, self.max_longitude
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{math::equals_epsilon, EPSILON10, EPSILON12};
    use rand::Rng;

    fn sector(a: f64, b: f64, c: f64, d: f64) -> Sector {
        Sector::from_degrees(a, b, c, d).unwrap()
    }

    #[test]
    fn rejects_inverted_latitude() {
        assert!(matches!(
            Sector::from_degrees(10.0, -10.0, 0.0, 10.0),
            Err(GeometryError::InvalidSector { .. })
        ));
        assert!(Sector::from_degrees(f64::NAN, 0.0, 0.0, 1.0).is_err());
    }
    #[test]
    fn deltas_and_centroid() {
        let s = sector(-10.0, 30.0, 20.0, 60.0);
        assert!(equals_epsilon(s.delta_lat().degrees(), 40.0, Some(EPSILON10), None));
        assert!(equals_epsilon(s.delta_lon().degrees(), 40.0, Some(EPSILON10), None));
        let (lat, lon) = s.centroid();
        assert!(equals_epsilon(lat.degrees(), 10.0, Some(EPSILON10), None));
        assert!(equals_epsilon(lon.degrees(), 40.0, Some(EPSILON10), None));
    }
    #[test]
    fn antimeridian_sector_deltas_and_centroid() {
        let s = sector(-10.0, 10.0, 170.0, -170.0);
        assert!(s.crosses_antimeridian());
        assert!(equals_epsilon(s.delta_lon().degrees(), 20.0, Some(EPSILON10), None));
        let (_, lon) = s.centroid();
        assert!(equals_epsilon(lon.degrees().abs(), 180.0, Some(EPSILON10), None));
    }
    #[test]
    fn antimeridian_contains() {
        let s = sector(-10.0, 10.0, 170.0, -170.0);
        assert!(s.contains(Angle::from_degrees(0.0), Angle::from_degrees(175.0)));
        assert!(s.contains(Angle::from_degrees(0.0), Angle::from_degrees(-175.0)));
        assert!(s.contains(Angle::from_degrees(0.0), Angle::from_degrees(185.0)));
        assert!(!s.contains(Angle::from_degrees(0.0), Angle::from_degrees(0.0)));
        assert!(!s.contains(Angle::from_degrees(20.0), Angle::from_degrees(175.0)));
    }
    #[test]
    fn antimeridian_intersects() {
        let s = sector(-10.0, 10.0, 170.0, -170.0);
        assert!(s.intersects(&sector(-5.0, 5.0, -175.0, -160.0)));
        assert!(s.intersects(&sector(-5.0, 5.0, 160.0, 175.0)));
        assert!(!s.intersects(&sector(-5.0, 5.0, -160.0, 160.0)));
    }
    #[test]
    fn antimeridian_subdivide() {
        let s = sector(-10.0, 10.0, 170.0, -170.0);
        let [sw, se, nw, ne] = s.subdivide();
        assert!(!sw.crosses_antimeridian());
        assert!(!se.crosses_antimeridian());
        assert!(equals_epsilon(sw.min_longitude().degrees(), 170.0, Some(EPSILON10), None));
        assert!(equals_epsilon(sw.max_longitude().degrees(), 180.0, Some(EPSILON10), None));
        assert!(equals_epsilon(se.min_longitude().degrees(), -180.0, Some(EPSILON10), None));
        assert!(equals_epsilon(se.max_longitude().degrees(), -170.0, Some(EPSILON10), None));
        assert!(equals_epsilon(nw.min_latitude().degrees(), 0.0, Some(EPSILON10), None));
        assert!(equals_epsilon(ne.delta_lon().degrees(), 10.0, Some(EPSILON10), None));
        let total: f64 = [sw, se, nw, ne].iter().map(|c| c.area_degrees()).sum();
        assert!(equals_epsilon(total, s.area_degrees(), Some(EPSILON10), None));
    }
    #[test]
    fn intersection_across_meridian_merges() {
        let a = sector(-10.0, 10.0, 170.0, -170.0);
        let b = sector(-5.0, 20.0, 175.0, -175.0);
        let c = a.intersection(&b).unwrap();
        assert!(c.equals_epsilon(&b.intersection(&a).unwrap(), EPSILON12));
        assert!(c.crosses_antimeridian());
        assert!(equals_epsilon(c.delta_lon().degrees(), 10.0, Some(EPSILON10), None));
        assert!(equals_epsilon(c.max_latitude().degrees(), 10.0, Some(EPSILON10), None));
        assert!(a.intersection(&sector(20.0, 30.0, 0.0, 10.0)).is_none());
    }
    #[test]
    fn edge_sharing_sectors() {
        let a = sector(0.0, 10.0, 0.0, 10.0);
        let b = sector(0.0, 10.0, 10.0, 20.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects_interior(&b));
        assert_eq!(a.intersection(&b).unwrap().area_degrees(), 0.0);
    }
    #[test]
    fn union_takes_short_way_around() {
        let a = sector(0.0, 10.0, 170.0, 180.0);
        let b = sector(-10.0, 5.0, -180.0, -170.0);
        let u = a.union(&b);
        assert!(u.crosses_antimeridian());
        assert!(equals_epsilon(u.delta_lon().degrees(), 20.0, Some(EPSILON10), None));
        assert!(equals_epsilon(u.min_latitude().degrees(), -10.0, Some(EPSILON10), None));
        let c = sector(0.0, 10.0, -20.0, 5.0).union(&sector(0.0, 10.0, 0.0, 10.0));
        assert!(equals_epsilon(c.min_longitude().degrees(), -20.0, Some(EPSILON10), None));
        assert!(equals_epsilon(c.max_longitude().degrees(), 10.0, Some(EPSILON10), None));
        assert!(Sector::union_of([].iter()).is_none());
    }
    #[test]
    fn contains_sector_work() {
        let outer = sector(-10.0, 10.0, 170.0, -170.0);
        assert!(outer.contains_sector(&sector(-5.0, 5.0, 175.0, -175.0)));
        assert!(outer.contains_sector(&sector(-5.0, 5.0, -178.0, -175.0)));
        assert!(!outer.contains_sector(&sector(-5.0, 5.0, 160.0, 175.0)));
        assert!(Sector::FULL_SPHERE.contains_sector(&outer));
    }
    #[test]
    fn intersects_is_symmetric() {
        let mut rng = rand::thread_rng();
        let mut random_sector = || {
            let a: f64 = rng.gen_range(-90.0..90.0);
            let b: f64 = rng.gen_range(-90.0..90.0);
            let c: f64 = rng.gen_range(-180.0..180.0);
            let d: f64 = rng.gen_range(-180.0..180.0);
            sector(a.min(b), a.max(b), c, d)
        };
        for _ in 0..2000 {
            let s1 = random_sector();
            let s2 = random_sector();
            assert_eq!(s1.intersects(&s2), s2.intersects(&s1));
            assert_eq!(s1.intersects_interior(&s2), s2.intersects_interior(&s1));
        }
    }
    #[test]
    fn bounding_sphere_encloses_surface() {
        let globe = Globe::earth();
        let s = sector(0.0, 36.0, 0.0, 36.0);
        let sphere = s.compute_bounding_sphere(&globe, 0.0, 1000.0);
        for j in 0..=20 {
            for i in 0..=20 {
                let lat = Angle::from_degrees(36.0 * j as f64 / 20.0);
                let lon = Angle::from_degrees(36.0 * i as f64 / 20.0);
                let p = globe.compute_point_from_position(lat, lon, 500.0);
                assert!(p.distance(sphere.center) <= sphere.radius);
            }
        }
    }
}

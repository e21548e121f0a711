use std::sync::Arc;

use bevy::math::DVec3;
use terrene_scene::{Angle, Line, Sector};

use crate::{DrawContext, SectorGeometry, SurfaceIntersection};

/// Terminal tile geometries of one tessellation pass, in emission order.
#[derive(Clone, Default)]
pub struct SectorGeometryList {
    geometries: Vec<Arc<dyn SectorGeometry>>,
}
impl SectorGeometryList {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn add(&mut self, geometry: Arc<dyn SectorGeometry>) {
        self.geometries.push(geometry);
    }
    pub fn clear(&mut self) {
        self.geometries.clear();
    }
    pub fn len(&self) -> usize {
        self.geometries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SectorGeometry>> {
        self.geometries.iter()
    }
    pub fn get(&self, index: usize) -> Option<&Arc<dyn SectorGeometry>> {
        self.geometries.get(index)
    }
    /// Every entry whose sector intersects `sector`, edges included.
    pub fn intersecting_sectors(&self, sector: &Sector) -> Vec<Arc<dyn SectorGeometry>> {
        self.geometries
            .iter()
            .filter(|geometry| geometry.sector().intersects(sector))
            .cloned()
            .collect()
    }
    /// Surface point from the first entry containing the location.
    pub fn surface_point(
        &self,
        latitude: Angle,
        longitude: Angle,
        meters_offset: f64,
    ) -> Option<DVec3> {
        self.geometries
            .iter()
            .find(|geometry| geometry.sector().contains(latitude, longitude))
            .and_then(|geometry| geometry.surface_point(latitude, longitude, meters_offset))
    }
    /// Nearest intersection of `line` with any entry.
    pub fn pick(&self, line: &Line) -> Option<SurfaceIntersection> {
        self.geometries
            .iter()
            .filter_map(|geometry| geometry.intersect(line))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
    /// Smallest sector covering every entry.
    pub fn sector(&self) -> Option<Sector> {
        Sector::union_of(self.geometries.iter().map(|geometry| geometry.sector()))
    }
    pub fn render(&self, dc: &mut dyn DrawContext) {
        for geometry in self.geometries.iter() {
            geometry.render(dc);
        }
    }
    pub fn render_wireframe(&self, dc: &mut dyn DrawContext, show_interior: bool, show_exterior: bool) {
        for geometry in self.geometries.iter() {
            geometry.render_wireframe(dc, show_interior, show_exterior);
        }
    }
    pub fn render_bounding_volumes(&self, dc: &mut dyn DrawContext) {
        for geometry in self.geometries.iter() {
            geometry.render_bounding_volume(dc);
        }
    }
}

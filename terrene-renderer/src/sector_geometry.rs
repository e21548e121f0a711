use std::sync::Arc;

use bevy::math::DVec3;
use terrene_scene::{
    Angle, BoundingSphere, Extent, IntersectionTests, Line, Sector, TileKey,
};

use crate::{DrawCommand, DrawContext, RenderInfo};

/// Where a line meets the tessellated surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceIntersection {
    /// Line parameter of the hit.
    pub distance: f64,
    pub point: DVec3,
}

/// Renderable, queryable geometry of one terminal tile.
pub trait SectorGeometry: Send + Sync {
    fn key(&self) -> &TileKey;
    fn extent(&self) -> &dyn Extent;
    fn sector(&self) -> &Sector;
    /// Point on the tessellated surface, raised `meters_offset` along the
    /// surface normal. `None` when the location is outside the sector.
    fn surface_point(&self, latitude: Angle, longitude: Angle, meters_offset: f64)
        -> Option<DVec3>;
    fn render(&self, dc: &mut dyn DrawContext);
    fn render_wireframe(&self, dc: &mut dyn DrawContext, show_interior: bool, show_exterior: bool);
    fn render_bounding_volume(&self, dc: &mut dyn DrawContext);
    /// Nearest intersection in front of the line's origin.
    fn intersect(&self, line: &Line) -> Option<SurfaceIntersection>;
}

/// [`SectorGeometry`] of a tile built by the rectangular tessellator.
#[derive(Debug, Clone)]
pub struct TileGeometry {
    key: TileKey,
    sector: Sector,
    extent: BoundingSphere,
    render_info: Arc<RenderInfo>,
}
impl TileGeometry {
    pub fn new(
        key: TileKey,
        sector: Sector,
        extent: BoundingSphere,
        render_info: Arc<RenderInfo>,
    ) -> Self {
        Self {
            key,
            sector,
            extent,
            render_info,
        }
    }
    pub fn render_info(&self) -> &Arc<RenderInfo> {
        &self.render_info
    }
    pub fn level(&self) -> u32 {
        self.key.level()
    }
    /// The two triangles of a grid cell, wound like the triangle strip.
    fn cell_triangles(&self, column: usize, row: usize) -> [[DVec3; 3]; 2] {
        let ri = &self.render_info;
        let sw = ri.vertex(column, row);
        let se = ri.vertex(column + 1, row);
        let nw = ri.vertex(column, row + 1);
        let ne = ri.vertex(column + 1, row + 1);
        [[nw, sw, ne], [sw, se, ne]]
    }
}
impl SectorGeometry for TileGeometry {
    fn key(&self) -> &TileKey {
        &self.key
    }
    fn extent(&self) -> &dyn Extent {
        &self.extent
    }
    fn sector(&self) -> &Sector {
        &self.sector
    }
    fn surface_point(
        &self,
        latitude: Angle,
        longitude: Angle,
        meters_offset: f64,
    ) -> Option<DVec3> {
        if !self.sector.contains(latitude, longitude) {
            return None;
        }
        let density = self.render_info.density as usize;
        let delta_lat = self.sector.delta_lat().radians();
        let delta_lon = self.sector.delta_lon().radians();
        let s = if delta_lon > 0.0 {
            self.sector.longitude_offset(longitude).radians() / delta_lon
        } else {
            0.0
        };
        let t = if delta_lat > 0.0 {
            (latitude - self.sector.min_latitude()).radians() / delta_lat
        } else {
            0.0
        };
        let x = s.clamp(0.0, 1.0) * density as f64;
        let y = t.clamp(0.0, 1.0) * density as f64;
        let column = (x.floor() as usize).min(density - 1);
        let row = (y.floor() as usize).min(density - 1);
        let fx = x - column as f64;
        let fy = y - row as f64;

        let ri = &self.render_info;
        let sw = ri.vertex(column, row);
        let se = ri.vertex(column + 1, row);
        let nw = ri.vertex(column, row + 1);
        let ne = ri.vertex(column + 1, row + 1);
        // the cell is split along its southwest-northeast diagonal
        let (point, normal) = if fy >= fx {
            (
                sw + (ne - nw) * fx + (nw - sw) * fy,
                (sw - nw).cross(ne - nw),
            )
        } else {
            (
                sw + (se - sw) * fx + (ne - se) * fy,
                (se - sw).cross(ne - sw),
            )
        };
        let mut normal = normal.normalize_or_zero();
        let absolute = ri.reference_center + point;
        if normal.dot(absolute) < 0.0 {
            normal = -normal;
        }
        Some(absolute + normal * meters_offset)
    }
    fn render(&self, dc: &mut dyn DrawContext) {
        dc.submit(DrawCommand::Surface {
            key: self.key.clone(),
            render_info: self.render_info.clone(),
        });
    }
    fn render_wireframe(&self, dc: &mut dyn DrawContext, show_interior: bool, show_exterior: bool) {
        let mut indices = vec![];
        if show_interior {
            indices.push(self.render_info.interior_lines.clone());
        }
        if show_exterior {
            indices.push(self.render_info.outline.clone());
        }
        if indices.is_empty() {
            return;
        }
        dc.submit(DrawCommand::Wireframe {
            key: self.key.clone(),
            render_info: self.render_info.clone(),
            indices,
        });
    }
    fn render_bounding_volume(&self, dc: &mut dyn DrawContext) {
        dc.submit(DrawCommand::BoundingVolume {
            key: self.key.clone(),
            sphere: self.extent,
        });
    }
    fn intersect(&self, line: &Line) -> Option<SurfaceIntersection> {
        if !self.extent.intersects_line(line) {
            return None;
        }
        // work relative to the reference center to keep precision
        let center = self.render_info.reference_center;
        let local = Line {
            origin: line.origin - center,
            direction: line.direction,
        };
        let density = self.render_info.density as usize;
        let mut nearest: Option<f64> = None;
        for row in 0..density {
            for column in 0..density {
                for [a, b, c] in self.cell_triangles(column, row) {
                    if let Some(t) = IntersectionTests::line_triangle(&local, a, b, c) {
                        if t >= 0.0 && nearest.map_or(true, |n| t < n) {
                            nearest = Some(t);
                        }
                    }
                }
            }
        }
        nearest.map(|distance| SurfaceIntersection {
            distance,
            point: line.point_at(distance),
        })
    }
}

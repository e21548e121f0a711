use std::sync::Arc;

use bevy::{
    math::DVec3,
    prelude::Mesh,
    render::mesh::{Indices, PrimitiveTopology},
};
use terrene_scene::Cartesian3;

/// Sampled geometry of one terminal tile.
///
/// `vertices` holds `(density + 1)²` xyz triples relative to
/// `reference_center`, row by row from the south edge and west to east
/// within a row. `tex_coords` holds the matching `(s, t)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInfo {
    pub density: u32,
    pub reference_center: DVec3,
    pub vertices: Vec<f64>,
    pub tex_coords: Vec<f32>,
    pub indices: Arc<Vec<u32>>,
    pub interior_lines: Arc<Vec<u32>>,
    pub outline: Arc<Vec<u32>>,
    /// Radians per sample of the elevations actually used.
    pub resolution: f64,
    /// Radians per sample the tile asked for.
    pub target_resolution: f64,
    pub vertical_exaggeration: f64,
    pub min_elevation: f64,
    pub max_elevation: f64,
}
impl RenderInfo {
    pub fn side(&self) -> usize {
        self.density as usize + 1
    }
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }
    /// Vertex relative to the reference center.
    pub fn vertex(&self, column: usize, row: usize) -> DVec3 {
        let i = 3 * (row * self.side() + column);
        DVec3::new(self.vertices[i], self.vertices[i + 1], self.vertices[i + 2])
    }
    pub fn is_degraded(&self) -> bool {
        self.resolution > self.target_resolution
    }
    pub fn is_valid_for(&self, density: u32, vertical_exaggeration: f64) -> bool {
        self.density == density && self.vertical_exaggeration == vertical_exaggeration
    }
    pub fn to_mesh(&self) -> Mesh {
        Mesh::from(self)
    }
}

impl From<&RenderInfo> for Mesh {
    fn from(render_info: &RenderInfo) -> Self {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleStrip);
        let positions: Vec<[f32; 3]> = render_info
            .vertices
            .chunks_exact(3)
            .map(|v| DVec3::new(v[0], v[1], v[2]).to_f32_array())
            .collect();
        let uvs: Vec<[f32; 2]> = render_info
            .tex_coords
            .chunks_exact(2)
            // texture rows run north to south
            .map(|t| [t[0], 1.0 - t[1]])
            .collect();
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
        mesh.set_indices(Some(Indices::U32(render_info.indices.as_ref().clone())));
        mesh
    }
}

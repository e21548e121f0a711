use std::{collections::HashMap, sync::Arc};

/// Index buffers that depend only on grid density, shared by every tile of
/// that density.
#[derive(Debug, Default)]
pub struct IndicesCache {
    triangle_strips: HashMap<u32, Arc<Vec<u32>>>,
    interior_lines: HashMap<u32, Arc<Vec<u32>>>,
    outlines: HashMap<u32, Arc<Vec<u32>>>,
}
impl IndicesCache {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn triangle_strip(&mut self, density: u32) -> Arc<Vec<u32>> {
        self.triangle_strips
            .entry(density)
            .or_insert_with(|| Arc::new(triangle_strip_indices(density)))
            .clone()
    }
    pub fn interior_lines(&mut self, density: u32) -> Arc<Vec<u32>> {
        self.interior_lines
            .entry(density)
            .or_insert_with(|| Arc::new(interior_line_indices(density)))
            .clone()
    }
    pub fn outline(&mut self, density: u32) -> Arc<Vec<u32>> {
        self.outlines
            .entry(density)
            .or_insert_with(|| Arc::new(outline_indices(density)))
            .clone()
    }
    pub fn clear(&mut self) {
        self.triangle_strips.clear();
        self.interior_lines.clear();
        self.outlines.clear();
    }
}

/// A strip over a `(density + 1)²` grid stored row by row from the south.
///
/// Each row pair is walked west to east alternating north and south
/// vertices, so triangles wind counter-clockwise seen from outside. Rows
/// are joined with two degenerate indices.
pub fn triangle_strip_indices(density: u32) -> Vec<u32> {
    let side = density + 1;
    let mut indices =
        Vec::with_capacity((2 * side * density + 2 * density.saturating_sub(1)) as usize);
    for row in 0..density {
        if row > 0 {
            indices.push((row - 1) * side + density);
            indices.push((row + 1) * side);
        }
        for column in 0..side {
            indices.push((row + 1) * side + column);
            indices.push(row * side + column);
        }
    }
    indices
}

/// Line-list segments of every grid line not on the tile's border.
pub fn interior_line_indices(density: u32) -> Vec<u32> {
    let side = density + 1;
    let mut indices = vec![];
    for row in 1..density {
        for column in 0..density {
            indices.push(row * side + column);
            indices.push(row * side + column + 1);
        }
    }
    for column in 1..density {
        for row in 0..density {
            indices.push(row * side + column);
            indices.push((row + 1) * side + column);
        }
    }
    indices
}

/// Line-list segments around the tile's border.
pub fn outline_indices(density: u32) -> Vec<u32> {
    let side = density + 1;
    let mut indices = vec![];
    for column in 0..density {
        indices.push(column);
        indices.push(column + 1);
        indices.push(density * side + column);
        indices.push(density * side + column + 1);
    }
    for row in 0..density {
        indices.push(row * side);
        indices.push((row + 1) * side);
        indices.push(row * side + density);
        indices.push((row + 1) * side + density);
    }
    indices
}

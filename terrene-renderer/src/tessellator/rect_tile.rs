use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use terrene_scene::{BoundingSphere, Globe, Level, Sector, TileKey};

use super::RenderInfo;

/// Inputs the cached extent was computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtentInputs {
    pub min_elevation: f64,
    pub max_elevation: f64,
    pub equatorial_radius: f64,
    pub polar_radius: f64,
}

/// One node of the tessellation quadtree.
#[derive(Debug, Clone)]
pub struct RectTile {
    pub key: TileKey,
    pub sector: Sector,
    pub level: Level,
    pub extent: BoundingSphere,
    pub extent_inputs: Option<ExtentInputs>,
    pub render_info: Option<Arc<RenderInfo>>,
    pub last_used_frame: u64,
}
impl RectTile {
    pub fn new(key: TileKey, sector: Sector, level: Level) -> Self {
        Self {
            key,
            sector,
            level,
            extent: BoundingSphere::default(),
            extent_inputs: None,
            render_info: None,
            last_used_frame: 0,
        }
    }
    /// Recomputes the bounding sphere when the elevation range or globe changed.
    pub fn update_extent(&mut self, globe: &Globe, min_elevation: f64, max_elevation: f64) {
        let inputs = ExtentInputs {
            min_elevation,
            max_elevation,
            equatorial_radius: globe.equatorial_radius(),
            polar_radius: globe.polar_radius(),
        };
        if self.extent_inputs == Some(inputs) {
            return;
        }
        self.extent = self
            .sector
            .compute_bounding_sphere(globe, min_elevation, max_elevation);
        self.extent_inputs = Some(inputs);
    }
}

/// Tile arena keyed by [`TileKey`], kept across tessellation passes.
#[derive(Debug, Default)]
pub struct TileStorage {
    map: HashMap<TileKey, RectTile>,
}
impl TileStorage {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
    pub fn get(&self, key: &TileKey) -> Option<&RectTile> {
        self.map.get(key)
    }
    pub fn get_mut(&mut self, key: &TileKey) -> Option<&mut RectTile> {
        self.map.get_mut(key)
    }
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: &TileKey,
        create: impl FnOnce() -> Result<RectTile, E>,
    ) -> Result<&mut RectTile, E> {
        match self.map.entry(key.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(create()?)),
        }
    }
    pub fn insert(&mut self, tile: RectTile) {
        self.map.insert(tile.key.clone(), tile);
    }
    pub fn remove(&mut self, key: &TileKey) -> Option<RectTile> {
        self.map.remove(key)
    }
    pub fn iter(&self) -> impl Iterator<Item = &RectTile> {
        self.map.values()
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RectTile> {
        self.map.values_mut()
    }
    pub fn clear(&mut self) {
        self.map.clear();
    }
    /// Drops least recently used tiles until at most `maximum_tiles` remain.
    /// Tiles used in `current_frame` are never dropped. Returns the number
    /// removed.
    pub fn trim_tiles(&mut self, maximum_tiles: usize, current_frame: u64) -> usize {
        if self.map.len() <= maximum_tiles {
            return 0;
        }
        let mut candidates: Vec<(u64, TileKey)> = self
            .map
            .values()
            .filter(|tile| tile.last_used_frame < current_frame)
            .map(|tile| (tile.last_used_frame, tile.key.clone()))
            .collect();
        candidates.sort();
        let excess = self.map.len() - maximum_tiles;
        let mut removed = 0;
        for (_, key) in candidates.into_iter().take(excess) {
            self.map.remove(&key);
            removed += 1;
        }
        removed
    }
}

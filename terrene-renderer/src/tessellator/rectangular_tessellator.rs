use std::{f64::consts::PI, sync::Arc};

use bevy::prelude::Resource;
use terrene_scene::{
    ElevationModel, Elevations, Globe, LevelSet, Sector, TileKey, View, ZeroElevationModel,
};

use super::{
    CancellationToken, IndicesCache, RectTile, RenderInfo, TessellatorConfig, TileStorage,
    MAX_DENSITY,
};
use crate::{DrawContext, SectorGeometryList, TessellatorError, TileGeometry};

/// Split threshold, in decades of eye distance, before the detail hint.
pub const BASE_SPLIT_SCALE: f64 = 0.9;

/// Counters of the most recent tessellation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStatistics {
    pub tiles_visited: usize,
    pub tiles_culled: usize,
    pub tiles_emitted: usize,
    pub render_infos_built: usize,
    pub render_infos_reused: usize,
    pub tiles_trimmed: usize,
}

struct Pass<'a> {
    globe: &'a Globe,
    view: &'a View,
    elevation_model: &'a dyn ElevationModel,
    vertical_exaggeration: f64,
    min_elevation: f64,
    max_elevation: f64,
    split_scale: f64,
    cancel: &'a CancellationToken,
}

/// Builds the per-frame set of terminal tiles covering the visible globe.
///
/// Tiles form a quadtree over the level set's level-zero tiles. A tile is
/// split while its grid cells are coarse relative to the eye distance and
/// is otherwise emitted with a [`RenderInfo`] sampled from the elevation
/// model. Tiles and their render infos are kept between passes.
#[derive(Resource)]
pub struct RectangularTessellator {
    config: TessellatorConfig,
    level_set: LevelSet,
    top_level_keys: Vec<TileKey>,
    tiles: TileStorage,
    indices: IndicesCache,
    frame: u64,
    last_pass: PassStatistics,
}
impl RectangularTessellator {
    pub fn new(config: TessellatorConfig) -> Result<Self, TessellatorError> {
        check_density(config.density)?;
        let level_set = LevelSet::new(&config.level_set)?;
        let top_level_keys = level_set.level_zero_keys()?;
        Ok(Self {
            config,
            level_set,
            top_level_keys,
            tiles: TileStorage::new(),
            indices: IndicesCache::new(),
            frame: 0,
            last_pass: PassStatistics::default(),
        })
    }
    pub fn from_json(json: &str) -> Result<Self, TessellatorError> {
        let config = TessellatorConfig::from_json(json)?;
        return RectangularTessellator::new(config);
    }
    pub fn config(&self) -> &TessellatorConfig {
        &self.config
    }
    pub fn level_set(&self) -> &LevelSet {
        &self.level_set
    }
    pub fn top_level_keys(&self) -> &[TileKey] {
        &self.top_level_keys
    }
    pub fn density(&self) -> u32 {
        self.config.density
    }
    /// Changing the density rebuilds every render info on the next pass.
    pub fn set_density(&mut self, density: u32) -> Result<(), TessellatorError> {
        check_density(density)?;
        self.config.density = density;
        Ok(())
    }
    pub fn detail_hint(&self) -> f64 {
        self.config.detail_hint
    }
    pub fn set_detail_hint(&mut self, detail_hint: f64) {
        self.config.detail_hint = detail_hint;
    }
    pub fn split_scale(&self) -> f64 {
        BASE_SPLIT_SCALE + self.config.detail_hint
    }
    pub fn tiles(&self) -> &TileStorage {
        &self.tiles
    }
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }
    pub fn frame(&self) -> u64 {
        self.frame
    }
    pub fn last_pass(&self) -> &PassStatistics {
        &self.last_pass
    }

    pub fn tessellate(
        &mut self,
        dc: &dyn DrawContext,
    ) -> Result<SectorGeometryList, TessellatorError> {
        return self.tessellate_with_cancel(dc, &CancellationToken::new());
    }

    /// Like [`Self::tessellate`], checking `cancel` before visiting each tile.
    pub fn tessellate_with_cancel(
        &mut self,
        dc: &dyn DrawContext,
        cancel: &CancellationToken,
    ) -> Result<SectorGeometryList, TessellatorError> {
        let Some(globe) = dc.globe() else {
            bevy::log::error!("tessellation skipped: draw context has no globe");
            return Err(TessellatorError::MissingGlobe);
        };
        let Some(view) = dc.view() else {
            bevy::log::error!("tessellation skipped: draw context has no view");
            return Err(TessellatorError::MissingView);
        };
        let elevation_model: Arc<dyn ElevationModel> = match dc.elevation_model() {
            Some(model) if model.is_enabled() => model,
            _ => Arc::new(ZeroElevationModel),
        };
        let vertical_exaggeration = dc.vertical_exaggeration();
        let pass = Pass {
            globe,
            view,
            elevation_model: elevation_model.as_ref(),
            vertical_exaggeration,
            min_elevation: elevation_model.get_minimum_elevation() * vertical_exaggeration,
            max_elevation: elevation_model.get_maximum_elevation() * vertical_exaggeration,
            split_scale: self.split_scale(),
            cancel,
        };

        let started = instant::Instant::now();
        self.frame += 1;
        self.last_pass = PassStatistics::default();
        let mut list = SectorGeometryList::new();
        let top_level_keys = self.top_level_keys.clone();
        for key in top_level_keys.iter() {
            if let Err(e) = self.select_tile(&pass, key, &mut list) {
                bevy::log::debug!("tessellation pass {} stopped: {}", self.frame, e);
                return Err(e);
            }
        }
        self.last_pass.tiles_trimmed = self
            .tiles
            .trim_tiles(self.config.tile_cache_capacity, self.frame);
        bevy::log::debug!(
            "tessellation pass {} took {:?}: {} tiles emitted, {} culled, {} render infos built, {} cached tiles",
            self.frame,
            started.elapsed(),
            self.last_pass.tiles_emitted,
            self.last_pass.tiles_culled,
            self.last_pass.render_infos_built,
            self.tiles.len()
        );
        Ok(list)
    }

    fn select_tile(
        &mut self,
        pass: &Pass,
        key: &TileKey,
        list: &mut SectorGeometryList,
    ) -> Result<(), TessellatorError> {
        if pass.cancel.is_cancelled() {
            return Err(TessellatorError::Cancelled);
        }
        self.last_pass.tiles_visited += 1;

        let level_set = &self.level_set;
        let tile = self
            .tiles
            .get_or_try_insert_with(key, || -> Result<RectTile, TessellatorError> {
                let sector = level_set.compute_sector_for_key(key)?;
                let level = level_set.level(key.level())?.clone();
                Ok(RectTile::new(key.clone(), sector, level))
            })?;
        tile.last_used_frame = self.frame;
        tile.update_extent(pass.globe, pass.min_elevation, pass.max_elevation);
        if !pass
            .view
            .frustum_in_model_coordinates()
            .intersects(&tile.extent)
        {
            self.last_pass.tiles_culled += 1;
            return Ok(());
        }

        let density = self.config.density;
        if !level_set.is_final_level(key.level())
            && (tile.level.is_empty() || needs_to_split(pass, &tile.sector, density))
        {
            for child in key.children().iter() {
                self.select_tile(pass, child, list)?;
            }
            return Ok(());
        }

        let render_info = match &tile.render_info {
            Some(render_info) if render_info.is_valid_for(density, pass.vertical_exaggeration) => {
                self.last_pass.render_infos_reused += 1;
                render_info.clone()
            }
            _ => {
                let target_resolution = tile.sector.delta_lat().radians() / density as f64;
                let elevations = pass
                    .elevation_model
                    .get_elevations(&tile.sector, target_resolution);
                let render_info = Arc::new(build_render_info(
                    &tile.sector,
                    pass.globe,
                    elevations.as_ref(),
                    pass.vertical_exaggeration,
                    density,
                    &mut self.indices,
                ));
                self.last_pass.render_infos_built += 1;
                tile.render_info = Some(render_info.clone());
                render_info
            }
        };
        list.add(Arc::new(TileGeometry::new(
            key.clone(),
            tile.sector,
            tile.extent,
            render_info,
        )));
        self.last_pass.tiles_emitted += 1;
        Ok(())
    }

    /// Drops the cached render info of one tile so the next pass rebuilds it.
    pub fn invalidate(&mut self, key: &TileKey) -> bool {
        match self.tiles.get_mut(key) {
            Some(tile) => tile.render_info.take().is_some(),
            None => false,
        }
    }
    /// Drops cached render infos of every tile overlapping `sector`'s
    /// interior. Returns how many were dropped.
    pub fn invalidate_sector(&mut self, sector: &Sector) -> usize {
        let mut count = 0;
        for tile in self.tiles.iter_mut() {
            if tile.sector.intersects_interior(sector) && tile.render_info.take().is_some() {
                count += 1;
            }
        }
        count
    }
    /// Drops render infos built from coarser elevations than they asked for.
    pub fn invalidate_degraded(&mut self) -> usize {
        let mut count = 0;
        for tile in self.tiles.iter_mut() {
            if tile
                .render_info
                .as_ref()
                .map_or(false, |render_info| render_info.is_degraded())
            {
                tile.render_info = None;
                count += 1;
            }
        }
        count
    }
    pub fn invalidate_all(&mut self) {
        for tile in self.tiles.iter_mut() {
            tile.render_info = None;
        }
    }
    /// Forgets every cached tile and index buffer.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.indices.clear();
    }
}

fn check_density(density: u32) -> Result<(), TessellatorError> {
    if density == 0 || density > MAX_DENSITY {
        return Err(TessellatorError::InvalidDensity {
            density,
            max: MAX_DENSITY,
        });
    }
    Ok(())
}

/// Whether a tile's grid cells are too coarse for its distance to the eye.
fn needs_to_split(pass: &Pass, sector: &Sector, density: u32) -> bool {
    let eye = pass.view.eye_point();
    let mut min_distance = f64::MAX;
    for (latitude, longitude) in sector
        .corners()
        .into_iter()
        .chain(std::iter::once(sector.centroid()))
    {
        let elevation =
            pass.elevation_model.get_elevation(latitude, longitude) * pass.vertical_exaggeration;
        let point = pass
            .globe
            .compute_point_from_position(latitude, longitude, elevation);
        min_distance = min_distance.min(point.distance(eye));
    }
    let cell_size = PI * sector.delta_lat().radians() * pass.globe.radius() / density as f64;
    return cell_size.log10() > min_distance.log10() - pass.split_scale;
}

/// Samples a `(density + 1)²` vertex grid over `sector`.
pub fn build_render_info(
    sector: &Sector,
    globe: &Globe,
    elevations: &dyn Elevations,
    vertical_exaggeration: f64,
    density: u32,
    indices: &mut IndicesCache,
) -> RenderInfo {
    let side = density as usize + 1;
    let (center_latitude, center_longitude) = sector.centroid();
    let center_elevation = elevations
        .get_elevation(center_latitude.radians(), center_longitude.radians())
        * vertical_exaggeration;
    let reference_center =
        globe.compute_point_from_position(center_latitude, center_longitude, center_elevation);

    let delta_lat = sector.delta_lat() / density as f64;
    let delta_lon = sector.delta_lon() / density as f64;
    let mut vertices = Vec::with_capacity(3 * side * side);
    let mut tex_coords = Vec::with_capacity(2 * side * side);
    let mut min_elevation = f64::MAX;
    let mut max_elevation = f64::MIN;
    for row in 0..side {
        // edges come from the sector itself so neighbours share vertices exactly
        let latitude = if row + 1 == side {
            sector.max_latitude()
        } else {
            sector.min_latitude() + delta_lat * row as f64
        };
        for column in 0..side {
            let longitude = if column + 1 == side {
                sector.max_longitude()
            } else {
                (sector.min_longitude() + delta_lon * column as f64).normalized_longitude()
            };
            let elevation = elevations.get_elevation(latitude.radians(), longitude.radians())
                * vertical_exaggeration;
            min_elevation = min_elevation.min(elevation);
            max_elevation = max_elevation.max(elevation);
            let point = globe.compute_point_from_position(latitude, longitude, elevation)
                - reference_center;
            vertices.extend_from_slice(&[point.x, point.y, point.z]);
            tex_coords.extend_from_slice(&[
                column as f32 / density as f32,
                row as f32 / density as f32,
            ]);
        }
    }

    let render_info = RenderInfo {
        density,
        reference_center,
        vertices,
        tex_coords,
        indices: indices.triangle_strip(density),
        interior_lines: indices.interior_lines(density),
        outline: indices.outline(density),
        resolution: elevations.get_resolution(),
        target_resolution: delta_lat.radians(),
        vertical_exaggeration,
        min_elevation,
        max_elevation,
    };
    if render_info.is_degraded() {
        bevy::log::warn!(
            "sector {} built from elevations at {:e} rad, wanted {:e} rad",
            sector,
            render_info.resolution,
            render_info.target_resolution
        );
    }
    render_info
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{DrawCommand, FrameContext, SectorGeometry};
    use bevy::math::DVec3;
    use terrene_scene::{
        Angle, Extent, LevelSetConfig, Line, TiledElevationModel, TiledElevationModelConfig,
        Viewport,
    };

    fn config(sector: [f64; 4], delta: f64) -> TessellatorConfig {
        TessellatorConfig {
            level_set: LevelSetConfig {
                cache_name: "test".to_string(),
                level_zero_tile_delta: [delta, delta],
                sector,
                ..Default::default()
            },
            ..Default::default()
        }
    }
    fn view_above(globe: &Globe, latitude: f64, longitude: f64, altitude: f64) -> View {
        let lat = Angle::from_degrees(latitude);
        let lon = Angle::from_degrees(longitude);
        let eye = globe.compute_point_from_position(lat, lon, altitude);
        let target = globe.compute_point_from_position(lat, lon, 0.0);
        View::look_at(
            eye,
            target,
            DVec3::Z,
            160f64.to_radians(),
            Viewport::new(1000.0, 1000.0),
            1.0,
            1e9,
        )
        .unwrap()
    }
    fn frame(latitude: f64, longitude: f64, altitude: f64) -> FrameContext {
        let globe = Globe::earth();
        let view = view_above(&globe, latitude, longitude, altitude);
        FrameContext::new(view, globe)
    }

    /// Eighteen metres of ground everywhere.
    struct Plateau;
    struct PlateauElevations(Sector);
    impl Elevations for PlateauElevations {
        fn has_elevations(&self) -> bool {
            true
        }
        fn get_elevation(&self, _latitude: f64, _longitude: f64) -> f64 {
            18.0
        }
        fn get_resolution(&self) -> f64 {
            0.0
        }
        fn get_sector(&self) -> &Sector {
            &self.0
        }
    }
    impl ElevationModel for Plateau {
        fn is_enabled(&self) -> bool {
            true
        }
        fn get_elevations(&self, sector: &Sector, _target_resolution: f64) -> Box<dyn Elevations> {
            Box::new(PlateauElevations(*sector))
        }
        fn get_elevation(&self, _latitude: Angle, _longitude: Angle) -> f64 {
            18.0
        }
        fn get_maximum_elevation(&self) -> f64 {
            18.0
        }
        fn get_minimum_elevation(&self) -> f64 {
            18.0
        }
    }

    #[test]
    fn tiles_cover_the_root_without_overlap() {
        let mut tessellator =
            RectangularTessellator::new(config([0.0, 36.0, 0.0, 36.0], 36.0)).unwrap();
        assert_eq!(tessellator.top_level_keys().len(), 1);
        let dc = frame(18.0, 18.0, 1e6);
        let list = tessellator.tessellate(&dc).unwrap();

        let sectors: Vec<Sector> = list.iter().map(|g| *g.sector()).collect();
        let area: f64 = sectors.iter().map(|s| s.area_degrees()).sum();
        assert!((area - 36.0 * 36.0).abs() < 1e-6);
        for (i, a) in sectors.iter().enumerate() {
            for b in sectors.iter().skip(i + 1) {
                assert!(!a.intersects_interior(b), "{} overlaps {}", a, b);
            }
        }
        // tiles touching the point below the eye are the finest
        let levels: Vec<u32> = list.iter().map(|g| g.key().level()).collect();
        assert_eq!(levels.iter().filter(|l| **l == 3).count(), 16);
        assert_eq!(levels.iter().filter(|l| **l == 2).count(), 12);
        for geometry in list.iter() {
            let expected = 36.0 / 2f64.powi(geometry.key().level() as i32);
            assert!((geometry.sector().delta_lat().degrees() - expected).abs() < 1e-9);
            assert!((geometry.sector().delta_lon().degrees() - expected).abs() < 1e-9);
        }
        let below = (Angle::from_degrees(18.0), Angle::from_degrees(18.0));
        for geometry in list.iter() {
            if geometry.sector().contains(below.0, below.1) {
                assert_eq!(geometry.key().level(), 3);
            }
        }
        let stats = tessellator.last_pass();
        assert_eq!(stats.tiles_emitted, 28);
        assert_eq!(stats.tiles_culled, 0);
        assert_eq!(stats.render_infos_built, 28);
    }
    #[test]
    fn distant_eye_gets_level_zero_tiles() {
        let mut tessellator = RectangularTessellator::new(TessellatorConfig::default()).unwrap();
        assert_eq!(tessellator.top_level_keys().len(), 50);
        let dc = frame(0.0, 0.0, 1e8);
        let list = tessellator.tessellate(&dc).unwrap();
        assert!(!list.is_empty());
        assert!(list.iter().all(|g| g.key().level() == 0));
        let stats = tessellator.last_pass();
        assert_eq!(stats.tiles_visited, 50);
        assert_eq!(stats.tiles_emitted + stats.tiles_culled, 50);
    }
    #[test]
    fn narrow_view_culls_tiles_outside_the_frustum() {
        let mut tessellator = RectangularTessellator::new(TessellatorConfig::default()).unwrap();
        let globe = Globe::earth();
        let eye = globe.compute_point_from_position(Angle::ZERO, Angle::ZERO, 1e7);
        let target = globe.compute_point_from_position(Angle::ZERO, Angle::ZERO, 0.0);
        let view = View::look_at(
            eye,
            target,
            DVec3::Z,
            10f64.to_radians(),
            Viewport::new(1000.0, 1000.0),
            1.0,
            1e9,
        )
        .unwrap();
        let dc = FrameContext::new(view.clone(), globe);
        let list = tessellator.tessellate(&dc).unwrap();
        assert!(!list.is_empty());
        let stats = tessellator.last_pass();
        assert!(stats.tiles_culled >= 30, "only {} culled", stats.tiles_culled);
        assert_eq!(stats.tiles_emitted, list.len());

        let frustum = view.frustum_in_model_coordinates();
        for geometry in list.iter() {
            assert!(frustum.intersects(geometry.extent()));
            // the view axis enters near (0, 0) and leaves near (0, 180)
            let (lat, lon) = geometry.sector().centroid();
            assert!(lat.degrees().abs() < 54.0, "{}", geometry.sector());
            assert!(lon.radians().cos().abs() > 0.5, "{}", geometry.sector());
        }
        let side = Angle::from_degrees(90.0);
        assert!(list.surface_point(Angle::ZERO, side, 0.0).is_none());
        assert!(list.surface_point(Angle::from_degrees(80.0), Angle::ZERO, 0.0).is_none());
    }
    #[test]
    fn antimeridian_root_splits_across_the_meridian() {
        let mut tessellator =
            RectangularTessellator::new(config([-10.0, 10.0, 170.0, -170.0], 20.0)).unwrap();
        assert_eq!(tessellator.top_level_keys().len(), 1);
        let dc = frame(0.0, 180.0, 2e6);
        let list = tessellator.tessellate(&dc).unwrap();
        assert!(list.len() >= 4);
        let area: f64 = list.iter().map(|g| g.sector().area_degrees()).sum();
        assert!((area - 400.0).abs() < 1e-6);
        let west = Angle::from_degrees(175.0);
        let east = Angle::from_degrees(-175.0);
        assert!(list.surface_point(Angle::ZERO, west, 0.0).is_some());
        assert!(list.surface_point(Angle::ZERO, east, 0.0).is_some());
        assert!(list
            .surface_point(Angle::ZERO, Angle::from_degrees(0.0), 0.0)
            .is_none());
    }
    #[test]
    fn surface_points_follow_the_globe() {
        let mut tessellator =
            RectangularTessellator::new(config([0.0, 36.0, 0.0, 36.0], 36.0)).unwrap();
        let dc = frame(18.0, 18.0, 1e6);
        let list = tessellator.tessellate(&dc).unwrap();
        let globe = Globe::earth();
        let lat = Angle::from_degrees(10.0);
        let lon = Angle::from_degrees(20.0);
        let point = list.surface_point(lat, lon, 0.0).unwrap();
        let expected = globe.compute_point_from_position(lat, lon, 0.0);
        assert!(point.distance(expected) < 500.0);
        // grid vertices are exact
        let corner = list
            .surface_point(Angle::from_degrees(18.0), Angle::from_degrees(18.0), 0.0)
            .unwrap();
        let exact = globe.compute_point_from_position(
            Angle::from_degrees(18.0),
            Angle::from_degrees(18.0),
            0.0,
        );
        assert!(corner.distance(exact) < 1e-3);
        assert!(list
            .surface_point(Angle::from_degrees(40.0), lon, 0.0)
            .is_none());
    }
    #[test]
    fn random_surface_points_stay_near_the_ellipsoid() {
        use rand::Rng;
        let mut tessellator =
            RectangularTessellator::new(config([0.0, 36.0, 0.0, 36.0], 36.0)).unwrap();
        let list = tessellator.tessellate(&frame(18.0, 18.0, 1e6)).unwrap();
        let globe = Globe::earth();
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let lat = Angle::from_degrees(rng.gen_range(0.0..36.0));
            let lon = Angle::from_degrees(rng.gen_range(0.0..36.0));
            let point = list.surface_point(lat, lon, 0.0).unwrap();
            let position = globe.compute_position_from_point(point);
            assert!(position.elevation <= 1e-6);
            assert!(position.elevation > -200.0);
        }
    }
    #[test]
    fn pick_through_view_center() {
        let mut tessellator =
            RectangularTessellator::new(config([0.0, 36.0, 0.0, 36.0], 36.0)).unwrap();
        let dc = frame(18.0, 18.0, 1e6);
        let list = tessellator.tessellate(&dc).unwrap();
        let eye = dc.view().unwrap().eye_point();
        let target = Globe::earth().compute_point_from_position(
            Angle::from_degrees(10.3),
            Angle::from_degrees(20.6),
            0.0,
        );
        let line = Line::from_segment(eye, target).unwrap();
        let hit = list.pick(&line).unwrap();
        assert!(hit.point.distance(target) < 500.0);
        assert!((hit.distance - 1.0).abs() < 1e-3);
        let sky = Line::new(eye, eye - target).unwrap();
        assert!(list.pick(&sky).is_none());
    }
    #[test]
    fn missing_view_or_globe_is_an_error() {
        let mut tessellator = RectangularTessellator::new(TessellatorConfig::default()).unwrap();
        let dc = FrameContext::default().with_globe(Globe::earth());
        assert!(matches!(
            tessellator.tessellate(&dc),
            Err(TessellatorError::MissingView)
        ));
        let globe = Globe::earth();
        let dc = FrameContext::default().with_view(view_above(&globe, 0.0, 0.0, 1e7));
        assert!(matches!(
            tessellator.tessellate(&dc),
            Err(TessellatorError::MissingGlobe)
        ));
        assert_eq!(tessellator.tile_count(), 0);
    }
    #[test]
    fn cancelled_pass_returns_error() {
        let mut tessellator = RectangularTessellator::new(TessellatorConfig::default()).unwrap();
        let dc = frame(0.0, 0.0, 1e7);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            tessellator.tessellate_with_cancel(&dc, &cancel),
            Err(TessellatorError::Cancelled)
        ));
        assert_eq!(tessellator.last_pass().tiles_visited, 0);
        cancel.reset();
        assert!(tessellator.tessellate_with_cancel(&dc, &cancel).is_ok());
    }
    #[test]
    fn render_infos_are_reused_until_invalidated() {
        let mut tessellator =
            RectangularTessellator::new(config([0.0, 36.0, 0.0, 36.0], 36.0)).unwrap();
        let mut dc = frame(18.0, 18.0, 1e6);
        tessellator.tessellate(&dc).unwrap();
        assert_eq!(tessellator.last_pass().render_infos_built, 28);

        tessellator.tessellate(&dc).unwrap();
        assert_eq!(tessellator.last_pass().render_infos_built, 0);
        assert_eq!(tessellator.last_pass().render_infos_reused, 28);

        let west = Sector::from_degrees(0.0, 36.0, 0.0, 9.0).unwrap();
        let dropped = tessellator.invalidate_sector(&west);
        assert!(dropped > 0);
        tessellator.tessellate(&dc).unwrap();
        assert_eq!(tessellator.last_pass().render_infos_built, dropped);

        let key = TileKey::new(2, 0, 0, "test").unwrap();
        assert!(tessellator.invalidate(&key));
        assert!(!tessellator.invalidate(&key));
        tessellator.tessellate(&dc).unwrap();
        assert_eq!(tessellator.last_pass().render_infos_built, 1);

        dc.set_vertical_exaggeration(2.0);
        tessellator.tessellate(&dc).unwrap();
        assert_eq!(tessellator.last_pass().render_infos_built, 28);

        tessellator.set_density(8).unwrap();
        let list = tessellator.tessellate(&dc).unwrap();
        assert_eq!(tessellator.last_pass().render_infos_built, list.len());
        assert!(list
            .iter()
            .all(|g| g.extent().radius() > 0.0));

        tessellator.invalidate_all();
        tessellator.tessellate(&dc).unwrap();
        assert_eq!(tessellator.last_pass().render_infos_reused, 0);
    }
    #[test]
    fn density_is_validated() {
        let mut bad = TessellatorConfig::default();
        bad.density = 0;
        assert!(matches!(
            RectangularTessellator::new(bad),
            Err(TessellatorError::InvalidDensity { density: 0, .. })
        ));
        let mut tessellator = RectangularTessellator::new(TessellatorConfig::default()).unwrap();
        assert!(tessellator.set_density(MAX_DENSITY + 1).is_err());
        assert_eq!(tessellator.density(), 20);
        assert!(RectangularTessellator::from_json(r#"{"density":4}"#).is_ok());
        assert!(RectangularTessellator::from_json(r#"{"density":"x"}"#).is_err());
    }
    #[test]
    fn tiles_outside_the_pass_are_trimmed() {
        let mut config = config([0.0, 36.0, 0.0, 36.0], 36.0);
        config.tile_cache_capacity = 0;
        let mut tessellator = RectangularTessellator::new(config).unwrap();
        tessellator.tessellate(&frame(18.0, 18.0, 1e6)).unwrap();
        let fine = tessellator.tile_count();
        // 1 root + 4 level 1 + 16 level 2 + 16 level 3
        assert_eq!(fine, 37);
        tessellator.tessellate(&frame(18.0, 18.0, 1e8)).unwrap();
        assert_eq!(tessellator.tile_count(), 1);
        assert_eq!(tessellator.last_pass().tiles_trimmed, fine - 1);
        tessellator.clear();
        assert_eq!(tessellator.tile_count(), 0);
    }
    #[test]
    fn elevations_are_exaggerated() {
        let mut tessellator =
            RectangularTessellator::new(config([0.0, 36.0, 0.0, 36.0], 36.0)).unwrap();
        let dc = frame(18.0, 18.0, 1e6)
            .with_elevation_model(Arc::new(Plateau))
            .with_vertical_exaggeration(10.0);
        let list = tessellator.tessellate(&dc).unwrap();
        let globe = Globe::earth();
        let lat = Angle::from_degrees(18.0);
        let point = list.surface_point(lat, lat, 0.0).unwrap();
        let expected = globe.compute_point_from_position(lat, lat, 180.0);
        assert!(point.distance(expected) < 1e-3);
        for geometry in list.iter() {
            let tile = tessellator.tiles().get(geometry.key()).unwrap();
            let render_info = tile.render_info.as_ref().unwrap();
            assert_eq!(render_info.min_elevation, 180.0);
            assert_eq!(render_info.max_elevation, 180.0);
            assert!(!render_info.is_degraded());
        }
    }
    #[test]
    fn missing_elevation_data_marks_tiles_degraded() {
        let model = TiledElevationModel::new(&TiledElevationModelConfig::default()).unwrap();
        let mut tessellator =
            RectangularTessellator::new(config([0.0, 36.0, 0.0, 36.0], 36.0)).unwrap();
        let dc = frame(18.0, 18.0, 1e6).with_elevation_model(Arc::new(model));
        tessellator.tessellate(&dc).unwrap();
        assert_eq!(tessellator.invalidate_degraded(), 28);
        assert_eq!(tessellator.invalidate_degraded(), 0);
    }
    #[test]
    fn render_info_layout() {
        let globe = Globe::earth();
        let sector = Sector::from_degrees(0.0, 10.0, 175.0, -175.0).unwrap();
        let elevations = ZeroElevationModel.get_elevations(&sector, 0.0);
        let mut indices = IndicesCache::new();
        let render_info =
            build_render_info(&sector, &globe, elevations.as_ref(), 1.0, 4, &mut indices);
        assert_eq!(render_info.vertex_count(), 25);
        assert_eq!(render_info.tex_coords.len(), 50);
        assert_eq!(render_info.tex_coords[48], 1.0);
        assert_eq!(render_info.tex_coords[49], 1.0);
        let (lat, lon) = sector.centroid();
        let center = globe.compute_point_from_position(lat, lon, 0.0);
        assert!(render_info.reference_center.distance(center) < 1e-6);
        let ne = render_info.reference_center + render_info.vertex(4, 4);
        let expected = globe.compute_point_from_position(
            Angle::from_degrees(10.0),
            Angle::from_degrees(-175.0),
            0.0,
        );
        assert!(ne.distance(expected) < 1e-6);
        // shared with every tile of the same density
        let again = build_render_info(&sector, &globe, elevations.as_ref(), 1.0, 4, &mut indices);
        assert!(Arc::ptr_eq(&render_info.indices, &again.indices));

        let mesh = render_info.to_mesh();
        assert_eq!(mesh.count_vertices(), 25);
        assert_eq!(
            mesh.indices().map(|i| i.len()),
            Some(render_info.indices.len())
        );
    }
    #[test]
    fn geometries_render_to_the_draw_context() {
        let mut tessellator =
            RectangularTessellator::new(config([0.0, 36.0, 0.0, 36.0], 36.0)).unwrap();
        let mut dc = frame(18.0, 18.0, 1e6);
        let list = tessellator.tessellate(&dc).unwrap();
        list.render(&mut dc);
        let commands = dc.take_commands();
        assert_eq!(commands.len(), list.len());
        let keys: HashSet<TileKey> = commands.iter().map(|c| c.key().clone()).collect();
        assert_eq!(keys.len(), list.len());
        assert!(commands
            .iter()
            .all(|c| matches!(c, DrawCommand::Surface { .. })));
    }
}

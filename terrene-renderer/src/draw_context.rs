use std::sync::Arc;

use terrene_scene::{BoundingSphere, ElevationModel, Globe, TileKey, View};

use crate::RenderInfo;

/// Work handed to the frame controller by sector geometries.
#[derive(Clone)]
pub enum DrawCommand {
    Surface {
        key: TileKey,
        render_info: Arc<RenderInfo>,
    },
    /// Line-list indices into the render info's vertices.
    Wireframe {
        key: TileKey,
        render_info: Arc<RenderInfo>,
        indices: Vec<Arc<Vec<u32>>>,
    },
    BoundingVolume {
        key: TileKey,
        sphere: BoundingSphere,
    },
}
impl DrawCommand {
    pub fn key(&self) -> &TileKey {
        match self {
            DrawCommand::Surface { key, .. } => key,
            DrawCommand::Wireframe { key, .. } => key,
            DrawCommand::BoundingVolume { key, .. } => key,
        }
    }
}

/// Per-frame state the tessellator and sector geometries read from and
/// submit to.
pub trait DrawContext {
    fn view(&self) -> Option<&View>;
    fn globe(&self) -> Option<&Globe>;
    fn vertical_exaggeration(&self) -> f64;
    /// The model elevations are sampled from, the globe's unless overridden.
    fn elevation_model(&self) -> Option<Arc<dyn ElevationModel>> {
        self.globe().map(|globe| globe.elevation_model().clone())
    }
    fn submit(&mut self, command: DrawCommand);
}

/// A [`DrawContext`] that collects submitted commands for one frame.
pub struct FrameContext {
    view: Option<View>,
    globe: Option<Globe>,
    vertical_exaggeration: f64,
    elevation_model: Option<Arc<dyn ElevationModel>>,
    commands: Vec<DrawCommand>,
}
impl Default for FrameContext {
    fn default() -> Self {
        Self {
            view: None,
            globe: None,
            vertical_exaggeration: 1.0,
            elevation_model: None,
            commands: vec![],
        }
    }
}
impl FrameContext {
    pub fn new(view: View, globe: Globe) -> Self {
        Self {
            view: Some(view),
            globe: Some(globe),
            ..Default::default()
        }
    }
    pub fn with_view(mut self, view: View) -> Self {
        self.view = Some(view);
        self
    }
    pub fn with_globe(mut self, globe: Globe) -> Self {
        self.globe = Some(globe);
        self
    }
    pub fn with_vertical_exaggeration(mut self, vertical_exaggeration: f64) -> Self {
        self.vertical_exaggeration = vertical_exaggeration;
        self
    }
    pub fn with_elevation_model(mut self, elevation_model: Arc<dyn ElevationModel>) -> Self {
        self.elevation_model = Some(elevation_model);
        self
    }
    pub fn set_view(&mut self, view: View) {
        self.view = Some(view);
    }
    pub fn set_vertical_exaggeration(&mut self, vertical_exaggeration: f64) {
        self.vertical_exaggeration = vertical_exaggeration;
    }
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}
impl DrawContext for FrameContext {
    fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }
    fn globe(&self) -> Option<&Globe> {
        self.globe.as_ref()
    }
    fn vertical_exaggeration(&self) -> f64 {
        self.vertical_exaggeration
    }
    fn elevation_model(&self) -> Option<Arc<dyn ElevationModel>> {
        match &self.elevation_model {
            Some(model) => Some(model.clone()),
            None => self.globe().map(|globe| globe.elevation_model().clone()),
        }
    }
    fn submit(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

//! Draw call types and the batching interface

use crate::assets::TextureHandle;
use crate::foundation::math::{Color, Rect, Vec2};

/// A single textured quad submission
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Texture to sample
    pub texture: TextureHandle,
    /// Region of the texture in pixels, or the whole texture
    pub source: Option<Rect>,
    /// Position in world space (screen space for GUI layers)
    pub position: Vec2,
    /// Tint color
    pub color: Color,
    /// Rotation in radians around `origin`
    pub rotation: f32,
    /// Rotation and scaling origin, relative to the source region
    pub origin: Vec2,
    /// Scale factors
    pub scale: Vec2,
    /// Backend sort key within a layer, 0.0 (front) to 1.0 (back)
    pub depth: f32,
}

impl DrawCall {
    /// Create a draw call at `position` with default tint, rotation and scale
    pub fn new(texture: TextureHandle, position: Vec2) -> Self {
        Self {
            texture,
            source: None,
            position,
            color: Color::WHITE,
            rotation: 0.0,
            origin: Vec2::zeros(),
            scale: Vec2::new(1.0, 1.0),
            depth: 0.0,
        }
    }

    /// Set the source region
    pub fn with_source(mut self, source: Rect) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the tint color
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set rotation around the origin
    pub fn with_rotation(mut self, rotation: f32, origin: Vec2) -> Self {
        self.rotation = rotation;
        self.origin = origin;
        self
    }

    /// Set the scale
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Set the backend depth key
    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }
}

/// Describes the layer whose draw calls follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPass {
    /// Owning scene name
    pub scene: String,
    /// Layer name
    pub layer: String,
    /// Layer priority
    pub priority: i32,
    /// GUI layers are drawn in screen space, without camera transforms
    pub is_gui: bool,
}

/// Batching interface implemented by the graphics backend
pub trait DrawBatch {
    /// A layer's draw pass is starting
    fn begin_layer(&mut self, _pass: &LayerPass) {}

    /// Submit one draw call
    fn draw(&mut self, call: DrawCall);

    /// The current layer's draw pass has finished
    fn end_layer(&mut self) {}
}

/// Draw calls captured for one layer pass
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPass {
    /// The layer the calls belong to
    pub pass: LayerPass,
    /// Calls in submission order
    pub calls: Vec<DrawCall>,
}

/// [`DrawBatch`] that records everything it receives
///
/// Used for headless runs and tests. Calls submitted outside of a layer pass
/// are collected in [`RecordingBatch::loose_calls`].
#[derive(Debug, Default)]
pub struct RecordingBatch {
    passes: Vec<RecordedPass>,
    loose_calls: Vec<DrawCall>,
    open: bool,
}

impl RecordingBatch {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded layer passes in submission order
    pub fn passes(&self) -> &[RecordedPass] {
        &self.passes
    }

    /// Calls submitted outside of any layer pass
    pub fn loose_calls(&self) -> &[DrawCall] {
        &self.loose_calls
    }

    /// Every call in submission order, across passes
    pub fn calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.passes
            .iter()
            .flat_map(|pass| pass.calls.iter())
            .chain(self.loose_calls.iter())
    }

    /// Total number of recorded calls
    pub fn call_count(&self) -> usize {
        self.calls().count()
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.passes.clear();
        self.loose_calls.clear();
        self.open = false;
    }
}

impl DrawBatch for RecordingBatch {
    fn begin_layer(&mut self, pass: &LayerPass) {
        self.passes.push(RecordedPass {
            pass: pass.clone(),
            calls: Vec::new(),
        });
        self.open = true;
    }

    fn draw(&mut self, call: DrawCall) {
        match self.passes.last_mut() {
            Some(pass) if self.open => pass.calls.push(call),
            _ => self.loose_calls.push(call),
        }
    }

    fn end_layer(&mut self) {
        self.open = false;
    }
}

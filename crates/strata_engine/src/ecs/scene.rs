//! Scenes: named containers of priority-ordered layers

use super::error::{EcsError, EcsResult};
use super::layer::Layer;
use crate::foundation::collections::SafeCollection;
use crate::foundation::time::FrameTime;
use crate::render::DrawBatch;
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

pub(crate) struct SceneInner {
    name: String,
    visible: Cell<bool>,
    enabled: Cell<bool>,
    destroyed: Cell<bool>,
    layers: SafeCollection<Layer>,
}

/// Shared handle to a scene
///
/// Layers are kept sorted by descending priority; layers with equal priority
/// keep the order they were created or repositioned in.
#[derive(Clone)]
pub struct Scene(Rc<SceneInner>);

impl Scene {
    /// Create an empty scene
    ///
    /// Scenes are normally created through
    /// [`SceneManager::create_scene`](super::SceneManager::create_scene), which
    /// keeps names unique.
    pub fn new(name: impl Into<String>) -> Self {
        let scene = Self(Rc::new(SceneInner {
            name: name.into(),
            visible: Cell::new(true),
            enabled: Cell::new(true),
            destroyed: Cell::new(false),
            layers: SafeCollection::new(),
        }));
        log::debug!("Created scene '{}'", scene.name());
        scene
    }

    pub(crate) fn from_inner(inner: Rc<SceneInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<SceneInner> {
        Rc::downgrade(&self.0)
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Whether the scene is drawn
    pub fn is_visible(&self) -> bool {
        self.0.visible.get()
    }

    /// Show or hide the scene
    pub fn set_visible(&self, visible: bool) {
        self.0.visible.set(visible);
    }

    /// Whether the scene is updated
    pub fn is_enabled(&self) -> bool {
        self.0.enabled.get()
    }

    /// Enable or disable updates
    pub fn set_enabled(&self, enabled: bool) {
        self.0.enabled.set(enabled);
    }

    /// Whether [`Scene::destroy`] has run
    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.get()
    }

    /// Create a world-space layer
    pub fn create_layer(&self, name: impl Into<String>, priority: i32) -> EcsResult<Layer> {
        self.add_layer(name.into(), priority, false)
    }

    /// Create a screen-space layer
    pub fn create_gui_layer(&self, name: impl Into<String>, priority: i32) -> EcsResult<Layer> {
        self.add_layer(name.into(), priority, true)
    }

    fn add_layer(&self, name: String, priority: i32, is_gui: bool) -> EcsResult<Layer> {
        if self.is_destroyed() {
            return Err(EcsError::SceneDestroyed {
                scene: self.name().to_string(),
            });
        }
        if self.layer(&name).is_some() {
            log::warn!("Layer '{}' already exists in scene '{}'", name, self.name());
            return Err(EcsError::DuplicateName { kind: "layer", name });
        }

        let layer = Layer::new(self, name, priority, is_gui);
        self.insert_by_priority(layer.clone());
        log::debug!(
            "Created layer '{}' (priority {}) in scene '{}'",
            layer.name(),
            priority,
            self.name()
        );
        Ok(layer)
    }

    /// Place `layer` before the first layer with a strictly lower priority
    fn insert_by_priority(&self, layer: Layer) {
        let priority = layer.priority();
        self.0.layers.insert_where(layer, move |layers| {
            layers
                .iter()
                .position(|existing| existing.priority() < priority)
                .unwrap_or(layers.len())
        });
    }

    /// Queue layer changes until [`Scene::release`]
    pub(crate) fn hold(&self) {
        self.0.layers.hold();
    }

    pub(crate) fn release(&self) {
        self.0.layers.release();
    }

    pub(crate) fn reposition(&self, layer: &Layer) {
        if self.0.layers.remove(layer) {
            self.insert_by_priority(layer.clone());
        }
    }

    /// Layer with the given name
    pub fn layer(&self, name: &str) -> Option<Layer> {
        self.0
            .layers
            .snapshot()
            .into_iter()
            .find(|layer| layer.name() == name)
    }

    /// Layers in update/draw order
    pub fn layers(&self) -> Vec<Layer> {
        self.0.layers.snapshot()
    }

    /// Number of layers
    pub fn layer_count(&self) -> usize {
        self.0.layers.len()
    }

    /// Destroy the layer with the given name, returning whether it existed
    pub fn remove_layer(&self, name: &str) -> bool {
        match self.layer(name) {
            Some(layer) => self.destroy_layer(&layer),
            None => false,
        }
    }

    /// Destroy `layer` and every entity on it, returning whether it belonged
    /// to this scene
    pub fn destroy_layer(&self, layer: &Layer) -> bool {
        if !self.0.layers.remove(layer) {
            return false;
        }
        layer.destroy();
        true
    }

    /// Total entities across all layers
    pub fn entity_count(&self) -> usize {
        self.layers().iter().map(Layer::entity_count).sum()
    }

    /// Run `update` on every layer in priority order
    pub fn update(&self, time: &FrameTime) {
        if !self.is_enabled() || self.is_destroyed() {
            return;
        }
        self.0.layers.for_each(|layer| layer.update(time));
    }

    /// Run `fixed_update` on every layer in priority order
    pub fn fixed_update(&self, time: &FrameTime) {
        if !self.is_enabled() || self.is_destroyed() {
            return;
        }
        self.0.layers.for_each(|layer| layer.fixed_update(time));
    }

    /// Draw every layer in priority order
    pub fn draw(&self, batch: &mut dyn DrawBatch) {
        if !self.is_visible() || self.is_destroyed() {
            return;
        }
        self.0.layers.for_each(|layer| layer.draw(&mut *batch));
    }

    /// Destroy every layer and its entities; later calls do nothing
    pub fn destroy(&self) {
        if self.0.destroyed.replace(true) {
            return;
        }

        log::debug!("Destroying scene '{}'", self.name());
        for layer in self.0.layers.snapshot() {
            self.0.layers.remove(&layer);
            layer.destroy();
        }
    }
}

impl PartialEq for Scene {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Scene {}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.0.name)
            .field("visible", &self.is_visible())
            .field("enabled", &self.is_enabled())
            .field("layers", &self.0.layers.len())
            .finish()
    }
}

//! Layers: priority-ordered entity groups within a scene
//!
//! A layer keeps its entities in insertion order for `update` and derives a
//! separate depth-sorted view for `draw`. The view is rebuilt lazily, at most
//! once per draw pass, after a member's depth or the membership changes.
//! Higher depths are drawn first, so the lowest depth ends up on top.

use super::entity::Entity;
use super::error::{EcsError, EcsResult};
use super::scene::{Scene, SceneInner};
use crate::foundation::collections::SafeCollection;
use crate::foundation::time::FrameTime;
use crate::render::{DrawBatch, LayerPass};
use std::cell::{Cell, RefCell};
use std::cmp::Reverse;
use std::fmt;
use std::rc::{Rc, Weak};

pub(crate) struct LayerInner {
    name: String,
    priority: Cell<i32>,
    is_gui: bool,
    visible: Cell<bool>,
    enabled: Cell<bool>,
    destroyed: Cell<bool>,
    scene: Weak<SceneInner>,
    entities: SafeCollection<Entity>,
    draw_order: RefCell<Vec<Entity>>,
    depth_dirty: Cell<bool>,
    depth_sorts: Cell<u64>,
}

/// Shared handle to a layer
///
/// Created through [`Scene::create_layer`]. Clones refer to the same layer;
/// equality is identity.
#[derive(Clone)]
pub struct Layer(Rc<LayerInner>);

impl Layer {
    pub(crate) fn new(scene: &Scene, name: String, priority: i32, is_gui: bool) -> Self {
        Self(Rc::new(LayerInner {
            name,
            priority: Cell::new(priority),
            is_gui,
            visible: Cell::new(true),
            enabled: Cell::new(true),
            destroyed: Cell::new(false),
            scene: scene.downgrade(),
            entities: SafeCollection::new(),
            draw_order: RefCell::new(Vec::new()),
            depth_dirty: Cell::new(false),
            depth_sorts: Cell::new(0),
        }))
    }

    pub(crate) fn from_inner(inner: Rc<LayerInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<LayerInner> {
        Rc::downgrade(&self.0)
    }

    /// Name, unique within the scene
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Owning scene, if it is still alive
    pub fn scene(&self) -> Option<Scene> {
        self.0.scene.upgrade().map(Scene::from_inner)
    }

    /// Update/draw priority; higher runs first
    pub fn priority(&self) -> i32 {
        self.0.priority.get()
    }

    /// Change the priority and move the layer to its new place in the scene
    pub fn set_priority(&self, priority: i32) {
        if self.0.priority.replace(priority) == priority {
            return;
        }
        if let Some(scene) = self.scene() {
            scene.reposition(self);
        }
    }

    /// Whether the renderer should draw this layer in screen space
    pub fn is_gui(&self) -> bool {
        self.0.is_gui
    }

    /// Whether the layer is drawn
    pub fn is_visible(&self) -> bool {
        self.0.visible.get()
    }

    /// Show or hide the layer
    pub fn set_visible(&self, visible: bool) {
        self.0.visible.set(visible);
    }

    /// Whether the layer is updated
    pub fn is_enabled(&self) -> bool {
        self.0.enabled.get()
    }

    /// Enable or disable updates
    pub fn set_enabled(&self, enabled: bool) {
        self.0.enabled.set(enabled);
    }

    /// Whether the layer has been destroyed by its scene
    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.get()
    }

    /// Add an entity, moving it off its current layer first
    pub fn add_entity(&self, entity: &Entity) -> EcsResult<()> {
        if self.is_destroyed() {
            log::warn!("Rejected {} on destroyed layer '{}'", entity, self.name());
            return Err(EcsError::LayerDestroyed {
                layer: self.name().to_string(),
            });
        }
        if entity.is_destroyed() {
            return Err(EcsError::EntityDestroyed {
                entity: entity.to_string(),
            });
        }

        if let Some(current) = entity.layer() {
            if current == *self {
                return Ok(());
            }
            log::debug!(
                "Moving {} from layer '{}' to '{}'",
                entity,
                current.name(),
                self.name()
            );
            current.remove_entity(entity);
        }

        self.0.entities.add(entity.clone());
        entity.set_layer(Some(self));
        self.mark_depth_dirty();
        Ok(())
    }

    /// Remove an entity without destroying it, returning whether it was a member
    pub fn remove_entity(&self, entity: &Entity) -> bool {
        if !self.0.entities.remove(entity) {
            return false;
        }
        if entity.layer().as_ref() == Some(self) {
            entity.set_layer(None);
        }
        self.mark_depth_dirty();
        true
    }

    /// Whether `entity` is a member
    pub fn contains(&self, entity: &Entity) -> bool {
        self.0.entities.contains(entity)
    }

    /// Members in insertion order
    pub fn entities(&self) -> Vec<Entity> {
        self.0.entities.snapshot()
    }

    /// Number of members
    pub fn entity_count(&self) -> usize {
        self.0.entities.len()
    }

    /// Members in draw order, resorting first if needed
    pub fn draw_order(&self) -> Vec<Entity> {
        self.refresh_draw_order();
        self.0.draw_order.borrow().clone()
    }

    /// Number of times the draw order has been rebuilt
    pub fn depth_sort_count(&self) -> u64 {
        self.0.depth_sorts.get()
    }

    pub(crate) fn mark_depth_dirty(&self) {
        self.0.depth_dirty.set(true);
    }

    /// Queue membership changes until [`Layer::release`]
    pub(crate) fn hold(&self) {
        self.0.entities.hold();
    }

    pub(crate) fn release(&self) {
        self.0.entities.release();
    }

    fn refresh_draw_order(&self) {
        if !self.0.depth_dirty.replace(false) {
            return;
        }

        let mut order = self.0.entities.snapshot();
        order.sort_by_key(|entity| Reverse(entity.depth()));
        *self.0.draw_order.borrow_mut() = order;
        self.0.depth_sorts.set(self.0.depth_sorts.get() + 1);
        log::trace!("Resorted layer '{}' by depth", self.name());
    }

    /// Run `update` on every enabled entity, in insertion order
    pub fn update(&self, time: &FrameTime) {
        if !self.is_enabled() || self.is_destroyed() {
            return;
        }
        self.0.entities.for_each(|entity| {
            if entity.is_enabled() && !entity.is_destroyed() {
                entity.update(time);
            }
        });
    }

    /// Run `fixed_update` on every enabled entity, in insertion order
    pub fn fixed_update(&self, time: &FrameTime) {
        if !self.is_enabled() || self.is_destroyed() {
            return;
        }
        self.0.entities.for_each(|entity| {
            if entity.is_enabled() && !entity.is_destroyed() {
                entity.fixed_update(time);
            }
        });
    }

    /// Draw every visible entity in depth order
    ///
    /// The order is taken once when the pass starts. Depth changes made while
    /// drawing apply from the next pass.
    pub fn draw(&self, batch: &mut dyn DrawBatch) {
        if !self.is_visible() || self.is_destroyed() {
            return;
        }

        let order = self.draw_order();
        let pass = LayerPass {
            scene: self.scene().map(|scene| scene.name().to_string()).unwrap_or_default(),
            layer: self.name().to_string(),
            priority: self.priority(),
            is_gui: self.is_gui(),
        };

        batch.begin_layer(&pass);
        {
            let _pass = self.0.entities.begin_pass();
            for entity in &order {
                if !entity.is_visible()
                    || entity.is_destroyed()
                    || !self.0.entities.is_live(entity)
                {
                    continue;
                }
                entity.draw(&mut *batch);
            }
        }
        batch.end_layer();
    }

    /// Destroy every member, then mark the layer destroyed
    pub(crate) fn destroy(&self) {
        if self.0.destroyed.get() {
            return;
        }

        log::debug!(
            "Destroying layer '{}' with {} entities",
            self.name(),
            self.entity_count()
        );
        for entity in self.0.entities.snapshot() {
            entity.destroy_entity();
            // Entities that were already destroyed but still queued here
            self.remove_entity(&entity);
        }
        self.0.destroyed.set(true);
    }
}

impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Layer {}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.0.name)
            .field("priority", &self.priority())
            .field("gui", &self.0.is_gui)
            .field("visible", &self.is_visible())
            .field("enabled", &self.is_enabled())
            .field("entities", &self.0.entities.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBatch;

    fn scene_with_layer() -> (Scene, Layer) {
        let scene = Scene::new("layers");
        let layer = scene.create_layer("world", 0).unwrap();
        (scene, layer)
    }

    fn entity_at(layer: &Layer, name: &str, depth: i32) -> Entity {
        let entity = Entity::with_name(layer, name).unwrap();
        entity.set_depth(depth);
        entity
    }

    fn names(entities: &[Entity]) -> Vec<String> {
        entities.iter().map(Entity::name).collect()
    }

    #[test]
    fn test_draw_order_puts_lowest_depth_last() {
        let (_scene, layer) = scene_with_layer();
        entity_at(&layer, "five", 5);
        entity_at(&layer, "one", 1);
        entity_at(&layer, "three", 3);

        assert_eq!(names(&layer.draw_order()), vec!["five", "three", "one"]);
        assert_eq!(names(&layer.entities()), vec!["five", "one", "three"]);
    }

    #[test]
    fn test_draw_order_is_stable_for_equal_depths() {
        let (_scene, layer) = scene_with_layer();
        entity_at(&layer, "a", 2);
        entity_at(&layer, "b", 2);
        entity_at(&layer, "c", 7);

        assert_eq!(names(&layer.draw_order()), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_resort_is_lazy() {
        let (_scene, layer) = scene_with_layer();
        let first = entity_at(&layer, "first", 1);
        let second = entity_at(&layer, "second", 2);

        layer.draw_order();
        let sorts = layer.depth_sort_count();
        layer.draw_order();
        assert_eq!(layer.depth_sort_count(), sorts);

        first.set_depth(10);
        second.set_depth(20);
        first.set_depth(30);
        assert_eq!(layer.depth_sort_count(), sorts);
        assert_eq!(names(&layer.draw_order()), vec!["first", "second"]);
        assert_eq!(layer.depth_sort_count(), sorts + 1);
    }

    #[test]
    fn test_add_entity_transfers_between_layers() {
        let (scene, first) = scene_with_layer();
        let second = scene.create_layer("overlay", 1).unwrap();
        let entity = Entity::new(&first).unwrap();

        second.add_entity(&entity).unwrap();
        assert!(!first.contains(&entity));
        assert!(second.contains(&entity));
        assert_eq!(entity.layer(), Some(second.clone()));

        // Adding to the current layer again is a no-op
        second.add_entity(&entity).unwrap();
        assert_eq!(second.entity_count(), 1);
    }

    #[test]
    fn test_remove_entity_keeps_it_alive() {
        let (_scene, layer) = scene_with_layer();
        let entity = Entity::new(&layer).unwrap();

        assert!(layer.remove_entity(&entity));
        assert!(!layer.remove_entity(&entity));
        assert!(entity.layer().is_none());
        assert!(!entity.is_destroyed());
    }

    #[test]
    fn test_draw_brackets_pass_and_skips_hidden() {
        let (_scene, layer) = scene_with_layer();
        let hidden = entity_at(&layer, "hidden", 0);
        hidden.set_visible(false);

        let mut batch = RecordingBatch::new();
        layer.draw(&mut batch);
        assert_eq!(batch.passes().len(), 1);
        assert_eq!(batch.passes()[0].pass.layer, "world");
        assert_eq!(batch.passes()[0].pass.scene, "layers");

        layer.set_visible(false);
        layer.draw(&mut batch);
        assert_eq!(batch.passes().len(), 1);
    }

    #[test]
    fn test_destroyed_layer_rejects_entities() {
        let (scene, layer) = scene_with_layer();
        let entity = Entity::new(&layer).unwrap();

        scene.destroy_layer(&layer);
        assert!(layer.is_destroyed());
        assert!(entity.is_destroyed());
        assert_eq!(layer.entity_count(), 0);
        assert!(matches!(
            Entity::new(&layer),
            Err(EcsError::LayerDestroyed { .. })
        ));
    }
}

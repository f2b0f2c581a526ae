//! Entities: ordered component containers living on a layer
//!
//! Components are indexed twice: a type map holding every alias key of every
//! attached component, and an insertion-ordered [`SafeCollection`] of distinct
//! instances that the frame hooks iterate. Both are updated on the same
//! attach/detach path.

use super::component::ComponentRef;
use super::error::{EcsError, EcsResult};
use super::layer::{Layer, LayerInner};
use super::scene::Scene;
use super::type_registry::{ComponentType, TypeKey};
use crate::foundation::collections::SafeCollection;
use crate::foundation::time::FrameTime;
use crate::render::DrawBatch;
use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct EntityInner {
    id: EntityId,
    name: RefCell<String>,
    depth: Cell<i32>,
    enabled: Cell<bool>,
    visible: Cell<bool>,
    destroyed: Cell<bool>,
    layer: RefCell<Weak<LayerInner>>,
    tags: RefCell<Vec<String>>,
    by_type: RefCell<HashMap<TypeKey, ComponentRef>>,
    components: SafeCollection<ComponentRef>,
}

/// Shared handle to an entity
///
/// Clones refer to the same entity; equality is identity.
#[derive(Clone)]
pub struct Entity(Rc<EntityInner>);

impl Entity {
    /// Create an entity and register it with `layer`
    pub fn new(layer: &Layer) -> EcsResult<Self> {
        Self::with_name(layer, "")
    }

    /// Create a named entity and register it with `layer`
    pub fn with_name(layer: &Layer, name: impl Into<String>) -> EcsResult<Self> {
        let entity = Self(Rc::new(EntityInner {
            id: EntityId::next(),
            name: RefCell::new(name.into()),
            depth: Cell::new(0),
            enabled: Cell::new(true),
            visible: Cell::new(true),
            destroyed: Cell::new(false),
            layer: RefCell::new(Weak::new()),
            tags: RefCell::new(Vec::new()),
            by_type: RefCell::new(HashMap::new()),
            components: SafeCollection::new(),
        }));
        layer.add_entity(&entity)?;
        log::debug!("Created {} on layer '{}'", entity, layer.name());
        Ok(entity)
    }

    pub(crate) fn from_inner(inner: Rc<EntityInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<EntityInner> {
        Rc::downgrade(&self.0)
    }

    /// Unique id
    pub fn id(&self) -> EntityId {
        self.0.id
    }

    /// Display name; empty if never named
    pub fn name(&self) -> String {
        self.0.name.borrow().clone()
    }

    /// Rename the entity
    pub fn set_name(&self, name: impl Into<String>) {
        *self.0.name.borrow_mut() = name.into();
    }

    /// Construct `component` and attach it
    pub fn add_component<C: ComponentType>(&self, component: C) -> EcsResult<ComponentRef> {
        let component = ComponentRef::new(component);
        self.attach(&component)?;
        Ok(component)
    }

    /// Attach a free-standing component
    ///
    /// Fails without touching the entity if the component already has an
    /// owner or if any of its alias keys is already registered here.
    pub fn attach(&self, component: &ComponentRef) -> EcsResult<()> {
        if self.is_destroyed() {
            log::warn!("Rejected {} on destroyed {}", component.type_name(), self);
            return Err(EcsError::EntityDestroyed {
                entity: self.to_string(),
            });
        }

        if let Some(owner) = component.owner() {
            log::warn!(
                "Rejected {} on {}: already owned by {}",
                component.type_name(),
                self,
                owner
            );
            return Err(EcsError::AlreadyOwned {
                component: component.type_name().to_string(),
                owner: owner.to_string(),
            });
        }

        {
            let by_type = self.0.by_type.borrow();
            if let Some(key) = component
                .alias_keys()
                .iter()
                .find(|key| by_type.contains_key(key))
            {
                log::warn!(
                    "Rejected {} on {}: {} is already registered",
                    component.type_name(),
                    self,
                    key
                );
                return Err(EcsError::DuplicateTypeRegistration {
                    key: key.name().to_string(),
                    entity: self.to_string(),
                });
            }
        }

        {
            let mut by_type = self.0.by_type.borrow_mut();
            for key in component.alias_keys() {
                by_type.insert(*key, component.clone());
            }
        }
        self.0.components.add(component.clone());
        component.set_owner(Some(self));
        log::debug!("Attached {} to {}", component.type_name(), self);

        component.run_initialize(self);
        Ok(())
    }

    /// Component registered under `C`, which may be a concrete type or a
    /// `dyn` capability
    pub fn get<C: ?Sized + 'static>(&self) -> EcsResult<ComponentRef> {
        self.try_get::<C>().ok_or_else(|| {
            EcsError::not_found(format!("component {} on {}", type_name::<C>(), self))
        })
    }

    /// Like [`Entity::get`], with absence as `None`
    pub fn try_get<C: ?Sized + 'static>(&self) -> Option<ComponentRef> {
        self.get_by_key(TypeKey::of::<C>())
    }

    /// Component registered under a runtime key
    pub fn get_by_key(&self, key: TypeKey) -> Option<ComponentRef> {
        self.0.by_type.borrow().get(&key).cloned()
    }

    /// Whether a component is registered under `C`
    pub fn has_component<C: ?Sized + 'static>(&self) -> bool {
        self.has_key(TypeKey::of::<C>())
    }

    /// Whether a component is registered under `key`
    pub fn has_key(&self, key: TypeKey) -> bool {
        self.0.by_type.borrow().contains_key(&key)
    }

    /// Distinct attached components in attach order
    pub fn components(&self) -> Vec<ComponentRef> {
        self.0.components.snapshot()
    }

    /// Number of distinct attached components
    pub fn component_count(&self) -> usize {
        self.0.components.len()
    }

    /// Detach the component registered under `C`
    pub fn remove_component<C: ?Sized + 'static>(&self) -> Option<ComponentRef> {
        self.remove_by_key(TypeKey::of::<C>())
    }

    /// Detach the component registered under `key`
    ///
    /// Every key aliasing the same instance is dropped, not just `key`.
    /// Returns `None` if nothing is registered under `key` or the entity has
    /// been destroyed.
    pub fn remove_by_key(&self, key: TypeKey) -> Option<ComponentRef> {
        if self.is_destroyed() {
            log::warn!("Ignored removal of {} from destroyed {}", key, self);
            return None;
        }

        let component = self.get_by_key(key)?;
        self.detach(&component);
        Some(component)
    }

    /// Detach a specific component instance, returning whether it was attached
    pub fn remove(&self, component: &ComponentRef) -> bool {
        if self.is_destroyed() || !component.owned_by(self) {
            return false;
        }
        self.detach(component);
        true
    }

    fn detach(&self, component: &ComponentRef) {
        component.run_destroy(self);
        self.0
            .by_type
            .borrow_mut()
            .retain(|_, registered| registered != component);
        self.0.components.remove(component);
        component.set_owner(None);
        log::debug!("Detached {} from {}", component.type_name(), self);
    }

    /// Queue component membership changes until [`Entity::release`]
    pub(crate) fn hold(&self) {
        self.0.components.hold();
    }

    pub(crate) fn release(&self) {
        self.0.components.release();
    }

    /// Run `update` on every enabled component
    pub fn update(&self, time: &FrameTime) {
        self.0
            .components
            .for_each(|component| component.run_update(self, time));
    }

    /// Run `fixed_update` on every enabled component
    pub fn fixed_update(&self, time: &FrameTime) {
        self.0
            .components
            .for_each(|component| component.run_fixed_update(self, time));
    }

    /// Run `draw` on every visible component
    pub fn draw(&self, batch: &mut dyn DrawBatch) {
        self.0
            .components
            .for_each(|component| component.run_draw(self, &mut *batch));
    }

    /// Destroy the entity
    ///
    /// Only the first call has an effect. Component `destroy` hooks run only
    /// if the entity is enabled at that moment. The entity then releases its
    /// components and leaves its layer.
    pub fn destroy_entity(&self) {
        if self.0.destroyed.replace(true) {
            return;
        }

        log::debug!("Destroying {}", self);
        if self.is_enabled() {
            self.0
                .components
                .for_each(|component| component.run_destroy(self));
        }

        self.0.by_type.borrow_mut().clear();
        for component in self.0.components.snapshot() {
            self.0.components.remove(&component);
            component.set_owner(None);
        }

        if let Some(layer) = self.layer() {
            layer.remove_entity(self);
        }
    }

    /// Whether [`Entity::destroy_entity`] has run
    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.get()
    }

    /// Draw depth; lower depths are drawn later, on top
    pub fn depth(&self) -> i32 {
        self.0.depth.get()
    }

    /// Change the draw depth and invalidate the layer's draw order
    pub fn set_depth(&self, depth: i32) {
        if self.0.depth.replace(depth) != depth {
            if let Some(layer) = self.layer() {
                layer.mark_depth_dirty();
            }
        }
    }

    /// Whether the layer runs `update`/`fixed_update`/`destroy` on this entity
    pub fn is_enabled(&self) -> bool {
        self.0.enabled.get()
    }

    /// Enable or disable the entity
    pub fn set_enabled(&self, enabled: bool) {
        self.0.enabled.set(enabled);
    }

    /// Whether the layer draws this entity
    pub fn is_visible(&self) -> bool {
        self.0.visible.get()
    }

    /// Show or hide the entity
    pub fn set_visible(&self, visible: bool) {
        self.0.visible.set(visible);
    }

    /// Owning layer
    pub fn layer(&self) -> Option<Layer> {
        self.0.layer.borrow().upgrade().map(Layer::from_inner)
    }

    pub(crate) fn set_layer(&self, layer: Option<&Layer>) {
        *self.0.layer.borrow_mut() = layer.map_or_else(Weak::new, Layer::downgrade);
    }

    /// Scene of the owning layer
    pub fn scene(&self) -> Option<Scene> {
        self.layer()?.scene()
    }

    /// Add a tag; duplicates are ignored
    pub fn add_tag(&self, tag: impl Into<String>) {
        let tag = tag.into();
        let mut tags = self.0.tags.borrow_mut();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    /// Remove a tag, returning whether it was present
    pub fn remove_tag(&self, tag: &str) -> bool {
        let mut tags = self.0.tags.borrow_mut();
        let before = tags.len();
        tags.retain(|existing| existing != tag);
        tags.len() != before
    }

    /// Whether the entity carries `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.0.tags.borrow().iter().any(|existing| existing == tag)
    }

    /// Tags in the order they were added
    pub fn tags(&self) -> Vec<String> {
        self.0.tags.borrow().clone()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Entity {}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.0.name.borrow();
        if name.is_empty() {
            write!(f, "entity {}", self.0.id)
        } else {
            write!(f, "entity {} '{}'", self.0.id, name)
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.0.id)
            .field("name", &*self.0.name.borrow())
            .field("depth", &self.depth())
            .field("enabled", &self.is_enabled())
            .field("visible", &self.is_visible())
            .field("destroyed", &self.is_destroyed())
            .field("components", &self.0.components.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component_type;
    use crate::ecs::{Component, Scene};
    use std::rc::Rc;

    trait Collider: Component {
        fn radius(&self) -> f32;
    }
    trait CircleCollider: Collider {}

    struct Circle(f32);
    impl Component for Circle {}
    impl Collider for Circle {
        fn radius(&self) -> f32 {
            self.0
        }
    }
    impl CircleCollider for Circle {}
    component_type!(Circle: dyn CircleCollider, dyn Collider);

    struct Square;
    impl Component for Square {}
    impl Collider for Square {
        fn radius(&self) -> f32 {
            1.0
        }
    }
    component_type!(Square: dyn Collider);

    struct Sprite;
    impl Component for Sprite {}
    component_type!(Sprite);

    /// Concrete specialization of `Sprite`
    struct AnimatedSprite;
    impl Component for AnimatedSprite {}
    component_type!(AnimatedSprite: Sprite);

    #[derive(Default)]
    struct Probe {
        log: Rc<RefCell<Vec<&'static str>>>,
    }
    impl Component for Probe {
        fn initialize(&mut self, _entity: &Entity) {
            self.log.borrow_mut().push("initialize");
        }
        fn destroy(&mut self, _entity: &Entity) {
            self.log.borrow_mut().push("destroy");
        }
    }
    component_type!(Probe);

    fn layer() -> (Scene, Layer) {
        let scene = Scene::new("test");
        let layer = scene.create_layer("main", 0).unwrap();
        (scene, layer)
    }

    #[test]
    fn test_alias_keys_resolve_to_same_instance() {
        let (_scene, layer) = layer();
        let entity = Entity::new(&layer).unwrap();
        let circle = entity.add_component(Circle(2.5)).unwrap();

        assert_eq!(entity.get::<Circle>().unwrap(), circle);
        assert_eq!(entity.get::<dyn CircleCollider>().unwrap(), circle);
        assert_eq!(entity.get::<dyn Collider>().unwrap(), circle);
        assert!(!entity.has_component::<dyn Component>());
        assert_eq!(entity.components(), vec![circle.clone()]);

        let radius = entity
            .get::<dyn Collider>()
            .unwrap()
            .borrow_as::<dyn Collider>()
            .map(|collider| collider.radius());
        assert_eq!(radius, Some(2.5));
        assert!(circle.is_initialized());
        assert_eq!(circle.owner(), Some(entity));
    }

    #[test]
    fn test_concrete_ancestor_is_not_registered() {
        let (_scene, layer) = layer();
        let entity = Entity::new(&layer).unwrap();
        entity.add_component(AnimatedSprite).unwrap();

        assert!(entity.has_component::<AnimatedSprite>());
        assert!(!entity.has_component::<Sprite>());
        assert!(matches!(entity.get::<Sprite>(), Err(EcsError::NotFound { .. })));
        assert!(entity.try_get::<Sprite>().is_none());

        // The parent can still be attached alongside
        entity.add_component(Sprite).unwrap();
        assert_eq!(entity.component_count(), 2);
    }

    #[test]
    fn test_runtime_key_lookup() {
        let (_scene, layer) = layer();
        let entity = Entity::new(&layer).unwrap();
        let circle = entity.add_component(Circle(1.0)).unwrap();

        assert_eq!(entity.get_by_key(TypeKey::of::<dyn Collider>()), Some(circle));
        assert!(entity.has_key(TypeKey::of::<Circle>()));

        assert_eq!(entity.get_by_key(TypeKey::of::<Square>()), None);
        assert!(!entity.has_key(TypeKey::of::<Square>()));
        assert!(!entity.has_key(TypeKey::of::<dyn Component>()));
        assert_eq!(entity.remove_by_key(TypeKey::of::<Square>()), None);
        assert_eq!(entity.component_count(), 1);
    }

    #[test]
    fn test_duplicate_registration_is_atomic() {
        let (_scene, layer) = layer();
        let entity = Entity::new(&layer).unwrap();
        let square = entity.add_component(Square).unwrap();

        let circle = ComponentRef::new(Circle(1.0));
        let error = entity.attach(&circle).unwrap_err();
        assert!(matches!(error, EcsError::DuplicateTypeRegistration { .. }));

        assert!(!entity.has_component::<Circle>());
        assert!(!entity.has_component::<dyn CircleCollider>());
        assert_eq!(entity.get::<dyn Collider>().unwrap(), square);
        assert_eq!(entity.component_count(), 1);
        assert!(!circle.has_owner());
        assert!(!circle.is_initialized());
    }

    #[test]
    fn test_already_owned_component_is_rejected() {
        let (_scene, layer) = layer();
        let first = Entity::new(&layer).unwrap();
        let second = Entity::new(&layer).unwrap();
        let sprite = first.add_component(Sprite).unwrap();

        let error = second.attach(&sprite).unwrap_err();
        assert!(matches!(error, EcsError::AlreadyOwned { .. }));
        assert_eq!(second.component_count(), 0);
        assert!(!second.has_component::<Sprite>());
        assert_eq!(sprite.owner(), Some(first));
    }

    #[test]
    fn test_remove_by_abstract_key_drops_every_alias() {
        let (_scene, layer) = layer();
        let entity = Entity::new(&layer).unwrap();
        let circle = entity.add_component(Circle(1.0)).unwrap();

        let removed = entity.remove_component::<dyn Collider>().unwrap();
        assert_eq!(removed, circle);
        assert!(!entity.has_component::<Circle>());
        assert!(!entity.has_component::<dyn CircleCollider>());
        assert!(!entity.has_component::<dyn Collider>());
        assert!(entity.components().is_empty());
        assert!(!circle.has_owner());

        assert!(entity.remove_component::<Circle>().is_none());

        // Detached components can be attached again
        let other = Entity::new(&layer).unwrap();
        other.attach(&circle).unwrap();
        assert_eq!(other.get::<dyn Collider>().unwrap(), circle);
    }

    #[test]
    fn test_remove_runs_destroy_hook() {
        let (_scene, layer) = layer();
        let entity = Entity::new(&layer).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let probe = entity.add_component(Probe { log: Rc::clone(&log) }).unwrap();

        assert!(entity.remove(&probe));
        assert!(!entity.remove(&probe));
        assert_eq!(*log.borrow(), vec!["initialize", "destroy"]);
    }

    #[test]
    fn test_destroy_entity_is_idempotent() {
        let (_scene, layer) = layer();
        let entity = Entity::new(&layer).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        entity.add_component(Probe { log: Rc::clone(&log) }).unwrap();

        entity.destroy_entity();
        entity.destroy_entity();

        assert!(entity.is_destroyed());
        assert_eq!(*log.borrow(), vec!["initialize", "destroy"]);
        assert!(!layer.contains(&entity));
        assert!(entity.layer().is_none());
        assert!(matches!(
            entity.add_component(Sprite),
            Err(EcsError::EntityDestroyed { .. })
        ));
    }

    #[test]
    fn test_destroy_disabled_entity_skips_hooks() {
        let (_scene, layer) = layer();
        let entity = Entity::new(&layer).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let probe = entity.add_component(Probe { log: Rc::clone(&log) }).unwrap();

        entity.set_enabled(false);
        entity.destroy_entity();

        assert_eq!(*log.borrow(), vec!["initialize"]);
        assert!(!probe.has_owner());
        assert!(entity.remove_component::<Probe>().is_none());
    }

    #[test]
    fn test_tags_and_names() {
        let (scene, layer) = layer();
        let entity = Entity::with_name(&layer, "player").unwrap();
        entity.add_tag("hero");
        entity.add_tag("hero");
        entity.add_tag("flying");

        assert_eq!(entity.name(), "player");
        assert_eq!(entity.tags(), vec!["hero".to_string(), "flying".to_string()]);
        assert!(entity.remove_tag("hero"));
        assert!(!entity.has_tag("hero"));
        assert_eq!(entity.scene(), Some(scene));
        assert!(entity.to_string().contains("player"));
    }
}

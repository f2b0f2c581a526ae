//! Component trait and shared component handles
//!
//! A component is a unit of behavior owned by at most one [`Entity`]. It is
//! constructed free-standing, attached (owner set, `initialize` runs), and may
//! later be detached (`destroy` runs, owner cleared) and attached elsewhere.

use super::entity::{Entity, EntityInner};
use super::type_registry::{ComponentInfo, ComponentType, TypeKey};
use crate::foundation::time::FrameTime;
use crate::render::DrawBatch;
use std::any::Any;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

/// Erased access to the concrete component value
pub trait AsAny: Any {
    /// Shared access as `Any`
    fn as_any(&self) -> &dyn Any;
    /// Mutable access as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Lifecycle hooks of a component
///
/// Every hook receives the owning entity, through which the component can
/// reach its layer and scene, and add or remove components and entities.
/// Those changes are deferred by the frame loop and become visible on the next
/// pass.
pub trait Component: AsAny {
    /// Called once when the component is attached to an entity
    fn initialize(&mut self, _entity: &Entity) {}

    /// Variable timestep logic; skipped while the component is disabled
    fn update(&mut self, _entity: &Entity, _time: &FrameTime) {}

    /// Fixed timestep logic; skipped while the component is disabled
    fn fixed_update(&mut self, _entity: &Entity, _time: &FrameTime) {}

    /// Submit draw calls; skipped while the component is invisible
    fn draw(&mut self, _entity: &Entity, _batch: &mut dyn DrawBatch) {}

    /// Called when the component is removed or its entity is destroyed
    fn destroy(&mut self, _entity: &Entity) {}
}

struct ComponentCell {
    info: Rc<ComponentInfo>,
    owner: RefCell<Weak<EntityInner>>,
    enabled: Cell<bool>,
    visible: Cell<bool>,
    initialized: Cell<bool>,
    /// Owner to pass to `destroy` once the running hook returns
    deferred_destroy: RefCell<Option<Entity>>,
    behavior: RefCell<Box<dyn Component>>,
}

/// Shared handle to a component instance
///
/// Clones refer to the same instance; equality is identity.
#[derive(Clone)]
pub struct ComponentRef(Rc<ComponentCell>);

impl ComponentRef {
    /// Wrap a free-standing component
    pub fn new<C: ComponentType>(component: C) -> Self {
        Self(Rc::new(ComponentCell {
            info: ComponentInfo::of::<C>(),
            owner: RefCell::new(Weak::new()),
            enabled: Cell::new(true),
            visible: Cell::new(true),
            initialized: Cell::new(false),
            deferred_destroy: RefCell::new(None),
            behavior: RefCell::new(Box::new(component)),
        }))
    }

    /// Resolved type information
    pub fn info(&self) -> &ComponentInfo {
        &self.0.info
    }

    /// Key of the concrete type
    pub fn type_key(&self) -> TypeKey {
        self.0.info.key()
    }

    /// Concrete type name
    pub fn type_name(&self) -> &'static str {
        self.0.info.type_name()
    }

    /// Every key this component registers under when attached
    pub fn alias_keys(&self) -> &[TypeKey] {
        self.0.info.alias_keys()
    }

    /// Whether the component is reachable through `C` (concrete or capability)
    pub fn is<C: ?Sized + 'static>(&self) -> bool {
        self.alias_keys().contains(&TypeKey::of::<C>())
    }

    /// The owning entity, if attached
    pub fn owner(&self) -> Option<Entity> {
        self.0.owner.borrow().upgrade().map(Entity::from_inner)
    }

    /// Whether the component is attached to a live entity
    pub fn has_owner(&self) -> bool {
        self.0.owner.borrow().strong_count() > 0
    }

    /// Whether `update` / `fixed_update` run
    pub fn is_enabled(&self) -> bool {
        self.0.enabled.get()
    }

    /// Enable or disable `update` / `fixed_update`
    pub fn set_enabled(&self, enabled: bool) {
        self.0.enabled.set(enabled);
    }

    /// Whether `draw` runs
    pub fn is_visible(&self) -> bool {
        self.0.visible.get()
    }

    /// Show or hide the component
    pub fn set_visible(&self, visible: bool) {
        self.0.visible.set(visible);
    }

    /// Whether `initialize` has run
    pub fn is_initialized(&self) -> bool {
        self.0.initialized.get()
    }

    /// Borrow as the concrete type `C`
    ///
    /// # Panics
    ///
    /// Panics if the component is mutably borrowed, which includes while one
    /// of its own hooks is running.
    pub fn borrow<C: Component>(&self) -> Option<Ref<'_, C>> {
        Ref::filter_map(self.0.behavior.borrow(), |component| {
            (**component).as_any().downcast_ref::<C>()
        })
        .ok()
    }

    /// Mutably borrow as the concrete type `C`
    ///
    /// # Panics
    ///
    /// Panics if the component is already borrowed.
    pub fn borrow_mut<C: Component>(&self) -> Option<RefMut<'_, C>> {
        RefMut::filter_map(self.0.behavior.borrow_mut(), |component| {
            (**component).as_any_mut().downcast_mut::<C>()
        })
        .ok()
    }

    /// Borrow as a registered capability, e.g. `borrow_as::<dyn Collider>()`
    ///
    /// # Panics
    ///
    /// Panics if the component is mutably borrowed.
    pub fn borrow_as<I: ?Sized + 'static>(&self) -> Option<Ref<'_, I>> {
        let info = &self.0.info;
        Ref::filter_map(self.0.behavior.borrow(), |component| {
            info.cast_ref::<I>((**component).as_any())
        })
        .ok()
    }

    /// Mutably borrow as a registered capability
    ///
    /// # Panics
    ///
    /// Panics if the component is already borrowed.
    pub fn borrow_as_mut<I: ?Sized + 'static>(&self) -> Option<RefMut<'_, I>> {
        let info = &self.0.info;
        RefMut::filter_map(self.0.behavior.borrow_mut(), |component| {
            info.cast_mut::<I>((**component).as_any_mut())
        })
        .ok()
    }

    /// Run `f` on the concrete value, if this is a `C` and it is not busy
    pub fn with<C: Component, R>(&self, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        let mut component = self.0.behavior.try_borrow_mut().ok()?;
        (**component).as_any_mut().downcast_mut::<C>().map(f)
    }

    pub(crate) fn set_owner(&self, owner: Option<&Entity>) {
        *self.0.owner.borrow_mut() = owner.map_or_else(Weak::new, Entity::downgrade);
    }

    pub(crate) fn owned_by(&self, entity: &Entity) -> bool {
        self.0.owner.borrow().ptr_eq(&entity.downgrade())
    }

    pub(crate) fn run_initialize(&self, entity: &Entity) {
        if self.run_hook(entity, |component| component.initialize(entity)) {
            self.0.initialized.set(true);
        }
    }

    pub(crate) fn run_update(&self, entity: &Entity, time: &FrameTime) {
        if self.is_enabled() {
            self.run_hook(entity, |component| component.update(entity, time));
        }
    }

    pub(crate) fn run_fixed_update(&self, entity: &Entity, time: &FrameTime) {
        if self.is_enabled() {
            self.run_hook(entity, |component| component.fixed_update(entity, time));
        }
    }

    pub(crate) fn run_draw(&self, entity: &Entity, batch: &mut dyn DrawBatch) {
        if self.is_visible() {
            self.run_hook(entity, |component| component.draw(entity, batch));
        }
    }

    /// Run `destroy`, or queue it if one of this component's hooks is running
    pub(crate) fn run_destroy(&self, entity: &Entity) {
        match self.0.behavior.try_borrow_mut() {
            Ok(mut component) => component.destroy(entity),
            Err(_) => {
                log::trace!("Deferring destroy of busy component {}", self.type_name());
                *self.0.deferred_destroy.borrow_mut() = Some(entity.clone());
            }
        }
    }

    fn run_hook(&self, entity: &Entity, hook: impl FnOnce(&mut dyn Component)) -> bool {
        match self.0.behavior.try_borrow_mut() {
            Ok(mut component) => hook(&mut **component),
            Err(_) => {
                log::warn!(
                    "Skipping re-entrant hook on {} (entity {})",
                    self.type_name(),
                    entity.id()
                );
                return false;
            }
        }

        let deferred = self.0.deferred_destroy.borrow_mut().take();
        if let Some(owner) = deferred {
            self.run_destroy(&owner);
        }
        true
    }
}

impl PartialEq for ComponentRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ComponentRef {}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("type", &self.type_name())
            .field("owner", &self.owner().map(|entity| entity.id()))
            .field("enabled", &self.is_enabled())
            .field("visible", &self.is_visible())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component_type;

    trait Health: Component {
        fn current(&self) -> i32;
    }

    #[derive(Default)]
    struct Vitals {
        hp: i32,
    }
    impl Component for Vitals {}
    impl Health for Vitals {
        fn current(&self) -> i32 {
            self.hp
        }
    }
    component_type!(Vitals: dyn Health);

    #[test]
    fn test_new_component_is_free_standing() {
        let component = ComponentRef::new(Vitals { hp: 3 });
        assert!(!component.has_owner());
        assert!(component.owner().is_none());
        assert!(component.is_enabled());
        assert!(component.is_visible());
        assert!(!component.is_initialized());
    }

    #[test]
    fn test_borrow_concrete_and_capability() {
        let component = ComponentRef::new(Vitals { hp: 7 });

        assert_eq!(component.borrow::<Vitals>().map(|v| v.hp), Some(7));
        assert_eq!(component.borrow_as::<dyn Health>().map(|h| h.current()), Some(7));

        component.borrow_mut::<Vitals>().unwrap().hp = 2;
        assert_eq!(component.with(|v: &mut Vitals| v.hp), Some(2));
        assert!(component.is::<dyn Health>());
        assert!(!component.is::<dyn Component>());
    }

    #[test]
    fn test_borrow_wrong_type_is_none() {
        struct Other;
        impl Component for Other {}
        component_type!(Other);

        let component = ComponentRef::new(Other);
        assert!(component.borrow::<Vitals>().is_none());
        assert!(component.borrow_as::<dyn Health>().is_none());
    }

    #[test]
    fn test_identity_equality() {
        let first = ComponentRef::new(Vitals::default());
        let second = ComponentRef::new(Vitals::default());
        assert_eq!(first, first.clone());
        assert_ne!(first, second);
    }
}

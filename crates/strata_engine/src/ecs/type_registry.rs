//! # Component Type Registry
//!
//! A component is reachable on its entity through its concrete type and every
//! abstract capability directly above it. Capabilities are traits; a concrete
//! component declares its ancestry once with [`component_type!`], nearest
//! ancestor first:
//!
//! ```rust
//! use strata_engine::component_type;
//! use strata_engine::ecs::Component;
//!
//! trait Collider: Component {}
//! trait CircleCollider: Collider {}
//!
//! struct Circle;
//! impl Component for Circle {}
//! impl Collider for Circle {}
//! impl CircleCollider for Circle {}
//!
//! // Keys: Circle, dyn CircleCollider, dyn Collider
//! component_type!(Circle: dyn CircleCollider, dyn Collider);
//! ```
//!
//! `dyn Trait` entries are abstract ancestors. Plain type entries are concrete
//! ancestors (a component specializing another concrete component); the walk
//! stops at the first one, so two specializations of the same concrete parent
//! never alias each other through it. The [`Component`] root is never a key.
//!
//! Resolution happens once per concrete type and is cached as a
//! [`ComponentInfo`], so attaching a component is a table lookup.

use super::Component;
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Lookup key for a component type or abstract capability
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`; use `dyn Trait` for a capability
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Underlying type id
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Checked cast from an erased component to a capability trait object
pub struct Caster<I: ?Sized + 'static> {
    cast_ref: fn(&dyn Any) -> Option<&I>,
    cast_mut: fn(&mut dyn Any) -> Option<&mut I>,
}

impl<I: ?Sized + 'static> Caster<I> {
    /// Cast a shared reference
    pub fn cast_ref<'a>(&self, component: &'a dyn Any) -> Option<&'a I> {
        (self.cast_ref)(component)
    }

    /// Cast a mutable reference
    pub fn cast_mut<'a>(&self, component: &'a mut dyn Any) -> Option<&'a mut I> {
        (self.cast_mut)(component)
    }
}

/// Kind of an ancestor entry
enum AncestorKind {
    /// Holds a `Caster<dyn Capability>`
    Abstract(Box<dyn Any>),
    Concrete,
}

/// One entry of a component's declared ancestry
pub struct Ancestor {
    key: TypeKey,
    kind: AncestorKind,
}

impl Ancestor {
    /// Abstract capability `I`, normally written `dyn Trait`
    pub fn interface<I: ?Sized + 'static>(
        cast_ref: fn(&dyn Any) -> Option<&I>,
        cast_mut: fn(&mut dyn Any) -> Option<&mut I>,
    ) -> Self {
        Self {
            key: TypeKey::of::<I>(),
            kind: AncestorKind::Abstract(Box::new(Caster { cast_ref, cast_mut })),
        }
    }

    /// Concrete ancestor `P`
    pub fn concrete<P: ?Sized + 'static>() -> Self {
        Self {
            key: TypeKey::of::<P>(),
            kind: AncestorKind::Concrete,
        }
    }

    /// Key of this ancestor
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Whether this is an abstract capability
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, AncestorKind::Abstract(_))
    }
}

impl fmt::Debug for Ancestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ancestor")
            .field("key", &self.key)
            .field("abstract", &self.is_abstract())
            .finish()
    }
}

/// A concrete component type with declared ancestry
///
/// Implement with [`component_type!`](crate::component_type).
pub trait ComponentType: Component + Sized {
    /// Ancestors, nearest first
    fn lineage() -> Vec<Ancestor> {
        Vec::new()
    }
}

/// Resolved type information for one concrete component type
pub struct ComponentInfo {
    key: TypeKey,
    alias_keys: Vec<TypeKey>,
    casters: HashMap<TypeKey, Box<dyn Any>>,
}

thread_local! {
    static INFO_CACHE: RefCell<HashMap<TypeId, Rc<ComponentInfo>>> = RefCell::new(HashMap::new());
}

impl ComponentInfo {
    /// Cached info for `C`, resolved on first use
    pub fn of<C: ComponentType>() -> Rc<Self> {
        INFO_CACHE.with(|cache| {
            if let Some(info) = cache.borrow().get(&TypeId::of::<C>()) {
                return Rc::clone(info);
            }

            let info = Rc::new(Self::resolve(TypeKey::of::<C>(), C::lineage()));
            log::trace!("Resolved component type {}: {:?}", info.key, info.alias_keys);
            cache.borrow_mut().insert(TypeId::of::<C>(), Rc::clone(&info));
            info
        })
    }

    /// Walk `lineage` from the concrete type toward the root
    ///
    /// The concrete key is always registered. Abstract ancestors are registered
    /// until the first concrete ancestor or the component root, where the walk
    /// stops for good.
    pub fn resolve(key: TypeKey, lineage: Vec<Ancestor>) -> Self {
        let root = TypeKey::of::<dyn Component>();
        let mut alias_keys = vec![key];
        let mut casters = HashMap::new();

        for ancestor in lineage {
            if ancestor.key == root {
                break;
            }
            match ancestor.kind {
                AncestorKind::Concrete => break,
                AncestorKind::Abstract(caster) => {
                    if !alias_keys.contains(&ancestor.key) {
                        alias_keys.push(ancestor.key);
                        casters.insert(ancestor.key, caster);
                    }
                }
            }
        }

        Self {
            key,
            alias_keys,
            casters,
        }
    }

    /// Key of the concrete type
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Concrete key followed by every registered abstract key
    pub fn alias_keys(&self) -> &[TypeKey] {
        &self.alias_keys
    }

    /// Concrete type name
    pub fn type_name(&self) -> &'static str {
        self.key.name()
    }

    /// Cast an erased component of this type to capability `I`
    pub fn cast_ref<'a, I: ?Sized + 'static>(&self, component: &'a dyn Any) -> Option<&'a I> {
        self.caster::<I>()?.cast_ref(component)
    }

    /// Cast an erased component of this type to capability `I`, mutably
    pub fn cast_mut<'a, I: ?Sized + 'static>(
        &self,
        component: &'a mut dyn Any,
    ) -> Option<&'a mut I> {
        self.caster::<I>()?.cast_mut(component)
    }

    fn caster<I: ?Sized + 'static>(&self) -> Option<&Caster<I>> {
        self.casters
            .get(&TypeKey::of::<I>())?
            .downcast_ref::<Caster<I>>()
    }
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("key", &self.key)
            .field("alias_keys", &self.alias_keys)
            .finish()
    }
}

/// Implement [`ComponentType`](crate::ecs::ComponentType) for a concrete component
///
/// `component_type!(Type)` registers only the concrete type.
/// `component_type!(Type: dyn A, dyn B, Parent)` lists ancestors nearest
/// first: `dyn Trait` for abstract capabilities (the type must implement
/// them), plain types for concrete ancestors.
#[macro_export]
macro_rules! component_type {
    (@lineage $component:ty, $out:ident, dyn $capability:path $(, $($rest:tt)+)?) => {
        $out.push({
            fn cast_ref(
                any: &dyn ::std::any::Any,
            ) -> ::std::option::Option<&(dyn $capability + 'static)> {
                let component: &$component = any.downcast_ref::<$component>()?;
                ::std::option::Option::Some(component)
            }
            fn cast_mut(
                any: &mut dyn ::std::any::Any,
            ) -> ::std::option::Option<&mut (dyn $capability + 'static)> {
                let component: &mut $component = any.downcast_mut::<$component>()?;
                ::std::option::Option::Some(component)
            }
            $crate::ecs::Ancestor::interface::<dyn $capability>(cast_ref, cast_mut)
        });
        $($crate::component_type!(@lineage $component, $out, $($rest)+);)?
    };
    (@lineage $component:ty, $out:ident, $parent:ty $(, $($rest:tt)+)?) => {
        $out.push($crate::ecs::Ancestor::concrete::<$parent>());
        $($crate::component_type!(@lineage $component, $out, $($rest)+);)?
    };
    ($component:ty) => {
        impl $crate::ecs::ComponentType for $component {}
    };
    ($component:ty : $($lineage:tt)+) => {
        impl $crate::ecs::ComponentType for $component {
            fn lineage() -> ::std::vec::Vec<$crate::ecs::Ancestor> {
                let mut lineage = ::std::vec::Vec::new();
                $crate::component_type!(@lineage $component, lineage, $($lineage)+);
                lineage
            }
        }
    };
}

//! Entity/component object model
//!
//! Scenes own priority-ordered layers, layers own entities, entities own
//! components. Frame hooks flow down that hierarchy; structural changes made
//! from inside a hook are deferred until the running pass ends, which for
//! [`SceneManager::tick`] is the end of the frame.

pub mod component;
pub mod entity;
pub mod error;
pub mod layer;
pub mod query;
pub mod scene;
pub mod scene_manager;
pub mod type_registry;

#[cfg(test)]
mod tests;

pub use component::{AsAny, Component, ComponentRef};
pub use entity::{Entity, EntityId};
pub use error::{EcsError, EcsResult};
pub use layer::Layer;
pub use query::EntityQuery;
pub use scene::Scene;
pub use scene_manager::{SceneManager, SceneStats};
pub use type_registry::{Ancestor, Caster, ComponentInfo, ComponentType, TypeKey};

//! Errors raised by the entity/layer/scene object model

use thiserror::Error;

/// Result type for object model operations
pub type EcsResult<T> = Result<T, EcsError>;

/// Errors raised synchronously at the call site that violated a contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The component is already attached to an entity
    #[error("Component {component} is already owned by {owner}")]
    AlreadyOwned {
        /// Component type name
        component: String,
        /// Current owner
        owner: String,
    },

    /// One of the component's type keys is already registered on the entity
    #[error("Duplicate type registration: {key} is already registered on {entity}")]
    DuplicateTypeRegistration {
        /// Conflicting type key
        key: String,
        /// Target entity
        entity: String,
    },

    /// A lookup by type, tag or name did not resolve
    #[error("Not found: {what}")]
    NotFound {
        /// What was looked up
        what: String,
    },

    /// A layer or scene with this name already exists in the same scope
    #[error("Duplicate {kind} name: {name}")]
    DuplicateName {
        /// "layer" or "scene"
        kind: &'static str,
        /// Conflicting name
        name: String,
    },

    /// The entity has already been destroyed
    #[error("Entity {entity} has been destroyed")]
    EntityDestroyed {
        /// Destroyed entity
        entity: String,
    },

    /// The layer has already been destroyed
    #[error("Layer {layer} has been destroyed")]
    LayerDestroyed {
        /// Destroyed layer
        layer: String,
    },

    /// The scene has already been destroyed
    #[error("Scene {scene} has been destroyed")]
    SceneDestroyed {
        /// Destroyed scene
        scene: String,
    },
}

impl EcsError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }
}

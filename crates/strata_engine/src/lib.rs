//! # Strata Engine
//!
//! A layered scene runtime: entities composed of polymorphic components,
//! grouped into priority-ordered layers inside named scenes.
//!
//! ## Features
//!
//! - **Capability lookup**: components are reachable by their concrete type
//!   and by every abstract capability trait they declare
//! - **Safe frame loops**: components and entities may be added or removed
//!   from inside any hook; changes apply once the frame has been drawn
//! - **Ordered drawing**: layers draw by priority, entities by depth
//! - **Configurable**: scenes, layers and timing from TOML or RON files
//!
//! ## Quick Start
//!
//! ```rust
//! use strata_engine::prelude::*;
//! use strata_engine::component_type;
//!
//! trait Damageable: Component {
//!     fn hit(&mut self, amount: i32);
//! }
//!
//! struct Health(i32);
//!
//! impl Component for Health {}
//! impl Damageable for Health {
//!     fn hit(&mut self, amount: i32) {
//!         self.0 -= amount;
//!     }
//! }
//! component_type!(Health: dyn Damageable);
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut manager = SceneManager::new();
//!     let scene = manager.create_scene("game")?;
//!     let layer = scene.create_layer("world", 0)?;
//!
//!     let player = Entity::with_name(&layer, "player")?;
//!     player.add_component(Health(10))?;
//!
//!     // Look the component up through its capability
//!     let damageable = player.get::<dyn Damageable>()?;
//!     if let Some(mut target) = damageable.borrow_as_mut::<dyn Damageable>() {
//!         target.hit(3);
//!     }
//!
//!     manager.tick(1.0 / 60.0, &mut RecordingBatch::new());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod config;
pub mod foundation;
pub mod ecs;
pub mod assets;
pub mod render;

mod error;

pub use error::EngineError;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        EngineError,
        assets::{ContentLoader, Texture, TextureCache, TextureHandle},
        core::config::{Config, EngineConfig, LayerConfig, SceneConfig},
        ecs::{
            Component, ComponentRef, ComponentType, EcsError, EcsResult, Entity, EntityQuery,
            Layer, Scene, SceneManager,
        },
        foundation::{
            math::{Color, Rect, Vec2},
            time::{FrameTime, Stopwatch, Timer},
        },
        render::{DrawBatch, DrawCall, LayerPass, RecordingBatch},
    };
}

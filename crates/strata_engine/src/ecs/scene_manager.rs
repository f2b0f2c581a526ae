//! # Scene Manager
//!
//! Owns the named scenes and drives the per-frame tick. The manager is a
//! plain value: whatever runs the main loop owns it and passes it (or the
//! scenes it hands out) to the code that needs it.
//!
//! Each tick runs three sweeps over the scenes in registration order:
//! `update`, then `fixed_update`, then `draw`. Disabled scenes are skipped by
//! the first two, invisible scenes by the last.
//!
//! Structural changes made by any hook during a tick (components attached or
//! detached, entities added, moved or removed, layers created or removed)
//! are queued for the whole frame and applied once `draw` has finished, so
//! newly added members first run on the next tick.

use super::entity::Entity;
use super::error::{EcsError, EcsResult};
use super::layer::Layer;
use super::query::EntityQuery;
use super::scene::Scene;
use crate::core::config::{EngineConfig, SceneConfig};
use crate::foundation::collections::SafeCollection;
use crate::foundation::time::{FrameClock, FrameTime, Stopwatch};
use crate::render::DrawBatch;
use crate::EngineError;
use std::time::Duration;

/// Performance statistics for the frame loop
#[derive(Debug, Clone, Default)]
pub struct SceneStats {
    /// Frames ticked so far
    pub frame_count: u64,

    /// Number of scenes
    pub scene_count: usize,

    /// Entities across all scenes
    pub entity_count: usize,

    /// Time spent in `update` and `fixed_update` (microseconds)
    pub update_time_us: u64,

    /// Time spent in `draw` (microseconds)
    pub draw_time_us: u64,
}

impl SceneStats {
    /// Calculate total frame time in microseconds
    pub fn total_frame_time_us(&self) -> u64 {
        self.update_time_us + self.draw_time_us
    }

    /// Check if the last frame fit in the budget of `target_fps`
    pub fn is_performance_good(&self, target_fps: f32) -> bool {
        if target_fps <= 0.0 {
            return true;
        }
        let budget_us = 1_000_000.0 / target_fps;
        (self.total_frame_time_us() as f32) <= budget_us
    }
}

/// Registry of named scenes and driver of the frame loop
pub struct SceneManager {
    /// Scenes in registration order
    scenes: SafeCollection<Scene>,

    /// Turns measured deltas into frame times
    clock: FrameClock,

    /// Configuration the manager was built from
    config: EngineConfig,

    /// Performance statistics
    stats: SceneStats,
}

impl SceneManager {
    /// Create a scene manager with default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an empty scene manager with custom timing configuration
    ///
    /// Scenes listed in `config` are not created; see
    /// [`SceneManager::from_config`].
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            scenes: SafeCollection::new(),
            clock: FrameClock::new(config.fixed_timestep, config.max_delta),
            config,
            stats: SceneStats::default(),
        }
    }

    /// Validate `config` and create every scene and layer it lists
    pub fn from_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let manager = Self::with_config(config);
        for scene in &manager.config.scenes {
            manager.create_scene_from_config(scene)?;
        }
        log::info!(
            "Scene manager ready with {} scene(s)",
            manager.scenes.len()
        );
        Ok(manager)
    }

    /// Create an empty scene
    pub fn create_scene(&self, name: impl Into<String>) -> EcsResult<Scene> {
        let name = name.into();
        if self.scene(&name).is_some() {
            log::warn!("Scene '{}' already exists", name);
            return Err(EcsError::DuplicateName {
                kind: "scene",
                name,
            });
        }

        let scene = Scene::new(name);
        self.scenes.add(scene.clone());
        Ok(scene)
    }

    /// Create a scene with the flags and layers described by `config`
    pub fn create_scene_from_config(&self, config: &SceneConfig) -> EcsResult<Scene> {
        let scene = self.create_scene(config.name.clone())?;
        scene.set_enabled(config.enabled);
        scene.set_visible(config.visible);
        for layer in &config.layers {
            if layer.gui {
                scene.create_gui_layer(layer.name.clone(), layer.priority)?;
            } else {
                scene.create_layer(layer.name.clone(), layer.priority)?;
            }
        }
        Ok(scene)
    }

    /// Scene with the given name
    pub fn scene(&self, name: &str) -> Option<Scene> {
        self.scenes
            .snapshot()
            .into_iter()
            .find(|scene| scene.name() == name)
    }

    /// Scenes in registration order
    pub fn scenes(&self) -> Vec<Scene> {
        self.scenes.snapshot()
    }

    /// Destroy and unregister the named scene, returning whether it existed
    pub fn remove_scene(&self, name: &str) -> bool {
        let Some(scene) = self.scene(name) else {
            return false;
        };
        self.scenes.remove(&scene);
        scene.destroy();
        true
    }

    /// Run `update` on every enabled scene
    pub fn update(&self, time: &FrameTime) {
        self.scenes.for_each(|scene| scene.update(time));
    }

    /// Run `fixed_update` on every enabled scene
    pub fn fixed_update(&self, time: &FrameTime) {
        self.scenes.for_each(|scene| scene.fixed_update(time));
    }

    /// Draw every visible scene
    pub fn draw(&self, batch: &mut dyn DrawBatch) {
        self.scenes.for_each(|scene| scene.draw(&mut *batch));
    }

    /// Advance one frame by `delta` seconds: update, fixed update, then draw
    ///
    /// Changes queued by hooks apply after the draw sweep.
    pub fn tick(&mut self, delta: f32, batch: &mut dyn DrawBatch) -> FrameTime {
        let time = self.clock.advance(delta);

        let (update_time, draw_time) = {
            let _scenes = self.scenes.begin_pass();
            let _frame = FrameHold::open(&self.scenes.snapshot());

            let mut update_watch = Stopwatch::start_new();
            self.update(&time);
            self.fixed_update(&time);
            update_watch.stop();

            let mut draw_watch = Stopwatch::start_new();
            self.draw(batch);
            draw_watch.stop();

            (update_watch.elapsed(), draw_watch.elapsed())
        };

        self.update_stats(update_time, draw_time);
        time
    }

    /// Update performance statistics
    fn update_stats(&mut self, update_time: Duration, draw_time: Duration) {
        self.stats.frame_count = self.clock.frame_count();
        self.stats.scene_count = self.scenes.len();
        self.stats.entity_count = self.entity_count();
        self.stats.update_time_us = u64::try_from(update_time.as_micros()).unwrap_or(u64::MAX);
        self.stats.draw_time_us = u64::try_from(draw_time.as_micros()).unwrap_or(u64::MAX);
    }

    /// Get current performance statistics
    pub fn stats(&self) -> &SceneStats {
        &self.stats
    }

    /// Get engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get current entity count
    pub fn entity_count(&self) -> usize {
        self.scenes().iter().map(Scene::entity_count).sum()
    }
}

/// Holds every collection that exists when a frame starts in one pass until
/// the frame ends
struct FrameHold {
    scenes: Vec<Scene>,
    layers: Vec<Layer>,
    entities: Vec<Entity>,
}

impl FrameHold {
    fn open(scenes: &[Scene]) -> Self {
        let layers: Vec<Layer> = scenes.iter().flat_map(Scene::layers).collect();
        let entities: Vec<Entity> = layers.iter().flat_map(Layer::entities).collect();

        scenes.iter().for_each(Scene::hold);
        layers.iter().for_each(Layer::hold);
        entities.iter().for_each(Entity::hold);

        Self {
            scenes: scenes.to_vec(),
            layers,
            entities,
        }
    }
}

impl Drop for FrameHold {
    fn drop(&mut self) {
        self.entities.iter().for_each(Entity::release);
        self.layers.iter().for_each(Layer::release);
        self.scenes.iter().for_each(Scene::release);
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SceneManager {
    fn drop(&mut self) {
        for scene in self.scenes.snapshot() {
            scene.destroy();
        }
    }
}

impl EntityQuery for SceneManager {
    fn query_entities(&self) -> Vec<Entity> {
        self.scenes()
            .iter()
            .flat_map(|scene| scene.query_entities())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LayerConfig;
    use crate::render::RecordingBatch;

    #[test]
    fn test_scene_manager_creation() {
        let manager = SceneManager::new();
        assert_eq!(manager.entity_count(), 0);
        assert!(manager.scenes().is_empty());
        assert!(manager.stats().is_performance_good(60.0));
    }

    #[test]
    fn test_duplicate_scene_name_is_rejected() {
        let manager = SceneManager::new();
        manager.create_scene("game").unwrap();
        let error = manager.create_scene("game").unwrap_err();
        assert!(matches!(error, EcsError::DuplicateName { kind: "scene", .. }));
        assert_eq!(manager.scenes().len(), 1);
    }

    #[test]
    fn test_remove_scene_destroys_it() {
        let manager = SceneManager::new();
        let scene = manager.create_scene("menu").unwrap();
        let layer = scene.create_layer("buttons", 0).unwrap();
        let entity = Entity::new(&layer).unwrap();

        assert!(manager.remove_scene("menu"));
        assert!(!manager.remove_scene("menu"));
        assert!(scene.is_destroyed());
        assert!(entity.is_destroyed());
        assert!(manager.scene("menu").is_none());
    }

    #[test]
    fn test_from_config_builds_scenes_and_layers() {
        let config = EngineConfig::new().with_scene(
            crate::core::config::SceneConfig::new("game")
                .with_flags(true, false)
                .with_layer(LayerConfig::new("world", 0))
                .with_layer(LayerConfig::gui("hud", 10)),
        );
        let manager = SceneManager::from_config(config).unwrap();

        let scene = manager.scene("game").unwrap();
        assert!(!scene.is_visible());
        let names: Vec<_> = scene.layers().iter().map(|l| l.name().to_string()).collect();
        assert_eq!(names, vec!["hud", "world"]);
        assert!(scene.layer("hud").unwrap().is_gui());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = EngineConfig::new().with_fixed_timestep(-1.0);
        assert!(SceneManager::from_config(config).is_err());
    }

    #[test]
    fn test_tick_skips_hidden_scenes_and_updates_stats() {
        let mut manager = SceneManager::new();
        let shown = manager.create_scene("shown").unwrap();
        shown.create_layer("main", 0).unwrap();
        let hidden = manager.create_scene("hidden").unwrap();
        hidden.create_layer("main", 0).unwrap();
        hidden.set_visible(false);

        let mut batch = RecordingBatch::new();
        let first = manager.tick(0.016, &mut batch);
        let second = manager.tick(0.016, &mut batch);

        assert_eq!(first.frame, 0);
        assert_eq!(second.frame, 1);
        assert_eq!(batch.passes().len(), 2);
        assert!(batch.passes().iter().all(|recorded| recorded.pass.scene == "shown"));
        assert_eq!(manager.stats().frame_count, 2);
        assert_eq!(manager.stats().scene_count, 2);
    }
}

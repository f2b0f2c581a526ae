//! # Engine Configuration
//!
//! Serializable description of the runtime: logging, frame timing and the
//! scenes (with their layers) to create at startup. Loaded from `.toml` or
//! `.ron` through [`Config`].
//!
//! ```toml
//! log_level = "debug"
//! fixed_timestep = 0.02
//!
//! [[scenes]]
//! name = "game"
//!
//! [[scenes.layers]]
//! name = "world"
//! priority = 0
//!
//! [[scenes.layers]]
//! name = "hud"
//! priority = 100
//! gui = true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use crate::config::{Config, ConfigError};

/// # Layer Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Name, unique within the scene
    pub name: String,
    /// Update/draw priority; higher runs first
    #[serde(default)]
    pub priority: i32,
    /// Drawn in screen space
    #[serde(default)]
    pub gui: bool,
}

impl LayerConfig {
    /// World-space layer
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            gui: false,
        }
    }

    /// Screen-space layer
    pub fn gui(name: impl Into<String>, priority: i32) -> Self {
        Self {
            gui: true,
            ..Self::new(name, priority)
        }
    }
}

/// # Scene Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Scene name, unique across the manager
    pub name: String,
    /// Whether the scene starts enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether the scene starts visible
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Layers to create
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

impl SceneConfig {
    /// Empty, enabled and visible scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            visible: true,
            layers: Vec::new(),
        }
    }

    /// Add a layer
    pub fn with_layer(mut self, layer: LayerConfig) -> Self {
        self.layers.push(layer);
        self
    }

    /// Set the initial enabled/visible flags
    pub fn with_flags(mut self, enabled: bool, visible: bool) -> Self {
        self.enabled = enabled;
        self.visible = visible;
        self
    }

    /// Check for empty or duplicate layer names
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("scene name is empty".to_string()));
        }

        let mut names = HashSet::new();
        for layer in &self.layers {
            if layer.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "scene '{}' has a layer with an empty name",
                    self.name
                )));
            }
            if !names.insert(layer.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "scene '{}' has duplicate layer '{}'",
                    self.name, layer.name
                )));
            }
        }
        Ok(())
    }
}

/// # Engine Configuration
///
/// Core runtime behavior: logging and frame timing, plus startup scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Step passed to `fixed_update`, in seconds
    pub fixed_timestep: f32,
    /// Largest frame delta handed to `update`, in seconds
    pub max_delta: f32,
    /// Scenes created at startup, in registration order
    pub scenes: Vec<SceneConfig>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            fixed_timestep: 1.0 / 60.0,
            max_delta: 0.25,
            scenes: Vec::new(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the fixed timestep
    pub fn with_fixed_timestep(mut self, seconds: f32) -> Self {
        self.fixed_timestep = seconds;
        self
    }

    /// Set the delta clamp
    pub fn with_max_delta(mut self, seconds: f32) -> Self {
        self.max_delta = seconds;
        self
    }

    /// Add a startup scene
    pub fn with_scene(mut self, scene: SceneConfig) -> Self {
        self.scenes.push(scene);
        self
    }

    /// Validate timing values and scene/layer names
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fixed_timestep.is_nan() || self.fixed_timestep <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fixed_timestep must be positive, got {}",
                self.fixed_timestep
            )));
        }
        if self.max_delta.is_nan() || self.max_delta <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_delta must be positive, got {}",
                self.max_delta
            )));
        }

        let mut names = HashSet::new();
        for scene in &self.scenes {
            scene.validate()?;
            if !names.insert(scene.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate scene '{}'",
                    scene.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.log_level, "info");
        assert_relative_eq!(config.fixed_timestep, 1.0 / 60.0);
        assert_relative_eq!(config.max_delta, 0.25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let text = r#"
            log_level = "debug"

            [[scenes]]
            name = "game"

            [[scenes.layers]]
            name = "world"

            [[scenes.layers]]
            name = "hud"
            priority = 100
            gui = true
        "#;

        let config = EngineConfig::from_str_for("engine.toml", text).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_relative_eq!(config.fixed_timestep, 1.0 / 60.0);

        let scene = &config.scenes[0];
        assert!(scene.enabled && scene.visible);
        assert_eq!(scene.layers[0], LayerConfig::new("world", 0));
        assert_eq!(scene.layers[1], LayerConfig::gui("hud", 100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_timestep() {
        let config = EngineConfig::new().with_fixed_timestep(0.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EngineConfig::new().with_max_delta(f32::NAN);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let config = EngineConfig::new()
            .with_scene(SceneConfig::new("a"))
            .with_scene(SceneConfig::new("a"));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let scene = SceneConfig::new("b")
            .with_layer(LayerConfig::new("x", 0))
            .with_layer(LayerConfig::gui("x", 1));
        assert!(matches!(scene.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_ron_round_trip() {
        let config = EngineConfig::new().with_log_level("warn").with_scene(
            SceneConfig::new("menu")
                .with_flags(true, false)
                .with_layer(LayerConfig::gui("buttons", 10)),
        );
        let path = std::env::temp_dir().join("strata_engine_config_test.ron");
        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}

//! Game configuration

use serde::{Deserialize, Serialize};
use strata_engine::core::config::{Config, ConfigError, EngineConfig, LayerConfig, SceneConfig};

/// Name of the gameplay scene
pub const GAME_SCENE: &str = "game";

/// Layer names inside the gameplay scene
pub mod layers {
    /// Star backdrop
    pub const BACKGROUND: &str = "background";
    /// Ship, asteroids and bullets
    pub const FIELD: &str = "field";
    /// Score display
    pub const HUD: &str = "hud";
}

/// Game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Engine and scene setup
    pub engine: EngineConfig,

    /// Gameplay settings
    pub gameplay: GameplayConfig,
}

/// Gameplay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Asteroid count at start
    pub asteroid_count: u32,

    /// Frames to simulate before exiting
    pub frames: u32,

    /// Simulated frame delta (seconds)
    pub frame_delta: f32,

    /// Seed for asteroid placement
    pub seed: u64,

    /// Ship rotation speed (radians per second)
    pub ship_rotation_speed: f32,

    /// Seconds between shots
    pub fire_interval: f32,

    /// Bullet speed
    pub bullet_speed: f32,

    /// Bullet lifetime (seconds)
    pub bullet_lifetime: f32,

    /// Half extents of the play field; positions wrap at the edges
    pub half_width: f32,

    /// Half height of the play field
    pub half_height: f32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            asteroid_count: 6,
            frames: 600,
            frame_delta: 1.0 / 60.0,
            seed: 7,
            ship_rotation_speed: 1.5,
            fire_interval: 0.25,
            bullet_speed: 400.0,
            bullet_lifetime: 1.5,
            half_width: 640.0,
            half_height: 360.0,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let engine = EngineConfig::default().with_scene(
            SceneConfig::new(GAME_SCENE)
                .with_layer(LayerConfig::new(layers::BACKGROUND, -10))
                .with_layer(LayerConfig::new(layers::FIELD, 0))
                .with_layer(LayerConfig::gui(layers::HUD, 100)),
        );
        Self {
            engine,
            gameplay: GameplayConfig::default(),
        }
    }
}

impl Config for GameConfig {}

impl GameConfig {
    /// Load configuration from `path`, or the defaults when no path is given
    pub fn load_or_default(path: Option<&str>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate engine settings and gameplay values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;

        let scene = self
            .engine
            .scenes
            .iter()
            .find(|scene| scene.name == GAME_SCENE)
            .ok_or_else(|| ConfigError::Invalid(format!("missing scene '{GAME_SCENE}'")))?;
        for layer in [layers::BACKGROUND, layers::FIELD, layers::HUD] {
            if !scene.layers.iter().any(|configured| configured.name == layer) {
                return Err(ConfigError::Invalid(format!(
                    "scene '{GAME_SCENE}' is missing layer '{layer}'"
                )));
            }
        }

        let gameplay = &self.gameplay;
        if gameplay.frame_delta <= 0.0 || gameplay.fire_interval <= 0.0 {
            return Err(ConfigError::Invalid(
                "frame_delta and fire_interval must be positive".to_string(),
            ));
        }
        if gameplay.half_width <= 0.0 || gameplay.half_height <= 0.0 {
            return Err(ConfigError::Invalid("play field must have a positive size".to_string()));
        }
        Ok(())
    }
}

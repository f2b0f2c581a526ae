//! Engine-level errors

use crate::assets::AssetError;
use crate::config::ConfigError;
use crate::ecs::EcsError;
use thiserror::Error;

/// Errors surfaced by engine setup and the demo front end
#[derive(Error, Debug)]
pub enum EngineError {
    /// Object model contract violated
    #[error("Scene error: {0}")]
    Scene(#[from] EcsError),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Content could not be loaded
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

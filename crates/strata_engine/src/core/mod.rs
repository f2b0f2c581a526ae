//! # Core Engine Module
//!
//! Configuration shared by the engine subsystems.
//!
//! ## Organization
//!
//! - **Config**: engine, scene and layer configuration

pub mod config;

// Re-export commonly used config types
pub use config::{Config, ConfigError, EngineConfig, LayerConfig, SceneConfig};

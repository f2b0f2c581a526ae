//! Content loading contract
//!
//! The engine core never decodes files itself. A [`ContentLoader`] supplied by
//! the application turns a path into an in-memory [`Texture`] description, and
//! the [`TextureCache`] hands out stable [`TextureHandle`]s that draw calls
//! refer to.

mod texture_cache;

pub use texture_cache::{MemoryLoader, TextureCache};

use crate::foundation::collections::TypedHandle;
use thiserror::Error;

/// Handle to a texture stored in a [`TextureCache`]
pub type TextureHandle = TypedHandle<Texture>;

/// In-memory texture resource as produced by a loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    /// Debug name
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Texture {
    /// Create a texture description
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

/// Produces in-memory resources from content paths
pub trait ContentLoader {
    /// Load the texture stored at `path`
    fn load_texture(&mut self, path: &str) -> Result<Texture, AssetError>;
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to load asset
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

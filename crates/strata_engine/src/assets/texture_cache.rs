//! Texture storage with path memoization

use super::{AssetError, ContentLoader, Texture, TextureHandle};
use crate::foundation::collections::HandleMap;
use std::collections::HashMap;

/// Stores loaded textures and memoizes them by path
#[derive(Debug, Default)]
pub struct TextureCache {
    textures: HandleMap<Texture>,
    by_path: HashMap<String, TextureHandle>,
}

impl TextureCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` through `loader`, reusing the existing handle if already loaded
    pub fn load(
        &mut self,
        loader: &mut dyn ContentLoader,
        path: &str,
    ) -> Result<TextureHandle, AssetError> {
        if let Some(handle) = self.by_path.get(path) {
            return Ok(*handle);
        }

        let texture = loader.load_texture(path)?;
        if texture.width == 0 || texture.height == 0 {
            return Err(AssetError::InvalidData(format!(
                "{path}: texture has zero size ({}x{})",
                texture.width, texture.height
            )));
        }

        log::debug!("Loaded texture '{}' from {path}", texture.name);
        let handle = TextureHandle::new(self.textures.insert(texture));
        self.by_path.insert(path.to_string(), handle);
        Ok(handle)
    }

    /// Look up a loaded texture
    pub fn get(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle.key())
    }

    /// Drop a texture; its handle becomes dangling
    pub fn unload(&mut self, handle: TextureHandle) -> Option<Texture> {
        self.by_path.retain(|_, existing| *existing != handle);
        self.textures.remove(handle.key())
    }

    /// Number of loaded textures
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Whether nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// [`ContentLoader`] serving textures registered in memory
///
/// Used for headless runs and tests where no files exist on disk.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    textures: HashMap<String, Texture>,
    loads: usize,
}

impl MemoryLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture under `path`
    pub fn insert(&mut self, path: impl Into<String>, texture: Texture) {
        self.textures.insert(path.into(), texture);
    }

    /// Number of successful loads served
    pub fn load_count(&self) -> usize {
        self.loads
    }
}

impl ContentLoader for MemoryLoader {
    fn load_texture(&mut self, path: &str) -> Result<Texture, AssetError> {
        let texture = self
            .textures
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))?;
        self.loads += 1;
        Ok(texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_is_memoized_by_path() {
        let mut loader = MemoryLoader::new();
        loader.insert("rock.png", Texture::new("rock", 16, 16));
        let mut cache = TextureCache::new();

        let first = cache.load(&mut loader, "rock.png").unwrap();
        let second = cache.load(&mut loader, "rock.png").unwrap();

        assert_eq!(first, second);
        assert_eq!(loader.load_count(), 1);
        assert_eq!(cache.get(first).map(|t| t.width), Some(16));
    }

    #[test]
    fn test_missing_and_invalid_textures() {
        let mut loader = MemoryLoader::new();
        loader.insert("empty.png", Texture::new("empty", 0, 8));
        let mut cache = TextureCache::new();

        assert!(matches!(
            cache.load(&mut loader, "nope.png"),
            Err(AssetError::NotFound(_))
        ));
        assert!(matches!(
            cache.load(&mut loader, "empty.png"),
            Err(AssetError::InvalidData(_))
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unload_forgets_path() {
        let mut loader = MemoryLoader::new();
        loader.insert("hud.png", Texture::new("hud", 4, 4));
        let mut cache = TextureCache::new();

        let handle = cache.load(&mut loader, "hud.png").unwrap();
        assert!(cache.unload(handle).is_some());
        assert!(cache.get(handle).is_none());

        cache.load(&mut loader, "hud.png").unwrap();
        assert_eq!(loader.load_count(), 2);
        assert_eq!(cache.len(), 1);
    }
}

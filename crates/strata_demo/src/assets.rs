//! Game asset definitions

use strata_engine::assets::{
    AssetError, ContentLoader, MemoryLoader, Texture, TextureCache, TextureHandle,
};

/// Content paths used by the demo
pub mod paths {
    /// Player ship sprite
    pub const SHIP: &str = "textures/ship.png";
    /// Asteroid sprite
    pub const ASTEROID: &str = "textures/asteroid.png";
    /// Bullet sprite
    pub const BULLET: &str = "textures/bullet.png";
    /// Star field backdrop
    pub const STARS: &str = "textures/stars.png";
    /// Digit strip, ten 8x8 glyphs side by side
    pub const FONT: &str = "textures/digits.png";
}

/// Width of one glyph in the digit strip
pub const GLYPH_SIZE: f32 = 8.0;

/// Handles to every texture the demo draws with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSet {
    /// Player ship
    pub ship: TextureHandle,
    /// Asteroids of every size
    pub asteroid: TextureHandle,
    /// Bullets
    pub bullet: TextureHandle,
    /// Backdrop
    pub stars: TextureHandle,
    /// Score digits
    pub font: TextureHandle,
}

impl TextureSet {
    /// Load every demo texture through `loader`
    pub fn load(
        cache: &mut TextureCache,
        loader: &mut dyn ContentLoader,
    ) -> Result<Self, AssetError> {
        Ok(Self {
            ship: cache.load(loader, paths::SHIP)?,
            asteroid: cache.load(loader, paths::ASTEROID)?,
            bullet: cache.load(loader, paths::BULLET)?,
            stars: cache.load(loader, paths::STARS)?,
            font: cache.load(loader, paths::FONT)?,
        })
    }
}

/// In-memory content for headless runs
pub fn builtin_content() -> MemoryLoader {
    let mut loader = MemoryLoader::new();
    loader.insert(paths::SHIP, Texture::new("ship", 32, 32));
    loader.insert(paths::ASTEROID, Texture::new("asteroid", 64, 64));
    loader.insert(paths::BULLET, Texture::new("bullet", 4, 4));
    loader.insert(paths::STARS, Texture::new("stars", 1280, 720));
    loader.insert(paths::FONT, Texture::new("digits", 80, 8));
    loader
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_content_loads() {
        let mut cache = TextureCache::new();
        let mut loader = builtin_content();
        let textures = TextureSet::load(&mut cache, &mut loader).unwrap();

        assert_eq!(cache.len(), 5);
        assert_eq!(cache.get(textures.font).map(|t| t.width), Some(80));
        assert_ne!(textures.ship, textures.bullet);
    }
}

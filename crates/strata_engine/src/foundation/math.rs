//! Math utilities and types
//!
//! Provides the 2D math types used by draw submission.

pub use nalgebra::{Vector2, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// Axis-aligned rectangle, used for texture source regions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Size as a vector
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Whether `point` lies inside the rectangle (edges inclusive)
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x <= self.x + self.width
            && point.y <= self.y + self.height
    }
}

/// Linear RGBA color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    /// Opaque black
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    /// Fully transparent
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// Create a color from components
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Same color with a different alpha
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Components as a vector, for upload to a vertex buffer
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rect_center_and_contains() {
        let rect = Rect::new(10.0, 20.0, 4.0, 8.0);
        let center = rect.center();
        assert_relative_eq!(center.x, 12.0);
        assert_relative_eq!(center.y, 24.0);
        assert!(rect.contains(center));
        assert!(!rect.contains(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn test_color_alpha() {
        let faded = Color::WHITE.with_alpha(0.5);
        assert_relative_eq!(faded.to_vec4().w, 0.5);
        assert_eq!(Color::default(), Color::WHITE);
    }
}

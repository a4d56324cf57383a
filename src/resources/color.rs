//! Authoring-space colors.
//!
//! Settings colors are authored in gamma (sRGB) space. Shaders expect most of
//! them in linear space, so uniforms are produced through [`Color::linear`].

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// An RGBA color in gamma space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const GRAY: Self = Self::new(0.5, 0.5, 0.5, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const CLEAR: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Converts the RGB channels to linear space; alpha is kept as is.
    #[must_use]
    pub fn linear(self) -> Self {
        Self {
            r: gamma_to_linear_space(self.r),
            g: gamma_to_linear_space(self.g),
            b: gamma_to_linear_space(self.b),
            a: self.a,
        }
    }

    #[inline]
    #[must_use]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<Color> for Vec4 {
    fn from(c: Color) -> Self {
        c.to_vec4()
    }
}

/// Converts a single sRGB-encoded value to linear space.
#[must_use]
pub fn gamma_to_linear_space(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

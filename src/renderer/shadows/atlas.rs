//! Shadow Atlas Packing
//!
//! Pure math for laying shadow tiles out in a square atlas and remapping
//! light-space clip coordinates into a tile's texture-space rectangle.
//!
//! # Provided Functions
//!
//! - Split factor from a tile count (1, 2 or 4 tiles per edge)
//! - Tile offset and viewport lookup
//! - Clip-space to atlas-space matrix conversion
//! - Border-adjusted tile bounds for spot and point lights

use glam::{Mat4, Vec2, Vec4};

use crate::renderer::command::Rect;

// ============================================================================
// Tile Layout
// ============================================================================

/// Tiles per atlas edge for `tiles` requested tiles.
///
/// Only three tiers exist: one tile fills the atlas, up to four use a 2×2
/// grid, and everything else a 4×4 grid.
#[inline]
#[must_use]
pub const fn atlas_split(tiles: u32) -> u32 {
    if tiles <= 1 {
        1
    } else if tiles <= 4 {
        2
    } else {
        4
    }
}

/// Grid layout of one shadow atlas for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    pub atlas_size: u32,
    pub split: u32,
    pub tile_size: u32,
}

impl AtlasLayout {
    #[must_use]
    pub const fn new(atlas_size: u32, tiles: u32) -> Self {
        let split = atlas_split(tiles);
        Self {
            atlas_size,
            split,
            tile_size: atlas_size / split,
        }
    }

    /// Fraction of the atlas edge covered by one tile.
    #[inline]
    #[must_use]
    pub fn tile_scale(&self) -> f32 {
        1.0 / self.split as f32
    }

    /// Grid coordinates of tile `index`, row-major.
    #[inline]
    #[must_use]
    pub fn tile_offset(&self, index: u32) -> Vec2 {
        Vec2::new((index % self.split) as f32, (index / self.split) as f32)
    }

    /// Pixel viewport of tile `index`.
    #[must_use]
    pub fn tile_viewport(&self, index: u32) -> Rect {
        let offset = self.tile_offset(index) * self.tile_size as f32;
        let size = self.tile_size as f32;
        Rect::new(offset.x, offset.y, size, size)
    }

    /// Tile bounds shrunk by half a texel, with the normal bias in `w`.
    ///
    /// Shaders clamp sample positions to this rectangle so PCF never reads
    /// from a neighbouring tile.
    #[must_use]
    pub fn other_tile_data(&self, offset: Vec2, bias: f32) -> Vec4 {
        let scale = self.tile_scale();
        let border = 0.5 / self.atlas_size as f32;
        Vec4::new(
            offset.x * scale + border,
            offset.y * scale + border,
            scale - 2.0 * border,
            bias,
        )
    }
}

// ============================================================================
// Atlas Matrix
// ============================================================================

/// Converts a light view-projection matrix so it outputs atlas texture
/// coordinates for the tile at `offset` instead of clip coordinates.
///
/// Clip XY in `[-1, 1]` becomes `[0, 1]` scaled into the tile; depth is
/// remapped to `[0, 1]` after undoing a reversed-Z projection.
#[must_use]
pub fn convert_to_atlas_matrix(m: Mat4, offset: Vec2, scale: f32, reversed_z: bool) -> Mat4 {
    let [r0, r1, mut r2, r3] = [m.row(0), m.row(1), m.row(2), m.row(3)];
    if reversed_z {
        r2 = -r2;
    }

    let row0 = (0.5 * (r0 + r3) + offset.x * r3) * scale;
    let row1 = (0.5 * (r1 + r3) + offset.y * r3) * scale;
    let row2 = 0.5 * (r2 + r3);

    Mat4::from_cols(row0, row1, row2, r3).transpose()
}

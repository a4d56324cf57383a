//! Cascade and filter math shared by the directional and other-light atlases.

use glam::{Mat4, Vec4};

use crate::resources::FilterMode;

/// Scale from a filter footprint to its diagonal, used for normal biasing.
pub const DIAGONAL_FILTER_SCALE: f32 = 1.414_213_6;

/// Shader-ready data for one directional cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cascade {
    /// `xyz` center, `w` squared radius shrunk by the filter footprint.
    pub culling_sphere: Vec4,
    /// `(1 / radius², filter_size · √2, 0, 0)`.
    pub data: Vec4,
}

impl Cascade {
    /// Builds the cascade from the host's culling sphere.
    ///
    /// The sphere shrinks by one filter footprint so samples near the edge
    /// never fall outside the rendered tile.
    #[must_use]
    pub fn from_culling_sphere(sphere: Vec4, tile_size: u32, filter: FilterMode) -> Self {
        let texel_size = 2.0 * sphere.w / tile_size as f32;
        let filter_size = filter_size(texel_size, filter);
        let radius = sphere.w - filter_size;
        let radius_sq = radius * radius;

        Self {
            culling_sphere: sphere.truncate().extend(radius_sq),
            data: Vec4::new(1.0 / radius_sq, filter_size * DIAGONAL_FILTER_SCALE, 0.0, 0.0),
        }
    }
}

#[inline]
#[must_use]
pub fn filter_size(texel_size: f32, filter: FilterMode) -> f32 {
    texel_size * (filter.quality() as f32 + 1.0)
}

/// Fraction of a cascade in which casters are culled when already covered by
/// the previous cascade.
#[inline]
#[must_use]
pub fn cascade_blend_culling_factor(cascade_fade: f32) -> f32 {
    (0.8 - cascade_fade).max(0.0)
}

/// `(1 / max_distance, 1 / distance_fade, 1 / (1 - f²))` with
/// `f = 1 - cascade_fade`.
#[must_use]
pub fn shadow_distance_fade(max_distance: f32, distance_fade: f32, cascade_fade: f32) -> Vec4 {
    let f = 1.0 - cascade_fade;
    Vec4::new(
        1.0 / max_distance,
        1.0 / distance_fade,
        1.0 / (1.0 - f * f),
        0.0,
    )
}

/// World-space texel size at unit distance for a spot light tile.
#[inline]
#[must_use]
pub fn spot_texel_size(tile_size: u32, projection: &Mat4) -> f32 {
    2.0 / (tile_size as f32 * projection.x_axis.x)
}

/// Cube faces always cover 90°, so the texel size only depends on the tile.
#[inline]
#[must_use]
pub fn point_texel_size(tile_size: u32) -> f32 {
    2.0 / tile_size as f32
}

#[inline]
#[must_use]
pub fn other_normal_bias(normal_bias: f32, filter_size: f32) -> f32 {
    normal_bias * filter_size * DIAGONAL_FILTER_SCALE
}

/// Extra field of view, in degrees, that keeps filtered samples of a cube
/// face inside its tile.
#[inline]
#[must_use]
pub fn point_fov_bias(bias: f32, filter_size: f32) -> f32 {
    (1.0 + bias + filter_size).atan().to_degrees() * 2.0 - 90.0
}

/// Negates the Y row of a cube-face view matrix (columns 1..=3), undoing the
/// host's upside-down cube map convention.
#[must_use]
pub fn flip_view_y(mut view: Mat4) -> Mat4 {
    view.y_axis.y = -view.y_axis.y;
    view.z_axis.y = -view.z_axis.y;
    view.w_axis.y = -view.w_axis.y;
    view
}

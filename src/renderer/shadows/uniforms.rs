//! Shadow Uniform Bundle
//!
//! All shadow state the lit shaders read, gathered in fixed-capacity arrays
//! that are reused every frame. [`ShadowUniforms::upload`] writes the bundle
//! to any [`UniformSink`], both as named globals and as one
//! [`GpuShadowBlock`] (`_ShadowBlock`) for hosts that bind a single uniform
//! buffer.

use std::sync::LazyLock;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::renderer::command::UniformSink;
use crate::renderer::property::PropertyId;
use crate::resources::shadow_settings::MAX_CASCADES;
use crate::resources::{CascadeBlendMode, FilterMode, ShadowMaskMode};

pub const MAX_SHADOWED_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_SHADOWED_OTHER_LIGHTS: usize = 16;

const MAX_DIRECTIONAL_TILES: usize = MAX_SHADOWED_DIRECTIONAL_LIGHTS * MAX_CASCADES as usize;
const CASCADE_SLOTS: usize = MAX_CASCADES as usize;

pub const DIRECTIONAL_FILTER_KEYWORDS: [&str; 3] =
    ["_DIRECTIONAL_PCF3", "_DIRECTIONAL_PCF5", "_DIRECTIONAL_PCF7"];
pub const OTHER_FILTER_KEYWORDS: [&str; 3] = ["_OTHER_PCF3", "_OTHER_PCF5", "_OTHER_PCF7"];
pub const CASCADE_BLEND_KEYWORDS: [&str; 2] = ["_CASCADE_BLEND_SOFT", "_CASCADE_BLEND_DITHER"];
pub const SHADOW_MASK_KEYWORDS: [&str; 2] = ["_SHADOW_MASK_ALWAYS", "_SHADOW_MASK_DISTANCE"];

pub(crate) struct ShadowPropertyIds {
    pub directional_atlas: PropertyId,
    pub directional_matrices: PropertyId,
    pub other_atlas: PropertyId,
    pub other_matrices: PropertyId,
    pub other_tiles: PropertyId,
    pub cascade_count: PropertyId,
    pub cascade_culling_spheres: PropertyId,
    pub cascade_data: PropertyId,
    pub atlas_size: PropertyId,
    pub distance_fade: PropertyId,
    pub pancaking: PropertyId,
    pub block: PropertyId,
}

pub(crate) static IDS: LazyLock<ShadowPropertyIds> = LazyLock::new(|| ShadowPropertyIds {
    directional_atlas: PropertyId::new("_DirectionalShadowAtlas"),
    directional_matrices: PropertyId::new("_DirectionalShadowMatrices"),
    other_atlas: PropertyId::new("_OtherShadowAtlas"),
    other_matrices: PropertyId::new("_OtherShadowMatrices"),
    other_tiles: PropertyId::new("_OtherShadowTiles"),
    cascade_count: PropertyId::new("_CascadeCount"),
    cascade_culling_spheres: PropertyId::new("_CascadeCullingSpheres"),
    cascade_data: PropertyId::new("_CascadeData"),
    atlas_size: PropertyId::new("_ShadowAtlasSize"),
    distance_fade: PropertyId::new("_ShadowDistanceFade"),
    pancaking: PropertyId::new("_ShadowPancaking"),
    block: PropertyId::new("_ShadowBlock"),
});

/// Shadow state for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowUniforms {
    pub directional_matrices: [Mat4; MAX_DIRECTIONAL_TILES],
    pub cascade_culling_spheres: [Vec4; CASCADE_SLOTS],
    pub cascade_data: [Vec4; CASCADE_SLOTS],
    pub other_matrices: [Mat4; MAX_SHADOWED_OTHER_LIGHTS],
    pub other_tiles: [Vec4; MAX_SHADOWED_OTHER_LIGHTS],
    /// `0` when no directional light casts shadows this frame.
    pub cascade_count: i32,
    pub distance_fade: Vec4,
    /// `(directional size, 1 / directional size, other size, 1 / other size)`.
    pub atlas_sizes: Vec4,
    /// Which shadow-mask variant to enable; `None` when no light uses one.
    pub shadow_mask: Option<ShadowMaskMode>,
    pub directional_filter: FilterMode,
    pub other_filter: FilterMode,
    pub cascade_blend: CascadeBlendMode,
    /// The directional atlas was rendered; its arrays are meaningful.
    pub has_directional: bool,
    /// The other atlas was rendered; its arrays are meaningful.
    pub has_other: bool,
}

impl Default for ShadowUniforms {
    fn default() -> Self {
        Self {
            directional_matrices: [Mat4::IDENTITY; MAX_DIRECTIONAL_TILES],
            cascade_culling_spheres: [Vec4::ZERO; CASCADE_SLOTS],
            cascade_data: [Vec4::ZERO; CASCADE_SLOTS],
            other_matrices: [Mat4::IDENTITY; MAX_SHADOWED_OTHER_LIGHTS],
            other_tiles: [Vec4::ZERO; MAX_SHADOWED_OTHER_LIGHTS],
            cascade_count: 0,
            distance_fade: Vec4::ZERO,
            atlas_sizes: Vec4::ZERO,
            shadow_mask: None,
            directional_filter: FilterMode::default(),
            other_filter: FilterMode::default(),
            cascade_blend: CascadeBlendMode::default(),
            has_directional: false,
            has_other: false,
        }
    }
}

impl ShadowUniforms {
    /// Keyword index of the active shadow-mask variant.
    #[must_use]
    pub fn shadow_mask_keyword(&self) -> Option<usize> {
        self.shadow_mask.map(|mode| match mode {
            ShadowMaskMode::Shadowmask => 0,
            ShadowMaskMode::DistanceShadowmask => 1,
        })
    }

    /// Writes the per-atlas arrays of the atlases rendered this frame, the
    /// filter keywords, and the frame-wide values.
    pub fn upload(&self, sink: &mut impl UniformSink) {
        let ids = &*IDS;

        if self.has_directional {
            sink.set_vector_array(ids.cascade_culling_spheres, &self.cascade_culling_spheres);
            sink.set_vector_array(ids.cascade_data, &self.cascade_data);
            sink.set_matrix_array(ids.directional_matrices, &self.directional_matrices);
            sink.set_keyword_group(
                &DIRECTIONAL_FILTER_KEYWORDS,
                self.directional_filter.keyword_index(),
            );
            sink.set_keyword_group(&CASCADE_BLEND_KEYWORDS, self.cascade_blend.keyword_index());
        }

        if self.has_other {
            sink.set_matrix_array(ids.other_matrices, &self.other_matrices);
            sink.set_vector_array(ids.other_tiles, &self.other_tiles);
            sink.set_keyword_group(&OTHER_FILTER_KEYWORDS, self.other_filter.keyword_index());
        }

        sink.set_keyword_group(&SHADOW_MASK_KEYWORDS, self.shadow_mask_keyword());
        sink.set_int(ids.cascade_count, self.cascade_count);
        sink.set_vector(ids.distance_fade, self.distance_fade);
        sink.set_vector(ids.atlas_size, self.atlas_sizes);
        sink.set_constant_buffer(ids.block, bytemuck::bytes_of(&self.gpu_block()));
    }

    #[must_use]
    pub fn gpu_block(&self) -> GpuShadowBlock {
        GpuShadowBlock {
            directional_matrices: self.directional_matrices,
            other_matrices: self.other_matrices,
            other_tiles: self.other_tiles,
            cascade_culling_spheres: self.cascade_culling_spheres,
            cascade_data: self.cascade_data,
            distance_fade: self.distance_fade,
            atlas_sizes: self.atlas_sizes,
            cascade_count: self.cascade_count,
            _padding: [0; 3],
        }
    }
}

/// Uniform-buffer layout of [`ShadowUniforms`], std140 compatible.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuShadowBlock {
    pub directional_matrices: [Mat4; MAX_DIRECTIONAL_TILES],
    pub other_matrices: [Mat4; MAX_SHADOWED_OTHER_LIGHTS],
    pub other_tiles: [Vec4; MAX_SHADOWED_OTHER_LIGHTS],
    pub cascade_culling_spheres: [Vec4; CASCADE_SLOTS],
    pub cascade_data: [Vec4; CASCADE_SLOTS],
    pub distance_fade: Vec4,
    pub atlas_sizes: Vec4,
    pub cascade_count: i32,
    pub _padding: [i32; 3],
}

//! Shadow Atlas Coordinator
//!
//! [`Shadows`] owns the per-frame shadow budget. Lights reserve atlas space
//! while the light tables are built, then [`Shadows::render`] draws every
//! reserved tile and uploads the shadow uniforms in one go.
//!
//! # Budget
//!
//! | Atlas | Capacity | Tiles per light |
//! |-------|----------|-----------------|
//! | Directional | 4 lights | one per cascade |
//! | Other | 16 tiles | 1 (spot), 6 (point) |
//!
//! A light that does not fit gets a negative strength in its [`ShadowData`]
//! so shaders fall back to baked shadows. Requests are never partially
//! allocated.

pub mod atlas;
pub mod cascade;
pub mod uniforms;

use glam::{Mat4, Vec4};

use crate::renderer::command::{CommandBuffer, UniformSink};
use crate::renderer::context::{
    CubemapFace, CullingResults, DirectionalShadowQuery, RenderContext, ShadowDrawingSettings,
    ShadowProjection,
};
use crate::renderer::property::PropertyId;
use crate::renderer::transient_pool::RenderTextureDesc;
use crate::resources::shadow_settings::MAX_CASCADES;
use crate::resources::{Color, ShadowSettings};
use crate::scene::{Light, LightType};

use atlas::{AtlasLayout, convert_to_atlas_matrix};
use cascade::{
    Cascade, cascade_blend_culling_factor, filter_size, flip_view_y, other_normal_bias,
    point_fov_bias, point_texel_size, shadow_distance_fade, spot_texel_size,
};
use uniforms::{IDS, MAX_SHADOWED_DIRECTIONAL_LIGHTS, MAX_SHADOWED_OTHER_LIGHTS, ShadowUniforms};

pub use uniforms::GpuShadowBlock;

const BUFFER_NAME: &str = "Shadows";

/// Tiles consumed by a point light: one per cube face.
const POINT_LIGHT_TILES: usize = 6;

// ============================================================================
// Shadow Data
// ============================================================================

/// Per-light shadow datum handed to the light tables.
///
/// | Component | Directional | Other |
/// |-----------|-------------|-------|
/// | `x` | strength (negative: not rendered) | same |
/// | `y` | first tile (`cascade_count × slot`) | first tile |
/// | `z` | normal bias | `1` for point lights |
/// | `w` | shadow-mask channel or `-1` | same |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowData(pub Vec4);

impl ShadowData {
    /// The light casts no shadows at all.
    pub const DISABLED: Self = Self(Vec4::new(0.0, 0.0, 0.0, -1.0));

    #[inline]
    #[must_use]
    pub fn strength(&self) -> f32 {
        self.0.x
    }

    #[inline]
    #[must_use]
    pub fn tile_index(&self) -> f32 {
        self.0.y
    }

    /// Normal bias for directional lights, point flag for other lights.
    #[inline]
    #[must_use]
    pub fn extra(&self) -> f32 {
        self.0.z
    }

    #[inline]
    #[must_use]
    pub fn mask_channel(&self) -> f32 {
        self.0.w
    }

    /// A tile was reserved and will be rendered this frame.
    #[inline]
    #[must_use]
    pub fn has_realtime_shadows(&self) -> bool {
        self.strength() > 0.0
    }
}

impl From<ShadowData> for Vec4 {
    fn from(data: ShadowData) -> Self {
        data.0
    }
}

/// A directional light that won a slot this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadowedDirectionalLight {
    pub visible_light_index: usize,
    pub slope_scale_bias: f32,
    pub near_plane_offset: f32,
}

/// A spot or point light that won atlas tiles this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadowedOtherLight {
    pub visible_light_index: usize,
    pub slope_scale_bias: f32,
    pub normal_bias: f32,
    pub is_point: bool,
}

// ============================================================================
// Coordinator
// ============================================================================

pub struct Shadows {
    buffer: CommandBuffer,
    settings: ShadowSettings,
    directional: [ShadowedDirectionalLight; MAX_SHADOWED_DIRECTIONAL_LIGHTS],
    directional_count: usize,
    /// Indexed by first tile; point lights leave the following five unused.
    other: [ShadowedOtherLight; MAX_SHADOWED_OTHER_LIGHTS],
    other_count: usize,
    use_shadow_mask: bool,
    uniforms: ShadowUniforms,
}

impl Default for Shadows {
    fn default() -> Self {
        Self::new()
    }
}

impl Shadows {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: CommandBuffer::new(BUFFER_NAME),
            settings: ShadowSettings::default(),
            directional: [ShadowedDirectionalLight::default(); MAX_SHADOWED_DIRECTIONAL_LIGHTS],
            directional_count: 0,
            other: [ShadowedOtherLight::default(); MAX_SHADOWED_OTHER_LIGHTS],
            other_count: 0,
            use_shadow_mask: false,
            uniforms: ShadowUniforms::default(),
        }
    }

    /// Starts a new frame: empties the budget and snapshots `settings`.
    ///
    /// A cascade count outside `1..=MAX_CASCADES` is clamped into range.
    pub fn setup(&mut self, settings: &ShadowSettings) {
        self.settings.clone_from(settings);
        let cascades = self.settings.directional.cascade_count;
        if !(1..=MAX_CASCADES).contains(&cascades) {
            log::warn!("Cascade count {cascades} outside 1..={MAX_CASCADES}, clamping");
            self.settings.directional.cascade_count = cascades.clamp(1, MAX_CASCADES);
        }
        self.directional_count = 0;
        self.other_count = 0;
        self.use_shadow_mask = false;
        self.uniforms.atlas_sizes = Vec4::ZERO;
        self.uniforms.has_directional = false;
        self.uniforms.has_other = false;
    }

    #[inline]
    #[must_use]
    pub fn directional_count(&self) -> usize {
        self.directional_count
    }

    /// Tiles reserved in the other atlas.
    #[inline]
    #[must_use]
    pub fn other_count(&self) -> usize {
        self.other_count
    }

    #[inline]
    #[must_use]
    pub fn use_shadow_mask(&self) -> bool {
        self.use_shadow_mask
    }

    #[must_use]
    pub fn directional_requests(&self) -> &[ShadowedDirectionalLight] {
        &self.directional[..self.directional_count]
    }

    #[must_use]
    pub fn uniforms(&self) -> &ShadowUniforms {
        &self.uniforms
    }

    #[must_use]
    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    /// Mask channel of a light baked into the shadow mask, or `-1`.
    fn shadow_mask_channel(&mut self, light: &Light) -> f32 {
        match light.baking.shadow_mask_channel() {
            Some(channel) => {
                self.use_shadow_mask = true;
                channel as f32
            }
            None => -1.0,
        }
    }

    // ------------------------------------------------------------------------
    // Reservation
    // ------------------------------------------------------------------------

    pub fn reserve_directional_shadows(
        &mut self,
        light: &Light,
        visible_light_index: usize,
        culling: &impl CullingResults,
    ) -> ShadowData {
        if self.directional_count < MAX_SHADOWED_DIRECTIONAL_LIGHTS && light.wants_shadows() {
            let mask_channel = self.shadow_mask_channel(light);

            if culling.shadow_caster_bounds(visible_light_index).is_none() {
                return ShadowData(Vec4::new(-light.shadow_strength, 0.0, 0.0, mask_channel));
            }

            let slot = self.directional_count;
            self.directional[slot] = ShadowedDirectionalLight {
                visible_light_index,
                slope_scale_bias: light.shadow_bias,
                near_plane_offset: light.shadow_near_plane,
            };
            self.directional_count += 1;

            let first_tile = self.settings.directional.cascade_count as usize * slot;
            return ShadowData(Vec4::new(
                light.shadow_strength,
                first_tile as f32,
                light.shadow_normal_bias,
                mask_channel,
            ));
        }
        ShadowData(Vec4::new(-light.shadow_strength, 0.0, 0.0, -1.0))
    }

    pub fn reserve_other_shadows(
        &mut self,
        light: &Light,
        visible_light_index: usize,
        culling: &impl CullingResults,
    ) -> ShadowData {
        if !light.wants_shadows() {
            return ShadowData::DISABLED;
        }
        let mask_channel = self.shadow_mask_channel(light);

        let is_point = light.light_type == LightType::Point;
        let tiles = if is_point { POINT_LIGHT_TILES } else { 1 };
        let new_count = self.other_count + tiles;
        if new_count >= MAX_SHADOWED_OTHER_LIGHTS
            || culling.shadow_caster_bounds(visible_light_index).is_none()
        {
            return ShadowData(Vec4::new(-light.shadow_strength, 0.0, 0.0, mask_channel));
        }

        self.other[self.other_count] = ShadowedOtherLight {
            visible_light_index,
            slope_scale_bias: light.shadow_bias,
            normal_bias: light.shadow_normal_bias,
            is_point,
        };
        let data = ShadowData(Vec4::new(
            light.shadow_strength,
            self.other_count as f32,
            if is_point { 1.0 } else { 0.0 },
            mask_channel,
        ));
        self.other_count = new_count;
        data
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Renders both atlases and uploads the shadow uniforms.
    ///
    /// Without shadowed directional lights a 1×1 placeholder atlas is bound;
    /// without other shadows the directional atlas is bound in the other slot
    /// as well.
    pub fn render<C: RenderContext>(&mut self, ctx: &mut C, culling: &C::Culling) {
        if self.directional_count > 0 {
            self.render_directional_shadows(ctx, culling);
        } else {
            self.buffer
                .get_temporary_rt(IDS.directional_atlas, RenderTextureDesc::shadow_map(1));
        }

        if self.other_count > 0 {
            self.render_other_shadows(ctx, culling);
        } else {
            self.buffer.set_global_texture(IDS.other_atlas, IDS.directional_atlas);
        }

        self.buffer.begin_sample(BUFFER_NAME);
        self.uniforms.shadow_mask = self
            .use_shadow_mask
            .then_some(self.settings.shadow_mask_mode);
        self.uniforms.cascade_count = if self.directional_count > 0 {
            self.settings.directional.cascade_count as i32
        } else {
            0
        };
        self.uniforms.distance_fade = shadow_distance_fade(
            self.settings.max_distance,
            self.settings.distance_fade,
            self.settings.directional.cascade_fade,
        );
        self.uniforms.upload(&mut self.buffer);
        self.buffer.end_sample(BUFFER_NAME);
        self.buffer.execute(ctx);
    }

    /// Acquires and clears an atlas, then flushes the setup commands.
    fn begin_atlas<C: RenderContext>(
        &mut self,
        ctx: &mut C,
        atlas: PropertyId,
        size: u32,
        pancaking: f32,
    ) {
        self.buffer.get_temporary_rt(atlas, RenderTextureDesc::shadow_map(size));
        self.buffer.set_render_target(atlas);
        self.buffer.clear_render_target(true, false, Color::CLEAR);
        self.buffer.set_float(IDS.pancaking, pancaking);
        self.buffer.begin_sample(BUFFER_NAME);
        self.buffer.execute(ctx);
    }

    fn render_directional_shadows<C: RenderContext>(&mut self, ctx: &mut C, culling: &C::Culling) {
        let atlas_size = self.settings.directional.atlas_size.texels();
        self.uniforms.atlas_sizes.x = atlas_size as f32;
        self.uniforms.atlas_sizes.y = 1.0 / atlas_size as f32;
        self.begin_atlas(ctx, IDS.directional_atlas, atlas_size, 1.0);

        let tiles = self.directional_count as u32 * self.settings.directional.cascade_count;
        let layout = AtlasLayout::new(atlas_size, tiles);
        for index in 0..self.directional_count {
            self.render_directional_light(ctx, culling, index, &layout);
        }

        self.uniforms.has_directional = true;
        self.uniforms.directional_filter = self.settings.directional.filter;
        self.uniforms.cascade_blend = self.settings.directional.cascade_blend;
        self.buffer.end_sample(BUFFER_NAME);
        self.buffer.execute(ctx);
    }

    fn render_directional_light<C: RenderContext>(
        &mut self,
        ctx: &mut C,
        culling: &C::Culling,
        index: usize,
        layout: &AtlasLayout,
    ) {
        let light = self.directional[index];
        let dir = &self.settings.directional;
        let cascade_count = dir.cascade_count;
        let filter = dir.filter;
        let ratios = dir.cascade_ratios();
        let culling_factor = cascade_blend_culling_factor(dir.cascade_fade);
        let tile_offset = index as u32 * cascade_count;

        let mut draw =
            ShadowDrawingSettings::new(light.visible_light_index, ShadowProjection::Orthographic);

        for cascade_index in 0..cascade_count {
            let mut slice = culling.compute_directional_shadow_matrices(&DirectionalShadowQuery {
                visible_light_index: light.visible_light_index,
                cascade_index,
                cascade_count,
                ratios,
                tile_size: layout.tile_size,
                near_plane_offset: light.near_plane_offset,
            });
            slice.split.shadow_cascade_blend_culling_factor = culling_factor;
            draw.split = slice.split;

            // Every light shares the same cascade spheres; the first one sets them.
            if index == 0 {
                let cascade =
                    Cascade::from_culling_sphere(slice.split.culling_sphere, layout.tile_size, filter);
                self.uniforms.cascade_culling_spheres[cascade_index as usize] = cascade.culling_sphere;
                self.uniforms.cascade_data[cascade_index as usize] = cascade.data;
            }

            let tile_index = tile_offset + cascade_index;
            self.uniforms.directional_matrices[tile_index as usize] =
                self.atlas_matrix(ctx, layout, tile_index, slice.projection * slice.view);
            self.draw_tile(ctx, culling, &draw, slice.view, slice.projection, light.slope_scale_bias);
        }
    }

    fn render_other_shadows<C: RenderContext>(&mut self, ctx: &mut C, culling: &C::Culling) {
        let atlas_size = self.settings.other.atlas_size.texels();
        self.uniforms.atlas_sizes.z = atlas_size as f32;
        self.uniforms.atlas_sizes.w = 1.0 / atlas_size as f32;
        self.begin_atlas(ctx, IDS.other_atlas, atlas_size, 0.0);

        let layout = AtlasLayout::new(atlas_size, self.other_count as u32);
        let mut index = 0;
        while index < self.other_count {
            if self.other[index].is_point {
                self.render_point_shadows(ctx, culling, index, &layout);
                index += POINT_LIGHT_TILES;
            } else {
                self.render_spot_shadows(ctx, culling, index, &layout);
                index += 1;
            }
        }

        self.uniforms.has_other = true;
        self.uniforms.other_filter = self.settings.other.filter;
        self.buffer.end_sample(BUFFER_NAME);
        self.buffer.execute(ctx);
    }

    fn render_spot_shadows<C: RenderContext>(
        &mut self,
        ctx: &mut C,
        culling: &C::Culling,
        index: usize,
        layout: &AtlasLayout,
    ) {
        let light = self.other[index];
        let slice = culling.compute_spot_shadow_matrices(light.visible_light_index);
        let mut draw =
            ShadowDrawingSettings::new(light.visible_light_index, ShadowProjection::Perspective);
        draw.split = slice.split;

        let texel_size = spot_texel_size(layout.tile_size, &slice.projection);
        let filter_size = filter_size(texel_size, self.settings.other.filter);
        let bias = other_normal_bias(light.normal_bias, filter_size);

        let tile_index = index as u32;
        self.uniforms.other_tiles[index] =
            layout.other_tile_data(layout.tile_offset(tile_index), bias);
        self.uniforms.other_matrices[index] =
            self.atlas_matrix(ctx, layout, tile_index, slice.projection * slice.view);
        self.draw_tile(ctx, culling, &draw, slice.view, slice.projection, light.slope_scale_bias);
    }

    fn render_point_shadows<C: RenderContext>(
        &mut self,
        ctx: &mut C,
        culling: &C::Culling,
        index: usize,
        layout: &AtlasLayout,
    ) {
        let light = self.other[index];
        let mut draw =
            ShadowDrawingSettings::new(light.visible_light_index, ShadowProjection::Perspective);

        let texel_size = point_texel_size(layout.tile_size);
        let filter_size = filter_size(texel_size, self.settings.other.filter);
        let bias = other_normal_bias(light.normal_bias, filter_size);
        let fov_bias = point_fov_bias(bias, filter_size);

        for (face_index, face) in CubemapFace::ALL.into_iter().enumerate() {
            let slice =
                culling.compute_point_shadow_matrices(light.visible_light_index, face, fov_bias);
            let view = flip_view_y(slice.view);
            draw.split = slice.split;

            let tile = index + face_index;
            let tile_index = tile as u32;
            self.uniforms.other_tiles[tile] =
                layout.other_tile_data(layout.tile_offset(tile_index), bias);
            self.uniforms.other_matrices[tile] =
                self.atlas_matrix(ctx, layout, tile_index, slice.projection * view);
            self.draw_tile(ctx, culling, &draw, view, slice.projection, light.slope_scale_bias);
        }
    }

    /// Binds the tile viewport and returns the world-to-atlas matrix.
    fn atlas_matrix<C: RenderContext>(
        &mut self,
        ctx: &C,
        layout: &AtlasLayout,
        tile_index: u32,
        view_projection: Mat4,
    ) -> Mat4 {
        self.buffer.set_viewport(layout.tile_viewport(tile_index));
        log::trace!("Shadow tile {tile_index} of {}x{} grid", layout.split, layout.split);
        convert_to_atlas_matrix(
            view_projection,
            layout.tile_offset(tile_index),
            layout.tile_scale(),
            ctx.uses_reversed_z_buffer(),
        )
    }

    fn draw_tile<C: RenderContext>(
        &mut self,
        ctx: &mut C,
        culling: &C::Culling,
        draw: &ShadowDrawingSettings,
        view: Mat4,
        projection: Mat4,
        slope_scale_bias: f32,
    ) {
        self.buffer.set_view_projection(view, projection);
        self.buffer.set_global_depth_bias(0.0, slope_scale_bias);
        self.buffer.execute(ctx);
        ctx.draw_shadows(culling, draw);
        self.buffer.set_global_depth_bias(0.0, 0.0);
    }

    /// Releases the atlases acquired by [`render`](Self::render).
    pub fn cleanup<C: RenderContext + ?Sized>(&mut self, ctx: &mut C) {
        self.buffer.release_temporary_rt(IDS.directional_atlas);
        if self.other_count > 0 {
            self.buffer.release_temporary_rt(IDS.other_atlas);
        }
        self.buffer.execute(ctx);
        self.buffer.targets().check_balanced(BUFFER_NAME);
    }
}

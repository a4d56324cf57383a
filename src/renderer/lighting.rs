//! Light Tables
//!
//! Converts the visible lights of one camera into the fixed-size arrays the
//! lit shaders index, reserving shadow atlas space for each light on the way.
//!
//! Directional lights fill up to [`MAX_DIRECTIONAL_LIGHTS`] slots; point and
//! spot lights share up to [`MAX_OTHER_LIGHTS`] slots. Lights beyond either
//! limit are skipped and, with lights-per-object enabled, marked `-1` in the
//! host's light index map.

use std::sync::LazyLock;

use glam::Vec4;

use crate::renderer::command::{CommandBuffer, UniformSink};
use crate::renderer::context::{CullingResults, RenderContext};
use crate::renderer::property::PropertyId;
use crate::renderer::shadows::Shadows;
use crate::resources::ShadowSettings;
use crate::scene::{LightType, VisibleLight};

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_OTHER_LIGHTS: usize = 64;

pub const LIGHTS_PER_OBJECT_KEYWORD: &str = "_LIGHTS_PER_OBJECT";

const BUFFER_NAME: &str = "Lighting";

struct LightPropertyIds {
    directional_count: PropertyId,
    directional_colors: PropertyId,
    directional_directions: PropertyId,
    directional_shadow_data: PropertyId,
    other_count: PropertyId,
    other_colors: PropertyId,
    other_positions: PropertyId,
    other_directions: PropertyId,
    other_spot_angles: PropertyId,
    other_shadow_data: PropertyId,
}

static IDS: LazyLock<LightPropertyIds> = LazyLock::new(|| LightPropertyIds {
    directional_count: PropertyId::new("_DirectionalLightCount"),
    directional_colors: PropertyId::new("_DirectionalLightColors"),
    directional_directions: PropertyId::new("_DirectionalLightDirections"),
    directional_shadow_data: PropertyId::new("_DirectionalLightShadowData"),
    other_count: PropertyId::new("_OtherLightCount"),
    other_colors: PropertyId::new("_OtherLightColors"),
    other_positions: PropertyId::new("_OtherLightPositions"),
    other_directions: PropertyId::new("_OtherLightDirections"),
    other_spot_angles: PropertyId::new("_OtherLightSpotAngles"),
    other_shadow_data: PropertyId::new("_OtherLightShadowData"),
});

// ============================================================================
// Light Uniforms
// ============================================================================

/// Light arrays for one camera. Slots past the counts hold stale data from
/// earlier frames and are never read by shaders.
#[derive(Debug, Clone, PartialEq)]
pub struct LightUniforms {
    pub directional_count: usize,
    pub directional_colors: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    pub directional_directions: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    pub directional_shadow_data: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    pub other_count: usize,
    pub other_colors: [Vec4; MAX_OTHER_LIGHTS],
    /// `xyz` world position, `w` = `1 / range²`.
    pub other_positions: [Vec4; MAX_OTHER_LIGHTS],
    pub other_directions: [Vec4; MAX_OTHER_LIGHTS],
    pub other_spot_angles: [Vec4; MAX_OTHER_LIGHTS],
    pub other_shadow_data: [Vec4; MAX_OTHER_LIGHTS],
    pub lights_per_object: bool,
}

impl Default for LightUniforms {
    fn default() -> Self {
        Self {
            directional_count: 0,
            directional_colors: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            directional_directions: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            directional_shadow_data: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            other_count: 0,
            other_colors: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            other_positions: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            other_directions: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            other_spot_angles: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            other_shadow_data: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            lights_per_object: false,
        }
    }
}

impl LightUniforms {
    /// Counts are always written; arrays only when non-empty.
    pub fn upload(&self, sink: &mut impl UniformSink) {
        let ids = &*IDS;
        sink.set_keyword(LIGHTS_PER_OBJECT_KEYWORD, self.lights_per_object);

        sink.set_int(ids.directional_count, self.directional_count as i32);
        if self.directional_count > 0 {
            sink.set_vector_array(ids.directional_colors, &self.directional_colors);
            sink.set_vector_array(ids.directional_directions, &self.directional_directions);
            sink.set_vector_array(ids.directional_shadow_data, &self.directional_shadow_data);
        }

        sink.set_int(ids.other_count, self.other_count as i32);
        if self.other_count > 0 {
            sink.set_vector_array(ids.other_colors, &self.other_colors);
            sink.set_vector_array(ids.other_positions, &self.other_positions);
            sink.set_vector_array(ids.other_directions, &self.other_directions);
            sink.set_vector_array(ids.other_spot_angles, &self.other_spot_angles);
            sink.set_vector_array(ids.other_shadow_data, &self.other_shadow_data);
        }
    }
}

/// Position with the inverse squared range packed into `w`.
#[must_use]
pub fn light_position(visible: &VisibleLight) -> Vec4 {
    let range_sq = visible.range * visible.range;
    visible
        .position()
        .truncate()
        .extend(1.0 / range_sq.max(0.00001))
}

/// Spot cone falloff factors `(1 / (cos_inner - cos_outer), -cos_outer · that)`.
///
/// Angles are full cone angles in degrees.
#[must_use]
pub fn spot_angles(inner_angle: f32, outer_angle: f32) -> Vec4 {
    let inner_cos = (0.5 * inner_angle).to_radians().cos();
    let outer_cos = (0.5 * outer_angle).to_radians().cos();
    let angle_range_inv = 1.0 / (inner_cos - outer_cos).max(0.001);
    Vec4::new(angle_range_inv, -outer_cos * angle_range_inv, 0.0, 0.0)
}

// ============================================================================
// Lighting
// ============================================================================

pub struct Lighting {
    buffer: CommandBuffer,
    shadows: Shadows,
    uniforms: LightUniforms,
}

impl Default for Lighting {
    fn default() -> Self {
        Self::new()
    }
}

impl Lighting {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: CommandBuffer::new(BUFFER_NAME),
            shadows: Shadows::new(),
            uniforms: LightUniforms::default(),
        }
    }

    #[must_use]
    pub fn shadows(&self) -> &Shadows {
        &self.shadows
    }

    #[must_use]
    pub fn uniforms(&self) -> &LightUniforms {
        &self.uniforms
    }

    /// Builds the light tables, reserves and renders shadows, and uploads
    /// everything.
    pub fn setup<C: RenderContext>(
        &mut self,
        ctx: &mut C,
        culling: &mut C::Culling,
        shadow_settings: &ShadowSettings,
        use_lights_per_object: bool,
    ) {
        self.buffer.begin_sample(BUFFER_NAME);
        self.shadows.setup(shadow_settings);
        self.setup_lights(culling, use_lights_per_object);
        self.shadows.render(ctx, culling);
        self.buffer.end_sample(BUFFER_NAME);
        self.buffer.execute(ctx);
    }

    fn setup_lights(&mut self, culling: &mut impl CullingResults, use_lights_per_object: bool) {
        let mut index_map = if use_lights_per_object {
            culling.light_index_map()
        } else {
            Vec::new()
        };

        let mut directional_count = 0;
        let mut other_count = 0;
        let visible_count = culling.visible_lights().len();

        for index in 0..visible_count {
            let visible = &culling.visible_lights()[index];
            let mut new_index = -1;
            match visible.light_type() {
                LightType::Directional if directional_count < MAX_DIRECTIONAL_LIGHTS => {
                    self.setup_directional_light(directional_count, index, visible, &*culling);
                    directional_count += 1;
                }
                LightType::Point | LightType::Spot if other_count < MAX_OTHER_LIGHTS => {
                    new_index = other_count as i32;
                    self.setup_other_light(other_count, index, visible, &*culling);
                    other_count += 1;
                }
                _ => {}
            }
            if let Some(slot) = index_map.get_mut(index) {
                *slot = new_index;
            }
        }

        if use_lights_per_object {
            // The host map may cover lights beyond the visible list.
            for slot in index_map.iter_mut().skip(visible_count) {
                *slot = -1;
            }
            culling.set_light_index_map(index_map);
        }

        self.uniforms.directional_count = directional_count;
        self.uniforms.other_count = other_count;
        self.uniforms.lights_per_object = use_lights_per_object;
        self.uniforms.upload(&mut self.buffer);

        log::debug!(
            "Lights: {directional_count} directional, {other_count} other, {} shadowed tiles",
            self.shadows.other_count()
        );
    }

    fn setup_directional_light(
        &mut self,
        slot: usize,
        visible_index: usize,
        visible: &VisibleLight,
        culling: &impl CullingResults,
    ) {
        self.uniforms.directional_colors[slot] = visible.final_color;
        self.uniforms.directional_directions[slot] = visible.direction();
        self.uniforms.directional_shadow_data[slot] = self
            .shadows
            .reserve_directional_shadows(&visible.light, visible_index, culling)
            .into();
    }

    fn setup_other_light(
        &mut self,
        slot: usize,
        visible_index: usize,
        visible: &VisibleLight,
        culling: &impl CullingResults,
    ) {
        let light = &visible.light;
        self.uniforms.other_colors[slot] = visible.final_color;
        self.uniforms.other_positions[slot] = light_position(visible);
        if light.light_type == LightType::Spot {
            self.uniforms.other_directions[slot] = visible.direction();
            self.uniforms.other_spot_angles[slot] =
                spot_angles(light.inner_spot_angle, light.spot_angle);
        } else {
            self.uniforms.other_spot_angles[slot] = Vec4::new(0.0, 1.0, 0.0, 0.0);
        }
        self.uniforms.other_shadow_data[slot] = self
            .shadows
            .reserve_other_shadows(light, visible_index, culling)
            .into();
    }

    /// Releases the shadow atlases.
    pub fn cleanup<C: RenderContext + ?Sized>(&mut self, ctx: &mut C) {
        self.shadows.cleanup(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    use crate::scene::Light;

    #[test]
    fn test_spot_angles() {
        let angles = spot_angles(0.0, 90.0);
        let outer_cos = 45f32.to_radians().cos();
        let inv = 1.0 / (1.0 - outer_cos);
        assert!((angles.x - inv).abs() < 1e-4);
        assert!((angles.y + outer_cos * inv).abs() < 1e-4);
    }

    #[test]
    fn test_spot_angles_degenerate_cone() {
        let angles = spot_angles(40.0, 40.0);
        assert!((angles.x - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn test_light_position_inverse_range() {
        let visible = VisibleLight {
            light: Light::new(LightType::Point),
            final_color: Vec4::ONE,
            local_to_world: Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0)),
            range: 2.0,
        };
        assert_eq!(light_position(&visible), Vec4::new(1.0, 2.0, 3.0, 0.25));

        let zero_range = VisibleLight { range: 0.0, ..visible };
        assert!((light_position(&zero_range).w - 100_000.0).abs() < 1.0);
    }
}

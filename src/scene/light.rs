use glam::{Mat4, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    Directional,
    Point,
    Spot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightShadows {
    #[default]
    None,
    Hard,
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightmapBakeType {
    #[default]
    Realtime,
    Baked,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MixedLightingMode {
    #[default]
    IndirectOnly,
    Shadowmask,
    Subtractive,
}

/// Result of the host's light baking for one light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightBakingOutput {
    pub lightmap_bake_type: LightmapBakeType,
    pub mixed_lighting_mode: MixedLightingMode,
    /// Channel of the baked shadow mask holding this light's occlusion.
    pub occlusion_mask_channel: i32,
}

impl LightBakingOutput {
    /// The shadow-mask channel, when the light is mixed and baked into a mask.
    #[must_use]
    pub fn shadow_mask_channel(&self) -> Option<i32> {
        (self.lightmap_bake_type == LightmapBakeType::Mixed
            && self.mixed_lighting_mode == MixedLightingMode::Shadowmask)
            .then_some(self.occlusion_mask_channel)
    }
}

/// Shadow-relevant light properties as authored on the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub light_type: LightType,
    pub shadows: LightShadows,
    pub shadow_strength: f32,
    /// Slope-scale depth bias used while rendering the caster.
    pub shadow_bias: f32,
    pub shadow_normal_bias: f32,
    pub shadow_near_plane: f32,
    /// Outer cone angle in degrees (spot lights).
    pub spot_angle: f32,
    /// Inner cone angle in degrees (spot lights).
    pub inner_spot_angle: f32,
    pub baking: LightBakingOutput,
}

impl Light {
    #[must_use]
    pub fn new(light_type: LightType) -> Self {
        Self {
            light_type,
            shadows: LightShadows::None,
            shadow_strength: 1.0,
            shadow_bias: 0.05,
            shadow_normal_bias: 0.4,
            shadow_near_plane: 0.2,
            spot_angle: 30.0,
            inner_spot_angle: 21.8,
            baking: LightBakingOutput::default(),
        }
    }

    #[must_use]
    pub fn with_shadows(mut self, shadows: LightShadows, strength: f32) -> Self {
        self.shadows = shadows;
        self.shadow_strength = strength;
        self
    }

    /// Casting is requested and strong enough to be visible.
    #[inline]
    #[must_use]
    pub fn wants_shadows(&self) -> bool {
        self.shadows != LightShadows::None && self.shadow_strength > 0.0
    }
}

/// A light that survived culling this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleLight {
    pub light: Light,
    /// Color premultiplied by intensity.
    pub final_color: Vec4,
    pub local_to_world: Mat4,
    pub range: f32,
}

impl VisibleLight {
    #[inline]
    #[must_use]
    pub fn light_type(&self) -> LightType {
        self.light.light_type
    }

    /// Direction the light travels *towards*, negated so shaders get the
    /// surface-to-light vector.
    #[must_use]
    pub fn direction(&self) -> Vec4 {
        -self.local_to_world.z_axis
    }

    #[must_use]
    pub fn position(&self) -> Vec4 {
        self.local_to_world.w_axis
    }
}

/// Axis-aligned bounds of the shadow casters of one light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub extents: Vec3,
}

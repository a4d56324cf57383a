//! Shadow Configuration
//!
//! Pure data describing how real-time shadows are rendered: the shadow
//! distance, per-atlas sizes, PCF filter widths, and the cascade layout for
//! directional lights. Owned by the host and handed to
//! [`Shadows::setup`](crate::renderer::shadows::Shadows::setup) once per frame.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};

/// Maximum cascade count per directional light.
pub const MAX_CASCADES: u32 = 4;

/// Edge length of a square shadow atlas in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum TextureSize {
    X256,
    X512,
    #[default]
    X1024,
    X2048,
    X4096,
    X8192,
}

impl TextureSize {
    #[must_use]
    pub const fn texels(self) -> u32 {
        match self {
            Self::X256 => 256,
            Self::X512 => 512,
            Self::X1024 => 1024,
            Self::X2048 => 2048,
            Self::X4096 => 4096,
            Self::X8192 => 8192,
        }
    }
}

impl TryFrom<u32> for TextureSize {
    type Error = PipelineError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            256 => Ok(Self::X256),
            512 => Ok(Self::X512),
            1024 => Ok(Self::X1024),
            2048 => Ok(Self::X2048),
            4096 => Ok(Self::X4096),
            8192 => Ok(Self::X8192),
            other => Err(PipelineError::InvalidAtlasSize(other)),
        }
    }
}

impl From<TextureSize> for u32 {
    fn from(size: TextureSize) -> Self {
        size.texels()
    }
}

/// Percentage-closer filter width.
///
/// The discriminant doubles as the filter quality used in texel-size math:
/// the filter footprint is `texel_size * (quality + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    #[default]
    PCF2x2,
    PCF3x3,
    PCF5x5,
    PCF7x7,
}

impl FilterMode {
    #[inline]
    #[must_use]
    pub const fn quality(self) -> u32 {
        self as u32
    }

    /// Index into a 3-entry keyword table (`PCF3`, `PCF5`, `PCF7`).
    /// `None` for the hardware 2×2 filter, which needs no keyword.
    #[must_use]
    pub const fn keyword_index(self) -> Option<usize> {
        match self {
            Self::PCF2x2 => None,
            Self::PCF3x3 => Some(0),
            Self::PCF5x5 => Some(1),
            Self::PCF7x7 => Some(2),
        }
    }
}

/// How neighbouring cascades are blended in the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CascadeBlendMode {
    #[default]
    Hard,
    Soft,
    Dither,
}

impl CascadeBlendMode {
    #[must_use]
    pub const fn keyword_index(self) -> Option<usize> {
        match self {
            Self::Hard => None,
            Self::Soft => Some(0),
            Self::Dither => Some(1),
        }
    }
}

/// Host quality setting deciding how baked shadow masks combine with
/// real-time shadows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowMaskMode {
    /// Baked shadows everywhere, real-time shadows on top.
    Shadowmask,
    /// Real-time shadows up to the shadow distance, baked beyond.
    #[default]
    DistanceShadowmask,
}

/// Directional light atlas and cascade configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalShadowSettings {
    pub atlas_size: TextureSize,
    pub filter: FilterMode,
    /// Number of cascades, `1..=4`.
    pub cascade_count: u32,
    pub cascade_ratio_1: f32,
    pub cascade_ratio_2: f32,
    pub cascade_ratio_3: f32,
    /// Fraction of the last cascade over which shadows fade out, `0.001..=1`.
    pub cascade_fade: f32,
    pub cascade_blend: CascadeBlendMode,
}

impl Default for DirectionalShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: TextureSize::X1024,
            filter: FilterMode::PCF2x2,
            cascade_count: 4,
            cascade_ratio_1: 0.1,
            cascade_ratio_2: 0.25,
            cascade_ratio_3: 0.5,
            cascade_fade: 0.1,
            cascade_blend: CascadeBlendMode::Hard,
        }
    }
}

impl DirectionalShadowSettings {
    /// Split ratios of the first three cascades, as handed to the culling
    /// collaborator.
    #[inline]
    #[must_use]
    pub fn cascade_ratios(&self) -> Vec3 {
        Vec3::new(self.cascade_ratio_1, self.cascade_ratio_2, self.cascade_ratio_3)
    }
}

/// Spot and point light atlas configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherShadowSettings {
    pub atlas_size: TextureSize,
    pub filter: FilterMode,
}

/// Shadow configuration for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// World-space distance beyond which no real-time shadows are rendered.
    pub max_distance: f32,
    /// Fraction of `max_distance` over which shadows fade out.
    pub distance_fade: f32,
    pub shadow_mask_mode: ShadowMaskMode,
    pub directional: DirectionalShadowSettings,
    pub other: OtherShadowSettings,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            distance_fade: 0.1,
            shadow_mask_mode: ShadowMaskMode::default(),
            directional: DirectionalShadowSettings::default(),
            other: OtherShadowSettings::default(),
        }
    }
}

impl ShadowSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_distance > 0.0 && self.max_distance.is_finite()) {
            return Err(PipelineError::InvalidSettings {
                field: "shadows.max_distance",
                reason: format!("must be a positive finite distance, got {}", self.max_distance),
            });
        }
        if !(0.001..=1.0).contains(&self.distance_fade) {
            return Err(PipelineError::InvalidSettings {
                field: "shadows.distance_fade",
                reason: format!("must be in 0.001..=1, got {}", self.distance_fade),
            });
        }

        let dir = &self.directional;
        if !(1..=MAX_CASCADES).contains(&dir.cascade_count) {
            return Err(PipelineError::InvalidSettings {
                field: "shadows.directional.cascade_count",
                reason: format!("must be in 1..={MAX_CASCADES}, got {}", dir.cascade_count),
            });
        }
        for ratio in dir.cascade_ratios().to_array() {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(PipelineError::InvalidSettings {
                    field: "shadows.directional.cascade_ratio",
                    reason: format!("ratios must be in 0..=1, got {ratio}"),
                });
            }
        }
        if !(0.001..=1.0).contains(&dir.cascade_fade) {
            return Err(PipelineError::InvalidSettings {
                field: "shadows.directional.cascade_fade",
                reason: format!("must be in 0.001..=1, got {}", dir.cascade_fade),
            });
        }
        Ok(())
    }
}

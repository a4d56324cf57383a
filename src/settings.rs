//! Pipeline Configuration
//!
//! [`PipelineSettings`] is the top-level, serde-loadable description of a
//! pipeline instance. It is validated once in
//! [`RenderPipeline::new`](crate::renderer::RenderPipeline::new); frame-time
//! code assumes valid settings.
//!
//! # Example
//!
//! ```rust,ignore
//! let settings = PipelineSettings::from_json(r#"{
//!     "allow_hdr": true,
//!     "color_lut_resolution": 32,
//!     "shadows": { "max_distance": 50.0 }
//! }"#)?;
//! ```

use glam::UVec2;
use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};
use crate::resources::{PostFxSettings, ShadowSettings};

/// Edge length `n` of the color grading LUT (`n² × n` texels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ColorLutResolution {
    X16,
    #[default]
    X32,
    X64,
}

impl ColorLutResolution {
    #[must_use]
    pub const fn texels(self) -> u32 {
        match self {
            Self::X16 => 16,
            Self::X32 => 32,
            Self::X64 => 64,
        }
    }
}

impl TryFrom<u32> for ColorLutResolution {
    type Error = PipelineError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            16 => Ok(Self::X16),
            32 => Ok(Self::X32),
            64 => Ok(Self::X64),
            other => Err(PipelineError::InvalidLutResolution(other)),
        }
    }
}

impl From<ColorLutResolution> for u32 {
    fn from(resolution: ColorLutResolution) -> Self {
        resolution.texels()
    }
}

/// When the final rescale samples bicubically instead of bilinearly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BicubicRescalingMode {
    #[default]
    Off,
    /// Only when upscaling a reduced working buffer.
    UpOnly,
    UpAndDown,
}

impl BicubicRescalingMode {
    #[must_use]
    pub fn use_bicubic(self, buffer_size: UVec2, camera_size: UVec2) -> bool {
        match self {
            Self::Off => false,
            Self::UpOnly => buffer_size.x < camera_size.x || buffer_size.y < camera_size.y,
            Self::UpAndDown => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub allow_hdr: bool,
    pub use_dynamic_batching: bool,
    pub use_gpu_instancing: bool,
    /// Forwarded to the host with every geometry draw.
    pub use_srp_batcher: bool,
    pub use_lights_per_object: bool,
    pub color_lut_resolution: ColorLutResolution,
    /// Working buffer scale relative to the camera, `0.1..=2`.
    pub render_scale: f32,
    pub bicubic_rescaling: BicubicRescalingMode,
    pub shadows: ShadowSettings,
    /// `None` disables post-processing for every camera.
    pub post_fx: Option<PostFxSettings>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            allow_hdr: true,
            use_dynamic_batching: true,
            use_gpu_instancing: true,
            use_srp_batcher: true,
            use_lights_per_object: true,
            color_lut_resolution: ColorLutResolution::default(),
            render_scale: 1.0,
            bicubic_rescaling: BicubicRescalingMode::default(),
            shadows: ShadowSettings::default(),
            post_fx: None,
        }
    }
}

impl PipelineSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.1..=2.0).contains(&self.render_scale) {
            return Err(PipelineError::InvalidRenderScale(self.render_scale));
        }
        self.shadows.validate()?;
        if let Some(post_fx) = &self.post_fx {
            post_fx.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lut_resolution_rejects_odd_sizes() {
        assert_eq!(ColorLutResolution::try_from(64).ok(), Some(ColorLutResolution::X64));
        assert!(matches!(
            ColorLutResolution::try_from(48),
            Err(PipelineError::InvalidLutResolution(48))
        ));
    }

    #[test]
    fn test_bicubic_up_only() {
        let camera = UVec2::new(100, 100);
        assert!(BicubicRescalingMode::UpOnly.use_bicubic(UVec2::new(50, 50), camera));
        assert!(!BicubicRescalingMode::UpOnly.use_bicubic(UVec2::new(200, 200), camera));
        assert!(BicubicRescalingMode::UpAndDown.use_bicubic(UVec2::new(200, 200), camera));
        assert!(!BicubicRescalingMode::Off.use_bicubic(UVec2::new(50, 50), camera));
    }

    #[test]
    fn test_render_scale_validated() {
        let settings = PipelineSettings {
            render_scale: 3.0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(PipelineError::InvalidRenderScale(_))
        ));
    }
}

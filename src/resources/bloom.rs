//! Bloom Post-Processing Configuration
//!
//! Bloom settings as pure data. The pyramid itself lives in
//! [`renderer::post_fx::bloom`](crate::renderer::post_fx::bloom); this module
//! only describes what the user can tune and the derived shader parameters.
//!
//! The effect thresholds bright pixels with a soft knee, blurs them through a
//! separable downsample pyramid, and recombines the pyramid either additively
//! or as an energy-conserving scatter.

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};
use crate::resources::color::gamma_to_linear_space;

/// Maximum number of blur iterations the pyramid supports.
pub const MAX_BLOOM_PYRAMID_LEVELS: u32 = 16;

/// How pyramid levels are recombined on the way back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BloomMode {
    /// Adds every level on top of the source; brightens the image.
    #[default]
    Additive,
    /// Lerps between levels by `scatter`; conserves energy.
    Scattering,
}

/// Bloom configuration.
///
/// # Usage
///
/// ```rust,ignore
/// let mut fx = PostFxSettings::default();
/// fx.bloom.intensity = 0.5;
/// fx.bloom.mode = BloomMode::Scattering;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    /// Maximum number of blur iterations, `0..=16`. Zero disables bloom.
    pub max_iterations: u32,

    /// The pyramid stops once either dimension would drop below this size.
    ///
    /// Default: `1`
    pub downscale_limit: u32,

    /// Use bicubic filtering when upsampling pyramid levels.
    pub bicubic_upsampling: bool,

    /// Brightness threshold in gamma space.
    pub threshold: f32,

    /// Softness of the threshold curve, `0..=1`.
    pub threshold_knee: f32,

    /// Final bloom contribution. Zero or less disables bloom.
    pub intensity: f32,

    /// Suppress single-pixel highlights during the prefilter.
    pub fade_fireflies: bool,

    pub mode: BloomMode,

    /// Blend factor between levels in [`BloomMode::Scattering`], `0.05..=0.95`.
    pub scatter: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            max_iterations: MAX_BLOOM_PYRAMID_LEVELS,
            downscale_limit: 1,
            bicubic_upsampling: false,
            threshold: 0.5,
            threshold_knee: 0.5,
            intensity: 0.0,
            fade_fireflies: false,
            mode: BloomMode::Additive,
            scatter: 0.7,
        }
    }
}

impl BloomSettings {
    /// Packs the soft-knee threshold curve for the prefilter shader:
    /// `(t, -t + t·knee, 2·t·knee, 0.25 / (t·knee + ε))` with `t` in linear space.
    #[must_use]
    pub fn threshold_vector(&self) -> Vec4 {
        let x = gamma_to_linear_space(self.threshold);
        let knee = x * self.threshold_knee;
        Vec4::new(x, knee - x, 2.0 * knee, 0.25 / (knee + 0.00001))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations > MAX_BLOOM_PYRAMID_LEVELS {
            return Err(PipelineError::InvalidSettings {
                field: "post_fx.bloom.max_iterations",
                reason: format!(
                    "must be at most {MAX_BLOOM_PYRAMID_LEVELS}, got {}",
                    self.max_iterations
                ),
            });
        }
        if self.downscale_limit == 0 {
            return Err(PipelineError::InvalidSettings {
                field: "post_fx.bloom.downscale_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.threshold_knee) {
            return Err(PipelineError::InvalidSettings {
                field: "post_fx.bloom.threshold_knee",
                reason: format!("must be in 0..=1, got {}", self.threshold_knee),
            });
        }
        if !(0.05..=0.95).contains(&self.scatter) {
            return Err(PipelineError::InvalidSettings {
                field: "post_fx.bloom.scatter",
                reason: format!("must be in 0.05..=0.95, got {}", self.scatter),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_vector_hard_knee() {
        let bloom = BloomSettings {
            threshold: 1.0,
            threshold_knee: 0.0,
            ..Default::default()
        };
        let t = bloom.threshold_vector();
        assert!((t.x - 1.0).abs() < 1e-6);
        assert!((t.y + 1.0).abs() < 1e-6);
        assert!(t.z.abs() < 1e-6);
        assert!((t.w - 25_000.0).abs() < 1.0);
    }

    #[test]
    fn test_scatter_range_validated() {
        let bloom = BloomSettings {
            scatter: 1.0,
            ..Default::default()
        };
        assert!(bloom.validate().is_err());
    }
}

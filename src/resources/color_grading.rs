//! Color Grading Configuration
//!
//! The grading controls applied while baking the color LUT:
//! - **Color adjustments**: exposure, contrast, hue shift, saturation, filter
//! - **White balance**: temperature and tint, applied in LMS space
//! - **Split toning**: separate tints for shadows and highlights
//! - **Channel mixer**: per-output-channel RGB weights
//! - **Shadows / midtones / highlights**: three-way tint with adjustable ranges
//!
//! Each group knows how to pack itself into the vectors the grading shader
//! reads; the post-processing stack only forwards them to the uniform sink.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};
use crate::resources::color::Color;

// ============================================================================
// Color Adjustments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorAdjustmentsSettings {
    /// Exposure in stops.
    pub post_exposure: f32,
    /// `-100..=100`
    pub contrast: f32,
    /// HDR multiplier, authored in gamma space.
    pub color_filter: Color,
    /// Degrees, `-180..=180`
    pub hue_shift: f32,
    /// `-100..=100`
    pub saturation: f32,
}

impl Default for ColorAdjustmentsSettings {
    fn default() -> Self {
        Self {
            post_exposure: 0.0,
            contrast: 0.0,
            color_filter: Color::WHITE,
            hue_shift: 0.0,
            saturation: 0.0,
        }
    }
}

impl ColorAdjustmentsSettings {
    /// `(2^exposure, contrast·0.01 + 1, hue/360, saturation·0.01 + 1)`
    #[must_use]
    pub fn adjustments_vector(&self) -> Vec4 {
        Vec4::new(
            self.post_exposure.exp2(),
            self.contrast * 0.01 + 1.0,
            self.hue_shift * (1.0 / 360.0),
            self.saturation * 0.01 + 1.0,
        )
    }
}

// ============================================================================
// White Balance
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteBalanceSettings {
    /// `-100..=100`
    pub temperature: f32,
    /// `-100..=100`
    pub tint: f32,
}

impl WhiteBalanceSettings {
    /// LMS-space scale factors that move the reference white point by the
    /// configured temperature and tint. Neutral settings give `(1, 1, 1)`.
    #[must_use]
    pub fn lms_coefficients(&self) -> Vec3 {
        let t1 = self.temperature / 65.0;
        let t2 = self.tint / 65.0;

        // CIE xy of the shifted white point, starting from D65 (x = 0.31271).
        let x = 0.31271 - t1 * if t1 < 0.0 { 0.1 } else { 0.05 };
        let y = standard_illuminant_y(x) + t2 * 0.05;

        let d65 = Vec3::new(0.949_237, 1.035_42, 1.087_28);
        d65 / cie_xy_to_lms(x, y)
    }
}

fn standard_illuminant_y(x: f32) -> f32 {
    2.87 * x - 3.0 * x * x - 0.275_095_07
}

fn cie_xy_to_lms(x: f32, y: f32) -> Vec3 {
    let big_y = 1.0;
    let big_x = big_y * x / y;
    let big_z = big_y * (1.0 - x - y) / y;

    Vec3::new(
        0.7328 * big_x + 0.4296 * big_y - 0.1624 * big_z,
        -0.7036 * big_x + 1.6975 * big_y + 0.0061 * big_z,
        0.0030 * big_x + 0.0136 * big_y + 0.9834 * big_z,
    )
}

// ============================================================================
// Split Toning
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitToningSettings {
    pub shadows: Color,
    pub highlights: Color,
    /// `-100..=100`, shifts the split point towards shadows or highlights.
    pub balance: f32,
}

impl Default for SplitToningSettings {
    fn default() -> Self {
        Self {
            shadows: Color::GRAY,
            highlights: Color::GRAY,
            balance: 0.0,
        }
    }
}

impl SplitToningSettings {
    /// Shadows tint (gamma space) with the balance packed into alpha.
    #[must_use]
    pub fn shadows_vector(&self) -> Vec4 {
        let mut v = self.shadows.to_vec4();
        v.w = self.balance * 0.01;
        v
    }
}

// ============================================================================
// Channel Mixer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMixerSettings {
    pub red: Vec3,
    pub green: Vec3,
    pub blue: Vec3,
}

impl Default for ChannelMixerSettings {
    fn default() -> Self {
        Self {
            red: Vec3::X,
            green: Vec3::Y,
            blue: Vec3::Z,
        }
    }
}

// ============================================================================
// Shadows / Midtones / Highlights
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowsMidtonesHighlightsSettings {
    pub shadows: Color,
    pub midtones: Color,
    pub highlights: Color,
    pub shadows_start: f32,
    pub shadows_end: f32,
    pub highlights_start: f32,
    pub highlights_end: f32,
}

impl Default for ShadowsMidtonesHighlightsSettings {
    fn default() -> Self {
        Self {
            shadows: Color::WHITE,
            midtones: Color::WHITE,
            highlights: Color::WHITE,
            shadows_start: 0.0,
            shadows_end: 0.3,
            highlights_start: 0.55,
            highlights_end: 1.0,
        }
    }
}

impl ShadowsMidtonesHighlightsSettings {
    #[must_use]
    pub fn range_vector(&self) -> Vec4 {
        Vec4::new(
            self.shadows_start,
            self.shadows_end,
            self.highlights_start,
            self.highlights_end,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.shadows_start > self.shadows_end || self.highlights_start > self.highlights_end {
            return Err(PipelineError::InvalidSettings {
                field: "post_fx.shadows_midtones_highlights",
                reason: "range starts must not exceed their ends".to_string(),
            });
        }
        Ok(())
    }
}

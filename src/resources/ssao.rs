//! SSAO Configuration & Sampling Data
//!
//! - [`SsaoSettings`]: user-facing parameters (radius, bias, intensity, sample count)
//! - [`SsaoKernel`]: the hemisphere sample kernel and 4×4 rotation noise, built
//!   once and uploaded as uniform arrays
//!
//! Both are seeded with constants and come out identical on every run.

use glam::{FloatExt, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};

/// Upper bound on hemisphere samples; the kernel uniform array has this length.
pub const MAX_SSAO_SAMPLES: u32 = 64;

/// Number of texels in the tiled rotation noise (4×4).
pub const SSAO_NOISE_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsaoSettings {
    pub enabled: bool,
    /// Sampling radius in view-space units.
    pub radius: f32,
    /// Depth bias preventing self-occlusion acne.
    pub bias: f32,
    /// Strength of the darkening.
    pub intensity: f32,
    /// Number of hemisphere samples, `1..=64`.
    pub sample_count: u32,
}

impl Default for SsaoSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            radius: 0.5,
            bias: 0.025,
            intensity: 1.0,
            sample_count: 32,
        }
    }
}

impl SsaoSettings {
    /// `(radius, bias, intensity, sample_count)`
    #[must_use]
    pub fn params_vector(&self) -> Vec4 {
        Vec4::new(
            self.radius,
            self.bias,
            self.intensity,
            self.sample_count.clamp(1, MAX_SSAO_SAMPLES) as f32,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SSAO_SAMPLES).contains(&self.sample_count) {
            return Err(PipelineError::InvalidSettings {
                field: "post_fx.ssao.sample_count",
                reason: format!("must be in 1..={MAX_SSAO_SAMPLES}, got {}", self.sample_count),
            });
        }
        if self.radius <= 0.0 {
            return Err(PipelineError::InvalidSettings {
                field: "post_fx.ssao.radius",
                reason: format!("must be positive, got {}", self.radius),
            });
        }
        Ok(())
    }
}

/// Precomputed SSAO sampling data.
#[derive(Debug, Clone)]
pub struct SsaoKernel {
    /// Hemisphere samples (Z up), padded to [`MAX_SSAO_SAMPLES`].
    pub samples: Vec<Vec4>,
    /// Unit rotation vectors in XY, one per noise texel.
    pub noise: [Vec4; SSAO_NOISE_SIZE],
}

impl SsaoKernel {
    #[must_use]
    pub fn generate() -> Self {
        let mut samples = generate_ssao_kernel(MAX_SSAO_SAMPLES);
        samples.resize(MAX_SSAO_SAMPLES as usize, Vec4::ZERO);
        Self {
            samples,
            noise: generate_ssao_noise(),
        }
    }
}

const KERNEL_SEED: u64 = 0x55A0;
const NOISE_SEED: u64 = 0x4E01;

/// Builds `count` hemisphere samples around +Z.
///
/// Sample length grows quadratically with the sample index, so the kernel is
/// densest next to the shaded point.
#[must_use]
pub fn generate_ssao_kernel(count: u32) -> Vec<Vec4> {
    let mut rng = StdRng::seed_from_u64(KERNEL_SEED);
    (0..count)
        .map(|index| {
            let direction = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(0.01..1.0),
            )
            .normalize();
            let t = index as f32 / count as f32;
            let length = rng.random_range(0.0..1.0f32) * 0.1f32.lerp(1.0, t * t);
            (direction * length).extend(0.0)
        })
        .collect()
}

/// Rotation vectors tiled over the screen to decorrelate neighbouring pixels.
#[must_use]
pub fn generate_ssao_noise() -> [Vec4; SSAO_NOISE_SIZE] {
    let mut rng = StdRng::seed_from_u64(NOISE_SEED);
    std::array::from_fn(|_| {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let (sin, cos) = angle.sin_cos();
        Vec4::new(cos, sin, 0.0, 0.0)
    })
}

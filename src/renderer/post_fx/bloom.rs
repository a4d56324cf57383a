//! Bloom Pyramid
//!
//! ```text
//!  source ──prefilter──▶ ½ res
//!                          │ H blur → mid₀, V blur → to₀      ¼ res
//!                          │ H blur → mid₁, V blur → to₁      ⅛ res
//!                          ⋮
//!  top level ◀─────────────┘
//!      │ combine(to_top, to_{n-1}) → mid_{n-1}
//!      ⋮
//!      └─ final(level₀ result, source) → _BloomResult (working size)
//! ```
//!
//! Levels live on a stack. Walking back up, each level's `mid` target becomes
//! the next combine destination, and every target is released right after its
//! last read.

use std::sync::LazyLock;

use glam::UVec2;
use smallvec::SmallVec;

use crate::renderer::command::{CommandBuffer, UniformSink};
use crate::renderer::post_fx::pass::{FX_SOURCE, Pass, draw};
use crate::renderer::property::{PropertyId, RenderTargetId};
use crate::renderer::transient_pool::{RenderTextureDesc, color_format};
use crate::resources::bloom::MAX_BLOOM_PYRAMID_LEVELS;
use crate::resources::{BloomMode, BloomSettings};

const MAX_LEVELS: usize = MAX_BLOOM_PYRAMID_LEVELS as usize;

struct BloomIds {
    bicubic_upsampling: PropertyId,
    intensity: PropertyId,
    prefilter: PropertyId,
    result: PropertyId,
    threshold: PropertyId,
}

static IDS: LazyLock<BloomIds> = LazyLock::new(|| BloomIds {
    bicubic_upsampling: PropertyId::new("_BloomBicubicUpsampling"),
    intensity: PropertyId::new("_BloomIntensity"),
    prefilter: PropertyId::new("_BloomPrefilter"),
    result: PropertyId::new("_BloomResult"),
    threshold: PropertyId::new("_BloomThreshold"),
});

/// One blur iteration: horizontal pass into `mid`, vertical into `to`.
#[derive(Debug, Clone, Copy)]
struct BloomLevel {
    mid: PropertyId,
    to: PropertyId,
}

/// Records the bloom stage.
pub struct BloomPyramid {
    /// `_BloomPyramid0..31`: level `i` uses `2i` as `mid` and `2i + 1` as `to`.
    pyramid: Vec<PropertyId>,
}

impl Default for BloomPyramid {
    fn default() -> Self {
        Self::new()
    }
}

impl BloomPyramid {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pyramid: (0..MAX_LEVELS * 2)
                .map(|i| PropertyId::new(&format!("_BloomPyramid{i}")))
                .collect(),
        }
    }

    /// Target holding the bloomed image after a successful [`render`](Self::render).
    /// The caller releases it.
    #[must_use]
    pub fn result_id(&self) -> PropertyId {
        IDS.result
    }

    /// Whether bloom would run for a working buffer of `size`.
    #[must_use]
    pub fn is_enabled(bloom: &BloomSettings, size: UVec2) -> bool {
        let half = size / 2;
        let limit = bloom.downscale_limit.saturating_mul(2);
        bloom.max_iterations > 0 && bloom.intensity > 0.0 && half.x >= limit && half.y >= limit
    }

    /// Returns `false`, recording nothing, when bloom is disabled or the
    /// working buffer is too small.
    pub fn render(
        &self,
        buffer: &mut CommandBuffer,
        source: RenderTargetId,
        bloom: &BloomSettings,
        size: UVec2,
        use_hdr: bool,
    ) -> bool {
        if !Self::is_enabled(bloom, size) {
            log::debug!(
                "Bloom skipped (iterations {}, intensity {}, buffer {}x{})",
                bloom.max_iterations,
                bloom.intensity,
                size.x,
                size.y
            );
            return false;
        }

        buffer.begin_sample("Bloom");
        buffer.set_vector(IDS.threshold, bloom.threshold_vector());

        let format = color_format(use_hdr);
        let mut level_size = size / 2;
        buffer.get_temporary_rt(
            IDS.prefilter,
            RenderTextureDesc::color(level_size.x, level_size.y, format),
        );
        let prefilter_pass = if bloom.fade_fireflies {
            Pass::BloomPrefilterFireflies
        } else {
            Pass::BloomPrefilter
        };
        draw(buffer, source, IDS.prefilter, prefilter_pass);
        level_size /= 2;

        let limit = bloom.downscale_limit;
        let mut levels: SmallVec<[BloomLevel; MAX_LEVELS]> = SmallVec::new();
        let mut from = IDS.prefilter;
        for index in 0..(bloom.max_iterations as usize).min(MAX_LEVELS) {
            if level_size.x < limit || level_size.y < limit {
                break;
            }
            let level = BloomLevel {
                mid: self.pyramid[2 * index],
                to: self.pyramid[2 * index + 1],
            };
            let desc = RenderTextureDesc::color(level_size.x, level_size.y, format);
            buffer.get_temporary_rt(level.mid, desc);
            buffer.get_temporary_rt(level.to, desc);
            draw(buffer, from, level.mid, Pass::BloomHorizontal);
            draw(buffer, level.mid, level.to, Pass::BloomVertical);
            from = level.to;
            levels.push(level);
            level_size /= 2;
        }
        log::trace!("Bloom pyramid built with {} levels", levels.len());

        buffer.set_float(
            IDS.bicubic_upsampling,
            if bloom.bicubic_upsampling { 1.0 } else { 0.0 },
        );

        let (combine_pass, final_pass, final_intensity) = match bloom.mode {
            BloomMode::Additive => {
                buffer.set_float(IDS.intensity, 1.0);
                (Pass::BloomAdd, Pass::BloomAdd, bloom.intensity)
            }
            BloomMode::Scattering => {
                buffer.set_float(IDS.intensity, bloom.scatter);
                (
                    Pass::BloomScatter,
                    Pass::BloomScatterFinal,
                    bloom.intensity.min(1.0),
                )
            }
        };

        // With no blur levels the prefilter stays the final source.
        if let Some(top) = levels.pop() {
            buffer.release_temporary_rt(IDS.prefilter);
            buffer.release_temporary_rt(top.mid);
            from = top.to;
            while let Some(level) = levels.pop() {
                buffer.set_global_texture(FX_SOURCE.source2, level.to);
                draw(buffer, from, level.mid, combine_pass);
                buffer.release_temporary_rt(from);
                buffer.release_temporary_rt(level.to);
                from = level.mid;
            }
        }

        buffer.set_float(IDS.intensity, final_intensity);
        buffer.set_global_texture(FX_SOURCE.source2, source);
        buffer.get_temporary_rt(IDS.result, RenderTextureDesc::color(size.x, size.y, format));
        draw(buffer, from, IDS.result, final_pass);
        buffer.release_temporary_rt(from);
        buffer.end_sample("Bloom");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_bloom() -> BloomSettings {
        BloomSettings {
            intensity: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_skip_conditions() {
        let size = UVec2::new(1920, 1080);
        assert!(BloomPyramid::is_enabled(&enabled_bloom(), size));
        assert!(!BloomPyramid::is_enabled(&BloomSettings::default(), size));

        let no_iterations = BloomSettings {
            max_iterations: 0,
            ..enabled_bloom()
        };
        assert!(!BloomPyramid::is_enabled(&no_iterations, size));

        let big_limit = BloomSettings {
            downscale_limit: 300,
            ..enabled_bloom()
        };
        assert!(!BloomPyramid::is_enabled(&big_limit, size));
    }

    #[test]
    fn test_pyramid_ids_preallocated() {
        let bloom = BloomPyramid::new();
        assert_eq!(bloom.pyramid.len(), 32);
        assert_eq!(bloom.pyramid[0].name(), "_BloomPyramid0");
        assert_eq!(bloom.pyramid[31].name(), "_BloomPyramid31");
    }

    #[test]
    fn test_render_balances_targets() {
        let bloom = BloomPyramid::new();
        let mut buffer = CommandBuffer::new("bloom");
        let ran = bloom.render(
            &mut buffer,
            RenderTargetId::CameraTarget,
            &enabled_bloom(),
            UVec2::new(256, 128),
            true,
        );
        assert!(ran);
        assert_eq!(buffer.targets().outstanding_count(), 1);
        assert!(buffer.targets().contains(bloom.result_id()));
    }
}

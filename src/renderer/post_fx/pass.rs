//! Fullscreen passes of the post-processing material, and the shared draw
//! helper every stage uses.

use std::sync::LazyLock;

use crate::renderer::command::CommandBuffer;
use crate::renderer::property::{PropertyId, RenderTargetId};
use crate::resources::ToneMappingMode;

/// Pass index into the post-processing material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    BloomAdd,
    BloomHorizontal,
    BloomPrefilter,
    BloomPrefilterFireflies,
    BloomScatter,
    BloomScatterFinal,
    BloomVertical,
    Copy,
    ColorGradingNone,
    ColorGradingAces,
    ColorGradingNeutral,
    ColorGradingReinhard,
    Final,
    FinalRescale,
    SsaoRaw,
    SsaoBlur,
    SsaoCombine,
}

impl Pass {
    /// LUT-baking pass for a tone mapping mode.
    #[must_use]
    pub const fn color_grading(mode: ToneMappingMode) -> Self {
        match mode {
            ToneMappingMode::None => Self::ColorGradingNone,
            ToneMappingMode::Aces => Self::ColorGradingAces,
            ToneMappingMode::Neutral => Self::ColorGradingNeutral,
            ToneMappingMode::Reinhard => Self::ColorGradingReinhard,
        }
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self as u32
    }
}

pub(crate) struct SourceIds {
    pub source: PropertyId,
    pub source2: PropertyId,
}

pub(crate) static FX_SOURCE: LazyLock<SourceIds> = LazyLock::new(|| SourceIds {
    source: PropertyId::new("_PostFXSource"),
    source2: PropertyId::new("_PostFXSource2"),
});

/// Binds `from` as `_PostFXSource` and draws `pass` into `to`.
pub(crate) fn draw(
    buffer: &mut CommandBuffer,
    from: impl Into<RenderTargetId>,
    to: impl Into<RenderTargetId>,
    pass: Pass,
) {
    buffer.set_global_texture(FX_SOURCE.source, from);
    buffer.set_render_target(to);
    buffer.draw_procedural(pass);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_grading_passes_contiguous() {
        let base = Pass::ColorGradingNone.index();
        for (offset, mode) in ToneMappingMode::ALL.into_iter().enumerate() {
            assert_eq!(Pass::color_grading(mode).index(), base + offset as u32);
        }
    }
}

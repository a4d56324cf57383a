//! Post-Processing Settings Snapshot
//!
//! [`PostFxSettings`] bundles every tunable of the post-processing stack. The
//! host owns it and shares it with the pipeline as an `Arc`, so a frame always
//! reads one consistent, immutable snapshot.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::resources::bloom::BloomSettings;
use crate::resources::color_grading::{
    ChannelMixerSettings, ColorAdjustmentsSettings, ShadowsMidtonesHighlightsSettings,
    SplitToningSettings, WhiteBalanceSettings,
};
use crate::resources::ssao::SsaoSettings;
use crate::resources::tone_mapping::ToneMappingSettings;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFxSettings {
    pub bloom: BloomSettings,
    pub ssao: SsaoSettings,
    pub color_adjustments: ColorAdjustmentsSettings,
    pub white_balance: WhiteBalanceSettings,
    pub split_toning: SplitToningSettings,
    pub channel_mixer: ChannelMixerSettings,
    pub shadows_midtones_highlights: ShadowsMidtonesHighlightsSettings,
    pub tone_mapping: ToneMappingSettings,
}

impl PostFxSettings {
    pub fn validate(&self) -> Result<()> {
        self.bloom.validate()?;
        self.ssao.validate()?;
        self.shadows_midtones_highlights.validate()
    }
}

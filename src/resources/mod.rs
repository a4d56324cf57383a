//! Settings and data definitions.
//!
//! Everything here is plain data, independent of any GPU implementation:
//! - Shadow settings: atlas sizes, PCF filters, cascade layout
//! - Post-processing settings: bloom, SSAO, color grading, tone mapping
//! - Authoring colors and their linear-space conversion

pub mod bloom;
pub mod color;
pub mod color_grading;
pub mod post_fx;
pub mod shadow_settings;
pub mod ssao;
pub mod tone_mapping;

pub use bloom::{BloomMode, BloomSettings};
pub use color::Color;
pub use color_grading::{
    ChannelMixerSettings, ColorAdjustmentsSettings, ShadowsMidtonesHighlightsSettings,
    SplitToningSettings, WhiteBalanceSettings,
};
pub use post_fx::PostFxSettings;
pub use shadow_settings::{
    CascadeBlendMode, DirectionalShadowSettings, FilterMode, OtherShadowSettings, ShadowMaskMode,
    ShadowSettings, TextureSize,
};
pub use ssao::{SsaoKernel, SsaoSettings};
pub use tone_mapping::{ToneMappingMode, ToneMappingSettings};

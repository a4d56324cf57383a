//! Tone mapping curve selection.
//!
//! Plain data: the mode only decides which LUT-baking pass color grading
//! draws and whether the LUT input is encoded in Log C.

use serde::{Deserialize, Serialize};

/// Curve baked into the color grading LUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToneMappingMode {
    /// Grading only. Values above 1 are clipped by the LUT range.
    #[default]
    None,
    Aces,
    Neutral,
    Reinhard,
}

impl ToneMappingMode {
    pub const ALL: [Self; 4] = [Self::None, Self::Aces, Self::Neutral, Self::Reinhard];

    /// Whether the curve maps HDR input into the displayable range.
    ///
    /// Only such curves can use a Log C encoded LUT.
    #[must_use]
    pub const fn compresses_hdr(self) -> bool {
        !matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMappingSettings {
    pub mode: ToneMappingMode,
}

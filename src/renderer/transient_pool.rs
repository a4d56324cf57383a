//! Transient Render Target Ledger
//!
//! Temporary render targets are acquired and released by name on the host.
//! The host owns the actual textures; this ledger only tracks which names are
//! currently outstanding so each stage can prove it returned everything it
//! borrowed.
//!
//! # Design
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │              TransientTargets                    │
//! │                                                  │
//! │  outstanding: FxHashMap<PropertyId, Desc>        │
//! │                                                  │
//! │  acquire(id, desc)   (GetTemporaryRt recorded)   │
//! │  release(id)         (ReleaseTemporaryRt)        │
//! │  check_balanced(..)  (end of a stage)            │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Anomalies never abort a frame. A double acquire, a release of an unknown
//! name, or a leak at the end of a stage is reported through `log::warn!`.

use glam::UVec2;
use rustc_hash::FxHashMap;

use crate::renderer::property::PropertyId;

// ─── Public Types ─────────────────────────────────────────────────────────────

/// Color format for HDR working buffers.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Color format for LDR working buffers.
pub const LDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Depth format of shadow atlases.
pub const SHADOW_MAP_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[inline]
#[must_use]
pub fn color_format(use_hdr: bool) -> wgpu::TextureFormat {
    if use_hdr { HDR_FORMAT } else { LDR_FORMAT }
}

/// Descriptor for requesting a temporary render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTextureDesc {
    pub width: u32,
    pub height: u32,
    /// Depth buffer precision; `0` for a color-only target.
    pub depth_bits: u32,
    pub filter: wgpu::FilterMode,
    pub format: wgpu::TextureFormat,
}

impl RenderTextureDesc {
    /// Bilinear color target without a depth buffer.
    #[must_use]
    pub fn color(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            width,
            height,
            depth_bits: 0,
            filter: wgpu::FilterMode::Linear,
            format,
        }
    }

    /// Square 32-bit depth target used as a shadow atlas.
    #[must_use]
    pub fn shadow_map(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            depth_bits: 32,
            filter: wgpu::FilterMode::Linear,
            format: SHADOW_MAP_FORMAT,
        }
    }

    #[must_use]
    pub fn with_depth_bits(mut self, depth_bits: u32) -> Self {
        self.depth_bits = depth_bits;
        self
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }
}

// ─── Ledger Implementation ────────────────────────────────────────────────────

/// Tracks the temporary targets a command buffer has acquired but not yet
/// released.
///
/// The ledger survives [`CommandBuffer::clear`](crate::renderer::command::CommandBuffer::clear):
/// a target acquired in one flush is routinely released in a later one.
#[derive(Debug, Default)]
pub struct TransientTargets {
    outstanding: FxHashMap<PropertyId, RenderTextureDesc>,
    /// Largest number of simultaneously outstanding targets seen.
    high_water: usize,
}

impl TransientTargets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, id: PropertyId, desc: RenderTextureDesc) {
        if let Some(previous) = self.outstanding.insert(id, desc) {
            log::warn!(
                "Temporary target {id} acquired twice ({}x{} replaced by {}x{})",
                previous.width,
                previous.height,
                desc.width,
                desc.height
            );
        }
        self.high_water = self.high_water.max(self.outstanding.len());
    }

    /// Returns the descriptor the target was acquired with, or `None` (and a
    /// warning) if the name was not outstanding.
    pub fn release(&mut self, id: PropertyId) -> Option<RenderTextureDesc> {
        let desc = self.outstanding.remove(&id);
        if desc.is_none() {
            log::warn!("Releasing temporary target {id} that was never acquired");
        }
        desc
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: PropertyId) -> bool {
        self.outstanding.contains_key(&id)
    }

    #[must_use]
    pub fn desc(&self, id: PropertyId) -> Option<&RenderTextureDesc> {
        self.outstanding.get(&id)
    }

    #[inline]
    #[must_use]
    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    pub fn outstanding(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.outstanding.keys().copied()
    }

    #[inline]
    #[must_use]
    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }

    #[inline]
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// Warns about every target still outstanding at the end of `stage`.
    pub fn check_balanced(&self, stage: &str) -> bool {
        for id in self.outstanding() {
            log::warn!("{stage}: temporary target {id} still outstanding");
        }
        self.is_balanced()
    }
}

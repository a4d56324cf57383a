//! Rendering Pipeline
//!
//! Command recording for one frame, layered bottom-up:
//!
//! - [`property`], [`transient_pool`], [`command`]: property ids, the
//!   temporary target ledger, and the recorded command stream
//! - [`context`]: traits the host engine implements
//! - [`shadows`]: atlas budget, tile layout and cascade math
//! - [`lighting`]: light tables, driving shadow reservation
//! - [`post_fx`]: SSAO, bloom, color grading and present
//! - [`camera_renderer`]: the per-camera frame
//!
//! [`RenderPipeline`] is the entry point the host calls once per frame.

pub mod camera_renderer;
pub mod command;
pub mod context;
pub mod lighting;
pub mod post_fx;
pub mod property;
pub mod shadows;
pub mod transient_pool;

use std::sync::Arc;

use crate::errors::Result;
use crate::resources::PostFxSettings;
use crate::scene::{Camera, PreviewContext};
use crate::settings::PipelineSettings;

pub use camera_renderer::CameraRenderer;
pub use command::{Command, CommandBuffer, Rect, UniformSink};
pub use context::{CullingResults, RenderContext};
pub use lighting::Lighting;
pub use post_fx::PostFxStack;
pub use property::{PropertyId, RenderTargetId};
pub use shadows::{ShadowData, Shadows};

/// A configured pipeline instance.
pub struct RenderPipeline {
    settings: PipelineSettings,
    post_fx: Option<Arc<PostFxSettings>>,
    renderer: CameraRenderer,
}

impl RenderPipeline {
    /// Validates `settings` and builds the pipeline.
    pub fn new(settings: PipelineSettings) -> Result<Self> {
        settings.validate()?;
        let post_fx = settings.post_fx.clone().map(Arc::new);
        log::info!(
            "Render pipeline created (HDR: {}, LUT: {}, render scale: {}, post FX: {})",
            settings.allow_hdr,
            settings.color_lut_resolution.texels(),
            settings.render_scale,
            post_fx.is_some()
        );
        Ok(Self {
            settings,
            post_fx,
            renderer: CameraRenderer::new(),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    #[must_use]
    pub fn post_fx_settings(&self) -> Option<&Arc<PostFxSettings>> {
        self.post_fx.as_ref()
    }

    /// Swaps the post-processing snapshot used from the next camera on.
    pub fn set_post_fx_settings(&mut self, post_fx: Option<Arc<PostFxSettings>>) -> Result<()> {
        if let Some(settings) = &post_fx {
            settings.validate()?;
        }
        self.settings.post_fx = post_fx.as_deref().cloned();
        self.post_fx = post_fx;
        Ok(())
    }

    #[must_use]
    pub fn camera_renderer(&self) -> &CameraRenderer {
        &self.renderer
    }

    /// Renders `cameras` in order. Returns how many were actually drawn;
    /// cameras that fail culling are skipped.
    pub fn render<C: RenderContext>(
        &mut self,
        ctx: &mut C,
        cameras: &[Camera],
        preview: &PreviewContext,
    ) -> usize {
        let mut rendered = 0;
        for camera in cameras {
            if self
                .renderer
                .render(ctx, camera, &self.settings, self.post_fx.clone(), preview)
            {
                rendered += 1;
            }
        }
        rendered
    }
}

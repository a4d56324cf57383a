//! Post-Processing Stack
//!
//! [`PostFxStack`] composes the post-processing chain of one camera:
//!
//! ```text
//! Idle ─▶ Ssao? ─▶ Bloom? ─▶ ColorGrade ─▶ Present ─▶ Idle
//! ```
//!
//! Optional stages that are disabled (or cannot run at the current buffer
//! size) are skipped and the previous image flows straight on. Every stage is
//! recorded into one command buffer, executed once, and the buffer's
//! transient ledger must be empty afterwards.

pub mod bloom;
pub mod color_grading;
pub mod pass;
pub mod ssao;

use std::sync::Arc;

use glam::UVec2;

use crate::renderer::command::CommandBuffer;
use crate::renderer::context::RenderContext;
use crate::renderer::property::{PropertyId, RenderTargetId};
use crate::resources::{PostFxSettings, SsaoKernel};
use crate::scene::{Camera, CameraType, PreviewContext};
use crate::settings::{BicubicRescalingMode, ColorLutResolution};

use bloom::BloomPyramid;

const BUFFER_NAME: &str = "Post FX";

/// Position of the stack in its per-frame state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PostFxStage {
    #[default]
    Idle,
    Ssao,
    Bloom,
    ColorGrade,
    Present,
}

impl PostFxStage {
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Idle => Self::Ssao,
            Self::Ssao => Self::Bloom,
            Self::Bloom => Self::ColorGrade,
            Self::ColorGrade => Self::Present,
            Self::Present => Self::Idle,
        }
    }
}

/// Which optional work the last [`PostFxStack::render`] performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostFxReport {
    pub ssao: bool,
    pub bloom: bool,
    pub rescaled: bool,
}

/// Per-camera inputs of [`PostFxStack::setup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFxFrameConfig {
    /// Working buffer size after render scaling.
    pub buffer_size: UVec2,
    pub use_hdr: bool,
    pub color_lut_resolution: ColorLutResolution,
    pub bicubic_rescaling: BicubicRescalingMode,
}

pub struct PostFxStack {
    buffer: CommandBuffer,
    settings: Option<Arc<PostFxSettings>>,
    camera_size: UVec2,
    config: PostFxFrameConfig,
    /// Scene-view cameras have no usable depth normals for SSAO.
    editor_no_ao: bool,
    ssao_kernel: Option<SsaoKernel>,
    stage: PostFxStage,
    bloom: BloomPyramid,
    last_report: PostFxReport,
}

impl Default for PostFxStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PostFxStack {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: CommandBuffer::new(BUFFER_NAME),
            settings: None,
            camera_size: UVec2::ZERO,
            config: PostFxFrameConfig {
                buffer_size: UVec2::ZERO,
                use_hdr: false,
                color_lut_resolution: ColorLutResolution::default(),
                bicubic_rescaling: BicubicRescalingMode::default(),
            },
            editor_no_ao: false,
            ssao_kernel: None,
            stage: PostFxStage::Idle,
            bloom: BloomPyramid::new(),
            last_report: PostFxReport::default(),
        }
    }

    /// Prepares the stack for `camera`.
    ///
    /// Settings are dropped, leaving the stack inactive, for cameras that do
    /// not produce a final image and, inside an interactive editor, for scene
    /// views with image effects switched off.
    pub fn setup(
        &mut self,
        camera: &Camera,
        config: PostFxFrameConfig,
        settings: Option<Arc<PostFxSettings>>,
        preview: &PreviewContext,
    ) {
        self.camera_size = camera.pixel_size();
        self.config = config;

        let is_scene_view = camera.camera_type == CameraType::SceneView;
        let hidden_in_scene_view =
            is_scene_view && preview.is_interactive_preview && !preview.show_image_effects;
        self.settings = settings
            .filter(|_| camera.camera_type.produces_final_output() && !hidden_in_scene_view);
        self.editor_no_ao = is_scene_view;

        if self.ssao_kernel.is_none() {
            self.ssao_kernel = Some(SsaoKernel::generate());
        }
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.settings.is_some()
    }

    #[must_use]
    pub fn settings(&self) -> Option<&PostFxSettings> {
        self.settings.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn editor_no_ao(&self) -> bool {
        self.editor_no_ao
    }

    #[must_use]
    pub fn ssao_kernel(&self) -> Option<&SsaoKernel> {
        self.ssao_kernel.as_ref()
    }

    #[must_use]
    pub fn stage(&self) -> PostFxStage {
        self.stage
    }

    #[must_use]
    pub fn last_report(&self) -> PostFxReport {
        self.last_report
    }

    fn advance(&mut self, next: PostFxStage) {
        debug_assert_eq!(self.stage.next(), next, "post FX stages out of order");
        log::trace!("Post FX {:?} -> {next:?}", self.stage);
        self.stage = next;
    }

    /// Runs the chain from `source` to the camera target. Does nothing when
    /// the stack is inactive.
    pub fn render<C: RenderContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        source: PropertyId,
    ) -> PostFxReport {
        let Some(settings) = self.settings.clone() else {
            return PostFxReport::default();
        };
        let PostFxFrameConfig {
            buffer_size,
            use_hdr,
            color_lut_resolution,
            bicubic_rescaling,
        } = self.config;
        let mut report = PostFxReport::default();
        let mut current: RenderTargetId = source.into();

        self.advance(PostFxStage::Ssao);
        if settings.ssao.enabled
            && !self.editor_no_ao
            && let Some(kernel) = &self.ssao_kernel
        {
            ssao::render(
                &mut self.buffer,
                current,
                &settings.ssao,
                kernel,
                buffer_size,
                use_hdr,
            );
            current = ssao::result_id().into();
            report.ssao = true;
        }

        self.advance(PostFxStage::Bloom);
        report.bloom = self
            .bloom
            .render(&mut self.buffer, current, &settings.bloom, buffer_size, use_hdr);
        let graded_source: RenderTargetId = if report.bloom {
            self.bloom.result_id().into()
        } else {
            current
        };

        self.advance(PostFxStage::ColorGrade);
        color_grading::configure(&mut self.buffer, &settings);
        color_grading::render_lut(
            &mut self.buffer,
            graded_source,
            settings.tone_mapping.mode,
            use_hdr,
            color_lut_resolution,
        );

        self.advance(PostFxStage::Present);
        report.rescaled = color_grading::present(
            &mut self.buffer,
            graded_source,
            buffer_size,
            self.camera_size,
            use_hdr,
            bicubic_rescaling,
        );
        if report.bloom {
            self.buffer.release_temporary_rt(self.bloom.result_id());
        }
        if report.ssao {
            self.buffer.release_temporary_rt(ssao::result_id());
        }

        self.advance(PostFxStage::Idle);
        self.buffer.execute(ctx);
        self.buffer.targets().check_balanced(BUFFER_NAME);
        self.last_report = report;
        report
    }
}

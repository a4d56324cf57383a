//! Per-Camera Frame Recording
//!
//! ```text
//! cull ─▶ lighting + shadows ─▶ post FX setup ─▶ clear ─▶ opaque ─▶ skybox
//!      ─▶ transparent ─▶ post FX ─▶ cleanup ─▶ submit
//! ```
//!
//! A camera that cannot be culled is skipped before anything is recorded.

use std::sync::{Arc, LazyLock};

use glam::UVec2;
use smallvec::smallvec;

use crate::renderer::command::CommandBuffer;
use crate::renderer::context::{
    CullingResults, DrawingSettings, FilteringSettings, PerObjectData, RenderContext,
    RenderQueueRange, SortingCriteria,
};
use crate::renderer::lighting::Lighting;
use crate::renderer::post_fx::pass::{Pass, draw};
use crate::renderer::post_fx::{PostFxFrameConfig, PostFxReport, PostFxStack};
use crate::renderer::property::{PropertyId, RenderTargetId};
use crate::renderer::transient_pool::{RenderTextureDesc, color_format};
use crate::resources::{Color, PostFxSettings};
use crate::scene::{Camera, CameraType, ClearFlags, PreviewContext};
use crate::settings::PipelineSettings;

pub const UNLIT_SHADER_TAG: &str = "SRPDefaultUnlit";
pub const LIT_SHADER_TAG: &str = "CustomLit";

/// Render scale range accepted at frame time.
pub const RENDER_SCALE_MIN: f32 = 0.1;
pub const RENDER_SCALE_MAX: f32 = 2.0;

static FRAME_BUFFER: LazyLock<PropertyId> =
    LazyLock::new(|| PropertyId::new("_CameraFrameBuffer"));

/// Id of the intermediate color/depth target geometry renders into.
#[must_use]
pub fn frame_buffer_id() -> PropertyId {
    *FRAME_BUFFER
}

/// Working buffer size for `camera_size` at `render_scale`, or `None` when
/// the scale is close enough to 1 to render at native size.
#[must_use]
pub fn scaled_buffer_size(camera_size: UVec2, render_scale: f32) -> Option<UVec2> {
    let scale = render_scale.clamp(RENDER_SCALE_MIN, RENDER_SCALE_MAX);
    ((scale - 1.0).abs() > 0.01)
        .then(|| (camera_size.as_vec2() * scale).as_uvec2().max(UVec2::ONE))
}

pub struct CameraRenderer {
    buffer: CommandBuffer,
    lighting: Lighting,
    post_fx: PostFxStack,
    use_hdr: bool,
    buffer_size: UVec2,
    use_intermediate_buffer: bool,
}

impl Default for CameraRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: CommandBuffer::new("Render Camera"),
            lighting: Lighting::new(),
            post_fx: PostFxStack::new(),
            use_hdr: false,
            buffer_size: UVec2::ZERO,
            use_intermediate_buffer: false,
        }
    }

    #[must_use]
    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    #[must_use]
    pub fn post_fx(&self) -> &PostFxStack {
        &self.post_fx
    }

    #[must_use]
    pub fn use_hdr(&self) -> bool {
        self.use_hdr
    }

    /// Working buffer size of the last rendered camera.
    #[must_use]
    pub fn buffer_size(&self) -> UVec2 {
        self.buffer_size
    }

    /// Records and submits one camera. Returns `false` when culling failed
    /// and nothing was recorded.
    pub fn render<C: RenderContext>(
        &mut self,
        ctx: &mut C,
        camera: &Camera,
        settings: &PipelineSettings,
        post_fx_settings: Option<Arc<PostFxSettings>>,
        preview: &PreviewContext,
    ) -> bool {
        let sample_name = camera.name.clone();
        self.buffer.set_name(sample_name.as_str());

        let shadow_distance = settings.shadows.max_distance.min(camera.far_clip_plane);
        let Some(mut culling) = ctx.cull(camera, shadow_distance) else {
            log::debug!("Camera '{}' skipped: culling failed", camera.name);
            return false;
        };

        self.use_hdr = settings.allow_hdr && camera.allow_hdr;
        let scaled = if camera.camera_type == CameraType::SceneView {
            None
        } else {
            scaled_buffer_size(camera.pixel_size(), settings.render_scale)
        };
        self.buffer_size = scaled.unwrap_or_else(|| camera.pixel_size());

        self.buffer.begin_sample(&sample_name);
        self.buffer.execute(ctx);
        self.lighting.setup(
            ctx,
            &mut culling,
            &settings.shadows,
            settings.use_lights_per_object,
        );
        self.post_fx.setup(
            camera,
            PostFxFrameConfig {
                buffer_size: self.buffer_size,
                use_hdr: self.use_hdr,
                color_lut_resolution: settings.color_lut_resolution,
                bicubic_rescaling: settings.bicubic_rescaling,
            },
            post_fx_settings,
            preview,
        );
        self.buffer.end_sample(&sample_name);
        self.use_intermediate_buffer = scaled.is_some() || self.post_fx.is_active();

        self.setup(ctx, camera, &sample_name);
        self.draw_visible_geometry(ctx, &culling, camera, settings);

        if self.post_fx.is_active() {
            self.post_fx.render(ctx, frame_buffer_id());
        } else if self.use_intermediate_buffer {
            draw(
                &mut self.buffer,
                frame_buffer_id(),
                RenderTargetId::CameraTarget,
                Pass::Copy,
            );
        }

        self.cleanup(ctx);
        self.submit(ctx, &sample_name);
        true
    }

    /// Optional work the post-processing stack did for the last camera.
    #[must_use]
    pub fn last_post_fx_report(&self) -> PostFxReport {
        self.post_fx.last_report()
    }

    fn setup<C: RenderContext>(&mut self, ctx: &mut C, camera: &Camera, sample_name: &str) {
        ctx.setup_camera_properties(camera);

        let mut flags = camera.clear_flags;
        if self.use_intermediate_buffer {
            if flags > ClearFlags::Color {
                flags = ClearFlags::Color;
            }
            let size = self.buffer_size;
            self.buffer.get_temporary_rt(
                frame_buffer_id(),
                RenderTextureDesc::color(size.x, size.y, color_format(self.use_hdr))
                    .with_depth_bits(32),
            );
            self.buffer.set_render_target(frame_buffer_id());
        }

        let clear_color = flags == ClearFlags::Color;
        self.buffer.clear_render_target(
            flags <= ClearFlags::Depth,
            clear_color,
            if clear_color {
                camera.background_color.linear()
            } else {
                Color::CLEAR
            },
        );
        self.buffer.begin_sample(sample_name);
        self.buffer.execute(ctx);
    }

    fn draw_visible_geometry<C: RenderContext>(
        &mut self,
        ctx: &mut C,
        culling: &C::Culling,
        camera: &Camera,
        settings: &PipelineSettings,
    ) {
        let lights_per_object = if settings.use_lights_per_object {
            PerObjectData::LIGHTS_PER_OBJECT
        } else {
            PerObjectData::empty()
        };
        let mut drawing = DrawingSettings {
            shader_passes: smallvec![UNLIT_SHADER_TAG, LIT_SHADER_TAG],
            sorting: SortingCriteria::CommonOpaque,
            enable_dynamic_batching: settings.use_dynamic_batching,
            enable_instancing: settings.use_gpu_instancing,
            enable_srp_batcher: settings.use_srp_batcher,
            per_object_data: PerObjectData::BAKED_GI | lights_per_object,
        };
        let mut filtering = FilteringSettings {
            render_queue_range: RenderQueueRange::Opaque,
        };
        ctx.draw_renderers(culling, &drawing, &filtering);

        ctx.draw_skybox(camera);

        drawing.sorting = SortingCriteria::CommonTransparent;
        filtering.render_queue_range = RenderQueueRange::Transparent;
        ctx.draw_renderers(culling, &drawing, &filtering);

        log::trace!(
            "Camera '{}': {} visible lights",
            camera.name,
            culling.visible_lights().len()
        );
    }

    fn cleanup<C: RenderContext>(&mut self, ctx: &mut C) {
        self.lighting.cleanup(ctx);
        if self.use_intermediate_buffer {
            self.buffer.release_temporary_rt(frame_buffer_id());
        }
    }

    fn submit<C: RenderContext>(&mut self, ctx: &mut C, sample_name: &str) {
        self.buffer.end_sample(sample_name);
        self.buffer.execute(ctx);
        ctx.submit();
        self.buffer.targets().check_balanced(sample_name);
    }
}

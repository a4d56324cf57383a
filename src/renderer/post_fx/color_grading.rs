//! Color Grading, Tone Mapping & Present
//!
//! Grading is baked into a 2D-unwrapped 3D LUT (`n² × n`, HDR) once per
//! frame; the final pass samples the LUT while copying the image to the
//! camera target, rescaling through an intermediate when the working buffer
//! differs from the camera size.

use std::sync::LazyLock;

use glam::{UVec2, Vec4};

use crate::renderer::command::{CommandBuffer, UniformSink};
use crate::renderer::post_fx::pass::{Pass, draw};
use crate::renderer::property::{PropertyId, RenderTargetId};
use crate::renderer::transient_pool::{HDR_FORMAT, RenderTextureDesc, color_format};
use crate::resources::{PostFxSettings, ToneMappingMode};
use crate::settings::{BicubicRescalingMode, ColorLutResolution};

struct ColorGradingIds {
    lut: PropertyId,
    lut_parameters: PropertyId,
    lut_in_log_c: PropertyId,
    adjustments: PropertyId,
    color_filter: PropertyId,
    white_balance: PropertyId,
    split_toning_shadows: PropertyId,
    split_toning_highlights: PropertyId,
    channel_mixer_red: PropertyId,
    channel_mixer_green: PropertyId,
    channel_mixer_blue: PropertyId,
    smh_shadows: PropertyId,
    smh_midtones: PropertyId,
    smh_highlights: PropertyId,
    smh_range: PropertyId,
    result: PropertyId,
    copy_bicubic: PropertyId,
}

static IDS: LazyLock<ColorGradingIds> = LazyLock::new(|| ColorGradingIds {
    lut: PropertyId::new("_ColorGradingLUT"),
    lut_parameters: PropertyId::new("_ColorGradingLUTParameters"),
    lut_in_log_c: PropertyId::new("_ColorGradingLUTInLogC"),
    adjustments: PropertyId::new("_ColorAdjustments"),
    color_filter: PropertyId::new("_ColorFilter"),
    white_balance: PropertyId::new("_WhiteBalance"),
    split_toning_shadows: PropertyId::new("_SplitToningShadows"),
    split_toning_highlights: PropertyId::new("_SplitToningHighlights"),
    channel_mixer_red: PropertyId::new("_ChannelMixerRed"),
    channel_mixer_green: PropertyId::new("_ChannelMixerGreen"),
    channel_mixer_blue: PropertyId::new("_ChannelMixerBlue"),
    smh_shadows: PropertyId::new("_SMHShadows"),
    smh_midtones: PropertyId::new("_SMHMidtones"),
    smh_highlights: PropertyId::new("_SMHHighlights"),
    smh_range: PropertyId::new("_SMHRange"),
    result: PropertyId::new("_ColorGradingResult"),
    copy_bicubic: PropertyId::new("_CopyBicubic"),
});

// ============================================================================
// Grading Uniforms
// ============================================================================

/// Uploads every grading parameter the LUT passes read.
pub fn configure(buffer: &mut CommandBuffer, settings: &PostFxSettings) {
    let ids = &*IDS;

    let adjustments = &settings.color_adjustments;
    buffer.set_vector(ids.adjustments, adjustments.adjustments_vector());
    buffer.set_vector(ids.color_filter, adjustments.color_filter.linear().to_vec4());

    buffer.set_vector(
        ids.white_balance,
        settings.white_balance.lms_coefficients().extend(0.0),
    );

    let split_toning = &settings.split_toning;
    buffer.set_vector(ids.split_toning_shadows, split_toning.shadows_vector());
    buffer.set_vector(ids.split_toning_highlights, split_toning.highlights.to_vec4());

    let mixer = &settings.channel_mixer;
    buffer.set_vector(ids.channel_mixer_red, mixer.red.extend(0.0));
    buffer.set_vector(ids.channel_mixer_green, mixer.green.extend(0.0));
    buffer.set_vector(ids.channel_mixer_blue, mixer.blue.extend(0.0));

    let smh = &settings.shadows_midtones_highlights;
    buffer.set_vector(ids.smh_shadows, smh.shadows.linear().to_vec4());
    buffer.set_vector(ids.smh_midtones, smh.midtones.linear().to_vec4());
    buffer.set_vector(ids.smh_highlights, smh.highlights.linear().to_vec4());
    buffer.set_vector(ids.smh_range, smh.range_vector());
}

/// `(n, 0.5 / n², 0.5 / n, n / (n - 1))`, read while baking the LUT.
#[must_use]
pub fn lut_bake_parameters(resolution: ColorLutResolution) -> Vec4 {
    let height = resolution.texels() as f32;
    let width = height * height;
    Vec4::new(height, 0.5 / width, 0.5 / height, height / (height - 1.0))
}

/// `(1 / n², 1 / n, n - 1)`, read while sampling the LUT.
#[must_use]
pub fn lut_sample_parameters(resolution: ColorLutResolution) -> Vec4 {
    let height = resolution.texels() as f32;
    let width = height * height;
    Vec4::new(1.0 / width, 1.0 / height, height - 1.0, 0.0)
}

// ============================================================================
// Stages
// ============================================================================

/// Bakes grading and tone mapping into `_ColorGradingLUT`, which stays
/// outstanding until [`present`] releases it.
pub fn render_lut(
    buffer: &mut CommandBuffer,
    source: RenderTargetId,
    mode: ToneMappingMode,
    use_hdr: bool,
    lut_resolution: ColorLutResolution,
) {
    let ids = &*IDS;
    let lut_height = lut_resolution.texels();
    let lut_width = lut_height * lut_height;
    buffer.get_temporary_rt(
        ids.lut,
        RenderTextureDesc::color(lut_width, lut_height, HDR_FORMAT),
    );
    buffer.set_vector(ids.lut_parameters, lut_bake_parameters(lut_resolution));

    let pass = Pass::color_grading(mode);
    let in_log_c = use_hdr && mode.compresses_hdr();
    buffer.set_float(ids.lut_in_log_c, if in_log_c { 1.0 } else { 0.0 });
    draw(buffer, source, ids.lut, pass);

    buffer.set_vector(ids.lut_parameters, lut_sample_parameters(lut_resolution));
}

/// Draws the final graded image to the camera target and releases the LUT.
///
/// Returns `true` when the image went through the rescale path.
pub fn present(
    buffer: &mut CommandBuffer,
    source: RenderTargetId,
    buffer_size: UVec2,
    camera_size: UVec2,
    use_hdr: bool,
    bicubic_rescaling: BicubicRescalingMode,
) -> bool {
    let ids = &*IDS;
    let rescaled = buffer_size != camera_size;

    if rescaled {
        let bicubic = bicubic_rescaling.use_bicubic(buffer_size, camera_size);
        log::debug!(
            "Rescaling {}x{} to {}x{} (bicubic: {bicubic})",
            buffer_size.x,
            buffer_size.y,
            camera_size.x,
            camera_size.y
        );
        buffer.get_temporary_rt(
            ids.result,
            RenderTextureDesc::color(buffer_size.x, buffer_size.y, color_format(use_hdr)),
        );
        draw(buffer, source, ids.result, Pass::Final);
        buffer.set_float(ids.copy_bicubic, if bicubic { 1.0 } else { 0.0 });
        draw(buffer, ids.result, RenderTargetId::CameraTarget, Pass::FinalRescale);
        buffer.release_temporary_rt(ids.result);
    } else {
        draw(buffer, source, RenderTargetId::CameraTarget, Pass::Final);
    }

    buffer.release_temporary_rt(ids.lut);
    rescaled
}

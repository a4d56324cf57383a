//! Post-Processing Stack Tests
//!
//! Tests for:
//! - Activation rules per camera type and editor state
//! - Bloom skipping, pyramid depth and intensity uniforms
//! - SSAO ordering and the scene-view AO opt-out
//! - LUT baking parameters and log-C encoding
//! - Native and rescaled present
//! - Balanced temporary targets for every path

mod common;

use std::sync::Arc;

use glam::UVec2;

use custom_rp::renderer::camera_renderer::frame_buffer_id;
use custom_rp::renderer::post_fx::color_grading::lut_sample_parameters;
use custom_rp::renderer::post_fx::pass::Pass;
use custom_rp::renderer::post_fx::{PostFxFrameConfig, PostFxStack, PostFxStage};
use custom_rp::renderer::transient_pool::{HDR_FORMAT, LDR_FORMAT};
use custom_rp::resources::{BloomMode, PostFxSettings, ToneMappingMode};
use custom_rp::scene::{Camera, CameraType, PreviewContext};
use custom_rp::settings::{BicubicRescalingMode, ColorLutResolution};

use common::{MockContext, init_logger};

const FULL_HD: UVec2 = UVec2::new(1920, 1080);

fn config(buffer_size: UVec2, use_hdr: bool) -> PostFxFrameConfig {
    PostFxFrameConfig {
        buffer_size,
        use_hdr,
        color_lut_resolution: ColorLutResolution::X32,
        bicubic_rescaling: BicubicRescalingMode::Off,
    }
}

fn bloom_settings(intensity: f32) -> PostFxSettings {
    let mut settings = PostFxSettings::default();
    settings.bloom.intensity = intensity;
    settings
}

/// Sets up a stack for a full HD game camera and renders one frame.
fn render_with(settings: PostFxSettings, config: PostFxFrameConfig) -> (PostFxStack, MockContext) {
    init_logger();
    let camera = Camera::new("Main", FULL_HD.x, FULL_HD.y);
    let mut stack = PostFxStack::new();
    stack.setup(
        &camera,
        config,
        Some(Arc::new(settings)),
        &PreviewContext::default(),
    );
    let mut ctx = MockContext::default();
    stack.render(&mut ctx, frame_buffer_id());
    (stack, ctx)
}

fn count(passes: &[Pass], pass: Pass) -> usize {
    passes.iter().filter(|p| **p == pass).count()
}

// ============================================================================
// Activation
// ============================================================================

#[test]
fn preview_cameras_skip_post_fx() {
    let mut camera = Camera::new("Thumbnail", 128, 128);
    camera.camera_type = CameraType::Preview;
    let mut stack = PostFxStack::new();
    stack.setup(
        &camera,
        config(camera.pixel_size(), true),
        Some(Arc::new(bloom_settings(1.0))),
        &PreviewContext::default(),
    );
    assert!(!stack.is_active());

    let mut ctx = MockContext::default();
    let report = stack.render(&mut ctx, frame_buffer_id());
    assert_eq!(report, Default::default());
    assert!(ctx.events.is_empty());
}

#[test]
fn reflection_cameras_skip_post_fx() {
    let mut camera = Camera::new("Probe", 128, 128);
    camera.camera_type = CameraType::Reflection;
    let mut stack = PostFxStack::new();
    stack.setup(
        &camera,
        config(camera.pixel_size(), true),
        Some(Arc::new(PostFxSettings::default())),
        &PreviewContext::default(),
    );
    assert!(!stack.is_active());
}

#[test]
fn scene_view_respects_image_effects_toggle() {
    let mut camera = Camera::new("Scene", 800, 600);
    camera.camera_type = CameraType::SceneView;
    let settings = Arc::new(PostFxSettings::default());
    let mut stack = PostFxStack::new();

    let hidden = PreviewContext {
        is_interactive_preview: true,
        show_image_effects: false,
    };
    stack.setup(&camera, config(camera.pixel_size(), true), Some(settings.clone()), &hidden);
    assert!(!stack.is_active());

    // Outside an interactive editor the toggle is not consulted.
    let offline = PreviewContext {
        is_interactive_preview: false,
        show_image_effects: false,
    };
    stack.setup(&camera, config(camera.pixel_size(), true), Some(settings.clone()), &offline);
    assert!(stack.is_active());

    stack.setup(
        &camera,
        config(camera.pixel_size(), true),
        Some(settings),
        &PreviewContext::default(),
    );
    assert!(stack.is_active());
    assert!(stack.editor_no_ao());
}

#[test]
fn no_settings_leaves_stack_inactive() {
    let camera = Camera::new("Main", 640, 480);
    let mut stack = PostFxStack::new();
    stack.setup(&camera, config(camera.pixel_size(), false), None, &PreviewContext::default());
    assert!(!stack.is_active());
    assert!(stack.settings().is_none());
}

#[test]
fn ssao_kernel_is_built_on_first_setup() {
    let camera = Camera::new("Main", 640, 480);
    let mut stack = PostFxStack::new();
    assert!(stack.ssao_kernel().is_none());

    stack.setup(&camera, config(camera.pixel_size(), false), None, &PreviewContext::default());
    let first = stack.ssao_kernel().map(|kernel| kernel.samples.clone());
    assert!(first.is_some());

    stack.setup(&camera, config(camera.pixel_size(), false), None, &PreviewContext::default());
    assert_eq!(stack.ssao_kernel().map(|kernel| kernel.samples.clone()), first);
}

// ============================================================================
// Bloom
// ============================================================================

#[test]
fn zero_intensity_skips_bloom() {
    let (stack, ctx) = render_with(bloom_settings(0.0), config(FULL_HD, true));

    assert!(!stack.last_report().bloom);
    assert!(ctx.acquired_desc("_BloomPrefilter").is_none());
    assert_eq!(ctx.passes(), vec![Pass::ColorGradingNone, Pass::Final]);
    ctx.assert_targets_balanced();
}

#[test]
fn tiny_buffer_skips_bloom() {
    let (stack, ctx) = render_with(bloom_settings(1.0), config(UVec2::new(2, 2), true));
    assert!(!stack.last_report().bloom);
    assert_eq!(count(&ctx.passes(), Pass::BloomHorizontal), 0);
}

#[test]
fn bloom_skip_boundary_is_twice_the_limit() {
    let mut settings = bloom_settings(1.0);
    settings.bloom.downscale_limit = 10;

    // Half width 20 equals twice the limit: bloom still runs.
    let (stack, ctx) = render_with(settings.clone(), config(UVec2::new(40, 1080), true));
    assert!(stack.last_report().bloom);
    ctx.assert_targets_balanced();

    // Half width 19 is one texel short.
    let (stack, ctx) = render_with(settings, config(UVec2::new(38, 1080), true));
    assert!(!stack.last_report().bloom);
    assert!(ctx.acquired_desc("_BloomPrefilter").is_none());
}

#[test]
fn single_level_bloom_has_no_combine() {
    let mut settings = bloom_settings(1.0);
    settings.bloom.max_iterations = 1;

    let (stack, ctx) = render_with(settings, config(FULL_HD, true));

    assert!(stack.last_report().bloom);
    let passes = ctx.passes();
    assert_eq!(
        &passes[..4],
        &[Pass::BloomPrefilter, Pass::BloomHorizontal, Pass::BloomVertical, Pass::BloomAdd]
    );
    // The only add is the final one into the result.
    assert_eq!(count(&passes, Pass::BloomAdd), 1);
    assert!(ctx.acquired_desc("_BloomPyramid2").is_none());

    let released: Vec<_> = ctx.released().iter().map(|id| id.name()).collect();
    for name in ["_BloomPrefilter", "_BloomPyramid0", "_BloomPyramid1", "_BloomResult"] {
        assert!(released.contains(&name), "{name} not released");
    }
    ctx.assert_targets_balanced();
}

#[test]
fn additive_bloom_builds_requested_levels() {
    let mut settings = bloom_settings(0.8);
    settings.bloom.max_iterations = 3;
    settings.bloom.downscale_limit = 2;

    let (stack, ctx) = render_with(settings, config(FULL_HD, true));

    assert!(stack.last_report().bloom);
    let passes = ctx.passes();
    assert_eq!(passes[0], Pass::BloomPrefilter);
    assert_eq!(count(&passes, Pass::BloomHorizontal), 3);
    assert_eq!(count(&passes, Pass::BloomVertical), 3);
    // Two combines walking up, one final add at working size.
    assert_eq!(count(&passes, Pass::BloomAdd), 3);
    assert_eq!(ctx.floats("_BloomIntensity"), vec![1.0, 0.8]);

    let prefilter = ctx.acquired_desc("_BloomPrefilter").unwrap();
    assert_eq!(prefilter.size(), FULL_HD / 2);
    let level = ctx.acquired_desc("_BloomPyramid0").unwrap();
    assert_eq!(level.size(), FULL_HD / 4);
    let result = ctx.acquired_desc("_BloomResult").unwrap();
    assert_eq!(result.size(), FULL_HD);
    assert_eq!(result.format, HDR_FORMAT);

    ctx.assert_targets_balanced();
}

#[test]
fn pyramid_stops_at_downscale_limit() {
    let mut settings = bloom_settings(1.0);
    settings.bloom.downscale_limit = 100;

    let (_, ctx) = render_with(settings, config(FULL_HD, false));

    // 480x270 and 240x135 qualify; 120x67 is below the limit.
    assert_eq!(count(&ctx.passes(), Pass::BloomHorizontal), 2);
    assert_eq!(ctx.acquired_desc("_BloomResult").unwrap().format, LDR_FORMAT);
    ctx.assert_targets_balanced();
}

#[test]
fn scattering_bloom_uses_scatter_then_clamped_intensity() {
    let mut settings = bloom_settings(2.5);
    settings.bloom.mode = BloomMode::Scattering;
    settings.bloom.scatter = 0.6;
    settings.bloom.fade_fireflies = true;
    settings.bloom.max_iterations = 4;

    let (_, ctx) = render_with(settings, config(FULL_HD, true));

    let passes = ctx.passes();
    assert_eq!(passes[0], Pass::BloomPrefilterFireflies);
    assert_eq!(count(&passes, Pass::BloomScatter), 3);
    assert_eq!(count(&passes, Pass::BloomScatterFinal), 1);
    assert_eq!(ctx.floats("_BloomIntensity"), vec![0.6, 1.0]);
    ctx.assert_targets_balanced();
}

// ============================================================================
// SSAO
// ============================================================================

#[test]
fn ssao_runs_before_bloom() {
    let mut settings = bloom_settings(1.0);
    settings.ssao.enabled = true;

    let (stack, ctx) = render_with(settings, config(FULL_HD, true));

    assert!(stack.last_report().ssao);
    let passes = ctx.passes();
    assert_eq!(
        &passes[..4],
        &[Pass::SsaoRaw, Pass::SsaoBlur, Pass::SsaoCombine, Pass::BloomPrefilter]
    );
    assert_eq!(ctx.last_vector_array("_SSAOKernel").map(|k| k.len()), Some(64));
    ctx.assert_targets_balanced();
}

#[test]
fn scene_view_never_runs_ssao() {
    let mut settings = PostFxSettings::default();
    settings.ssao.enabled = true;
    let mut camera = Camera::new("Scene", 800, 600);
    camera.camera_type = CameraType::SceneView;
    let mut stack = PostFxStack::new();
    stack.setup(
        &camera,
        config(camera.pixel_size(), true),
        Some(Arc::new(settings)),
        &PreviewContext::default(),
    );

    let mut ctx = MockContext::default();
    let report = stack.render(&mut ctx, frame_buffer_id());

    assert!(!report.ssao);
    assert_eq!(count(&ctx.passes(), Pass::SsaoRaw), 0);
    ctx.assert_targets_balanced();
}

// ============================================================================
// Color Grading & Present
// ============================================================================

#[test]
fn lut_is_log_c_only_for_hdr_tone_mapping() {
    let cases = [
        (ToneMappingMode::Aces, true, 1.0, Pass::ColorGradingAces),
        (ToneMappingMode::Reinhard, false, 0.0, Pass::ColorGradingReinhard),
        (ToneMappingMode::None, true, 0.0, Pass::ColorGradingNone),
    ];
    for (mode, use_hdr, log_c, pass) in cases {
        let mut settings = PostFxSettings::default();
        settings.tone_mapping.mode = mode;
        let (_, ctx) = render_with(settings, config(FULL_HD, use_hdr));
        assert_eq!(ctx.floats("_ColorGradingLUTInLogC"), vec![log_c], "{mode:?}");
        assert!(ctx.passes().contains(&pass));
    }
}

#[test]
fn lut_size_and_sample_parameters() {
    let mut frame = config(FULL_HD, true);
    frame.color_lut_resolution = ColorLutResolution::X16;
    let (_, ctx) = render_with(PostFxSettings::default(), frame);

    let lut = ctx.acquired_desc("_ColorGradingLUT").unwrap();
    assert_eq!(lut.size(), UVec2::new(256, 16));
    assert_eq!(lut.format, HDR_FORMAT);
    assert_eq!(
        ctx.last_vector("_ColorGradingLUTParameters"),
        Some(lut_sample_parameters(ColorLutResolution::X16))
    );
    assert!(ctx.last_vector("_ColorAdjustments").is_some());
    assert!(ctx.last_vector("_WhiteBalance").is_some());
    assert!(ctx.last_vector("_SMHRange").is_some());
}

#[test]
fn reduced_buffer_is_rescaled_to_camera() {
    let mut frame = config(FULL_HD / 2, true);
    frame.bicubic_rescaling = BicubicRescalingMode::UpOnly;

    let (stack, ctx) = render_with(PostFxSettings::default(), frame);

    assert!(stack.last_report().rescaled);
    let passes = ctx.passes();
    assert_eq!(&passes[passes.len() - 2..], &[Pass::Final, Pass::FinalRescale]);
    assert_eq!(ctx.floats("_CopyBicubic"), vec![1.0]);
    assert_eq!(
        ctx.acquired_desc("_ColorGradingResult").map(|desc| desc.size()),
        Some(FULL_HD / 2)
    );
    ctx.assert_targets_balanced();
}

#[test]
fn downscaled_buffer_skips_bicubic_in_up_only_mode() {
    let mut frame = config(FULL_HD * 2, true);
    frame.bicubic_rescaling = BicubicRescalingMode::UpOnly;
    let (stack, ctx) = render_with(PostFxSettings::default(), frame);
    assert!(stack.last_report().rescaled);
    assert_eq!(ctx.floats("_CopyBicubic"), vec![0.0]);
}

#[test]
fn ssao_bloom_and_rescale_in_one_frame_stay_balanced() {
    let mut settings = bloom_settings(1.0);
    settings.ssao.enabled = true;
    let mut frame = config(FULL_HD / 2, true);
    frame.bicubic_rescaling = BicubicRescalingMode::UpAndDown;

    let (stack, ctx) = render_with(settings, frame);

    let report = stack.last_report();
    assert!(report.ssao && report.bloom && report.rescaled);
    let passes = ctx.passes();
    assert_eq!(passes[0], Pass::SsaoRaw);
    assert!(passes.contains(&Pass::BloomPrefilter));
    assert_eq!(passes.last(), Some(&Pass::FinalRescale));
    assert_eq!(ctx.acquired().len(), ctx.released().len());
    ctx.assert_targets_balanced();
    assert_eq!(ctx.events.len(), 1);
}

#[test]
fn stage_returns_to_idle() {
    let (stack, ctx) = render_with(bloom_settings(1.0), config(FULL_HD, true));
    assert_eq!(stack.stage(), PostFxStage::Idle);
    // The whole chain is flushed at once.
    assert_eq!(ctx.events.len(), 1);
}

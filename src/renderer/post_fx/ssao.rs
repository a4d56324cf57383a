//! SSAO Stage
//!
//! Three fullscreen passes at working resolution:
//!
//! 1. **Raw AO** (`R8Unorm`): hemisphere sampling against scene depth
//! 2. **Blur**: depth-aware bilateral blur removing the 4×4 noise pattern
//! 3. **Combine**: multiplies the source by the blurred AO into
//!    `_SSAOResult`, which replaces the source for the later stages

use std::sync::LazyLock;

use glam::UVec2;

use crate::renderer::command::{CommandBuffer, UniformSink};
use crate::renderer::post_fx::pass::{Pass, draw};
use crate::renderer::property::{PropertyId, RenderTargetId};
use crate::renderer::transient_pool::{RenderTextureDesc, color_format};
use crate::resources::{SsaoKernel, SsaoSettings};

const AO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

struct SsaoIds {
    kernel: PropertyId,
    noise: PropertyId,
    params: PropertyId,
    raw: PropertyId,
    blurred: PropertyId,
    texture: PropertyId,
    result: PropertyId,
}

static IDS: LazyLock<SsaoIds> = LazyLock::new(|| SsaoIds {
    kernel: PropertyId::new("_SSAOKernel"),
    noise: PropertyId::new("_SSAONoise"),
    params: PropertyId::new("_SSAOParams"),
    raw: PropertyId::new("_SSAORaw"),
    blurred: PropertyId::new("_SSAOBlurred"),
    texture: PropertyId::new("_SSAOTexture"),
    result: PropertyId::new("_SSAOResult"),
});

/// Target holding the occluded image; released by the caller.
#[must_use]
pub fn result_id() -> PropertyId {
    IDS.result
}

/// Records the SSAO passes, leaving `_SSAOResult` outstanding.
pub fn render(
    buffer: &mut CommandBuffer,
    source: RenderTargetId,
    settings: &SsaoSettings,
    kernel: &SsaoKernel,
    size: UVec2,
    use_hdr: bool,
) {
    buffer.begin_sample("SSAO");
    buffer.set_vector_array(IDS.kernel, &kernel.samples);
    buffer.set_vector_array(IDS.noise, &kernel.noise);
    buffer.set_vector(IDS.params, settings.params_vector());

    let ao_desc = RenderTextureDesc::color(size.x, size.y, AO_FORMAT);
    buffer.get_temporary_rt(IDS.raw, ao_desc);
    draw(buffer, source, IDS.raw, Pass::SsaoRaw);

    buffer.get_temporary_rt(IDS.blurred, ao_desc);
    draw(buffer, IDS.raw, IDS.blurred, Pass::SsaoBlur);
    buffer.release_temporary_rt(IDS.raw);

    buffer.set_global_texture(IDS.texture, IDS.blurred);
    buffer.get_temporary_rt(
        IDS.result,
        RenderTextureDesc::color(size.x, size.y, color_format(use_hdr)),
    );
    draw(buffer, source, IDS.result, Pass::SsaoCombine);
    buffer.release_temporary_rt(IDS.blurred);
    buffer.end_sample("SSAO");
}

//! Command Recording
//!
//! Every GPU-side effect of the pipeline is recorded as a [`Command`] into a
//! [`CommandBuffer`] and handed to the host through
//! [`RenderContext::execute_command_buffer`]. The buffer is cleared after each
//! hand-off, but its [`TransientTargets`] ledger persists so temporary targets
//! can be acquired in one flush and released in a later one.

use glam::{Mat4, Vec4};

use crate::renderer::context::RenderContext;
use crate::renderer::post_fx::pass::Pass;
use crate::renderer::property::{PropertyId, RenderTargetId};
use crate::renderer::transient_pool::{RenderTextureDesc, TransientTargets};
use crate::resources::Color;

/// Pixel-space viewport rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginSample(String),
    EndSample(String),
    GetTemporaryRt {
        id: PropertyId,
        desc: RenderTextureDesc,
    },
    ReleaseTemporaryRt(PropertyId),
    SetRenderTarget(RenderTargetId),
    ClearRenderTarget {
        depth: bool,
        color: bool,
        background: Color,
    },
    SetViewport(Rect),
    SetViewProjection {
        view: Mat4,
        projection: Mat4,
    },
    SetGlobalDepthBias {
        bias: f32,
        slope_bias: f32,
    },
    SetGlobalInt(PropertyId, i32),
    SetGlobalFloat(PropertyId, f32),
    SetGlobalVector(PropertyId, Vec4),
    SetGlobalVectorArray(PropertyId, Vec<Vec4>),
    SetGlobalMatrixArray(PropertyId, Vec<Mat4>),
    /// Raw bytes of a `#[repr(C)]` uniform block.
    SetGlobalConstantBuffer(PropertyId, Vec<u8>),
    SetGlobalTexture(PropertyId, RenderTargetId),
    EnableKeyword(&'static str),
    DisableKeyword(&'static str),
    /// Fullscreen triangle through the post-processing material.
    DrawProcedural(Pass),
}

// ============================================================================
// Uniform Sink
// ============================================================================

/// Destination for global shader state.
///
/// Uniform bundles such as
/// [`ShadowUniforms`](crate::renderer::shadows::uniforms::ShadowUniforms) upload
/// through this trait so they can be tested against any recorder.
pub trait UniformSink {
    fn set_int(&mut self, id: PropertyId, value: i32);
    fn set_float(&mut self, id: PropertyId, value: f32);
    fn set_vector(&mut self, id: PropertyId, value: Vec4);
    fn set_vector_array(&mut self, id: PropertyId, values: &[Vec4]);
    fn set_matrix_array(&mut self, id: PropertyId, values: &[Mat4]);
    fn set_constant_buffer(&mut self, id: PropertyId, bytes: &[u8]);
    fn set_keyword(&mut self, keyword: &'static str, enabled: bool);

    /// Enables at most one keyword of a mutually exclusive group and disables
    /// the rest.
    fn set_keyword_group(&mut self, keywords: &[&'static str], enabled: Option<usize>) {
        for (i, keyword) in keywords.iter().enumerate() {
            self.set_keyword(keyword, enabled == Some(i));
        }
    }
}

// ============================================================================
// Command Buffer
// ============================================================================

#[derive(Debug)]
pub struct CommandBuffer {
    name: String,
    commands: Vec<Command>,
    targets: TransientTargets,
}

impl CommandBuffer {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            targets: TransientTargets::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[must_use]
    pub fn targets(&self) -> &TransientTargets {
        &self.targets
    }

    /// Drops recorded commands. Outstanding targets stay on the ledger.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Hands the recorded commands to the host and clears the buffer.
    pub fn execute<C: RenderContext + ?Sized>(&mut self, ctx: &mut C) {
        ctx.execute_command_buffer(self);
        self.clear();
    }

    pub fn begin_sample(&mut self, name: &str) {
        self.commands.push(Command::BeginSample(name.to_owned()));
    }

    pub fn end_sample(&mut self, name: &str) {
        self.commands.push(Command::EndSample(name.to_owned()));
    }

    pub fn get_temporary_rt(&mut self, id: PropertyId, desc: RenderTextureDesc) {
        self.targets.acquire(id, desc);
        self.commands.push(Command::GetTemporaryRt { id, desc });
    }

    pub fn release_temporary_rt(&mut self, id: PropertyId) {
        self.targets.release(id);
        self.commands.push(Command::ReleaseTemporaryRt(id));
    }

    pub fn set_render_target(&mut self, target: impl Into<RenderTargetId>) {
        self.commands.push(Command::SetRenderTarget(target.into()));
    }

    pub fn clear_render_target(&mut self, depth: bool, color: bool, background: Color) {
        self.commands.push(Command::ClearRenderTarget {
            depth,
            color,
            background,
        });
    }

    pub fn set_viewport(&mut self, rect: Rect) {
        self.commands.push(Command::SetViewport(rect));
    }

    pub fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.commands.push(Command::SetViewProjection { view, projection });
    }

    pub fn set_global_depth_bias(&mut self, bias: f32, slope_bias: f32) {
        self.commands.push(Command::SetGlobalDepthBias { bias, slope_bias });
    }

    pub fn set_global_texture(&mut self, id: PropertyId, target: impl Into<RenderTargetId>) {
        self.commands.push(Command::SetGlobalTexture(id, target.into()));
    }

    pub fn draw_procedural(&mut self, pass: Pass) {
        self.commands.push(Command::DrawProcedural(pass));
    }
}

impl UniformSink for CommandBuffer {
    fn set_int(&mut self, id: PropertyId, value: i32) {
        self.commands.push(Command::SetGlobalInt(id, value));
    }

    fn set_float(&mut self, id: PropertyId, value: f32) {
        self.commands.push(Command::SetGlobalFloat(id, value));
    }

    fn set_vector(&mut self, id: PropertyId, value: Vec4) {
        self.commands.push(Command::SetGlobalVector(id, value));
    }

    fn set_vector_array(&mut self, id: PropertyId, values: &[Vec4]) {
        self.commands.push(Command::SetGlobalVectorArray(id, values.to_vec()));
    }

    fn set_matrix_array(&mut self, id: PropertyId, values: &[Mat4]) {
        self.commands.push(Command::SetGlobalMatrixArray(id, values.to_vec()));
    }

    fn set_constant_buffer(&mut self, id: PropertyId, bytes: &[u8]) {
        self.commands.push(Command::SetGlobalConstantBuffer(id, bytes.to_vec()));
    }

    fn set_keyword(&mut self, keyword: &'static str, enabled: bool) {
        self.commands.push(if enabled {
            Command::EnableKeyword(keyword)
        } else {
            Command::DisableKeyword(keyword)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_group_enables_one() {
        let mut buffer = CommandBuffer::new("test");
        buffer.set_keyword_group(&["_A", "_B", "_C"], Some(1));
        assert_eq!(
            buffer.commands(),
            &[
                Command::DisableKeyword("_A"),
                Command::EnableKeyword("_B"),
                Command::DisableKeyword("_C"),
            ]
        );
    }

    #[test]
    fn test_clear_keeps_ledger() {
        let mut buffer = CommandBuffer::new("test");
        let id = PropertyId::new("_CommandLedger");
        buffer.get_temporary_rt(id, RenderTextureDesc::shadow_map(1));
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.targets().contains(id));

        buffer.release_temporary_rt(id);
        assert!(buffer.targets().is_balanced());
    }
}

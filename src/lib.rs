//! A forward rendering pipeline with a shadow atlas and a post-processing
//! stack, recorded against host-engine traits.
//!
//! The host implements [`RenderContext`] and [`CullingResults`], builds a
//! [`RenderPipeline`] from [`PipelineSettings`], and calls
//! [`RenderPipeline::render`] once per frame.

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod settings;
pub mod utils;

pub use errors::{PipelineError, Result};
pub use renderer::{
    CameraRenderer, Command, CommandBuffer, CullingResults, Lighting, PostFxStack, PropertyId,
    RenderContext, RenderPipeline, RenderTargetId, ShadowData, Shadows, UniformSink,
};
pub use resources::{BloomSettings, PostFxSettings, ShadowSettings};
pub use scene::{Camera, CameraType, Light, LightType, PreviewContext, VisibleLight};
pub use settings::PipelineSettings;
pub use utils::interner;

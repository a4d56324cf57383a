//! Host Interfaces
//!
//! The pipeline never touches the GPU directly. It talks to the host engine
//! through two traits:
//!
//! - [`CullingResults`]: the per-camera culling snapshot, queried for visible
//!   lights, caster bounds and shadow matrices
//! - [`RenderContext`]: culls, executes recorded command buffers, draws
//!   geometry and submits the frame
//!
//! The remaining types are the plain-data arguments of those calls.

use bitflags::bitflags;
use glam::{Mat4, Vec3, Vec4};
use smallvec::SmallVec;

use crate::renderer::command::CommandBuffer;
use crate::scene::{Bounds, Camera, VisibleLight};

// ============================================================================
// Shadow Queries
// ============================================================================

/// Culling data for one shadow slice.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadowSplitData {
    /// Cascade culling sphere: `xyz` center, `w` radius.
    pub culling_sphere: Vec4,
    /// Fraction of the sphere in which casters already covered by the
    /// previous cascade are culled.
    pub shadow_cascade_blend_culling_factor: f32,
}

/// View, projection and split data of one shadow tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSlice {
    pub view: Mat4,
    pub projection: Mat4,
    pub split: ShadowSplitData,
}

/// Arguments of a directional cascade query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalShadowQuery {
    pub visible_light_index: usize,
    pub cascade_index: u32,
    pub cascade_count: u32,
    pub ratios: Vec3,
    pub tile_size: u32,
    pub near_plane_offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubemapFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubemapFace {
    pub const ALL: [Self; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowProjection {
    Orthographic,
    Perspective,
}

/// What to draw into the currently bound shadow tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowDrawingSettings {
    pub visible_light_index: usize,
    pub projection: ShadowProjection,
    pub use_rendering_layer_mask_test: bool,
    pub split: ShadowSplitData,
}

impl ShadowDrawingSettings {
    #[must_use]
    pub fn new(visible_light_index: usize, projection: ShadowProjection) -> Self {
        Self {
            visible_light_index,
            projection,
            use_rendering_layer_mask_test: true,
            split: ShadowSplitData::default(),
        }
    }
}

/// Per-camera culling snapshot provided by the host.
pub trait CullingResults {
    fn visible_lights(&self) -> &[VisibleLight];

    /// `None` when the light has no shadow casters inside the shadow distance.
    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Bounds>;

    fn compute_directional_shadow_matrices(&self, query: &DirectionalShadowQuery) -> ShadowSlice;

    fn compute_spot_shadow_matrices(&self, visible_light_index: usize) -> ShadowSlice;

    /// `fov_bias` widens the cube face frustum, in degrees.
    fn compute_point_shadow_matrices(
        &self,
        visible_light_index: usize,
        face: CubemapFace,
        fov_bias: f32,
    ) -> ShadowSlice;

    /// Mapping from visible-light index to per-object light index. May be
    /// longer than the visible-light list.
    fn light_index_map(&self) -> Vec<i32>;

    fn set_light_index_map(&mut self, map: Vec<i32>);
}

// ============================================================================
// Geometry Drawing
// ============================================================================

bitflags! {
    /// Per-object data the host must provide to lit shaders.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PerObjectData: u32 {
        const LIGHT_PROBE = 1 << 0;
        const REFLECTION_PROBES = 1 << 1;
        const LIGHT_PROBE_PROXY_VOLUME = 1 << 2;
        const LIGHTMAPS = 1 << 3;
        const LIGHT_DATA = 1 << 4;
        const LIGHT_INDICES = 1 << 5;
        const OCCLUSION_PROBE = 1 << 6;
        const OCCLUSION_PROBE_PROXY_VOLUME = 1 << 7;
        const SHADOW_MASK = 1 << 8;
    }
}

impl PerObjectData {
    /// Baked lighting inputs every lit object receives.
    pub const BAKED_GI: Self = Self::REFLECTION_PROBES
        .union(Self::LIGHTMAPS)
        .union(Self::SHADOW_MASK)
        .union(Self::LIGHT_PROBE)
        .union(Self::OCCLUSION_PROBE)
        .union(Self::LIGHT_PROBE_PROXY_VOLUME)
        .union(Self::OCCLUSION_PROBE_PROXY_VOLUME);

    pub const LIGHTS_PER_OBJECT: Self = Self::LIGHT_DATA.union(Self::LIGHT_INDICES);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortingCriteria {
    /// Front to back, grouped by material.
    CommonOpaque,
    /// Back to front.
    CommonTransparent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderQueueRange {
    Opaque,
    Transparent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawingSettings {
    /// Shader pass tags, in priority order.
    pub shader_passes: SmallVec<[&'static str; 2]>,
    pub sorting: SortingCriteria,
    pub enable_dynamic_batching: bool,
    pub enable_instancing: bool,
    /// Lets the host batch draws sharing a shader variant through persistent
    /// per-material buffers.
    pub enable_srp_batcher: bool,
    pub per_object_data: PerObjectData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilteringSettings {
    pub render_queue_range: RenderQueueRange,
}

// ============================================================================
// Render Context
// ============================================================================

/// The host engine's rendering entry points for one frame.
pub trait RenderContext {
    type Culling: CullingResults;

    /// `None` when the camera cannot be culled this frame (degenerate
    /// viewport, disabled camera).
    fn cull(&mut self, camera: &Camera, shadow_distance: f32) -> Option<Self::Culling>;

    fn setup_camera_properties(&mut self, camera: &Camera);

    fn execute_command_buffer(&mut self, buffer: &CommandBuffer);

    fn draw_shadows(&mut self, culling: &Self::Culling, settings: &ShadowDrawingSettings);

    fn draw_renderers(
        &mut self,
        culling: &Self::Culling,
        drawing: &DrawingSettings,
        filtering: &FilteringSettings,
    );

    fn draw_skybox(&mut self, camera: &Camera);

    fn submit(&mut self);

    /// Whether the device's depth buffer runs 1 → 0.
    fn uses_reversed_z_buffer(&self) -> bool;
}

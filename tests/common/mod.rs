//! Recording host shared by the integration tests.
//!
//! [`MockContext`] stores every call the pipeline makes as an [`Event`];
//! [`MockCulling`] answers shadow queries with simple fixed matrices.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;

use glam::{Mat4, Vec3, Vec4};

use custom_rp::renderer::command::Command;
use custom_rp::renderer::context::{
    CubemapFace, CullingResults, DirectionalShadowQuery, DrawingSettings, FilteringSettings,
    RenderContext, ShadowDrawingSettings, ShadowSlice, ShadowSplitData,
};
use custom_rp::renderer::post_fx::pass::Pass;
use custom_rp::renderer::transient_pool::RenderTextureDesc;
use custom_rp::renderer::{CommandBuffer, PropertyId, RenderTargetId};
use custom_rp::scene::light::LightShadows;
use custom_rp::scene::{Bounds, Camera, Light, LightType, VisibleLight};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Lights
// ============================================================================

pub fn directional(strength: f32) -> VisibleLight {
    VisibleLight {
        light: Light::new(LightType::Directional).with_shadows(LightShadows::Soft, strength),
        final_color: Vec4::ONE,
        local_to_world: Mat4::IDENTITY,
        range: 0.0,
    }
}

pub fn spot(strength: f32) -> VisibleLight {
    VisibleLight {
        light: Light::new(LightType::Spot).with_shadows(LightShadows::Hard, strength),
        final_color: Vec4::ONE,
        local_to_world: Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)),
        range: 10.0,
    }
}

pub fn point(strength: f32) -> VisibleLight {
    VisibleLight {
        light: Light::new(LightType::Point).with_shadows(LightShadows::Soft, strength),
        final_color: Vec4::ONE,
        local_to_world: Mat4::from_translation(Vec3::new(2.0, 1.0, 0.0)),
        range: 5.0,
    }
}

// ============================================================================
// Culling
// ============================================================================

#[derive(Debug, Clone)]
pub struct MockCulling {
    pub lights: Vec<VisibleLight>,
    /// Visible-light indices reported as having no casters.
    pub lights_without_casters: Vec<usize>,
    pub index_map: Vec<i32>,
    /// Radius of cascade 0; cascade `i` gets `radius * (i + 1)`.
    pub cascade_radius: f32,
    pub last_point_fov_bias: Cell<Option<f32>>,
}

impl Default for MockCulling {
    fn default() -> Self {
        Self {
            lights: Vec::new(),
            lights_without_casters: Vec::new(),
            index_map: Vec::new(),
            cascade_radius: 10.0,
            last_point_fov_bias: Cell::new(None),
        }
    }
}

impl MockCulling {
    pub fn with_lights(lights: Vec<VisibleLight>) -> Self {
        Self {
            lights,
            ..Self::default()
        }
    }
}

impl CullingResults for MockCulling {
    fn visible_lights(&self) -> &[VisibleLight] {
        &self.lights
    }

    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Bounds> {
        (!self.lights_without_casters.contains(&visible_light_index)).then_some(Bounds {
            center: Vec3::ZERO,
            extents: Vec3::ONE,
        })
    }

    fn compute_directional_shadow_matrices(&self, query: &DirectionalShadowQuery) -> ShadowSlice {
        let radius = self.cascade_radius * (query.cascade_index + 1) as f32;
        ShadowSlice {
            view: Mat4::look_at_rh(Vec3::new(0.0, 20.0, 0.0), Vec3::ZERO, Vec3::Z),
            projection: Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.0, 2.0 * radius),
            split: ShadowSplitData {
                culling_sphere: Vec4::new(0.0, 0.0, 0.0, radius),
                shadow_cascade_blend_culling_factor: 0.0,
            },
        }
    }

    fn compute_spot_shadow_matrices(&self, _visible_light_index: usize) -> ShadowSlice {
        ShadowSlice {
            view: Mat4::look_at_rh(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO, Vec3::Z),
            projection: Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 10.0),
            split: ShadowSplitData::default(),
        }
    }

    fn compute_point_shadow_matrices(
        &self,
        _visible_light_index: usize,
        _face: CubemapFace,
        fov_bias: f32,
    ) -> ShadowSlice {
        self.last_point_fov_bias.set(Some(fov_bias));
        ShadowSlice {
            view: Mat4::look_at_rh(Vec3::new(2.0, 1.0, 0.0), Vec3::new(3.0, 1.0, 0.0), Vec3::Y),
            projection: Mat4::perspective_rh((90.0 + fov_bias).to_radians(), 1.0, 0.1, 5.0),
            split: ShadowSplitData::default(),
        }
    }

    fn light_index_map(&self) -> Vec<i32> {
        self.index_map.clone()
    }

    fn set_light_index_map(&mut self, map: Vec<i32>) {
        self.index_map = map;
    }
}

// ============================================================================
// Context
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Cull { camera: String, shadow_distance: f32 },
    SetupCamera(String),
    Execute { buffer: String, commands: Vec<Command> },
    DrawShadows(ShadowDrawingSettings),
    DrawRenderers { drawing: DrawingSettings, filtering: FilteringSettings },
    DrawSkybox(String),
    Submit,
}

#[derive(Debug, Default)]
pub struct MockContext {
    /// Cloned into every successful cull.
    pub culling: MockCulling,
    pub cull_fails: bool,
    pub reversed_z: bool,
    pub events: Vec<Event>,
}

impl MockContext {
    pub fn with_lights(lights: Vec<VisibleLight>) -> Self {
        Self {
            culling: MockCulling::with_lights(lights),
            ..Self::default()
        }
    }

    /// Every executed command, in execution order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.events.iter().flat_map(|event| match event {
            Event::Execute { commands, .. } => commands.as_slice(),
            _ => &[],
        })
    }

    pub fn acquired(&self) -> Vec<PropertyId> {
        self.commands()
            .filter_map(|command| match command {
                Command::GetTemporaryRt { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn released(&self) -> Vec<PropertyId> {
        self.commands()
            .filter_map(|command| match command {
                Command::ReleaseTemporaryRt(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Descriptor of the first acquisition of `name`.
    pub fn acquired_desc(&self, name: &str) -> Option<RenderTextureDesc> {
        let id = PropertyId::new(name);
        self.commands().find_map(|command| match command {
            Command::GetTemporaryRt { id: key, desc } if *key == id => Some(*desc),
            _ => None,
        })
    }

    pub fn passes(&self) -> Vec<Pass> {
        self.commands()
            .filter_map(|command| match command {
                Command::DrawProcedural(pass) => Some(*pass),
                _ => None,
            })
            .collect()
    }

    pub fn shadow_draws(&self) -> Vec<ShadowDrawingSettings> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::DrawShadows(settings) => Some(*settings),
                _ => None,
            })
            .collect()
    }

    pub fn last_int(&self, name: &str) -> Option<i32> {
        let id = PropertyId::new(name);
        self.commands()
            .filter_map(|command| match command {
                Command::SetGlobalInt(key, value) if *key == id => Some(*value),
                _ => None,
            })
            .last()
    }

    pub fn floats(&self, name: &str) -> Vec<f32> {
        let id = PropertyId::new(name);
        self.commands()
            .filter_map(|command| match command {
                Command::SetGlobalFloat(key, value) if *key == id => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn last_vector(&self, name: &str) -> Option<Vec4> {
        let id = PropertyId::new(name);
        self.commands()
            .filter_map(|command| match command {
                Command::SetGlobalVector(key, value) if *key == id => Some(*value),
                _ => None,
            })
            .last()
    }

    pub fn last_vector_array(&self, name: &str) -> Option<Vec<Vec4>> {
        let id = PropertyId::new(name);
        self.commands()
            .filter_map(|command| match command {
                Command::SetGlobalVectorArray(key, values) if *key == id => Some(values.clone()),
                _ => None,
            })
            .last()
    }

    pub fn last_matrix_array(&self, name: &str) -> Option<Vec<Mat4>> {
        let id = PropertyId::new(name);
        self.commands()
            .filter_map(|command| match command {
                Command::SetGlobalMatrixArray(key, values) if *key == id => Some(values.clone()),
                _ => None,
            })
            .last()
    }

    pub fn last_constant_buffer(&self, name: &str) -> Option<Vec<u8>> {
        let id = PropertyId::new(name);
        self.commands()
            .filter_map(|command| match command {
                Command::SetGlobalConstantBuffer(key, bytes) if *key == id => Some(bytes.clone()),
                _ => None,
            })
            .last()
    }

    pub fn texture_binding(&self, name: &str) -> Option<RenderTargetId> {
        let id = PropertyId::new(name);
        self.commands()
            .filter_map(|command| match command {
                Command::SetGlobalTexture(key, target) if *key == id => Some(*target),
                _ => None,
            })
            .last()
    }

    /// Final enabled state of every keyword touched so far.
    pub fn keywords(&self) -> HashMap<&'static str, bool> {
        let mut state = HashMap::new();
        for command in self.commands() {
            match command {
                Command::EnableKeyword(keyword) => {
                    state.insert(*keyword, true);
                }
                Command::DisableKeyword(keyword) => {
                    state.insert(*keyword, false);
                }
                _ => {}
            }
        }
        state
    }

    pub fn keyword_enabled(&self, keyword: &str) -> bool {
        self.keywords().get(keyword).copied().unwrap_or(false)
    }

    /// Panics on a release without a matching acquire, or when anything is
    /// still outstanding.
    pub fn assert_targets_balanced(&self) {
        let mut outstanding: HashMap<PropertyId, usize> = HashMap::new();
        for command in self.commands() {
            match command {
                Command::GetTemporaryRt { id, .. } => *outstanding.entry(*id).or_default() += 1,
                Command::ReleaseTemporaryRt(id) => {
                    let count = outstanding
                        .get_mut(id)
                        .unwrap_or_else(|| panic!("{id} released without being acquired"));
                    *count -= 1;
                    if *count == 0 {
                        outstanding.remove(id);
                    }
                }
                _ => {}
            }
        }
        assert!(outstanding.is_empty(), "targets still outstanding: {outstanding:?}");
    }
}

impl RenderContext for MockContext {
    type Culling = MockCulling;

    fn cull(&mut self, camera: &Camera, shadow_distance: f32) -> Option<MockCulling> {
        self.events.push(Event::Cull {
            camera: camera.name.clone(),
            shadow_distance,
        });
        (!self.cull_fails).then(|| self.culling.clone())
    }

    fn setup_camera_properties(&mut self, camera: &Camera) {
        self.events.push(Event::SetupCamera(camera.name.clone()));
    }

    fn execute_command_buffer(&mut self, buffer: &CommandBuffer) {
        self.events.push(Event::Execute {
            buffer: buffer.name().to_string(),
            commands: buffer.commands().to_vec(),
        });
    }

    fn draw_shadows(&mut self, _culling: &MockCulling, settings: &ShadowDrawingSettings) {
        self.events.push(Event::DrawShadows(*settings));
    }

    fn draw_renderers(
        &mut self,
        _culling: &MockCulling,
        drawing: &DrawingSettings,
        filtering: &FilteringSettings,
    ) {
        self.events.push(Event::DrawRenderers {
            drawing: drawing.clone(),
            filtering: *filtering,
        });
    }

    fn draw_skybox(&mut self, camera: &Camera) {
        self.events.push(Event::DrawSkybox(camera.name.clone()));
    }

    fn submit(&mut self) {
        self.events.push(Event::Submit);
    }

    fn uses_reversed_z_buffer(&self) -> bool {
        self.reversed_z
    }
}

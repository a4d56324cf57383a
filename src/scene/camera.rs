//! Host camera snapshot.
//!
//! The pipeline never owns cameras; the host passes a [`Camera`] describing the
//! view being rendered this frame.

use glam::UVec2;
use serde::{Deserialize, Serialize};

use crate::resources::Color;

/// What a camera renders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraType {
    /// A regular in-game camera.
    #[default]
    Game,
    /// The interactive editor scene view.
    SceneView,
    /// Asset preview thumbnails.
    Preview,
    /// Reflection probe capture.
    Reflection,
    /// Stereo rendering eye.
    Vr,
}

impl CameraType {
    /// Only game and scene-view cameras produce an image a person looks at;
    /// the others skip post-processing.
    #[inline]
    #[must_use]
    pub fn produces_final_output(self) -> bool {
        matches!(self, Self::Game | Self::SceneView)
    }
}

/// Camera clear behaviour, ordered from "clears most" to "clears nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ClearFlags {
    #[default]
    Skybox,
    Color,
    Depth,
    Nothing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub name: String,
    pub camera_type: CameraType,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub allow_hdr: bool,
    pub clear_flags: ClearFlags,
    pub background_color: Color,
    pub far_clip_plane: f32,
}

impl Camera {
    #[must_use]
    pub fn new(name: impl Into<String>, pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            name: name.into(),
            camera_type: CameraType::Game,
            pixel_width,
            pixel_height,
            allow_hdr: true,
            clear_flags: ClearFlags::Skybox,
            background_color: Color::BLACK,
            far_clip_plane: 1000.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn pixel_size(&self) -> UVec2 {
        UVec2::new(self.pixel_width, self.pixel_height)
    }
}

/// Interactive-editor state, evaluated once per camera at setup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewContext {
    /// The frame is rendered inside an interactive editor.
    pub is_interactive_preview: bool,
    /// The editor's scene view has image effects switched on. Only read
    /// when `is_interactive_preview` is set.
    pub show_image_effects: bool,
}

impl Default for PreviewContext {
    fn default() -> Self {
        Self {
            is_interactive_preview: false,
            show_image_effects: true,
        }
    }
}

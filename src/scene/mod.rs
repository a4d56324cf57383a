//! Host scene data consumed by the pipeline: cameras and visible lights.

pub mod camera;
pub mod light;

pub use camera::{Camera, CameraType, ClearFlags, PreviewContext};
pub use light::{
    Bounds, Light, LightBakingOutput, LightShadows, LightType, LightmapBakeType,
    MixedLightingMode, VisibleLight,
};

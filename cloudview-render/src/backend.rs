//! Rendering backend contract

use nalgebra::{Matrix4, Vector3};

use cloudview_core::{ColoredPoint3f, Result};

/// Camera state pushed to the backend once per frame
#[derive(Debug, Clone, Copy)]
pub struct CameraMatrices {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub position: Vector3<f32>,
}

/// Contract between the lifecycle manager and the rendering engine
///
/// The manager only ever talks to the engine through these six calls;
/// everything GPU-side (buffers, pipelines, surface state) stays behind
/// the implementation.
pub trait RenderBackend {
    /// Resize the drawable target
    fn resize(&mut self, width: u32, height: u32);

    /// Push camera matrices for subsequent draws
    fn set_camera(&mut self, camera: &CameraMatrices);

    /// Upload a cloud, replacing any previously attached one
    fn attach_cloud(&mut self, points: &[ColoredPoint3f]) -> Result<()>;

    /// Release the attached cloud's GPU resources
    fn detach_cloud(&mut self);

    /// Refresh per-frame state of the attached cloud (re-uploads when
    /// render settings changed since the last frame)
    fn refresh(&mut self) -> Result<()>;

    /// Draw the current frame
    fn draw(&mut self) -> Result<()>;
}

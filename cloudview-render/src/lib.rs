//! Point cloud rendering for cloudview
//!
//! This crate is the rendering-engine side of the viewer: the
//! [`RenderBackend`] contract the lifecycle manager drives, and its wgpu
//! implementation [`PointSurface`] (surface management, one point
//! pipeline, camera uniform, depth buffer, point-budget capped uploads).

pub mod backend;
pub mod context;
pub mod surface;

pub use backend::*;
pub use context::*;
pub use surface::*;

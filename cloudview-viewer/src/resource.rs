//! Attached point cloud resource

use cloudview_core::{Aabb, Pose};

/// Handle to the point cloud currently attached to the surface
///
/// The GPU-side buffers live inside the render backend; this is the
/// metadata the manager and UI shells read. At most one resource is
/// live per manager.
#[derive(Debug, Clone)]
pub struct CloudResource {
    pub name: String,
    pub point_count: usize,
    pub bounds: Option<Aabb>,
    pub visible: bool,
    pub pose: Pose,
}

impl CloudResource {
    /// Create a visible resource with an identity pose
    pub fn new(name: impl Into<String>, point_count: usize, bounds: Option<Aabb>) -> Self {
        Self {
            name: name.into(),
            point_count,
            bounds,
            visible: true,
            pose: Pose::identity(),
        }
    }
}

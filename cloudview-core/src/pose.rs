//! Display pose for attached resources

use nalgebra::{Matrix4, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::point::Vector3f;

/// Position, orientation and scale of a displayed object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub translation: Vector3f,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3f,
}

impl Pose {
    /// Create an identity pose
    pub fn identity() -> Self {
        Self {
            translation: Vector3f::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3f::new(1.0, 1.0, 1.0),
        }
    }

    /// Create a pose from a translation only
    pub fn from_translation(translation: Vector3f) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Build the homogeneous model matrix for this pose
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// Check if this is approximately the identity pose
    pub fn is_identity(&self, epsilon: f32) -> bool {
        (self.to_matrix() - Matrix4::identity()).norm() < epsilon
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_matrix() {
        let pose = Pose::identity();
        assert!(pose.is_identity(1e-6));
    }

    #[test]
    fn translation_lands_in_last_column() {
        let pose = Pose::from_translation(Vector3f::new(1.0, 2.0, 3.0));
        let matrix = pose.to_matrix();
        assert_eq!(matrix[(0, 3)], 1.0);
        assert_eq!(matrix[(1, 3)], 2.0);
        assert_eq!(matrix[(2, 3)], 3.0);
    }
}

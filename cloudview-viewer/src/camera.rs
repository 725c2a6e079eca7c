//! Camera utilities for 3D viewing

use nalgebra::{Matrix4, Perspective3, Point3, Unit, UnitQuaternion, Vector3};

/// A perspective camera for viewing point clouds
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far);
        perspective.into_inner()
    }

    /// Rotate the camera around the target by yaw/pitch deltas (radians)
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        let offset = self.position - self.target;
        let radius = offset.norm();
        if radius < 1e-6 {
            return;
        }

        let yaw = UnitQuaternion::from_axis_angle(&Unit::new_normalize(self.up), -delta_yaw);
        let mut direction = yaw * (offset / radius);

        let right = direction.cross(&self.up);
        if right.norm() > 1e-6 {
            let pitch =
                UnitQuaternion::from_axis_angle(&Unit::new_normalize(right), -delta_pitch);
            let pitched = pitch * direction;
            // Clamp pitch so the camera never flips over the poles
            if pitched.dot(&self.up.normalize()).abs() < 0.99 {
                direction = pitched;
            }
        }

        self.position = self.target + direction * radius;
    }

    /// Move toward (positive delta) or away from the target
    pub fn zoom(&mut self, delta: f32) {
        let offset = self.position - self.target;
        let scale = (1.0 - delta).clamp(0.1, 10.0);
        let scaled = offset * scale;
        if scaled.norm() > self.near * 2.0 {
            self.position = self.target + scaled;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(0.0, 0.0, 1000.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            60.0_f32.to_radians(),
            800.0 / 600.0,
            0.1,
            10000.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn orbit_preserves_distance_to_target() {
        let mut camera = Camera::default();
        let radius = (camera.position - camera.target).norm();

        camera.orbit(0.3, 0.2);
        assert_relative_eq!(
            (camera.position - camera.target).norm(),
            radius,
            epsilon = 1e-3
        );
    }

    #[test]
    fn zoom_moves_along_view_axis() {
        let mut camera = Camera::default();
        camera.zoom(0.5);
        assert_relative_eq!(camera.position.z, 500.0, epsilon = 1e-3);
        assert_eq!(camera.target, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn zoom_stops_short_of_the_target() {
        let mut camera = Camera::default();
        for _ in 0..200 {
            camera.zoom(0.9);
        }
        assert!((camera.position - camera.target).norm() > camera.near);
    }
}

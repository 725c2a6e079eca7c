//! Camera framing from bounding volumes

use cloudview_core::{Aabb, Point3f};

/// A computed camera placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    pub position: Point3f,
    pub look_at: Point3f,
}

/// Fixed placement used when a cloud exposes no bounding information
pub fn default_framing() -> Framing {
    Framing {
        position: Point3f::new(0.0, 0.0, 1000.0),
        look_at: Point3f::origin(),
    }
}

/// Fit a bounding box into view
///
/// Places the camera on the +Z axis through the box center at distance
/// `|max_dim / 2 / tan(fov / 2)|`, looking at the center. This is a
/// fit-to-view heuristic, not a minimal bounding-sphere fit; a box that
/// is wide but shallow still frames by its largest extent.
pub fn compute_framing(bounds: &Aabb, vertical_fov: f32) -> Framing {
    let center = bounds.center();
    let max_dim = bounds.max_dimension();
    let distance = (max_dim / 2.0 / (vertical_fov / 2.0).tan()).abs();

    Framing {
        position: Point3f::new(center.x, center.y, center.z + distance),
        look_at: center,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cloudview_core::Vector3;

    fn centered_box(size: f32) -> Aabb {
        let half = size / 2.0;
        Aabb::new(
            Point3f::new(-half, -half, -half),
            Point3f::new(half, half, half),
        )
    }

    #[test]
    fn frames_unit_cube_at_sixty_degrees() {
        // 100-unit cube at 60 degrees: distance = 50 / tan(30) = 86.6
        let framing = compute_framing(&centered_box(100.0), 60.0_f32.to_radians());

        assert_relative_eq!(framing.position.x, 0.0);
        assert_relative_eq!(framing.position.y, 0.0);
        assert_relative_eq!(framing.position.z, 86.60254, epsilon = 1e-3);
        assert_eq!(framing.look_at, Point3f::origin());
    }

    #[test]
    fn framing_is_offset_by_box_center() {
        let bounds = Aabb::new(Point3f::new(10.0, 20.0, 30.0), Point3f::new(30.0, 40.0, 50.0));
        let framing = compute_framing(&bounds, 90.0_f32.to_radians());

        // 20-unit box at 90 degrees: distance = 10 / tan(45) = 10
        assert_eq!(framing.look_at, Point3f::new(20.0, 30.0, 40.0));
        assert_relative_eq!(framing.position.z, 50.0, epsilon = 1e-4);
    }

    #[test]
    fn largest_axis_wins() {
        let bounds = Aabb::new(
            Point3f::origin(),
            Point3f::origin() + Vector3::new(100.0, 1.0, 1.0),
        );
        let wide = compute_framing(&bounds, 60.0_f32.to_radians());
        let cube = compute_framing(&centered_box(100.0), 60.0_f32.to_radians());

        let wide_distance = wide.position.z - wide.look_at.z;
        let cube_distance = cube.position.z - cube.look_at.z;
        assert_relative_eq!(wide_distance, cube_distance, epsilon = 1e-3);
    }

    #[test]
    fn degenerate_box_frames_at_its_center() {
        let bounds = Aabb::new(Point3f::new(5.0, 5.0, 5.0), Point3f::new(5.0, 5.0, 5.0));
        let framing = compute_framing(&bounds, 60.0_f32.to_radians());
        assert_eq!(framing.position, Point3f::new(5.0, 5.0, 5.0));
        assert_eq!(framing.look_at, framing.position);
    }
}

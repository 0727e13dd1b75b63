/// Perspective camera and screen projection
use nalgebra::{Matrix4, Point3, Vector3};

use crate::config::CameraConfig;

/// A projected point in surface pixels; `depth` is NDC z in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

/// Perspective camera looking at `target`.
///
/// The projection matrix is cached; call [`update_projection_matrix`]
/// after changing `fov_degrees`, `aspect`, `near` or `far`.
///
/// [`update_projection_matrix`]: PerspectiveCamera::update_projection_matrix
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Point3::origin(),
            target: Point3::origin(),
            up: Vector3::y(),
            fov_degrees,
            aspect,
            near,
            far,
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Camera placed `distance` units down +Z, facing the origin
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self::new(config.fov_degrees, aspect, config.near, config.far);
        camera.position = Point3::new(0.0, 0.0, config.distance);
        camera
    }

    /// Rebuild the projection from the current fields. A zero or
    /// non-finite aspect is treated as square.
    pub fn update_projection_matrix(&mut self) {
        let aspect = if self.aspect.is_finite() && self.aspect > 0.0 {
            self.aspect
        } else {
            1.0
        };
        self.projection =
            Matrix4::new_perspective(aspect, self.fov_degrees.to_radians(), self.near, self.far);
    }

    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    /// Project a world-space point onto a `width` x `height` surface.
    ///
    /// Returns `None` for points at or behind the camera plane.
    pub fn project(
        &self,
        view_projection: &Matrix4<f32>,
        point: &Point3<f32>,
        width: f32,
        height: f32,
    ) -> Option<ScreenPoint> {
        let clip = view_projection * point.to_homogeneous();
        if clip.w <= 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        Some(ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * width,
            y: (1.0 - ndc.y) * 0.5 * height,
            depth: ndc.z,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_from_config() {
        let camera = PerspectiveCamera::from_config(&CameraConfig::default(), 800.0 / 600.0);
        assert_eq!(camera.fov_degrees, 50.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 5.0));
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_projection_tracks_aspect_after_update() {
        let mut camera = PerspectiveCamera::new(50.0, 1.0, 0.1, 1000.0);
        camera.aspect = 2.0;
        let stale = *camera.projection_matrix();
        camera.update_projection_matrix();

        let expected = Matrix4::new_perspective(2.0, 50f32.to_radians(), 0.1, 1000.0);
        assert_ne!(stale, expected);
        assert_relative_eq!(*camera.projection_matrix(), expected);
    }

    #[test]
    fn test_degenerate_aspect_builds_square_projection() {
        let mut camera = PerspectiveCamera::new(50.0, 1.0, 0.1, 1000.0);
        let square = *camera.projection_matrix();
        for aspect in [0.0, -3.0, f32::NAN] {
            camera.aspect = aspect;
            camera.update_projection_matrix();
            assert_relative_eq!(*camera.projection_matrix(), square);
        }
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = PerspectiveCamera::from_config(&CameraConfig::default(), 1.0);
        let vp = camera.view_projection();
        let p = camera.project(&vp, &Point3::origin(), 200.0, 100.0).unwrap();
        assert_relative_eq!(p.x, 100.0, epsilon = 1e-4);
        assert_relative_eq!(p.y, 50.0, epsilon = 1e-4);
        assert!(p.depth > -1.0 && p.depth < 1.0);
    }

    #[test]
    fn test_points_behind_camera_are_rejected() {
        let camera = PerspectiveCamera::from_config(&CameraConfig::default(), 1.0);
        let vp = camera.view_projection();
        assert!(camera.project(&vp, &Point3::new(0.0, 0.0, 10.0), 100.0, 100.0).is_none());
    }
}

/// Node transforms for the scene graph
use nalgebra::{Matrix4, Vector3};

/// Position, Euler rotation (radians, applied X then Y then Z) and scale of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl NodeTransform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::repeat(1.0),
        }
    }

    /// Rotation matrix for the XYZ Euler order
    pub fn rotation_matrix(&self) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(self.rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, self.rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, self.rotation.z));
        rx * ry * rz
    }

    /// Local matrix: translate * rotate * scale
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.position)
            * self.rotation_matrix()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// Multiply the current scale by a uniform factor
    pub fn scale_uniformly(&mut self, factor: f32) {
        self.scale *= factor;
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_identity_matrix() {
        let transform = NodeTransform::identity();
        assert!((transform.matrix() - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_scale_applies_before_translation() {
        let mut transform = NodeTransform::identity();
        transform.scale_uniformly(0.5);
        transform.position = Vector3::new(1.0, 0.0, 0.0);

        let p = transform.matrix().transform_point(&Point3::new(2.0, 2.0, 2.0));
        assert_relative_eq!(p, Point3::new(2.0, 1.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_yaw_turns_x_toward_negative_z() {
        let mut transform = NodeTransform::identity();
        transform.rotation.y = std::f32::consts::FRAC_PI_2;

        let p = transform.matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }
}

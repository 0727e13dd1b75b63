/// Screen-space triangle preparation shared by every render surface
///
/// Surfaces only differ in how they fill triangles (character cells, canvas
/// paths), so projection, lighting and culling live here.
use nalgebra::{Matrix4, Point3};

use crate::geometry::face_normal;
use crate::projection::{PerspectiveCamera, ScreenPoint};
use crate::scene::Scene;

/// A projected triangle with its flat shade in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedTriangle {
    pub points: [ScreenPoint; 3],
    pub shade: f32,
}

impl ShadedTriangle {
    /// Mean NDC depth, for painter's-order sorting
    pub fn depth(&self) -> f32 {
        self.points.iter().map(|p| p.depth).sum::<f32>() / 3.0
    }

    /// Counter-clockwise on screen. Screen y grows downwards, so the signed
    /// area test is flipped.
    pub fn is_front_facing(&self) -> bool {
        let [a, b, c] = self.points;
        (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x) < 0.0
    }
}

/// Project and light the model in `scene` for a `width` x `height` target.
///
/// Triangles with a vertex behind the camera are dropped. Back faces are
/// kept; culling is left to the surface.
pub fn shade_scene(
    scene: &Scene,
    camera: &PerspectiveCamera,
    width: f32,
    height: f32,
) -> Vec<ShadedTriangle> {
    let Some(model) = scene.model() else {
        return Vec::new();
    };

    let model_matrix = model.transform.matrix();
    let world = scene.matrix();
    let view_projection = camera.view_projection();
    let peak = scene.peak_irradiance();

    let mut shaded = Vec::with_capacity(model.mesh.triangles.len());
    for triangle in &model.mesh.triangles {
        let local: [Point3<f32>; 3] = [
            model_matrix.transform_point(&triangle.vertices[0].position),
            model_matrix.transform_point(&triangle.vertices[1].position),
            model_matrix.transform_point(&triangle.vertices[2].position),
        ];

        if let Some(points) = project_all(camera, &view_projection, &world, &local, width, height) {
            let normal = face_normal(&local[0], &local[1], &local[2]);
            let shade = (scene.illuminate(&normal).luminance() / peak).clamp(0.0, 1.0);
            shaded.push(ShadedTriangle { points, shade });
        }
    }
    shaded
}

fn project_all(
    camera: &PerspectiveCamera,
    view_projection: &Matrix4<f32>,
    world: &Matrix4<f32>,
    local: &[Point3<f32>; 3],
    width: f32,
    height: f32,
) -> Option<[ScreenPoint; 3]> {
    let mut points = [ScreenPoint::default(); 3];
    for (out, point) in points.iter_mut().zip(local) {
        *out = camera.project(view_projection, &world.transform_point(point), width, height)?;
    }
    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, LightingConfig};
    use crate::geometry::Mesh;
    use crate::lighting::Light;
    use crate::scene::ModelNode;
    use nalgebra::Vector3;

    fn scene_with_cube() -> Scene {
        let mut scene = Scene::new(Light::rig(&LightingConfig::default()));
        let mut node = ModelNode::new(Mesh::cuboid(Point3::origin(), Vector3::repeat(1.0)));
        node.normalize(3.0).unwrap();
        scene.set_model(node);
        scene
    }

    #[test]
    fn empty_scene_produces_nothing() {
        let scene = Scene::new(Light::rig(&LightingConfig::default()));
        let camera = PerspectiveCamera::from_config(&CameraConfig::default(), 1.0);
        assert!(shade_scene(&scene, &camera, 100.0, 100.0).is_empty());
    }

    #[test]
    fn cube_faces_are_projected_and_lit() {
        let scene = scene_with_cube();
        let camera = PerspectiveCamera::from_config(&CameraConfig::default(), 1.0);
        let triangles = shade_scene(&scene, &camera, 100.0, 100.0);

        assert_eq!(triangles.len(), 12);
        // The camera sits on +z, so the front face is one of the visible pairs
        let visible = triangles.iter().filter(|t| t.is_front_facing()).count();
        assert_eq!(visible, 2);
        for triangle in &triangles {
            assert!(triangle.shade > 0.0 && triangle.shade <= 1.0);
        }
    }

    #[test]
    fn ambient_light_keeps_unlit_faces_visible() {
        let scene = scene_with_cube();
        let camera = PerspectiveCamera::from_config(&CameraConfig::default(), 1.0);
        let darkest = shade_scene(&scene, &camera, 100.0, 100.0)
            .iter()
            .map(|t| t.shade)
            .fold(f32::INFINITY, f32::min);
        // Bottom face only receives the ambient term: 0.8 of 2.3
        assert!((darkest - 0.8 / 2.3).abs() < 1e-4);
    }
}

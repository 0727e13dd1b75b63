/// Scene graph owned by a viewer session
///
/// The hierarchy is fixed: the scene root carries the idle animation and
/// owns the light rig plus at most one model node. Lights are children of
/// the root, so they turn with the model and shading stays put relative to
/// it.
use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::LoadError;
use crate::geometry::{Aabb, Mesh};
use crate::lighting::{Color, Light};
use crate::transform::NodeTransform;

/// A loaded model: geometry in asset space plus its root transform
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    pub mesh: Mesh,
    pub transform: NodeTransform,
}

/// Result of fitting a model into the view volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    /// Bounding-box center before normalization
    pub center: Point3<f32>,
    /// Bounding-box size before normalization
    pub size: Vector3<f32>,
    pub scale: f32,
}

impl ModelNode {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            transform: NodeTransform::identity(),
        }
    }

    /// Bounding box of the geometry after this node's transform
    pub fn world_bounds(&self) -> Aabb {
        self.mesh.transformed_bounds(&self.transform.matrix())
    }

    /// Scale the node uniformly so its largest dimension equals `target_size`,
    /// then shift it so the scaled bounding-box center sits at the origin.
    ///
    /// The shift is `center * scale`: the center is measured before the scale
    /// is applied, so it has to be carried into the scaled frame.
    pub fn normalize(&mut self, target_size: f32) -> Result<Normalization, LoadError> {
        let bounds = self.world_bounds();
        let max_extent = bounds.max_extent();
        if bounds.is_empty() || !max_extent.is_finite() || max_extent <= 0.0 {
            return Err(LoadError::EmptyModel);
        }

        let center = bounds.center();
        let scale = target_size / max_extent;
        self.transform.scale_uniformly(scale);
        self.transform.position -= center.coords * scale;

        Ok(Normalization {
            center,
            size: bounds.size(),
            scale,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub transform: NodeTransform,
    lights: Vec<Light>,
    model: Option<ModelNode>,
}

impl Scene {
    pub fn new(lights: Vec<Light>) -> Self {
        Self {
            transform: NodeTransform::identity(),
            lights,
            model: None,
        }
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn model(&self) -> Option<&ModelNode> {
        self.model.as_ref()
    }

    pub fn set_model(&mut self, model: ModelNode) {
        self.model = Some(model);
    }

    /// Lights plus the model, if any
    pub fn node_count(&self) -> usize {
        self.lights.len() + usize::from(self.model.is_some())
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        self.transform.matrix()
    }

    /// Lambert irradiance for a unit normal expressed in scene-local space
    pub fn illuminate(&self, normal: &Vector3<f32>) -> Color {
        self.lights
            .iter()
            .fold(Color::BLACK, |acc, light| acc + light.irradiance(normal))
    }

    /// Upper bound of [`illuminate`] luminance, used to map shading into [0, 1]
    ///
    /// [`illuminate`]: Scene::illuminate
    pub fn peak_irradiance(&self) -> f32 {
        self.lights.iter().map(Light::intensity).sum::<f32>().max(f32::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LightingConfig;
    use approx::assert_relative_eq;

    fn cuboid(center: [f32; 3], size: [f32; 3]) -> ModelNode {
        ModelNode::new(Mesh::cuboid(Point3::from(center), Vector3::from(size)))
    }

    #[test]
    fn normalize_scales_by_largest_extent_and_centers() {
        let mut node = cuboid([10.0, 10.0, 10.0], [2.0, 4.0, 1.0]);
        let fit = node.normalize(3.0).unwrap();

        assert_relative_eq!(fit.scale, 0.75);
        assert_relative_eq!(fit.center, Point3::new(10.0, 10.0, 10.0));
        assert_relative_eq!(node.transform.position, Vector3::new(-7.5, -7.5, -7.5), epsilon = 1e-5);
        assert_relative_eq!(node.transform.scale, Vector3::repeat(0.75));

        let bounds = node.world_bounds();
        assert_relative_eq!(bounds.center(), Point3::origin(), epsilon = 1e-5);
        assert_relative_eq!(bounds.max_extent(), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut node = cuboid([-3.0, 0.5, 8.0], [2.0, 1.0, 4.0]);
        node.normalize(3.0).unwrap();
        let once = node.transform;

        let again = node.normalize(3.0).unwrap();
        assert_relative_eq!(again.scale, 1.0, epsilon = 1e-5);
        assert_relative_eq!(node.transform.position, once.position, epsilon = 1e-5);
        assert_relative_eq!(node.transform.scale, once.scale, epsilon = 1e-5);
    }

    #[test]
    fn translating_by_unscaled_center_would_miss_origin() {
        let mut node = cuboid([10.0, 10.0, 10.0], [2.0, 4.0, 1.0]);
        node.normalize(3.0).unwrap();
        let naive = -Vector3::new(10.0, 10.0, 10.0);
        assert!((node.transform.position - naive).norm() > 1.0);
    }

    #[test]
    fn empty_or_flat_point_models_are_rejected() {
        let mut empty = ModelNode::new(Mesh::new());
        assert!(matches!(empty.normalize(3.0), Err(LoadError::EmptyModel)));

        let mut point = cuboid([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        assert!(matches!(point.normalize(3.0), Err(LoadError::EmptyModel)));
        assert_eq!(point.transform, NodeTransform::identity());
    }

    #[test]
    fn fresh_scene_holds_only_lights() {
        let scene = Scene::new(Light::rig(&LightingConfig::default()));
        assert_eq!(scene.node_count(), 3);
        assert!(scene.model().is_none());
        assert_relative_eq!(scene.peak_irradiance(), 2.3, epsilon = 1e-6);
    }

    #[test]
    fn ambient_light_reaches_every_face() {
        let scene = Scene::new(Light::rig(&LightingConfig::default()));
        let lit = scene.illuminate(&Vector3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(lit.luminance(), 0.8, epsilon = 1e-5);
    }
}

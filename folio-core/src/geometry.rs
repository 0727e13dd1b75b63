/// Geometry primitives for model assets
use nalgebra::{Matrix4, Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Build a triangle from bare positions, using the face normal for every vertex
    pub fn from_positions(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        let normal = face_normal(&a, &b, &c);
        Self::new(
            Vertex::new(a, normal),
            Vertex::new(b, normal),
            Vertex::new(c, normal),
        )
    }

    /// Calculate the face normal from the triangle's vertices.
    ///
    /// Degenerate faces yield a zero vector rather than NaN.
    pub fn calculate_normal(&self) -> Vector3<f32> {
        face_normal(
            &self.vertices[0].position,
            &self.vertices[1].position,
            &self.vertices[2].position,
        )
    }
}

pub(crate) fn face_normal(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> Vector3<f32> {
    (b - a)
        .cross(&(c - a))
        .try_normalize(1e-12)
        .unwrap_or_else(Vector3::zeros)
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounding box of all vertex positions in mesh space
    pub fn bounds(&self) -> Aabb {
        self.transformed_bounds(&Matrix4::identity())
    }

    /// Bounding box of all vertex positions after applying `matrix`
    pub fn transformed_bounds(&self, matrix: &Matrix4<f32>) -> Aabb {
        let mut bounds = Aabb::empty();
        for triangle in &self.triangles {
            for vertex in &triangle.vertices {
                bounds.expand(&matrix.transform_point(&vertex.position));
            }
        }
        bounds
    }

    /// Axis-aligned box with the given center and edge lengths (12 triangles)
    pub fn cuboid(center: Point3<f32>, size: Vector3<f32>) -> Self {
        let h = size / 2.0;
        let corner = |sx: f32, sy: f32, sz: f32| {
            center + Vector3::new(sx * h.x, sy * h.y, sz * h.z)
        };
        // Counter-clockwise quads seen from outside
        let faces: [[(f32, f32, f32); 4]; 6] = [
            [(-1., -1., 1.), (1., -1., 1.), (1., 1., 1.), (-1., 1., 1.)],
            [(1., -1., -1.), (-1., -1., -1.), (-1., 1., -1.), (1., 1., -1.)],
            [(-1., 1., 1.), (1., 1., 1.), (1., 1., -1.), (-1., 1., -1.)],
            [(-1., -1., -1.), (1., -1., -1.), (1., -1., 1.), (-1., -1., 1.)],
            [(1., -1., 1.), (1., -1., -1.), (1., 1., -1.), (1., 1., 1.)],
            [(-1., -1., -1.), (-1., -1., 1.), (-1., 1., 1.), (-1., 1., -1.)],
        ];

        let mut mesh = Self::with_capacity(12);
        for quad in faces {
            let [a, b, c, d] = quad.map(|(x, y, z)| corner(x, y, z));
            mesh.add_triangle(Triangle::from_positions(a, b, c));
            mesh.add_triangle(Triangle::from_positions(a, c, d));
        }
        mesh
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// An inverted box that any point expands
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn expand(&mut self, point: &Point3<f32>) {
        self.min = Point3::from(self.min.coords.inf(&point.coords));
        self.max = Point3::from(self.max.coords.sup(&point.coords));
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    /// Largest edge length
    pub fn max_extent(&self) -> f32 {
        self.size().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cuboid_bounds_match_request() {
        let mesh = Mesh::cuboid(Point3::new(10.0, 10.0, 10.0), Vector3::new(2.0, 4.0, 1.0));
        assert_eq!(mesh.triangles.len(), 12);

        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.center(), Point3::new(10.0, 10.0, 10.0));
        assert_relative_eq!(bounds.size(), Vector3::new(2.0, 4.0, 1.0));
        assert_relative_eq!(bounds.max_extent(), 4.0);
    }

    #[test]
    fn cuboid_normals_point_outward() {
        let mesh = Mesh::cuboid(Point3::origin(), Vector3::new(2.0, 2.0, 2.0));
        for triangle in &mesh.triangles {
            let centroid = triangle
                .vertices
                .iter()
                .fold(Vector3::zeros(), |acc, v| acc + v.position.coords)
                / 3.0;
            assert!(triangle.calculate_normal().dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn empty_box_has_zero_size() {
        let bounds = Aabb::empty();
        assert!(bounds.is_empty());
        assert_eq!(bounds.size(), Vector3::zeros());
        assert_eq!(Mesh::new().bounds(), Aabb::empty());
    }

    #[test]
    fn degenerate_triangle_has_zero_normal() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let triangle = Triangle::from_positions(p, p, p);
        assert_eq!(triangle.calculate_normal(), Vector3::zeros());
    }

    #[test]
    fn transformed_bounds_follow_matrix() {
        let mesh = Mesh::cuboid(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let matrix = Matrix4::new_translation(&Vector3::new(0.0, 3.0, 0.0)) * Matrix4::new_scaling(2.0);
        let bounds = mesh.transformed_bounds(&matrix);
        assert_relative_eq!(bounds.center(), Point3::new(0.0, 3.0, 0.0));
        assert_relative_eq!(bounds.size(), Vector3::new(2.0, 2.0, 2.0));
    }
}

use crate::core::geometry::Vertex;
use nalgebra::{Point3, Vector2, Vector3};

/// A collection of vertices and indices representing a 3D object.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// List of vertices.
    pub vertices: Vec<Vertex>,
    /// List of indices defining triangles (3 indices per triangle).
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of complete triangles.
    pub fn nfaces(&self) -> usize {
        self.indices.len() / 3
    }

    fn vertex(&self, face: usize, nth: usize) -> &Vertex {
        &self.vertices[self.indices[face * 3 + nth] as usize]
    }

    /// Object-space position of vertex `nth` of `face`.
    pub fn vert(&self, face: usize, nth: usize) -> Point3<f64> {
        self.vertex(face, nth).position
    }

    pub fn uv(&self, face: usize, nth: usize) -> Vector2<f64> {
        self.vertex(face, nth).texcoord
    }

    pub fn normal(&self, face: usize, nth: usize) -> Vector3<f64> {
        self.vertex(face, nth).normal
    }

    /// Creates a simple triangle mesh for testing purposes.
    ///
    /// Vertices are arranged in Counter-Clockwise (CCW) order, facing +Z.
    pub fn create_test_triangle() -> Self {
        let vertices = vec![
            Vertex::new(
                Point3::new(0.0, 0.5, 0.0),  // Top
                Vector3::new(0.0, 0.0, 1.0), // Normal facing Z+
                Vector2::new(0.5, 1.0),      // UV
            ),
            Vertex::new(
                Point3::new(-0.5, -0.5, 0.0), // Bottom Left
                Vector3::new(0.0, 0.0, 1.0),
                Vector2::new(0.0, 0.0),
            ),
            Vertex::new(
                Point3::new(0.5, -0.5, 0.0), // Bottom Right
                Vector3::new(0.0, 0.0, 1.0),
                Vector2::new(1.0, 0.0),
            ),
        ];

        Self::new(vertices, vec![0, 1, 2])
    }
}

/// Recomputes per-vertex normals as the area-weighted average of the
/// normals of all faces sharing the vertex.
pub fn compute_smooth_normals(mesh: &mut Mesh) {
    let mut accum = vec![Vector3::<f64>::zeros(); mesh.vertices.len()];

    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = mesh.vertices[a].position;
        let pb = mesh.vertices[b].position;
        let pc = mesh.vertices[c].position;
        // Cross product length is twice the face area, which gives the weighting.
        let face_normal = (pb - pa).cross(&(pc - pa));
        accum[a] += face_normal;
        accum[b] += face_normal;
        accum[c] += face_normal;
    }

    for (vertex, n) in mesh.vertices.iter_mut().zip(accum) {
        vertex.normal = n.try_normalize(1e-12).unwrap_or_else(Vector3::z);
    }
}

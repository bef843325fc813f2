use nalgebra::{Point3, Vector2, Vector3};

/// Represents a single vertex in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in local object space.
    pub position: Point3<f64>,
    /// Normal vector in object space.
    pub normal: Vector3<f64>,
    /// Texture coordinates (UV), origin at the bottom-left of the texture.
    pub texcoord: Vector2<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>, texcoord: Vector2<f64>) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }
}

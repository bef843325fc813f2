use crate::core::color::Bgra;
use crate::scene::mesh::Mesh;
use nalgebra::{Vector3, Vector4};

/// Shader represents the programmable stages of the pipeline.
///
/// The stages are split so that no fragment can ever observe a half-written
/// triangle: `vertex` is pure, `assemble` turns the three vertex outputs into
/// an immutable per-triangle value, and `fragment` only reads that value.
///
/// Implementations must be `Sync` because rows of a triangle may be shaded
/// concurrently.
pub trait Shader: Sync {
    /// Per-vertex output of the vertex stage.
    type Varying: Copy;
    /// Complete per-triangle state consumed by the fragment stage.
    type Triangle: Sync;

    /// Vertex shader stage.
    ///
    /// Transforms vertex `nth` (0..3) of face `face` into homogeneous clip
    /// space and returns the values the fragment stage will interpolate.
    fn vertex(&self, mesh: &Mesh, face: usize, nth: usize) -> (Vector4<f64>, Self::Varying);

    /// Packs the three vertex outputs of one face, in vertex order.
    fn assemble(&self, varyings: [Self::Varying; 3]) -> Self::Triangle;

    /// Fragment shader stage.
    ///
    /// `bar` holds perspective-correct barycentric weights summing to 1.
    /// Returns `None` to discard the fragment.
    fn fragment(&self, triangle: &Self::Triangle, bar: Vector3<f64>) -> Option<Bgra>;
}

/// Runs the vertex stage for all three vertices of `face`.
///
/// Returns the clip-space positions together with the assembled triangle.
pub fn assemble_triangle<S: Shader>(
    shader: &S,
    mesh: &Mesh,
    face: usize,
) -> ([Vector4<f64>; 3], S::Triangle) {
    let (clip0, var0) = shader.vertex(mesh, face, 0);
    let (clip1, var1) = shader.vertex(mesh, face, 1);
    let (clip2, var2) = shader.vertex(mesh, face, 2);

    (
        [clip0, clip1, clip2],
        shader.assemble([var0, var1, var2]),
    )
}

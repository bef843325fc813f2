use crate::core::color::{Bgra, shade_channel};
use crate::core::math::transform::{embed_direction, embed_point, project3};
use crate::core::pipeline::Shader;
use crate::scene::camera::Camera;
use crate::scene::mesh::Mesh;
use crate::scene::model::Model;
use log::debug;
use nalgebra::{Matrix2x3, Matrix3, Matrix4, Vector2, Vector3, Vector4};
use std::sync::atomic::{AtomicBool, Ordering};

/// Flat ambient level added to every lit channel.
pub const AMBIENT: f64 = 10.0;
/// Specular exponent before the specular map's bias is added.
pub const BASE_SHININESS: f64 = 5.0;

const EPSILON: f64 = 1e-12;

/// Per-vertex output of [`NormalMapShader`].
#[derive(Debug, Clone, Copy)]
pub struct VertexOut {
    pub uv: Vector2<f64>,
    /// Normal in view space, not normalized.
    pub normal: Vector3<f64>,
    /// Position in view space.
    pub view_pos: Vector3<f64>,
}

/// The three vertices of a triangle as columns, in vertex order.
#[derive(Debug, Clone, Copy)]
pub struct TriangleState {
    pub uv: Matrix2x3<f64>,
    pub nrm: Matrix3<f64>,
    pub view_tri: Matrix3<f64>,
}

/// Diffuse + specular shading with normals perturbed by a tangent-space
/// normal map.
pub struct NormalMapShader<'a> {
    model: &'a Model,
    model_view: Matrix4<f64>,
    projection: Matrix4<f64>,
    /// Inverse transpose of ModelView, for normals.
    normal_matrix: Matrix4<f64>,
    /// Unit light direction in view space, zero when the light is degenerate.
    uniform_l: Vector3<f64>,
    degenerate_logged: AtomicBool,
}

impl<'a> NormalMapShader<'a> {
    pub fn new(model: &'a Model, camera: &Camera, light_dir: &Vector3<f64>) -> Self {
        let model_view = camera.model_view();
        let normal_matrix = model_view
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or_else(Matrix4::identity);

        let uniform_l = project3(&(model_view * embed_direction(light_dir)))
            .try_normalize(EPSILON)
            .unwrap_or_else(|| {
                debug!(
                    "Light direction {:?} has no length, only ambient light remains",
                    light_dir
                );
                Vector3::zeros()
            });

        Self {
            model,
            model_view,
            projection: camera.projection(),
            normal_matrix,
            uniform_l,
            degenerate_logged: AtomicBool::new(false),
        }
    }

    pub fn light(&self) -> Vector3<f64> {
        self.uniform_l
    }

    /// View-space normal perturbed by the normal map.
    fn shading_normal(
        &self,
        triangle: &TriangleState,
        bn: Vector3<f64>,
        uv: Vector2<f64>,
    ) -> Vector3<f64> {
        tangent_basis(&triangle.view_tri, &triangle.uv, &bn)
            .and_then(|basis| (basis * self.model.sample_normal(uv)).try_normalize(EPSILON))
            .unwrap_or_else(|| {
                self.note_degenerate("tangent basis, using the interpolated normal");
                bn
            })
    }

    fn note_degenerate(&self, what: &str) {
        if !self.degenerate_logged.swap(true, Ordering::Relaxed) {
            debug!("Degenerate {}", what);
        }
    }

    /// Diffuse and specular factors for unit normal `n`.
    fn lighting(&self, n: &Vector3<f64>, uv: Vector2<f64>) -> (f64, f64) {
        let l = self.uniform_l;
        let n_dot_l = n.dot(&l);
        let diffuse = n_dot_l.max(0.0);

        let specular = (n * (2.0 * n_dot_l) - l)
            .try_normalize(EPSILON)
            .map_or(0.0, |r| {
                let shininess = BASE_SHININESS + self.model.sample_specular(uv).red() as f64;
                (-r.z).max(0.0).powf(shininess)
            });

        (diffuse, specular)
    }
}

impl Shader for NormalMapShader<'_> {
    type Varying = VertexOut;
    type Triangle = TriangleState;

    fn vertex(&self, mesh: &Mesh, face: usize, nth: usize) -> (Vector4<f64>, Self::Varying) {
        let view = self.model_view * embed_point(&mesh.vert(face, nth));
        let clip = self.projection * view;

        let out = VertexOut {
            uv: mesh.uv(face, nth),
            normal: project3(&(self.normal_matrix * embed_direction(&mesh.normal(face, nth)))),
            view_pos: project3(&view),
        };
        (clip, out)
    }

    fn assemble(&self, varyings: [Self::Varying; 3]) -> Self::Triangle {
        TriangleState {
            uv: Matrix2x3::from_columns(&varyings.map(|v| v.uv)),
            nrm: Matrix3::from_columns(&varyings.map(|v| v.normal)),
            view_tri: Matrix3::from_columns(&varyings.map(|v| v.view_pos)),
        }
    }

    fn fragment(&self, triangle: &Self::Triangle, bar: Vector3<f64>) -> Option<Bgra> {
        let uv = triangle.uv * bar;

        let (diffuse, specular) = match (triangle.nrm * bar).try_normalize(EPSILON) {
            Some(bn) => {
                let n = self.shading_normal(triangle, bn, uv);
                self.lighting(&n, uv)
            }
            None => {
                self.note_degenerate("normal, using ambient light only");
                (0.0, 0.0)
            }
        };

        let base = self.model.sample_diffuse(uv);
        let intensity = diffuse + specular;
        Some(Bgra::new(
            shade_channel(AMBIENT, base.blue(), intensity),
            shade_channel(AMBIENT, base.green(), intensity),
            shade_channel(AMBIENT, base.red(), intensity),
            255,
        ))
    }
}

/// Builds the Darboux frame of a triangle: columns are the unit tangent
/// along increasing U, the unit bitangent along increasing V, and `bn`.
///
/// `view_tri` holds the vertex positions as columns and `uv` the texture
/// coordinates. Returns `None` when the positions are collinear or the UVs
/// do not span a direction.
pub fn tangent_basis(
    view_tri: &Matrix3<f64>,
    uv: &Matrix2x3<f64>,
    bn: &Vector3<f64>,
) -> Option<Matrix3<f64>> {
    let p0 = view_tri.column(0);
    let a = Matrix3::from_rows(&[
        (view_tri.column(1) - p0).transpose(),
        (view_tri.column(2) - p0).transpose(),
        bn.transpose(),
    ]);
    let ai = a.try_inverse()?;

    let i = ai * Vector3::new(uv[(0, 1)] - uv[(0, 0)], uv[(0, 2)] - uv[(0, 0)], 0.0);
    let j = ai * Vector3::new(uv[(1, 1)] - uv[(1, 0)], uv[(1, 2)] - uv[(1, 0)], 0.0);

    let i = i.try_normalize(EPSILON)?;
    let j = j.try_normalize(EPSILON)?;
    if !(i.iter().chain(j.iter()).all(|c| c.is_finite())) {
        return None;
    }

    Some(Matrix3::from_columns(&[i, j, *bn]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vertex;
    use crate::core::pipeline::assemble_triangle;
    use crate::scene::texture::Texture;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use std::f64::consts::PI;

    fn camera() -> Camera {
        Camera::new(Point3::new(0.0, 0.0, 3.0), Point3::origin(), Vector3::y(), 100, 100)
            .unwrap()
    }

    fn centroid() -> Vector3<f64> {
        Vector3::repeat(1.0 / 3.0)
    }

    #[test]
    fn vertex_stage_moves_data_into_view_space() {
        let model = Model::untextured(Mesh::create_test_triangle());
        let shader = NormalMapShader::new(&model, &camera(), &Vector3::z());

        let (clip, out) = shader.vertex(&model.mesh, 0, 0);
        assert_relative_eq!(out.view_pos, Vector3::new(0.0, 0.5, 3.0), epsilon = 1e-12);
        assert_relative_eq!(out.normal, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
        assert_eq!(out.uv, Vector2::new(0.5, 1.0));
        assert_relative_eq!(clip.w, 1.0, epsilon = 1e-12);
        assert_relative_eq!(shader.light(), Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn basis_follows_texture_directions() {
        let model = Model::untextured(Mesh::create_test_triangle());
        let shader = NormalMapShader::new(&model, &camera(), &Vector3::z());
        let (_, tri) = assemble_triangle(&shader, &model.mesh, 0);

        let bn = Vector3::new(0.0, 0.0, -1.0);
        let basis = tangent_basis(&tri.view_tri, &tri.uv, &bn).unwrap();
        assert_relative_eq!(basis.column(0).into_owned(), Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(basis.column(1).into_owned(), Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(basis.column(2).into_owned(), bn, epsilon = 1e-12);
    }

    #[test]
    fn collinear_triangle_has_no_basis() {
        let view_tri = Matrix3::from_columns(&[
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(2.0, 0.0, 1.0),
        ]);
        let uv = Matrix2x3::new(0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        // bn lies in the plane spanned by the edges, so A is singular.
        assert!(tangent_basis(&view_tri, &uv, &Vector3::x()).is_none());
    }

    #[test]
    fn lit_head_on_saturates() {
        let model = Model::untextured(Mesh::create_test_triangle());
        let shader = NormalMapShader::new(&model, &camera(), &Vector3::z());
        let (_, tri) = assemble_triangle(&shader, &model.mesh, 0);

        let color = shader.fragment(&tri, centroid()).unwrap();
        assert_eq!(color, Bgra::new(255, 255, 255, 255));
    }

    #[test]
    fn light_from_behind_leaves_ambient_only() {
        let model = Model::untextured(Mesh::create_test_triangle());
        let shader = NormalMapShader::new(&model, &camera(), &-Vector3::z());
        let (_, tri) = assemble_triangle(&shader, &model.mesh, 0);

        let color = shader.fragment(&tri, centroid()).unwrap();
        assert_eq!(color, Bgra::new(10, 10, 10, 255));
    }

    #[test]
    fn diffuse_color_scales_each_channel() {
        let mesh = Mesh::create_test_triangle();
        let model = Model::new(
            mesh,
            Texture::solid(Bgra::new(0, 40, 80, 255)),
            Texture::solid(Bgra::new(255, 128, 128, 255)),
            Texture::solid(Bgra::new(0, 0, 250, 255)),
        );
        let shader = NormalMapShader::new(&model, &camera(), &Vector3::new(0.0, 1.0, 1.0));
        let (_, tri) = assemble_triangle(&shader, &model.mesh, 0);

        let color = shader.fragment(&tri, centroid()).unwrap();
        // 45 degree light: diffuse close to 0.707, specular negligible at exponent 255.
        assert_eq!(color.blue(), 10);
        assert!((36..=40).contains(&color.green()), "green = {}", color.green());
        assert!((64..=68).contains(&color.red()), "red = {}", color.red());
        assert_eq!(color.alpha(), 255);
    }

    fn model_with_maps(diffuse: Bgra, normal: Bgra, specular: Bgra) -> Model {
        Model::new(
            Mesh::create_test_triangle(),
            Texture::solid(diffuse),
            Texture::solid(normal),
            Texture::solid(specular),
        )
    }

    fn shade_centroid(model: &Model, light: Vector3<f64>) -> Bgra {
        let shader = NormalMapShader::new(model, &camera(), &light);
        let (_, tri) = assemble_triangle(&shader, &model.mesh, 0);
        shader.fragment(&tri, centroid()).unwrap()
    }

    #[test]
    fn tilted_normal_texel_follows_the_tangent() {
        // rgb (255, 128, 128) decodes to a normal along +U, which is object +x here.
        let tilted = model_with_maps(Bgra::WHITE, Bgra::new(128, 128, 255, 255), Bgra::BLACK);
        assert_eq!(shade_centroid(&tilted, Vector3::x()), Bgra::new(255, 255, 255, 255));
        assert_eq!(shade_centroid(&tilted, -Vector3::x()), Bgra::new(10, 10, 10, 255));

        // The same light grazes an unperturbed surface.
        let flat = model_with_maps(Bgra::WHITE, Bgra::new(255, 128, 128, 255), Bgra::BLACK);
        assert!(shade_centroid(&flat, Vector3::x()).green() < 20);
    }

    #[test]
    fn specular_map_raises_the_exponent() {
        let light = Vector3::new(0.0, 1.0, 1.0);
        let diffuse = Bgra::new(200, 100, 0, 255);
        let flat_normal = Bgra::new(255, 128, 128, 255);

        // diffuse ~0.70987, reflection -r.z ~0.71261
        let dull = model_with_maps(diffuse, flat_normal, Bgra::BLACK);
        assert_eq!(shade_centroid(&dull, light), Bgra::new(188, 99, 10, 255));

        let shiny = model_with_maps(diffuse, flat_normal, Bgra::new(0, 0, 10, 255));
        assert_eq!(shade_centroid(&shiny, light), Bgra::new(153, 81, 10, 255));
    }

    #[test]
    fn diffuse_and_specular_stay_in_unit_range() {
        let model = Model::untextured(Mesh::create_test_triangle());
        let uv = Vector2::new(0.5, 0.5);
        let lights = [
            Vector3::x(),
            -Vector3::y(),
            Vector3::z(),
            Vector3::new(1.0, -2.0, 3.0),
            Vector3::new(-0.3, 0.2, -1.0),
        ];

        for light in lights {
            let shader = NormalMapShader::new(&model, &camera(), &light);
            for i in 0..12 {
                for j in 0..=6 {
                    let (phi, theta) = (i as f64 * PI / 6.0, j as f64 * PI / 6.0);
                    let n = Vector3::new(
                        theta.sin() * phi.cos(),
                        theta.sin() * phi.sin(),
                        theta.cos(),
                    );
                    let (diffuse, specular) = shader.lighting(&n, uv);
                    assert!((0.0..=1.0).contains(&diffuse), "diffuse {diffuse} for {n:?}");
                    assert!((0.0..=1.0).contains(&specular), "specular {specular} for {n:?}");
                }
            }
        }
    }

    #[test]
    fn uniform_uvs_fall_back_to_interpolated_normal() {
        let vertices = vec![
            Vertex::new(Point3::new(0.0, 0.5, 0.0), Vector3::z(), Vector2::new(0.3, 0.3)),
            Vertex::new(Point3::new(-0.5, -0.5, 0.0), Vector3::z(), Vector2::new(0.3, 0.3)),
            Vertex::new(Point3::new(0.5, -0.5, 0.0), Vector3::z(), Vector2::new(0.3, 0.3)),
        ];
        let model = Model::untextured(Mesh::new(vertices, vec![0, 1, 2]));
        let shader = NormalMapShader::new(&model, &camera(), &Vector3::z());
        let (_, tri) = assemble_triangle(&shader, &model.mesh, 0);

        let bn = Vector3::new(0.0, 0.0, -1.0);
        assert!(tangent_basis(&tri.view_tri, &tri.uv, &bn).is_none());
        assert_eq!(
            shader.fragment(&tri, centroid()),
            Some(Bgra::new(255, 255, 255, 255))
        );
    }

    #[test]
    fn zero_normals_give_ambient() {
        let mut mesh = Mesh::create_test_triangle();
        for v in &mut mesh.vertices {
            v.normal = Vector3::zeros();
        }
        let model = Model::untextured(mesh);
        let shader = NormalMapShader::new(&model, &camera(), &Vector3::z());
        let (_, tri) = assemble_triangle(&shader, &model.mesh, 0);

        assert_eq!(shader.fragment(&tri, centroid()), Some(Bgra::new(10, 10, 10, 255)));
    }

    #[test]
    fn zero_light_gives_ambient() {
        let model = Model::untextured(Mesh::create_test_triangle());
        let shader = NormalMapShader::new(&model, &camera(), &Vector3::zeros());
        let (_, tri) = assemble_triangle(&shader, &model.mesh, 0);

        assert_eq!(shader.fragment(&tri, centroid()), Some(Bgra::new(10, 10, 10, 255)));
    }
}

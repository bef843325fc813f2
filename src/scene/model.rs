use crate::core::color::Bgra;
use crate::error::RenderError;
use crate::io::obj_loader::load_obj;
use crate::scene::mesh::Mesh;
use crate::scene::texture::Texture;
use log::warn;
use nalgebra::{Vector2, Vector3};
use std::path::{Path, PathBuf};

/// The texture maps a model is shaded with, found next to the OBJ file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Diffuse,
    NormalTangent,
    Specular,
}

impl TextureKind {
    pub const ALL: [TextureKind; 3] = [
        TextureKind::Diffuse,
        TextureKind::NormalTangent,
        TextureKind::Specular,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "_diffuse.tga",
            TextureKind::NormalTangent => "_nm_tangent.tga",
            TextureKind::Specular => "_spec.tga",
        }
    }

    /// Stand-in used when the map is missing: white albedo, an unperturbed
    /// normal and no shininess bias.
    fn neutral(self) -> Texture {
        match self {
            TextureKind::Diffuse => Texture::solid(Bgra::WHITE),
            TextureKind::NormalTangent => Texture::solid(Bgra::new(255, 128, 128, 255)),
            TextureKind::Specular => Texture::solid(Bgra::BLACK),
        }
    }

    /// `head.obj` -> `head_diffuse.tga`, in the same directory.
    ///
    /// Returns `None` when the model path has no extension.
    pub fn path_for(self, model_path: &Path) -> Option<PathBuf> {
        model_path.extension()?;
        let stem = model_path.file_stem()?.to_string_lossy();
        Some(model_path.with_file_name(format!("{}{}", stem, self.suffix())))
    }
}

/// A Model is a mesh plus the diffuse, tangent-space normal and specular
/// maps it is shaded with.
pub struct Model {
    pub mesh: Mesh,
    pub diffuse: Texture,
    pub normal_map: Texture,
    pub specular: Texture,
}

impl Model {
    pub fn new(mesh: Mesh, diffuse: Texture, normal_map: Texture, specular: Texture) -> Self {
        Self {
            mesh,
            diffuse,
            normal_map,
            specular,
        }
    }

    /// A model with neutral textures, useful for meshes built in code.
    pub fn untextured(mesh: Mesh) -> Self {
        Self::new(
            mesh,
            TextureKind::Diffuse.neutral(),
            TextureKind::NormalTangent.neutral(),
            TextureKind::Specular.neutral(),
        )
    }

    /// Loads the OBJ at `path` and its texture maps.
    ///
    /// A missing or unreadable texture is replaced by a neutral one.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let mesh = load_obj(path)?;

        let [diffuse, normal_map, specular] =
            TextureKind::ALL.map(|kind| Self::load_texture(path, kind));

        Ok(Self::new(mesh, diffuse, normal_map, specular))
    }

    fn load_texture(model_path: &Path, kind: TextureKind) -> Texture {
        let Some(tex_path) = kind.path_for(model_path) else {
            warn!(
                "Model path {:?} has no extension, using a neutral {:?} map",
                model_path, kind
            );
            return kind.neutral();
        };

        match Texture::load(&tex_path) {
            Ok(tex) if tex.width > 0 && tex.height > 0 => tex,
            Ok(_) => {
                warn!("Texture {:?} is empty, using a neutral map", tex_path);
                kind.neutral()
            }
            Err(e) => {
                warn!("Failed to load texture {:?}: {}. Using a neutral map", tex_path, e);
                kind.neutral()
            }
        }
    }

    pub fn sample_diffuse(&self, uv: Vector2<f64>) -> Bgra {
        self.diffuse.sample(uv)
    }

    pub fn sample_normal(&self, uv: Vector2<f64>) -> Vector3<f64> {
        self.normal_map.sample_normal(uv)
    }

    pub fn sample_specular(&self, uv: Vector2<f64>) -> Bgra {
        self.specular.sample(uv)
    }
}

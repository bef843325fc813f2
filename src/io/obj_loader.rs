use crate::core::geometry::Vertex;
use crate::error::RenderError;
use crate::scene::mesh::{Mesh, compute_smooth_normals};
use log::{info, warn};
use nalgebra::{Point3, Vector2, Vector3};
use std::path::Path;

/// Loads an OBJ file into a single triangulated mesh.
///
/// Sub-meshes are merged in file order. Materials are ignored. A sub-mesh
/// without normals gets smooth normals computed from its faces, and one
/// without texture coordinates maps every vertex to UV (0, 0).
pub fn load_obj(path: &Path) -> Result<Mesh, RenderError> {
    if !path.exists() {
        return Err(RenderError::Model {
            path: path.to_path_buf(),
            message: "file not found".to_string(),
        });
    }

    info!("Loading OBJ file: {:?}", path);

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true, // one index addresses position, normal and UV alike
        ..Default::default()
    };

    let (models, _materials) =
        tobj::load_obj(path, &load_options).map_err(|e| RenderError::Model {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut merged = Mesh::default();

    for model in models {
        let part = convert_mesh(&model.mesh, &model.name);
        let offset = merged.vertices.len() as u32;
        merged.vertices.extend(part.vertices);
        merged.indices.extend(part.indices.iter().map(|i| i + offset));
    }

    if merged.nfaces() == 0 {
        warn!("OBJ file {:?} contains no faces", path);
    }

    info!(
        "OBJ loaded successfully. Total vertices: {}, Total faces: {}",
        merged.vertices.len(),
        merged.nfaces()
    );

    Ok(merged)
}

fn convert_mesh(mesh: &tobj::Mesh, name: &str) -> Mesh {
    let num_vertices = mesh.positions.len() / 3;
    let has_normals = mesh.normals.len() >= num_vertices * 3 && !mesh.normals.is_empty();
    let has_texcoords = mesh.texcoords.len() >= num_vertices * 2 && !mesh.texcoords.is_empty();

    if !has_texcoords {
        warn!("Mesh '{}' has no texture coordinates, using (0, 0)", name);
    }

    let vertices = (0..num_vertices)
        .map(|i| {
            let position = Point3::new(
                mesh.positions[i * 3] as f64,
                mesh.positions[i * 3 + 1] as f64,
                mesh.positions[i * 3 + 2] as f64,
            );
            let normal = if has_normals {
                Vector3::new(
                    mesh.normals[i * 3] as f64,
                    mesh.normals[i * 3 + 1] as f64,
                    mesh.normals[i * 3 + 2] as f64,
                )
            } else {
                Vector3::zeros()
            };
            let texcoord = if has_texcoords {
                Vector2::new(mesh.texcoords[i * 2] as f64, mesh.texcoords[i * 2 + 1] as f64)
            } else {
                Vector2::zeros()
            };
            Vertex::new(position, normal, texcoord)
        })
        .collect();

    // Drop trailing indices that don't form a whole triangle.
    let whole = mesh.indices.len() / 3 * 3;
    let mut converted = Mesh::new(vertices, mesh.indices[..whole].to_vec());

    if !has_normals {
        warn!("Mesh '{}' is missing normals, computing smooth normals", name);
        compute_smooth_normals(&mut converted);
    }

    converted
}

use crate::core::color::Bgra;
use crate::core::framebuffer::FrameBuffer;
use crate::core::pipeline::{Shader, assemble_triangle};
use crate::core::rasterizer::Rasterizer;
use crate::error::RenderError;
use crate::io::config::SceneConfig;
use crate::io::image::{create_placeholders, save_framebuffer};
use crate::pipeline::shaders::normal_map::NormalMapShader;
use crate::scene::camera::Camera;
use crate::scene::mesh::Mesh;
use crate::scene::model::Model;
use log::info;
use std::path::PathBuf;
use std::time::Instant;

/// Counters for one drawn mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub faces: usize,
    pub pixels: usize,
}

/// Drives the pipeline stages over a frame buffer.
pub struct Renderer {
    pub rasterizer: Rasterizer,
    pub framebuffer: FrameBuffer,
}

impl Renderer {
    pub fn new(camera: &Camera, width: usize, height: usize, background: Bgra) -> Self {
        Self {
            rasterizer: Rasterizer::new(camera.viewport()),
            framebuffer: FrameBuffer::new(width, height, background),
        }
    }

    /// Renders a whole scene and writes it to `config.output`.
    ///
    /// Returns the path of the written image.
    pub fn render(config: &SceneConfig) -> Result<PathBuf, RenderError> {
        let framebuffer = Self::render_to_buffer(config)?;
        save_framebuffer(&framebuffer, &config.output)?;
        Ok(config.output.clone())
    }

    /// Renders a whole scene without writing anything but placeholders.
    pub fn render_to_buffer(config: &SceneConfig) -> Result<FrameBuffer, RenderError> {
        if config.width == 0 || config.height == 0 {
            return Err(RenderError::EmptyViewport {
                width: config.width,
                height: config.height,
            });
        }

        let start = Instant::now();
        let camera = Camera::new(
            config.eye,
            config.center,
            config.up,
            config.width,
            config.height,
        )?;

        if config.create_placeholders {
            let created = create_placeholders(&config.model_path);
            if !created.is_empty() {
                info!("Created {} placeholder texture(s)", created.len());
            }
        }

        let mut renderer = Self::new(
            &camera,
            config.width as usize,
            config.height as usize,
            config.background,
        );

        for path in config.model_paths() {
            let model = Model::load(path)?;
            let shader = NormalMapShader::new(&model, &camera, &config.light_dir);
            let stats = renderer.draw_mesh(&model.mesh, &shader);
            info!(
                "Drew {:?}: {} faces, {} pixels written",
                path, stats.faces, stats.pixels
            );
        }

        info!("Render finished in {:.2?}", start.elapsed());
        Ok(renderer.framebuffer)
    }

    /// Runs the vertex stage on every face of `mesh`, then rasterizes it.
    /// Faces are drawn strictly in index order.
    pub fn draw_mesh<S: Shader>(&mut self, mesh: &Mesh, shader: &S) -> DrawStats {
        let mut stats = DrawStats::default();

        for face in 0..mesh.nfaces() {
            let (clip_coords, triangle) = assemble_triangle(shader, mesh, face);
            stats.pixels += self.rasterizer.rasterize_triangle(
                &mut self.framebuffer,
                shader,
                &clip_coords,
                &triangle,
            );
            stats.faces += 1;
        }

        stats
    }
}

use crate::core::framebuffer::FrameBuffer;
use crate::error::RenderError;
use crate::scene::model::TextureKind;
use image::{ExtendedColorType, ImageFormat};
use log::{debug, info, warn};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Writes the color buffer as a 24-bit TGA, top row first.
pub fn save_framebuffer(framebuffer: &FrameBuffer, path: &Path) -> Result<(), RenderError> {
    let bytes = framebuffer.to_rgb_bytes();
    image::save_buffer_with_format(
        path,
        &bytes,
        framebuffer.width as u32,
        framebuffer.height as u32,
        ExtendedColorType::Rgb8,
        ImageFormat::Tga,
    )?;
    info!(
        "Saved {}x{} image to {:?}",
        framebuffer.width, framebuffer.height, path
    );
    Ok(())
}

/// Creates empty texture files next to `model_path` for every map that does
/// not exist yet. Existing files are never touched.
///
/// Failures are logged and skipped. Returns the files that were created.
pub fn create_placeholders(model_path: &Path) -> Vec<PathBuf> {
    let mut created = Vec::new();

    for kind in TextureKind::ALL {
        let Some(path) = kind.path_for(model_path) else {
            continue;
        };

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                debug!("Created placeholder {:?}", path);
                created.push(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => warn!("Cannot create placeholder {:?}: {}", path, e),
        }
    }

    created
}

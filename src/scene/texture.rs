use crate::core::color::Bgra;
use image::{ImageError, Rgba, RgbaImage};
use log::info;
use nalgebra::{Vector2, Vector3};
use std::path::Path;
use std::sync::Arc;

/// Represents a 2D texture map.
///
/// Texels are returned raw, without any color-space conversion.
#[derive(Debug, Clone)]
pub struct Texture {
    pub image: Arc<RgbaImage>,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let path_ref = path.as_ref();
        let img = image::open(path_ref)?.to_rgba8();

        info!(
            "Loaded texture: {:?} ({}x{})",
            path_ref,
            img.width(),
            img.height()
        );

        Ok(Self::from_image(img))
    }

    pub fn from_image(img: RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            image: Arc::new(img),
        }
    }

    /// A 1x1 texture of a single color.
    pub fn solid(color: Bgra) -> Self {
        let rgba = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
        Self::from_image(RgbaImage::from_pixel(1, 1, rgba))
    }

    /// Nearest-texel lookup. UV (0, 0) is the bottom-left corner; coordinates
    /// outside [0, 1) wrap around (Repeat mode).
    pub fn sample(&self, uv: Vector2<f64>) -> Bgra {
        let u = uv.x - uv.x.floor();
        let v = uv.y - uv.y.floor();

        let x = ((u * self.width as f64) as u32).min(self.width - 1);
        // Flip V: image rows are stored top-down
        let y = (((1.0 - v) * self.height as f64) as u32).min(self.height - 1);

        let pixel = self.image.get_pixel(x, y);
        Bgra::from_rgba(pixel.0)
    }

    /// Decodes a tangent-space normal stored as RGB in [0, 255] to [-1, 1]^3.
    pub fn sample_normal(&self, uv: Vector2<f64>) -> Vector3<f64> {
        let c = self.sample(uv);
        Vector3::new(c.red() as f64, c.green() as f64, c.blue() as f64) * 2.0 / 255.0
            - Vector3::repeat(1.0)
    }
}

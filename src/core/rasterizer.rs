use crate::core::framebuffer::{FrameBuffer, RowMut};
use crate::core::math::interpolation::{
    barycentric_coordinates, is_inside_triangle, perspective_correct_barycentric,
};
use crate::core::math::transform::apply_perspective_division;
use crate::core::pipeline::Shader;
use nalgebra::{Matrix4, Point2, Vector3, Vector4};
use rayon::prelude::*;

/// Vertices with `w` at or below this lie behind (or on) the eye plane.
const MIN_W: f64 = 1e-6;

/// The Rasterizer is responsible for drawing triangles onto the FrameBuffer.
pub struct Rasterizer {
    /// NDC -> pixel transform.
    pub viewport: Matrix4<f64>,
}

impl Rasterizer {
    pub fn new(viewport: Matrix4<f64>) -> Self {
        Self { viewport }
    }

    /// Fills one triangle, running the depth test and the fragment stage for
    /// every covered pixel center.
    ///
    /// Triangles with a vertex behind the eye are skipped whole. Returns the
    /// number of pixels written.
    pub fn rasterize_triangle<S: Shader>(
        &self,
        framebuffer: &mut FrameBuffer,
        shader: &S,
        clip_coords: &[Vector4<f64>; 3],
        triangle: &S::Triangle,
    ) -> usize {
        // 1. Perspective Division & Viewport Transform
        let mut screen_coords = [Point2::origin(); 3];
        let mut w_values = [0.0; 3];

        for i in 0..3 {
            if clip_coords[i].w <= MIN_W {
                return 0;
            }
            let ndc = apply_perspective_division(&clip_coords[i]);
            let screen = self.viewport * ndc.to_homogeneous();
            screen_coords[i] = Point2::new(screen.x, screen.y);
            w_values[i] = clip_coords[i].w;
        }

        // Zero-area on screen: nothing to cover.
        let e1 = screen_coords[1] - screen_coords[0];
        let e2 = screen_coords[2] - screen_coords[0];
        if (e1.x * e2.y - e1.y * e2.x).abs() < 1e-9 {
            return 0;
        }

        // 2. Compute Bounding Box
        let (min_x, min_y, max_x, max_y) = self.compute_bounding_box(&screen_coords);

        // Scissor Test
        if max_x < 0
            || max_y < 0
            || min_x >= framebuffer.width as i64
            || min_y >= framebuffer.height as i64
        {
            return 0;
        }

        let start_x = min_x.max(0) as usize;
        let end_x = max_x.min(framebuffer.width as i64 - 1) as usize;
        let start_y = min_y.max(0) as usize;
        let end_y = max_y.min(framebuffer.height as i64 - 1) as usize;

        let depths = Vector3::new(clip_coords[0].z, clip_coords[1].z, clip_coords[2].z);

        // 3. Pixel Loop
        // Each task owns a whole row, so the read-modify-write depth test is race free.
        framebuffer
            .rows_mut(start_y, end_y)
            .into_par_iter()
            .map(|row| {
                self.shade_row(
                    row,
                    start_x..=end_x,
                    shader,
                    triangle,
                    &screen_coords,
                    &w_values,
                    &depths,
                )
            })
            .sum()
    }

    #[allow(clippy::too_many_arguments)]
    fn shade_row<S: Shader>(
        &self,
        row: RowMut<'_>,
        xs: std::ops::RangeInclusive<usize>,
        shader: &S,
        triangle: &S::Triangle,
        screen_coords: &[Point2<f64>; 3],
        w_values: &[f64; 3],
        depths: &Vector3<f64>,
    ) -> usize {
        let mut written = 0;
        for x in xs {
            let pixel_center = Point2::new(x as f64 + 0.5, row.y as f64 + 0.5);

            let Some(bary) = barycentric_coordinates(
                pixel_center,
                screen_coords[0],
                screen_coords[1],
                screen_coords[2],
            ) else {
                continue;
            };
            if !is_inside_triangle(bary) {
                continue;
            }

            let Some(corrected) =
                perspective_correct_barycentric(bary, w_values[0], w_values[1], w_values[2])
            else {
                // Numerical instability: skip this pixel
                continue;
            };

            let depth = depths.dot(&corrected);
            if depth >= row.depth[x] {
                continue;
            }

            if let Some(color) = shader.fragment(triangle, corrected) {
                row.depth[x] = depth;
                row.color[x] = color;
                written += 1;
            }
        }
        written
    }

    fn compute_bounding_box(&self, points: &[Point2<f64>; 3]) -> (i64, i64, i64, i64) {
        let min_x = points[0].x.min(points[1].x).min(points[2].x).floor() as i64;
        let min_y = points[0].y.min(points[1].y).min(points[2].y).floor() as i64;
        let max_x = points[0].x.max(points[1].x).max(points[2].x).ceil() as i64;
        let max_y = points[0].y.max(points[1].y).max(points[2].y).ceil() as i64;
        (min_x, min_y, max_x, max_y)
    }
}

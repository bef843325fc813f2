use crate::core::color::Bgra;

/// A 2D color buffer with a matching depth buffer.
///
/// Row 0 is the top row of the final image. Depth stores view-space distance,
/// smaller values are closer to the camera.
#[derive(Debug)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    color_buffer: Vec<Bgra>,
    depth_buffer: Vec<f64>,
}

/// Mutable view of one image row, handed to a single rasterizer task.
pub struct RowMut<'a> {
    pub y: usize,
    pub color: &'a mut [Bgra],
    pub depth: &'a mut [f64],
}

impl FrameBuffer {
    /// Creates a buffer filled with `background` and the farthest depth.
    pub fn new(width: usize, height: usize, background: Bgra) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            color_buffer: vec![background; size],
            depth_buffer: vec![f64::MAX; size],
        }
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Bgra> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(self.color_buffer[self.index(x, y)])
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Bgra) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            self.color_buffer[idx] = color;
        }
    }

    pub fn get_depth(&self, x: usize, y: usize) -> Option<f64> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(self.depth_buffer[self.index(x, y)])
    }

    /// Splits the buffers into disjoint row views for rows `start_y..=end_y`.
    ///
    /// Each row is borrowed exactly once, so rows can be shaded in parallel
    /// without any synchronization on the depth test.
    pub fn rows_mut(&mut self, start_y: usize, end_y: usize) -> Vec<RowMut<'_>> {
        if self.width == 0 || start_y > end_y || start_y >= self.height {
            return Vec::new();
        }
        let end_y = end_y.min(self.height - 1);
        let width = self.width;

        self.color_buffer
            .chunks_mut(width)
            .zip(self.depth_buffer.chunks_mut(width))
            .enumerate()
            .skip(start_y)
            .take(end_y - start_y + 1)
            .map(|(y, (color, depth))| RowMut { y, color, depth })
            .collect()
    }

    pub fn color_buffer(&self) -> &[Bgra] {
        &self.color_buffer
    }

    pub fn depth_buffer(&self) -> &[f64] {
        &self.depth_buffer
    }

    /// Packs the color buffer as tightly packed RGB bytes, top row first.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.color_buffer.iter().flat_map(|c| c.to_rgb()).collect()
    }
}

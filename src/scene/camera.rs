use crate::core::math::transform::TransformFactory;
use crate::error::RenderError;
use nalgebra::{Matrix4, Point3, Vector3};

/// Holds the ModelView, Projection and Viewport matrices of a render.
#[derive(Debug, Clone)]
pub struct Camera {
    model_view: Matrix4<f64>,
    projection: Matrix4<f64>,
    viewport: Matrix4<f64>,
}

impl Camera {
    /// Builds the camera for an image of `width` x `height` pixels.
    ///
    /// The model is drawn into the centered 3/4 of the image, and the focal
    /// distance is the eye-to-target distance.
    pub fn new(
        position: Point3<f64>,
        target: Point3<f64>,
        up: Vector3<f64>,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let model_view = TransformFactory::look_at(&position, &target, &up).ok_or(
            RenderError::DegenerateCamera {
                eye: position,
                center: target,
                up,
            },
        )?;

        let (w, h) = (width as f64, height as f64);
        let viewport = TransformFactory::viewport(w / 8.0, h / 8.0, w * 3.0 / 4.0, h * 3.0 / 4.0);
        let projection = TransformFactory::projection((position - target).norm());

        Ok(Self {
            model_view,
            projection,
            viewport,
        })
    }

    pub fn model_view(&self) -> Matrix4<f64> {
        self.model_view
    }

    pub fn projection(&self) -> Matrix4<f64> {
        self.projection
    }

    pub fn viewport(&self) -> Matrix4<f64> {
        self.viewport
    }
}

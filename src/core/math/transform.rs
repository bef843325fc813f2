use nalgebra::{Matrix4, Point3, Vector3, Vector4};

//=================================
// Transform Matrix Factory
//=================================

/// Factory for the three camera matrices of the pipeline.
///
/// View space is left-handed: +X right, +Y up, +Z from the eye towards the
/// look-at target. Screen space puts row 0 at the top of the image.
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    /// Creates the ModelView matrix looking from `eye` at `center`.
    ///
    /// Returns `None` when `eye == center` or `up` is parallel to the view
    /// direction, since no orthonormal frame exists then.
    pub fn look_at(
        eye: &Point3<f64>,
        center: &Point3<f64>,
        up: &Vector3<f64>,
    ) -> Option<Matrix4<f64>> {
        let z_axis = (center - eye).try_normalize(1e-12)?;
        let x_axis = z_axis.cross(up).try_normalize(1e-12)?;
        let y_axis = x_axis.cross(&z_axis);

        let rotation = Matrix4::new(
            x_axis.x, x_axis.y, x_axis.z, 0.0,
            y_axis.x, y_axis.y, y_axis.z, 0.0,
            z_axis.x, z_axis.y, z_axis.z, 0.0,
            0.0,      0.0,      0.0,      1.0,
        );

        Some(rotation * Self::translation(&-eye.coords))
    }

    /// Creates a translation matrix.
    pub fn translation(translation: &Vector3<f64>) -> Matrix4<f64> {
        Matrix4::new(
            1.0, 0.0, 0.0, translation.x,
            0.0, 1.0, 0.0, translation.y,
            0.0, 0.0, 1.0, translation.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Pinhole projection with focal distance `focal`.
    ///
    /// Keeps x, y and view depth z, and sets `w = z / focal`, so points on the
    /// focal plane keep their view-space size after the perspective divide.
    pub fn projection(focal: f64) -> Matrix4<f64> {
        Matrix4::new(
            1.0, 0.0, 0.0,           0.0,
            0.0, 1.0, 0.0,           0.0,
            0.0, 0.0, 1.0,           0.0,
            0.0, 0.0, 1.0 / focal,   0.0,
        )
    }

    /// Maps NDC [-1, 1]^2 onto the pixel rectangle starting at (x, y) with
    /// size w x h. NDC +Y is flipped to point down the image rows.
    pub fn viewport(x: f64, y: f64, w: f64, h: f64) -> Matrix4<f64> {
        Matrix4::new(
            w / 2.0, 0.0,      0.0, x + w / 2.0,
            0.0,     -h / 2.0, 0.0, y + h / 2.0,
            0.0,     0.0,      1.0, 0.0,
            0.0,     0.0,      0.0, 1.0,
        )
    }
}

//=================================
// Core Transformation Functions
//=================================

/// Embeds a point in homogeneous coordinates (w = 1).
#[inline]
pub fn embed_point(p: &Point3<f64>) -> Vector4<f64> {
    p.to_homogeneous()
}

/// Embeds a direction in homogeneous coordinates (w = 0), unaffected by translation.
#[inline]
pub fn embed_direction(v: &Vector3<f64>) -> Vector4<f64> {
    v.push(0.0)
}

/// Drops the homogeneous coordinate without dividing.
#[inline]
pub fn project3(v: &Vector4<f64>) -> Vector3<f64> {
    v.xyz()
}

/// Performs perspective division: Clip Space -> NDC.
#[inline]
pub fn apply_perspective_division(clip: &Vector4<f64>) -> Point3<f64> {
    let w = clip.w;
    if w.abs() > 1e-12 {
        Point3::new(clip.x / w, clip.y / w, clip.z / w)
    } else {
        Point3::origin()
    }
}

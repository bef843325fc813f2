use nalgebra::{Point2, Vector3};

const EPSILON: f64 = 1e-9;

/// Calculates the barycentric coordinates (alpha, beta, gamma) of point p
/// with respect to triangle (v1, v2, v3).
///
/// Returns `None` if the triangle is degenerate (area is near zero).
///
/// # Returns
/// A Vector3 where:
/// - x: alpha (weight for v1)
/// - y: beta  (weight for v2)
/// - z: gamma (weight for v3)
pub fn barycentric_coordinates(
    p: Point2<f64>,
    v1: Point2<f64>,
    v2: Point2<f64>,
    v3: Point2<f64>,
) -> Option<Vector3<f64>> {
    let e1 = v2 - v1;
    let e2 = v3 - v1;
    let p_v1 = p - v1;

    // Twice the signed area of the triangle
    let total_area_x2 = e1.x * e2.y - e1.y * e2.x;

    if total_area_x2.abs() < EPSILON {
        return None;
    }

    let inv_total_area_x2 = 1.0 / total_area_x2;

    let beta = (p_v1.x * e2.y - p_v1.y * e2.x) * inv_total_area_x2;
    let gamma = (e1.x * p_v1.y - e1.y * p_v1.x) * inv_total_area_x2;
    let alpha = 1.0 - beta - gamma;

    Some(Vector3::new(alpha, beta, gamma))
}

/// Checks if the barycentric coordinates represent a point inside the triangle.
/// Points exactly on an edge count as inside.
#[inline(always)]
pub fn is_inside_triangle(bary: Vector3<f64>) -> bool {
    bary.x >= 0.0 && bary.y >= 0.0 && bary.z >= 0.0
}

/// Compute perspective-correct barycentric coordinates.
///
///   wa = alpha / w1, wb = beta / w2, wc = gamma / w3
///   alpha' = wa / (wa + wb + wc), ...
///
/// Returns `None` when the weights cannot be renormalized.
pub fn perspective_correct_barycentric(
    bary: Vector3<f64>,
    w1: f64,
    w2: f64,
    w3: f64,
) -> Option<Vector3<f64>> {
    if w1.abs() < EPSILON || w2.abs() < EPSILON || w3.abs() < EPSILON {
        return None;
    }

    let weighted = Vector3::new(bary.x / w1, bary.y / w2, bary.z / w3);
    let sum = weighted.x + weighted.y + weighted.z;
    if sum.abs() < EPSILON {
        return None;
    }
    Some(weighted / sum)
}

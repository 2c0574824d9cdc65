use crate::error::HomographyError;

/// Isotropic similarity transform used to condition a 2D point set.
///
/// Maps `p` to `scale * (p - centroid)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity2d {
    /// Centroid of the original point set.
    pub centroid: [f64; 2],
    /// Uniform scale factor.
    pub scale: f64,
}

impl Similarity2d {
    /// The transform as a 3x3 matrix `[[s, 0, -s*mx], [0, s, -s*my], [0, 0, 1]]`.
    pub fn matrix(&self) -> [[f64; 3]; 3] {
        let s = self.scale;
        let [mx, my] = self.centroid;
        [[s, 0.0, -s * mx], [0.0, s, -s * my], [0.0, 0.0, 1.0]]
    }

    /// The inverse transform as a 3x3 matrix `[[1/s, 0, mx], [0, 1/s, my], [0, 0, 1]]`.
    pub fn inverse_matrix(&self) -> [[f64; 3]; 3] {
        let inv_s = 1.0 / self.scale;
        let [mx, my] = self.centroid;
        [[inv_s, 0.0, mx], [0.0, inv_s, my], [0.0, 0.0, 1.0]]
    }

    /// Apply the transform to a point.
    pub fn apply(&self, p: &[f64; 2]) -> [f64; 2] {
        [
            (p[0] - self.centroid[0]) * self.scale,
            (p[1] - self.centroid[1]) * self.scale,
        ]
    }
}

/// Normalize a 2D point set (Hartley normalization).
///
/// The points are translated so their centroid is the origin and uniformly scaled so their
/// mean distance to the origin is `sqrt(2)`.
///
/// # Arguments
///
/// * `points` - The points to normalize.
///
/// # Returns
///
/// The normalized points and the similarity transform that produced them.
///
/// Fails with [`HomographyError::DegenerateConfiguration`] if the set is empty or all points
/// coincide.
pub fn normalize_points_2d(
    points: &[[f64; 2]],
) -> Result<(Vec<[f64; 2]>, Similarity2d), HomographyError> {
    if points.is_empty() {
        return Err(HomographyError::DegenerateConfiguration(
            "cannot normalize an empty point set".to_string(),
        ));
    }

    let n = points.len() as f64;
    let (mut mx, mut my) = (0.0, 0.0);
    for p in points {
        mx += p[0];
        my += p[1];
    }
    mx /= n;
    my /= n;

    let mut mean_dist = 0.0;
    for p in points {
        let dx = p[0] - mx;
        let dy = p[1] - my;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;

    // all points on the centroid, or spread too small to be represented
    if !(mean_dist > f64::EPSILON * (mx.abs() + my.abs()).max(1.0)) {
        return Err(HomographyError::DegenerateConfiguration(format!(
            "all points coincide (mean distance to centroid {mean_dist:e})"
        )));
    }

    let transform = Similarity2d {
        centroid: [mx, my],
        scale: std::f64::consts::SQRT_2 / mean_dist,
    };

    let normalized = points.iter().map(|p| transform.apply(p)).collect();

    Ok((normalized, transform))
}

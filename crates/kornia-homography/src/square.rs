use crate::error::HomographyError;
use crate::homography::Homography;

/// Corners of the canonical square, in the winding order expected by [`square_homography`].
pub const CANONICAL_SQUARE: [[f64; 2]; 4] = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];

/// Parameters for [`square_homography_with_params`].
#[derive(Debug, Clone)]
pub struct SquareParams {
    /// Minimum absolute value of any corner triangle's doubled area, relative to the squared
    /// extent of the quad, below which the three corners are treated as collinear.
    pub collinearity_tol: f64,
}

impl Default for SquareParams {
    fn default() -> Self {
        Self {
            collinearity_tol: 1e-9,
        }
    }
}

/// Compute the homography mapping the canonical square onto four corners.
///
/// The source points are implicitly [`CANONICAL_SQUARE`], the axis-aligned unit square centred
/// at the origin. See [`square_homography_with_params`].
///
/// Example:
///
/// ```
/// use kornia_homography::{square_homography, Homography, CANONICAL_SQUARE};
///
/// let h = square_homography(&CANONICAL_SQUARE)?;
/// assert!(h.diff_up_to_scale(&Homography::IDENTITY) < 1e-12);
/// # Ok::<(), kornia_homography::HomographyError>(())
/// ```
pub fn square_homography(corners: &[[f64; 2]; 4]) -> Result<Homography, HomographyError> {
    square_homography_with_params(corners, &SquareParams::default())
}

/// Compute the homography mapping the canonical square onto four corners.
///
/// Because the source is fixed, the 8x8 linear system of the general four point problem has a
/// closed-form solution: the square-to-quad map of `[0, 1]^2` is solved analytically and then
/// composed with the translation taking [`CANONICAL_SQUARE`] onto `[0, 1]^2`. The result is
/// scaled with [`Homography::normalized`], i.e. `H[2][2] = 1` whenever possible.
///
/// # Arguments
///
/// * `corners` - The destination corners, matching the winding of [`CANONICAL_SQUARE`].
/// * `params` - Numerical tolerances.
///
/// Fails with [`HomographyError::DegenerateConfiguration`] if any three corners are collinear
/// or coincident, or if the quad is folded such that the centre of the square maps to infinity.
pub fn square_homography_with_params(
    corners: &[[f64; 2]; 4],
    params: &SquareParams,
) -> Result<Homography, HomographyError> {
    check_no_three_collinear(corners, params.collinearity_tol)?;

    let [[x0, y0], [x1, y1], [x2, y2], [x3, y3]] = *corners;

    let dx1 = x1 - x2;
    let dx2 = x3 - x2;
    let dy1 = y1 - y2;
    let dy2 = y3 - y2;
    // zero for a parallelogram, in which case the map is affine
    let sx = x0 - x1 + x2 - x3;
    let sy = y0 - y1 + y2 - y3;

    // twice the signed area of the triangle (p1, p2, p3), non-zero after the collinearity check
    let den = dx1 * dy2 - dx2 * dy1;
    let g = (sx * dy2 - dx2 * sy) / den;
    let h = (dx1 * sy - sx * dy1) / den;

    // [0, 1]^2 -> quad
    let a = x1 - x0 + g * x1;
    let b = x3 - x0 + h * x3;
    let c = x0;
    let d = y1 - y0 + g * y1;
    let e = y3 - y0 + h * y3;
    let f = y0;

    // compose with the shift (u, v) = (x + 0.5, y + 0.5) of the canonical square
    let h22 = 0.5 * (g + h) + 1.0;
    let homo = Homography::from_array([
        [a, b, 0.5 * (a + b) + c],
        [d, e, 0.5 * (d + e) + f],
        [g, h, h22],
    ]);

    // the centre of the square would map to infinity
    if !(h22.abs() > params.collinearity_tol * (1.0 + g.abs() + h.abs())) {
        return Err(HomographyError::DegenerateConfiguration(format!(
            "square centre maps to infinity (H[2][2] = {h22:e})"
        )));
    }

    Ok(homo.normalized())
}

// The four triangles obtained by dropping one corner at a time.
const CORNER_TRIPLES: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];

// Every triple of the four corners must span a triangle.
fn check_no_three_collinear(corners: &[[f64; 2]; 4], tol: f64) -> Result<(), HomographyError> {
    let mut extent = 0.0f64;
    for i in 0..4 {
        for j in (i + 1)..4 {
            let dx = corners[i][0] - corners[j][0];
            let dy = corners[i][1] - corners[j][1];
            extent = extent.max(dx * dx + dy * dy);
        }
    }

    if !(extent > 0.0) || !extent.is_finite() {
        return Err(HomographyError::DegenerateConfiguration(
            "square corners coincide or are not finite".to_string(),
        ));
    }

    for (skip, [ia, ib, ic]) in CORNER_TRIPLES.iter().enumerate() {
        let (pa, pb, pc) = (corners[*ia], corners[*ib], corners[*ic]);
        let area2 = (pb[0] - pa[0]) * (pc[1] - pa[1]) - (pb[1] - pa[1]) * (pc[0] - pa[0]);
        if area2.abs() <= tol * extent {
            log::warn!("square corners are collinear: skipping corner {skip} gives area {area2:e}");
            return Err(HomographyError::DegenerateConfiguration(format!(
                "three square corners are collinear (corner {skip} excluded)"
            )));
        }
    }

    Ok(())
}

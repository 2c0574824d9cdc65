use std::ops::Mul;

use serde::{Deserialize, Serialize};

use crate::error::HomographyError;
use crate::linalg;

/// Relative magnitude below which the bottom-right entry is not used to fix the scale.
const SCALE_PIVOT_TOL: f64 = 1e-12;

/// A planar projective transformation, stored as a row-major 3x3 matrix.
///
/// A homography is only defined up to a non-zero scalar: `H` and `k * H` map points
/// identically. Use [`Homography::diff_up_to_scale`] to compare two estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Homography([[f64; 3]; 3]);

impl Homography {
    /// The identity homography.
    pub const IDENTITY: Self = Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    /// Wrap a row-major 3x3 matrix.
    pub fn from_array(data: [[f64; 3]; 3]) -> Self {
        Self(data)
    }

    /// Borrow the underlying row-major matrix.
    pub fn as_array(&self) -> &[[f64; 3]; 3] {
        &self.0
    }

    /// Unwrap into the underlying row-major matrix.
    pub fn into_array(self) -> [[f64; 3]; 3] {
        self.0
    }

    /// The determinant of the matrix.
    pub fn determinant(&self) -> f64 {
        linalg::det_mat33(&self.0)
    }

    /// Map a point through the homography, including the homogeneous division.
    ///
    /// Points mapped onto the line at infinity come back with non-finite coordinates.
    pub fn transform_point(&self, p: &[f64; 2]) -> [f64; 2] {
        let mut out = [0.0; 3];
        linalg::mat33_mul_vec3(&self.0, &[p[0], p[1], 1.0], &mut out);
        [out[0] / out[2], out[1] / out[2]]
    }

    /// Map a set of points through the homography.
    pub fn transform_points(&self, points: &[[f64; 2]]) -> Vec<[f64; 2]> {
        points.iter().map(|p| self.transform_point(p)).collect()
    }

    /// The inverse homography, mapping destination points back to source points.
    pub fn inverse(&self) -> Result<Self, HomographyError> {
        linalg::inverse_mat33(&self.0)
            .map(|inv| Self(inv).normalized())
            .ok_or_else(|| {
                HomographyError::DegenerateHomography("matrix is not invertible".to_string())
            })
    }

    /// Multiply every entry by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = self.0;
        out.iter_mut().flatten().for_each(|v| *v *= factor);
        Self(out)
    }

    /// Fix the free scale of the matrix.
    ///
    /// The matrix is divided by its bottom-right entry so that `H[2][2] = 1`. When that entry is
    /// (relatively) zero, e.g. when the source origin maps to infinity, the matrix is instead
    /// scaled to unit Frobenius norm with its largest-magnitude entry positive.
    pub fn normalized(&self) -> Self {
        let norm = linalg::frobenius_norm_mat33(&self.0);
        if norm == 0.0 || !norm.is_finite() {
            return *self;
        }

        let h22 = self.0[2][2];
        if h22.abs() > SCALE_PIVOT_TOL * norm {
            return self.scaled(1.0 / h22);
        }

        let pivot = self
            .0
            .iter()
            .flatten()
            .copied()
            .fold(0.0f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
        self.scaled(pivot.signum() / norm)
    }

    /// Distance between two homographies, ignoring their scale and sign.
    ///
    /// Both matrices are scaled to unit Frobenius norm and sign-aligned before taking the
    /// Frobenius norm of their difference. Zero means both describe the same projective map.
    pub fn diff_up_to_scale(&self, other: &Homography) -> f64 {
        let na = linalg::frobenius_norm_mat33(&self.0);
        let nb = linalg::frobenius_norm_mat33(&other.0);
        if na == 0.0 || nb == 0.0 {
            return f64::INFINITY;
        }

        let dot: f64 = self
            .0
            .iter()
            .flatten()
            .zip(other.0.iter().flatten())
            .map(|(a, b)| a * b)
            .sum();
        let sign = if dot < 0.0 { -1.0 } else { 1.0 };

        self.0
            .iter()
            .flatten()
            .zip(other.0.iter().flatten())
            .map(|(a, b)| {
                let d = a / na - sign * b / nb;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Root-mean-square transfer error of `src -> dst` under this homography.
    ///
    /// Measured in destination units, `sqrt(mean(|H(src_i) - dst_i|^2))`.
    pub fn transfer_rmse(
        &self,
        src: &[[f64; 2]],
        dst: &[[f64; 2]],
    ) -> Result<f64, HomographyError> {
        if src.len() != dst.len() {
            return Err(HomographyError::MismatchedLengths {
                src_len: src.len(),
                dst_len: dst.len(),
            });
        }
        if src.is_empty() {
            return Err(HomographyError::InsufficientCorrespondences {
                required: 1,
                actual: 0,
            });
        }

        let sum_sq: f64 = src
            .iter()
            .zip(dst.iter())
            .map(|(s, d)| {
                let p = self.transform_point(s);
                (p[0] - d[0]).powi(2) + (p[1] - d[1]).powi(2)
            })
            .sum();

        Ok((sum_sq / src.len() as f64).sqrt())
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[[f64; 3]; 3]> for Homography {
    fn from(data: [[f64; 3]; 3]) -> Self {
        Self(data)
    }
}

impl From<Homography> for [[f64; 3]; 3] {
    fn from(h: Homography) -> Self {
        h.0
    }
}

// Composition: (a * b)(p) == a(b(p))
impl Mul<Homography> for Homography {
    type Output = Homography;

    fn mul(self, rhs: Homography) -> Self::Output {
        Self(linalg::mat33_mul(&self.0, &rhs.0))
    }
}

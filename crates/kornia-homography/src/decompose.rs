use glam::DVec3;
use kornia_pose::{rotation::rotation_matrix_to_quaternion, Pose};

use crate::error::HomographyError;
use crate::homography::Homography;
use crate::linalg;

/// Parameters for [`pose_from_homography_with_params`].
#[derive(Debug, Clone)]
pub struct PoseParams {
    /// Minimum `|det(K^-1)|`, relative to the product of its row norms. The ratio does not
    /// depend on the scale of each row, e.g. on the focal length.
    pub det_tol: f64,
    /// Minimum norm of the columns of `K^-1 * H`, relative to its Frobenius norm, and minimum
    /// separation of the two rotation columns before orthonormalization.
    pub norm_tol: f64,
}

impl Default for PoseParams {
    fn default() -> Self {
        Self {
            det_tol: 1e-12,
            norm_tol: 1e-9,
        }
    }
}

/// Recover the pose of a plane from its homography with default parameters.
///
/// See [`pose_from_homography_with_params`].
pub fn pose_from_homography(
    homography: &Homography,
    inv_intrinsics: &[[f64; 3]; 3],
) -> Result<Pose, HomographyError> {
    pose_from_homography_with_params(homography, inv_intrinsics, &PoseParams::default())
}

/// Recover the pose of a plane from its homography.
///
/// The homography maps points `(x, y)` of the plane `z = 0` to pixels and factors as
/// `H = lambda * K * [r1 r2 t]`, where `r1`, `r2` are the first two columns of the rotation and
/// `t` the translation of the returned pose (plane frame to camera frame).
///
/// 1. `M = K^-1 * H`, and `lambda = 1 / |M_col0|`.
/// 2. The sign of `lambda` is chosen so the plane origin lies in front of the camera
///    (`t_z > 0`).
/// 3. `r1` and `r2` are made orthonormal symmetrically: both are rotated by the same amount
///    away from their bisector until they are perpendicular. `r3 = r1 x r2`.
/// 4. `t = lambda * M_col2` and the rotation matrix is converted to a unit quaternion.
///
/// Both the usual intrinsics `[[fx, 0, cx], [0, fy, cy], [0, 0, 1]]` and conventions with a
/// mirrored last column work, as only `K^-1` enters the computation.
///
/// # Arguments
///
/// * `homography` - Plane to image homography.
/// * `inv_intrinsics` - The inverse camera intrinsics `K^-1`.
/// * `params` - Numerical tolerances.
///
/// # Errors
///
/// * [`HomographyError::SingularIntrinsics`] if `K^-1` is not invertible.
/// * [`HomographyError::DegenerateHomography`] if the scale cannot be recovered or the first
///   two columns do not span a plane.
pub fn pose_from_homography_with_params(
    homography: &Homography,
    inv_intrinsics: &[[f64; 3]; 3],
    params: &PoseParams,
) -> Result<Pose, HomographyError> {
    let det_k = linalg::det_mat33(inv_intrinsics);
    let row_norms: f64 = inv_intrinsics.iter().map(linalg::norm_vec3).product();
    if !(det_k.abs() > params.det_tol * row_norms) {
        return Err(HomographyError::SingularIntrinsics(det_k));
    }

    let m = linalg::mat33_mul(inv_intrinsics, homography.as_array());
    let m_norm = linalg::frobenius_norm_mat33(&m);
    let (m0, m1, m2) = (
        linalg::col_mat33(&m, 0),
        linalg::col_mat33(&m, 1),
        linalg::col_mat33(&m, 2),
    );

    let m0_norm = linalg::norm_vec3(&m0);
    if !(m0_norm > params.norm_tol * m_norm) {
        return Err(HomographyError::DegenerateHomography(format!(
            "first column of K^-1 * H has norm {m0_norm:e}, scale is undefined"
        )));
    }

    // H is only known up to sign: keep the plane in front of the camera
    let mut lambda = 1.0 / m0_norm;
    if m2[2] < 0.0 {
        lambda = -lambda;
    } else if m2[2] == 0.0 {
        log::warn!("pose from homography: plane origin at zero depth, keeping positive scale");
    }

    let r1 = linalg::scale_vec3(&m0, lambda);
    let r2 = linalg::scale_vec3(&m1, lambda);
    let t = linalg::scale_vec3(&m2, lambda);

    log::debug!(
        "pose from homography: lambda = {:e}, |r2| = {:e}, r1.r2 = {:e}",
        lambda,
        linalg::norm_vec3(&r2),
        linalg::dot_product3(&r1, &r2)
    );

    let (r1, r2) = orthonormalize_pair(&r1, &r2, params.norm_tol)?;

    let mut r3 = [0.0; 3];
    linalg::cross_vec3(&r1, &r2, &mut r3);

    let mut rotation = [
        [r1[0], r2[0], r3[0]],
        [r1[1], r2[1], r3[1]],
        [r1[2], r2[2], r3[2]],
    ];
    if linalg::det_mat33(&rotation) < 0.0 {
        for row in rotation.iter_mut() {
            row[2] = -row[2];
        }
    }

    Ok(Pose::new(
        rotation_matrix_to_quaternion(&rotation),
        DVec3::from_array(t),
    ))
}

// Symmetric orthonormalization of two nearly orthonormal vectors.
//
// With a, b of unit length, (a + b) and (a - b) are exactly perpendicular. Their normalized
// versions are the bisector and anti-bisector, and rotating them by 45 degrees gives the closest
// orthonormal pair, with the correction split evenly between a and b.
fn orthonormalize_pair(
    a: &[f64; 3],
    b: &[f64; 3],
    tol: f64,
) -> Result<([f64; 3], [f64; 3]), HomographyError> {
    let (na, nb) = (linalg::norm_vec3(a), linalg::norm_vec3(b));
    if !(nb > tol) {
        return Err(HomographyError::DegenerateHomography(format!(
            "second rotation column has norm {nb:e}"
        )));
    }
    let a = linalg::scale_vec3(a, 1.0 / na);
    let b = linalg::scale_vec3(b, 1.0 / nb);

    let sum = [a[0] + b[0], a[1] + b[1], a[2] + b[2]];
    let diff = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    let (n_sum, n_diff) = (linalg::norm_vec3(&sum), linalg::norm_vec3(&diff));
    if !(n_sum > tol && n_diff > tol) {
        return Err(HomographyError::DegenerateHomography(
            "rotation columns are parallel".to_string(),
        ));
    }

    let bisector = linalg::scale_vec3(&sum, 1.0 / n_sum);
    let anti = linalg::scale_vec3(&diff, 1.0 / n_diff);
    let k = std::f64::consts::FRAC_1_SQRT_2;

    Ok((
        [
            (bisector[0] + anti[0]) * k,
            (bisector[1] + anti[1]) * k,
            (bisector[2] + anti[2]) * k,
        ],
        [
            (bisector[0] - anti[0]) * k,
            (bisector[1] - anti[1]) * k,
            (bisector[2] - anti[2]) * k,
        ],
    ))
}

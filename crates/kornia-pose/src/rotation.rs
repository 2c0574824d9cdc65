use glam::DQuat;

/// Convert a row-major rotation matrix into a unit quaternion.
///
/// Uses Shepperd's method: the largest of `1 + trace` and the three `1 + 2 r_ii - trace` terms
/// is taken under the square root, so the divisor of the remaining components never gets close
/// to zero. This keeps the conversion stable for rotations close to 180 degrees, where the
/// trace approaches -1 and the classic `w = sqrt(1 + trace) / 2` formula breaks down.
///
/// The returned quaternion is normalized and lies in the `w >= 0` hemisphere.
///
/// PRECONDITION: `r` is orthonormal with determinant +1.
///
/// Example:
///
/// ```
/// use kornia_pose::rotation::rotation_matrix_to_quaternion;
///
/// let r = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// let q = rotation_matrix_to_quaternion(&r);
/// assert_eq!(q.to_array(), [0.0, 0.0, 0.0, 1.0]);
/// ```
pub fn rotation_matrix_to_quaternion(r: &[[f64; 3]; 3]) -> DQuat {
    let trace = r[0][0] + r[1][1] + r[2][2];

    let (x, y, z, w) = if trace >= r[0][0] && trace >= r[1][1] && trace >= r[2][2] {
        // s = 4 * w
        let s = (1.0 + trace).sqrt() * 2.0;
        (
            (r[2][1] - r[1][2]) / s,
            (r[0][2] - r[2][0]) / s,
            (r[1][0] - r[0][1]) / s,
            0.25 * s,
        )
    } else if r[0][0] >= r[1][1] && r[0][0] >= r[2][2] {
        // s = 4 * x
        let s = (1.0 + r[0][0] - r[1][1] - r[2][2]).sqrt() * 2.0;
        (
            0.25 * s,
            (r[0][1] + r[1][0]) / s,
            (r[0][2] + r[2][0]) / s,
            (r[2][1] - r[1][2]) / s,
        )
    } else if r[1][1] >= r[2][2] {
        // s = 4 * y
        let s = (1.0 + r[1][1] - r[0][0] - r[2][2]).sqrt() * 2.0;
        (
            (r[0][1] + r[1][0]) / s,
            0.25 * s,
            (r[1][2] + r[2][1]) / s,
            (r[0][2] - r[2][0]) / s,
        )
    } else {
        // s = 4 * z
        let s = (1.0 + r[2][2] - r[0][0] - r[1][1]).sqrt() * 2.0;
        (
            (r[0][2] + r[2][0]) / s,
            (r[1][2] + r[2][1]) / s,
            0.25 * s,
            (r[1][0] - r[0][1]) / s,
        )
    };

    let q = DQuat::from_xyzw(x, y, z, w).normalize();
    if q.w < 0.0 {
        -q
    } else {
        q
    }
}

/// Convert a unit quaternion into a row-major rotation matrix.
pub fn quaternion_to_rotation_matrix(q: &DQuat) -> [[f64; 3]; 3] {
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    let (xx, yy, zz) = (x * x, y * y, z * z);
    let (xy, xz, yz) = (x * y, x * z, y * z);
    let (wx, wy, wz) = (w * x, w * y, w * z);

    [
        [1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy)],
        [2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx)],
        [2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy)],
    ]
}

/// Largest deviation of `r` from a proper rotation.
///
/// Returns the maximum over the entries of `|R * R^T - I|` and `|det(R) - 1|`.
pub fn orthonormality_error(r: &[[f64; 3]; 3]) -> f64 {
    let mut err = 0.0f64;
    for i in 0..3 {
        for j in 0..3 {
            let dot = r[i][0] * r[j][0] + r[i][1] * r[j][1] + r[i][2] * r[j][2];
            let expected = if i == j { 1.0 } else { 0.0 };
            err = err.max((dot - expected).abs());
        }
    }

    let det = r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
        - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
        + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0]);

    err.max((det - 1.0).abs())
}

/// Check that `r` is orthonormal with determinant +1 within `tol`.
pub fn is_rotation_matrix(r: &[[f64; 3]; 3], tol: f64) -> bool {
    orthonormality_error(r) <= tol
}

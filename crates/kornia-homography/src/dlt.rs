use crate::error::HomographyError;
use crate::homography::Homography;
use crate::linalg;
use crate::normalize::normalize_points_2d;

/// Minimum number of correspondences for a homography.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Parameters for [`homography_dlt_estimate`].
#[derive(Debug, Clone)]
pub struct DltParams {
    /// Minimum ratio between the second-smallest and the largest singular value of the
    /// normalized system. Below it the null space is not one-dimensional, e.g. because all the
    /// source points are collinear.
    pub rank_tol: f64,
    /// Minimum absolute determinant of the unit-norm homography in normalized coordinates.
    /// Below it the estimate is singular, e.g. because all destination points are collinear.
    pub det_tol: f64,
}

impl Default for DltParams {
    fn default() -> Self {
        Self {
            rank_tol: 1e-8,
            det_tol: 1e-10,
        }
    }
}

/// Result of a DLT homography fit.
#[derive(Debug, Clone, Copy)]
pub struct HomographyEstimate {
    /// The estimated homography, mapping source points to destination points.
    pub homography: Homography,
    /// Conditioning of the estimate: second-smallest over largest singular value of the
    /// normalized linear system, in `(0, 1]`. Larger is better; values close to
    /// [`DltParams::rank_tol`] indicate a nearly degenerate configuration.
    pub condition: f64,
}

/// Estimate the homography from `src` to `dst` with the normalized DLT and default parameters.
///
/// See [`homography_dlt_estimate`].
///
/// Example:
///
/// ```
/// use kornia_homography::{homography_dlt, Homography};
///
/// let src = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.5, 0.25]];
/// let dst: Vec<_> = src.iter().map(|p| [2.0 * p[0] + 1.0, 2.0 * p[1] - 1.0]).collect();
///
/// let h = homography_dlt(&src, &dst)?;
/// let expected = Homography::from_array([[2.0, 0.0, 1.0], [0.0, 2.0, -1.0], [0.0, 0.0, 1.0]]);
/// assert!(h.diff_up_to_scale(&expected) < 1e-9);
/// # Ok::<(), kornia_homography::HomographyError>(())
/// ```
pub fn homography_dlt(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
) -> Result<Homography, HomographyError> {
    homography_dlt_estimate(src, dst, &DltParams::default()).map(|est| est.homography)
}

/// Estimate the homography from `src` to `dst` with the normalized Direct Linear Transform.
///
/// 1. Both point sets are normalized independently (centroid at the origin, mean distance
///    `sqrt(2)`), giving the similarities `T_src` and `T_dst`.
/// 2. Each correspondence adds the two rows of the constraint `dst x (H * src) = 0` to a
///    `2N x 9` system acting on `H` flattened row-major.
/// 3. The solution is the right singular vector of the smallest singular value.
/// 4. The result is brought back to the original coordinates, `H = T_dst^-1 * H_n * T_src`,
///    and its scale fixed with [`Homography::normalized`].
///
/// # Arguments
///
/// * `src` - The source points, at least four.
/// * `dst` - The destination points, same length as `src`.
/// * `params` - Rank and determinant tolerances.
///
/// # Errors
///
/// * [`HomographyError::MismatchedLengths`] if the slices differ in length.
/// * [`HomographyError::InsufficientCorrespondences`] with fewer than four pairs.
/// * [`HomographyError::DegenerateConfiguration`] if the system is rank deficient or the
///   estimate is singular.
pub fn homography_dlt_estimate(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    params: &DltParams,
) -> Result<HomographyEstimate, HomographyError> {
    if src.len() != dst.len() {
        return Err(HomographyError::MismatchedLengths {
            src_len: src.len(),
            dst_len: dst.len(),
        });
    }
    if src.len() < MIN_CORRESPONDENCES {
        return Err(HomographyError::InsufficientCorrespondences {
            required: MIN_CORRESPONDENCES,
            actual: src.len(),
        });
    }

    let (src_n, t_src) = normalize_points_2d(src)?;
    let (dst_n, t_dst) = normalize_points_2d(dst)?;

    // construct matrix A
    let n = src_n.len();
    let mut mat_a = faer::Mat::<f64>::zeros(2 * n, 9);
    for (i, (s, d)) in src_n.iter().zip(dst_n.iter()).enumerate() {
        let (x, y) = (s[0], s[1]);
        let (u, v) = (d[0], d[1]);

        mat_a[(2 * i, 3)] = -x;
        mat_a[(2 * i, 4)] = -y;
        mat_a[(2 * i, 5)] = -1.0;
        mat_a[(2 * i, 6)] = v * x;
        mat_a[(2 * i, 7)] = v * y;
        mat_a[(2 * i, 8)] = v;

        mat_a[(2 * i + 1, 0)] = x;
        mat_a[(2 * i + 1, 1)] = y;
        mat_a[(2 * i + 1, 2)] = 1.0;
        mat_a[(2 * i + 1, 6)] = -u * x;
        mat_a[(2 * i + 1, 7)] = -u * y;
        mat_a[(2 * i + 1, 8)] = -u;
    }

    // singular values come sorted in decreasing order; with four points A is 8x9 and only
    // eight are returned, the ninth being the exact zero of the null space
    let svd = mat_a.svd();
    let s = svd.s_diagonal();
    let s_max = s.read(0);
    let s_second = s.read(7);
    let condition = if s_max > 0.0 { s_second / s_max } else { 0.0 };

    log::debug!(
        "homography dlt: n = {}, s_max = {:e}, s_second = {:e}, condition = {:e}",
        n,
        s_max,
        s_second,
        condition
    );

    if !(condition > params.rank_tol) {
        log::warn!("homography dlt: rank deficient system (condition {condition:e})");
        return Err(HomographyError::DegenerateConfiguration(format!(
            "linear system is rank deficient (condition {condition:e}), \
             are the source points collinear?"
        )));
    }

    // take the right singular vector of the smallest singular value
    let v = svd.v();
    let h_n = [
        [v.read(0, 8), v.read(1, 8), v.read(2, 8)],
        [v.read(3, 8), v.read(4, 8), v.read(5, 8)],
        [v.read(6, 8), v.read(7, 8), v.read(8, 8)],
    ];

    // h_n has unit Frobenius norm, so its determinant is scale free
    let det_n = linalg::det_mat33(&h_n);
    if !(det_n.abs() > params.det_tol) {
        log::warn!("homography dlt: singular estimate (det {det_n:e})");
        return Err(HomographyError::DegenerateConfiguration(format!(
            "estimated homography is singular (det {det_n:e}), \
             are the destination points collinear?"
        )));
    }

    // denormalize: H = T_dst^-1 * H_n * T_src
    let homo = linalg::mat33_mul(
        &linalg::mat33_mul(&t_dst.inverse_matrix(), &h_n),
        &t_src.matrix(),
    );

    Ok(HomographyEstimate {
        homography: Homography::from_array(homo).normalized(),
        condition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::CANONICAL_SQUARE;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_homography(rng: &mut StdRng) -> Homography {
        Homography::from_array([
            [
                rng.random_range(0.5..2.0),
                rng.random_range(-0.2..0.2),
                rng.random_range(-50.0..50.0),
            ],
            [
                rng.random_range(-0.2..0.2),
                rng.random_range(0.5..2.0),
                rng.random_range(-50.0..50.0),
            ],
            [
                rng.random_range(-1e-3..1e-3),
                rng.random_range(-1e-3..1e-3),
                1.0,
            ],
        ])
    }

    fn random_points(rng: &mut StdRng, n: usize) -> Vec<[f64; 2]> {
        (0..n)
            .map(|_| {
                [
                    rng.random_range(-100.0..100.0),
                    rng.random_range(-100.0..100.0),
                ]
            })
            .collect()
    }

    #[test]
    fn test_dlt_identity() -> Result<(), Box<dyn std::error::Error>> {
        let h = homography_dlt(&CANONICAL_SQUARE, &CANONICAL_SQUARE)?;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(h.as_array()[i][j], expected, epsilon = 1e-6);
            }
        }
        Ok(())
    }

    #[test]
    fn test_dlt_four_points() -> Result<(), Box<dyn std::error::Error>> {
        let src = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let h_true =
            Homography::from_array([[1.0, 0.2, 1.0], [0.1, 0.8, -2.0], [0.05, -0.02, 1.0]]);
        let dst = h_true.transform_points(&src);
        let h = homography_dlt(&src, &dst)?;
        assert!(h.diff_up_to_scale(&h_true) < 1e-9);
        Ok(())
    }

    #[test]
    fn test_dlt_random_recovery() -> Result<(), Box<dyn std::error::Error>> {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..1000 {
            let h_true = random_homography(&mut rng);
            let n = rng.random_range(10..=50);
            let src = random_points(&mut rng, n);
            let dst = h_true.transform_points(&src);

            let h = homography_dlt(&src, &dst)?;
            assert!(h.diff_up_to_scale(&h_true) < 1e-6);
            assert!(h.transfer_rmse(&src, &dst)? < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_dlt_scale_invariance() -> Result<(), Box<dyn std::error::Error>> {
        let mut rng = StdRng::seed_from_u64(1);
        let h_true = random_homography(&mut rng);
        let src = random_points(&mut rng, 20);

        let h_a = homography_dlt(&src, &h_true.transform_points(&src))?;
        let h_b = homography_dlt(&src, &h_true.scaled(-7.3).transform_points(&src))?;
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(h_a.as_array()[i][j], h_b.as_array()[i][j], epsilon = 1e-9);
            }
        }
        Ok(())
    }

    #[test]
    fn test_dlt_condition_indicator() -> Result<(), Box<dyn std::error::Error>> {
        let h_true =
            Homography::from_array([[1.0, 0.1, 3.0], [0.0, 1.1, -1.0], [1e-3, 0.0, 1.0]]);
        let params = DltParams::default();

        let spread = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [5.0, 5.0]];
        let well = homography_dlt_estimate(&spread, &h_true.transform_points(&spread), &params)?;

        // almost on the line y = x
        let thin = [[0.0, 0.0], [10.0, 10.01], [5.0, 4.99], [2.0, 2.0], [7.0, 7.01]];
        let poor = homography_dlt_estimate(&thin, &h_true.transform_points(&thin), &params)?;

        assert!(well.condition <= 1.0);
        assert!(poor.condition > params.rank_tol);
        assert!(poor.condition < well.condition);
        Ok(())
    }

    #[test]
    fn test_dlt_noisy_points() -> Result<(), Box<dyn std::error::Error>> {
        let mut rng = StdRng::seed_from_u64(5);
        let h_true = random_homography(&mut rng);
        let src = random_points(&mut rng, 200);
        let dst: Vec<_> = h_true
            .transform_points(&src)
            .into_iter()
            .map(|p| {
                [
                    p[0] + rng.random_range(-0.1..0.1),
                    p[1] + rng.random_range(-0.1..0.1),
                ]
            })
            .collect();

        let h = homography_dlt(&src, &dst)?;
        assert!(h.transfer_rmse(&src, &dst)? < 0.2);
        Ok(())
    }

    #[test]
    fn test_dlt_insufficient() {
        let src = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        assert_eq!(
            homography_dlt(&src, &src),
            Err(HomographyError::InsufficientCorrespondences {
                required: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_dlt_mismatched() {
        let src = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        assert_eq!(
            homography_dlt(&src, &src[..3]),
            Err(HomographyError::MismatchedLengths {
                src_len: 4,
                dst_len: 3
            })
        );
    }

    #[test]
    fn test_dlt_collinear_source() {
        let src = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let dst = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        assert!(matches!(
            homography_dlt(&src, &dst),
            Err(HomographyError::DegenerateConfiguration(_))
        ));
    }

    #[test]
    fn test_dlt_collinear_both() {
        let points = [[-1.0, 0.5], [0.0, 1.0], [1.0, 1.5], [3.0, 2.5]];
        assert!(matches!(
            homography_dlt(&points, &points),
            Err(HomographyError::DegenerateConfiguration(_))
        ));
    }

    #[test]
    fn test_dlt_collinear_destination() {
        let src = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let dst = [[0.0, 0.0], [1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        assert!(matches!(
            homography_dlt(&src, &dst),
            Err(HomographyError::DegenerateConfiguration(_))
        ));
    }
}

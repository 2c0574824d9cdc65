use rayon::prelude::*;

use kornia_pose::Pose;

use crate::decompose::{pose_from_homography_with_params, PoseParams};
use crate::dlt::{homography_dlt_estimate, DltParams, HomographyEstimate};
use crate::error::HomographyError;
use crate::homography::Homography;

/// A set of matched source and destination points.
#[derive(Debug, Clone, PartialEq)]
pub struct Correspondences {
    src: Vec<[f64; 2]>,
    dst: Vec<[f64; 2]>,
}

impl Correspondences {
    /// Pair up source and destination points.
    ///
    /// Fails with [`HomographyError::MismatchedLengths`] if the sets differ in length.
    pub fn new(src: Vec<[f64; 2]>, dst: Vec<[f64; 2]>) -> Result<Self, HomographyError> {
        if src.len() != dst.len() {
            return Err(HomographyError::MismatchedLengths {
                src_len: src.len(),
                dst_len: dst.len(),
            });
        }
        Ok(Self { src, dst })
    }

    /// The source points.
    pub fn src(&self) -> &[[f64; 2]] {
        &self.src
    }

    /// The destination points.
    pub fn dst(&self) -> &[[f64; 2]] {
        &self.dst
    }

    /// Number of correspondences.
    pub fn len(&self) -> usize {
        self.src.len()
    }

    /// Whether the set holds no correspondences.
    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }
}

/// Fit one homography per correspondence set, in parallel.
///
/// The result at index `i` is the [`homography_dlt_estimate`] of `sets[i]`; a failure in one
/// set does not affect the others.
pub fn par_homography_dlt(
    sets: &[Correspondences],
    params: &DltParams,
) -> Vec<Result<HomographyEstimate, HomographyError>> {
    log::debug!("fitting {} homographies", sets.len());
    sets.par_iter()
        .map(|set| homography_dlt_estimate(&set.src, &set.dst, params))
        .collect()
}

/// Recover one pose per homography, in parallel, for a single camera.
///
/// See [`pose_from_homography_with_params`].
pub fn par_pose_from_homography(
    homographies: &[Homography],
    inv_intrinsics: &[[f64; 3]; 3],
    params: &PoseParams,
) -> Vec<Result<Pose, HomographyError>> {
    homographies
        .par_iter()
        .map(|h| pose_from_homography_with_params(h, inv_intrinsics, params))
        .collect()
}

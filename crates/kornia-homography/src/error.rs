/// Errors returned by the homography solvers and the pose decomposition.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HomographyError {
    /// Too few point correspondences for the solver.
    #[error("Homography estimation requires at least {required} correspondences, got {actual}")]
    InsufficientCorrespondences {
        /// Minimum number of correspondences required.
        required: usize,
        /// Number of correspondences provided.
        actual: usize,
    },

    /// Source and destination point sets differ in length.
    #[error("Mismatched correspondences: source ({src_len}) != destination ({dst_len})")]
    MismatchedLengths {
        /// Number of source points.
        src_len: usize,
        /// Number of destination points.
        dst_len: usize,
    },

    /// The points lack the geometric rank needed for a unique solution.
    #[error("Degenerate point configuration: {0}")]
    DegenerateConfiguration(String),

    /// The inverse intrinsics matrix is not invertible.
    #[error("Inverse intrinsics matrix is singular (det = {0})")]
    SingularIntrinsics(f64),

    /// The homography cannot be decomposed into a rigid pose.
    #[error("Degenerate homography: {0}")]
    DegenerateHomography(String),
}

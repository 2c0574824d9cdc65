/// Errors raised when building a [`crate::Pose`] from raw data.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    /// The quaternion part has zero (or non-finite) norm and cannot be normalized.
    #[error("Cannot build a rotation from a quaternion with norm {0}")]
    ZeroQuaternion(f64),

    /// The input slice has the wrong number of elements.
    #[error("Expected {expected} values, got {actual}")]
    InvalidLength {
        /// Number of values required.
        expected: usize,
        /// Number of values provided.
        actual: usize,
    },

    /// The matrix is not orthonormal with determinant +1.
    #[error("Matrix is not a proper rotation (orthonormality error {0})")]
    NotARotation(f64),
}

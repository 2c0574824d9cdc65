#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Kornia Homography
//!
//! Estimation of planar homographies and recovery of the camera pose relative to the plane.
//!
//! ## Key Features
//!
//! - **Square homography**: closed-form map from the canonical unit square to four corners,
//!   e.g. the detected corners of a square fiducial marker
//! - **Normalized DLT**: least-squares homography from four or more correspondences
//! - **Pose from homography**: rotation and translation of the plane given the intrinsics
//! - **Batches**: parallel fitting of many independent correspondence sets
//!
//! ## Example: marker pose
//!
//! ```rust
//! use kornia_homography::{pose_from_homography, square_homography, CANONICAL_SQUARE};
//!
//! // corners of a 100 px marker centred in the image
//! let corners = CANONICAL_SQUARE.map(|p| [100.0 * p[0] + 320.0, 100.0 * p[1] + 240.0]);
//! let h = square_homography(&corners)?;
//!
//! // inverse of K = [[500, 0, 320], [0, 500, 240], [0, 0, 1]]
//! let inv_k = [
//!     [1.0 / 500.0, 0.0, -320.0 / 500.0],
//!     [0.0, 1.0 / 500.0, -240.0 / 500.0],
//!     [0.0, 0.0, 1.0],
//! ];
//! let pose = pose_from_homography(&h, &inv_k)?;
//!
//! // a unit marker seen 100 px wide at f = 500 is 5 units away
//! assert!((pose.translation().z - 5.0).abs() < 1e-9);
//! # Ok::<(), kornia_homography::HomographyError>(())
//! ```

mod error;
pub use error::HomographyError;

mod homography;
pub use homography::Homography;

/// Small fixed-size linear algebra helpers.
pub mod linalg;

/// Conditioning of 2D point sets.
pub mod normalize;

mod square;
pub use square::{square_homography, square_homography_with_params, SquareParams, CANONICAL_SQUARE};

mod dlt;
pub use dlt::{
    homography_dlt, homography_dlt_estimate, DltParams, HomographyEstimate, MIN_CORRESPONDENCES,
};

mod decompose;
pub use decompose::{pose_from_homography, pose_from_homography_with_params, PoseParams};

mod batch;
pub use batch::{par_homography_dlt, par_pose_from_homography, Correspondences};

#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Kornia Pose
//!
//! A rigid transformation between two coordinate frames, stored as a unit quaternion and a
//! translation vector, plus the rotation matrix <-> quaternion conversions needed to build one
//! from the output of a geometric solver.
//!
//! ## Example
//!
//! ```rust
//! use glam::{DQuat, DVec3};
//! use kornia_pose::Pose;
//!
//! let b_from_c = Pose::new(DQuat::from_rotation_z(0.5), DVec3::new(1.0, 0.0, 0.0));
//! let a_from_b = Pose::new(DQuat::IDENTITY, DVec3::new(0.0, 0.0, 2.0));
//!
//! // compose and transform a point from frame C into frame A
//! let a_from_c = a_from_b * b_from_c;
//! let p_a = a_from_c * DVec3::new(0.0, 1.0, 0.0);
//!
//! // serialize as [tx, ty, tz, qx, qy, qz, qw]
//! let v = a_from_c.to_vector();
//! assert_eq!(v[2], 2.0);
//! # let _ = p_a;
//! ```

mod error;
pub use error::PoseError;

/// Rigid pose type.
pub mod pose;
pub use pose::Pose;

/// Rotation matrix and quaternion conversions.
pub mod rotation;

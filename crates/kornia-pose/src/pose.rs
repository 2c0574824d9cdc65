use std::fmt;
use std::ops::Mul;

use glam::{DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::PoseError;
use crate::rotation::{
    orthonormality_error, quaternion_to_rotation_matrix, rotation_matrix_to_quaternion,
};

/// Tolerance used when validating rotation matrices handed to the constructors.
const ROTATION_TOL: f64 = 1e-6;

/// A rigid 6-DoF transformation from frame `B` to frame `A`.
///
/// A point is mapped as `x_A = q * x_B * q^* + t`, where `q` is a unit quaternion and `t` a
/// translation vector. Poses are plain values: every operation returns a new pose.
///
/// Serialized as the seven numbers `[tx, ty, tz, qx, qy, qz, qw]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 7]", into = "[f64; 7]")]
pub struct Pose {
    rotation: DQuat,
    translation: DVec3,
}

impl Pose {
    /// The identity transformation.
    pub const IDENTITY: Self = Self {
        rotation: DQuat::IDENTITY,
        translation: DVec3::ZERO,
    };

    /// Create a pose from a rotation and a translation.
    ///
    /// PRECONDITION: `rotation` is a unit quaternion.
    pub fn new(rotation: DQuat, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Create a pose from a row-major rotation matrix and a translation.
    ///
    /// Fails with [`PoseError::NotARotation`] if the matrix is not orthonormal with determinant +1.
    pub fn from_rotation_matrix(
        rotation: &[[f64; 3]; 3],
        translation: &[f64; 3],
    ) -> Result<Self, PoseError> {
        let err = orthonormality_error(rotation);
        if !(err <= ROTATION_TOL) {
            return Err(PoseError::NotARotation(err));
        }

        Ok(Self {
            rotation: rotation_matrix_to_quaternion(rotation),
            translation: DVec3::from_array(*translation),
        })
    }

    /// Create a pose from a homogeneous 4x4 transformation.
    ///
    /// Only the upper 3x4 block is read.
    pub fn from_matrix4(mat: &DMat4) -> Result<Self, PoseError> {
        // glam stores columns, the rotation helpers expect rows
        let cols = mat.to_cols_array_2d();
        let rotation = [
            [cols[0][0], cols[1][0], cols[2][0]],
            [cols[0][1], cols[1][1], cols[2][1]],
            [cols[0][2], cols[1][2], cols[2][2]],
        ];
        Self::from_rotation_matrix(&rotation, &[cols[3][0], cols[3][1], cols[3][2]])
    }

    /// Build a pose from the ordered layout `[tx, ty, tz, qx, qy, qz, qw]`.
    ///
    /// The quaternion is re-normalized; a zero quaternion is rejected.
    pub fn from_vector(v: &[f64]) -> Result<Self, PoseError> {
        if v.len() != 7 {
            return Err(PoseError::InvalidLength {
                expected: 7,
                actual: v.len(),
            });
        }

        let q = DQuat::from_xyzw(v[3], v[4], v[5], v[6]);
        let norm = q.length();
        if !norm.is_finite() || norm < f64::EPSILON {
            return Err(PoseError::ZeroQuaternion(norm));
        }

        Ok(Self {
            rotation: q / norm,
            translation: DVec3::new(v[0], v[1], v[2]),
        })
    }

    /// Store the pose in the ordered layout `[tx, ty, tz, qx, qy, qz, qw]`.
    pub fn to_vector(&self) -> [f64; 7] {
        let t = self.translation;
        let q = self.rotation;
        [t.x, t.y, t.z, q.x, q.y, q.z, q.w]
    }

    /// The rotation part.
    pub fn rotation(&self) -> DQuat {
        self.rotation
    }

    /// The translation part.
    pub fn translation(&self) -> DVec3 {
        self.translation
    }

    /// The rotation part as a row-major 3x3 matrix.
    pub fn rotation_matrix(&self) -> [[f64; 3]; 3] {
        quaternion_to_rotation_matrix(&self.rotation)
    }

    /// The pose as a row-major 3x4 matrix `[R | t]`.
    pub fn to_matrix3x4(&self) -> [[f64; 4]; 3] {
        let r = self.rotation_matrix();
        let t = self.translation;
        [
            [r[0][0], r[0][1], r[0][2], t.x],
            [r[1][0], r[1][1], r[1][2], t.y],
            [r[2][0], r[2][1], r[2][2], t.z],
        ]
    }

    /// The pose as a homogeneous 4x4 matrix.
    pub fn to_matrix4(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// Transform a point from frame `B` into frame `A`.
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation
    }

    /// Compose two poses.
    ///
    /// If `self` maps `B -> A` and `other` maps `C -> B`, the result maps `C -> A`.
    pub fn compose(&self, other: &Pose) -> Self {
        Self {
            rotation: (self.rotation * other.rotation).normalize(),
            translation: self.translation + self.rotation * other.translation,
        }
    }

    /// The inverse transformation, mapping `A -> B`.
    pub fn inverse(&self) -> Self {
        let inv_rot = self.rotation.conjugate();
        Self {
            rotation: inv_rot,
            translation: -(inv_rot * self.translation),
        }
    }

    /// Scale the translation part, e.g. to change the metric unit.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            rotation: self.rotation,
            translation: self.translation * factor,
        }
    }

    /// Angle in radians of the rotation taking `self.rotation()` onto `other.rotation()`.
    pub fn angular_distance(&self, other: &Pose) -> f64 {
        let d = self.rotation.dot(other.rotation).abs().min(1.0);
        2.0 * d.acos()
    }

    /// Interpolate between two poses.
    ///
    /// The rotation uses spherical linear interpolation, the translation a linear one. `t = 0`
    /// returns `a` and `t = 1` returns `b`.
    pub fn interpolate(a: &Pose, b: &Pose, t: f64) -> Self {
        // take the short arc
        let qb = if a.rotation.dot(b.rotation) < 0.0 {
            -b.rotation
        } else {
            b.rotation
        };

        Self {
            rotation: a.rotation.slerp(qb, t).normalize(),
            translation: a.translation.lerp(b.translation, t),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Pose> for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Self::Output {
        self.compose(&rhs)
    }
}

impl Mul<DVec3> for Pose {
    type Output = DVec3;

    fn mul(self, rhs: DVec3) -> Self::Output {
        self.transform_point(rhs)
    }
}

impl From<Pose> for [f64; 7] {
    fn from(pose: Pose) -> Self {
        pose.to_vector()
    }
}

impl TryFrom<[f64; 7]> for Pose {
    type Error = PoseError;

    fn try_from(v: [f64; 7]) -> Result<Self, Self::Error> {
        Pose::from_vector(&v)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.translation;
        let q = self.rotation;
        write!(
            f,
            "Pose(t: [{}, {}, {}], q: [{}, {}, {}, {}])",
            t.x, t.y, t.z, q.x, q.y, q.z, q.w
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_pose(rng: &mut StdRng) -> Pose {
        let axis = DVec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(0.1..1.0),
        )
        .normalize();
        let angle = rng.random_range(-3.0..3.0);
        let t = DVec3::new(
            rng.random_range(-10.0..10.0),
            rng.random_range(-10.0..10.0),
            rng.random_range(-10.0..10.0),
        );
        Pose::new(DQuat::from_axis_angle(axis, angle), t)
    }

    fn assert_pose_eq(a: &Pose, b: &Pose, epsilon: f64) {
        assert_relative_eq!(a.rotation().dot(b.rotation()).abs(), 1.0, epsilon = epsilon);
        assert_relative_eq!(
            (a.translation() - b.translation()).length(),
            0.0,
            epsilon = epsilon
        );
    }

    #[test]
    fn test_identity() {
        let pose = Pose::default();
        assert_eq!(pose, Pose::IDENTITY);
        assert_eq!(pose.to_vector(), [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);

        let p = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(pose * p, p);
    }

    #[test]
    fn test_transform_point() {
        let pose = Pose::new(
            DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2),
            DVec3::new(1.0, 0.0, 0.0),
        );
        let p = pose.transform_point(DVec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_compose_and_inverse() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let a = random_pose(&mut rng);
            let b = random_pose(&mut rng);
            let p = DVec3::new(0.5, -2.0, 4.0);

            // (a * b) * p == a * (b * p)
            let lhs = (a * b) * p;
            let rhs = a * (b * p);
            assert_relative_eq!((lhs - rhs).length(), 0.0, epsilon = 1e-9);

            assert_pose_eq(&(a * a.inverse()), &Pose::IDENTITY, 1e-9);
            assert_pose_eq(&(a.inverse() * a), &Pose::IDENTITY, 1e-9);
        }
    }

    #[test]
    fn test_vector_layout() -> Result<(), Box<dyn std::error::Error>> {
        let v = [1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 2.0];
        let pose = Pose::from_vector(&v)?;
        // quaternion is re-normalized
        assert_eq!(pose.to_vector(), [1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_from_vector_errors() {
        assert_eq!(
            Pose::from_vector(&[0.0; 6]),
            Err(PoseError::InvalidLength {
                expected: 7,
                actual: 6
            })
        );
        assert!(matches!(
            Pose::from_vector(&[1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0]),
            Err(PoseError::ZeroQuaternion(_))
        ));
    }

    #[test]
    fn test_serde_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let mut rng = StdRng::seed_from_u64(3);
        let pose = random_pose(&mut rng);

        let json = serde_json::to_string(&pose)?;
        let values: Vec<f64> = serde_json::from_str(&json)?;
        assert_eq!(values.len(), 7);
        assert_eq!(values[0], pose.translation().x);
        assert_eq!(values[6], pose.rotation().w);

        let back: Pose = serde_json::from_str(&json)?;
        assert_pose_eq(&back, &pose, 1e-12);
        Ok(())
    }

    #[test]
    fn test_serde_rejects_zero_quaternion() {
        let res: Result<Pose, _> = serde_json::from_str("[0, 0, 0, 0, 0, 0, 0]");
        assert!(res.is_err());
    }

    #[test]
    fn test_matrix_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let mut rng = StdRng::seed_from_u64(11);
        let pose = random_pose(&mut rng);

        let from4 = Pose::from_matrix4(&pose.to_matrix4())?;
        assert_pose_eq(&from4, &pose, 1e-9);

        let m = pose.to_matrix3x4();
        let rot = [
            [m[0][0], m[0][1], m[0][2]],
            [m[1][0], m[1][1], m[1][2]],
            [m[2][0], m[2][1], m[2][2]],
        ];
        let from34 = Pose::from_rotation_matrix(&rot, &[m[0][3], m[1][3], m[2][3]])?;
        assert_pose_eq(&from34, &pose, 1e-9);
        Ok(())
    }

    #[test]
    fn test_from_rotation_matrix_rejects_reflection() {
        let reflection = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]];
        assert!(matches!(
            Pose::from_rotation_matrix(&reflection, &[0.0; 3]),
            Err(PoseError::NotARotation(_))
        ));
    }

    #[test]
    fn test_interpolate() {
        let a = Pose::new(DQuat::IDENTITY, DVec3::ZERO);
        let b = Pose::new(
            DQuat::from_rotation_y(1.0),
            DVec3::new(2.0, 4.0, -2.0),
        );

        assert_pose_eq(&Pose::interpolate(&a, &b, 0.0), &a, 1e-12);
        assert_pose_eq(&Pose::interpolate(&a, &b, 1.0), &b, 1e-12);

        let mid = Pose::interpolate(&a, &b, 0.5);
        assert_relative_eq!(mid.angular_distance(&a), 0.5, epsilon = 1e-9);
        assert_relative_eq!(mid.translation().y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scaled_and_display() {
        let pose = Pose::new(DQuat::IDENTITY, DVec3::new(1.0, -2.0, 0.5)).scaled(2.0);
        assert_eq!(pose.translation(), DVec3::new(2.0, -4.0, 1.0));
        assert_eq!(
            pose.to_string(),
            "Pose(t: [2, -4, 1], q: [0, 0, 0, 1])"
        );
    }
}

use serde::{Deserialize, Serialize};

use crate::{
    error::GeometryError,
    linalg::{self, IDENTITY33},
};

/// A rigid body transformation `p' = R * p + t`.
///
/// The rotation is stored row major and is expected to be a proper rotation
/// (orthogonal with determinant +1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    /// Rotation matrix, row major.
    pub rotation: [[f64; 3]; 3],
    /// Translation vector.
    pub translation: [f64; 3],
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// Create a new transform from a rotation and a translation.
    pub fn new(rotation: [[f64; 3]; 3], translation: [f64; 3]) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            rotation: IDENTITY33,
            translation: [0.0; 3],
        }
    }

    /// Apply the transform to a single point.
    #[inline]
    pub fn apply_point(&self, point: &[f64; 3]) -> [f64; 3] {
        let p = linalg::matvec33(&self.rotation, point);
        [
            p[0] + self.translation[0],
            p[1] + self.translation[1],
            p[2] + self.translation[2],
        ]
    }

    /// Apply the transform to a set of points, writing into `dst_points`.
    pub fn apply(
        &self,
        src_points: &[[f64; 3]],
        dst_points: &mut [[f64; 3]],
    ) -> Result<(), GeometryError> {
        linalg::transform_points(src_points, &self.rotation, &self.translation, dst_points)
    }

    /// Compose two transforms: apply `self` first, then `next`.
    ///
    /// R = R_next * R_self, t = R_next * t_self + t_next
    pub fn then(&self, next: &RigidTransform) -> RigidTransform {
        let rotation = linalg::matmul33(&next.rotation, &self.rotation);
        let t = linalg::matvec33(&next.rotation, &self.translation);
        RigidTransform {
            rotation,
            translation: [
                t[0] + next.translation[0],
                t[1] + next.translation[1],
                t[2] + next.translation[2],
            ],
        }
    }

    /// The inverse transform `(R^T, -R^T * t)`.
    pub fn inverse(&self) -> RigidTransform {
        let rotation = linalg::transpose33(&self.rotation);
        let t = linalg::matvec33(&rotation, &self.translation);
        RigidTransform {
            rotation,
            translation: [-t[0], -t[1], -t[2]],
        }
    }

    /// Check that the rotation is orthogonal with determinant +1 within `eps`.
    pub fn is_proper_rotation(&self, eps: f64) -> bool {
        if (linalg::det33(&self.rotation) - 1.0).abs() > eps {
            return false;
        }
        let rtr = linalg::matmul33(&linalg::transpose33(&self.rotation), &self.rotation);
        rtr.iter()
            .zip(IDENTITY33.iter())
            .all(|(row, id)| row.iter().zip(id.iter()).all(|(a, b)| (a - b).abs() <= eps))
    }

    /// Angle of the rotation in radians, in `[0, pi]`.
    pub fn rotation_angle(&self) -> f64 {
        let r = &self.rotation;
        let cos = ((r[0][0] + r[1][1] + r[2][2] - 1.0) / 2.0).clamp(-1.0, 1.0);
        cos.acos()
    }

    /// Euclidean norm of the translation.
    pub fn translation_norm(&self) -> f64 {
        linalg::squared_distance(&self.translation, &[0.0; 3]).sqrt()
    }
}

/// Compute the rotation matrix from an axis and angle.
///
/// The axis does not need to be normalized, but it must not be zero.
///
/// Example:
///
/// ```
/// use rigid_3d::transforms::axis_angle_to_rotation_matrix;
///
/// let rotation = axis_angle_to_rotation_matrix(&[0.0, 0.0, 2.0], 0.0).unwrap();
/// assert_eq!(rotation, [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
/// ```
pub fn axis_angle_to_rotation_matrix(
    axis: &[f64; 3],
    angle: f64,
) -> Result<[[f64; 3]; 3], GeometryError> {
    let magnitude = (axis[0].powi(2) + axis[1].powi(2) + axis[2].powi(2)).sqrt();
    if magnitude < 1e-10 {
        return Err(GeometryError::ZeroAxis);
    }

    let x = axis[0] / magnitude;
    let y = axis[1] / magnitude;
    let z = axis[2] / magnitude;

    let c = angle.cos();
    let s = angle.sin();
    let t = 1.0 - c;

    Ok([
        [c + x * x * t, x * y * t - z * s, x * z * t + y * s],
        [x * y * t + z * s, c + y * y * t, y * z * t - x * s],
        [x * z * t - y * s, y * z * t + x * s, c + z * z * t],
    ])
}

/// Compute the rotation matrix `Rz * Ry * Rx` from angles around the x, y and z axes.
pub fn euler_to_rotation_matrix(rx: f64, ry: f64, rz: f64) -> [[f64; 3]; 3] {
    let (sx, cx) = rx.sin_cos();
    let (sy, cy) = ry.sin_cos();
    let (sz, cz) = rz.sin_cos();

    let r_x = [[1.0, 0.0, 0.0], [0.0, cx, -sx], [0.0, sx, cx]];
    let r_y = [[cy, 0.0, sy], [0.0, 1.0, 0.0], [-sy, 0.0, cy]];
    let r_z = [[cz, -sz, 0.0], [sz, cz, 0.0], [0.0, 0.0, 1.0]];

    linalg::matmul33(&r_z, &linalg::matmul33(&r_y, &r_x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_mat_eq(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3], epsilon: f64) {
        for (ra, rb) in a.iter().zip(b.iter()) {
            for (va, vb) in ra.iter().zip(rb.iter()) {
                assert_relative_eq!(va, vb, epsilon = epsilon);
            }
        }
    }

    #[test]
    fn test_axis_angle_to_rotation_matrix_identity() -> Result<(), GeometryError> {
        let rotation = axis_angle_to_rotation_matrix(&[1.0, 0.0, 0.0], 0.0)?;
        assert_mat_eq(&rotation, &IDENTITY33, 1e-12);
        Ok(())
    }

    #[test]
    fn test_axis_angle_to_rotation_matrix_quarter_turn() -> Result<(), GeometryError> {
        let rotation =
            axis_angle_to_rotation_matrix(&[1.0, 0.0, 0.0], std::f64::consts::FRAC_PI_2)?;
        let expected = [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];
        assert_mat_eq(&rotation, &expected, 1e-12);
        Ok(())
    }

    #[test]
    fn test_axis_angle_zero_axis() {
        let res = axis_angle_to_rotation_matrix(&[0.0, 0.0, 0.0], 1.0);
        assert_eq!(res, Err(GeometryError::ZeroAxis));
    }

    #[test]
    fn test_euler_matches_axis_angle() -> Result<(), GeometryError> {
        let rz = euler_to_rotation_matrix(0.0, 0.0, 0.3);
        let expected = axis_angle_to_rotation_matrix(&[0.0, 0.0, 1.0], 0.3)?;
        assert_mat_eq(&rz, &expected, 1e-12);

        let r = euler_to_rotation_matrix(0.4, -1.1, 2.5);
        assert!(RigidTransform::new(r, [0.0; 3]).is_proper_rotation(1e-9));
        Ok(())
    }

    #[test]
    fn test_compose_and_inverse() -> Result<(), GeometryError> {
        let a = RigidTransform::new(
            axis_angle_to_rotation_matrix(&[0.0, 1.0, 1.0], 0.7)?,
            [1.0, -2.0, 0.5],
        );
        let b = RigidTransform::new(
            axis_angle_to_rotation_matrix(&[1.0, 0.0, 0.0], -0.2)?,
            [0.0, 3.0, 1.0],
        );
        let p = [0.3, 0.2, -1.0];

        let composed = a.then(&b).apply_point(&p);
        let sequential = b.apply_point(&a.apply_point(&p));
        for i in 0..3 {
            assert_relative_eq!(composed[i], sequential[i], epsilon = 1e-12);
        }

        let roundtrip = a.then(&a.inverse());
        assert_mat_eq(&roundtrip.rotation, &IDENTITY33, 1e-12);
        for t in roundtrip.translation {
            assert_relative_eq!(t, 0.0, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_is_proper_rotation_rejects_reflection() {
        let mirror = RigidTransform::new(
            [[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            [0.0; 3],
        );
        assert!(!mirror.is_proper_rotation(1e-6));
        assert!(RigidTransform::identity().is_proper_rotation(1e-12));

        let scaled = RigidTransform::new([[2.0, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 1.0]], [0.0; 3]);
        assert!(!scaled.is_proper_rotation(1e-6));
    }

    #[test]
    fn test_rotation_angle() -> Result<(), GeometryError> {
        let r = RigidTransform::new(axis_angle_to_rotation_matrix(&[0.0, 0.0, 1.0], 0.5)?, [3.0, 4.0, 0.0]);
        assert_relative_eq!(r.rotation_angle(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(r.translation_norm(), 5.0, epsilon = 1e-12);
        Ok(())
    }
}

//! Rotation algebra for the two Euler-angle conventions.
//!
//! Extrinsic rotations are about the axes of the original coordinate system,
//! which stays put. This is the convention of the URDF `rpy` attribute.
//!
//! Intrinsic rotations are about the axes of a coordinate system attached to
//! the moving body, which changes orientation after each elementary
//! rotation. This is the convention of the Kinematics-DSL `rotation`
//! attribute.
//!
//! Every matrix returned here is `base_R_rotated`: it maps coordinates in the
//! rotated frame to coordinates in the base frame.

use std::f64::consts::FRAC_PI_2;

use nalgebra::{Matrix3, Vector3};

/// Matrix entries with a magnitude below this value are treated as zero when
/// extracting angles.
pub const CLOSE_TO_ZERO: f64 = 1e-10;

/// Rotation matrix for intrinsic X, then Y, then Z rotations.
///
/// ```text
///           cy cz                 -cy sz            sy
///  cx sz + sx sy cz      cx cz - sx sy sz       -sx cy
///  sx sz - cx sy cz      cx sy sz + sx cz        cx cy
/// ```
#[must_use]
pub fn intrinsic_xyz(rx: f64, ry: f64, rz: f64) -> Matrix3<f64> {
    let (sx, cx) = rx.sin_cos();
    let (sy, cy) = ry.sin_cos();
    let (sz, cz) = rz.sin_cos();
    Matrix3::new(
        cy * cz,
        -cy * sz,
        sy,
        cx * sz + cz * sx * sy,
        cx * cz - sx * sy * sz,
        -cy * sx,
        sx * sz - cx * cz * sy,
        cx * sy * sz + cz * sx,
        cx * cy,
    )
}

/// Rotation matrix for extrinsic X, then Y, then Z rotations (URDF rpy).
///
/// ```text
///  cy cz    sx sy cz - cx sz    sx sz + cx sy cz
///  cy sz    sx sy sz + cx cz    cx sy sz - sx cz
///   -sy          sx cy               cx cy
/// ```
#[must_use]
pub fn extrinsic_xyz(rx: f64, ry: f64, rz: f64) -> Matrix3<f64> {
    let (sx, cx) = rx.sin_cos();
    let (sy, cy) = ry.sin_cos();
    let (sz, cz) = rz.sin_cos();
    Matrix3::new(
        cy * cz,
        cz * sx * sy - cx * sz,
        sx * sz + cx * cz * sy,
        cy * sz,
        sx * sy * sz + cx * cz,
        cx * sy * sz - cz * sx,
        -sy,
        cy * sx,
        cx * cy,
    )
}

/// Extract the intrinsic XYZ angles `(rx, ry, rz)` from a rotation matrix.
///
/// Entries smaller than [`CLOSE_TO_ZERO`] are zeroed first, so that floating
/// noise cannot blow up the ratios inside `atan2` or flip the singular
/// branch. In the singular case (`cos(ry) = 0`) only the sum (or difference)
/// of `rx` and `rz` is defined; `rz` is then fixed to zero.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn intrinsic_xyz_angles(rotation: &Matrix3<f64>) -> Vector3<f64> {
    let r = rotation.map(|v| if v.abs() < CLOSE_TO_ZERO { 0.0 } else { v });

    if r[(0, 2)] == 1.0 {
        // r10 = sin(rx + rz), r20 = -cos(rx + rz)
        Vector3::new(r[(1, 0)].atan2(-r[(2, 0)]), FRAC_PI_2, 0.0)
    } else if r[(0, 2)] == -1.0 {
        // r21 = sin(rx - rz), r11 = cos(rx - rz)
        Vector3::new(r[(2, 1)].atan2(r[(1, 1)]), -FRAC_PI_2, 0.0)
    } else {
        let ry = r[(0, 2)].asin();
        let rx = (-r[(1, 2)]).atan2(r[(2, 2)]);
        let rz = (-r[(0, 1)]).atan2(r[(0, 0)]);
        Vector3::new(rx, ry, rz)
    }
}

/// Round to a fixed number of decimal digits.
#[must_use]
pub fn round_to(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    (value * scale).round() / scale
}

/// Round every component of a vector to a fixed number of decimal digits.
#[must_use]
pub fn round_vector(v: &Vector3<f64>, digits: u32) -> Vector3<f64> {
    v.map(|c| round_to(c, digits))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;
    use std::f64::consts::PI;

    #[test]
    fn test_identity() {
        assert_relative_eq!(intrinsic_xyz(0.0, 0.0, 0.0), Matrix3::identity());
        assert_relative_eq!(extrinsic_xyz(0.0, 0.0, 0.0), Matrix3::identity());
    }

    #[test]
    fn test_intrinsic_is_product_of_elementary_rotations() {
        let (rx, ry, rz) = (0.3, -0.7, 1.1);
        let expected = Rotation3::from_axis_angle(&Vector3::x_axis(), rx).into_inner()
            * Rotation3::from_axis_angle(&Vector3::y_axis(), ry).into_inner()
            * Rotation3::from_axis_angle(&Vector3::z_axis(), rz).into_inner();
        assert_relative_eq!(intrinsic_xyz(rx, ry, rz), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_extrinsic_is_reversed_product() {
        let (rx, ry, rz) = (0.3, -0.7, 1.1);
        let expected = Rotation3::from_axis_angle(&Vector3::z_axis(), rz).into_inner()
            * Rotation3::from_axis_angle(&Vector3::y_axis(), ry).into_inner()
            * Rotation3::from_axis_angle(&Vector3::x_axis(), rx).into_inner();
        assert_relative_eq!(extrinsic_xyz(rx, ry, rz), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_conventions_differ() {
        let a = intrinsic_xyz(0.3, -0.7, 1.1);
        let b = extrinsic_xyz(0.3, -0.7, 1.1);
        assert!((a - b).norm() > 1e-3);
    }

    #[test]
    fn test_angles_regular_case() {
        let angles = intrinsic_xyz_angles(&intrinsic_xyz(0.3, -0.7, 1.1));
        assert_relative_eq!(angles.x, 0.3, epsilon = 1e-12);
        assert_relative_eq!(angles.y, -0.7, epsilon = 1e-12);
        assert_relative_eq!(angles.z, 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_angles_gimbal_lock_positive() {
        // R[0,2] = 1 exactly
        let r = Matrix3::new(0.0, 0.0, 1.0, 0.6, 0.8, 0.0, -0.8, 0.6, 0.0);
        let angles = intrinsic_xyz_angles(&r);
        assert_relative_eq!(angles.y, FRAC_PI_2);
        assert_eq!(angles.z, 0.0);
        assert_relative_eq!(angles.x, 0.6f64.atan2(0.8), epsilon = 1e-15);
        assert_relative_eq!(
            intrinsic_xyz(angles.x, angles.y, angles.z),
            r,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_angles_gimbal_lock_negative() {
        let m = intrinsic_xyz(0.4, -FRAC_PI_2, 0.25);
        let angles = intrinsic_xyz_angles(&m);
        assert_relative_eq!(angles.y, -FRAC_PI_2);
        assert_eq!(angles.z, 0.0);
        assert_relative_eq!(
            intrinsic_xyz(angles.x, angles.y, angles.z),
            m,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_noise_is_cleaned() {
        let mut m = intrinsic_xyz(0.0, 0.0, PI / 2.0);
        m[(1, 2)] = 1e-12;
        m[(0, 0)] = 1e-17;
        let angles = intrinsic_xyz_angles(&m);
        assert_eq!(angles.x, 0.0);
        assert_relative_eq!(angles.z, PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 5), 0.12346);
        assert_eq!(round_to(-0.000001, 5), 0.0);
        assert_eq!(round_to(1.0, 5), 1.0);
        let v = round_vector(&Vector3::new(1e-7, 0.999999, -0.5), 5);
        assert_eq!(v, Vector3::new(0.0, 1.0, -0.5));
    }
}

//! Per-joint frame alignment.
//!
//! A Kinematics-DSL joint always moves along (or about) its local Z axis,
//! while a URDF joint carries an explicit axis. For each joint we look for
//! intrinsic angles `(rx, ry, rz)` whose frame has its Z axis on the URDF
//! axis. `rx` and `ry` are fixed by the axis; for revolute joints `rz` is
//! then chosen to absorb a residual rotation about Z, so that the new frame
//! stays as close as possible to the URDF one.
//!
//! Whatever rotation remains between the two joint frames is carried over to
//! the successor link as its convention offset.

use std::f64::consts::PI;

use nalgebra::{Matrix3, Vector3};
use tracing::{debug, warn};

use crate::frame::Frame;
use crate::rotation::{extrinsic_xyz, intrinsic_xyz, intrinsic_xyz_angles, round_to, round_vector};
use crate::tree::JointKind;
use crate::types::UrdfOrigin;

/// Decimal digits used for every branching decision of the solver.
const ROUND_DIGITS: u32 = 5;

/// Minimum norm of the residual rotation axis worth correcting.
const RESIDUAL_EPS: f64 = 1e-5;

/// Result of aligning one joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAlignment {
    /// Joint frame in predecessor link coordinates.
    pub frame: Frame,
    /// Rotation from the URDF joint frame to the new joint frame. It becomes
    /// the convention offset of the successor link.
    pub successor_offset: Matrix3<f64>,
}

/// Compute the joint frame of a URDF joint in the Kinematics-DSL convention.
///
/// `predecessor_offset` is the convention offset of the predecessor link.
/// `axis` is expected to be unit length.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn align_joint(
    joint_name: &str,
    kind: JointKind,
    origin: &UrdfOrigin,
    axis: &Vector3<f64>,
    predecessor_offset: &Matrix3<f64>,
) -> JointAlignment {
    // URDF joint frame expressed in the predecessor link frame
    let composed = predecessor_offset * extrinsic_xyz(origin.rpy.x, origin.rpy.y, origin.rpy.z);

    let (rx, ry, mut rz) = if kind == JointKind::Fixed {
        let a = intrinsic_xyz_angles(&composed);
        (a.x, a.y, a.z)
    } else {
        let a = composed * axis;
        let a_r = round_vector(&a, ROUND_DIGITS);

        // sin(ry) = a_x, -sin(rx) cos(ry) = a_y, cos(rx) cos(ry) = a_z
        let ry = a.x.clamp(-1.0, 1.0).asin();
        let rx = if a_r.z != 0.0 {
            (-a.y).atan2(a.z)
        } else {
            let cy = ry.cos();
            if round_to(cy, ROUND_DIGITS) != 0.0 {
                (-a.y / cy).clamp(-1.0, 1.0).asin()
            } else {
                // Axis along X: every rx keeps Z on the axis
                debug!(joint = joint_name, "axis along X, rx is free; using 0");
                0.0
            }
        };
        debug!(
            joint = joint_name,
            axis = ?a_r,
            rx = round_to(rx, ROUND_DIGITS),
            ry = round_to(ry, ROUND_DIGITS),
            "joint axis in link frame, before rz correction"
        );
        (rx, ry, 0.0)
    };

    let mut rotation = intrinsic_xyz(rx, ry, rz);
    let mut residual = rotation.transpose() * composed;

    if kind == JointKind::Revolute {
        let z = Vector3::z();
        let rz_col = round_vector(&residual.column(2).into_owned(), ROUND_DIGITS);

        // Residual is a pure rotation about Z
        if rz_col == z {
            if round_to(residual[(0, 0)], ROUND_DIGITS) == -1.0
                && round_to(residual[(1, 1)], ROUND_DIGITS) == -1.0
            {
                rz = PI;
            } else {
                let diff = Vector3::new(
                    residual[(2, 1)] - residual[(1, 2)],
                    residual[(0, 2)] - residual[(2, 0)],
                    residual[(1, 0)] - residual[(0, 1)],
                );
                let norm = diff.norm();
                if norm > RESIDUAL_EPS {
                    rz = norm.atan2(residual.trace() - 1.0);

                    let mut unit = round_vector(&(diff / norm), ROUND_DIGITS);
                    if unit.z < 0.0 {
                        unit.z = -unit.z;
                        rz = -rz;
                    }
                    if unit != z {
                        warn!(
                            joint = joint_name,
                            "possible inconsistency in the joint frame rotation"
                        );
                    }
                }
            }

            rotation = intrinsic_xyz(rx, ry, rz);
            residual = rotation.transpose() * composed;
        }
    }

    let translation = predecessor_offset * origin.xyz;
    JointAlignment {
        frame: Frame::new(translation, Vector3::new(rx, ry, rz)),
        successor_offset: residual,
    }
}

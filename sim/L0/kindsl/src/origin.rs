//! Forward kinematics on the raw URDF model.

use nalgebra::{Matrix4, Vector3};
use tracing::debug;

use crate::error::{Result, UrdfError};
use crate::types::UrdfRobot;

/// Origin of a link frame in root coordinates, at the zero configuration.
///
/// Walks the supporting joints from the link up to the root, composing the
/// URDF joint transforms.
pub fn link_origin(robot: &UrdfRobot, link_name: &str) -> Result<Vector3<f64>> {
    if robot.link(link_name).is_none() {
        return Err(UrdfError::undefined_link(link_name, "link origin request"));
    }

    let mut h = Matrix4::identity();
    let mut current = link_name;
    let mut steps = 0;
    while let Some(joint) = robot.parent_joint(current) {
        steps += 1;
        if steps > robot.joints.len() {
            return Err(UrdfError::KinematicLoop(format!(
                "link '{link_name}' is part of a cycle"
            )));
        }
        debug!(link = current, joint = %joint.name, "accumulating joint transform");
        h = joint.origin.homogeneous() * h;
        current = joint.parent.as_str();
    }

    Ok(h.fixed_view::<3, 1>(0, 3).into_owned())
}

//! Intermediate representation types for URDF data.
//!
//! These types represent the parsed URDF structure before conversion to the
//! Kinematics-DSL tree. They mirror the parts of the URDF XML schema that
//! matter for kinematics and dynamics: link inertia, joint type, joint origin
//! and joint axis. Links and joints keep their document order.

use nalgebra::{Matrix3, Matrix4, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rotation::extrinsic_xyz;

/// Safe axis normalization with the URDF default (X) for zero-length vectors.
#[inline]
pub(crate) fn safe_normalize_axis(v: Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n > 1e-10 { v / n } else { Vector3::x() }
}

// ============================================================================
// Origin (Pose)
// ============================================================================

/// Origin/pose specification in URDF.
///
/// Represents the `<origin>` element with xyz position and rpy rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfOrigin {
    /// Position (xyz) in meters.
    pub xyz: Vector3<f64>,
    /// Rotation as roll-pitch-yaw (rpy) in radians.
    pub rpy: Vector3<f64>,
}

impl Default for UrdfOrigin {
    fn default() -> Self {
        Self {
            xyz: Vector3::zeros(),
            rpy: Vector3::zeros(),
        }
    }
}

impl UrdfOrigin {
    /// Create a new origin at position with identity rotation.
    #[must_use]
    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            xyz: Vector3::new(x, y, z),
            rpy: Vector3::zeros(),
        }
    }

    /// Create from position and rpy.
    #[must_use]
    pub fn new(xyz: Vector3<f64>, rpy: Vector3<f64>) -> Self {
        Self { xyz, rpy }
    }

    /// Rotation matrix of the origin.
    ///
    /// URDF uses fixed-axis XYZ (roll about X, then pitch about Y, then yaw
    /// about Z, all about the axes of the parent frame).
    #[must_use]
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        extrinsic_xyz(self.rpy.x, self.rpy.y, self.rpy.z)
    }

    /// Homogeneous transform from the origin frame to the parent frame.
    #[must_use]
    pub fn homogeneous(&self) -> Matrix4<f64> {
        let mut h = Matrix4::identity();
        h.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&self.rotation_matrix());
        h.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.xyz);
        h
    }
}

// ============================================================================
// Inertial Properties
// ============================================================================

/// Inertial properties from `<inertial>` element.
///
/// The default value describes a massless link, which is also what a link
/// without an `<inertial>` element converts to.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfInertial {
    /// Origin of the inertial frame relative to link frame.
    ///
    /// Only the translation (the center of mass) is honoured; a non-zero
    /// rotation is reported and ignored by the converter.
    pub origin: UrdfOrigin,
    /// Mass in kg.
    pub mass: f64,
    /// Inertia tensor elements, about the center of mass.
    pub inertia: UrdfInertia,
}

impl UrdfInertial {
    /// Create inertial properties with given mass and zero inertia.
    #[must_use]
    pub fn with_mass(mass: f64) -> Self {
        Self {
            mass,
            ..Default::default()
        }
    }

    /// Set the inertia tensor.
    #[must_use]
    pub fn with_inertia(mut self, inertia: UrdfInertia) -> Self {
        self.inertia = inertia;
        self
    }

    /// Set the inertial origin.
    #[must_use]
    pub fn with_origin(mut self, origin: UrdfOrigin) -> Self {
        self.origin = origin;
        self
    }
}

/// Inertia tensor from URDF.
///
/// URDF specifies the upper-triangular elements of the symmetric inertia
/// tensor, with the products of inertia stored as the tensor entries.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfInertia {
    /// Moment of inertia about X axis.
    pub ixx: f64,
    /// Product of inertia XY.
    pub ixy: f64,
    /// Product of inertia XZ.
    pub ixz: f64,
    /// Moment of inertia about Y axis.
    pub iyy: f64,
    /// Product of inertia YZ.
    pub iyz: f64,
    /// Moment of inertia about Z axis.
    pub izz: f64,
}

impl UrdfInertia {
    /// Create a diagonal inertia tensor.
    #[must_use]
    pub fn diagonal(ixx: f64, iyy: f64, izz: f64) -> Self {
        Self {
            ixx,
            ixy: 0.0,
            ixz: 0.0,
            iyy,
            iyz: 0.0,
            izz,
        }
    }

    /// Convert to a 3x3 matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.ixx, self.ixy, self.ixz, self.ixy, self.iyy, self.iyz, self.ixz, self.iyz,
            self.izz,
        )
    }
}

// ============================================================================
// Link
// ============================================================================

/// A link (rigid body) from `<link>` element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfLink {
    /// Link name (required, must be unique).
    pub name: String,
    /// Inertial properties (optional for massless links).
    pub inertial: Option<UrdfInertial>,
}

impl UrdfLink {
    /// Create a new link with just a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inertial: None,
        }
    }

    /// Set inertial properties.
    #[must_use]
    pub fn with_inertial(mut self, inertial: UrdfInertial) -> Self {
        self.inertial = Some(inertial);
        self
    }
}

// ============================================================================
// Joint
// ============================================================================

/// Joint type from URDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UrdfJointType {
    /// Revolute joint with limits.
    Revolute,
    /// Continuous (unlimited revolute) joint.
    Continuous,
    /// Prismatic (sliding) joint.
    Prismatic,
    /// Fixed (welded) joint.
    Fixed,
    /// Floating (6-DOF) joint.
    Floating,
    /// Planar (2D translation + rotation) joint.
    Planar,
}

impl UrdfJointType {
    /// Parse joint type from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "revolute" => Some(Self::Revolute),
            "continuous" => Some(Self::Continuous),
            "prismatic" => Some(Self::Prismatic),
            "fixed" => Some(Self::Fixed),
            "floating" => Some(Self::Floating),
            "planar" => Some(Self::Planar),
            _ => None,
        }
    }

    /// The URDF keyword for this joint type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revolute => "revolute",
            Self::Continuous => "continuous",
            Self::Prismatic => "prismatic",
            Self::Fixed => "fixed",
            Self::Floating => "floating",
            Self::Planar => "planar",
        }
    }
}

/// A joint connecting two links.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfJoint {
    /// Joint name (required, must be unique).
    pub name: String,
    /// Joint type.
    pub joint_type: UrdfJointType,
    /// Parent link name.
    pub parent: String,
    /// Child link name.
    pub child: String,
    /// Origin of joint frame relative to parent link frame.
    pub origin: UrdfOrigin,
    /// Joint axis in joint frame (default: x-axis). Normalized on conversion.
    pub axis: Vector3<f64>,
}

impl UrdfJoint {
    /// Create a new joint.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        joint_type: UrdfJointType,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            joint_type,
            parent: parent.into(),
            child: child.into(),
            origin: UrdfOrigin::default(),
            axis: Vector3::x(), // URDF default axis
        }
    }

    /// Set the joint origin.
    #[must_use]
    pub fn with_origin(mut self, origin: UrdfOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Set the joint axis.
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3<f64>) -> Self {
        self.axis = safe_normalize_axis(axis);
        self
    }
}

// ============================================================================
// Robot
// ============================================================================

/// A complete URDF robot model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfRobot {
    /// Robot name.
    pub name: String,
    /// All links in the robot, in document order.
    pub links: Vec<UrdfLink>,
    /// All joints in the robot, in document order.
    pub joints: Vec<UrdfJoint>,
}

impl UrdfRobot {
    /// Create a new robot with just a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: Vec::new(),
            joints: Vec::new(),
        }
    }

    /// Add a link.
    #[must_use]
    pub fn with_link(mut self, link: UrdfLink) -> Self {
        self.links.push(link);
        self
    }

    /// Add a joint.
    #[must_use]
    pub fn with_joint(mut self, joint: UrdfJoint) -> Self {
        self.joints.push(joint);
        self
    }

    /// Get a link by name.
    #[must_use]
    pub fn link(&self, name: &str) -> Option<&UrdfLink> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Get a joint by name.
    #[must_use]
    pub fn joint(&self, name: &str) -> Option<&UrdfJoint> {
        self.joints.iter().find(|j| j.name == name)
    }

    /// Get the joint whose child is the given link.
    #[must_use]
    pub fn parent_joint(&self, link_name: &str) -> Option<&UrdfJoint> {
        self.joints.iter().find(|j| j.child == link_name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_origin_default() {
        let origin = UrdfOrigin::default();
        assert_eq!(origin.xyz, Vector3::zeros());
        assert_eq!(origin.rpy, Vector3::zeros());
    }

    #[test]
    fn test_origin_rotation() {
        let origin = UrdfOrigin::new(
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );
        let rotated = origin.rotation_matrix() * Vector3::x();
        assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(rotated.y, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_origin_homogeneous() {
        let origin = UrdfOrigin::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );
        let h = origin.homogeneous();
        assert_relative_eq!(h[(0, 3)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(h[(1, 3)], 2.0, epsilon = 1e-12);
        assert_relative_eq!(h[(2, 3)], 3.0, epsilon = 1e-12);
        assert_relative_eq!(h[(3, 3)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(h[(1, 0)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inertia_to_matrix() {
        let inertia = UrdfInertia {
            ixx: 1.0,
            ixy: 0.1,
            ixz: 0.2,
            iyy: 2.0,
            iyz: 0.3,
            izz: 3.0,
        };
        let m = inertia.to_matrix();
        assert_relative_eq!(m[(0, 0)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(m[(0, 1)], 0.1, epsilon = 1e-10);
        assert_relative_eq!(m[(1, 0)], 0.1, epsilon = 1e-10); // Symmetric
        assert_relative_eq!(m[(2, 0)], 0.2, epsilon = 1e-10);
        assert_relative_eq!(m[(2, 2)], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_joint_type_from_str() {
        assert_eq!(
            UrdfJointType::from_str("revolute"),
            Some(UrdfJointType::Revolute)
        );
        assert_eq!(UrdfJointType::from_str("fixed"), Some(UrdfJointType::Fixed));
        assert_eq!(UrdfJointType::from_str("invalid"), None);
        assert_eq!(UrdfJointType::Continuous.as_str(), "continuous");
    }

    #[test]
    fn test_joint_axis_default_and_normalization() {
        let joint = UrdfJoint::new("j", UrdfJointType::Revolute, "a", "b");
        assert_eq!(joint.axis, Vector3::x());

        let joint = joint.with_axis(Vector3::new(0.0, 0.0, 2.0));
        assert_relative_eq!(joint.axis.z, 1.0, epsilon = 1e-12);

        let joint = joint.with_axis(Vector3::zeros());
        assert_eq!(joint.axis, Vector3::x());
    }

    #[test]
    fn test_robot_builder() {
        let robot = UrdfRobot::new("test_robot")
            .with_link(UrdfLink::new("base_link"))
            .with_link(UrdfLink::new("link1"))
            .with_joint(UrdfJoint::new(
                "joint1",
                UrdfJointType::Revolute,
                "base_link",
                "link1",
            ));

        assert_eq!(robot.name, "test_robot");
        assert_eq!(robot.links.len(), 2);
        assert_eq!(robot.joints.len(), 1);
        assert!(robot.link("base_link").is_some());
        assert!(robot.joint("joint1").is_some());
        assert_eq!(
            robot.parent_joint("link1").map(|j| j.name.as_str()),
            Some("joint1")
        );
        assert!(robot.parent_joint("base_link").is_none());
    }
}

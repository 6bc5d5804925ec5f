//! Rigid transforms in the Kinematics-DSL convention.

use nalgebra::{Matrix3, Matrix4, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rotation::{intrinsic_xyz, intrinsic_xyz_angles};

/// A rigid transform: a translation plus intrinsic XYZ rotation angles.
///
/// The rotation matrix is cached alongside the angles and both are kept
/// consistent by the setters, so the homogeneous form is always available.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    translation: Vector3<f64>,
    angles: Vector3<f64>,
    rotation: Matrix3<f64>,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            translation: Vector3::zeros(),
            angles: Vector3::zeros(),
            rotation: Matrix3::identity(),
        }
    }
}

impl Frame {
    /// Create a frame from a translation and intrinsic XYZ angles.
    #[must_use]
    pub fn new(translation: Vector3<f64>, angles: Vector3<f64>) -> Self {
        Self {
            translation,
            angles,
            rotation: intrinsic_xyz(angles.x, angles.y, angles.z),
        }
    }

    /// Create a frame from a translation and a rotation matrix.
    ///
    /// The angles are recovered with [`intrinsic_xyz_angles`]; the matrix is
    /// stored as given.
    #[must_use]
    pub fn from_rotation(translation: Vector3<f64>, rotation: Matrix3<f64>) -> Self {
        Self {
            translation,
            angles: intrinsic_xyz_angles(&rotation),
            rotation,
        }
    }

    /// Create a frame from a 4x4 homogeneous matrix.
    #[must_use]
    pub fn from_homogeneous(h: &Matrix4<f64>) -> Self {
        let translation = h.fixed_view::<3, 1>(0, 3).into_owned();
        let rotation = h.fixed_view::<3, 3>(0, 0).into_owned();
        Self::from_rotation(translation, rotation)
    }

    /// Translation component.
    #[must_use]
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Intrinsic XYZ rotation angles in radians.
    #[must_use]
    pub fn angles(&self) -> &Vector3<f64> {
        &self.angles
    }

    /// Rotation matrix, `parent_R_frame`.
    #[must_use]
    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    /// Replace the angles; the rotation matrix follows.
    pub fn set_angles(&mut self, angles: Vector3<f64>) {
        self.angles = angles;
        self.rotation = intrinsic_xyz(angles.x, angles.y, angles.z);
    }

    /// Replace the rotation matrix; the angles follow.
    pub fn set_rotation(&mut self, rotation: Matrix3<f64>) {
        self.angles = intrinsic_xyz_angles(&rotation);
        self.rotation = rotation;
    }

    /// The 4x4 homogeneous matrix of this transform.
    #[must_use]
    pub fn homogeneous(&self) -> Matrix4<f64> {
        let mut h = Matrix4::identity();
        h.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.rotation);
        h.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        h
    }

    /// Compose `self * other` (other expressed in this frame).
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self::from_homogeneous(&(self.homogeneous() * other.homogeneous()))
    }
}

/// Named frames attached to a link, in insertion order.
///
/// Inserting a name that already exists replaces its frame without changing
/// its position.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameMap {
    entries: Vec<(String, Frame)>,
}

impl FrameMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a frame.
    pub fn insert(&mut self, name: impl Into<String>, frame: Frame) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = frame;
        } else {
            self.entries.push((name, frame));
        }
    }

    /// Look up a frame by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Frame> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f)
    }

    /// Iterate over `(name, frame)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Frame)> {
        self.entries.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
